use frameshader_common::{FilterMode, ImageFormat, Size, Viewport};
use frameshader_runtime::chain::{ChainState, FilterChain};
use frameshader_runtime::context::TextureTarget;
use frameshader_runtime::error::{FilterError, ShaderStage};
use frameshader_runtime::filter::{DrawParams, Filter};
use frameshader_runtime::filters::{ColorAdjustFilter, IdentityFilter, ShaderFilter};
use frameshader_runtime::headless::{FramebufferId, HeadlessContext, ProgramId, TextureId};
use frameshader_runtime::image::Image;
use frameshader_runtime::options::FilterChainOptions;
use frameshader_runtime::texture::{InputTexture, OwnedFramebuffer};
use frameshader_runtime::glam::{Mat4, Vec3};

type Ctx = HeadlessContext;

fn gradient(size: Size<u32>) -> Image {
    let mut bytes = Vec::with_capacity(size.area() * 4);
    for y in 0..size.height {
        for x in 0..size.width {
            bytes.extend_from_slice(&[(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255]);
        }
    }
    Image::from_rgba(bytes, size).unwrap()
}

fn upload(ctx: &Ctx, image: &Image) -> InputTexture<TextureId> {
    let texture = ctx.create_texture_from_image(image).unwrap();
    InputTexture::new(texture, image.size)
}

fn surface(size: Size<u32>) -> Viewport<'static, Option<FramebufferId>> {
    Viewport::new_render_target_sized_origin(None, size)
}

fn identities(count: usize) -> Vec<Box<dyn Filter<Ctx>>> {
    (0..count)
        .map(|_| Box::new(IdentityFilter::<Ctx>::new()) as Box<dyn Filter<Ctx>>)
        .collect()
}

fn run(filters: Vec<Box<dyn Filter<Ctx>>>, image: &Image) -> Image {
    let ctx = HeadlessContext::new(image.size);
    let input = upload(&ctx, image);
    let mut chain = FilterChain::new(&ctx, filters, None);
    chain.set_size(image.size).unwrap();
    chain
        .frame(&input, &surface(image.size), &Mat4::IDENTITY, 0, None)
        .unwrap();
    ctx.read_surface()
}

#[test]
fn identity_preserves_solid_red() {
    let size = Size::new(64, 64);
    let red = Image::solid(size, [255, 0, 0, 255]);
    let output = run(identities(1), &red);
    assert_eq!(output.size, size);
    assert_eq!(output.bytes, red.bytes);
}

#[test]
fn empty_chain_is_identity() {
    let image = gradient(Size::new(32, 24));
    let output = run(Vec::new(), &image);
    assert_eq!(output.bytes, image.bytes);
}

#[test]
fn identity_chain_matches_empty_chain() {
    let image = gradient(Size::new(16, 16));
    assert_eq!(run(identities(1), &image), run(Vec::new(), &image));
}

#[test]
fn identity_pair_matches_single_identity() {
    let image = Image::solid(Size::new(64, 64), [255, 0, 0, 255]);
    let single = run(identities(1), &image);
    let pair = run(identities(2), &image);
    assert_eq!(pair, single);

    let image = gradient(Size::new(20, 12));
    assert_eq!(run(identities(3), &image).bytes, image.bytes);
}

#[test]
fn draw_leaves_last_program_bound_and_repeats_exactly() {
    let size = Size::new(16, 8);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &gradient(size));
    let mut chain = FilterChain::new(&ctx, identities(2), None);
    chain.set_size(size).unwrap();

    chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();
    let first = ctx.read_surface();
    assert_eq!(ctx.current_program(), chain.filters()[1].program());
    assert!(ctx.current_program().is_some());
    assert_eq!(ctx.bound_framebuffer(), None);

    chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();
    assert_eq!(ctx.read_surface(), first);
    assert_eq!(ctx.current_program(), chain.filters()[1].program());
    assert!(ctx.errors().is_empty(), "{:?}", ctx.errors());
}

#[test]
fn intermediate_count_is_one_less_than_filters() {
    let size = Size::new(8, 8);
    let ctx = HeadlessContext::new(size);
    for count in 0..4 {
        let mut chain = FilterChain::new(&ctx, identities(count), None);
        chain.set_size(size).unwrap();
        assert_eq!(chain.intermediate_count(), count.max(1) - 1);
        assert_eq!(chain.state(), ChainState::Ready);
    }
}

#[test]
fn resize_releases_previous_intermediates() {
    let ctx = HeadlessContext::new(Size::new(64, 64));
    let input = upload(&ctx, &gradient(Size::new(64, 64)));
    let mut chain = FilterChain::new(&ctx, identities(3), None);

    chain.set_size(Size::new(64, 64)).unwrap();
    assert_eq!(ctx.live_framebuffers(), 2);
    assert_eq!(ctx.live_textures(), 3);

    chain.set_size(Size::new(32, 16)).unwrap();
    assert_eq!(ctx.live_framebuffers(), 2);
    assert_eq!(ctx.live_textures(), 3);
    assert_eq!(ctx.live_programs(), 3);
    assert_eq!(ctx.stale_deletes(), 0);

    ctx.resize_surface(Size::new(32, 16));
    chain
        .frame(&input, &surface(Size::new(32, 16)), &Mat4::IDENTITY, 0, None)
        .unwrap();
    assert_eq!(ctx.read_surface().size, Size::new(32, 16));
}

#[test]
fn zero_size_is_rejected() {
    let ctx = HeadlessContext::new(Size::new(8, 8));
    let mut chain = FilterChain::new(&ctx, identities(1), None);
    assert_eq!(
        chain.set_size(Size::new(0, 8)),
        Err(FilterError::InvalidSize(Size::new(0, 8)))
    );
    assert_eq!(chain.state(), ChainState::Unconfigured);
}

#[test]
fn frame_before_set_size_is_not_ready() {
    let size = Size::new(8, 8);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &gradient(size));
    let mut chain = FilterChain::new(&ctx, identities(1), None);
    assert_eq!(
        chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None),
        Err(FilterError::NotReady)
    );
    assert_eq!(ctx.draw_count(), 0);
}

#[test]
fn context_recreation_recompiles_on_next_frame() {
    let size = Size::new(16, 16);
    let image = gradient(size);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &image);
    let mut chain = FilterChain::new(&ctx, identities(2), None);
    chain.set_size(size).unwrap();
    chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();

    let compiles = ctx.compile_count();
    assert_eq!(compiles, 4);

    ctx.recreate();
    let input = upload(&ctx, &image);
    chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();

    assert_eq!(ctx.compile_count(), compiles + 4);
    assert_eq!(ctx.stale_deletes(), 0);
    assert_eq!(chain.state(), ChainState::Ready);
    assert_eq!(ctx.live_framebuffers(), 1);
    assert_eq!(ctx.read_surface().bytes, image.bytes);
}

#[test]
fn lost_context_fails_until_restored() {
    let size = Size::new(8, 8);
    let image = gradient(size);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &image);
    let mut chain = FilterChain::new(&ctx, identities(1), None);
    chain.set_size(size).unwrap();

    ctx.lose();
    assert_eq!(
        chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None),
        Err(FilterError::ContextLost)
    );
    assert_eq!(chain.set_size(size), Err(FilterError::ContextLost));
    assert_eq!(chain.state(), ChainState::Unconfigured);

    ctx.restore();
    let input = upload(&ctx, &image);
    chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();
    assert_eq!(ctx.read_surface().bytes, image.bytes);
    assert_eq!(ctx.stale_deletes(), 0);
}

#[test]
fn notified_loss_rebuilds_without_deleting() {
    let size = Size::new(8, 8);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &gradient(size));
    let mut chain = FilterChain::new(&ctx, identities(2), None);
    chain.set_size(size).unwrap();

    chain.notify_context_lost();
    assert_eq!(chain.state(), ChainState::Unconfigured);
    assert_eq!(chain.intermediate_count(), 0);

    let compiles = ctx.compile_count();
    chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();
    assert_eq!(ctx.compile_count(), compiles + 4);
}

#[test]
fn compile_failure_is_cached() {
    let size = Size::new(8, 8);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &gradient(size));
    let broken = ShaderFilter::<Ctx>::new("broken", "void main() { gl_FragColor = vec4(1.0);");
    let mut chain = FilterChain::new(&ctx, vec![Box::new(broken)], None);

    let err = chain.set_size(size).unwrap_err();
    assert!(matches!(
        err,
        FilterError::ShaderCompile {
            stage: ShaderStage::Fragment,
            ..
        }
    ));
    assert!(err.is_fatal());
    assert_eq!(chain.state(), ChainState::Sized);

    let compiles = ctx.compile_count();
    assert_eq!(
        chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None),
        Err(err)
    );
    assert_eq!(ctx.compile_count(), compiles);
    assert_eq!(ctx.draw_count(), 0);
    assert_eq!(ctx.live_shaders(), 0);
}

#[test]
fn link_failure_is_reported() {
    let size = Size::new(8, 8);
    let ctx = HeadlessContext::new(size);
    let mismatched = ShaderFilter::<Ctx>::new(
        "mismatched",
        "varying vec2 vMissing;\nvoid main() { gl_FragColor = texture2D(sTexture, vMissing); }",
    );
    let mut chain = FilterChain::new(
        &ctx,
        vec![Box::new(IdentityFilter::<Ctx>::new()), Box::new(mismatched)],
        None,
    );

    let err = chain.set_size(size).unwrap_err();
    assert!(matches!(err, FilterError::ShaderLink { .. }), "{err:?}");
    assert_eq!(ctx.live_shaders(), 0);
    assert_eq!(ctx.live_programs(), 1);
}

#[test]
fn input_target_must_match_options() {
    let size = Size::new(8, 8);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &gradient(size));
    let external = InputTexture::external(input.handle, size);
    let mut chain = FilterChain::new(&ctx, identities(1), None);
    chain.set_size(size).unwrap();

    let err = chain
        .frame(&external, &surface(size), &Mat4::IDENTITY, 0, None)
        .unwrap_err();
    assert!(matches!(err, FilterError::InvalidInput(_)));
}

#[test]
fn external_input_feeds_2d_intermediates() {
    let size = Size::new(12, 10);
    let image = gradient(size);
    let ctx = HeadlessContext::new(size);
    let texture = ctx.import_external(&image).unwrap();
    let input = InputTexture::external(texture, size);
    let options = FilterChainOptions {
        input_target: TextureTarget::ExternalOes,
        ..FilterChainOptions::default()
    };
    let mut chain = FilterChain::new(&ctx, identities(2), Some(&options));
    chain.set_size(size).unwrap();
    chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();

    assert!(ctx.errors().is_empty(), "{:?}", ctx.errors());
    assert_eq!(ctx.read_surface().bytes, image.bytes);
}

#[test]
fn transform_applies_to_first_stage_only() {
    let size = Size::new(2, 2);
    let image = gradient(size);
    // mirror vertically in texture space
    let flip = Mat4::from_translation(Vec3::Y) * Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0));

    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &image);
    let mut chain = FilterChain::new(&ctx, identities(3), None);
    chain.set_size(size).unwrap();
    chain.frame(&input, &surface(size), &flip, 0, None).unwrap();

    let output = ctx.read_surface();
    assert_eq!(output.pixel(0, 0), image.pixel(0, 1));
    assert_eq!(output.pixel(1, 1), image.pixel(1, 0));
}

#[test]
fn set_filters_releases_old_filters() {
    let size = Size::new(8, 8);
    let ctx = HeadlessContext::new(size);
    let mut chain = FilterChain::new(&ctx, identities(3), None);
    chain.set_size(size).unwrap();
    assert_eq!(ctx.live_programs(), 3);

    chain
        .set_filters(vec![
            Box::new(IdentityFilter::<Ctx>::new()),
            Box::new(ColorAdjustFilter::<Ctx>::grayscale()),
        ])
        .unwrap();
    assert_eq!(chain.state(), ChainState::Ready);
    assert_eq!(ctx.live_programs(), 2);
    assert_eq!(ctx.live_framebuffers(), 1);
    assert_eq!(ctx.stale_deletes(), 0);
}

#[test]
fn teardown_is_idempotent_and_runs_on_drop() {
    let size = Size::new(8, 8);
    let ctx = HeadlessContext::new(size);
    {
        let mut chain = FilterChain::new(&ctx, identities(2), None);
        chain.set_size(size).unwrap();
        chain.teardown();
        chain.teardown();
        assert_eq!(ctx.live_programs(), 0);
        assert_eq!(ctx.live_framebuffers(), 0);
        assert_eq!(chain.size(), None);
    }
    {
        let mut chain = FilterChain::new(&ctx, identities(4), None);
        chain.set_size(size).unwrap();
        assert_eq!(ctx.live_programs(), 4);
    }
    assert_eq!(ctx.live_programs(), 0);
    assert_eq!(ctx.live_textures(), 0);
    assert_eq!(ctx.stale_deletes(), 0);
}

#[test]
fn teardown_after_loss_does_not_touch_new_context() {
    let size = Size::new(8, 8);
    let ctx = HeadlessContext::new(size);
    let mut chain = FilterChain::new(&ctx, identities(2), None);
    chain.set_size(size).unwrap();

    ctx.recreate();
    drop(chain);
    assert_eq!(ctx.stale_deletes(), 0);
}

#[test]
fn renders_into_caller_owned_target() {
    let image = gradient(Size::new(8, 8));
    let ctx = HeadlessContext::new(Size::new(1, 1));
    let input = upload(&ctx, &image);
    let target = OwnedFramebuffer::new(
        &ctx,
        image.size,
        ImageFormat::R8G8B8A8Unorm,
        FilterMode::Nearest,
    )
    .unwrap();

    let mut chain = FilterChain::new(&ctx, identities(2), None);
    chain.set_size(image.size).unwrap();
    let viewport = Viewport::new_render_target_sized_origin(Some(target.framebuffer()), image.size);
    chain
        .frame(&input, &viewport, &Mat4::IDENTITY, 0, None)
        .unwrap();

    assert_eq!(ctx.read_texture(target.texture()), Some(image));
    assert_eq!(ctx.bound_framebuffer(), None);
}

#[test]
fn nearest_input_is_upscaled_without_blending() {
    let image = gradient(Size::new(2, 2));
    let size = Size::new(4, 4);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &image).with_filter(FilterMode::Nearest);

    let mut chain = FilterChain::new(&ctx, identities(1), None);
    chain.set_size(size).unwrap();
    chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();

    let output = ctx.read_surface();
    assert_eq!(output.pixel(0, 0), image.pixel(0, 0));
    assert_eq!(output.pixel(1, 0), image.pixel(0, 0));
    assert_eq!(output.pixel(2, 1), image.pixel(1, 0));
    assert_eq!(output.pixel(3, 3), image.pixel(1, 1));
}

/// Compiles like the identity filter but refuses to draw.
struct RefusesToDraw(IdentityFilter<Ctx>);

impl Filter<Ctx> for RefusesToDraw {
    fn name(&self) -> &str {
        "refuses_to_draw"
    }

    fn fragment_shader(&self, target: TextureTarget) -> String {
        self.0.fragment_shader(target)
    }

    fn prepare(&mut self, ctx: &Ctx, target: TextureTarget) -> Result<(), FilterError> {
        self.0.prepare(ctx, target)
    }

    fn draw(&mut self, _ctx: &Ctx, _params: &DrawParams<'_, TextureId>) -> Result<(), FilterError> {
        Err(FilterError::Gl("draw refused".to_owned()))
    }

    fn program(&self) -> Option<ProgramId> {
        self.0.program()
    }

    fn release(&mut self, ctx: &Ctx) {
        self.0.release(ctx)
    }

    fn invalidate(&mut self) {
        self.0.invalidate()
    }
}

#[test]
fn failed_early_stage_leaves_destination_untouched() {
    let size = Size::new(4, 4);
    let image = gradient(size);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &image);

    let mut first = FilterChain::new(&ctx, identities(1), None);
    first.set_size(size).unwrap();
    first.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();

    let mut filters = identities(1);
    filters.insert(0, Box::new(RefusesToDraw(IdentityFilter::new())));
    let mut second = FilterChain::new(&ctx, filters, None);
    second.set_size(size).unwrap();
    assert_eq!(
        second.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None),
        Err(FilterError::Gl("draw refused".to_owned()))
    );
    assert_eq!(ctx.read_surface(), image);
}
