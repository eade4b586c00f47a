use frameshader_common::{Size, Viewport};
use frameshader_runtime::base::BaseFilter;
use frameshader_runtime::chain::FilterChain;
use frameshader_runtime::context::TextureTarget;
use frameshader_runtime::error::{FilterError, ShaderStage};
use frameshader_runtime::filter::{DrawParams, Filter};
use frameshader_runtime::filters::{
    ColorAdjustFilter, FragmentSource, GeometryFilter, IdentityFilter, OverlayFilter, ShaderFilter,
};
use frameshader_runtime::headless::{FramebufferId, HeadlessContext, ProgramId, TextureId};
use frameshader_runtime::image::Image;
use frameshader_runtime::parameters::FilterChainParameters;
use frameshader_runtime::program::ProgramState;
use frameshader_runtime::texture::InputTexture;
use frameshader_runtime::transform::Transform;
use frameshader_runtime::uniforms::UniformValue;
use frameshader_runtime::glam::{Mat4, Vec3};

type Ctx = HeadlessContext;

const BLACK: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn quadrants() -> Image {
    // bottom-left, bottom-right, top-left, top-right
    let bytes = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255], [255, 255, 0, 255]].concat();
    Image::from_rgba(bytes, Size::new(2, 2)).unwrap()
}

fn upload(ctx: &Ctx, image: &Image) -> InputTexture<TextureId> {
    let texture = ctx.create_texture_from_image(image).unwrap();
    InputTexture::new(texture, image.size)
}

fn surface(size: Size<u32>) -> Viewport<'static, Option<FramebufferId>> {
    Viewport::new_render_target_sized_origin(None, size)
}

fn draw_once(ctx: &Ctx, filter: Box<dyn Filter<Ctx>>, image: &Image) -> Image {
    let input = upload(ctx, image);
    let mut chain = FilterChain::new(ctx, vec![filter], None);
    chain.set_size(image.size).unwrap();
    chain
        .frame(&input, &surface(image.size), &Mat4::IDENTITY, 0, None)
        .unwrap();
    ctx.read_surface()
}

fn corner_overlay(opacity: f32) -> OverlayFilter<Ctx> {
    OverlayFilter::<Ctx>::new(
        Image::solid(Size::new(2, 2), WHITE),
        Transform {
            size: [0.5, 0.5],
            position: [0.25, 0.25],
            rotation: 0.0,
            opacity,
        },
    )
}

#[test]
fn overlay_is_placed_in_top_left_quadrant() {
    let size = Size::new(4, 4);
    let ctx = HeadlessContext::new(size);
    let output = draw_once(&ctx, Box::new(corner_overlay(1.0)), &Image::solid(size, BLACK));

    for y in 0..4 {
        for x in 0..4 {
            let expected = if x < 2 && y >= 2 { WHITE } else { BLACK };
            assert_eq!(output.pixel(x, y), Some(expected), "pixel {x},{y}");
        }
    }
    assert!(!ctx.blend_enabled());
}

#[test]
fn overlay_opacity_blends_with_frame() {
    let size = Size::new(4, 4);
    let ctx = HeadlessContext::new(size);
    let output = draw_once(&ctx, Box::new(corner_overlay(0.5)), &Image::solid(size, BLACK));
    assert_eq!(output.pixel(0, 3), Some([128, 128, 128, 255]));
    assert_eq!(output.pixel(3, 0), Some(BLACK));
}

#[test]
fn overlay_opacity_is_a_parameter() {
    let mut overlay = corner_overlay(0.5);
    assert_eq!(Filter::<Ctx>::parameter(&overlay, "uOpacity"), Some(0.5));
    assert_eq!(Filter::<Ctx>::set_parameter(&mut overlay, "uOpacity", 0.25), Some(0.5));
    assert_eq!(overlay.transform().opacity, 0.25);
    assert_eq!(Filter::<Ctx>::set_parameter(&mut overlay, "uOther", 1.0), None);
}

#[test]
fn overlay_survives_context_recreation() {
    let size = Size::new(4, 4);
    let black = Image::solid(size, BLACK);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &black);
    let mut chain = FilterChain::new(&ctx, vec![Box::new(corner_overlay(1.0))], None);
    chain.set_size(size).unwrap();
    chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();
    let before = ctx.read_surface();

    ctx.recreate();
    let input = upload(&ctx, &black);
    chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();
    assert_eq!(ctx.read_surface(), before);
    assert_eq!(ctx.stale_deletes(), 0);

    drop(chain);
    // only the input is left
    assert_eq!(ctx.live_textures(), 1);
}

#[test]
fn overlay_from_missing_file_is_an_image_error() {
    let result = OverlayFilter::<Ctx>::from_path("does/not/exist.png", Transform::default());
    assert!(matches!(result, Err(FilterError::Image(_))));
}

#[test]
fn geometry_flip_mirrors_rows() {
    let image = quadrants();
    let ctx = HeadlessContext::new(image.size);
    let output = draw_once(&ctx, Box::new(GeometryFilter::<Ctx>::flip_vertical()), &image);
    assert_eq!(output.pixel(0, 0), image.pixel(0, 1));
    assert_eq!(output.pixel(1, 1), image.pixel(1, 0));
}

#[test]
fn geometry_rotation_half_turn() {
    let image = quadrants();
    let ctx = HeadlessContext::new(image.size);
    let output = draw_once(&ctx, Box::new(GeometryFilter::<Ctx>::rotation(180.0)), &image);
    assert_eq!(output.pixel(0, 0), image.pixel(1, 1));
    assert_eq!(output.pixel(1, 0), image.pixel(0, 1));
}

#[test]
fn color_adjust_uploads_its_uniforms() {
    let size = Size::new(4, 4);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &Image::solid(size, WHITE));
    let mut chain = FilterChain::new(&ctx, vec![Box::new(ColorAdjustFilter::<Ctx>::grayscale())], None);
    chain.set_size(size).unwrap();
    chain.frame(&input, &surface(size), &Mat4::IDENTITY, 0, None).unwrap();

    let program = chain.filters()[0].program().unwrap();
    assert_eq!(
        ctx.uniform_value(program, "uSaturation"),
        Some(UniformValue::Float(0.0))
    );
    assert_eq!(
        ctx.uniform_value(program, "uContrast"),
        Some(UniformValue::Float(1.0))
    );
    assert_eq!(
        ctx.uniform_value(program, "uMVPMatrix"),
        Some(UniformValue::Mat4(Mat4::IDENTITY.to_cols_array()))
    );
    assert_eq!(ctx.uniform_value(program, "sTexture"), Some(UniformValue::Int(0)));
}

#[test]
fn timestamp_is_uploaded_in_seconds() {
    let size = Size::new(4, 4);
    let ctx = HeadlessContext::new(size);
    let input = upload(&ctx, &Image::solid(size, WHITE));
    let pulse = ShaderFilter::<Ctx>::new(
        "pulse",
        "uniform float uTime;\nvoid main() { gl_FragColor = texture2D(sTexture, vTextureCoord) * uTime; }",
    );
    let mut chain = FilterChain::new(&ctx, vec![Box::new(pulse)], None);
    chain.set_size(size).unwrap();
    chain
        .frame(&input, &surface(size), &Mat4::IDENTITY, 1_500_000_000, None)
        .unwrap();

    let program = chain.filters()[0].program().unwrap();
    assert_eq!(
        ctx.uniform_value(program, "uTime"),
        Some(UniformValue::Float(1.5))
    );
}

#[test]
fn custom_vertex_stage_replaces_texture_matrix() {
    let image = quadrants();
    let ctx = HeadlessContext::new(image.size);
    let input = upload(&ctx, &image);
    let vertex = "\
uniform mat4 uMVPMatrix;
attribute vec4 aPosition;
attribute vec4 aTextureCoord;
varying vec2 vTextureCoord;
void main() {
    gl_Position = uMVPMatrix * aPosition;
    vTextureCoord = aTextureCoord.xy;
}
";
    let filter = ShaderFilter::<Ctx>::new(
        "straight",
        "void main() { gl_FragColor = texture2D(sTexture, vTextureCoord); }",
    )
    .with_vertex_shader(vertex);
    assert_eq!(Filter::<Ctx>::vertex_shader(&filter), vertex);

    let flip = Mat4::from_translation(Vec3::Y) * Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0));
    let mut chain = FilterChain::new(&ctx, vec![Box::new(filter)], None);
    chain.set_size(image.size).unwrap();
    chain
        .frame(&input, &surface(image.size), &flip, 0, None)
        .unwrap();
    assert_eq!(ctx.read_surface(), image);
}

#[test]
fn complete_source_is_used_verbatim() {
    let source = "#extension GL_OES_EGL_image_external : require\nvoid main() { gl_FragColor = vec4(1.0); }";
    let filter = ShaderFilter::<Ctx>::from_source("solid", FragmentSource::Complete(source.to_owned()));
    assert_eq!(filter.fragment_shader(TextureTarget::Texture2D), source);
    assert_eq!(filter.fragment_shader(TextureTarget::ExternalOes), source);
}

#[test]
fn chain_parameters_are_addressed_by_filter_index() {
    let ctx = HeadlessContext::new(Size::new(4, 4));
    let mut chain = FilterChain::new(
        &ctx,
        vec![
            Box::new(ColorAdjustFilter::<Ctx>::default()),
            Box::new(GeometryFilter::<Ctx>::rotation(90.0)),
            Box::new(ShaderFilter::<Ctx>::new(
                "tint",
                "uniform float uStrength;\nvoid main() { gl_FragColor = texture2D(sTexture, vTextureCoord) * uStrength; }",
            )
            .with_parameter("uStrength", 0.5)),
        ],
        None,
    );

    assert_eq!(chain.get_parameter(0, "uSaturation"), Some(1.0));
    assert_eq!(chain.set_parameter(0, "uSaturation", 0.0), Some(1.0));
    assert_eq!(chain.get_parameter(0, "uSaturation"), Some(0.0));
    assert_eq!(chain.get_parameter(1, "rotation"), Some(90.0));
    assert_eq!(chain.get_parameter(2, "uStrength"), Some(0.5));
    assert_eq!(chain.set_parameter(0, "uUnknown", 1.0), None);
    assert_eq!(chain.set_parameter(7, "uSaturation", 1.0), None);
    assert_eq!(chain.parameters().len(), 6);
}

#[test]
fn undeclared_parameters_are_skipped() {
    let size = Size::new(2, 2);
    let ctx = HeadlessContext::new(size);
    let filter = ShaderFilter::<Ctx>::new(
        "passthrough",
        "void main() { gl_FragColor = texture2D(sTexture, vTextureCoord); }",
    )
    .with_parameter("uNotThere", 2.0);
    let image = quadrants();
    let output = draw_once(&ctx, Box::new(filter), &image);
    assert_eq!(output, image);
    assert!(ctx.errors().is_empty(), "{:?}", ctx.errors());
}

#[test]
fn clones_start_uncompiled() {
    let ctx = HeadlessContext::new(Size::new(2, 2));
    let mut filter = IdentityFilter::<Ctx>::new();
    filter.prepare(&ctx, TextureTarget::Texture2D).unwrap();
    assert!(filter.program().is_some());
    assert!(filter.base().state().is_ready());

    let clone = filter.clone();
    assert!(clone.program().is_none());

    filter.release(&ctx);
    filter.release(&ctx);
    assert_eq!(ctx.live_programs(), 0);
    assert_eq!(ctx.stale_deletes(), 0);
}

#[test]
fn target_change_recompiles() {
    let ctx = HeadlessContext::new(Size::new(2, 2));
    let mut filter = IdentityFilter::<Ctx>::new();
    filter.prepare(&ctx, TextureTarget::Texture2D).unwrap();
    let first = filter.program();
    filter.prepare(&ctx, TextureTarget::ExternalOes).unwrap();
    assert_ne!(filter.program(), first);
    assert_eq!(ctx.live_programs(), 1);
    assert_eq!(ctx.compile_count(), 4);
}

/// A filter outside the catalog whose fragment stage is fixed at construction.
struct FixedFragment {
    base: BaseFilter<Ctx>,
    fragment: &'static str,
}

impl FixedFragment {
    fn new(fragment: &'static str) -> Self {
        FixedFragment {
            base: BaseFilter::new(),
            fragment,
        }
    }
}

impl Filter<Ctx> for FixedFragment {
    fn name(&self) -> &str {
        "fixed"
    }

    fn fragment_shader(&self, _target: TextureTarget) -> String {
        self.fragment.to_owned()
    }

    fn prepare(&mut self, ctx: &Ctx, target: TextureTarget) -> Result<(), FilterError> {
        let sources = self.base.needs_compile(target).then(|| self.sources(target));
        self.base.prepare(ctx, target, sources)
    }

    fn draw(&mut self, ctx: &Ctx, params: &DrawParams<'_, TextureId>) -> Result<(), FilterError> {
        self.prepare(ctx, params.input.target)?;
        self.base.draw(ctx, params)
    }

    fn program(&self) -> Option<ProgramId> {
        self.base.program()
    }

    fn release(&mut self, ctx: &Ctx) {
        self.base.release(ctx)
    }

    fn invalidate(&mut self) {
        self.base.invalidate()
    }
}

#[test]
fn program_is_built_from_the_filter_sources() {
    let ctx = HeadlessContext::new(Size::new(2, 2));
    let mut filter = FixedFragment::new("void main() { gl_FragColor = vec4(1.0); }");
    filter.prepare(&ctx, TextureTarget::Texture2D).unwrap();
    match filter.base.state() {
        ProgramState::Ready(program) => {
            assert_eq!(program.sources(), &filter.sources(TextureTarget::Texture2D))
        }
        state => panic!("expected a compiled program, got {state:?}"),
    }
}

#[test]
fn invalid_fragment_shader_fails_set_size() {
    let ctx = HeadlessContext::new(Size::new(4, 4));
    let broken = FixedFragment::new("void main() { gl_FragColor = vec4(1.0);");
    let mut chain = FilterChain::new(&ctx, vec![Box::new(broken)], None);
    assert!(matches!(
        chain.set_size(Size::new(4, 4)),
        Err(FilterError::ShaderCompile {
            stage: ShaderStage::Fragment,
            ..
        })
    ));
}

#[test]
fn invalid_vertex_override_fails_set_size() {
    let ctx = HeadlessContext::new(Size::new(4, 4));
    let filter = ShaderFilter::<Ctx>::new(
        "bad_vertex",
        "void main() { gl_FragColor = texture2D(sTexture, vTextureCoord); }",
    )
    .with_vertex_shader("void main() {");
    let mut chain = FilterChain::new(&ctx, vec![Box::new(filter)], None);
    assert!(matches!(
        chain.set_size(Size::new(4, 4)),
        Err(FilterError::ShaderCompile {
            stage: ShaderStage::Vertex,
            ..
        })
    ));
}

#[test]
fn failures_are_cached_per_target() {
    let ctx = HeadlessContext::new(Size::new(2, 2));
    let mut filter = ShaderFilter::<Ctx>::new("broken", "void main() { gl_FragColor = vec4(1.0);");
    let oes = TextureTarget::ExternalOes;
    let flat = TextureTarget::Texture2D;

    let flat_error = filter.prepare(&ctx, flat).unwrap_err();
    let oes_error = filter.prepare(&ctx, oes).unwrap_err();
    let compiles = ctx.compile_count();

    for _ in 0..2 {
        assert_eq!(filter.prepare(&ctx, flat), Err(flat_error.clone()));
        assert_eq!(filter.prepare(&ctx, oes), Err(oes_error.clone()));
    }
    assert_eq!(ctx.compile_count(), compiles);
    assert_eq!(ctx.live_shaders(), 0);

    // releasing forgets the failures
    filter.release(&ctx);
    assert!(filter.prepare(&ctx, flat).is_err());
    assert!(ctx.compile_count() > compiles);
}
