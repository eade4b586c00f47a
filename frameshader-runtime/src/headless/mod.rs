//! A CPU reference implementation of [`RenderContext`].
//!
//! `HeadlessContext` validates shader sources, tracks every object it hands
//! out and rasterizes draws on the CPU, so that filter chains can be tested
//! without a GPU. The rasterizer models the default vertex stage
//! (`uMVPMatrix * aPosition`, `uTexMatrix * aTextureCoord`) and a fragment
//! stage that fetches the bound sampler, optionally multiplying its alpha by
//! a `uOpacity` uniform. Other shader arithmetic is not evaluated.
//!
//! Objects live in a single generation. [`HeadlessContext::lose`] simulates a
//! lost context: every object is dropped and the generation advances, so any
//! later use of an old handle is detected as stale.

mod glsl;
mod raster;

use crate::context::{BlendMode, RenderContext, TextureTarget};
use crate::error::{FilterError, Result, ShaderStage};
use crate::image::Image;
use crate::shaders::{MVP_UNIFORM, TEX_MATRIX_UNIFORM};
use crate::uniforms::UniformValue;
use frameshader_common::map::FastHashMap;
use frameshader_common::{FilterMode, ImageFormat, Size, WrapMode};
use glam::{Mat4, Vec3};
use glsl::{Declaration, UniformDecl};
use raster::TexelBuffer;
use std::cell::{Cell, RefCell};

/// The uniform the headless fragment stage multiplies alpha with.
pub const OPACITY_UNIFORM: &str = "uOpacity";

const FRAMEBUFFER_INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ShaderId(u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FramebufferId(u32);

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformLocation {
    program: ProgramId,
    index: usize,
}

struct ShaderObject {
    stage: ShaderStage,
    declarations: Vec<Declaration>,
}

struct ProgramObject {
    uniforms: Vec<(UniformDecl, Option<UniformValue>)>,
}

impl ProgramObject {
    fn value(&self, name: &str) -> Option<Option<&UniformValue>> {
        self.uniforms
            .iter()
            .find(|(decl, _)| decl.name == name)
            .map(|(_, value)| value.as_ref())
    }

    /// A matrix uniform. Undeclared matrices are treated as identity, as a
    /// custom vertex stage would not apply them.
    fn matrix(&self, name: &str) -> Mat4 {
        match self.value(name) {
            None => Mat4::IDENTITY,
            Some(Some(UniformValue::Mat4(m))) => Mat4::from_cols_array(m),
            Some(_) => Mat4::ZERO,
        }
    }
}

#[derive(Default)]
struct State {
    next_id: u32,
    shaders: FastHashMap<u32, ShaderObject>,
    programs: FastHashMap<u32, ProgramObject>,
    textures: FastHashMap<u32, TexelBuffer>,
    framebuffers: FastHashMap<u32, TextureId>,
    units: FastHashMap<u32, (TextureTarget, TextureId)>,
    current_program: Option<ProgramId>,
    framebuffer: Option<FramebufferId>,
    viewport: (i32, i32, Size<u32>),
    blend: Option<BlendMode>,
    compile_count: usize,
    link_count: usize,
    draw_count: usize,
    stale_deletes: usize,
    errors: Vec<String>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn clear_objects(&mut self) {
        self.shaders.clear();
        self.programs.clear();
        self.textures.clear();
        self.framebuffers.clear();
        self.units.clear();
        self.current_program = None;
        self.framebuffer = None;
        self.blend = None;
    }
}

/// A render context that renders on the CPU.
pub struct HeadlessContext {
    state: RefCell<State>,
    surface: RefCell<TexelBuffer>,
    generation: Cell<u64>,
    lost: Cell<bool>,
}

impl HeadlessContext {
    /// Create a context whose default framebuffer is an RGBA8 surface of `size`.
    pub fn new(surface: Size<u32>) -> Self {
        let state = State {
            viewport: (0, 0, surface),
            ..State::default()
        };
        HeadlessContext {
            state: RefCell::new(state),
            surface: RefCell::new(Self::surface_buffer(surface)),
            generation: Cell::new(0),
            lost: Cell::new(false),
        }
    }

    fn surface_buffer(size: Size<u32>) -> TexelBuffer {
        TexelBuffer::new(
            size,
            ImageFormat::R8G8B8A8Unorm,
            FilterMode::Nearest,
            WrapMode::ClampToEdge,
            TextureTarget::Texture2D,
        )
    }

    /// Simulate losing the context. Every object is dropped and the
    /// generation advances.
    pub fn lose(&self) {
        self.lost.set(true);
        self.generation.set(self.generation.get() + 1);
        self.state.borrow_mut().clear_objects();
    }

    /// Make a lost context usable again.
    pub fn restore(&self) {
        self.lost.set(false);
    }

    /// Lose and immediately restore the context, as happens when a surface
    /// is recreated.
    pub fn recreate(&self) {
        self.lose();
        self.restore();
    }

    /// Replace the default framebuffer with a cleared surface of `size`.
    pub fn resize_surface(&self, size: Size<u32>) {
        *self.surface.borrow_mut() = Self::surface_buffer(size);
    }

    /// Create a 2D texture filled with `image`.
    pub fn create_texture_from_image(&self, image: &Image) -> Result<TextureId> {
        let texture = self.create_texture(
            image.size,
            ImageFormat::R8G8B8A8Unorm,
            FilterMode::Linear,
            WrapMode::ClampToEdge,
        )?;
        self.upload_texture(texture, image.size, &image.bytes)?;
        Ok(texture)
    }

    /// Create an external texture filled with `image`, like a decoder
    /// output frame.
    pub fn import_external(&self, image: &Image) -> Result<TextureId> {
        if self.lost.get() {
            return Err(FilterError::ContextLost);
        }
        let mut buffer = TexelBuffer::new(
            image.size,
            ImageFormat::R8G8B8A8Unorm,
            FilterMode::Linear,
            WrapMode::ClampToEdge,
            TextureTarget::ExternalOes,
        );
        buffer.load_rgba8(&image.bytes);

        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.textures.insert(id, buffer);
        Ok(TextureId(id))
    }

    /// Read back a texture as RGBA8, bottom row first.
    pub fn read_texture(&self, texture: TextureId) -> Option<Image> {
        let state = self.state.borrow();
        let buffer = state.textures.get(&texture.0)?;
        Image::from_rgba(buffer.to_rgba8(), buffer.size).ok()
    }

    /// Read back the default framebuffer as RGBA8, bottom row first.
    pub fn read_surface(&self) -> Image {
        let surface = self.surface.borrow();
        Image {
            bytes: surface.to_rgba8(),
            size: surface.size,
            pitch: surface.size.width as usize * 4,
        }
    }

    /// Number of shader compilations attempted.
    pub fn compile_count(&self) -> usize {
        self.state.borrow().compile_count
    }

    /// Number of program links attempted.
    pub fn link_count(&self) -> usize {
        self.state.borrow().link_count
    }

    /// Number of quads drawn.
    pub fn draw_count(&self) -> usize {
        self.state.borrow().draw_count
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.state.borrow().framebuffers.len()
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current_program
    }

    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.state.borrow().framebuffer
    }

    pub fn blend_enabled(&self) -> bool {
        self.state.borrow().blend.is_some()
    }

    /// Number of deletions of objects that do not exist in the current
    /// generation, including double deletes.
    pub fn stale_deletes(&self) -> usize {
        self.state.borrow().stale_deletes
    }

    /// Invalid operations recorded so far, like a drained `glGetError`.
    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    /// The value last uploaded to a uniform of a program.
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        state.programs.get(&program.0)?.value(name)?.copied()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.lost.get() {
            Err(FilterError::ContextLost)
        } else {
            Ok(())
        }
    }

    fn rasterize(&self, state: &mut State) -> Result<()> {
        let program_id = state
            .current_program
            .ok_or_else(|| FilterError::Gl("draw without a bound program".to_owned()))?;
        let program = state
            .programs
            .get(&program_id.0)
            .ok_or_else(|| FilterError::Gl(format!("draw with deleted program {program_id:?}")))?;

        let mvp = program.matrix(MVP_UNIFORM);
        let tex_matrix = program.matrix(TEX_MATRIX_UNIFORM);
        let opacity = match program.value(OPACITY_UNIFORM) {
            Some(Some(UniformValue::Float(opacity))) => *opacity,
            Some(_) => 0.0,
            None => 1.0,
        };

        let sampler = program
            .uniforms
            .iter()
            .find(|(decl, _)| decl.ty.starts_with("sampler"));
        let source = match sampler {
            None => None,
            Some((decl, value)) => {
                let unit = match value {
                    Some(UniformValue::Int(unit)) => *unit as u32,
                    _ => 0,
                };
                let expected = if decl.ty == "samplerExternalOES" {
                    TextureTarget::ExternalOes
                } else {
                    TextureTarget::Texture2D
                };
                match state.units.get(&unit) {
                    Some((target, _)) if *target != expected => {
                        return Err(FilterError::Gl(format!(
                            "{} '{}' sampled from a {target:?} binding",
                            decl.ty, decl.name
                        )))
                    }
                    Some((_, texture)) => state.textures.get(&texture.0).map(|t| (*texture, t.clone())),
                    None => None,
                }
            }
        };

        let destination = match state.framebuffer {
            Some(framebuffer) => Some(
                *state
                    .framebuffers
                    .get(&framebuffer.0)
                    .ok_or_else(|| FilterError::Gl(format!("draw into deleted {framebuffer:?}")))?,
            ),
            None => None,
        };
        if let (Some(destination), Some((source, _))) = (destination, &source) {
            if destination == *source {
                return Err(FilterError::Gl("texture is both sampled and rendered to".to_owned()));
            }
        }

        state.draw_count += 1;

        // position = mvp * (x, y, 0, 1), solved for (x, y) per pixel
        let (a, b) = (mvp.x_axis.x, mvp.y_axis.x);
        let (c, d) = (mvp.x_axis.y, mvp.y_axis.y);
        let (tx, ty) = (mvp.w_axis.x, mvp.w_axis.y);
        let det = a * d - b * c;
        if det.abs() < f32::EPSILON {
            return Ok(());
        }

        let (vx, vy, vsize) = state.viewport;
        let blend = state.blend;
        let mut surface = self.surface.borrow_mut();
        let target = match destination {
            Some(texture) => state
                .textures
                .get_mut(&texture.0)
                .ok_or_else(|| FilterError::Gl(format!("draw into deleted {texture:?}")))?,
            None => &mut *surface,
        };

        const EDGE: f32 = 1e-5;
        for py in 0..vsize.height {
            for px in 0..vsize.width {
                let (fx, fy) = (vx + px as i32, vy + py as i32);
                if fx < 0 || fy < 0 {
                    continue;
                }
                let nx = (px as f32 + 0.5) / vsize.width as f32 * 2.0 - 1.0 - tx;
                let ny = (py as f32 + 0.5) / vsize.height as f32 * 2.0 - 1.0 - ty;
                let qx = (d * nx - b * ny) / det;
                let qy = (a * ny - c * nx) / det;
                if qx.abs() > 1.0 + EDGE || qy.abs() > 1.0 + EDGE {
                    continue;
                }

                let st = tex_matrix
                    .transform_point3(Vec3::new((qx + 1.0) / 2.0, (qy + 1.0) / 2.0, 0.0));
                let mut color = match &source {
                    Some((_, texture)) => texture.sample(st.x, st.y),
                    // incomplete texture
                    None => [0.0, 0.0, 0.0, 1.0],
                };
                color[3] *= opacity;

                let (fx, fy) = (fx as u32, fy as u32);
                if let Some(dst) = target.texel(fx, fy) {
                    target.write(fx, fy, raster::blend(blend, color, dst));
                }
            }
        }
        Ok(())
    }
}

impl RenderContext for HeadlessContext {
    type Shader = ShaderId;
    type Program = ProgramId;
    type Texture = TextureId;
    type Framebuffer = FramebufferId;
    type UniformLocation = UniformLocation;

    fn generation(&self) -> u64 {
        self.generation.get()
    }

    fn is_lost(&self) -> bool {
        self.lost.get()
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderId> {
        self.ensure_live()?;
        let mut state = self.state.borrow_mut();
        state.compile_count += 1;
        let declarations = glsl::compile(stage, source)
            .map_err(|log| FilterError::ShaderCompile { stage, log })?;
        let id = state.next_id();
        state.shaders.insert(
            id,
            ShaderObject {
                stage,
                declarations,
            },
        );
        Ok(ShaderId(id))
    }

    fn delete_shader(&self, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader.0).is_none() {
            state.stale_deletes += 1;
        }
    }

    fn link_program(
        &self,
        vertex: ShaderId,
        fragment: ShaderId,
        _attributes: &[(u32, &str)],
    ) -> Result<ProgramId> {
        self.ensure_live()?;
        let mut state = self.state.borrow_mut();
        state.link_count += 1;

        let stages = (state.shaders.get(&vertex.0), state.shaders.get(&fragment.0));
        let uniforms = match stages {
            (Some(v), Some(f)) if v.stage == ShaderStage::Vertex && f.stage == ShaderStage::Fragment => {
                glsl::link(&v.declarations, &f.declarations)
            }
            _ => Err("ERROR: program needs one vertex and one fragment shader".to_owned()),
        }
        .map_err(|log| FilterError::ShaderLink { log })?;

        let id = state.next_id();
        state.programs.insert(
            id,
            ProgramObject {
                uniforms: uniforms.into_iter().map(|u| (u, None)).collect(),
            },
        );
        Ok(ProgramId(id))
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program.0).is_none() {
            state.stale_deletes += 1;
        }
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        let mut state = self.state.borrow_mut();
        match program {
            Some(id) if !state.programs.contains_key(&id.0) => {
                state.errors.push(format!("use of unknown program {id:?}"));
                state.current_program = None;
            }
            _ => state.current_program = program,
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let index = state
            .programs
            .get(&program.0)?
            .uniforms
            .iter()
            .position(|(decl, _)| decl.name == name)?;
        Some(UniformLocation { program, index })
    }

    fn set_uniform(&self, location: &UniformLocation, value: &UniformValue) {
        let mut state = self.state.borrow_mut();
        if state.current_program != Some(location.program) {
            state
                .errors
                .push(format!("uniform set on unbound program {:?}", location.program));
            return;
        }
        if let Some(slot) = state
            .programs
            .get_mut(&location.program.0)
            .and_then(|p| p.uniforms.get_mut(location.index))
        {
            slot.1 = Some(*value);
        }
    }

    fn create_texture(
        &self,
        size: Size<u32>,
        format: ImageFormat,
        filter: FilterMode,
        wrap: WrapMode,
    ) -> Result<TextureId> {
        self.ensure_live()?;
        if size.is_empty() {
            return Err(FilterError::InvalidSize(size));
        }
        if format == ImageFormat::Unknown {
            return Err(FilterError::Gl("unknown texture format".to_owned()));
        }
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.textures.insert(
            id,
            TexelBuffer::new(size, format, filter, wrap, TextureTarget::Texture2D),
        );
        Ok(TextureId(id))
    }

    fn upload_texture(&self, texture: TextureId, size: Size<u32>, pixels: &[u8]) -> Result<()> {
        self.ensure_live()?;
        let mut state = self.state.borrow_mut();
        let buffer = state
            .textures
            .get_mut(&texture.0)
            .ok_or_else(|| FilterError::Gl(format!("upload to unknown {texture:?}")))?;
        if buffer.size != size || pixels.len() != size.area() * 4 {
            return Err(FilterError::Gl(format!(
                "upload of {} bytes does not match a {}x{} texture",
                pixels.len(),
                buffer.size.width,
                buffer.size.height
            )));
        }
        buffer.load_rgba8(pixels);
        Ok(())
    }

    fn delete_texture(&self, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        if state.textures.remove(&texture.0).is_none() {
            state.stale_deletes += 1;
        }
        state.units.retain(|_, (_, bound)| *bound != texture);
    }

    fn bind_texture(&self, unit: u32, target: TextureTarget, texture: Option<TextureId>) {
        let mut state = self.state.borrow_mut();
        let Some(texture) = texture else {
            state.units.remove(&unit);
            return;
        };
        match state.textures.get(&texture.0).map(|t| t.target) {
            Some(kind) if kind == target => {
                state.units.insert(unit, (target, texture));
            }
            Some(kind) => state
                .errors
                .push(format!("{texture:?} is a {kind:?} texture, bound as {target:?}")),
            None => state.errors.push(format!("bind of unknown {texture:?}")),
        }
    }

    fn set_sampling(&self, unit: u32, target: TextureTarget, filter: FilterMode, wrap: WrapMode) {
        let mut state = self.state.borrow_mut();
        let Some((bound, texture)) = state.units.get(&unit).copied() else {
            state.errors.push(format!("sampling set on empty unit {unit}"));
            return;
        };
        if bound != target {
            state
                .errors
                .push(format!("unit {unit} holds a {bound:?} texture, not {target:?}"));
            return;
        }
        if let Some(buffer) = state.textures.get_mut(&texture.0) {
            buffer.filter = filter;
            buffer.wrap = wrap;
        }
    }

    fn create_framebuffer(&self, texture: TextureId) -> Result<FramebufferId> {
        self.ensure_live()?;
        let mut state = self.state.borrow_mut();
        match state.textures.get(&texture.0) {
            Some(t) if t.target == TextureTarget::Texture2D => {}
            _ => return Err(FilterError::FramebufferInit(FRAMEBUFFER_INCOMPLETE_ATTACHMENT)),
        }
        let id = state.next_id();
        state.framebuffers.insert(id, texture);
        Ok(FramebufferId(id))
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        let mut state = self.state.borrow_mut();
        if state.framebuffers.remove(&framebuffer.0).is_none() {
            state.stale_deletes += 1;
        }
        if state.framebuffer == Some(framebuffer) {
            state.framebuffer = None;
        }
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
        let mut state = self.state.borrow_mut();
        match framebuffer {
            Some(id) if !state.framebuffers.contains_key(&id.0) => {
                state.errors.push(format!("bind of unknown {id:?}"));
            }
            _ => state.framebuffer = framebuffer,
        }
    }

    fn set_viewport(&self, x: i32, y: i32, size: Size<u32>) {
        self.state.borrow_mut().viewport = (x, y, size);
    }

    fn clear(&self, color: [f32; 4]) {
        if self.lost.get() {
            return;
        }
        let mut state = self.state.borrow_mut();
        match state.framebuffer {
            Some(framebuffer) => {
                let texture = state.framebuffers.get(&framebuffer.0).copied();
                if let Some(buffer) = texture.and_then(|t| state.textures.get_mut(&t.0)) {
                    buffer.fill(color);
                }
            }
            None => self.surface.borrow_mut().fill(color),
        }
    }

    fn set_blend(&self, blend: Option<BlendMode>) {
        self.state.borrow_mut().blend = blend;
    }

    fn draw_quad(&self) -> Result<()> {
        self.ensure_live()?;
        let mut state = self.state.borrow_mut();
        let result = self.rasterize(&mut state);
        if let Err(e) = &result {
            state.errors.push(e.to_string());
        }
        result
    }
}
