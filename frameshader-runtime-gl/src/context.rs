use crate::draw_quad::GlDrawQuad;
use crate::options::GlContextOptions;
use crate::util::{gl_error_name, gl_shader_stage, gl_texture_target, with_glsl_header, CONTEXT_LOST};
use frameshader_common::{FilterMode, ImageFormat, Size, WrapMode};
use frameshader_runtime::context::{BlendMode, RenderContext, TextureTarget};
use frameshader_runtime::error::{FilterError, Result, ShaderStage};
use frameshader_runtime::uniforms::UniformValue;
use glow::{HasContext, PixelUnpackData};
use std::cell::{Cell, RefCell};
use tracing::{debug, warn};

/// A [`RenderContext`] backed by an OpenGL (ES) context.
///
/// The context does not own the underlying GL context or surface. When the
/// surface is destroyed, call [`mark_lost`](Self::mark_lost), and after a new
/// context is current, [`mark_restored`](Self::mark_restored). Chains using
/// this context rebuild their resources on the next frame.
pub struct GlContext {
    gl: glow::Context,
    quad: RefCell<Option<GlDrawQuad>>,
    generation: Cell<u64>,
    lost: Cell<bool>,
    options: GlContextOptions,
}

impl GlContext {
    /// Wrap a loaded GL context.
    ///
    /// # Safety
    /// `gl` must be current on the calling thread whenever this context is
    /// used, and this context must only be used on that thread.
    pub unsafe fn new(gl: glow::Context, options: Option<&GlContextOptions>) -> Self {
        GlContext {
            gl,
            quad: RefCell::new(None),
            generation: Cell::new(0),
            lost: Cell::new(false),
            options: options.cloned().unwrap_or_default(),
        }
    }

    /// The wrapped GL context.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    pub fn options(&self) -> &GlContextOptions {
        &self.options
    }

    /// Mark the context as lost. Objects created so far are forgotten.
    pub fn mark_lost(&self) {
        if !self.lost.replace(true) {
            warn!(generation = self.generation.get(), "GL context lost");
        }
        self.quad.borrow_mut().take();
    }

    /// Start a new generation after the context was recreated.
    ///
    /// # Safety
    /// The function pointers of the wrapped `glow::Context` must be valid for
    /// the new context, which must be current on the calling thread.
    pub unsafe fn mark_restored(&self) {
        self.quad.borrow_mut().take();
        self.generation.set(self.generation.get() + 1);
        self.lost.set(false);
        debug!(generation = self.generation.get(), "GL context restored");
    }

    fn live(&self) -> Result<()> {
        if self.lost.get() {
            Err(FilterError::ContextLost)
        } else {
            Ok(())
        }
    }

    fn check_error(&self) -> Result<()> {
        match unsafe { self.gl.get_error() } {
            glow::NO_ERROR => Ok(()),
            CONTEXT_LOST => {
                self.mark_lost();
                Err(FilterError::ContextLost)
            }
            error => Err(FilterError::Gl(format!(
                "{} ({error:#x})",
                gl_error_name(error)
            ))),
        }
    }
}

impl RenderContext for GlContext {
    type Shader = glow::NativeShader;
    type Program = glow::NativeProgram;
    type Texture = glow::NativeTexture;
    type Framebuffer = glow::NativeFramebuffer;
    type UniformLocation = glow::NativeUniformLocation;

    fn generation(&self) -> u64 {
        self.generation.get()
    }

    fn is_lost(&self) -> bool {
        self.lost.get()
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Self::Shader> {
        self.live()?;
        let source = with_glsl_header(self.options.glsl_header.as_deref(), source);
        unsafe {
            let shader = self
                .gl
                .create_shader(gl_shader_stage(stage))
                .map_err(FilterError::Gl)?;
            self.gl.shader_source(shader, &source);
            self.gl.compile_shader(shader);

            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(FilterError::ShaderCompile { stage, log });
            }
            Ok(shader)
        }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        if !self.lost.get() {
            unsafe { self.gl.delete_shader(shader) }
        }
    }

    fn link_program(
        &self,
        vertex: Self::Shader,
        fragment: Self::Shader,
        attributes: &[(u32, &str)],
    ) -> Result<Self::Program> {
        self.live()?;
        unsafe {
            let program = self.gl.create_program().map_err(FilterError::Gl)?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            for (location, name) in attributes {
                self.gl.bind_attrib_location(program, *location, name);
            }
            self.gl.link_program(program);
            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(FilterError::ShaderLink { log });
            }
            Ok(program)
        }
    }

    fn delete_program(&self, program: Self::Program) {
        if !self.lost.get() {
            unsafe { self.gl.delete_program(program) }
        }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn set_uniform(&self, location: &Self::UniformLocation, value: &UniformValue) {
        let location = Some(location);
        unsafe {
            match *value {
                UniformValue::Float(x) => self.gl.uniform_1_f32(location, x),
                UniformValue::Vec2([x, y]) => self.gl.uniform_2_f32(location, x, y),
                UniformValue::Vec3([x, y, z]) => self.gl.uniform_3_f32(location, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(location, x, y, z, w),
                UniformValue::Int(x) => self.gl.uniform_1_i32(location, x),
                UniformValue::Mat4(ref m) => self.gl.uniform_matrix_4_f32_slice(location, false, m),
            }
        }
    }

    fn create_texture(
        &self,
        size: Size<u32>,
        format: ImageFormat,
        filter: FilterMode,
        wrap: WrapMode,
    ) -> Result<Self::Texture> {
        self.live()?;
        if size.is_empty() {
            return Err(FilterError::InvalidSize(size));
        }
        if format == ImageFormat::Unknown {
            return Err(FilterError::Gl("unknown texture format".to_owned()));
        }

        unsafe {
            let texture = self.gl.create_texture().map_err(FilterError::Gl)?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_storage_2d(
                glow::TEXTURE_2D,
                1,
                format.into(),
                size.width as i32,
                size.height as i32,
            );
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter.into());
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter.into());
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap.into());
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap.into());
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(texture)
        }
    }

    fn upload_texture(&self, texture: Self::Texture, size: Size<u32>, pixels: &[u8]) -> Result<()> {
        self.live()?;
        if pixels.len() != size.area() * 4 {
            return Err(FilterError::Gl(format!(
                "upload of {} bytes does not match a {}x{} texture",
                pixels.len(),
                size.width,
                size.height
            )));
        }

        unsafe {
            let buffer = self.gl.create_buffer().map_err(FilterError::Gl)?;
            self.gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, Some(buffer));
            self.gl
                .buffer_data_u8_slice(glow::PIXEL_UNPACK_BUFFER, pixels, glow::STREAM_DRAW);

            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
            self.gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                0,
                0,
                size.width as i32,
                size.height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::BufferOffset(0),
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);

            self.gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, None);
            self.gl.delete_buffer(buffer);
        }
        self.check_error()
    }

    fn delete_texture(&self, texture: Self::Texture) {
        if !self.lost.get() {
            unsafe { self.gl.delete_texture(texture) }
        }
    }

    fn bind_texture(&self, unit: u32, target: TextureTarget, texture: Option<Self::Texture>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(gl_texture_target(target), texture);
        }
    }

    fn set_sampling(&self, unit: u32, target: TextureTarget, filter: FilterMode, wrap: WrapMode) {
        // external images only support clamping
        let wrap = match target {
            TextureTarget::ExternalOes => WrapMode::ClampToEdge,
            TextureTarget::Texture2D => wrap,
        };
        let target = gl_texture_target(target);
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter.into());
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter.into());
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrap.into());
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrap.into());
        }
    }

    fn create_framebuffer(&self, texture: Self::Texture) -> Result<Self::Framebuffer> {
        self.live()?;
        unsafe {
            let framebuffer = self.gl.create_framebuffer().map_err(FilterError::Gl)?;
            self.gl
                .bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );

            let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                self.gl.delete_framebuffer(framebuffer);
                return Err(FilterError::FramebufferInit(status));
            }
            Ok(framebuffer)
        }
    }

    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer) {
        if !self.lost.get() {
            unsafe { self.gl.delete_framebuffer(framebuffer) }
        }
    }

    fn bind_framebuffer(&self, framebuffer: Option<Self::Framebuffer>) {
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) }
    }

    fn set_viewport(&self, x: i32, y: i32, size: Size<u32>) {
        unsafe {
            self.gl
                .viewport(x, y, size.width as i32, size.height as i32)
        }
    }

    fn clear(&self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        unsafe {
            self.gl.color_mask(true, true, true, true);
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn set_blend(&self, blend: Option<BlendMode>) {
        unsafe {
            match blend {
                Some(BlendMode::Alpha) => {
                    self.gl.enable(glow::BLEND);
                    self.gl.blend_func_separate(
                        glow::SRC_ALPHA,
                        glow::ONE_MINUS_SRC_ALPHA,
                        glow::ONE,
                        glow::ONE_MINUS_SRC_ALPHA,
                    );
                }
                None => self.gl.disable(glow::BLEND),
            }
        }
    }

    fn draw_quad(&self) -> Result<()> {
        self.live()?;
        let mut quad = self.quad.borrow_mut();
        if quad.is_none() {
            *quad = Some(GlDrawQuad::new(&self.gl)?);
        }

        if let Some(quad) = quad.as_ref() {
            unsafe {
                self.gl.disable(glow::CULL_FACE);
                self.gl.disable(glow::DEPTH_TEST);
                quad.draw(&self.gl);
            }
        }
        drop(quad);
        self.check_error()
    }
}

impl Drop for GlContext {
    fn drop(&mut self) {
        if let Some(quad) = self.quad.get_mut().take() {
            if !self.lost.get() {
                unsafe { quad.delete(&self.gl) }
            }
        }
    }
}
