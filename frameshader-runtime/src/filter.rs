use crate::context::{RenderContext, TextureTarget};
use crate::error::Result;
use crate::program::ShaderSources;
use crate::shaders;
use crate::texture::InputTexture;
use frameshader_common::Size;
use glam::Mat4;

/// Per-draw parameters of a filter.
#[derive(Debug, Copy, Clone)]
pub struct DrawParams<'a, T> {
    /// The texture to sample, bound to unit 0 as `sTexture`.
    pub input: &'a InputTexture<T>,
    /// Uploaded as `uTexMatrix`.
    pub tex_matrix: &'a Mat4,
    /// Uploaded as `uMVPMatrix`.
    pub mvp: &'a Mat4,
    /// The size of the target being drawn into.
    pub output_size: Size<u32>,
    /// Presentation time of the frame.
    pub timestamp_nanos: i64,
}

/// A unit of per-frame GPU pixel transformation.
///
/// Filters are created once, sized with [`set_size`](Self::set_size) before
/// their first draw, and released when the chain or the context is torn down.
/// The chain only interacts with filters through this trait, so new filters
/// can be plugged in without touching it.
pub trait Filter<C: RenderContext> {
    /// A short name for logging.
    fn name(&self) -> &str;

    /// The fragment shader source for an input of kind `target`.
    ///
    /// The source must declare the `vTextureCoord` varying and the `sTexture`
    /// sampler, and compile against [`vertex_shader`](Self::vertex_shader).
    fn fragment_shader(&self, target: TextureTarget) -> String;

    /// The vertex shader source. Defaults to the quad shader that applies
    /// `uMVPMatrix` to the position and `uTexMatrix` to the texture coordinate.
    fn vertex_shader(&self) -> String {
        shaders::create_default_vertex_shader()
    }

    /// Both stages of the program drawn for an input of kind `target`.
    fn sources(&self, target: TextureTarget) -> ShaderSources {
        ShaderSources::new(self.vertex_shader(), self.fragment_shader(target))
    }

    /// Called when the frame size is known, and again on every resize.
    fn set_size(&mut self, _ctx: &C, _size: Size<u32>) -> Result<()> {
        Ok(())
    }

    /// Compile the program for inputs of kind `target` if it is not already.
    ///
    /// Returns the cached error if compilation failed before.
    fn prepare(&mut self, ctx: &C, target: TextureTarget) -> Result<()>;

    /// Draw the input into the currently bound target.
    ///
    /// On success the filter's program is left bound and blending is disabled.
    fn draw(&mut self, ctx: &C, params: &DrawParams<'_, C::Texture>) -> Result<()>;

    /// The program bound by the last successful draw, if compiled.
    fn program(&self) -> Option<C::Program>;

    /// Delete all GPU objects owned by the filter. Idempotent.
    fn release(&mut self, ctx: &C);

    /// Forget all GPU objects without deleting them, because the context
    /// they were created in is gone.
    fn invalidate(&mut self);

    /// The value of a runtime parameter.
    fn parameter(&self, _name: &str) -> Option<f32> {
        None
    }

    /// Set a runtime parameter, returning the previous value.
    ///
    /// Unknown parameters are ignored and `None` is returned.
    fn set_parameter(&mut self, _name: &str, _value: f32) -> Option<f32> {
        None
    }

    /// The names of the runtime parameters of this filter.
    fn parameter_names(&self) -> Vec<&str> {
        Vec::new()
    }
}
