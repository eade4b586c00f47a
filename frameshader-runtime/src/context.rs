use crate::error::{Result, ShaderStage};
use crate::uniforms::UniformValue;
use frameshader_common::{FilterMode, ImageFormat, Size, WrapMode};
use std::fmt::Debug;

/// The kind of texture a sampler reads from.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureTarget {
    /// A regular 2D texture. Intermediate targets are always 2D.
    #[default]
    Texture2D,
    /// An external image texture (`samplerExternalOES`), as produced by
    /// hardware decoders through a surface texture.
    ExternalOes,
}

/// Blending applied to draws.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlendMode {
    /// Source-over with straight alpha:
    /// `rgb = src.rgb * src.a + dst.rgb * (1 - src.a)`, `a = src.a + dst.a * (1 - src.a)`.
    Alpha,
}

/// A GPU context that filters and filter chains render with.
///
/// The context is owned externally, typically by the decoder/encoder surface
/// setup, and borrowed by the chain. All methods must be called on the thread
/// that owns the context.
///
/// Handles returned by a context are only valid for the [generation](Self::generation)
/// they were created in. Once the generation changes they must be forgotten, not
/// deleted.
pub trait RenderContext: 'static {
    type Shader: Copy + Debug;
    type Program: Copy + Debug + PartialEq;
    type Texture: Copy + Debug + PartialEq;
    type Framebuffer: Copy + Debug + PartialEq;
    type UniformLocation: Clone + Debug;

    /// Identifies the current incarnation of the context. Changes whenever the
    /// context or its surface is recreated.
    fn generation(&self) -> u64;

    /// Whether the context is currently unusable.
    fn is_lost(&self) -> bool;

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Self::Shader>;
    fn delete_shader(&self, shader: Self::Shader);

    /// Link a program, binding each `(location, name)` attribute before linking.
    fn link_program(
        &self,
        vertex: Self::Shader,
        fragment: Self::Shader,
        attributes: &[(u32, &str)],
    ) -> Result<Self::Program>;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    /// Upload a uniform to the currently bound program.
    fn set_uniform(&self, location: &Self::UniformLocation, value: &UniformValue);

    fn create_texture(
        &self,
        size: Size<u32>,
        format: ImageFormat,
        filter: FilterMode,
        wrap: WrapMode,
    ) -> Result<Self::Texture>;

    /// Replace the contents of an RGBA8 texture. Rows are bottom to top.
    fn upload_texture(&self, texture: Self::Texture, size: Size<u32>, pixels: &[u8])
        -> Result<()>;
    fn delete_texture(&self, texture: Self::Texture);
    fn bind_texture(&self, unit: u32, target: TextureTarget, texture: Option<Self::Texture>);

    /// Set how the texture bound to `unit` is sampled.
    fn set_sampling(&self, unit: u32, target: TextureTarget, filter: FilterMode, wrap: WrapMode);

    fn create_framebuffer(&self, texture: Self::Texture) -> Result<Self::Framebuffer>;
    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer);

    /// Bind a render target. `None` binds the default framebuffer of the surface.
    fn bind_framebuffer(&self, framebuffer: Option<Self::Framebuffer>);

    fn set_viewport(&self, x: i32, y: i32, size: Size<u32>);
    fn clear(&self, color: [f32; 4]);
    fn set_blend(&self, blend: Option<BlendMode>);

    /// Draw the full-screen quad as a 4 vertex triangle strip. Attribute 0
    /// carries the position in `[-1, 1]`, attribute 1 the texture coordinate
    /// in `[0, 1]`.
    fn draw_quad(&self) -> Result<()>;
}
