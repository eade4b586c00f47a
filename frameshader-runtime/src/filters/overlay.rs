use crate::base::BaseFilter;
use crate::context::{BlendMode, RenderContext, TextureTarget};
use crate::error::{FilterError, Result};
use crate::filter::{DrawParams, Filter};
use crate::image::{Image, UVDirection};
use crate::program::ShaderSources;
use crate::shaders::{
    create_default_fragment_shader, create_default_vertex_shader, fragment_shader,
};
use crate::texture::InputTexture;
use crate::transform::{filter_mvp_matrix, vp_matrix, Transform};
use crate::uniforms::ShaderParameter;
use frameshader_common::{FilterMode, ImageFormat, Size, WrapMode};
use glam::Mat4;
use std::path::Path;
use std::sync::Arc;

pub const OPACITY: &str = "uOpacity";

const OVERLAY_BODY: &str = "\
uniform float uOpacity;
void main() {
    vec4 color = texture2D(sTexture, vTextureCoord);
    gl_FragColor = vec4(color.rgb, color.a * uOpacity);
}
";

/// Draws the input, then blends an image over it.
///
/// The image is placed by a [`Transform`] relative to the frame and uploaded
/// when the filter is sized. Its alpha is multiplied by the transform's
/// opacity.
pub struct OverlayFilter<C: RenderContext> {
    frame: BaseFilter<C>,
    overlay: BaseFilter<C>,
    image: Arc<Image>,
    transform: Transform,
    texture: Option<C::Texture>,
    mvp: Mat4,
}

impl<C: RenderContext> OverlayFilter<C> {
    /// Create an overlay from an RGBA8 image whose first row is the bottom row.
    pub fn new(image: Image, transform: Transform) -> Self {
        OverlayFilter {
            frame: BaseFilter::new(),
            overlay: BaseFilter::with_uniforms(vec![ShaderParameter::new(
                OPACITY,
                transform.opacity,
            )]),
            image: Arc::new(image),
            transform,
            texture: None,
            mvp: Mat4::IDENTITY,
        }
    }

    /// Load the overlay image from disk.
    pub fn from_path(path: impl AsRef<Path>, transform: Transform) -> Result<Self> {
        let image = Image::load(path, UVDirection::BottomLeft)?;
        Ok(Self::new(image, transform))
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.overlay.set_parameter(OPACITY, transform.opacity);
        self.update_mvp();
    }

    /// The placement of the overlay quad for the current frame size.
    pub fn mvp(&self) -> &Mat4 {
        &self.mvp
    }

    fn update_mvp(&mut self) {
        if let Some(size) = self.frame.size() {
            let vp = vp_matrix(0.0, size.aspect_ratio());
            self.mvp = filter_mvp_matrix(&vp, &self.transform);
        }
    }

    fn upload(&mut self, ctx: &C) -> Result<C::Texture> {
        if let Some(texture) = self.texture {
            return Ok(texture);
        }

        let texture = ctx.create_texture(
            self.image.size,
            ImageFormat::R8G8B8A8Unorm,
            FilterMode::Linear,
            WrapMode::ClampToEdge,
        )?;
        if let Err(e) = ctx.upload_texture(texture, self.image.size, &self.image.bytes) {
            ctx.delete_texture(texture);
            return Err(e);
        }
        self.texture = Some(texture);
        Ok(texture)
    }
}

impl<C: RenderContext> Clone for OverlayFilter<C> {
    fn clone(&self) -> Self {
        OverlayFilter {
            frame: self.frame.clone(),
            overlay: self.overlay.clone(),
            image: Arc::clone(&self.image),
            transform: self.transform,
            texture: None,
            mvp: self.mvp,
        }
    }
}

impl<C: RenderContext> Filter<C> for OverlayFilter<C> {
    fn name(&self) -> &str {
        "overlay"
    }

    /// The shader that draws the frame underneath the overlay.
    fn fragment_shader(&self, target: TextureTarget) -> String {
        create_default_fragment_shader(target)
    }

    fn set_size(&mut self, ctx: &C, size: Size<u32>) -> Result<()> {
        self.frame.set_size(size);
        self.overlay.set_size(size);
        self.update_mvp();
        self.upload(ctx).map(|_| ())
    }

    fn prepare(&mut self, ctx: &C, target: TextureTarget) -> Result<()> {
        let sources = self.frame.needs_compile(target).then(|| self.sources(target));
        self.frame.prepare(ctx, target, sources)?;

        let overlay_target = TextureTarget::Texture2D;
        let sources = self.overlay.needs_compile(overlay_target).then(|| {
            ShaderSources::new(
                create_default_vertex_shader(),
                fragment_shader(overlay_target, OVERLAY_BODY),
            )
        });
        self.overlay.prepare(ctx, overlay_target, sources)
    }

    fn draw(&mut self, ctx: &C, params: &DrawParams<'_, C::Texture>) -> Result<()> {
        let texture = self.texture.ok_or(FilterError::NotReady)?;
        self.prepare(ctx, params.input.target)?;
        self.frame.draw(ctx, params)?;

        let input = InputTexture::new(texture, self.image.size);
        let mvp = *params.mvp * self.mvp;
        let overlay_params = DrawParams {
            input: &input,
            tex_matrix: &Mat4::IDENTITY,
            mvp: &mvp,
            ..*params
        };

        ctx.set_blend(Some(BlendMode::Alpha));
        let result = self.overlay.draw(ctx, &overlay_params);
        ctx.set_blend(None);
        result
    }

    fn program(&self) -> Option<C::Program> {
        self.overlay.program()
    }

    fn release(&mut self, ctx: &C) {
        self.frame.release(ctx);
        self.overlay.release(ctx);
        if let Some(texture) = self.texture.take() {
            ctx.delete_texture(texture);
        }
    }

    fn invalidate(&mut self) {
        self.frame.invalidate();
        self.overlay.invalidate();
        self.texture = None;
    }

    fn parameter(&self, name: &str) -> Option<f32> {
        self.overlay.parameter(name)
    }

    fn set_parameter(&mut self, name: &str, value: f32) -> Option<f32> {
        let old = self.overlay.set_parameter(name, value)?;
        if name == OPACITY {
            self.transform.opacity = value;
        }
        Some(old)
    }

    fn parameter_names(&self) -> Vec<&str> {
        self.overlay.parameter_names()
    }
}
