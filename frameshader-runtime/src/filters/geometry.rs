use crate::base::BaseFilter;
use crate::context::{RenderContext, TextureTarget};
use crate::error::Result;
use crate::filter::{DrawParams, Filter};
use crate::shaders::create_default_fragment_shader;
use crate::transform::TextureTransform;
use frameshader_common::Size;

pub const ROTATION: &str = "rotation";
pub const SCALE: &str = "scale";

/// Rotates, zooms or mirrors the frame about its centre.
///
/// The adjustment is folded into the texture matrix of each draw, ahead of
/// the decoder transform.
pub struct GeometryFilter<C: RenderContext> {
    base: BaseFilter<C>,
    transform: TextureTransform,
}

impl<C: RenderContext> GeometryFilter<C> {
    pub fn new(transform: TextureTransform) -> Self {
        GeometryFilter {
            base: BaseFilter::new(),
            transform,
        }
    }

    pub fn rotation(degrees: f32) -> Self {
        Self::new(TextureTransform {
            rotation: degrees,
            ..TextureTransform::default()
        })
    }

    pub fn flip_vertical() -> Self {
        Self::new(TextureTransform {
            flip_y: true,
            ..TextureTransform::default()
        })
    }

    pub fn flip_horizontal() -> Self {
        Self::new(TextureTransform {
            flip_x: true,
            ..TextureTransform::default()
        })
    }

    pub fn transform(&self) -> &TextureTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: TextureTransform) {
        self.transform = transform;
    }
}

impl<C: RenderContext> Clone for GeometryFilter<C> {
    fn clone(&self) -> Self {
        GeometryFilter {
            base: self.base.clone(),
            transform: self.transform,
        }
    }
}

impl<C: RenderContext> Filter<C> for GeometryFilter<C> {
    fn name(&self) -> &str {
        "geometry"
    }

    fn fragment_shader(&self, target: TextureTarget) -> String {
        create_default_fragment_shader(target)
    }

    fn set_size(&mut self, _ctx: &C, size: Size<u32>) -> Result<()> {
        self.base.set_size(size);
        Ok(())
    }

    fn prepare(&mut self, ctx: &C, target: TextureTarget) -> Result<()> {
        let sources = self.base.needs_compile(target).then(|| self.sources(target));
        self.base.prepare(ctx, target, sources)
    }

    fn draw(&mut self, ctx: &C, params: &DrawParams<'_, C::Texture>) -> Result<()> {
        self.prepare(ctx, params.input.target)?;
        let tex_matrix = self.transform.apply(params.tex_matrix);
        let params = DrawParams {
            tex_matrix: &tex_matrix,
            ..*params
        };
        self.base.draw(ctx, &params)
    }

    fn program(&self) -> Option<C::Program> {
        self.base.program()
    }

    fn release(&mut self, ctx: &C) {
        self.base.release(ctx)
    }

    fn invalidate(&mut self) {
        self.base.invalidate()
    }

    fn parameter(&self, name: &str) -> Option<f32> {
        match name {
            ROTATION => Some(self.transform.rotation),
            // uniform zoom only
            SCALE => Some(self.transform.scale[0]),
            _ => None,
        }
    }

    fn set_parameter(&mut self, name: &str, value: f32) -> Option<f32> {
        match name {
            ROTATION => Some(std::mem::replace(&mut self.transform.rotation, value)),
            SCALE => {
                let old = self.transform.scale[0];
                self.transform.scale = [value, value];
                Some(old)
            }
            _ => None,
        }
    }

    fn parameter_names(&self) -> Vec<&str> {
        vec![ROTATION, SCALE]
    }
}
