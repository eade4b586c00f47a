use crate::base::BaseFilter;
use crate::context::{RenderContext, TextureTarget};
use crate::error::Result;
use crate::filter::{DrawParams, Filter};
use crate::shaders::fragment_shader;
use crate::uniforms::ShaderParameter;
use frameshader_common::Size;

pub const BRIGHTNESS: &str = "uBrightness";
pub const CONTRAST: &str = "uContrast";
pub const SATURATION: &str = "uSaturation";

const COLOR_ADJUST_BODY: &str = "\
uniform float uBrightness;
uniform float uContrast;
uniform float uSaturation;
const vec3 luma = vec3(0.2126, 0.7152, 0.0722);
void main() {
    vec4 color = texture2D(sTexture, vTextureCoord);
    vec3 rgb = color.rgb + uBrightness;
    rgb = (rgb - 0.5) * uContrast + 0.5;
    float grey = dot(rgb, luma);
    rgb = mix(vec3(grey), rgb, uSaturation);
    gl_FragColor = vec4(clamp(rgb, 0.0, 1.0), color.a);
}
";

/// Adjusts brightness, contrast and saturation.
///
/// Brightness is an offset added to every channel, contrast scales around
/// mid-grey and saturation interpolates between the luma and the color.
/// The neutral values are `0`, `1` and `1`.
pub struct ColorAdjustFilter<C: RenderContext> {
    base: BaseFilter<C>,
}

impl<C: RenderContext> ColorAdjustFilter<C> {
    pub fn new(brightness: f32, contrast: f32, saturation: f32) -> Self {
        ColorAdjustFilter {
            base: BaseFilter::with_uniforms(vec![
                ShaderParameter::new(BRIGHTNESS, brightness),
                ShaderParameter::new(CONTRAST, contrast),
                ShaderParameter::new(SATURATION, saturation),
            ]),
        }
    }

    /// Removes all color.
    pub fn grayscale() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    pub fn brightness(&self) -> f32 {
        self.base.parameter(BRIGHTNESS).unwrap_or(0.0)
    }

    pub fn contrast(&self) -> f32 {
        self.base.parameter(CONTRAST).unwrap_or(1.0)
    }

    pub fn saturation(&self) -> f32 {
        self.base.parameter(SATURATION).unwrap_or(1.0)
    }
}

impl<C: RenderContext> Default for ColorAdjustFilter<C> {
    fn default() -> Self {
        Self::new(0.0, 1.0, 1.0)
    }
}

impl<C: RenderContext> Clone for ColorAdjustFilter<C> {
    fn clone(&self) -> Self {
        ColorAdjustFilter {
            base: self.base.clone(),
        }
    }
}

impl<C: RenderContext> Filter<C> for ColorAdjustFilter<C> {
    fn name(&self) -> &str {
        "color_adjust"
    }

    fn fragment_shader(&self, target: TextureTarget) -> String {
        fragment_shader(target, COLOR_ADJUST_BODY)
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
        self.base.draw(ctx, params)
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
        self.base.parameter(name)
    }

    fn set_parameter(&mut self, name: &str, value: f32) -> Option<f32> {
        self.base.set_parameter(name, value)
    }

    fn parameter_names(&self) -> Vec<&str> {
        self.base.parameter_names()
    }
}
