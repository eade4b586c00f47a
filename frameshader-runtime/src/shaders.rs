//! The shader interface shared by every filter.
//!
//! Filters agree on a fixed set of names so that [`BaseFilter`](crate::base::BaseFilter)
//! can upload uniforms without knowing the concrete filter.

use crate::context::TextureTarget;

/// Vertex position in normalized device coordinates.
pub const POSITION_ATTRIBUTE: &str = "aPosition";
/// Texture coordinate of the quad corner, in `[0, 1]`.
pub const TEXCOORD_ATTRIBUTE: &str = "aTextureCoord";
pub const POSITION_LOCATION: u32 = 0;
pub const TEXCOORD_LOCATION: u32 = 1;

/// Model-view-projection matrix applied to the quad.
pub const MVP_UNIFORM: &str = "uMVPMatrix";
/// Texture matrix applied to the quad's texture coordinates. For the
/// first stage of a chain this is the decoder transform.
pub const TEX_MATRIX_UNIFORM: &str = "uTexMatrix";
/// The input frame, always on texture unit 0.
pub const SAMPLER_UNIFORM: &str = "sTexture";
pub const TEXCOORD_VARYING: &str = "vTextureCoord";

/// Presentation time of the frame in seconds, uploaded if declared.
pub const TIME_UNIFORM: &str = "uTime";
/// Size of the output in pixels, uploaded if declared.
pub const FRAME_SIZE_UNIFORM: &str = "uFrameSize";

/// Attribute bindings applied before linking every program.
pub const ATTRIBUTE_BINDINGS: [(u32, &str); 2] = [
    (POSITION_LOCATION, POSITION_ATTRIBUTE),
    (TEXCOORD_LOCATION, TEXCOORD_ATTRIBUTE),
];

pub const DEFAULT_VERTEX_SHADER: &str = "\
uniform mat4 uMVPMatrix;
uniform mat4 uTexMatrix;
attribute vec4 aPosition;
attribute vec4 aTextureCoord;
varying vec2 vTextureCoord;
void main() {
    gl_Position = uMVPMatrix * aPosition;
    vTextureCoord = (uTexMatrix * aTextureCoord).xy;
}
";

const EXTERNAL_PRELUDE: &str = "\
#extension GL_OES_EGL_image_external : require
precision mediump float;
varying vec2 vTextureCoord;
uniform samplerExternalOES sTexture;
";

const TEXTURE_2D_PRELUDE: &str = "\
precision mediump float;
varying vec2 vTextureCoord;
uniform sampler2D sTexture;
";

const PASSTHROUGH_BODY: &str = "\
void main() {
    gl_FragColor = texture2D(sTexture, vTextureCoord);
}
";

/// The declarations every fragment shader sampling `target` starts with:
/// precision, the `vTextureCoord` varying and the `sTexture` sampler.
pub fn fragment_prelude(target: TextureTarget) -> &'static str {
    match target {
        TextureTarget::Texture2D => TEXTURE_2D_PRELUDE,
        TextureTarget::ExternalOes => EXTERNAL_PRELUDE,
    }
}

/// Prefix a fragment shader body with the declarations for `target`.
///
/// The body may declare additional uniforms and must define `main`.
pub fn fragment_shader(target: TextureTarget, body: &str) -> String {
    let prelude = fragment_prelude(target);
    let mut source = String::with_capacity(prelude.len() + body.len());
    source.push_str(prelude);
    source.push_str(body);
    source
}

pub fn create_default_vertex_shader() -> String {
    DEFAULT_VERTEX_SHADER.to_owned()
}

/// A fragment shader that copies the input unchanged.
pub fn create_default_fragment_shader(target: TextureTarget) -> String {
    fragment_shader(target, PASSTHROUGH_BODY)
}
