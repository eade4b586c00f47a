//! OpenGL render context for the frameshader filter chain.
//!
//! [`GlContext`] implements [`RenderContext`](frameshader_runtime::context::RenderContext)
//! over [`glow`], targeting OpenGL ES 3.0 and desktop OpenGL 3.3. Filter
//! shaders are written in GLSL ES 1.00; on desktop GL, set
//! [`GlContextOptions::glsl_header`] to a `#version` line the driver accepts.
//!
//! Frames from hardware decoders are sampled through `GL_TEXTURE_EXTERNAL_OES`
//! when the chain is created with an external input target.

mod context;
mod draw_quad;
mod options;
mod util;

pub use context::GlContext;
pub use options::GlContextOptions;
