#![forbid(missing_docs)]
//! GPU shader filter chains for video transcoding.
//!
//! frameshader applies an ordered list of filters to every decoded video
//! frame before it is handed to the encoder. Each filter is a shader program;
//! the chain routes the output of one filter into the next through offscreen
//! framebuffers and draws the last filter into the encoder's surface.
//!
//! ## Usage
//! Create a render context for the GPU API in use, build a
//! [`FilterChain`](runtime::FilterChain) from a list of filters and call
//! [`set_size`](runtime::FilterChain::set_size) once the frame size is known.
//! Then call [`frame`](runtime::FilterChain::frame) for every decoded frame
//! with its texture, transform matrix and presentation timestamp.
//!
//! ## Runtimes
//!
//! | **API**             | **`frameshader` feature** |
//! |---------------------|---------------------------|
//! | OpenGL ES 3.0 / 3.3 | `gl`                      |
//! | CPU reference       | `headless`                |

/// Filter chains and the render context abstraction.
pub mod runtime {
    pub use frameshader_runtime::binding::{ContextBinding, ContextStatus};
    pub use frameshader_runtime::chain::{ChainState, FilterChain};
    pub use frameshader_runtime::context::{BlendMode, RenderContext, TextureTarget};
    pub use frameshader_runtime::error::{FilterError, Result, ShaderStage};
    pub use frameshader_runtime::options::{FilterChainOptions, FrameOptions};
    pub use frameshader_runtime::parameters::FilterChainParameters;
    pub use frameshader_runtime::texture::{InputTexture, OwnedFramebuffer};

    #[cfg(feature = "gl")]
    /// Render context for OpenGL ES 3.0 and OpenGL 3.3.
    ///
    /// The GL context must be current on the calling thread, and `glow`
    /// must be loaded with its function pointers.
    pub mod gl {
        pub use frameshader_runtime_gl::*;
    }

    #[cfg(feature = "headless")]
    /// A CPU render context for tests and tooling.
    pub mod headless {
        pub use frameshader_runtime::headless::*;
    }
}

/// Filters and the filter authoring surface.
pub mod filters {
    pub use frameshader_runtime::base::BaseFilter;
    pub use frameshader_runtime::filter::{DrawParams, Filter};
    pub use frameshader_runtime::filters::*;
    pub use frameshader_runtime::program::{LazyProgram, ProgramState, ShaderProgram, ShaderSources};
    pub use frameshader_runtime::shaders;
    pub use frameshader_runtime::uniforms::{ShaderParameter, UniformValue};

    /// Helpers to deal with image loading.
    pub mod image {
        pub use frameshader_runtime::image::*;
    }
}

/// Frame geometry helpers.
pub mod transform {
    pub use frameshader_runtime::{glam, Mat4};
    pub use frameshader_runtime::transform::*;
}

pub use frameshader_common::{FilterMode, ImageFormat, Size, Viewport, WrapMode};
