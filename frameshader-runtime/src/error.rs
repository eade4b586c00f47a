//! Error types for the filter runtime.

use frameshader_common::Size;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Error type for filters and filter chains.
///
/// Compile and link failures are cached by the failing filter, so the
/// error is `Clone`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A shader stage failed to compile.
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    /// The program failed to link.
    #[error("shader program failed to link: {log}")]
    ShaderLink { log: String },
    /// A frame was drawn before the chain was configured.
    #[error("filter chain is not ready, call set_size before drawing")]
    NotReady,
    /// The render context is lost. Resources are rebuilt on the next configure.
    #[error("render context was lost")]
    ContextLost,
    /// An offscreen framebuffer could not be completed.
    #[error("framebuffer incomplete (status {0:#x})")]
    FramebufferInit(u32),
    /// A zero-sized frame was requested.
    #[error("invalid frame size {}x{}", .0.width, .0.height)]
    InvalidSize(Size<u32>),
    /// The input texture does not match the chain configuration.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The backend failed to create or use an object.
    #[error("graphics backend error: {0}")]
    Gl(String),
    /// An overlay image could not be loaded.
    #[error("image error: {0}")]
    Image(String),
}

impl From<image::ImageError> for FilterError {
    fn from(value: image::ImageError) -> Self {
        FilterError::Image(value.to_string())
    }
}

impl FilterError {
    /// Whether the error is an authoring defect of a filter, and will not go
    /// away by retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FilterError::ShaderCompile { .. } | FilterError::ShaderLink { .. }
        )
    }
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;
