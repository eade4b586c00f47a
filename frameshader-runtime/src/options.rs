//! Filter chain configuration.

use crate::context::TextureTarget;
use frameshader_common::{FilterMode, ImageFormat};

/// Options for each frame.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameOptions {
    /// Clear the destination with the chain's clear color before the last
    /// stage draws into it.
    pub clear: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        FrameOptions { clear: true }
    }
}

/// Options for filter chain creation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterChainOptions {
    /// The kind of texture frames are supplied as.
    pub input_target: TextureTarget,
    /// The format of the intermediate targets between stages.
    pub intermediate_format: ImageFormat,
    /// How later stages sample intermediate targets.
    pub intermediate_filter: FilterMode,
    pub clear_color: [f32; 4],
}

impl Default for FilterChainOptions {
    fn default() -> Self {
        FilterChainOptions {
            input_target: TextureTarget::Texture2D,
            intermediate_format: ImageFormat::R8G8B8A8Unorm,
            intermediate_filter: FilterMode::Linear,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}
