use crate::{FilterMode, ImageFormat, WrapMode};

impl From<ImageFormat> for u32 {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Unknown => 0,
            ImageFormat::R8G8B8A8Unorm => glow::RGBA8,
            ImageFormat::R8G8B8A8Srgb => glow::SRGB8_ALPHA8,
            ImageFormat::R16G16B16A16Sfloat => glow::RGBA16F,
            ImageFormat::R32G32B32A32Sfloat => glow::RGBA32F,
        }
    }
}

impl From<WrapMode> for i32 {
    fn from(value: WrapMode) -> Self {
        (match value {
            WrapMode::ClampToBorder => glow::CLAMP_TO_BORDER,
            WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
            WrapMode::Repeat => glow::REPEAT,
            WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
        }) as i32
    }
}

impl From<FilterMode> for i32 {
    fn from(value: FilterMode) -> Self {
        (match value {
            FilterMode::Linear => glow::LINEAR,
            FilterMode::Nearest => glow::NEAREST,
        }) as i32
    }
}
