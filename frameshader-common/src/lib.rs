//! Common types shared by the frameshader runtimes.

#[cfg(feature = "opengl")]
pub mod gl;

pub mod map;
pub mod viewport;

pub use viewport::Viewport;

use num_traits::AsPrimitive;

/// Pixel formats for textures and render targets.
#[repr(u32)]
#[derive(Default, Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageFormat {
    #[default]
    Unknown = 0,
    R8G8B8A8Unorm,
    R8G8B8A8Srgb,
    R16G16B16A16Sfloat,
    R32G32B32A32Sfloat,
}

/// Texture sampling filter.
#[repr(i32)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterMode {
    #[default]
    Linear = 0,
    Nearest,
}

/// Texture addressing mode outside of `[0, 1]`.
#[repr(i32)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WrapMode {
    ClampToBorder,
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// A width and height pair.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub fn new(width: T, height: T) -> Self {
        Size { width, height }
    }
}

impl Size<u32> {
    /// Whether either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl<T> From<Size<T>> for [f32; 2]
where
    T: Copy + AsPrimitive<f32>,
{
    fn from(value: Size<T>) -> Self {
        [value.width.as_(), value.height.as_()]
    }
}
