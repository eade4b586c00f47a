pub use image::ImageError;
use crate::error::{FilterError, Result};
use frameshader_common::Size;

use std::path::Path;

/// An RGBA8 image in CPU memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub bytes: Vec<u8>,
    pub size: Size<u32>,
    pub pitch: usize,
}

/// The direction of UV coordinates to load the image for.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UVDirection {
    /// Origin is at the top left.
    TopLeft,
    /// Origin is at the bottom left (OpenGL)
    BottomLeft,
}

impl Image {
    /// Load the image from the path as RGBA8.
    pub fn load(path: impl AsRef<Path>, direction: UVDirection) -> std::result::Result<Self, ImageError> {
        let mut image = image::open(path.as_ref())?;

        if direction == UVDirection::BottomLeft {
            image = image.flipv();
        }

        let image = image.to_rgba8();

        let height = image.height();
        let width = image.width();
        let pitch = image
            .sample_layout()
            .height_stride
            .max(image.sample_layout().width_stride);

        Ok(Image {
            bytes: image.into_raw(),
            pitch,
            size: Size { height, width },
        })
    }

    /// Wrap tightly packed RGBA8 pixels.
    pub fn from_rgba(bytes: Vec<u8>, size: Size<u32>) -> Result<Self> {
        if bytes.len() != size.area() * 4 {
            return Err(FilterError::Image(format!(
                "expected {} bytes for a {}x{} image, got {}",
                size.area() * 4,
                size.width,
                size.height,
                bytes.len()
            )));
        }

        Ok(Image {
            bytes,
            size,
            pitch: size.width as usize * 4,
        })
    }

    /// An image filled with one color.
    pub fn solid(size: Size<u32>, rgba: [u8; 4]) -> Self {
        Image {
            bytes: rgba.repeat(size.area()),
            size,
            pitch: size.width as usize * 4,
        }
    }

    /// Mirror the rows of the image.
    pub fn flip_vertical(&mut self) {
        if self.pitch == 0 {
            return;
        }
        let flipped = self
            .bytes
            .chunks_exact(self.pitch)
            .rev()
            .flatten()
            .copied()
            .collect();
        self.bytes = flipped;
    }

    /// The pixel at `(x, y)`, counted from the first row in memory.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let offset = y as usize * self.pitch + x as usize * 4;
        let px = self.bytes.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}
