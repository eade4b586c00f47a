//! Texel storage, sampling and blending for the headless context.

use crate::context::{BlendMode, TextureTarget};
use frameshader_common::{FilterMode, ImageFormat, Size, WrapMode};

#[derive(Debug, Clone)]
pub(crate) struct TexelBuffer {
    pub size: Size<u32>,
    pub format: ImageFormat,
    pub filter: FilterMode,
    pub wrap: WrapMode,
    pub target: TextureTarget,
    /// Rows from bottom to top.
    pub texels: Vec<[f32; 4]>,
}

impl TexelBuffer {
    pub fn new(
        size: Size<u32>,
        format: ImageFormat,
        filter: FilterMode,
        wrap: WrapMode,
        target: TextureTarget,
    ) -> Self {
        TexelBuffer {
            size,
            format,
            filter,
            wrap,
            target,
            texels: vec![[0.0; 4]; size.area()],
        }
    }

    pub fn quantize(&self, color: [f32; 4]) -> [f32; 4] {
        match self.format {
            ImageFormat::R8G8B8A8Unorm | ImageFormat::R8G8B8A8Srgb => {
                color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() / 255.0)
            }
            _ => color,
        }
    }

    pub fn write(&mut self, x: u32, y: u32, color: [f32; 4]) {
        let color = self.quantize(color);
        if let Some(texel) = self.texel_mut(x, y) {
            *texel = color;
        }
    }

    pub fn texel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.texels
            .get(y as usize * self.size.width as usize + x as usize)
            .copied()
    }

    fn texel_mut(&mut self, x: u32, y: u32) -> Option<&mut [f32; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.texels
            .get_mut(y as usize * self.size.width as usize + x as usize)
    }

    pub fn fill(&mut self, color: [f32; 4]) {
        let color = self.quantize(color);
        self.texels.fill(color);
    }

    pub fn load_rgba8(&mut self, pixels: &[u8]) {
        self.texels = pixels
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]].map(|c| c as f32 / 255.0))
            .collect();
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        self.texels
            .iter()
            .flat_map(|texel| texel.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }

    /// Resolve a texel index along an axis of `len` texels.
    fn wrap_index(&self, index: i64, len: u32) -> Option<u32> {
        let len = len as i64;
        let index = match self.wrap {
            WrapMode::ClampToEdge => index.clamp(0, len - 1),
            WrapMode::ClampToBorder => {
                if index < 0 || index >= len {
                    return None;
                }
                index
            }
            WrapMode::Repeat => index.rem_euclid(len),
            WrapMode::MirroredRepeat => {
                let period = index.rem_euclid(2 * len);
                if period < len {
                    period
                } else {
                    2 * len - 1 - period
                }
            }
        };
        Some(index as u32)
    }

    fn fetch(&self, x: i64, y: i64) -> [f32; 4] {
        match (
            self.wrap_index(x, self.size.width),
            self.wrap_index(y, self.size.height),
        ) {
            (Some(x), Some(y)) => self.texel(x, y).unwrap_or([0.0; 4]),
            // border color
            _ => [0.0; 4],
        }
    }

    /// Sample at normalized coordinates.
    pub fn sample(&self, s: f32, t: f32) -> [f32; 4] {
        let u = s * self.size.width as f32;
        let v = t * self.size.height as f32;
        match self.filter {
            FilterMode::Nearest => self.fetch(u.floor() as i64, v.floor() as i64),
            FilterMode::Linear => {
                let (x, y) = (u - 0.5, v - 0.5);
                let (x0, y0) = (x.floor(), y.floor());
                let (fx, fy) = (x - x0, y - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);

                let c00 = self.fetch(x0, y0);
                let c10 = self.fetch(x0 + 1, y0);
                let c01 = self.fetch(x0, y0 + 1);
                let c11 = self.fetch(x0 + 1, y0 + 1);

                let mut out = [0.0; 4];
                for (i, out) in out.iter_mut().enumerate() {
                    let bottom = c00[i] + (c10[i] - c00[i]) * fx;
                    let top = c01[i] + (c11[i] - c01[i]) * fx;
                    *out = bottom + (top - bottom) * fy;
                }
                out
            }
        }
    }
}

pub(crate) fn blend(mode: Option<BlendMode>, src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
    match mode {
        None => src,
        Some(BlendMode::Alpha) => {
            let a = src[3];
            [
                src[0] * a + dst[0] * (1.0 - a),
                src[1] * a + dst[1] * (1.0 - a),
                src[2] * a + dst[2] * (1.0 - a),
                a + dst[3] * (1.0 - a),
            ]
        }
    }
}
