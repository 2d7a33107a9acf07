use anyhow::Context;
use image::{DynamicImage, RgbaImage};
use rayon::prelude::*;

/// Edge length of the placeholder shown when no source image is loaded.
pub const PLACEHOLDER_EDGE: u32 = 8;

/// RGBA f32 image buffer.
///
/// Pixel data is interleaved RGBARGBA... and display-referred: values are
/// gamma-encoded and nominally in [0, 1], the space the GPUImage-style filter
/// kernels are written against.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuf {
    pub width: u32,
    pub height: u32,
    /// Flat pixel data: [R, G, B, A, R, G, B, A, ...].
    pub data: Vec<f32>,
}

impl ImageBuf {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; (width * height * 4) as usize],
        }
    }

    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> anyhow::Result<Self> {
        let expected = (width * height * 4) as usize;
        anyhow::ensure!(
            data.len() == expected,
            "expected {expected} floats for {width}x{height} RGBA, got {}",
            data.len()
        );
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: u32, height: u32, rgba: [f32; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Neutral grey stand-in used when the source is missing or unreadable.
    pub fn placeholder() -> Self {
        Self::filled(PLACEHOLDER_EDGE, PLACEHOLDER_EDGE, [0.5, 0.5, 0.5, 1.0])
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Height over width, the convention distortion shaders use.
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 {
            return 1.0;
        }
        self.height as f32 / self.width as f32
    }

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [f32; 4]) {
        let idx = ((y * self.width + x) * 4) as usize;
        self.data[idx..idx + 4].copy_from_slice(&rgba);
    }

    /// Integer fetch with clamp-to-edge addressing.
    pub fn sample_clamped(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.pixel(x, y)
    }

    /// Bilinear sample at normalized texture coordinates with clamp-to-edge.
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        if self.is_empty() {
            return [0.0; 4];
        }
        let fx = u * self.width as f32 - 0.5;
        let fy = v * self.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let p00 = self.sample_clamped(x0, y0);
        let p10 = self.sample_clamped(x0 + 1, y0);
        let p01 = self.sample_clamped(x0, y0 + 1);
        let p11 = self.sample_clamped(x0 + 1, y0 + 1);

        let mut out = [0.0; 4];
        for c in 0..4 {
            let top = p00[c] + (p10[c] - p00[c]) * tx;
            let bottom = p01[c] + (p11[c] - p01[c]) * tx;
            out[c] = top + (bottom - top) * ty;
        }
        out
    }

    /// Apply `f` to every pixel in parallel.
    pub fn map_pixels<F>(mut self, f: F) -> Self
    where
        F: Fn([f32; 4]) -> [f32; 4] + Sync,
    {
        self.data.par_chunks_exact_mut(4).for_each(|px| {
            let out = f([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&out);
        });
        self
    }

    /// Like [`ImageBuf::map_pixels`], writing into a new buffer.
    pub fn mapped<F>(&self, f: F) -> Self
    where
        F: Fn([f32; 4]) -> [f32; 4] + Sync,
    {
        let mut data = vec![0.0; self.data.len()];
        data.par_chunks_exact_mut(4)
            .zip(self.data.par_chunks_exact(4))
            .for_each(|(out, px)| {
                out.copy_from_slice(&f([px[0], px[1], px[2], px[3]]));
            });
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Build a new image of the same size where each pixel is computed from
    /// its coordinates. Rows are processed in parallel.
    pub fn generate<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> [f32; 4] + Sync,
    {
        let mut data = vec![0.0; (width * height * 4) as usize];
        if width > 0 {
            data.par_chunks_exact_mut((width * 4) as usize)
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, px) in row.chunks_exact_mut(4).enumerate() {
                        px.copy_from_slice(&f(x as u32, y as u32));
                    }
                });
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_dynamic(img: &DynamicImage) -> Self {
        let rgba = img.to_rgba32f();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            data: rgba.into_raw(),
        }
    }

    /// Quantize to RGBA u8, clamping out-of-range values.
    pub fn to_rgba_u8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
            .collect()
    }

    pub fn to_dynamic(&self) -> anyhow::Result<DynamicImage> {
        let img = RgbaImage::from_raw(self.width, self.height, self.to_rgba_u8())
            .context("failed to create image from buffer")?;
        Ok(DynamicImage::ImageRgba8(img))
    }

    /// Downsample so the longest edge fits within `max_edge` pixels.
    /// Uses box averaging for clean downscaling. Returns self if already small enough.
    pub fn downsample(&self, max_edge: u32) -> Self {
        let longest = self.width.max(self.height);
        if longest <= max_edge {
            return self.clone();
        }

        let scale = max_edge as f32 / longest as f32;
        let new_w = (self.width as f32 * scale).round().max(1.0) as u32;
        let new_h = (self.height as f32 * scale).round().max(1.0) as u32;

        Self::generate(new_w, new_h, |dst_x, dst_y| {
            let src_x0 = (dst_x as f32 / scale) as u32;
            let src_y0 = (dst_y as f32 / scale) as u32;
            let src_x1 = (((dst_x + 1) as f32 / scale).ceil() as u32).min(self.width);
            let src_y1 = (((dst_y + 1) as f32 / scale).ceil() as u32).min(self.height);

            let mut sum = [0.0_f32; 4];
            let mut count = 0u32;
            for sy in src_y0..src_y1 {
                for sx in src_x0..src_x1 {
                    let px = self.pixel(sx, sy);
                    for c in 0..4 {
                        sum[c] += px[c];
                    }
                    count += 1;
                }
            }

            if count == 0 {
                return [0.0, 0.0, 0.0, 1.0];
            }
            let inv = 1.0 / count as f32;
            sum.map(|v| v * inv)
        })
    }

    /// Bilinear resize to exact dimensions.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if width == self.width && height == self.height {
            return self.clone();
        }
        Self::generate(width, height, |x, y| {
            let u = (x as f32 + 0.5) / width as f32;
            let v = (y as f32 + 0.5) / height as f32;
            self.sample(u, v)
        })
    }

    /// Reorient pixels so the image displays upright.
    pub fn oriented(self, orientation: Orientation) -> Self {
        if orientation == Orientation::Normal {
            return self;
        }
        let (w, h) = (self.width, self.height);
        let (out_w, out_h) = if orientation.swaps_dimensions() {
            (h, w)
        } else {
            (w, h)
        };
        let mut out = Self::new(out_w, out_h);
        for sy in 0..h {
            for sx in 0..w {
                let (dx, dy) = match orientation {
                    Orientation::Normal => (sx, sy),
                    Orientation::MirrorHorizontal => (w - 1 - sx, sy),
                    Orientation::Rotate180 => (w - 1 - sx, h - 1 - sy),
                    Orientation::MirrorVertical => (sx, h - 1 - sy),
                    Orientation::Transpose => (sy, sx),
                    Orientation::Rotate90 => (h - 1 - sy, sx),
                    Orientation::Transverse => (h - 1 - sy, w - 1 - sx),
                    Orientation::Rotate270 => (sy, w - 1 - sx),
                };
                out.set_pixel(dx, dy, self.pixel(sx, sy));
            }
        }
        out
    }
}

/// The eight EXIF orientations. Rotations are clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    MirrorHorizontal,
    Rotate180,
    MirrorVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    /// Map an EXIF `Orientation` tag value (1-8).
    pub fn from_exif(value: u32) -> Option<Self> {
        Some(match value {
            1 => Self::Normal,
            2 => Self::MirrorHorizontal,
            3 => Self::Rotate180,
            4 => Self::MirrorVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => return None,
        })
    }

    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }
}
