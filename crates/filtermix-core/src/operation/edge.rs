use anyhow::Result;

use crate::color::{luminance_of, step};
use crate::image_buf::ImageBuf;
use crate::operation::ImageOperation;
use crate::operation::tone::posterize;

/// Single-channel luminance copy of an image with clamp-to-edge reads.
pub(crate) struct LumaPlane {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl LumaPlane {
    pub(crate) fn new(input: &ImageBuf) -> Self {
        Self {
            width: input.width,
            height: input.height,
            values: input
                .data
                .chunks_exact(4)
                .map(|px| luminance_of([px[0], px[1], px[2], px[3]]))
                .collect(),
        }
    }

    fn at(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.values[(y * self.width + x) as usize]
    }

    /// 3x3 neighbourhood, indexed `[row][column]` from the top left.
    fn neighborhood(&self, x: u32, y: u32) -> [[f32; 3]; 3] {
        let (x, y) = (x as i64, y as i64);
        let mut n = [[0.0; 3]; 3];
        for (j, row) in n.iter_mut().enumerate() {
            for (i, v) in row.iter_mut().enumerate() {
                *v = self.at(x + i as i64 - 1, y + j as i64 - 1);
            }
        }
        n
    }

    /// Gradient magnitude with the given center-row weight: 2 for Sobel, 1 for Prewitt.
    fn gradient(&self, x: u32, y: u32, center_weight: f32) -> f32 {
        let n = self.neighborhood(x, y);
        let h = (n[2][0] + center_weight * n[2][1] + n[2][2])
            - (n[0][0] + center_weight * n[0][1] + n[0][2]);
        let v = (n[0][2] + center_weight * n[1][2] + n[2][2])
            - (n[0][0] + center_weight * n[1][0] + n[2][0]);
        (h * h + v * v).sqrt()
    }

    pub(crate) fn sobel(&self, x: u32, y: u32) -> f32 {
        self.gradient(x, y, 2.0)
    }

    fn prewitt(&self, x: u32, y: u32) -> f32 {
        self.gradient(x, y, 1.0)
    }
}

fn grey_from(input: &ImageBuf, f: impl Fn(u32, u32) -> f32 + Sync) -> ImageBuf {
    ImageBuf::generate(input.width, input.height, |x, y| {
        let v = f(x, y).clamp(0.0, 1.0);
        [v, v, v, input.pixel(x, y)[3]]
    })
}

#[derive(Clone, Debug)]
pub struct SobelEdgeDetection {
    pub edge_strength: f32,
}

impl Default for SobelEdgeDetection {
    fn default() -> Self {
        Self { edge_strength: 1.0 }
    }
}

impl ImageOperation for SobelEdgeDetection {
    fn name(&self) -> &'static str {
        "sobel_edge_detection"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let plane = LumaPlane::new(input);
        Ok(grey_from(input, |x, y| plane.sobel(x, y) * self.edge_strength))
    }
}

#[derive(Clone, Debug)]
pub struct PrewittEdgeDetection {
    pub edge_strength: f32,
}

impl Default for PrewittEdgeDetection {
    fn default() -> Self {
        Self { edge_strength: 1.0 }
    }
}

impl ImageOperation for PrewittEdgeDetection {
    fn name(&self) -> &'static str {
        "prewitt_edge_detection"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let plane = LumaPlane::new(input);
        Ok(grey_from(input, |x, y| plane.prewitt(x, y) * self.edge_strength))
    }
}

/// Inverted Sobel: dark strokes on white.
#[derive(Clone, Debug)]
pub struct Sketch {
    pub edge_strength: f32,
}

impl Default for Sketch {
    fn default() -> Self {
        Self { edge_strength: 1.0 }
    }
}

impl ImageOperation for Sketch {
    fn name(&self) -> &'static str {
        "sketch"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let plane = LumaPlane::new(input);
        Ok(grey_from(input, |x, y| 1.0 - plane.sobel(x, y) * self.edge_strength))
    }
}

#[derive(Clone, Debug)]
pub struct ThresholdSobel {
    pub edge_strength: f32,
    pub threshold: f32,
}

impl Default for ThresholdSobel {
    fn default() -> Self {
        Self {
            edge_strength: 1.0,
            threshold: 0.25,
        }
    }
}

impl ImageOperation for ThresholdSobel {
    fn name(&self) -> &'static str {
        "threshold_sobel"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let plane = LumaPlane::new(input);
        Ok(grey_from(input, |x, y| {
            step(self.threshold, plane.sobel(x, y) * self.edge_strength)
        }))
    }
}

#[derive(Clone, Debug)]
pub struct ThresholdSketch {
    pub edge_strength: f32,
    pub threshold: f32,
}

impl Default for ThresholdSketch {
    fn default() -> Self {
        Self {
            edge_strength: 1.0,
            threshold: 0.25,
        }
    }
}

impl ImageOperation for ThresholdSketch {
    fn name(&self) -> &'static str {
        "threshold_sketch"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let plane = LumaPlane::new(input);
        Ok(grey_from(input, |x, y| {
            1.0 - step(self.threshold, plane.sobel(x, y) * self.edge_strength)
        }))
    }
}

/// Posterized colors with black outlines wherever the Sobel magnitude
/// crosses `threshold`.
#[derive(Clone, Debug)]
pub struct Toon {
    pub threshold: f32,
    pub quantization_levels: f32,
}

impl Default for Toon {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            quantization_levels: 10.0,
        }
    }
}

pub(crate) fn toon(input: &ImageBuf, threshold: f32, levels: f32) -> ImageBuf {
    let plane = LumaPlane::new(input);
    ImageBuf::generate(input.width, input.height, |x, y| {
        let px = input.pixel(x, y);
        let keep = 1.0 - step(threshold, plane.sobel(x, y));
        [
            posterize(px[0], levels) * keep,
            posterize(px[1], levels) * keep,
            posterize(px[2], levels) * keep,
            px[3],
        ]
    })
}

impl ImageOperation for Toon {
    fn name(&self) -> &'static str {
        "toon"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        Ok(toon(input, self.threshold, self.quantization_levels))
    }
}
