//! CPU approximations of the Core Image filters the catalog offers.

use anyhow::Result;

use crate::color::{glsl_mod, mix, rotate_hue, smoothstep};
use crate::image_buf::ImageBuf;
use crate::operation::ImageOperation;
use crate::operation::blur::gaussian;
use crate::operation::edge::toon;
use crate::parameter::Position;

#[derive(Clone, Debug)]
pub struct CiGaussianBlur {
    pub radius: f32,
}

impl Default for CiGaussianBlur {
    fn default() -> Self {
        Self { radius: 20.0 }
    }
}

impl ImageOperation for CiGaussianBlur {
    fn name(&self) -> &'static str {
        "ci_gaussian_blur"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        Ok(gaussian(input, self.radius))
    }
}

#[derive(Clone, Debug)]
pub struct CiUnsharpMask {
    pub radius: f32,
    pub intensity: f32,
}

impl Default for CiUnsharpMask {
    fn default() -> Self {
        Self {
            radius: 5.0,
            intensity: 2.5,
        }
    }
}

impl ImageOperation for CiUnsharpMask {
    fn name(&self) -> &'static str {
        "ci_unsharp_mask"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if self.intensity == 0.0 || self.radius <= 0.0 {
            return Ok(input.clone());
        }
        let blurred = gaussian(input, self.radius);
        let k = self.intensity;
        let mut out = input.clone();
        for (px, soft) in out.data.chunks_exact_mut(4).zip(blurred.data.chunks_exact(4)) {
            for c in 0..3 {
                px[c] += k * (px[c] - soft[c]);
            }
        }
        Ok(out)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CiHueAdjust {
    /// Radians.
    pub angle: f32,
}

impl ImageOperation for CiHueAdjust {
    fn name(&self) -> &'static str {
        "ci_hue_adjust"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if self.angle == 0.0 {
            return Ok(input.clone());
        }
        let angle = self.angle;
        Ok(input.mapped(|px| {
            let [r, g, b] = rotate_hue([px[0], px[1], px[2]], angle);
            [r, g, b, px[3]]
        }))
    }
}

/// Dulls highlights by multiplying with a blurred copy.
#[derive(Clone, Debug)]
pub struct CiGloom {
    pub radius: f32,
    pub intensity: f32,
}

impl Default for CiGloom {
    fn default() -> Self {
        Self {
            radius: 10.0,
            intensity: 0.5,
        }
    }
}

impl ImageOperation for CiGloom {
    fn name(&self) -> &'static str {
        "ci_gloom"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let blurred = gaussian(input, self.radius);
        let k = self.intensity;
        let mut out = input.clone();
        for (px, soft) in out.data.chunks_exact_mut(4).zip(blurred.data.chunks_exact(4)) {
            for c in 0..3 {
                px[c] = mix(px[c], px[c] * soft[c], k);
            }
        }
        Ok(out)
    }
}

const COMIC_EDGE_THRESHOLD: f32 = 0.3;
const COMIC_LEVELS: f32 = 6.0;

#[derive(Clone, Debug, Default)]
pub struct CiComicEffect;

impl ImageOperation for CiComicEffect {
    fn name(&self) -> &'static str {
        "ci_comic_effect"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        Ok(toon(input, COMIC_EDGE_THRESHOLD, COMIC_LEVELS))
    }
}

/// Disc-kernel lens blur. `ring_amount` brightens the rim of each disc;
/// `ring_size` is the rim width and `softness` feathers the disc edge.
#[derive(Clone, Debug)]
pub struct CiBokehBlur {
    pub radius: f32,
    pub ring_amount: f32,
    pub ring_size: f32,
    pub softness: f32,
}

impl Default for CiBokehBlur {
    fn default() -> Self {
        Self {
            radius: 20.0,
            ring_amount: 0.0,
            ring_size: 0.1,
            softness: 1.0,
        }
    }
}

impl CiBokehBlur {
    /// Sparse disc taps as `(dx, dy, weight)`.
    fn taps(&self) -> Vec<(i64, i64, f32)> {
        let radius = self.radius.max(0.0);
        let spacing = (radius / 8.0).max(1.0);
        let steps = (radius / spacing).floor() as i64;
        let feather = (self.softness * 0.1).clamp(0.0, 1.0);
        let band = (self.ring_size / 5.0).clamp(0.02, 1.0);

        let mut taps = Vec::new();
        for j in -steps..=steps {
            for i in -steps..=steps {
                let (dx, dy) = (i as f32 * spacing, j as f32 * spacing);
                let d = if radius > 0.0 {
                    (dx * dx + dy * dy).sqrt() / radius
                } else {
                    0.0
                };
                if d > 1.0 {
                    continue;
                }
                let edge = 1.0 - smoothstep(1.0 - feather, 1.0, d);
                let ring = smoothstep(1.0 - band, 1.0, d);
                let weight = edge * (1.0 + self.ring_amount * ring);
                if weight > 0.0 {
                    taps.push((dx.round() as i64, dy.round() as i64, weight));
                }
            }
        }
        taps
    }
}

impl ImageOperation for CiBokehBlur {
    fn name(&self) -> &'static str {
        "ci_bokeh_blur"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let taps = self.taps();
        let total: f32 = taps.iter().map(|t| t.2).sum();
        if taps.len() <= 1 || total <= 0.0 {
            return Ok(input.clone());
        }
        Ok(ImageBuf::generate(input.width, input.height, |x, y| {
            let mut acc = [0.0; 4];
            for &(dx, dy, w) in &taps {
                let px = input.sample_clamped(x as i64 + dx, y as i64 + dy);
                for c in 0..4 {
                    acc[c] += px[c] * w;
                }
            }
            acc.map(|v| v / total)
        }))
    }
}

/// Square cells `scale` pixels wide, with a cell corner on `center`.
#[derive(Clone, Debug)]
pub struct CiPixellate {
    pub scale: f32,
    pub center: Position,
}

impl Default for CiPixellate {
    fn default() -> Self {
        Self {
            scale: 8.0,
            center: Position::CENTER,
        }
    }
}

impl ImageOperation for CiPixellate {
    fn name(&self) -> &'static str {
        "ci_pixellate"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let s = self.scale;
        if s <= 1.0 || input.is_empty() {
            return Ok(input.clone());
        }
        let (w, h) = (input.width as f32, input.height as f32);
        let (cx, cy) = (self.center.x * w, self.center.y * h);
        Ok(ImageBuf::generate(input.width, input.height, |x, y| {
            let px = x as f32 + 0.5 - cx;
            let py = y as f32 + 0.5 - cy;
            let sx = cx + ((px / s).floor() + 0.5) * s;
            let sy = cy + ((py / s).floor() + 0.5) * s;
            input.sample(sx / w, sy / h)
        }))
    }
}

const HEX_RATIO: f32 = 1.732_050_8;

/// Hexagonal cells `scale` pixels across, anchored at `center`.
#[derive(Clone, Debug)]
pub struct CiHexagonalPixellate {
    pub scale: f32,
    pub center: Position,
}

impl Default for CiHexagonalPixellate {
    fn default() -> Self {
        Self {
            scale: 8.0,
            center: Position::CENTER,
        }
    }
}

impl ImageOperation for CiHexagonalPixellate {
    fn name(&self) -> &'static str {
        "ci_hexagonal_pixellate"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let s = self.scale;
        if s <= 1.0 || input.is_empty() {
            return Ok(input.clone());
        }
        let (w, h) = (input.width as f32, input.height as f32);
        let (cx, cy) = (self.center.x * w, self.center.y * h);
        let (rx, ry) = (1.0, HEX_RATIO);
        Ok(ImageBuf::generate(input.width, input.height, |x, y| {
            let px = (x as f32 + 0.5 - cx) / s;
            let py = (y as f32 + 0.5 - cy) / s;
            // Offsets to the nearest center on each of the two staggered lattices.
            let a = (glsl_mod(px, rx) - rx * 0.5, glsl_mod(py, ry) - ry * 0.5);
            let b = (
                glsl_mod(px - rx * 0.5, rx) - rx * 0.5,
                glsl_mod(py - ry * 0.5, ry) - ry * 0.5,
            );
            let nearest = if a.0 * a.0 + a.1 * a.1 < b.0 * b.0 + b.1 * b.1 {
                a
            } else {
                b
            };
            let sx = cx + (px - nearest.0) * s;
            let sy = cy + (py - nearest.1) * s;
            input.sample(sx / w, sy / h)
        }))
    }
}
