use anyhow::Result;

use crate::color::{luminance, mix, mix_rgb, overlay, smoothstep, step};
use crate::image_buf::ImageBuf;
use crate::operation::ImageOperation;
use crate::parameter::{Color, Position};

#[derive(Clone, Debug)]
pub struct Posterize {
    pub color_levels: f32,
}

impl Default for Posterize {
    fn default() -> Self {
        Self { color_levels: 10.0 }
    }
}

pub(crate) fn posterize(v: f32, levels: f32) -> f32 {
    // A zero level count would divide by zero; one level is the coarsest meaningful setting.
    let levels = levels.max(1.0);
    (v * levels + 0.5).floor() / levels
}

impl ImageOperation for Posterize {
    fn name(&self) -> &'static str {
        "posterize"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let levels = self.color_levels;
        Ok(input.mapped(|px| {
            [
                posterize(px[0], levels),
                posterize(px[1], levels),
                posterize(px[2], levels),
                px[3],
            ]
        }))
    }
}

/// Inverts channels of pixels whose luminance falls below `threshold`.
#[derive(Clone, Debug)]
pub struct Solarize {
    pub threshold: f32,
}

impl Default for Solarize {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl ImageOperation for Solarize {
    fn name(&self) -> &'static str {
        "solarize"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let threshold = self.threshold;
        Ok(input.mapped(|px| {
            let flip = step(luminance([px[0], px[1], px[2]]), threshold);
            [
                (flip - px[0]).abs(),
                (flip - px[1]).abs(),
                (flip - px[2]).abs(),
                px[3],
            ]
        }))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Luminance;

impl ImageOperation for Luminance {
    fn name(&self) -> &'static str {
        "luminance"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        Ok(input.mapped(|px| {
            let y = luminance([px[0], px[1], px[2]]);
            [y, y, y, px[3]]
        }))
    }
}

#[derive(Clone, Debug)]
pub struct LuminanceThreshold {
    pub threshold: f32,
}

impl Default for LuminanceThreshold {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl ImageOperation for LuminanceThreshold {
    fn name(&self) -> &'static str {
        "luminance_threshold"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let threshold = self.threshold;
        Ok(input.mapped(|px| {
            let v = step(threshold, luminance([px[0], px[1], px[2]]));
            [v, v, v, px[3]]
        }))
    }
}

/// Tints the luminance image with `color` using an overlay blend.
#[derive(Clone, Debug)]
pub struct Monochrome {
    pub color: Color,
    pub intensity: f32,
}

impl Default for Monochrome {
    fn default() -> Self {
        Self {
            color: Color::rgb(0.6, 0.45, 0.3),
            intensity: 1.0,
        }
    }
}

impl ImageOperation for Monochrome {
    fn name(&self) -> &'static str {
        "monochrome"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let tint = self.color.to_rgb();
        let intensity = self.intensity;
        Ok(input.mapped(|px| {
            let rgb = [px[0], px[1], px[2]];
            let y = luminance(rgb);
            let toned = [overlay(y, tint[0]), overlay(y, tint[1]), overlay(y, tint[2])];
            let [r, g, b] = mix_rgb(rgb, toned, intensity);
            [r, g, b, px[3]]
        }))
    }
}

/// Maps luminance onto a gradient between two colors.
#[derive(Clone, Debug)]
pub struct FalseColor {
    pub first_color: Color,
    pub second_color: Color,
}

impl Default for FalseColor {
    fn default() -> Self {
        Self {
            first_color: Color::rgb(0.0, 0.0, 0.5),
            second_color: Color::rgb(1.0, 0.0, 0.0),
        }
    }
}

impl ImageOperation for FalseColor {
    fn name(&self) -> &'static str {
        "false_color"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let first = self.first_color.to_rgb();
        let second = self.second_color.to_rgb();
        Ok(input.mapped(|px| {
            let y = luminance([px[0], px[1], px[2]]);
            let [r, g, b] = mix_rgb(first, second, y);
            [r, g, b, px[3]]
        }))
    }
}

const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.3588, 0.7044, 0.1368],
    [0.2990, 0.5870, 0.1140],
    [0.2392, 0.4696, 0.0912],
];

#[derive(Clone, Debug)]
pub struct Sepia {
    pub intensity: f32,
}

impl Default for Sepia {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

impl ImageOperation for Sepia {
    fn name(&self) -> &'static str {
        "sepia"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let intensity = self.intensity;
        Ok(input.mapped(|px| {
            let mut out = [0.0; 4];
            for (row, coeffs) in SEPIA_MATRIX.iter().enumerate() {
                let toned = coeffs[0] * px[0] + coeffs[1] * px[1] + coeffs[2] * px[2];
                out[row] = mix(px[row], toned, intensity);
            }
            out[3] = px[3];
            out
        }))
    }
}

/// Adds or removes a white haze that grows toward the bottom of the frame.
#[derive(Clone, Debug)]
pub struct Haze {
    pub distance: f32,
    pub slope: f32,
}

impl Default for Haze {
    fn default() -> Self {
        Self {
            distance: 0.2,
            slope: 0.0,
        }
    }
}

impl ImageOperation for Haze {
    fn name(&self) -> &'static str {
        "haze"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let (w, h) = (input.width, input.height);
        Ok(ImageBuf::generate(w, h, |x, y| {
            let px = input.pixel(x, y);
            let v = (y as f32 + 0.5) / h as f32;
            let d = v * self.slope + self.distance;
            let denom = (1.0 - d).max(1e-4);
            [
                ((px[0] - d) / denom).clamp(0.0, 1.0),
                ((px[1] - d) / denom).clamp(0.0, 1.0),
                ((px[2] - d) / denom).clamp(0.0, 1.0),
                px[3],
            ]
        }))
    }
}

#[derive(Clone, Debug)]
pub struct HighlightAndShadowTint {
    pub shadow_tint_intensity: f32,
    pub shadow_tint_color: Color,
    pub highlight_tint_intensity: f32,
    pub highlight_tint_color: Color,
}

impl Default for HighlightAndShadowTint {
    fn default() -> Self {
        Self {
            shadow_tint_intensity: 0.0,
            shadow_tint_color: Color::RED,
            highlight_tint_intensity: 0.0,
            highlight_tint_color: Color::BLUE,
        }
    }
}

impl ImageOperation for HighlightAndShadowTint {
    fn name(&self) -> &'static str {
        "highlight_and_shadow_tint"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let shadow_color = self.shadow_tint_color.to_rgb();
        let highlight_color = self.highlight_tint_color.to_rgb();
        let shadow_amount = self.shadow_tint_intensity;
        let highlight_amount = self.highlight_tint_intensity;
        Ok(input.mapped(|px| {
            let rgb = [px[0], px[1], px[2]];
            let y = luminance(rgb);

            let shadow_target = mix_rgb(shadow_color, rgb, y);
            let lifted = [
                rgb[0].max(shadow_target[0]),
                rgb[1].max(shadow_target[1]),
                rgb[2].max(shadow_target[2]),
            ];
            let shadow = mix_rgb(rgb, lifted, shadow_amount);

            let highlight_target = mix_rgb(shadow, highlight_color, y);
            let lowered = [
                shadow[0].min(highlight_target[0]),
                shadow[1].min(highlight_target[1]),
                shadow[2].min(highlight_target[2]),
            ];
            let highlight = mix_rgb(rgb, lowered, highlight_amount);

            let [r, g, b] = mix_rgb(shadow, highlight, y);
            [r, g, b, px[3]]
        }))
    }
}

#[derive(Clone, Debug)]
pub struct Vignette {
    pub center: Position,
    pub color: Color,
    pub start: f32,
    pub end: f32,
}

impl Default for Vignette {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            color: Color::BLACK,
            start: 0.3,
            end: 0.75,
        }
    }
}

impl ImageOperation for Vignette {
    fn name(&self) -> &'static str {
        "vignette"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let (w, h) = (input.width, input.height);
        let color = self.color.to_rgb();
        Ok(ImageBuf::generate(w, h, |x, y| {
            let px = input.pixel(x, y);
            let u = (x as f32 + 0.5) / w as f32;
            let v = (y as f32 + 0.5) / h as f32;
            let d = ((u - self.center.x).powi(2) + (v - self.center.y).powi(2)).sqrt();
            let percent = smoothstep(self.start, self.end, d);
            let [r, g, b] = mix_rgb([px[0], px[1], px[2]], color, percent);
            [r, g, b, px[3]]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::test_util::{assert_close, solid};

    #[test]
    fn posterize_quantizes() {
        let out = Posterize { color_levels: 2.0 }
            .process(&solid([0.2, 0.3, 0.8]))
            .unwrap();
        assert_close(out.pixel(0, 0), [0.0, 0.5, 1.0, 1.0], 1e-6);
    }

    #[test]
    fn posterize_zero_levels_is_finite() {
        let out = Posterize { color_levels: 0.0 }
            .process(&solid([0.2, 0.3, 0.8]))
            .unwrap();
        assert!(out.data.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn solarize_inverts_dark_pixels() {
        let op = Solarize::default();
        let dark = op.process(&solid([0.1, 0.1, 0.1])).unwrap();
        assert_close(dark.pixel(0, 0), [0.9, 0.9, 0.9, 1.0], 1e-6);
        let bright = op.process(&solid([0.9, 0.9, 0.9])).unwrap();
        assert_close(bright.pixel(0, 0), [0.9, 0.9, 0.9, 1.0], 1e-6);
    }

    #[test]
    fn luminance_threshold_is_binary() {
        let op = LuminanceThreshold::default();
        let out = op.process(&solid([0.9, 0.8, 0.7])).unwrap();
        assert_close(out.pixel(0, 0), [1.0, 1.0, 1.0, 1.0], 0.0);
        let out = op.process(&solid([0.1, 0.2, 0.1])).unwrap();
        assert_close(out.pixel(0, 0), [0.0, 0.0, 0.0, 1.0], 0.0);
    }

    #[test]
    fn false_color_endpoints() {
        let op = FalseColor::default();
        let black = op.process(&solid([0.0, 0.0, 0.0])).unwrap();
        assert_close(black.pixel(0, 0), [0.0, 0.0, 0.5, 1.0], 1e-6);
        let white = op.process(&solid([1.0, 1.0, 1.0])).unwrap();
        assert_close(white.pixel(0, 0), [1.0, 0.0, 0.0, 1.0], 1e-5);
    }

    #[test]
    fn sepia_zero_intensity_is_identity() {
        let input = solid([0.8, 0.3, 0.1]);
        let out = Sepia { intensity: 0.0 }.process(&input).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn sepia_warms_grey() {
        let out = Sepia::default().process(&solid([0.5, 0.5, 0.5])).unwrap();
        let px = out.pixel(0, 0);
        assert!(px[0] > px[1] && px[1] > px[2]);
    }

    #[test]
    fn vignette_darkens_corners_only() {
        let input = ImageBuf::filled(32, 32, [1.0, 1.0, 1.0, 1.0]);
        let out = Vignette::default().process(&input).unwrap();
        assert_close(out.pixel(16, 16), [1.0, 1.0, 1.0, 1.0], 1e-6);
        assert!(out.pixel(0, 0)[0] < 0.5);
    }

    #[test]
    fn haze_zero_is_identity() {
        let input = solid([0.4, 0.5, 0.6]);
        let op = Haze {
            distance: 0.0,
            slope: 0.0,
        };
        let out = op.process(&input).unwrap();
        assert_close(out.pixel(2, 2), input.pixel(2, 2), 1e-6);
    }

    #[test]
    fn tint_default_is_identity() {
        let input = solid([0.4, 0.5, 0.6]);
        let out = HighlightAndShadowTint::default().process(&input).unwrap();
        assert_close(out.pixel(0, 0), input.pixel(0, 0), 1e-6);
    }
}
