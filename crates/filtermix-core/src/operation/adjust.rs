use anyhow::Result;

use crate::color::{luminance, mix_rgb, overlay, rgb_to_yiq, rotate_hue, yiq_to_rgb};
use crate::image_buf::ImageBuf;
use crate::operation::ImageOperation;
use crate::parameter::Color;

fn map_rgb(input: &ImageBuf, f: impl Fn([f32; 3]) -> [f32; 3] + Sync) -> ImageBuf {
    input.mapped(|px| {
        let [r, g, b] = f([px[0], px[1], px[2]]);
        [r, g, b, px[3]]
    })
}

#[derive(Clone, Debug, Default)]
pub struct Brightness {
    pub brightness: f32,
}

impl ImageOperation for Brightness {
    fn name(&self) -> &'static str {
        "brightness"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if self.brightness == 0.0 {
            return Ok(input.clone());
        }
        let b = self.brightness;
        Ok(map_rgb(input, |rgb| rgb.map(|v| v + b)))
    }
}

#[derive(Clone, Debug)]
pub struct Contrast {
    pub contrast: f32,
}

impl Default for Contrast {
    fn default() -> Self {
        Self { contrast: 1.0 }
    }
}

impl ImageOperation for Contrast {
    fn name(&self) -> &'static str {
        "contrast"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if self.contrast == 1.0 {
            return Ok(input.clone());
        }
        let k = self.contrast;
        Ok(map_rgb(input, |rgb| rgb.map(|v| (v - 0.5) * k + 0.5)))
    }
}

/// Exposure compensation in EV stops.
#[derive(Clone, Debug, Default)]
pub struct Exposure {
    pub exposure: f32,
}

impl ImageOperation for Exposure {
    fn name(&self) -> &'static str {
        "exposure"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if self.exposure == 0.0 {
            return Ok(input.clone());
        }
        let multiplier = 2.0_f32.powf(self.exposure);
        Ok(map_rgb(input, |rgb| rgb.map(|v| v * multiplier)))
    }
}

/// Blend between the luminance-only image (0.0) and the original (1.0).
#[derive(Clone, Debug)]
pub struct Saturation {
    pub saturation: f32,
}

impl Default for Saturation {
    fn default() -> Self {
        Self { saturation: 1.0 }
    }
}

impl ImageOperation for Saturation {
    fn name(&self) -> &'static str {
        "saturation"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if self.saturation == 1.0 {
            return Ok(input.clone());
        }
        let s = self.saturation;
        Ok(map_rgb(input, |rgb| {
            let y = luminance(rgb);
            mix_rgb([y; 3], rgb, s)
        }))
    }
}

/// Boosts muted colors more than already-saturated ones.
#[derive(Clone, Debug, Default)]
pub struct Vibrance {
    pub vibrance: f32,
}

impl ImageOperation for Vibrance {
    fn name(&self) -> &'static str {
        "vibrance"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if self.vibrance == 0.0 {
            return Ok(input.clone());
        }
        let vibrance = self.vibrance;
        Ok(map_rgb(input, |rgb| {
            let average = (rgb[0] + rgb[1] + rgb[2]) / 3.0;
            let max = rgb[0].max(rgb[1]).max(rgb[2]);
            let amount = (max - average) * (-vibrance * 3.0);
            mix_rgb(rgb, [max; 3], amount)
        }))
    }
}

/// Hue rotation in degrees.
#[derive(Clone, Debug)]
pub struct HueAdjustment {
    pub hue: f32,
}

impl Default for HueAdjustment {
    fn default() -> Self {
        Self { hue: 90.0 }
    }
}

impl ImageOperation for HueAdjustment {
    fn name(&self) -> &'static str {
        "hue_adjustment"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let radians = (self.hue % 360.0).to_radians();
        Ok(map_rgb(input, |rgb| rotate_hue(rgb, -radians)))
    }
}

#[derive(Clone, Debug)]
pub struct RgbAdjustment {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Default for RgbAdjustment {
    fn default() -> Self {
        Self {
            red: 1.0,
            green: 1.0,
            blue: 1.0,
        }
    }
}

impl ImageOperation for RgbAdjustment {
    fn name(&self) -> &'static str {
        "rgb_adjustment"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let gains = [self.red, self.green, self.blue];
        Ok(map_rgb(input, |rgb| {
            [rgb[0] * gains[0], rgb[1] * gains[1], rgb[2] * gains[2]]
        }))
    }
}

/// Photoshop-style levels. `middle` is the per-channel gamma.
#[derive(Clone, Debug)]
pub struct LevelsAdjustment {
    pub minimum: Color,
    pub middle: Color,
    pub maximum: Color,
    pub min_output: Color,
    pub max_output: Color,
}

impl Default for LevelsAdjustment {
    fn default() -> Self {
        Self {
            minimum: Color::BLACK,
            middle: Color::WHITE,
            maximum: Color::WHITE,
            min_output: Color::BLACK,
            max_output: Color::WHITE,
        }
    }
}

impl ImageOperation for LevelsAdjustment {
    fn name(&self) -> &'static str {
        "levels_adjustment"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let lo = self.minimum.to_rgb();
        let mid = self.middle.to_rgb();
        let hi = self.maximum.to_rgb();
        let out_lo = self.min_output.to_rgb();
        let out_hi = self.max_output.to_rgb();
        Ok(map_rgb(input, |rgb| {
            let mut out = [0.0; 3];
            for c in 0..3 {
                let span = (hi[c] - lo[c]).max(f32::EPSILON);
                let normalized = ((rgb[c] - lo[c]) / span).clamp(0.0, 1.0);
                let gamma = normalized.powf(1.0 / mid[c].max(f32::EPSILON));
                out[c] = out_lo[c] + (out_hi[c] - out_lo[c]) * gamma;
            }
            out
        }))
    }
}

const WARM_FILTER: [f32; 3] = [0.93, 0.54, 0.0];

/// Color temperature in Kelvin (5000 is neutral) and green/magenta tint.
#[derive(Clone, Debug)]
pub struct WhiteBalance {
    pub temperature: f32,
    pub tint: f32,
}

impl Default for WhiteBalance {
    fn default() -> Self {
        Self {
            temperature: 5000.0,
            tint: 0.0,
        }
    }
}

impl WhiteBalance {
    fn temperature_weight(&self) -> f32 {
        let delta = self.temperature - 5000.0;
        if delta < 0.0 {
            0.0004 * delta
        } else {
            0.00006 * delta
        }
    }
}

impl ImageOperation for WhiteBalance {
    fn name(&self) -> &'static str {
        "white_balance"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let temperature = self.temperature_weight();
        let tint = self.tint / 100.0;
        if temperature == 0.0 && tint == 0.0 {
            return Ok(input.clone());
        }
        Ok(map_rgb(input, |rgb| {
            let mut yiq = rgb_to_yiq(rgb);
            yiq[2] = (yiq[2] + tint * 0.5226 * 0.1).clamp(-0.5226, 0.5226);
            let tinted = yiq_to_rgb(yiq);
            let warmed = [
                overlay(tinted[0], WARM_FILTER[0]),
                overlay(tinted[1], WARM_FILTER[1]),
                overlay(tinted[2], WARM_FILTER[2]),
            ];
            mix_rgb(tinted, warmed, temperature)
        }))
    }
}

#[derive(Clone, Debug)]
pub struct Opacity {
    pub opacity: f32,
}

impl Default for Opacity {
    fn default() -> Self {
        Self { opacity: 1.0 }
    }
}

impl ImageOperation for Opacity {
    fn name(&self) -> &'static str {
        "opacity"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let opacity = self.opacity;
        Ok(input.mapped(|px| [px[0], px[1], px[2], px[3] * opacity]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::test_util::{assert_close, solid};

    #[test]
    fn defaults_are_identity() {
        let input = solid([0.8, 0.3, 0.1]);
        let ops: Vec<Box<dyn ImageOperation>> = vec![
            Box::new(Brightness::default()),
            Box::new(Contrast::default()),
            Box::new(Exposure::default()),
            Box::new(Saturation::default()),
            Box::new(Vibrance::default()),
            Box::new(RgbAdjustment::default()),
            Box::new(LevelsAdjustment::default()),
            Box::new(WhiteBalance::default()),
            Box::new(Opacity::default()),
        ];
        for op in ops {
            let out = op.process(&input).unwrap();
            assert_close(out.pixel(0, 0), input.pixel(0, 0), 1e-5);
        }
    }

    #[test]
    fn brightness_offsets_channels() {
        let out = Brightness { brightness: 0.25 }
            .process(&solid([0.5, 0.25, 0.0]))
            .unwrap();
        assert_close(out.pixel(1, 1), [0.75, 0.5, 0.25, 1.0], 1e-6);
    }

    #[test]
    fn contrast_pivots_on_mid_grey() {
        let op = Contrast { contrast: 2.0 };
        let out = op.process(&solid([0.5, 0.75, 0.25])).unwrap();
        assert_close(out.pixel(0, 0), [0.5, 1.0, 0.0, 1.0], 1e-6);
    }

    #[test]
    fn positive_exposure_doubles() {
        let out = Exposure { exposure: 1.0 }
            .process(&solid([0.25, 0.25, 0.25]))
            .unwrap();
        assert!((out.pixel(0, 0)[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_saturation_is_grey() {
        let out = Saturation { saturation: 0.0 }
            .process(&solid([0.8, 0.3, 0.1]))
            .unwrap();
        let px = out.pixel(0, 0);
        assert!((px[0] - px[1]).abs() < 1e-6 && (px[1] - px[2]).abs() < 1e-6);
    }

    #[test]
    fn vibrance_moves_toward_max_when_negative() {
        let out = Vibrance { vibrance: -0.5 }
            .process(&solid([0.8, 0.3, 0.1]))
            .unwrap();
        assert!(out.pixel(0, 0)[2] > 0.1);
    }

    #[test]
    fn hue_default_rotates_color_but_not_grey() {
        let op = HueAdjustment::default();
        let grey = op.process(&solid([0.4, 0.4, 0.4])).unwrap();
        assert_close(grey.pixel(0, 0), [0.4, 0.4, 0.4, 1.0], 1e-3);

        let red = op.process(&solid([0.8, 0.1, 0.1])).unwrap();
        assert!((red.pixel(0, 0)[0] - 0.8).abs() > 0.05);
    }

    #[test]
    fn rgb_adjustment_scales_each_channel() {
        let op = RgbAdjustment {
            red: 0.5,
            green: 1.0,
            blue: 0.0,
        };
        let out = op.process(&solid([0.8, 0.6, 0.4])).unwrap();
        assert_close(out.pixel(0, 0), [0.4, 0.6, 0.0, 1.0], 1e-6);
    }

    #[test]
    fn levels_stretch_range() {
        let op = LevelsAdjustment {
            minimum: Color::rgb(0.2, 0.2, 0.2),
            maximum: Color::rgb(0.6, 0.6, 0.6),
            ..Default::default()
        };
        let out = op.process(&solid([0.4, 0.1, 0.9])).unwrap();
        assert_close(out.pixel(0, 0), [0.5, 0.0, 1.0, 1.0], 1e-5);
    }

    #[test]
    fn warm_temperature_favours_red() {
        let op = WhiteBalance {
            temperature: 6000.0,
            tint: 0.0,
        };
        let out = op.process(&solid([0.5, 0.5, 0.5])).unwrap();
        let px = out.pixel(0, 0);
        assert!(px[0] > px[2], "expected warmer output, got {px:?}");
    }

    #[test]
    fn opacity_scales_alpha_only() {
        let out = Opacity { opacity: 0.25 }
            .process(&solid([0.3, 0.6, 0.9]))
            .unwrap();
        assert_close(out.pixel(0, 0), [0.3, 0.6, 0.9, 0.25], 1e-6);
    }
}
