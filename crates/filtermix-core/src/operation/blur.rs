use anyhow::Result;

use crate::color::{luminance, luminance_of, mix, mix_rgb, smoothstep, step};
use crate::image_buf::ImageBuf;
use crate::operation::ImageOperation;
use crate::parameter::Position;

/// Above this radius the blur runs on a downsampled copy with a fixed sigma.
const DOWNSAMPLING_LIMIT: f32 = 8.0;

/// Largest window radius the box blur and Kuwahara filter run at full size.
const BOX_LIMIT: f32 = 16.0;

/// Downsampling factor the iOS-style blur works at.
pub const IOS_BLUR_DOWNSAMPLING: f32 = 4.0;

/// Normalized 1D gaussian weights covering three sigmas on each side.
pub(crate) fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil().max(1.0) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

fn convolve_horizontal(input: &ImageBuf, kernel: &[f32]) -> ImageBuf {
    let r = (kernel.len() / 2) as i64;
    ImageBuf::generate(input.width, input.height, |x, y| {
        let mut acc = [0.0; 4];
        for (i, w) in kernel.iter().enumerate() {
            let px = input.sample_clamped(x as i64 + i as i64 - r, y as i64);
            for c in 0..4 {
                acc[c] += px[c] * w;
            }
        }
        acc
    })
}

fn convolve_vertical(input: &ImageBuf, kernel: &[f32]) -> ImageBuf {
    let r = (kernel.len() / 2) as i64;
    ImageBuf::generate(input.width, input.height, |x, y| {
        let mut acc = [0.0; 4];
        for (i, w) in kernel.iter().enumerate() {
            let px = input.sample_clamped(x as i64, y as i64 + i as i64 - r);
            for c in 0..4 {
                acc[c] += px[c] * w;
            }
        }
        acc
    })
}

fn separable(input: &ImageBuf, kernel: &[f32]) -> ImageBuf {
    convolve_vertical(&convolve_horizontal(input, kernel), kernel)
}

/// Run `op` at `radius`, or on a downsampled copy at `limit` when the radius
/// is larger, scaling the result back up.
fn bounded_radius(
    input: &ImageBuf,
    radius: f32,
    limit: f32,
    op: impl FnOnce(&ImageBuf, f32) -> ImageBuf,
) -> ImageBuf {
    if radius <= limit {
        return op(input, radius);
    }
    let factor = radius / limit;
    let longest = input.width.max(input.height) as f32;
    let small = input.downsample((longest / factor).round().max(1.0) as u32);
    op(&small, limit).resized(input.width, input.height)
}

/// Gaussian blur where `radius` is the sigma in pixels. Large radii blur a
/// downsampled copy and scale back up.
pub(crate) fn gaussian(input: &ImageBuf, radius: f32) -> ImageBuf {
    if radius <= 0.0 || input.is_empty() {
        return input.clone();
    }
    bounded_radius(input, radius, DOWNSAMPLING_LIMIT, |buf, sigma| {
        separable(buf, &gaussian_kernel(sigma))
    })
}

/// Box blur averaging a `(2r + 1)` square window, with `r` rounded to whole
/// pixels.
pub(crate) fn box_blur(input: &ImageBuf, radius: f32) -> ImageBuf {
    if radius.is_nan() || radius < 0.5 || input.is_empty() {
        return input.clone();
    }
    bounded_radius(input, radius, BOX_LIMIT, |buf, r| {
        let n = 2 * r.round() as usize + 1;
        separable(buf, &vec![1.0 / n as f32; n])
    })
}

#[derive(Clone, Debug)]
pub struct GaussianBlur {
    pub blur_radius_in_pixels: f32,
}

impl Default for GaussianBlur {
    fn default() -> Self {
        Self {
            blur_radius_in_pixels: 2.0,
        }
    }
}

impl ImageOperation for GaussianBlur {
    fn name(&self) -> &'static str {
        "gaussian_blur"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        Ok(gaussian(input, self.blur_radius_in_pixels))
    }
}

/// Frosted-glass blur: desaturate, blur at quarter resolution, then compress
/// the luminance range toward mid grey.
#[derive(Clone, Debug)]
pub struct IosBlur {
    pub blur_radius_in_pixels: f32,
    pub saturation: f32,
    pub range_reduction_factor: f32,
}

impl Default for IosBlur {
    fn default() -> Self {
        Self {
            blur_radius_in_pixels: 48.0,
            saturation: 0.8,
            range_reduction_factor: 0.6,
        }
    }
}

impl ImageOperation for IosBlur {
    fn name(&self) -> &'static str {
        "ios_blur"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if input.is_empty() {
            return Ok(input.clone());
        }
        let (w, h) = (input.width, input.height);
        let longest = w.max(h) as f32;
        let small = input.downsample((longest / IOS_BLUR_DOWNSAMPLING).round().max(1.0) as u32);

        let saturation = self.saturation;
        let desaturated = small.map_pixels(|px| {
            let rgb = [px[0], px[1], px[2]];
            let y = luminance(rgb);
            let [r, g, b] = mix_rgb([y, y, y], rgb, saturation);
            [r, g, b, px[3]]
        });

        let blurred = gaussian(&desaturated, self.blur_radius_in_pixels / IOS_BLUR_DOWNSAMPLING);
        let factor = self.range_reduction_factor;
        let reduced = blurred.map_pixels(|px| {
            let shift = (0.5 - luminance_of(px)) * factor;
            [px[0] + shift, px[1] + shift, px[2] + shift, px[3]]
        });
        Ok(reduced.resized(w, h))
    }
}

// Nine taps: center plus four on each side.
const LINE_WEIGHTS: [f32; 5] = [0.18, 0.15, 0.12, 0.09, 0.05];

fn line_blur(input: &ImageBuf, offset: impl Fn(f32, f32) -> (f32, f32) + Sync) -> ImageBuf {
    let (w, h) = (input.width, input.height);
    ImageBuf::generate(w, h, |x, y| {
        let u = (x as f32 + 0.5) / w as f32;
        let v = (y as f32 + 0.5) / h as f32;
        let (du, dv) = offset(u, v);
        let mut acc = [0.0; 4];
        for (i, weight) in LINE_WEIGHTS.iter().enumerate() {
            let k = i as f32;
            let forward = input.sample(u + du * k, v + dv * k);
            for c in 0..4 {
                acc[c] += forward[c] * weight;
            }
            if i > 0 {
                let back = input.sample(u - du * k, v - dv * k);
                for c in 0..4 {
                    acc[c] += back[c] * weight;
                }
            }
        }
        acc
    })
}

#[derive(Clone, Debug)]
pub struct MotionBlur {
    pub blur_size: f32,
    /// Degrees.
    pub blur_angle: f32,
}

impl Default for MotionBlur {
    fn default() -> Self {
        Self {
            blur_size: 2.5,
            blur_angle: 0.0,
        }
    }
}

impl ImageOperation for MotionBlur {
    fn name(&self) -> &'static str {
        "motion_blur"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if input.is_empty() {
            return Ok(input.clone());
        }
        let radians = self.blur_angle.to_radians();
        let du = self.blur_size * radians.cos() / input.width as f32;
        let dv = self.blur_size * radians.sin() / input.height as f32;
        Ok(line_blur(input, |_, _| (du, dv)))
    }
}

#[derive(Clone, Debug)]
pub struct ZoomBlur {
    pub blur_size: f32,
    pub blur_center: Position,
}

impl Default for ZoomBlur {
    fn default() -> Self {
        Self {
            blur_size: 1.0,
            blur_center: Position::CENTER,
        }
    }
}

impl ImageOperation for ZoomBlur {
    fn name(&self) -> &'static str {
        "zoom_blur"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let center = self.blur_center;
        let scale = self.blur_size / 100.0;
        Ok(line_blur(input, |u, v| {
            ((center.x - u) * scale, (center.y - v) * scale)
        }))
    }
}

/// Keeps a horizontal band in focus and blurs above and below it.
#[derive(Clone, Debug)]
pub struct TiltShift {
    pub blur_radius_in_pixels: f32,
    pub top_focus_level: f32,
    pub bottom_focus_level: f32,
    pub focus_fall_off_rate: f32,
}

impl Default for TiltShift {
    fn default() -> Self {
        Self {
            blur_radius_in_pixels: 7.0,
            top_focus_level: 0.4,
            bottom_focus_level: 0.6,
            focus_fall_off_rate: 0.2,
        }
    }
}

impl ImageOperation for TiltShift {
    fn name(&self) -> &'static str {
        "tilt_shift"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let blurred = gaussian(input, self.blur_radius_in_pixels);
        let (w, h) = (input.width, input.height);
        let (top, bottom, falloff) = (
            self.top_focus_level,
            self.bottom_focus_level,
            self.focus_fall_off_rate,
        );
        Ok(ImageBuf::generate(w, h, |x, y| {
            let v = (y as f32 + 0.5) / h as f32;
            let amount = (1.0 - smoothstep(top - falloff, top, v))
                + smoothstep(bottom, bottom + falloff, v);
            let sharp = input.pixel(x, y);
            let soft = blurred.pixel(x, y);
            [
                mix(sharp[0], soft[0], amount),
                mix(sharp[1], soft[1], amount),
                mix(sharp[2], soft[2], amount),
                sharp[3],
            ]
        }))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Sharpen {
    pub sharpness: f32,
}

impl ImageOperation for Sharpen {
    fn name(&self) -> &'static str {
        "sharpen"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if self.sharpness == 0.0 {
            return Ok(input.clone());
        }
        let s = self.sharpness;
        let center_weight = 1.0 + 4.0 * s;
        Ok(ImageBuf::generate(input.width, input.height, |x, y| {
            let (xi, yi) = (x as i64, y as i64);
            let c = input.pixel(x, y);
            let l = input.sample_clamped(xi - 1, yi);
            let r = input.sample_clamped(xi + 1, yi);
            let t = input.sample_clamped(xi, yi - 1);
            let b = input.sample_clamped(xi, yi + 1);
            let mut out = c;
            for ch in 0..3 {
                out[ch] = c[ch] * center_weight - (l[ch] + r[ch] + t[ch] + b[ch]) * s;
            }
            out
        }))
    }
}

/// Oil-paint effect: each pixel takes the mean of whichever of its four
/// quadrant windows has the lowest variance.
#[derive(Clone, Debug)]
pub struct Kuwahara {
    pub radius: f32,
}

impl Default for Kuwahara {
    fn default() -> Self {
        Self { radius: 3.0 }
    }
}

impl ImageOperation for Kuwahara {
    fn name(&self) -> &'static str {
        "kuwahara"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if self.radius.is_nan() || self.radius < 0.5 || input.is_empty() {
            return Ok(input.clone());
        }
        Ok(bounded_radius(input, self.radius, BOX_LIMIT, |buf, r| {
            kuwahara(buf, r.round() as i64)
        }))
    }
}

fn kuwahara(input: &ImageBuf, r: i64) -> ImageBuf {
    let quadrants = [(-r, 0, -r, 0), (0, r, -r, 0), (0, r, 0, r), (-r, 0, 0, r)];
    ImageBuf::generate(input.width, input.height, |x, y| {
        let (xi, yi) = (x as i64, y as i64);
        let mut best = input.pixel(x, y);
        let mut best_variance = f32::MAX;
        for &(x0, x1, y0, y1) in &quadrants {
            let mut mean = [0.0f32; 3];
            let mut sq = [0.0f32; 3];
            let mut n = 0.0f32;
            for j in y0..=y1 {
                for i in x0..=x1 {
                    let px = input.sample_clamped(xi + i, yi + j);
                    for c in 0..3 {
                        mean[c] += px[c];
                        sq[c] += px[c] * px[c];
                    }
                    n += 1.0;
                }
            }
            let mut variance = 0.0;
            for c in 0..3 {
                mean[c] /= n;
                variance += (sq[c] / n - mean[c] * mean[c]).abs();
            }
            if variance < best_variance {
                best_variance = variance;
                best = [mean[0], mean[1], mean[2], best[3]];
            }
        }
        best
    })
}

/// Binarizes against the local mean luminance.
#[derive(Clone, Debug)]
pub struct AdaptiveThreshold {
    pub blur_radius_in_pixels: f32,
}

impl Default for AdaptiveThreshold {
    fn default() -> Self {
        Self {
            blur_radius_in_pixels: 4.0,
        }
    }
}

impl ImageOperation for AdaptiveThreshold {
    fn name(&self) -> &'static str {
        "adaptive_threshold"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let grey = input.mapped(|px| {
            let y = luminance_of(px);
            [y, y, y, px[3]]
        });
        let local = box_blur(&grey, self.blur_radius_in_pixels);
        Ok(ImageBuf::generate(grey.width, grey.height, |x, y| {
            let px = grey.pixel(x, y);
            let v = step(local.pixel(x, y)[0] - 0.05, px[0]);
            [v, v, v, px[3]]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::test_util::{assert_close, checker, solid};

    fn spread(buf: &ImageBuf) -> f32 {
        let reds = buf.data.chunks_exact(4).map(|px| px[0]);
        let (lo, hi) = reds.fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        hi - lo
    }

    #[test]
    fn kernel_is_normalized() {
        for sigma in [0.5, 2.0, 7.5] {
            let sum: f32 = gaussian_kernel(sigma).iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn blur_keeps_solid_color() {
        let out = GaussianBlur::default().process(&solid([0.3, 0.6, 0.9])).unwrap();
        for px in out.data.chunks_exact(4) {
            assert_close([px[0], px[1], px[2], px[3]], [0.3, 0.6, 0.9, 1.0], 1e-5);
        }
    }

    #[test]
    fn blur_softens_edges() {
        let input = checker(32, 32);
        let out = GaussianBlur::default().process(&input).unwrap();
        assert!(spread(&out) < spread(&input));
    }

    #[test]
    fn large_radius_keeps_dimensions() {
        let input = checker(40, 24);
        let out = GaussianBlur {
            blur_radius_in_pixels: 30.0,
        }
        .process(&input)
        .unwrap();
        assert_eq!((out.width, out.height), (40, 24));
        assert!(spread(&out) < 0.5);
    }

    #[test]
    fn ios_blur_keeps_dimensions() {
        let out = IosBlur::default().process(&checker(37, 21)).unwrap();
        assert_eq!((out.width, out.height), (37, 21));
    }

    #[test]
    fn sharpen_zero_is_identity() {
        let input = checker(8, 8);
        assert_eq!(Sharpen::default().process(&input).unwrap(), input);
    }

    #[test]
    fn sharpen_increases_contrast() {
        let input = checker(16, 16);
        let out = Sharpen { sharpness: 0.5 }.process(&input).unwrap();
        assert!(spread(&out) > spread(&input));
    }

    #[test]
    fn line_blurs_keep_solid_color() {
        let input = solid([0.2, 0.4, 0.6]);
        for op in [
            Box::new(MotionBlur::default()) as Box<dyn ImageOperation>,
            Box::new(ZoomBlur::default()),
            Box::new(Kuwahara::default()),
        ] {
            let out = op.process(&input).unwrap();
            assert_close(out.pixel(1, 2), [0.2, 0.4, 0.6, 1.0], 1e-5);
        }
    }

    #[test]
    fn tilt_shift_keeps_band_sharp() {
        let input = checker(32, 64);
        let out = TiltShift::default().process(&input).unwrap();
        assert_eq!(out.pixel(5, 32), input.pixel(5, 32));
        assert_ne!(out.pixel(5, 1), input.pixel(5, 1));
    }

    #[test]
    fn adaptive_threshold_of_flat_image_is_white() {
        let out = AdaptiveThreshold::default()
            .process(&solid([0.3, 0.3, 0.3]))
            .unwrap();
        assert_close(out.pixel(0, 0), [1.0, 1.0, 1.0, 1.0], 0.0);
    }

    #[test]
    fn huge_window_radii_run_downsampled() {
        let input = checker(12, 8);
        let threshold = AdaptiveThreshold {
            blur_radius_in_pixels: 1.0e12,
        }
        .process(&input)
        .unwrap();
        assert_eq!((threshold.width, threshold.height), (12, 8));

        let painted = Kuwahara { radius: 1.0e12 }.process(&input).unwrap();
        assert_eq!((painted.width, painted.height), (12, 8));

        let flat = Kuwahara { radius: 5.0e9 }
            .process(&solid([0.2, 0.4, 0.6]))
            .unwrap();
        assert_close(flat.pixel(1, 1), [0.2, 0.4, 0.6, 1.0], 1e-5);

        assert_eq!(box_blur(&input, f32::INFINITY).width, 12);
        assert_eq!(box_blur(&input, f32::NAN), input);
    }

    #[test]
    fn box_blur_matches_window_below_limit() {
        let input = checker(9, 9);
        let out = box_blur(&input, 1.0);
        let mean: f32 = (0..3)
            .flat_map(|j| (0..3).map(move |i| (i + 3, j + 3)))
            .map(|(x, y)| input.pixel(x, y)[0])
            .sum::<f32>()
            / 9.0;
        assert!((out.pixel(4, 4)[0] - mean).abs() < 1e-5);
    }
}
