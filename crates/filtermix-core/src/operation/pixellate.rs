use anyhow::Result;

use crate::color::{glsl_mod, luminance_of, step};
use crate::image_buf::ImageBuf;
use crate::operation::ImageOperation;
use crate::parameter::{Position, Size};

/// Cell grid shared by the square pixellation family. Cells are
/// `fraction` wide and square in pixels.
struct Cells {
    divisor_u: f32,
    divisor_v: f32,
    aspect: f32,
}

impl Cells {
    fn new(fraction: f32, aspect: f32) -> Self {
        Self {
            divisor_u: fraction,
            divisor_v: fraction / aspect,
            aspect,
        }
    }

    /// Center of the cell containing `(u, v)`.
    fn sample_point(&self, u: f32, v: f32) -> (f32, f32) {
        (
            u - glsl_mod(u, self.divisor_u) + 0.5 * self.divisor_u,
            v - glsl_mod(v, self.divisor_v) + 0.5 * self.divisor_v,
        )
    }

    /// Distance to the cell center, measured with square cells.
    fn distance_to(&self, (su, sv): (f32, f32), u: f32, v: f32) -> f32 {
        let adjust = |t: f32| t * self.aspect + 0.5 - 0.5 * self.aspect;
        let du = su - u;
        let dv = adjust(sv) - adjust(v);
        (du * du + dv * dv).sqrt()
    }
}

fn cell_pass(
    input: &ImageBuf,
    fraction: f32,
    f: impl Fn(&Cells, [f32; 4], (f32, f32), f32, f32) -> [f32; 4] + Sync,
) -> ImageBuf {
    let (w, h) = (input.width, input.height);
    let cells = Cells::new(fraction, input.aspect_ratio());
    ImageBuf::generate(w, h, |x, y| {
        let u = (x as f32 + 0.5) / w as f32;
        let v = (y as f32 + 0.5) / h as f32;
        let point = cells.sample_point(u, v);
        let sampled = input.sample(point.0, point.1);
        f(&cells, sampled, point, u, v)
    })
}

#[derive(Clone, Debug)]
pub struct Pixellate {
    pub fractional_width_of_pixel: f32,
}

impl Default for Pixellate {
    fn default() -> Self {
        Self {
            fractional_width_of_pixel: 0.01,
        }
    }
}

impl ImageOperation for Pixellate {
    fn name(&self) -> &'static str {
        "pixellate"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        if self.fractional_width_of_pixel <= 0.0 || input.is_empty() {
            return Ok(input.clone());
        }
        Ok(cell_pass(input, self.fractional_width_of_pixel, |_, px, _, _, _| px))
    }
}

/// Pixellation in polar coordinates around `center`. `pixel_size.width` is the
/// radial step and `pixel_size.height` the angular step in radians.
#[derive(Clone, Debug)]
pub struct PolarPixellate {
    pub center: Position,
    pub pixel_size: Size,
}

impl Default for PolarPixellate {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            pixel_size: Size::new(0.05, 0.05),
        }
    }
}

impl ImageOperation for PolarPixellate {
    fn name(&self) -> &'static str {
        "polar_pixellate"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let Size { width: dr, height: dphi } = self.pixel_size;
        if dr <= 0.0 || dphi <= 0.0 || input.is_empty() {
            return Ok(input.clone());
        }
        let (w, h) = (input.width, input.height);
        let (cx, cy) = (2.0 * self.center.x - 1.0, 2.0 * self.center.y - 1.0);
        Ok(ImageBuf::generate(w, h, |x, y| {
            let nx = 2.0 * (x as f32 + 0.5) / w as f32 - 1.0 - cx;
            let ny = 2.0 * (y as f32 + 0.5) / h as f32 - 1.0 - cy;
            let r = (nx * nx + ny * ny).sqrt();
            let phi = ny.atan2(nx);
            let r = r - glsl_mod(r, dr) + 0.03;
            let phi = phi - glsl_mod(phi, dphi);
            let (s, c) = phi.sin_cos();
            input.sample((r * c + cx) / 2.0 + 0.5, (r * s + cy) / 2.0 + 0.5)
        }))
    }
}

/// Round dots of each cell's color on black.
#[derive(Clone, Debug)]
pub struct PolkaDot {
    pub fractional_width_of_pixel: f32,
    pub dot_scaling: f32,
}

impl Default for PolkaDot {
    fn default() -> Self {
        Self {
            fractional_width_of_pixel: 0.01,
            dot_scaling: 0.9,
        }
    }
}

impl ImageOperation for PolkaDot {
    fn name(&self) -> &'static str {
        "polka_dot"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let fraction = self.fractional_width_of_pixel;
        if fraction <= 0.0 || input.is_empty() {
            return Ok(input.clone());
        }
        let dot_radius = fraction * 0.5 * self.dot_scaling;
        Ok(cell_pass(input, fraction, |cells, px, point, u, v| {
            let inside = step(cells.distance_to(point, u, v), dot_radius);
            [px[0] * inside, px[1] * inside, px[2] * inside, px[3]]
        }))
    }
}

/// Black dots on white, sized by each cell's darkness.
#[derive(Clone, Debug)]
pub struct Halftone {
    pub fractional_width_of_pixel: f32,
}

impl Default for Halftone {
    fn default() -> Self {
        Self {
            fractional_width_of_pixel: 0.01,
        }
    }
}

impl ImageOperation for Halftone {
    fn name(&self) -> &'static str {
        "halftone"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let fraction = self.fractional_width_of_pixel;
        if fraction <= 0.0 || input.is_empty() {
            return Ok(input.clone());
        }
        Ok(cell_pass(input, fraction, |cells, px, point, u, v| {
            let dot_radius = fraction * 0.5 * (1.0 - luminance_of(px));
            let paper = 1.0 - step(cells.distance_to(point, u, v), dot_radius);
            [paper, paper, paper, 1.0]
        }))
    }
}
