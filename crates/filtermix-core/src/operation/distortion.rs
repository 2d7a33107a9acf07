use anyhow::Result;

use crate::color::smoothstep;
use crate::image_buf::ImageBuf;
use crate::operation::ImageOperation;
use crate::parameter::Position;

/// Resample `input` through a coordinate mapping in normalized space.
fn warp(input: &ImageBuf, f: impl Fn(f32, f32) -> (f32, f32) + Sync) -> ImageBuf {
    let (w, h) = (input.width, input.height);
    ImageBuf::generate(w, h, |x, y| {
        let u = (x as f32 + 0.5) / w as f32;
        let v = (y as f32 + 0.5) / h as f32;
        let (su, sv) = f(u, v);
        input.sample(su, sv)
    })
}

/// Distance from `center` with the vertical axis corrected for aspect ratio.
fn aspect_distance(center: Position, u: f32, v: f32, aspect: f32) -> f32 {
    let dv = (v - center.y) * aspect;
    ((u - center.x).powi(2) + dv.powi(2)).sqrt()
}

#[derive(Clone, Debug)]
pub struct Bulge {
    pub center: Position,
    pub radius: f32,
    pub scale: f32,
}

impl Default for Bulge {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            radius: 0.25,
            scale: 0.5,
        }
    }
}

impl ImageOperation for Bulge {
    fn name(&self) -> &'static str {
        "bulge"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let aspect = input.aspect_ratio();
        let Self {
            center,
            radius,
            scale,
        } = *self;
        Ok(warp(input, |u, v| {
            let dist = aspect_distance(center, u, v, aspect);
            if dist >= radius {
                return (u, v);
            }
            let percent = 1.0 - ((radius - dist) / radius) * scale;
            let percent = percent * percent;
            (
                (u - center.x) * percent + center.x,
                (v - center.y) * percent + center.y,
            )
        }))
    }
}

#[derive(Clone, Debug)]
pub struct Pinch {
    pub center: Position,
    pub radius: f32,
    pub scale: f32,
}

impl Default for Pinch {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            radius: 1.0,
            scale: 0.5,
        }
    }
}

impl ImageOperation for Pinch {
    fn name(&self) -> &'static str {
        "pinch"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let aspect = input.aspect_ratio();
        let Self {
            center,
            radius,
            scale,
        } = *self;
        Ok(warp(input, |u, v| {
            let dist = aspect_distance(center, u, v, aspect);
            if dist >= radius {
                return (u, v);
            }
            let percent = 1.0 + ((0.5 - dist) / 0.5) * scale;
            (
                (u - center.x) * percent + center.x,
                (v - center.y) * percent + center.y,
            )
        }))
    }
}

#[derive(Clone, Debug)]
pub struct Stretch {
    pub center: Position,
}

impl Default for Stretch {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
        }
    }
}

fn stretch_axis(coord: f32, center: f32) -> f32 {
    let n = 2.0 * coord - 1.0 - (2.0 * center - 1.0);
    let a = n.abs();
    let a = 0.5 * a + 0.5 * smoothstep(0.25, 0.5, a) * a;
    let n = a.copysign(n) + (2.0 * center - 1.0);
    n / 2.0 + 0.5
}

impl ImageOperation for Stretch {
    fn name(&self) -> &'static str {
        "stretch"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let center = self.center;
        Ok(warp(input, |u, v| {
            (stretch_axis(u, center.x), stretch_axis(v, center.y))
        }))
    }
}

#[derive(Clone, Debug)]
pub struct Swirl {
    pub center: Position,
    pub radius: f32,
    /// Radians.
    pub angle: f32,
}

impl Default for Swirl {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            radius: 0.5,
            angle: 1.0,
        }
    }
}

impl ImageOperation for Swirl {
    fn name(&self) -> &'static str {
        "swirl"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let Self {
            center,
            radius,
            angle,
        } = *self;
        Ok(warp(input, |u, v| {
            let (du, dv) = (u - center.x, v - center.y);
            let dist = (du * du + dv * dv).sqrt();
            if dist >= radius {
                return (u, v);
            }
            let percent = (radius - dist) / radius;
            let theta = percent * percent * angle * 8.0;
            let (s, c) = theta.sin_cos();
            (du * c - dv * s + center.x, du * s + dv * c + center.y)
        }))
    }
}

type Vec3 = [f32; 3];

fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn normalize(v: Vec3) -> Vec3 {
    let len = dot(v, v).sqrt();
    if len == 0.0 {
        return v;
    }
    [v[0] / len, v[1] / len, v[2] / len]
}

/// GLSL `refract`; total internal reflection yields the zero vector.
fn refract(incident: Vec3, normal: Vec3, eta: f32) -> Vec3 {
    let d = dot(normal, incident);
    let k = 1.0 - eta * eta * (1.0 - d * d);
    if k < 0.0 {
        return [0.0; 3];
    }
    let t = eta * d + k.sqrt();
    [
        eta * incident[0] - t * normal[0],
        eta * incident[1] - t * normal[1],
        eta * incident[2] - t * normal[2],
    ]
}

/// Surface normal of the sphere under `(u, v)`, or `None` outside it.
fn sphere_normal(center: Position, radius: f32, u: f32, v: f32, aspect: f32) -> Option<Vec3> {
    let cv = (v - center.y) * aspect + center.y;
    let (du, dv) = (u - center.x, cv - center.y);
    let dist = (du * du + dv * dv).sqrt();
    if radius <= 0.0 || dist > radius {
        return None;
    }
    let n = dist / radius;
    let depth = radius * (1.0 - n * n).max(0.0).sqrt();
    Some(normalize([du, dv, depth]))
}

const VIEW_RAY: Vec3 = [0.0, 0.0, -1.0];

/// Refracts the image through a glass sphere. Pixels outside the sphere become
/// transparent black.
#[derive(Clone, Debug)]
pub struct SphereRefraction {
    pub center: Position,
    pub radius: f32,
    pub refractive_index: f32,
}

impl Default for SphereRefraction {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            radius: 0.25,
            refractive_index: 0.71,
        }
    }
}

impl ImageOperation for SphereRefraction {
    fn name(&self) -> &'static str {
        "sphere_refraction"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let (w, h) = (input.width, input.height);
        let aspect = input.aspect_ratio();
        Ok(ImageBuf::generate(w, h, |x, y| {
            let u = (x as f32 + 0.5) / w as f32;
            let v = (y as f32 + 0.5) / h as f32;
            let Some(normal) = sphere_normal(self.center, self.radius, u, v, aspect) else {
                return [0.0; 4];
            };
            let r = refract(VIEW_RAY, normal, self.refractive_index);
            input.sample((r[0] + 1.0) * 0.5, (r[1] + 1.0) * 0.5)
        }))
    }
}

const LIGHT_POSITION: Vec3 = [-0.5, 0.5, 1.0];
const AMBIENT_LIGHT_POSITION: Vec3 = [0.0, 0.0, 1.0];

/// Sphere refraction with an inverted image, rim light and a specular highlight.
#[derive(Clone, Debug)]
pub struct GlassSphere {
    pub center: Position,
    pub radius: f32,
    pub refractive_index: f32,
}

impl Default for GlassSphere {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            radius: 0.25,
            refractive_index: 0.71,
        }
    }
}

impl ImageOperation for GlassSphere {
    fn name(&self) -> &'static str {
        "glass_sphere"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let (w, h) = (input.width, input.height);
        let aspect = input.aspect_ratio();
        let light = normalize(LIGHT_POSITION);
        Ok(ImageBuf::generate(w, h, |x, y| {
            let u = (x as f32 + 0.5) / w as f32;
            let v = (y as f32 + 0.5) / h as f32;
            let Some(normal) = sphere_normal(self.center, self.radius, u, v, aspect) else {
                return [0.0; 4];
            };
            let r = refract(VIEW_RAY, normal, self.refractive_index);
            let (ru, rv) = (-2.0 * r[0], -2.0 * r[1]);
            let px = input.sample((ru + 1.0) * 0.5, (rv + 1.0) * 0.5);

            let rim = 2.5
                * (1.0 - dot(AMBIENT_LIGHT_POSITION, normal).clamp(0.0, 1.0).powf(0.25));
            let specular = 0.8 * dot(light, normal).clamp(0.0, 1.0).powf(15.0);
            [
                px[0] + rim + specular,
                px[1] + rim + specular,
                px[2] + rim + specular,
                1.0,
            ]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::test_util::{assert_close, checker, solid};

    #[test]
    fn swirl_without_angle_is_identity() {
        let input = checker(16, 16);
        let out = Swirl {
            angle: 0.0,
            ..Default::default()
        }
        .process(&input)
        .unwrap();
        for y in 0..16 {
            for x in 0..16 {
                assert_close(out.pixel(x, y), input.pixel(x, y), 1e-4);
            }
        }
    }

    #[test]
    fn bulge_leaves_corners_alone() {
        let input = checker(32, 32);
        let out = Bulge::default().process(&input).unwrap();
        assert_close(out.pixel(0, 0), input.pixel(0, 0), 1e-4);
        assert_close(out.pixel(31, 31), input.pixel(31, 31), 1e-4);
    }

    #[test]
    fn pinch_with_zero_scale_is_identity() {
        let input = checker(16, 16);
        let out = Pinch {
            scale: 0.0,
            ..Default::default()
        }
        .process(&input)
        .unwrap();
        assert_close(out.pixel(5, 9), input.pixel(5, 9), 1e-4);
    }

    #[test]
    fn stretch_keeps_solid_color() {
        let out = Stretch::default().process(&solid([0.1, 0.2, 0.3])).unwrap();
        assert_close(out.pixel(3, 0), [0.1, 0.2, 0.3, 1.0], 1e-5);
    }

    #[test]
    fn sphere_clears_outside() {
        let input = solid([0.5, 0.5, 0.5]).resized(32, 32);
        let out = SphereRefraction::default().process(&input).unwrap();
        assert_eq!(out.pixel(0, 0), [0.0; 4]);
        assert!(out.pixel(16, 16)[3] > 0.0);
    }

    #[test]
    fn glass_sphere_is_opaque_inside() {
        let input = solid([0.5, 0.5, 0.5]).resized(32, 32);
        let out = GlassSphere::default().process(&input).unwrap();
        assert_eq!(out.pixel(0, 0), [0.0; 4]);
        assert_eq!(out.pixel(16, 16)[3], 1.0);
    }

    #[test]
    fn refract_straight_through_center() {
        let r = refract(VIEW_RAY, [0.0, 0.0, 1.0], 0.71);
        assert!(r[0].abs() < 1e-6 && r[1].abs() < 1e-6);
        assert!(r[2] < 0.0);
    }
}
