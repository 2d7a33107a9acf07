use std::fmt;
use std::sync::{Arc, LazyLock};

use anyhow::Result;
use image::DynamicImage;
use tracing::{debug, warn};

use crate::color::{mix, mix_rgb};
use crate::error::LookupError;
use crate::image_buf::ImageBuf;
use crate::operation::blur::gaussian;
use crate::operation::{ImageOperation, Operation};

/// Edge length of a lookup image: an 8x8 grid of 64x64 tiles.
pub const LOOKUP_DIMENSION: u32 = 512;

const TILES_PER_ROW: f32 = 8.0;
const TILE: f32 = 1.0 / TILES_PER_ROW;
const TEXEL: f32 = 1.0 / LOOKUP_DIMENSION as f32;

/// A 64-level color cube unfolded into a 512x512 image. Blue selects the
/// tile; red and green index within it.
#[derive(Clone, PartialEq)]
pub struct LookupTable {
    image: ImageBuf,
}

static IDENTITY: LazyLock<Arc<LookupTable>> =
    LazyLock::new(|| Arc::new(LookupTable::identity()));

impl LookupTable {
    pub fn from_image(image: ImageBuf) -> Result<Self, LookupError> {
        if image.width != LOOKUP_DIMENSION || image.height != LOOKUP_DIMENSION {
            return Err(LookupError::Dimensions {
                expected: LOOKUP_DIMENSION,
                width: image.width,
                height: image.height,
            });
        }
        Ok(Self { image })
    }

    pub fn from_dynamic(image: &DynamicImage) -> Result<Self, LookupError> {
        Self::from_image(ImageBuf::from_dynamic(image))
    }

    /// The table that maps every color to itself.
    pub fn identity() -> Self {
        Self {
            image: Self::identity_image(),
        }
    }

    /// Process-wide identity table, shared by every unbound lookup operation.
    pub fn shared_identity() -> Arc<Self> {
        Arc::clone(&IDENTITY)
    }

    pub fn identity_image() -> ImageBuf {
        ImageBuf::generate(LOOKUP_DIMENSION, LOOKUP_DIMENSION, |x, y| {
            let (tile_x, tile_y) = (x / 64, y / 64);
            [
                (x % 64) as f32 / 63.0,
                (y % 64) as f32 / 63.0,
                (tile_y * 8 + tile_x) as f32 / 63.0,
                1.0,
            ]
        })
    }

    pub fn image(&self) -> &ImageBuf {
        &self.image
    }

    pub fn lookup(&self, rgb: [f32; 3]) -> [f32; 3] {
        let [r, g, b] = rgb.map(|c| c.clamp(0.0, 1.0));
        let blue = b * 63.0;
        let tap = |slice: f32| {
            let row = (slice / TILES_PER_ROW).floor();
            let col = slice - row * TILES_PER_ROW;
            let u = col * TILE + 0.5 * TEXEL + (TILE - TEXEL) * r;
            let v = row * TILE + 0.5 * TEXEL + (TILE - TEXEL) * g;
            let px = self.image.sample(u, v);
            [px[0], px[1], px[2]]
        };
        mix_rgb(tap(blue.floor()), tap(blue.ceil()), blue.fract())
    }

    fn apply(&self, input: &ImageBuf, intensity: f32) -> ImageBuf {
        input.mapped(|px| {
            let rgb = [px[0], px[1], px[2]];
            let [r, g, b] = mix_rgb(rgb, self.lookup(rgb), intensity);
            [r, g, b, px[3]]
        })
    }
}

impl fmt::Debug for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupTable")
            .field("width", &self.image.width)
            .field("height", &self.image.height)
            .finish_non_exhaustive()
    }
}

/// Resolves named lookup assets to tables.
pub trait LookupResolver: Send + Sync {
    fn resolve(&self, asset: &str) -> Option<Arc<LookupTable>>;
}

/// Resolver that hands out the identity table for every asset.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityLookups;

impl LookupResolver for IdentityLookups {
    fn resolve(&self, _asset: &str) -> Option<Arc<LookupTable>> {
        Some(LookupTable::shared_identity())
    }
}

fn resolve_or_identity(resolver: &dyn LookupResolver, asset: &str) -> Arc<LookupTable> {
    match resolver.resolve(asset) {
        Some(table) => {
            debug!(asset, "bound lookup asset");
            table
        }
        None => {
            warn!(asset, "lookup asset not found, using identity table");
            LookupTable::shared_identity()
        }
    }
}

/// Color grading through a lookup table, blended by `intensity`.
#[derive(Clone, Debug)]
pub struct LookupFilter {
    /// Asset the table is loaded from; `None` for user-imported tables.
    pub asset: Option<&'static str>,
    pub table: Arc<LookupTable>,
    pub intensity: f32,
}

impl Default for LookupFilter {
    fn default() -> Self {
        Self::with_table(LookupTable::shared_identity())
    }
}

impl LookupFilter {
    /// Unbound operation for a bundled asset; starts on the identity table.
    pub fn named(asset: &'static str) -> Self {
        Self {
            asset: Some(asset),
            ..Self::default()
        }
    }

    pub fn with_table(table: Arc<LookupTable>) -> Self {
        Self {
            asset: None,
            table,
            intensity: 1.0,
        }
    }
}

impl ImageOperation for LookupFilter {
    fn name(&self) -> &'static str {
        "lookup"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        Ok(self.table.apply(input, self.intensity))
    }
}

pub const SOFT_ELEGANCE_ASSETS: [&str; 2] = ["lookup_soft_elegance_1", "lookup_soft_elegance_2"];
const SOFT_ELEGANCE_BLUR: f32 = 10.0;
const SOFT_ELEGANCE_GLOW: f32 = 0.14;

/// Two-stage lookup grade with a soft glow between the stages.
#[derive(Clone, Debug)]
pub struct SoftElegance {
    pub first: Arc<LookupTable>,
    pub second: Arc<LookupTable>,
    pub intensity: f32,
}

impl Default for SoftElegance {
    fn default() -> Self {
        Self {
            first: LookupTable::shared_identity(),
            second: LookupTable::shared_identity(),
            intensity: 1.0,
        }
    }
}

impl ImageOperation for SoftElegance {
    fn name(&self) -> &'static str {
        "soft_elegance"
    }

    fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
        let graded = self.first.apply(input, 1.0);
        let glow = gaussian(&graded, SOFT_ELEGANCE_BLUR);
        let mut blended = graded;
        for (dst, src) in blended.data.iter_mut().zip(&glow.data) {
            *dst = mix(*dst, *src, SOFT_ELEGANCE_GLOW);
        }
        let finished = self.second.apply(&blended, 1.0);

        let intensity = self.intensity;
        let mut out = input.clone();
        for (px, done) in out.data.chunks_exact_mut(4).zip(finished.data.chunks_exact(4)) {
            for c in 0..3 {
                px[c] = mix(px[c], done[c], intensity);
            }
        }
        Ok(out)
    }
}

impl Operation {
    /// Bind every named lookup asset this operation references. Unresolvable
    /// assets fall back to the identity table.
    pub fn bind_lookups(&mut self, resolver: &dyn LookupResolver) {
        match self {
            Self::LookupFilter(op) => {
                if let Some(asset) = op.asset {
                    op.table = resolve_or_identity(resolver, asset);
                }
            }
            Self::SoftElegance(op) => {
                op.first = resolve_or_identity(resolver, SOFT_ELEGANCE_ASSETS[0]);
                op.second = resolve_or_identity(resolver, SOFT_ELEGANCE_ASSETS[1]);
            }
            _ => {}
        }
    }
}
