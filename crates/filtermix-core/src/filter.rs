use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, ParameterError};
use crate::operation::{self as op, LookupFilter, Operation};
use crate::parameter::{mismatch, Accessor, ParameterDescriptor, ScalarParameter};

/// Slider descriptor bound to `Operation::$variant`'s `$field`.
macro_rules! scalar {
    (@build $name:literal, $range:expr, $steps:expr, $variant:ident . $field:ident) => {
        ParameterDescriptor::Scalar(ScalarParameter {
            name: $name,
            range: $range,
            step_count: $steps,
            get: |operation| match operation {
                Operation::$variant(o) => Ok(o.$field),
                other => Err(mismatch($name, other)),
            },
            set: |operation, value| match operation {
                Operation::$variant(o) => {
                    o.$field = value;
                    Ok(())
                }
                other => Err(mismatch($name, other)),
            },
        })
    };
    ($name:literal, $range:expr, steps $steps:literal, $variant:ident . $field:ident) => {
        scalar!(@build $name, $range, Some($steps), $variant.$field)
    };
    ($name:literal, $range:expr, $variant:ident . $field:ident) => {
        scalar!(@build $name, $range, None, $variant.$field)
    };
}

macro_rules! accessor {
    ($kind:ident, $name:literal, $variant:ident . $field:ident) => {
        ParameterDescriptor::$kind(Accessor {
            name: $name,
            get: |operation| match operation {
                Operation::$variant(o) => Ok(o.$field),
                other => Err(mismatch($name, other)),
            },
            set: |operation, value| match operation {
                Operation::$variant(o) => {
                    o.$field = value;
                    Ok(())
                }
                other => Err(mismatch($name, other)),
            },
        })
    };
}

/// Which family a catalog entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterClass {
    Generic,
    Lookup,
    CoreImage,
}

impl FilterClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Lookup => "lookup",
            Self::CoreImage => "core-image",
        }
    }
}

impl fmt::Display for FilterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! filter_kinds {
    (@asset) => { None };
    (@asset $asset:literal) => { Some($asset) };
    ($($variant:ident => $tag:literal, $class:ident $(($asset:literal))?;)+) => {
        /// Every filter the mixer offers. The serialized form is the stable
        /// camelCase tag stored in saved representations.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum FilterKind {
            $(
                #[serde(rename = $tag)]
                $variant,
            )+
        }

        impl FilterKind {
            const ALL: &'static [FilterKind] = &[$(Self::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag),+
                }
            }

            pub fn class(self) -> FilterClass {
                match self {
                    $(Self::$variant => FilterClass::$class),+
                }
            }

            /// Bundled lookup image the filter grades with, if any.
            pub fn lookup_asset(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => filter_kinds!(@asset $($asset)?)),+
                }
            }
        }
    };
}

filter_kinds! {
    AdaptiveThreshold => "adaptiveThreshold", Generic;
    Brightness => "brightness", Generic;
    Bulge => "bulge", Generic;
    Contrast => "contrast", Generic;
    Exposure => "exposure", Generic;
    FalseColor => "falseColor", Generic;
    GaussianBlur => "gaussianBlur", Generic;
    GlassSphere => "glassSphere", Generic;
    Halftone => "halftone", Generic;
    Haze => "haze", Generic;
    HighlightAndShadowTint => "highlightAndShadowTint", Generic;
    HueRotation => "hueRotation", Generic;
    IosBlur => "iosBlur", Generic;
    Kuwahara => "kuwahara", Generic;
    LevelsAdjustment => "levelsAdjustment", Generic;
    Luminance => "luminance", Generic;
    LuminanceThreshold => "luminanceThreshold", Generic;
    Monochrome => "monochrome", Generic;
    MotionBlur => "motionBlur", Generic;
    Opacity => "opacity", Generic;
    Pinch => "pinch", Generic;
    Pixellate => "pixellate", Generic;
    PolarPixellate => "polarPixellate", Generic;
    PolkaDot => "polkaDot", Generic;
    Posterize => "posterize", Generic;
    PrewittEdgeDetection => "prewittEdgeDetection", Generic;
    RgbAdjustment => "rgbAdjustment", Generic;
    Saturation => "saturation", Generic;
    Sepia => "sepia", Generic;
    Sharpness => "sharpness", Generic;
    Sketch => "sketch", Generic;
    SobelEdgeDetection => "sobelEdgeDetection", Generic;
    Solarize => "solarize", Generic;
    SphereRefraction => "sphereRefraction", Generic;
    Stretch => "stretch", Generic;
    Swirl => "swirl", Generic;
    ThresholdSketch => "thresholdSketch", Generic;
    ThresholdSobelEdgeDetection => "thresholdSobelEdgeDetection", Generic;
    TiltShift => "tiltShift", Generic;
    Toon => "toon", Generic;
    Vibrance => "vibrance", Generic;
    Vignette => "vignette", Generic;
    WhiteBalance => "whiteBalance", Generic;
    ZoomBlur => "zoomBlur", Generic;

    Amatorka => "amatorka", Lookup("lookup_amatorka");
    MissEtitake => "missEtitake", Lookup("lookup_miss_etikate");
    SoftElegance => "softElegance", Lookup;
    TwoStrip => "twoStrip", Lookup("lookup_2strip");
    ThreeStrip => "threeStrip", Lookup("lookup_3strip");
    BleachBypass => "bleachBypass", Lookup("lookup_bleach_bypass");
    Candlelight => "candlelight", Lookup("lookup_candlelight");
    CrispWarm => "crispWarm", Lookup("lookup_crisp_warm");
    CrispWinter => "crispWinter", Lookup("lookup_crisp_winter");
    DropBlues => "dropBlues", Lookup("lookup_drop_blues");
    EdgyAmber => "edgyAmber", Lookup("lookup_edgy_amber");
    FallColors => "fallColors", Lookup("lookup_fall_colors");
    Filmstock50 => "filmstock50", Lookup("lookup_filmstock_50");
    FoggyNight => "foggyNight", Lookup("lookup_foggy_night");
    FujiEternaFuji3510 => "fujiEternaFuji3510", Lookup("lookup_fuji_eterna_fuji_3510");
    FujiEternaKodak2395 => "fujiEternaKodak2395", Lookup("lookup_fuji_eterna_kodak_2395");
    FujiF125Kodak2393 => "fujiF125Kodak2393", Lookup("lookup_fuji_f125_kodak_2393");
    FujiF125Kodak2395 => "fujiF125Kodak2395", Lookup("lookup_fuji_f125_kodak_2395");
    FujiReala500DKodak2393 => "fujiReala500DKodak2393", Lookup("lookup_fuji_reala_500d_kodak_2393");
    FuturisticBleak => "futuristicBleak", Lookup("lookup_futuristic_bleak");
    HorrorBlue => "horrorBlue", Lookup("lookup_horror_blue");
    Kodak5205Fuji3510 => "kodak5205Fuji3510", Lookup("lookup_kodak_5205_fuji_3510");
    Kodak5218Kodak2383 => "kodak5218Kodak2383", Lookup("lookup_kodak_5218_kodak_2383");
    Kodak5218Kodak2395 => "kodak5218Kodak2395", Lookup("lookup_kodak_5218_kodak_2395");
    LateSunset => "lateSunset", Lookup("lookup_late_sunset");
    Moonlight => "moonlight", Lookup("lookup_moonlight");
    NightFromDay => "nightFromDay", Lookup("lookup_night_from_day");
    SoftWarming => "softWarming", Lookup("lookup_soft_warming");
    TealOrangePlusContrast => "tealOrangePlusContrast", Lookup("lookup_teal_orange_plus_contrast");
    TensionGreen => "tensionGreen", Lookup("lookup_tension_green");
    OldPhoto1 => "oldPhoto1", Lookup("lookup_old_photo_1");
    OldPhoto15 => "oldPhoto15", Lookup("lookup_old_photo_15");
    Cyberpunk3 => "cyberpunk3", Lookup("lookup_cyberpunk_3");
    F4 => "f4", Lookup("lookup_f4");

    CiGaussianBlur => "ciGaussianBlur", CoreImage;
    CiUnsharpMask => "ciUnsharpMask", CoreImage;
    CiHueAdjust => "ciHueAdjust", CoreImage;
    CiGloom => "ciGloom", CoreImage;
    CiComicEffect => "ciComicEffect", CoreImage;
    CiBokehEffect => "ciBokehEffect", CoreImage;
    CiPixellate => "ciPixellate", CoreImage;
    CiHexagonalPixellate => "ciHexagonalPixellate", CoreImage;
}

/// Split a camelCase identifier into capitalized words.
pub(crate) fn readable(identifier: &str) -> String {
    let mut spaced = String::with_capacity(identifier.len() + 8);
    for ch in identifier.chars() {
        if ch.is_uppercase() {
            spaced.push(' ');
        }
        spaced.push(ch);
    }
    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl FilterKind {
    pub fn all() -> &'static [FilterKind] {
        Self::ALL
    }

    pub fn generic_filters() -> Vec<FilterKind> {
        Self::of_class(FilterClass::Generic)
    }

    pub fn lookup_filters() -> Vec<FilterKind> {
        Self::of_class(FilterClass::Lookup)
    }

    pub fn core_image_filters() -> Vec<FilterKind> {
        Self::of_class(FilterClass::CoreImage)
    }

    fn of_class(class: FilterClass) -> Vec<FilterKind> {
        Self::ALL.iter().copied().filter(|k| k.class() == class).collect()
    }

    pub fn is_lookup_filter(self) -> bool {
        self.class() == FilterClass::Lookup
    }

    pub fn is_core_image_filter(self) -> bool {
        self.class() == FilterClass::CoreImage
    }

    pub fn display_name(self) -> String {
        let stylized = match self {
            Self::IosBlur => "iOS Blur",
            Self::RgbAdjustment => "RGB Adjustment",
            Self::Filmstock50 => "Filmstock 50",
            Self::FujiEternaFuji3510 => "Fuji Eterna Fuji 3510",
            Self::FujiEternaKodak2395 => "Fuji Eterna Kodak 2395",
            Self::FujiF125Kodak2393 => "Fuji F125 Kodak 2393",
            Self::FujiF125Kodak2395 => "Fuji F125 Kodak 2395",
            Self::FujiReala500DKodak2393 => "Fuji Reala 500D Kodak 2393",
            Self::Kodak5205Fuji3510 => "Kodak 5205 Fuji 3510",
            Self::Kodak5218Kodak2383 => "Kodak 5218 Kodak 2383",
            Self::Kodak5218Kodak2395 => "Kodak 5218 Kodak 2395",
            Self::OldPhoto1 => "Old Photo 1",
            Self::OldPhoto15 => "Old Photo 15",
            Self::Cyberpunk3 => "Cyberpunk 3",
            _ => {
                let tag = self.as_str();
                return match tag.strip_prefix("ci") {
                    Some(rest) => format!("CI {}", readable(rest)),
                    None => readable(tag),
                };
            }
        };
        stylized.to_owned()
    }

    /// Ordered descriptors for this filter's adjustable settings. Each call
    /// builds a fresh list.
    pub fn parameters(self) -> Vec<ParameterDescriptor> {
        use ParameterDescriptor as P;

        match self {
            Self::AdaptiveThreshold => vec![scalar!(
                "blurRadiusInPixels",
                1.0..=30.0,
                steps 60,
                AdaptiveThreshold.blur_radius_in_pixels
            )],
            Self::Brightness => vec![scalar!("brightness", 0.0..=1.0, Brightness.brightness)],
            Self::Bulge => vec![
                accessor!(Position, "center", Bulge.center),
                scalar!("radius", 0.0..=1.0, steps 20, Bulge.radius),
                scalar!("scale", 0.0..=1.0, steps 20, Bulge.scale),
            ],
            Self::Contrast => vec![scalar!("contrast", 0.0..=2.0, Contrast.contrast)],
            Self::Exposure => vec![scalar!("exposure", -1.0..=1.0, Exposure.exposure)],
            Self::FalseColor => vec![
                accessor!(Color, "firstColor", FalseColor.first_color),
                accessor!(Color, "secondColor", FalseColor.second_color),
            ],
            Self::GaussianBlur => vec![scalar!(
                "blurRadiusInPixels",
                0.1..=50.0,
                GaussianBlur.blur_radius_in_pixels
            )],
            Self::GlassSphere => vec![
                scalar!("radius", 0.0..=1.0, GlassSphere.radius),
                scalar!("refractiveIndex", 0.0..=1.0, GlassSphere.refractive_index),
            ],
            Self::Halftone => vec![scalar!(
                "fractionalWidthOfPixel",
                0.01..=0.1,
                Halftone.fractional_width_of_pixel
            )],
            Self::Haze => vec![
                scalar!("hazeDistance", 0.0..=1.0, Haze.distance),
                scalar!("slope", 0.0..=1.0, Haze.slope),
            ],
            Self::HighlightAndShadowTint => vec![
                scalar!(
                    "highlightTintIntensity",
                    0.0..=1.0,
                    HighlightAndShadowTint.highlight_tint_intensity
                ),
                accessor!(Color, "highlightTintColor", HighlightAndShadowTint.highlight_tint_color),
                scalar!(
                    "shadowTintIntensity",
                    0.0..=1.0,
                    HighlightAndShadowTint.shadow_tint_intensity
                ),
                accessor!(Color, "shadowTintColor", HighlightAndShadowTint.shadow_tint_color),
            ],
            Self::HueRotation => vec![P::Scalar(ScalarParameter {
                name: "hue",
                range: 0.0..=180.0,
                step_count: Some(90),
                get: |operation| match operation {
                    Operation::HueAdjustment(o) => {
                        Ok(normalized(o.hue, HUE_SPAN, (0.0, 180.0)).round())
                    }
                    other => Err(mismatch("hue", other)),
                },
                set: |operation, value| match operation {
                    Operation::HueAdjustment(o) => {
                        o.hue = normalized(value.round(), (0.0, 180.0), HUE_SPAN);
                        Ok(())
                    }
                    other => Err(mismatch("hue", other)),
                },
            })],
            Self::IosBlur => vec![
                scalar!("blurRadiusInPixels", 0.01..=60.0, IosBlur.blur_radius_in_pixels),
                scalar!("saturation", 0.0..=1.0, IosBlur.saturation),
                scalar!("rangeReductionFactor", 0.0..=1.0, IosBlur.range_reduction_factor),
            ],
            Self::Kuwahara => vec![scalar!("radius", 1.0..=10.0, Kuwahara.radius)],
            Self::LevelsAdjustment => vec![
                accessor!(Color, "minimum", LevelsAdjustment.minimum),
                accessor!(Color, "middle", LevelsAdjustment.middle),
                accessor!(Color, "maximum", LevelsAdjustment.maximum),
            ],
            Self::Luminance => Vec::new(),
            Self::LuminanceThreshold => {
                vec![scalar!("threshold", 0.0..=1.0, LuminanceThreshold.threshold)]
            }
            Self::Monochrome => vec![
                accessor!(Color, "filterColor", Monochrome.color),
                scalar!("intensity", 0.0..=1.0, Monochrome.intensity),
            ],
            Self::MotionBlur => vec![
                scalar!("blurSize", 0.01..=50.0, MotionBlur.blur_size),
                scalar!("blurAngle", 0.0..=180.0, MotionBlur.blur_angle),
            ],
            Self::Opacity => vec![scalar!("opacity", 0.0..=1.0, Opacity.opacity)],
            Self::Pinch => vec![
                accessor!(Position, "center", Pinch.center),
                scalar!("radius", 0.0..=1.0, Pinch.radius),
                scalar!("scale", 0.0..=1.0, Pinch.scale),
            ],
            Self::Pixellate => vec![scalar!(
                "fractionalWidthOfPixel",
                0.01..=0.1,
                Pixellate.fractional_width_of_pixel
            )],
            Self::PolarPixellate => vec![
                accessor!(Size, "pixelSize", PolarPixellate.pixel_size),
                accessor!(Position, "center", PolarPixellate.center),
            ],
            Self::PolkaDot => vec![
                scalar!(
                    "fractionalWidthOfPixel",
                    0.01..=0.1,
                    PolkaDot.fractional_width_of_pixel
                ),
                scalar!("dotScaling", 0.0..=1.0, PolkaDot.dot_scaling),
            ],
            Self::Posterize => vec![scalar!("colorLevels", 0.0..=10.0, Posterize.color_levels)],
            Self::PrewittEdgeDetection => vec![scalar!(
                "edgeStrength",
                0.1..=4.0,
                PrewittEdgeDetection.edge_strength
            )],
            Self::RgbAdjustment => vec![
                scalar!("redAdjustment", 0.0..=1.0, RgbAdjustment.red),
                scalar!("blueAdjustment", 0.0..=1.0, RgbAdjustment.blue),
                scalar!("greenAdjustment", 0.0..=1.0, RgbAdjustment.green),
            ],
            Self::Saturation => vec![scalar!("saturation", 0.0..=1.0, Saturation.saturation)],
            Self::Sepia => vec![scalar!("intensity", 0.0..=1.0, Sepia.intensity)],
            Self::Sharpness => vec![scalar!("sharpness", 0.0..=1.0, Sharpen.sharpness)],
            Self::Sketch => vec![scalar!("edgeStrength", 0.1..=4.0, Sketch.edge_strength)],
            Self::SobelEdgeDetection => vec![scalar!(
                "edgeStrength",
                0.1..=4.0,
                SobelEdgeDetection.edge_strength
            )],
            Self::Solarize => vec![scalar!("threshold", 0.0..=1.0, Solarize.threshold)],
            Self::SphereRefraction => vec![
                accessor!(Position, "center", SphereRefraction.center),
                scalar!("radius", 0.0..=1.0, SphereRefraction.radius),
                scalar!("refractiveIndex", 0.0..=1.0, SphereRefraction.refractive_index),
            ],
            Self::Stretch => vec![accessor!(Position, "center", Stretch.center)],
            Self::Swirl => vec![
                scalar!("radius", 0.0..=1.0, Swirl.radius),
                scalar!("angle", 0.0..=PI, Swirl.angle),
                accessor!(Position, "center", Swirl.center),
            ],
            Self::ThresholdSketch => vec![
                scalar!("edgeStrength", 0.1..=4.0, ThresholdSketch.edge_strength),
                scalar!("threshold", 0.0..=1.0, ThresholdSketch.threshold),
            ],
            Self::ThresholdSobelEdgeDetection => vec![
                scalar!("edgeStrength", 0.1..=4.0, ThresholdSobel.edge_strength),
                scalar!("threshold", 0.0..=1.0, ThresholdSobel.threshold),
            ],
            Self::TiltShift => vec![
                scalar!("blurRadiusInPixels", 1.0..=50.0, steps 49, TiltShift.blur_radius_in_pixels),
                scalar!("topFocusLevel", 0.0..=1.0, steps 20, TiltShift.top_focus_level),
                scalar!("bottomFocusLevel", 0.0..=1.0, steps 20, TiltShift.bottom_focus_level),
                scalar!("focusFallOffRate", 0.0..=1.0, steps 20, TiltShift.focus_fall_off_rate),
            ],
            Self::Toon => vec![
                scalar!("threshold", 0.0..=1.0, Toon.threshold),
                scalar!("quantizationLevels", 0.0..=20.0, Toon.quantization_levels),
            ],
            Self::Vibrance => vec![scalar!("vibrance", 0.0..=1.0, Vibrance.vibrance)],
            Self::Vignette => vec![
                accessor!(Position, "vignetteCenter", Vignette.center),
                accessor!(Color, "vignetteColor", Vignette.color),
                scalar!("vignetteStart", 0.0..=1.0, Vignette.start),
                scalar!("vignetteEnd", 0.0..=1.0, Vignette.end),
            ],
            Self::WhiteBalance => vec![
                scalar!("temperature", 4000.0..=6000.0, WhiteBalance.temperature),
                scalar!("tint", 0.0..=1.0, WhiteBalance.tint),
            ],
            Self::ZoomBlur => vec![
                scalar!("size", 0.0..=40.0, ZoomBlur.blur_size),
                accessor!(Position, "blurCenter", ZoomBlur.blur_center),
            ],

            Self::SoftElegance => {
                vec![scalar!("intensity", 0.0..=1.0, steps 50, SoftElegance.intensity)]
            }

            Self::CiGaussianBlur => vec![scalar!("radius", 1.0..=60.0, CiGaussianBlur.radius)],
            Self::CiUnsharpMask => vec![
                scalar!("radius", 0.0..=20.0, CiUnsharpMask.radius),
                scalar!("intensity", 0.0..=20.0, CiUnsharpMask.intensity),
            ],
            Self::CiHueAdjust => vec![P::Scalar(ScalarParameter {
                name: "angle",
                range: 0.0..=180.0,
                step_count: None,
                get: |operation| match operation {
                    Operation::CiHueAdjust(o) => Ok(o.angle.to_degrees()),
                    other => Err(mismatch("angle", other)),
                },
                set: |operation, value| match operation {
                    Operation::CiHueAdjust(o) => {
                        o.angle = value.to_radians();
                        Ok(())
                    }
                    other => Err(mismatch("angle", other)),
                },
            })],
            Self::CiGloom | Self::CiComicEffect => Vec::new(),
            Self::CiBokehEffect => vec![
                scalar!("ringSize", 0.1..=5.0, CiBokehBlur.ring_size),
                scalar!("ringAmount", 0.0..=10.0, CiBokehBlur.ring_amount),
                scalar!("softness", 0.0..=10.0, CiBokehBlur.softness),
                scalar!("radius", 1.0..=60.0, CiBokehBlur.radius),
            ],
            Self::CiPixellate => vec![scalar!("scale", 0.1..=60.0, CiPixellate.scale)],
            Self::CiHexagonalPixellate => {
                vec![scalar!("scale", 0.1..=60.0, CiHexagonalPixellate.scale)]
            }

            _ => vec![scalar!("intensity", 0.0..=1.0, steps 50, LookupFilter.intensity)],
        }
    }

    /// A fresh operation with default settings. Lookup filters name their
    /// asset and start out on the identity table.
    pub fn make_operation(self) -> Operation {
        if let Some(asset) = self.lookup_asset() {
            return LookupFilter::named(asset).into();
        }
        match self {
            Self::AdaptiveThreshold => op::AdaptiveThreshold::default().into(),
            Self::Brightness => op::Brightness::default().into(),
            Self::Bulge => op::Bulge::default().into(),
            Self::Contrast => op::Contrast::default().into(),
            Self::Exposure => op::Exposure::default().into(),
            Self::FalseColor => op::FalseColor::default().into(),
            Self::GaussianBlur => op::GaussianBlur::default().into(),
            Self::GlassSphere => op::GlassSphere::default().into(),
            Self::Halftone => op::Halftone::default().into(),
            Self::Haze => op::Haze::default().into(),
            Self::HighlightAndShadowTint => op::HighlightAndShadowTint::default().into(),
            Self::HueRotation => op::HueAdjustment::default().into(),
            Self::IosBlur => op::IosBlur::default().into(),
            Self::Kuwahara => op::Kuwahara::default().into(),
            Self::LevelsAdjustment => op::LevelsAdjustment::default().into(),
            Self::Luminance => op::Luminance.into(),
            Self::LuminanceThreshold => op::LuminanceThreshold::default().into(),
            Self::Monochrome => op::Monochrome::default().into(),
            Self::MotionBlur => op::MotionBlur::default().into(),
            Self::Opacity => op::Opacity::default().into(),
            Self::Pinch => op::Pinch::default().into(),
            Self::Pixellate => op::Pixellate::default().into(),
            Self::PolarPixellate => op::PolarPixellate::default().into(),
            Self::PolkaDot => op::PolkaDot::default().into(),
            Self::Posterize => op::Posterize::default().into(),
            Self::PrewittEdgeDetection => op::PrewittEdgeDetection::default().into(),
            Self::RgbAdjustment => op::RgbAdjustment::default().into(),
            Self::Saturation => op::Saturation::default().into(),
            Self::Sepia => op::Sepia::default().into(),
            Self::Sharpness => op::Sharpen::default().into(),
            Self::Sketch => op::Sketch::default().into(),
            Self::SobelEdgeDetection => op::SobelEdgeDetection::default().into(),
            Self::Solarize => op::Solarize::default().into(),
            Self::SphereRefraction => op::SphereRefraction::default().into(),
            Self::Stretch => op::Stretch::default().into(),
            Self::Swirl => op::Swirl::default().into(),
            Self::ThresholdSketch => op::ThresholdSketch::default().into(),
            Self::ThresholdSobelEdgeDetection => op::ThresholdSobel::default().into(),
            Self::TiltShift => op::TiltShift::default().into(),
            Self::Toon => op::Toon::default().into(),
            Self::Vibrance => op::Vibrance::default().into(),
            Self::Vignette => op::Vignette::default().into(),
            Self::WhiteBalance => op::WhiteBalance::default().into(),
            Self::ZoomBlur => op::ZoomBlur::default().into(),
            Self::SoftElegance => op::SoftElegance::default().into(),
            Self::CiGaussianBlur => op::CiGaussianBlur::default().into(),
            Self::CiUnsharpMask => op::CiUnsharpMask::default().into(),
            Self::CiHueAdjust => op::CiHueAdjust::default().into(),
            Self::CiGloom => op::CiGloom::default().into(),
            Self::CiComicEffect => op::CiComicEffect.into(),
            Self::CiBokehEffect => op::CiBokehBlur::default().into(),
            Self::CiPixellate => op::CiPixellate::default().into(),
            Self::CiHexagonalPixellate => op::CiHexagonalPixellate::default().into(),
            _ => LookupFilter::default().into(),
        }
    }

    /// Descriptor named `name`, if this filter has one.
    pub fn parameter(self, name: &str) -> Result<ParameterDescriptor, ParameterError> {
        self.parameters()
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ParameterError::UnknownParameter {
                filter: self.as_str(),
                name: name.to_owned(),
            })
    }
}

/// Stored hue span (degrees) that the 0...180 slider maps onto.
const HUE_SPAN: (f32, f32) = (90.0 - FRAC_PI_2, 90.0 + FRAC_PI_2);

fn normalized(value: f32, from: (f32, f32), to: (f32, f32)) -> f32 {
    let t = (value - from.0) / (from.1 - from.0);
    to.0 + (to.1 - to.0) * t
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownFilter(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{Color, ParameterValue};

    #[test]
    fn catalog_has_every_filter() {
        assert_eq!(FilterKind::all().len(), 86);
        assert_eq!(FilterKind::generic_filters().len(), 44);
        assert_eq!(FilterKind::lookup_filters().len(), 34);
        assert_eq!(FilterKind::core_image_filters().len(), 8);
    }

    #[test]
    fn groups_partition_catalog_in_order() {
        let mut joined = FilterKind::generic_filters();
        joined.extend(FilterKind::lookup_filters());
        joined.extend(FilterKind::core_image_filters());
        assert_eq!(joined, FilterKind::all());
        for kind in FilterKind::all() {
            assert!(!(kind.is_lookup_filter() && kind.is_core_image_filter()));
        }
    }

    #[test]
    fn tags_roundtrip() {
        for &kind in FilterKind::all() {
            assert_eq!(kind.as_str().parse::<FilterKind>().unwrap(), kind);
        }
        assert_eq!(
            "blurry".parse::<FilterKind>(),
            Err(CatalogError::UnknownFilter("blurry".into()))
        );
    }

    #[test]
    fn serde_uses_tags() {
        let json = serde_json::to_string(&FilterKind::FujiReala500DKodak2393).unwrap();
        assert_eq!(json, r#""fujiReala500DKodak2393""#);
        let kind: FilterKind = serde_json::from_str(r#""thresholdSobelEdgeDetection""#).unwrap();
        assert_eq!(kind, FilterKind::ThresholdSobelEdgeDetection);
    }

    #[test]
    fn display_names() {
        assert_eq!(FilterKind::IosBlur.display_name(), "iOS Blur");
        assert_eq!(FilterKind::RgbAdjustment.display_name(), "RGB Adjustment");
        assert_eq!(FilterKind::SobelEdgeDetection.display_name(), "Sobel Edge Detection");
        assert_eq!(FilterKind::TwoStrip.display_name(), "Two Strip");
        assert_eq!(FilterKind::MissEtitake.display_name(), "Miss Etitake");
        assert_eq!(FilterKind::F4.display_name(), "F4");
        assert_eq!(FilterKind::Kodak5218Kodak2383.display_name(), "Kodak 5218 Kodak 2383");
        assert_eq!(FilterKind::CiHexagonalPixellate.display_name(), "CI Hexagonal Pixellate");
        assert_eq!(FilterKind::CiGloom.display_name(), "CI Gloom");
    }

    #[test]
    fn readable_parameter_names() {
        assert_eq!(readable("blurRadiusInPixels"), "Blur Radius In Pixels");
        assert_eq!(readable("intensity"), "Intensity");
    }

    #[test]
    fn default_values_fall_within_ranges() {
        for &kind in FilterKind::all() {
            let operation = kind.make_operation();
            for parameter in kind.parameters() {
                let value = parameter
                    .read(&operation)
                    .unwrap_or_else(|e| panic!("{kind}: {e}"));
                if let (Some(range), ParameterValue::Float(v)) = (parameter.range(), value) {
                    assert!(range.contains(&v), "{kind}.{} = {v}", parameter.name());
                }
            }
        }
    }

    #[test]
    fn parameterless_filters() {
        for kind in [FilterKind::Luminance, FilterKind::CiGloom, FilterKind::CiComicEffect] {
            assert!(kind.parameters().is_empty());
        }
    }

    #[test]
    fn lookup_filters_expose_intensity() {
        for kind in FilterKind::lookup_filters() {
            let params = kind.parameters();
            assert_eq!(params.len(), 1);
            assert_eq!(params[0].name(), "intensity");
            assert_eq!(params[0].step_count(), Some(50));
            assert_eq!(params[0].read(&kind.make_operation()), Ok(ParameterValue::Float(1.0)));
        }
    }

    #[test]
    fn lookup_operations_name_their_asset() {
        let Operation::LookupFilter(op) = FilterKind::TwoStrip.make_operation() else {
            panic!("expected a lookup operation");
        };
        assert_eq!(op.asset, Some("lookup_2strip"));
        assert!(matches!(
            FilterKind::SoftElegance.make_operation(),
            Operation::SoftElegance(_)
        ));
    }

    #[test]
    fn hue_slider_maps_through_stored_span() {
        let kind = FilterKind::HueRotation;
        let hue = kind.parameter("hue").unwrap();
        let mut operation = kind.make_operation();
        assert_eq!(hue.read(&operation), Ok(ParameterValue::Float(90.0)));

        hue.write(&mut operation, &ParameterValue::Float(44.6)).unwrap();
        assert_eq!(hue.read(&operation), Ok(ParameterValue::Float(45.0)));
        let Operation::HueAdjustment(inner) = &operation else {
            unreachable!()
        };
        assert!((inner.hue - (90.0 - FRAC_PI_2 / 2.0)).abs() < 1e-4);
    }

    #[test]
    fn ci_hue_angle_is_degrees() {
        let kind = FilterKind::CiHueAdjust;
        let angle = kind.parameter("angle").unwrap();
        let mut operation = kind.make_operation();
        angle.write(&mut operation, &ParameterValue::Float(90.0)).unwrap();
        let Operation::CiHueAdjust(inner) = &operation else {
            unreachable!()
        };
        assert!((inner.angle - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn mismatched_operation_is_an_error() {
        let sepia = FilterKind::Sepia.parameter("intensity").unwrap();
        let mut blur = FilterKind::GaussianBlur.make_operation();
        assert_eq!(
            sepia.read(&blur),
            Err(ParameterError::OperationMismatch {
                parameter: "intensity",
                found: "gaussian_blur",
            })
        );
        assert!(sepia.write(&mut blur, &ParameterValue::Float(0.2)).is_err());
    }

    #[test]
    fn wrong_value_kind_is_rejected() {
        let first = FilterKind::FalseColor.parameter("firstColor").unwrap();
        let mut operation = FilterKind::FalseColor.make_operation();
        let err = first
            .write(&mut operation, &ParameterValue::Float(1.0))
            .unwrap_err();
        assert_eq!(
            err,
            ParameterError::ValueKind {
                parameter: "firstColor",
                expected: "COLOR",
                found: "FLOAT",
            }
        );
        first
            .write(&mut operation, &ParameterValue::Color(Color::WHITE))
            .unwrap();
        assert_eq!(first.read(&operation), Ok(ParameterValue::Color(Color::WHITE)));
    }

    #[test]
    fn out_of_range_values_are_stored() {
        let p = FilterKind::Brightness.parameter("brightness").unwrap();
        let mut operation = FilterKind::Brightness.make_operation();
        p.write(&mut operation, &ParameterValue::Float(3.0)).unwrap();
        assert_eq!(p.read(&operation), Ok(ParameterValue::Float(3.0)));
    }

    #[test]
    fn unknown_parameter_is_reported() {
        assert_eq!(
            FilterKind::Sepia.parameter("radius").unwrap_err(),
            ParameterError::UnknownParameter {
                filter: "sepia",
                name: "radius".into(),
            }
        );
    }
}
