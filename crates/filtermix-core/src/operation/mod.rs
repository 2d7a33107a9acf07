pub mod adjust;
pub mod blur;
pub mod core_image;
pub mod distortion;
pub mod edge;
pub mod lookup;
pub mod pixellate;
pub mod tone;

use anyhow::Result;

use crate::image_buf::ImageBuf;

pub use adjust::{
    Brightness, Contrast, Exposure, HueAdjustment, LevelsAdjustment, Opacity, RgbAdjustment,
    Saturation, Vibrance, WhiteBalance,
};
pub use blur::{
    AdaptiveThreshold, GaussianBlur, IosBlur, Kuwahara, MotionBlur, Sharpen, TiltShift, ZoomBlur,
};
pub use core_image::{
    CiBokehBlur, CiComicEffect, CiGaussianBlur, CiGloom, CiHexagonalPixellate, CiHueAdjust,
    CiPixellate, CiUnsharpMask,
};
pub use distortion::{Bulge, GlassSphere, Pinch, SphereRefraction, Stretch, Swirl};
pub use edge::{PrewittEdgeDetection, Sketch, SobelEdgeDetection, ThresholdSketch, ThresholdSobel, Toon};
pub use lookup::{LookupFilter, SoftElegance};
pub use pixellate::{Halftone, Pixellate, PolarPixellate, PolkaDot};
pub use tone::{
    FalseColor, Haze, HighlightAndShadowTint, Luminance, LuminanceThreshold, Monochrome,
    Posterize, Sepia, Solarize, Vignette,
};

/// A single image transform in the pipeline.
pub trait ImageOperation: Send + Sync {
    fn name(&self) -> &'static str;
    fn process(&self, input: &ImageBuf) -> Result<ImageBuf>;
}

macro_rules! operations {
    ($($variant:ident),+ $(,)?) => {
        /// A live filter instance: one variant per concrete operation type,
        /// each carrying its own typed settings.
        #[derive(Clone, Debug)]
        pub enum Operation {
            $($variant($variant)),+
        }

        impl Operation {
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant(op) => op.name()),+
                }
            }

            pub fn process(&self, input: &ImageBuf) -> Result<ImageBuf> {
                match self {
                    $(Self::$variant(op) => op.process(input)),+
                }
            }
        }

        $(
            impl From<$variant> for Operation {
                fn from(op: $variant) -> Self {
                    Self::$variant(op)
                }
            }
        )+
    };
}

operations! {
    Brightness,
    Contrast,
    Exposure,
    Saturation,
    Vibrance,
    HueAdjustment,
    RgbAdjustment,
    LevelsAdjustment,
    WhiteBalance,
    Opacity,
    Posterize,
    Solarize,
    Luminance,
    LuminanceThreshold,
    Monochrome,
    FalseColor,
    Sepia,
    Haze,
    HighlightAndShadowTint,
    Vignette,
    GaussianBlur,
    IosBlur,
    MotionBlur,
    ZoomBlur,
    TiltShift,
    Sharpen,
    Kuwahara,
    AdaptiveThreshold,
    Bulge,
    Pinch,
    Stretch,
    Swirl,
    SphereRefraction,
    GlassSphere,
    SobelEdgeDetection,
    PrewittEdgeDetection,
    Sketch,
    ThresholdSketch,
    ThresholdSobel,
    Toon,
    Pixellate,
    PolarPixellate,
    PolkaDot,
    Halftone,
    LookupFilter,
    SoftElegance,
    CiGaussianBlur,
    CiUnsharpMask,
    CiHueAdjust,
    CiGloom,
    CiComicEffect,
    CiBokehBlur,
    CiPixellate,
    CiHexagonalPixellate,
}
