use std::path::Path;

use anyhow::{Context, Result, bail};
use image::{DynamicImage, ImageFormat};
use tracing::{debug, info};

use crate::image_buf::ImageBuf;

pub const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "cr3", "crw", "nef", "nrw", "arw", "srf", "sr2", "raf", "rw2", "orf", "pef", "dng",
    "3fr", "ari", "bay", "cap", "dcr", "erf", "fff", "iiq", "k25", "kdc", "mef", "mos", "mrw",
    "raw", "rwl", "srw", "x3f",
];

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif"];

pub fn is_supported_extension(ext: &str) -> bool {
    let lower = ext.to_ascii_lowercase();
    RAW_EXTENSIONS.contains(&lower.as_str()) || IMAGE_EXTENSIONS.contains(&lower.as_str())
}

pub fn is_raw_extension(ext: &str) -> bool {
    RAW_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(is_supported_extension)
}

/// Decode a RAW file through rawler's default develop pipeline. The result
/// keeps rawler's sRGB encoding, which is what the filters expect.
pub fn decode_raw(path: &Path) -> Result<ImageBuf> {
    info!(?path, "decoding RAW file");
    let t0 = std::time::Instant::now();

    let raw_image = rawler::decode_file(path)
        .with_context(|| format!("failed to decode RAW: {}", path.display()))?;
    debug!(elapsed_ms = t0.elapsed().as_millis(), "rawler decode_file");

    let develop = rawler::imgop::develop::RawDevelop::default();
    let intermediate = develop
        .develop_intermediate(&raw_image)
        .with_context(|| format!("development failed: {}", path.display()))?;

    match intermediate {
        rawler::imgop::develop::Intermediate::ThreeColor(rgb) => {
            let width = rgb.width as u32;
            let height = rgb.height as u32;
            let mut data = Vec::with_capacity(rgb.data.len() * 4);
            for pixel in &rgb.data {
                data.extend_from_slice(&[
                    pixel[0].clamp(0.0, 1.0),
                    pixel[1].clamp(0.0, 1.0),
                    pixel[2].clamp(0.0, 1.0),
                    1.0,
                ]);
            }
            debug!(elapsed_ms = t0.elapsed().as_millis(), "total decode_raw");
            ImageBuf::from_data(width, height, data)
        }
        _ => bail!("unexpected intermediate format (expected RGB)"),
    }
}

/// Load a JPEG, PNG or TIFF, optionally shrinking so the longest edge fits
/// within `max_edge`. Resizing happens on the 8-bit image before widening
/// to f32.
pub fn load_image_scaled(path: &Path, max_edge: Option<u32>) -> Result<ImageBuf> {
    info!(?path, "loading image file");
    let t0 = std::time::Instant::now();

    let img =
        image::open(path).with_context(|| format!("failed to open image: {}", path.display()))?;
    debug!(
        elapsed_ms = t0.elapsed().as_millis(),
        width = img.width(),
        height = img.height(),
        "image decode"
    );

    let img = match max_edge {
        Some(max) if img.width().max(img.height()) > max => {
            img.resize(max, max, image::imageops::FilterType::Triangle)
        }
        _ => img,
    };
    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    let data = rgba.into_raw().into_iter().map(|v| v as f32 / 255.0).collect();
    ImageBuf::from_data(width, height, data)
}

pub fn load_any(path: &Path) -> Result<ImageBuf> {
    load_any_scaled(path, None)
}

/// Load any supported file. RAW files decode at full resolution and are
/// box-downsampled afterwards.
pub fn load_any_scaled(path: &Path, max_edge: Option<u32>) -> Result<ImageBuf> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    if is_raw_extension(ext) {
        let buf = decode_raw(path)?;
        match max_edge {
            Some(max) if buf.width.max(buf.height) > max => Ok(buf.downsample(max)),
            _ => Ok(buf),
        }
    } else {
        load_image_scaled(path, max_edge)
    }
}

/// Write `buf` as PNG, JPEG or TIFF depending on the extension of `path`.
pub fn save_image(buf: &ImageBuf, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unknown output format: {}", path.display()))?;
    let dynamic = buf.to_dynamic()?;
    let dynamic = match format {
        ImageFormat::Png | ImageFormat::Tiff => dynamic,
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(dynamic.into_rgb8()),
        other => bail!("unsupported output format {other:?}: {}", path.display()),
    };
    dynamic
        .save_with_format(path, format)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(?path, width = buf.width, height = buf.height, "saved image");
    Ok(())
}
