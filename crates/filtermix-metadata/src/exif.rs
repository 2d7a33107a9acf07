use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use exif::{In, Tag};
use filtermix_core::{ImageBuf, Orientation, source};
use tracing::debug;

fn read_exif(path: &Path) -> Result<exif::Exif> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    exif::Reader::new()
        .read_from_container(&mut reader)
        .with_context(|| format!("read EXIF from {}", path.display()))
}

fn orientation_of(exif: &exif::Exif) -> Option<Orientation> {
    let field = exif.get_field(Tag::Orientation, In::PRIMARY)?;
    let value = match field.value {
        exif::Value::Short(ref v) => v.first().map(|&x| x as u32),
        exif::Value::Long(ref v) => v.first().copied(),
        _ => field.display_value().to_string().trim().parse().ok(),
    }?;
    Orientation::from_exif(value)
}

/// The EXIF orientation of `path`, or `None` when the file has no usable tag.
pub fn read_orientation(path: &Path) -> Option<Orientation> {
    match read_exif(path) {
        Ok(exif) => orientation_of(&exif),
        Err(err) => {
            debug!(?path, %err, "no EXIF orientation");
            None
        }
    }
}

/// Load a source image and rotate it upright according to its EXIF tag.
pub fn load_upright(path: &Path, max_edge: Option<u32>) -> Result<ImageBuf> {
    let buf = source::load_any_scaled(path, max_edge)?;
    Ok(match read_orientation(path) {
        Some(orientation) => buf.oriented(orientation),
        None => buf,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Little-endian TIFF header with a single Orientation entry.
    fn tiff_with_orientation(value: u8) -> Vec<u8> {
        vec![
            0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, // header, IFD at 8
            0x01, 0x00, // one entry
            0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, value, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, // no next IFD
        ]
    }

    #[test]
    fn orientation_tag_is_mapped() {
        let exif = exif::Reader::new()
            .read_raw(tiff_with_orientation(6))
            .unwrap();
        assert_eq!(orientation_of(&exif), Some(Orientation::Rotate90));
    }

    #[test]
    fn out_of_range_tag_is_ignored() {
        let exif = exif::Reader::new()
            .read_raw(tiff_with_orientation(42))
            .unwrap();
        assert_eq!(orientation_of(&exif), None);
    }

    #[test]
    fn missing_file_has_no_orientation() {
        assert_eq!(read_orientation(Path::new("/nonexistent/photo.jpg")), None);
    }

    #[test]
    fn png_without_exif_loads_unrotated() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plain.png");
        source::save_image(&ImageBuf::filled(6, 3, [0.2, 0.4, 0.6, 1.0]), &path).unwrap();

        assert_eq!(read_orientation(&path), None);
        let buf = load_upright(&path, None).unwrap();
        assert_eq!((buf.width, buf.height), (6, 3));
    }
}
