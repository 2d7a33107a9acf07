use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use filtermix_core::LookupTable;
use image::ImageFormat;
use tracing::{debug, info, warn};

const EXTENSION: &str = "png";
const AUTO_PREFIX: &str = "image";

/// Directory of user-imported lookup images, one `<name>.png` per table.
pub struct LookupStore {
    dir: PathBuf,
}

impl LookupStore {
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("create lookup dir: {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the lookup called `name` lives. A trailing `.png` is ignored.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let stem = name.strip_suffix(".png").unwrap_or(name);
        self.dir.join(format!("{stem}.{EXTENSION}"))
    }

    /// Stored lookup images, sorted by path.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read directory: {}", self.dir.display()))?
        {
            let path = entry?.path();
            let is_png = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(EXTENSION));
            if path.is_file() && is_png {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self
            .list()?
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_owned))
            .collect())
    }

    /// Import an encoded lookup image. The image must decode to a 512x512
    /// table. Without a name the first free `image<N>` is used, counting from
    /// the number of stored files, and identical content already in the store
    /// is reused instead of written again. A given name is always written.
    pub fn save(&self, encoded: &[u8], name: Option<&str>) -> Result<PathBuf> {
        let decoded = image::load_from_memory(encoded).context("failed to decode lookup image")?;
        LookupTable::from_dynamic(&decoded)?;

        let png = if image::guess_format(encoded).ok() == Some(ImageFormat::Png) {
            encoded.to_vec()
        } else {
            let mut buf = Cursor::new(Vec::new());
            decoded
                .write_to(&mut buf, ImageFormat::Png)
                .context("failed to encode lookup as PNG")?;
            buf.into_inner()
        };

        let content_hash = blake3::hash(&png);
        let path = match name {
            Some(name) => self.path_for(name),
            None => {
                let existing = self.list()?;
                for path in &existing {
                    let Ok(bytes) = fs::read(path) else {
                        continue;
                    };
                    if blake3::hash(&bytes) == content_hash {
                        info!(?path, "identical lookup already stored");
                        return Ok(path.clone());
                    }
                }
                let mut n = existing.len();
                loop {
                    let candidate = self.path_for(&format!("{AUTO_PREFIX}{n}"));
                    if !candidate.exists() {
                        break candidate;
                    }
                    n += 1;
                }
            }
        };

        fs::write(&path, &png).with_context(|| format!("write lookup: {}", path.display()))?;
        info!(?path, hash = %content_hash.to_hex(), "stored lookup");
        Ok(path)
    }

    /// Import a lookup image from a file on disk.
    pub fn import(&self, source: &Path, name: Option<&str>) -> Result<PathBuf> {
        let bytes =
            fs::read(source).with_context(|| format!("failed to read {}", source.display()))?;
        self.save(&bytes, name)
    }

    /// Remove a stored lookup. Returns whether a file was removed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name);
        if !path.exists() {
            debug!(?path, "lookup already absent");
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("remove lookup: {}", path.display()))?;
        info!(?path, "deleted lookup");
        Ok(true)
    }

    pub fn load(&self, name: &str) -> Result<Option<LookupTable>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        load_table(&path).map(Some)
    }

    /// Every stored table in path order. Files that fail to decode are skipped.
    pub fn load_all(&self) -> Result<Vec<(String, Arc<LookupTable>)>> {
        let mut tables = Vec::new();
        for path in self.list()? {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_owned();
            match load_table(&path) {
                Ok(table) => tables.push((name, Arc::new(table))),
                Err(err) => warn!(?path, %err, "skipping unreadable lookup"),
            }
        }
        Ok(tables)
    }
}

pub(crate) fn load_table(path: &Path) -> Result<LookupTable> {
    let img =
        image::open(path).with_context(|| format!("failed to open lookup: {}", path.display()))?;
    LookupTable::from_dynamic(&img).with_context(|| format!("invalid lookup: {}", path.display()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use filtermix_core::ImageBuf;

    pub fn encode(buf: &ImageBuf, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        let dynamic = buf.to_dynamic().unwrap();
        let dynamic = match format {
            ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(dynamic.into_rgb8()),
            _ => dynamic,
        };
        dynamic.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    pub fn identity_png() -> Vec<u8> {
        encode(&LookupTable::identity_image(), ImageFormat::Png)
    }

    pub fn inverted_png() -> Vec<u8> {
        let inverted = LookupTable::identity_image()
            .map_pixels(|px| [1.0 - px[0], 1.0 - px[1], 1.0 - px[2], px[3]]);
        encode(&inverted, ImageFormat::Png)
    }

    #[test]
    fn open_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested/lookups");
        let store = LookupStore::open(dir.clone()).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn auto_names_count_up() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LookupStore::open(tmp.path().to_path_buf()).unwrap();
        let first = store.save(&identity_png(), None).unwrap();
        let second = store.save(&inverted_png(), None).unwrap();
        assert!(first.ends_with("image0.png"));
        assert!(second.ends_with("image1.png"));
        assert_eq!(store.names().unwrap(), vec!["image0", "image1"]);
    }

    #[test]
    fn auto_name_skips_taken_slot() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LookupStore::open(tmp.path().to_path_buf()).unwrap();
        store.save(&identity_png(), Some("image1")).unwrap();
        // One file stored, so counting starts at 1, which is taken.
        let path = store.save(&inverted_png(), None).unwrap();
        assert!(path.ends_with("image2.png"));
    }

    #[test]
    fn unnamed_identical_content_is_deduplicated() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LookupStore::open(tmp.path().to_path_buf()).unwrap();
        let first = store.save(&identity_png(), None).unwrap();
        let again = store.save(&identity_png(), None).unwrap();
        assert_eq!(first, again);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn named_save_is_always_loadable_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LookupStore::open(tmp.path().to_path_buf()).unwrap();
        store.save(&identity_png(), Some("warm")).unwrap();
        let other = store.save(&identity_png(), Some("other")).unwrap();
        assert!(other.ends_with("other.png"));
        assert!(store.load("warm").unwrap().is_some());
        assert!(store.load("other").unwrap().is_some());
        assert_eq!(store.names().unwrap(), ["other", "warm"]);

        let unnamed = store.save(&identity_png(), None).unwrap();
        assert!(unnamed == store.path_for("other") || unnamed == store.path_for("warm"));
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn rejects_wrong_dimensions() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LookupStore::open(tmp.path().to_path_buf()).unwrap();
        let small = encode(&ImageBuf::filled(64, 64, [0.5; 4]), ImageFormat::Png);
        assert!(store.save(&small, None).is_err());
        assert!(store.save(b"not an image", None).is_err());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn non_png_input_is_stored_as_png() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LookupStore::open(tmp.path().to_path_buf()).unwrap();
        let jpeg = encode(&LookupTable::identity_image(), ImageFormat::Jpeg);
        let path = store.save(&jpeg, Some("from_jpeg.png")).unwrap();
        assert!(path.ends_with("from_jpeg.png"));
        let bytes = fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn delete_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LookupStore::open(tmp.path().to_path_buf()).unwrap();
        store.save(&identity_png(), Some("warm")).unwrap();
        assert!(store.delete("warm.png").unwrap());
        assert!(!store.delete("warm").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn load_missing_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LookupStore::open(tmp.path().to_path_buf()).unwrap();
        assert!(store.load("nothing").unwrap().is_none());
    }

    #[test]
    fn load_all_skips_broken_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LookupStore::open(tmp.path().to_path_buf()).unwrap();
        store.save(&inverted_png(), Some("inverted")).unwrap();
        fs::write(tmp.path().join("broken.png"), b"garbage").unwrap();

        let tables = store.load_all().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].0, "inverted");
        let out = tables[0].1.lookup([0.2, 0.4, 0.8]);
        assert!((out[0] - 0.8).abs() < 0.01);
    }
}
