use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use filtermix_core::{LookupResolver, LookupTable};
use tracing::{debug, warn};

use crate::store::load_table;

/// Resolves bundled lookup assets from `<dir>/<asset>.png`. Every asset is
/// read at most once; misses are remembered too.
pub struct AssetLookups {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Option<Arc<LookupTable>>>>,
}

impl AssetLookups {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load(&self, asset: &str) -> Option<Arc<LookupTable>> {
        let path = self.dir.join(format!("{asset}.png"));
        if !path.exists() {
            debug!(?path, "lookup asset missing");
            return None;
        }
        match load_table(&path) {
            Ok(table) => Some(Arc::new(table)),
            Err(err) => {
                warn!(?path, %err, "failed to load lookup asset");
                None
            }
        }
    }
}

impl LookupResolver for AssetLookups {
    fn resolve(&self, asset: &str) -> Option<Arc<LookupTable>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.get(asset) {
            return hit.clone();
        }
        let loaded = self.load(asset);
        cache.insert(asset.to_owned(), loaded.clone());
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::inverted_png;
    use std::fs;

    #[test]
    fn resolves_and_caches_assets() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("lookup_amatorka.png"), inverted_png()).unwrap();
        let assets = AssetLookups::new(tmp.path().to_path_buf());

        let first = assets.resolve("lookup_amatorka").unwrap();
        let second = assets.resolve("lookup_amatorka").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!((first.lookup([0.0, 0.0, 0.0])[0] - 1.0).abs() < 0.01);
    }

    #[test]
    fn missing_asset_resolves_to_none() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = AssetLookups::new(tmp.path().to_path_buf());
        assert!(assets.resolve("lookup_nowhere").is_none());
    }

    #[test]
    fn broken_asset_resolves_to_none() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("lookup_f4.png"), b"garbage").unwrap();
        let assets = AssetLookups::new(tmp.path().to_path_buf());
        assert!(assets.resolve("lookup_f4").is_none());
    }

    #[test]
    fn mixer_binds_assets_from_disk() {
        use filtermix_core::{FilterKind, FilterMixer, ImageBuf};

        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("lookup_amatorka.png"), inverted_png()).unwrap();
        let mut mixer = FilterMixer::new(Arc::new(AssetLookups::new(tmp.path().to_path_buf())));
        mixer.set_original_image(ImageBuf::filled(4, 4, [0.2, 0.4, 0.8, 1.0]));
        mixer.set_filters(vec![FilterKind::Amatorka]);

        let px = mixer.filtered_image().unwrap().pixel(1, 1);
        assert!((px[0] - 0.8).abs() < 0.01);
        assert!((px[2] - 0.2).abs() < 0.01);
    }
}
