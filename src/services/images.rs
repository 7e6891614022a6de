use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use camino::Utf8Path;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;

/// Icon names the front end asks for
pub const KNOWN_IMAGES: [&str; 10] = [
    "cross",
    "google",
    "file",
    "folder",
    "left",
    "magnifying_glass",
    "not-left",
    "right",
    "not-right",
    "tick",
];

/// Name -> `data:` URI lookup for the front end's icons
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    images: HashMap<String, String>,
}

impl ImageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from in-memory PNG bytes
    pub fn from_pngs<I, N, B>(pngs: I) -> Self
    where
        I: IntoIterator<Item = (N, B)>,
        N: Into<String>,
        B: AsRef<[u8]>,
    {
        let mut catalog = Self::new();
        for (name, bytes) in pngs {
            catalog.insert_png(name, bytes.as_ref());
        }
        catalog
    }

    /// Load every known image from `dir`, where `not-left` lives in `not_left.png`.
    ///
    /// Missing files are skipped with a warning; other read errors are returned.
    pub fn load_dir(dir: &Utf8Path) -> std::io::Result<Self> {
        let mut catalog = Self::new();

        for name in KNOWN_IMAGES {
            let path = dir.join(format!("{}.png", name.replace('-', "_")));
            match fs::read(&path) {
                Ok(bytes) => catalog.insert_png(name, &bytes),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    tracing::warn!("Image {} not found at {}", name, path);
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!("Loaded {} image(s) from {}", catalog.len(), dir);
        Ok(catalog)
    }

    pub fn insert_png(&mut self, name: impl Into<String>, bytes: &[u8]) {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(bytes));
        self.images.insert(name.into(), uri);
    }

    /// Data URI for `name`, or `""` if unknown
    pub fn data_uri(&self, name: &str) -> String {
        self.images.get(name).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_data_uri_encoding() {
        let catalog = ImageCatalog::from_pngs([("tick", b"abc")]);
        assert_eq!(catalog.data_uri("tick"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_unknown_image_is_empty() {
        let catalog = ImageCatalog::new();
        assert_eq!(catalog.data_uri("nope"), "");
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_dir_maps_hyphens_and_skips_missing() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        fs::write(dir.join("not_left.png"), b"png").unwrap();
        fs::write(dir.join("folder.png"), b"png").unwrap();

        let catalog = ImageCatalog::load_dir(&dir).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.data_uri("not-left").starts_with("data:image/png;base64,"));
        assert_eq!(catalog.data_uri("cross"), "");
    }
}
