//! Zip packaging of catalog payloads.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::{ClientError, Result};

/// File name used when a single unnamed payload is indexed.
pub const DEFAULT_PAYLOAD_NAME: &str = "magento_catalog.csv";

const ARCHIVE_PREFIX: &str = "tooso_index_";
const ARCHIVE_SUFFIX: &str = ".zip";

/// Text content to index: one blob, or several named files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexPayload {
    Single(String),
    Named(BTreeMap<String, String>),
}

impl IndexPayload {
    /// `(file name, content)` pairs as they will appear in the archive.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        match self {
            Self::Single(content) => vec![(DEFAULT_PAYLOAD_NAME, content.as_str())],
            Self::Named(files) => files
                .iter()
                .map(|(name, content)| (name.as_str(), content.as_str()))
                .collect(),
        }
    }
}

impl From<String> for IndexPayload {
    fn from(content: String) -> Self {
        Self::Single(content)
    }
}

impl From<&str> for IndexPayload {
    fn from(content: &str) -> Self {
        Self::Single(content.to_string())
    }
}

impl From<BTreeMap<String, String>> for IndexPayload {
    fn from(files: BTreeMap<String, String>) -> Self {
        Self::Named(files)
    }
}

impl From<HashMap<String, String>> for IndexPayload {
    fn from(files: HashMap<String, String>) -> Self {
        Self::Named(files.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for IndexPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Named(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Write `payload` into a fresh temp zip. The file is deleted when the
/// returned handle drops.
pub fn write_archive(payload: &IndexPayload, temp_dir: Option<&Path>) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(ARCHIVE_PREFIX).suffix(ARCHIVE_SUFFIX);
    let mut archive = match temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| ClientError::packaging(format!("Error creating zip file for reindex: {e}")))?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = zip::ZipWriter::new(archive.as_file_mut());
    for (name, content) in payload.entries() {
        writer
            .start_file(name, options)
            .map_err(|e| ClientError::packaging(format!("adding {name} to archive: {e}")))?;
        writer
            .write_all(content.as_bytes())
            .map_err(|e| ClientError::packaging(format!("writing {name} to archive: {e}")))?;
    }
    writer
        .finish()
        .map_err(|e| ClientError::packaging(format!("finalizing archive: {e}")))?;

    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_entries(path: &Path) -> BTreeMap<String, String> {
        let file = std::fs::File::open(path).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let mut out = BTreeMap::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).unwrap();
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            out.insert(entry.name().to_string(), content);
        }
        out
    }

    #[test]
    fn test_named_payloads_become_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let payload: IndexPayload = [
            ("products.csv", "sku;name\n1;shoe\n"),
            ("categories.csv", "id;name\n7;footwear\n"),
        ]
        .into_iter()
        .collect();

        let archive = write_archive(&payload, Some(dir.path())).unwrap();
        let name = archive.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("tooso_index_") && name.ends_with(".zip"), "{name}");

        let entries = read_entries(archive.path());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["products.csv"], "sku;name\n1;shoe\n");
        assert_eq!(entries["categories.csv"], "id;name\n7;footwear\n");
    }

    #[test]
    fn test_single_blob_uses_default_name() {
        let archive = write_archive(&IndexPayload::from("a;b\n"), None).unwrap();
        let entries = read_entries(archive.path());
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec![DEFAULT_PAYLOAD_NAME]);
    }

    #[test]
    fn test_archive_removed_on_drop() {
        let archive = write_archive(&IndexPayload::from("x"), None).unwrap();
        let path = archive.path().to_path_buf();
        assert!(path.exists());
        drop(archive);
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_dir_is_packaging_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = write_archive(&IndexPayload::from("x"), Some(&missing)).unwrap_err();
        assert!(matches!(err, ClientError::Packaging(_)), "{err}");
    }
}
