use std::path::{Path, PathBuf};

/// Extension used when a URL has no usable suffix
const FALLBACK_EXTENSION: &str = "bin";

/// An image committed to content-addressed storage
///
/// The file lives at `<storage dir>/<hash>.<extension>`. Two downloads with
/// identical bytes resolve to the same asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Hex-encoded SHA-256 of the file contents
    pub hash: String,
    pub extension: String,
    pub path: PathBuf,
}

impl StoredAsset {
    pub fn new(dir: &Path, hash: String, extension: &str) -> Self {
        let path = dir.join(format!("{}.{}", hash, extension));
        Self {
            hash,
            extension: extension.to_string(),
            path,
        }
    }
}

/// Returns the part of `url` after its final `.`
///
/// Falls back to `bin` when there is no dot or when the suffix spans a path
/// separator (e.g. `https://host.com/file`).
pub fn extension_from_url(url: &str) -> &str {
    match url.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !ext.contains('/') => ext,
        _ => FALLBACK_EXTENSION,
    }
}
