//! Read-only store of reference images
//!
//! Images are keyed by file name without extension, so
//! `references/mode.shape.png` provides the key `mode.shape`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::common::paths::Workspace;
use crate::common::{Error, Result};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Logical UI element name → reference image on disk
#[derive(Debug, Clone, Default)]
pub struct ReferenceStore {
    dir: PathBuf,
    images: BTreeMap<String, PathBuf>,
}

impl ReferenceStore {
    /// Index every image in `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let entries = std::fs::read_dir(&dir).map_err(|e| Error::FileRead {
            path: dir.display().to_string(),
            error: e.to_string(),
        })?;

        let mut images = BTreeMap::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if !is_image {
                continue;
            }
            if let Some(key) = path.file_stem().and_then(|s| s.to_str()) {
                if let Some(previous) = images.insert(key.to_string(), path.clone()) {
                    tracing::warn!(
                        key,
                        kept = %path.display(),
                        dropped = %previous.display(),
                        "Duplicate reference image"
                    );
                }
            }
        }

        tracing::debug!(dir = %dir.display(), count = images.len(), "Indexed reference images");
        Ok(Self { dir, images })
    }

    /// Index the workspace's `references/` directory
    pub fn for_workspace(workspace: &Workspace) -> Result<Self> {
        Self::open(workspace.references_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn contains(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    /// Path of the reference image for `key`
    pub fn path(&self, key: &str) -> Result<&Path> {
        self.images.get(key).map(PathBuf::as_path).ok_or_else(|| {
            Error::Config(format!(
                "No reference image for '{}' in {}",
                key,
                self.dir.display()
            ))
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    /// Keys from `wanted` that have no image, in input order
    pub fn missing<I, S>(&self, wanted: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        wanted
            .into_iter()
            .filter(|k| !self.contains(k.as_ref()))
            .map(|k| k.as_ref().to_string())
            .collect()
    }
}
