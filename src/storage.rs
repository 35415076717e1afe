//! Private storage layout.
//!
//! ```text
//! <root>/Pictures/image_<millis>.jpg           cached copies of selected images
//! <root>/pdfs/annotated_images_<millis>.pdf    composed documents
//! ```

use crate::composer::ImageSource;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

const PICTURES_DIR: &str = "Pictures";
const PDFS_DIR: &str = "pdfs";

/// Milliseconds since the Unix epoch.
pub fn unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Paths under a storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Storage rooted at `root`. Nothing is created yet.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of cached images.
    pub fn pictures_dir(&self) -> PathBuf {
        self.root.join(PICTURES_DIR)
    }

    /// Directory of composed documents.
    pub fn pdfs_dir(&self) -> PathBuf {
        self.root.join(PDFS_DIR)
    }

    /// Cache path for an image stamped `millis`.
    pub fn image_path(&self, millis: i64) -> PathBuf {
        self.pictures_dir().join(format!("image_{}.jpg", millis))
    }

    /// Output path for a document stamped `millis`.
    pub fn output_path(&self, millis: i64) -> PathBuf {
        self.pdfs_dir().join(format!("annotated_images_{}.pdf", millis))
    }

    /// Create the documents directory and pick an unused output path.
    pub fn prepare_output(&self) -> Result<PathBuf> {
        fs::create_dir_all(self.pdfs_dir())?;
        let mut stamp = unix_millis();
        loop {
            let path = self.output_path(stamp);
            if !path.exists() {
                return Ok(path);
            }
            stamp += 1;
        }
    }

    /// Copy every source into the image cache, in order.
    ///
    /// Sources that cannot be read or written are logged and skipped; the
    /// caller decides whether the remaining count is enough. Failing to
    /// create the cache directory is an error.
    pub fn cache_images(&self, sources: &[ImageSource]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(self.pictures_dir())?;

        let mut cached = Vec::with_capacity(sources.len());
        let mut stamp = unix_millis();
        for source in sources {
            let path = loop {
                let candidate = self.image_path(stamp);
                stamp += 1;
                if !candidate.exists() {
                    break candidate;
                }
            };

            match source.read().and_then(|data| fs::write(&path, data).map_err(Error::from)) {
                Ok(()) => {
                    log::debug!("Cached {} as {}", source.describe(), path.display());
                    cached.push(path);
                },
                Err(e) => log::warn!("Skipping image {}: {}", source.describe(), e),
            }
        }
        Ok(cached)
    }
}
