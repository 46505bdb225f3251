//! Static wealth-map selection.

use std::path::{Path, PathBuf};

use vacancy_map_vacancy_models::{AreaMeasure, ImageRef, StaticMapSelection, WealthMeasure};

/// Display width hint attached to every selected image.
pub const DEFAULT_IMAGE_WIDTH: &str = "80%";

/// The referenced image does not exist on disk.
#[derive(Debug, thiserror::Error)]
#[error("image resource not found: {}", path.display())]
pub struct ResourceNotFoundError {
    /// Path that was looked up.
    pub path: PathBuf,
}

/// Maps a pair of dropdown choices to its pre-rendered image.
///
/// Pure string interpolation; existence is only checked when the reference
/// is located through an [`ImageDirectory`].
#[must_use]
pub fn select_image(area_measure: AreaMeasure, wealth_measure: WealthMeasure) -> ImageRef {
    let selection = StaticMapSelection::new(area_measure, wealth_measure);

    ImageRef {
        path: PathBuf::from(selection.file_name()),
        alt: selection.alt_text(),
        width: DEFAULT_IMAGE_WIDTH.to_string(),
    }
}

/// Directory holding the pre-rendered wealth maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDirectory {
    root: PathBuf,
}

impl ImageDirectory {
    /// Creates a handle on `root`. Nothing is read until [`Self::locate`].
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves an image reference to an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceNotFoundError`] if no regular file exists at the
    /// resolved path.
    pub fn locate(&self, image: &ImageRef) -> Result<PathBuf, ResourceNotFoundError> {
        let path = self.root.join(&image.path);

        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => {
                log::warn!("Image path {} is not a file", path.display());
                Err(ResourceNotFoundError { path })
            }
            Err(e) => {
                log::warn!("Image {} unavailable: {e}", path.display());
                Err(ResourceNotFoundError { path })
            }
        }
    }
}
