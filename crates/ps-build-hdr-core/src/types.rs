//! Core data types shared by the extractor, normalizer and orchestrator.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One input photograph.
///
/// Created from a CLI argument or a directory listing and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Just the filename portion, lossily converted.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.to_string_lossy().into_owned())
    }

    /// The filename with its extension stripped.
    pub fn stem(&self) -> String {
        self.0
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name())
    }

    /// Sibling path named `<stem><suffix>`, in the same directory as the image.
    pub fn sibling_with_suffix(&self, suffix: &str) -> PathBuf {
        self.0.with_file_name(format!("{}{}", self.stem(), suffix))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for ImageRef {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&str> for ImageRef {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

/// Exposure settings read from one image, plus the derived exposure value.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureSample {
    pub image: ImageRef,
    /// Shutter time in seconds
    pub exposure_time: f64,
    pub iso: f64,
    pub f_number: f64,
    /// log2-scale exposure value
    pub ev: f64,
}

/// Per-batch EV values keyed by image.
pub type EvMap = BTreeMap<ImageRef, f64>;

/// An ordered group of bracketed exposures processed together.
///
/// In directory-scan mode every batch holds exactly the configured number of
/// images; in explicit mode the caller's whole argument list is one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    images: Vec<ImageRef>,
}

impl Batch {
    /// Build a batch. Returns `None` for an empty list.
    pub fn new(images: Vec<ImageRef>) -> Option<Self> {
        if images.is_empty() {
            None
        } else {
            Some(Self { images })
        }
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    /// The image that names the batch's output artifacts.
    pub fn first(&self) -> &ImageRef {
        &self.images[0]
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Space-joined filenames, used in log banners.
    pub fn describe(&self) -> String {
        self.images
            .iter()
            .map(ImageRef::file_name)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
