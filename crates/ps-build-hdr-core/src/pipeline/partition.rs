//! Batch partitioning.
//!
//! Directory-scan mode groups a lexicographic listing into consecutive
//! fixed-size batches and drops a trailing partial group. Explicit mode treats
//! the whole argument list as one batch of whatever length.

use std::num::NonZeroUsize;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::PipelineError;
use crate::types::{Batch, ImageRef};

/// How the run obtained its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// No filenames given: scan the working directory
    DirectoryScan,
    /// Filenames given on the command line
    Explicit,
}

/// List a directory's entries in lexicographic filename order.
///
/// Hidden entries (leading `.`) are skipped, like a shell `*` glob. No other
/// filtering happens: the directory is expected to hold only photos.
pub fn list_directory(dir: &Path) -> Result<Vec<ImageRef>, PipelineError> {
    let mut images = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| PipelineError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        images.push(ImageRef::new(entry.path()));
    }
    Ok(images)
}

/// Group images into consecutive batches of exactly `number`, in order.
///
/// A final group shorter than `number` is never emitted.
pub fn partition(
    images: Vec<ImageRef>,
    number: NonZeroUsize,
) -> impl Iterator<Item = Batch> {
    let number = number.get();
    let mut images = images.into_iter();
    std::iter::from_fn(move || {
        let group: Vec<ImageRef> = images.by_ref().take(number).collect();
        if group.len() == number {
            Batch::new(group)
        } else {
            if !group.is_empty() {
                tracing::debug!(
                    "Dropping {} trailing file(s) that do not fill a batch of {number}",
                    group.len()
                );
            }
            None
        }
    })
}

/// The whole argument list as a single batch.
pub fn explicit_batch(images: Vec<ImageRef>) -> Option<Batch> {
    Batch::new(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(n: usize) -> Vec<ImageRef> {
        (0..n).map(|i| ImageRef::new(format!("IMG_{i:04}.JPG"))).collect()
    }

    fn n(v: usize) -> NonZeroUsize {
        NonZeroUsize::new(v).unwrap()
    }

    #[test]
    fn test_partition_counts_and_drops_remainder() {
        for len in 0..12 {
            for size in 1..5 {
                let batches: Vec<Batch> = partition(refs(len), n(size)).collect();
                assert_eq!(batches.len(), len / size, "len={len} size={size}");
                assert!(batches.iter().all(|b| b.len() == size));

                let flattened: Vec<ImageRef> = batches
                    .iter()
                    .flat_map(|b| b.images().to_vec())
                    .collect();
                assert_eq!(flattened, refs(len)[..(len / size) * size].to_vec());
            }
        }
    }

    #[test]
    fn test_six_files_make_two_disjoint_batches() {
        let batches: Vec<Batch> = partition(refs(6), n(3)).collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].images(), &refs(6)[0..3]);
        assert_eq!(batches[1].images(), &refs(6)[3..6]);
    }

    #[test]
    fn test_explicit_batch_ignores_size() {
        let batch = explicit_batch(refs(5)).unwrap();
        assert_eq!(batch.len(), 5);
        assert!(explicit_batch(vec![]).is_none());
    }

    #[test]
    fn test_list_directory_sorted_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.jpg", "a.jpg", "B.jpg", ".hidden"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let listed = list_directory(dir.path()).unwrap();
        let names: Vec<String> = listed.iter().map(ImageRef::file_name).collect();
        assert_eq!(names, vec!["B.jpg", "a.jpg", "c.jpg"]);
        assert_eq!(listed[0], ImageRef::new(dir.path().join("B.jpg")));
    }

    #[test]
    fn test_list_missing_directory_is_error() {
        let err = list_directory(Path::new("/nonexistent/ps-build-hdr")).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
