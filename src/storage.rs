//! Output file naming and directory management

use crate::errors::RecorderError;
use std::path::{Path, PathBuf};

/// Create the segment output directory if it does not exist yet.
pub fn ensure_output_dir(dir: &Path) -> Result<(), RecorderError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        RecorderError::Initialization(format!(
            "Failed to create output directory {:?}: {}",
            dir, e
        ))
    })
}

/// Build a timestamped output path like `2026-08-07_14-03-21.mp4`.
///
/// The timestamp has one-second granularity; if two segments start within
/// the same second a numeric suffix keeps the paths distinct.
pub fn timestamped_path(dir: &Path, extension: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let mut path = dir.join(format!("{}.{}", stamp, extension));

    let mut n = 1u32;
    while path.exists() {
        path = dir.join(format!("{}_{}.{}", stamp, n, extension));
        n += 1;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_output_dir_creates_nested() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        assert!(ensure_output_dir(&nested).is_ok());
        assert!(nested.is_dir());
    }

    #[test]
    fn test_timestamped_path_shape() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = timestamped_path(dir.path(), "mp4");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with(".mp4"));
        // YYYY-MM-DD_HH-MM-SS.mp4
        assert_eq!(name.len(), "2026-08-07_14-03-21.mp4".len());
    }

    #[test]
    fn test_timestamped_path_dedups_within_one_second() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = timestamped_path(dir.path(), "mp4");
        std::fs::write(&first, b"x").expect("write");

        let second = timestamped_path(dir.path(), "mp4");
        // Either the clock ticked over or the suffix kicked in; never a clash.
        assert_ne!(first, second);
    }
}
