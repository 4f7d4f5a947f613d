///! Catalog loader - enumerates the reviewable images of a directory
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{AstroError, Result};

/// Extension of catalog images (matched case-sensitively, like a `*.jpg` glob)
pub const IMAGE_EXTENSION: &str = "jpg";

/// List the catalog identifiers of a directory.
///
/// Returns the file names of every regular `.jpg` file directly inside `dir`,
/// sorted by ordinal string comparison. This ordering is the canonical
/// next/previous order for a session.
pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(AstroError::NotFound(dir.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(IMAGE_EXTENSION) {
            continue;
        }
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => names.push(name.to_string()),
            None => debug!("Skipping non UTF-8 file name: {:?}", path),
        }
    }

    names.sort();
    debug!("Found {} images in {:?}", names.len(), dir);
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(matches!(list_images(&missing), Err(AstroError::NotFound(_))));
    }

    #[test]
    fn test_sorted_jpg_only() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "b_10.0_5.0.jpg");
        touch(temp_dir.path(), "a_20.0_-5.0.jpg");
        touch(temp_dir.path(), "B_upper.jpg");
        touch(temp_dir.path(), "notes.txt");
        touch(temp_dir.path(), "shout.JPG");
        fs::create_dir(temp_dir.path().join("dir.jpg")).unwrap();

        let names = list_images(temp_dir.path()).unwrap();
        assert_eq!(names, vec!["B_upper.jpg", "a_20.0_-5.0.jpg", "b_10.0_5.0.jpg"]);
    }

    #[test]
    fn test_empty_directory_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        assert!(list_images(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "x.jpg");
        touch(temp_dir.path(), "y.jpg");
        assert_eq!(
            list_images(temp_dir.path()).unwrap(),
            list_images(temp_dir.path()).unwrap()
        );
    }
}
