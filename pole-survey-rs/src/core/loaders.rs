//! Input enumeration and image decoding.
//!
//! This module provides:
//! - Directory scanning for photographs with configured extensions
//! - Decoding a photograph into an owned RGB buffer

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};
use thiserror::Error;

/// Errors that can occur while enumerating or loading inputs.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Returns true if `path` has exactly one of the given extensions.
fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

/// List photographs directly inside `directory`.
///
/// Files are grouped by extension in the order given, then sorted by path
/// within each group. Matching is case-sensitive, so `jpg` and `JPG` are
/// separate groups.
///
/// # Arguments
///
/// * `directory` - Directory to scan (not recursive)
/// * `extensions` - Extensions without the leading dot
///
/// # Errors
///
/// Returns an error if the directory does not exist or cannot be read.
pub fn list_images(directory: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(LoaderError::DirectoryNotFound(directory.to_path_buf()));
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(directory)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, extensions))
        .collect();
    candidates.sort();

    let mut files = Vec::with_capacity(candidates.len());
    for (i, ext) in extensions.iter().enumerate() {
        // A repeated extension would list its files twice
        if extensions[..i].contains(ext) {
            continue;
        }
        files.extend(
            candidates
                .iter()
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(ext.as_str()))
                .cloned(),
        );
    }

    Ok(files)
}

/// Decode a photograph into an 8-bit RGB buffer.
///
/// # Errors
///
/// Returns [`LoaderError::Decode`] naming the file if it is not a readable image.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let decode = || -> std::result::Result<RgbImage, image::ImageError> {
        // Sniff the content so a mislabelled extension still decodes
        let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        Ok(img.into_rgb8())
    };
    decode().map_err(|source| LoaderError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec!["jpg".to_string(), "JPG".to_string()]
    }

    #[test]
    fn test_list_images_filters_and_orders() {
        let dir = TempDir::new().unwrap();
        for name in ["b.jpg", "a.jpg", "C.JPG", "notes.txt", "d.jpeg"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let files = list_images(dir.path(), &exts()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.jpg", "C.JPG"]);
    }

    #[test]
    fn test_list_images_repeated_extension() {
        let dir = TempDir::new().unwrap();
        for name in ["a.jpg", "B.JPG", "c.jpg"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let exts: Vec<String> = ["jpg", "JPG", "jpg"].iter().map(|e| e.to_string()).collect();

        let files = list_images(dir.path(), &exts).unwrap();

        assert_eq!(
            files,
            vec![
                dir.path().join("a.jpg"),
                dir.path().join("c.jpg"),
                dir.path().join("B.JPG"),
            ]
        );
    }

    #[test]
    fn test_list_images_empty_directory() {
        let dir = TempDir::new().unwrap();
        let files = list_images(dir.path(), &exts()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_list_images_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = list_images(&dir.path().join("missing"), &exts());
        assert!(matches!(result, Err(LoaderError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_load_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.png");
        RgbImage::from_pixel(4, 3, image::Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();

        let img = load_image(&path).unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(1, 1).0, [200, 10, 10]);
    }

    #[test]
    fn test_load_image_decode_error_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "definitely not a jpeg").unwrap();

        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, LoaderError::Decode { .. }));
        assert!(err.to_string().contains("broken.jpg"));
    }
}
