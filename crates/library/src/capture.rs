//! Persisting screen images under the output directory.

use autokw_core::{CaptureError, KeywordError};
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve `file_path` against `output_dir`.
///
/// Paths must be relative so the host report can link to them.
pub fn artifact_path(output_dir: &Path, file_path: &str) -> Result<PathBuf, KeywordError> {
    if file_path.is_empty() {
        return Err(KeywordError::invalid("FilePath must not be empty"));
    }
    if Path::new(file_path).is_absolute() {
        return Err(KeywordError::invalid(format!(
            "Given FilePath='{}' must be relative to the output directory",
            file_path
        )));
    }
    Ok(output_dir.join(file_path))
}

/// Write `image` to `path`, creating missing parent directories. The format
/// follows the file extension.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<(), CaptureError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    image.save(path)?;
    Ok(())
}

/// Report markup embedding a linked thumbnail of `file_path`.
pub fn embed_markup(file_path: &str) -> String {
    format!(
        "<td></td></tr><tr><td colspan=\"3\"><a href=\"{0}\"><img src=\"{0}\" width=\"700px\"></a></td></tr>",
        file_path
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_is_joined() {
        let path = artifact_path(Path::new("out"), "shots/a.png").unwrap();
        assert_eq!(path, Path::new("out").join("shots/a.png"));
    }

    #[test]
    fn test_absolute_path_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let absolute = dir.path().join("a.png");
        let err = artifact_path(Path::new("."), absolute.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, KeywordError::InvalidArgument(msg) if msg.contains("relative")));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("er").join("shot.png");
        save_image(&RgbaImage::new(2, 2), &path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_markup_links_image() {
        let markup = embed_markup("FAIL_WinWait_1.png");
        assert!(markup.contains("href=\"FAIL_WinWait_1.png\""));
        assert!(markup.contains("src=\"FAIL_WinWait_1.png\""));
    }
}
