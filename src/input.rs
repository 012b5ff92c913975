use std::path::{Path, PathBuf};

use thiserror::Error;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("No video or image files in directory: {0}")]
    NoMedia(PathBuf),

    #[error("Failed to list directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a run processes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Image(PathBuf),
    Video(PathBuf),
    ImageDir(Vec<PathBuf>),
    VideoDir(Vec<PathBuf>),
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn is_image(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

pub fn is_video(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Classify an input path.
///
/// A directory holding any video is treated as a video directory, otherwise
/// as an image directory. Files are listed in name order.
pub fn resolve(path: &Path) -> Result<InputKind, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }

    if !path.is_dir() {
        return Ok(if is_video(path) {
            InputKind::Video(path.to_path_buf())
        } else {
            InputKind::Image(path.to_path_buf())
        });
    }

    let read_err = |source| InputError::ReadDir {
        path: path.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(path).map_err(read_err)? {
        let entry_path = entry.map_err(read_err)?.path();
        if entry_path.is_file() {
            files.push(entry_path);
        }
    }
    files.sort();

    let videos: Vec<PathBuf> = files.iter().filter(|p| is_video(p)).cloned().collect();
    if !videos.is_empty() {
        return Ok(InputKind::VideoDir(videos));
    }

    let images: Vec<PathBuf> = files.into_iter().filter(|p| is_image(p)).collect();
    if !images.is_empty() {
        return Ok(InputKind::ImageDir(images));
    }

    Err(InputError::NoMedia(path.to_path_buf()))
}
