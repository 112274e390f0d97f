//! Turning image files into registered sprites.

use crate::error::{AtlasError, Result};
use crate::model::{ImageHandle, Sprite};
use crate::registry::SpriteRegistry;
use crate::trim::trim_image;
use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use tracing::{instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Sprite identifier for a file: its stem when the extension is a supported image
/// format (case-insensitive), otherwise the full file name.
pub fn identifier_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let is_image = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if is_image {
        let stem = path.file_stem()?.to_str()?;
        if !stem.is_empty() {
            return Some(stem.to_string());
        }
    }
    Some(name.to_string())
}

pub fn is_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str())
    )
}

pub fn decode_file(path: &Path) -> Result<DynamicImage> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(img)
}

/// Builds a sprite from a decoded image, trimming it with `threshold`.
pub fn load_sprite(identifier: impl Into<String>, image: DynamicImage, threshold: u8) -> Result<Sprite> {
    let rgba = image.into_rgba8();
    let bounds = trim_image(&rgba, threshold);
    Sprite::new(identifier, ImageHandle::new(rgba), bounds)
}

/// Result of [`import_files`].
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<String>,
    /// Files whose identifier was already registered.
    pub skipped: Vec<PathBuf>,
    /// Files that could not be read or decoded, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

/// Decodes, trims and registers every file in `paths`.
///
/// A file whose identifier is already taken is skipped, and a file that fails to
/// decode is reported; neither stops the import.
pub fn import_files(registry: &SpriteRegistry, paths: &[PathBuf], threshold: u8) -> ImportReport {
    import_files_with(registry, paths, threshold, |_| {})
}

#[instrument(skip_all, fields(count = paths.len()))]
/// Same as [`import_files`], calling `on_file` once per path after it has been
/// skipped or decoded. With the `parallel` feature the callback runs on worker
/// threads, in no particular order.
pub fn import_files_with<F>(registry: &SpriteRegistry, paths: &[PathBuf], threshold: u8, on_file: F) -> ImportReport
where
    F: Fn(&Path) + Sync,
{
    let mut report = ImportReport::default();
    let load = |p: &PathBuf, id: String| {
        let sprite = decode_file(p).and_then(|img| load_sprite(id, img, threshold));
        on_file(p.as_path());
        sprite
    };

    let wanted: Vec<(&PathBuf, String)> = paths
        .iter()
        .filter_map(|p| match identifier_from_path(p) {
            Some(id) if !registry.contains(&id) => Some((p, id)),
            _ => {
                report.skipped.push(p.clone());
                on_file(p.as_path());
                None
            }
        })
        .collect();

    #[cfg(feature = "parallel")]
    let loaded: Vec<(&PathBuf, Result<Sprite>)> = wanted
        .into_par_iter()
        .map(|(p, id)| (p, load(p, id)))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let loaded: Vec<(&PathBuf, Result<Sprite>)> = wanted
        .into_iter()
        .map(|(p, id)| (p, load(p, id)))
        .collect();

    for (path, sprite) in loaded {
        match sprite.and_then(|s| {
            let id = s.identifier().to_string();
            registry.register(s).map(|_| id)
        }) {
            Ok(id) => report.imported.push(id),
            Err(AtlasError::DuplicateIdentifier(_)) => {
                warn!(?path, "identifier already in use, skipping");
                report.skipped.push(path.clone());
            }
            Err(e) => {
                warn!(?path, error = %e, "skip image");
                report.failed.push((path.clone(), e.to_string()));
            }
        }
    }
    report
}
