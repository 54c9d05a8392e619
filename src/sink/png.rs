use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use crate::foundation::error::{LastListenedError, LastListenedResult};

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> LastListenedResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Encode `img` as PNG and move it into place at `path`.
///
/// The bytes go to a sibling temporary file first, so `path` holds either the previous file or
/// the complete new image.
#[tracing::instrument(skip(img), fields(width = img.width(), height = img.height()))]
pub fn write_png(img: &RgbaImage, path: &Path) -> LastListenedResult<()> {
    ensure_parent_dir(path)?;
    let tmp = temp_sibling(path)?;

    let written = img
        .save_with_format(&tmp, ImageFormat::Png)
        .map_err(|e| LastListenedError::render(format!("encode '{}': {e}", tmp.display())))
        .and_then(|()| {
            std::fs::rename(&tmp, path).map_err(|e| {
                LastListenedError::render(format!(
                    "move '{}' to '{}': {e}",
                    tmp.display(),
                    path.display()
                ))
            })
        });

    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written?;

    tracing::info!(path = %path.display(), "wrote card");
    Ok(())
}

fn temp_sibling(path: &Path) -> LastListenedResult<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        LastListenedError::render(format!("output path '{}' has no file name", path.display()))
    })?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    Ok(path.with_file_name(tmp_name))
}

#[cfg(test)]
#[path = "../../tests/unit/sink/png.rs"]
mod tests;
