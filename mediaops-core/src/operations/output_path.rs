//! Output path resolution for transform operations.
//!
//! Outputs are written next to the source as `<stem><suffix>.<ext>`. If that
//! name is taken, `<stem><suffix>.1.<ext>`, `.2.<ext>`, ... are tried until a
//! free name is found. The chosen name is created as an empty file right
//! away, so existing files are never overwritten and concurrent operations
//! never share a target.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// Builds the preferred output path for `source`.
///
/// `extension` replaces the source extension when given; otherwise the
/// source extension (if any) is kept.
pub fn derive_output_path(source: &Path, suffix: &str, extension: Option<&str>) -> CoreResult<PathBuf> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            CoreError::PathError(format!(
                "Cannot derive an output name from '{}'",
                source.display()
            ))
        })?;

    let extension = extension
        .map(str::to_string)
        .or_else(|| source.extension().and_then(|e| e.to_str()).map(str::to_string));
    let file_name = match extension {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    };

    let parent = source
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(parent.join(file_name))
}

/// `candidate` followed by its numbered variants `.1`, `.2`, ...
fn candidates(candidate: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = candidate
        .extension()
        .map(|e| e.to_string_lossy().into_owned());

    std::iter::once(candidate.to_path_buf()).chain((1u64..).map(move |n| {
        let name = match &extension {
            Some(ext) => format!("{stem}.{n}.{ext}"),
            None => format!("{stem}.{n}"),
        };
        candidate.with_file_name(name)
    }))
}

/// Claims the first free name among `candidate` and its numbered variants by
/// creating it as an empty file.
///
/// Creation uses `create_new`, so two callers racing for the same name never
/// both get it. The returned file belongs to the caller.
pub fn reserve_path(candidate: &Path) -> CoreResult<PathBuf> {
    for path in candidates(candidate) {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => return Ok(path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                log::error!("Could not create output file {}: {e}", path.display());
                return Err(CoreError::Io(e));
            }
        }
    }
    Err(CoreError::PathError(format!(
        "No free output name next to '{}'",
        candidate.display()
    )))
}

/// Preferred output path, made collision-free and reserved on disk.
pub fn reserve_output_path(source: &Path, suffix: &str, extension: Option<&str>) -> CoreResult<PathBuf> {
    let preferred = derive_output_path(source, suffix, extension)?;
    let reserved = reserve_path(&preferred)?;
    if reserved != preferred {
        log::debug!(
            "{} exists, writing to {} instead",
            preferred.display(),
            reserved.display()
        );
    }
    Ok(reserved)
}
