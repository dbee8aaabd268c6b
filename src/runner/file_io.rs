//! Atomic file output.

use std::io::Write;

use anyhow::{Context, Result};
use camino::Utf8Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Replace `path` with `content`, creating parent directories.
///
/// The bytes are staged in a temporary file beside `path` and renamed into
/// place, so readers never observe a partial project.
///
/// # Errors
///
/// Returns an error when a directory cannot be created or the file cannot be
/// written, synced, or renamed.
pub fn write_atomic(path: &Utf8Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    std::fs::create_dir_all(parent).with_context(|| format!("creating directory {parent}"))?;
    let mut staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("creating temporary file in {parent}"))?;
    {
        let handle = staged.as_file_mut();
        handle
            .write_all(content)
            .with_context(|| format!("writing temporary file for {path}"))?;
        handle
            .flush()
            .with_context(|| format!("flushing temporary file for {path}"))?;
        handle
            .sync_all()
            .with_context(|| format!("syncing temporary file for {path}"))?;
    }
    staged
        .persist(path)
        .with_context(|| format!("moving temporary file to {path}"))?;
    info!("Wrote {path}");
    Ok(())
}
