//! Atomic file replacement.
//!
//! Rewrites go through a tempfile in the target's directory, an fsync, and
//! a rename, so a crash mid-write leaves the original file intact.

use std::io::Write;
use std::path::Path;

pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Tempfile must live on the same filesystem for the rename to be atomic
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
