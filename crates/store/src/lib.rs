//! zplgrid persistence layer.
//!
//! Filesystem-backed stores for the three stateful collaborators around the
//! (stateless) compiler core: the template library, the draft store, and
//! the print counters. All writes are atomic: content goes to a temp file
//! in the destination directory first, then renames over the target, so a
//! crash never leaves a half-written record behind.

#![warn(missing_docs)]

mod counters;
mod drafts;
mod error;
mod templates;

pub use counters::CounterStore;
pub use drafts::{DraftRecord, DraftStore};
pub use error::StoreError;
pub use templates::TemplateStore;

use std::fs;
use std::io::Write;
use std::path::Path;

/// Atomically write `content` to `path` (write-then-rename).
///
/// The temp file lives in the destination directory so the rename stays on
/// one filesystem.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::io(path, std::io::Error::other("path has no parent")))?;
    let tmp = dir.join(format!(
        ".{}.tmp-{:08x}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("record"),
        rand::random::<u32>()
    ));

    let mut file = fs::File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
    file.write_all(content).map_err(|e| StoreError::io(&tmp, e))?;
    file.sync_all().map_err(|e| StoreError::io(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::io(path, e)
    })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "store write");
    Ok(())
}

/// Reject keys that cannot safely become file names.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key.len() <= 128
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_owned()))
    }
}

/// Map an arbitrary id (printer name, template name) onto file-name-safe
/// characters for counter keys.
pub(crate) fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_creates_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        atomic_write(&path, b"one").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"one");
        atomic_write(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        // No temp files left behind.
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn key_validation() {
        assert!(validate_key("asset-tag_v2.1").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("a b").is_err());
    }

    #[test]
    fn sanitize_maps_path_separators_away() {
        assert_eq!(sanitize_key("lab/printer 1"), "lab_printer_1");
        assert_eq!(sanitize_key("ok-name_1.2"), "ok-name_1.2");
    }
}
