//! The template library.
//!
//! Stores template documents as the raw JSON the caller supplied, one file
//! per template, with an optional preview blob alongside. Templates are
//! validated against the schema before they are accepted.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{StoreError, atomic_write, validate_key};

/// CRUD over a directory of label templates.
#[derive(Debug)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    /// Open (and create if needed) a template library at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    fn template_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    fn preview_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.preview"))
    }

    /// Save a template under `name`, replacing any existing one.
    ///
    /// The JSON must pass schema validation; the library never holds a
    /// template the compiler would reject on shape.
    pub fn save(&self, name: &str, template_json: &str) -> Result<(), StoreError> {
        validate_key(name)?;
        zplgrid_core::parse_document_str(template_json).map_err(|e| {
            StoreError::InvalidTemplate {
                name: name.to_owned(),
                source: e,
            }
        })?;
        atomic_write(&self.template_path(name), template_json.as_bytes())
    }

    /// Load the raw template JSON stored under `name`.
    pub fn load(&self, name: &str) -> Result<String, StoreError> {
        validate_key(name)?;
        let path = self.template_path(name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_owned()))
            }
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Delete a template and its preview, if present.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        validate_key(name)?;
        let path = self.template_path(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                let _ = fs::remove_file(self.preview_path(name));
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_owned()))
            }
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// List stored template names, sorted.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let file_name = entry.file_name();
            let Some(name) = Path::new(&file_name)
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
            else {
                continue;
            };
            names.push(name.to_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Store a preview blob alongside the template.
    pub fn save_preview(&self, name: &str, preview: &[u8]) -> Result<(), StoreError> {
        validate_key(name)?;
        if !self.template_path(name).exists() {
            return Err(StoreError::NotFound(name.to_owned()));
        }
        atomic_write(&self.preview_path(name), preview)
    }

    /// Load the preview blob, if one was stored.
    pub fn load_preview(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_key(name)?;
        let path = self.preview_path(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}
