//! Error types for the zplgrid template compiler.
//!
//! Provides [`CompileError`], [`ErrorKind`], and [`NodePath`]. Every error
//! produced by the compiler carries a machine-readable kind string and the
//! path of the template node it relates to (`layout/children/0/elements/0`),
//! so callers can map failures back to the offending part of the document.

#![warn(missing_docs)]

use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

// ── ErrorKind ───────────────────────────────────────────────────────────

/// Category of a compile failure.
///
/// Kinds are stable: [`ErrorKind::as_str`] returns the short machine-readable
/// string boundaries use for status mapping. The compiler never recovers from
/// any of these internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Shape, type, enum, or range violation against the template schema.
    Schema,
    /// A structural rule the schema cannot express was broken.
    Invariant,
    /// An unresolved placeholder under the `error` missing-variable policy.
    MissingVariable,
    /// Malformed placeholder syntax (unbalanced braces, bad format spec).
    Format,
    /// Non-positive rectangle after splits/padding, or `min_size_mm` unmet.
    Layout,
    /// A field requested a feature v1 does not support.
    Unsupported,
}

impl ErrorKind {
    /// Stable machine-readable kind string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Schema => "schema",
            ErrorKind::Invariant => "invariant",
            ErrorKind::MissingVariable => "missing_variable",
            ErrorKind::Format => "format",
            ErrorKind::Layout => "layout",
            ErrorKind::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── NodePath ────────────────────────────────────────────────────────────

/// Slash-joined path into a template document.
///
/// Built incrementally during traversal: `NodePath::new("layout")`, then
/// [`NodePath::join`] and [`NodePath::index`] for child positions. The empty
/// path displays as `<document>` so top-level errors still read sensibly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath {
    segments: Vec<Cow<'static, str>>,
}

impl NodePath {
    /// The empty (document-level) path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path with a single leading segment (e.g. `"layout"`).
    pub fn new(segment: impl Into<Cow<'static, str>>) -> Self {
        Self {
            segments: vec![segment.into()],
        }
    }

    /// Return a new path extended by a named segment.
    #[must_use]
    pub fn join(&self, segment: impl Into<Cow<'static, str>>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Return a new path extended by a numeric index segment.
    #[must_use]
    pub fn index(&self, i: usize) -> Self {
        self.join(i.to_string())
    }

    /// `true` if this is the document-level path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<document>");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(seg)?;
        }
        Ok(())
    }
}

impl Serialize for NodePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── CompileError ────────────────────────────────────────────────────────

/// A compile failure with its kind, template path, and message.
///
/// `context` carries machine-readable key-value detail for tooling (for
/// example the missing variable name). Uses `BTreeMap` for deterministic
/// key ordering in serialized output.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{kind} at {path}: {message}")]
pub struct CompileError {
    /// Error category.
    pub kind: ErrorKind,
    /// Path of the offending node or field.
    pub path: NodePath,
    /// Human-readable description.
    pub message: String,
    /// Machine-readable context for tooling. Serialized only when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl CompileError {
    /// Create an error with the given kind, path, and message.
    pub fn new(kind: ErrorKind, path: NodePath, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
            context: None,
        }
    }

    /// Shorthand for a [`ErrorKind::Schema`] error.
    pub fn schema(path: NodePath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, path, message)
    }

    /// Shorthand for an [`ErrorKind::Invariant`] error.
    pub fn invariant(path: NodePath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invariant, path, message)
    }

    /// Shorthand for an [`ErrorKind::MissingVariable`] error. The variable
    /// name is recorded in the context map under `"name"`.
    pub fn missing_variable(path: NodePath, name: &str) -> Self {
        Self::new(
            ErrorKind::MissingVariable,
            path,
            format!("unresolved variable `{name}`"),
        )
        .with_context(BTreeMap::from([("name".into(), name.into())]))
    }

    /// Shorthand for an [`ErrorKind::Format`] error.
    pub fn format(path: NodePath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, path, message)
    }

    /// Shorthand for an [`ErrorKind::Layout`] error.
    pub fn layout(path: NodePath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Layout, path, message)
    }

    /// Shorthand for an [`ErrorKind::Unsupported`] error.
    pub fn unsupported(path: NodePath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, path, message)
    }

    /// Attach machine-readable context metadata (builder pattern).
    #[must_use]
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }
}
