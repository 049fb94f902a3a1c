//! Template data model and the stages that operate on it before layout.
//!
//! A template moves through three stages here: [`schema`] parses raw JSON
//! into the typed model (phase A validation), [`invariants`] enforces the
//! cross-field rules the schema cannot express (phase B), and [`defaults`]
//! folds the document-level defaults into every leaf and element so that no
//! later stage needs to consult them. [`iter`] provides the canonical-id
//! traversal used for node identity.

/// Typed template tree: document, nodes, elements, defaults.
pub mod model;

/// Phase A: JSON shape validation and model construction.
pub mod schema;

/// Phase B: structural invariant enforcement.
pub mod invariants;

/// Defaults resolution into a fully populated tree.
pub mod defaults;

/// Canonical node identity traversal.
pub mod iter;
