//! zplgrid core library.
//!
//! Compiles a declarative JSON label template into a ZPL II program for a
//! concrete render target (label size + DPI). The main entry points are
//! [`parse_document_str`] for template parsing and [`compile`] /
//! [`compile_str`] for full compilation.
//!
//! The compiler is a pure transformation: `(template, target, variables) →
//! zpl_string`. It performs no I/O, keeps no state across invocations, and
//! is safe to call from any number of threads provided each call owns its
//! inputs.

#![warn(missing_docs)]

/// Template data model, schema validation, invariants, and defaults.
pub mod template;

/// Variable substitution and built-in macros.
pub mod vars;

/// The mm→dots layout solver.
pub mod layout;

/// Per-element compilers and the compile entry point.
pub mod compile;

/// ZPL II command emission and program assembly.
pub mod zpl;

mod target;

// ── Convenience re-exports ──────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Entry points
pub use compile::{CompileOptions, compile, compile_str, solve_str};

// Template model
pub use template::model::{
    Defaults, Element, LeafNode, MissingVarPolicy, Node, SplitNode, TemplateDocument,
};
pub use template::schema::{parse_document, parse_document_str};

// Render target
pub use target::RenderTarget;

// Layout
pub use layout::solver::{LayoutNode, LayoutTree, solve};
pub use layout::units::{Rect, mm_to_dots};

// Variables and macros
pub use vars::macros::{CounterScope, CounterSource, MacroContext};

// Text measurement capability
pub use compile::measure::{GlyphMeasurer, TextMeasurer, TextMetrics};

// Errors (re-exported from the diagnostics crate)
pub use zplgrid_diagnostics::{CompileError, ErrorKind, NodePath};
