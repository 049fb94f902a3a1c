//! The layout solver.
//!
//! Converts the resolved template tree into integer dot rectangles against a
//! render target. All arithmetic happens in dots after a single mm→dots
//! conversion per quantity; split arithmetic guarantees the no-missing-pixel
//! invariant `child0 + gutter + child1 == parent` on the split axis.

/// Dot units and rectangle arithmetic.
pub mod units;

/// Recursive binary-split solving.
pub mod solver;
