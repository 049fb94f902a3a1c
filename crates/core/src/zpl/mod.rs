//! ZPL II emission.
//!
//! The command vocabulary is deliberately small: start/end markers, the
//! UTF-8 encoding directive, field origin, field block, the scalable font,
//! graphic boxes, QR and DataMatrix fields, and the field separator.
//! Nothing else is ever emitted.

/// Field command building.
pub mod writer;

/// Program assembly: markers, encoding, overlay ordering.
pub mod assemble;
