//! Fixed-width (IJE) codec for vital records.
//!
//! A line is a sequence of fixed positions, each described by a
//! [`fhir::FlatFieldDescriptor`] in the `fhir` field registry. Decoding walks the positions in
//! priority order and writes each value through the registry; encoding reads each field back
//! and renders it with the rules of its [`fhir::FlatKind`].
//!
//! Neither direction fails fast. Problems met along the way are collected, and only surface as
//! an error when the caller asks for validation.

mod codec;
pub mod layout;
pub mod mappings;

pub use codec::{decode, encode, encode_strict, fields_of, Encoded};
pub use layout::{Layout, Slot, LINE_LENGTH};

/// Errors returned by the `ije` crate.
#[derive(Debug, thiserror::Error)]
pub enum IjeError {
    /// Every problem found in one decode or encode pass.
    #[error("{} validation error(s): {}", .0.len(), .0.join("; "))]
    Validation(Vec<String>),
}

/// Type alias for Results that can fail with an [`IjeError`].
pub type IjeResult<T> = Result<T, IjeError>;
