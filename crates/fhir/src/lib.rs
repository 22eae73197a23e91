//! FHIR record graph for vital records.
//!
//! This crate owns the canonical representation of a birth or fetal death record: a FHIR
//! document Bundle whose Composition (the manifest) indexes Patient, RelatedPerson, Location
//! and clinical entries by section.
//!
//! This crate focuses on:
//! - the wire model and JSON/YAML serialisation ([`wire`], [`format`])
//! - graph primitives: find, create and remove entries by [`locator::FieldLocator`]
//! - field semantics: partial dates, checkbox presence, addresses, coded values
//! - typed accessors on [`VitalRecord`] and the name-based field registry ([`fields`])
//!
//! Fixed-width transcoding lives in the `ije` crate and message envelopes in `messaging`;
//! both are built on the registry exposed here.

mod accessors;

pub mod address;
pub mod codes;
pub mod document;
pub mod fields;
pub mod format;
pub mod locator;
pub mod partial_date;
pub mod record;
pub mod wire;

pub use accessors::{DateField, NamePart};
pub use address::AddressMap;
pub use document::{Document, Entry, Manifest};
pub use fields::{
    Binding, CodeTable, CodedScope, FieldDescriptor, FieldValue, FlatFieldDescriptor, FlatKind,
};
pub use format::Format;
pub use locator::{FieldLocator, Section, Subject};
pub use partial_date::{DatePart, PartialDateTime};
pub use record::{ParseMode, RecordKind, VitalRecord};

/// Errors returned by the `fhir` crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("expected {expected}, found {found}")]
    WrongDocumentType { expected: String, found: String },

    #[error("schema mismatch at {0}")]
    Translation(String),

    #[error("unrecognised members: {}", .0.join(", "))]
    UnknownMembers(Vec<String>),

    #[error("{0}")]
    BusinessRule(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field {field} expects a {expected} value")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
