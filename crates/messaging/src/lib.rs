//! Message envelopes for exchanging vital records.
//!
//! A message is a FHIR Bundle of type `message`: a MessageHeader naming the message type by
//! URI, a Parameters resource with the business identifiers of the record, and a payload
//! (the record itself, or an OperationOutcome for error messages).
//!
//! This crate focuses on:
//! - building submission, update, void, coding and response messages ([`Envelope`])
//! - dispatching parsed messages on their event URI ([`Envelope::parse`])
//! - answering unreadable messages ([`MessageParseError::error_response`])

pub mod envelope;
pub mod issue;
pub mod message_type;
mod parse;

pub use envelope::{BusinessIds, Envelope, Header, MessageBody, StatusCode, DEFAULT_SOURCE};
pub use issue::{Issue, IssueCode, Severity};
pub use message_type::{default_destination, MessageKind, MessageType};
pub use parse::{MessageParseError, ParseFailure, PartialEnvelope};

use fhir::FhirError;
use vrx_types::TextError;

/// Errors returned when building or rendering messages.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error(transparent)]
    Fhir(#[from] FhirError),

    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] TextError),

    #[error("a message needs at least one destination")]
    NoDestination,

    #[error("block_count must be at least 1")]
    InvalidBlockCount,

    #[error("an error message needs at least one issue")]
    NoIssues,

    #[error("{0:?} messages cannot be acknowledged")]
    NotAcknowledgeable(MessageKind),

    #[error("{0:?} messages carry no record")]
    NoRecord(MessageKind),
}

/// Type alias for Results that can fail with a [`MessageError`].
pub type MessageResult<T> = Result<T, MessageError>;
