//! Reading messages back into envelopes.
//!
//! Parsing dispatches on the header's `eventUri`. Whatever could be read before a failure is
//! kept in the error, so a caller can answer a broken message with an error message without
//! parsing it again.

use chrono::{SecondsFormat, Utc};
use fhir::record::tolerate;
use fhir::wire::{self, MessageHeader, Parameters, Resource};
use fhir::{format, ParseMode, RecordKind, VitalRecord};
use serde_json::Value;
use uuid::Uuid;

use crate::envelope::{ids_from, BusinessIds, Envelope, Header, MessageBody, StatusCode};
use crate::issue::{Issue, IssueCode, Severity};
use crate::message_type::{default_destination, MessageKind, MessageType};

/// Why a message could not be read.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("not a message: {0}")]
    NotAMessage(String),

    #[error("message has no MessageHeader")]
    MissingHeader,

    #[error("MessageHeader has no eventUri")]
    MissingEventType,

    #[error("unsupported message type {0}")]
    UnsupportedEventType(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl ParseFailure {
    fn issue_code(&self) -> IssueCode {
        match self {
            ParseFailure::Malformed(_) | ParseFailure::NotAMessage(_) => IssueCode::Structure,
            ParseFailure::MissingHeader | ParseFailure::MissingEventType => IssueCode::Required,
            ParseFailure::UnsupportedEventType(_) => IssueCode::NotSupported,
            ParseFailure::InvalidPayload(_) => IssueCode::Invalid,
        }
    }
}

/// What was recovered from a message before parsing failed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartialEnvelope {
    pub id: Option<String>,
    pub source: Option<String>,
    pub destinations: Vec<String>,
    pub event: Option<RecordKind>,
    pub ids: BusinessIds,
}

impl PartialEnvelope {
    fn fail(&self, failure: ParseFailure) -> MessageParseError {
        MessageParseError {
            failure,
            partial: self.clone(),
        }
    }
}

/// A failed parse and the partial envelope recovered before it.
#[derive(Debug, thiserror::Error)]
#[error("{failure}")]
pub struct MessageParseError {
    pub failure: ParseFailure,
    pub partial: PartialEnvelope,
}

impl MessageParseError {
    /// An error message answering the unreadable message, with one fatal issue.
    pub fn error_response(&self) -> Envelope {
        let partial = &self.partial;
        let event = partial.event.unwrap_or(RecordKind::Birth);
        let header = Header {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            source: partial
                .destinations
                .first()
                .cloned()
                .unwrap_or_else(|| default_destination(event)),
            destinations: vec![partial
                .source
                .clone()
                .unwrap_or_else(|| crate::DEFAULT_SOURCE.to_string())],
            response_to: Some(partial.id.clone().unwrap_or_else(|| "unknown".into())),
        };
        let issue = Issue::new(
            Severity::Fatal,
            self.failure.issue_code(),
            self.failure.to_string(),
        );
        Envelope::assemble(
            header,
            event,
            partial.ids.clone(),
            MessageBody::Error {
                issues: vec![issue],
            },
        )
    }
}

impl Envelope {
    /// Parses a message Bundle from JSON or YAML text.
    pub fn parse(text: &str, mode: ParseMode) -> Result<Self, MessageParseError> {
        let (value, _) = format::read_any(text).map_err(|err| {
            PartialEnvelope::default().fail(ParseFailure::Malformed(err.to_string()))
        })?;
        Self::from_value(&value, mode)
    }

    /// Builds an envelope from an already parsed message Bundle value.
    pub fn from_value(value: &Value, mode: ParseMode) -> Result<Self, MessageParseError> {
        let mut partial = PartialEnvelope {
            id: value.get("id").and_then(Value::as_str).map(str::to_string),
            ..PartialEnvelope::default()
        };

        wire::expect_bundle(value, "message")
            .map_err(|err| partial.fail(ParseFailure::NotAMessage(err.to_string())))?;

        if let Some(parameters) = raw_resource(value, "Parameters")
            .and_then(|raw| serde_json::from_value::<Parameters>(raw.clone()).ok())
        {
            partial.ids = ids_from(&parameters);
        }

        let raw_header =
            raw_resource(value, "MessageHeader").ok_or_else(|| partial.fail(ParseFailure::MissingHeader))?;
        let header: MessageHeader = serde_json::from_value(raw_header.clone()).map_err(|err| {
            partial.fail(ParseFailure::InvalidPayload(format!("MessageHeader: {err}")))
        })?;
        partial.source = header.source.as_ref().and_then(|s| s.endpoint.clone());
        partial.destinations = header
            .destination
            .iter()
            .filter_map(|d| d.endpoint.clone())
            .collect();

        let uri = header
            .event_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| partial.fail(ParseFailure::MissingEventType))?;
        let message_type = MessageType::from_uri(uri)
            .ok_or_else(|| partial.fail(ParseFailure::UnsupportedEventType(uri.to_string())))?;
        partial.event = Some(message_type.event);

        let invalid = |detail: String| partial.fail(ParseFailure::InvalidPayload(detail));

        let (bundle, unrecognised) = wire::read_bundle(value).map_err(|e| invalid(e.to_string()))?;
        tolerate(unrecognised, mode).map_err(|e| invalid(e.to_string()))?;

        let mut parameters = None;
        let mut document = None;
        let mut outcome = None;
        for entry in bundle.entry {
            match entry.resource {
                Resource::Parameters(p) if parameters.is_none() => parameters = Some(p),
                Resource::Bundle(b) if document.is_none() => document = Some(*b),
                Resource::OperationOutcome(o) if outcome.is_none() => outcome = Some(o),
                _ => {}
            }
        }
        let parameters = parameters.unwrap_or_default();
        let record = |mode| match document.clone() {
            Some(bundle) => VitalRecord::from_bundle(bundle, mode).map_err(|e| e.to_string()),
            None => Err("message carries no record".to_string()),
        };

        let response_to = header.response.as_ref().map(|r| r.identifier.clone());
        if message_type.kind.is_response() && response_to.is_none() {
            return Err(invalid("response message names no message it answers".into()));
        }
        let block_count = parameters
            .get("block_count")
            .and_then(|p| p.value_unsigned_int);

        let body = match message_type.kind {
            MessageKind::Submission => MessageBody::Submission(record(mode).map_err(invalid)?),
            MessageKind::Update => MessageBody::Update(record(mode).map_err(invalid)?),
            MessageKind::Void => match block_count.unwrap_or(1) {
                0 => return Err(invalid("block_count must be at least 1".into())),
                block_count => MessageBody::Void { block_count },
            },
            MessageKind::Acknowledgement => MessageBody::Acknowledgement { block_count },
            MessageKind::Error => {
                let mut issues = Vec::new();
                let mut unknown = Vec::new();
                for wire_issue in outcome.iter().flat_map(|o| o.issue.iter()) {
                    match Issue::from_wire(wire_issue) {
                        Ok(issue) => issues.push(issue),
                        Err(what) => unknown.push(what),
                    }
                }
                tolerate(unknown, mode).map_err(|e| invalid(e.to_string()))?;
                MessageBody::Error { issues }
            }
            MessageKind::Status => {
                let code = parameters
                    .get("status")
                    .and_then(|p| p.value_code.as_deref())
                    .ok_or_else(|| invalid("status message has no status".into()))?;
                let status = StatusCode::from_code(code);
                if let StatusCode::Other(code) = &status {
                    tolerate(vec![format!("status {code:?}")], mode)
                        .map_err(|e| invalid(e.to_string()))?;
                }
                MessageBody::Status { status }
            }
            kind => {
                let Some((scope, update)) = kind.coding_scope() else {
                    unreachable!("every remaining message kind is a coding kind");
                };
                MessageBody::Coding {
                    scope,
                    update,
                    record: record(mode).map_err(invalid)?,
                }
            }
        };

        let source = partial
            .source
            .clone()
            .ok_or_else(|| invalid("MessageHeader has no source endpoint".into()))?;
        if partial.destinations.is_empty() {
            return Err(invalid("MessageHeader has no destination".into()));
        }
        let header = Header {
            id: bundle.id.unwrap_or_else(|| {
                tracing::warn!("message bundle has no id, minting one");
                Uuid::new_v4().to_string()
            }),
            timestamp: bundle
                .timestamp
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            source,
            destinations: partial.destinations.clone(),
            response_to,
        };
        Ok(Envelope::assemble(
            header,
            message_type.event,
            partial.ids.clone(),
            body,
        ))
    }
}

fn raw_resource<'a>(value: &'a Value, resource_type: &str) -> Option<&'a Value> {
    value
        .get("entry")?
        .as_array()?
        .iter()
        .filter_map(|entry| entry.get("resource"))
        .find(|r| r.get("resourceType").and_then(Value::as_str) == Some(resource_type))
}
