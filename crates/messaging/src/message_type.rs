//! Message type URIs.
//!
//! Every message declares its kind through the `eventUri` of its header. The set of URIs is
//! closed: one per message kind for each record kind.

use std::collections::HashMap;
use std::sync::LazyLock;

use fhir::{CodedScope, RecordKind};

const URI_BASE: &str = "http://nchs.cdc.gov/";

/// The kinds of message exchanged about a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Submission,
    Update,
    Void,
    Acknowledgement,
    Error,
    Status,
    DemographicsCoding,
    DemographicsCodingUpdate,
    IndustryOccupationCoding,
    IndustryOccupationCodingUpdate,
}

impl MessageKind {
    pub const ALL: [MessageKind; 10] = [
        MessageKind::Submission,
        MessageKind::Update,
        MessageKind::Void,
        MessageKind::Acknowledgement,
        MessageKind::Error,
        MessageKind::Status,
        MessageKind::DemographicsCoding,
        MessageKind::DemographicsCodingUpdate,
        MessageKind::IndustryOccupationCoding,
        MessageKind::IndustryOccupationCodingUpdate,
    ];

    fn suffix(self) -> &'static str {
        match self {
            MessageKind::Submission => "submission",
            MessageKind::Update => "submission_update",
            MessageKind::Void => "submission_void",
            MessageKind::Acknowledgement => "acknowledgement",
            MessageKind::Error => "extraction_error",
            MessageKind::Status => "status",
            MessageKind::DemographicsCoding => "demographics_coding",
            MessageKind::DemographicsCodingUpdate => "demographics_coding_update",
            MessageKind::IndustryOccupationCoding => "industryoccupation_coding",
            MessageKind::IndustryOccupationCodingUpdate => "industryoccupation_coding_update",
        }
    }

    pub fn coding(scope: CodedScope, update: bool) -> Self {
        match (scope, update) {
            (CodedScope::Demographic, false) => MessageKind::DemographicsCoding,
            (CodedScope::Demographic, true) => MessageKind::DemographicsCodingUpdate,
            (CodedScope::IndustryOccupation, false) => MessageKind::IndustryOccupationCoding,
            (CodedScope::IndustryOccupation, true) => MessageKind::IndustryOccupationCodingUpdate,
        }
    }

    /// The scope and update flag of a coding kind.
    pub fn coding_scope(self) -> Option<(CodedScope, bool)> {
        match self {
            MessageKind::DemographicsCoding => Some((CodedScope::Demographic, false)),
            MessageKind::DemographicsCodingUpdate => Some((CodedScope::Demographic, true)),
            MessageKind::IndustryOccupationCoding => Some((CodedScope::IndustryOccupation, false)),
            MessageKind::IndustryOccupationCodingUpdate => {
                Some((CodedScope::IndustryOccupation, true))
            }
            _ => None,
        }
    }

    /// True for messages that answer another message.
    pub fn is_response(self) -> bool {
        matches!(
            self,
            MessageKind::Acknowledgement | MessageKind::Error | MessageKind::Status
        )
    }
}

/// A message kind for one kind of record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageType {
    pub event: RecordKind,
    pub kind: MessageKind,
}

static BY_URI: LazyLock<HashMap<String, MessageType>> = LazyLock::new(|| {
    [RecordKind::Birth, RecordKind::FetalDeath]
        .into_iter()
        .flat_map(|event| {
            MessageKind::ALL
                .into_iter()
                .map(move |kind| MessageType { event, kind })
        })
        .map(|t| (t.uri(), t))
        .collect()
});

impl MessageType {
    pub fn new(event: RecordKind, kind: MessageKind) -> Self {
        Self { event, kind }
    }

    pub fn uri(self) -> String {
        format!("{URI_BASE}{}_{}", self.event.prefix(), self.kind.suffix())
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        BY_URI.get(uri.trim()).copied()
    }
}

/// Where submissions for a kind of record are sent unless configured otherwise.
pub fn default_destination(event: RecordKind) -> String {
    MessageType::new(event, MessageKind::Submission).uri()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_uri_resolves_to_itself() {
        assert_eq!(BY_URI.len(), 20);
        for (uri, message_type) in BY_URI.iter() {
            assert_eq!(&message_type.uri(), uri);
        }
    }

    #[test]
    fn uris_follow_the_event_prefix() {
        let void = MessageType::new(RecordKind::FetalDeath, MessageKind::Void);
        assert_eq!(void.uri(), "http://nchs.cdc.gov/fd_submission_void");
        assert_eq!(
            MessageType::from_uri("http://nchs.cdc.gov/bfdr_industryoccupation_coding_update"),
            Some(MessageType::new(
                RecordKind::Birth,
                MessageKind::IndustryOccupationCodingUpdate
            ))
        );
        assert_eq!(MessageType::from_uri("http://nchs.cdc.gov/vrdr_submission"), None);
        assert_eq!(
            default_destination(RecordKind::Birth),
            "http://nchs.cdc.gov/bfdr_submission"
        );
    }

    #[test]
    fn coding_kinds_carry_their_scope() {
        for scope in [CodedScope::Demographic, CodedScope::IndustryOccupation] {
            for update in [false, true] {
                assert_eq!(
                    MessageKind::coding(scope, update).coding_scope(),
                    Some((scope, update))
                );
            }
        }
        assert_eq!(MessageKind::Submission.coding_scope(), None);
    }
}
