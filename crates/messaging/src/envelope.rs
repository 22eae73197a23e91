//! Message envelopes.
//!
//! An [`Envelope`] is a message Bundle seen as a domain value: a header (id, time, endpoints,
//! the message it answers), the business identifiers of the record concerned, and a body whose
//! variant fixes the message kind. Constructors keep the body and the kind in agreement, so an
//! envelope built here always serialises to a well-formed message.

use chrono::{SecondsFormat, Utc};
use fhir::wire::{
    self, Bundle, BundleEntry, Endpoint, MessageHeader, MessageResponse, OperationOutcome,
    Parameter, Parameters, Reference, Resource,
};
use fhir::{CodedScope, Format, RecordKind, VitalRecord};
use serde_json::Value;
use uuid::Uuid;
use vrx_types::NonEmptyText;

use crate::issue::Issue;
use crate::message_type::{default_destination, MessageKind, MessageType};
use crate::{MessageError, MessageResult};

/// Source endpoint used until one is configured.
pub const DEFAULT_SOURCE: &str = "http://example.org/jurisdiction";

const RESPONSE_OK: &str = "ok";
const RESPONSE_FATAL: &str = "fatal-error";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Identifiers naming the real-world record a message concerns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BusinessIds {
    pub certificate_number: Option<String>,
    pub jurisdiction_id: Option<String>,
    pub state_auxiliary_id: Option<String>,
    pub event_year: Option<u32>,
}

impl BusinessIds {
    /// Copies the identifiers a record has; missing ones stay missing.
    pub fn of(record: &VitalRecord) -> Self {
        Self {
            certificate_number: record.certificate_number(),
            jurisdiction_id: record.jurisdiction_id(),
            state_auxiliary_id: record.auxiliary_state_identifier(),
            event_year: record.event_year(),
        }
    }
}

/// Progress of a record through manual coding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    ManualDemographicCoding,
    ManualIndustryOccupationCoding,
    ManualCodingCanceled,
    /// A status outside the vocabulary, kept by permissive parsing.
    Other(String),
}

impl StatusCode {
    pub fn as_code(&self) -> &str {
        match self {
            StatusCode::ManualDemographicCoding => "manualDemographicCoding",
            StatusCode::ManualIndustryOccupationCoding => "manualIndustryOccupationCoding",
            StatusCode::ManualCodingCanceled => "manualCodingCanceled",
            StatusCode::Other(code) => code,
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "manualDemographicCoding" => StatusCode::ManualDemographicCoding,
            "manualIndustryOccupationCoding" => StatusCode::ManualIndustryOccupationCoding,
            "manualCodingCanceled" => StatusCode::ManualCodingCanceled,
            other => StatusCode::Other(other.to_string()),
        }
    }
}

/// Routing and correlation metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub id: String,
    pub timestamp: String,
    pub source: String,
    pub destinations: Vec<String>,
    /// Id of the message this one answers.
    pub response_to: Option<String>,
}

/// What a message carries. The variant determines the message kind.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageBody {
    Submission(VitalRecord),
    Update(VitalRecord),
    /// Retracts `block_count` consecutive certificate numbers starting at the identified one.
    Void {
        block_count: u32,
    },
    /// `block_count` is present only when acknowledging a void.
    Acknowledgement {
        block_count: Option<u32>,
    },
    Error {
        issues: Vec<Issue>,
    },
    Status {
        status: StatusCode,
    },
    /// A record holding only the coded content of one scope.
    Coding {
        scope: CodedScope,
        update: bool,
        record: VitalRecord,
    },
}

impl MessageBody {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageBody::Submission(_) => MessageKind::Submission,
            MessageBody::Update(_) => MessageKind::Update,
            MessageBody::Void { .. } => MessageKind::Void,
            MessageBody::Acknowledgement { .. } => MessageKind::Acknowledgement,
            MessageBody::Error { .. } => MessageKind::Error,
            MessageBody::Status { .. } => MessageKind::Status,
            MessageBody::Coding { scope, update, .. } => MessageKind::coding(*scope, *update),
        }
    }

    pub fn record(&self) -> Option<&VitalRecord> {
        match self {
            MessageBody::Submission(record)
            | MessageBody::Update(record)
            | MessageBody::Coding { record, .. } => Some(record),
            _ => None,
        }
    }
}

/// A message about one vital record.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    header: Header,
    event: RecordKind,
    ids: BusinessIds,
    body: MessageBody,
}

// ============================================================================
// Construction
// ============================================================================

impl Envelope {
    pub(crate) fn assemble(
        header: Header,
        event: RecordKind,
        ids: BusinessIds,
        body: MessageBody,
    ) -> Self {
        Self {
            header,
            event,
            ids,
            body,
        }
    }

    fn outgoing(event: RecordKind, ids: BusinessIds, body: MessageBody) -> Self {
        let header = Header {
            id: Uuid::new_v4().to_string(),
            timestamp: now(),
            source: DEFAULT_SOURCE.to_string(),
            destinations: vec![default_destination(event)],
            response_to: None,
        };
        Self::assemble(header, event, ids, body)
    }

    /// A response to `message`, sent back to where it came from.
    fn reply(message: &Envelope, body: MessageBody) -> Self {
        let header = Header {
            id: Uuid::new_v4().to_string(),
            timestamp: now(),
            source: message
                .header
                .destinations
                .first()
                .cloned()
                .unwrap_or_else(|| default_destination(message.event)),
            destinations: vec![message.header.source.clone()],
            response_to: Some(message.header.id.clone()),
        };
        Self::assemble(header, message.event, message.ids.clone(), body)
    }

    pub fn submission(record: &VitalRecord) -> Self {
        Self::outgoing(
            record.kind(),
            BusinessIds::of(record),
            MessageBody::Submission(record.clone()),
        )
    }

    pub fn update(record: &VitalRecord) -> Self {
        Self::outgoing(
            record.kind(),
            BusinessIds::of(record),
            MessageBody::Update(record.clone()),
        )
    }

    /// Voids the record's certificate number and the `block_count - 1` numbers after it.
    /// Without an explicit count one number is voided.
    pub fn void(record: &VitalRecord, block_count: Option<u32>) -> MessageResult<Self> {
        let block_count = block_count.unwrap_or(1);
        if block_count == 0 {
            return Err(MessageError::InvalidBlockCount);
        }
        Ok(Self::outgoing(
            record.kind(),
            BusinessIds::of(record),
            MessageBody::Void { block_count },
        ))
    }

    /// Carries the coded content of one scope, not the whole record.
    pub fn coding(record: &VitalRecord, scope: CodedScope, update: bool) -> Self {
        Self::outgoing(
            record.kind(),
            BusinessIds::of(record),
            MessageBody::Coding {
                scope,
                update,
                record: record.coded_content(scope),
            },
        )
    }

    /// Acknowledges a submission, update, void or coding message.
    pub fn acknowledge(message: &Envelope) -> MessageResult<Self> {
        let kind = message.kind();
        if kind.is_response() {
            return Err(MessageError::NotAcknowledgeable(kind));
        }
        let block_count = match message.body {
            MessageBody::Void { block_count } => Some(block_count),
            _ => None,
        };
        Ok(Self::reply(
            message,
            MessageBody::Acknowledgement { block_count },
        ))
    }

    /// Reports problems found in `message`.
    pub fn error(message: &Envelope, issues: Vec<Issue>) -> MessageResult<Self> {
        if issues.is_empty() {
            return Err(MessageError::NoIssues);
        }
        Ok(Self::reply(message, MessageBody::Error { issues }))
    }

    pub fn status(message: &Envelope, status: StatusCode) -> Self {
        Self::reply(message, MessageBody::Status { status })
    }

    pub fn with_source(mut self, endpoint: &str) -> MessageResult<Self> {
        self.header.source = NonEmptyText::new(endpoint)?.into_string();
        Ok(self)
    }

    pub fn with_destinations<I, S>(mut self, endpoints: I) -> MessageResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let destinations = endpoints
            .into_iter()
            .map(|e| NonEmptyText::new(e).map(NonEmptyText::into_string))
            .collect::<Result<Vec<_>, _>>()?;
        if destinations.is_empty() {
            return Err(MessageError::NoDestination);
        }
        self.header.destinations = destinations;
        Ok(self)
    }
}

// ============================================================================
// Access
// ============================================================================

impl Envelope {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn id(&self) -> &str {
        &self.header.id
    }

    pub fn event(&self) -> RecordKind {
        self.event
    }

    pub fn kind(&self) -> MessageKind {
        self.body.kind()
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::new(self.event, self.kind())
    }

    pub fn ids(&self) -> &BusinessIds {
        &self.ids
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn record(&self) -> Option<&VitalRecord> {
        self.body.record()
    }

    pub fn block_count(&self) -> Option<u32> {
        match self.body {
            MessageBody::Void { block_count } => Some(block_count),
            MessageBody::Acknowledgement { block_count } => block_count,
            _ => None,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        match &self.body {
            MessageBody::Error { issues } => issues,
            _ => &[],
        }
    }

    fn carried_record(&self) -> MessageResult<&VitalRecord> {
        self.record()
            .ok_or_else(|| MessageError::NoRecord(self.kind()))
    }

    /// The carried record as a JSON document.
    pub fn record_json(&self) -> MessageResult<String> {
        Ok(self.carried_record()?.to_json()?)
    }

    /// The carried record as a fixed-width line.
    pub fn record_ije(&self) -> MessageResult<String> {
        let encoded = ije::encode(self.carried_record()?);
        for issue in &encoded.issues {
            tracing::warn!(
                message_id = %self.header.id,
                issue = %issue,
                "fixed-width encoding issue"
            );
        }
        Ok(encoded.line)
    }
}

// ============================================================================
// Serialisation
// ============================================================================

impl Envelope {
    /// The message Bundle: header, identifiers, then the payload if there is one.
    pub fn to_bundle(&self) -> Bundle {
        let payload = match &self.body {
            MessageBody::Error { issues } => Some((
                urn(&Uuid::new_v4().to_string()),
                Resource::OperationOutcome(OperationOutcome {
                    id: None,
                    issue: issues.iter().map(Issue::to_wire).collect(),
                }),
            )),
            body => body.record().map(|record| {
                (
                    urn(record.id()),
                    Resource::Bundle(Box::new(record.to_bundle())),
                )
            }),
        };
        let parameters_url = urn(&Uuid::new_v4().to_string());

        let response_code = match self.body {
            MessageBody::Error { .. } => RESPONSE_FATAL,
            _ => RESPONSE_OK,
        };
        let header = MessageHeader {
            id: Some(Uuid::new_v4().to_string()),
            event_uri: Some(self.message_type().uri()),
            destination: self
                .header
                .destinations
                .iter()
                .map(|d| Endpoint {
                    endpoint: Some(d.clone()),
                })
                .collect(),
            source: Some(Endpoint {
                endpoint: Some(self.header.source.clone()),
            }),
            response: self.header.response_to.as_ref().map(|id| MessageResponse {
                identifier: id.clone(),
                code: response_code.to_string(),
            }),
            focus: vec![Reference::to(
                payload.as_ref().map_or(&parameters_url, |(url, _)| url),
            )],
        };

        let mut entry = vec![
            BundleEntry {
                full_url: Some(urn(header.id.as_deref().unwrap_or_default())),
                resource: Resource::MessageHeader(header),
            },
            BundleEntry {
                full_url: Some(parameters_url),
                resource: Resource::Parameters(self.parameters()),
            },
        ];
        if let Some((full_url, resource)) = payload {
            entry.push(BundleEntry {
                full_url: Some(full_url),
                resource,
            });
        }

        Bundle {
            id: Some(self.header.id.clone()),
            meta: None,
            identifier: None,
            bundle_type: "message".to_string(),
            timestamp: Some(self.header.timestamp.clone()),
            entry,
        }
    }

    fn parameters(&self) -> Parameters {
        let mut parameter = Vec::new();
        let mut text = |name: &str, value: &Option<String>| {
            if let Some(value) = value {
                parameter.push(Parameter {
                    name: name.to_string(),
                    value_string: Some(value.clone()),
                    ..Parameter::default()
                });
            }
        };
        text("cert_no", &self.ids.certificate_number);
        text("jurisdiction_id", &self.ids.jurisdiction_id);
        text("state_auxiliary_id", &self.ids.state_auxiliary_id);

        let mut number = |name: &str, value: Option<u32>| {
            if let Some(value) = value {
                parameter.push(Parameter {
                    name: name.to_string(),
                    value_unsigned_int: Some(value),
                    ..Parameter::default()
                });
            }
        };
        number("event_year", self.ids.event_year);
        number("block_count", self.block_count());

        if let MessageBody::Status { status } = &self.body {
            parameter.push(Parameter {
                name: "status".to_string(),
                value_code: Some(status.as_code().to_string()),
                ..Parameter::default()
            });
        }

        Parameters {
            id: None,
            parameter,
        }
    }

    pub fn to_value(&self) -> MessageResult<Value> {
        Ok(wire::bundle_value(&self.to_bundle())?)
    }

    pub fn render(&self, format: Format) -> MessageResult<String> {
        Ok(format.write(&self.to_value()?)?)
    }

    pub fn to_json(&self) -> MessageResult<String> {
        self.render(Format::Json)
    }
}

/// Reads the business identifiers from a Parameters resource.
pub(crate) fn ids_from(parameters: &Parameters) -> BusinessIds {
    let text = |name: &str| {
        parameters.get(name).and_then(|p| {
            p.value_string
                .clone()
                .or_else(|| p.value_unsigned_int.map(|v| v.to_string()))
        })
    };
    BusinessIds {
        certificate_number: text("cert_no"),
        jurisdiction_id: text("jurisdiction_id"),
        state_auxiliary_id: text("state_auxiliary_id"),
        event_year: parameters
            .get("event_year")
            .and_then(|p| p.value_unsigned_int),
    }
}

fn urn(id: &str) -> String {
    format!("urn:uuid:{id}")
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{IssueCode, Severity};
    use fhir::FieldValue;
    use vrx_types::Component;

    fn record() -> VitalRecord {
        let mut r = VitalRecord::new(RecordKind::Birth);
        r.set_certificate_number(Some("123"));
        r.set_jurisdiction_id(Some("MA"));
        r.set("birthYear", FieldValue::Number(Component::Known(2023)))
            .expect("valid year");
        r
    }

    #[test]
    fn identifiers_are_copied_shallowly() {
        let message = Envelope::submission(&record());
        assert_eq!(message.ids().certificate_number.as_deref(), Some("123"));
        assert_eq!(message.ids().jurisdiction_id.as_deref(), Some("MA"));
        assert_eq!(message.ids().event_year, Some(2023));
        assert_eq!(message.ids().state_auxiliary_id, None);
        assert_eq!(message.kind(), MessageKind::Submission);
        assert_eq!(
            message.header().destinations,
            vec!["http://nchs.cdc.gov/bfdr_submission".to_string()]
        );
    }

    #[test]
    fn void_defaults_to_one_and_is_acknowledged_with_its_count() {
        let void = Envelope::void(&record(), None).expect("valid");
        assert_eq!(void.block_count(), Some(1));
        assert!(void.record().is_none());

        let ack = Envelope::acknowledge(&void).expect("voids can be acknowledged");
        assert_eq!(ack.block_count(), Some(1));
        assert_eq!(ack.header().response_to.as_deref(), Some(void.id()));
        assert_eq!(ack.header().destinations, vec![void.header().source.clone()]);

        let submission_ack =
            Envelope::acknowledge(&Envelope::submission(&record())).expect("acknowledgeable");
        assert_eq!(submission_ack.block_count(), None);

        assert!(matches!(
            Envelope::void(&record(), Some(0)),
            Err(MessageError::InvalidBlockCount)
        ));
    }

    #[test]
    fn responses_cannot_be_acknowledged() {
        let ack = Envelope::acknowledge(&Envelope::submission(&record())).expect("valid");
        let err = Envelope::acknowledge(&ack).expect_err("ack of ack");
        assert!(matches!(
            err,
            MessageError::NotAcknowledgeable(MessageKind::Acknowledgement)
        ));
    }

    #[test]
    fn errors_need_issues() {
        let submission = Envelope::submission(&record());
        assert!(matches!(
            Envelope::error(&submission, Vec::new()),
            Err(MessageError::NoIssues)
        ));

        let issue = Issue::new(Severity::Error, IssueCode::Value, "bad weight");
        let error = Envelope::error(&submission, vec![issue.clone()]).expect("valid");
        assert_eq!(error.issues(), &[issue]);
        assert!(matches!(
            error.record_json(),
            Err(MessageError::NoRecord(MessageKind::Error))
        ));
    }

    #[test]
    fn coding_messages_carry_only_coded_content() {
        let mut source = record();
        source
            .set("motherOccupation", FieldValue::Code(Some("1010".into())))
            .expect("code");
        source
            .set("childFirstName", FieldValue::Text(Some("Ada".into())))
            .expect("name");

        let message = Envelope::coding(&source, CodedScope::IndustryOccupation, true);
        assert_eq!(message.kind(), MessageKind::IndustryOccupationCodingUpdate);
        let payload = message.record().expect("coded record");
        assert_eq!(
            payload.get("motherOccupation").expect("field"),
            FieldValue::Code(Some("1010".into()))
        );
        assert_eq!(payload.get("childFirstName").expect("field"), FieldValue::Text(None));
        assert_eq!(payload.certificate_number().as_deref(), Some("123"));
    }

    #[test]
    fn endpoints_must_not_be_blank() {
        let message = Envelope::submission(&record());
        assert!(matches!(
            message.clone().with_source("   "),
            Err(MessageError::Endpoint(_))
        ));
        assert!(matches!(
            message.clone().with_destinations(Vec::<String>::new()),
            Err(MessageError::NoDestination)
        ));
        let routed = message
            .with_source("http://example.org/ma")
            .and_then(|m| m.with_destinations(["http://a", "http://b"]))
            .expect("valid endpoints");
        assert_eq!(routed.header().source, "http://example.org/ma");
        assert_eq!(routed.header().destinations.len(), 2);
    }

    #[test]
    fn bundle_orders_header_parameters_payload() {
        let bundle = Envelope::void(&record(), Some(3)).expect("valid").to_bundle();
        assert_eq!(bundle.bundle_type, "message");
        let types: Vec<&str> = bundle.entry.iter().map(|e| e.resource.resource_type()).collect();
        assert_eq!(types, ["MessageHeader", "Parameters"]);

        let Resource::Parameters(parameters) = &bundle.entry[1].resource else {
            panic!("parameters entry");
        };
        assert_eq!(ids_from(parameters).certificate_number.as_deref(), Some("123"));
        assert_eq!(
            parameters.get("block_count").and_then(|p| p.value_unsigned_int),
            Some(3)
        );
    }

    #[test]
    fn the_record_is_available_in_every_representation() {
        let message = Envelope::submission(&record());
        let json = message.record_json().expect("json");
        assert!(json.contains("\"type\": \"document\""));
        let line = message.record_ije().expect("fixed width");
        assert_eq!(&line[6..12], "000123");
    }
}
