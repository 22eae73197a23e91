//! FHIR wire model for vital record documents and messages.
//!
//! This module defines the JSON/YAML shapes that cross the boundary. The structs follow FHIR
//! naming (`resourceType`, camelCase members, `_element` siblings for primitive extensions) and
//! cover the subset of resources a vital record document or message needs.
//!
//! Responsibilities:
//! - Define the wire structs for serialisation/deserialisation
//! - Find members a parsed text carried that this model does not recognise ([`unknown_members`])
//!
//! Notes:
//! - `resourceType` is not a struct member; [`Resource`] adds and strips it.
//! - Unrecognised resource types survive as [`Resource::Other`].

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{FhirError, FhirResult};

// ============================================================================
// Strictness reporting
// ============================================================================

/// Lists the member paths present in `input` but dropped by the wire model.
///
/// `output` is the wire model re-serialised. Only keys are compared; members whose input value
/// is `null` or empty are ignored because the model never writes them.
pub fn unknown_members(input: &Value, output: &Value) -> Vec<String> {
    let mut out = Vec::new();
    diff_keys(input, output, "", &mut out);
    out
}

fn diff_keys(input: &Value, output: &Value, path: &str, out: &mut Vec<String>) {
    match (input, output) {
        (Value::Object(input), Value::Object(output)) => {
            for (key, value) in input {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                match output.get(key) {
                    Some(kept) => diff_keys(value, kept, &child, out),
                    None if is_vacant(value) => {}
                    None => out.push(child),
                }
            }
        }
        (Value::Array(input), Value::Array(output)) => {
            for (idx, (value, kept)) in input.iter().zip(output).enumerate() {
                diff_keys(value, kept, &format!("{path}[{idx}]"), out);
            }
        }
        _ => {}
    }
}

fn is_vacant(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(members) => members.is_empty(),
        _ => false,
    }
}

// ============================================================================
// Data types
// ============================================================================

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: &str, code: &str, display: Option<&str>) -> Self {
        Self {
            system: Some(system.to_string()),
            code: Some(code.to_string()),
            display: display.map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    pub fn from_coding(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
            text: None,
        }
    }

    /// True if any coding carries `code`, optionally restricted to `system`.
    pub fn has_code(&self, system: Option<&str>, code: &str) -> bool {
        self.coding.iter().any(|c| {
            c.code.as_deref() == Some(code)
                && system.is_none_or(|s| c.system.as_deref() == Some(s))
        })
    }

    /// Code of the first coding, if any.
    pub fn first_code(&self) -> Option<&str> {
        self.coding.iter().find_map(|c| c.code.as_deref())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn to(target: &str) -> Self {
        Self {
            reference: Some(target.to_string()),
            display: None,
        }
    }

    pub fn points_to(&self, target: &str) -> bool {
        self.reference.as_deref() == Some(target)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quantity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Holder for extensions on a primitive value (`_birthDate`, `_valueUnsignedInt`, ...).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl Element {
    pub fn with_extension(extension: Extension) -> Self {
        Self {
            extension: vec![extension],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extension.is_empty()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub url: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_unsigned_int: Option<u32>,

    #[serde(rename = "_valueUnsignedInt", skip_serializing_if = "Option::is_none")]
    pub value_unsigned_int_element: Option<Element>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_positive_int: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_integer: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_coding: Option<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_codeable_concept: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_date_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_time: Option<String>,

    #[serde(rename = "_valueTime", skip_serializing_if = "Option::is_none")]
    pub value_time_element: Option<Element>,
}

impl Extension {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HumanName {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suffix: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(rename = "_city", skip_serializing_if = "Option::is_none")]
    pub city_element: Option<Element>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(rename = "_district", skip_serializing_if = "Option::is_none")]
    pub district_element: Option<Element>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

// ============================================================================
// Resources
// ============================================================================

/// Kind of a clinical document entry that field locators can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Condition,
    Procedure,
    Observation,
    Coverage,
}

impl EntryKind {
    pub fn resource_type(self) -> &'static str {
        match self {
            EntryKind::Condition => "Condition",
            EntryKind::Procedure => "Procedure",
            EntryKind::Observation => "Observation",
            EntryKind::Coverage => "Coverage",
        }
    }

    fn from_resource_type(resource_type: &str) -> Option<Self> {
        match resource_type {
            "Condition" => Some(EntryKind::Condition),
            "Procedure" => Some(EntryKind::Procedure),
            "Observation" => Some(EntryKind::Observation),
            "Coverage" => Some(EntryKind::Coverage),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,

    #[serde(rename = "type")]
    pub bundle_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    pub resource: Resource,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub section: Vec<CompositionSection>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_reason: Option<CodeableConcept>,
}

/// Patient or RelatedPerson.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationship: Vec<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(rename = "_birthDate", skip_serializing_if = "Option::is_none")]
    pub birth_date_element: Option<Element>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
}

impl Person {
    pub fn has_profile(&self, profile: &str) -> bool {
        self.meta
            .as_ref()
            .is_some_and(|m| m.profile.iter().any(|p| p == profile))
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObservationComponent {
    pub code: CodeableConcept,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_codeable_concept: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_integer: Option<i64>,
}

/// Condition, Procedure, Observation or Coverage entry.
///
/// The four resource kinds share the members field locators rely on (code, category, subject,
/// value), so one struct carries all of them.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    /// Coverage carries its code in `type`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    /// Coverage carries its subject in `beneficiary`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus: Vec<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_codeable_concept: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_integer: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_date_time: Option<String>,

    #[serde(rename = "_valueDateTime", skip_serializing_if = "Option::is_none")]
    pub value_date_time_element: Option<Element>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_absent_reason: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component: Vec<ObservationComponent>,
}

impl ClinicalEntry {
    /// The code that identifies this entry (`type` for Coverage, `code` otherwise).
    pub fn identifying_code(&self) -> Option<&CodeableConcept> {
        self.code.as_ref().or(self.type_.as_ref())
    }

    pub fn subject_reference(&self) -> Option<&Reference> {
        self.subject.as_ref().or(self.beneficiary.as_ref())
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.category.iter().any(|c| c.has_code(None, category))
    }

    /// Clears every `value[x]` member and the absent reason.
    pub fn clear_value(&mut self) {
        self.value_codeable_concept = None;
        self.value_quantity = None;
        self.value_integer = None;
        self.value_string = None;
        self.value_boolean = None;
        self.value_date_time = None;
        self.value_date_time_element = None;
        self.data_absent_reason = None;
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub identifier: String,

    pub code: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination: Vec<Endpoint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Endpoint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<MessageResponse>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus: Vec<Reference>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_unsigned_int: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_code: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter: Vec<Parameter>,
}

impl Parameters {
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameter.iter().find(|p| p.name == name)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeIssue {
    pub severity: String,

    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issue: Vec<OutcomeIssue>,
}

/// Any resource that can appear in a document or message bundle.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    Bundle(Box<Bundle>),
    Composition(Composition),
    Patient(Person),
    RelatedPerson(Person),
    Location(Location),
    Clinical(EntryKind, ClinicalEntry),
    MessageHeader(MessageHeader),
    Parameters(Parameters),
    OperationOutcome(OperationOutcome),
    /// A resource type this model does not know, kept verbatim (including `resourceType`).
    Other(Map<String, Value>),
}

impl Resource {
    pub fn resource_type(&self) -> &str {
        match self {
            Resource::Bundle(_) => "Bundle",
            Resource::Composition(_) => "Composition",
            Resource::Patient(_) => "Patient",
            Resource::RelatedPerson(_) => "RelatedPerson",
            Resource::Location(_) => "Location",
            Resource::Clinical(kind, _) => kind.resource_type(),
            Resource::MessageHeader(_) => "MessageHeader",
            Resource::Parameters(_) => "Parameters",
            Resource::OperationOutcome(_) => "OperationOutcome",
            Resource::Other(map) => map
                .get("resourceType")
                .and_then(Value::as_str)
                .unwrap_or("Unknown"),
        }
    }

    pub fn as_clinical(&self) -> Option<(EntryKind, &ClinicalEntry)> {
        match self {
            Resource::Clinical(kind, entry) => Some((*kind, entry)),
            _ => None,
        }
    }
}

impl Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let body = match self {
            Resource::Bundle(b) => serde_json::to_value(b),
            Resource::Composition(c) => serde_json::to_value(c),
            Resource::Patient(p) | Resource::RelatedPerson(p) => serde_json::to_value(p),
            Resource::Location(l) => serde_json::to_value(l),
            Resource::Clinical(_, e) => serde_json::to_value(e),
            Resource::MessageHeader(h) => serde_json::to_value(h),
            Resource::Parameters(p) => serde_json::to_value(p),
            Resource::OperationOutcome(o) => serde_json::to_value(o),
            Resource::Other(map) => return map.serialize(serializer),
        }
        .map_err(S::Error::custom)?;

        let mut map = Map::new();
        map.insert(
            "resourceType".to_string(),
            Value::String(self.resource_type().to_string()),
        );
        if let Value::Object(fields) = body {
            map.extend(fields);
        }
        map.serialize(serializer)
    }
}

/// Deserialise a resource body, naming the failing member path.
fn typed<T, E>(resource_type: &str, body: Value) -> Result<T, E>
where
    T: DeserializeOwned,
    E: serde::de::Error,
{
    serde_path_to_error::deserialize::<_, T>(body).map_err(|err| {
        let path = err.path().to_string();
        E::custom(format!("{resource_type}.{path}: {}", err.into_inner()))
    })
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;
        let resource_type = match map.remove("resourceType") {
            Some(Value::String(resource_type)) => resource_type,
            Some(other) => {
                return Err(D::Error::custom(format!(
                    "resourceType must be a string, got {other}"
                )))
            }
            None => return Err(D::Error::missing_field("resourceType")),
        };
        let body = Value::Object(map);

        if let Some(kind) = EntryKind::from_resource_type(&resource_type) {
            return typed(&resource_type, body).map(|entry| Resource::Clinical(kind, entry));
        }

        match resource_type.as_str() {
            "Bundle" => typed(&resource_type, body).map(|b| Resource::Bundle(Box::new(b))),
            "Composition" => typed(&resource_type, body).map(Resource::Composition),
            "Patient" => typed(&resource_type, body).map(Resource::Patient),
            "RelatedPerson" => typed(&resource_type, body).map(Resource::RelatedPerson),
            "Location" => typed(&resource_type, body).map(Resource::Location),
            "MessageHeader" => typed(&resource_type, body).map(Resource::MessageHeader),
            "Parameters" => typed(&resource_type, body).map(Resource::Parameters),
            "OperationOutcome" => typed(&resource_type, body).map(Resource::OperationOutcome),
            _ => {
                let mut kept = Map::new();
                kept.insert("resourceType".to_string(), Value::String(resource_type));
                if let Value::Object(fields) = body {
                    kept.extend(fields);
                }
                Ok(Resource::Other(kept))
            }
        }
    }
}

// ============================================================================
// Bundle reading
// ============================================================================

/// Checks that `value` is a Bundle of the given `type` before any typed parsing.
pub fn expect_bundle(value: &Value, bundle_type: &str) -> FhirResult<()> {
    let resource_type = value.get("resourceType").and_then(Value::as_str);
    let found_type = value.get("type").and_then(Value::as_str);
    match (resource_type, found_type) {
        (Some("Bundle"), Some(found)) if found == bundle_type => Ok(()),
        (Some("Bundle"), found) => Err(FhirError::WrongDocumentType {
            expected: format!("Bundle of type {bundle_type}"),
            found: format!("Bundle of type {}", found.unwrap_or("(none)")),
        }),
        (other, _) => Err(FhirError::WrongDocumentType {
            expected: "Bundle".to_string(),
            found: other.unwrap_or("(no resourceType)").to_string(),
        }),
    }
}

/// Deserialises a Bundle, returning it with the paths of everything the model did not keep.
///
/// Unknown members of known resources are dropped; resources of unknown type are kept as
/// [`Resource::Other`] but still reported.
pub fn read_bundle(value: &Value) -> FhirResult<(Bundle, Vec<String>)> {
    let bundle: Bundle = serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        FhirError::Translation(format!("{path}: {}", err.into_inner()))
    })?;

    let output = bundle_value(&bundle)?;
    let mut unrecognised = unknown_members(value, &output);
    unknown_resources(&bundle, "", &mut unrecognised);
    Ok((bundle, unrecognised))
}

/// Serialises a Bundle with its `resourceType`.
pub fn bundle_value(bundle: &Bundle) -> FhirResult<Value> {
    let mut map = Map::new();
    map.insert("resourceType".to_string(), Value::String("Bundle".into()));
    if let Value::Object(fields) = serde_json::to_value(bundle)? {
        map.extend(fields);
    }
    Ok(Value::Object(map))
}

fn unknown_resources(bundle: &Bundle, prefix: &str, out: &mut Vec<String>) {
    for (idx, entry) in bundle.entry.iter().enumerate() {
        let path = format!("{prefix}entry[{idx}].resource");
        match &entry.resource {
            Resource::Other(_) => {
                out.push(format!("{path} ({})", entry.resource.resource_type()));
            }
            Resource::Bundle(inner) => unknown_resources(inner, &format!("{path}."), out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_type_is_written_first() {
        let resource = Resource::Clinical(
            EntryKind::Observation,
            ClinicalEntry {
                id: Some("obs-1".into()),
                value_integer: Some(9),
                ..ClinicalEntry::default()
            },
        );

        let text = serde_json::to_string(&resource).expect("serialise");
        assert!(text.starts_with(r#"{"resourceType":"Observation""#));
    }

    #[test]
    fn unknown_resource_type_is_kept_verbatim() {
        let value = json!({ "resourceType": "Encounter", "id": "enc-1", "status": "finished" });
        let resource: Resource = serde_json::from_value(value.clone()).expect("deserialise");

        assert!(matches!(resource, Resource::Other(_)));
        assert_eq!(resource.resource_type(), "Encounter");
        assert_eq!(serde_json::to_value(&resource).expect("serialise"), value);
    }

    #[test]
    fn unknown_members_are_reported_with_paths() {
        let input = json!({
            "resourceType": "Condition",
            "code": { "coding": [{ "code": "73211009", "colour": "blue" }] },
            "mood": "fine",
            "note": []
        });
        let resource: Resource = serde_json::from_value(input.clone()).expect("deserialise");
        let output = serde_json::to_value(&resource).expect("serialise");

        assert_eq!(
            unknown_members(&input, &output),
            vec!["code.coding[0].colour".to_string(), "mood".to_string()]
        );
    }

    #[test]
    fn wrong_member_type_names_the_path() {
        let value = json!({ "resourceType": "Observation", "valueInteger": "nine" });
        let err = serde_json::from_value::<Resource>(value).expect_err("should reject");
        assert!(err.to_string().contains("Observation.valueInteger"));
    }

    #[test]
    fn missing_resource_type_is_rejected() {
        let err = serde_json::from_value::<Resource>(json!({ "id": "x" }))
            .expect_err("should reject");
        assert!(err.to_string().contains("resourceType"));
    }

    #[test]
    fn bundle_reader_reports_dropped_members_and_unknown_resources() {
        let value = json!({
            "resourceType": "Bundle",
            "type": "document",
            "signature": { "who": "x" },
            "entry": [
                { "fullUrl": "urn:uuid:1", "resource": { "resourceType": "Encounter" } },
                { "fullUrl": "urn:uuid:2", "resource": { "resourceType": "Location", "alias": "A" } }
            ]
        });
        expect_bundle(&value, "document").expect("document bundle");
        let (bundle, unrecognised) = read_bundle(&value).expect("read");

        assert_eq!(bundle.entry.len(), 2);
        assert_eq!(
            unrecognised,
            vec![
                "signature".to_string(),
                "entry[1].resource.alias".to_string(),
                "entry[0].resource (Encounter)".to_string(),
            ]
        );
    }

    #[test]
    fn wrong_bundle_type_is_distinct() {
        let value = json!({ "resourceType": "Bundle", "type": "message" });
        let err = expect_bundle(&value, "document").expect_err("message is not a document");
        assert!(matches!(err, FhirError::WrongDocumentType { .. }));

        let err = expect_bundle(&json!({ "resourceType": "Patient" }), "document")
            .expect_err("not a bundle");
        assert!(err.to_string().contains("Patient"));
    }

    #[test]
    fn bundle_reader_names_the_failing_path() {
        let value = json!({
            "resourceType": "Bundle",
            "type": "document",
            "entry": [{ "resource": { "resourceType": "Observation", "valueInteger": "x" } }]
        });
        let err = read_bundle(&value).expect_err("bad member");
        let text = err.to_string();
        assert!(text.contains("entry[0].resource"), "{text}");
        assert!(text.contains("Observation.valueInteger"), "{text}");
    }
}
