//! The canonical vital record.
//!
//! [`VitalRecord`] wraps a document Bundle: the manifest (Composition), the people and place
//! the record is about, and clinical entries addressed by [`FieldLocator`]. The graph
//! primitives here (find, create, remove, category emptiness, checkbox presence) are what the
//! typed accessors and the field registry are built on.

use serde_json::Value;
use vrx_types::YesNoUnknown;

use crate::codes;
use crate::document::{mint_address, Document, Entry, Manifest};
use crate::format::{self, Format};
use crate::locator::{FieldLocator, Subject};
use crate::wire::{
    self, Bundle, BundleEntry, ClinicalEntry, CodeableConcept, Coding, EntryKind, Identifier,
    Location, Meta, Person, Reference, Resource,
};
use crate::{FhirError, FhirResult};

// ============================================================================
// Public domain-level types
// ============================================================================

/// The event a record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Birth,
    FetalDeath,
}

impl RecordKind {
    /// LOINC code of the document type.
    pub fn type_code(self) -> &'static str {
        match self {
            RecordKind::Birth => "71230-7",
            RecordKind::FetalDeath => "69045-9",
        }
    }

    pub fn type_display(self) -> &'static str {
        match self {
            RecordKind::Birth => "Birth certificate",
            RecordKind::FetalDeath => "Fetal death report",
        }
    }

    pub fn from_type_code(code: &str) -> Option<Self> {
        match code {
            "71230-7" => Some(RecordKind::Birth),
            "69045-9" => Some(RecordKind::FetalDeath),
            _ => None,
        }
    }

    /// Short event name used in message type URIs.
    pub fn prefix(self) -> &'static str {
        match self {
            RecordKind::Birth => "bfdr",
            RecordKind::FetalDeath => "fd",
        }
    }

    fn bundle_profile(self) -> &'static str {
        match self {
            RecordKind::Birth => {
                "http://hl7.org/fhir/us/bfdr/StructureDefinition/Bundle-document-birth-report"
            }
            RecordKind::FetalDeath => {
                "http://hl7.org/fhir/us/bfdr/StructureDefinition/Bundle-document-fetal-death-report"
            }
        }
    }

    fn composition_profile(self) -> &'static str {
        match self {
            RecordKind::Birth => {
                "http://hl7.org/fhir/us/bfdr/StructureDefinition/Composition-provider-live-birth-report"
            }
            RecordKind::FetalDeath => {
                "http://hl7.org/fhir/us/bfdr/StructureDefinition/Composition-provider-fetal-death-report"
            }
        }
    }

    pub(crate) fn child_profile(self) -> &'static str {
        match self {
            RecordKind::Birth => codes::CHILD_PROFILE,
            RecordKind::FetalDeath => codes::DECEDENT_FETUS_PROFILE,
        }
    }
}

/// How to treat content the wire model does not recognise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParseMode {
    /// Unrecognised members, resource types and codes are errors.
    #[default]
    Strict,
    /// Unrecognised content is logged and dropped (unknown resource types are kept).
    Permissive,
}

/// A birth or fetal death record.
#[derive(Clone, Debug, PartialEq)]
pub struct VitalRecord {
    kind: RecordKind,
    id: String,
    meta: Option<Meta>,
    pub(crate) identifier: Identifier,
    timestamp: Option<String>,
    pub(crate) manifest: Manifest,
    pub(crate) document: Document,
}

const ADMINISTRATIVE_GENDER: [&str; 4] = ["male", "female", "other", "unknown"];

impl VitalRecord {
    /// Creates an empty record holding only the manifest and the child.
    pub fn new(kind: RecordKind) -> Self {
        let (id, _) = mint_address();
        let manifest = Manifest::new(
            CodeableConcept::from_coding(Coding::new(
                codes::LOINC,
                kind.type_code(),
                Some(kind.type_display()),
            )),
            kind.composition_profile(),
        );
        let mut record = Self {
            kind,
            id,
            meta: Some(Meta {
                profile: vec![kind.bundle_profile().to_string()],
            }),
            identifier: Identifier {
                system: Some(codes::RECORD_ID_SYSTEM.to_string()),
                ..Identifier::default()
            },
            timestamp: Some(
                chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            ),
            manifest,
            document: Document::default(),
        };
        record.person_url_or_create(Subject::Child);
        record
    }

    /// Parses a document Bundle from JSON or YAML text.
    pub fn parse(text: &str, mode: ParseMode) -> FhirResult<Self> {
        let (value, _) = format::read_any(text)?;
        Self::from_value(&value, mode)
    }

    /// Builds a record from an already parsed document Bundle value.
    pub fn from_value(value: &Value, mode: ParseMode) -> FhirResult<Self> {
        wire::expect_bundle(value, "document")?;
        let (bundle, unrecognised) = wire::read_bundle(value)?;
        tolerate(unrecognised, mode)?;
        Self::from_bundle(bundle, mode)
    }

    /// Builds a record from a typed document Bundle.
    pub fn from_bundle(bundle: Bundle, mode: ParseMode) -> FhirResult<Self> {
        let mut composition = None;
        let mut entries = Vec::with_capacity(bundle.entry.len());
        for entry in bundle.entry {
            let full_url = entry
                .full_url
                .or_else(|| resource_id(&entry.resource).map(|id| format!("urn:uuid:{id}")))
                .unwrap_or_else(|| mint_address().1);
            match entry.resource {
                Resource::Composition(c) if composition.is_none() => {
                    composition = Some((full_url, c));
                }
                resource => entries.push(Entry { full_url, resource }),
            }
        }

        let (manifest_url, composition) = composition.ok_or_else(|| {
            FhirError::InvalidInput("document has no Composition".into())
        })?;

        let type_code = composition
            .type_
            .as_ref()
            .and_then(CodeableConcept::first_code)
            .unwrap_or_default()
            .to_string();
        let kind = match RecordKind::from_type_code(&type_code) {
            Some(kind) => kind,
            None => {
                tolerate(vec![format!("Composition.type {type_code:?}")], mode)?;
                RecordKind::Birth
            }
        };

        let record = Self {
            kind,
            id: bundle.id.unwrap_or_else(|| mint_address().0),
            meta: bundle.meta,
            identifier: bundle.identifier.unwrap_or_default(),
            timestamp: bundle.timestamp,
            manifest: Manifest::from_composition(manifest_url, composition),
            document: Document::new(entries),
        };

        let bad_genders: Vec<String> = record
            .document
            .entries()
            .iter()
            .filter_map(|e| match &e.resource {
                Resource::Patient(p) | Resource::RelatedPerson(p) => p.gender.as_deref(),
                _ => None,
            })
            .filter(|g| !ADMINISTRATIVE_GENDER.contains(g))
            .map(|g| format!("gender {g:?}"))
            .collect();
        tolerate(bad_genders, mode)?;

        Ok(record)
    }

    // ------------------------------------------------------------------------
    // Serialisation
    // ------------------------------------------------------------------------

    /// The record as a document Bundle, manifest first.
    pub fn to_bundle(&self) -> Bundle {
        let mut entry = Vec::with_capacity(self.document.len() + 1);
        entry.push(BundleEntry {
            full_url: Some(self.manifest.full_url().to_string()),
            resource: Resource::Composition(self.manifest.composition().clone()),
        });
        entry.extend(self.document.entries().iter().map(|e| BundleEntry {
            full_url: Some(e.full_url.clone()),
            resource: e.resource.clone(),
        }));
        Bundle {
            id: Some(self.id.clone()),
            meta: self.meta.clone(),
            identifier: Some(self.identifier.clone()),
            bundle_type: "document".to_string(),
            timestamp: self.timestamp.clone(),
            entry,
        }
    }

    pub fn to_value(&self) -> FhirResult<Value> {
        wire::bundle_value(&self.to_bundle())
    }

    pub fn render(&self, format: Format) -> FhirResult<String> {
        format.write(&self.to_value()?)
    }

    pub fn to_json(&self) -> FhirResult<String> {
        self.render(Format::Json)
    }

    pub fn to_yaml(&self) -> FhirResult<String> {
        self.render(Format::Yaml)
    }

    // ------------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------------

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    // ------------------------------------------------------------------------
    // People and place
    // ------------------------------------------------------------------------

    fn person_profile(&self, role: Subject) -> &'static str {
        match role {
            Subject::Child => self.kind.child_profile(),
            Subject::Mother => codes::MOTHER_PROFILE,
            Subject::Father => codes::FATHER_PROFILE,
        }
    }

    fn person_index(&self, role: Subject) -> Option<usize> {
        let profile = self.person_profile(role);
        let by_profile = self.document.entries().iter().position(|e| match (&e.resource, role) {
            (Resource::RelatedPerson(p), Subject::Father) => p.has_profile(profile),
            (Resource::Patient(p), Subject::Child | Subject::Mother) => p.has_profile(profile),
            _ => false,
        });
        if by_profile.is_some() || role != Subject::Child {
            return by_profile;
        }
        // A child without the profile is still the composition subject.
        let subject = self.manifest.composition().subject.as_ref()?.reference.as_deref()?;
        self.document
            .position(subject)
            .filter(|&idx| matches!(self.document.entries()[idx].resource, Resource::Patient(_)))
    }

    /// Full URL of the entry for `role`, if the record has one.
    pub fn person_url(&self, role: Subject) -> Option<&str> {
        self.person_index(role)
            .map(|idx| self.document.entries()[idx].full_url.as_str())
    }

    pub fn person(&self, role: Subject) -> Option<&Person> {
        let idx = self.person_index(role)?;
        match &self.document.entries()[idx].resource {
            Resource::Patient(p) | Resource::RelatedPerson(p) => Some(p),
            _ => None,
        }
    }

    /// The entry for `role`, created if the record has none.
    pub(crate) fn person_mut(&mut self, role: Subject) -> &mut Person {
        let idx = self.person_index_or_create(role);
        match &mut self.document.entries_mut()[idx].resource {
            Resource::Patient(p) | Resource::RelatedPerson(p) => p,
            _ => unreachable!("person index points at a person entry"),
        }
    }

    fn person_url_or_create(&mut self, role: Subject) -> String {
        let idx = self.person_index_or_create(role);
        self.document.entries()[idx].full_url.clone()
    }

    fn person_index_or_create(&mut self, role: Subject) -> usize {
        if let Some(idx) = self.person_index(role) {
            return idx;
        }
        let (id, full_url) = mint_address();
        let mut person = Person {
            id: Some(id),
            meta: Some(Meta {
                profile: vec![self.person_profile(role).to_string()],
            }),
            ..Person::default()
        };
        let resource = match role {
            Subject::Child => {
                self.manifest.composition_mut().subject = Some(Reference::to(&full_url));
                Resource::Patient(person)
            }
            Subject::Mother => Resource::Patient(person),
            Subject::Father => {
                person.relationship = vec![CodeableConcept::from_coding(Coding::new(
                    codes::ROLE_CODE,
                    "NFTH",
                    Some("natural father"),
                ))];
                person.patient = self.person_url(Subject::Child).map(Reference::to);
                Resource::RelatedPerson(person)
            }
        };
        self.document.push(Entry { full_url, resource })
    }

    fn location_index(&self) -> Option<usize> {
        self.document.entries().iter().position(|e| match &e.resource {
            Resource::Location(l) => l
                .meta
                .as_ref()
                .is_some_and(|m| m.profile.iter().any(|p| p == codes::EVENT_LOCATION_PROFILE)),
            _ => false,
        })
    }

    /// The place of the event, if recorded.
    pub fn event_location(&self) -> Option<&Location> {
        match &self.document.entries()[self.location_index()?].resource {
            Resource::Location(l) => Some(l),
            _ => None,
        }
    }

    pub(crate) fn event_location_mut(&mut self) -> &mut Location {
        let idx = match self.location_index() {
            Some(idx) => idx,
            None => {
                let (id, full_url) = mint_address();
                let location = Location {
                    id: Some(id),
                    meta: Some(Meta {
                        profile: vec![codes::EVENT_LOCATION_PROFILE.to_string()],
                    }),
                    ..Location::default()
                };
                self.document.push(Entry {
                    full_url,
                    resource: Resource::Location(location),
                })
            }
        };
        match &mut self.document.entries_mut()[idx].resource {
            Resource::Location(l) => l,
            _ => unreachable!("location index points at a location entry"),
        }
    }

    // ------------------------------------------------------------------------
    // Clinical entries
    // ------------------------------------------------------------------------

    fn entry_index(&self, locator: &FieldLocator) -> Option<usize> {
        let subject = self.person_url(locator.subject);
        self.document.entries().iter().position(|e| {
            e.resource
                .as_clinical()
                .is_some_and(|(kind, entry)| locator.matches(kind, entry, subject))
        })
    }

    /// The entry `locator` names, if present.
    pub fn find_entry(&self, locator: &FieldLocator) -> Option<&ClinicalEntry> {
        let idx = self.entry_index(locator)?;
        self.document.entries()[idx]
            .resource
            .as_clinical()
            .map(|(_, entry)| entry)
    }

    pub fn entry_exists(&self, locator: &FieldLocator) -> bool {
        self.entry_index(locator).is_some()
    }

    /// True if no entry carries `category`.
    pub fn is_category_empty(&self, category: &str) -> bool {
        !self.document.entries().iter().any(|e| {
            e.resource
                .as_clinical()
                .is_some_and(|(_, entry)| entry.has_category(category))
        })
    }

    /// Returns the entry `locator` names, creating it (and its subject) if absent.
    ///
    /// Creating a category marker ("none of the above", "unknown") first removes every other
    /// entry in its category; creating a specific finding first removes the markers.
    pub fn get_or_create_entry(&mut self, locator: &FieldLocator) -> &mut ClinicalEntry {
        let idx = match self.entry_index(locator) {
            Some(idx) => idx,
            None => self.create_entry(locator),
        };
        clinical_at(&mut self.document, idx)
    }

    fn create_entry(&mut self, locator: &FieldLocator) -> usize {
        if let Some(category) = locator.category {
            let marker = locator.is_exclusive_marker();
            let doomed: Vec<String> = self
                .document
                .entries()
                .iter()
                .filter(|e| {
                    e.resource.as_clinical().is_some_and(|(_, entry)| {
                        entry.has_category(category)
                            && (marker
                                || entry
                                    .identifying_code()
                                    .and_then(CodeableConcept::first_code)
                                    .is_some_and(codes::is_exclusive_marker))
                    })
                })
                .map(|e| e.full_url.clone())
                .collect();
            for url in doomed {
                tracing::debug!(entry = %url, category, "removing mutually exclusive entry");
                self.remove_at(&url);
            }
        }

        let subject = self.person_url_or_create(locator.subject);
        let (id, full_url) = mint_address();
        let code = CodeableConcept::from_coding(Coding::new(
            locator.system,
            locator.code,
            Some(locator.display),
        ));
        let mut entry = ClinicalEntry {
            id: Some(id),
            category: locator
                .category
                .map(|c| {
                    vec![CodeableConcept::from_coding(Coding::new(
                        codes::VR_CATEGORIES,
                        c,
                        None,
                    ))]
                })
                .unwrap_or_default(),
            ..ClinicalEntry::default()
        };
        match locator.kind {
            EntryKind::Coverage => {
                entry.type_ = Some(code);
                entry.beneficiary = Some(Reference::to(&subject));
            }
            EntryKind::Observation => {
                entry.status = Some("final".to_string());
                entry.code = Some(code);
                entry.subject = Some(Reference::to(&subject));
            }
            EntryKind::Condition | EntryKind::Procedure => {
                entry.code = Some(code);
                entry.subject = Some(Reference::to(&subject));
            }
        }

        self.manifest.add_reference(locator.section, &full_url);
        self.document.push(Entry {
            full_url,
            resource: Resource::Clinical(locator.kind, entry),
        })
    }

    /// Removes every entry `locator` names and their manifest references. Returns whether any
    /// were removed.
    pub fn remove_entry(&mut self, locator: &FieldLocator) -> bool {
        let subject = self.person_url(locator.subject);
        let doomed: Vec<String> = self
            .document
            .entries()
            .iter()
            .filter(|e| {
                e.resource
                    .as_clinical()
                    .is_some_and(|(kind, entry)| locator.matches(kind, entry, subject))
            })
            .map(|e| e.full_url.clone())
            .collect();
        for url in &doomed {
            self.remove_at(url);
        }
        !doomed.is_empty()
    }

    fn remove_at(&mut self, url: &str) {
        self.document.remove(url);
        self.manifest.remove_reference(url);
    }

    /// Applies `update` to the entry `locator` names, creating it if absent.
    pub fn update_entry(&mut self, locator: &FieldLocator, update: impl FnOnce(&mut ClinicalEntry)) {
        update(self.get_or_create_entry(locator));
    }

    /// Makes a presence-only entry exist or not, without touching its value.
    pub fn set_entry_exists(&mut self, locator: &FieldLocator, exists: bool) {
        if !exists {
            self.remove_entry(locator);
        } else if !self.entry_exists(locator) {
            self.get_or_create_entry(locator);
        }
    }

    // ------------------------------------------------------------------------
    // Checkbox presence
    // ------------------------------------------------------------------------

    /// Reads a checkbox: yes if the finding is recorded, unknown if nothing in its category is
    /// recorded, otherwise no.
    pub fn presence(&self, detail: &FieldLocator) -> YesNoUnknown {
        if self.entry_exists(detail) {
            YesNoUnknown::Yes
        } else if detail.category.is_none_or(|c| self.is_category_empty(c)) {
            YesNoUnknown::Unknown
        } else {
            YesNoUnknown::No
        }
    }

    /// Writes a checkbox.
    ///
    /// `No` records the category's "none of the above" marker when nothing else in the
    /// category remains, so the answer survives a read back.
    pub fn set_presence(&mut self, detail: &FieldLocator, none: &FieldLocator, value: YesNoUnknown) {
        match value {
            YesNoUnknown::Yes => {
                self.get_or_create_entry(detail);
            }
            YesNoUnknown::No => {
                self.remove_entry(detail);
                if detail.category.is_some_and(|c| self.is_category_empty(c)) {
                    self.get_or_create_entry(none);
                }
            }
            YesNoUnknown::Unknown => {
                self.remove_entry(detail);
            }
        }
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn clinical_at(document: &mut Document, idx: usize) -> &mut ClinicalEntry {
    match &mut document.entries_mut()[idx].resource {
        Resource::Clinical(_, entry) => entry,
        _ => unreachable!("entry index points at a clinical entry"),
    }
}

fn resource_id(resource: &Resource) -> Option<&str> {
    match resource {
        Resource::Composition(c) => c.id.as_deref(),
        Resource::Patient(p) | Resource::RelatedPerson(p) => p.id.as_deref(),
        Resource::Location(l) => l.id.as_deref(),
        Resource::Clinical(_, e) => e.id.as_deref(),
        _ => None,
    }
}

/// Fails in strict mode if anything was unrecognised; logs it in permissive mode.
pub fn tolerate(unrecognised: Vec<String>, mode: ParseMode) -> FhirResult<()> {
    if unrecognised.is_empty() {
        return Ok(());
    }
    match mode {
        ParseMode::Strict => Err(FhirError::UnknownMembers(unrecognised)),
        ParseMode::Permissive => {
            for path in &unrecognised {
                tracing::warn!(path = %path, "ignoring unrecognised content");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{
        ANENCEPHALY, CLEFT_LIP, GESTATIONAL_DIABETES, NO_CONGENITAL_ANOMALIES, NO_RISK_FACTORS,
        PREPREGNANCY_DIABETES,
    };
    use crate::Section;

    #[test]
    fn new_record_has_child_subject() {
        let record = VitalRecord::new(RecordKind::Birth);
        let child = record.person_url(Subject::Child).expect("child created");
        assert!(record
            .manifest()
            .composition()
            .subject
            .as_ref()
            .is_some_and(|r| r.points_to(child)));
        assert!(record.person(Subject::Mother).is_none());
    }

    #[test]
    fn created_entries_are_listed_in_their_section() {
        let mut record = VitalRecord::new(RecordKind::Birth);
        record.get_or_create_entry(&GESTATIONAL_DIABETES);

        let mother = record.person_url(Subject::Mother).expect("mother created").to_string();
        let refs = record.manifest().references(Section::MedicalInformation);
        assert_eq!(refs.len(), 1);
        let entry = record.find_entry(&GESTATIONAL_DIABETES).expect("found");
        assert!(entry.subject.as_ref().is_some_and(|r| r.points_to(&mother)));

        assert!(record.remove_entry(&GESTATIONAL_DIABETES));
        assert!(record.manifest().references(Section::MedicalInformation).is_empty());
        assert!(!record.remove_entry(&GESTATIONAL_DIABETES));
    }

    #[test]
    fn none_marker_and_findings_are_mutually_exclusive() {
        let mut record = VitalRecord::new(RecordKind::Birth);
        record.get_or_create_entry(&GESTATIONAL_DIABETES);
        record.get_or_create_entry(&PREPREGNANCY_DIABETES);

        record.get_or_create_entry(&NO_RISK_FACTORS);
        assert!(!record.entry_exists(&GESTATIONAL_DIABETES));
        assert!(!record.entry_exists(&PREPREGNANCY_DIABETES));
        assert!(record.entry_exists(&NO_RISK_FACTORS));

        record.get_or_create_entry(&GESTATIONAL_DIABETES);
        assert!(!record.entry_exists(&NO_RISK_FACTORS));
        assert!(record.entry_exists(&GESTATIONAL_DIABETES));
    }

    #[test]
    fn removal_takes_every_matching_entry() {
        let mut record = VitalRecord::new(RecordKind::Birth);
        record.create_entry(&GESTATIONAL_DIABETES);
        record.create_entry(&GESTATIONAL_DIABETES);
        assert_eq!(record.manifest().references(Section::MedicalInformation).len(), 2);

        assert!(record.remove_entry(&GESTATIONAL_DIABETES));
        assert!(record.find_entry(&GESTATIONAL_DIABETES).is_none());
        assert!(record.manifest().references(Section::MedicalInformation).is_empty());
        assert!(!record.remove_entry(&GESTATIONAL_DIABETES));
    }

    #[test]
    fn presence_only_entries_follow_the_flag() {
        let mut record = VitalRecord::new(RecordKind::Birth);
        record.set_entry_exists(&CLEFT_LIP, true);
        record.set_entry_exists(&CLEFT_LIP, true);
        assert_eq!(record.manifest().references(Section::NewbornInformation).len(), 1);

        record.set_entry_exists(&CLEFT_LIP, false);
        assert!(!record.entry_exists(&CLEFT_LIP));
        assert!(record.manifest().references(Section::NewbornInformation).is_empty());
    }

    #[test]
    fn presence_reads_no_only_when_category_has_content() {
        let mut record = VitalRecord::new(RecordKind::Birth);
        assert_eq!(record.presence(&ANENCEPHALY), YesNoUnknown::Unknown);

        record.set_presence(&ANENCEPHALY, &NO_CONGENITAL_ANOMALIES, YesNoUnknown::No);
        assert!(record.entry_exists(&NO_CONGENITAL_ANOMALIES));
        assert_eq!(record.presence(&ANENCEPHALY), YesNoUnknown::No);
        assert_eq!(record.presence(&CLEFT_LIP), YesNoUnknown::No);

        record.set_presence(&CLEFT_LIP, &NO_CONGENITAL_ANOMALIES, YesNoUnknown::Yes);
        assert_eq!(record.presence(&CLEFT_LIP), YesNoUnknown::Yes);
        assert_eq!(record.presence(&ANENCEPHALY), YesNoUnknown::No);

        record.set_presence(&CLEFT_LIP, &NO_CONGENITAL_ANOMALIES, YesNoUnknown::Unknown);
        assert_eq!(record.presence(&CLEFT_LIP), YesNoUnknown::Unknown);
        assert_eq!(record.presence(&ANENCEPHALY), YesNoUnknown::Unknown);
    }

    #[test]
    fn json_round_trip_preserves_the_graph() {
        let mut record = VitalRecord::new(RecordKind::FetalDeath);
        record.get_or_create_entry(&GESTATIONAL_DIABETES);

        let text = record.to_json().expect("render");
        let parsed = VitalRecord::parse(&text, ParseMode::Strict).expect("parse");
        assert_eq!(parsed, record);
        assert_eq!(parsed.kind(), RecordKind::FetalDeath);
    }

    #[test]
    fn yaml_round_trip_preserves_the_graph() {
        let mut record = VitalRecord::new(RecordKind::Birth);
        record.get_or_create_entry(&ANENCEPHALY);

        let text = record.to_yaml().expect("render");
        let parsed = VitalRecord::parse(&text, ParseMode::Strict).expect("parse");
        assert_eq!(parsed, record);
    }

    #[test]
    fn strict_parse_rejects_unknown_members_and_permissive_drops_them() {
        let record = VitalRecord::new(RecordKind::Birth);
        let mut value = record.to_value().expect("value");
        value["entry"][1]["resource"]["favouriteColour"] = Value::String("green".into());
        let text = serde_json::to_string(&value).expect("text");

        let err = VitalRecord::parse(&text, ParseMode::Strict).expect_err("strict");
        match err {
            FhirError::UnknownMembers(paths) => {
                assert_eq!(paths, vec!["entry[1].resource.favouriteColour".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let parsed = VitalRecord::parse(&text, ParseMode::Permissive).expect("permissive");
        assert_eq!(parsed, record);
    }

    #[test]
    fn message_bundle_is_not_a_record() {
        let text = r#"{"resourceType":"Bundle","type":"message","entry":[]}"#;
        let err = VitalRecord::parse(text, ParseMode::Permissive).expect_err("not a document");
        assert!(matches!(err, FhirError::WrongDocumentType { .. }));
    }

    #[test]
    fn unknown_gender_is_only_tolerated_when_permissive() {
        let mut record = VitalRecord::new(RecordKind::Birth);
        record.person_mut(Subject::Child).gender = Some("mystery".into());
        let text = record.to_json().expect("render");

        assert!(matches!(
            VitalRecord::parse(&text, ParseMode::Strict),
            Err(FhirError::UnknownMembers(_))
        ));
        assert!(VitalRecord::parse(&text, ParseMode::Permissive).is_ok());
    }

    #[test]
    fn xml_is_unsupported() {
        let err = VitalRecord::parse("<Bundle/>", ParseMode::Permissive).expect_err("xml");
        assert!(matches!(err, FhirError::UnsupportedFormat(_)));
    }
}
