//! Typed accessors on [`VitalRecord`].
//!
//! Each accessor translates between a domain value and the place it lives in the graph:
//! identifiers on the Bundle, names and birth dates on the people, the event address on the
//! Location, everything else on clinical entries found through a locator.

use chrono::NaiveTime;
use vrx_types::Component;

use crate::address::{self, keys, AddressMap};
use crate::codes;
use crate::locator::{self, FieldLocator, Subject};
use crate::partial_date::{DatePart, PartialDateTime};
use crate::record::VitalRecord;
use crate::wire::{
    CodeableConcept, Coding, Element, Extension, HumanName, Identifier, ObservationComponent,
    Quantity,
};
use crate::{FhirError, FhirResult};

/// A partial date held by the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DateField {
    ChildBirth,
    MotherBirth,
    FatherBirth,
    LastMenses,
    FirstPrenatalCare,
}

impl DateField {
    fn person(self) -> Option<Subject> {
        match self {
            DateField::ChildBirth => Some(Subject::Child),
            DateField::MotherBirth => Some(Subject::Mother),
            DateField::FatherBirth => Some(Subject::Father),
            DateField::LastMenses | DateField::FirstPrenatalCare => None,
        }
    }

    fn locator(self) -> Option<&'static FieldLocator> {
        match self {
            DateField::LastMenses => Some(&locator::LAST_MENSES),
            DateField::FirstPrenatalCare => Some(&locator::FIRST_PRENATAL_CARE),
            _ => None,
        }
    }

    /// True if a missing entry means "not applicable" rather than "not yet specified".
    pub fn absence_is_meaningful(self) -> bool {
        self == DateField::FirstPrenatalCare
    }
}

/// A component of a person's name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NamePart {
    First,
    Middle,
    Last,
    Suffix,
    Maiden,
}

const OFFICIAL: &str = "official";
const MAIDEN: &str = "maiden";
const MEDICAL_RECORD: &str = "MR";

impl VitalRecord {
    // ------------------------------------------------------------------------
    // Identifiers
    // ------------------------------------------------------------------------

    fn identifier_extension(&self, url: &str) -> Option<String> {
        self.identifier
            .extension
            .iter()
            .find(|x| x.url == url)
            .and_then(|x| x.value_string.clone())
    }

    fn set_identifier_extension(&mut self, url: &str, value: Option<&str>) {
        self.identifier.extension.retain(|x| x.url != url);
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            let mut ext = Extension::new(url);
            ext.value_string = Some(value.to_string());
            self.identifier.extension.push(ext);
        }
        self.refresh_record_identifier();
    }

    pub fn certificate_number(&self) -> Option<String> {
        self.identifier_extension(codes::CERTIFICATE_NUMBER_URL)
    }

    pub fn set_certificate_number(&mut self, value: Option<&str>) {
        self.set_identifier_extension(codes::CERTIFICATE_NUMBER_URL, value);
    }

    pub fn auxiliary_state_identifier(&self) -> Option<String> {
        self.identifier_extension(codes::AUXILIARY_STATE_ID_URL)
    }

    pub fn set_auxiliary_state_identifier(&mut self, value: Option<&str>) {
        self.set_identifier_extension(codes::AUXILIARY_STATE_ID_URL, value);
    }

    /// Two-letter jurisdiction of the event, taken from the place of birth.
    pub fn jurisdiction_id(&self) -> Option<String> {
        self.place_of_birth().remove(keys::STATE)
    }

    pub fn set_jurisdiction_id(&mut self, value: Option<&str>) {
        let mut place = self.place_of_birth();
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(state) => place.insert(keys::STATE.to_string(), state.to_string()),
            None => place.remove(keys::STATE),
        };
        self.set_place_of_birth(&place);
    }

    /// Year of the event, when known.
    pub fn event_year(&self) -> Option<u32> {
        self.partial_date(DateField::ChildBirth).year.known()
    }

    /// Composite `YYYYJJNNNNNN` identifier, present once a certificate number is set.
    pub fn record_identifier(&self) -> Option<&str> {
        self.identifier.value.as_deref()
    }

    pub(crate) fn refresh_record_identifier(&mut self) {
        let Some(number) = self.certificate_number() else {
            self.identifier.value = None;
            return;
        };
        let year = self
            .event_year()
            .map_or_else(|| "0000".to_string(), |y| format!("{y:04}"));
        let jurisdiction = self.jurisdiction_id().unwrap_or_else(|| "XX".to_string());
        let digits: String = number.chars().filter(char::is_ascii_digit).collect();
        let tail = &digits[digits.len().saturating_sub(6)..];
        self.identifier.value = Some(format!("{year}{jurisdiction}{tail:0>6}"));
    }

    // ------------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------------

    pub fn name(&self, role: Subject, part: NamePart) -> Option<String> {
        let person = self.person(role)?;
        let wanted = if part == NamePart::Maiden { MAIDEN } else { OFFICIAL };
        let name = person
            .name
            .iter()
            .find(|n| n.use_.as_deref() == Some(wanted))
            .or_else(|| {
                (part != NamePart::Maiden)
                    .then(|| person.name.iter().find(|n| n.use_.as_deref() != Some(MAIDEN)))
                    .flatten()
            })?;
        let value = match part {
            NamePart::First => name.given.first(),
            NamePart::Middle => name.given.get(1),
            NamePart::Last | NamePart::Maiden => name.family.as_ref(),
            NamePart::Suffix => name.suffix.first(),
        };
        value.filter(|v| !v.is_empty()).cloned()
    }

    pub fn set_name(&mut self, role: Subject, part: NamePart, value: Option<&str>) {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        if value.is_none() && self.person(role).is_none() {
            return;
        }
        let person = self.person_mut(role);
        let wanted = if part == NamePart::Maiden { MAIDEN } else { OFFICIAL };
        let idx = match person
            .name
            .iter()
            .position(|n| n.use_.as_deref() == Some(wanted))
        {
            Some(idx) => idx,
            None => {
                person.name.push(HumanName {
                    use_: Some(wanted.to_string()),
                    ..HumanName::default()
                });
                person.name.len() - 1
            }
        };
        let name = &mut person.name[idx];
        match part {
            NamePart::First => set_position(&mut name.given, 0, value),
            NamePart::Middle => set_position(&mut name.given, 1, value),
            NamePart::Last | NamePart::Maiden => name.family = value.map(str::to_string),
            NamePart::Suffix => set_position(&mut name.suffix, 0, value),
        }
        if name.family.is_none() && name.given.is_empty() && name.suffix.is_empty() {
            person.name.remove(idx);
        }
    }

    // ------------------------------------------------------------------------
    // Dates
    // ------------------------------------------------------------------------

    pub fn partial_date(&self, field: DateField) -> PartialDateTime {
        if let Some(role) = field.person() {
            return self
                .person(role)
                .map(|p| {
                    PartialDateTime::read(p.birth_date.as_deref(), p.birth_date_element.as_ref())
                })
                .unwrap_or_default();
        }
        field
            .locator()
            .and_then(|loc| self.find_entry(loc))
            .map(|e| {
                PartialDateTime::read(
                    e.value_date_time.as_deref(),
                    e.value_date_time_element.as_ref(),
                )
            })
            .unwrap_or_default()
    }

    /// True if the record holds the entry a date lives on.
    pub fn has_date_entry(&self, field: DateField) -> bool {
        match (field.person(), field.locator()) {
            (Some(role), _) => self.person(role).is_some(),
            (None, Some(loc)) => self.entry_exists(loc),
            (None, None) => false,
        }
    }

    /// Replaces a partial date after checking its components.
    ///
    /// Setting a parent's date of birth clears that parent's age bypass edit flag.
    pub fn set_partial_date(&mut self, field: DateField, value: PartialDateTime) -> FhirResult<()> {
        validate_part(DatePart::Year, value.year)?;
        validate_part(DatePart::Month, value.month)?;
        validate_part(DatePart::Day, value.day)?;

        match (field.person(), field.locator()) {
            (Some(role), _) => {
                if value.is_unset() && self.person(role).is_none() {
                    return Ok(());
                }
                let person = self.person_mut(role);
                value.write(&mut person.birth_date, &mut person.birth_date_element);
                if matches!(role, Subject::Mother | Subject::Father) {
                    self.set_edit_flag(role, None);
                }
            }
            (None, Some(loc)) => {
                if value.is_unset() && !field.absence_is_meaningful() {
                    self.remove_entry(loc);
                } else {
                    self.update_entry(loc, |e| {
                        value.write(&mut e.value_date_time, &mut e.value_date_time_element);
                    });
                }
            }
            (None, None) => {}
        }

        if field == DateField::ChildBirth {
            self.refresh_record_identifier();
        }
        Ok(())
    }

    /// Sets one numeric component of a date, leaving the others untouched.
    pub fn set_date_part(
        &mut self,
        field: DateField,
        part: DatePart,
        value: Component<u32>,
    ) -> FhirResult<()> {
        let mut date = self.partial_date(field);
        date.set_part(part, value);
        self.set_partial_date(field, date)
    }

    /// Removes the entry a date lives on, recording that it does not apply.
    pub fn clear_date_entry(&mut self, field: DateField) {
        if let Some(loc) = field.locator() {
            self.remove_entry(loc);
        }
    }

    pub fn birth_time(&self) -> Component<NaiveTime> {
        self.partial_date(DateField::ChildBirth).time
    }

    pub fn set_birth_time(&mut self, value: Component<NaiveTime>) -> FhirResult<()> {
        let mut date = self.partial_date(DateField::ChildBirth);
        date.time = value;
        self.set_partial_date(DateField::ChildBirth, date)
    }

    // ------------------------------------------------------------------------
    // Coded person and place attributes
    // ------------------------------------------------------------------------

    /// Administrative sex of the child (`male`, `female`, `unknown`).
    pub fn birth_sex(&self) -> Option<String> {
        self.person(Subject::Child)?.gender.clone()
    }

    pub fn set_birth_sex(&mut self, value: Option<&str>) {
        self.person_mut(Subject::Child).gender = value.map(str::to_string);
    }

    /// SNOMED code for the kind of place the event happened.
    pub fn birth_place_type(&self) -> Option<String> {
        self.event_location()?
            .type_
            .iter()
            .find_map(CodeableConcept::first_code)
            .map(str::to_string)
    }

    pub fn set_birth_place_type(&mut self, value: Option<&str>) {
        if value.is_none() && self.event_location().is_none() {
            return;
        }
        let location = self.event_location_mut();
        location.type_ = value
            .map(|code| {
                let system = if codes::is_exclusive_marker(code) || code == "OTH" {
                    codes::NULL_FLAVOR
                } else {
                    codes::SNOMED
                };
                vec![CodeableConcept::from_coding(Coding::new(system, code, None))]
            })
            .unwrap_or_default();
    }

    pub fn facility_name(&self) -> Option<String> {
        self.event_location()?.name.clone()
    }

    pub fn set_facility_name(&mut self, value: Option<&str>) {
        if value.is_none() && self.event_location().is_none() {
            return;
        }
        self.event_location_mut().name = value.map(str::to_string);
    }

    pub fn mother_medical_record_number(&self) -> Option<String> {
        self.person(Subject::Mother)?
            .identifier
            .iter()
            .find(|i| {
                i.type_
                    .as_ref()
                    .is_some_and(|t| t.has_code(Some(codes::IDENTIFIER_TYPE), MEDICAL_RECORD))
            })
            .and_then(|i| i.value.clone())
    }

    pub fn set_mother_medical_record_number(&mut self, value: Option<&str>) {
        if value.is_none() && self.person(Subject::Mother).is_none() {
            return;
        }
        let mother = self.person_mut(Subject::Mother);
        mother.identifier.retain(|i| {
            !i.type_
                .as_ref()
                .is_some_and(|t| t.has_code(Some(codes::IDENTIFIER_TYPE), MEDICAL_RECORD))
        });
        if let Some(value) = value {
            mother.identifier.push(Identifier {
                type_: Some(CodeableConcept::from_coding(Coding::new(
                    codes::IDENTIFIER_TYPE,
                    MEDICAL_RECORD,
                    Some("Medical record number"),
                ))),
                value: Some(value.to_string()),
                ..Identifier::default()
            });
        }
    }

    /// Age bypass edit flag on a parent's date of birth.
    pub fn edit_flag(&self, role: Subject) -> Option<String> {
        self.person(role)?
            .birth_date_element
            .as_ref()?
            .extension
            .iter()
            .find(|x| x.url == codes::BYPASS_EDIT_FLAG_URL)
            .and_then(|x| x.value_codeable_concept.as_ref())
            .and_then(CodeableConcept::first_code)
            .map(str::to_string)
    }

    pub fn set_edit_flag(&mut self, role: Subject, value: Option<&str>) {
        if value.is_none() && self.person(role).is_none() {
            return;
        }
        let person = self.person_mut(role);
        let mut extensions = person
            .birth_date_element
            .take()
            .map(|e| e.extension)
            .unwrap_or_default();
        extensions.retain(|x| x.url != codes::BYPASS_EDIT_FLAG_URL);
        if let Some(code) = value {
            let mut ext = Extension::new(codes::BYPASS_EDIT_FLAG_URL);
            ext.value_codeable_concept = Some(CodeableConcept::from_coding(Coding::new(
                codes::VR_EDIT_FLAGS,
                code,
                None,
            )));
            extensions.push(ext);
        }
        person.birth_date_element = (!extensions.is_empty()).then_some(Element {
            extension: extensions,
        });
    }

    // ------------------------------------------------------------------------
    // Addresses
    // ------------------------------------------------------------------------

    pub fn place_of_birth(&self) -> AddressMap {
        self.event_location()
            .and_then(|l| l.address.as_ref())
            .map(address::to_map)
            .unwrap_or_default()
    }

    pub fn set_place_of_birth(&mut self, value: &AddressMap) {
        let wire = (!value.is_empty()).then(|| address::from_map(value));
        if wire.is_some() || self.event_location().is_some() {
            self.event_location_mut().address = wire;
        }
        self.refresh_record_identifier();
    }

    pub fn mother_residence(&self) -> AddressMap {
        self.person(Subject::Mother)
            .and_then(|p| p.address.first())
            .map(address::to_map)
            .unwrap_or_default()
    }

    pub fn set_mother_residence(&mut self, value: &AddressMap) {
        if value.is_empty() && self.person(Subject::Mother).is_none() {
            return;
        }
        let mother = self.person_mut(Subject::Mother);
        mother.address = if value.is_empty() {
            Vec::new()
        } else {
            vec![address::from_map(value)]
        };
    }

    // ------------------------------------------------------------------------
    // Values on clinical entries
    // ------------------------------------------------------------------------

    /// Reads a count or measurement. A missing entry reads as unset.
    pub fn number(&self, locator: &FieldLocator) -> Component<u32> {
        let Some(entry) = self.find_entry(locator) else {
            return Component::Unset;
        };
        if let Some(v) = entry
            .value_integer
            .or_else(|| {
                entry
                    .value_quantity
                    .as_ref()
                    .and_then(|q| q.value)
                    .map(|v| v.round() as i64)
            })
        {
            return u32::try_from(v).map_or(Component::Unset, Component::Known);
        }
        if entry.data_absent_reason.is_some() {
            return Component::Unknown;
        }
        Component::Unset
    }

    /// Writes a count or measurement, with `unit` as a UCUM code when the value is a quantity.
    ///
    /// Unset removes the entry unless `keep_empty` is set.
    pub fn set_number(
        &mut self,
        locator: &FieldLocator,
        unit: Option<&str>,
        value: Component<u32>,
        keep_empty: bool,
    ) {
        if value.is_unset() && !keep_empty {
            self.remove_entry(locator);
            return;
        }
        self.update_entry(locator, |e| {
            e.clear_value();
            match value {
                Component::Known(v) => match unit {
                    Some(unit) => {
                        e.value_quantity = Some(Quantity {
                            value: Some(f64::from(v)),
                            unit: Some(unit.to_string()),
                            system: Some(codes::UCUM.to_string()),
                            code: Some(unit.to_string()),
                        })
                    }
                    None => e.value_integer = Some(i64::from(v)),
                },
                Component::Unknown => {
                    e.data_absent_reason = Some(CodeableConcept::from_coding(Coding::new(
                        codes::DATA_ABSENT_REASON_SYSTEM,
                        "unknown",
                        Some("Unknown"),
                    )));
                }
                Component::Unset => {}
            }
        });
    }

    /// Reads a coded value, from the named component when the locator has one.
    pub fn code(&self, locator: &FieldLocator) -> Option<String> {
        let entry = self.find_entry(locator)?;
        let concept = match locator.component {
            Some(component) => entry
                .component
                .iter()
                .find(|c| c.code.has_code(None, component))?
                .value_codeable_concept
                .as_ref(),
            None => entry.value_codeable_concept.as_ref(),
        };
        concept?.first_code().map(str::to_string)
    }

    /// Writes a coded value. Clearing the last value on an entry removes the entry.
    pub fn set_code(&mut self, locator: &FieldLocator, system: &str, value: Option<&str>) {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        let concept = |code: &str| {
            let system = if codes::is_exclusive_marker(code) {
                codes::NULL_FLAVOR
            } else {
                system
            };
            CodeableConcept::from_coding(Coding::new(system, code, None))
        };

        match (locator.component, value) {
            (None, Some(code)) => {
                self.update_entry(locator, |e| e.value_codeable_concept = Some(concept(code)));
            }
            (Some(component), Some(code)) => {
                self.update_entry(locator, |e| {
                    e.component.retain(|c| !c.code.has_code(None, component));
                    e.component.push(ObservationComponent {
                        code: CodeableConcept::from_coding(Coding::new(
                            codes::VR_OBSERVATION_CODES,
                            component,
                            None,
                        )),
                        value_codeable_concept: Some(concept(code)),
                        ..ObservationComponent::default()
                    });
                });
            }
            (component, None) => {
                if !self.entry_exists(locator) {
                    return;
                }
                let now_empty = {
                    let e = self.get_or_create_entry(locator);
                    match component {
                        Some(component) => {
                            e.component.retain(|c| !c.code.has_code(None, component))
                        }
                        None => e.value_codeable_concept = None,
                    }
                    e.value_codeable_concept.is_none() && e.component.is_empty()
                };
                if now_empty {
                    self.remove_entry(locator);
                }
            }
        }
    }
}

fn validate_part(part: DatePart, value: Component<u32>) -> FhirResult<()> {
    let Component::Known(v) = value else {
        return Ok(());
    };
    let (name, range) = match part {
        DatePart::Year => ("year", 1000..=9999),
        DatePart::Month => ("month", 1..=12),
        DatePart::Day => ("day", 1..=31),
    };
    if range.contains(&v) {
        Ok(())
    } else {
        Err(FhirError::BusinessRule(format!(
            "{name} {v} is outside {}..={}",
            range.start(),
            range.end()
        )))
    }
}

fn set_position(values: &mut Vec<String>, idx: usize, value: Option<&str>) {
    match value {
        Some(value) => {
            if values.len() <= idx {
                values.resize(idx + 1, String::new());
            }
            values[idx] = value.to_string();
        }
        None if idx < values.len() => values[idx].clear(),
        None => {}
    }
    while values.last().is_some_and(String::is_empty) {
        values.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{APGAR_5, BIRTH_WEIGHT, MOTHER_EDITED_ETHNICITY, MOTHER_FIRST_EDITED_RACE};
    use crate::RecordKind;

    fn record() -> VitalRecord {
        VitalRecord::new(RecordKind::Birth)
    }

    #[test]
    fn composite_identifier_tracks_its_parts() {
        let mut r = record();
        assert_eq!(r.record_identifier(), None);

        r.set_certificate_number(Some("123"));
        assert_eq!(r.record_identifier(), Some("0000XX000123"));

        r.set_date_part(DateField::ChildBirth, DatePart::Year, Component::Known(2023))
            .expect("valid year");
        r.set_jurisdiction_id(Some("MA"));
        assert_eq!(r.record_identifier(), Some("2023MA000123"));
        assert_eq!(r.jurisdiction_id().as_deref(), Some("MA"));
        assert_eq!(r.event_year(), Some(2023));
    }

    #[test]
    fn out_of_range_date_parts_are_rejected() {
        let mut r = record();
        for (part, bad) in [(DatePart::Year, 999), (DatePart::Month, 13), (DatePart::Day, 0)] {
            let err = r
                .set_date_part(DateField::MotherBirth, part, Component::Known(bad))
                .expect_err("out of range");
            assert!(matches!(err, FhirError::BusinessRule(_)));
        }
        r.set_date_part(DateField::MotherBirth, DatePart::Year, Component::Unknown)
            .expect("unknown is always allowed");
    }

    #[test]
    fn setting_a_parent_birth_date_clears_the_edit_flag() {
        let mut r = record();
        r.set_edit_flag(Subject::Mother, Some("1"));
        assert_eq!(r.edit_flag(Subject::Mother).as_deref(), Some("1"));

        r.set_date_part(DateField::MotherBirth, DatePart::Year, Component::Known(1990))
            .expect("valid");
        assert_eq!(r.edit_flag(Subject::Mother), None);
        assert_eq!(r.partial_date(DateField::MotherBirth).year, Component::Known(1990));
    }

    #[test]
    fn names_keep_positions() {
        let mut r = record();
        r.set_name(Subject::Child, NamePart::Middle, Some("Ann"));
        r.set_name(Subject::Child, NamePart::First, Some("Mary"));
        r.set_name(Subject::Child, NamePart::Last, Some("Smith"));
        r.set_name(Subject::Mother, NamePart::Maiden, Some("Jones"));
        r.set_name(Subject::Mother, NamePart::Last, Some("Smith"));

        assert_eq!(r.name(Subject::Child, NamePart::First).as_deref(), Some("Mary"));
        assert_eq!(r.name(Subject::Child, NamePart::Middle).as_deref(), Some("Ann"));
        assert_eq!(r.name(Subject::Mother, NamePart::Maiden).as_deref(), Some("Jones"));
        assert_eq!(r.name(Subject::Mother, NamePart::Last).as_deref(), Some("Smith"));

        r.set_name(Subject::Child, NamePart::Middle, None);
        assert_eq!(r.name(Subject::Child, NamePart::Middle), None);
        assert_eq!(r.name(Subject::Father, NamePart::First), None);
    }

    #[test]
    fn numbers_distinguish_unknown_from_unset() {
        let mut r = record();
        r.set_number(&APGAR_5, None, Component::Unknown, false);
        assert_eq!(r.number(&APGAR_5), Component::Unknown);

        r.set_number(&BIRTH_WEIGHT, Some("g"), Component::Known(3300), false);
        assert_eq!(r.number(&BIRTH_WEIGHT), Component::Known(3300));

        r.set_number(&APGAR_5, None, Component::Unset, false);
        assert!(!r.entry_exists(&APGAR_5));
    }

    #[test]
    fn component_codes_share_one_entry() {
        let mut r = record();
        r.set_code(&MOTHER_FIRST_EDITED_RACE, codes::VR_RACE_CODE, Some("100"));
        r.set_code(&MOTHER_EDITED_ETHNICITY, codes::VR_HISPANIC_CODE, Some("200"));
        assert_eq!(r.code(&MOTHER_FIRST_EDITED_RACE).as_deref(), Some("100"));
        assert_eq!(r.code(&MOTHER_EDITED_ETHNICITY).as_deref(), Some("200"));

        r.set_code(&MOTHER_FIRST_EDITED_RACE, codes::VR_RACE_CODE, None);
        assert!(r.entry_exists(&MOTHER_EDITED_ETHNICITY));
        r.set_code(&MOTHER_EDITED_ETHNICITY, codes::VR_HISPANIC_CODE, None);
        assert!(!r.entry_exists(&MOTHER_EDITED_ETHNICITY));
    }

    #[test]
    fn birth_time_survives_date_changes() {
        let mut r = record();
        let noon = NaiveTime::from_hms_opt(12, 0, 0).expect("valid time");
        for (part, v) in [(DatePart::Year, 2022), (DatePart::Month, 3), (DatePart::Day, 9)] {
            r.set_date_part(DateField::ChildBirth, part, Component::Known(v))
                .expect("valid");
        }
        r.set_birth_time(Component::Known(noon)).expect("valid");
        r.set_date_part(DateField::ChildBirth, DatePart::Day, Component::Unknown)
            .expect("valid");

        assert_eq!(r.birth_time(), Component::Known(noon));
        assert_eq!(r.partial_date(DateField::ChildBirth).day, Component::Unknown);
    }
}
