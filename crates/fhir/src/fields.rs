//! Name-based field registry.
//!
//! Every field a vital record exposes by name is described once here: how to read and write it
//! on a [`VitalRecord`] ([`Binding`]), where it sits in the fixed-width layout
//! ([`FlatFieldDescriptor`]), and whether it belongs to a coded-content scope. The `ije` codec
//! and the coding messages are driven entirely by this table.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveTime;
use vrx_types::{Component, YesNoUnknown};

use crate::accessors::{DateField, NamePart};
use crate::address::{keys, AddressMap};
use crate::codes;
use crate::locator::{self, FieldLocator, Subject};
use crate::partial_date::DatePart;
use crate::record::VitalRecord;
use crate::{FhirError, FhirResult};

// ============================================================================
// Public domain-level types
// ============================================================================

/// A field value as seen through the registry.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Number(Component<u32>),
    /// The entry a number or date lives on is deliberately absent.
    NotApplicable,
    Text(Option<String>),
    Flag(YesNoUnknown),
    Code(Option<String>),
    Time(Component<NaiveTime>),
    Address(AddressMap),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Number(_) | FieldValue::NotApplicable => "number",
            FieldValue::Text(_) => "text",
            FieldValue::Flag(_) => "flag",
            FieldValue::Code(_) => "code",
            FieldValue::Time(_) => "time",
            FieldValue::Address(_) => "address",
        }
    }

    /// Text or code content, for fields that accept either.
    pub fn into_text(self, field: &'static str) -> FhirResult<Option<String>> {
        match self {
            FieldValue::Text(v) | FieldValue::Code(v) => Ok(v),
            _ => Err(FhirError::FieldType {
                field,
                expected: "text",
            }),
        }
    }

    pub fn into_time(self, field: &'static str) -> FhirResult<Component<NaiveTime>> {
        match self {
            FieldValue::Time(v) => Ok(v),
            _ => Err(FhirError::FieldType {
                field,
                expected: "time",
            }),
        }
    }

    pub fn into_address(self, field: &'static str) -> FhirResult<AddressMap> {
        match self {
            FieldValue::Address(v) => Ok(v),
            _ => Err(FhirError::FieldType {
                field,
                expected: "address",
            }),
        }
    }
}

/// Which coding response a coded field belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodedScope {
    Demographic,
    IndustryOccupation,
}

/// A table translating between fixed-width codes and canonical codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodeTable {
    Sex,
    BirthplaceType,
    AttendantTitle,
    PaymentSource,
    EditFlag,
}

/// How a fixed-width position renders its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlatKind {
    /// Zero-padded digits; all 9s is unknown, blanks are unset.
    NumericAllowingUnknown,
    /// As above, and all 8s means not applicable.
    NumericAllowingUnknownAndAbsence,
    /// Text padded with trailing spaces.
    LeftJustified,
    /// Digits padded with leading zeros.
    RightJustifiedZeroed,
    /// `Y`, `N` or `U`.
    TriState,
    /// `HHMM`; `9999` is unknown.
    TimeAllowingUnknown,
    /// A code translated through a table.
    Mapped(CodeTable),
    /// One key of an address field, left-justified.
    Geographic(&'static str),
}

/// A field's position in the fixed-width layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatFieldDescriptor {
    pub mnemonic: &'static str,
    pub ordinal: u16,
    /// 1-based column of the first character.
    pub offset: usize,
    pub length: usize,
    pub kind: FlatKind,
    /// Positions with a higher priority are decoded after lower ones.
    pub priority: u8,
}

impl FlatFieldDescriptor {
    /// 0-based half-open byte range within a line.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset - 1..self.offset - 1 + self.length
    }
}

/// Getter for an accessor-bound field.
pub type Getter = fn(&VitalRecord) -> FieldValue;
/// Setter for an accessor-bound field; the name is for error messages.
pub type Setter = fn(&mut VitalRecord, &'static str, FieldValue) -> FhirResult<()>;

/// How a field is read from and written to a record.
#[derive(Clone, Copy, Debug)]
pub enum Binding {
    /// A checkbox wholly described by its finding and its category's "none" marker.
    Presence {
        detail: &'static FieldLocator,
        none: &'static FieldLocator,
    },
    /// A count or measurement. With `absence`, a missing entry reads as not applicable.
    Number {
        locator: &'static FieldLocator,
        unit: Option<&'static str>,
        absence: bool,
    },
    Code {
        locator: &'static FieldLocator,
        system: &'static str,
    },
    Name {
        subject: Subject,
        part: NamePart,
    },
    Date {
        date: DateField,
        part: DatePart,
    },
    Accessor {
        get: Getter,
        set: Setter,
    },
}

/// One named field.
#[derive(Clone, Copy, Debug)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub binding: Binding,
    pub flat: &'static [FlatFieldDescriptor],
    pub coded: Option<CodedScope>,
}

impl FieldDescriptor {
    pub fn read(&self, record: &VitalRecord) -> FieldValue {
        match self.binding {
            Binding::Presence { detail, .. } => FieldValue::Flag(record.presence(detail)),
            Binding::Number {
                locator, absence, ..
            } => {
                if absence && !record.entry_exists(locator) {
                    FieldValue::NotApplicable
                } else {
                    FieldValue::Number(record.number(locator))
                }
            }
            Binding::Code { locator, .. } => FieldValue::Code(record.code(locator)),
            Binding::Name { subject, part } => FieldValue::Text(record.name(subject, part)),
            Binding::Date { date, part } => {
                if date.absence_is_meaningful() && !record.has_date_entry(date) {
                    FieldValue::NotApplicable
                } else {
                    FieldValue::Number(record.partial_date(date).part(part))
                }
            }
            Binding::Accessor { get, .. } => get(record),
        }
    }

    pub fn write(&self, record: &mut VitalRecord, value: FieldValue) -> FhirResult<()> {
        let mismatch = |expected: &'static str| FhirError::FieldType {
            field: self.name,
            expected,
        };
        match (self.binding, value) {
            (Binding::Presence { detail, none }, FieldValue::Flag(flag)) => {
                record.set_presence(detail, none, flag);
            }
            (Binding::Presence { .. }, _) => return Err(mismatch("flag")),

            (
                Binding::Number {
                    locator,
                    unit,
                    absence,
                },
                FieldValue::Number(n),
            ) => record.set_number(locator, unit, n, absence),
            (
                Binding::Number {
                    locator,
                    absence: true,
                    ..
                },
                FieldValue::NotApplicable,
            ) => {
                record.remove_entry(locator);
            }
            (Binding::Number { .. }, _) => return Err(mismatch("number")),

            (
                Binding::Code { locator, system },
                FieldValue::Code(code) | FieldValue::Text(code),
            ) => record.set_code(locator, system, code.as_deref()),
            (Binding::Code { .. }, _) => return Err(mismatch("code")),

            (Binding::Name { subject, part }, FieldValue::Text(text)) => {
                record.set_name(subject, part, text.as_deref());
            }
            (Binding::Name { .. }, _) => return Err(mismatch("text")),

            (Binding::Date { date, part }, FieldValue::Number(n)) => {
                record.set_date_part(date, part, n)?;
            }
            (Binding::Date { date, .. }, FieldValue::NotApplicable)
                if date.absence_is_meaningful() =>
            {
                record.clear_date_entry(date);
            }
            (Binding::Date { .. }, _) => return Err(mismatch("number")),

            (Binding::Accessor { set, .. }, value) => set(record, self.name, value)?,
        }
        Ok(())
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Every registered field, in layout order of their first position.
pub fn all() -> &'static [FieldDescriptor] {
    FIELDS
}

static BY_NAME: LazyLock<HashMap<&'static str, &'static FieldDescriptor>> =
    LazyLock::new(|| FIELDS.iter().map(|f| (f.name, f)).collect());

pub fn lookup(name: &str) -> Option<&'static FieldDescriptor> {
    BY_NAME.get(name).copied()
}

impl VitalRecord {
    /// Reads a field by registry name.
    pub fn get(&self, name: &str) -> FhirResult<FieldValue> {
        let field = lookup(name).ok_or_else(|| FhirError::UnknownField(name.to_string()))?;
        Ok(field.read(self))
    }

    /// Writes a field by registry name.
    pub fn set(&mut self, name: &str, value: FieldValue) -> FhirResult<()> {
        let field = lookup(name).ok_or_else(|| FhirError::UnknownField(name.to_string()))?;
        field.write(self, value)
    }

    /// A new record holding the identifiers and the coded fields of one scope.
    pub fn coded_content(&self, scope: CodedScope) -> VitalRecord {
        let mut out = VitalRecord::new(self.kind());
        out.set_certificate_number(self.certificate_number().as_deref());
        out.set_auxiliary_state_identifier(self.auxiliary_state_identifier().as_deref());
        out.set_jurisdiction_id(self.jurisdiction_id().as_deref());
        if let Err(err) = out.set_date_part(
            DateField::ChildBirth,
            DatePart::Year,
            self.partial_date(DateField::ChildBirth).year,
        ) {
            tracing::warn!(error = %err, "coded content without event year");
        }

        for field in FIELDS.iter().filter(|f| f.coded == Some(scope)) {
            if let Err(err) = field.write(&mut out, field.read(self)) {
                tracing::warn!(field = field.name, error = %err, "coded field not copied");
            }
        }
        out
    }
}

// ============================================================================
// Accessor bindings (internal)
// ============================================================================

fn certificate_number(r: &VitalRecord) -> FieldValue {
    FieldValue::Text(r.certificate_number())
}

fn set_certificate_number(r: &mut VitalRecord, f: &'static str, v: FieldValue) -> FhirResult<()> {
    r.set_certificate_number(v.into_text(f)?.as_deref());
    Ok(())
}

fn auxiliary_state_identifier(r: &VitalRecord) -> FieldValue {
    FieldValue::Text(r.auxiliary_state_identifier())
}

fn set_auxiliary_state_identifier(
    r: &mut VitalRecord,
    f: &'static str,
    v: FieldValue,
) -> FhirResult<()> {
    r.set_auxiliary_state_identifier(v.into_text(f)?.as_deref());
    Ok(())
}

fn birth_time(r: &VitalRecord) -> FieldValue {
    FieldValue::Time(r.birth_time())
}

fn set_birth_time(r: &mut VitalRecord, f: &'static str, v: FieldValue) -> FhirResult<()> {
    r.set_birth_time(v.into_time(f)?)
}

fn birth_sex(r: &VitalRecord) -> FieldValue {
    FieldValue::Code(r.birth_sex())
}

fn set_birth_sex(r: &mut VitalRecord, f: &'static str, v: FieldValue) -> FhirResult<()> {
    r.set_birth_sex(v.into_text(f)?.as_deref());
    Ok(())
}

fn birth_place_type(r: &VitalRecord) -> FieldValue {
    FieldValue::Code(r.birth_place_type())
}

fn set_birth_place_type(r: &mut VitalRecord, f: &'static str, v: FieldValue) -> FhirResult<()> {
    r.set_birth_place_type(v.into_text(f)?.as_deref());
    Ok(())
}

fn facility_name(r: &VitalRecord) -> FieldValue {
    FieldValue::Text(r.facility_name())
}

fn set_facility_name(r: &mut VitalRecord, f: &'static str, v: FieldValue) -> FhirResult<()> {
    r.set_facility_name(v.into_text(f)?.as_deref());
    Ok(())
}

fn mother_medical_record_number(r: &VitalRecord) -> FieldValue {
    FieldValue::Text(r.mother_medical_record_number())
}

fn set_mother_medical_record_number(
    r: &mut VitalRecord,
    f: &'static str,
    v: FieldValue,
) -> FhirResult<()> {
    r.set_mother_medical_record_number(v.into_text(f)?.as_deref());
    Ok(())
}

fn mother_edit_flag(r: &VitalRecord) -> FieldValue {
    FieldValue::Code(r.edit_flag(Subject::Mother))
}

fn set_mother_edit_flag(r: &mut VitalRecord, f: &'static str, v: FieldValue) -> FhirResult<()> {
    r.set_edit_flag(Subject::Mother, v.into_text(f)?.as_deref());
    Ok(())
}

fn father_edit_flag(r: &VitalRecord) -> FieldValue {
    FieldValue::Code(r.edit_flag(Subject::Father))
}

fn set_father_edit_flag(r: &mut VitalRecord, f: &'static str, v: FieldValue) -> FhirResult<()> {
    r.set_edit_flag(Subject::Father, v.into_text(f)?.as_deref());
    Ok(())
}

fn place_of_birth(r: &VitalRecord) -> FieldValue {
    FieldValue::Address(r.place_of_birth())
}

fn set_place_of_birth(r: &mut VitalRecord, f: &'static str, v: FieldValue) -> FhirResult<()> {
    r.set_place_of_birth(&v.into_address(f)?);
    Ok(())
}

fn mother_residence(r: &VitalRecord) -> FieldValue {
    FieldValue::Address(r.mother_residence())
}

fn set_mother_residence(r: &mut VitalRecord, f: &'static str, v: FieldValue) -> FhirResult<()> {
    r.set_mother_residence(&v.into_address(f)?);
    Ok(())
}

// ============================================================================
// Field table
// ============================================================================

const fn flat(
    mnemonic: &'static str,
    ordinal: u16,
    offset: usize,
    length: usize,
    kind: FlatKind,
) -> FlatFieldDescriptor {
    FlatFieldDescriptor {
        mnemonic,
        ordinal,
        offset,
        length,
        kind,
        priority: 1,
    }
}

/// A position decoded after the ordinary ones (edit flags reset by date setters).
const fn late(
    mnemonic: &'static str,
    ordinal: u16,
    offset: usize,
    length: usize,
    kind: FlatKind,
) -> FlatFieldDescriptor {
    FlatFieldDescriptor {
        priority: 2,
        ..flat(mnemonic, ordinal, offset, length, kind)
    }
}

static FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "birthYear",
        description: "Year of birth",
        binding: Binding::Date {
            date: DateField::ChildBirth,
            part: DatePart::Year,
        },
        flat: &[flat("IDOB_YR", 1, 1, 4, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "placeOfBirth",
        description: "Place of birth address",
        binding: Binding::Accessor {
            get: place_of_birth,
            set: set_place_of_birth,
        },
        flat: &[
            flat("BSTATE", 2, 5, 2, FlatKind::Geographic(keys::STATE)),
            flat("CNTYO", 9, 35, 3, FlatKind::Geographic(keys::COUNTY_CODE)),
        ],
        coded: None,
    },
    FieldDescriptor {
        name: "certificateNumber",
        description: "Certificate number",
        binding: Binding::Accessor {
            get: certificate_number,
            set: set_certificate_number,
        },
        flat: &[flat("FILENO", 3, 7, 6, FlatKind::RightJustifiedZeroed)],
        coded: None,
    },
    FieldDescriptor {
        name: "stateLocalIdentifier1",
        description: "Auxiliary state file number",
        binding: Binding::Accessor {
            get: auxiliary_state_identifier,
            set: set_auxiliary_state_identifier,
        },
        flat: &[flat("AUXNO", 4, 14, 12, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "birthTime",
        description: "Time of birth",
        binding: Binding::Accessor {
            get: birth_time,
            set: set_birth_time,
        },
        flat: &[flat("TB", 5, 26, 4, FlatKind::TimeAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "birthSex",
        description: "Sex of the child",
        binding: Binding::Accessor {
            get: birth_sex,
            set: set_birth_sex,
        },
        flat: &[flat("ISEX", 6, 30, 1, FlatKind::Mapped(CodeTable::Sex))],
        coded: None,
    },
    FieldDescriptor {
        name: "birthMonth",
        description: "Month of birth",
        binding: Binding::Date {
            date: DateField::ChildBirth,
            part: DatePart::Month,
        },
        flat: &[flat("IDOB_MO", 7, 31, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "birthDay",
        description: "Day of birth",
        binding: Binding::Date {
            date: DateField::ChildBirth,
            part: DatePart::Day,
        },
        flat: &[flat("IDOB_DY", 8, 33, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "birthPlaceType",
        description: "Type of place of birth",
        binding: Binding::Accessor {
            get: birth_place_type,
            set: set_birth_place_type,
        },
        flat: &[flat("BPLACE", 10, 38, 1, FlatKind::Mapped(CodeTable::BirthplaceType))],
        coded: None,
    },
    FieldDescriptor {
        name: "motherBirthYear",
        description: "Mother's year of birth",
        binding: Binding::Date {
            date: DateField::MotherBirth,
            part: DatePart::Year,
        },
        flat: &[flat("MDOB_YR", 11, 55, 4, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "motherBirthMonth",
        description: "Mother's month of birth",
        binding: Binding::Date {
            date: DateField::MotherBirth,
            part: DatePart::Month,
        },
        flat: &[flat("MDOB_MO", 12, 59, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "motherBirthDay",
        description: "Mother's day of birth",
        binding: Binding::Date {
            date: DateField::MotherBirth,
            part: DatePart::Day,
        },
        flat: &[flat("MDOB_DY", 13, 61, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "motherAgeEditFlag",
        description: "Mother's age edit flag",
        binding: Binding::Accessor {
            get: mother_edit_flag,
            set: set_mother_edit_flag,
        },
        flat: &[late("MAGE_BYPASS", 14, 63, 1, FlatKind::Mapped(CodeTable::EditFlag))],
        coded: None,
    },
    FieldDescriptor {
        name: "motherResidence",
        description: "Mother's residence address",
        binding: Binding::Accessor {
            get: mother_residence,
            set: set_mother_residence,
        },
        flat: &[
            flat("CITYC", 15, 68, 5, FlatKind::Geographic(keys::CITY_CODE)),
            flat("COUNTYC", 16, 73, 3, FlatKind::Geographic(keys::COUNTY_CODE)),
            flat("STATEC", 17, 76, 2, FlatKind::Geographic(keys::STATE)),
            flat("COUNTRYC", 18, 78, 2, FlatKind::Geographic(keys::COUNTRY)),
            flat("LIMITS", 19, 80, 1, FlatKind::Geographic(keys::CITY_LIMITS)),
            flat("ADDRESS", 78, 711, 50, FlatKind::Geographic(keys::LINE1)),
            flat("CITYTEXT", 79, 761, 28, FlatKind::Geographic(keys::CITY)),
            flat("CNTYTXT", 80, 789, 28, FlatKind::Geographic(keys::COUNTY)),
            flat("ZIPCODE", 81, 817, 9, FlatKind::Geographic(keys::ZIP)),
        ],
        coded: None,
    },
    FieldDescriptor {
        name: "fatherBirthYear",
        description: "Father's year of birth",
        binding: Binding::Date {
            date: DateField::FatherBirth,
            part: DatePart::Year,
        },
        flat: &[flat("FDOB_YR", 20, 81, 4, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "fatherBirthMonth",
        description: "Father's month of birth",
        binding: Binding::Date {
            date: DateField::FatherBirth,
            part: DatePart::Month,
        },
        flat: &[flat("FDOB_MO", 21, 85, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "fatherBirthDay",
        description: "Father's day of birth",
        binding: Binding::Date {
            date: DateField::FatherBirth,
            part: DatePart::Day,
        },
        flat: &[flat("FDOB_DY", 22, 87, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "fatherAgeEditFlag",
        description: "Father's age edit flag",
        binding: Binding::Accessor {
            get: father_edit_flag,
            set: set_father_edit_flag,
        },
        flat: &[late("FAGE_BYPASS", 23, 89, 1, FlatKind::Mapped(CodeTable::EditFlag))],
        coded: None,
    },
    FieldDescriptor {
        name: "attendantTitle",
        description: "Title of the birth attendant",
        binding: Binding::Code {
            locator: &locator::ATTENDANT_TITLE,
            system: codes::SNOMED,
        },
        flat: &[flat("ATTEND", 24, 90, 1, FlatKind::Mapped(CodeTable::AttendantTitle))],
        coded: None,
    },
    FieldDescriptor {
        name: "paymentSource",
        description: "Principal source of payment",
        binding: Binding::Code {
            locator: &locator::PAYMENT_SOURCE,
            system: codes::PAYER_GROUPING,
        },
        flat: &[flat("PAY", 25, 91, 1, FlatKind::Mapped(CodeTable::PaymentSource))],
        coded: None,
    },
    FieldDescriptor {
        name: "apgar5",
        description: "Five minute Apgar score",
        binding: Binding::Number {
            locator: &locator::APGAR_5,
            unit: None,
            absence: false,
        },
        flat: &[flat("APGAR5", 26, 92, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "apgar10",
        description: "Ten minute Apgar score",
        binding: Binding::Number {
            locator: &locator::APGAR_10,
            unit: None,
            absence: true,
        },
        flat: &[flat("APGAR10", 27, 94, 2, FlatKind::NumericAllowingUnknownAndAbsence)],
        coded: None,
    },
    FieldDescriptor {
        name: "plurality",
        description: "Plurality",
        binding: Binding::Number {
            locator: &locator::PLURALITY,
            unit: None,
            absence: false,
        },
        flat: &[flat("PLUR", 28, 96, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "birthWeight",
        description: "Birth weight in grams",
        binding: Binding::Number {
            locator: &locator::BIRTH_WEIGHT,
            unit: Some("g"),
            absence: false,
        },
        flat: &[flat("BWG", 29, 98, 4, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "gestationalAge",
        description: "Obstetric estimate of gestation in weeks",
        binding: Binding::Number {
            locator: &locator::GESTATIONAL_AGE,
            unit: Some("wk"),
            absence: false,
        },
        flat: &[flat("OWGEST", 30, 102, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "prepregnancyWeight",
        description: "Mother's prepregnancy weight in pounds",
        binding: Binding::Number {
            locator: &locator::PREPREGNANCY_WEIGHT,
            unit: Some("[lb_av]"),
            absence: false,
        },
        flat: &[flat("PWGT", 31, 104, 3, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "deliveryWeight",
        description: "Mother's weight at delivery in pounds",
        binding: Binding::Number {
            locator: &locator::DELIVERY_WEIGHT,
            unit: Some("[lb_av]"),
            absence: false,
        },
        flat: &[flat("DWGT", 32, 107, 3, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "previousCesareans",
        description: "Number of previous cesarean deliveries",
        binding: Binding::Number {
            locator: &locator::PREVIOUS_CESAREANS,
            unit: None,
            absence: false,
        },
        flat: &[flat("NPCES", 33, 110, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "firstPrenatalCareMonth",
        description: "Month of first prenatal care visit",
        binding: Binding::Date {
            date: DateField::FirstPrenatalCare,
            part: DatePart::Month,
        },
        flat: &[flat("DOFP_MO", 34, 112, 2, FlatKind::NumericAllowingUnknownAndAbsence)],
        coded: None,
    },
    FieldDescriptor {
        name: "firstPrenatalCareDay",
        description: "Day of first prenatal care visit",
        binding: Binding::Date {
            date: DateField::FirstPrenatalCare,
            part: DatePart::Day,
        },
        flat: &[flat("DOFP_DY", 35, 114, 2, FlatKind::NumericAllowingUnknownAndAbsence)],
        coded: None,
    },
    FieldDescriptor {
        name: "firstPrenatalCareYear",
        description: "Year of first prenatal care visit",
        binding: Binding::Date {
            date: DateField::FirstPrenatalCare,
            part: DatePart::Year,
        },
        flat: &[flat("DOFP_YR", 36, 116, 4, FlatKind::NumericAllowingUnknownAndAbsence)],
        coded: None,
    },
    FieldDescriptor {
        name: "lastMensesMonth",
        description: "Month last normal menses began",
        binding: Binding::Date {
            date: DateField::LastMenses,
            part: DatePart::Month,
        },
        flat: &[flat("DLMP_MO", 37, 120, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "lastMensesDay",
        description: "Day last normal menses began",
        binding: Binding::Date {
            date: DateField::LastMenses,
            part: DatePart::Day,
        },
        flat: &[flat("DLMP_DY", 38, 122, 2, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "lastMensesYear",
        description: "Year last normal menses began",
        binding: Binding::Date {
            date: DateField::LastMenses,
            part: DatePart::Year,
        },
        flat: &[flat("DLMP_YR", 39, 124, 4, FlatKind::NumericAllowingUnknown)],
        coded: None,
    },
    FieldDescriptor {
        name: "prepregnancyDiabetes",
        description: "Prepregnancy diabetes",
        binding: Binding::Presence {
            detail: &locator::PREPREGNANCY_DIABETES,
            none: &locator::NO_RISK_FACTORS,
        },
        flat: &[flat("PDIAB", 40, 128, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "gestationalDiabetes",
        description: "Gestational diabetes",
        binding: Binding::Presence {
            detail: &locator::GESTATIONAL_DIABETES,
            none: &locator::NO_RISK_FACTORS,
        },
        flat: &[flat("GDIAB", 41, 129, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "prepregnancyHypertension",
        description: "Prepregnancy hypertension",
        binding: Binding::Presence {
            detail: &locator::PREPREGNANCY_HYPERTENSION,
            none: &locator::NO_RISK_FACTORS,
        },
        flat: &[flat("PHYPE", 42, 130, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "gestationalHypertension",
        description: "Gestational hypertension",
        binding: Binding::Presence {
            detail: &locator::GESTATIONAL_HYPERTENSION,
            none: &locator::NO_RISK_FACTORS,
        },
        flat: &[flat("GHYPE", 43, 131, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "eclampsia",
        description: "Hypertension with eclampsia",
        binding: Binding::Presence {
            detail: &locator::ECLAMPSIA,
            none: &locator::NO_RISK_FACTORS,
        },
        flat: &[flat("PHYPEC", 44, 132, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "previousPretermBirth",
        description: "Previous preterm birth",
        binding: Binding::Presence {
            detail: &locator::PREVIOUS_PRETERM_BIRTH,
            none: &locator::NO_RISK_FACTORS,
        },
        flat: &[flat("PPB", 45, 133, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "gonorrhea",
        description: "Gonorrhea",
        binding: Binding::Presence {
            detail: &locator::GONORRHEA,
            none: &locator::NO_INFECTIONS,
        },
        flat: &[flat("GON", 46, 134, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "syphilis",
        description: "Syphilis",
        binding: Binding::Presence {
            detail: &locator::SYPHILIS,
            none: &locator::NO_INFECTIONS,
        },
        flat: &[flat("SYPH", 47, 135, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "chlamydia",
        description: "Chlamydia",
        binding: Binding::Presence {
            detail: &locator::CHLAMYDIA,
            none: &locator::NO_INFECTIONS,
        },
        flat: &[flat("CHAM", 48, 136, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "hepatitisB",
        description: "Hepatitis B",
        binding: Binding::Presence {
            detail: &locator::HEPATITIS_B,
            none: &locator::NO_INFECTIONS,
        },
        flat: &[flat("HEPB", 49, 137, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "hepatitisC",
        description: "Hepatitis C",
        binding: Binding::Presence {
            detail: &locator::HEPATITIS_C,
            none: &locator::NO_INFECTIONS,
        },
        flat: &[flat("HEPC", 50, 138, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "cervicalCerclage",
        description: "Cervical cerclage",
        binding: Binding::Presence {
            detail: &locator::CERVICAL_CERCLAGE,
            none: &locator::NO_OBSTETRIC_PROCEDURES,
        },
        flat: &[flat("CERV", 51, 139, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "tocolysis",
        description: "Tocolysis",
        binding: Binding::Presence {
            detail: &locator::TOCOLYSIS,
            none: &locator::NO_OBSTETRIC_PROCEDURES,
        },
        flat: &[flat("TOC", 52, 140, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "inductionOfLabor",
        description: "Induction of labor",
        binding: Binding::Presence {
            detail: &locator::INDUCTION_OF_LABOR,
            none: &locator::NO_LABOR_CHARACTERISTICS,
        },
        flat: &[flat("INDL", 53, 141, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "augmentationOfLabor",
        description: "Augmentation of labor",
        binding: Binding::Presence {
            detail: &locator::AUGMENTATION_OF_LABOR,
            none: &locator::NO_LABOR_CHARACTERISTICS,
        },
        flat: &[flat("AUGL", 54, 142, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "epiduralAnesthesia",
        description: "Epidural or spinal anesthesia",
        binding: Binding::Presence {
            detail: &locator::EPIDURAL_ANESTHESIA,
            none: &locator::NO_LABOR_CHARACTERISTICS,
        },
        flat: &[flat("ESAN", 55, 143, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "steroids",
        description: "Steroids for fetal lung maturation",
        binding: Binding::Presence {
            detail: &locator::STEROIDS,
            none: &locator::NO_LABOR_CHARACTERISTICS,
        },
        flat: &[flat("STER", 56, 144, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "chorioamnionitis",
        description: "Chorioamnionitis",
        binding: Binding::Presence {
            detail: &locator::CHORIOAMNIONITIS,
            none: &locator::NO_LABOR_CHARACTERISTICS,
        },
        flat: &[flat("CHOR", 57, 145, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "assistedVentilation",
        description: "Assisted ventilation after delivery",
        binding: Binding::Presence {
            detail: &locator::ASSISTED_VENTILATION,
            none: &locator::NO_ABNORMAL_CONDITIONS,
        },
        flat: &[flat("AVEN1", 58, 146, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "nicuAdmission",
        description: "Admission to NICU",
        binding: Binding::Presence {
            detail: &locator::NICU_ADMISSION,
            none: &locator::NO_ABNORMAL_CONDITIONS,
        },
        flat: &[flat("NICU", 59, 147, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "surfactant",
        description: "Surfactant replacement therapy",
        binding: Binding::Presence {
            detail: &locator::SURFACTANT,
            none: &locator::NO_ABNORMAL_CONDITIONS,
        },
        flat: &[flat("SURF", 60, 148, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "seizure",
        description: "Seizure or serious neurologic dysfunction",
        binding: Binding::Presence {
            detail: &locator::SEIZURE,
            none: &locator::NO_ABNORMAL_CONDITIONS,
        },
        flat: &[flat("SEIZ", 61, 149, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "anencephaly",
        description: "Anencephaly",
        binding: Binding::Presence {
            detail: &locator::ANENCEPHALY,
            none: &locator::NO_CONGENITAL_ANOMALIES,
        },
        flat: &[flat("ANEN", 62, 150, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "spinaBifida",
        description: "Meningomyelocele or spina bifida",
        binding: Binding::Presence {
            detail: &locator::SPINA_BIFIDA,
            none: &locator::NO_CONGENITAL_ANOMALIES,
        },
        flat: &[flat("MNSB", 63, 151, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "cleftLip",
        description: "Cleft lip with or without cleft palate",
        binding: Binding::Presence {
            detail: &locator::CLEFT_LIP,
            none: &locator::NO_CONGENITAL_ANOMALIES,
        },
        flat: &[flat("CL", 64, 152, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "downSyndrome",
        description: "Down syndrome",
        binding: Binding::Presence {
            detail: &locator::DOWN_SYNDROME,
            none: &locator::NO_CONGENITAL_ANOMALIES,
        },
        flat: &[flat("DOWT", 65, 153, 1, FlatKind::TriState)],
        coded: None,
    },
    FieldDescriptor {
        name: "childFirstName",
        description: "Child's first name",
        binding: Binding::Name {
            subject: Subject::Child,
            part: NamePart::First,
        },
        flat: &[flat("KIDFNAME", 66, 154, 50, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "childMiddleName",
        description: "Child's middle name",
        binding: Binding::Name {
            subject: Subject::Child,
            part: NamePart::Middle,
        },
        flat: &[flat("KIDMNAME", 67, 204, 50, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "childLastName",
        description: "Child's last name",
        binding: Binding::Name {
            subject: Subject::Child,
            part: NamePart::Last,
        },
        flat: &[flat("KIDLNAME", 68, 254, 50, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "childSuffix",
        description: "Child's name suffix",
        binding: Binding::Name {
            subject: Subject::Child,
            part: NamePart::Suffix,
        },
        flat: &[flat("KIDSUFX", 69, 304, 7, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "motherFirstName",
        description: "Mother's first name",
        binding: Binding::Name {
            subject: Subject::Mother,
            part: NamePart::First,
        },
        flat: &[flat("MOMFNAME", 70, 311, 50, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "motherMiddleName",
        description: "Mother's middle name",
        binding: Binding::Name {
            subject: Subject::Mother,
            part: NamePart::Middle,
        },
        flat: &[flat("MOMMIDDL", 71, 361, 50, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "motherLastName",
        description: "Mother's last name",
        binding: Binding::Name {
            subject: Subject::Mother,
            part: NamePart::Last,
        },
        flat: &[flat("MOMLNAME", 72, 411, 50, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "motherMaidenName",
        description: "Mother's maiden surname",
        binding: Binding::Name {
            subject: Subject::Mother,
            part: NamePart::Maiden,
        },
        flat: &[flat("MOMMAIDN", 73, 461, 50, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "fatherFirstName",
        description: "Father's first name",
        binding: Binding::Name {
            subject: Subject::Father,
            part: NamePart::First,
        },
        flat: &[flat("DADFNAME", 74, 511, 50, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "fatherMiddleName",
        description: "Father's middle name",
        binding: Binding::Name {
            subject: Subject::Father,
            part: NamePart::Middle,
        },
        flat: &[flat("DADMNAME", 75, 561, 50, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "fatherLastName",
        description: "Father's last name",
        binding: Binding::Name {
            subject: Subject::Father,
            part: NamePart::Last,
        },
        flat: &[flat("DADLNAME", 76, 611, 50, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "facilityName",
        description: "Facility name",
        binding: Binding::Accessor {
            get: facility_name,
            set: set_facility_name,
        },
        flat: &[flat("HOSP", 77, 661, 50, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "motherMedicalRecordNumber",
        description: "Mother's medical record number",
        binding: Binding::Accessor {
            get: mother_medical_record_number,
            set: set_mother_medical_record_number,
        },
        flat: &[flat("MOM_MED_REC_NUM", 82, 826, 12, FlatKind::LeftJustified)],
        coded: None,
    },
    FieldDescriptor {
        name: "motherRaceFirstEdited",
        description: "Mother's first edited race code",
        binding: Binding::Code {
            locator: &locator::MOTHER_FIRST_EDITED_RACE,
            system: codes::VR_RACE_CODE,
        },
        flat: &[flat("MRACE1E", 83, 838, 3, FlatKind::LeftJustified)],
        coded: Some(CodedScope::Demographic),
    },
    FieldDescriptor {
        name: "motherEthnicityEdited",
        description: "Mother's edited Hispanic origin code",
        binding: Binding::Code {
            locator: &locator::MOTHER_EDITED_ETHNICITY,
            system: codes::VR_HISPANIC_CODE,
        },
        flat: &[flat("METHNICE", 84, 841, 3, FlatKind::LeftJustified)],
        coded: Some(CodedScope::Demographic),
    },
    FieldDescriptor {
        name: "fatherRaceFirstEdited",
        description: "Father's first edited race code",
        binding: Binding::Code {
            locator: &locator::FATHER_FIRST_EDITED_RACE,
            system: codes::VR_RACE_CODE,
        },
        flat: &[flat("FRACE1E", 85, 844, 3, FlatKind::LeftJustified)],
        coded: Some(CodedScope::Demographic),
    },
    FieldDescriptor {
        name: "fatherEthnicityEdited",
        description: "Father's edited Hispanic origin code",
        binding: Binding::Code {
            locator: &locator::FATHER_EDITED_ETHNICITY,
            system: codes::VR_HISPANIC_CODE,
        },
        flat: &[flat("FETHNICE", 86, 847, 3, FlatKind::LeftJustified)],
        coded: Some(CodedScope::Demographic),
    },
    FieldDescriptor {
        name: "motherOccupation",
        description: "Mother's coded occupation",
        binding: Binding::Code {
            locator: &locator::MOTHER_OCCUPATION,
            system: codes::CENSUS_OCCUPATION,
        },
        flat: &[flat("MOM_OC_C", 87, 850, 4, FlatKind::LeftJustified)],
        coded: Some(CodedScope::IndustryOccupation),
    },
    FieldDescriptor {
        name: "motherIndustry",
        description: "Mother's coded industry",
        binding: Binding::Code {
            locator: &locator::MOTHER_INDUSTRY,
            system: codes::CENSUS_INDUSTRY,
        },
        flat: &[flat("MOM_IN_C", 88, 854, 4, FlatKind::LeftJustified)],
        coded: Some(CodedScope::IndustryOccupation),
    },
    FieldDescriptor {
        name: "fatherOccupation",
        description: "Father's coded occupation",
        binding: Binding::Code {
            locator: &locator::FATHER_OCCUPATION,
            system: codes::CENSUS_OCCUPATION,
        },
        flat: &[flat("DAD_OC_C", 89, 858, 4, FlatKind::LeftJustified)],
        coded: Some(CodedScope::IndustryOccupation),
    },
    FieldDescriptor {
        name: "fatherIndustry",
        description: "Father's coded industry",
        binding: Binding::Code {
            locator: &locator::FATHER_INDUSTRY,
            system: codes::CENSUS_INDUSTRY,
        },
        flat: &[flat("DAD_IN_C", 90, 862, 4, FlatKind::LeftJustified)],
        coded: Some(CodedScope::IndustryOccupation),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordKind;

    #[test]
    fn names_are_unique_and_resolvable() {
        assert_eq!(BY_NAME.len(), FIELDS.len());
        for field in all() {
            assert_eq!(lookup(field.name).map(|f| f.name), Some(field.name));
        }
        assert!(lookup("noSuchField").is_none());
    }

    #[test]
    fn flat_positions_do_not_overlap() {
        let mut spans: Vec<_> = all()
            .iter()
            .flat_map(|f| f.flat.iter())
            .map(|p| (p.offset, p.offset + p.length, p.mnemonic))
            .collect();
        spans.sort();
        for pair in spans.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "{} overlaps {}", pair[0].2, pair[1].2);
        }
    }

    #[test]
    fn get_and_set_by_name() {
        let mut r = VitalRecord::new(RecordKind::Birth);
        r.set("birthWeight", FieldValue::Number(Component::Known(3200)))
            .expect("number field");
        r.set("gestationalDiabetes", FieldValue::Flag(YesNoUnknown::Yes))
            .expect("flag field");
        r.set("childFirstName", FieldValue::Text(Some("Ada".into())))
            .expect("text field");

        assert_eq!(
            r.get("birthWeight").expect("known"),
            FieldValue::Number(Component::Known(3200))
        );
        assert_eq!(
            r.get("gestationalDiabetes").expect("known"),
            FieldValue::Flag(YesNoUnknown::Yes)
        );
        assert_eq!(
            r.get("prepregnancyDiabetes").expect("known"),
            FieldValue::Flag(YesNoUnknown::No)
        );
        assert_eq!(
            r.get("childFirstName").expect("known"),
            FieldValue::Text(Some("Ada".into()))
        );
    }

    #[test]
    fn wrong_value_type_names_the_field() {
        let mut r = VitalRecord::new(RecordKind::Birth);
        let err = r
            .set("birthWeight", FieldValue::Text(Some("heavy".into())))
            .expect_err("type mismatch");
        assert!(matches!(
            err,
            FhirError::FieldType {
                field: "birthWeight",
                ..
            }
        ));
        assert!(matches!(
            r.get("nope"),
            Err(FhirError::UnknownField(name)) if name == "nope"
        ));
    }

    #[test]
    fn absence_capable_fields_read_not_applicable_when_missing() {
        let mut r = VitalRecord::new(RecordKind::Birth);
        assert_eq!(r.get("apgar10").expect("known"), FieldValue::NotApplicable);
        assert_eq!(
            r.get("firstPrenatalCareMonth").expect("known"),
            FieldValue::NotApplicable
        );
        assert_eq!(
            r.get("apgar5").expect("known"),
            FieldValue::Number(Component::Unset)
        );

        r.set("firstPrenatalCareMonth", FieldValue::Number(Component::Unset))
            .expect("keeps an empty entry");
        assert_eq!(
            r.get("firstPrenatalCareDay").expect("known"),
            FieldValue::Number(Component::Unset)
        );

        r.set("firstPrenatalCareYear", FieldValue::NotApplicable)
            .expect("absence allowed");
        assert_eq!(
            r.get("firstPrenatalCareMonth").expect("known"),
            FieldValue::NotApplicable
        );
        assert!(r.set("apgar5", FieldValue::NotApplicable).is_err());
    }

    #[test]
    fn coded_content_carries_identifiers_and_one_scope() {
        let mut r = VitalRecord::new(RecordKind::Birth);
        r.set_certificate_number(Some("42"));
        r.set_jurisdiction_id(Some("NY"));
        r.set("birthYear", FieldValue::Number(Component::Known(2024)))
            .expect("valid year");
        r.set("motherRaceFirstEdited", FieldValue::Code(Some("100".into())))
            .expect("code");
        r.set("motherOccupation", FieldValue::Code(Some("1010".into())))
            .expect("code");
        r.set("childFirstName", FieldValue::Text(Some("Ada".into())))
            .expect("name");

        let coded = r.coded_content(CodedScope::Demographic);
        assert_eq!(coded.record_identifier(), Some("2024NY000042"));
        assert_eq!(
            coded.get("motherRaceFirstEdited").expect("known"),
            FieldValue::Code(Some("100".into()))
        );
        assert_eq!(
            coded.get("motherOccupation").expect("known"),
            FieldValue::Code(None)
        );
        assert_eq!(
            coded.get("childFirstName").expect("known"),
            FieldValue::Text(None)
        );
    }
}
