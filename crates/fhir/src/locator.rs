//! Where a field lives in the record graph.
//!
//! A [`FieldLocator`] names one clinical entry by resource type, identifying code, optional
//! category and subject, plus the manifest section that lists it. Locators are static data:
//! the field registry and the typed accessors share them.

use crate::codes::{self, category};
use crate::wire::{ClinicalEntry, EntryKind};

/// A titled grouping in the manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Prenatal,
    MedicalInformation,
    LaborAndDelivery,
    NewbornInformation,
    MotherInformation,
    CodedContent,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Prenatal,
        Section::MedicalInformation,
        Section::LaborAndDelivery,
        Section::NewbornInformation,
        Section::MotherInformation,
        Section::CodedContent,
    ];

    /// LOINC section code.
    pub fn code(self) -> &'static str {
        match self {
            Section::Prenatal => "57073-9",
            Section::MedicalInformation => "55752-0",
            Section::LaborAndDelivery => "57074-7",
            Section::NewbornInformation => "57075-4",
            Section::MotherInformation => "92014-4",
            Section::CodedContent => "86805-3",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Prenatal => "Prenatal",
            Section::MedicalInformation => "Medical information",
            Section::LaborAndDelivery => "Labor and delivery",
            Section::NewbornInformation => "Newborn information",
            Section::MotherInformation => "Mother information",
            Section::CodedContent => "Coded content",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

/// The person an entry is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subject {
    Child,
    Mother,
    Father,
}

/// Identifies a single clinical entry in the record graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLocator {
    pub kind: EntryKind,
    pub code: &'static str,
    pub system: &'static str,
    pub display: &'static str,
    /// Category shared by mutually exclusive findings.
    pub category: Option<&'static str>,
    pub section: Section,
    pub subject: Subject,
    /// Observation component holding the value, when the value is not on the entry itself.
    pub component: Option<&'static str>,
}

impl FieldLocator {
    /// True if `entry` is the entry this locator names, given the subject's reference.
    pub fn matches(&self, kind: EntryKind, entry: &ClinicalEntry, subject: Option<&str>) -> bool {
        if kind != self.kind {
            return false;
        }
        if !entry
            .identifying_code()
            .is_some_and(|code| code.has_code(Some(self.system), self.code))
        {
            return false;
        }
        if let Some(category) = self.category {
            if !entry.has_category(category) {
                return false;
            }
        }
        // An entry without a subject reference matches regardless of subject.
        match (entry.subject_reference(), subject) {
            (Some(reference), Some(subject)) => reference.points_to(subject),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    /// True for the "none of the above" and "unknown" markers of a category.
    pub fn is_exclusive_marker(&self) -> bool {
        self.category.is_some() && codes::is_exclusive_marker(self.code)
    }
}

const fn condition(
    code: &'static str,
    display: &'static str,
    category: &'static str,
    section: Section,
    subject: Subject,
) -> FieldLocator {
    FieldLocator {
        kind: EntryKind::Condition,
        code,
        system: codes::SNOMED,
        display,
        category: Some(category),
        section,
        subject,
        component: None,
    }
}

const fn procedure(
    code: &'static str,
    display: &'static str,
    category: &'static str,
    section: Section,
    subject: Subject,
) -> FieldLocator {
    FieldLocator {
        kind: EntryKind::Procedure,
        code,
        system: codes::SNOMED,
        display,
        category: Some(category),
        section,
        subject,
        component: None,
    }
}

const fn observation(
    code: &'static str,
    system: &'static str,
    display: &'static str,
    section: Section,
    subject: Subject,
) -> FieldLocator {
    FieldLocator {
        kind: EntryKind::Observation,
        code,
        system,
        display,
        category: None,
        section,
        subject,
        component: None,
    }
}

const fn none_of(category: &'static str, section: Section, subject: Subject) -> FieldLocator {
    FieldLocator {
        kind: EntryKind::Observation,
        code: codes::NONE_OF_THE_ABOVE,
        system: codes::SNOMED,
        display: "None of the above",
        category: Some(category),
        section,
        subject,
        component: None,
    }
}

// ============================================================================
// Pregnancy risk factors
// ============================================================================

pub const PREPREGNANCY_DIABETES: FieldLocator = condition(
    "73211009",
    "Prepregnancy diabetes",
    category::RISK_FACTORS,
    Section::MedicalInformation,
    Subject::Mother,
);
pub const GESTATIONAL_DIABETES: FieldLocator = condition(
    "11687002",
    "Gestational diabetes",
    category::RISK_FACTORS,
    Section::MedicalInformation,
    Subject::Mother,
);
pub const PREPREGNANCY_HYPERTENSION: FieldLocator = condition(
    "38341003",
    "Prepregnancy hypertension",
    category::RISK_FACTORS,
    Section::MedicalInformation,
    Subject::Mother,
);
pub const GESTATIONAL_HYPERTENSION: FieldLocator = condition(
    "48194001",
    "Gestational hypertension",
    category::RISK_FACTORS,
    Section::MedicalInformation,
    Subject::Mother,
);
pub const ECLAMPSIA: FieldLocator = condition(
    "15938005",
    "Eclampsia hypertension",
    category::RISK_FACTORS,
    Section::MedicalInformation,
    Subject::Mother,
);
pub const PREVIOUS_PRETERM_BIRTH: FieldLocator = condition(
    "161765003",
    "Previous preterm birth",
    category::RISK_FACTORS,
    Section::MedicalInformation,
    Subject::Mother,
);
pub const NO_RISK_FACTORS: FieldLocator = none_of(
    category::RISK_FACTORS,
    Section::MedicalInformation,
    Subject::Mother,
);

// ============================================================================
// Infections present during pregnancy
// ============================================================================

pub const GONORRHEA: FieldLocator = condition(
    "15628003",
    "Gonorrhea",
    category::INFECTIONS,
    Section::Prenatal,
    Subject::Mother,
);
pub const SYPHILIS: FieldLocator = condition(
    "76272004",
    "Syphilis",
    category::INFECTIONS,
    Section::Prenatal,
    Subject::Mother,
);
pub const CHLAMYDIA: FieldLocator = condition(
    "105629000",
    "Chlamydia",
    category::INFECTIONS,
    Section::Prenatal,
    Subject::Mother,
);
pub const HEPATITIS_B: FieldLocator = condition(
    "66071002",
    "Hepatitis B",
    category::INFECTIONS,
    Section::Prenatal,
    Subject::Mother,
);
pub const HEPATITIS_C: FieldLocator = condition(
    "50711007",
    "Hepatitis C",
    category::INFECTIONS,
    Section::Prenatal,
    Subject::Mother,
);
pub const NO_INFECTIONS: FieldLocator =
    none_of(category::INFECTIONS, Section::Prenatal, Subject::Mother);

// ============================================================================
// Obstetric procedures
// ============================================================================

pub const CERVICAL_CERCLAGE: FieldLocator = procedure(
    "399500001",
    "Cervical cerclage",
    category::OBSTETRIC_PROCEDURES,
    Section::Prenatal,
    Subject::Mother,
);
pub const TOCOLYSIS: FieldLocator = procedure(
    "434611000124106",
    "Tocolysis",
    category::OBSTETRIC_PROCEDURES,
    Section::Prenatal,
    Subject::Mother,
);
pub const NO_OBSTETRIC_PROCEDURES: FieldLocator = none_of(
    category::OBSTETRIC_PROCEDURES,
    Section::Prenatal,
    Subject::Mother,
);

// ============================================================================
// Characteristics of labor and delivery
// ============================================================================

pub const INDUCTION_OF_LABOR: FieldLocator = procedure(
    "236958009",
    "Induction of labor",
    category::LABOR_CHARACTERISTICS,
    Section::LaborAndDelivery,
    Subject::Mother,
);
pub const AUGMENTATION_OF_LABOR: FieldLocator = procedure(
    "237001001",
    "Augmentation of labor",
    category::LABOR_CHARACTERISTICS,
    Section::LaborAndDelivery,
    Subject::Mother,
);
pub const EPIDURAL_ANESTHESIA: FieldLocator = procedure(
    "18946005",
    "Epidural or spinal anesthesia",
    category::LABOR_CHARACTERISTICS,
    Section::LaborAndDelivery,
    Subject::Mother,
);
pub const STEROIDS: FieldLocator = procedure(
    "434611000124107",
    "Steroids for fetal lung maturation",
    category::LABOR_CHARACTERISTICS,
    Section::LaborAndDelivery,
    Subject::Mother,
);
pub const CHORIOAMNIONITIS: FieldLocator = condition(
    "11612004",
    "Chorioamnionitis",
    category::LABOR_CHARACTERISTICS,
    Section::LaborAndDelivery,
    Subject::Mother,
);
pub const NO_LABOR_CHARACTERISTICS: FieldLocator = none_of(
    category::LABOR_CHARACTERISTICS,
    Section::LaborAndDelivery,
    Subject::Mother,
);

// ============================================================================
// Abnormal conditions of the newborn
// ============================================================================

pub const ASSISTED_VENTILATION: FieldLocator = procedure(
    "167247000",
    "Assisted ventilation immediately following delivery",
    category::ABNORMAL_CONDITIONS,
    Section::NewbornInformation,
    Subject::Child,
);
pub const NICU_ADMISSION: FieldLocator = procedure(
    "830077005",
    "Admission to NICU",
    category::ABNORMAL_CONDITIONS,
    Section::NewbornInformation,
    Subject::Child,
);
pub const SURFACTANT: FieldLocator = procedure(
    "434701000124101",
    "Surfactant replacement therapy",
    category::ABNORMAL_CONDITIONS,
    Section::NewbornInformation,
    Subject::Child,
);
pub const SEIZURE: FieldLocator = condition(
    "91175000",
    "Seizure or serious neurologic dysfunction",
    category::ABNORMAL_CONDITIONS,
    Section::NewbornInformation,
    Subject::Child,
);
pub const NO_ABNORMAL_CONDITIONS: FieldLocator = none_of(
    category::ABNORMAL_CONDITIONS,
    Section::NewbornInformation,
    Subject::Child,
);

// ============================================================================
// Congenital anomalies of the newborn
// ============================================================================

pub const ANENCEPHALY: FieldLocator = condition(
    "89369001",
    "Anencephaly",
    category::CONGENITAL_ANOMALIES,
    Section::NewbornInformation,
    Subject::Child,
);
pub const SPINA_BIFIDA: FieldLocator = condition(
    "67531005",
    "Meningomyelocele or spina bifida",
    category::CONGENITAL_ANOMALIES,
    Section::NewbornInformation,
    Subject::Child,
);
pub const CLEFT_LIP: FieldLocator = condition(
    "80281008",
    "Cleft lip with or without cleft palate",
    category::CONGENITAL_ANOMALIES,
    Section::NewbornInformation,
    Subject::Child,
);
pub const DOWN_SYNDROME: FieldLocator = condition(
    "70156005",
    "Down syndrome",
    category::CONGENITAL_ANOMALIES,
    Section::NewbornInformation,
    Subject::Child,
);
pub const NO_CONGENITAL_ANOMALIES: FieldLocator = none_of(
    category::CONGENITAL_ANOMALIES,
    Section::NewbornInformation,
    Subject::Child,
);

// ============================================================================
// Measurements and counts
// ============================================================================

pub const APGAR_5: FieldLocator = observation(
    "9274-2",
    codes::LOINC,
    "5 minute Apgar score",
    Section::NewbornInformation,
    Subject::Child,
);
pub const APGAR_10: FieldLocator = observation(
    "9271-8",
    codes::LOINC,
    "10 minute Apgar score",
    Section::NewbornInformation,
    Subject::Child,
);
pub const PLURALITY: FieldLocator = observation(
    "57722-1",
    codes::LOINC,
    "Birth plurality",
    Section::NewbornInformation,
    Subject::Child,
);
pub const BIRTH_WEIGHT: FieldLocator = observation(
    "8339-4",
    codes::LOINC,
    "Birth weight",
    Section::NewbornInformation,
    Subject::Child,
);
pub const GESTATIONAL_AGE: FieldLocator = observation(
    "11884-4",
    codes::LOINC,
    "Gestational age at birth",
    Section::NewbornInformation,
    Subject::Child,
);
pub const PREPREGNANCY_WEIGHT: FieldLocator = observation(
    "56077-1",
    codes::LOINC,
    "Prepregnancy weight",
    Section::Prenatal,
    Subject::Mother,
);
pub const DELIVERY_WEIGHT: FieldLocator = observation(
    "69461-6",
    codes::LOINC,
    "Mother's weight at delivery",
    Section::Prenatal,
    Subject::Mother,
);
pub const PREVIOUS_CESAREANS: FieldLocator = observation(
    "68497-1",
    codes::LOINC,
    "Number of previous cesarean deliveries",
    Section::MedicalInformation,
    Subject::Mother,
);
pub const FIRST_PRENATAL_CARE: FieldLocator = observation(
    "69044-6",
    codes::LOINC,
    "Date of first prenatal care visit",
    Section::Prenatal,
    Subject::Mother,
);
pub const LAST_MENSES: FieldLocator = observation(
    "8665-2",
    codes::LOINC,
    "Date last menstrual period began",
    Section::Prenatal,
    Subject::Mother,
);

// ============================================================================
// Coded values
// ============================================================================

pub const ATTENDANT_TITLE: FieldLocator = observation(
    "87287-9",
    codes::LOINC,
    "Birth attendant title",
    Section::LaborAndDelivery,
    Subject::Mother,
);
pub const PAYMENT_SOURCE: FieldLocator = observation(
    "52556-8",
    codes::LOINC,
    "Principal source of payment for this delivery",
    Section::LaborAndDelivery,
    Subject::Mother,
);

const fn coded(
    code: &'static str,
    display: &'static str,
    subject: Subject,
    component: Option<&'static str>,
) -> FieldLocator {
    FieldLocator {
        kind: EntryKind::Observation,
        code,
        system: codes::VR_OBSERVATION_CODES,
        display,
        category: None,
        section: Section::CodedContent,
        subject,
        component,
    }
}

pub const MOTHER_FIRST_EDITED_RACE: FieldLocator = coded(
    "codedraceandethnicity",
    "Coded race and ethnicity",
    Subject::Mother,
    Some("FirstEditedCode"),
);
pub const MOTHER_EDITED_ETHNICITY: FieldLocator = coded(
    "codedraceandethnicity",
    "Coded race and ethnicity",
    Subject::Mother,
    Some("HispanicCode"),
);
pub const FATHER_FIRST_EDITED_RACE: FieldLocator = coded(
    "codedraceandethnicity",
    "Coded race and ethnicity",
    Subject::Father,
    Some("FirstEditedCode"),
);
pub const FATHER_EDITED_ETHNICITY: FieldLocator = coded(
    "codedraceandethnicity",
    "Coded race and ethnicity",
    Subject::Father,
    Some("HispanicCode"),
);

pub const MOTHER_OCCUPATION: FieldLocator = coded(
    "21843-8",
    "History of usual occupation",
    Subject::Mother,
    None,
);
pub const MOTHER_INDUSTRY: FieldLocator = coded(
    "21843-8",
    "History of usual occupation",
    Subject::Mother,
    Some("21844-6"),
);
pub const FATHER_OCCUPATION: FieldLocator = coded(
    "21843-8",
    "History of usual occupation",
    Subject::Father,
    None,
);
pub const FATHER_INDUSTRY: FieldLocator = coded(
    "21843-8",
    "History of usual occupation",
    Subject::Father,
    Some("21844-6"),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{CodeableConcept, Coding, Reference};

    fn entry(code: &str, category: Option<&str>, subject: Option<&str>) -> ClinicalEntry {
        ClinicalEntry {
            code: Some(CodeableConcept::from_coding(Coding::new(
                codes::SNOMED,
                code,
                None,
            ))),
            category: category
                .map(|c| {
                    vec![CodeableConcept::from_coding(Coding::new(
                        codes::VR_CATEGORIES,
                        c,
                        None,
                    ))]
                })
                .unwrap_or_default(),
            subject: subject.map(Reference::to),
            ..ClinicalEntry::default()
        }
    }

    #[test]
    fn matches_on_code_category_and_subject() {
        let e = entry("11687002", Some(category::RISK_FACTORS), Some("urn:uuid:mother"));
        assert!(GESTATIONAL_DIABETES.matches(EntryKind::Condition, &e, Some("urn:uuid:mother")));
        assert!(!GESTATIONAL_DIABETES.matches(EntryKind::Condition, &e, Some("urn:uuid:child")));
        assert!(!GESTATIONAL_DIABETES.matches(EntryKind::Procedure, &e, Some("urn:uuid:mother")));
        assert!(!PREPREGNANCY_DIABETES.matches(EntryKind::Condition, &e, Some("urn:uuid:mother")));
    }

    #[test]
    fn none_marker_is_scoped_to_its_category() {
        let e = entry(codes::NONE_OF_THE_ABOVE, Some(category::INFECTIONS), None);
        assert!(NO_INFECTIONS.matches(EntryKind::Observation, &e, None));
        assert!(!NO_RISK_FACTORS.matches(EntryKind::Observation, &e, None));
        assert!(NO_INFECTIONS.is_exclusive_marker());
        assert!(!GONORRHEA.is_exclusive_marker());
    }

    #[test]
    fn section_codes_round_trip() {
        for section in Section::ALL {
            assert_eq!(Section::from_code(section.code()), Some(section));
        }
        assert_eq!(Section::from_code("00000-0"), None);
    }
}
