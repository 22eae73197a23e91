//! Code systems, extension URLs, profiles and reserved codes used by vital record documents.

pub const LOINC: &str = "http://loinc.org";
pub const SNOMED: &str = "http://snomed.info/sct";
pub const UCUM: &str = "http://unitsofmeasure.org";
pub const NULL_FLAVOR: &str = "http://terminology.hl7.org/CodeSystem/v3-NullFlavor";
pub const ROLE_CODE: &str = "http://terminology.hl7.org/CodeSystem/v3-RoleCode";
pub const IDENTIFIER_TYPE: &str = "http://terminology.hl7.org/CodeSystem/v2-0203";
pub const LIST_EMPTY_REASON: &str = "http://terminology.hl7.org/CodeSystem/list-empty-reason";
pub const DATA_ABSENT_REASON_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/data-absent-reason";

pub const DATA_ABSENT_REASON_URL: &str =
    "http://hl7.org/fhir/StructureDefinition/data-absent-reason";
pub const BIRTH_TIME_URL: &str = "http://hl7.org/fhir/StructureDefinition/patient-birthTime";

pub const PARTIAL_DATE_URL: &str =
    "http://hl7.org/fhir/us/vr-common-library/StructureDefinition/PartialDate";
pub const PARTIAL_DATE_TIME_URL: &str =
    "http://hl7.org/fhir/us/vr-common-library/StructureDefinition/PartialDateTime";
pub const CERTIFICATE_NUMBER_URL: &str =
    "http://hl7.org/fhir/us/vr-common-library/StructureDefinition/CertificateNumber";
pub const AUXILIARY_STATE_ID_URL: &str =
    "http://hl7.org/fhir/us/vr-common-library/StructureDefinition/AuxiliaryStateIdentifier1";
pub const BYPASS_EDIT_FLAG_URL: &str =
    "http://hl7.org/fhir/us/vr-common-library/StructureDefinition/BypassEditFlag";
pub const CITY_CODE_URL: &str =
    "http://hl7.org/fhir/us/vr-common-library/StructureDefinition/CityCode";
pub const DISTRICT_CODE_URL: &str =
    "http://hl7.org/fhir/us/vr-common-library/StructureDefinition/DistrictCode";
pub const WITHIN_CITY_LIMITS_URL: &str =
    "http://hl7.org/fhir/us/vr-common-library/StructureDefinition/WithinCityLimitsIndicator";

pub const VR_OBSERVATION_CODES: &str =
    "http://hl7.org/fhir/us/vr-common-library/CodeSystem/CodeSystem-local-observation-codes-vr";
pub const VR_EDIT_FLAGS: &str =
    "http://hl7.org/fhir/us/vr-common-library/CodeSystem/CodeSystem-vr-edit-flags";
pub const VR_RACE_CODE: &str =
    "http://hl7.org/fhir/us/vr-common-library/CodeSystem/CodeSystem-vr-race-code";
pub const VR_HISPANIC_CODE: &str =
    "http://hl7.org/fhir/us/vr-common-library/CodeSystem/CodeSystem-vr-hispanic-code";
pub const VR_CATEGORIES: &str =
    "http://hl7.org/fhir/us/vr-common-library/CodeSystem/CodeSystem-vr-observation-categories";

pub const PAYER_GROUPING: &str = "urn:oid:2.16.840.1.113883.3.221.5";
pub const CENSUS_OCCUPATION: &str = "urn:oid:2.16.840.1.114222.4.5.314";
pub const CENSUS_INDUSTRY: &str = "urn:oid:2.16.840.1.114222.4.5.315";

pub const RECORD_ID_SYSTEM: &str = "http://nchs.cdc.gov/vrx_id";

pub const CHILD_PROFILE: &str = "http://hl7.org/fhir/us/bfdr/StructureDefinition/Patient-child";
pub const DECEDENT_FETUS_PROFILE: &str =
    "http://hl7.org/fhir/us/bfdr/StructureDefinition/Patient-decedent-fetus";
pub const MOTHER_PROFILE: &str =
    "http://hl7.org/fhir/us/vr-common-library/StructureDefinition/Patient-mother-vr";
pub const FATHER_PROFILE: &str =
    "http://hl7.org/fhir/us/vr-common-library/StructureDefinition/RelatedPerson-father-natural-vr";
pub const EVENT_LOCATION_PROFILE: &str =
    "http://hl7.org/fhir/us/bfdr/StructureDefinition/Location-bfdr";

/// "None of the above" marker code, mutually exclusive with specific findings in a category.
pub const NONE_OF_THE_ABOVE: &str = "260413007";
/// "Unknown" marker code, mutually exclusive with specific findings in a category.
pub const UNKNOWN: &str = "UNK";

/// True for the reserved codes that stand for a whole category.
pub fn is_exclusive_marker(code: &str) -> bool {
    code == NONE_OF_THE_ABOVE || code == UNKNOWN
}

/// Placeholder section content meaning "no entries".
pub const NO_ENTRIES: &str = "unavailable";

/// Observation category codes grouping mutually exclusive findings.
pub mod category {
    pub const RISK_FACTORS: &str = "pregnancy-risk-factors";
    pub const INFECTIONS: &str = "infections-present-during-pregnancy";
    pub const OBSTETRIC_PROCEDURES: &str = "obstetric-procedures";
    pub const LABOR_CHARACTERISTICS: &str = "characteristics-of-labor-and-delivery";
    pub const ABNORMAL_CONDITIONS: &str = "abnormal-conditions-of-newborn";
    pub const CONGENITAL_ANOMALIES: &str = "congenital-anomalies-of-the-newborn";
}
