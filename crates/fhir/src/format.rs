//! Structured text formats for documents and messages.

use serde::Serialize;
use serde_json::Value;

use crate::{FhirError, FhirResult};

/// A structured rendering of the wire model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// Guesses the format from the first non-whitespace character.
    ///
    /// XML is recognised only to be refused.
    pub fn detect(text: &str) -> FhirResult<Self> {
        match text.trim_start().chars().next() {
            Some('{') | Some('[') => Ok(Format::Json),
            Some('<') => Err(FhirError::UnsupportedFormat("XML".into())),
            Some(_) => Ok(Format::Yaml),
            None => Err(FhirError::InvalidInput("empty document".into())),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    /// Parses text in this format into a generic value.
    pub fn read(self, text: &str) -> FhirResult<Value> {
        Ok(match self {
            Format::Json => serde_json::from_str(text)?,
            Format::Yaml => serde_yaml::from_str(text)?,
        })
    }

    /// Renders a wire value in this format. JSON output is pretty-printed.
    pub fn write<T: Serialize>(self, value: &T) -> FhirResult<String> {
        Ok(match self {
            Format::Json => serde_json::to_string_pretty(value)?,
            Format::Yaml => serde_yaml::to_string(value)?,
        })
    }
}

/// Detects the format of `text` and parses it into a generic value.
pub fn read_any(text: &str) -> FhirResult<(Value, Format)> {
    let format = Format::detect(text)?;
    Ok((format.read(text)?, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_json_and_yaml() {
        assert_eq!(Format::detect("  {\"a\":1}").expect("json"), Format::Json);
        assert_eq!(Format::detect("resourceType: Bundle").expect("yaml"), Format::Yaml);
    }

    #[test]
    fn xml_is_refused_with_a_distinct_error() {
        let err = Format::detect("<Bundle xmlns=\"http://hl7.org/fhir\"/>").expect_err("xml");
        assert!(matches!(err, FhirError::UnsupportedFormat(_)));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = read_any("{ not json").expect_err("malformed");
        assert!(matches!(err, FhirError::InvalidJson(_)));
    }

    #[test]
    fn yaml_and_json_read_to_the_same_value() {
        let (from_yaml, _) = read_any("resourceType: Bundle\ntype: document\n").expect("yaml");
        let (from_json, _) =
            read_any(r#"{"resourceType":"Bundle","type":"document"}"#).expect("json");
        assert_eq!(from_yaml, from_json);
    }
}
