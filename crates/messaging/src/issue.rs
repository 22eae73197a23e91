//! Problems reported by error messages.

use fhir::wire::OutcomeIssue;

/// How serious an issue is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Information,
}

impl Severity {
    pub fn as_code(self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "information",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "fatal" => Some(Severity::Fatal),
            "error" => Some(Severity::Error),
            "warning" => Some(Severity::Warning),
            "information" => Some(Severity::Information),
            _ => None,
        }
    }
}

/// What kind of problem an issue describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    Invalid,
    Structure,
    Required,
    Value,
    NotSupported,
    Exception,
}

impl IssueCode {
    pub fn as_code(self) -> &'static str {
        match self {
            IssueCode::Invalid => "invalid",
            IssueCode::Structure => "structure",
            IssueCode::Required => "required",
            IssueCode::Value => "value",
            IssueCode::NotSupported => "not-supported",
            IssueCode::Exception => "exception",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "invalid" => Some(IssueCode::Invalid),
            "structure" => Some(IssueCode::Structure),
            "required" => Some(IssueCode::Required),
            "value" => Some(IssueCode::Value),
            "not-supported" => Some(IssueCode::NotSupported),
            "exception" => Some(IssueCode::Exception),
            _ => None,
        }
    }
}

/// One problem with a message or its record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub code: IssueCode,
    pub description: String,
}

impl Issue {
    pub fn new(severity: Severity, code: IssueCode, description: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            description: description.into(),
        }
    }

    pub(crate) fn to_wire(&self) -> OutcomeIssue {
        OutcomeIssue {
            severity: self.severity.as_code().to_string(),
            code: self.code.as_code().to_string(),
            diagnostics: Some(self.description.clone()),
        }
    }

    /// Reads a wire issue; unrecognised codes are returned for the caller to judge.
    pub(crate) fn from_wire(issue: &OutcomeIssue) -> Result<Self, String> {
        let severity = Severity::from_code(&issue.severity)
            .ok_or_else(|| format!("issue severity {:?}", issue.severity))?;
        let code = IssueCode::from_code(&issue.code)
            .ok_or_else(|| format!("issue code {:?}", issue.code))?;
        Ok(Self {
            severity,
            code,
            description: issue.diagnostics.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_uses_outcome_codes() {
        let issue = Issue::new(Severity::Fatal, IssueCode::NotSupported, "no such type");
        let wire = issue.to_wire();
        assert_eq!(wire.severity, "fatal");
        assert_eq!(wire.code, "not-supported");
        assert_eq!(Issue::from_wire(&wire).expect("known codes"), issue);
    }

    #[test]
    fn unknown_codes_are_named() {
        let wire = OutcomeIssue {
            severity: "catastrophic".into(),
            code: "invalid".into(),
            diagnostics: None,
        };
        let err = Issue::from_wire(&wire).expect_err("unknown severity");
        assert!(err.contains("catastrophic"));
    }
}
