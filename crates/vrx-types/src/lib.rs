//! Shared value types for the VRX crates.
//!
//! These are small, validated primitives that more than one boundary crate needs:
//! - [`NonEmptyText`] for endpoints and identifiers that must not be blank
//! - [`Component`] for values that can be known, explicitly unknown, or not yet specified
//! - [`YesNoUnknown`] for checkbox-style answers on vital records

mod component;

pub use component::{Component, YesNoUnknown, LEGACY_UNKNOWN};

/// Errors raised by the validated text types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    #[error("text is blank")]
    Blank,
}

/// Text with surrounding whitespace removed and at least one character left.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// # Errors
    ///
    /// [`TextError::Blank`] when nothing but whitespace is given.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        match input.as_ref().trim() {
            "" => Err(TextError::Blank),
            text => Ok(Self(text.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
