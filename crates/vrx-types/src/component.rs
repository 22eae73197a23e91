//! Three-state values used throughout vital records.

/// A value that is known, explicitly recorded as unknown, or not yet specified.
///
/// Vital records distinguish "the informant said they do not know" ([`Component::Unknown`])
/// from "nobody has filled this in yet" ([`Component::Unset`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Component<T> {
    /// A concrete value.
    Known(T),
    /// Explicitly recorded as unknown.
    Unknown,
    /// Not yet specified.
    #[default]
    Unset,
}

impl<T> Component<T> {
    /// Returns the known value, if any.
    pub fn known(self) -> Option<T> {
        match self {
            Component::Known(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Component<&T> {
        match self {
            Component::Known(value) => Component::Known(value),
            Component::Unknown => Component::Unknown,
            Component::Unset => Component::Unset,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Component::Known(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Component::Unknown)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Component::Unset)
    }

    /// Maps a known value, leaving the unknown and unset states untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Component<U> {
        match self {
            Component::Known(value) => Component::Known(f(value)),
            Component::Unknown => Component::Unknown,
            Component::Unset => Component::Unset,
        }
    }
}

impl<T> From<Option<T>> for Component<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Component::Unset, Component::Known)
    }
}

/// Legacy numeric sentinel for "explicitly unknown" used by comparison tooling.
pub const LEGACY_UNKNOWN: i64 = -1;

impl Component<u32> {
    /// Converts from the legacy integer convention: `None` is unset and `-1` is unknown.
    ///
    /// Other negative values are treated as unset.
    pub fn from_legacy(value: Option<i64>) -> Self {
        match value {
            None => Component::Unset,
            Some(LEGACY_UNKNOWN) => Component::Unknown,
            Some(v) => u32::try_from(v).map_or(Component::Unset, Component::Known),
        }
    }

    /// Converts to the legacy integer convention.
    pub fn to_legacy(self) -> Option<i64> {
        match self {
            Component::Known(value) => Some(i64::from(value)),
            Component::Unknown => Some(LEGACY_UNKNOWN),
            Component::Unset => None,
        }
    }
}

/// Answer to a checkbox-style question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum YesNoUnknown {
    Yes,
    No,
    Unknown,
}

impl YesNoUnknown {
    /// Parses the single-letter form. Anything other than `Y` or `N` is unknown.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "Y" | "y" => YesNoUnknown::Yes,
            "N" | "n" => YesNoUnknown::No,
            _ => YesNoUnknown::Unknown,
        }
    }

    /// Returns the single-letter form.
    pub fn as_code(self) -> &'static str {
        match self {
            YesNoUnknown::Yes => "Y",
            YesNoUnknown::No => "N",
            YesNoUnknown::Unknown => "U",
        }
    }
}

impl From<bool> for YesNoUnknown {
    fn from(value: bool) -> Self {
        if value {
            YesNoUnknown::Yes
        } else {
            YesNoUnknown::No
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_sentinel_maps_to_unknown() {
        assert_eq!(Component::from_legacy(Some(-1)), Component::Unknown);
        assert_eq!(Component::from_legacy(None), Component::Unset);
        assert_eq!(Component::from_legacy(Some(123)), Component::Known(123));
        assert_eq!(Component::<u32>::Unknown.to_legacy(), Some(-1));
    }

    #[test]
    fn yes_no_unknown_codes() {
        assert_eq!(YesNoUnknown::from_code("Y"), YesNoUnknown::Yes);
        assert_eq!(YesNoUnknown::from_code("N"), YesNoUnknown::No);
        assert_eq!(YesNoUnknown::from_code(" "), YesNoUnknown::Unknown);
        assert_eq!(YesNoUnknown::from_code("X"), YesNoUnknown::Unknown);
        assert_eq!(YesNoUnknown::Unknown.as_code(), "U");
    }
}
