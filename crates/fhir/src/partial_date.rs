//! Dates whose components may be known, explicitly unknown, or not yet specified.
//!
//! On the wire a date is either a primitive literal (`2023`, `2023-04`, `2023-04-17`) or, when a
//! component is unknown or missing out of order, a `PartialDate`/`PartialDateTime` extension on
//! the primitive's `_element` sibling with one sub-extension per component. A fully known birth
//! date and time is written as the date literal plus a `patient-birthTime` extension.

use chrono::NaiveTime;
use vrx_types::Component;

use crate::codes;
use crate::wire::{Element, Extension};

const YEAR: &str = "date-year";
const MONTH: &str = "date-month";
const DAY: &str = "date-day";
const TIME: &str = "time";

/// Year, month, day and time of day, each independently known, unknown or unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartialDateTime {
    pub year: Component<u32>,
    pub month: Component<u32>,
    pub day: Component<u32>,
    pub time: Component<NaiveTime>,
}

/// One of the numeric date components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DatePart {
    Year,
    Month,
    Day,
}

impl PartialDateTime {
    pub fn is_unset(&self) -> bool {
        self.year.is_unset() && self.month.is_unset() && self.day.is_unset() && self.time.is_unset()
    }

    pub fn part(&self, part: DatePart) -> Component<u32> {
        match part {
            DatePart::Year => self.year,
            DatePart::Month => self.month,
            DatePart::Day => self.day,
        }
    }

    pub fn set_part(&mut self, part: DatePart, value: Component<u32>) {
        match part {
            DatePart::Year => self.year = value,
            DatePart::Month => self.month = value,
            DatePart::Day => self.day = value,
        }
    }

    /// The most specific date literal, if every specified component is known and the
    /// specified components form a year, year-month or year-month-day prefix.
    pub fn date_literal(&self) -> Option<String> {
        use Component::{Known, Unset};
        match (self.year, self.month, self.day) {
            (Known(y), Unset, Unset) => Some(format!("{y:04}")),
            (Known(y), Known(m), Unset) => Some(format!("{y:04}-{m:02}")),
            (Known(y), Known(m), Known(d)) => Some(format!("{y:04}-{m:02}-{d:02}")),
            _ => None,
        }
    }

    fn is_full_date(&self) -> bool {
        self.year.is_known() && self.month.is_known() && self.day.is_known()
    }

    /// Reads a date from its primitive literal and `_element` sibling.
    ///
    /// Components present in a literal that parses cleanly win over the extension.
    pub fn read(literal: Option<&str>, element: Option<&Element>) -> Self {
        let mut value = element
            .and_then(|e| e.extension.iter().find(|x| is_partial_date(x)))
            .map(from_extension)
            .unwrap_or_default();

        if let Some(parsed) = literal.and_then(parse_literal) {
            value.year = parsed.year;
            if parsed.month.is_known() {
                value.month = parsed.month;
            }
            if parsed.day.is_known() {
                value.day = parsed.day;
            }
            if parsed.time.is_known() {
                value.time = parsed.time;
            }
        }

        if let Some(time) = element
            .and_then(|e| e.extension.iter().find(|x| x.url == codes::BIRTH_TIME_URL))
            .and_then(|x| x.value_date_time.as_deref())
            .and_then(parse_literal)
            .map(|p| p.time)
            .filter(Component::is_known)
        {
            value.time = time;
        }

        value
    }

    /// Writes this date into a primitive literal and its `_element` sibling.
    ///
    /// Extensions on the element that are not date extensions are kept.
    pub fn write(&self, literal: &mut Option<String>, element: &mut Option<Element>) {
        let mut kept: Vec<Extension> = element
            .take()
            .map(|e| e.extension)
            .unwrap_or_default()
            .into_iter()
            .filter(|x| !is_partial_date(x) && x.url != codes::BIRTH_TIME_URL)
            .collect();

        let date_literal = self.date_literal();
        match (date_literal, self.time) {
            (Some(date), Component::Unset) => {
                *literal = Some(date);
            }
            (Some(date), Component::Known(time)) if self.is_full_date() => {
                let mut birth_time = Extension::new(codes::BIRTH_TIME_URL);
                birth_time.value_date_time = Some(format!("{date}T{}", time.format("%H:%M:%S")));
                kept.push(birth_time);
                *literal = Some(date);
            }
            _ if self.is_unset() => {
                *literal = None;
            }
            _ => {
                *literal = None;
                kept.push(self.to_extension());
            }
        }

        *element = (!kept.is_empty()).then(|| Element { extension: kept });
    }

    fn to_extension(&self) -> Extension {
        let url = if self.time.is_unset() {
            codes::PARTIAL_DATE_URL
        } else {
            codes::PARTIAL_DATE_TIME_URL
        };
        let mut ext = Extension::new(url);
        for (name, value) in [(YEAR, self.year), (MONTH, self.month), (DAY, self.day)] {
            match value {
                Component::Known(v) => {
                    let mut sub = Extension::new(name);
                    sub.value_unsigned_int = Some(v);
                    ext.extension.push(sub);
                }
                Component::Unknown => {
                    let mut sub = Extension::new(name);
                    sub.value_unsigned_int_element = Some(Element::with_extension(unknown_reason()));
                    ext.extension.push(sub);
                }
                Component::Unset => {}
            }
        }
        match self.time {
            Component::Known(t) => {
                let mut sub = Extension::new(TIME);
                sub.value_time = Some(t.format("%H:%M:%S").to_string());
                ext.extension.push(sub);
            }
            Component::Unknown => {
                let mut sub = Extension::new(TIME);
                sub.value_time_element = Some(Element::with_extension(unknown_reason()));
                ext.extension.push(sub);
            }
            Component::Unset => {}
        }
        ext
    }
}

fn from_extension(ext: &Extension) -> PartialDateTime {
    let number = |name: &str| -> Component<u32> {
        let Some(sub) = ext.extension.iter().find(|x| x.url == name) else {
            return Component::Unset;
        };
        match sub.value_unsigned_int {
            Some(v) => Component::Known(v),
            None if sub
                .value_unsigned_int_element
                .as_ref()
                .is_some_and(is_absent) =>
            {
                Component::Unknown
            }
            None => Component::Unset,
        }
    };
    let time = match ext.extension.iter().find(|x| x.url == TIME) {
        Some(sub) => match sub.value_time.as_deref().and_then(parse_time) {
            Some(t) => Component::Known(t),
            None if sub.value_time_element.as_ref().is_some_and(is_absent) => Component::Unknown,
            None => Component::Unset,
        },
        None => Component::Unset,
    };
    PartialDateTime {
        year: number(YEAR),
        month: number(MONTH),
        day: number(DAY),
        time,
    }
}

fn is_partial_date(ext: &Extension) -> bool {
    ext.url == codes::PARTIAL_DATE_URL || ext.url == codes::PARTIAL_DATE_TIME_URL
}

fn is_absent(element: &Element) -> bool {
    element
        .extension
        .iter()
        .any(|x| x.url == codes::DATA_ABSENT_REASON_URL)
}

fn unknown_reason() -> Extension {
    let mut ext = Extension::new(codes::DATA_ABSENT_REASON_URL);
    ext.value_code = Some("unknown".to_string());
    ext
}

/// Parses `YYYY`, `YYYY-MM`, `YYYY-MM-DD` or `YYYY-MM-DDThh:mm[:ss]...`.
///
/// Returns `None` if the literal does not parse cleanly.
pub fn parse_literal(literal: &str) -> Option<PartialDateTime> {
    let (date, time) = match literal.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (literal, None),
    };
    let mut parts = date.split('-');
    let mut next = |width: usize| -> Option<Component<u32>> {
        match parts.next() {
            Some(p) if p.len() == width && p.bytes().all(|b| b.is_ascii_digit()) => {
                p.parse().ok().map(Component::Known)
            }
            Some(_) => None,
            None => Some(Component::Unset),
        }
    };
    let year = next(4)?;
    let month = next(2)?;
    let day = next(2)?;
    if year.is_unset() || (month.is_unset() && !day.is_unset()) {
        return None;
    }
    let time = match time {
        Some(t) if day.is_known() => Component::Known(parse_time(t)?),
        Some(_) => return None,
        None => Component::Unset,
    };
    Some(PartialDateTime {
        year,
        month,
        day,
        time,
    })
}

/// Parses `hh:mm` or `hh:mm:ss`, ignoring fractional seconds and any zone suffix.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let clock: String = text
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ':')
        .collect();
    NaiveTime::parse_from_str(&clock, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&clock, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use Component::{Known, Unknown, Unset};

    fn date(year: Component<u32>, month: Component<u32>, day: Component<u32>) -> PartialDateTime {
        PartialDateTime {
            year,
            month,
            day,
            time: Unset,
        }
    }

    fn written(value: &PartialDateTime) -> (Option<String>, Option<Element>) {
        let mut literal = None;
        let mut element = None;
        value.write(&mut literal, &mut element);
        (literal, element)
    }

    #[test]
    fn known_prefixes_are_written_as_literals() {
        assert_eq!(
            written(&date(Known(2023), Unset, Unset)),
            (Some("2023".into()), None)
        );
        assert_eq!(
            written(&date(Known(2023), Known(4), Unset)),
            (Some("2023-04".into()), None)
        );
        assert_eq!(
            written(&date(Known(2023), Known(4), Known(7))),
            (Some("2023-04-07".into()), None)
        );
    }

    #[test]
    fn unknown_components_go_to_the_extension() {
        let value = date(Known(2023), Unknown, Known(7));
        let (literal, element) = written(&value);

        assert_eq!(literal, None);
        let element = element.expect("element written");
        assert_eq!(element.extension[0].url, codes::PARTIAL_DATE_URL);
        assert_eq!(PartialDateTime::read(None, Some(&element)), value);
    }

    #[test]
    fn unset_gap_is_not_a_literal() {
        let value = date(Known(2023), Unset, Known(7));
        let (literal, element) = written(&value);
        assert_eq!(literal, None);
        assert_eq!(PartialDateTime::read(None, element.as_ref()), value);
    }

    #[test]
    fn full_date_with_time_uses_birth_time_extension() {
        let value = PartialDateTime {
            time: Known(NaiveTime::from_hms_opt(13, 5, 0).unwrap()),
            ..date(Known(2023), Known(1), Known(1))
        };
        let (literal, element) = written(&value);

        assert_eq!(literal.as_deref(), Some("2023-01-01"));
        let element = element.expect("element written");
        assert_eq!(element.extension[0].url, codes::BIRTH_TIME_URL);
        assert_eq!(
            element.extension[0].value_date_time.as_deref(),
            Some("2023-01-01T13:05:00")
        );
        assert_eq!(PartialDateTime::read(literal.as_deref(), Some(&element)), value);
    }

    #[test]
    fn unknown_time_uses_partial_date_time() {
        let value = PartialDateTime {
            time: Unknown,
            ..date(Known(2023), Known(1), Known(1))
        };
        let (literal, element) = written(&value);
        assert_eq!(literal, None);
        let element = element.expect("element written");
        assert_eq!(element.extension[0].url, codes::PARTIAL_DATE_TIME_URL);
        assert_eq!(PartialDateTime::read(None, Some(&element)), value);
    }

    #[test]
    fn literal_wins_over_extension() {
        let (_, element) = written(&date(Known(1999), Unknown, Unknown));
        let read = PartialDateTime::read(Some("2001-02-03"), element.as_ref());
        assert_eq!(read, date(Known(2001), Known(2), Known(3)));
    }

    #[test]
    fn unrelated_extensions_survive_rewrites() {
        let mut element = Some(Element::with_extension(Extension::new(
            codes::BYPASS_EDIT_FLAG_URL,
        )));
        let mut literal = None;
        date(Known(1990), Unknown, Unset).write(&mut literal, &mut element);
        date(Known(1990), Known(5), Unset).write(&mut literal, &mut element);

        let element = element.expect("flag kept");
        assert_eq!(literal.as_deref(), Some("1990-05"));
        assert_eq!(element.extension.len(), 1);
        assert_eq!(element.extension[0].url, codes::BYPASS_EDIT_FLAG_URL);
    }

    #[test]
    fn malformed_literals_are_ignored() {
        assert_eq!(parse_literal("20-01-01"), None);
        assert_eq!(parse_literal("2020-1"), None);
        assert_eq!(parse_literal("2020-01T10:00"), None);
        assert_eq!(
            parse_literal("2020-01-02T10:30:00-05:00").map(|p| p.time),
            Some(Known(NaiveTime::from_hms_opt(10, 30, 0).unwrap()))
        );
    }
}
