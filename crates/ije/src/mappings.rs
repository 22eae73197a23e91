//! Code translation tables for mapped fixed-width fields.
//!
//! The tables ship inside the crate as YAML and are parsed once on first use. After that they
//! are read-only and shared by every decode and encode.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use fhir::CodeTable;
use serde::Deserialize;

const BUILTIN_TABLES: &str = include_str!("mappings.yaml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTables {
    sex: BTreeMap<String, String>,
    birthplace_type: BTreeMap<String, String>,
    attendant_title: BTreeMap<String, String>,
    payment_source: BTreeMap<String, String>,
    edit_flag: BTreeMap<String, String>,
}

/// One bidirectional table.
#[derive(Debug, Default)]
struct Table {
    to_canonical: HashMap<String, String>,
    to_ije: HashMap<String, String>,
}

impl Table {
    fn from_pairs(pairs: BTreeMap<String, String>) -> Self {
        let mut table = Table::default();
        for (ije, canonical) in pairs {
            table.to_ije.insert(canonical.clone(), ije.clone());
            table.to_canonical.insert(ije, canonical);
        }
        table
    }
}

struct Tables {
    sex: Table,
    birthplace_type: Table,
    attendant_title: Table,
    payment_source: Table,
    edit_flag: Table,
}

impl Tables {
    fn table(&self, which: CodeTable) -> &Table {
        match which {
            CodeTable::Sex => &self.sex,
            CodeTable::BirthplaceType => &self.birthplace_type,
            CodeTable::AttendantTitle => &self.attendant_title,
            CodeTable::PaymentSource => &self.payment_source,
            CodeTable::EditFlag => &self.edit_flag,
        }
    }
}

static TABLES: LazyLock<Tables> = LazyLock::new(|| {
    let raw: RawTables =
        serde_yaml::from_str(BUILTIN_TABLES).expect("builtin mapping tables must parse");
    Tables {
        sex: Table::from_pairs(raw.sex),
        birthplace_type: Table::from_pairs(raw.birthplace_type),
        attendant_title: Table::from_pairs(raw.attendant_title),
        payment_source: Table::from_pairs(raw.payment_source),
        edit_flag: Table::from_pairs(raw.edit_flag),
    }
});

/// Translates a fixed-width code into its canonical code.
pub fn to_canonical(table: CodeTable, ije: &str) -> Option<&'static str> {
    TABLES
        .table(table)
        .to_canonical
        .get(ije.trim())
        .map(String::as_str)
}

/// Translates a canonical code into its fixed-width code.
pub fn to_ije(table: CodeTable, canonical: &str) -> Option<&'static str> {
    TABLES
        .table(table)
        .to_ije
        .get(canonical)
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CodeTable; 5] = [
        CodeTable::Sex,
        CodeTable::BirthplaceType,
        CodeTable::AttendantTitle,
        CodeTable::PaymentSource,
        CodeTable::EditFlag,
    ];

    #[test]
    fn builtin_tables_are_one_to_one() {
        for which in ALL {
            let table = TABLES.table(which);
            assert!(!table.to_canonical.is_empty(), "{which:?} is empty");
            assert_eq!(
                table.to_canonical.len(),
                table.to_ije.len(),
                "{which:?} maps two codes to one"
            );
        }
    }

    #[test]
    fn lookups_work_both_ways() {
        assert_eq!(to_canonical(CodeTable::Sex, "F"), Some("female"));
        assert_eq!(to_ije(CodeTable::Sex, "female"), Some("F"));
        assert_eq!(to_canonical(CodeTable::BirthplaceType, "1"), Some("22232009"));
        assert_eq!(to_ije(CodeTable::PaymentSource, "UNK"), Some("9"));
        assert_eq!(to_canonical(CodeTable::EditFlag, "7"), None);
    }
}
