//! Fixed-width line layout derived from the field registry.

use std::collections::HashMap;
use std::sync::LazyLock;

use fhir::{FieldDescriptor, FlatFieldDescriptor};

/// Total length of a natality line.
pub const LINE_LENGTH: usize = 4000;

/// One fixed-width position and the field it belongs to.
#[derive(Clone, Copy, Debug)]
pub struct Slot {
    pub field: &'static FieldDescriptor,
    pub flat: &'static FlatFieldDescriptor,
}

/// The ordered positions of a line.
#[derive(Debug)]
pub struct Layout {
    slots: Vec<Slot>,
    decode_order: Vec<usize>,
    by_mnemonic: HashMap<&'static str, usize>,
    length: usize,
}

static NATALITY: LazyLock<Layout> =
    LazyLock::new(|| Layout::build(fhir::fields::all(), LINE_LENGTH));

impl Layout {
    /// Layout shared by birth and fetal death lines.
    pub fn natality() -> &'static Layout {
        &NATALITY
    }

    fn build(fields: &'static [FieldDescriptor], length: usize) -> Self {
        let mut slots: Vec<Slot> = fields
            .iter()
            .flat_map(|field| field.flat.iter().map(move |flat| Slot { field, flat }))
            .collect();
        slots.sort_by_key(|s| s.flat.offset);

        let mut decode_order: Vec<usize> = (0..slots.len()).collect();
        decode_order.sort_by_key(|&i| (slots[i].flat.priority, slots[i].flat.offset));

        let by_mnemonic = slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.flat.mnemonic, i))
            .collect();

        Layout {
            slots,
            decode_order,
            by_mnemonic,
            length,
        }
    }

    /// Positions in column order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Positions in the order a decode must apply them.
    pub fn decode_order(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.decode_order.iter().map(|&i| &self.slots[i])
    }

    pub fn get(&self, mnemonic: &str) -> Option<&Slot> {
        self.by_mnemonic.get(mnemonic).map(|&i| &self.slots[i])
    }

    pub fn length(&self) -> usize {
        self.length
    }
}
