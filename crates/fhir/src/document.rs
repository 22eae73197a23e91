//! Document graph: the entry list and the manifest that indexes it.
//!
//! A vital record is an ordered list of entries (each a resource with a `urn:uuid:` full URL)
//! plus a manifest (the Composition) whose sections reference those entries. An empty section
//! carries an "unavailable" empty-reason placeholder instead of references.

use uuid::Uuid;

use crate::codes;
use crate::locator::Section;
use crate::wire::{
    CodeableConcept, Coding, Composition, CompositionSection, Meta, Reference, Resource,
};

/// A resource in the document, addressed by its full URL.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub full_url: String,
    pub resource: Resource,
}

/// Mints a resource id and its `urn:uuid:` full URL.
pub fn mint_address() -> (String, String) {
    let id = Uuid::new_v4().to_string();
    let full_url = format!("urn:uuid:{id}");
    (id, full_url)
}

/// The ordered entries of a document, excluding the manifest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    entries: Vec<Entry>,
}

impl Document {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: Entry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn position(&self, full_url: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.full_url == full_url)
    }

    pub fn get(&self, full_url: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.full_url == full_url)
    }

    /// Removes the entry at `full_url`, returning it if present.
    pub fn remove(&mut self, full_url: &str) -> Option<Entry> {
        let idx = self.position(full_url)?;
        Some(self.entries.remove(idx))
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

/// The document's table of contents: a Composition with one section per [`Section`].
#[derive(Clone, Debug, PartialEq)]
pub struct Manifest {
    full_url: String,
    composition: Composition,
}

impl Manifest {
    /// Builds an empty manifest with every section present and marked as having no entries.
    pub fn new(type_: CodeableConcept, profile: &str) -> Self {
        let (id, full_url) = mint_address();
        let composition = Composition {
            id: Some(id),
            meta: Some(Meta {
                profile: vec![profile.to_string()],
            }),
            status: Some("final".to_string()),
            type_: Some(type_),
            subject: None,
            date: None,
            title: None,
            section: Section::ALL.into_iter().map(empty_section).collect(),
        };
        Self {
            full_url,
            composition,
        }
    }

    /// Wraps a parsed Composition as-is.
    pub fn from_composition(full_url: String, composition: Composition) -> Self {
        Self {
            full_url,
            composition,
        }
    }

    pub fn full_url(&self) -> &str {
        &self.full_url
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn composition_mut(&mut self) -> &mut Composition {
        &mut self.composition
    }

    pub fn into_parts(self) -> (String, Composition) {
        (self.full_url, self.composition)
    }

    /// Lists `target` in `section`, clearing the empty placeholder. Listing twice is a no-op.
    pub fn add_reference(&mut self, section: Section, target: &str) {
        let section = self.section_mut(section);
        section.empty_reason = None;
        if !section.entry.iter().any(|r| r.points_to(target)) {
            section.entry.push(Reference::to(target));
        }
    }

    /// Removes `target` from every section; a section left empty regains the placeholder.
    pub fn remove_reference(&mut self, target: &str) {
        for section in &mut self.composition.section {
            let before = section.entry.len();
            section.entry.retain(|r| !r.points_to(target));
            if before != section.entry.len() && section.entry.is_empty() {
                section.empty_reason = Some(no_entries());
            }
        }
    }

    pub fn references(&self, section: Section) -> Vec<&str> {
        self.section(section)
            .map(|s| {
                s.entry
                    .iter()
                    .filter_map(|r| r.reference.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_listed(&self, target: &str) -> bool {
        self.composition
            .section
            .iter()
            .any(|s| s.entry.iter().any(|r| r.points_to(target)))
    }

    fn section(&self, section: Section) -> Option<&CompositionSection> {
        self.composition
            .section
            .iter()
            .find(|s| is_section(s, section))
    }

    fn section_mut(&mut self, section: Section) -> &mut CompositionSection {
        let idx = match self
            .composition
            .section
            .iter()
            .position(|s| is_section(s, section))
        {
            Some(idx) => idx,
            None => {
                self.composition.section.push(empty_section(section));
                self.composition.section.len() - 1
            }
        };
        &mut self.composition.section[idx]
    }
}

fn is_section(candidate: &CompositionSection, section: Section) -> bool {
    candidate
        .code
        .as_ref()
        .is_some_and(|c| c.has_code(None, section.code()))
}

fn empty_section(section: Section) -> CompositionSection {
    CompositionSection {
        title: Some(section.title().to_string()),
        code: Some(CodeableConcept::from_coding(Coding::new(
            codes::LOINC,
            section.code(),
            None,
        ))),
        entry: Vec::new(),
        empty_reason: Some(no_entries()),
    }
}

fn no_entries() -> CodeableConcept {
    CodeableConcept::from_coding(Coding::new(
        codes::LIST_EMPTY_REASON,
        codes::NO_ENTRIES,
        Some("Unavailable"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        Manifest::new(
            CodeableConcept::from_coding(Coding::new(codes::LOINC, "71230-7", None)),
            "http://example.org/profile",
        )
    }

    #[test]
    fn new_manifest_marks_every_section_empty() {
        let m = manifest();
        assert_eq!(m.composition().section.len(), Section::ALL.len());
        assert!(m
            .composition()
            .section
            .iter()
            .all(|s| s.entry.is_empty() && s.empty_reason.is_some()));
        assert!(m.full_url().starts_with("urn:uuid:"));
    }

    #[test]
    fn placeholder_is_cleared_on_add_and_restored_on_last_removal() {
        let mut m = manifest();
        m.add_reference(Section::Prenatal, "urn:uuid:a");
        m.add_reference(Section::Prenatal, "urn:uuid:b");
        m.add_reference(Section::Prenatal, "urn:uuid:a");

        assert_eq!(
            m.references(Section::Prenatal),
            vec!["urn:uuid:a", "urn:uuid:b"]
        );
        assert!(m.section(Section::Prenatal).unwrap().empty_reason.is_none());

        m.remove_reference("urn:uuid:a");
        assert!(m.section(Section::Prenatal).unwrap().empty_reason.is_none());

        m.remove_reference("urn:uuid:b");
        assert!(m.references(Section::Prenatal).is_empty());
        assert!(m.section(Section::Prenatal).unwrap().empty_reason.is_some());
        assert!(!m.is_listed("urn:uuid:b"));
    }

    #[test]
    fn document_remove_returns_the_entry() {
        let (_, url) = mint_address();
        let mut doc = Document::default();
        doc.push(Entry {
            full_url: url.clone(),
            resource: Resource::Other(Default::default()),
        });

        assert!(doc.get(&url).is_some());
        assert!(doc.remove(&url).is_some());
        assert!(doc.is_empty());
        assert!(doc.remove(&url).is_none());
    }
}
