//! Structural analysis of a parsed metadata tree.
//!
//! Recognizes the known top-level sections and builds the lookup indices
//! used when dumping. Layout positions are fixed by the platform:
//!
//! ```text
//! {                                   root
//!   {"Documents",                     section, name at 0
//!     {"<id>", "<name>", ...,         object, id at 0
//!       {"Head Fields",               field group, name at 0
//!         {"<id>", ..., "<ref>", ...} field descriptor, ref target at 7
//! ```
//!
//! Unknown layouts are skipped one section or one field at a time; they
//! never abort the analysis.

use std::collections::BTreeMap;

use log::{info, trace};

use super::models::{Node, NodePath, SectionType};

/// Section holding general-journal field descriptors directly, without objects.
const JOURNAL_FIELDS_SECTION: &[u8] = b"GenJrnlFldDef";

/// Names of the field groups inside an object.
const FIELD_GROUPS: [&[u8]; 2] = [b"Head Fields", b"Table Fields"];

/// Position of the referenced type id inside a field descriptor.
const REF_TARGET_POS: usize = 7;

/// Reference target meaning "no reference".
const NO_REFERENCE: &[u8] = b"0";

/// Object-id → type tag.
pub type TypeIndex = BTreeMap<Vec<u8>, SectionType>;

/// Field-id → referenced type id.
pub type ReferenceIndex = BTreeMap<Vec<u8>, Vec<u8>>;

/// Object-id → location of the object node in the analyzed tree.
pub type ObjectIndex = BTreeMap<Vec<u8>, NodePath>;

/// The three indices derived from one tree. Always built and replaced together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indices {
    pub types: TypeIndex,
    pub references: ReferenceIndex,
    pub objects: ObjectIndex,
}

impl Indices {
    /// Analyze `root` and build a fresh set of indices.
    pub fn build(root: &Node) -> Self {
        let mut indices = Indices::default();

        for (pos, section) in root.children().iter().enumerate() {
            let Some(Node::Leaf(name)) = section.child(0) else {
                continue;
            };
            let section_path = NodePath::default().child(pos);

            if let Some(section_type) = SectionType::from_section_name(name) {
                trace!(
                    "Section {} ({} objects)",
                    String::from_utf8_lossy(name),
                    section.len().saturating_sub(1)
                );
                for (i, object) in section.children().iter().enumerate().skip(1) {
                    indices.scan_object(object, section_path.child(i), section_type);
                }
            } else if name.as_slice() == JOURNAL_FIELDS_SECTION {
                for descriptor in section.children().iter().skip(1) {
                    indices.scan_field(descriptor);
                }
            } else {
                trace!("Skipping section {}", String::from_utf8_lossy(name));
            }
        }

        info!(
            "Structure analyzed: {} objects, {} references",
            indices.types.len(),
            indices.references.len()
        );
        indices
    }

    pub fn type_of(&self, id: &[u8]) -> Option<SectionType> {
        self.types.get(id).copied()
    }

    pub fn reference_of(&self, field_id: &[u8]) -> Option<&[u8]> {
        self.references.get(field_id).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.references.is_empty() && self.objects.is_empty()
    }

    fn scan_object(&mut self, object: &Node, path: NodePath, section_type: SectionType) {
        let id = object.first_value();
        if id.is_empty() {
            trace!("Skipping object without id at {:?}", path);
            return;
        }

        self.types.insert(id.to_vec(), section_type);
        self.objects.insert(id.to_vec(), path);

        for group in object.children().iter().skip(1) {
            let name = group.first_value();
            if FIELD_GROUPS.iter().any(|&g| g == name) {
                for descriptor in group.children().iter().skip(1) {
                    self.scan_field(descriptor);
                }
            }
        }
    }

    fn scan_field(&mut self, descriptor: &Node) {
        if descriptor.len() <= REF_TARGET_POS {
            return;
        }
        let field_id = descriptor.first_value();
        let target = descriptor.child(REF_TARGET_POS).map(Node::value).unwrap_or_default();

        if !field_id.is_empty() && !target.is_empty() && target != NO_REFERENCE {
            trace!(
                "Field {} references {}",
                String::from_utf8_lossy(field_id),
                String::from_utf8_lossy(target)
            );
            self.references.insert(field_id.to_vec(), target.to_vec());
        }
    }
}
