use sealed::sealed;
use serde::Serialize;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::diff::{DiffResult, Position};
use crate::json::ToJson;
use crate::record::RecordHandle;
use crate::types::*;

/// Refers to an [`AnnotationOption`] by its index in the list returned by [`build_options()`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct OptionHandle(u32);

#[sealed]
impl Handle for OptionHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u32)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// One reading at a curation decision point: for every annotator that holds this reading,
/// the address of *their* record. Two selections are equal if they map the same annotators
/// to the same records; the owning option does not take part in equality.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationSelection {
    option: OptionHandle,
    addresses: BTreeMap<String, RecordHandle>,
}

impl PartialEq for AnnotationSelection {
    fn eq(&self, other: &Self) -> bool {
        self.addresses == other.addresses
    }
}

impl Eq for AnnotationSelection {}

impl Hash for AnnotationSelection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addresses.hash(state);
    }
}

impl AnnotationSelection {
    /// Creates an empty selection owned by the given option
    pub fn new(option: OptionHandle) -> Self {
        Self {
            option,
            addresses: BTreeMap::new(),
        }
    }

    /// Builder pattern to add an annotator's record to this reading
    pub fn with_address(mut self, annotator: impl Into<String>, record: RecordHandle) -> Self {
        self.addresses.insert(annotator.into(), record);
        self
    }

    /// The option this selection belongs to
    pub fn option(&self) -> OptionHandle {
        self.option
    }

    /// Maps each annotator holding this reading to their record
    pub fn addresses(&self) -> &BTreeMap<String, RecordHandle> {
        &self.addresses
    }

    /// Returns the record of the given annotator, if they hold this reading
    pub fn address(&self, annotator: &str) -> Option<RecordHandle> {
        self.addresses.get(annotator).copied()
    }

    pub fn annotators(&self) -> impl Iterator<Item = &str> {
        self.addresses.keys().map(|annotator| annotator.as_str())
    }

    /// Returns the number of annotators holding this reading
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// A curation decision point: a type at a span, with the alternative readings a curator can choose between
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationOption {
    handle: OptionHandle,
    #[serde(rename = "type")]
    typename: String,
    span: Span,
    selections: Vec<AnnotationSelection>,
}

impl AnnotationOption {
    pub fn handle(&self) -> OptionHandle {
        self.handle
    }

    pub fn typename(&self) -> &str {
        self.typename.as_str()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// The alternative readings at this position
    pub fn selections(&self) -> &[AnnotationSelection] {
        &self.selections
    }

    /// Returns the (first) reading the given annotator holds
    pub fn selection_of(&self, annotator: &str) -> Option<&AnnotationSelection> {
        self.selections
            .iter()
            .find(|selection| selection.addresses.contains_key(annotator))
    }

    /// Is there a single reading, held by all of the given number of annotators?
    pub fn is_unanimous(&self, annotator_count: usize) -> bool {
        self.selections.len() == 1 && self.selections[0].len() == annotator_count
    }

    fn from_position(handle: OptionHandle, position: &Position) -> Self {
        let mut selections: Vec<AnnotationSelection> = Vec::with_capacity(position.group_count());
        for group in position.groups() {
            let selection = group
                .into_iter()
                .fold(AnnotationSelection::new(handle), |selection, (annotator, record)| {
                    selection.with_address(annotator, record)
                });
            if !selections.contains(&selection) {
                selections.push(selection);
            }
        }
        Self {
            handle,
            typename: position.typename().to_string(),
            span: position.span(),
            selections,
        }
    }
}

impl ToJson for AnnotationOption {}

/// Builds one [`AnnotationOption`] per position of the diff, with one [`AnnotationSelection`] per
/// group of mutually equal records. A reading held by a single annotator is still a selection.
/// The option at index `i` has handle `i` and corresponds with `diff.positions()[i]`.
pub fn build_options(diff: &DiffResult) -> Vec<AnnotationOption> {
    diff.positions()
        .iter()
        .enumerate()
        .map(|(index, position)| AnnotationOption::from_position(OptionHandle::new(index), position))
        .collect()
}
