use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::diff::{DiffResult, Position};
use crate::option::AnnotationSelection;
use crate::record::RecordHandle;

/// Classification of a position (or of one reading at a position) for presentation purposes.
/// It is computed fresh on every render from a [`DiffResult`] and any curator decision, and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnotationState {
    AcceptedByCurator,
    RejectedByCurator,
    AnnotatorsAgree,
    AnnotatorsDisagree,
    AnnotatorsIncomplete,
    /// A record is being presented that the diff never saw. This signals a bug in the caller.
    Error,
}

impl fmt::Display for AnnotationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AcceptedByCurator => "ACCEPTED_BY_CURATOR",
            Self::RejectedByCurator => "REJECTED_BY_CURATOR",
            Self::AnnotatorsAgree => "ANNOTATORS_AGREE",
            Self::AnnotatorsDisagree => "ANNOTATORS_DISAGREE",
            Self::AnnotatorsIncomplete => "ANNOTATORS_INCOMPLETE",
            Self::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

/// What the curator decided at a position, as supplied by whoever persists curation decisions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CuratorDecision {
    /// The curator picked this reading
    Accepted(AnnotationSelection),
    /// The curator rejected every reading at the position
    Rejected,
}

/// Derives [`AnnotationState`]s from a diff. Holds no state of its own besides a reference to the diff.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    diff: &'a DiffResult,
}

impl<'a> Classifier<'a> {
    pub fn new(diff: &'a DiffResult) -> Self {
        Self { diff }
    }

    /// Classifies a position as a whole. With a decision, the position is accepted or rejected by the curator,
    /// otherwise annotators agree, are incomplete or disagree.
    /// An accepted reading only counts if it belongs to this position, a reading from elsewhere is ignored.
    pub fn classify(
        &self,
        position: &Position,
        decision: Option<&CuratorDecision>,
    ) -> AnnotationState {
        match decision {
            Some(CuratorDecision::Accepted(chosen)) if is_reading_at(chosen, position) => {
                AnnotationState::AcceptedByCurator
            }
            Some(CuratorDecision::Rejected) => AnnotationState::RejectedByCurator,
            _ => self.classify_annotators(position),
        }
    }

    /// Classifies one reading offered at a position. If the curator made a decision, the chosen reading is
    /// accepted and every other reading is rejected.
    pub fn classify_selection(
        &self,
        position: &Position,
        selection: &AnnotationSelection,
        decision: Option<&CuratorDecision>,
    ) -> AnnotationState {
        match decision {
            Some(CuratorDecision::Accepted(chosen)) if is_reading_at(chosen, position) => {
                if chosen == selection {
                    AnnotationState::AcceptedByCurator
                } else {
                    AnnotationState::RejectedByCurator
                }
            }
            Some(CuratorDecision::Rejected) => AnnotationState::RejectedByCurator,
            _ => self.classify_annotators(position),
        }
    }

    /// Classifies the position holding a particular record. A record the diff never saw yields [`AnnotationState::Error`].
    pub fn classify_record(
        &self,
        annotator: &str,
        record: RecordHandle,
        decision: Option<&CuratorDecision>,
    ) -> AnnotationState {
        match self.diff.position_of(annotator, record) {
            Some(position) => self.classify(position, decision),
            None => {
                tracing::warn!(
                    target: "curation",
                    "record {} of annotator {} was not covered by the diff",
                    record,
                    annotator
                );
                AnnotationState::Error
            }
        }
    }

    fn classify_annotators(&self, position: &Position) -> AnnotationState {
        let present = position.annotators().len();
        let total = self.diff.annotator_count();
        if present < total {
            AnnotationState::AnnotatorsIncomplete
        } else if position
            .records()
            .iter()
            .any(|(annotator, handle)| self.diff.is_differing(annotator, *handle))
        {
            AnnotationState::AnnotatorsDisagree
        } else {
            AnnotationState::AnnotatorsAgree
        }
    }

    /// Counts the positions of the diff per state, for filtering. Decisions are looked up by position index.
    pub fn summary(
        &self,
        decisions: &BTreeMap<usize, CuratorDecision>,
    ) -> BTreeMap<AnnotationState, usize> {
        let mut summary = BTreeMap::new();
        for (index, position) in self.diff.positions().iter().enumerate() {
            let state = self.classify(position, decisions.get(&index));
            *summary.entry(state).or_insert(0) += 1;
        }
        summary
    }
}

/// Does the selection name a reading at this position? Every address must be a record of the position.
fn is_reading_at(selection: &AnnotationSelection, position: &Position) -> bool {
    !selection.is_empty()
        && selection
            .addresses()
            .iter()
            .all(|(annotator, record)| position.contains(annotator, *record))
}

/// Classifies a position with the given diff, see [`Classifier::classify()`]
pub fn classify(
    position: &Position,
    diff: &DiffResult,
    decision: Option<&CuratorDecision>,
) -> AnnotationState {
    Classifier::new(diff).classify(position, decision)
}
