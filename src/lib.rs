/*
    Curation: multi-annotator annotation diff and agreement classification

        Licensed under the GNU General Public License v3
*/

//! ## Introduction
//!
//! This library supports *curation*: reconciling annotations that multiple annotators produced
//! independently over the same document into a single agreed annotation set. Given N annotated
//! versions of one document it
//!
//! * determines, position by position, whether annotators agree, disagree or are incomplete;
//! * produces, per annotator, the exact set of annotation records that differ from consensus;
//! * groups equivalent records across annotators into selectable options a curator can choose between.
//!
//! It does not merge anything automatically, and does not persist curator decisions.
//!
//! **Model**
//! * [`TypeSystem`] with [`AnnotationType`]s, each declaring [`Field`]s of a [`FieldKind`]
//! * [`AnnotatorVersion`] - one annotator's snapshot, holding [`AnnotationRecord`]s, addressed by [`RecordHandle`]
//! * [`VersionSet`] - the versions that take part in a diff
//!
//! **Computation**
//! * [`compare()`] - structural comparison of two records, yields an [`EqualityVerdict`]
//! * [`DiffEngine`] / [`compute_diff()`] - produces a [`DiffResult`] with [`Position`]s
//! * [`Classifier`] / [`classify()`] - derives an [`AnnotationState`] for presentation
//! * [`build_options()`] - builds [`AnnotationOption`]s with [`AnnotationSelection`]s
//!
//! The engine is synchronous and read-only: it borrows the versions for the duration of a call and never mutates them.

mod agreement;
mod annotationtype;
mod compare;
mod config;
mod diff;
mod error;
mod fieldvalue;
mod json;
mod option;
mod record;
mod store;
mod types;
mod version;

// Our internal crate structure is not very relevant to the outside world,
// expose all structs and traits in the root namespace, and be explicit about it:

pub use agreement::{classify, AnnotationState, Classifier, CuratorDecision};
pub use annotationtype::{AnnotationType, AnnotationTypeHandle, Field, FieldKind, TypeSystem};
pub use compare::{compare, EqualityVerdict};
pub use config::{Config, Configurable};
pub use diff::{compute_diff, Candidate, DiffEngine, DiffResult, Position, SpanGroups};
pub use error::{CurationError, CurationResult};
pub use fieldvalue::FieldValue;
pub use json::ToJson;
pub use option::{build_options, AnnotationOption, AnnotationSelection, OptionHandle};
pub use record::{AnnotationRecord, AnnotationRecordBuilder, RecordHandle};
pub use store::{IdMap, ResultItem, Storable, Store, StoreFor, StoreIter};
pub use types::{Handle, Span};
pub use version::{AnnotatorVersion, VersionSet};

mod tests;
