use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::annotationtype::AnnotationTypeHandle;
use crate::compare::compare;
use crate::config::{Config, Configurable};
use crate::error::CurationError;
use crate::json::ToJson;
use crate::record::{AnnotationRecord, RecordHandle};
use crate::store::ResultItem;
use crate::types::*;
use crate::version::VersionSet;

/// A record taking part in a diff, along with the annotator that owns it
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    annotator: &'a str,
    record: ResultItem<'a, AnnotationRecord>,
}

impl<'a> Candidate<'a> {
    pub fn annotator(&self) -> &'a str {
        self.annotator
    }

    pub fn record(&self) -> ResultItem<'a, AnnotationRecord> {
        self.record
    }
}

/// Partitions the records of a single annotation type, across all annotators, by their exact span.
/// Only records covered by the requested window are taken into account.
#[derive(Debug)]
pub struct SpanGroups<'a> {
    buckets: BTreeMap<Span, Vec<Candidate<'a>>>,
}

impl<'a> SpanGroups<'a> {
    pub fn new(
        annotationtype: AnnotationTypeHandle,
        versions: &VersionSet<'a>,
        begin: usize,
        end: usize,
    ) -> Self {
        let mut buckets: BTreeMap<Span, Vec<Candidate<'a>>> = BTreeMap::new();
        for version in versions.iter() {
            for record in version.records_in_window(annotationtype, begin, end) {
                buckets.entry(record.span()).or_default().push(Candidate {
                    annotator: version.annotator(),
                    record,
                });
            }
        }
        Self { buckets }
    }

    /// Iterates over all spans and the records found at them, in span order
    pub fn iter(&self) -> impl Iterator<Item = (&Span, &[Candidate<'a>])> {
        self.buckets
            .iter()
            .map(|(span, candidates)| (span, candidates.as_slice()))
    }

    /// Returns the records at the given span
    pub fn get(&self, span: &Span) -> Option<&[Candidate<'a>]> {
        self.buckets.get(span).map(|candidates| candidates.as_slice())
    }

    /// Returns the number of distinct spans
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// A position is a single (type, span) bucket from a diff: the records all annotators made there,
/// partitioned into groups of mutually equal records (readings).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    #[serde(rename = "type")]
    typename: String,
    span: Span,
    /// The records at this position with their annotator, in annotator order
    records: Vec<(String, RecordHandle)>,
    /// Equal readings, as indices into `records`. Each record is in exactly one group and a group never holds two records of the same annotator.
    groups: Vec<Vec<usize>>,
}

impl Position {
    pub fn typename(&self) -> &str {
        self.typename.as_str()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn begin(&self) -> usize {
        self.span.begin()
    }

    pub fn end(&self) -> usize {
        self.span.end()
    }

    /// Returns all records at this position as (annotator, record) pairs
    pub fn records(&self) -> &[(String, RecordHandle)] {
        &self.records
    }

    /// Returns the distinct annotators that have a record at this position
    pub fn annotators(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .map(|(annotator, _)| annotator.as_str())
            .collect()
    }

    /// Does the given annotator have a record at this position?
    pub fn has_annotator(&self, annotator: &str) -> bool {
        self.records.iter().any(|(a, _)| a == annotator)
    }

    /// Does the position hold this particular record?
    pub fn contains(&self, annotator: &str, record: RecordHandle) -> bool {
        self.records
            .iter()
            .any(|(a, handle)| a == annotator && *handle == record)
    }

    /// Iterates over the groups of mutually equal records
    pub fn groups(&self) -> impl Iterator<Item = Vec<(&str, RecordHandle)>> + '_ {
        self.groups.iter().map(move |group| {
            group
                .iter()
                .map(|index| {
                    let (annotator, handle) = &self.records[*index];
                    (annotator.as_str(), *handle)
                })
                .collect()
        })
    }

    /// Returns the number of distinct readings
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// The result of a diff: for each annotator the set of records that differ from at least one other version,
/// and the positions (type, span) that were compared.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiffResult {
    annotators: Vec<String>,
    differing: BTreeMap<String, BTreeSet<RecordHandle>>,
    positions: Vec<Position>,

    /// Maps records to their index in `positions`
    #[serde(skip)]
    position_index: HashMap<(String, RecordHandle), usize>,
}

impl PartialEq for DiffResult {
    fn eq(&self, other: &Self) -> bool {
        self.annotators == other.annotators
            && self.differing == other.differing
            && self.positions == other.positions
    }
}

impl DiffResult {
    fn new(annotators: Vec<String>) -> Self {
        let differing = annotators
            .iter()
            .map(|annotator| (annotator.clone(), BTreeSet::new()))
            .collect();
        Self {
            annotators,
            differing,
            ..Self::default()
        }
    }

    fn flag(&mut self, annotator: &str, record: RecordHandle) {
        if let Some(set) = self.differing.get_mut(annotator) {
            set.insert(record);
        } else {
            self.differing
                .insert(annotator.to_string(), BTreeSet::from([record]));
        }
    }

    fn add_position(&mut self, position: Position) {
        let index = self.positions.len();
        for (annotator, handle) in position.records.iter() {
            self.position_index.insert((annotator.clone(), *handle), index);
        }
        self.positions.push(position);
    }

    /// Returns true if no record of any annotator differs
    pub fn is_empty(&self) -> bool {
        self.differing.values().all(|set| set.is_empty())
    }

    /// Returns the total number of differing records, over all annotators
    pub fn len(&self) -> usize {
        self.differing.values().map(|set| set.len()).sum()
    }

    /// Returns the annotators that were compared, in order
    pub fn annotators(&self) -> &[String] {
        &self.annotators
    }

    pub fn annotator_count(&self) -> usize {
        self.annotators.len()
    }

    /// Returns the set of differing records of one annotator
    pub fn differing(&self, annotator: &str) -> Option<&BTreeSet<RecordHandle>> {
        self.differing.get(annotator)
    }

    /// Is this record of this annotator part of the difference?
    pub fn is_differing(&self, annotator: &str, record: RecordHandle) -> bool {
        self.differing
            .get(annotator)
            .map(|set| set.contains(&record))
            .unwrap_or(false)
    }

    /// Iterates over annotators and their differing records
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<RecordHandle>)> {
        self.differing
            .iter()
            .map(|(annotator, set)| (annotator.as_str(), set))
    }

    /// Returns all compared positions, ordered by type (in request order) and span
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Returns the position at which the given record was compared, if the diff saw it
    pub fn position_of(&self, annotator: &str, record: RecordHandle) -> Option<&Position> {
        self.position_index
            .get(&(annotator.to_string(), record))
            .map(|index| &self.positions[*index])
    }

    /// Returns the position for a type at a span, if any records were found there
    pub fn position_at(&self, typename: &str, span: Span) -> Option<&Position> {
        self.positions
            .iter()
            .find(|position| position.typename == typename && position.span == span)
    }
}

impl ToJson for DiffResult {}

/// Per-type partial result, merged into a [`DiffResult`]
struct TypeDiff {
    differing: Vec<(String, RecordHandle)>,
    positions: Vec<Position>,
}

/// The diff engine computes, for a set of annotator versions, which records differ from consensus
/// and which readings annotators share at every position.
///
/// The engine is stateless apart from its configuration; it only borrows the versions for the duration of a call.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: Config,
}

impl Configurable for DiffEngine {
    fn config(&self) -> &Config {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn set_config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }
}

impl DiffEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Computes the diff over the whole document, i.e. the window `[0, textlen)`.
    /// Versions must agree on the length of the document text.
    pub fn compute_diff_document(
        &self,
        types: &[&str],
        versions: &VersionSet,
    ) -> Result<DiffResult, CurationError> {
        let textlen = versions.textlen()?;
        self.compute_diff(types, versions, 0, textlen)
    }

    /// Computes the diff of the given annotation types over all records covered by the window `[begin, end)`.
    ///
    /// Records are bucketed by exact span, across annotators. A bucket holding fewer records than there are
    /// annotators has all its records flagged as differing. Every pair of distinct records in a bucket (including
    /// two records of the same annotator) is compared structurally, and whatever the comparison reports as
    /// differing is flagged for its owner.
    ///
    /// An empty version set yields an empty result. A [`CurationError::ComparisonError`] aborts the computation.
    pub fn compute_diff(
        &self,
        types: &[&str],
        versions: &VersionSet,
        begin: usize,
        end: usize,
    ) -> Result<DiffResult, CurationError> {
        let mut result = DiffResult::new(versions.annotators().map(|a| a.to_string()).collect());
        let typesystem = match versions.typesystem() {
            Some(typesystem) => typesystem,
            None => return Ok(result),
        };

        let mut seen = HashSet::new();
        let mut requested: Vec<(AnnotationTypeHandle, &str)> = Vec::with_capacity(types.len());
        for typename in types {
            if seen.insert(*typename) {
                requested.push((typesystem.resolve_type(typename)?, *typename));
            }
        }

        debug(&self.config, || {
            format!(
                "DiffEngine.compute_diff: {} type(s), {} annotator(s), window [{},{})",
                requested.len(),
                versions.len(),
                begin,
                end
            )
        });

        let typediffs = self.diff_types(&requested, versions, begin, end)?;
        for typediff in typediffs {
            for (annotator, handle) in typediff.differing {
                result.flag(&annotator, handle);
            }
            for position in typediff.positions {
                result.add_position(position);
            }
        }

        debug(&self.config, || {
            format!(
                "DiffEngine.compute_diff: ^--- {} position(s), {} differing record(s)",
                result.positions.len(),
                result.len()
            )
        });
        Ok(result)
    }

    #[cfg(feature = "parallel")]
    fn diff_types(
        &self,
        requested: &[(AnnotationTypeHandle, &str)],
        versions: &VersionSet,
        begin: usize,
        end: usize,
    ) -> Result<Vec<TypeDiff>, CurationError> {
        if self.config.parallel() && requested.len() > 1 {
            //collect preserves the order of the requested types
            requested
                .par_iter()
                .map(|(handle, typename)| self.diff_type(*handle, typename, versions, begin, end))
                .collect()
        } else {
            requested
                .iter()
                .map(|(handle, typename)| self.diff_type(*handle, typename, versions, begin, end))
                .collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn diff_types(
        &self,
        requested: &[(AnnotationTypeHandle, &str)],
        versions: &VersionSet,
        begin: usize,
        end: usize,
    ) -> Result<Vec<TypeDiff>, CurationError> {
        requested
            .iter()
            .map(|(handle, typename)| self.diff_type(*handle, typename, versions, begin, end))
            .collect()
    }

    fn diff_type(
        &self,
        annotationtype: AnnotationTypeHandle,
        typename: &str,
        versions: &VersionSet,
        begin: usize,
        end: usize,
    ) -> Result<TypeDiff, CurationError> {
        let annotator_count = versions.len();
        let groups = SpanGroups::new(annotationtype, versions, begin, end);
        let mut typediff = TypeDiff {
            differing: Vec::new(),
            positions: Vec::with_capacity(groups.len()),
        };

        for (span, candidates) in groups.iter() {
            if candidates.len() < annotator_count {
                debug(&self.config, || {
                    format!(
                        "DiffEngine.diff_type: {} {} is incomplete ({} of {} records)",
                        typename,
                        span,
                        candidates.len(),
                        annotator_count
                    )
                });
                for candidate in candidates {
                    typediff
                        .differing
                        .push((candidate.annotator.to_string(), candidate.record.handle()));
                }
            }

            let mut equal: HashSet<(usize, usize)> = HashSet::new();
            for (i, a) in candidates.iter().enumerate() {
                for (j, b) in candidates.iter().enumerate().skip(i + 1) {
                    let verdict = compare(a.record, b.record)?;
                    if verdict.is_equal() {
                        equal.insert((i, j));
                    } else {
                        debug(&self.config, || {
                            format!(
                                "DiffEngine.diff_type: {} {} records of {} and {} differ",
                                typename, span, a.annotator, b.annotator
                            )
                        });
                        for handle in verdict.left() {
                            typediff.differing.push((a.annotator.to_string(), *handle));
                        }
                        for handle in verdict.right() {
                            typediff.differing.push((b.annotator.to_string(), *handle));
                        }
                    }
                }
            }

            typediff.positions.push(Position {
                typename: typename.to_string(),
                span: *span,
                records: candidates
                    .iter()
                    .map(|c| (c.annotator.to_string(), c.record.handle()))
                    .collect(),
                groups: group_readings(candidates, &equal),
            });
        }
        Ok(typediff)
    }
}

/// Partitions the records of a bucket into readings: a record joins the first group whose first member
/// it compared equal to and which holds no record of the same annotator yet, otherwise it starts a new group.
fn group_readings(candidates: &[Candidate], equal: &HashSet<(usize, usize)>) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        let target = groups.iter_mut().find(|group| {
            equal.contains(&(group[0], i))
                && !group
                    .iter()
                    .any(|k| candidates[*k].annotator == candidate.annotator)
        });
        match target {
            Some(group) => group.push(i),
            None => groups.push(vec![i]),
        }
    }
    groups
}

/// Computes a diff with the default configuration, see [`DiffEngine::compute_diff()`]
pub fn compute_diff(
    types: &[&str],
    versions: &VersionSet,
    begin: usize,
    end: usize,
) -> Result<DiffResult, CurationError> {
    DiffEngine::default().compute_diff(types, versions, begin, end)
}
