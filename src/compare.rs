use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::annotationtype::FieldKind;
use crate::error::CurationError;
use crate::fieldvalue::FieldValue;
use crate::record::{AnnotationRecord, RecordHandle};
use crate::store::ResultItem;

/// The outcome of a structural comparison of two records, the *left* and the *right* record.
///
/// For each side it holds the records (the root and/or nested composite descendants) that are
/// part of the difference. Two records are equal if and only if neither side holds anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EqualityVerdict {
    left: BTreeSet<RecordHandle>,
    right: BTreeSet<RecordHandle>,
}

impl EqualityVerdict {
    pub fn is_equal(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Records of the left side's version that are part of the difference
    pub fn left(&self) -> &BTreeSet<RecordHandle> {
        &self.left
    }

    /// Records of the right side's version that are part of the difference
    pub fn right(&self) -> &BTreeSet<RecordHandle> {
        &self.right
    }
}

/// Compares two annotation records structurally, recursing into composite fields.
///
/// * Records whose types differ (by exact name) are unequal, and everything reachable from either root
///   via composite fields is part of the difference.
/// * Integer and string fields are compared by value, where two nulls are equal and null never equals a
///   non-null value. A differing primitive marks both records.
/// * Boolean and float fields can not be compared, and yield a [`CurationError::ComparisonError`].
/// * Composite fields are compared recursively; if only one side has a nested record, that nested record
///   is part of the difference on its own side only.
/// * A record that holds a differing descendant is itself part of the difference.
///
/// Comparing a record with itself is always equal. Cyclic composite graphs terminate: a pair of records
/// that is still being compared higher up in the recursion counts as equal at the point it recurs.
/// A pair reached a second time through shared nested records yields the same result as the first time.
pub fn compare(
    left: ResultItem<'_, AnnotationRecord>,
    right: ResultItem<'_, AnnotationRecord>,
) -> Result<EqualityVerdict, CurationError> {
    let mut verdict = EqualityVerdict::default();
    if left == right {
        return Ok(verdict);
    }
    let mut seen = HashMap::new();
    let (l, r) = compare_records(left, right, &mut seen)?;
    verdict.left = l;
    verdict.right = r;
    Ok(verdict)
}

type Differing = (BTreeSet<RecordHandle>, BTreeSet<RecordHandle>);

/// Pairs of records seen so far in one comparison: `None` while the pair is in progress, the outcome once done
type Seen = HashMap<(RecordHandle, RecordHandle), Option<Differing>>;

fn compare_records(
    left: ResultItem<'_, AnnotationRecord>,
    right: ResultItem<'_, AnnotationRecord>,
    seen: &mut Seen,
) -> Result<Differing, CurationError> {
    let key = (left.handle(), right.handle());
    match seen.get(&key) {
        Some(Some(done)) => return Ok(done.clone()),
        //cycle
        Some(None) => return Ok(Differing::default()),
        None => {}
    }
    seen.insert(key, None);
    let result = compare_fields(left, right, seen)?;
    seen.insert(key, Some(result.clone()));
    Ok(result)
}

fn compare_fields(
    left: ResultItem<'_, AnnotationRecord>,
    right: ResultItem<'_, AnnotationRecord>,
    seen: &mut Seen,
) -> Result<Differing, CurationError> {
    let mut differing_left = BTreeSet::new();
    let mut differing_right = BTreeSet::new();

    if left.typename() != right.typename() {
        subtree(left, &mut differing_left);
        subtree(right, &mut differing_right);
        return Ok((differing_left, differing_right));
    }

    let annotationtype = left.annotationtype();
    for (field, left_value) in annotationtype.fields().iter().zip(left.values()) {
        let right_value = right.value(field.name()).ok_or_else(|| {
            CurationError::SchemaError(
                format!(
                    "type {} of annotator {} has no field {}",
                    right.typename(),
                    right.annotator(),
                    field.name()
                ),
                "Structural comparison",
            )
        })?;
        match field.kind() {
            FieldKind::Integer => {
                if !integer_equals(left_value, right_value) {
                    differing_left.insert(left.handle());
                    differing_right.insert(right.handle());
                }
            }
            FieldKind::String => {
                if !string_equals(left_value, right_value) {
                    differing_left.insert(left.handle());
                    differing_right.insert(right.handle());
                }
            }
            FieldKind::Boolean | FieldKind::Float => {
                return Err(CurationError::ComparisonError(
                    annotationtype.name().to_string(),
                    field.name().to_string(),
                    "range not yet supported",
                ));
            }
            FieldKind::Composite(_) => {
                let nested_left = left_value
                    .as_record()
                    .and_then(|handle| left.version().record(handle));
                let nested_right = right_value
                    .as_record()
                    .and_then(|handle| right.version().record(handle));
                match (nested_left, nested_right) {
                    (Some(nested_left), Some(nested_right)) => {
                        let (l, r) = compare_records(nested_left, nested_right, seen)?;
                        differing_left.extend(l);
                        differing_right.extend(r);
                    }
                    //absence is attributed to the side that has a value
                    (Some(nested_left), None) => {
                        differing_left.insert(nested_left.handle());
                    }
                    (None, Some(nested_right)) => {
                        differing_right.insert(nested_right.handle());
                    }
                    (None, None) => {}
                }
            }
        }
    }

    if !differing_left.is_empty() {
        differing_left.insert(left.handle());
    }
    if !differing_right.is_empty() {
        differing_right.insert(right.handle());
    }
    Ok((differing_left, differing_right))
}

/// Collects the record and everything reachable from it via composite fields
fn subtree(root: ResultItem<'_, AnnotationRecord>, collected: &mut BTreeSet<RecordHandle>) {
    let mut stack = vec![root];
    while let Some(record) = stack.pop() {
        if collected.insert(record.handle()) {
            stack.extend(record.nested_records());
        }
    }
}

fn integer_equals(left: &FieldValue, right: &FieldValue) -> bool {
    match (left, right) {
        (FieldValue::Integer(l), FieldValue::Integer(r)) => l == r,
        (FieldValue::Null, FieldValue::Null) => true,
        _ => false,
    }
}

fn string_equals(left: &FieldValue, right: &FieldValue) -> bool {
    match (left, right) {
        (FieldValue::String(l), FieldValue::String(r)) => l == r,
        (FieldValue::Null, FieldValue::Null) => true,
        _ => false,
    }
}
