use sealed::sealed;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::annotationtype::{AnnotationType, AnnotationTypeHandle};
use crate::fieldvalue::FieldValue;
use crate::store::*;
use crate::types::*;
use crate::version::AnnotatorVersion;

/// An `AnnotationRecord` is a typed, positioned unit of annotation made by a single annotator.
/// It covers a [`Span`] of the shared document text and holds one [`FieldValue`] per field
/// declared by its [`AnnotationType`], in declaration order.
///
/// Records are owned by an [`AnnotatorVersion`] and are immutable once added to it.
/// They are referred to by a [`RecordHandle`], an opaque address that is only meaningful
/// within the version that holds the record.
#[derive(Debug, Clone)]
pub struct AnnotationRecord {
    /// Internal numeric ID, corresponds with the index in the AnnotatorVersion that has the ownership. May be unbound (None) only during creation.
    intid: Option<RecordHandle>,

    /// Public identifier for this record (optional)
    id: Option<String>,

    annotationtype: AnnotationTypeHandle,

    span: Span,

    /// Field values, aligned with the fields of the annotation type
    values: SmallVec<[FieldValue; 4]>,
}

/// The opaque address of an [`AnnotationRecord`] within its [`AnnotatorVersion`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordHandle(u32);

#[sealed]
impl Handle for RecordHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u32)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[sealed]
impl Storable for AnnotationRecord {
    type HandleType = RecordHandle;
    type StoreType = AnnotatorVersion;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
    fn with_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }
    fn handle(&self) -> Option<RecordHandle> {
        self.intid
    }
    fn set_handle(&mut self, intid: RecordHandle) {
        self.intid = Some(intid);
    }
}

impl PartialEq<AnnotationRecord> for AnnotationRecord {
    /// Plain content equality (type handle, span and values), used only to detect re-insertion of identical records.
    /// Structural comparison across annotators is the job of [`crate::compare()`].
    fn eq(&self, other: &AnnotationRecord) -> bool {
        self.id == other.id
            && self.annotationtype == other.annotationtype
            && self.span == other.span
            && self.values == other.values
    }
}

impl AnnotationRecord {
    pub(crate) fn new(
        id: Option<String>,
        annotationtype: AnnotationTypeHandle,
        span: Span,
        values: SmallVec<[FieldValue; 4]>,
    ) -> Self {
        Self {
            intid: None,
            id,
            annotationtype,
            span,
            values,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn begin(&self) -> usize {
        self.span.begin
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Returns a handle to the annotation type, resolve it in the type system of the owning version
    pub fn annotationtype_handle(&self) -> AnnotationTypeHandle {
        self.annotationtype
    }

    /// Returns all field values, aligned with the fields of the annotation type
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Overwrites a field value in place, bypassing validation. Only used to construct graphs the builder can not express.
    #[cfg(test)]
    pub(crate) fn set_value(&mut self, index: usize, value: FieldValue) {
        self.values[index] = value;
    }

    /// Iterates over the handles of nested records referenced by composite fields
    pub fn nested(&self) -> impl Iterator<Item = RecordHandle> + '_ {
        self.values.iter().filter_map(|value| value.as_record())
    }
}

impl<'store> ResultItem<'store, AnnotationRecord> {
    /// Returns the annotator version that holds this record
    pub fn version(&self) -> &'store AnnotatorVersion {
        self.store()
    }

    /// Returns the id of the annotator that made this record
    pub fn annotator(&self) -> &'store str {
        self.store().annotator()
    }

    /// Returns the annotation type of this record
    pub fn annotationtype(&self) -> &'store AnnotationType {
        self.store()
            .typesystem_ref()
            .get(self.as_ref().annotationtype)
            .expect("annotation type of a bound record must exist")
    }

    /// Returns the name of the annotation type of this record
    pub fn typename(&self) -> &'store str {
        self.annotationtype().name()
    }

    /// Returns the value of a field by name, `None` if the type declares no such field
    pub fn value(&self, field: &str) -> Option<&'store FieldValue> {
        let index = self.annotationtype().field_index(field)?;
        self.as_ref().values.get(index)
    }

    /// Iterates over the nested records referenced by composite fields
    pub fn nested_records(&self) -> impl Iterator<Item = ResultItem<'store, AnnotationRecord>> {
        let version = self.store();
        self.as_ref()
            .nested()
            .filter_map(move |handle| version.record(handle))
    }
}

/// This is the build recipe for an [`AnnotationRecord`]. Field values are referred to by field name and
/// resolved against the annotation type when the record is added via [`AnnotatorVersion::add_record()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationRecordBuilder {
    #[serde(rename = "@id", default)]
    pub(crate) id: Option<String>,
    #[serde(rename = "type")]
    pub(crate) typename: String,
    pub(crate) begin: usize,
    pub(crate) end: usize,
    #[serde(default)]
    pub(crate) values: Vec<(String, FieldValue)>,
}

impl AnnotationRecordBuilder {
    pub fn new(typename: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            typename: typename.into(),
            begin,
            end,
            ..Self::default()
        }
    }

    /// Sets the public identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the value of a field, unset fields are [`FieldValue::Null`]
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.push((field.into(), value.into()));
        self
    }

    /// Sets a composite field to refer to a nested record that was previously added to the same version
    pub fn with_nested(self, field: impl Into<String>, record: RecordHandle) -> Self {
        self.with_value(field, FieldValue::Record(record))
    }
}
