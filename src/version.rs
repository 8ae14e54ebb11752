use sealed::sealed;
use smallvec::{smallvec, SmallVec};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::annotationtype::{AnnotationTypeHandle, TypeSystem};
use crate::config::{Config, Configurable};
use crate::error::CurationError;
use crate::fieldvalue::FieldValue;
use crate::record::{AnnotationRecord, AnnotationRecordBuilder, RecordHandle};
use crate::store::*;
use crate::types::*;

/// Positional index for a single annotation type: maps each span to the records (of that type) covering exactly that span.
/// Records of the same type may share a span, hence the small vector.
type PositionIndex = BTreeMap<Span, SmallVec<[RecordHandle; 1]>>;

/// An `AnnotatorVersion` is one annotator's complete, time-consistent set of annotation records over a document.
/// Conceptually it is one full annotated copy of the document per annotator.
///
/// The version owns its records; the diff engine only borrows it. Records are indexed by type and span
/// so that "all records of type T within `[begin, end)`" does not require a full scan.
#[derive(Debug)]
pub struct AnnotatorVersion {
    /// The annotator (user) this version belongs to
    annotator: String,

    typesystem: Arc<TypeSystem>,

    /// The document text, shared by all versions of the same document
    text: Option<String>,

    /// Length of the text in unicode codepoints
    textlen: usize,

    records: Store<AnnotationRecord>,
    idmap: IdMap<RecordHandle>,

    /// Positional index per annotation type, indexed by annotation type handle
    positionindex: Vec<PositionIndex>,

    config: Config,
}

impl Configurable for AnnotatorVersion {
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

#[sealed]
impl StoreFor<AnnotationRecord> for AnnotatorVersion {
    fn store(&self) -> &Store<AnnotationRecord> {
        &self.records
    }
    fn store_mut(&mut self) -> &mut Store<AnnotationRecord> {
        &mut self.records
    }
    fn idmap(&self) -> Option<&IdMap<RecordHandle>> {
        Some(&self.idmap)
    }
    fn idmap_mut(&mut self) -> Option<&mut IdMap<RecordHandle>> {
        Some(&mut self.idmap)
    }
    fn store_typeinfo() -> &'static str {
        "AnnotationRecord in AnnotatorVersion"
    }

    fn inserted(&mut self, handle: RecordHandle) -> Result<(), CurationError> {
        let record = self.get(handle)?;
        let (typehandle, span) = (record.annotationtype_handle(), record.span());
        let index = typehandle.as_usize();
        if index >= self.positionindex.len() {
            //expand the index
            self.positionindex.resize_with(index + 1, Default::default);
        }
        match self.positionindex[index].entry(span) {
            btree_map::Entry::Occupied(mut entry) => entry.get_mut().push(handle),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(smallvec![handle]);
            }
        }
        Ok(())
    }
}

impl AnnotatorVersion {
    /// Creates a new, empty version for the given annotator
    pub fn new(annotator: impl Into<String>, typesystem: Arc<TypeSystem>) -> Self {
        Self {
            annotator: annotator.into(),
            typesystem,
            text: None,
            textlen: 0,
            records: Vec::new(),
            idmap: IdMap::new("R".to_string()),
            positionindex: Vec::new(),
            config: Config::default(),
        }
    }

    /// Builder pattern to associate the document text. Associate the text before adding records,
    /// records already present are not checked against it, use [`Self::set_text()`] for that.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.textlen = text.chars().count();
        self.text = Some(text);
        self
    }

    /// Associates the document text, failing if any record already present extends beyond it.
    /// The version is left unchanged on failure.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), CurationError> {
        let text = text.into();
        let textlen = text.chars().count();
        if let Some(record) = self.records.iter().find(|record| record.end() > textlen) {
            return Err(CurationError::InvalidOffset(
                record.begin(),
                record.end(),
                "Setting text, span of existing record exceeds document text",
            ));
        }
        self.textlen = textlen;
        self.text = Some(text);
        Ok(())
    }

    /// Builder pattern to add a record
    pub fn with_record(mut self, builder: AnnotationRecordBuilder) -> Result<Self, CurationError> {
        self.add_record(builder)?;
        Ok(self)
    }

    /// Adds a record, validating it against the type system. Returns the handle of the new record.
    pub fn add_record(
        &mut self,
        builder: AnnotationRecordBuilder,
    ) -> Result<RecordHandle, CurationError> {
        let annotationtype = self
            .typesystem
            .get_by_id(&builder.typename)
            .map_err(|_| {
                CurationError::IdNotFoundError(builder.typename.clone(), "Adding record")
            })?;
        if builder.begin > builder.end {
            return Err(CurationError::InvalidOffset(
                builder.begin,
                builder.end,
                "Adding record",
            ));
        }
        if self.text.is_some() && builder.end > self.textlen {
            return Err(CurationError::InvalidOffset(
                builder.begin,
                builder.end,
                "Adding record, span exceeds document text",
            ));
        }

        let mut values: SmallVec<[FieldValue; 4]> =
            smallvec![FieldValue::Null; annotationtype.fields().len()];
        for (fieldname, value) in builder.values {
            let index = annotationtype.field_index(&fieldname).ok_or_else(|| {
                CurationError::SchemaError(
                    format!("type {} has no field {}", annotationtype.name(), fieldname),
                    "Adding record",
                )
            })?;
            let field = &annotationtype.fields()[index];
            if !value.fits(field.kind()) {
                return Err(CurationError::SchemaError(
                    format!(
                        "value {:?} does not fit field {}.{} of kind {}",
                        value,
                        annotationtype.name(),
                        fieldname,
                        field.kind()
                    ),
                    "Adding record",
                ));
            }
            if let (Some(nested), Some(target)) = (value.as_record(), field.kind().target_type())
            {
                let nested_record = self.get(nested).map_err(|_| {
                    CurationError::SchemaError(
                        format!(
                            "field {}.{} refers to a non-existing record {}",
                            annotationtype.name(),
                            fieldname,
                            nested
                        ),
                        "Adding record",
                    )
                })?;
                let nested_type = self.typesystem.get(nested_record.annotationtype_handle())?;
                if nested_type.name() != target {
                    return Err(CurationError::SchemaError(
                        format!(
                            "field {}.{} expects a record of type {}, got {}",
                            annotationtype.name(),
                            fieldname,
                            target,
                            nested_type.name()
                        ),
                        "Adding record",
                    ));
                }
            }
            values[index] = value;
        }

        let typehandle = annotationtype.handle().ok_or(CurationError::HandleError(
            "Annotation type is not bound to the type system",
        ))?;
        let record = AnnotationRecord::new(
            builder.id,
            typehandle,
            Span::new(builder.begin, builder.end),
            values,
        );
        self.insert(record)
    }

    /// Returns the annotator id
    pub fn annotator(&self) -> &str {
        self.annotator.as_str()
    }

    /// Returns the shared type system
    pub fn typesystem(&self) -> &Arc<TypeSystem> {
        &self.typesystem
    }

    pub(crate) fn typesystem_ref(&self) -> &TypeSystem {
        self.typesystem.as_ref()
    }

    /// Returns the document text, if associated
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the length of the document text in unicode codepoints (0 if no text is associated)
    pub fn textlen(&self) -> usize {
        self.textlen
    }

    /// Returns a record by handle
    pub fn record(&self, handle: RecordHandle) -> Option<ResultItem<'_, AnnotationRecord>> {
        self.get(handle).ok().map(|record| ResultItem::new(record, self))
    }

    /// Returns a record by its public identifier
    pub fn record_by_id(&self, id: &str) -> Option<ResultItem<'_, AnnotationRecord>> {
        self.get_by_id(id)
            .ok()
            .map(|record| ResultItem::new(record, self))
    }

    /// Iterates over all records in insertion order
    pub fn records(&self) -> StoreIter<'_, AnnotationRecord> {
        self.iter()
    }

    /// Returns the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over all records of the given type that are covered by the window `[begin, end)`.
    /// Covered means the record's own span falls entirely inside the window, not merely overlaps.
    /// Records are returned in span order.
    pub fn records_in_window(
        &self,
        annotationtype: AnnotationTypeHandle,
        begin: usize,
        end: usize,
    ) -> impl Iterator<Item = ResultItem<'_, AnnotationRecord>> + '_ {
        self.positionindex
            .get(annotationtype.as_usize())
            .filter(|_| begin <= end)
            .into_iter()
            .flat_map(move |index| {
                index
                    .range(Span::new(begin, begin)..=Span::new(end, end))
                    .filter(move |(span, _)| span.covered_by(begin, end))
                    .flat_map(|(_, handles)| handles.iter())
            })
            .filter_map(move |handle| self.record(*handle))
    }

    /// Iterates over all records of the given type at exactly the given span
    pub fn records_at(
        &self,
        annotationtype: AnnotationTypeHandle,
        span: Span,
    ) -> impl Iterator<Item = ResultItem<'_, AnnotationRecord>> + '_ {
        self.positionindex
            .get(annotationtype.as_usize())
            .and_then(|index| index.get(&span))
            .into_iter()
            .flat_map(|handles| handles.iter())
            .filter_map(move |handle| self.record(*handle))
    }
}

/// A `VersionSet` is the set of annotator versions that take part in one diff computation:
/// a mapping from annotator id to that annotator's [`AnnotatorVersion`].
/// Versions are borrowed, never copied, and are always iterated in annotator id order so that
/// results never depend on the order in which versions were added.
#[derive(Debug, Default, Clone)]
pub struct VersionSet<'a> {
    versions: BTreeMap<&'a str, &'a AnnotatorVersion>,
}

impl<'a> VersionSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a version set from multiple versions at once
    pub fn from_versions(
        versions: impl IntoIterator<Item = &'a AnnotatorVersion>,
    ) -> Result<Self, CurationError> {
        let mut set = Self::new();
        for version in versions {
            set.add(version)?;
        }
        Ok(set)
    }

    /// Builder pattern to add a version
    pub fn with_version(mut self, version: &'a AnnotatorVersion) -> Result<Self, CurationError> {
        self.add(version)?;
        Ok(self)
    }

    /// Adds a version. Every annotator may occur only once and all versions must share the same type system.
    pub fn add(&mut self, version: &'a AnnotatorVersion) -> Result<(), CurationError> {
        if self.versions.contains_key(version.annotator()) {
            return Err(CurationError::DuplicateIdError(
                version.annotator().to_string(),
                "Annotator already present in version set",
            ));
        }
        if let Some(first) = self.versions.values().next() {
            if !Arc::ptr_eq(first.typesystem(), version.typesystem())
                && first.typesystem_ref() != version.typesystem_ref()
            {
                return Err(CurationError::SchemaError(
                    format!(
                        "annotator {} uses a different type system than annotator {}",
                        version.annotator(),
                        first.annotator()
                    ),
                    "Adding version to version set",
                ));
            }
        }
        self.versions.insert(version.annotator(), version);
        Ok(())
    }

    /// Returns the version of the given annotator
    pub fn get(&self, annotator: &str) -> Option<&'a AnnotatorVersion> {
        self.versions.get(annotator).copied()
    }

    /// Iterates over the versions, in annotator order
    pub fn iter(&self) -> impl Iterator<Item = &'a AnnotatorVersion> + '_ {
        self.versions.values().copied()
    }

    /// Iterates over the annotator ids, in order
    pub fn annotators(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.versions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Returns the shared type system, `None` if the set is empty
    pub fn typesystem(&self) -> Option<&'a TypeSystem> {
        self.versions
            .values()
            .next()
            .map(|version| version.typesystem_ref())
    }

    /// Returns the length of the shared document text, in unicode codepoints.
    /// All versions must agree on it, an empty set has length 0.
    pub fn textlen(&self) -> Result<usize, CurationError> {
        let mut textlen: Option<(usize, &str)> = None;
        for version in self.iter() {
            match textlen {
                None => textlen = Some((version.textlen(), version.annotator())),
                Some((len, annotator)) if len != version.textlen() => {
                    return Err(CurationError::InconsistentDocument(
                        format!(
                            "text of annotator {} has length {}, text of annotator {} has length {}",
                            annotator,
                            len,
                            version.annotator(),
                            version.textlen()
                        ),
                        "Determining document length",
                    ));
                }
                _ => {}
            }
        }
        Ok(textlen.map(|(len, _)| len).unwrap_or(0))
    }
}
