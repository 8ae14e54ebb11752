use sealed::sealed;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{Config, Configurable};
use crate::error::CurationError;
use crate::json::ToJson;
use crate::store::*;
use crate::types::*;

/// The kind of value a [`Field`] holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "@kind", content = "type")]
pub enum FieldKind {
    /// A primitive integer value
    Integer,
    /// A primitive string value, may be null
    String,
    /// A primitive boolean value. Declarable, but not comparable by the structural comparator.
    Boolean,
    /// A primitive floating point value. Declarable, but not comparable by the structural comparator.
    Float,
    /// The value is a nested annotation record of the named type, or absent
    Composite(String),
}

impl FieldKind {
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// Returns the name of the type a composite field refers to
    pub fn target_type(&self) -> Option<&str> {
        match self {
            Self::Composite(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "Integer"),
            Self::String => write!(f, "String"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Float => write!(f, "Float"),
            Self::Composite(name) => write!(f, "Composite({})", name),
        }
    }
}

/// A named field declared by an [`AnnotationType`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    name: String,
    kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

/// An `AnnotationType` is a named schema for annotation records (sometimes called a layer):
/// a type name and an ordered set of named [`Field`]s.
/// Records of the type hold exactly one value per declared field, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationType {
    #[serde(skip)]
    intid: Option<AnnotationTypeHandle>,

    /// The name identifies the type, it must be unique in the type system
    #[serde(rename = "@id")]
    name: String,

    #[serde(default)]
    fields: Vec<Field>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnotationTypeHandle(u16);

#[sealed]
impl Handle for AnnotationTypeHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u16)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

#[sealed]
impl Storable for AnnotationType {
    type HandleType = AnnotationTypeHandle;
    type StoreType = TypeSystem;

    fn id(&self) -> Option<&str> {
        Some(self.name.as_str())
    }
    fn handle(&self) -> Option<AnnotationTypeHandle> {
        self.intid
    }
    fn set_handle(&mut self, intid: AnnotationTypeHandle) {
        self.intid = Some(intid);
    }
}

impl PartialEq<AnnotationType> for AnnotationType {
    /// Types are equal if their definitions are equal, regardless of which type system holds them
    fn eq(&self, other: &AnnotationType) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl AnnotationType {
    /// Creates a new annotation type without fields, add fields with [`Self::with_field()`]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            intid: None,
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder pattern to declare a field
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(Field::new(name, kind));
        self
    }

    /// Returns the type name
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the declared fields, in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the index of a field by name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// The type system holds all [`AnnotationType`]s that annotator versions may instantiate.
/// It is shared (read-only) between all versions that take part in a comparison.
#[derive(Debug, Clone, Default)]
pub struct TypeSystem {
    types: Store<AnnotationType>,
    idmap: IdMap<AnnotationTypeHandle>,
    config: Config,
}

impl Configurable for TypeSystem {
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
impl StoreFor<AnnotationType> for TypeSystem {
    fn store(&self) -> &Store<AnnotationType> {
        &self.types
    }
    fn store_mut(&mut self) -> &mut Store<AnnotationType> {
        &mut self.types
    }
    fn idmap(&self) -> Option<&IdMap<AnnotationTypeHandle>> {
        Some(&self.idmap)
    }
    fn idmap_mut(&mut self) -> Option<&mut IdMap<AnnotationTypeHandle>> {
        Some(&mut self.idmap)
    }
    fn store_typeinfo() -> &'static str {
        "AnnotationType in TypeSystem"
    }

    fn preinsert(&self, item: &mut AnnotationType) -> Result<(), CurationError> {
        for (i, field) in item.fields.iter().enumerate() {
            if item.fields[..i].iter().any(|other| other.name == field.name) {
                return Err(CurationError::DuplicateIdError(
                    format!("{}.{}", item.name, field.name),
                    "Field declared twice on annotation type",
                ));
            }
        }
        Ok(())
    }
}

impl PartialEq for TypeSystem {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types
    }
}

impl TypeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern to add an annotation type.
    /// Adding a type whose name already exists fails unless the definition is identical.
    pub fn with_type(mut self, annotationtype: AnnotationType) -> Result<Self, CurationError> {
        self.insert(annotationtype)?;
        Ok(self)
    }

    /// Adds an annotation type, returns its handle
    pub fn add_type(
        &mut self,
        annotationtype: AnnotationType,
    ) -> Result<AnnotationTypeHandle, CurationError> {
        self.insert(annotationtype)
    }

    /// Returns an annotation type by name
    pub fn annotationtype(&self, name: &str) -> Option<ResultItem<'_, AnnotationType>> {
        self.get_by_id(name)
            .ok()
            .map(|annotationtype| ResultItem::new(annotationtype, self))
    }

    /// Returns an annotation type by handle
    pub fn annotationtype_by_handle(
        &self,
        handle: AnnotationTypeHandle,
    ) -> Option<ResultItem<'_, AnnotationType>> {
        self.get(handle)
            .ok()
            .map(|annotationtype| ResultItem::new(annotationtype, self))
    }

    /// Resolves a type name to its handle
    pub fn resolve_type(&self, name: &str) -> Result<AnnotationTypeHandle, CurationError> {
        self.resolve_id(name)
    }

    /// Iterates over all annotation types
    pub fn types(&self) -> StoreIter<'_, AnnotationType> {
        self.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Checks that every composite field refers to a type that exists in this type system
    pub fn validate(&self) -> Result<(), CurationError> {
        for annotationtype in self.types.iter() {
            for field in annotationtype.fields() {
                if let Some(target) = field.kind().target_type() {
                    if self.idmap.get(target).is_none() {
                        return Err(CurationError::SchemaError(
                            format!(
                                "field {}.{} refers to unknown type {}",
                                annotationtype.name(),
                                field.name(),
                                target
                            ),
                            "Validating type system",
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Serialize for TypeSystem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.types.serialize(serializer)
    }
}

impl ToJson for TypeSystem {}
