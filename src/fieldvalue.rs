use serde::{Deserialize, Serialize};
use std::fmt;

use crate::annotationtype::FieldKind;
use crate::record::RecordHandle;

/// The value of a single field of an annotation record.
/// `Null` represents an absent value of any kind: a null string or an absent nested record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(tag = "@type", content = "value")]
pub enum FieldValue {
    ///No value
    #[default]
    Null,
    Integer(i64),
    String(String),
    Boolean(bool),
    Float(f64),
    /// Reference to a nested record in the same annotator version
    Record(RecordHandle),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the nested record, if this is a composite value
    pub fn as_record(&self) -> Option<RecordHandle> {
        match self {
            Self::Record(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Can this value be held by a field of the given kind? `Null` fits every kind.
    pub fn fits(&self, kind: &FieldKind) -> bool {
        matches!(
            (self, kind),
            (Self::Null, _)
                | (Self::Integer(_), FieldKind::Integer)
                | (Self::String(_), FieldKind::String)
                | (Self::Boolean(_), FieldKind::Boolean)
                | (Self::Float(_), FieldKind::Float)
                | (Self::Record(_), FieldKind::Composite(_))
        )
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, ""),
            Self::Integer(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Record(handle) => write!(f, "#{}", handle),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(item: &str) -> Self {
        Self::String(item.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(item: String) -> Self {
        Self::String(item)
    }
}

impl From<Option<&str>> for FieldValue {
    fn from(item: Option<&str>) -> Self {
        match item {
            Some(item) => Self::String(item.to_string()),
            None => Self::Null,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(item: i64) -> Self {
        Self::Integer(item)
    }
}

impl From<i32> for FieldValue {
    fn from(item: i32) -> Self {
        Self::Integer(item as i64)
    }
}

impl From<usize> for FieldValue {
    fn from(item: usize) -> Self {
        Self::Integer(item as i64)
    }
}

impl From<bool> for FieldValue {
    fn from(item: bool) -> Self {
        Self::Boolean(item)
    }
}

impl From<f64> for FieldValue {
    fn from(item: f64) -> Self {
        Self::Float(item)
    }
}

impl From<RecordHandle> for FieldValue {
    fn from(item: RecordHandle) -> Self {
        Self::Record(item)
    }
}

// These PartialEq implementation allow for more direct comparisons

impl PartialEq<str> for FieldValue {
    fn eq(&self, other: &str) -> bool {
        match self {
            Self::String(v) => v == other,
            _ => false,
        }
    }
}

impl PartialEq<&str> for FieldValue {
    fn eq(&self, other: &&str) -> bool {
        match self {
            Self::String(v) => v == *other,
            _ => false,
        }
    }
}

impl PartialEq<i64> for FieldValue {
    fn eq(&self, other: &i64) -> bool {
        match self {
            Self::Integer(v) => v == other,
            _ => false,
        }
    }
}
