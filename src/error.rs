use thiserror::Error;

// ------------------------------ ERROR DEFINITIONS & IMPLEMENTATIONS -------------------------------------------------------------

/// All errors that can be raised by this library.
/// The last (`&'static str`) argument of most variants is a short description of the context in which the error occurred.
#[derive(Debug, Error)]
pub enum CurationError {
    /// Raised when the structural comparator encounters a field kind it can not compare.
    /// The arguments are the type name, the field name and the context.
    /// This is fatal to the diff computation that encountered it.
    #[error("ComparisonError: Unable to compare field {1} of type {0}: {2}")]
    ComparisonError(String, String, &'static str),

    /// This error is raised when a handle does not resolve to an existing item
    #[error("HandleError: Unable to get item by handle (does it exist?) - {0}")]
    HandleError(&'static str),

    /// This error is raised when an ID (type name, annotator, public record id) does not exist
    #[error("IdNotFoundError: No such ID: {0} - {1}")]
    IdNotFoundError(String, &'static str),

    /// This error is raised when an ID is already taken
    #[error("DuplicateIdError: ID already exists: {0} - {1}")]
    DuplicateIdError(String, &'static str),

    /// This error is raised when data does not conform to the type system
    #[error("SchemaError: {0} - {1}")]
    SchemaError(String, &'static str),

    /// This error is raised when a span is invalid: begin > end, or beyond the end of the text
    #[error("InvalidOffset: [{0},{1}) - {2}")]
    InvalidOffset(usize, usize, &'static str),

    /// Raised when annotator versions in a single computation do not share the same document
    #[error("InconsistentDocument: {0} - {1}")]
    InconsistentDocument(String, &'static str),

    /// Raised when (de)serialising JSON fails, the second argument is the path of the offending element
    #[error("JsonError: {0} ({1}) - {2}")]
    JsonError(serde_json::Error, String, &'static str),

    #[error("IOError: {0} - {1}")]
    IOError(std::io::Error, &'static str),
}

/// Result type returned by most operations in this library
pub type CurationResult<T> = Result<T, CurationError>;

impl CurationError {
    /// Returns true if this is a [`CurationError::ComparisonError`]
    pub fn is_comparison_error(&self) -> bool {
        matches!(self, Self::ComparisonError(..))
    }
}
