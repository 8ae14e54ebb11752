use sealed::sealed;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

use crate::config::Config;

/// The handle trait is implemented on various handle types. They have in common that refer to the internal id
/// of a [`crate::Storable`] item in a store by index. Types implementing this are lightweight and do not borrow anything, they can be passed and copied freely.
/// To get an actual reference to the item from a handle type, call the `get()` method on the store that holds it.
/// This is a sealed trait, not implementable outside this crate.
#[sealed(pub(crate))] //<-- this ensures nobody outside this crate can implement the trait
pub trait Handle:
    Clone + Copy + core::fmt::Debug + PartialEq + Eq + PartialOrd + Ord + Hash
{
    /// Create a new handle for an internal ID. You shouldn't need to use this as handles will always be generated for you by higher-level functions.
    fn new(intid: usize) -> Self;
    /// Returns the internal index for this handle
    fn as_usize(&self) -> usize;
}

/// A span is the `[begin, end)` range of unicode codepoints an annotation record covers.
/// Spans order by begin, then by end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub(crate) begin: usize,
    pub(crate) end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the length of the span in unicode codepoints, 0 for an inverted span
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Is this span fully covered by the window `[begin, end)`? (not merely overlapping)
    pub fn covered_by(&self, begin: usize, end: usize) -> bool {
        self.begin >= begin && self.end <= end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{})", self.begin, self.end)
    }
}

impl From<(usize, usize)> for Span {
    fn from((begin, end): (usize, usize)) -> Self {
        Self::new(begin, end)
    }
}

/// Emits a debug message through `tracing`, only if debug mode is enabled in the configuration.
/// The message is only constructed when it is actually going to be emitted.
pub(crate) fn debug<F>(config: &Config, message_func: F)
where
    F: Fn() -> String,
{
    if config.debug() {
        tracing::debug!(target: "curation", "{}", message_func());
    }
}
