//! Request bodies accepted by the HTTP surface.
//!
//! Every field is optional on the wire so that a missing `prompt` is reported
//! through the normal error envelope instead of a body-rejection page.

mod generation;
mod roll;

pub use generation::{GenerateClassRequest, GenerateStoryRequest};
pub use roll::RollClassRequest;

/// Trimmed, non-empty view of an optional string field.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
