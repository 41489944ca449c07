//! Request ID tracking for request tracing.

use std::fmt;
use uuid::Uuid;

/// Correlation ID echoed back to the caller and attached to every log line
/// of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Use the caller's ID when it supplied a non-blank one.
    pub fn from_client(supplied: Option<&str>) -> Self {
        match supplied.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => Self(id.to_string()),
            None => Self::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short format (first 8 characters) for logging.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}
