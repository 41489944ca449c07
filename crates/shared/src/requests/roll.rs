use serde::{Deserialize, Serialize};

use super::non_blank;

/// `POST /api/roll-class`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollClassRequest {
    /// Ask the generative API for a richer description
    #[serde(default)]
    pub augment: bool,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl RollClassRequest {
    pub fn request_id(&self) -> Option<&str> {
        non_blank(&self.request_id)
    }
}
