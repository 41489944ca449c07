use serde::{Deserialize, Serialize};

use super::non_blank;

/// `POST /api/generate-class`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateClassRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    /// Tier the caller asked for; informational, the model picks the final one
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl GenerateClassRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    pub fn with_rarity(mut self, rarity: impl Into<String>) -> Self {
        self.rarity = Some(rarity.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn prompt(&self) -> Option<&str> {
        non_blank(&self.prompt)
    }

    pub fn request_id(&self) -> Option<&str> {
        non_blank(&self.request_id)
    }
}

/// `POST /api/generate-story`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStoryRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl GenerateStoryRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            request_id: None,
        }
    }

    pub fn prompt(&self) -> Option<&str> {
        non_blank(&self.prompt)
    }

    pub fn request_id(&self) -> Option<&str> {
        non_blank(&self.request_id)
    }
}
