//! Static model catalogue served by `/v1/models`

use serde::{Deserialize, Serialize};

/// A model the proxy advertises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Always "model"
    #[serde(rename = "type")]
    pub kind: String,
    /// Model identifier
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// RFC 3339 release timestamp
    pub created_at: String,
    /// Unix timestamp, for `OpenAI` clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
    /// Owning organization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
    /// Always "model", for `OpenAI` clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl Model {
    pub fn new(id: &str, display_name: &str, created_at: &str, created: u64) -> Self {
        Self {
            kind: "model".to_owned(),
            id: id.to_owned(),
            display_name: display_name.to_owned(),
            created_at: created_at.to_owned(),
            created: Some(created),
            owned_by: Some("anthropic".to_owned()),
            object: Some("model".to_owned()),
        }
    }
}

/// Paged model list; the catalogue always fits one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList {
    pub data: Vec<Model>,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_id: Option<String>,
    /// Always "list", for `OpenAI` clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

/// Ordered, immutable model catalogue
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<Model>,
}

impl ModelRegistry {
    pub const fn new(models: Vec<Model>) -> Self {
        Self { models }
    }

    /// The models shipped with the proxy
    pub fn builtin() -> Self {
        Self::new(vec![
            Model::new(
                "claude-opus-4-20250514",
                "Claude Opus 4",
                "2025-05-22T00:00:00Z",
                1_716_336_000,
            ),
            Model::new(
                "claude-sonnet-4-20250514",
                "Claude Sonnet 4",
                "2025-05-22T00:00:00Z",
                1_716_336_000,
            ),
        ])
    }

    /// Every model, in catalogue order
    pub fn list_models(&self) -> ModelList {
        ModelList {
            data: self.models.clone(),
            has_more: false,
            first_id: self.models.first().map(|model| model.id.clone()),
            last_id: self.models.last().map(|model| model.id.clone()),
            object: Some("list".to_owned()),
        }
    }

    /// Look up a model by exact id
    pub fn get_model(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|model| model.id == id)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
