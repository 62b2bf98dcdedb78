use serde::{Deserialize, Serialize};

/// Error body the service attaches to rejected requests. Signup rejections
/// carry `detail`; unregister rejections may use either field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            message: None,
        }
    }

    /// Human-readable rejection text, `detail` preferred over `message`.
    pub fn text(&self) -> Option<&str> {
        self.detail.as_deref().or(self.message.as_deref())
    }
}
