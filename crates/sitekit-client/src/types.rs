//! Wire types for the backend API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat field-name → value mapping built fresh for each submission.
pub type FormData = BTreeMap<String, String>;

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of `POST /api/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Opaque user record; cached as-is and never interpreted.
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Generic `{success, message}` acknowledgement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// One entry of `GET /api/admin/blogs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogPost {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Any other fields the backend sends (content, tags, author, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An image picked for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Response of `POST /admin/upload-image`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub url: Option<String>,
}

/// Body of `POST /api/request-quote`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuoteRequest {
    pub name: String,
    pub email: String,
    pub company: String,
    pub platform: String,
    pub budget: String,
    pub timeline: String,
    pub message: String,
}

/// Body of `POST /api/contact`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Response of `POST /api/contact`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub db_connected: bool,
}

// --- Internal API response types ---

/// Error body shapes seen from the backend: `{detail: "..."}`,
/// `{detail: [{msg: "..."}, ...]}` from request validation, or
/// `{success: false, message: "..."}`.
#[derive(Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.detail
            .and_then(|d| detail_text(&d))
            .or(self.message)
            .filter(|m| !m.trim().is_empty())
    }
}

fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Best-effort message extraction from a raw error body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(ApiErrorBody::into_message)
}
