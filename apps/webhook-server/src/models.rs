//! Request and response bodies for the mock generator and the stub routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// POST /webhook/frontend
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateBody {
    pub topic: String,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBody {
    #[serde(default)]
    pub text: String,
}

/// POST /webhook/approve
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBody {
    #[serde(default)]
    pub response_id: Option<Value>,
    pub content: ContentBody,
    #[serde(default)]
    pub feedback: String,
    pub status: String,
}

/// POST /webhook/approve-video and /webhook/reject-video
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDecisionBody {
    pub video_url: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// GET /api/getScript
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockScript {
    pub script: String,
    pub media_notes: Vec<String>,
}

/// A generated script tracked by the mock generator.
#[derive(Debug, Clone)]
pub struct ScriptRecord {
    pub response_id: String,
    pub topic: String,
    pub revisions: u32,
    pub approved: bool,
    pub video_url: String,
    pub video_status: Option<String>,
    pub created_at: DateTime<Utc>,
}
