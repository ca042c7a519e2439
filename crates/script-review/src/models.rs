use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Funny,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Professional, Tone::Casual, Tone::Funny];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "Professional",
            Tone::Casual => "Casual",
            Tone::Funny => "Funny",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|tone| tone.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| WorkflowError::InvalidParameters(format!("unknown tone '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Genre {
    #[default]
    Educational,
    Entertainment,
    Tutorial,
}

impl Genre {
    pub const ALL: [Genre; 3] = [Genre::Educational, Genre::Entertainment, Genre::Tutorial];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Educational => "Educational",
            Genre::Entertainment => "Entertainment",
            Genre::Tutorial => "Tutorial",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|genre| genre.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| WorkflowError::InvalidParameters(format!("unknown genre '{s}'")))
    }
}

/// What the user asked the generator for. Frozen once a generation request
/// has been issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParameters {
    topic: String,
    tone: Tone,
    genre: Genre,
}

impl RequestParameters {
    /// Validates the topic; an empty or whitespace-only topic is rejected here
    /// so the workflow never sees it.
    pub fn new(topic: impl Into<String>, tone: Tone, genre: Genre) -> Result<Self, WorkflowError> {
        let topic = topic.into().trim().to_string();
        if topic.is_empty() {
            return Err(WorkflowError::InvalidParameters(
                "topic is required".to_string(),
            ));
        }
        Ok(Self { topic, tone, genre })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }
}

/// Outcome requested for the current script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Approved,
    Refine,
}

impl DecisionKind {
    /// Non-blank feedback means the user wants another pass.
    pub fn from_feedback(feedback: &str) -> Self {
        if feedback.trim().is_empty() {
            DecisionKind::Approved
        } else {
            DecisionKind::Refine
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Approved => "approved",
            DecisionKind::Refine => "refine",
        }
    }

    /// Label for the control that submits this decision.
    pub fn action_label(&self) -> &'static str {
        match self {
            DecisionKind::Approved => "Approve Script",
            DecisionKind::Refine => "Refine Script",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoDecision {
    Approved,
    Rejected,
}

impl VideoDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoDecision::Approved => "approved",
            VideoDecision::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VideoDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque value handed out by the generator and echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(Value);

impl CorrelationToken {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

// Wire bodies

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub topic: String,
    pub tone: Tone,
    pub genre: Genre,
    pub id: String,
    pub timestamp: String,
}

impl GenerateRequest {
    pub fn new(params: &RequestParameters) -> Self {
        Self {
            topic: params.topic().to_string(),
            tone: params.tone(),
            genre: params.genre(),
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now()
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub response_id: Option<CorrelationToken>,
    pub content: ScriptContent,
    pub topic: String,
    pub tone: Tone,
    pub genre: Genre,
    pub feedback: String,
    pub status: DecisionKind,
    pub timestamp: Option<CorrelationToken>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDecisionRequest {
    pub video_url: String,
    pub status: VideoDecision,
}

/// Body returned by the generate and refine webhooks.
///
/// Kept as raw JSON: any 2xx JSON body is a usable reply, and fields of an
/// unexpected type read as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ScriptPayload(Value);

impl ScriptPayload {
    fn str_field(&self, pointer: &str) -> Option<&str> {
        self.0.pointer(pointer).and_then(Value::as_str)
    }

    fn token(&self, key: &str) -> Option<CorrelationToken> {
        match self.0.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(CorrelationToken::new(value.clone())),
        }
    }

    /// `content.text` wins when non-empty, then `text`. `None` only when the
    /// body carries neither as a string.
    pub fn script_text(&self) -> Option<String> {
        let nested = self.str_field("/content/text");
        match (nested, self.str_field("/text")) {
            (Some(nested), _) if !nested.is_empty() => Some(nested.to_string()),
            (_, Some(flat)) => Some(flat.to_string()),
            (nested, None) => nested.map(str::to_string),
        }
    }

    pub fn into_generated(self) -> GeneratedScript {
        GeneratedScript {
            text: self.script_text().unwrap_or_default(),
            video_url: self
                .str_field("/videoUrl")
                .filter(|url| !url.trim().is_empty())
                .map(str::to_string),
            response_id: self.token("responseId"),
            response_timestamp: self.token("timestamp"),
        }
    }
}

/// A freshly generated script with its correlation metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedScript {
    pub text: String,
    pub video_url: Option<String>,
    pub response_id: Option<CorrelationToken>,
    pub response_timestamp: Option<CorrelationToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionReply {
    Acknowledged,
    Refined(String),
}
