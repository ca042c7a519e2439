//! Script review workflow
//!
//! Requests a generated video script, lets the user edit it and refine it
//! through feedback rounds with the remote generator, then approve it and
//! approve or reject the resulting video.

pub mod config;
pub mod draft;
pub mod error;
pub mod machine;
pub mod models;
pub mod service;
pub mod session;
pub mod status;

pub use config::ReviewConfig;
pub use draft::{ScriptDraft, ScriptSession, VideoArtifact, VideoDecisionState};
pub use error::{ConfigError, ServiceError, WorkflowError};
pub use machine::{
    PendingDecision, PendingGenerate, PendingVideoDecision, RequestTicket, ReviewMachine,
    ReviewState, Transition,
};
pub use models::{
    CorrelationToken, DecisionKind, DecisionReply, DecisionRequest, GenerateRequest,
    GeneratedScript, Genre, RequestParameters, Tone, VideoDecision, VideoDecisionRequest,
};
pub use service::{MockCall, MockConfig, MockScriptService, ScriptService, WebhookClient};
pub use session::{ReviewSession, WorkflowEvent};
pub use status::{Notice, NoticeLevel, StatusBoard};

/// Approve or refine, decided by whether the feedback has any non-blank text.
pub fn classify(feedback: &str) -> DecisionKind {
    DecisionKind::from_feedback(feedback)
}
