//! Remote script service: generation, script decisions and video decisions.

pub mod mock;
pub mod webhook;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::{
    DecisionReply, DecisionRequest, GenerateRequest, GeneratedScript, VideoDecisionRequest,
};

pub use mock::{MockCall, MockConfig, MockScriptService};
pub use webhook::WebhookClient;

/// Capability the workflow needs from the remote generator.
///
/// Every method is a single best-effort attempt; implementations must not retry.
#[async_trait]
pub trait ScriptService: Send + Sync {
    /// Service name for logs
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedScript, ServiceError>;

    /// `Refined` for refine requests, `Acknowledged` for approvals.
    async fn submit_decision(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionReply, ServiceError>;

    async fn submit_video_decision(
        &self,
        request: &VideoDecisionRequest,
    ) -> Result<(), ServiceError>;
}
