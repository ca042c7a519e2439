//! HTTP webhook implementation of [`ScriptService`].

use async_trait::async_trait;
use serde::Serialize;
use std::time::{Duration, Instant};

use super::ScriptService;
use crate::config::ReviewConfig;
use crate::error::ServiceError;
use crate::models::{
    DecisionKind, DecisionReply, DecisionRequest, GenerateRequest, GeneratedScript,
    ScriptPayload, VideoDecision, VideoDecisionRequest,
};

pub struct WebhookClient {
    client: reqwest::Client,
    generate_url: String,
    decision_url: String,
    video_approve_url: String,
    video_reject_url: String,
}

impl WebhookClient {
    pub fn new(config: &ReviewConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            generate_url: config.generate_url.clone(),
            decision_url: config.decision_url.clone(),
            video_approve_url: config.video_approve_url.clone(),
            video_reject_url: config.video_reject_url.clone(),
        })
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::Response, ServiceError> {
        let response = self.client.post(url).json(body).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }
        Ok(response)
    }

    async fn read_script(response: reqwest::Response) -> Result<ScriptPayload, ServiceError> {
        response.json::<ScriptPayload>().await.map_err(|err| {
            ServiceError::invalid_response(format!("Invalid script response JSON: {err}"))
        })
    }
}

#[async_trait]
impl ScriptService for WebhookClient {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedScript, ServiceError> {
        let start = Instant::now();
        tracing::info!(
            target: "script_review",
            "Generate request start: topic={:?}, tone={}, genre={}",
            request.topic,
            request.tone,
            request.genre
        );
        let response = self.post_json(&self.generate_url, request).await?;
        let payload = Self::read_script(response).await?;
        tracing::info!(
            target: "script_review",
            "Generate request completed in {:.2?}",
            start.elapsed()
        );
        Ok(payload.into_generated())
    }

    async fn submit_decision(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionReply, ServiceError> {
        let start = Instant::now();
        tracing::info!(
            target: "script_review",
            "Decision request start: status={}, response_id={:?}",
            request.status,
            request.response_id
        );
        let response = self.post_json(&self.decision_url, request).await?;
        let reply = match request.status {
            DecisionKind::Approved => DecisionReply::Acknowledged,
            DecisionKind::Refine => {
                let text = Self::read_script(response).await?.script_text().ok_or_else(|| {
                    ServiceError::invalid_response("Refine response carried no script text.")
                })?;
                DecisionReply::Refined(text)
            }
        };
        tracing::info!(
            target: "script_review",
            "Decision request completed in {:.2?}",
            start.elapsed()
        );
        Ok(reply)
    }

    async fn submit_video_decision(
        &self,
        request: &VideoDecisionRequest,
    ) -> Result<(), ServiceError> {
        let url = match request.status {
            VideoDecision::Approved => &self.video_approve_url,
            VideoDecision::Rejected => &self.video_reject_url,
        };
        self.post_json(url, request).await?;
        tracing::debug!(
            target: "script_review",
            "Video decision {} delivered for {}",
            request.status,
            request.video_url
        );
        Ok(())
    }
}
