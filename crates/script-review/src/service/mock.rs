use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use super::ScriptService;
use crate::error::ServiceError;
use crate::models::{
    CorrelationToken, DecisionKind, DecisionReply, DecisionRequest, GenerateRequest,
    GeneratedScript, VideoDecisionRequest,
};

#[derive(Clone, Debug, Default)]
pub struct MockConfig {
    /// Delay before every reply.
    pub latency: Duration,
    /// Url attached to stub generations.
    pub video_url: Option<String>,
}

/// Request observed by the mock, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum MockCall {
    Generate(GenerateRequest),
    Decision(DecisionRequest),
    VideoDecision(VideoDecisionRequest),
}

/// In-memory service with scripted replies. Falls back to canned responses
/// once a queue is empty.
pub struct MockScriptService {
    config: MockConfig,
    generate_replies: Mutex<VecDeque<Result<GeneratedScript, ServiceError>>>,
    decision_replies: Mutex<VecDeque<Result<DecisionReply, ServiceError>>>,
    video_replies: Mutex<VecDeque<Result<(), ServiceError>>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockScriptService {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            generate_replies: Mutex::new(VecDeque::new()),
            decision_replies: Mutex::new(VecDeque::new()),
            video_replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_generate(&self, reply: Result<GeneratedScript, ServiceError>) -> &Self {
        self.generate_replies.lock().push_back(reply);
        self
    }

    pub fn push_decision(&self, reply: Result<DecisionReply, ServiceError>) -> &Self {
        self.decision_replies.lock().push_back(reply);
        self
    }

    pub fn push_video(&self, reply: Result<(), ServiceError>) -> &Self {
        self.video_replies.lock().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }
}

impl Default for MockScriptService {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

#[async_trait]
impl ScriptService for MockScriptService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedScript, ServiceError> {
        self.calls.lock().push(MockCall::Generate(request.clone()));
        self.simulate_latency().await;
        let scripted = self.generate_replies.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(GeneratedScript {
                text: format!(
                    "# {}\n\nA {} {} script about {}.",
                    request.topic,
                    request.tone.as_str().to_lowercase(),
                    request.genre.as_str().to_lowercase(),
                    request.topic
                ),
                video_url: self.config.video_url.clone(),
                response_id: Some(CorrelationToken::new(request.id.clone())),
                response_timestamp: Some(CorrelationToken::new(request.timestamp.clone())),
            })
        })
    }

    async fn submit_decision(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionReply, ServiceError> {
        self.calls.lock().push(MockCall::Decision(request.clone()));
        self.simulate_latency().await;
        let scripted = self.decision_replies.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(match request.status {
                DecisionKind::Approved => DecisionReply::Acknowledged,
                DecisionKind::Refine => DecisionReply::Refined(format!(
                    "{}\n\n(Revised: {})",
                    request.content.text,
                    request.feedback.trim()
                )),
            })
        })
    }

    async fn submit_video_decision(
        &self,
        request: &VideoDecisionRequest,
    ) -> Result<(), ServiceError> {
        self.calls.lock().push(MockCall::VideoDecision(request.clone()));
        self.simulate_latency().await;
        let scripted = self.video_replies.lock().pop_front();
        scripted.unwrap_or(Ok(()))
    }
}
