use crate::models::{
    CorrelationToken, DecisionKind, DecisionRequest, GeneratedScript, RequestParameters,
    ScriptContent, VideoDecision, VideoDecisionRequest,
};

/// The script under review plus the metadata needed to correlate a decision
/// with the generation that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptDraft {
    committed_text: String,
    working_text: String,
    response_id: Option<CorrelationToken>,
    response_timestamp: Option<CorrelationToken>,
}

impl ScriptDraft {
    pub fn new(
        text: impl Into<String>,
        response_id: Option<CorrelationToken>,
        response_timestamp: Option<CorrelationToken>,
    ) -> Self {
        let text = text.into();
        Self {
            working_text: text.clone(),
            committed_text: text,
            response_id,
            response_timestamp,
        }
    }

    pub fn committed_text(&self) -> &str {
        &self.committed_text
    }

    pub fn working_text(&self) -> &str {
        &self.working_text
    }

    pub fn response_id(&self) -> Option<&CorrelationToken> {
        self.response_id.as_ref()
    }

    pub fn response_timestamp(&self) -> Option<&CorrelationToken> {
        self.response_timestamp.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.working_text != self.committed_text
    }

    pub(crate) fn set_working_text(&mut self, text: impl Into<String>) {
        self.working_text = text.into();
    }

    pub(crate) fn rewind_working_text(&mut self) {
        self.working_text.clone_from(&self.committed_text);
    }

    pub(crate) fn commit_working_text(&mut self) {
        self.committed_text.clone_from(&self.working_text);
    }

    /// Swap in server text; correlation metadata is left untouched.
    pub(crate) fn replace_text(&mut self, text: String) {
        self.working_text.clone_from(&text);
        self.committed_text = text;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoDecisionState {
    #[default]
    Undecided,
    Decided(VideoDecision),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoArtifact {
    url: String,
    decision: VideoDecisionState,
}

impl VideoArtifact {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            decision: VideoDecisionState::Undecided,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn decision(&self) -> VideoDecisionState {
        self.decision
    }

    /// Applies the decision locally. Returns the notification to send, or
    /// `None` when the decision is already in place.
    pub(crate) fn decide(&mut self, decision: VideoDecision) -> Option<VideoDecisionRequest> {
        if self.decision == VideoDecisionState::Decided(decision) {
            return None;
        }
        self.decision = VideoDecisionState::Decided(decision);
        Some(VideoDecisionRequest {
            video_url: self.url.clone(),
            status: decision,
        })
    }
}

/// Everything that exists once a generation has succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptSession {
    params: RequestParameters,
    draft: ScriptDraft,
    feedback: String,
    video: Option<VideoArtifact>,
}

impl ScriptSession {
    pub(crate) fn from_generated(params: RequestParameters, generated: GeneratedScript) -> Self {
        Self {
            params,
            draft: ScriptDraft::new(
                generated.text,
                generated.response_id,
                generated.response_timestamp,
            ),
            feedback: String::new(),
            video: generated.video_url.map(VideoArtifact::new),
        }
    }

    pub fn params(&self) -> &RequestParameters {
        &self.params
    }

    pub fn draft(&self) -> &ScriptDraft {
        &self.draft
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn video(&self) -> Option<&VideoArtifact> {
        self.video.as_ref()
    }

    pub fn pending_decision(&self) -> DecisionKind {
        DecisionKind::from_feedback(&self.feedback)
    }

    pub(crate) fn draft_mut(&mut self) -> &mut ScriptDraft {
        &mut self.draft
    }

    pub(crate) fn video_mut(&mut self) -> Option<&mut VideoArtifact> {
        self.video.as_mut()
    }

    pub(crate) fn set_feedback(&mut self, feedback: impl Into<String>) {
        self.feedback = feedback.into();
    }

    pub(crate) fn clear_feedback(&mut self) {
        self.feedback.clear();
    }

    pub(crate) fn decision_request(&self, kind: DecisionKind) -> DecisionRequest {
        DecisionRequest {
            response_id: self.draft.response_id.clone(),
            content: ScriptContent {
                text: self.draft.committed_text.clone(),
            },
            topic: self.params.topic().to_string(),
            tone: self.params.tone(),
            genre: self.params.genre(),
            feedback: self.feedback.clone(),
            status: kind,
            timestamp: self.draft.response_timestamp.clone(),
        }
    }
}
