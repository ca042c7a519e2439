//! Review/refine state machine.
//!
//! The machine is synchronous: every remote call is split into a `begin_*`
//! step that hands back the request to send plus a [`RequestTicket`], and a
//! `complete_*` step that applies the reply. Tickets carry the epoch they were
//! issued in; `reset` moves to a new epoch so replies that arrive afterwards
//! are dropped.

use std::fmt;

use crate::draft::ScriptSession;
use crate::error::{Result, ServiceError, WorkflowError};
use crate::models::{
    DecisionKind, DecisionReply, DecisionRequest, GenerateRequest, GeneratedScript,
    RequestParameters, VideoDecision, VideoDecisionRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Idle,
    Generating,
    Reviewing,
    Editing,
    SubmittingDecision,
    Approved,
}

impl ReviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewState::Idle => "idle",
            ReviewState::Generating => "generating",
            ReviewState::Reviewing => "reviewing",
            ReviewState::Editing => "editing",
            ReviewState::SubmittingDecision => "submitting a decision",
            ReviewState::Approved => "approved",
        }
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the epoch a request was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    epoch: u64,
}

#[derive(Debug, Clone)]
pub struct PendingGenerate {
    pub ticket: RequestTicket,
    pub request: GenerateRequest,
}

#[derive(Debug, Clone)]
pub struct PendingDecision {
    pub ticket: RequestTicket,
    pub request: DecisionRequest,
}

#[derive(Debug, Clone)]
pub struct PendingVideoDecision {
    pub ticket: RequestTicket,
    pub request: VideoDecisionRequest,
}

/// What applying a reply did to the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Generated { has_video: bool },
    GenerateFailed,
    Refined,
    Approved,
    DecisionFailed(DecisionKind),
    VideoDelivered(VideoDecision),
    VideoFailed(VideoDecision),
    /// Reply belonged to an earlier epoch and was ignored.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Reviewing,
    Editing,
    SubmittingDecision(DecisionKind),
    Approved,
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    Generating { params: RequestParameters },
    Active { session: ScriptSession, stage: Stage },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewMachine {
    phase: Phase,
    epoch: u64,
}

impl Default for ReviewMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            epoch: 0,
        }
    }

    pub fn state(&self) -> ReviewState {
        match &self.phase {
            Phase::Idle => ReviewState::Idle,
            Phase::Generating { .. } => ReviewState::Generating,
            Phase::Active { stage, .. } => match stage {
                Stage::Reviewing => ReviewState::Reviewing,
                Stage::Editing => ReviewState::Editing,
                Stage::SubmittingDecision(_) => ReviewState::SubmittingDecision,
                Stage::Approved => ReviewState::Approved,
            },
        }
    }

    /// Draft, feedback and video; present from the first successful generation
    /// until reset.
    pub fn session(&self) -> Option<&ScriptSession> {
        match &self.phase {
            Phase::Active { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn params(&self) -> Option<&RequestParameters> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Generating { params } => Some(params),
            Phase::Active { session, .. } => Some(session.params()),
        }
    }

    /// Kind of decision currently in flight.
    pub fn submitting(&self) -> Option<DecisionKind> {
        match &self.phase {
            Phase::Active {
                stage: Stage::SubmittingDecision(kind),
                ..
            } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.state(),
            ReviewState::Generating | ReviewState::SubmittingDecision
        )
    }

    fn ticket(&self) -> RequestTicket {
        RequestTicket { epoch: self.epoch }
    }

    fn reject(&self, action: &'static str) -> WorkflowError {
        if self.is_busy() {
            WorkflowError::RequestInFlight
        } else {
            WorkflowError::InvalidTransition {
                action,
                state: self.state(),
            }
        }
    }

    fn active_in(&mut self, expected: Stage, action: &'static str) -> Result<&mut ScriptSession> {
        let rejection = self.reject(action);
        match &mut self.phase {
            Phase::Active { session, stage } if *stage == expected => Ok(session),
            _ => Err(rejection),
        }
    }

    fn set_stage(&mut self, next: Stage) {
        if let Phase::Active { stage, .. } = &mut self.phase {
            *stage = next;
        }
    }

    pub fn begin_generate(&mut self, params: RequestParameters) -> Result<PendingGenerate> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(self.reject("submit a topic"));
        }
        let request = GenerateRequest::new(&params);
        self.phase = Phase::Generating { params };
        Ok(PendingGenerate {
            ticket: self.ticket(),
            request,
        })
    }

    pub fn complete_generate(
        &mut self,
        ticket: RequestTicket,
        result: std::result::Result<GeneratedScript, ServiceError>,
    ) -> Transition {
        if ticket.epoch != self.epoch || !matches!(self.phase, Phase::Generating { .. }) {
            return Transition::Stale;
        }
        let Phase::Generating { params } = std::mem::replace(&mut self.phase, Phase::Idle) else {
            return Transition::Stale;
        };
        match result {
            Ok(generated) => {
                let has_video = generated.video_url.is_some();
                self.phase = Phase::Active {
                    session: ScriptSession::from_generated(params, generated),
                    stage: Stage::Reviewing,
                };
                Transition::Generated { has_video }
            }
            Err(err) => {
                tracing::warn!(target: "script_review", "Script generation failed: {}", err);
                Transition::GenerateFailed
            }
        }
    }

    pub fn start_edit(&mut self) -> Result<()> {
        self.active_in(Stage::Reviewing, "start editing")?
            .draft_mut()
            .rewind_working_text();
        self.set_stage(Stage::Editing);
        Ok(())
    }

    pub fn update_working_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.active_in(Stage::Editing, "edit the script")?
            .draft_mut()
            .set_working_text(text);
        Ok(())
    }

    pub fn save_edit(&mut self) -> Result<()> {
        self.active_in(Stage::Editing, "save an edit")?
            .draft_mut()
            .commit_working_text();
        self.set_stage(Stage::Reviewing);
        Ok(())
    }

    pub fn cancel_edit(&mut self) -> Result<()> {
        self.active_in(Stage::Editing, "cancel an edit")?
            .draft_mut()
            .rewind_working_text();
        self.set_stage(Stage::Reviewing);
        Ok(())
    }

    pub fn set_feedback(&mut self, feedback: impl Into<String>) -> Result<()> {
        self.active_in(Stage::Reviewing, "change feedback")?
            .set_feedback(feedback);
        Ok(())
    }

    /// Classifies the feedback buffer and snapshots the request to send.
    pub fn begin_decision(&mut self) -> Result<PendingDecision> {
        let session = self.active_in(Stage::Reviewing, "submit a decision")?;
        let kind = session.pending_decision();
        let request = session.decision_request(kind);
        self.set_stage(Stage::SubmittingDecision(kind));
        Ok(PendingDecision {
            ticket: self.ticket(),
            request,
        })
    }

    pub fn complete_decision(
        &mut self,
        ticket: RequestTicket,
        result: std::result::Result<DecisionReply, ServiceError>,
    ) -> Transition {
        let Some(kind) = self.submitting().filter(|_| ticket.epoch == self.epoch) else {
            return Transition::Stale;
        };
        let Phase::Active { session, stage } = &mut self.phase else {
            return Transition::Stale;
        };
        match (kind, result) {
            (DecisionKind::Approved, Ok(_)) => {
                *stage = Stage::Approved;
                Transition::Approved
            }
            (DecisionKind::Refine, Ok(DecisionReply::Refined(text))) => {
                session.draft_mut().replace_text(text);
                session.clear_feedback();
                *stage = Stage::Reviewing;
                Transition::Refined
            }
            (DecisionKind::Refine, Ok(DecisionReply::Acknowledged)) => {
                tracing::warn!(
                    target: "script_review",
                    "Refine request acknowledged without a revised script"
                );
                *stage = Stage::Reviewing;
                Transition::DecisionFailed(kind)
            }
            (_, Err(err)) => {
                tracing::warn!(
                    target: "script_review",
                    "Script decision '{}' failed: {}",
                    kind,
                    err
                );
                *stage = Stage::Reviewing;
                Transition::DecisionFailed(kind)
            }
        }
    }

    /// Records the decision locally right away and returns the notification
    /// to send, or `None` when nothing changed.
    pub fn decide_video(&mut self, decision: VideoDecision) -> Result<Option<PendingVideoDecision>> {
        let ticket = self.ticket();
        let video = match &mut self.phase {
            Phase::Active { session, .. } => session.video_mut(),
            _ => None,
        }
        .ok_or(WorkflowError::NoVideo)?;
        Ok(video
            .decide(decision)
            .map(|request| PendingVideoDecision { ticket, request }))
    }

    /// The local decision stands whatever the outcome.
    pub fn complete_video_decision(
        &mut self,
        ticket: RequestTicket,
        decision: VideoDecision,
        result: std::result::Result<(), ServiceError>,
    ) -> Transition {
        match result {
            Ok(()) if ticket.epoch == self.epoch => Transition::VideoDelivered(decision),
            Err(err) => {
                tracing::warn!(
                    target: "script_review",
                    "Video decision '{}' was not delivered: {}",
                    decision,
                    err
                );
                if ticket.epoch == self.epoch {
                    Transition::VideoFailed(decision)
                } else {
                    Transition::Stale
                }
            }
            Ok(()) => Transition::Stale,
        }
    }

    /// Start over. Outstanding replies become stale.
    pub fn reset(&mut self) {
        if matches!(self.phase, Phase::Idle) {
            return;
        }
        self.phase = Phase::Idle;
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::VideoDecisionState;
    use crate::models::{CorrelationToken, Genre, Tone};

    fn params() -> RequestParameters {
        RequestParameters::new("cats", Tone::Funny, Genre::Entertainment).unwrap()
    }

    fn generated(text: &str, video_url: Option<&str>) -> GeneratedScript {
        GeneratedScript {
            text: text.to_string(),
            video_url: video_url.map(str::to_string),
            response_id: Some(CorrelationToken::new("r1")),
            response_timestamp: Some(CorrelationToken::new("t1")),
        }
    }

    fn reviewing(text: &str, video_url: Option<&str>) -> ReviewMachine {
        let mut machine = ReviewMachine::new();
        let pending = machine.begin_generate(params()).unwrap();
        machine.complete_generate(pending.ticket, Ok(generated(text, video_url)));
        machine
    }

    #[test]
    fn test_generate_success_enters_reviewing() {
        let mut machine = ReviewMachine::new();
        let pending = machine.begin_generate(params()).unwrap();
        assert_eq!(machine.state(), ReviewState::Generating);
        assert_eq!(pending.request.topic, "cats");
        assert_eq!(pending.request.tone, Tone::Funny);

        let transition = machine.complete_generate(pending.ticket, Ok(generated("Hello", None)));
        assert_eq!(transition, Transition::Generated { has_video: false });
        assert_eq!(machine.state(), ReviewState::Reviewing);
        let draft = machine.session().unwrap().draft();
        assert_eq!(draft.committed_text(), "Hello");
        assert_eq!(draft.working_text(), "Hello");
    }

    #[test]
    fn test_generate_failure_returns_to_idle() {
        let mut machine = ReviewMachine::new();
        let pending = machine.begin_generate(params()).unwrap();
        let transition =
            machine.complete_generate(pending.ticket, Err(ServiceError::transport("refused")));
        assert_eq!(transition, Transition::GenerateFailed);
        assert_eq!(machine.state(), ReviewState::Idle);
        assert!(machine.session().is_none());
    }

    #[test]
    fn test_empty_script_is_still_a_script() {
        let machine = reviewing("", None);
        assert_eq!(machine.state(), ReviewState::Reviewing);
        assert_eq!(machine.session().unwrap().draft().committed_text(), "");
    }

    #[test]
    fn test_second_generate_rejected_while_in_flight() {
        let mut machine = ReviewMachine::new();
        machine.begin_generate(params()).unwrap();
        assert_eq!(
            machine.begin_generate(params()).unwrap_err(),
            WorkflowError::RequestInFlight
        );
    }

    #[test]
    fn test_edit_round_trip_without_changes() {
        let mut machine = reviewing("Hello", None);
        machine.start_edit().unwrap();
        assert_eq!(machine.state(), ReviewState::Editing);
        machine.save_edit().unwrap();
        assert_eq!(machine.state(), ReviewState::Reviewing);
        assert_eq!(machine.session().unwrap().draft().committed_text(), "Hello");
    }

    #[test]
    fn test_save_edit_commits_working_text() {
        let mut machine = reviewing("Hello", None);
        machine.start_edit().unwrap();
        machine.update_working_text("Hello, world").unwrap();
        assert_eq!(machine.session().unwrap().draft().committed_text(), "Hello");
        machine.save_edit().unwrap();
        let draft = machine.session().unwrap().draft();
        assert_eq!(draft.committed_text(), "Hello, world");
        assert_eq!(draft.working_text(), "Hello, world");
    }

    #[test]
    fn test_cancel_edit_discards_working_text() {
        let mut machine = reviewing("Hello", None);
        machine.start_edit().unwrap();
        machine.update_working_text("scratch").unwrap();
        machine.cancel_edit().unwrap();
        let draft = machine.session().unwrap().draft();
        assert_eq!(draft.committed_text(), "Hello");
        assert_eq!(draft.working_text(), "Hello");
    }

    #[test]
    fn test_edit_not_allowed_outside_reviewing() {
        let mut machine = ReviewMachine::new();
        assert!(matches!(
            machine.start_edit(),
            Err(WorkflowError::InvalidTransition { .. })
        ));
        assert!(machine.update_working_text("x").is_err());

        let mut machine = reviewing("Hello", None);
        machine.start_edit().unwrap();
        assert!(machine.begin_decision().is_err());
        assert!(machine.set_feedback("x").is_err());
    }

    #[test]
    fn test_refine_replaces_draft_and_clears_feedback() {
        let mut machine = reviewing("Hello", None);
        machine.set_feedback("make it shorter").unwrap();
        let pending = machine.begin_decision().unwrap();
        assert_eq!(pending.request.status, DecisionKind::Refine);
        assert_eq!(pending.request.feedback, "make it shorter");
        assert_eq!(pending.request.content.text, "Hello");
        assert_eq!(machine.submitting(), Some(DecisionKind::Refine));

        let transition = machine.complete_decision(
            pending.ticket,
            Ok(DecisionReply::Refined("Shorter hello".to_string())),
        );
        assert_eq!(transition, Transition::Refined);
        assert_eq!(machine.state(), ReviewState::Reviewing);
        let session = machine.session().unwrap();
        assert_eq!(session.draft().committed_text(), "Shorter hello");
        assert_eq!(session.draft().working_text(), "Shorter hello");
        assert_eq!(session.feedback(), "");
        assert_eq!(session.draft().response_id(), Some(&CorrelationToken::new("r1")));
    }

    #[test]
    fn test_approve_is_terminal() {
        let mut machine = reviewing("Hello", None);
        let pending = machine.begin_decision().unwrap();
        assert_eq!(pending.request.status, DecisionKind::Approved);
        let transition = machine.complete_decision(pending.ticket, Ok(DecisionReply::Acknowledged));
        assert_eq!(transition, Transition::Approved);
        assert_eq!(machine.state(), ReviewState::Approved);
        assert!(machine.start_edit().is_err());
        assert!(machine.begin_decision().is_err());
    }

    #[test]
    fn test_decision_failure_keeps_draft_and_feedback() {
        let mut machine = reviewing("Hello", None);
        machine.set_feedback("more cats").unwrap();
        let pending = machine.begin_decision().unwrap();
        let transition =
            machine.complete_decision(pending.ticket, Err(ServiceError::transport("timeout")));
        assert_eq!(transition, Transition::DecisionFailed(DecisionKind::Refine));
        assert_eq!(machine.state(), ReviewState::Reviewing);
        let session = machine.session().unwrap();
        assert_eq!(session.draft().committed_text(), "Hello");
        assert_eq!(session.feedback(), "more cats");
    }

    #[test]
    fn test_second_decision_rejected_while_submitting() {
        let mut machine = reviewing("Hello", None);
        machine.begin_decision().unwrap();
        assert_eq!(
            machine.begin_decision().unwrap_err(),
            WorkflowError::RequestInFlight
        );
        assert_eq!(machine.state(), ReviewState::SubmittingDecision);
    }

    #[test]
    fn test_reset_discards_late_replies() {
        let mut machine = ReviewMachine::new();
        let pending = machine.begin_generate(params()).unwrap();
        machine.reset();
        assert_eq!(
            machine.complete_generate(pending.ticket, Ok(generated("late", None))),
            Transition::Stale
        );
        assert_eq!(machine.state(), ReviewState::Idle);

        let pending = machine.begin_generate(params()).unwrap();
        machine.complete_generate(pending.ticket, Ok(generated("Hello", None)));
        let decision = machine.begin_decision().unwrap();
        machine.reset();
        assert_eq!(
            machine.complete_decision(decision.ticket, Ok(DecisionReply::Acknowledged)),
            Transition::Stale
        );
        assert_eq!(machine.state(), ReviewState::Idle);
    }

    #[test]
    fn test_stale_generate_does_not_clobber_new_run() {
        let mut machine = ReviewMachine::new();
        let first = machine.begin_generate(params()).unwrap();
        machine.reset();
        let second = machine.begin_generate(params()).unwrap();
        assert_eq!(
            machine.complete_generate(first.ticket, Ok(generated("old", None))),
            Transition::Stale
        );
        assert_eq!(machine.state(), ReviewState::Generating);
        machine.complete_generate(second.ticket, Ok(generated("new", None)));
        assert_eq!(machine.session().unwrap().draft().committed_text(), "new");
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut once = reviewing("Hello", Some("v1"));
        once.reset();
        let mut twice = reviewing("Hello", Some("v1"));
        twice.reset();
        twice.reset();
        assert_eq!(once, twice);
        assert_eq!(twice.state(), ReviewState::Idle);
        assert!(twice.session().is_none());
    }

    #[test]
    fn test_video_decision_is_optimistic() {
        let mut machine = reviewing("Hello", Some("v1"));
        let pending = machine.decide_video(VideoDecision::Approved).unwrap().unwrap();
        assert_eq!(pending.request.video_url, "v1");
        let transition = machine.complete_video_decision(
            pending.ticket,
            VideoDecision::Approved,
            Err(ServiceError::transport("refused")),
        );
        assert_eq!(transition, Transition::VideoFailed(VideoDecision::Approved));
        assert_eq!(
            machine.session().unwrap().video().unwrap().decision(),
            VideoDecisionState::Decided(VideoDecision::Approved)
        );
    }

    #[test]
    fn test_video_decision_independent_of_script_phase() {
        let mut machine = reviewing("Hello", Some("v1"));
        let pending = machine.begin_decision().unwrap();
        assert!(machine.decide_video(VideoDecision::Rejected).unwrap().is_some());
        machine.complete_decision(pending.ticket, Ok(DecisionReply::Acknowledged));
        assert_eq!(machine.state(), ReviewState::Approved);
        assert!(machine.decide_video(VideoDecision::Approved).unwrap().is_some());
        assert!(machine.decide_video(VideoDecision::Approved).unwrap().is_none());
    }

    #[test]
    fn test_video_decision_requires_artifact() {
        let mut machine = reviewing("Hello", None);
        assert_eq!(
            machine.decide_video(VideoDecision::Approved).unwrap_err(),
            WorkflowError::NoVideo
        );
        let mut idle = ReviewMachine::new();
        assert_eq!(
            idle.decide_video(VideoDecision::Approved).unwrap_err(),
            WorkflowError::NoVideo
        );
    }
}
