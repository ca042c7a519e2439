//! Async driver around [`ReviewMachine`].
//!
//! Remote calls run on spawned tasks and report back through a channel as
//! [`WorkflowEvent`]s. The owner of the session pulls events with
//! [`ReviewSession::next_event`] and applies them with
//! [`ReviewSession::handle_event`], so every state change happens on the
//! owner's task in completion order.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::config::ReviewConfig;
use crate::error::{Result, ServiceError};
use crate::machine::{RequestTicket, ReviewMachine, ReviewState, Transition};
use crate::models::{
    DecisionKind, DecisionReply, GeneratedScript, RequestParameters, VideoDecision,
};
use crate::service::ScriptService;
use crate::status::StatusBoard;

pub const SCRIPT_UPDATED: &str = "Script updated successfully!";
pub const REFINE_SENT: &str = "Refinement request sent with feedback!";
pub const SCRIPT_APPROVED: &str = "Script approved successfully!";
pub const GENERATE_FAILED: &str = "Error generating script. Please try again.";
pub const DECISION_FAILED: &str = "Error processing script. Please try again.";
pub const VIDEO_APPROVED: &str = "Video approved and sent for upload!";
pub const VIDEO_REJECTED: &str = "Video rejected and sent for revision!";
pub const VIDEO_FAILED: &str = "Could not deliver the video decision.";

#[derive(Debug)]
pub enum WorkflowEvent {
    Generated {
        ticket: RequestTicket,
        result: std::result::Result<GeneratedScript, ServiceError>,
    },
    DecisionSubmitted {
        ticket: RequestTicket,
        result: std::result::Result<DecisionReply, ServiceError>,
    },
    VideoDecisionSent {
        ticket: RequestTicket,
        decision: VideoDecision,
        result: std::result::Result<(), ServiceError>,
    },
}

pub struct ReviewSession {
    machine: ReviewMachine,
    service: Arc<dyn ScriptService>,
    config: ReviewConfig,
    status: StatusBoard,
    event_tx: UnboundedSender<WorkflowEvent>,
    event_rx: UnboundedReceiver<WorkflowEvent>,
    outstanding: usize,
}

impl ReviewSession {
    pub fn new(service: Arc<dyn ScriptService>, config: ReviewConfig) -> Self {
        let (event_tx, event_rx) = unbounded_channel();
        Self {
            machine: ReviewMachine::new(),
            service,
            config,
            status: StatusBoard::new(),
            event_tx,
            event_rx,
            outstanding: 0,
        }
    }

    pub fn machine(&self) -> &ReviewMachine {
        &self.machine
    }

    pub fn state(&self) -> ReviewState {
        self.machine.state()
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// Spawned requests whose events have not been handled yet, stale ones
    /// included.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn submit(&mut self, params: RequestParameters) -> Result<()> {
        let pending = self.machine.begin_generate(params)?;
        let service = Arc::clone(&self.service);
        let ticket = pending.ticket;
        self.dispatch(
            "generate",
            async move { service.generate(&pending.request).await },
            move |result| WorkflowEvent::Generated { ticket, result },
        );
        Ok(())
    }

    pub fn start_edit(&mut self) -> Result<()> {
        self.machine.start_edit()
    }

    pub fn update_working_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.machine.update_working_text(text)
    }

    pub fn save_edit(&mut self) -> Result<()> {
        self.machine.save_edit()?;
        self.status
            .info(SCRIPT_UPDATED, self.config.notice_duration());
        Ok(())
    }

    pub fn cancel_edit(&mut self) -> Result<()> {
        self.machine.cancel_edit()
    }

    pub fn set_feedback(&mut self, feedback: impl Into<String>) -> Result<()> {
        self.machine.set_feedback(feedback)
    }

    /// Sends the current script as an approval or a refine request, depending
    /// on the feedback buffer.
    pub fn submit_decision(&mut self) -> Result<DecisionKind> {
        let pending = self.machine.begin_decision()?;
        let kind = pending.request.status;
        let service = Arc::clone(&self.service);
        let ticket = pending.ticket;
        self.dispatch(
            "decision",
            async move { service.submit_decision(&pending.request).await },
            move |result| WorkflowEvent::DecisionSubmitted { ticket, result },
        );
        Ok(kind)
    }

    /// Applies the decision locally, then notifies the service in the
    /// background. Returns `false` when the decision was already in place.
    pub fn decide_video(&mut self, decision: VideoDecision) -> Result<bool> {
        let Some(pending) = self.machine.decide_video(decision)? else {
            return Ok(false);
        };
        let service = Arc::clone(&self.service);
        let ticket = pending.ticket;
        self.dispatch(
            "video decision",
            async move { service.submit_video_decision(&pending.request).await },
            move |result| WorkflowEvent::VideoDecisionSent {
                ticket,
                decision,
                result,
            },
        );
        Ok(true)
    }

    /// Runs `call` on its own task and reports its outcome as an event. A call
    /// that panics or is cancelled still reports, as a transport failure, so
    /// `outstanding` always drains.
    fn dispatch<T, F>(
        &mut self,
        label: &'static str,
        call: F,
        into_event: impl FnOnce(std::result::Result<T, ServiceError>) -> WorkflowEvent
            + Send
            + 'static,
    ) where
        T: Send + 'static,
        F: Future<Output = std::result::Result<T, ServiceError>> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        self.outstanding += 1;
        let call = tokio::spawn(call);
        tokio::spawn(async move {
            let result = match call.await {
                Ok(result) => result,
                Err(err) => {
                    tracing::error!(target: "script_review", "{} task failed: {}", label, err);
                    Err(ServiceError::transport(format!("{label} task failed: {err}")))
                }
            };
            if tx.send(into_event(result)).is_err() {
                tracing::debug!(target: "script_review", "Session gone; dropping {} reply", label);
            }
        });
    }

    /// Start over. Requests still in flight are left to finish and their
    /// replies are discarded.
    pub fn reset(&mut self) {
        if self.machine.is_busy() {
            tracing::info!(
                target: "script_review",
                "Reset while {}; the pending reply will be discarded",
                self.machine.state()
            );
        }
        self.machine.reset();
    }

    pub async fn next_event(&mut self) -> Option<WorkflowEvent> {
        self.event_rx.recv().await
    }

    pub fn handle_event(&mut self, event: WorkflowEvent) -> Transition {
        self.outstanding = self.outstanding.saturating_sub(1);
        let transition = match event {
            WorkflowEvent::Generated { ticket, result } => {
                self.machine.complete_generate(ticket, result)
            }
            WorkflowEvent::DecisionSubmitted { ticket, result } => {
                self.machine.complete_decision(ticket, result)
            }
            WorkflowEvent::VideoDecisionSent {
                ticket,
                decision,
                result,
            } => self.machine.complete_video_decision(ticket, decision, result),
        };
        self.announce(transition);
        transition
    }

    /// Waits for and applies every outstanding reply.
    pub async fn settle(&mut self) -> Vec<Transition> {
        let mut transitions = Vec::new();
        while self.outstanding > 0 {
            let Some(event) = self.next_event().await else {
                break;
            };
            transitions.push(self.handle_event(event));
        }
        transitions
    }

    fn announce(&self, transition: Transition) {
        let ok = self.config.notice_duration();
        let failed = self.config.error_notice_duration();
        match transition {
            Transition::Generated { has_video } => {
                tracing::info!(
                    target: "script_review",
                    "Script ready for review (video: {})",
                    has_video
                );
            }
            Transition::GenerateFailed => self.status.error(GENERATE_FAILED, failed),
            Transition::Refined => self.status.info(REFINE_SENT, ok),
            Transition::Approved => self.status.info(SCRIPT_APPROVED, ok),
            Transition::DecisionFailed(_) => self.status.error(DECISION_FAILED, failed),
            Transition::VideoDelivered(VideoDecision::Approved) => {
                self.status.info(VIDEO_APPROVED, ok)
            }
            Transition::VideoDelivered(VideoDecision::Rejected) => {
                self.status.info(VIDEO_REJECTED, ok)
            }
            Transition::VideoFailed(_) => self.status.error(VIDEO_FAILED, failed),
            Transition::Stale => {
                tracing::debug!(target: "script_review", "Discarded a stale reply");
            }
        }
    }
}
