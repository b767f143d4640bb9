use std::time::Duration;

use crate::{FatalKind, Generation};

/// Lifecycle events delivered to the view layer by the submission controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    Progress(String),
    Success { redirect_url: String },
    /// Hand-off to the status poller.
    JobAccepted { job_id: String },
    Fatal { kind: FatalKind, message: String },
}

impl SubmissionEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionEvent::Progress(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitEffect {
    /// Start the watchdog and the progress interval for an attempt.
    ArmTimers {
        generation: Generation,
        timeout: Duration,
        progress_every: Duration,
    },
    SendRequest {
        generation: Generation,
        form: Vec<(String, String)>,
    },
    /// Release every timer owned by `generation`.
    ClearTimers { generation: Generation },
    ScheduleRetry {
        generation: Generation,
        after: Duration,
    },
    Emit(SubmissionEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Progress(u8),
    Success { redirect_url: String },
    Fatal { message: String },
}

impl PollEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollEvent::Progress(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEffect {
    StartInterval {
        generation: Generation,
        every: Duration,
    },
    StopInterval { generation: Generation },
    QueryStatus {
        generation: Generation,
        job_id: String,
    },
    Emit(PollEvent),
}
