use crate::{FatalKind, Generation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
    Retrying,
    Succeeded,
    HandedOff,
    Failed(FatalKind),
}

impl SubmissionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SubmissionPhase::Succeeded | SubmissionPhase::HandedOff | SubmissionPhase::Failed(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionView {
    pub phase: SubmissionPhase,
    pub attempt_number: Option<u32>,
    pub generation: Option<Generation>,
    pub progress_counter: Option<u8>,
    pub retries_used: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollView {
    pub phase: PollPhase,
    pub job_id: Option<String>,
    pub polls: u32,
}
