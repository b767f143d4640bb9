//! Report client core: pure submission and polling state machines.
mod classify;
mod effect;
mod msg;
mod progress;
mod request;
mod state;
mod update;
mod view_model;

pub use classify::{
    classify_generate, classify_status, FatalKind, JobOutcome, PollOutcome, RecoverableReason,
    TransportResponse, STATUS_CHECK_FAILED,
};
pub use effect::{PollEffect, PollEvent, SubmissionEvent, SubmitEffect};
pub use msg::{PollMsg, SubmitMsg};
pub use progress::{
    stage_index, ProgressSimulation, PROGRESS_CEILING, PROGRESS_STEP, STAGE_MESSAGES,
};
pub use request::{FieldValue, JobRequest, DEFAULT_LANGUAGE, DEFAULT_MODEL};
pub use state::{
    Generation, PollConfig, PollState, PollerState, SubmissionAttempt, SubmissionConfig,
    SubmissionState,
};
pub use update::{update_poll, update_submission};
pub use view_model::{PollPhase, PollView, SubmissionPhase, SubmissionView};
