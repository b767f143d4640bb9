use crate::{Generation, JobRequest, TransportResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMsg {
    /// View layer asked for a new report. Supersedes any active attempt.
    Submit { request: JobRequest },
    /// View layer abandoned the submission; no terminal event follows.
    Cancel,
    /// Progress-simulation interval fired.
    ProgressTick { generation: Generation },
    /// Local watchdog for the attempt expired.
    TimeoutElapsed { generation: Generation },
    /// Transport finished the request issued for `generation`.
    ResponseArrived {
        generation: Generation,
        response: TransportResponse,
    },
    /// Fixed delay before the next attempt is over.
    RetryDelayElapsed { generation: Generation },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollMsg {
    Start { job_id: String },
    Stop,
    /// Poll interval fired.
    Tick { generation: Generation },
    /// Transport finished a status query issued for `generation`.
    StatusArrived {
        generation: Generation,
        response: TransportResponse,
    },
}
