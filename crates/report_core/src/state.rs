use std::time::Duration;

use crate::view_model::{PollPhase, PollView, SubmissionPhase, SubmissionView};
use crate::{JobRequest, ProgressSimulation, RecoverableReason};

/// Monotonic token identifying one attempt (or one polling session).
///
/// Every timer and transport message carries the token it was issued for;
/// messages carrying anything but the live token are dropped.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionConfig {
    /// Local watchdog per attempt.
    pub timeout: Duration,
    pub progress_every: Duration,
    pub retry_delay: Duration,
    pub max_retries: u32,
}

impl SubmissionConfig {
    /// Initial attempt plus retries, saturating at `u32::MAX`.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(900_000),
            progress_every: Duration::from_millis(20_000),
            retry_delay: Duration::from_millis(5_000),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAttempt {
    /// 0-based; `max_retries + 1` attempts at most.
    pub number: u32,
    pub generation: Generation,
    pub progress: ProgressSimulation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    Idle,
    Submitting {
        request: JobRequest,
        attempt: SubmissionAttempt,
    },
    Retrying {
        request: JobRequest,
        generation: Generation,
        next_attempt: u32,
        reason: RecoverableReason,
    },
    Finished(SubmissionPhase),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionState {
    config: SubmissionConfig,
    last_generation: Generation,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) retries_used: u32,
}

impl Default for SubmissionState {
    fn default() -> Self {
        Self::new(SubmissionConfig::default())
    }
}

impl SubmissionState {
    pub fn new(config: SubmissionConfig) -> Self {
        Self {
            config,
            last_generation: 0,
            lifecycle: Lifecycle::Idle,
            retries_used: 0,
        }
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    pub fn attempt(&self) -> Option<&SubmissionAttempt> {
        match &self.lifecycle {
            Lifecycle::Submitting { attempt, .. } => Some(attempt),
            _ => None,
        }
    }

    /// Generation owning timers right now, if any.
    pub fn live_generation(&self) -> Option<Generation> {
        match &self.lifecycle {
            Lifecycle::Submitting { attempt, .. } => Some(attempt.generation),
            Lifecycle::Retrying { generation, .. } => Some(*generation),
            Lifecycle::Idle | Lifecycle::Finished(_) => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.live_generation().is_some()
    }

    pub fn view(&self) -> SubmissionView {
        let phase = match &self.lifecycle {
            Lifecycle::Idle => SubmissionPhase::Idle,
            Lifecycle::Submitting { .. } => SubmissionPhase::Submitting,
            Lifecycle::Retrying { .. } => SubmissionPhase::Retrying,
            Lifecycle::Finished(phase) => *phase,
        };
        let attempt = self.attempt();
        SubmissionView {
            phase,
            attempt_number: attempt.map(|a| a.number),
            generation: self.live_generation(),
            progress_counter: attempt.map(|a| a.progress.counter()),
            retries_used: self.retries_used,
        }
    }

    pub(crate) fn next_generation(&mut self) -> Generation {
        self.last_generation += 1;
        self.last_generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pub job_id: String,
    pub generation: Generation,
    /// Status queries issued so far.
    pub polls: u32,
    pub in_flight: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerState {
    config: PollConfig,
    last_generation: Generation,
    pub(crate) active: Option<PollState>,
    pub(crate) phase: PollPhase,
}

impl Default for PollerState {
    fn default() -> Self {
        Self::new(PollConfig::default())
    }
}

impl PollerState {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            last_generation: 0,
            active: None,
            phase: PollPhase::Idle,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn active(&self) -> Option<&PollState> {
        self.active.as_ref()
    }

    pub fn view(&self) -> PollView {
        PollView {
            phase: self.phase,
            job_id: self.active.as_ref().map(|p| p.job_id.clone()),
            polls: self.active.as_ref().map_or(0, |p| p.polls),
        }
    }

    pub(crate) fn next_generation(&mut self) -> Generation {
        self.last_generation += 1;
        self.last_generation
    }
}
