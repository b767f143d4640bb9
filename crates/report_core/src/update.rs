use std::time::Duration;

use report_logging::{report_debug, report_info, report_warn};

use crate::state::Lifecycle;
use crate::view_model::{PollPhase, SubmissionPhase};
use crate::{
    classify_generate, classify_status, FatalKind, Generation, JobOutcome, JobRequest,
    PollEffect, PollEvent, PollMsg, PollOutcome, PollState, PollerState, SubmissionAttempt,
    SubmissionEvent, SubmissionState, SubmitEffect, SubmitMsg,
};

/// Pure update function for the submission controller: applies a message
/// and returns the effects the runtime must execute, in order.
pub fn update_submission(
    mut state: SubmissionState,
    msg: SubmitMsg,
) -> (SubmissionState, Vec<SubmitEffect>) {
    let effects = match msg {
        SubmitMsg::Submit { request } => {
            let mut effects = teardown(&mut state);
            state.retries_used = 0;
            effects.extend(begin_attempt(&mut state, request, 0));
            effects
        }
        SubmitMsg::Cancel => {
            let effects = teardown(&mut state);
            if !effects.is_empty() {
                report_info!("submission cancelled");
            }
            state.lifecycle = Lifecycle::Idle;
            effects
        }
        SubmitMsg::ProgressTick { generation } => match &mut state.lifecycle {
            Lifecycle::Submitting { attempt, .. } if attempt.generation == generation => {
                let message = attempt.progress.advance();
                vec![SubmitEffect::Emit(SubmissionEvent::Progress(
                    message.to_string(),
                ))]
            }
            _ => stale("progress tick", generation),
        },
        SubmitMsg::TimeoutElapsed { generation } => {
            if !owns_attempt(&state, generation) {
                return (state, stale("timeout", generation));
            }
            let message = format!(
                "Report generation did not finish within {}. Please try again.",
                describe(state.config().timeout)
            );
            report_warn!("generation {generation}: local timeout expired");
            finish_fatal(&mut state, generation, FatalKind::TimeoutLocal, message)
        }
        SubmitMsg::ResponseArrived {
            generation,
            response,
        } => {
            if !owns_attempt(&state, generation) {
                return (state, stale("response", generation));
            }
            let outcome = classify_generate(&response);
            apply_outcome(&mut state, generation, outcome)
        }
        SubmitMsg::RetryDelayElapsed { generation } => {
            let lifecycle = std::mem::replace(&mut state.lifecycle, Lifecycle::Idle);
            match lifecycle {
                Lifecycle::Retrying {
                    request,
                    generation: waiting,
                    next_attempt,
                    reason,
                } if waiting == generation => {
                    report_debug!("generation {generation}: retry delay over after {reason}");
                    state.retries_used += 1;
                    begin_attempt(&mut state, request, next_attempt)
                }
                other => {
                    state.lifecycle = other;
                    stale("retry delay", generation)
                }
            }
        }
    };

    (state, effects)
}

fn owns_attempt(state: &SubmissionState, generation: Generation) -> bool {
    state
        .attempt()
        .is_some_and(|attempt| attempt.generation == generation)
}

fn stale<E>(what: &str, generation: Generation) -> Vec<E> {
    report_debug!("dropping stale {what} for generation {generation}");
    Vec::new()
}

/// Release whatever the previous attempt still holds.
fn teardown(state: &mut SubmissionState) -> Vec<SubmitEffect> {
    match state.live_generation() {
        Some(generation) => {
            report_info!("generation {generation}: superseded, clearing timers");
            vec![SubmitEffect::ClearTimers { generation }]
        }
        None => Vec::new(),
    }
}

fn begin_attempt(
    state: &mut SubmissionState,
    request: JobRequest,
    number: u32,
) -> Vec<SubmitEffect> {
    let generation = state.next_generation();
    let config = *state.config();
    report_info!(
        "generation {generation}: starting attempt {}/{} (model {})",
        number.saturating_add(1),
        config.total_attempts(),
        request.model()
    );
    let form = request.form_pairs();
    state.lifecycle = Lifecycle::Submitting {
        request,
        attempt: SubmissionAttempt {
            number,
            generation,
            progress: Default::default(),
        },
    };
    vec![
        SubmitEffect::ArmTimers {
            generation,
            timeout: config.timeout,
            progress_every: config.progress_every,
        },
        SubmitEffect::SendRequest { generation, form },
    ]
}

fn apply_outcome(
    state: &mut SubmissionState,
    generation: Generation,
    outcome: JobOutcome,
) -> Vec<SubmitEffect> {
    match outcome {
        JobOutcome::Success { redirect_url } => {
            report_info!("generation {generation}: report ready at {redirect_url}");
            finish(
                state,
                generation,
                SubmissionPhase::Succeeded,
                SubmissionEvent::Success { redirect_url },
            )
        }
        JobOutcome::Accepted { job_id } => {
            report_info!("generation {generation}: backend accepted job {job_id}");
            finish(
                state,
                generation,
                SubmissionPhase::HandedOff,
                SubmissionEvent::JobAccepted { job_id },
            )
        }
        JobOutcome::Fatal { kind, message } => {
            report_warn!("generation {generation}: fatal {kind}: {message}");
            finish_fatal(state, generation, kind, message)
        }
        JobOutcome::Recoverable { reason } => {
            let config = *state.config();
            let lifecycle = std::mem::replace(&mut state.lifecycle, Lifecycle::Idle);
            let (request, attempt) = match lifecycle {
                Lifecycle::Submitting { request, attempt } => (request, attempt),
                other => {
                    state.lifecycle = other;
                    return Vec::new();
                }
            };

            if attempt.number >= config.max_retries {
                let attempts = attempt.number.saturating_add(1);
                report_warn!(
                    "generation {generation}: {reason} after {attempts} attempts, giving up"
                );
                let message =
                    format!("Report generation failed after {attempts} attempts: {reason}.");
                return finish_fatal(state, generation, reason.escalated(), message);
            }

            let next_attempt = attempt.number + 1;
            report_warn!(
                "generation {generation}: {reason}, retrying in {}",
                describe(config.retry_delay)
            );
            let notice = format!(
                "Connection problem ({reason}). Retrying in {} (attempt {}/{})...",
                describe(config.retry_delay),
                next_attempt.saturating_add(1),
                config.total_attempts()
            );
            state.lifecycle = Lifecycle::Retrying {
                request,
                generation,
                next_attempt,
                reason,
            };
            vec![
                SubmitEffect::ClearTimers { generation },
                SubmitEffect::Emit(SubmissionEvent::Progress(notice)),
                SubmitEffect::ScheduleRetry {
                    generation,
                    after: config.retry_delay,
                },
            ]
        }
    }
}

fn finish_fatal(
    state: &mut SubmissionState,
    generation: Generation,
    kind: FatalKind,
    message: String,
) -> Vec<SubmitEffect> {
    finish(
        state,
        generation,
        SubmissionPhase::Failed(kind),
        SubmissionEvent::Fatal { kind, message },
    )
}

/// Timers are released before the single terminal event goes out.
fn finish(
    state: &mut SubmissionState,
    generation: Generation,
    phase: SubmissionPhase,
    event: SubmissionEvent,
) -> Vec<SubmitEffect> {
    state.lifecycle = Lifecycle::Finished(phase);
    vec![
        SubmitEffect::ClearTimers { generation },
        SubmitEffect::Emit(event),
    ]
}

fn describe(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} minutes", secs / 60)
    } else if secs >= 1 {
        format!("{secs} seconds")
    } else {
        format!("{} ms", duration.as_millis())
    }
}

/// Pure update function for the status poller.
pub fn update_poll(mut state: PollerState, msg: PollMsg) -> (PollerState, Vec<PollEffect>) {
    let effects = match msg {
        PollMsg::Start { job_id } => {
            let mut effects = stop_active(&mut state);
            let generation = state.next_generation();
            report_info!("generation {generation}: polling job {job_id}");
            state.active = Some(PollState {
                job_id,
                generation,
                polls: 0,
                in_flight: false,
            });
            state.phase = PollPhase::Polling;
            effects.push(PollEffect::StartInterval {
                generation,
                every: state.config().interval,
            });
            effects
        }
        PollMsg::Stop => {
            let effects = stop_active(&mut state);
            if !effects.is_empty() {
                state.phase = PollPhase::Idle;
            }
            effects
        }
        PollMsg::Tick { generation } => match state.active.as_mut() {
            Some(active) if active.generation == generation => {
                if active.in_flight {
                    report_debug!("generation {generation}: previous status query still running");
                    Vec::new()
                } else {
                    active.in_flight = true;
                    active.polls += 1;
                    vec![PollEffect::QueryStatus {
                        generation,
                        job_id: active.job_id.clone(),
                    }]
                }
            }
            _ => stale("poll tick", generation),
        },
        PollMsg::StatusArrived {
            generation,
            response,
        } => {
            let owns = state
                .active
                .as_ref()
                .is_some_and(|active| active.generation == generation);
            if !owns {
                return (state, stale("status response", generation));
            }
            if let Some(active) = state.active.as_mut() {
                active.in_flight = false;
            }
            match classify_status(&response) {
                PollOutcome::Processing { percent } => {
                    report_debug!("generation {generation}: job at {percent}%");
                    vec![PollEffect::Emit(PollEvent::Progress(percent))]
                }
                PollOutcome::Completed { redirect_url } => {
                    report_info!("generation {generation}: job completed");
                    finish_poll(
                        &mut state,
                        generation,
                        PollPhase::Completed,
                        PollEvent::Success { redirect_url },
                    )
                }
                PollOutcome::Failed { message } => {
                    report_warn!("generation {generation}: job failed: {message}");
                    finish_poll(
                        &mut state,
                        generation,
                        PollPhase::Failed,
                        PollEvent::Fatal { message },
                    )
                }
            }
        }
    };

    (state, effects)
}

fn stop_active(state: &mut PollerState) -> Vec<PollEffect> {
    match state.active.take() {
        Some(active) => {
            report_info!("generation {}: polling stopped", active.generation);
            vec![PollEffect::StopInterval {
                generation: active.generation,
            }]
        }
        None => Vec::new(),
    }
}

fn finish_poll(
    state: &mut PollerState,
    generation: Generation,
    phase: PollPhase,
    event: PollEvent,
) -> Vec<PollEffect> {
    state.active = None;
    state.phase = phase;
    vec![
        PollEffect::StopInterval { generation },
        PollEffect::Emit(event),
    ]
}
