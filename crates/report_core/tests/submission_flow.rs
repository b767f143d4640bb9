use std::time::Duration;

use pretty_assertions::assert_eq;
use report_core::{
    stage_index, update_submission, FatalKind, JobRequest, SubmissionConfig, SubmissionEvent,
    SubmissionPhase, SubmissionState, SubmitEffect, SubmitMsg, TransportResponse,
    PROGRESS_CEILING, STAGE_MESSAGES,
};

fn init_logging() {
    report_logging::initialize_for_tests();
}

fn request() -> JobRequest {
    JobRequest::new("gpt-5")
        .with_field("brand", "Acme")
        .with_field("product", vec!["Widgets".to_string(), "Gadgets".to_string()])
        .with_field("enterprise_size", "small")
}

fn submit(state: SubmissionState) -> (SubmissionState, Vec<SubmitEffect>) {
    update_submission(
        state,
        SubmitMsg::Submit { request: request() },
    )
}

fn respond(
    state: SubmissionState,
    generation: u64,
    response: TransportResponse,
) -> (SubmissionState, Vec<SubmitEffect>) {
    update_submission(
        state,
        SubmitMsg::ResponseArrived {
            generation,
            response,
        },
    )
}

fn http(status: u16, body: &str) -> TransportResponse {
    TransportResponse::Http {
        status,
        body: body.to_string(),
    }
}

fn events(effects: &[SubmitEffect]) -> Vec<SubmissionEvent> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            SubmitEffect::Emit(event) => Some(event.clone()),
            _ => None,
        })
        .collect()
}

fn sent_generation(effects: &[SubmitEffect]) -> u64 {
    effects
        .iter()
        .find_map(|effect| match effect {
            SubmitEffect::SendRequest { generation, .. } => Some(*generation),
            _ => None,
        })
        .expect("send request effect")
}

fn retry_generation(effects: &[SubmitEffect]) -> u64 {
    effects
        .iter()
        .find_map(|effect| match effect {
            SubmitEffect::ScheduleRetry { generation, .. } => Some(*generation),
            _ => None,
        })
        .expect("schedule retry effect")
}

#[test]
fn submit_arms_timers_before_sending() {
    init_logging();
    let (state, effects) = submit(SubmissionState::default());

    let config = SubmissionConfig::default();
    assert_eq!(
        effects,
        vec![
            SubmitEffect::ArmTimers {
                generation: 1,
                timeout: config.timeout,
                progress_every: config.progress_every,
            },
            SubmitEffect::SendRequest {
                generation: 1,
                form: request().form_pairs(),
            },
        ]
    );
    let view = state.view();
    assert_eq!(view.phase, SubmissionPhase::Submitting);
    assert_eq!(view.attempt_number, Some(0));
    assert_eq!(view.generation, Some(1));
}

#[test]
fn success_on_first_attempt_emits_single_success() {
    init_logging();
    let (state, effects) = submit(SubmissionState::default());
    let generation = sent_generation(&effects);

    let (state, effects) = respond(
        state,
        generation,
        http(200, r#"{"status":"success","redirect_url":"/report/42"}"#),
    );

    assert_eq!(
        effects,
        vec![
            SubmitEffect::ClearTimers { generation },
            SubmitEffect::Emit(SubmissionEvent::Success {
                redirect_url: "/report/42".to_string()
            }),
        ]
    );
    assert_eq!(state.view().phase, SubmissionPhase::Succeeded);
    assert_eq!(state.view().retries_used, 0);
    assert!(!state.is_active());
}

#[test]
fn two_server_errors_then_success() {
    init_logging();
    let mut progress_notices = 0;
    let (mut state, effects) = submit(SubmissionState::default());
    let mut generation = sent_generation(&effects);

    for _ in 0..2 {
        let (next, effects) = respond(state, generation, http(500, "boom"));
        assert_eq!(effects[0], SubmitEffect::ClearTimers { generation });
        progress_notices += events(&effects)
            .iter()
            .filter(|e| matches!(e, SubmissionEvent::Progress(_)))
            .count();
        assert_eq!(next.view().phase, SubmissionPhase::Retrying);
        assert!(!next.view().phase.is_terminal());

        let waiting = retry_generation(&effects);
        let (next, effects) = update_submission(
            next,
            SubmitMsg::RetryDelayElapsed { generation: waiting },
        );
        generation = sent_generation(&effects);
        state = next;
    }

    assert_eq!(progress_notices, 2);
    assert_eq!(state.view().attempt_number, Some(2));
    assert_eq!(state.view().retries_used, 2);

    let (state, effects) = respond(
        state,
        generation,
        http(200, r#"{"status":"success","redirect_url":"/r/1"}"#),
    );
    assert_eq!(
        events(&effects),
        vec![SubmissionEvent::Success {
            redirect_url: "/r/1".to_string()
        }]
    );
    assert_eq!(state.view().phase, SubmissionPhase::Succeeded);
}

#[test]
fn retries_are_capped_and_escalate_last_reason() {
    init_logging();
    let (mut state, effects) = submit(SubmissionState::default());
    let mut generation = sent_generation(&effects);

    for _ in 0..2 {
        let (next, effects) = respond(state, generation, TransportResponse::Unreachable);
        let (next, effects) = update_submission(
            next,
            SubmitMsg::RetryDelayElapsed { generation: retry_generation(&effects) },
        );
        generation = sent_generation(&effects);
        state = next;
    }

    let (state, effects) = respond(state, generation, TransportResponse::Unreachable);
    assert!(effects
        .iter()
        .all(|e| !matches!(e, SubmitEffect::ScheduleRetry { .. })));
    match events(&effects).as_slice() {
        [SubmissionEvent::Fatal { kind, message }] => {
            assert_eq!(*kind, FatalKind::Network);
            assert!(message.contains("3 attempts"), "{message}");
        }
        other => panic!("unexpected events {other:?}"),
    }
    assert_eq!(state.view().phase, SubmissionPhase::Failed(FatalKind::Network));
    assert!(state.view().phase.is_terminal());
    assert_eq!(state.view().retries_used, 2);
}

#[test]
fn auth_failure_is_never_retried() {
    init_logging();
    let (state, effects) = submit(SubmissionState::default());
    let generation = sent_generation(&effects);

    let (state, effects) = respond(state, generation, http(401, r#"{"status":"error"}"#));

    assert!(effects
        .iter()
        .all(|e| !matches!(e, SubmitEffect::ScheduleRetry { .. })));
    assert!(matches!(
        events(&effects).as_slice(),
        [SubmissionEvent::Fatal {
            kind: FatalKind::Auth,
            ..
        }]
    ));
    assert_eq!(state.view().retries_used, 0);
}

#[test]
fn local_timeout_wins_over_late_success() {
    init_logging();
    let (state, effects) = submit(SubmissionState::default());
    let generation = sent_generation(&effects);

    let (state, effects) = update_submission(state, SubmitMsg::TimeoutElapsed { generation });
    assert_eq!(effects[0], SubmitEffect::ClearTimers { generation });
    assert!(matches!(
        events(&effects).as_slice(),
        [SubmissionEvent::Fatal {
            kind: FatalKind::TimeoutLocal,
            ..
        }]
    ));

    let (state, effects) = respond(
        state,
        generation,
        http(200, r#"{"status":"success","redirect_url":"/late"}"#),
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.view().phase,
        SubmissionPhase::Failed(FatalKind::TimeoutLocal)
    );
}

#[test]
fn resubmit_clears_previous_attempt_and_ignores_its_response() {
    init_logging();
    let (state, effects) = submit(SubmissionState::default());
    let first = sent_generation(&effects);

    let (state, effects) = submit(state);
    assert_eq!(effects[0], SubmitEffect::ClearTimers { generation: first });
    let second = sent_generation(&effects);
    assert!(second > first);

    let (state, effects) = respond(
        state,
        first,
        http(200, r#"{"status":"success","redirect_url":"/old"}"#),
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().generation, Some(second));

    let (state, effects) = update_submission(state, SubmitMsg::ProgressTick { generation: first });
    assert!(effects.is_empty());
    assert_eq!(state.view().progress_counter, Some(0));
}

#[test]
fn resubmit_while_waiting_to_retry_drops_pending_retry() {
    init_logging();
    let (state, effects) = submit(SubmissionState::default());
    let (state, effects) = respond(state, sent_generation(&effects), TransportResponse::TimedOut);
    let waiting = retry_generation(&effects);

    let (state, effects) = submit(state);
    assert_eq!(effects[0], SubmitEffect::ClearTimers { generation: waiting });
    let live = sent_generation(&effects);

    let (state, effects) = update_submission(
        state,
        SubmitMsg::RetryDelayElapsed { generation: waiting },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().generation, Some(live));
    assert_eq!(state.view().attempt_number, Some(0));
}

#[test]
fn progress_simulation_stops_at_ceiling() {
    init_logging();
    let (mut state, effects) = submit(SubmissionState::default());
    let generation = sent_generation(&effects);

    let mut last_message = String::new();
    for _ in 0..100 {
        let (next, effects) = update_submission(state, SubmitMsg::ProgressTick { generation });
        state = next;
        let counter = state.view().progress_counter.expect("active attempt");
        assert!(counter <= PROGRESS_CEILING);
        match events(&effects).as_slice() {
            [SubmissionEvent::Progress(message)] => {
                assert_eq!(message, STAGE_MESSAGES[stage_index(counter)]);
                last_message = message.clone();
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    assert_eq!(state.view().progress_counter, Some(PROGRESS_CEILING));
    assert_eq!(last_message, STAGE_MESSAGES[5]);
}

#[test]
fn progress_ticks_after_terminal_are_ignored() {
    init_logging();
    let (state, effects) = submit(SubmissionState::default());
    let generation = sent_generation(&effects);
    let (state, _) = respond(state, generation, http(403, r#"{"detail":"Forbidden"}"#));

    let (state, effects) = update_submission(state, SubmitMsg::ProgressTick { generation });
    assert!(effects.is_empty());
    let (_state, effects) = update_submission(state, SubmitMsg::TimeoutElapsed { generation });
    assert!(effects.is_empty());
}

#[test]
fn cancel_clears_timers_without_terminal_event() {
    init_logging();
    let (state, effects) = submit(SubmissionState::default());
    let generation = sent_generation(&effects);

    let (state, effects) = update_submission(state, SubmitMsg::Cancel);
    assert_eq!(effects, vec![SubmitEffect::ClearTimers { generation }]);
    assert_eq!(state.view().phase, SubmissionPhase::Idle);
    assert!(!state.view().phase.is_terminal());

    let (_state, effects) = update_submission(state, SubmitMsg::Cancel);
    assert!(effects.is_empty());
}

#[test]
fn job_id_response_hands_off() {
    init_logging();
    let (state, effects) = submit(SubmissionState::default());
    let generation = sent_generation(&effects);

    let (state, effects) = respond(
        state,
        generation,
        http(202, r#"{"status":"success","job_id":"abc-123"}"#),
    );
    assert_eq!(
        events(&effects),
        vec![SubmissionEvent::JobAccepted {
            job_id: "abc-123".to_string()
        }]
    );
    assert_eq!(state.view().phase, SubmissionPhase::HandedOff);
    assert!(state.view().phase.is_terminal());
}

#[test]
fn custom_retry_budget_is_respected() {
    init_logging();
    let config = SubmissionConfig {
        max_retries: 0,
        retry_delay: Duration::from_millis(10),
        ..SubmissionConfig::default()
    };
    let (state, effects) = submit(SubmissionState::new(config));
    let (_state, effects) = respond(state, sent_generation(&effects), http(500, ""));

    assert!(matches!(
        events(&effects).as_slice(),
        [SubmissionEvent::Fatal {
            kind: FatalKind::Server,
            ..
        }]
    ));
}

#[test]
fn unbounded_retry_budget_does_not_overflow() {
    init_logging();
    let config = SubmissionConfig {
        max_retries: u32::MAX,
        ..SubmissionConfig::default()
    };
    assert_eq!(config.total_attempts(), u32::MAX);

    let (state, effects) = submit(SubmissionState::new(config));
    assert_eq!(state.view().attempt_number, Some(0));

    let (state, effects) = respond(state, sent_generation(&effects), http(500, ""));
    assert_eq!(state.view().phase, SubmissionPhase::Retrying);
    let expected = format!("(attempt 2/{})...", u32::MAX);
    assert!(events(&effects).iter().any(|event| matches!(
        event,
        SubmissionEvent::Progress(notice) if notice.ends_with(&expected)
    )));
}
