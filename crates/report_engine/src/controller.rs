use std::sync::Arc;

use report_core::{
    update_submission, JobRequest, SubmissionConfig, SubmissionEvent, SubmissionState,
    SubmitEffect, SubmitMsg,
};
use report_logging::{report_debug, report_info, report_warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::sink::SubmissionSink;
use crate::timers::{spawn_every, spawn_once, TimerSet};
use crate::Transport;

/// Owns the lifecycle of one outstanding report-generation request.
///
/// All state lives in a single driver task; timers and the transport only
/// post messages back to it. Must be created inside a tokio runtime.
pub struct JobSubmissionController {
    msg_tx: mpsc::UnboundedSender<SubmitMsg>,
    shutdown: CancellationToken,
}

impl JobSubmissionController {
    pub fn spawn(
        transport: Arc<dyn Transport>,
        sink: Arc<dyn SubmissionSink>,
        config: SubmissionConfig,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let driver = SubmissionDriver {
            state: SubmissionState::new(config),
            transport,
            sink,
            msg_tx: msg_tx.clone(),
            timers: TimerSet::default(),
        };
        tokio::spawn(driver.run(msg_rx, shutdown.clone()));
        Self { msg_tx, shutdown }
    }

    /// Start attempt 0 for `request`, superseding any active attempt.
    pub fn submit(&self, request: JobRequest) {
        let _ = self.msg_tx.send(SubmitMsg::Submit { request });
    }

    /// Abandon the active attempt without a terminal event.
    pub fn cancel(&self) {
        let _ = self.msg_tx.send(SubmitMsg::Cancel);
    }
}

impl Drop for JobSubmissionController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct SubmissionDriver {
    state: SubmissionState,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn SubmissionSink>,
    msg_tx: mpsc::UnboundedSender<SubmitMsg>,
    timers: TimerSet,
}

impl SubmissionDriver {
    async fn run(
        mut self,
        mut msg_rx: mpsc::UnboundedReceiver<SubmitMsg>,
        shutdown: CancellationToken,
    ) {
        loop {
            let msg = tokio::select! {
                _ = shutdown.cancelled() => break,
                msg = msg_rx.recv() => msg,
            };
            match msg {
                Some(msg) => self.dispatch(msg),
                None => break,
            }
        }
        self.timers.clear_all();
        report_debug!("submission driver stopped");
    }

    fn dispatch(&mut self, msg: SubmitMsg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update_submission(state, msg);
        self.state = state;
        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: SubmitEffect) {
        match effect {
            SubmitEffect::ArmTimers {
                generation,
                timeout,
                progress_every,
            } => {
                let watchdog = spawn_once(timeout, self.msg_tx.clone(), move || {
                    SubmitMsg::TimeoutElapsed { generation }
                });
                self.timers.adopt(generation, watchdog);
                let ticker = spawn_every(progress_every, self.msg_tx.clone(), move || {
                    SubmitMsg::ProgressTick { generation }
                });
                self.timers.adopt(generation, ticker);
            }
            SubmitEffect::SendRequest { generation, form } => {
                let transport = self.transport.clone();
                let msg_tx = self.msg_tx.clone();
                // Not tracked: an in-flight request is never cancelled, only outdated.
                tokio::spawn(async move {
                    let response = transport.generate(&form).await;
                    let _ = msg_tx.send(SubmitMsg::ResponseArrived {
                        generation,
                        response,
                    });
                });
            }
            SubmitEffect::ClearTimers { generation } => {
                self.timers.clear(generation);
            }
            SubmitEffect::ScheduleRetry { generation, after } => {
                let wait = spawn_once(after, self.msg_tx.clone(), move || {
                    SubmitMsg::RetryDelayElapsed { generation }
                });
                self.timers.adopt(generation, wait);
            }
            SubmitEffect::Emit(event) => self.emit(event),
        }
    }

    fn emit(&self, event: SubmissionEvent) {
        match &event {
            SubmissionEvent::Progress(message) => report_debug!("progress: {message}"),
            SubmissionEvent::Success { redirect_url } => {
                report_info!("submission succeeded: {redirect_url}");
            }
            SubmissionEvent::JobAccepted { job_id } => {
                report_info!("submission handed off as job {job_id}");
            }
            SubmissionEvent::Fatal { kind, message } => {
                report_warn!("submission failed ({kind}): {message}");
            }
        }
        self.sink.emit(event);
    }
}
