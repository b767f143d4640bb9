use std::sync::Arc;

use report_core::{update_poll, PollConfig, PollEffect, PollEvent, PollMsg, PollerState};
use report_logging::{report_debug, report_info, report_warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::sink::PollSink;
use crate::timers::{spawn_every, TimerSet};
use crate::Transport;

/// Reconciliation loop querying `GET /job-status/{id}` until a terminal state.
///
/// Must be created inside a tokio runtime.
pub struct JobStatusPoller {
    msg_tx: mpsc::UnboundedSender<PollMsg>,
    shutdown: CancellationToken,
}

impl JobStatusPoller {
    pub fn spawn(
        transport: Arc<dyn Transport>,
        sink: Arc<dyn PollSink>,
        config: PollConfig,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let driver = PollDriver {
            state: PollerState::new(config),
            transport,
            sink,
            msg_tx: msg_tx.clone(),
            timers: TimerSet::default(),
        };
        tokio::spawn(driver.run(msg_rx, shutdown.clone()));
        Self { msg_tx, shutdown }
    }

    pub fn start(&self, job_id: impl Into<String>) {
        let _ = self.msg_tx.send(PollMsg::Start {
            job_id: job_id.into(),
        });
    }

    /// Safe to call at any time, any number of times.
    pub fn stop(&self) {
        let _ = self.msg_tx.send(PollMsg::Stop);
    }
}

impl Drop for JobStatusPoller {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct PollDriver {
    state: PollerState,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn PollSink>,
    msg_tx: mpsc::UnboundedSender<PollMsg>,
    timers: TimerSet,
}

impl PollDriver {
    async fn run(
        mut self,
        mut msg_rx: mpsc::UnboundedReceiver<PollMsg>,
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
        report_debug!("poll driver stopped");
    }

    fn dispatch(&mut self, msg: PollMsg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update_poll(state, msg);
        self.state = state;
        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: PollEffect) {
        match effect {
            PollEffect::StartInterval { generation, every } => {
                let ticker = spawn_every(every, self.msg_tx.clone(), move || PollMsg::Tick {
                    generation,
                });
                self.timers.adopt(generation, ticker);
            }
            PollEffect::StopInterval { generation } => self.timers.clear(generation),
            PollEffect::QueryStatus { generation, job_id } => {
                let transport = self.transport.clone();
                let msg_tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let response = transport.job_status(&job_id).await;
                    let _ = msg_tx.send(PollMsg::StatusArrived {
                        generation,
                        response,
                    });
                });
            }
            PollEffect::Emit(event) => {
                match &event {
                    PollEvent::Progress(percent) => report_debug!("job progress {percent}%"),
                    PollEvent::Success { redirect_url } => {
                        report_info!("job completed: {redirect_url}");
                    }
                    PollEvent::Fatal { message } => report_warn!("job failed: {message}"),
                }
                self.sink.emit(event);
            }
        }
    }
}
