use std::time::Duration;

use report_core::Generation;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Timer tasks belonging to the live generation.
///
/// Adopting a handle for a newer generation aborts everything older, and
/// dropping the set aborts whatever is left.
#[derive(Debug, Default)]
pub(crate) struct TimerSet {
    generation: Option<Generation>,
    handles: Vec<JoinHandle<()>>,
}

impl TimerSet {
    pub(crate) fn adopt(&mut self, generation: Generation, handle: JoinHandle<()>) {
        if self.generation != Some(generation) {
            self.clear_all();
            self.generation = Some(generation);
        }
        self.handles.push(handle);
    }

    /// No-op unless `generation` owns the set.
    pub(crate) fn clear(&mut self, generation: Generation) {
        if self.generation == Some(generation) {
            self.clear_all();
        }
    }

    pub(crate) fn clear_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        self.generation = None;
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.clear_all();
    }
}

/// Post `msg()` once after `after`.
pub(crate) fn spawn_once<M, F>(
    after: Duration,
    tx: mpsc::UnboundedSender<M>,
    msg: F,
) -> JoinHandle<()>
where
    M: Send + 'static,
    F: FnOnce() -> M + Send + 'static,
{
    tokio::spawn(async move {
        time::sleep(after).await;
        let _ = tx.send(msg());
    })
}

/// Post `msg()` every `every`, first one period from now.
pub(crate) fn spawn_every<M, F>(
    every: Duration,
    tx: mpsc::UnboundedSender<M>,
    msg: F,
) -> JoinHandle<()>
where
    M: Send + 'static,
    F: Fn() -> M + Send + 'static,
{
    // `interval_at` panics on a zero period.
    let every = every.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if tx.send(msg()).is_err() {
                break;
            }
        }
    })
}
