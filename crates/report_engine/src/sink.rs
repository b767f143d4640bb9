use report_core::{PollEvent, SubmissionEvent};
use tokio::sync::mpsc;

/// View-layer receiver for submission lifecycle events.
pub trait SubmissionSink: Send + Sync {
    fn emit(&self, event: SubmissionEvent);
}

/// View-layer receiver for status-poll events.
pub trait PollSink: Send + Sync {
    fn emit(&self, event: PollEvent);
}

/// Forwards events into an unbounded channel.
pub struct ChannelSink<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> ChannelSink<E> {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<E>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SubmissionSink for ChannelSink<SubmissionEvent> {
    fn emit(&self, event: SubmissionEvent) {
        let _ = self.tx.send(event);
    }
}

impl PollSink for ChannelSink<PollEvent> {
    fn emit(&self, event: PollEvent) {
        let _ = self.tx.send(event);
    }
}
