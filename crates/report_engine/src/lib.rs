//! Report engine: HTTP transport and the runtime drivers executing core effects.
mod controller;
mod poller;
mod sink;
mod timers;
mod transport;

pub use controller::JobSubmissionController;
pub use poller::JobStatusPoller;
pub use sink::{ChannelSink, PollSink, SubmissionSink};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportSettings};
