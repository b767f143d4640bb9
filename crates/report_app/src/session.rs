//! Terminal front-end: drives the controller and poller and prints events.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use report_core::{FatalKind, JobRequest, PollEvent, SubmissionEvent};
use report_engine::{ChannelSink, JobStatusPoller, JobSubmissionController, ReqwestTransport};
use report_logging::{report_info, report_warn};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::ClientConfig;

const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { report_url: String },
    AuthRequired { message: String, login_url: String },
    Failed { kind: Option<FatalKind>, message: String },
    Interrupted,
}

impl Outcome {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Outcome::Completed { .. } => ExitCode::SUCCESS,
            Outcome::AuthRequired { .. } => ExitCode::from(2),
            Outcome::Failed { .. } => ExitCode::FAILURE,
            Outcome::Interrupted => ExitCode::from(130),
        }
    }

    pub fn report(&self) {
        match self {
            Outcome::Completed { report_url } => println!("Report ready: {report_url}"),
            Outcome::AuthRequired { message, login_url } => {
                eprintln!("{message}");
                eprintln!("Log in at {login_url}");
            }
            Outcome::Failed {
                kind: Some(kind),
                message,
            } => eprintln!("Report generation failed [{kind}]: {message}"),
            Outcome::Failed { kind: None, message } => {
                eprintln!("Report generation failed: {message}");
            }
            Outcome::Interrupted => eprintln!("Interrupted."),
        }
    }
}

/// Submits `request` and follows it, including a queued-job handoff.
pub async fn generate(config: &ClientConfig, request: JobRequest) -> anyhow::Result<Outcome> {
    let mut session = Session::open(config)?;
    session.controller.submit(request);
    session.follow().await
}

/// Follows an already queued job by id.
pub async fn follow_job(config: &ClientConfig, job_id: &str) -> anyhow::Result<Outcome> {
    let mut session = Session::open(config)?;
    session.poller.start(job_id);
    session.follow().await
}

struct Session {
    transport: Arc<ReqwestTransport>,
    controller: JobSubmissionController,
    poller: JobStatusPoller,
    submissions: UnboundedReceiver<SubmissionEvent>,
    polls: UnboundedReceiver<PollEvent>,
}

impl Session {
    fn open(config: &ClientConfig) -> anyhow::Result<Self> {
        let transport = Arc::new(
            ReqwestTransport::new(config.transport_settings())
                .context("failed to set up http transport")?,
        );
        if config.session_token.is_none() {
            report_warn!("no session token configured; the backend will likely reject requests");
        }

        let (submission_sink, submissions) = ChannelSink::<SubmissionEvent>::new();
        let (poll_sink, polls) = ChannelSink::<PollEvent>::new();
        let controller = JobSubmissionController::spawn(
            transport.clone(),
            Arc::new(submission_sink),
            config.submission_config(),
        );
        let poller =
            JobStatusPoller::spawn(transport.clone(), Arc::new(poll_sink), config.poll_config());

        report_info!("using backend {}", transport.base_url());
        Ok(Self {
            transport,
            controller,
            poller,
            submissions,
            polls,
        })
    }

    async fn follow(&mut self) -> anyhow::Result<Outcome> {
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                event = self.submissions.recv() => {
                    let Some(event) = event else {
                        bail!("submission controller stopped unexpectedly");
                    };
                    if let Some(outcome) = self.on_submission(event) {
                        return Ok(outcome);
                    }
                }
                event = self.polls.recv() => {
                    let Some(event) = event else {
                        bail!("status poller stopped unexpectedly");
                    };
                    if let Some(outcome) = self.on_poll(event) {
                        return Ok(outcome);
                    }
                }
                _ = &mut interrupt => {
                    self.controller.cancel();
                    self.poller.stop();
                    return Ok(Outcome::Interrupted);
                }
            }
        }
    }

    fn on_submission(&self, event: SubmissionEvent) -> Option<Outcome> {
        match event {
            SubmissionEvent::Progress(message) => {
                print_line(&message);
                None
            }
            SubmissionEvent::Success { redirect_url } => Some(Outcome::Completed {
                report_url: self.transport.absolute_url(&redirect_url),
            }),
            SubmissionEvent::JobAccepted { job_id } => {
                print_line(&format!("Report queued as job {job_id}; waiting for it to finish..."));
                self.poller.start(job_id);
                None
            }
            SubmissionEvent::Fatal {
                kind: FatalKind::Auth,
                message,
            } => Some(Outcome::AuthRequired {
                message,
                login_url: self.transport.absolute_url(LOGIN_PATH),
            }),
            SubmissionEvent::Fatal { kind, message } => Some(Outcome::Failed {
                kind: Some(kind),
                message,
            }),
        }
    }

    fn on_poll(&self, event: PollEvent) -> Option<Outcome> {
        match event {
            PollEvent::Progress(percent) => {
                print_line(&format!("Report progress: {percent}%"));
                None
            }
            PollEvent::Success { redirect_url } => Some(Outcome::Completed {
                report_url: self.transport.absolute_url(&redirect_url),
            }),
            PollEvent::Fatal { message } => Some(Outcome::Failed {
                kind: None,
                message,
            }),
        }
    }
}

fn print_line(message: &str) {
    let stamp = chrono::Local::now().format("%H:%M:%S");
    println!("[{stamp}] {message}");
}
