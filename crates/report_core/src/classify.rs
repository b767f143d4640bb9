use std::fmt;

use serde::Deserialize;

/// Message surfaced for every poll that fails at the transport level.
pub const STATUS_CHECK_FAILED: &str = "status check failed";

const GENERIC_SERVER_MESSAGE: &str = "An error occurred while generating the report.";
const AUTH_REQUIRED_MESSAGE: &str = "Authentication required. Please log in to generate reports.";

/// What the transport observed for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportResponse {
    /// A response was received; `status` 0 means the network was unreachable.
    Http { status: u16, body: String },
    TimedOut,
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverableReason {
    Timeout,
    Unreachable,
    InternalServerError,
}

impl RecoverableReason {
    /// Fatal kind reported once the retry budget is exhausted.
    pub fn escalated(self) -> FatalKind {
        match self {
            RecoverableReason::Timeout => FatalKind::Timeout,
            RecoverableReason::Unreachable => FatalKind::Network,
            RecoverableReason::InternalServerError => FatalKind::Server,
        }
    }
}

impl fmt::Display for RecoverableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoverableReason::Timeout => write!(f, "request timed out"),
            RecoverableReason::Unreachable => write!(f, "server unreachable"),
            RecoverableReason::InternalServerError => write!(f, "http status 500"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    /// Local watchdog expired before any terminal response.
    TimeoutLocal,
    Auth,
    Application,
    Server,
    /// Transport timeouts persisted past the retry budget.
    Timeout,
    /// Server stayed unreachable past the retry budget.
    Network,
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalKind::TimeoutLocal => write!(f, "timeout-local"),
            FatalKind::Auth => write!(f, "auth"),
            FatalKind::Application => write!(f, "application"),
            FatalKind::Server => write!(f, "server"),
            FatalKind::Timeout => write!(f, "timeout"),
            FatalKind::Network => write!(f, "network"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success { redirect_url: String },
    /// Backend queued the work and returned an id to poll.
    Accepted { job_id: String },
    Recoverable { reason: RecoverableReason },
    Fatal { kind: FatalKind, message: String },
}

impl JobOutcome {
    fn fatal(kind: FatalKind, message: impl Into<String>) -> Self {
        JobOutcome::Fatal {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    status: Option<String>,
    redirect_url: Option<String>,
    job_id: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    detail: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.detail)
            .or(self.error)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
}

/// Classify the response of `POST /generate`.
pub fn classify_generate(response: &TransportResponse) -> JobOutcome {
    let (status, body) = match response {
        TransportResponse::TimedOut => {
            return JobOutcome::Recoverable {
                reason: RecoverableReason::Timeout,
            }
        }
        TransportResponse::Unreachable => {
            return JobOutcome::Recoverable {
                reason: RecoverableReason::Unreachable,
            }
        }
        TransportResponse::Http { status, body } => (*status, body.as_str()),
    };

    match status {
        0 => JobOutcome::Recoverable {
            reason: RecoverableReason::Unreachable,
        },
        200..=299 => classify_generate_body(body),
        401 => JobOutcome::fatal(
            FatalKind::Auth,
            error_message(body).unwrap_or_else(|| AUTH_REQUIRED_MESSAGE.to_string()),
        ),
        500 => JobOutcome::Recoverable {
            reason: RecoverableReason::InternalServerError,
        },
        other => JobOutcome::fatal(
            FatalKind::Server,
            error_message(body)
                .unwrap_or_else(|| format!("{GENERIC_SERVER_MESSAGE} (http status {other})")),
        ),
    }
}

fn classify_generate_body(body: &str) -> JobOutcome {
    let parsed: GenerateBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) => {
            return JobOutcome::fatal(FatalKind::Application, "unexpected response from server")
        }
    };

    match parsed.status.as_deref() {
        Some("success") => {
            if let Some(redirect_url) = parsed.redirect_url.filter(|u| !u.is_empty()) {
                JobOutcome::Success { redirect_url }
            } else if let Some(job_id) = parsed.job_id.filter(|id| !id.is_empty()) {
                JobOutcome::Accepted { job_id }
            } else {
                JobOutcome::fatal(
                    FatalKind::Application,
                    "server reported success without a report link",
                )
            }
        }
        other => {
            let message = parsed
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| match other {
                    Some(status) => format!("report generation failed with status {status}"),
                    None => "report generation failed".to_string(),
                });
            JobOutcome::fatal(FatalKind::Application, message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed { redirect_url: String },
    Processing { percent: u8 },
    Failed { message: String },
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
    redirect_url: Option<String>,
    error: Option<String>,
    progress: Option<f64>,
    message: Option<String>,
}

/// Classify the response of `GET /job-status/{id}`.
///
/// Anything short of a decodable 2xx body counts as a failed status check.
pub fn classify_status(response: &TransportResponse) -> PollOutcome {
    let body = match response {
        TransportResponse::Http { status, body } if (200..300).contains(status) => body,
        _ => return failed_check(),
    };
    let parsed: StatusBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) => return failed_check(),
    };

    match parsed.status.as_str() {
        "completed" => match parsed.redirect_url.filter(|u| !u.is_empty()) {
            Some(redirect_url) => PollOutcome::Completed { redirect_url },
            None => PollOutcome::Failed {
                message: "job completed without a report link".to_string(),
            },
        },
        "error" => PollOutcome::Failed {
            message: parsed
                .error
                .or(parsed.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "report generation failed".to_string()),
        },
        "processing" => PollOutcome::Processing {
            percent: clamp_percent(parsed.progress),
        },
        other => PollOutcome::Failed {
            message: parsed
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("unknown job status {other}")),
        },
    }
}

fn failed_check() -> PollOutcome {
    PollOutcome::Failed {
        message: STATUS_CHECK_FAILED.to_string(),
    }
}

fn clamp_percent(progress: Option<f64>) -> u8 {
    match progress {
        Some(p) if p.is_finite() => p.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}
