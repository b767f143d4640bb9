use std::time::Duration;

use futures_util::StreamExt;
use report_core::TransportResponse;
use report_logging::{report_debug, report_trace};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use url::Url;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const SESSION_COOKIE: &str = "access_token";

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to `POST /generate`.
    pub request_timeout: Duration,
    /// Applies to each `GET /job-status/{id}`.
    pub status_timeout: Duration,
    /// Response bodies are truncated past this size.
    pub max_body_bytes: u64,
    pub session_token: Option<String>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_millis(900_000),
            status_timeout: Duration::from_secs(30),
            max_body_bytes: 64 * 1024,
            session_token: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid base url {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Remote side of the report backend.
///
/// Implementations never fail: every problem is reported as a
/// [`TransportResponse`] so the core can classify it.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn generate(&self, form: &[(String, String)]) -> TransportResponse;

    async fn job_status(&self, job_id: &str) -> TransportResponse;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base: Url,
    settings: TransportSettings,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, TransportError> {
        let base = parse_base(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base,
            settings,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve a path such as `/report/x.html` against the backend.
    pub fn absolute_url(&self, path: &str) -> String {
        match self.base.join(path.trim_start_matches('/')) {
            Ok(url) => url.to_string(),
            Err(_) => path.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> Url {
        // `parse_base` guarantees a trailing slash, so joining never drops a segment.
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }

    fn with_session(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.settings.session_token.as_deref() {
            Some(token) => request.header(COOKIE, format!("{SESSION_COOKIE}={token}")),
            None => request,
        }
    }

    async fn read_response(&self, response: reqwest::Response) -> TransportResponse {
        let status = response.status().as_u16();
        let limit = self.settings.max_body_bytes;
        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => return map_reqwest_error(err),
            };
            let room = limit.saturating_sub(bytes.len() as u64) as usize;
            if chunk.len() > room {
                bytes.extend_from_slice(&chunk[..room]);
                report_debug!("response body truncated at {limit} bytes");
                break;
            }
            bytes.extend_from_slice(&chunk);
        }
        TransportResponse::Http {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn generate(&self, form: &[(String, String)]) -> TransportResponse {
        let url = self.endpoint("generate");
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        report_trace!("POST {url} ({} bytes)", body.len());

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);
        match self.with_session(request).send().await {
            Ok(response) => self.read_response(response).await,
            Err(err) => map_reqwest_error(err),
        }
    }

    async fn job_status(&self, job_id: &str) -> TransportResponse {
        let mut url = self.endpoint("job-status/");
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(job_id);
        }
        report_trace!("GET {url}");

        let request = self.client.get(url).timeout(self.settings.status_timeout);
        match self.with_session(request).send().await {
            Ok(response) => self.read_response(response).await,
            Err(err) => map_reqwest_error(err),
        }
    }
}

fn parse_base(raw: &str) -> Result<Url, TransportError> {
    let invalid = |message: String| TransportError::InvalidBaseUrl {
        url: raw.to_string(),
        message,
    };
    let mut base = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) url".to_string()));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

fn map_reqwest_error(err: reqwest::Error) -> TransportResponse {
    report_debug!("transport error: {err}");
    if err.is_timeout() {
        TransportResponse::TimedOut
    } else {
        TransportResponse::Unreachable
    }
}
