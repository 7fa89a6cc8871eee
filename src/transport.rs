//! HTTP transport seam.
//!
//! The client describes each call as an [`HttpRequest`] and hands it to an
//! [`HttpTransport`]. Production code uses [`ReqwestTransport`]; tests plug in
//! scripted transports.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use tracing::debug;

pub const AGENT_HEADER: &str = "X-Tooso-Agent";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File attached to a multipart body. Read from disk when the request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// Text fields in order, then the file part last.
    Multipart {
        fields: Vec<(String, String)>,
        file: FilePart,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub connect_timeout: Duration,
    /// Total time budget; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub verify_tls: bool,
}

/// A response with a status code. The body may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request could not be assembled or sent.
    Request,
    /// DNS or TCP/TLS connection failure.
    Connect,
    Timeout,
    /// Headers arrived but the body could not be read.
    Body,
    /// A local file needed for the body could not be opened.
    Io,
}

/// No response was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Stable numeric code for reports.
    pub fn code(&self) -> i32 {
        match self.kind {
            FailureKind::Request => 1,
            FailureKind::Connect => 2,
            FailureKind::Timeout => 3,
            FailureKind::Body => 4,
            FailureKind::Io => 5,
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code())
    }
}

impl std::error::Error for TransportFailure {}

/// Executes one HTTP exchange. Implementations must not retry.
pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

/// Blocking `reqwest` transport. Builds a client per call because timeouts
/// and TLS verification are per-request settings.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        Self
    }

    fn client(request: &HttpRequest) -> Result<reqwest::blocking::Client, TransportFailure> {
        reqwest::blocking::Client::builder()
            .connect_timeout(request.connect_timeout)
            .timeout(request.timeout)
            .danger_accept_invalid_certs(!request.verify_tls)
            .user_agent(concat!("tooso-sdk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                TransportFailure::new(FailureKind::Request, format!("building http client: {e}"))
            })
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let client = Self::client(request)?;
        let mut builder = match request.method {
            HttpMethod::Get => client.get(&request.url),
            HttpMethod::Post => client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let RequestBody::Multipart { fields, file } = &request.body {
            let mut form = Form::new();
            for (name, value) in fields {
                form = form.text(name.clone(), value.clone());
            }
            let part = Part::file(&file.path)
                .map_err(|e| {
                    TransportFailure::new(
                        FailureKind::Io,
                        format!("opening {}: {e}", file.path.display()),
                    )
                })?
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)
                .map_err(|e| TransportFailure::new(FailureKind::Request, e.to_string()))?;
            builder = builder.multipart(form.part(file.field_name.clone(), part));
        }

        let response = builder.send().map_err(map_send_error)?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportFailure::new(FailureKind::Body, e.to_string()))?;
        debug!(status, bytes = body.len(), "http exchange complete");
        Ok(HttpResponse { status, body })
    }
}

fn map_send_error(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::new(FailureKind::Timeout, format!("request timed out: {e}"))
    } else if e.is_connect() {
        TransportFailure::new(FailureKind::Connect, format!("connection failed: {e}"))
    } else {
        TransportFailure::new(FailureKind::Request, e.to_string())
    }
}
