use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use tooso_sdk::transport::{
    FailureKind, HttpRequest, HttpResponse, HttpTransport, RequestBody, TransportFailure,
};
use tooso_sdk::{ApiClient, ClientBuilder, ErrorReport, InMemorySessionStore, ReportSender};

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }
}

struct TestWriter(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    prev: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    pub fn set(key: &str, val: impl AsRef<str>) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::set_var(key, val.as_ref()) };
        Self {
            key: key.to_string(),
            prev,
        }
    }

    pub fn unset(key: &str) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::remove_var(key) };
        Self {
            key: key.to_string(),
            prev,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => unsafe { std::env::set_var(&self.key, v) },
            None => unsafe { std::env::remove_var(&self.key) },
        }
    }
}

/// What a scripted transport hands back for one call.
#[allow(dead_code)]
pub enum Scripted {
    Respond(u16, String),
    Fail(FailureKind, &'static str),
}

/// Zip entries read from a multipart file part while the request was live.
pub type CapturedArchive = Vec<(String, String)>;

/// Transport that replays a queue of canned outcomes and records every
/// request. Multipart archives are opened during the call so tests can check
/// their contents after the temp file is gone.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    pub requests: Mutex<Vec<HttpRequest>>,
    pub archives: Mutex<Vec<CapturedArchive>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn respond(status: u16, body: impl Into<String>) -> Arc<Self> {
        Self::new([Scripted::Respond(status, body.into())])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl HttpTransport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        self.requests.lock().push(request.clone());
        if let RequestBody::Multipart { file, .. } = &request.body {
            self.archives.lock().push(read_zip(&file.path));
        }
        match self.script.lock().pop_front() {
            Some(Scripted::Respond(status, body)) => Ok(HttpResponse { status, body }),
            Some(Scripted::Fail(kind, message)) => Err(TransportFailure::new(kind, message)),
            None => panic!("unexpected request to {}", request.url),
        }
    }
}

#[allow(dead_code)]
pub fn read_zip(path: &Path) -> CapturedArchive {
    use std::io::Read;

    let file = std::fs::File::open(path).expect("archive exists while the request is live");
    let mut zip = zip::ZipArchive::new(file).expect("valid zip");
    let mut entries = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).expect("zip entry");
        let mut content = String::new();
        entry.read_to_string(&mut content).expect("utf-8 entry");
        entries.push((entry.name().to_string(), content));
    }
    entries.sort();
    entries
}

/// Report sender that keeps everything it is handed.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingReports {
    pub reports: Mutex<Vec<ErrorReport>>,
}

#[allow(dead_code)]
impl RecordingReports {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<ErrorReport> {
        self.reports.lock().clone()
    }
}

impl ReportSender for RecordingReports {
    fn send_report(&self, report: &ErrorReport) {
        self.reports.lock().push(report.clone());
    }
}

/// Client wired to the given fakes, with a fixed key, version and language.
#[allow(dead_code)]
pub struct Harness {
    pub client: ApiClient,
    pub transport: Arc<ScriptedTransport>,
    pub reports: Arc<RecordingReports>,
    pub session: Arc<InMemorySessionStore>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(transport: Arc<ScriptedTransport>) -> Self {
        Self::with_builder(ClientBuilder::new(), transport)
    }

    pub fn with_builder(builder: ClientBuilder, transport: Arc<ScriptedTransport>) -> Self {
        let reports = RecordingReports::new();
        let session = Arc::new(InMemorySessionStore::new());
        let client = builder
            .with_api_key("TEST-KEY")
            .with_api_base_url("https://api.test.local/")
            .with_language("it-IT")
            .with_agent("harness")
            .with_transport(transport.clone())
            .with_report_sender(reports.clone())
            .with_session_store(session.clone())
            .build();
        Self {
            client,
            transport,
            reports,
            session,
        }
    }
}
