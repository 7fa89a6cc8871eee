//! Client configuration and the builder that freezes it into an [`ApiClient`].
//!
//! The builder is consumed by [`ClientBuilder::build`], so one builder yields
//! exactly one client and stale settings cannot leak into the next one.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::client::ApiClient;
use crate::session::SessionStore;
use crate::telemetry::{Logger, ReportSender};
use crate::transport::{HttpTransport, ReqwestTransport};

pub const DEFAULT_API_VERSION: &str = "3";
pub const DEFAULT_BASE_URL: &str = "https://v3dev.api.tooso.ai/";
pub const DEFAULT_LANGUAGE: &str = "en-us";
pub const DEFAULT_AGENT: &str = "Unknown";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 4_000;

/// Immutable settings owned by an [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub api_version: Option<String>,
    /// Validated on every request, not at build time.
    pub base_url: String,
    pub language: Option<String>,
    pub store_code: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Sent as the `X-Tooso-Agent` header.
    pub agent: String,
    /// Verify the API server's TLS certificate and host name.
    ///
    /// Turning this off lets anyone on the network path read the API key.
    /// Only do it against test endpoints with self-signed certificates.
    pub verify_tls: bool,
    /// Directory for temporary upload archives; the OS temp dir when `None`.
    pub temp_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_version: None,
            base_url: String::new(),
            language: None,
            store_code: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            agent: DEFAULT_AGENT.to_string(),
            verify_tls: true,
            temp_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Fluent builder for [`ApiClient`].
///
/// Starts from the production defaults (API version 3, the hosted base URL,
/// `en-us`).
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    logger: Option<Arc<dyn Logger>>,
    report_sender: Option<Arc<dyn ReportSender>>,
    session_store: Option<Arc<dyn SessionStore>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig {
                api_version: Some(DEFAULT_API_VERSION.to_string()),
                base_url: DEFAULT_BASE_URL.to_string(),
                language: Some(DEFAULT_LANGUAGE.to_string()),
                ..ClientConfig::default()
            },
            transport: None,
            logger: None,
            report_sender: None,
            session_store: None,
        }
    }

    /// Builder seeded from `TOOSO_*` environment variables (a `.env` file is
    /// honoured). Unset or unparsable variables keep the defaults.
    pub fn from_env() -> Self {
        let mut builder = Self::new();

        if let Ok(key) = dotenvy::var("TOOSO_API_KEY") {
            builder = builder.with_api_key(key);
        }
        if let Ok(version) = dotenvy::var("TOOSO_API_VERSION") {
            builder = builder.with_api_version(Some(version).filter(|v| !v.is_empty()));
        }
        if let Ok(url) = dotenvy::var("TOOSO_BASE_URL") {
            builder = builder.with_api_base_url(url);
        }
        if let Ok(language) = dotenvy::var("TOOSO_LANGUAGE") {
            builder = builder.with_language(language);
        }
        if let Ok(store) = dotenvy::var("TOOSO_STORE_CODE") {
            builder = builder.with_store_code(store);
        }
        if let Ok(val) = dotenvy::var("TOOSO_CONNECT_TIMEOUT_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            builder = builder.with_connect_timeout_ms(ms);
        }
        if let Ok(val) = dotenvy::var("TOOSO_TIMEOUT_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            builder = builder.with_request_timeout_ms(ms);
        }
        if let Ok(agent) = dotenvy::var("TOOSO_AGENT") {
            builder = builder.with_agent(agent);
        }
        if let Ok(val) = dotenvy::var("TOOSO_INSECURE_TLS")
            && (val.eq_ignore_ascii_case("true") || val == "1")
        {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    /// `None` drops the `v{version}` path segment.
    pub fn with_api_version(mut self, version: Option<String>) -> Self {
        self.config.api_version = version;
        self
    }

    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.config.language = Some(language.into().to_lowercase());
        self
    }

    /// Clear the language so the store code identifies the catalog instead.
    pub fn without_language(mut self) -> Self {
        self.config.language = None;
        self
    }

    pub fn with_store_code(mut self, store_code: impl Into<String>) -> Self {
        self.config.store_code = Some(store_code.into().to_lowercase());
        self
    }

    pub fn with_connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.agent = agent.into();
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    /// Disable TLS certificate verification for API calls.
    ///
    /// # Security
    ///
    /// With verification off, the API key and all traffic are exposed to any
    /// man in the middle. Keep it for local or staging endpoints only.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.verify_tls = !accept;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_report_sender(mut self, sender: Arc<dyn ReportSender>) -> Self {
        self.report_sender = Some(sender);
        self
    }

    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Consume the builder into a client. Uses [`ReqwestTransport`] unless a
    /// transport was supplied.
    pub fn build(self) -> ApiClient {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));
        ApiClient::new(self.config, transport)
            .with_collaborators(self.logger, self.report_sender, self.session_store)
    }
}
