//! API client: search, catalog indexing and the shared request pipeline.
//!
//! Every failure is classified into a [`ClientError`] and, when a
//! [`ReportSender`] is configured, reported before it is returned. The client
//! performs exactly one attempt per call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::indexer::{IndexPayload, IndexResult, UploadParams, UploadPipeline};
use crate::request::{RequestBuilder, new_unique_id};
use crate::response::ResponseEnvelope;
use crate::search::{SearchOptions, SearchResult};
use crate::session::SessionStore;
use crate::telemetry::{ErrorReport, Logger, ReportSender};
use crate::transport::{AGENT_HEADER, HttpMethod, HttpRequest, HttpTransport, RequestBody};

pub const SEARCH_PATH: &str = "/search";

/// Blocking client for the search and indexing API. Build one with
/// [`crate::ClientBuilder`].
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    logger: Option<Arc<dyn Logger>>,
    report_sender: Option<Arc<dyn ReportSender>>,
    session_store: Option<Arc<dyn SessionStore>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("api_version", &self.config.api_version)
            .field("language", &self.config.language)
            .field("store_code", &self.config.store_code)
            .field("has_logger", &self.logger.is_some())
            .field("has_report_sender", &self.report_sender.is_some())
            .field("has_session_store", &self.session_store.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            logger: None,
            report_sender: None,
            session_store: None,
        }
    }

    pub(crate) fn with_collaborators(
        mut self,
        logger: Option<Arc<dyn Logger>>,
        report_sender: Option<Arc<dyn ReportSender>>,
        session_store: Option<Arc<dyn SessionStore>>,
    ) -> Self {
        self.logger = logger;
        self.report_sender = report_sender;
        self.session_store = session_store;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session_store(&self) -> Option<&Arc<dyn SessionStore>> {
        self.session_store.as_ref()
    }

    /// Run a search and record the returned search id in the session store.
    ///
    /// When the API answers with an error payload the search id it carries is
    /// still recorded before the error is returned.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResult> {
        let params = options.to_params(query);
        match self.perform_request(SEARCH_PATH, HttpMethod::Get, &params, None, false) {
            Ok(envelope) => {
                let result = SearchResult::new(envelope);
                self.remember_search_id(&result);
                Ok(result)
            }
            Err(err) => {
                if let Some(envelope) = err.partial_response() {
                    let result = SearchResult::new(envelope.clone());
                    self.remember_search_id(&result);
                }
                Err(err)
            }
        }
    }

    /// Upload catalog payloads for indexing.
    pub fn index(
        &self,
        payload: impl Into<IndexPayload>,
        params: &UploadParams,
    ) -> Result<IndexResult> {
        UploadPipeline::new(self).run(&payload.into(), params)
    }

    /// Fresh random version-4 UUID.
    pub fn new_unique_id(&self) -> String {
        new_unique_id()
    }

    /// Send one request to `path` and classify the outcome.
    ///
    /// `timeout` overrides the configured total timeout. With
    /// `ignore_body_validation` a 200 response is returned even when its
    /// payload carries an error.
    pub fn perform_request(
        &self,
        path: &str,
        method: HttpMethod,
        params: &[(String, String)],
        timeout: Option<Duration>,
        ignore_body_validation: bool,
    ) -> Result<ResponseEnvelope> {
        let url = RequestBuilder::new(&self.config)
            .build_url(path, params)
            .inspect_err(|e| self.report("", "", &self.config.api_key, &e.to_string()))?;

        self.log_debug(&format!(
            "Performing API request to url: {url} with method: {method}"
        ));
        debug!(?params, "request params");

        let request = HttpRequest {
            url: url.clone(),
            method,
            headers: vec![(AGENT_HEADER.to_string(), self.config.agent.clone())],
            body: RequestBody::Empty,
            connect_timeout: self.config.connect_timeout(),
            timeout: Some(timeout.unwrap_or_else(|| self.config.request_timeout())),
            verify_tls: self.config.verify_tls,
        };

        let response = match self.transport.execute(&request) {
            Ok(response) => response,
            Err(failure) => {
                self.report(
                    &url,
                    method.as_str(),
                    &self.config.api_key,
                    &format!(
                        "transport error = {} - error number = {}",
                        failure.message,
                        failure.code()
                    ),
                );
                return Err(ClientError::Transport {
                    code: failure.code(),
                    message: failure.message,
                });
            }
        };

        if ignore_body_validation {
            self.log_debug(&format!("Raw response: status code {}", response.status));
        } else {
            self.log_debug(&format!("Raw response: {}", response.body));
        }

        let envelope = ResponseEnvelope::from_body(&response.body);

        if response.status != 200 {
            let mut message = format!("API unavailable, HTTP STATUS CODE = {}", response.status);
            if let Some(info) = envelope.error_debug_info() {
                message.push_str(&format!("\n\nDebugInfo: {info}"));
            }
            self.report(&url, method.as_str(), &self.config.api_key, &message);
            return Err(ClientError::ApiStatus {
                status: response.status,
                envelope: Box::new(envelope),
            });
        }

        if !ignore_body_validation && !envelope.is_valid() {
            let description = envelope.error_description();
            let code = envelope.error_code();
            let debug_info = envelope.error_debug_info();
            self.report(
                &url,
                method.as_str(),
                &self.config.api_key,
                &format!(
                    "Error description = {description}\nError code = {code}\nDebug info = {}",
                    debug_info.as_deref().unwrap_or_default()
                ),
            );
            return Err(ClientError::ApiLogic {
                description,
                code,
                debug_info,
                envelope: Box::new(envelope),
            });
        }

        Ok(envelope)
    }

    fn remember_search_id(&self, result: &SearchResult) {
        let Some(store) = &self.session_store else {
            return;
        };
        let search_id = result.search_id();
        store.set_search_id(search_id.as_deref());
        self.log_debug(&format!(
            "Session: set search id to {}",
            search_id.as_deref().unwrap_or_default()
        ));
    }

    pub(crate) fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }

    pub(crate) fn log_debug(&self, message: &str) {
        debug!("{message}");
        if let Some(logger) = &self.logger {
            logger.debug(message);
        }
    }

    pub(crate) fn report(&self, url: &str, http_method: &str, api_key: &str, message: &str) {
        warn!(url, method = http_method, "{message}");
        if let Some(sender) = &self.report_sender {
            sender.send_report(&ErrorReport {
                url: url.to_string(),
                http_method: http_method.to_string(),
                api_key: api_key.to_string(),
                language: self.config.language.clone(),
                store_code: self.config.store_code.clone(),
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpResponse, TransportFailure};
    use parking_lot::Mutex;

    struct Canned {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl HttpTransport for Canned {
        fn execute(
            &self,
            request: &HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportFailure> {
            self.seen.lock().push(request.clone());
            Ok(HttpResponse {
                status: self.status,
                body: self.body.to_string(),
            })
        }
    }

    fn client(status: u16, body: &'static str) -> (ApiClient, Arc<Canned>) {
        let transport = Arc::new(Canned {
            status,
            body,
            seen: Mutex::new(Vec::new()),
        });
        let config = ClientConfig {
            api_key: "K".into(),
            api_version: Some("3".into()),
            base_url: "https://api.example.com".into(),
            language: Some("en-us".into()),
            agent: "unit".into(),
            ..ClientConfig::default()
        };
        (ApiClient::new(config, transport.clone()), transport)
    }

    #[test]
    fn test_request_carries_agent_header_and_timeouts() {
        let (client, transport) = client(200, r#"{"data":{}}"#);
        client
            .perform_request("/ping", HttpMethod::Post, &[], Some(Duration::from_millis(50)), false)
            .unwrap();

        let seen = transport.seen.lock();
        let request = &seen[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.headers,
            vec![("X-Tooso-Agent".to_string(), "unit".to_string())]
        );
        assert_eq!(request.connect_timeout, Duration::from_millis(2000));
        assert_eq!(request.timeout, Some(Duration::from_millis(50)));
        assert!(request.verify_tls);
        assert!(request.url.starts_with("https://api.example.com/v3/ping?ul=en-us&tid=K&v=3&z="));
    }

    #[test]
    fn test_default_timeout_from_config() {
        let (client, transport) = client(200, r#"{"data":{}}"#);
        client
            .perform_request("/ping", HttpMethod::Get, &[], None, false)
            .unwrap();
        assert_eq!(transport.seen.lock()[0].timeout, Some(Duration::from_millis(4000)));
    }

    #[test]
    fn test_ignore_body_validation_returns_error_payload() {
        let body = r#"{"metadata":{"code":7},"data":{"error":{"description":"nope"}}}"#;
        let (client, _) = client(200, body);

        let envelope = client
            .perform_request("/ping", HttpMethod::Get, &[], None, true)
            .unwrap();
        assert!(!envelope.is_valid());

        let err = client
            .perform_request("/ping", HttpMethod::Get, &[], None, false)
            .unwrap_err();
        match err {
            ClientError::ApiLogic {
                description, code, ..
            } => {
                assert_eq!(description, "nope");
                assert_eq!(code, 7);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_non_200_with_unparsable_body_still_has_partial_response() {
        let (client, _) = client(502, "<html>Bad Gateway</html>");
        let err = client
            .perform_request("/ping", HttpMethod::Get, &[], None, true)
            .unwrap_err();
        assert!(matches!(err, ClientError::ApiStatus { status: 502, .. }));
        assert_eq!(err.partial_response().map(|e| e.payload().is_null()), Some(true));
    }
}
