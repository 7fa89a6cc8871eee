//! URL construction for API calls.
//!
//! Every request carries the same preamble (`ul`, `tid`, `v`, `z`) ahead of
//! the caller's own parameters. `z` is a fresh random token per request so
//! intermediaries never serve a cached answer.

use reqwest::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Ordered query parameters. Order is preserved on the wire.
pub type QueryParams = Vec<(String, String)>;

/// Replace the value of `key` in place, or append it.
pub fn set_param(params: &mut QueryParams, key: &str, value: &str) {
    match params.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value.to_string(),
        None => params.push((key.to_string(), value.to_string())),
    }
}

/// Builds request URLs from a client configuration.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    config: &'a ClientConfig,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(config: &'a ClientConfig) -> Self {
        Self { config }
    }

    /// Build the full URL for `path` with `params` appended after the preamble.
    ///
    /// The base URL is validated on every call.
    pub fn build_url(&self, path: &str, params: &[(String, String)]) -> Result<String> {
        let base = self.config.base_url.as_str();
        if !is_valid_base_url(base) {
            return Err(ClientError::configuration(format!(
                "API base URL missing or invalid: \"{base}\""
            )));
        }

        let mut url = base.to_string();
        if !url.ends_with('/') {
            url.push('/');
        }
        match &self.config.api_version {
            Some(version) => {
                url.push('v');
                url.push_str(version);
                url.push_str(path);
            }
            None => url.push_str(path.trim_start_matches('/')),
        }

        let language = self
            .config
            .language
            .as_deref()
            .or(self.config.store_code.as_deref())
            .unwrap_or_default();
        let token = new_unique_id();
        let preamble = [
            ("ul", language),
            ("tid", self.config.api_key.as_str()),
            ("v", self.config.api_version.as_deref().unwrap_or_default()),
            ("z", token.as_str()),
        ];

        let query: Vec<String> = preamble
            .into_iter()
            .chain(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect();

        url.push('?');
        url.push_str(&query.join("&"));
        Ok(url)
    }
}

/// Absolute URL with a host, e.g. `https://api.example.com/`.
pub fn is_valid_base_url(base: &str) -> bool {
    Url::parse(base).is_ok_and(|u| u.has_host())
}

/// Random version-4 UUID, lower-case hyphenated
/// (`xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`).
pub fn new_unique_id() -> String {
    Uuid::new_v4().to_string()
}
