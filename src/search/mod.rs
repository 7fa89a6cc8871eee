//! Search call parameters and results.
//!
//! - **[`result`]**: [`SearchResult`], typed accessors with fallbacks.
//!
//! [`SearchOptions`] turns a query into the ordered parameter list sent to
//! `/search`.

pub mod result;

pub use result::{SearchResult, SearchSummary};

use crate::request::{QueryParams, set_param};

pub const DEFAULT_PAGE: u32 = 0;
pub const DEFAULT_LIMIT: u32 = 250;
pub const SEARCH_CHANNEL: &str = "web";

/// Optional knobs for [`crate::ApiClient::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Let the server correct misspelled queries.
    pub typo_correction: bool,
    /// Extra parameters; a key that matches a default replaces it in place.
    pub extra_params: QueryParams,
    /// Ask the server for debug-enriched results (`debug=1`).
    pub enriched: bool,
    pub page: u32,
    pub limit: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            typo_correction: true,
            extra_params: Vec::new(),
            enriched: false,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchOptions {
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn typo_correction(mut self, enabled: bool) -> Self {
        self.typo_correction = enabled;
        self
    }

    pub fn enriched(mut self, enriched: bool) -> Self {
        self.enriched = enriched;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.push((key.into(), value.into()));
        self
    }

    /// Ordered parameters for a `/search` request.
    pub fn to_params(&self, query: &str) -> QueryParams {
        let mut params: QueryParams = vec![
            ("q".into(), query.into()),
            ("typoCorrection".into(), self.typo_correction.to_string()),
            ("page".into(), self.page.to_string()),
            ("limit".into(), self.limit.to_string()),
            ("channel".into(), SEARCH_CHANNEL.into()),
        ];
        for (key, value) in &self.extra_params {
            set_param(&mut params, key, value);
        }
        if self.enriched {
            set_param(&mut params, "debug", "1");
        }
        params
    }
}
