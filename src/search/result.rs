//! Typed accessors over a search response.
//!
//! Every accessor degrades to a zero value when the envelope is invalid, so a
//! failed search can still be rendered as "no results".

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::response::{ResponseEnvelope, field, scalar_to_string};

const FALLBACK_TOTAL_TIME: f64 = 0.0;
const FALLBACK_TOTAL_RESULTS: u64 = 0;

/// Result of a `/search` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    envelope: ResponseEnvelope,
}

impl SearchResult {
    pub fn new(envelope: ResponseEnvelope) -> Self {
        Self { envelope }
    }

    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    pub fn is_valid(&self) -> bool {
        self.envelope.is_valid()
    }

    /// Server-issued id correlating this search with follow-up calls.
    pub fn search_id(&self) -> Option<String> {
        self.envelope.object_id()
    }

    /// Ordered result identifiers (`data.results`).
    pub fn results(&self) -> Vec<String> {
        self.raw_results().iter().filter_map(result_id).collect()
    }

    /// Server-side processing time (`metadata.time`).
    pub fn total_time(&self) -> f64 {
        self.valid_metadata()
            .and_then(|m| field(Some(m), "time"))
            .and_then(as_f64)
            .unwrap_or(FALLBACK_TOTAL_TIME)
    }

    /// Total hit count (`data.hits`), which may exceed the returned page.
    pub fn total_results(&self) -> u64 {
        self.valid_data()
            .and_then(|d| field(Some(d), "hits"))
            .and_then(as_f64)
            .map(|n| n.max(0.0) as u64)
            .unwrap_or(FALLBACK_TOTAL_RESULTS)
    }

    /// Query as received by the server (`metadata.q`).
    pub fn original_query(&self) -> String {
        self.valid_metadata()
            .and_then(|m| field(Some(m), "q"))
            .and_then(scalar_to_string)
            .unwrap_or_default()
    }

    /// Spelling-corrected query (`data.fixedQuery`).
    pub fn corrected_query(&self) -> String {
        self.valid_data()
            .and_then(|d| field(Some(d), "fixedQuery"))
            .and_then(scalar_to_string)
            .unwrap_or_default()
    }

    /// Result identifier to zero-based position. A repeated identifier keeps
    /// its last position.
    pub fn rank_collection(&self) -> HashMap<String, usize> {
        self.raw_results()
            .iter()
            .enumerate()
            .filter_map(|(rank, item)| result_id(item).map(|id| (id, rank)))
            .collect()
    }

    pub fn redirect(&self) -> Option<String> {
        self.valid_data()
            .and_then(|d| field(Some(d), "redirect"))
            .and_then(scalar_to_string)
    }

    /// `data.ai.similarResults`: set when the server substituted similar
    /// results for an unmatched query.
    pub fn similar_results_alert(&self) -> Option<bool> {
        let ai = self.valid_data().and_then(|d| field(Some(d), "ai"));
        match field(ai, "similarResults")? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(n.as_f64().is_some_and(|n| n != 0.0)),
            Value::String(s) => Some(matches!(s.as_str(), "true" | "1")),
            _ => None,
        }
    }

    /// True when the response has a `data` section and no redirect.
    pub fn is_search_available(&self) -> bool {
        self.envelope.data().is_some() && self.redirect().is_none()
    }

    /// True when the response has a `data` section but no results in it.
    pub fn is_result_empty(&self) -> bool {
        self.envelope.data().is_some() && self.results().is_empty()
    }

    pub fn error_code(&self) -> i64 {
        self.envelope.error_code()
    }

    pub fn error_description(&self) -> String {
        self.envelope.error_description()
    }

    pub fn error_debug_info(&self) -> Option<String> {
        self.envelope.error_debug_info()
    }

    /// Flat snapshot of the derived fields, for printing.
    pub fn summary(&self) -> SearchSummary {
        SearchSummary {
            search_id: self.search_id(),
            total_results: self.total_results(),
            total_time: self.total_time(),
            original_query: self.original_query(),
            corrected_query: self.corrected_query(),
            results: self.results(),
            redirect: self.redirect(),
            similar_results_alert: self.similar_results_alert(),
        }
    }

    fn valid_data(&self) -> Option<&Value> {
        self.envelope.is_valid().then(|| self.envelope.data()).flatten()
    }

    /// `data.results` as sent, including entries without a readable id.
    fn raw_results(&self) -> &[Value] {
        match self.valid_data().and_then(|d| field(Some(d), "results")) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    fn valid_metadata(&self) -> Option<&Value> {
        self.envelope
            .is_valid()
            .then(|| self.envelope.metadata())
            .flatten()
    }
}

impl From<ResponseEnvelope> for SearchResult {
    fn from(envelope: ResponseEnvelope) -> Self {
        Self::new(envelope)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    pub search_id: Option<String>,
    pub total_results: u64,
    pub total_time: f64,
    pub original_query: String,
    pub corrected_query: String,
    pub results: Vec<String>,
    pub redirect: Option<String>,
    pub similar_results_alert: Option<bool>,
}

fn result_id(item: &Value) -> Option<String> {
    match item {
        Value::Object(obj) => obj.get("id").and_then(scalar_to_string),
        other => scalar_to_string(other),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
