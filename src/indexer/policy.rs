//! Presigned POST policy for direct-to-bucket uploads.
//!
//! The policy is a base64 JSON document; the upload is authorized by an
//! HMAC-SHA1 signature of that base64 text under the secret key.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use ring::hmac;
use serde_json::json;

pub const UPLOAD_REGION: &str = "us-west-2";
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";
pub const POLICY_TTL_HOURS: i64 = 24;

/// Virtual-hosted endpoint for `bucket`.
pub fn upload_endpoint(bucket: &str) -> String {
    format!("https://{bucket}.s3-{UPLOAD_REGION}.amazonaws.com")
}

/// `{prefix}{epoch_ms}_{unique_id}_{api_key}.zip`
pub fn object_key(path_prefix: &str, epoch_ms: i64, unique_id: &str, api_key: &str) -> String {
    format!("{path_prefix}{epoch_ms}_{unique_id}_{api_key}.zip")
}

/// Base64 policy valid for [`POLICY_TTL_HOURS`] from `now`.
pub fn policy_document(bucket: &str, now: DateTime<Utc>) -> String {
    let expiration = now + Duration::hours(POLICY_TTL_HOURS);
    let document = json!({
        "expiration": expiration.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "conditions": [
            {"bucket": bucket},
            ["starts-with", "$key", ""],
            ["starts-with", "$Content-Type", ""],
        ],
    });
    STANDARD.encode(document.to_string())
}

/// base64(HMAC-SHA1(secret_key, policy))
pub fn sign_policy(policy: &str, secret_key: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret_key.as_bytes());
    STANDARD.encode(hmac::sign(&key, policy.as_bytes()).as_ref())
}
