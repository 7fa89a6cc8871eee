//! Catalog indexing: package payloads, sign an upload policy, push the archive
//! straight to the indexing bucket.
//!
//! - **[`archive`]**: zip packaging into a self-deleting temp file.
//! - **[`policy`]**: presigned POST policy and its signature.
//! - **[`result`]**: [`IndexResult`], the parsed storage response.

pub mod archive;
pub mod policy;
pub mod result;

use std::fmt;

use chrono::Utc;

pub use archive::{DEFAULT_PAYLOAD_NAME, IndexPayload};
pub use result::IndexResult;

use crate::client::ApiClient;
use crate::error::{ClientError, Result};
use crate::request::new_unique_id;
use crate::transport::{FilePart, HttpMethod, HttpRequest, RequestBody};

/// Upload credentials and destination as handed over by the API.
///
/// All four values are required and must be non-empty.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UploadParams {
    pub access_key_id: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
    /// Object key prefix, e.g. `feeds/store-1/`.
    pub path: Option<String>,
}

impl fmt::Debug for UploadParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadParams")
            .field("access_key_id", &self.access_key_id)
            .field("has_secret_key", &self.secret_key.is_some())
            .field("bucket", &self.bucket)
            .field("path", &self.path)
            .finish()
    }
}

impl UploadParams {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_key: impl Into<String>,
        bucket: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: Some(access_key_id.into()),
            secret_key: Some(secret_key.into()),
            bucket: Some(bucket.into()),
            path: Some(path.into()),
        }
    }

    /// Read the `ACCESS_KEY_ID`, `SECRET_KEY`, `BUCKET` and `PATH` entries of
    /// a key/value listing. Other keys are ignored.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "ACCESS_KEY_ID" => &mut params.access_key_id,
                "SECRET_KEY" => &mut params.secret_key,
                "BUCKET" => &mut params.bucket,
                "PATH" => &mut params.path,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        params
    }

    /// `TOOSO_S3_ACCESS_KEY_ID`, `TOOSO_S3_SECRET_KEY`, `TOOSO_S3_BUCKET`,
    /// `TOOSO_S3_PATH`.
    pub fn from_env() -> Self {
        Self {
            access_key_id: dotenvy::var("TOOSO_S3_ACCESS_KEY_ID").ok(),
            secret_key: dotenvy::var("TOOSO_S3_SECRET_KEY").ok(),
            bucket: dotenvy::var("TOOSO_S3_BUCKET").ok(),
            path: dotenvy::var("TOOSO_S3_PATH").ok(),
        }
    }

    pub(crate) fn destination(&self) -> Result<Destination<'_>> {
        fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
            match value.as_deref() {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(ClientError::configuration(format!(
                    "Index params are not correct: {name} is missing"
                ))),
            }
        }

        Ok(Destination {
            access_key_id: required(&self.access_key_id, "ACCESS_KEY_ID")?,
            secret_key: required(&self.secret_key, "SECRET_KEY")?,
            bucket: required(&self.bucket, "BUCKET")?,
            path_prefix: required(&self.path, "PATH")?,
        })
    }
}

pub(crate) struct Destination<'a> {
    access_key_id: &'a str,
    secret_key: &'a str,
    bucket: &'a str,
    path_prefix: &'a str,
}

/// One upload run for an [`ApiClient`].
pub struct UploadPipeline<'a> {
    client: &'a ApiClient,
}

impl<'a> UploadPipeline<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Archive, sign and upload. The temp archive is removed on every path out
    /// of this function.
    pub fn run(&self, payload: &IndexPayload, params: &UploadParams) -> Result<IndexResult> {
        let config = self.client.config();
        let archive = archive::write_archive(payload, config.temp_dir.as_deref())
            .inspect_err(|e| self.client.report("", "", &config.api_key, &e.to_string()))?;
        self.client
            .log_debug(&format!("Temporary zip file: {}", archive.path().display()));

        let destination = params
            .destination()
            .inspect_err(|e| self.client.report("", "", &config.api_key, &e.to_string()))?;

        let now = Utc::now();
        let object_key = policy::object_key(
            destination.path_prefix,
            now.timestamp_millis(),
            &new_unique_id(),
            &config.api_key,
        );
        let policy = policy::policy_document(destination.bucket, now);
        let signature = policy::sign_policy(&policy, destination.secret_key);
        let url = policy::upload_endpoint(destination.bucket);

        let request = HttpRequest {
            url: url.clone(),
            method: HttpMethod::Post,
            headers: Vec::new(),
            body: RequestBody::Multipart {
                fields: vec![
                    ("key".to_string(), object_key.clone()),
                    ("AWSAccessKeyId".to_string(), destination.access_key_id.to_string()),
                    ("policy".to_string(), policy),
                    ("Content-Type".to_string(), policy::ARCHIVE_CONTENT_TYPE.to_string()),
                    ("signature".to_string(), signature),
                ],
                file: FilePart {
                    field_name: "file".to_string(),
                    file_name: object_key.clone(),
                    content_type: policy::ARCHIVE_CONTENT_TYPE.to_string(),
                    path: archive.path().to_path_buf(),
                },
            },
            connect_timeout: config.connect_timeout(),
            timeout: None,
            verify_tls: true,
        };

        self.client.log_debug("Start uploading zipfile");
        let response = match self.client.transport().execute(&request) {
            Ok(response) => response,
            Err(failure) => {
                self.client.report(
                    &url,
                    "S3",
                    destination.access_key_id,
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
        self.client.log_debug(&format!(
            "Raw response: status {} body {}",
            response.status, response.body
        ));

        let result = IndexResult::from_response(response.status, response.body)
            .with_location(destination.bucket, &object_key);
        if !result.is_valid() {
            let description = result.error_description();
            self.client.report(
                &url,
                "PUT",
                destination.access_key_id,
                &format!("Error description = {description}"),
            );
            return Err(ClientError::UploadRejected {
                description,
                code: result.error_code(),
            });
        }

        self.client.log_debug(&format!(
            "End uploading zipfile to s3://{}/{}",
            destination.bucket, object_key
        ));
        Ok(result)
    }
}
