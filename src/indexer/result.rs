//! Outcome of an archive upload.
//!
//! Object storage answers a successful POST with an empty 2xx response and a
//! failure with an XML `<Error>` document.

use quick_xml::Reader;
use quick_xml::events::Event;

#[derive(Debug, Clone, PartialEq, Eq)]
struct StorageError {
    code: String,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexResult {
    status: u16,
    body: String,
    error: Option<StorageError>,
    bucket: String,
    object_key: String,
}

impl IndexResult {
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let error = parse_error_document(&body);
        Self {
            status,
            body,
            error,
            bucket: String::new(),
            object_key: String::new(),
        }
    }

    pub(crate) fn with_location(mut self, bucket: &str, object_key: &str) -> Self {
        self.bucket = bucket.to_string();
        self.object_key = object_key.to_string();
        self
    }

    pub fn is_valid(&self) -> bool {
        (200..300).contains(&self.status) && self.error.is_none()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn raw_body(&self) -> &str {
        &self.body
    }

    /// Storage error code (e.g. `AccessDenied`); `HTTP{status}` when the
    /// failure came without a document, empty on success.
    pub fn error_code(&self) -> String {
        match &self.error {
            Some(err) if !err.code.is_empty() => err.code.clone(),
            _ if !self.is_valid() => format!("HTTP{}", self.status),
            _ => String::new(),
        }
    }

    pub fn error_description(&self) -> String {
        match &self.error {
            Some(err) if !err.message.is_empty() => err.message.clone(),
            _ if !self.is_valid() => format!("upload failed with HTTP status {}", self.status),
            _ => String::new(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }
}

fn parse_error_document(body: &str) -> Option<StorageError> {
    let mut reader = Reader::from_str(body);
    let mut in_error = false;
    let mut current: Option<Vec<u8>> = None;
    let mut code = String::new();
    let mut message = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                if name.as_ref() == b"Error" {
                    in_error = true;
                } else if in_error {
                    current = Some(name.as_ref().to_vec());
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Text(ref e)) => {
                if let Some(tag) = &current {
                    let text = e.unescape().map(|t| t.into_owned()).unwrap_or_default();
                    match tag.as_slice() {
                        b"Code" => code.push_str(text.trim()),
                        b"Message" => message.push_str(text.trim()),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    in_error.then_some(StorageError { code, message })
}
