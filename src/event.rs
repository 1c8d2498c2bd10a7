//! Parsing of object-created notifications into document references.
//!
//! Accepts the S3 notification shape:
//! `{"Records":[{"s3":{"bucket":{"name":..},"object":{"key":..}}}]}`.
//! Object keys arrive form-encoded and are decoded before use.

use serde::Deserialize;
use thiserror::Error;

use crate::models::DocumentReference;

/// Errors that can occur while parsing a notification.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Event contains no records")]
    NoRecords,

    #[error("Record is missing {0}")]
    EmptyField(&'static str),

    #[error("Object key is not valid UTF-8 after decoding: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "Records", default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: Bucket,
    object: Object,
}

#[derive(Debug, Deserialize)]
struct Bucket {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Object {
    #[serde(default)]
    key: String,
}

/// Parse a notification into one reference per record, in record order.
pub fn parse_event(payload: &str) -> Result<Vec<DocumentReference>, EventError> {
    let notification: Notification = serde_json::from_str(payload)?;
    if notification.records.is_empty() {
        return Err(EventError::NoRecords);
    }

    notification
        .records
        .into_iter()
        .map(|record| {
            let bucket = record.s3.bucket.name;
            if bucket.is_empty() {
                return Err(EventError::EmptyField("s3.bucket.name"));
            }
            let key = decode_key(&record.s3.object.key)?;
            if key.is_empty() {
                return Err(EventError::EmptyField("s3.object.key"));
            }
            Ok(DocumentReference::new(bucket, key))
        })
        .collect()
}

/// Decode a form-encoded object key: `+` is a space, then percent escapes.
pub fn decode_key(raw: &str) -> Result<String, EventError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|key| key.into_owned())
        .map_err(|_| EventError::InvalidKey(raw.to_string()))
}
