//! Extraction of record payloads from Kinesis-shaped trigger events.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use crate::decode::RecordError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("stream event must include a Records array")]
    MissingRecords,
}

pub fn stream_records(event: &Value) -> Result<&[Value], EventError> {
    event
        .get("Records")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or(EventError::MissingRecords)
}

/// Base64-decoded `kinesis.data` of one record.
pub fn record_payload(record: &Value) -> Result<Vec<u8>, RecordError> {
    let data = record
        .get("kinesis")
        .and_then(|kinesis| kinesis.get("data"))
        .and_then(Value::as_str)
        .ok_or(RecordError::MissingData)?;

    Ok(STANDARD.decode(data)?)
}
