use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::adapters::clock::WallClock;
use crate::adapters::object_store::ObjectStore;
use crate::config::TransformConfig;
use crate::runtime::accumulator::OutputBuffer;
use crate::runtime::decode::{RecordDecoder, RecordError};
use crate::runtime::event::{record_payload, stream_records, EventError};
use crate::runtime::storage_keys::{output_object_key, unix_timestamp_seconds};

const COMPONENT: &str = "stream_handler";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformResponse {
    pub status: String,
    pub records_received: usize,
    pub records_transformed: usize,
    pub records_skipped: usize,
    pub object_key: String,
    pub bytes_written: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum TransformHandlerError {
    #[error(transparent)]
    MalformedEvent(#[from] EventError),

    #[error("failed to write output object '{key}': {message}")]
    StoreWrite { key: String, message: String },
}

/// Transforms every record of one stream event and writes the concatenated
/// text as a single object.
///
/// Records that fail to transform are logged and left out. The object is
/// written exactly once, even when the batch is empty or every record failed.
pub fn handle_stream_event(
    event: &Value,
    decoder: &RecordDecoder,
    config: &TransformConfig,
    clock: &impl WallClock,
    store: &impl ObjectStore,
) -> Result<TransformResponse, TransformHandlerError> {
    let started_at = Instant::now();
    let records = stream_records(event)?;

    let mut output = OutputBuffer::new();
    let mut records_skipped = 0usize;
    for (record_index, record) in records.iter().enumerate() {
        match transform_record(record, decoder) {
            Ok(text) => output.append(&text),
            Err(record_error) => {
                records_skipped += 1;
                error!(
                    component = COMPONENT,
                    event = "record_skipped",
                    record_index,
                    error = %record_error,
                    "Error occurred transforming record"
                );
            }
        }
    }

    let object_key = output_object_key(&config.key_prefix, unix_timestamp_seconds(clock.now()));
    let records_transformed = output.records();
    let bytes_written = output.len();

    store
        .write_object(&object_key, &output.into_bytes())
        .map_err(|message| TransformHandlerError::StoreWrite {
            key: object_key.clone(),
            message,
        })?;

    info!(
        component = COMPONENT,
        event = "object_written",
        bucket = %config.bucket,
        object_key = %object_key,
        records_received = records.len(),
        records_transformed,
        records_skipped,
        bytes_written,
        duration_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Wrote transformed batch"
    );

    Ok(TransformResponse {
        status: "ok".to_string(),
        records_received: records.len(),
        records_transformed,
        records_skipped,
        object_key,
        bytes_written,
    })
}

/// Decodes one stream record into JSON text.
pub fn transform_record(record: &Value, decoder: &RecordDecoder) -> Result<String, RecordError> {
    let payload = record_payload(record)?;
    info!(
        component = COMPONENT,
        event = "record_received",
        payload = %payload.escape_ascii(),
        "Original protobuf message"
    );

    let text = decoder.transform(&payload)?;
    info!(
        component = COMPONENT,
        event = "record_decoded",
        json = %text,
        "Decoded message in JSON"
    );
    Ok(text)
}
