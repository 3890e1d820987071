use std::collections::HashMap;
use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use prost::Message;
use prost_reflect::{DynamicMessage, Value as ProtoValue};
use protodecode_lambda::adapters::clock::WallClock;
use protodecode_lambda::adapters::object_store::ObjectStore;
use protodecode_lambda::config::TransformConfig;
use protodecode_lambda::runtime::decode::RecordDecoder;
use serde_json::{json, Value};

pub struct RecordingStore {
    writes: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<(String, Vec<u8>)> {
        self.writes.lock().expect("poisoned mutex").clone()
    }

    pub fn only_body(&self) -> String {
        let writes = self.writes();
        assert_eq!(writes.len(), 1, "expected exactly one object write");
        String::from_utf8(writes[0].1.clone()).expect("body should be UTF-8")
    }
}

impl ObjectStore for RecordingStore {
    fn write_object(&self, key: &str, body: &[u8]) -> Result<(), String> {
        self.writes
            .lock()
            .expect("poisoned mutex")
            .push((key.to_string(), body.to_vec()));
        Ok(())
    }
}

pub struct FailingStore;

impl ObjectStore for FailingStore {
    fn write_object(&self, key: &str, _body: &[u8]) -> Result<(), String> {
        Err(format!("simulated write failure for key: {key}"))
    }
}

/// Advances by `step` on every read.
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    pub fn starting_at(seconds: i64, nanos: u32, step: Duration) -> Self {
        Self {
            next: Mutex::new(
                Utc.timestamp_opt(seconds, nanos)
                    .single()
                    .expect("valid instant"),
            ),
            step,
        }
    }
}

impl WallClock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().expect("poisoned mutex");
        let current = *next;
        *next = current + self.step;
        current
    }
}

pub fn decoder() -> RecordDecoder {
    RecordDecoder::for_demo_schema().expect("schema should load")
}

pub fn config() -> TransformConfig {
    TransformConfig {
        bucket: "decoded-records".to_string(),
        key_prefix: String::new(),
    }
}

pub fn demo_payload(fields: &[(&str, ProtoValue)]) -> Vec<u8> {
    let mut message = DynamicMessage::new(decoder().descriptor().clone());
    for (name, value) in fields {
        message.set_field_by_name(name, value.clone());
    }
    message.encode_to_vec()
}

pub fn kinesis_record(payload: &[u8]) -> Value {
    json!({
        "eventSource": "aws:kinesis",
        "eventName": "aws:kinesis:record",
        "kinesis": {
            "partitionKey": "demo",
            "data": STANDARD.encode(payload),
        }
    })
}

pub fn kinesis_event(records: Vec<Value>) -> Value {
    json!({ "Records": records })
}
