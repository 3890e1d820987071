//! Record decoding: binary payload to a field map, field map to JSON text.
//!
//! Only fields present in the payload are reported. Proto3 scalars carrying
//! their default value count as absent, unknown field numbers are dropped, and
//! the remaining fields keep their field-number order.

use std::io;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use prost_reflect::{DynamicMessage, MapKey, MessageDescriptor, ReflectMessage, Value as ProtoValue};
use serde::Serialize;
use serde_json::ser::Formatter;

use crate::schema::{demo_message_descriptor, SchemaError};

/// Failure to turn one stream record into text. The record is skipped.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record has no kinesis.data string")]
    MissingData,

    #[error("record data is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("payload does not match the record schema: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("failed to serialize decoded fields: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("serialized fields are not valid UTF-8: {0}")]
    NonUtf8Output(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone)]
pub struct RecordDecoder {
    descriptor: MessageDescriptor,
}

impl RecordDecoder {
    pub fn new(descriptor: MessageDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn for_demo_schema() -> Result<Self, SchemaError> {
        Ok(Self::new(demo_message_descriptor()?))
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    pub fn decode(&self, payload: &[u8]) -> Result<DecodedFields, RecordError> {
        let message = DynamicMessage::decode(self.descriptor.clone(), payload)?;
        Ok(message_fields(&message))
    }

    /// Decodes `payload` and renders the present fields as JSON text.
    pub fn transform(&self, payload: &[u8]) -> Result<String, RecordError> {
        self.decode(payload)?.to_json_text()
    }
}

/// One decoded field value.
///
/// Enums are carried as their number and bytes as base64 text. Floats keep
/// NaN and the infinities.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
    Record(DecodedFields),
}

/// Present fields of one decoded record, keyed by schema field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFields(Vec<(String, FieldValue)>);

impl DecodedFields {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    /// Renders `{"name": value, ...}` with spaced separators and ASCII-only
    /// strings. Non-finite floats render as `NaN`, `Infinity` and
    /// `-Infinity`. An empty map renders as `{}`.
    pub fn to_json_text(&self) -> Result<String, RecordError> {
        let mut buffer = Vec::with_capacity(128);
        write_record(&mut buffer, self)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn message_fields(message: &DynamicMessage) -> DecodedFields {
    let mut fields: Vec<_> = message.descriptor().fields().collect();
    fields.sort_by_key(|field| field.number());

    let mut decoded = Vec::new();
    for field in fields {
        let value = message.get_field(&field);
        if message.has_field(&field) || is_negative_zero(&value) {
            decoded.push((field.name().to_string(), field_value(&value)));
        }
    }
    DecodedFields(decoded)
}

// -0.0 compares equal to the 0.0 default but is still set on the wire.
fn is_negative_zero(value: &ProtoValue) -> bool {
    match value {
        ProtoValue::F32(value) => *value == 0.0 && value.is_sign_negative(),
        ProtoValue::F64(value) => *value == 0.0 && value.is_sign_negative(),
        _ => false,
    }
}

fn field_value(value: &ProtoValue) -> FieldValue {
    match value {
        ProtoValue::Bool(value) => FieldValue::Bool(*value),
        ProtoValue::I32(value) => FieldValue::Int(i64::from(*value)),
        ProtoValue::I64(value) => FieldValue::Int(*value),
        ProtoValue::U32(value) => FieldValue::UInt(u64::from(*value)),
        ProtoValue::U64(value) => FieldValue::UInt(*value),
        ProtoValue::F32(value) => FieldValue::Float(f64::from(*value)),
        ProtoValue::F64(value) => FieldValue::Float(*value),
        ProtoValue::String(value) => FieldValue::Text(value.clone()),
        ProtoValue::Bytes(value) => FieldValue::Text(STANDARD.encode(value)),
        ProtoValue::EnumNumber(value) => FieldValue::Int(i64::from(*value)),
        ProtoValue::Message(message) => FieldValue::Record(message_fields(message)),
        ProtoValue::List(items) => FieldValue::List(items.iter().map(field_value).collect()),
        ProtoValue::Map(entries) => {
            let mut sorted: Vec<(String, FieldValue)> = entries
                .iter()
                .map(|(key, value)| (map_key_text(key), field_value(value)))
                .collect();
            sorted.sort_by(|left, right| left.0.cmp(&right.0));
            FieldValue::Record(DecodedFields(sorted))
        }
    }
}

fn map_key_text(key: &MapKey) -> String {
    match key {
        MapKey::Bool(value) => value.to_string(),
        MapKey::I32(value) => value.to_string(),
        MapKey::I64(value) => value.to_string(),
        MapKey::U32(value) => value.to_string(),
        MapKey::U64(value) => value.to_string(),
        MapKey::String(value) => value.clone(),
    }
}

fn write_record(out: &mut Vec<u8>, fields: &DecodedFields) -> Result<(), RecordError> {
    out.push(b'{');
    for (index, (name, value)) in fields.0.iter().enumerate() {
        if index > 0 {
            out.extend_from_slice(b", ");
        }
        write_string(out, name)?;
        out.extend_from_slice(b": ");
        write_value(out, value)?;
    }
    out.push(b'}');
    Ok(())
}

fn write_value(out: &mut Vec<u8>, value: &FieldValue) -> Result<(), RecordError> {
    match value {
        FieldValue::Bool(value) => out.extend_from_slice(value.to_string().as_bytes()),
        FieldValue::Int(value) => out.extend_from_slice(value.to_string().as_bytes()),
        FieldValue::UInt(value) => out.extend_from_slice(value.to_string().as_bytes()),
        FieldValue::Float(value) => out.extend_from_slice(float_text(*value).as_bytes()),
        FieldValue::Text(value) => write_string(out, value)?,
        FieldValue::List(items) => {
            out.push(b'[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.extend_from_slice(b", ");
                }
                write_value(out, item)?;
            }
            out.push(b']');
        }
        FieldValue::Record(fields) => write_record(out, fields)?,
    }
    Ok(())
}

fn write_string(out: &mut Vec<u8>, text: &str) -> Result<(), RecordError> {
    let mut serializer = serde_json::Serializer::with_formatter(&mut *out, AsciiFormatter);
    text.serialize(&mut serializer)?;
    Ok(())
}

/// Shortest round-trip digits; exponent form below 1e-4 and from 1e16 up,
/// with a sign and at least two exponent digits (`1e-05`, `1e+16`).
fn float_text(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let token = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return token.to_string();
    }

    let scientific = format!("{value:e}");
    let parts = scientific
        .split_once('e')
        .and_then(|(mantissa, exponent)| Some((mantissa, exponent.parse::<i32>().ok()?)));
    match parts {
        Some((mantissa, exponent)) if !(-4..16).contains(&exponent) => {
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        _ => {
            let text = value.to_string();
            if text.contains('.') {
                text
            } else {
                format!("{text}.0")
            }
        }
    }
}

/// Escapes non-ASCII characters as `\uXXXX`.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
                continue;
            }
            for unit in ch.encode_utf16(&mut units).iter() {
                write!(writer, "\\u{:04x}", *unit)?;
            }
        }
        Ok(())
    }
}
