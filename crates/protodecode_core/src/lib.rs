//! Shared protobuf-to-JSON transform primitives.
//!
//! This crate owns the fixed record schema, payload extraction, decoding and
//! text serialization, the output buffer, and object key derivation. It
//! intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod accumulator;
pub mod decode;
pub mod event;
pub mod schema;
pub mod storage_keys;
