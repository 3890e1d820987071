//! AWS-oriented adapters and handlers for the stream transform.
//!
//! This crate owns runtime integration details (the Lambda entry point,
//! environment configuration, and storage adapters) and exposes a single
//! runtime module boundary for schema, decoding, and storage key primitives.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod runtime;
