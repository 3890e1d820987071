pub use protodecode_core::{accumulator, decode, event, schema, storage_keys};
