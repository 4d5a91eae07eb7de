//! jcblock common types, IDs, and errors.
//!
//! This crate provides foundational types shared across jcb-core modules:
//! - Call identity and Caller ID payloads
//! - Disposition kinds recorded in the call log
//! - Common error types
//! - Schema versioning for persisted JSON

pub mod call;
pub mod error;
pub mod id;
pub mod schema;

pub use call::{CallEvent, CallerField, DispositionKind, ListKind};
pub use error::{Error, Result};
pub use id::CallId;
pub use schema::SCHEMA_VERSION;
