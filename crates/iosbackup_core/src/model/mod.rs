//! Typed records produced by the manifest parser and the extractors.
//!
//! # Responsibility
//! - Define the read models shared by extraction, export and CLI output.
//!
//! # Invariants
//! - Records are plain data; they never hold database handles.
//! - Timestamps are UTC.

pub mod call;
pub mod contact;
pub mod file;
pub mod media;
pub mod message;
pub mod note;
