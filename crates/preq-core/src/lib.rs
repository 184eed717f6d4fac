//! Shared building blocks for the preq runbook.
//!
//! Event records as produced by the detection engine, the field accessor used
//! to read them, and the text template engine that renders action payloads.

pub mod error;
pub mod record;
pub mod template;

pub use error::{CoreError, Result};
pub use record::{field, EventRecord};
pub use template::{Template, TemplateError};
