//! Receipt extraction adapter for the external vision model.
//!
//! All knowledge of the provider's wire format lives here: the strict
//! JSON schema sent with the request, the defensive parsing of the
//! provider's several historical response envelopes, and field-level
//! validation of the structured payload. The rest of the codebase only
//! ever sees the canonical [`ExtractedReceipt`].

mod client;
mod error;
mod parse;
mod types;

pub use client::{ExtractionClient, ExtractionConfig};
pub use error::ExtractionError;
pub use parse::{extract_payload, validate_payload};
pub use types::{ExtractedItem, ExtractedReceipt};
