//! Small helpers shared by the Cadence engine and CLI.

pub mod http;
pub mod path_processing;
pub mod text_processing;

pub use path_processing::expand_tilde;
pub use text_processing::{redact_json, redact_sensitive};
