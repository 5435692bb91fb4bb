//! Workflow loading, validation, and execution.

pub mod document;
pub mod runner;
pub mod validation;

pub use document::{DEFAULT_WORKFLOW_NAME, parse_workflow_file, parse_workflow_str};
pub use runner::{WorkflowRunner, run_workflow};
pub use validation::{ValidationIssue, validate_workflow};
