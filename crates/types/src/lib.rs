//! Shared data model for Cadence workflows.
//!
//! The definitions here are consumed as data (parsed JSON or YAML) by the engine and the CLI.
//! Run reports are produced by the engine and serialized by the CLI.

pub mod workflow;

pub use workflow::{RunReport, StepRecord, StepStatus, WorkflowBundle, WorkflowDefinition, WorkflowStep};
