//! # Cadence Engine
//!
//! Executes declarative JSON/YAML workflows: ordered lists of steps, each naming an action,
//! carrying `{{path}}`-templated parameters, an optional `if` gate, and an error-continuation
//! flag.
//!
//! ## Usage
//!
//! ```rust
//! use cadence_engine::{ExternalContext, parse_workflow_str, run_workflow};
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new()?.block_on(async {
//! let bundle = parse_workflow_str(r#"
//! steps:
//!   - actionName: setVar
//!     params: { path: "globals.greeting", value: "hello {{input.name}}" }
//!   - actionName: log
//!     params: { message: "{{globals.greeting}}" }
//! "#)?;
//! let definition = bundle.get("default").expect("default workflow");
//!
//! let context = ExternalContext::builder().input(json!({ "name": "ada" })).build();
//! let last_result = run_workflow(definition, &context).await?;
//! assert_eq!(last_result, Some(json!("hello ada")));
//! # Ok::<(), anyhow::Error>(())
//! # })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`resolve`**: path resolution, template interpolation, and condition evaluation
//! - **`templates`**: placeholder extraction and unresolved-reference diagnostics
//! - **`action`**: the action registry and the built-in catalog
//! - **`context`**: the caller-supplied external context and its capabilities
//! - **`workflow`**: document loading, validation, and the sequential runner
//! - **`config`**: file-backed tunables for built-ins and nesting

pub mod action;
pub mod config;
pub mod context;
pub mod error;
pub mod resolve;
pub mod templates;
pub mod workflow;

pub use action::{ActionHandler, ActionRegistry, BuiltInOptions, FnAction, global_registry, init_global_registry};
pub use cadence_types::{RunReport, StepRecord, StepStatus, WorkflowBundle, WorkflowDefinition, WorkflowStep};
pub use config::{ConfigError, EngineConfig};
pub use context::{ExternalContext, ExternalContextBuilder, Navigator, Notifier, WorkflowInvoker};
pub use error::{ActionError, RunError};
pub use resolve::{ExecutionContext, TemplateScope, eval_condition, interpolate_value, resolve_path};
pub use workflow::{
    ValidationIssue, WorkflowRunner, parse_workflow_file, parse_workflow_str, run_workflow, validate_workflow,
};
