//! Caller-supplied external context.
//!
//! The [`ExternalContext`] is handed unchanged to every action invocation. It is a cheap handle:
//! clones share the same data store and capabilities, so writes made by one action (for example
//! `setVar`) are visible to later steps and to the caller once the run returns.
//!
//! The data store is an open JSON object. By convention the keys `input`, `globals`, and `user`
//! seed the run's [`ExecutionContext`](crate::resolve::ExecutionContext).

use std::{fmt, sync::Arc};

use cadence_types::{WorkflowBundle, WorkflowDefinition};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::{error::RunError, resolve::ExecutionContext, resolve::resolve_path};

/// Routing capability used by the `navigate` action.
#[async_trait::async_trait]
pub trait Navigator: Send + Sync {
    /// Navigates to `target` and returns a routing result.
    async fn navigate(&self, target: &Value) -> anyhow::Result<Value>;
}

/// Notification sink used by the `showToast` action.
pub trait Notifier: Send + Sync {
    /// Presents a message to the user.
    fn notify(&self, message: &str);
}

/// Nested-run capability used by the `callWorkflow` action.
#[async_trait::async_trait]
pub trait WorkflowInvoker: Send + Sync {
    /// Runs `definition` against `context` and returns its final `lastResult`.
    async fn run_nested(&self, definition: WorkflowDefinition, context: ExternalContext) -> Result<Option<Value>, RunError>;
}

/// Shared, caller-owned state and capabilities passed to every action.
#[derive(Clone, Default)]
pub struct ExternalContext {
    data: Arc<RwLock<Map<String, Value>>>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
    workflow_invoker: Option<Arc<dyn WorkflowInvoker>>,
    catalog: Option<Arc<WorkflowBundle>>,
    cancellation: Option<CancellationToken>,
    input_override: Option<Value>,
    depth: usize,
    max_nesting_depth: Option<usize>,
}

impl ExternalContext {
    /// Creates an empty context with no capabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a context.
    pub fn builder() -> ExternalContextBuilder {
        ExternalContextBuilder::default()
    }

    /// Reads a dotted path from the data store.
    pub async fn get(&self, path: &str) -> Option<Value> {
        let data = self.data.read().await;
        match path.split_once('.') {
            Some((head, rest)) => resolve_path(data.get(head)?, rest).cloned(),
            None => data.get(path).cloned(),
        }
    }

    /// Writes `value` at a dotted path, creating intermediate objects as needed.
    pub async fn set(&self, path: &str, value: Value) {
        let mut data = self.data.write().await;
        assign_path(&mut data, path, value);
    }

    /// Returns a copy of the whole data store.
    pub async fn snapshot(&self) -> Value {
        Value::Object(self.data.read().await.clone())
    }

    /// Returns the current `globals` object, or an empty object.
    pub async fn globals(&self) -> Value {
        self.data
            .read()
            .await
            .get("globals")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Builds a fresh execution context from the `input`, `globals`, and `user` seeds.
    ///
    /// A nested context created by [`ExternalContext::nested`] with an explicit input uses that
    /// input instead of the shared one.
    pub async fn seed_execution_context(&self) -> ExecutionContext {
        let data = self.data.read().await;
        let field = |key: &str| data.get(key).cloned().unwrap_or(Value::Null);
        let input = self.input_override.clone().unwrap_or_else(|| field("input"));
        ExecutionContext::new(input, field("globals"), field("user"))
    }

    /// Derives the context for a nested run: same data and capabilities, one level deeper.
    pub fn nested(&self, input: Option<Value>) -> Self {
        let mut child = self.clone();
        child.depth = self.depth + 1;
        if input.is_some() {
            child.input_override = input;
        }
        child
    }

    /// Routing capability, if supplied.
    pub fn navigator(&self) -> Option<&Arc<dyn Navigator>> {
        self.navigator.as_ref()
    }

    /// Notification sink, if supplied.
    pub fn notifier(&self) -> Option<&Arc<dyn Notifier>> {
        self.notifier.as_ref()
    }

    /// Nested-run capability, if supplied.
    pub fn workflow_invoker(&self) -> Option<&Arc<dyn WorkflowInvoker>> {
        self.workflow_invoker.as_ref()
    }

    /// Named workflows available to `callWorkflow`.
    pub fn catalog(&self) -> Option<&Arc<WorkflowBundle>> {
        self.catalog.as_ref()
    }

    /// Returns true once the cancellation token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Nesting depth; zero for a top-level run.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Maximum nesting depth for `callWorkflow`, if limited.
    pub fn max_nesting_depth(&self) -> Option<usize> {
        self.max_nesting_depth
    }

    /// Returns true when both handles point at the same data store.
    pub fn shares_data_with(&self, other: &ExternalContext) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for ExternalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalContext")
            .field("has_navigator", &self.navigator.is_some())
            .field("has_notifier", &self.notifier.is_some())
            .field("has_workflow_invoker", &self.workflow_invoker.is_some())
            .field("catalog_size", &self.catalog.as_ref().map(|catalog| catalog.workflows.len()))
            .field("depth", &self.depth)
            .field("max_nesting_depth", &self.max_nesting_depth)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ExternalContext`].
#[derive(Default)]
pub struct ExternalContextBuilder {
    data: Map<String, Value>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
    workflow_invoker: Option<Arc<dyn WorkflowInvoker>>,
    catalog: Option<Arc<WorkflowBundle>>,
    cancellation: Option<CancellationToken>,
    max_nesting_depth: Option<usize>,
}

impl ExternalContextBuilder {
    /// Sets the read-only `input` seed.
    pub fn input(self, input: Value) -> Self {
        self.data("input", input)
    }

    /// Sets the shared `globals` object.
    pub fn globals(self, globals: Value) -> Self {
        self.data("globals", globals)
    }

    /// Sets the `user` identity object.
    pub fn user(self, user: Value) -> Self {
        self.data("user", user)
    }

    /// Stores arbitrary caller data under `key`.
    pub fn data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Supplies the routing capability.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Supplies the notification sink.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Supplies the nested-run capability.
    pub fn workflow_invoker(mut self, invoker: Arc<dyn WorkflowInvoker>) -> Self {
        self.workflow_invoker = Some(invoker);
        self
    }

    /// Supplies named workflows for `callWorkflow`.
    pub fn catalog(mut self, catalog: Arc<WorkflowBundle>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Supplies a cancellation token checked between steps.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Limits `callWorkflow` nesting. `None` leaves nesting unbounded.
    pub fn max_nesting_depth(mut self, limit: Option<usize>) -> Self {
        self.max_nesting_depth = limit;
        self
    }

    /// Finishes the context.
    pub fn build(self) -> ExternalContext {
        ExternalContext {
            data: Arc::new(RwLock::new(self.data)),
            navigator: self.navigator,
            notifier: self.notifier,
            workflow_invoker: self.workflow_invoker,
            catalog: self.catalog,
            cancellation: self.cancellation,
            input_override: None,
            depth: 0,
            max_nesting_depth: self.max_nesting_depth,
        }
    }
}

/// Writes `value` at a dotted path inside `root`.
///
/// Missing intermediate keys are created as objects; intermediate values that are not objects
/// are replaced by objects.
pub fn assign_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    let keys: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = keys.split_last() else {
        return;
    };

    let mut current = root;
    for key in parents {
        let entry = current.entry(*key).or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Some(map) = entry.as_object_mut() else {
            return;
        };
        current = map;
    }
    current.insert((*last).to_string(), value);
}
