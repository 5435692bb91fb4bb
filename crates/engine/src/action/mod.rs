//! Action registry: the name → handler table the runner dispatches through.
//!
//! - [`ActionHandler`] is the capability every action implements
//! - [`ActionRegistry`] maps names to handlers; registration overwrites silently
//! - [`global_registry`] is the process-wide registry, populated with the built-in catalog on
//!   first use
//!
//! Callers extend the catalog by registering trait objects or plain async closures before a run:
//!
//! ```rust
//! use cadence_engine::action::ActionRegistry;
//! use serde_json::{Value, json};
//!
//! let registry = ActionRegistry::new();
//! registry.register_fn("echo", |_name, params: Value, _context| async move { Ok(params) });
//! assert!(registry.contains("echo"));
//! assert!(registry.get("missing").is_none());
//! ```

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{context::ExternalContext, error::ActionError};

pub mod builtin;

/// Default timeout applied to `httpRequest` calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Default sleep for `wait` when `ms` is omitted.
pub const DEFAULT_WAIT: Duration = Duration::from_millis(300);

/// A named unit of behavior invoked by a workflow step.
#[async_trait::async_trait]
pub trait ActionHandler: Send + Sync {
    /// Executes the action with already-interpolated parameters.
    ///
    /// `context` is the caller's external context, passed through untouched by the runner.
    async fn invoke(&self, action_name: &str, params: Value, context: &ExternalContext) -> Result<Value, ActionError>;
}

/// Adapts an async closure into an [`ActionHandler`].
pub struct FnAction<F> {
    handler: F,
}

impl<F> FnAction<F> {
    /// Wraps `handler`.
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait::async_trait]
impl<F, Fut> ActionHandler for FnAction<F>
where
    F: Fn(String, Value, ExternalContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ActionError>> + Send + 'static,
{
    async fn invoke(&self, action_name: &str, params: Value, context: &ExternalContext) -> Result<Value, ActionError> {
        (self.handler)(action_name.to_string(), params, context.clone()).await
    }
}

/// Settings the built-in actions are constructed with.
#[derive(Debug, Clone)]
pub struct BuiltInOptions {
    /// Client used by `httpRequest`.
    pub http_client: reqwest::Client,
    /// Sleep used by `wait` when `ms` is omitted.
    pub default_wait: Duration,
}

impl BuiltInOptions {
    /// Builds options with a client using the given timeout and user agent.
    ///
    /// A user agent the client rejects is dropped with a warning; the timeout is kept.
    pub fn new(http_timeout: Duration, user_agent: &str, default_wait: Duration) -> Self {
        let http_client = match reqwest::Client::builder()
            .timeout(http_timeout)
            .user_agent(user_agent)
            .build()
        {
            Ok(client) => client,
            Err(error) => {
                warn!(%error, user_agent, "invalid http client settings; falling back to the default user agent");
                reqwest::Client::builder()
                    .timeout(http_timeout)
                    .build()
                    .unwrap_or_default()
            }
        };
        Self {
            http_client,
            default_wait,
        }
    }
}

impl Default for BuiltInOptions {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT, default_user_agent().as_str(), DEFAULT_WAIT)
    }
}

/// User agent sent by `httpRequest` unless configured otherwise.
pub fn default_user_agent() -> String {
    format!("cadence/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS)
}

/// Name → handler table.
///
/// Lookups and registrations may happen from any thread. Re-registering a name replaces the
/// previous handler.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn ActionHandler>>>,
    built_ins_registered: AtomicBool,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the built-in catalog.
    pub fn with_built_ins(options: BuiltInOptions) -> Self {
        let registry = Self::new();
        registry.register_built_ins(options);
        registry
    }

    /// Inserts or replaces the handler for `name`.
    pub fn register(&self, name: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        let name = name.into();
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if handlers.insert(name.clone(), handler).is_some() {
            debug!(action = %name, "replaced registered action");
        }
    }

    /// Registers an async closure as a handler.
    pub fn register_fn<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(String, Value, ExternalContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ActionError>> + Send + 'static,
    {
        self.register(name, Arc::new(FnAction::new(handler)));
    }

    /// Looks up the handler for `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner).get(name).cloned()
    }

    /// Returns true when a handler is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner).contains_key(name)
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Registers the built-in catalog once per registry.
    ///
    /// Returns `false` when the built-ins were already registered; in that case nothing changes,
    /// so handlers a caller registered over a built-in name are kept.
    pub fn register_built_ins(&self, options: BuiltInOptions) -> bool {
        if self.built_ins_registered.swap(true, Ordering::SeqCst) {
            debug!("built-in actions already registered");
            return false;
        }
        builtin::register_all(self, options);
        true
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry").field("actions", &self.names()).finish()
    }
}

static GLOBAL_REGISTRY: OnceCell<Arc<ActionRegistry>> = OnceCell::new();

/// Initializes the process-wide registry with explicit built-in options.
///
/// Returns `false` when the registry already exists (initialized earlier or created lazily by
/// [`global_registry`]); the given options are then ignored.
pub fn init_global_registry(options: BuiltInOptions) -> bool {
    let mut created = false;
    GLOBAL_REGISTRY.get_or_init(|| {
        created = true;
        Arc::new(ActionRegistry::with_built_ins(options))
    });
    created
}

/// Process-wide registry, created with default built-in options on first use.
pub fn global_registry() -> Arc<ActionRegistry> {
    Arc::clone(GLOBAL_REGISTRY.get_or_init(|| Arc::new(ActionRegistry::with_built_ins(BuiltInOptions::default()))))
}
