//! Startup action contract and descriptors.

use std::any::type_name;
use std::fmt;

use anyhow::Result;

use super::provider::{ResolveError, ServiceProvider};

/// Priority that pushes an action behind every normally prioritized action.
pub const LAST_PRIORITY: i32 = 9999;

/// A unit of initialization logic executed once during bootstrap.
///
/// Errors returned from [`run`](StartupAction::run) are fatal for the
/// bootstrap: the orchestrator stops and reports them.
pub trait StartupAction: Send {
    /// Display name used in trace lines. Empty unless overridden.
    fn name(&self) -> &str {
        ""
    }

    /// Refresh dependencies on an already constructed action.
    ///
    /// Only called when the orchestrator has re-injection enabled.
    fn inject(&mut self, _provider: &ServiceProvider) -> Result<(), ResolveError> {
        Ok(())
    }

    fn run(&mut self) -> Result<()>;
}

/// Startup action backed by a plain closure.
pub struct FnAction {
    name: String,
    run_fn: Option<Box<dyn FnMut() -> Result<()> + Send>>,
}

impl FnAction {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        Self {
            name: name.into(),
            run_fn: Some(Box::new(f)),
        }
    }

    /// An action with nothing to run.
    pub fn noop(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run_fn: None,
        }
    }
}

impl StartupAction for FnAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self) -> Result<()> {
        match self.run_fn.as_mut() {
            Some(f) => f(),
            None => Ok(()),
        }
    }
}

pub(crate) type Constructor =
    Box<dyn Fn(&ServiceProvider) -> Result<Box<dyn StartupAction>, ResolveError> + Send + Sync>;

/// Registration record for a startup action.
pub struct ActionDescriptor {
    pub(crate) id: u64,
    pub(crate) name: String,
    /// Set once the name was assigned through the registry.
    pub(crate) named: bool,
    pub(crate) priority: i32,
    pub(crate) constructor: Constructor,
}

impl ActionDescriptor {
    pub(crate) fn new<A, F>(id: u64, constructor: F) -> Self
    where
        A: StartupAction + 'static,
        F: Fn(&ServiceProvider) -> Result<A, ResolveError> + Send + Sync + 'static,
    {
        Self {
            id,
            name: type_name::<A>().to_string(),
            named: false,
            priority: 0,
            constructor: Box::new(move |provider: &ServiceProvider| {
                constructor(provider).map(|action| Box::new(action) as Box<dyn StartupAction>)
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the name was assigned explicitly rather than taken from the type.
    pub fn is_named(&self) -> bool {
        self.named
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_last(&self) -> bool {
        self.priority >= LAST_PRIORITY
    }

    /// Build the action, resolving its dependencies from `provider`.
    pub fn construct(
        &self,
        provider: &ServiceProvider,
    ) -> Result<Box<dyn StartupAction>, ResolveError> {
        (self.constructor)(provider)
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("named", &self.named)
            .field("priority", &self.priority)
            .finish()
    }
}
