//! Resolves registered startup actions and runs them in priority order.
//!
//! ```text
//! ActionRegistry ──init()──▶ construct each descriptor (skip failures)
//!                 ──run()───▶ begin trace → [inject] → action.run() → finish trace
//! ```
//!
//! Actions run one at a time on the calling thread. A later action may rely on
//! state set up by an earlier one, which is the whole point of priorities.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::action::StartupAction;
use super::provider::{ResolveError, ServiceProvider};
use super::registry::ActionRegistry;

/// Errors that abort the startup sequence.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("startup orchestrator is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: OrchestratorState,
        actual: OrchestratorState,
    },

    #[error("startup action '{name}' failed: {source}")]
    ActionFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to inject dependencies into startup action '{name}': {source}")]
    Injection {
        name: String,
        #[source]
        source: ResolveError,
    },
}

/// Lifecycle of an orchestrator. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Created,
    Initialized,
    Ran,
}

struct ResolvedAction {
    name: String,
    action: Box<dyn StartupAction>,
}

/// Runs startup actions exactly once, in priority order.
pub struct StartupOrchestrator {
    provider: Arc<ServiceProvider>,
    actions: Vec<ResolvedAction>,
    state: OrchestratorState,
    quiet: bool,
    reinject: bool,
}

impl StartupOrchestrator {
    pub fn new(provider: Arc<ServiceProvider>) -> Self {
        Self {
            provider,
            actions: Vec::new(),
            state: OrchestratorState::Created,
            quiet: false,
            reinject: false,
        }
    }

    /// Suppress begin/finish trace lines (non-interactive CLI runs).
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Call [`StartupAction::inject`] on every action right before it runs.
    pub fn with_reinjection(mut self, enabled: bool) -> Self {
        self.reinject = enabled;
        self
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Names of the resolved actions in execution order.
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }

    /// Construct every registered action.
    ///
    /// Actions whose dependencies cannot be resolved are logged and left out;
    /// the rest keep their relative order. Returns the number of actions that
    /// will run.
    pub fn init(&mut self, registry: &ActionRegistry) -> Result<usize, StartupError> {
        self.expect_state(OrchestratorState::Created)?;

        for descriptor in registry.iter() {
            match descriptor.construct(&self.provider) {
                Ok(action) => {
                    // A name set through the registry wins over the action's own.
                    let name = match action.name() {
                        own if !own.is_empty() && !descriptor.is_named() => own.to_string(),
                        _ => descriptor.name().to_string(),
                    };
                    debug!(
                        "Resolved startup action {} (priority {})",
                        name,
                        descriptor.priority()
                    );
                    self.actions.push(ResolvedAction { name, action });
                }
                Err(e) => {
                    warn!("Skipping startup action {}: {}", descriptor.name(), e);
                }
            }
        }

        self.state = OrchestratorState::Initialized;
        Ok(self.actions.len())
    }

    /// Run every resolved action in order.
    ///
    /// The first failure stops the sequence and is returned; actions after it
    /// never run. Panics inside an action are not caught.
    pub fn run(&mut self) -> Result<(), StartupError> {
        self.expect_state(OrchestratorState::Initialized)?;
        self.state = OrchestratorState::Ran;

        for resolved in self.actions.iter_mut() {
            if !self.quiet {
                info!("begin run startup action, {}", resolved.name);
            }

            if self.reinject {
                resolved
                    .action
                    .inject(&self.provider)
                    .map_err(|source| StartupError::Injection {
                        name: resolved.name.clone(),
                        source,
                    })?;
            }

            resolved
                .action
                .run()
                .map_err(|source| StartupError::ActionFailed {
                    name: resolved.name.clone(),
                    source,
                })?;

            if !self.quiet {
                info!("finish run startup action, {}", resolved.name);
            }
        }

        Ok(())
    }

    fn expect_state(&self, expected: OrchestratorState) -> Result<(), StartupError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(StartupError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }
}
