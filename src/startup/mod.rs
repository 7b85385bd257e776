//! Startup actions: registration, ordering, dependency resolution and execution.
//!
//! The flow during bootstrap:
//! - register action constructors on an [`ActionRegistry`] (priority, name, last)
//! - [`StartupOrchestrator::init`] constructs each one through the [`ServiceProvider`]
//! - [`StartupOrchestrator::run`] executes them in priority order, once
//!
//! Failing construction drops the action; failing execution aborts startup.

mod action;
mod orchestrator;
mod provider;
mod registry;


pub use action::{ActionDescriptor, FnAction, StartupAction, LAST_PRIORITY};
pub use orchestrator::{OrchestratorState, StartupError, StartupOrchestrator};
pub use provider::{ResolveError, ServiceProvider};
pub use registry::{ActionHandle, ActionInfo, ActionRegistry};
