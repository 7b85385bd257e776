//! Application lifecycle around the startup core.
//!
//! ```text
//! Host::setup ─▶ register actions / configurators ─▶ Host::build
//!     build: provide config → run startup actions → CliApplication
//! CliApplication::configure_service ─▶ configuration gate (once)
//! CliApplication::run ─▶ root command ─▶ shutdown
//! ```

mod application;
mod host;

use std::sync::Arc;

use crate::startup::ServiceProvider;

pub use application::CliApplication;
pub use host::Host;

/// What configurators and other collaborators can see of the running application.
pub trait ApplicationHandle: Send + Sync {
    /// Non-interactive CLI runs suppress progress trace lines.
    fn is_run_in_cli(&self) -> bool;

    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn service_provider(&self) -> &Arc<ServiceProvider>;
}
