//! Host bootstrap: ordered startup actions and one-shot service configuration.
//!
//! - [`startup`]: register actions with priorities, resolve them through a
//!   typed [`ServiceProvider`](startup::ServiceProvider), run them once in order
//! - [`configure`]: a gate that runs service configurators at most once
//! - [`app`]: the [`Host`](app::Host) builder and the resulting application

pub mod app;
pub mod boot_record;
pub mod config;
pub mod configure;
pub mod runtime;
pub mod startup;

pub use app::{ApplicationHandle, CliApplication, Host};
pub use config::AppConfig;
pub use configure::{ConfigurationGate, Configurator};
pub use startup::{
    ActionRegistry, ServiceProvider, StartupAction, StartupError, StartupOrchestrator,
    LAST_PRIORITY,
};
