//! The built application object.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use super::ApplicationHandle;
use crate::config::AppConfig;
use crate::configure::{ConfigurationGate, Configurator};
use crate::startup::ServiceProvider;

/// Application produced by [`Host::build`](super::Host::build).
pub struct CliApplication {
    instance_id: Uuid,
    config: AppConfig,
    provider: Arc<ServiceProvider>,
    gate: ConfigurationGate<CliApplication>,
    shutdown: AtomicBool,
    shutdown_complete: watch::Sender<bool>,
}

impl CliApplication {
    pub(crate) fn new(config: AppConfig, provider: Arc<ServiceProvider>) -> Self {
        let (shutdown_complete, _) = watch::channel(false);
        Self {
            instance_id: Uuid::new_v4(),
            config,
            provider,
            gate: ConfigurationGate::new(),
            shutdown: AtomicBool::new(false),
            shutdown_complete,
        }
    }

    /// Unique id of this application instance.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Add a service configurator. Has no effect once configuration ran.
    pub fn add_configurator(&self, configurator: Configurator<CliApplication>) {
        self.gate.register(configurator);
    }

    pub(crate) fn add_configurators(&self, configurators: Vec<Configurator<CliApplication>>) {
        self.gate.register_many(configurators);
    }

    /// Run the registered service configurators.
    ///
    /// Safe to call from any number of places; only the first call does work.
    pub fn configure_service(&self) -> Result<()> {
        self.gate.fire(self)
    }

    pub fn is_configured(&self) -> bool {
        self.gate.has_fired()
    }

    /// Run the root command, then shut down whether it succeeded or not.
    pub fn run<F>(&self, root: F) -> Result<()>
    where
        F: FnOnce(&CliApplication) -> Result<()>,
    {
        let result = root(self);
        self.shutdown();
        result
    }

    /// Mark the application as shut down and wake up waiters. Idempotent.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        if !self.config.run_in_cli {
            debug!("Initiating shutdown...");
        }
        self.shutdown_complete.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Wait until [`shutdown`](Self::shutdown) has completed.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown_complete.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|done| *done).await;
    }
}

impl ApplicationHandle for CliApplication {
    fn is_run_in_cli(&self) -> bool {
        self.config.run_in_cli
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn version(&self) -> &str {
        &self.config.version
    }

    fn service_provider(&self) -> &Arc<ServiceProvider> {
        &self.provider
    }
}
