//! Host environment setup and application build.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use super::CliApplication;
use crate::config::AppConfig;
use crate::configure::Configurator;
use crate::startup::{ActionRegistry, ServiceProvider, StartupError, StartupOrchestrator};

/// Collects startup actions and service configurators, then builds the application.
///
/// # Example
/// ```ignore
/// let mut host = Host::setup("orders", env!("CARGO_PKG_VERSION"));
/// host.actions_mut().register_fn("migrate", run_migrations).priority(1);
/// host.configure("routes", |app| register_routes(app));
///
/// let app = host.build()?;
/// app.configure_service()?;
/// ```
pub struct Host {
    config: AppConfig,
    provider: Arc<ServiceProvider>,
    actions: ActionRegistry,
    configurators: Vec<Configurator<CliApplication>>,
    reinject: bool,
}

impl Host {
    /// Set up a host for `app_name`, applying environment overrides.
    pub fn setup(app_name: &str, version: &str) -> Self {
        Self::with_config(AppConfig::new(app_name, version).apply_env())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            provider: Arc::new(ServiceProvider::new()),
            actions: ActionRegistry::new(),
            configurators: Vec::new(),
            reinject: false,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    /// Provider shared with startup actions and the built application.
    pub fn provider(&self) -> &Arc<ServiceProvider> {
        &self.provider
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut ActionRegistry {
        &mut self.actions
    }

    /// Queue a service configurator for the application.
    pub fn configure<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&CliApplication) -> Result<()> + Send + Sync + 'static,
    {
        self.configurators.push(Configurator::named(name, f));
        self
    }

    /// Re-inject dependencies into each startup action right before it runs.
    pub fn reinject_before_run(&mut self, enabled: bool) -> &mut Self {
        self.reinject = enabled;
        self
    }

    /// Run the startup actions and return the application.
    ///
    /// The application config is provided to actions as `AppConfig`.
    pub fn build(self) -> Result<Arc<CliApplication>, StartupError> {
        self.provider.provide(self.config.clone());

        let mut orchestrator = StartupOrchestrator::new(self.provider.clone())
            .quiet(self.config.run_in_cli)
            .with_reinjection(self.reinject);
        let resolved = orchestrator.init(&self.actions)?;
        orchestrator.run()?;

        let app = Arc::new(CliApplication::new(self.config, self.provider));
        app.add_configurators(self.configurators);

        if !app.config().run_in_cli {
            info!(
                "Application {} {} built ({} startup actions)",
                app.config().name,
                app.config().version,
                resolved
            );
        }
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ApplicationHandle;
    use crate::startup::FnAction;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn host() -> Host {
        Host::with_config(AppConfig::new("orders", "1.0.0").with_run_in_cli(true))
    }

    #[test]
    fn test_build_runs_startup_actions_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut host = host();
        for (name, priority) in [("cache", 20), ("db", 10), ("record", 1)] {
            let order = order.clone();
            let info = host
                .actions_mut()
                .register_fn(name, move || {
                    order.lock().unwrap().push(name);
                    Ok(())
                })
                .priority(priority);
            if name == "record" {
                info.last();
            }
        }

        host.build().unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["db", "cache", "record"]);
    }

    #[test]
    fn test_actions_can_resolve_app_config() {
        let seen = Arc::new(Mutex::new(String::new()));
        let mut host = host();
        let sink = seen.clone();
        host.actions_mut().register_one(move |p: &ServiceProvider| {
            let config = p.resolve::<AppConfig>()?;
            let sink = sink.clone();
            Ok(FnAction::new("read-config", move || {
                *sink.lock().unwrap() = config.name.clone();
                Ok(())
            }))
        });

        host.build().unwrap();
        assert_eq!(*seen.lock().unwrap(), "orders");
    }

    #[test]
    fn test_build_fails_when_action_fails() {
        let mut host = host();
        host.actions_mut()
            .register_fn("broken", || anyhow::bail!("disk full"));

        let err = host.build().err().unwrap();
        assert!(matches!(err, StartupError::ActionFailed { .. }));
    }

    #[test]
    fn test_configurators_move_to_application() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut host = host();
        for name in ["a", "b", "c"] {
            let calls = calls.clone();
            host.configure(name, move |app| {
                assert_eq!(app.name(), "orders");
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let app = host.build().unwrap();
        app.configure_service().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        app.configure_service().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_reinject_before_run() {
        use crate::startup::{ResolveError, StartupAction};

        struct Limit(u32);

        struct CheckLimit {
            limit: u32,
        }

        impl StartupAction for CheckLimit {
            fn inject(&mut self, provider: &ServiceProvider) -> Result<(), ResolveError> {
                self.limit = provider.resolve::<Limit>()?.0;
                Ok(())
            }

            fn run(&mut self) -> Result<()> {
                anyhow::ensure!(self.limit == 10, "limit was {}", self.limit);
                Ok(())
            }
        }

        let mut host = host();
        host.actions_mut()
            .register_one(|_: &ServiceProvider| Ok(CheckLimit { limit: 0 }));
        host.provider().provide(Limit(10));

        host.reinject_before_run(true);
        assert!(host.build().is_ok());

        let mut host = self::host();
        host.actions_mut()
            .register_one(|_: &ServiceProvider| Ok(CheckLimit { limit: 0 }));
        host.provider().provide(Limit(10));

        let err = host.build().err().unwrap();
        assert!(matches!(err, StartupError::ActionFailed { .. }));
    }

    #[test]
    fn test_provider_is_shared_with_application() {
        let host = host();
        host.provider().provide(7u8);
        let app = host.build().unwrap();

        assert_eq!(*app.service_provider().resolve::<u8>().unwrap(), 7);
        assert!(app.service_provider().contains::<AppConfig>());
    }
}
