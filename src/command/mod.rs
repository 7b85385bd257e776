mod actions;
mod info;
mod run;

use chrono::{DateTime, Utc};
use tracing::debug;

use hostkit::app::{ApplicationHandle, Host};
use hostkit::boot_record::{BootRecordAction, BootRecordStore};
use hostkit::config::AppConfig;
use hostkit::startup::{FnAction, ResolveError, ServiceProvider};

use crate::cli::Cli;

pub use actions::run_actions;
pub use info::run_info;
pub use run::run_app;

/// Time at which service configuration ran.
pub struct StartedAt(pub DateTime<Utc>);

/// Host with the built-in startup actions and configurators.
pub fn default_host(cli: &Cli) -> Host {
    let mut host = Host::setup(&cli.app_name, env!("CARGO_PKG_VERSION"));
    // clap already settled flag over HOSTKIT_APP_NAME.
    host.config_mut().name = cli.app_name.clone();
    if cli.cli {
        host.config_mut().run_in_cli = true;
    }

    // Without a usable cache dir the boot-record action is skipped.
    let cache_dir = cli.cache_dir.clone();
    host.provider().provide_factory(move |_| {
        BootRecordStore::new(cache_dir.clone())
            .map_err(ResolveError::construct::<BootRecordStore>)
    });

    host.actions_mut()
        .register_one(|p: &ServiceProvider| {
            let config = p.resolve::<AppConfig>()?;
            Ok(FnAction::new("environment", move || {
                debug!(
                    "Environment: name={}, version={}, cli={}",
                    config.name, config.version, config.run_in_cli
                );
                Ok(())
            }))
        })
        .name("environment");

    host.actions_mut()
        .register_one(|p: &ServiceProvider| {
            let store = p.resolve::<BootRecordStore>()?;
            let config = p.resolve::<AppConfig>()?;
            Ok(BootRecordAction::new((*store).clone(), config.version.clone()))
        })
        .name("boot-record")
        .last();

    host.configure("started-at", |app| {
        app.service_provider().provide(StartedAt(Utc::now()));
        Ok(())
    });

    host
}
