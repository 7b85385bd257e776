use anyhow::{Context, Result};
use tracing::debug;

use hostkit::app::{ApplicationHandle, Host};
use hostkit::boot_record::BootRecordStore;
use hostkit::runtime;

use super::StartedAt;

pub async fn run_app(host: Host, wait: bool) -> Result<()> {
    let app = host.build().context("Startup failed")?;
    runtime::set_application(app.clone());

    app.configure_service()?;

    if wait {
        tokio::spawn(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Trapped interrupt signal");
                if let Some(app) = runtime::application() {
                    app.shutdown();
                }
            }
        });

        println!(
            "{} {} is running. Press Ctrl-C to stop.",
            app.name(),
            app.version()
        );
        app.wait_for_shutdown().await;
        println!("Stopped.");
        return Ok(());
    }

    app.run(|app| {
        let provider = app.service_provider();
        let started_at = provider.resolve::<StartedAt>()?;
        let boots = provider
            .resolve::<BootRecordStore>()
            .ok()
            .and_then(|store| store.read().ok());

        println!("✅ {} {} started", app.name(), app.version());
        println!("   Instance: {}", app.instance_id());
        println!("   Configured at: {}", started_at.0.to_rfc3339());
        if let Some(boots) = boots {
            println!("   Boot count: {}", boots.boot_count);
        }
        Ok(())
    })
}
