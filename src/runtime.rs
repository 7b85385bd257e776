//! Process-wide access to the built application.
//!
//! Library code receives the application explicitly. This slot exists for the
//! binary's signal listener and other places that only run once per process:
//!
//! ```ignore
//! // After build:
//! let app = host.build()?;
//! set_application(app.clone());
//!
//! // Anywhere else:
//! if let Some(app) = application() {
//!     app.shutdown();
//! }
//! ```

use std::sync::{Arc, OnceLock};

use crate::app::CliApplication;

static APPLICATION: OnceLock<Arc<CliApplication>> = OnceLock::new();

/// Publish the application for the rest of the process.
///
/// Only the first call wins; later calls are ignored with a warning.
pub fn set_application(app: Arc<CliApplication>) {
    if APPLICATION.set(app).is_err() {
        tracing::warn!("Application is already set for this process. Keeping existing.");
    }
}

/// The published application, if any.
pub fn application() -> Option<&'static Arc<CliApplication>> {
    APPLICATION.get()
}

pub fn has_application() -> bool {
    APPLICATION.get().is_some()
}
