//! Service configuration that runs once per process.

mod gate;

pub use gate::{ConfigurationGate, Configurator};
