//! One-shot execution barrier over service configurators.

use std::any::type_name;
use std::fmt;
use std::sync::{Arc, Mutex, Once, PoisonError};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::app::ApplicationHandle;

type ConfigureFn<A> = dyn Fn(&A) -> Result<()> + Send + Sync;

/// A named configuration callback.
pub struct Configurator<A> {
    name: String,
    f: Arc<ConfigureFn<A>>,
}

impl<A> Configurator<A> {
    /// Wrap a callback, naming it after its type.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&A) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: type_name::<F>().to_string(),
            f: Arc::new(f),
        }
    }

    pub fn named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&A) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<A> Clone for Configurator<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            f: self.f.clone(),
        }
    }
}

impl<A> fmt::Debug for Configurator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configurator")
            .field("name", &self.name)
            .finish()
    }
}

/// Runs its registered configurators at most once.
///
/// Any number of threads may call [`fire`](ConfigurationGate::fire). The first
/// caller runs the list; concurrent callers wait for it to finish, later ones
/// return immediately. Configurators registered after the gate fired are kept
/// but never run.
pub struct ConfigurationGate<A> {
    configurators: Mutex<Vec<Configurator<A>>>,
    once: Once,
}

impl<A> Default for ConfigurationGate<A> {
    fn default() -> Self {
        Self {
            configurators: Mutex::new(Vec::new()),
            once: Once::new(),
        }
    }
}

impl<A: ApplicationHandle> ConfigurationGate<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, configurator: Configurator<A>) {
        if self.has_fired() {
            debug!(
                "Configuration already ran, {} will not be executed",
                configurator.name()
            );
        }
        self.lock().push(configurator);
    }

    pub fn register_fn<F>(&self, name: &str, f: F)
    where
        F: Fn(&A) -> Result<()> + Send + Sync + 'static,
    {
        self.register(Configurator::named(name, f));
    }

    pub fn register_many<I>(&self, configurators: I)
    where
        I: IntoIterator<Item = Configurator<A>>,
    {
        for configurator in configurators {
            self.register(configurator);
        }
    }

    /// Run every configurator in registration order, the first time only.
    ///
    /// A failing configurator stops the ones after it. Its error goes to the
    /// caller that fired the gate; the gate counts as fired either way. A
    /// panicking configurator poisons the gate and later calls panic too.
    pub fn fire(&self, app: &A) -> Result<()> {
        let mut outcome = Ok(());
        self.once.call_once(|| {
            // Snapshot so configurators can register more without deadlocking.
            let configurators = self.lock().clone();
            outcome = run_configurators(&configurators, app);
        });
        outcome
    }

    pub fn has_fired(&self) -> bool {
        self.once.is_completed()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Configurator<A>>> {
        self.configurators
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn run_configurators<A: ApplicationHandle>(
    configurators: &[Configurator<A>],
    app: &A,
) -> Result<()> {
    let quiet = app.is_run_in_cli();
    for configurator in configurators {
        if !quiet {
            info!("begin run service configurator, {}", configurator.name);
        }
        (configurator.f)(app)
            .with_context(|| format!("service configurator '{}' failed", configurator.name))?;
        if !quiet {
            info!("finish run service configurator, {}", configurator.name);
        }
    }
    Ok(())
}
