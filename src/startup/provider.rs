//! Typed service provider used to resolve startup action dependencies.
//!
//! Services are indexed by their concrete type. A service is either provided
//! as a ready instance or as a factory; factories run on first resolve and the
//! produced value is cached, so every later resolve sees the same `Arc`.
//!
//! ```ignore
//! let provider = ServiceProvider::new();
//! provider.provide(AppConfig::from_env());
//! provider.provide_factory(|p| {
//!     let config = p.resolve::<AppConfig>()?;
//!     Ok(Greeter::new(&config.name))
//! });
//!
//! let greeter = provider.resolve::<Greeter>()?;
//! ```

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

type SharedAny = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&ServiceProvider) -> Result<SharedAny, ResolveError> + Send + Sync>;

/// Errors raised while resolving a service or constructing a startup action.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Nothing was registered for the requested type
    #[error("no service registered for `{type_name}`")]
    Missing { type_name: &'static str },

    /// The factory for a type ended up requesting that same type
    #[error("dependency cycle detected while resolving `{type_name}`")]
    Cycle { type_name: &'static str },

    /// A factory or action constructor reported a failure
    #[error("failed to construct `{type_name}`: {source}")]
    Construct {
        type_name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ResolveError {
    /// Wrap an arbitrary failure as a construction error for `T`.
    pub fn construct<T: ?Sized>(source: impl Into<anyhow::Error>) -> Self {
        ResolveError::Construct {
            type_name: type_name::<T>(),
            source: source.into(),
        }
    }
}

enum Entry {
    Instance(SharedAny),
    Factory(Factory),
}

thread_local! {
    // Types whose factories are currently running on this thread.
    static RESOLVING: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

/// Marks a type as resolving on this thread until dropped, including on unwind.
struct ResolvingGuard(TypeId);

impl ResolvingGuard {
    fn enter(id: TypeId) -> Option<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&id) {
                return None;
            }
            stack.push(id);
            Some(Self(id))
        })
    }
}

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| stack.borrow_mut().retain(|t| *t != self.0));
    }
}

/// Capability-indexed service map.
///
/// Registration and resolution both take `&self`, so a provider can be shared
/// behind an `Arc` between the application and its startup actions.
#[derive(Default)]
pub struct ServiceProvider {
    entries: RwLock<HashMap<TypeId, Entry>>,
}

impl ServiceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ready instance, replacing any previous registration for `T`.
    pub fn provide<T: Send + Sync + 'static>(&self, value: T) {
        self.provide_arc(Arc::new(value));
    }

    /// Register an already shared instance.
    pub fn provide_arc<T: Send + Sync + 'static>(&self, value: Arc<T>) {
        debug!("Providing instance of {}", type_name::<T>());
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), Entry::Instance(value));
    }

    /// Register a lazily evaluated factory for `T`.
    pub fn provide_factory<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        debug!("Providing factory for {}", type_name::<T>());
        let factory: Factory = Arc::new(move |provider: &ServiceProvider| {
            factory(provider).map(|value| Arc::new(value) as SharedAny)
        });
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), Entry::Factory(factory));
    }

    /// Check whether anything is registered for `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve `T`, running its factory on first use.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        let id = TypeId::of::<T>();
        let name = type_name::<T>();

        // The lock is released before a factory runs so it can resolve its own
        // dependencies.
        let factory = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(&id) {
                Some(Entry::Instance(value)) => return downcast::<T>(value.clone()),
                Some(Entry::Factory(factory)) => factory.clone(),
                None => return Err(ResolveError::Missing { type_name: name }),
            }
        };

        let Some(_guard) = ResolvingGuard::enter(id) else {
            return Err(ResolveError::Cycle { type_name: name });
        };
        let produced = factory(self)?;

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have finished the same factory first; keep its value.
        let value = match entries.get(&id) {
            Some(Entry::Instance(existing)) => existing.clone(),
            _ => {
                debug!("Cached singleton {}", name);
                entries.insert(id, Entry::Instance(produced.clone()));
                produced
            }
        };
        drop(entries);

        downcast::<T>(value)
    }
}

fn downcast<T: Send + Sync + 'static>(value: SharedAny) -> Result<Arc<T>, ResolveError> {
    value
        .downcast::<T>()
        .map_err(|_| ResolveError::Missing {
            type_name: type_name::<T>(),
        })
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Port(u16);

    #[derive(Debug)]
    struct Listener {
        port: u16,
    }

    #[test]
    fn test_resolve_instance() {
        let provider = ServiceProvider::new();
        provider.provide(Port(8080));

        let port = provider.resolve::<Port>().unwrap();
        assert_eq!(*port, Port(8080));
        assert!(provider.contains::<Port>());
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_resolve_missing() {
        let provider = ServiceProvider::new();
        let err = provider.resolve::<Port>().unwrap_err();
        assert!(matches!(err, ResolveError::Missing { .. }));
        assert!(err.to_string().contains("Port"));
    }

    #[test]
    fn test_factory_resolves_dependencies_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ServiceProvider::new();
        provider.provide(Port(9000));

        let counter = calls.clone();
        provider.provide_factory(move |p| {
            counter.fetch_add(1, Ordering::SeqCst);
            let port = p.resolve::<Port>()?;
            Ok(Listener { port: port.0 })
        });

        let first = provider.resolve::<Listener>().unwrap();
        let second = provider.resolve::<Listener>().unwrap();
        assert_eq!(first.port, 9000);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_failure_is_not_cached() {
        let provider = ServiceProvider::new();
        provider.provide_factory(|p| {
            let port = p.resolve::<Port>()?;
            Ok(Listener { port: port.0 })
        });

        assert!(provider.resolve::<Listener>().is_err());

        provider.provide(Port(1));
        assert_eq!(provider.resolve::<Listener>().unwrap().port, 1);
    }

    #[test]
    fn test_cycle_detected() {
        let provider = ServiceProvider::new();
        provider.provide_factory(|p| {
            let _self_ref = p.resolve::<Listener>()?;
            Ok(Listener { port: 0 })
        });

        let err = provider.resolve::<Listener>().unwrap_err();
        assert!(matches!(err, ResolveError::Cycle { .. }));
    }

    #[test]
    fn test_panicking_factory_does_not_leave_false_cycle() {
        let provider = ServiceProvider::new();
        let calls = AtomicUsize::new(0);
        provider.provide_factory(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("listener socket unavailable");
            }
            Ok(Listener { port: 9000 })
        });

        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            provider.resolve::<Listener>()
        }));
        assert!(unwound.is_err());

        assert_eq!(provider.resolve::<Listener>().unwrap().port, 9000);
    }

    #[test]
    fn test_construct_error_display() {
        let err = ResolveError::construct::<Listener>(anyhow::anyhow!("port in use"));
        let msg = err.to_string();
        assert!(msg.contains("Listener"));
        assert!(msg.contains("port in use"));
    }
}
