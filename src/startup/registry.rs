//! Registration surface for startup actions.
//!
//! The registry keeps its descriptors sorted by priority at all times. Every
//! insertion and every priority change re-sorts the list. Equal priorities run
//! in registration order, whatever priorities they held in between.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use tracing::debug;

use super::action::{ActionDescriptor, FnAction, StartupAction, LAST_PRIORITY};
use super::provider::{ResolveError, ServiceProvider};

static NEXT_ACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a registered action, independent of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionHandle(u64);

/// Ordered list of startup action descriptors.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    descriptors: Vec<ActionDescriptor>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action constructor.
    ///
    /// The default priority is the registration ordinal, so actions without an
    /// explicit priority run in the order they were registered.
    pub fn register_one<A, F>(&mut self, constructor: F) -> ActionInfo<'_>
    where
        A: StartupAction + 'static,
        F: Fn(&ServiceProvider) -> Result<A, ResolveError> + Send + Sync + 'static,
    {
        let id = NEXT_ACTION_ID.fetch_add(1, Ordering::Relaxed);
        let handle = ActionHandle(id);
        self.descriptors.push(ActionDescriptor::new(id, constructor));

        let ordinal = self.descriptors.len() as i32;
        self.set_priority(handle, ordinal);

        ActionInfo {
            registry: self,
            handle,
        }
    }

    /// Register a plain closure as an action.
    pub fn register_fn<F>(&mut self, name: &str, f: F) -> ActionInfo<'_>
    where
        F: Fn() -> Result<()> + Send + Sync + Clone + 'static,
    {
        let action_name = name.to_string();
        let mut info =
            self.register_one(move |_| Ok(FnAction::new(action_name.clone(), f.clone())));
        info.set_name(name);
        info
    }

    /// Register several constructors in argument order.
    pub fn register_many<A, F, I>(&mut self, constructors: I) -> Vec<ActionHandle>
    where
        A: StartupAction + 'static,
        F: Fn(&ServiceProvider) -> Result<A, ResolveError> + Send + Sync + 'static,
        I: IntoIterator<Item = F>,
    {
        constructors
            .into_iter()
            .map(|constructor| self.register_one(constructor).handle())
            .collect()
    }

    /// Change the priority of an action and re-sort the list.
    ///
    /// Returns `false` if the handle does not belong to this registry.
    pub fn set_priority(&mut self, handle: ActionHandle, priority: i32) -> bool {
        let Some(descriptor) = self.find_mut(handle) else {
            return false;
        };
        descriptor.priority = priority;
        debug!("Startup action {} set to priority {}", descriptor.name, priority);

        self.descriptors.sort_by_key(|d| (d.priority, d.id));
        true
    }

    /// Override the display name of an action.
    pub fn set_name(&mut self, handle: ActionHandle, name: &str) -> bool {
        match self.find_mut(handle) {
            Some(descriptor) => {
                descriptor.name = name.to_string();
                descriptor.named = true;
                true
            }
            None => false,
        }
    }

    /// Move an action behind every normally prioritized action.
    pub fn set_last(&mut self, handle: ActionHandle) -> bool {
        self.set_priority(handle, LAST_PRIORITY)
    }

    pub fn get(&self, handle: ActionHandle) -> Option<&ActionDescriptor> {
        self.descriptors.iter().find(|d| d.id == handle.0)
    }

    /// Descriptors in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.descriptors.iter()
    }

    /// Names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    fn find_mut(&mut self, handle: ActionHandle) -> Option<&mut ActionDescriptor> {
        self.descriptors.iter_mut().find(|d| d.id == handle.0)
    }
}

/// Handle returned from registration, used to adjust the new descriptor.
///
/// ```ignore
/// registry.register_one(|p| CacheWarmup::new(p)).priority(5).name("cache");
/// registry.register_fn("boot-record", record_boot).last();
/// ```
pub struct ActionInfo<'a> {
    registry: &'a mut ActionRegistry,
    handle: ActionHandle,
}

impl<'a> ActionInfo<'a> {
    pub fn handle(&self) -> ActionHandle {
        self.handle
    }

    /// Lower runs earlier.
    pub fn priority(mut self, priority: i32) -> Self {
        self.set_priority(priority);
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.set_name(name);
        self
    }

    pub fn last(self) -> Self {
        self.priority(LAST_PRIORITY)
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.registry.set_priority(self.handle, priority);
    }

    pub fn set_name(&mut self, name: &str) {
        self.registry.set_name(self.handle, name);
    }
}
