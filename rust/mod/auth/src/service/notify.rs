use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Callback invoked after a state change.
pub type ChangeHook = Arc<dyn Fn() + Send + Sync>;

/// Handle for a registered hook, returned by `SessionSync::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registered change hooks, called in registration order.
pub(crate) struct Listeners {
    hooks: RwLock<Vec<(SubscriptionId, ChangeHook)>>,
    next_id: AtomicU64,
}

impl Listeners {
    pub(crate) fn new() -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn subscribe<F>(&self, hook: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(hook)));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(hook_id, _)| *hook_id != id);
    }

    /// Call every hook. Works on a snapshot so a hook may subscribe or
    /// unsubscribe without deadlocking.
    pub(crate) fn notify(&self) {
        let hooks: Vec<ChangeHook> = self
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, hook)| Arc::clone(hook))
            .collect();
        for hook in hooks {
            hook();
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.hooks.read().unwrap().len()
    }
}
