/*
[INPUT]:  Page refresh closures keyed by refreshable route
[OUTPUT]: Last-writer-wins callback slots and release tokens
[POS]:    Dispatch layer - lookup table consulted by RefreshCoordinator
[UPDATE]: When changing callback shape or registration lifetime rules
*/

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::route::RefreshRoute;

type RefreshFn = dyn Fn() -> BoxFuture<'static, ()> + Send + Sync;

/// A page's zero-argument refresh action.
///
/// `Tracked` callbacks report completion by resolving their future, so the
/// coordinator can count them as in flight. `Detached` callbacks are started and
/// forgotten; the coordinator only shows a fixed busy window for them.
#[derive(Clone)]
pub enum RefreshCallback {
    Tracked(Arc<RefreshFn>),
    Detached(Arc<RefreshFn>),
}

impl RefreshCallback {
    pub fn tracked<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        RefreshCallback::Tracked(Arc::new(move || Box::pin(f()) as BoxFuture<'static, ()>))
    }

    pub fn detached<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        RefreshCallback::Detached(Arc::new(move || Box::pin(f()) as BoxFuture<'static, ()>))
    }

    pub fn is_tracked(&self) -> bool {
        matches!(self, RefreshCallback::Tracked(_))
    }

    pub(crate) fn start(&self) -> BoxFuture<'static, ()> {
        match self {
            RefreshCallback::Tracked(f) | RefreshCallback::Detached(f) => f(),
        }
    }
}

impl fmt::Debug for RefreshCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshCallback::Tracked(_) => f.write_str("RefreshCallback::Tracked"),
            RefreshCallback::Detached(_) => f.write_str("RefreshCallback::Detached"),
        }
    }
}

#[derive(Debug)]
struct Slot {
    id: u64,
    callback: RefreshCallback,
}

#[derive(Debug, Default)]
struct Slots {
    next_id: u64,
    entries: [Option<Slot>; 3],
}

/// One callback per refreshable route. `register` always overwrites.
#[derive(Debug, Clone, Default)]
pub struct PageRefreshRegistry {
    slots: Arc<Mutex<Slots>>,
}

impl PageRefreshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `callback` for `route`, replacing whatever was there.
    ///
    /// The returned token may be dropped freely; the entry then stays until the
    /// next registration for the same route.
    pub fn register(&self, route: RefreshRoute, callback: RefreshCallback) -> Registration {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.next_id += 1;
        let id = slots.next_id;
        let replaced = slots.entries[route.slot()]
            .replace(Slot { id, callback })
            .is_some();
        debug!(route = %route, id, replaced, "refresh callback registered");

        Registration {
            slots: Arc::downgrade(&self.slots),
            route,
            id,
        }
    }

    pub fn lookup(&self, route: RefreshRoute) -> Option<RefreshCallback> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entries[route.slot()]
            .as_ref()
            .map(|slot| slot.callback.clone())
    }

    pub fn is_registered(&self, route: RefreshRoute) -> bool {
        self.lookup(route).is_some()
    }
}

/// Proof of a registration, usable to remove exactly that entry later.
#[derive(Debug)]
pub struct Registration {
    slots: Weak<Mutex<Slots>>,
    route: RefreshRoute,
    id: u64,
}

impl Registration {
    pub fn route(&self) -> RefreshRoute {
        self.route
    }

    /// Remove the entry if it is still this registration's.
    ///
    /// Returns false when a newer registration replaced it or the registry is gone.
    pub fn release(self) -> bool {
        let Some(slots) = self.slots.upgrade() else {
            return false;
        };
        let mut slots = slots.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = &mut slots.entries[self.route.slot()];
        if entry.as_ref().is_some_and(|slot| slot.id == self.id) {
            *entry = None;
            debug!(route = %self.route, id = self.id, "refresh callback released");
            true
        } else {
            false
        }
    }

    /// Convert into a guard that releases on drop.
    pub fn into_guard(self) -> RegistrationGuard {
        RegistrationGuard {
            registration: Some(self),
        }
    }
}

/// Scoped registration: the entry lives exactly as long as the guard.
#[derive(Debug)]
pub struct RegistrationGuard {
    registration: Option<Registration>,
}

impl RegistrationGuard {
    /// Give up scoping and leave the entry in place.
    pub fn detach(mut self) -> Registration {
        self.registration
            .take()
            .unwrap_or_else(|| unreachable!("guard holds its registration until drop"))
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if let Some(registration) = self.registration.take() {
            registration.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> RefreshCallback {
        let counter = counter.clone();
        RefreshCallback::detached(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}
        })
    }

    #[test]
    fn test_lookup_empty() {
        let registry = PageRefreshRegistry::new();
        for route in RefreshRoute::ALL {
            assert!(registry.lookup(route).is_none());
        }
    }

    #[tokio::test]
    async fn test_register_overwrites() {
        let registry = PageRefreshRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let _ = registry.register(RefreshRoute::Positions, counting(&first));
        let _ = registry.register(RefreshRoute::Positions, counting(&second));

        registry
            .lookup(RefreshRoute::Positions)
            .expect("registered")
            .start()
            .await;

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert!(!registry.is_registered(RefreshRoute::Orders));
    }

    #[test]
    fn test_dropped_token_keeps_entry() {
        let registry = PageRefreshRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        drop(registry.register(RefreshRoute::Dashboard, counting(&counter)));
        assert!(registry.is_registered(RefreshRoute::Dashboard));
    }

    #[test]
    fn test_release_only_removes_own_entry() {
        let registry = PageRefreshRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let stale = registry.register(RefreshRoute::Orders, counting(&counter));
        let current = registry.register(RefreshRoute::Orders, counting(&counter));

        assert!(!stale.release());
        assert!(registry.is_registered(RefreshRoute::Orders));
        assert!(current.release());
        assert!(!registry.is_registered(RefreshRoute::Orders));
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let registry = PageRefreshRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let _guard = registry
                .register(RefreshRoute::Dashboard, counting(&counter))
                .into_guard();
            assert!(registry.is_registered(RefreshRoute::Dashboard));
        }
        assert!(!registry.is_registered(RefreshRoute::Dashboard));
    }

    #[test]
    fn test_guard_detach_keeps_entry() {
        let registry = PageRefreshRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let guard = registry
            .register(RefreshRoute::Positions, counting(&counter))
            .into_guard();
        let registration = guard.detach();
        assert!(registry.is_registered(RefreshRoute::Positions));
        assert_eq!(registration.route(), RefreshRoute::Positions);
    }
}
