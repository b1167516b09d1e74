//! Client link double.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::link::{ClientLink, LinkId};
use crate::runtime::{BusCore, RouterError};
use crate::supervisor::LifecycleSupervisor;

type DisconnectHook = Box<dyn FnOnce() + Send>;

/// Link that records bindings and can be told to refuse them.
pub struct TestLink {
    id: LinkId,
    refuse: AtomicBool,
    bindings: Mutex<Vec<String>>,
    disconnects: AtomicUsize,
    supervisor: Mutex<Option<Weak<LifecycleSupervisor>>>,
    on_disconnect: Mutex<Option<DisconnectHook>>,
}

impl TestLink {
    /// Builds a link with a fresh identity.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: LinkId::allocate(),
            refuse: AtomicBool::new(false),
            bindings: Mutex::new(Vec::new()),
            disconnects: AtomicUsize::new(0),
            supervisor: Mutex::new(None),
            on_disconnect: Mutex::new(None),
        })
    }

    /// Builds a link that refuses to bind.
    #[must_use]
    pub fn refusing() -> Arc<Self> {
        let link = Self::new();
        link.refuse.store(true, Ordering::SeqCst);
        link
    }

    /// Calls back into `supervisor.stop` when disconnected.
    pub fn stop_on_disconnect(&self, supervisor: &Arc<LifecycleSupervisor>) {
        *self.supervisor.lock().expect("link mutex poisoned") = Some(Arc::downgrade(supervisor));
    }

    /// Runs `hook` once, the first time the link is disconnected.
    pub fn on_disconnect(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_disconnect.lock().expect("link mutex poisoned") = Some(Box::new(hook));
    }

    /// Core names this link was bound to, in order.
    #[must_use]
    pub fn bindings(&self) -> Vec<String> {
        self.bindings.lock().expect("link mutex poisoned").clone()
    }

    /// Times the link was asked to disconnect.
    #[must_use]
    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Shares the link as the trait object the supervisor expects.
    #[must_use]
    pub fn handle(self: &Arc<Self>) -> Arc<dyn ClientLink> {
        Arc::clone(self) as Arc<dyn ClientLink>
    }
}

impl ClientLink for TestLink {
    fn id(&self) -> LinkId {
        self.id
    }

    fn link_bus(&self, core: &Arc<dyn BusCore>) -> Result<(), RouterError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(RouterError::new("link refused the bus"));
        }
        self.bindings
            .lock()
            .expect("link mutex poisoned")
            .push(core.name().to_owned());
        Ok(())
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        let hook = self.on_disconnect.lock().expect("link mutex poisoned").take();
        if let Some(hook) = hook {
            hook();
        }
        let supervisor = self
            .supervisor
            .lock()
            .expect("link mutex poisoned")
            .as_ref()
            .and_then(Weak::upgrade);
        if let Some(supervisor) = supervisor {
            supervisor
                .stop(self.id)
                .expect("stop after forced disconnect is a no-op");
        }
    }
}
