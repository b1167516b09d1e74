//! BDD test world: a supervisor rig, named client links and the last results.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::link::ClientLink;
use crate::supervisor::SupervisorError;

use super::link::TestLink;
use super::rig::SupervisorRig;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    pub rig: SupervisorRig,
    links: BTreeMap<String, Arc<TestLink>>,
    start_result: Option<Result<(), SupervisorError>>,
    stop_result: Option<Result<(), SupervisorError>>,
}

impl TestWorld {
    /// Builds a world around an idle supervisor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rig: SupervisorRig::new(),
            links: BTreeMap::new(),
            start_result: None,
            stop_result: None,
        }
    }

    /// Registers a link under `name` that refuses to bind.
    pub fn add_refusing_link(&mut self, name: &str) {
        self.links.insert(name.to_owned(), TestLink::refusing());
    }

    /// Starts the link called `name`, creating it on first use.
    pub fn start(&mut self, name: &str) {
        let link = self.link(name).handle();
        self.start_result = Some(self.rig.supervisor.start(&link));
    }

    /// Stops the link called `name`, creating it on first use.
    pub fn stop(&mut self, name: &str) {
        let id = self.link(name).id();
        self.stop_result = Some(self.rig.supervisor.stop(id));
    }

    /// The last start result.
    #[must_use]
    pub fn start_result(&self) -> Option<&Result<(), SupervisorError>> {
        self.start_result.as_ref()
    }

    /// The last stop result.
    #[must_use]
    pub fn stop_result(&self) -> Option<&Result<(), SupervisorError>> {
        self.stop_result.as_ref()
    }

    /// Names of the attached links, in name order.
    #[must_use]
    pub fn attached_names(&self) -> Vec<String> {
        let attached = self.rig.supervisor.snapshot().attached;
        self.links
            .iter()
            .filter(|(_, link)| attached.contains(&link.id()))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Core names the link called `name` was bound to.
    #[must_use]
    pub fn bindings(&self, name: &str) -> Vec<String> {
        self.links
            .get(name)
            .map(|link| link.bindings())
            .unwrap_or_default()
    }

    fn link(&mut self, name: &str) -> Arc<TestLink> {
        Arc::clone(self.links.entry(name.to_owned()).or_insert_with(TestLink::new))
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
