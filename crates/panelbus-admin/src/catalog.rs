//! The standard set of administration components
//!
//! ```ignore
//! let components = AdminComponentsBuilder::new()
//!     .with_mediator(mediator.clone())
//!     .with_api(api)
//!     .build()?;
//! components.attach_all()?;
//! ```

use std::sync::Arc;

use panelbus_core::{ComponentKey, SharedMediator};
use tracing::{info, warn};

use crate::api::{AdminApi, ResourceKind};
use crate::components::{AuthComponent, PageShell, ResourceComponent};

/// Every feature component, constructed but not yet attached
pub struct AdminComponents {
    mediator: SharedMediator,
    pub shell: Arc<PageShell>,
    pub auth: Arc<AuthComponent>,
    pub resources: Vec<Arc<ResourceComponent>>,
}

impl AdminComponents {
    /// Attach shell, auth, then resources in kind order
    ///
    /// All or nothing: when one attach fails, the components attached before
    /// it are detached again, most recent first.
    pub fn attach_all(&self) -> anyhow::Result<Vec<ComponentKey>> {
        let mut keys = Vec::with_capacity(2 + self.resources.len());
        if let Err(e) = self.attach_each(&mut keys) {
            for key in keys.iter().rev() {
                self.mediator.unregister(key);
            }
            warn!(
                rolled_back = keys.len(),
                error = %e,
                "[AdminComponents] Attach failed, detached the partial set"
            );
            return Err(e.into());
        }
        info!(count = keys.len(), "[AdminComponents] Attached");
        Ok(keys)
    }

    fn attach_each(&self, keys: &mut Vec<ComponentKey>) -> panelbus_core::Result<()> {
        keys.push(self.mediator.attach(&self.shell)?);
        keys.push(self.mediator.attach(&self.auth)?);
        for resource in &self.resources {
            keys.push(self.mediator.attach(resource)?);
        }
        Ok(())
    }

    /// Detach in reverse attach order; returns how many were attached
    pub fn detach_all(&self) -> usize {
        let mut detached = 0;
        for resource in self.resources.iter().rev() {
            detached += usize::from(self.mediator.detach(resource.as_ref()));
        }
        detached += usize::from(self.mediator.detach(self.auth.as_ref()));
        detached += usize::from(self.mediator.detach(self.shell.as_ref()));
        detached
    }

    pub fn resource(&self, kind: ResourceKind) -> Option<&Arc<ResourceComponent>> {
        self.resources.iter().find(|r| r.kind() == kind)
    }
}

pub struct AdminComponentsBuilder {
    mediator: Option<SharedMediator>,
    api: Option<Arc<dyn AdminApi>>,
    kinds: Vec<ResourceKind>,
}

impl AdminComponentsBuilder {
    pub fn new() -> Self {
        Self {
            mediator: None,
            api: None,
            kinds: ResourceKind::ALL.to_vec(),
        }
    }

    pub fn with_mediator(mut self, mediator: SharedMediator) -> Self {
        self.mediator = Some(mediator);
        self
    }

    pub fn with_api(mut self, api: Arc<dyn AdminApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Restrict the resource components built; defaults to every kind
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ResourceKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self.kinds.sort();
        self.kinds.dedup();
        self
    }

    pub fn build(self) -> anyhow::Result<AdminComponents> {
        let mediator = self.mediator.ok_or_else(|| anyhow::anyhow!("Mediator required"))?;
        let api = self.api.ok_or_else(|| anyhow::anyhow!("Admin API required"))?;

        Ok(AdminComponents {
            shell: Arc::new(PageShell::new("shell1", mediator.clone())),
            auth: Arc::new(AuthComponent::new("auth1", mediator.clone(), api.clone())),
            resources: self
                .kinds
                .into_iter()
                .map(|kind| {
                    Arc::new(ResourceComponent::new(
                        kind,
                        format!("{}1", kind.channel()),
                        mediator.clone(),
                        api.clone(),
                    ))
                })
                .collect(),
            mediator,
        })
    }
}

impl Default for AdminComponentsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
