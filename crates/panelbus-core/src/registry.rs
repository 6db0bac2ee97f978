//! Component Registry - the live table of attached components
//!
//! Entries are kept in registration order, which is also the order in which
//! subscribers receive a published event. Each entry snapshots the merged
//! specs at registration time and holds only a [`Weak`] reference to the
//! component.
//!
//! The table lock is never held while component callbacks run, so
//! `initialize`, `destroy` and event handlers may call back into the mediator.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::component::{Component, ComponentRegistration};
use crate::error::{MediatorError, Result};
use crate::guard::run_guarded;
use crate::schema::{ComponentKey, ComponentSpec, EventKey};

/// One registered component instance
pub struct RegistryEntry {
    /// Registration sequence number, unique for the registry's lifetime
    pub seq: u64,
    pub registration: ComponentRegistration,
    /// Set once `destroy` has started; the entry no longer counts as registered
    pub detaching: bool,
}

impl RegistryEntry {
    pub fn key(&self) -> &ComponentKey {
        &self.registration.key
    }

    pub fn is_alive(&self) -> bool {
        self.registration.component.strong_count() > 0
    }
}

/// A subscriber selected for one dispatch
#[derive(Clone)]
pub struct Candidate {
    pub key: ComponentKey,
    pub seq: u64,
    pub component: Weak<dyn Component>,
}

#[derive(Default)]
struct Table {
    entries: Vec<RegistryEntry>,
    next_seq: u64,
}

impl Table {
    fn position(&self, key: &ComponentKey) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| !e.detaching && e.key() == key)
    }

    fn remove_seq(&mut self, key: &ComponentKey, seq: u64) -> Option<RegistryEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.seq == seq && e.key() == key)?;
        Some(self.entries.remove(index))
    }
}

/// Authoritative table of live components
pub struct ComponentRegistry {
    table: RwLock<Table>,
    catch_panics: bool,
}

impl ComponentRegistry {
    pub fn new(catch_panics: bool) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            catch_panics,
        }
    }

    /// Store a registration, then run the component's `initialize`
    ///
    /// Fails with `DuplicateComponent` (registry untouched) when the key is
    /// taken. A failing `initialize` removes the entry again and yields
    /// `InitializeFailed`.
    pub fn register(&self, registration: ComponentRegistration) -> Result<()> {
        let key = registration.key.clone();
        let component = registration.component.clone();

        let seq = {
            let mut table = self.table.write();
            if table.position(&key).is_some() {
                return Err(MediatorError::DuplicateComponent {
                    name: key.name,
                    code: key.code,
                });
            }
            let seq = table.next_seq;
            table.next_seq += 1;
            table.entries.push(RegistryEntry {
                seq,
                registration,
                detaching: false,
            });
            seq
        };

        debug!(component = %key, seq, "[ComponentRegistry] Registered component");

        let initialized = match component.upgrade() {
            Some(component) => run_guarded(self.catch_panics, || component.initialize()),
            None => Err("component dropped before initialize".to_string()),
        };

        if let Err(reason) = initialized {
            error!(
                component = %key,
                error = %reason,
                "[ComponentRegistry] Initialize failed, rolling back registration"
            );
            self.table.write().remove_seq(&key, seq);
            return Err(MediatorError::InitializeFailed {
                name: key.name,
                code: key.code,
                reason,
            });
        }

        Ok(())
    }

    /// Run the component's `destroy`, then remove it
    ///
    /// Unknown keys are a no-op, as is a second unregister while `destroy`
    /// is still running. Returns whether an entry was removed.
    pub fn unregister(&self, key: &ComponentKey) -> bool {
        let found = {
            let mut table = self.table.write();
            table.position(key).map(|i| {
                let entry = &mut table.entries[i];
                entry.detaching = true;
                (entry.seq, entry.registration.component.clone())
            })
        };

        let Some((seq, component)) = found else {
            debug!(component = %key, "[ComponentRegistry] Unregister of unknown component ignored");
            return false;
        };

        if let Some(component) = component.upgrade() {
            if let Err(reason) = run_guarded(self.catch_panics, || component.destroy()) {
                warn!(
                    component = %key,
                    error = %reason,
                    "[ComponentRegistry] Destroy failed, removing anyway"
                );
            }
        }

        let removed = self.table.write().remove_seq(key, seq).is_some();
        if removed {
            debug!(component = %key, seq, "[ComponentRegistry] Unregistered component");
        }
        removed
    }

    /// Unregister everything, most recently registered first
    pub fn unregister_all(&self) -> usize {
        let keys: Vec<ComponentKey> = {
            let table = self.table.read();
            table
                .entries
                .iter()
                .rev()
                .filter(|e| !e.detaching)
                .map(|e| e.key().clone())
                .collect()
        };

        let removed = keys.iter().filter(|key| self.unregister(key)).count();
        info!(removed, "[ComponentRegistry] Unregistered all components");
        removed
    }

    /// Subscribers of `key`, in registration order
    pub fn candidates(&self, key: &EventKey) -> Vec<Candidate> {
        self.table
            .read()
            .entries
            .iter()
            .filter(|e| !e.detaching)
            .filter(|e| {
                e.registration
                    .subscription_spec
                    .contains(&key.channel, &key.event)
            })
            .map(|e| Candidate {
                key: e.key().clone(),
                seq: e.seq,
                component: e.registration.component.clone(),
            })
            .collect()
    }

    /// Drop entries for `keys` whose component no longer exists
    pub fn prune_dropped(&self, keys: &[ComponentKey]) -> usize {
        let mut table = self.table.write();
        let before = table.entries.len();
        table
            .entries
            .retain(|e| e.detaching || e.is_alive() || !keys.contains(e.key()));
        let pruned = before - table.entries.len();
        if pruned > 0 {
            warn!(
                pruned,
                "[ComponentRegistry] Pruned components dropped without being detached"
            );
        }
        pruned
    }

    /// Value snapshot of every registration's public spec
    pub fn list_components(&self) -> Vec<ComponentSpec> {
        self.table
            .read()
            .entries
            .iter()
            .filter(|e| !e.detaching)
            .map(|e| e.registration.spec())
            .collect()
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.table.read().position(key).is_some()
    }

    /// Whether the registration a candidate was taken from is still attached
    pub fn is_current(&self, candidate: &Candidate) -> bool {
        self.table
            .read()
            .entries
            .iter()
            .any(|e| e.seq == candidate.seq && !e.detaching)
    }

    /// Live handle to a registered component, if it still exists
    pub fn get(&self, key: &ComponentKey) -> Option<Arc<dyn Component>> {
        let table = self.table.read();
        let index = table.position(key)?;
        table.entries[index].registration.component.upgrade()
    }

    pub fn len(&self) -> usize {
        self.table
            .read()
            .entries
            .iter()
            .filter(|e| !e.detaching)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

// ============================================================================
// TESTS
// ============================================================================
