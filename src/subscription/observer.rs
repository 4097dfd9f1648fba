// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synchronous observer callbacks.
//!
//! - [`ObserverId`] - Handle returned on registration, used to unregister
//! - [`ObserverRegistry`] - Stores callbacks and dispatches notifications

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::event::ControlPointEvent;
use crate::model::Udn;

/// Unique identifier of a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Observer({})", self.0)
    }
}

type DeviceCallback = Arc<dyn Fn(&Udn) + Send + Sync>;

/// Receives `(udn, service_index, name, value)`.
type VariableCallback = Arc<dyn Fn(&Udn, usize, &str, &str) + Send + Sync>;

/// Receives `(udn, name, value)`.
type QueryCallback = Arc<dyn Fn(&Udn, &str, &str) + Send + Sync>;

type EventCallback = Arc<dyn Fn(&ControlPointEvent) + Send + Sync>;

/// Registry of observer callbacks.
///
/// Callbacks run synchronously on the task that produced the notification,
/// while the device registry lock is held, so they must not block and must
/// not wait on the registry. They may register or unregister observers.
pub struct ObserverRegistry {
    next_id: AtomicU64,
    added: RwLock<HashMap<ObserverId, DeviceCallback>>,
    removed: RwLock<HashMap<ObserverId, DeviceCallback>>,
    variable_updated: RwLock<HashMap<ObserverId, VariableCallback>>,
    query_result: RwLock<HashMap<ObserverId, QueryCallback>>,
    any_event: RwLock<HashMap<ObserverId, EventCallback>>,
}

impl ObserverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            added: RwLock::new(HashMap::new()),
            removed: RwLock::new(HashMap::new()),
            variable_updated: RwLock::new(HashMap::new()),
            query_result: RwLock::new(HashMap::new()),
            any_event: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> ObserverId {
        ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a callback for devices added to the registry.
    pub fn on_device_added<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&Udn) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.added.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for devices removed from the registry.
    pub fn on_device_removed<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&Udn) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.removed.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for state variable changes.
    ///
    /// The callback receives the device, the service index, the variable
    /// name and the new value.
    pub fn on_variable_updated<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&Udn, usize, &str, &str) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.variable_updated.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for answered variable queries.
    pub fn on_variable_query_result<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&Udn, &str, &str) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.query_result.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback receiving every notification.
    pub fn on_event<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&ControlPointEvent) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.any_event.write().insert(id, Arc::new(callback));
        id
    }

    /// Unregisters a callback.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.added.write().remove(&id).is_some()
            || self.removed.write().remove(&id).is_some()
            || self.variable_updated.write().remove(&id).is_some()
            || self.query_result.write().remove(&id).is_some()
            || self.any_event.write().remove(&id).is_some()
    }

    /// Removes every callback.
    pub fn clear(&self) {
        self.added.write().clear();
        self.removed.write().clear();
        self.variable_updated.write().clear();
        self.query_result.write().clear();
        self.any_event.write().clear();
    }

    /// Calls every callback interested in `event`.
    pub fn dispatch(&self, event: &ControlPointEvent) {
        for callback in snapshot(&self.any_event) {
            callback(event);
        }

        match event {
            ControlPointEvent::DeviceAdded { udn } => {
                for callback in snapshot(&self.added) {
                    callback(udn);
                }
            }
            ControlPointEvent::DeviceRemoved { udn } => {
                for callback in snapshot(&self.removed) {
                    callback(udn);
                }
            }
            ControlPointEvent::VariableUpdated {
                udn,
                service_index,
                name,
                value,
            } => {
                for callback in snapshot(&self.variable_updated) {
                    callback(udn, *service_index, name, value);
                }
            }
            ControlPointEvent::VariableQueryResult { udn, name, value } => {
                for callback in snapshot(&self.query_result) {
                    callback(udn, name, value);
                }
            }
        }
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.added.read().len()
            + self.removed.read().len()
            + self.variable_updated.read().len()
            + self.query_result.read().len()
            + self.any_event.read().len()
    }

    /// Returns `true` if no callback is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observer_count() == 0
    }
}

fn snapshot<T: Clone>(callbacks: &RwLock<HashMap<ObserverId, T>>) -> Vec<T> {
    callbacks.read().values().cloned().collect()
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observer_count", &self.observer_count())
            .finish()
    }
}
