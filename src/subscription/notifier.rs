// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use crate::event::{ControlPointEvent, EventBus};

use super::ObserverRegistry;

/// Delivers each notification to the observer callbacks and the event bus.
///
/// The registry calls it with the device table lock held, which keeps
/// notifications in the order the table changed. Delivery never blocks.
#[derive(Debug, Clone)]
pub struct Notifier {
    bus: EventBus,
    observers: Arc<ObserverRegistry>,
}

impl Notifier {
    /// Creates a notifier over a bus and an observer registry.
    #[must_use]
    pub fn new(bus: EventBus, observers: Arc<ObserverRegistry>) -> Self {
        Self { bus, observers }
    }

    /// Delivers a notification.
    pub fn notify(&self, event: ControlPointEvent) {
        tracing::trace!(?event, "Notify");
        self.observers.dispatch(&event);
        self.bus.publish(event);
    }

    /// The underlying bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The observer registry.
    #[must_use]
    pub fn observers(&self) -> &Arc<ObserverRegistry> {
        &self.observers
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(EventBus::new(), Arc::new(ObserverRegistry::new()))
    }
}
