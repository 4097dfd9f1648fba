// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel for control point notifications.
//!
//! The registry publishes while it holds its table lock, so every receiver
//! sees "added" and "removed" for one UDN in the order the table changed.
//! A receiver that lags has missed some of them and should rebuild its view
//! from a fresh device listing.

use tokio::sync::broadcast;

use super::ControlPointEvent;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fans out [`ControlPointEvent`]s to the application's async consumers.
///
/// Capacity comes from the control point configuration. Publishing never
/// blocks the registry: a receiver that falls behind loses the oldest
/// notifications and gets `RecvError::Lagged` with the number skipped.
///
/// # Examples
///
/// ```
/// use cctv_ctrlpt::event::{ControlPointEvent, EventBus};
/// use cctv_ctrlpt::model::Udn;
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ControlPointEvent::device_added(Udn::new("uuid:cam")));
/// assert_eq!(rx.try_recv().unwrap().udn().as_str(), "uuid:cam");
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ControlPointEvent>,
}

impl EventBus {
    /// Creates a bus with room for 256 pending notifications.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` notifications per receiver.
    /// Zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns a receiver for notifications published from now on. Devices
    /// already tracked are not replayed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ControlPointEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes a notification. With no receiver it is dropped; observer
    /// callbacks are fed separately by the notifier.
    pub fn publish(&self, event: ControlPointEvent) {
        let _ = self.sender.send(event);
    }

    /// Publishes a notification and returns how many receivers got it.
    #[must_use]
    pub fn publish_counted(&self, event: ControlPointEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
