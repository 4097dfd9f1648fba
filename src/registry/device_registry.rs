// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The shared device registry.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::config::{ControlPointConfig, DeviceProfile};
use crate::error::{Error, Result};
use crate::event::ControlPointEvent;
use crate::model::{DeviceList, DeviceNode, DeviceSnapshot, Udn};
use crate::parser::{DeviceDescription, PropertySet};
use crate::protocol::ControlTransport;
use crate::subscription::{Notifier, SubscriptionManager};

use super::DeviceTable;

/// The device table behind the registry's single lock.
pub(crate) type SharedTable = Arc<RwLock<DeviceTable>>;

/// What [`DeviceRegistry::add_or_refresh`] did with an announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new node was created.
    Added,
    /// A known node had its advertisement timeout reset.
    Refreshed,
    /// The device type is not the tracked one.
    Ignored,
}

/// Result of one advertisement sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Devices removed because their advertisement expired.
    pub expired: Vec<Udn>,
    /// Devices close to expiry that should be searched for.
    pub renewing: Vec<Udn>,
}

/// Where to send a control request for one service of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub udn: Udn,
    pub service_type: String,
    pub control_url: String,
}

/// The set of devices the control point currently tracks.
///
/// Cloning is cheap; clones share the same table. Every read and write goes
/// through one `tokio::sync::RwLock`. Notifications are sent while the
/// guard is held, so observers see additions and removals in table order.
/// Subscribe and unsubscribe calls happen after the guard is released.
#[derive(Clone)]
pub struct DeviceRegistry {
    table: SharedTable,
    subscriptions: SubscriptionManager,
    notifier: Notifier,
    profile: Arc<DeviceProfile>,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(
        transport: Arc<dyn ControlTransport>,
        notifier: Notifier,
        config: &ControlPointConfig,
    ) -> Self {
        let table = SharedTable::default();
        let subscriptions =
            SubscriptionManager::new(transport, table.clone(), config.subscription_timeout());
        Self {
            table,
            subscriptions,
            notifier,
            profile: Arc::new(config.profile().clone()),
        }
    }

    /// The subscription manager bound to this registry's table.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    /// The notifier used for device and variable notifications.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// The tracked device profile.
    #[must_use]
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Records an announcement or search answer.
    ///
    /// A known UDN only gets its advertisement timeout reset. A new device
    /// of the tracked type is appended, announced with one
    /// [`ControlPointEvent::DeviceAdded`], and each of its services is
    /// subscribed. Subscription failures leave the device registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the description document is malformed.
    pub async fn add_or_refresh(
        &self,
        descriptor: &str,
        location: &str,
        expires: Duration,
    ) -> Result<AddOutcome> {
        let description = DeviceDescription::parse(descriptor, location)?;
        if description.device_type != self.profile.device_type() {
            tracing::trace!(
                udn = %description.udn,
                device_type = %description.device_type,
                "Ignoring device of another type"
            );
            return Ok(AddOutcome::Ignored);
        }

        let timeout = seconds(expires);
        let udn = description.udn.clone();
        let targets: Vec<(usize, String)> = {
            let mut table = self.table.write().await;
            if let Some(known) = table.get_mut(udn.as_str()) {
                known.refresh(timeout);
                tracing::debug!(udn = %udn, timeout, "Advertisement refreshed");
                return Ok(AddOutcome::Refreshed);
            }

            let node = DeviceNode::new(&description, location, timeout, &self.profile);
            let targets = node
                .indexed_services()
                .map(|(index, service)| (index, service.event_url().to_string()))
                .collect();
            table.push(node);
            tracing::info!(
                udn = %udn,
                friendly_name = %description.friendly_name,
                location,
                "Device added"
            );
            self.notifier
                .notify(ControlPointEvent::device_added(udn.clone()));
            targets
        };

        for (index, event_url) in targets {
            self.subscriptions.establish(&udn, index, &event_url).await;
        }

        Ok(AddOutcome::Added)
    }

    /// Removes a device and cancels its subscriptions.
    ///
    /// Returns `false` (and notifies nobody) if the UDN is unknown.
    pub async fn remove(&self, udn: &str) -> bool {
        let sids = {
            let mut table = self.table.write().await;
            let Some(node) = table.remove(udn) else {
                return false;
            };
            tracing::info!(udn = %node.udn(), "Device removed");
            self.detach(node)
        };
        self.unsubscribe_all(sids).await;
        true
    }

    /// Removes every device. Returns how many were removed.
    pub async fn remove_all(&self) -> usize {
        let (count, sids) = {
            let mut table = self.table.write().await;
            let detached = table.take_all();
            let count = detached.len();
            let sids: Vec<String> = detached
                .into_iter()
                .flat_map(|node| self.detach(node))
                .collect();
            (count, sids)
        };
        self.unsubscribe_all(sids).await;
        if count > 0 {
            tracing::info!(count, "All devices removed");
        }
        count
    }

    /// Ages every advertisement by `interval`.
    ///
    /// Expired devices are removed with their subscriptions cancelled.
    /// Devices with less than two intervals left are reported in
    /// [`SweepReport::renewing`].
    pub async fn sweep(&self, interval: Duration) -> SweepReport {
        let step = seconds(interval);
        let (report, sids) = {
            let mut table = self.table.write().await;
            let (expired, renewing) = table.age_all(step, step.saturating_mul(2));
            let mut report = SweepReport {
                expired: Vec::with_capacity(expired.len()),
                renewing,
            };
            let mut sids = Vec::new();
            for node in expired {
                tracing::info!(udn = %node.udn(), "Advertisement expired");
                report.expired.push(node.udn().clone());
                sids.extend(self.detach(node));
            }
            (report, sids)
        };
        self.unsubscribe_all(sids).await;
        report
    }

    /// Applies a change notification to the service holding `sid`.
    ///
    /// Recognized variables are stored and notified one by one; unknown
    /// names are ignored. Returns the number of variables updated.
    pub async fn apply_variable_changes(&self, sid: &str, payload: &str) -> usize {
        let set = PropertySet::parse(payload);
        if set.skipped() > 0 || set.is_truncated() {
            tracing::warn!(
                sid,
                skipped = set.skipped(),
                truncated = set.is_truncated(),
                "Malformed change notification"
            );
        }

        let mut table = self.table.write().await;
        let Some(applied) = table.apply_changes(sid, set.changes()) else {
            tracing::debug!(sid, "Change notification for unknown subscription");
            return 0;
        };

        let count = applied.updated.len();
        for (name, value) in applied.updated {
            tracing::debug!(
                udn = %applied.udn,
                service_index = applied.service_index,
                name = %name,
                value = %value,
                "Variable updated"
            );
            self.notifier.notify(ControlPointEvent::variable_updated(
                applied.udn.clone(),
                applied.service_index,
                name,
                value,
            ));
        }
        count
    }

    /// Reports a variable query answer for every device controlled at
    /// `control_url`.
    pub async fn report_variable(&self, control_url: &str, var_name: &str, value: &str) -> usize {
        let table = self.table.read().await;
        let udns = table.udns_for_control_url(control_url);
        for udn in &udns {
            self.notifier.notify(ControlPointEvent::variable_query_result(
                udn.clone(),
                var_name,
                value,
            ));
        }
        udns.len()
    }

    /// Announces a detached node as removed and returns its subscription
    /// ids. Called with the table lock held so removal notifications keep
    /// table order.
    fn detach(&self, mut node: DeviceNode) -> Vec<String> {
        let sids = node.take_sids();
        self.notifier
            .notify(ControlPointEvent::device_removed(node.udn().clone()));
        sids
    }

    async fn unsubscribe_all(&self, sids: Vec<String>) {
        for sid in sids {
            self.subscriptions.unsubscribe(&sid).await;
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns the number of tracked devices.
    pub async fn len(&self) -> usize {
        self.table.read().await.len()
    }

    /// Returns `true` if no device is tracked.
    pub async fn is_empty(&self) -> bool {
        self.table.read().await.is_empty()
    }

    /// Returns a copy of the device at a 1-based position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PositionOutOfRange`] for position 0 or past the end.
    pub async fn lookup_by_position(&self, position: usize) -> Result<DeviceSnapshot> {
        let table = self.table.read().await;
        table
            .at_position(position)
            .map(|node| self.snapshot(position, node))
            .ok_or(Error::PositionOutOfRange {
                position,
                count: table.len(),
            })
    }

    /// Returns a copy of the device with this UDN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if the UDN is unknown.
    pub async fn lookup_by_udn(&self, udn: &str) -> Result<DeviceSnapshot> {
        let table = self.table.read().await;
        table
            .position_of(udn)
            .zip(table.get(udn))
            .map(|(position, node)| self.snapshot(position, node))
            .ok_or_else(|| Error::DeviceNotFound(udn.to_string()))
    }

    /// Lists the tracked devices in order.
    pub async fn list(&self) -> DeviceList {
        let table = self.table.read().await;
        DeviceList::new(
            table
                .iter()
                .map(|node| (node.udn().clone(), node.friendly_name().to_string()))
                .collect(),
        )
    }

    /// Resolves the control endpoint of one service of the device at a
    /// 1-based position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PositionOutOfRange`] or [`Error::ServiceNotFound`].
    pub async fn service_endpoint(
        &self,
        position: usize,
        service_index: usize,
    ) -> Result<ServiceEndpoint> {
        let table = self.table.read().await;
        let node = table.at_position(position).ok_or(Error::PositionOutOfRange {
            position,
            count: table.len(),
        })?;
        let service = node
            .service(service_index)
            .ok_or(Error::ServiceNotFound {
                index: service_index,
            })?;
        Ok(ServiceEndpoint {
            udn: node.udn().clone(),
            service_type: service.service_type().to_string(),
            control_url: service.control_url().to_string(),
        })
    }

    fn snapshot(&self, position: usize, node: &DeviceNode) -> DeviceSnapshot {
        let names = self
            .profile
            .services()
            .iter()
            .map(|service| service.name().to_string())
            .collect();
        DeviceSnapshot::new(position, node.clone(), names)
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("profile", &self.profile.device_type())
            .finish_non_exhaustive()
    }
}

fn seconds(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}
