// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event subscription lifecycle per service.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ProtocolError;
use crate::model::Udn;
use crate::protocol::{ControlTransport, GrantedSubscription};
use crate::registry::SharedTable;

/// Issues, renews and cancels event subscriptions.
///
/// Outbound calls are never made while the device table lock is held; the
/// table is locked only to read or write subscription ids.
#[derive(Clone)]
pub struct SubscriptionManager {
    transport: Arc<dyn ControlTransport>,
    table: SharedTable,
    requested_timeout: Duration,
}

impl SubscriptionManager {
    pub(crate) fn new(
        transport: Arc<dyn ControlTransport>,
        table: SharedTable,
        requested_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            table,
            requested_timeout,
        }
    }

    /// The timeout requested for every subscription.
    #[must_use]
    pub fn requested_timeout(&self) -> Duration {
        self.requested_timeout
    }

    /// Subscribes to the service at `event_url`.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's [`ProtocolError`]; the failure is also
    /// logged.
    pub async fn subscribe(&self, event_url: &str) -> Result<GrantedSubscription, ProtocolError> {
        match self
            .transport
            .subscribe(event_url, self.requested_timeout)
            .await
        {
            Ok(granted) => {
                tracing::debug!(
                    event_url,
                    sid = %granted.sid,
                    granted_secs = granted.timeout.as_secs(),
                    "Subscribed"
                );
                Ok(granted)
            }
            Err(e) => {
                tracing::warn!(event_url, error = %e, "Subscribe failed");
                Err(e)
            }
        }
    }

    /// Cancels a subscription. Failures are logged and otherwise ignored.
    pub async fn unsubscribe(&self, sid: &str) {
        if let Err(e) = self.transport.unsubscribe(sid).await {
            tracing::warn!(sid, error = %e, "Unsubscribe failed");
        }
    }

    /// Subscribes one service of a freshly added device and records the id.
    ///
    /// If the device was removed while the request was in flight, the new
    /// subscription is cancelled right away. A subscribe completion that
    /// already recorded the same id is kept. Returns `true` when the id is
    /// recorded.
    pub async fn establish(&self, udn: &Udn, service_index: usize, event_url: &str) -> bool {
        let Ok(granted) = self.subscribe(event_url).await else {
            return false;
        };

        let attached = self.table.write().await.attach_sid(
            udn.as_str(),
            service_index,
            event_url,
            &granted.sid,
        );

        if attached {
            tracing::info!(udn = %udn, service_index, sid = %granted.sid, "Subscription established");
        } else {
            tracing::debug!(udn = %udn, sid = %granted.sid, "Device gone before subscription landed");
            self.unsubscribe(&granted.sid).await;
        }
        attached
    }

    /// Records a completed subscribe or renewal for every service at
    /// `event_url`. Returns the number of services updated.
    pub async fn on_renewed(&self, event_url: &str, sid: &str, timeout: Duration) -> usize {
        let updated = self.table.write().await.set_sid_for_event_url(event_url, sid);
        tracing::debug!(
            event_url,
            sid,
            timeout_secs = timeout.as_secs(),
            updated,
            "Subscription renewed"
        );
        updated
    }

    /// Clears the id of services still holding `sid` after an unsubscribe
    /// completed.
    pub async fn on_unsubscribed(&self, event_url: &str, sid: &str) -> usize {
        self.table
            .write()
            .await
            .clear_sid_for_event_url(event_url, Some(sid))
    }

    /// Re-subscribes after a failed renewal or an expiry.
    ///
    /// On success the matching services get the new id. On failure they are
    /// left unsubscribed until the device is discovered again.
    pub async fn on_renewal_failed_or_expired(&self, event_url: &str) -> bool {
        match self.subscribe(event_url).await {
            Ok(granted) => {
                let updated = self
                    .on_renewed(event_url, &granted.sid, granted.timeout)
                    .await;
                if updated == 0 {
                    self.unsubscribe(&granted.sid).await;
                }
                updated > 0
            }
            Err(_) => {
                self.table
                    .write()
                    .await
                    .clear_sid_for_event_url(event_url, None);
                false
            }
        }
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("requested_timeout", &self.requested_timeout)
            .finish_non_exhaustive()
    }
}
