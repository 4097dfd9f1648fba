// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A tracked device and its per-service records.

use serde::Serialize;

use super::{ServiceRecord, Udn};
use crate::config::DeviceProfile;
use crate::parser::DeviceDescription;

/// A device known to the control point.
///
/// `services` is indexed by the profile's service order. A slot is `None`
/// when the device's description did not list that service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceNode {
    udn: Udn,
    device_type: String,
    description_url: String,
    friendly_name: String,
    presentation_url: String,
    advertisement_timeout: i64,
    services: Vec<Option<ServiceRecord>>,
}

impl DeviceNode {
    /// Builds an unsubscribed node from a parsed description.
    ///
    /// Services are matched against `profile` by service type; the profile's
    /// order decides each service's index.
    #[must_use]
    pub fn new(
        description: &DeviceDescription,
        location: &str,
        advertisement_timeout: i64,
        profile: &DeviceProfile,
    ) -> Self {
        let services = profile
            .services()
            .iter()
            .map(|service| {
                description
                    .service(service.service_type())
                    .map(|found| ServiceRecord::new(found, service))
            })
            .collect();

        Self {
            udn: description.udn.clone(),
            device_type: description.device_type.clone(),
            description_url: location.to_string(),
            friendly_name: description.friendly_name.clone(),
            presentation_url: description.presentation_url.clone(),
            advertisement_timeout,
            services,
        }
    }

    #[must_use]
    pub fn udn(&self) -> &Udn {
        &self.udn
    }

    #[must_use]
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    /// The location the description document was fetched from.
    #[must_use]
    pub fn description_url(&self) -> &str {
        &self.description_url
    }

    #[must_use]
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// The absolute presentation URL, or empty when the device has none.
    #[must_use]
    pub fn presentation_url(&self) -> &str {
        &self.presentation_url
    }

    /// Seconds left before the advertisement is considered stale.
    ///
    /// May go negative between a sweep decrement and the removal.
    #[must_use]
    pub fn advertisement_timeout(&self) -> i64 {
        self.advertisement_timeout
    }

    /// Resets the advertisement timeout after a fresh announcement.
    pub fn refresh(&mut self, advertisement_timeout: i64) {
        self.advertisement_timeout = advertisement_timeout;
    }

    /// Decrements the advertisement timeout and returns the new value.
    pub fn age(&mut self, seconds: i64) -> i64 {
        self.advertisement_timeout = self.advertisement_timeout.saturating_sub(seconds);
        self.advertisement_timeout
    }

    /// The per-service records in profile order.
    #[must_use]
    pub fn services(&self) -> &[Option<ServiceRecord>] {
        &self.services
    }

    /// Returns the service record at `index`, if present.
    #[must_use]
    pub fn service(&self, index: usize) -> Option<&ServiceRecord> {
        self.services.get(index).and_then(Option::as_ref)
    }

    /// Mutable access to the service record at `index`.
    pub fn service_mut(&mut self, index: usize) -> Option<&mut ServiceRecord> {
        self.services.get_mut(index).and_then(Option::as_mut)
    }

    /// Iterates present services with their indices.
    pub fn indexed_services(&self) -> impl Iterator<Item = (usize, &ServiceRecord)> {
        self.services
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|service| (index, service)))
    }

    /// Mutable variant of [`indexed_services`](Self::indexed_services).
    pub fn indexed_services_mut(&mut self) -> impl Iterator<Item = (usize, &mut ServiceRecord)> {
        self.services
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|service| (index, service)))
    }

    /// Clears every subscription id and returns the non-empty ones.
    pub fn take_sids(&mut self) -> Vec<String> {
        self.services
            .iter_mut()
            .flatten()
            .filter_map(ServiceRecord::take_sid)
            .collect()
    }
}
