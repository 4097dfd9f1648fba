// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Control point configuration.
//!
//! [`ControlPointConfig`] carries the timing knobs (sweep interval,
//! subscription timeout, search wait) and the [`DeviceProfile`] describing
//! which device type is tracked and which services and state variables it
//! exposes.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use cctv_ctrlpt::config::ControlPointConfig;
//!
//! let config = ControlPointConfig::new()
//!     .with_sweep_interval(Duration::from_secs(15))
//!     .with_subscription_timeout(Duration::from_secs(600));
//!
//! assert_eq!(config.sweep_interval(), Duration::from_secs(15));
//! assert_eq!(config.profile().services().len(), 1);
//! ```

use std::time::Duration;

use serde::Deserialize;

/// Default interval between advertisement sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Default timeout requested when subscribing to a service.
const DEFAULT_SUBSCRIPTION_TIMEOUT: Duration = Duration::from_secs(1801);

/// Default time devices get to answer a broadcast search.
const DEFAULT_SEARCH_WAIT: Duration = Duration::from_secs(5);

/// Default capacity of the notification bus and inbound event queue.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Device type of the CCTV camera device.
pub const CCTV_DEVICE_TYPE: &str = "urn:schemas-upnp-org:device:cctvdevice:1";

/// Service type of the CCTV control service.
pub const CCTV_CONTROL_SERVICE_TYPE: &str = "urn:schemas-upnp-org:service:cctvcontrol:1";

/// Index of the control service within the CCTV profile.
pub const CCTV_SERVICE_CONTROL: usize = 0;

/// A service the control point subscribes to, with its fixed variable set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceProfile {
    name: String,
    service_type: String,
    variables: Vec<String>,
}

impl ServiceProfile {
    /// Creates a service profile.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, service_type: impl Into<String>, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            service_type: service_type.into(),
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }

    /// Human readable service name used in logs and printouts.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The service type URN matched against description documents.
    #[must_use]
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// The state variable names, in table order.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// The device type tracked by the control point and its services.
///
/// Service order is significant: a service's position in this list is the
/// `service_index` used by actions, variable queries and notifications.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceProfile {
    device_type: String,
    services: Vec<ServiceProfile>,
}

impl DeviceProfile {
    /// Creates a device profile.
    #[must_use]
    pub fn new(device_type: impl Into<String>, services: Vec<ServiceProfile>) -> Self {
        Self {
            device_type: device_type.into(),
            services,
        }
    }

    /// The CCTV camera profile: one control service with `Power` and
    /// `Temperature` variables.
    #[must_use]
    pub fn cctv() -> Self {
        Self::new(
            CCTV_DEVICE_TYPE,
            vec![ServiceProfile::new(
                "Control",
                CCTV_CONTROL_SERVICE_TYPE,
                ["Power", "Temperature"],
            )],
        )
    }

    /// The recognized device type URN.
    #[must_use]
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    /// The services, in index order.
    #[must_use]
    pub fn services(&self) -> &[ServiceProfile] {
        &self.services
    }

    /// Returns the service profile at `index`.
    #[must_use]
    pub fn service(&self, index: usize) -> Option<&ServiceProfile> {
        self.services.get(index)
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::cctv()
    }
}

/// Configuration for a [`ControlPoint`](crate::control_point::ControlPoint).
#[derive(Debug, Clone)]
pub struct ControlPointConfig {
    sweep_interval: Duration,
    subscription_timeout: Duration,
    search_wait: Duration,
    event_capacity: usize,
    inbound_capacity: usize,
    profile: DeviceProfile,
}

impl ControlPointConfig {
    /// Creates a configuration with default settings.
    ///
    /// Defaults: 30 s sweep interval, 1801 s subscription timeout, 5 s
    /// search wait, CCTV device profile.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            subscription_timeout: DEFAULT_SUBSCRIPTION_TIMEOUT,
            search_wait: DEFAULT_SEARCH_WAIT,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
            inbound_capacity: DEFAULT_CHANNEL_CAPACITY,
            profile: DeviceProfile::default(),
        }
    }

    /// Sets how often advertisement timeouts are aged.
    ///
    /// A zero interval is replaced by one second.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval.max(Duration::from_secs(1));
        self
    }

    /// Sets the timeout requested for event subscriptions.
    #[must_use]
    pub fn with_subscription_timeout(mut self, timeout: Duration) -> Self {
        self.subscription_timeout = timeout;
        self
    }

    /// Sets how long devices get to answer a broadcast search.
    #[must_use]
    pub fn with_search_wait(mut self, wait: Duration) -> Self {
        self.search_wait = wait;
        self
    }

    /// Sets the buffer size of the notification bus.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Sets the buffer size of the inbound protocol event queue.
    #[must_use]
    pub fn with_inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = capacity.max(1);
        self
    }

    /// Sets the tracked device profile.
    #[must_use]
    pub fn with_profile(mut self, profile: DeviceProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Returns the sweep interval.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Returns the requested subscription timeout.
    #[must_use]
    pub fn subscription_timeout(&self) -> Duration {
        self.subscription_timeout
    }

    /// Returns the broadcast search wait.
    #[must_use]
    pub fn search_wait(&self) -> Duration {
        self.search_wait
    }

    /// Returns the notification bus capacity.
    #[must_use]
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    /// Returns the inbound event queue capacity.
    #[must_use]
    pub fn inbound_capacity(&self) -> usize {
        self.inbound_capacity
    }

    /// Returns the device profile.
    #[must_use]
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }
}

impl Default for ControlPointConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ControlPointConfig::default();
        assert_eq!(config.sweep_interval(), Duration::from_secs(30));
        assert_eq!(config.subscription_timeout(), Duration::from_secs(1801));
        assert_eq!(config.search_wait(), Duration::from_secs(5));
        assert_eq!(config.event_capacity(), 256);
        assert_eq!(config.profile(), &DeviceProfile::cctv());
    }

    #[test]
    fn zero_sweep_interval_is_clamped() {
        let config = ControlPointConfig::new().with_sweep_interval(Duration::ZERO);
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn cctv_profile_layout() {
        let profile = DeviceProfile::cctv();
        assert_eq!(profile.device_type(), CCTV_DEVICE_TYPE);

        let control = profile.service(CCTV_SERVICE_CONTROL).unwrap();
        assert_eq!(control.name(), "Control");
        assert_eq!(control.service_type(), CCTV_CONTROL_SERVICE_TYPE);
        assert_eq!(control.variables(), ["Power", "Temperature"]);
        assert!(profile.service(1).is_none());
    }

    #[test]
    fn profile_deserializes_from_json() {
        let json = r#"{
            "device_type": "urn:example:device:lamp:1",
            "services": [
                { "name": "Switch", "service_type": "urn:example:service:switch:1", "variables": ["On"] }
            ]
        }"#;

        let profile: DeviceProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.device_type(), "urn:example:device:lamp:1");
        assert_eq!(profile.services()[0].variables(), ["On"]);
    }

    #[test]
    fn builder_chain() {
        let config = ControlPointConfig::new()
            .with_search_wait(Duration::from_secs(2))
            .with_inbound_capacity(0)
            .with_profile(DeviceProfile::new("urn:x:device:y:1", Vec::new()));

        assert_eq!(config.search_wait(), Duration::from_secs(2));
        assert_eq!(config.inbound_capacity(), 1);
        assert!(config.profile().services().is_empty());
    }
}
