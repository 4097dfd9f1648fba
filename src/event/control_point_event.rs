// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notifications emitted by the control point.

use serde::Serialize;

use crate::model::Udn;

/// A change in the control point's view of the network.
///
/// Every notification names the device it concerns.
///
/// # Examples
///
/// ```
/// use cctv_ctrlpt::event::ControlPointEvent;
/// use cctv_ctrlpt::model::Udn;
///
/// let event = ControlPointEvent::variable_updated(Udn::new("uuid:cam"), 0, "Power", "1");
/// assert_eq!(event.udn().as_str(), "uuid:cam");
/// assert!(!event.is_lifecycle());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlPointEvent {
    /// A device was added to the registry.
    DeviceAdded {
        /// The added device.
        udn: Udn,
    },

    /// A device was removed from the registry.
    DeviceRemoved {
        /// The removed device.
        udn: Udn,
    },

    /// A subscribed state variable changed.
    VariableUpdated {
        /// The device owning the service.
        udn: Udn,
        /// Index of the service in the device profile.
        service_index: usize,
        /// The variable name.
        name: String,
        /// The new value.
        value: String,
    },

    /// A state variable query answered.
    VariableQueryResult {
        /// The queried device.
        udn: Udn,
        /// The variable name.
        name: String,
        /// The reported value.
        value: String,
    },
}

impl ControlPointEvent {
    /// Returns the device this notification concerns.
    #[must_use]
    pub fn udn(&self) -> &Udn {
        match self {
            Self::DeviceAdded { udn }
            | Self::DeviceRemoved { udn }
            | Self::VariableUpdated { udn, .. }
            | Self::VariableQueryResult { udn, .. } => udn,
        }
    }

    /// Returns `true` for device added/removed notifications.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::DeviceAdded { .. } | Self::DeviceRemoved { .. })
    }

    /// Creates a device added notification.
    #[must_use]
    pub fn device_added(udn: Udn) -> Self {
        Self::DeviceAdded { udn }
    }

    /// Creates a device removed notification.
    #[must_use]
    pub fn device_removed(udn: Udn) -> Self {
        Self::DeviceRemoved { udn }
    }

    /// Creates a variable updated notification.
    #[must_use]
    pub fn variable_updated(
        udn: Udn,
        service_index: usize,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::VariableUpdated {
            udn,
            service_index,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a variable query result notification.
    #[must_use]
    pub fn variable_query_result(
        udn: Udn,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::VariableQueryResult {
            udn,
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udn_accessor_covers_all_variants() {
        let udn = Udn::new("uuid:cam");
        let events = [
            ControlPointEvent::device_added(udn.clone()),
            ControlPointEvent::device_removed(udn.clone()),
            ControlPointEvent::variable_updated(udn.clone(), 0, "Power", "0"),
            ControlPointEvent::variable_query_result(udn.clone(), "Power", "0"),
        ];
        for event in &events {
            assert_eq!(event.udn(), &udn);
        }
        assert!(events[0].is_lifecycle());
        assert!(events[1].is_lifecycle());
        assert!(!events[3].is_lifecycle());
    }

    #[test]
    fn serializes_with_kind_tag() {
        let event = ControlPointEvent::variable_updated(Udn::new("uuid:cam"), 0, "Temperature", "40");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "variable_updated");
        assert_eq!(json["udn"], "uuid:cam");
        assert_eq!(json["value"], "40");
    }
}
