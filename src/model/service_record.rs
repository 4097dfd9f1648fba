// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-service subscription and state table.

use serde::Serialize;

use crate::config::ServiceProfile;
use crate::parser::ServiceDescription;

/// Ordered table of state variables for one service.
///
/// The set of names is fixed when the table is created; only values change
/// afterwards. Every variable starts out as an empty string.
///
/// # Examples
///
/// ```
/// use cctv_ctrlpt::model::VariableTable;
///
/// let mut table = VariableTable::new(["Power", "Temperature"]);
/// assert_eq!(table.get("Power"), Some(""));
///
/// assert!(table.set("Power", "1"));
/// assert!(!table.set("Volume", "7"));
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableTable {
    entries: Vec<(String, String)>,
}

impl VariableTable {
    /// Creates a table with every variable set to the empty string.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: names
                .into_iter()
                .map(|name| (name.into(), String::new()))
                .collect(),
        }
    }

    /// Returns the value of a variable, if the name is part of the table.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrites a variable value.
    ///
    /// Returns `false` and leaves the table untouched when `name` is not
    /// one of the table's variables.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => {
                *v = value.into();
                true
            }
            None => false,
        }
    }

    /// Returns true if `name` is one of the table's variables.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Iterates `(name, value)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A subscribed (or subscribable) service of a tracked device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRecord {
    service_id: String,
    service_type: String,
    event_url: String,
    control_url: String,
    sid: String,
    variables: VariableTable,
}

impl ServiceRecord {
    /// Creates an unsubscribed record from a parsed service description.
    #[must_use]
    pub fn new(description: &ServiceDescription, profile: &ServiceProfile) -> Self {
        Self {
            service_id: description.service_id.clone(),
            service_type: profile.service_type().to_string(),
            event_url: description.event_url.clone(),
            control_url: description.control_url.clone(),
            sid: String::new(),
            variables: VariableTable::new(profile.variables().iter().cloned()),
        }
    }

    /// The service id announced by the device.
    #[must_use]
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// The service type URN.
    #[must_use]
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// The absolute event subscription URL.
    #[must_use]
    pub fn event_url(&self) -> &str {
        &self.event_url
    }

    /// The absolute control URL.
    #[must_use]
    pub fn control_url(&self) -> &str {
        &self.control_url
    }

    /// The current subscription id; empty when unsubscribed.
    #[must_use]
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Returns true while a subscription is believed active.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        !self.sid.is_empty()
    }

    /// Replaces the subscription id.
    pub fn set_sid(&mut self, sid: impl Into<String>) {
        self.sid = sid.into();
    }

    /// Clears the subscription id and returns the previous one, if any.
    pub fn take_sid(&mut self) -> Option<String> {
        if self.sid.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.sid))
        }
    }

    /// The state variable table.
    #[must_use]
    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    /// Mutable access to the state variable values.
    pub fn variables_mut(&mut self) -> &mut VariableTable {
        &mut self.variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control_record() -> ServiceRecord {
        let description = ServiceDescription {
            service_type: "urn:schemas-upnp-org:service:cctvcontrol:1".to_string(),
            service_id: "urn:upnp-org:serviceId:control1".to_string(),
            control_url: "http://10.0.0.5:49152/upnp/control/control1".to_string(),
            event_url: "http://10.0.0.5:49152/upnp/event/control1".to_string(),
        };
        let profile = ServiceProfile::new(
            "Control",
            "urn:schemas-upnp-org:service:cctvcontrol:1",
            ["Power", "Temperature"],
        );
        ServiceRecord::new(&description, &profile)
    }

    #[test]
    fn new_record_is_unsubscribed_with_empty_values() {
        let record = control_record();
        assert!(!record.is_subscribed());
        assert_eq!(record.sid(), "");
        assert_eq!(
            record.variables().iter().collect::<Vec<_>>(),
            [("Power", ""), ("Temperature", "")]
        );
    }

    #[test]
    fn take_sid_clears() {
        let mut record = control_record();
        record.set_sid("uuid:sub-1");
        assert!(record.is_subscribed());

        assert_eq!(record.take_sid().as_deref(), Some("uuid:sub-1"));
        assert!(!record.is_subscribed());
        assert_eq!(record.take_sid(), None);
    }

    #[test]
    fn unknown_variable_is_not_added() {
        let mut record = control_record();
        assert!(!record.variables_mut().set("Zoom", "3"));
        assert_eq!(record.variables().len(), 2);
        assert!(!record.variables().contains("Zoom"));
    }

    #[test]
    fn set_overwrites_last_write_wins() {
        let mut table = VariableTable::new(["Power"]);
        table.set("Power", "1");
        table.set("Power", "0");
        assert_eq!(table.get("Power"), Some("0"));
    }
}
