// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The ordered collection of device nodes guarded by the registry lock.

use crate::model::{DeviceNode, Udn};
use crate::parser::PropertyChange;

/// Variables written by one change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChanges {
    /// The device owning the subscription.
    pub udn: Udn,
    /// Index of the subscribed service.
    pub service_index: usize,
    /// `(name, value)` pairs actually stored, in payload order.
    pub updated: Vec<(String, String)>,
}

/// Devices in insertion order.
///
/// At most one node per UDN. Positions are 1-based and shift when an
/// earlier node is removed.
#[derive(Debug, Default)]
pub struct DeviceTable {
    nodes: Vec<DeviceNode>,
}

impl DeviceTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceNode> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn get(&self, udn: &str) -> Option<&DeviceNode> {
        self.nodes.iter().find(|node| node.udn().as_str() == udn)
    }

    pub fn get_mut(&mut self, udn: &str) -> Option<&mut DeviceNode> {
        self.nodes.iter_mut().find(|node| node.udn().as_str() == udn)
    }

    /// Returns the 1-based list position of a device.
    #[must_use]
    pub fn position_of(&self, udn: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.udn().as_str() == udn)
            .map(|index| index + 1)
    }

    /// Returns the node at a 1-based position.
    #[must_use]
    pub fn at_position(&self, position: usize) -> Option<&DeviceNode> {
        position
            .checked_sub(1)
            .and_then(|index| self.nodes.get(index))
    }

    /// Appends a node. The caller guarantees its UDN is not present yet.
    pub fn push(&mut self, node: DeviceNode) {
        debug_assert!(self.get(node.udn().as_str()).is_none());
        self.nodes.push(node);
    }

    /// Detaches the node with this UDN.
    pub fn remove(&mut self, udn: &str) -> Option<DeviceNode> {
        let index = self
            .nodes
            .iter()
            .position(|node| node.udn().as_str() == udn)?;
        Some(self.nodes.remove(index))
    }

    /// Detaches every node, leaving the table empty.
    pub fn take_all(&mut self) -> Vec<DeviceNode> {
        std::mem::take(&mut self.nodes)
    }

    /// Ages every node by `seconds`.
    ///
    /// Nodes whose timeout drops to zero or below are detached and returned
    /// first; the second list names survivors with less than
    /// `renew_below` seconds left.
    pub fn age_all(&mut self, seconds: i64, renew_below: i64) -> (Vec<DeviceNode>, Vec<Udn>) {
        let mut expired = Vec::new();
        let mut renewing = Vec::new();

        for mut node in std::mem::take(&mut self.nodes) {
            let remaining = node.age(seconds);
            if remaining <= 0 {
                expired.push(node);
            } else {
                if remaining < renew_below {
                    renewing.push(node.udn().clone());
                }
                self.nodes.push(node);
            }
        }

        (expired, renewing)
    }

    /// Stores the recognized variables of a change notification.
    ///
    /// The service is found by subscription id. Returns `None` when no
    /// service holds `sid`.
    pub fn apply_changes(&mut self, sid: &str, changes: &[PropertyChange]) -> Option<AppliedChanges> {
        if sid.is_empty() {
            return None;
        }
        for node in &mut self.nodes {
            let udn = node.udn().clone();
            if let Some((service_index, service)) =
                node.indexed_services_mut().find(|(_, s)| s.sid() == sid)
            {
                let variables = service.variables_mut();
                let updated = changes
                    .iter()
                    .filter(|change| variables.set(&change.name, change.value.as_str()))
                    .map(|change| (change.name.clone(), change.value.clone()))
                    .collect();
                return Some(AppliedChanges {
                    udn,
                    service_index,
                    updated,
                });
            }
        }
        None
    }

    /// Overwrites the subscription id of every service subscribed at
    /// `event_url`. Returns how many services were updated.
    pub fn set_sid_for_event_url(&mut self, event_url: &str, sid: &str) -> usize {
        let mut count = 0;
        for node in &mut self.nodes {
            for (_, service) in node.indexed_services_mut() {
                if service.event_url() == event_url {
                    service.set_sid(sid);
                    count += 1;
                }
            }
        }
        count
    }

    /// Clears the subscription id of services at `event_url`.
    ///
    /// With `only_sid`, only services currently holding that id are cleared.
    pub fn clear_sid_for_event_url(&mut self, event_url: &str, only_sid: Option<&str>) -> usize {
        let mut count = 0;
        for node in &mut self.nodes {
            for (_, service) in node.indexed_services_mut() {
                if service.event_url() == event_url
                    && only_sid.is_none_or(|sid| service.sid() == sid)
                    && service.take_sid().is_some()
                {
                    count += 1;
                }
            }
        }
        count
    }

    /// Records a freshly granted subscription on one service.
    ///
    /// Fails when the node is gone, the slot no longer points at
    /// `event_url`, or the service already holds another subscription.
    /// A slot already holding `sid` (its subscribe completion arrived
    /// first) counts as attached.
    pub fn attach_sid(&mut self, udn: &str, service_index: usize, event_url: &str, sid: &str) -> bool {
        match self
            .get_mut(udn)
            .and_then(|node| node.service_mut(service_index))
        {
            Some(service) if service.event_url() == event_url => {
                if service.sid() == sid {
                    true
                } else if service.is_subscribed() {
                    false
                } else {
                    service.set_sid(sid);
                    true
                }
            }
            _ => false,
        }
    }

    /// Devices with a service controlled at `control_url`.
    #[must_use]
    pub fn udns_for_control_url(&self, control_url: &str) -> Vec<Udn> {
        self.nodes
            .iter()
            .filter(|node| {
                node.indexed_services()
                    .any(|(_, service)| service.control_url() == control_url)
            })
            .map(|node| node.udn().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceProfile;
    use crate::parser::DeviceDescription;
    use crate::protocol::recording::cctv_description;

    fn node(udn: &str, host: &str, timeout: i64) -> DeviceNode {
        let location = format!("http://{host}/description.xml");
        let description =
            DeviceDescription::parse(&cctv_description(udn, host), &location).unwrap();
        DeviceNode::new(&description, &location, timeout, &DeviceProfile::cctv())
    }

    fn table() -> DeviceTable {
        let mut table = DeviceTable::new();
        table.push(node("uuid:a", "10.0.0.1", 100));
        table.push(node("uuid:b", "10.0.0.2", 45));
        table.push(node("uuid:c", "10.0.0.3", 70));
        table
    }

    fn change(name: &str, value: &str) -> PropertyChange {
        PropertyChange {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn positions_are_one_based() {
        let table = table();
        assert!(table.at_position(0).is_none());
        assert_eq!(table.at_position(1).unwrap().udn().as_str(), "uuid:a");
        assert_eq!(table.at_position(3).unwrap().udn().as_str(), "uuid:c");
        assert!(table.at_position(4).is_none());
        assert_eq!(table.position_of("uuid:b"), Some(2));
    }

    #[test]
    fn remove_shifts_positions() {
        let mut table = table();
        assert!(table.remove("uuid:a").is_some());
        assert!(table.remove("uuid:a").is_none());
        assert_eq!(table.at_position(1).unwrap().udn().as_str(), "uuid:b");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn age_all_splits_expired_and_renewing() {
        let mut table = table();
        let (expired, renewing) = table.age_all(30, 60);

        assert!(expired.is_empty());
        assert_eq!(renewing, [Udn::new("uuid:b"), Udn::new("uuid:c")]);

        let (expired, renewing) = table.age_all(30, 60);
        let expired: Vec<_> = expired.iter().map(|n| n.udn().as_str()).collect();
        assert_eq!(expired, ["uuid:b"]);
        assert_eq!(renewing, [Udn::new("uuid:a"), Udn::new("uuid:c")]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.at_position(2).unwrap().udn().as_str(), "uuid:c");
    }

    #[test]
    fn apply_changes_by_sid() {
        let mut table = table();
        table.get_mut("uuid:b").unwrap().service_mut(0).unwrap().set_sid("uuid:sid-b");

        let applied = table
            .apply_changes(
                "uuid:sid-b",
                &[change("Power", "1"), change("Zoom", "4"), change("Temperature", "38")],
            )
            .unwrap();

        assert_eq!(applied.udn, Udn::new("uuid:b"));
        assert_eq!(applied.service_index, 0);
        assert_eq!(
            applied.updated,
            [
                ("Power".to_string(), "1".to_string()),
                ("Temperature".to_string(), "38".to_string())
            ]
        );

        let service = table.get("uuid:b").unwrap().service(0).unwrap();
        assert_eq!(service.variables().get("Power"), Some("1"));
        assert_eq!(service.variables().len(), 2);
    }

    #[test]
    fn apply_changes_unknown_or_empty_sid() {
        let mut table = table();
        assert!(table.apply_changes("uuid:nobody", &[change("Power", "1")]).is_none());
        assert!(table.apply_changes("", &[change("Power", "1")]).is_none());
    }

    #[test]
    fn event_url_matching() {
        let mut table = table();
        let url = "http://10.0.0.2/upnp/event/control1";

        assert_eq!(table.set_sid_for_event_url(url, "uuid:new"), 1);
        assert_eq!(table.get("uuid:b").unwrap().service(0).unwrap().sid(), "uuid:new");

        assert_eq!(table.clear_sid_for_event_url(url, Some("uuid:other")), 0);
        assert_eq!(table.clear_sid_for_event_url(url, Some("uuid:new")), 1);
        assert_eq!(table.clear_sid_for_event_url(url, None), 0);
    }

    #[test]
    fn attach_sid_rejects_vanished_or_taken() {
        let mut table = table();
        let url = "http://10.0.0.1/upnp/event/control1";

        assert!(table.attach_sid("uuid:a", 0, url, "uuid:s1"));
        assert!(!table.attach_sid("uuid:a", 0, url, "uuid:s2"));
        assert!(!table.attach_sid("uuid:zz", 0, url, "uuid:s3"));
        assert!(!table.attach_sid("uuid:b", 0, url, "uuid:s4"));
    }

    #[test]
    fn attach_sid_accepts_same_sid_twice() {
        let mut table = table();
        let url = "http://10.0.0.1/upnp/event/control1";
        table.set_sid_for_event_url(url, "uuid:s1");

        assert!(table.attach_sid("uuid:a", 0, url, "uuid:s1"));
        assert_eq!(table.get("uuid:a").unwrap().service(0).unwrap().sid(), "uuid:s1");
    }

    #[test]
    fn control_url_lookup() {
        let table = table();
        assert_eq!(
            table.udns_for_control_url("http://10.0.0.3/upnp/control/control1"),
            [Udn::new("uuid:c")]
        );
        assert!(table.udns_for_control_url("http://nowhere/").is_empty());
    }
}
