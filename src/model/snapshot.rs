// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only views of the registry handed out to callers.

use std::fmt;

use serde::Serialize;

use super::{DeviceNode, Udn};

/// A point-in-time copy of one tracked device.
///
/// The `Display` impl renders the identifiers and state tables as a tree:
///
/// ```text
/// Device -- 1
///   |
///   +- UDN            = uuid:cam-1
///   +- DescDocURL     = http://10.0.0.5:49152/description.xml
///   ...
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSnapshot {
    position: usize,
    #[serde(flatten)]
    node: DeviceNode,
    service_names: Vec<String>,
}

impl DeviceSnapshot {
    pub(crate) fn new(position: usize, node: DeviceNode, service_names: Vec<String>) -> Self {
        Self {
            position,
            node,
            service_names,
        }
    }

    /// The 1-based list position at the time of the snapshot.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The copied device node.
    #[must_use]
    pub fn node(&self) -> &DeviceNode {
        &self.node
    }

    /// Consumes the snapshot and returns the node.
    #[must_use]
    pub fn into_node(self) -> DeviceNode {
        self.node
    }
}

impl std::ops::Deref for DeviceSnapshot {
    type Target = DeviceNode;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl fmt::Display for DeviceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.node;
        writeln!(f, "Device -- {}", self.position)?;
        writeln!(f, "  |")?;
        writeln!(f, "  +- UDN            = {}", node.udn())?;
        writeln!(f, "  +- DescDocURL     = {}", node.description_url())?;
        writeln!(f, "  +- FriendlyName   = {}", node.friendly_name())?;
        writeln!(f, "  +- PresURL        = {}", node.presentation_url())?;
        write!(f, "  +- Adver. TimeOut = {}", node.advertisement_timeout())?;

        let count = node.services().len();
        for (index, slot) in node.services().iter().enumerate() {
            let spacer = if index + 1 < count { "  |    " } else { "       " };
            let name = self.service_names.get(index).map_or("?", String::as_str);
            writeln!(f)?;
            writeln!(f, "  |")?;
            write!(f, "  +- {name} Service")?;
            let Some(service) = slot else {
                write!(f, " (not offered)")?;
                continue;
            };
            writeln!(f)?;
            writeln!(f, "{spacer}+- ServiceId       = {}", service.service_id())?;
            writeln!(f, "{spacer}+- ServiceType     = {}", service.service_type())?;
            writeln!(f, "{spacer}+- EventURL        = {}", service.event_url())?;
            writeln!(f, "{spacer}+- ControlURL      = {}", service.control_url())?;
            writeln!(f, "{spacer}+- SID             = {}", service.sid())?;
            write!(f, "{spacer}+- ServiceStateTable")?;
            for (name, value) in service.variables().iter() {
                write!(f, "\n{spacer}     +- {name:<10} = {value}")?;
            }
        }
        Ok(())
    }
}

/// The registry's devices in list order, as of one moment.
///
/// Iteration can be restarted any number of times; positions are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceList {
    entries: Vec<(Udn, String)>,
}

impl DeviceList {
    pub(crate) fn new(entries: Vec<(Udn, String)>) -> Self {
        Self { entries }
    }

    /// Iterates `(position, udn, friendly_name)` in list order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Udn, &str)> + Clone {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, (udn, name))| (index + 1, udn, name.as_str()))
    }

    /// Returns the UDN at a 1-based position.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Udn> {
        position
            .checked_sub(1)
            .and_then(|index| self.entries.get(index))
            .map(|(udn, _)| udn)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for DeviceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Devices:")?;
        if self.entries.is_empty() {
            return write!(f, "\n  <none>");
        }
        for (position, udn, name) in self.iter() {
            write!(f, "\n  {position:>3} -- {udn} ({name})")?;
        }
        Ok(())
    }
}
