// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device registry data model.
//!
//! A [`DeviceNode`] is one tracked device: its identity, advertisement
//! timeout and one [`ServiceRecord`] slot per profile service. Callers never
//! see live nodes; they get [`DeviceSnapshot`] copies and [`DeviceList`]
//! listings.

mod device_node;
mod service_record;
mod snapshot;
mod udn;

pub use device_node::DeviceNode;
pub use service_record::{ServiceRecord, VariableTable};
pub use snapshot::{DeviceList, DeviceSnapshot};
pub use udn::Udn;
