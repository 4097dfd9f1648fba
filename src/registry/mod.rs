// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device registry.
//!
//! The [`DeviceRegistry`] owns the ordered [`DeviceTable`] behind one lock
//! and is the only place devices are added, refreshed, aged or removed.
//! Notifications go out while the table lock is held; removal cancels the
//! device's subscriptions right after.

mod device_registry;
mod device_table;

pub(crate) use device_registry::SharedTable;
pub use device_registry::{AddOutcome, DeviceRegistry, ServiceEndpoint, SweepReport};
pub use device_table::{AppliedChanges, DeviceTable};
