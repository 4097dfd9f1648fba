// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! XML parsing for description documents and event property sets.

mod description;
mod property_set;

pub use description::{DeviceDescription, ServiceDescription};
pub use property_set::{PropertyChange, PropertySet};
