// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound notifications.
//!
//! The control point reports device additions, removals and state variable
//! changes as [`ControlPointEvent`]s. They are published on an [`EventBus`]
//! (tokio broadcast) and also handed to synchronous callbacks registered in
//! an [`ObserverRegistry`](crate::subscription::ObserverRegistry).
//!
//! # Examples
//!
//! ```
//! use cctv_ctrlpt::event::{ControlPointEvent, EventBus};
//! use cctv_ctrlpt::model::Udn;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(ControlPointEvent::device_removed(Udn::new("uuid:cam")));
//! assert!(rx.try_recv().unwrap().is_lifecycle());
//! ```

mod control_point_event;
mod event_bus;

pub use control_point_event::ControlPointEvent;
pub use event_bus::EventBus;
