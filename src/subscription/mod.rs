// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriptions in both directions.
//!
//! - [`SubscriptionManager`] keeps the control point's event subscriptions
//!   to device services alive (subscribe, renew, cancel).
//! - [`ObserverRegistry`] holds the application's callbacks, registered per
//!   notification kind and removed by [`ObserverId`].
//! - [`Notifier`] feeds every notification to the observers and the
//!   [`EventBus`](crate::event::EventBus).
//!
//! # Usage
//!
//! ```
//! use cctv_ctrlpt::subscription::ObserverRegistry;
//!
//! let observers = ObserverRegistry::new();
//! let id = observers.on_variable_updated(|udn, service, name, value| {
//!     println!("{udn} service {service}: {name} = {value}");
//! });
//!
//! assert!(observers.unsubscribe(id));
//! ```

mod manager;
mod notifier;
mod observer;

pub use manager::SubscriptionManager;
pub use notifier::Notifier;
pub use observer::{ObserverId, ObserverRegistry};
