// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `cctv_ctrlpt` - UPnP control point state for CCTV devices.
//!
//! This library keeps the control point side of a UPnP network consistent:
//! which devices are present, which of their services the control point is
//! subscribed to, and the last known value of every evented state variable.
//! The wire protocol (SSDP, GENA, SOAP) stays in a protocol layer that the
//! library drives through [`protocol::ControlTransport`] and that reports
//! back with [`protocol::UpnpEvent`]s.
//!
//! # Features
//!
//! - **Device registry**: ordered cache of discovered devices with 1-based
//!   positions and advertisement timeouts
//! - **Subscriptions**: one event subscription per service, renewed or
//!   re-established when the device reports trouble
//! - **Expiry**: periodic sweep that re-searches devices about to expire and
//!   drops the ones that stopped announcing themselves
//! - **Notifications**: device added/removed and variable updates, through
//!   a broadcast bus or synchronous callbacks
//! - **Control**: actions and state variable queries by device position
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use cctv_ctrlpt::{CctvAction, ControlPoint, ControlPointConfig, ControlPointEvent};
//! use cctv_ctrlpt::protocol::ControlTransport;
//!
//! # async fn run(transport: Arc<dyn ControlTransport>) -> cctv_ctrlpt::Result<()> {
//! let cp = ControlPoint::start(transport, ControlPointConfig::new()).await;
//! let mut events = cp.subscribe();
//!
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         ControlPointEvent::DeviceAdded { udn } => {
//!             let device = cp.device_by_udn(udn.as_str()).await?;
//!             cp.send_cctv_action(device.position(), CctvAction::PowerOn).await?;
//!         }
//!         ControlPointEvent::VariableUpdated { udn, name, value, .. } => {
//!             println!("{udn}: {name} = {value}");
//!         }
//!         _ => {}
//!     }
//! }
//!
//! cp.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Feeding protocol events
//!
//! The protocol layer usually calls back on its own threads. Hand it the
//! sender from [`ControlPoint::event_sender`] and forward every callback:
//!
//! ```no_run
//! use cctv_ctrlpt::protocol::{ErrorCode, UpnpEvent};
//! # fn forward(cp: &cctv_ctrlpt::ControlPoint) {
//! let inbound = cp.event_sender();
//! std::thread::spawn(move || {
//!     let _ = inbound.blocking_send(UpnpEvent::AdvertisementByeBye {
//!         udn: "uuid:cam-1".into(),
//!         error_code: ErrorCode::SUCCESS,
//!     });
//! });
//! # }
//! ```

pub mod config;
pub mod control_point;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod model;
pub mod parser;
pub mod protocol;
pub mod registry;
pub mod subscription;
pub mod sweeper;

pub use config::{ControlPointConfig, DeviceProfile, ServiceProfile};
pub use control_point::{CctvAction, ControlPoint};
pub use dispatcher::EventDispatcher;
pub use error::{Error, ParseError, ProtocolError, Result};
pub use event::{ControlPointEvent, EventBus};
pub use model::{DeviceList, DeviceSnapshot, Udn};
pub use protocol::{ControlTransport, ErrorCode, SearchTarget, UpnpEvent};
pub use registry::{DeviceRegistry, SweepReport};
pub use subscription::{ObserverId, ObserverRegistry};
pub use sweeper::TimeoutSweeper;
