// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The boundary between the state manager and the UPnP protocol layer.
//!
//! Outbound, the control point drives the protocol layer through the
//! [`ControlTransport`] trait (subscribe, unsubscribe, search, actions,
//! variable queries, description fetches). Inbound, the protocol layer
//! reports everything that happens as [`UpnpEvent`] values, which the
//! [`EventDispatcher`](crate::dispatcher::EventDispatcher) routes.
//!
//! Calls are "issue" calls: `search`, `send_action` and `get_variable`
//! return once the request is sent. Their outcomes arrive later as events.

mod upnp_event;

#[cfg(test)]
pub(crate) mod recording;

pub use upnp_event::{ErrorCode, UpnpEvent};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProtocolError;
use crate::model::Udn;

/// What a discovery search asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTarget {
    /// Every device of a type URN.
    DeviceType(String),
    /// One specific device.
    Udn(Udn),
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceType(device_type) => f.write_str(device_type),
            Self::Udn(udn) => write!(f, "{udn}"),
        }
    }
}

/// A control action addressed to one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInvocation {
    /// Absolute control URL of the service.
    pub control_url: String,
    /// Service type URN.
    pub service_type: String,
    /// Action name, e.g. `PowerOn`.
    pub action: String,
    /// Arguments in call order.
    pub args: Vec<(String, String)>,
}

/// A subscription accepted by a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedSubscription {
    /// The subscription id assigned by the device.
    pub sid: String,
    /// The timeout actually granted.
    pub timeout: Duration,
}

/// Outbound operations of the UPnP protocol layer.
///
/// Implementations must be cheap to share: the control point holds one
/// behind an `Arc` and calls it from several tasks.
#[async_trait]
pub trait ControlTransport: Send + Sync {
    /// Subscribes to a service's events.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the device refuses or cannot be reached.
    async fn subscribe(
        &self,
        event_url: &str,
        timeout: Duration,
    ) -> Result<GrantedSubscription, ProtocolError>;

    /// Cancels a subscription.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the cancellation could not be sent.
    async fn unsubscribe(&self, sid: &str) -> Result<(), ProtocolError>;

    /// Issues a multicast search; results arrive as
    /// [`UpnpEvent::SearchResult`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the search could not be issued.
    async fn search(&self, wait: Duration, target: SearchTarget) -> Result<(), ProtocolError>;

    /// Issues a control action; completion arrives as
    /// [`UpnpEvent::ActionComplete`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the action could not be issued.
    async fn send_action(&self, action: ActionInvocation) -> Result<(), ProtocolError>;

    /// Issues a state variable query; the answer arrives as
    /// [`UpnpEvent::VariableQueryComplete`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the query could not be issued.
    async fn get_variable(&self, control_url: &str, var_name: &str) -> Result<(), ProtocolError>;

    /// Downloads a device description document.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the document cannot be fetched.
    async fn fetch_description(&self, location: &str) -> Result<String, ProtocolError>;
}
