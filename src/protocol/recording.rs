// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory transport that records calls, for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::{ActionInvocation, ControlTransport, GrantedSubscription, SearchTarget};
use crate::error::ProtocolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Subscribe(String),
    Unsubscribe(String),
    Search(Duration, SearchTarget),
    Action(ActionInvocation),
    GetVariable(String, String),
    Fetch(String),
}

#[derive(Default)]
pub(crate) struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    descriptions: Mutex<HashMap<String, String>>,
    next_sid: AtomicU32,
    pub(crate) fail_subscribe: AtomicBool,
    pub(crate) fail_calls: AtomicBool,
    pub(crate) hang_fetch: AtomicBool,
    unsubscribe_gate: Mutex<Option<Arc<Notify>>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_description(self, location: &str, xml: String) -> Self {
        self.descriptions.lock().insert(location.to_string(), xml);
        self
    }

    /// Makes every later unsubscribe wait until the returned gate is
    /// notified.
    pub(crate) fn hold_unsubscribes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.unsubscribe_gate.lock() = Some(gate.clone());
        gate
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn unsubscribed(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Unsubscribe(sid) => Some(sid.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn searches(&self) -> Vec<SearchTarget> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Search(_, target) => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> Result<(), ProtocolError> {
        self.calls.lock().push(call);
        if self.fail_calls.load(Ordering::SeqCst) {
            Err(ProtocolError::CallFailed {
                operation: "test",
                code: -1,
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ControlTransport for RecordingTransport {
    async fn subscribe(
        &self,
        event_url: &str,
        timeout: Duration,
    ) -> Result<GrantedSubscription, ProtocolError> {
        self.calls.lock().push(Call::Subscribe(event_url.to_string()));
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(ProtocolError::CallFailed {
                operation: "subscribe",
                code: -301,
            });
        }
        let n = self.next_sid.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GrantedSubscription {
            sid: format!("uuid:sid-{n}"),
            timeout,
        })
    }

    async fn unsubscribe(&self, sid: &str) -> Result<(), ProtocolError> {
        let result = self.record(Call::Unsubscribe(sid.to_string()));
        let gate = self.unsubscribe_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }

    async fn search(&self, wait: Duration, target: SearchTarget) -> Result<(), ProtocolError> {
        self.record(Call::Search(wait, target))
    }

    async fn send_action(&self, action: ActionInvocation) -> Result<(), ProtocolError> {
        self.record(Call::Action(action))
    }

    async fn get_variable(&self, control_url: &str, var_name: &str) -> Result<(), ProtocolError> {
        self.record(Call::GetVariable(
            control_url.to_string(),
            var_name.to_string(),
        ))
    }

    async fn fetch_description(&self, location: &str) -> Result<String, ProtocolError> {
        self.calls.lock().push(Call::Fetch(location.to_string()));
        if self.hang_fetch.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        self.descriptions
            .lock()
            .get(location)
            .cloned()
            .ok_or_else(|| ProtocolError::ConnectionFailed(location.to_string()))
    }
}

/// A CCTV description document served from `http://{host}/description.xml`.
pub(crate) fn cctv_description(udn: &str, host: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <URLBase>http://{host}/</URLBase>
  <device>
    <deviceType>urn:schemas-upnp-org:device:cctvdevice:1</deviceType>
    <friendlyName>Camera {udn}</friendlyName>
    <UDN>{udn}</UDN>
    <presentationURL>/ui</presentationURL>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:cctvcontrol:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:control1</serviceId>
        <controlURL>/upnp/control/control1</controlURL>
        <eventSubURL>/upnp/event/control1</eventSubURL>
      </service>
    </serviceList>
  </device>
</root>"#
    )
}
