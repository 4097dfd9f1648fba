// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Routing of inbound protocol events.
//!
//! | Event | Effect |
//! |-------|--------|
//! | advertisement alive, search result | fetch description, add or refresh |
//! | advertisement bye-bye | remove the device |
//! | search timeout, action complete | logged |
//! | variable query complete | query result notification |
//! | event received | variable updates by subscription id |
//! | subscribe / renewal complete | record the subscription id |
//! | unsubscribe complete | clear the matching subscription id |
//! | auto-renewal failed, subscription expired | re-subscribe |
//! | device-role requests | ignored |
//!
//! A failure code on an announcement, search result or bye-bye is logged
//! and the event still applied. On other events it is logged and the event
//! dropped.
//!
//! [`EventDispatcher::run`] hands discovery events to their own tasks, so a
//! slow description server never holds up the events queued behind it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::protocol::{ControlTransport, ErrorCode, UpnpEvent};
use crate::registry::DeviceRegistry;

/// Applies inbound [`UpnpEvent`]s to the registry.
#[derive(Clone)]
pub struct EventDispatcher {
    registry: DeviceRegistry,
    transport: Arc<dyn ControlTransport>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new(registry: DeviceRegistry, transport: Arc<dyn ControlTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Handles one event to completion.
    pub async fn dispatch(&self, event: UpnpEvent) {
        match event {
            UpnpEvent::AdvertisementAlive {
                location,
                expires,
                error_code,
            }
            | UpnpEvent::SearchResult {
                location,
                expires,
                error_code,
            } => {
                failed("discovery", error_code);
                self.discovered(&location, expires).await;
            }

            UpnpEvent::AdvertisementByeBye { udn, error_code } => {
                failed("byebye", error_code);
                if !self.registry.remove(udn.as_str()).await {
                    tracing::trace!(udn = %udn, "Bye-bye for unknown device");
                }
            }

            UpnpEvent::SearchTimeout => tracing::debug!("Search window closed"),

            UpnpEvent::ActionComplete {
                control_url,
                action,
                error_code,
            } => {
                if !failed("action", error_code) {
                    tracing::debug!(control_url = %control_url, action = %action, "Action complete");
                }
            }

            UpnpEvent::VariableQueryComplete {
                control_url,
                var_name,
                value,
                error_code,
            } => {
                if failed("variable query", error_code) {
                    return;
                }
                self.registry
                    .report_variable(&control_url, &var_name, &value)
                    .await;
            }

            UpnpEvent::EventReceived {
                sid,
                event_key,
                changed_variables,
            } => {
                tracing::trace!(sid = %sid, event_key, "Change notification");
                self.registry
                    .apply_variable_changes(&sid, &changed_variables)
                    .await;
            }

            UpnpEvent::SubscribeComplete {
                event_url,
                sid,
                timeout,
                error_code,
            }
            | UpnpEvent::RenewalComplete {
                event_url,
                sid,
                timeout,
                error_code,
            } => {
                if failed("subscription", error_code) {
                    return;
                }
                self.registry
                    .subscriptions()
                    .on_renewed(&event_url, &sid, timeout)
                    .await;
            }

            UpnpEvent::UnsubscribeComplete {
                event_url,
                sid,
                error_code,
            } => {
                if failed("unsubscribe", error_code) {
                    return;
                }
                self.registry
                    .subscriptions()
                    .on_unsubscribed(&event_url, &sid)
                    .await;
            }

            UpnpEvent::AutoRenewalFailed { event_url, sid, .. }
            | UpnpEvent::SubscriptionExpired { event_url, sid, .. } => {
                tracing::debug!(event_url = %event_url, sid = %sid, "Subscription lapsed, re-subscribing");
                self.registry
                    .subscriptions()
                    .on_renewal_failed_or_expired(&event_url)
                    .await;
            }

            event @ (UpnpEvent::SubscriptionRequest
            | UpnpEvent::VariableRequest
            | UpnpEvent::ActionRequest) => {
                tracing::trace!(kind = event.kind(), "Ignoring device-role request");
            }
        }
    }

    async fn discovered(&self, location: &str, expires: Duration) {
        let descriptor = match self.transport.fetch_description(location).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::warn!(location, error = %e, "Description fetch failed");
                return;
            }
        };
        if let Err(e) = self
            .registry
            .add_or_refresh(&descriptor, location, expires)
            .await
        {
            tracing::warn!(location, error = %e, "Unusable description document");
        }
    }

    /// Dispatches events from `events` until the channel closes or `cancel`
    /// fires.
    ///
    /// Discovery events run on spawned tasks; everything else is handled in
    /// arrival order. Pending discoveries are awaited before returning, or
    /// abandoned when `cancel` fires.
    pub async fn run(self, mut events: mpsc::Receiver<UpnpEvent>, cancel: CancellationToken) {
        let discoveries = TaskTracker::new();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) if event.is_discovery() => {
                        let dispatcher = self.clone();
                        let cancel = cancel.clone();
                        discoveries.spawn(async move {
                            tokio::select! {
                                biased;
                                () = cancel.cancelled() => {}
                                () = dispatcher.dispatch(event) => {}
                            }
                        });
                    }
                    Some(event) => self.dispatch(event).await,
                    None => break,
                },
            }
        }
        discoveries.close();
        discoveries.wait().await;
        tracing::debug!("Event dispatcher stopped");
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher").finish_non_exhaustive()
    }
}

fn failed(what: &'static str, code: ErrorCode) -> bool {
    if code.is_success() {
        false
    } else {
        tracing::warn!(code = code.0, "{what} reported an error");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlPointConfig;
    use crate::event::ControlPointEvent;
    use crate::model::Udn;
    use crate::protocol::recording::{Call, RecordingTransport, cctv_description};
    use crate::subscription::Notifier;
    use std::sync::atomic::Ordering;

    const LOCATION: &str = "http://10.0.0.1/description.xml";
    const EVENT_URL: &str = "http://10.0.0.1/upnp/event/control1";
    const CONTROL_URL: &str = "http://10.0.0.1/upnp/control/control1";

    fn setup() -> (Arc<RecordingTransport>, DeviceRegistry, EventDispatcher) {
        let transport = Arc::new(
            RecordingTransport::new()
                .with_description(LOCATION, cctv_description("uuid:a", "10.0.0.1")),
        );
        let registry = DeviceRegistry::new(
            transport.clone(),
            Notifier::default(),
            &ControlPointConfig::new(),
        );
        let dispatcher = EventDispatcher::new(registry.clone(), transport.clone());
        (transport, registry, dispatcher)
    }

    fn alive(location: &str, code: i32) -> UpnpEvent {
        UpnpEvent::AdvertisementAlive {
            location: location.to_string(),
            expires: Duration::from_secs(1801),
            error_code: ErrorCode(code),
        }
    }

    async fn sid(registry: &DeviceRegistry) -> String {
        registry
            .lookup_by_position(1)
            .await
            .unwrap()
            .service(0)
            .unwrap()
            .sid()
            .to_string()
    }

    #[tokio::test]
    async fn discovery_fetches_and_adds() {
        let (transport, registry, dispatcher) = setup();

        dispatcher.dispatch(alive(LOCATION, 0)).await;
        dispatcher
            .dispatch(UpnpEvent::SearchResult {
                location: LOCATION.to_string(),
                expires: Duration::from_secs(900),
                error_code: ErrorCode::SUCCESS,
            })
            .await;

        assert_eq!(registry.len().await, 1);
        assert_eq!(
            registry.lookup_by_position(1).await.unwrap().advertisement_timeout(),
            900
        );
        let fetches = transport
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Fetch(_)))
            .count();
        assert_eq!(fetches, 2);
    }

    #[tokio::test]
    async fn discovery_with_error_code_still_adds() {
        let (transport, registry, dispatcher) = setup();
        dispatcher.dispatch(alive(LOCATION, -1)).await;
        assert_eq!(registry.len().await, 1);
        assert!(transport.calls().contains(&Call::Fetch(LOCATION.to_string())));
    }

    #[tokio::test]
    async fn byebye_with_error_code_still_removes() {
        let (_transport, registry, dispatcher) = setup();
        dispatcher.dispatch(alive(LOCATION, 0)).await;

        dispatcher
            .dispatch(UpnpEvent::AdvertisementByeBye {
                udn: Udn::new("uuid:a"),
                error_code: ErrorCode(-1),
            })
            .await;

        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn fetch_failure_is_dropped() {
        let (_transport, registry, dispatcher) = setup();
        dispatcher.dispatch(alive("http://10.9.9.9/missing.xml", 0)).await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn byebye_removes() {
        let (transport, registry, dispatcher) = setup();
        dispatcher.dispatch(alive(LOCATION, 0)).await;

        let byebye = UpnpEvent::AdvertisementByeBye {
            udn: Udn::new("uuid:a"),
            error_code: ErrorCode::SUCCESS,
        };
        dispatcher.dispatch(byebye.clone()).await;
        dispatcher.dispatch(byebye).await;

        assert!(registry.is_empty().await);
        assert_eq!(transport.unsubscribed(), ["uuid:sid-1"]);
    }

    #[tokio::test]
    async fn event_received_updates_variables() {
        let (_transport, registry, dispatcher) = setup();
        dispatcher.dispatch(alive(LOCATION, 0)).await;
        let mut rx = registry.notifier().bus().subscribe();

        dispatcher
            .dispatch(UpnpEvent::EventReceived {
                sid: "uuid:sid-1".to_string(),
                event_key: 1,
                changed_variables: "<e:propertyset xmlns:e=\"urn:schemas-upnp-org:event-1-0\">\
                    <e:property><Temperature>37</Temperature></e:property>\
                    </e:propertyset>"
                    .to_string(),
            })
            .await;

        assert_eq!(
            rx.try_recv().unwrap(),
            ControlPointEvent::variable_updated(Udn::new("uuid:a"), 0, "Temperature", "37")
        );
    }

    #[tokio::test]
    async fn renewal_and_unsubscribe_complete() {
        let (_transport, registry, dispatcher) = setup();
        dispatcher.dispatch(alive(LOCATION, 0)).await;

        dispatcher
            .dispatch(UpnpEvent::RenewalComplete {
                event_url: EVENT_URL.to_string(),
                sid: "uuid:renewed".to_string(),
                timeout: Duration::from_secs(1801),
                error_code: ErrorCode::SUCCESS,
            })
            .await;
        assert_eq!(sid(&registry).await, "uuid:renewed");

        dispatcher
            .dispatch(UpnpEvent::SubscribeComplete {
                event_url: EVENT_URL.to_string(),
                sid: "uuid:ignored".to_string(),
                timeout: Duration::from_secs(1801),
                error_code: ErrorCode(-5),
            })
            .await;
        assert_eq!(sid(&registry).await, "uuid:renewed");

        dispatcher
            .dispatch(UpnpEvent::UnsubscribeComplete {
                event_url: EVENT_URL.to_string(),
                sid: "uuid:renewed".to_string(),
                error_code: ErrorCode::SUCCESS,
            })
            .await;
        assert_eq!(sid(&registry).await, "");
    }

    #[tokio::test]
    async fn expiry_resubscribes() {
        let (transport, registry, dispatcher) = setup();
        dispatcher.dispatch(alive(LOCATION, 0)).await;

        dispatcher
            .dispatch(UpnpEvent::SubscriptionExpired {
                event_url: EVENT_URL.to_string(),
                sid: "uuid:sid-1".to_string(),
                error_code: ErrorCode::SUCCESS,
            })
            .await;

        assert_eq!(sid(&registry).await, "uuid:sid-2");
        let subscribes = transport
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Subscribe(_)))
            .count();
        assert_eq!(subscribes, 2);
    }

    #[tokio::test]
    async fn variable_query_result_is_notified() {
        let (_transport, registry, dispatcher) = setup();
        dispatcher.dispatch(alive(LOCATION, 0)).await;
        let mut rx = registry.notifier().bus().subscribe();

        dispatcher
            .dispatch(UpnpEvent::VariableQueryComplete {
                control_url: CONTROL_URL.to_string(),
                var_name: "Power".to_string(),
                value: "1".to_string(),
                error_code: ErrorCode::SUCCESS,
            })
            .await;

        assert_eq!(
            rx.try_recv().unwrap(),
            ControlPointEvent::variable_query_result(Udn::new("uuid:a"), "Power", "1")
        );
    }

    #[tokio::test]
    async fn device_role_requests_change_nothing() {
        let (transport, registry, dispatcher) = setup();
        for event in [
            UpnpEvent::SubscriptionRequest,
            UpnpEvent::VariableRequest,
            UpnpEvent::ActionRequest,
            UpnpEvent::SearchTimeout,
        ] {
            dispatcher.dispatch(event).await;
        }
        assert!(registry.is_empty().await);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn hung_description_fetch_does_not_block_later_events() {
        let (transport, registry, dispatcher) = setup();
        dispatcher.dispatch(alive(LOCATION, 0)).await;
        transport.hang_fetch.store(true, Ordering::SeqCst);
        let mut rx = registry.notifier().bus().subscribe();

        let (tx, events) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(dispatcher.run(events, cancel.clone()));

        tx.send(alive("http://10.0.0.2/description.xml", 0))
            .await
            .unwrap();
        tx.send(UpnpEvent::EventReceived {
            sid: "uuid:sid-1".to_string(),
            event_key: 1,
            changed_variables: "<e:propertyset xmlns:e=\"urn:schemas-upnp-org:event-1-0\">\
                <e:property><Power>1</Power></e:property>\
                </e:propertyset>"
                .to_string(),
        })
        .await
        .unwrap();

        let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("change notification should not wait for the fetch")
            .unwrap();
        assert_eq!(
            update,
            ControlPointEvent::variable_updated(Udn::new("uuid:a"), 0, "Power", "1")
        );

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn run_drains_channel_until_closed() {
        let (_transport, registry, dispatcher) = setup();
        let (tx, rx) = mpsc::channel(8);

        tx.send(alive(LOCATION, 0)).await.unwrap();
        drop(tx);
        dispatcher.run(rx, CancellationToken::new()).await;

        assert_eq!(registry.len().await, 1);
    }
}
