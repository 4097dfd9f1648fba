// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic advertisement expiry.
//!
//! Every interval the sweeper ages each device's advertisement timeout by
//! the interval length. Devices at or below zero are removed. Devices with
//! less than two intervals left get a targeted search so a live device
//! re-announces itself before it expires.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::protocol::{ControlTransport, SearchTarget};
use crate::registry::{DeviceRegistry, SweepReport};

/// Ages advertisements on a fixed interval.
#[derive(Clone)]
pub struct TimeoutSweeper {
    registry: DeviceRegistry,
    transport: Arc<dyn ControlTransport>,
    interval: Duration,
}

impl TimeoutSweeper {
    /// Creates a sweeper. A zero interval is treated as one second.
    #[must_use]
    pub fn new(
        registry: DeviceRegistry,
        transport: Arc<dyn ControlTransport>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one sweep and issues renewal searches.
    ///
    /// Each renewal search asks for one UDN and waits one interval for
    /// answers. Search failures are logged.
    pub async fn tick(&self) -> SweepReport {
        let report = self.registry.sweep(self.interval).await;
        for udn in &report.renewing {
            tracing::debug!(udn = %udn, "Advertisement about to expire, searching");
            if let Err(e) = self
                .transport
                .search(self.interval, SearchTarget::Udn(udn.clone()))
                .await
            {
                tracing::warn!(udn = %udn, error = %e, "Renewal search failed");
            }
        }
        report
    }

    /// Sweeps every interval until `cancel` fires.
    ///
    /// The first sweep happens one full interval after the call.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::debug!("Timeout sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }
}

impl std::fmt::Debug for TimeoutSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutSweeper")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlPointConfig;
    use crate::model::Udn;
    use crate::protocol::recording::{RecordingTransport, cctv_description};
    use crate::subscription::Notifier;

    const INTERVAL: Duration = Duration::from_secs(30);

    async fn setup(expires: u64) -> (Arc<RecordingTransport>, DeviceRegistry, TimeoutSweeper) {
        let transport = Arc::new(RecordingTransport::new());
        let registry = DeviceRegistry::new(
            transport.clone(),
            Notifier::default(),
            &ControlPointConfig::new(),
        );
        registry
            .add_or_refresh(
                &cctv_description("uuid:a", "10.0.0.1"),
                "http://10.0.0.1/description.xml",
                Duration::from_secs(expires),
            )
            .await
            .unwrap();
        let sweeper = TimeoutSweeper::new(registry.clone(), transport.clone(), INTERVAL);
        (transport, registry, sweeper)
    }

    #[tokio::test]
    async fn tick_searches_for_devices_about_to_expire() {
        let (transport, _registry, sweeper) = setup(100).await;

        let report = sweeper.tick().await;
        assert!(report.renewing.is_empty());
        assert!(transport.searches().is_empty());

        let report = sweeper.tick().await;
        assert_eq!(report.renewing, [Udn::new("uuid:a")]);
        assert_eq!(transport.searches(), [SearchTarget::Udn(Udn::new("uuid:a"))]);
    }

    #[tokio::test]
    async fn tick_removes_expired() {
        let (_transport, registry, sweeper) = setup(30).await;

        let report = sweeper.tick().await;
        assert_eq!(report.expired, [Udn::new("uuid:a")]);
        assert!(registry.is_empty().await);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let transport = Arc::new(RecordingTransport::new());
        let registry = DeviceRegistry::new(
            transport.clone(),
            Notifier::default(),
            &ControlPointConfig::new(),
        );
        let sweeper = TimeoutSweeper::new(registry, transport, Duration::ZERO);
        assert_eq!(sweeper.interval(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn run_sweeps_on_interval_and_stops_on_cancel() {
        let (_transport, registry, sweeper) = setup(70).await;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sweeper.run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(
            registry.lookup_by_position(1).await.unwrap().advertisement_timeout(),
            40
        );

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(registry.is_empty().await);

        cancel.cancel();
        handle.await.unwrap();
    }
}
