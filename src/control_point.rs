// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The control point facade.
//!
//! [`ControlPoint`] wires the registry, the subscription manager, the
//! timeout sweeper and the event dispatcher together and exposes the
//! operations an application calls: removal, refresh, actions, variable
//! queries and device listings.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::{CCTV_SERVICE_CONTROL, ControlPointConfig};
use crate::dispatcher::EventDispatcher;
use crate::error::{Error, Result};
use crate::event::{ControlPointEvent, EventBus};
use crate::model::{DeviceList, DeviceSnapshot};
use crate::protocol::{ActionInvocation, ControlTransport, SearchTarget, UpnpEvent};
use crate::registry::{DeviceRegistry, SweepReport};
use crate::subscription::{Notifier, ObserverRegistry};
use crate::sweeper::TimeoutSweeper;

/// Argument-less actions of the CCTV control service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CctvAction {
    PowerOn,
    PowerOff,
    Reboot,
    BottomMountLeft,
    BottomMountRight,
    BottomMountMiddle,
    TopMountUp,
    TopMountDown,
    TopMountMiddle,
}

impl CctvAction {
    /// Every action, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::PowerOn,
        Self::PowerOff,
        Self::Reboot,
        Self::BottomMountLeft,
        Self::BottomMountRight,
        Self::BottomMountMiddle,
        Self::TopMountUp,
        Self::TopMountDown,
        Self::TopMountMiddle,
    ];

    /// The action name sent on the wire.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::PowerOn => "PowerOn",
            Self::PowerOff => "PowerOff",
            Self::Reboot => "Reboot",
            Self::BottomMountLeft => "BottomMountLeft",
            Self::BottomMountRight => "BottomMountRight",
            Self::BottomMountMiddle => "BottomMountMiddle",
            Self::TopMountUp => "TopMountUp",
            Self::TopMountDown => "TopMountDown",
            Self::TopMountMiddle => "TopMountMiddle",
        }
    }
}

impl fmt::Display for CctvAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A UPnP control point tracking devices of one profile.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use cctv_ctrlpt::config::ControlPointConfig;
/// use cctv_ctrlpt::control_point::{CctvAction, ControlPoint};
/// use cctv_ctrlpt::protocol::ControlTransport;
///
/// # async fn example(transport: Arc<dyn ControlTransport>) -> cctv_ctrlpt::Result<()> {
/// let cp = ControlPoint::start(transport, ControlPointConfig::new()).await;
///
/// // Hand this to the protocol layer's callback thread.
/// let _inbound = cp.event_sender();
///
/// cp.observers().on_variable_updated(|udn, _service, name, value| {
///     tracing::info!(%udn, name, value, "state changed");
/// });
///
/// for (position, udn, name) in cp.list_devices().await.iter() {
///     tracing::info!(position, %udn, name, "device");
/// }
/// cp.send_cctv_action(1, CctvAction::PowerOn).await?;
///
/// cp.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct ControlPoint {
    config: ControlPointConfig,
    transport: Arc<dyn ControlTransport>,
    registry: DeviceRegistry,
    dispatcher: EventDispatcher,
    sweeper: TimeoutSweeper,
    inbound_tx: mpsc::Sender<UpnpEvent>,
    inbound_rx: parking_lot::Mutex<Option<mpsc::Receiver<UpnpEvent>>>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl ControlPoint {
    /// Builds a control point without starting any background task.
    ///
    /// Events must be fed through [`handle_event`](Self::handle_event) and
    /// sweeps triggered with [`sweep_now`](Self::sweep_now), or the tasks
    /// started later with [`spawn_background`](Self::spawn_background).
    #[must_use]
    pub fn new(transport: Arc<dyn ControlTransport>, config: ControlPointConfig) -> Self {
        let notifier = Notifier::new(
            EventBus::with_capacity(config.event_capacity()),
            Arc::new(ObserverRegistry::new()),
        );
        let registry = DeviceRegistry::new(transport.clone(), notifier, &config);
        let dispatcher = EventDispatcher::new(registry.clone(), transport.clone());
        let sweeper =
            TimeoutSweeper::new(registry.clone(), transport.clone(), config.sweep_interval());
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity());

        Self {
            config,
            transport,
            registry,
            dispatcher,
            sweeper,
            inbound_tx,
            inbound_rx: parking_lot::Mutex::new(Some(inbound_rx)),
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Builds a control point, starts the sweeper and the event loop, and
    /// issues the initial search.
    ///
    /// A failing initial search is logged; discovery announcements still
    /// populate the registry.
    pub async fn start(transport: Arc<dyn ControlTransport>, config: ControlPointConfig) -> Self {
        let control_point = Self::new(transport, config);
        control_point.spawn_background();
        if let Err(e) = control_point.refresh().await {
            tracing::warn!(error = %e, "Initial search failed");
        }
        control_point
    }

    /// Spawns the sweeper and the inbound event loop. Later calls do
    /// nothing.
    pub fn spawn_background(&self) {
        let Some(inbound_rx) = self.inbound_rx.lock().take() else {
            tracing::debug!("Background tasks already running");
            return;
        };

        self.tasks
            .spawn(self.sweeper.clone().run(self.cancel.clone()));
        self.tasks
            .spawn(self.dispatcher.clone().run(inbound_rx, self.cancel.clone()));
        tracing::info!(
            sweep_interval_secs = self.sweeper.interval().as_secs(),
            device_type = self.config.profile().device_type(),
            "Control point started"
        );
    }

    /// Stops the background tasks and removes every device.
    ///
    /// Subscriptions are cancelled and one removal notification is sent per
    /// device.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        let removed = self.registry.remove_all().await;
        tracing::info!(removed, "Control point stopped");
    }

    // =========================================================================
    // Inbound events and notifications
    // =========================================================================

    /// A sender for the protocol layer's callbacks.
    ///
    /// Use `blocking_send` from threads outside the runtime.
    #[must_use]
    pub fn event_sender(&self) -> mpsc::Sender<UpnpEvent> {
        self.inbound_tx.clone()
    }

    /// Dispatches one inbound event on the caller's task.
    pub async fn handle_event(&self, event: UpnpEvent) {
        self.dispatcher.dispatch(event).await;
    }

    /// Runs one advertisement sweep immediately.
    pub async fn sweep_now(&self) -> SweepReport {
        self.sweeper.tick().await
    }

    /// Subscribes to notifications on the event bus.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ControlPointEvent> {
        self.registry.notifier().bus().subscribe()
    }

    /// The synchronous observer callbacks.
    #[must_use]
    pub fn observers(&self) -> &ObserverRegistry {
        self.registry.notifier().observers()
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ControlPointConfig {
        &self.config
    }

    // =========================================================================
    // Registry operations
    // =========================================================================

    /// Removes a device. Returns `false` if the UDN is unknown.
    pub async fn remove_device(&self, udn: &str) -> bool {
        self.registry.remove(udn).await
    }

    /// Removes every device. Returns how many were removed.
    pub async fn remove_all(&self) -> usize {
        self.registry.remove_all().await
    }

    /// Forgets every device and searches the network again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the search could not be issued.
    pub async fn refresh(&self) -> Result<()> {
        self.registry.remove_all().await;
        let target = SearchTarget::DeviceType(self.config.profile().device_type().to_string());
        self.transport
            .search(self.config.search_wait(), target)
            .await?;
        Ok(())
    }

    /// Returns a copy of the device at a 1-based position.
    ///
    /// Positions shift as devices come and go.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PositionOutOfRange`] for 0 or past the end.
    pub async fn get_device(&self, position: usize) -> Result<DeviceSnapshot> {
        self.registry.lookup_by_position(position).await
    }

    /// Returns a copy of the device with this UDN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if the UDN is unknown.
    pub async fn device_by_udn(&self, udn: &str) -> Result<DeviceSnapshot> {
        self.registry.lookup_by_udn(udn).await
    }

    /// Lists the devices in order.
    pub async fn list_devices(&self) -> DeviceList {
        self.registry.list().await
    }

    /// Returns a printable copy of the device at a 1-based position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for position 0 and
    /// [`Error::PositionOutOfRange`] past the end.
    pub async fn print_device(&self, position: usize) -> Result<DeviceSnapshot> {
        if position == 0 {
            return Err(Error::InvalidArgument(
                "device positions start at 1".to_string(),
            ));
        }
        self.registry.lookup_by_position(position).await
    }

    // =========================================================================
    // Actions and variable queries
    // =========================================================================

    /// Sends an action to one service of the device at `position`.
    ///
    /// The completion arrives later as an inbound event.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown position or service, or
    /// [`Error::Protocol`] if the action could not be issued.
    pub async fn send_action(
        &self,
        service_index: usize,
        position: usize,
        action: &str,
        args: &[(&str, &str)],
    ) -> Result<()> {
        let endpoint = self
            .registry
            .service_endpoint(position, service_index)
            .await?;
        tracing::debug!(udn = %endpoint.udn, action, "Sending action");
        self.transport
            .send_action(ActionInvocation {
                control_url: endpoint.control_url,
                service_type: endpoint.service_type,
                action: action.to_string(),
                args: args
                    .iter()
                    .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                    .collect(),
            })
            .await?;
        Ok(())
    }

    /// Sends an action with one integer argument.
    ///
    /// # Errors
    ///
    /// See [`send_action`](Self::send_action).
    pub async fn send_action_numeric_arg(
        &self,
        position: usize,
        service_index: usize,
        action: &str,
        param: &str,
        value: i32,
    ) -> Result<()> {
        let value = value.to_string();
        self.send_action(service_index, position, action, &[(param, &value)])
            .await
    }

    /// Sends one of the control service's argument-less actions.
    ///
    /// # Errors
    ///
    /// See [`send_action`](Self::send_action).
    pub async fn send_cctv_action(&self, position: usize, action: CctvAction) -> Result<()> {
        self.send_action(CCTV_SERVICE_CONTROL, position, action.name(), &[])
            .await
    }

    /// Queries a state variable; the value arrives as a
    /// [`ControlPointEvent::VariableQueryResult`].
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown position or service, or
    /// [`Error::Protocol`] if the query could not be issued.
    pub async fn get_variable(
        &self,
        service_index: usize,
        position: usize,
        var_name: &str,
    ) -> Result<()> {
        let endpoint = self
            .registry
            .service_endpoint(position, service_index)
            .await?;
        self.transport
            .get_variable(&endpoint.control_url, var_name)
            .await?;
        Ok(())
    }

    /// Queries the control service's `Power` variable.
    ///
    /// # Errors
    ///
    /// See [`get_variable`](Self::get_variable).
    pub async fn get_power(&self, position: usize) -> Result<()> {
        self.get_variable(CCTV_SERVICE_CONTROL, position, "Power")
            .await
    }
}

impl fmt::Debug for ControlPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPoint")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Drop for ControlPoint {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
