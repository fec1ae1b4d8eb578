//! The transport driver.
//!
//! Owns the single GATT connection: it turns raw [`RadioEvent`]s into
//! [`LinkEvent`]s for the relay, runs the lifecycle state machine and the
//! C1 write serializer, defers service discovery around bonding, and arms
//! watchdogs on the connecting and MTU-negotiation phases.
//!
//! All methods are synchronous and non-blocking; radio work is issued as
//! commands through the [`RadioHandle`] and completes via later events. The
//! driver is intended to be owned by a single consumer loop.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::addr::BleAddress;
use crate::error::LinkError;
use crate::queue::WriteQueue;
use crate::radio::{BondState, GattProfile, RadioEvent, RadioHandle, ScanParams};
use crate::state::{ConnectionState, Lifecycle};

pub const DEFAULT_MTU: u16 = 251;
pub const MAX_PACKET_SIZE: usize = 1024;

#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// ATT MTU requested after service discovery.
    pub mtu: u16,
    /// Upper bound on a single packet, and so on any negotiated MTU.
    pub max_packet_size: usize,
    /// Watchdog on Connecting -> Connected.
    pub connect_timeout: Duration,
    /// Watchdog on Connected -> Ready (discovery + MTU negotiation).
    pub ready_timeout: Duration,
    /// Discovery delay after connecting to an already-bonded peer. Some
    /// stacks fail discovery when it races a fresh bond.
    pub bonded_discovery_delay: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            mtu: DEFAULT_MTU,
            max_packet_size: MAX_PACKET_SIZE,
            connect_timeout: Duration::from_secs(30),
            ready_timeout: Duration::from_secs(10),
            bonded_discovery_delay: Duration::from_secs(1),
        }
    }
}

/// The one logical link to a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    peer: BleAddress,
}

impl Connection {
    pub fn peer(&self) -> BleAddress {
        self.peer
    }
}

/// What the driver reports up to the relay, in the order it happened.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// Radio-level connection established; discovery and MTU negotiation
    /// still pending.
    Connected,
    /// MTU negotiated; the link carries application data from here on.
    ConnectionReady { mtu: u16 },
    /// The connection ended, whatever the cause. Emitted exactly once per
    /// connection.
    Disconnected,
    /// The in-flight C1 write completed successfully.
    WriteDone,
    /// One C2 notification payload.
    PacketReceived(Vec<u8>),
    Advertisement { peer: BleAddress, rssi: i8 },
}

pub struct BleDriver {
    config: LinkConfig,
    radio: RadioHandle,
    lifecycle: Lifecycle,
    queue: WriteQueue,
    connection: Option<Connection>,
    profile: Option<GattProfile>,
    mtu: u16,
    scanning: bool,
    awaiting_bond: bool,
    discover_at: Option<Instant>,
    connect_deadline: Option<Instant>,
    ready_deadline: Option<Instant>,
}

impl BleDriver {
    pub fn new(radio: RadioHandle, config: LinkConfig) -> Self {
        Self {
            config,
            radio,
            lifecycle: Lifecycle::new(),
            queue: WriteQueue::new(),
            connection: None,
            profile: None,
            mtu: 0,
            scanning: false,
            awaiting_bond: false,
            discover_at: None,
            connect_deadline: None,
            ready_deadline: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.lifecycle.state()
    }

    pub fn connection(&self) -> Option<Connection> {
        self.connection
    }

    pub fn pending_writes(&self) -> usize {
        self.queue.len()
    }

    /// Begins discovery for advertising peers. Invalid while a connection
    /// exists in any form.
    pub fn scan_start(&mut self, params: ScanParams) -> Result<(), LinkError> {
        let state = self.state();
        if !matches!(
            state,
            ConnectionState::Idle | ConnectionState::Disconnected
        ) {
            warn!(?state, "starting scan while a connection exists");
            return Err(LinkError::InvalidState(state));
        }
        debug!(
            interval_ms = params.interval.as_millis() as u64,
            window_ms = params.window.as_millis() as u64,
            active = params.active,
            "start scanning"
        );
        self.radio.scan_start(params)?;
        self.scanning = true;
        Ok(())
    }

    pub fn scan_stop(&mut self) -> Result<(), LinkError> {
        debug!("stop scanning");
        self.radio.scan_stop()?;
        self.scanning = false;
        Ok(())
    }

    /// Initiates a connection to `peer`.
    ///
    /// Idempotent guards: while already connecting this is a logged no-op
    /// returning `None`; when already connected to the same peer the
    /// existing connection is returned. Connecting to a *different* peer
    /// while one is up is an error.
    pub fn create_connection(
        &mut self,
        peer: BleAddress,
    ) -> Result<Option<Connection>, LinkError> {
        debug!(%peer, "connecting to device");
        match self.state() {
            ConnectionState::Connecting => {
                warn!("already connecting, please wait");
                Ok(None)
            }
            ConnectionState::Connected | ConnectionState::Ready => {
                match self.connection {
                    Some(conn) if conn.peer() == peer => {
                        debug!("already connected, using existing connection");
                        Ok(Some(conn))
                    }
                    _ => Err(LinkError::InvalidState(self.state())),
                }
            }
            ConnectionState::Idle | ConnectionState::Disconnected => {
                self.lifecycle.connect()?;
                self.radio.connect(peer)?;
                let conn = Connection { peer };
                self.connection = Some(conn);
                self.connect_deadline = Some(Instant::now() + self.config.connect_timeout);
                Ok(Some(conn))
            }
        }
    }

    /// Requests teardown of the current connection. Safe to call more than
    /// once; a logged no-op when no client exists.
    pub fn disconnect(&mut self) {
        if self.connection.is_none() {
            warn!("disconnect without a connection, ignoring");
            return;
        }
        debug!("requesting disconnect");
        if self.radio.disconnect().is_err() {
            // Radio actor already gone; finish the bookkeeping locally.
            let _ = self.finish_disconnect();
        }
    }

    /// Negotiated MTU. Returns the sentinel 0 until the connection is
    /// `Ready`, matching what existing callers expect.
    pub fn mtu(&self) -> u16 {
        if self.state() != ConnectionState::Ready {
            error!("MTU requested before the connection is ready");
            return 0;
        }
        self.mtu
    }

    /// Queues one opaque packet for transmission on C1.
    pub fn c1_write(&mut self, value: Vec<u8>) -> Result<(), LinkError> {
        if !self.state().can_transfer() {
            error!("c1Write: not connected");
            return Err(LinkError::NotConnected);
        }
        self.queue.enqueue(value, &self.radio)?;
        Ok(())
    }

    /// Enables or disables C2 notifications by writing the peer's CCC
    /// descriptor.
    pub fn c2_subscribe(&mut self, enable: bool) -> Result<(), LinkError> {
        if !self.state().can_transfer() {
            error!("c2Subscribe: not connected");
            return Err(LinkError::NotConnected);
        }
        let Some(profile) = self.profile else {
            return Err(LinkError::NotConnected);
        };
        if !profile.has_c2 {
            return Err(LinkError::CapabilityMissing("C2 characteristic"));
        }
        if !profile.has_c2_cccd {
            return Err(LinkError::CapabilityMissing(
                "C2 client characteristic configuration descriptor",
            ));
        }
        debug!(enable, "subscribing to C2 notifications");
        self.radio.subscribe_c2(enable)?;
        Ok(())
    }

    /// Applies one radio event, returning the link events it produced.
    pub fn handle_radio_event(&mut self, event: RadioEvent) -> Vec<LinkEvent> {
        match event {
            RadioEvent::Connected { bond } => self.on_radio_connected(bond),
            RadioEvent::Disconnected => self.finish_disconnect(),
            RadioEvent::Fault(message) => {
                error!(%message, "unexpected GATT error");
                self.disconnect();
                self.finish_disconnect()
            }
            RadioEvent::BondStateChanged(bond) => {
                self.on_bond_state_changed(bond);
                Vec::new()
            }
            RadioEvent::ServicesDiscovered(profile) => self.on_services_discovered(profile),
            RadioEvent::MtuChanged(mtu) => self.on_mtu_changed(mtu),
            RadioEvent::WriteComplete { success } => self.on_write_complete(success),
            RadioEvent::Notification(value) => {
                debug!(len = value.len(), "C2 notification");
                if self.state().can_transfer() {
                    vec![LinkEvent::PacketReceived(value)]
                } else {
                    debug!("link is down, dropping notification");
                    Vec::new()
                }
            }
            RadioEvent::Advertisement { peer, rssi } => {
                vec![LinkEvent::Advertisement { peer, rssi }]
            }
        }
    }

    /// Non-blocking housekeeping: fires deferred discovery and the phase
    /// watchdogs. Meant to run once per consumer-loop iteration.
    pub fn process(&mut self, now: Instant) -> Vec<LinkEvent> {
        if let Some(at) = self.discover_at {
            if now >= at {
                self.discover_at = None;
                if let Err(err) = self.radio.discover_services() {
                    error!(%err, "failed to start service discovery");
                    return self.finish_disconnect();
                }
            }
        }

        let connect_expired =
            self.state() == ConnectionState::Connecting && deadline_hit(self.connect_deadline, now);
        let ready_expired =
            self.state() == ConnectionState::Connected && deadline_hit(self.ready_deadline, now);
        if connect_expired || ready_expired {
            error!(
                state = ?self.state(),
                "{}", LinkError::ConnectTimeout
            );
            self.disconnect();
            return self.finish_disconnect();
        }

        Vec::new()
    }

    /// The nearest timer `process` is waiting on, for the consumer loop to
    /// sleep against.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.discover_at, self.connect_deadline, self.ready_deadline]
            .into_iter()
            .flatten()
            .min()
    }

    /// Drops the connection and every driver-held resource. The terminal
    /// path for both radio-initiated and local teardown.
    pub fn release(&mut self) {
        let _ = self.radio.disconnect();
        let _ = self.finish_disconnect();
    }

    fn on_radio_connected(&mut self, bond: BondState) -> Vec<LinkEvent> {
        if let Err(err) = self.lifecycle.on_connected() {
            warn!(%err, "connected callback out of order, ignoring");
            return Vec::new();
        }
        debug!(?bond, "connected to GATT server");
        self.connect_deadline = None;
        self.ready_deadline = Some(Instant::now() + self.config.ready_timeout);

        match bond {
            BondState::None => self.schedule_discovery(Duration::ZERO),
            BondState::Bonded => self.schedule_discovery(self.config.bonded_discovery_delay),
            BondState::Bonding => {
                info!("waiting for bonding to complete");
                self.awaiting_bond = true;
            }
        }

        vec![LinkEvent::Connected]
    }

    fn on_bond_state_changed(&mut self, bond: BondState) {
        debug!(?bond, "bond state changed");
        if self.awaiting_bond && bond == BondState::Bonded {
            self.awaiting_bond = false;
            self.schedule_discovery(self.config.bonded_discovery_delay);
        }
    }

    fn schedule_discovery(&mut self, delay: Duration) {
        if delay.is_zero() {
            if let Err(err) = self.radio.discover_services() {
                error!(%err, "failed to start service discovery");
            }
        } else {
            debug!(delay_ms = delay.as_millis() as u64, "deferring service discovery");
            self.discover_at = Some(Instant::now() + delay);
        }
    }

    fn on_services_discovered(&mut self, profile: GattProfile) -> Vec<LinkEvent> {
        debug!(?profile, "services discovered");
        if !profile.has_c1 || !profile.has_c2 {
            let missing = if profile.has_c1 {
                "C2 characteristic"
            } else {
                "C1 characteristic"
            };
            error!("{}", LinkError::CapabilityMissing(missing));
            self.disconnect();
            return self.finish_disconnect();
        }
        self.profile = Some(profile);

        let mtu = self
            .config
            .mtu
            .min(self.config.max_packet_size.min(u16::MAX as usize) as u16);
        if let Err(err) = self.radio.request_mtu(mtu) {
            error!(%err, "failed to request MTU");
            return self.finish_disconnect();
        }
        Vec::new()
    }

    fn on_mtu_changed(&mut self, mtu: u16) -> Vec<LinkEvent> {
        debug!(mtu, "MTU changed");
        self.mtu = mtu;
        match self.lifecycle.on_ready() {
            Ok(()) => {
                self.ready_deadline = None;
                vec![LinkEvent::ConnectionReady { mtu }]
            }
            Err(err) => {
                warn!(%err, "MTU change outside negotiation, keeping state");
                Vec::new()
            }
        }
    }

    fn on_write_complete(&mut self, success: bool) -> Vec<LinkEvent> {
        if !self.state().can_transfer() {
            debug!("write completion after teardown, ignoring");
            return Vec::new();
        }
        match self.queue.on_write_complete(success, &self.radio) {
            Ok(()) => vec![LinkEvent::WriteDone],
            Err(LinkError::WriteFailed) => {
                // Already logged by the queue; the payload is gone but the
                // connection stays up.
                Vec::new()
            }
            Err(LinkError::Radio(err)) => {
                error!(%err, "radio rejected follow-up write");
                self.finish_disconnect()
            }
            Err(err) => {
                error!(%err, "inconsistent write bookkeeping");
                Vec::new()
            }
        }
    }

    fn finish_disconnect(&mut self) -> Vec<LinkEvent> {
        if !self.lifecycle.on_disconnected() {
            return Vec::new();
        }
        debug!("disconnected from GATT server");
        self.queue.clear();
        self.connection = None;
        self.profile = None;
        self.mtu = 0;
        self.awaiting_bond = false;
        self.discover_at = None;
        self.connect_deadline = None;
        self.ready_deadline = None;
        vec![LinkEvent::Disconnected]
    }
}

fn deadline_hit(deadline: Option<Instant>, now: Instant) -> bool {
    deadline.is_some_and(|at| now >= at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::RadioCommand;
    use tokio::sync::mpsc::UnboundedReceiver;

    const FULL_PROFILE: GattProfile = GattProfile {
        has_c1: true,
        has_c2: true,
        has_c2_cccd: true,
    };

    fn driver() -> (BleDriver, UnboundedReceiver<RadioCommand>) {
        driver_with(LinkConfig::default())
    }

    fn driver_with(config: LinkConfig) -> (BleDriver, UnboundedReceiver<RadioCommand>) {
        let (handle, commands) = RadioHandle::channel();
        (BleDriver::new(handle, config), commands)
    }

    fn peer() -> BleAddress {
        "AA:BB:CC:DD:EE:FF".parse().unwrap()
    }

    fn bring_ready(driver: &mut BleDriver, mtu: u16) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        events.extend(driver.handle_radio_event(RadioEvent::Connected {
            bond: BondState::None,
        }));
        events.extend(driver.handle_radio_event(RadioEvent::ServicesDiscovered(FULL_PROFILE)));
        events.extend(driver.handle_radio_event(RadioEvent::MtuChanged(mtu)));
        events
    }

    #[test]
    fn connects_and_reaches_ready() {
        let (mut driver, mut commands) = driver();

        driver.create_connection(peer()).unwrap().unwrap();
        assert_eq!(driver.state(), ConnectionState::Connecting);
        assert_eq!(commands.try_recv().unwrap(), RadioCommand::Connect(peer()));

        assert_eq!(driver.mtu(), 0);

        let events = bring_ready(&mut driver, 185);
        assert_eq!(driver.state(), ConnectionState::Ready);
        assert_eq!(driver.mtu(), 185);
        assert!(matches!(events[0], LinkEvent::Connected));
        assert!(matches!(
            events[1],
            LinkEvent::ConnectionReady { mtu: 185 }
        ));

        assert_eq!(commands.try_recv().unwrap(), RadioCommand::DiscoverServices);
        assert_eq!(
            commands.try_recv().unwrap(),
            RadioCommand::RequestMtu(DEFAULT_MTU)
        );
    }

    #[test]
    fn create_connection_is_idempotent_while_connecting() {
        let (mut driver, mut commands) = driver();

        driver.create_connection(peer()).unwrap().unwrap();
        assert!(driver.create_connection(peer()).unwrap().is_none());

        assert_eq!(commands.try_recv().unwrap(), RadioCommand::Connect(peer()));
        assert!(commands.try_recv().is_err(), "no second radio connect");
    }

    #[test]
    fn create_connection_returns_existing_when_connected() {
        let (mut driver, mut commands) = driver();

        let conn = driver.create_connection(peer()).unwrap().unwrap();
        bring_ready(&mut driver, 185);
        while commands.try_recv().is_ok() {}

        let again = driver.create_connection(peer()).unwrap().unwrap();
        assert_eq!(again, conn);
        assert!(commands.try_recv().is_err(), "no second radio connect");
    }

    #[test]
    fn create_connection_to_other_peer_is_invalid_state() {
        let (mut driver, _commands) = driver();

        driver.create_connection(peer()).unwrap();
        bring_ready(&mut driver, 185);

        let other: BleAddress = "11:22:33:44:55:66".parse().unwrap();
        assert!(matches!(
            driver.create_connection(other),
            Err(LinkError::InvalidState(ConnectionState::Ready))
        ));
    }

    #[test]
    fn data_operations_before_connected_fail_fast() {
        let (mut driver, mut commands) = driver();

        assert!(matches!(
            driver.c1_write(vec![1]),
            Err(LinkError::NotConnected)
        ));
        assert!(matches!(
            driver.c2_subscribe(true),
            Err(LinkError::NotConnected)
        ));
        assert_eq!(driver.pending_writes(), 0);

        driver.create_connection(peer()).unwrap();
        assert!(matches!(
            driver.c1_write(vec![1]),
            Err(LinkError::NotConnected)
        ));
        assert_eq!(driver.pending_writes(), 0);

        let _ = commands.try_recv();
        assert!(commands.try_recv().is_err(), "queue never touched the radio");
    }

    #[test]
    fn write_failure_pops_head_and_sends_next() {
        let (mut driver, mut commands) = driver();

        driver.create_connection(peer()).unwrap();
        bring_ready(&mut driver, 185);
        while commands.try_recv().is_ok() {}

        driver.c1_write(vec![1]).unwrap();
        driver.c1_write(vec![2]).unwrap();
        driver.c1_write(vec![3]).unwrap();
        assert_eq!(driver.pending_writes(), 3);
        assert_eq!(commands.try_recv().unwrap(), RadioCommand::WriteC1(vec![1]));

        let events = driver.handle_radio_event(RadioEvent::WriteComplete { success: false });
        assert!(events.is_empty(), "failed write is log-only");
        assert_eq!(driver.pending_writes(), 2);
        assert_eq!(commands.try_recv().unwrap(), RadioCommand::WriteC1(vec![2]));
        assert_eq!(driver.state(), ConnectionState::Ready);
    }

    #[test]
    fn unexpected_write_completion_is_non_fatal() {
        let (mut driver, _commands) = driver();

        driver.create_connection(peer()).unwrap();
        bring_ready(&mut driver, 185);

        let events = driver.handle_radio_event(RadioEvent::WriteComplete { success: true });
        assert!(events.is_empty());
        assert_eq!(driver.state(), ConnectionState::Ready);
    }

    #[test]
    fn scan_while_connected_is_invalid_state() {
        let (mut driver, _commands) = driver();

        driver.create_connection(peer()).unwrap();
        assert!(matches!(
            driver.scan_start(ScanParams::default()),
            Err(LinkError::InvalidState(ConnectionState::Connecting))
        ));
    }

    #[test]
    fn missing_characteristics_tear_the_connection_down() {
        let (mut driver, _commands) = driver();

        driver.create_connection(peer()).unwrap();
        driver.handle_radio_event(RadioEvent::Connected {
            bond: BondState::None,
        });
        let events = driver.handle_radio_event(RadioEvent::ServicesDiscovered(GattProfile {
            has_c1: true,
            has_c2: false,
            has_c2_cccd: false,
        }));
        assert!(matches!(events[0], LinkEvent::Disconnected));
        assert_eq!(driver.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn subscribe_without_cccd_is_capability_missing() {
        let (mut driver, _commands) = driver();

        driver.create_connection(peer()).unwrap();
        driver.handle_radio_event(RadioEvent::Connected {
            bond: BondState::None,
        });
        driver.handle_radio_event(RadioEvent::ServicesDiscovered(GattProfile {
            has_c1: true,
            has_c2: true,
            has_c2_cccd: false,
        }));
        assert!(matches!(
            driver.c2_subscribe(true),
            Err(LinkError::CapabilityMissing(_))
        ));
    }

    #[test]
    fn bonded_peer_defers_discovery() {
        let (mut driver, mut commands) = driver();

        driver.create_connection(peer()).unwrap();
        let _ = commands.try_recv();

        driver.handle_radio_event(RadioEvent::Connected {
            bond: BondState::Bonded,
        });
        assert!(
            commands.try_recv().is_err(),
            "discovery must wait out the bonding race"
        );

        let due = driver.next_deadline().expect("deferred discovery timer");
        driver.process(due);
        assert_eq!(commands.try_recv().unwrap(), RadioCommand::DiscoverServices);
    }

    #[test]
    fn bonding_in_progress_waits_for_bond_change() {
        let (mut driver, mut commands) = driver();

        driver.create_connection(peer()).unwrap();
        let _ = commands.try_recv();

        driver.handle_radio_event(RadioEvent::Connected {
            bond: BondState::Bonding,
        });
        assert!(commands.try_recv().is_err());

        driver.handle_radio_event(RadioEvent::BondStateChanged(BondState::Bonded));
        let due = driver.next_deadline().expect("deferred discovery timer");
        driver.process(due);
        assert_eq!(commands.try_recv().unwrap(), RadioCommand::DiscoverServices);
    }

    #[test]
    fn connect_watchdog_forces_disconnect() {
        let (mut driver, mut commands) = driver_with(LinkConfig {
            connect_timeout: Duration::from_millis(10),
            ..LinkConfig::default()
        });

        driver.create_connection(peer()).unwrap();
        let _ = commands.try_recv();

        let deadline = driver.next_deadline().unwrap();
        let events = driver.process(deadline);
        assert!(matches!(events[0], LinkEvent::Disconnected));
        assert_eq!(driver.state(), ConnectionState::Disconnected);
        assert_eq!(commands.try_recv().unwrap(), RadioCommand::Disconnect);
    }

    #[test]
    fn ready_watchdog_forces_disconnect() {
        let (mut driver, _commands) = driver_with(LinkConfig {
            ready_timeout: Duration::from_millis(10),
            ..LinkConfig::default()
        });

        driver.create_connection(peer()).unwrap();
        driver.handle_radio_event(RadioEvent::Connected {
            bond: BondState::None,
        });

        let deadline = driver.next_deadline().unwrap();
        let events = driver.process(deadline + Duration::from_secs(2));
        assert!(events
            .iter()
            .any(|e| matches!(e, LinkEvent::Disconnected)));
        assert_eq!(driver.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn gatt_fault_reports_a_single_disconnect() {
        let (mut driver, _commands) = driver();

        driver.create_connection(peer()).unwrap();
        bring_ready(&mut driver, 185);

        let events = driver.handle_radio_event(RadioEvent::Fault("status 133".into()));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LinkEvent::Disconnected));

        let events = driver.handle_radio_event(RadioEvent::Disconnected);
        assert!(events.is_empty(), "disconnect is reported once");
    }

    #[test]
    fn disconnect_clears_the_write_queue() {
        let (mut driver, _commands) = driver();

        driver.create_connection(peer()).unwrap();
        bring_ready(&mut driver, 185);
        driver.c1_write(vec![1]).unwrap();
        driver.c1_write(vec![2]).unwrap();

        driver.handle_radio_event(RadioEvent::Disconnected);
        assert_eq!(driver.pending_writes(), 0);
        assert!(driver.connection().is_none());
    }

    #[test]
    fn notification_reaches_caller_only_while_up() {
        let (mut driver, _commands) = driver();

        driver.create_connection(peer()).unwrap();
        bring_ready(&mut driver, 185);

        let events = driver.handle_radio_event(RadioEvent::Notification(vec![9, 9]));
        assert!(matches!(&events[0], LinkEvent::PacketReceived(p) if p == &vec![9, 9]));

        driver.handle_radio_event(RadioEvent::Disconnected);
        let events = driver.handle_radio_event(RadioEvent::Notification(vec![1]));
        assert!(events.is_empty());
    }
}
