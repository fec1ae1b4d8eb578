//! Capability boundary towards the BLE radio stack.
//!
//! The driver never calls into the radio directly: it issues non-blocking
//! [`RadioCommand`]s through a [`RadioHandle`], and a radio actor task
//! executes them and reports completions and notifications as
//! [`RadioEvent`]s. Radio implementations therefore never touch driver
//! state from their own callback context.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::addr::BleAddress;

/// GATT service exposed by IP-over-BLE peers.
pub const UUID_IP6BLE_SERVICE: Uuid = uuid::uuid!("0000fffb-0000-1000-8000-00805f9b34fb");
/// Outbound (host to peer) data characteristic.
pub const UUID_C1: Uuid = uuid::uuid!("18ee2ef5-263d-4559-959f-4f9c429f9d11");
/// Inbound (peer to host) data characteristic, consumed via notifications.
pub const UUID_C2: Uuid = uuid::uuid!("18ee2ef5-263d-4559-959f-4f9c429f9d12");
/// Client characteristic configuration descriptor.
pub const UUID_CCCD: Uuid = uuid::uuid!("00002902-0000-1000-8000-00805f9b34fb");

pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondState {
    None,
    Bonding,
    Bonded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParams {
    pub interval: Duration,
    pub window: Duration,
    pub active: bool,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
            window: Duration::from_millis(40),
            active: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCommand {
    ScanStart(ScanParams),
    ScanStop,
    Connect(BleAddress),
    Disconnect,
    DiscoverServices,
    RequestMtu(u16),
    WriteC1(Vec<u8>),
    SubscribeC2(bool),
}

/// What service discovery found on the peer, reduced to the capabilities
/// this profile cares about.
#[derive(Debug, Clone, Copy)]
pub struct GattProfile {
    pub has_c1: bool,
    pub has_c2: bool,
    pub has_c2_cccd: bool,
}

#[derive(Debug, Clone)]
pub enum RadioEvent {
    Connected { bond: BondState },
    Disconnected,
    BondStateChanged(BondState),
    ServicesDiscovered(GattProfile),
    MtuChanged(u16),
    WriteComplete { success: bool },
    Notification(Vec<u8>),
    Advertisement { peer: BleAddress, rssi: i8 },
    /// The backend hit an error it cannot recover from on this connection.
    Fault(String),
}

#[derive(Debug, Error)]
pub enum RadioError {
    #[error("radio task is gone")]
    Closed,
    #[error("radio backend error: {0}")]
    Backend(String),
}

/// Cloneable, non-blocking command side of a radio actor.
#[derive(Clone)]
pub struct RadioHandle {
    tx: mpsc::UnboundedSender<RadioCommand>,
}

impl RadioHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RadioCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, command: RadioCommand) -> Result<(), RadioError> {
        self.tx.send(command).map_err(|_| RadioError::Closed)
    }

    pub fn scan_start(&self, params: ScanParams) -> Result<(), RadioError> {
        self.send(RadioCommand::ScanStart(params))
    }

    pub fn scan_stop(&self) -> Result<(), RadioError> {
        self.send(RadioCommand::ScanStop)
    }

    pub fn connect(&self, peer: BleAddress) -> Result<(), RadioError> {
        self.send(RadioCommand::Connect(peer))
    }

    pub fn disconnect(&self) -> Result<(), RadioError> {
        self.send(RadioCommand::Disconnect)
    }

    pub fn discover_services(&self) -> Result<(), RadioError> {
        self.send(RadioCommand::DiscoverServices)
    }

    pub fn request_mtu(&self, mtu: u16) -> Result<(), RadioError> {
        self.send(RadioCommand::RequestMtu(mtu))
    }

    pub fn write_c1(&self, value: Vec<u8>) -> Result<(), RadioError> {
        self.send(RadioCommand::WriteC1(value))
    }

    pub fn subscribe_c2(&self, enable: bool) -> Result<(), RadioError> {
        self.send(RadioCommand::SubscribeC2(enable))
    }
}

/// An owned radio backend. `run` consumes commands until the channel closes
/// and reports everything that happens on the link through `events`.
#[async_trait]
pub trait Radio: Send + 'static {
    async fn run(
        self: Box<Self>,
        commands: mpsc::UnboundedReceiver<RadioCommand>,
        events: mpsc::Sender<RadioEvent>,
    );
}

/// Spawns a radio actor and returns its command handle and event stream.
pub fn spawn(radio: Box<dyn Radio>) -> (RadioHandle, mpsc::Receiver<RadioEvent>) {
    let (handle, commands) = RadioHandle::channel();
    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(radio.run(commands, events_tx));
    (handle, events_rx)
}
