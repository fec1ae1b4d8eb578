//! In-memory doubles for tests: a scripted radio and a channel-backed
//! virtual interface. No hardware, no root, no timing dependence.

use std::io;
use std::net::Ipv6Addr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::vif::{InterfaceFactory, VirtualInterface};
use ble_link::radio::{BondState, GattProfile, Radio, RadioCommand, RadioEvent};

/// A radio that answers every command with the happy-path event and records
/// what it was asked to do. Extra events (notifications, faults, disconnects)
/// are injected through the [`ScriptHandle`].
pub struct ScriptedRadio {
    bond: BondState,
    profile: GattProfile,
    log: Arc<Mutex<Vec<RadioCommand>>>,
    injected: mpsc::UnboundedReceiver<RadioEvent>,
}

#[derive(Clone)]
pub struct ScriptHandle {
    log: Arc<Mutex<Vec<RadioCommand>>>,
    inject: mpsc::UnboundedSender<RadioEvent>,
}

impl ScriptHandle {
    /// Everything the service asked the radio to do so far, in order.
    pub fn commands(&self) -> Vec<RadioCommand> {
        self.log.lock().unwrap().clone()
    }

    pub fn inject(&self, event: RadioEvent) {
        let _ = self.inject.send(event);
    }
}

impl ScriptedRadio {
    pub fn new() -> (Self, ScriptHandle) {
        Self::with_profile(
            BondState::None,
            GattProfile {
                has_c1: true,
                has_c2: true,
                has_c2_cccd: true,
            },
        )
    }

    pub fn with_profile(bond: BondState, profile: GattProfile) -> (Self, ScriptHandle) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (inject, injected) = mpsc::unbounded_channel();
        (
            Self {
                bond,
                profile,
                log: log.clone(),
                injected,
            },
            ScriptHandle { log, inject },
        )
    }

    fn respond(&self, command: &RadioCommand) -> Option<RadioEvent> {
        match command {
            RadioCommand::Connect(_) => Some(RadioEvent::Connected { bond: self.bond }),
            RadioCommand::Disconnect => Some(RadioEvent::Disconnected),
            RadioCommand::DiscoverServices => {
                Some(RadioEvent::ServicesDiscovered(self.profile))
            }
            RadioCommand::RequestMtu(mtu) => Some(RadioEvent::MtuChanged(*mtu)),
            RadioCommand::WriteC1(_) => Some(RadioEvent::WriteComplete { success: true }),
            RadioCommand::ScanStart(_) | RadioCommand::ScanStop | RadioCommand::SubscribeC2(_) => {
                None
            }
        }
    }
}

#[async_trait]
impl Radio for ScriptedRadio {
    async fn run(
        mut self: Box<Self>,
        mut commands: mpsc::UnboundedReceiver<RadioCommand>,
        events: mpsc::Sender<RadioEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    let response = self.respond(&command);
                    self.log.lock().unwrap().push(command);
                    if let Some(event) = response {
                        if events.send(event).await.is_err() {
                            break;
                        }
                    }
                }
                event = self.injected.recv() => {
                    let Some(event) = event else { break };
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// Test end of a [`MemoryInterface`]: what the relay injected into the host
/// stack comes out of `received`, and `transmit` feeds it outbound packets.
pub struct MemoryPort {
    pub name: String,
    pub mtu: u16,
    pub local: Ipv6Addr,
    received: mpsc::UnboundedReceiver<Vec<u8>>,
    transmit: mpsc::UnboundedSender<Vec<u8>>,
}

impl MemoryPort {
    pub async fn received(&mut self) -> Option<Vec<u8>> {
        self.received.recv().await
    }

    pub fn transmit(&self, packet: Vec<u8>) {
        let _ = self.transmit.send(packet);
    }
}

struct MemoryInterface {
    outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    inbound: mpsc::UnboundedSender<Vec<u8>>,
}

#[async_trait]
impl VirtualInterface for MemoryInterface {
    async fn recv(&mut self) -> io::Result<Vec<u8>> {
        self.outbound
            .recv()
            .await
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "interface torn down"))
    }

    async fn send(&mut self, packet: &[u8]) -> io::Result<()> {
        self.inbound
            .send(packet.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "interface torn down"))
    }
}

/// Factory handing each created interface's far end to the test.
pub struct MemoryFactory {
    ports: mpsc::UnboundedSender<MemoryPort>,
}

impl MemoryFactory {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPort>) {
        let (ports, ports_rx) = mpsc::unbounded_channel();
        (Self { ports }, ports_rx)
    }
}

#[async_trait]
impl InterfaceFactory for MemoryFactory {
    async fn create(
        &self,
        name: &str,
        mtu: u16,
        local: Ipv6Addr,
    ) -> io::Result<Box<dyn VirtualInterface>> {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let port = MemoryPort {
            name: name.to_string(),
            mtu,
            local,
            received: inbound_rx,
            transmit: outbound_tx,
        };
        self.ports
            .send(port)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "test dropped port stream"))?;
        Ok(Box::new(MemoryInterface {
            outbound: outbound_rx,
            inbound: inbound_tx,
        }))
    }
}
