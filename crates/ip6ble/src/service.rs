//! The packet relay service.
//!
//! [`BridgeService::start`] wires a radio backend, the transport driver and
//! an interface factory together and runs the relay on one spawned task.
//! Radio events reach that task only through the bounded task queue, so the
//! driver is mutated from exactly one place.
//!
//! A service instance carries one connection. When the link ends, for any
//! reason, the service reports `Disconnected` and finishes; reconnecting
//! means starting a new service.

use std::io;
use std::net::Ipv6Addr;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::BridgeError;
use crate::task::{self, PhaseHandle, ServicePhase, TaskError, TaskQueue, TASK_QUEUE_CAPACITY};
use crate::vif::{InterfaceFactory, VirtualInterface};
use crate::BridgeResult;
use ble_link::driver::{BleDriver, LinkConfig, LinkEvent, MAX_PACKET_SIZE};
use ble_link::radio::{Radio, RadioEvent};
use ble_link::BleAddress;

pub const DEFAULT_INTERFACE_NAME: &str = "ip6ble0";

const EVENT_BUFFER: usize = 16;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Peer to connect to.
    pub peer: BleAddress,
    /// Local device address; the interface's link-local IPv6 address is
    /// derived from it. Randomized when unset.
    pub local: Option<BleAddress>,
    pub interface_name: String,
    /// Interface MTU, also the largest packet the relay accepts in either
    /// direction. GATT long writes carry packets beyond the ATT MTU.
    pub max_packet_size: usize,
    pub link: LinkConfig,
}

impl BridgeConfig {
    pub fn new(peer: BleAddress) -> Self {
        Self {
            peer,
            local: None,
            interface_name: DEFAULT_INTERFACE_NAME.to_string(),
            max_packet_size: MAX_PACKET_SIZE,
            link: LinkConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// The interface is up and packets are flowing. Both sides are reported
    /// as their link-local IPv6 addresses.
    Connected { local: Ipv6Addr, peer: Ipv6Addr },
    /// The link ended; the service finishes right after reporting this.
    Disconnected,
}

/// Handle to a running relay. Dropping it stops the service.
pub struct BridgeService {
    events: mpsc::Receiver<BridgeEvent>,
    stop: watch::Sender<bool>,
    join: JoinHandle<BridgeResult<()>>,
}

impl BridgeService {
    /// Spawns the relay. Must be called within a tokio runtime.
    pub fn start(
        radio: Box<dyn Radio>,
        factory: Box<dyn InterfaceFactory>,
        config: BridgeConfig,
    ) -> Self {
        let local = config.local.unwrap_or_else(BleAddress::random_local);
        let (radio_handle, mut radio_events) = ble_link::radio::spawn(radio);
        let (task_tx, task_rx, phase) = task::queue::<RadioEvent>(TASK_QUEUE_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let (stop_tx, stop_rx) = watch::channel(false);

        // Radio callbacks become queued tasks; nothing else reaches the
        // relay loop.
        tokio::spawn(async move {
            while let Some(event) = radio_events.recv().await {
                match task_tx.post(event) {
                    Ok(()) => {}
                    Err(TaskError::Overflow) => {
                        error!("task queue overflow, dropping radio event");
                    }
                    Err(TaskError::ServiceDown) => break,
                }
            }
        });

        let core = RelayCore {
            driver: BleDriver::new(radio_handle, config.link.clone()),
            factory,
            vif: None,
            events: event_tx,
            interface_name: config.interface_name,
            max_packet_size: config.max_packet_size,
            local,
            peer: config.peer,
            announced: false,
        };
        let join = tokio::spawn(run(core, task_rx, stop_rx, phase));

        Self {
            events: event_rx,
            stop: stop_tx,
            join,
        }
    }

    pub async fn next_event(&mut self) -> Option<BridgeEvent> {
        self.events.recv().await
    }

    /// Requests shutdown. The service finishes on its own; `wait` for it.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    pub async fn wait(self) -> BridgeResult<()> {
        self.join.await.map_err(|_| BridgeError::ServiceGone)?
    }
}

async fn run(
    mut core: RelayCore,
    mut tasks: TaskQueue<RadioEvent>,
    mut stop: watch::Receiver<bool>,
    phase: PhaseHandle,
) -> BridgeResult<()> {
    phase.set(ServicePhase::Running);
    let result = core.drive(&mut tasks, &mut stop).await;
    phase.set(ServicePhase::Stopping);
    core.shutdown().await;
    if let Err(err) = &result {
        error!(%err, "relay ended with error");
    }
    result
}

enum Step {
    Stop,
    Continue,
    Radio(RadioEvent),
    Outbound(io::Result<Vec<u8>>),
    Deadline,
}

struct RelayCore {
    driver: BleDriver,
    factory: Box<dyn InterfaceFactory>,
    vif: Option<Box<dyn VirtualInterface>>,
    events: mpsc::Sender<BridgeEvent>,
    interface_name: String,
    max_packet_size: usize,
    local: BleAddress,
    peer: BleAddress,
    announced: bool,
}

impl RelayCore {
    async fn drive(
        &mut self,
        tasks: &mut TaskQueue<RadioEvent>,
        stop: &mut watch::Receiver<bool>,
    ) -> BridgeResult<()> {
        self.driver.create_connection(self.peer)?;

        loop {
            let step = {
                let can_read = self.driver.state().can_transfer();
                let deadline = self.driver.next_deadline();
                let vif = self.vif.as_mut();
                tokio::select! {
                    biased;
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            Step::Stop
                        } else {
                            Step::Continue
                        }
                    }
                    task = tasks.next() => match task {
                        Some(event) => Step::Radio(event),
                        None => Step::Stop,
                    },
                    packet = read_outbound(vif), if can_read => Step::Outbound(packet),
                    () = sleep_until(deadline) => Step::Deadline,
                }
            };

            match step {
                Step::Continue => {}
                Step::Stop => {
                    debug!("stop requested");
                    return Ok(());
                }
                Step::Radio(event) => {
                    let link_events = self.driver.handle_radio_event(event);
                    if self.apply(link_events).await? {
                        return Ok(());
                    }
                }
                Step::Outbound(packet) => self.transmit(packet?)?,
                Step::Deadline => {
                    let link_events = self.driver.process(Instant::now());
                    if self.apply(link_events).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Applies driver output. Returns `true` once the link has ended.
    async fn apply(&mut self, link_events: Vec<LinkEvent>) -> BridgeResult<bool> {
        for event in link_events {
            match event {
                LinkEvent::Connected => {
                    debug!(peer = %self.peer, "link connected, negotiating");
                }
                LinkEvent::ConnectionReady { mtu } => self.bring_up(mtu).await?,
                LinkEvent::Disconnected => {
                    self.tear_down().await;
                    return Ok(true);
                }
                LinkEvent::WriteDone => {
                    debug!("outbound packet delivered");
                }
                LinkEvent::PacketReceived(packet) => self.deliver(packet).await?,
                LinkEvent::Advertisement { peer, rssi } => {
                    debug!(%peer, rssi, "advertisement");
                }
            }
        }
        Ok(false)
    }

    async fn bring_up(&mut self, att_mtu: u16) -> BridgeResult<()> {
        self.driver.c2_subscribe(true)?;

        let local_ip = self.local.link_local_ipv6();
        let mtu = self.max_packet_size.min(u16::MAX as usize) as u16;
        let vif = self
            .factory
            .create(&self.interface_name, mtu, local_ip)
            .await?;
        self.vif = Some(vif);
        self.announced = true;
        info!(
            interface = %self.interface_name,
            mtu,
            att_mtu,
            local = %local_ip,
            peer = %self.peer,
            "bridge up"
        );
        let _ = self
            .events
            .send(BridgeEvent::Connected {
                local: local_ip,
                peer: self.peer.link_local_ipv6(),
            })
            .await;
        Ok(())
    }

    async fn tear_down(&mut self) {
        self.vif = None;
        if self.announced {
            self.announced = false;
            info!(peer = %self.peer, "bridge down");
            let _ = self.events.send(BridgeEvent::Disconnected).await;
        }
    }

    fn transmit(&mut self, packet: Vec<u8>) -> BridgeResult<()> {
        if packet.len() > self.max_packet_size {
            warn!(
                len = packet.len(),
                max = self.max_packet_size,
                "outbound packet too large, dropping"
            );
            return Ok(());
        }
        self.driver.c1_write(packet)?;
        Ok(())
    }

    async fn deliver(&mut self, packet: Vec<u8>) -> BridgeResult<()> {
        if packet.len() > self.max_packet_size {
            warn!(
                len = packet.len(),
                max = self.max_packet_size,
                "inbound packet too large, dropping"
            );
            return Ok(());
        }
        match &mut self.vif {
            Some(vif) => {
                vif.send(&packet).await?;
                Ok(())
            }
            None => {
                debug!(len = packet.len(), "no interface yet, dropping packet");
                Ok(())
            }
        }
    }

    async fn shutdown(&mut self) {
        self.driver.release();
        self.tear_down().await;
    }
}

async fn read_outbound(vif: Option<&mut Box<dyn VirtualInterface>>) -> io::Result<Vec<u8>> {
    match vif {
        Some(vif) => vif.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
