//! btleplug-backed radio actor.
//!
//! Runs the [`Radio`] command loop on top of the platform BLE stack.
//! Notification and scan streams are forwarded by spawned tasks so the
//! command loop itself never blocks on the radio.
//!
//! Two platform gaps are papered over here: btleplug exposes neither ATT
//! MTU negotiation nor bond state, so `RequestMtu` is answered with the
//! requested value and connections always report [`BondState::None`]. The
//! driver's bonding path is exercised by backends that do report it.

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::addr::BleAddress;
use crate::radio::{
    BondState, GattProfile, Radio, RadioCommand, RadioError, RadioEvent, UUID_C1, UUID_C2,
    UUID_CCCD, UUID_IP6BLE_SERVICE,
};

const PEER_DISCOVERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(25);

pub struct BtleRadio {
    adapter: Adapter,
}

impl BtleRadio {
    pub async fn new() -> Result<Self, RadioError> {
        let manager = Manager::new()
            .await
            .map_err(|e| RadioError::Backend(e.to_string()))?;
        let adapters = manager
            .adapters()
            .await
            .map_err(|e| RadioError::Backend(e.to_string()))?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| RadioError::Backend("no BLE adapter available".into()))?;
        Ok(Self { adapter })
    }
}

#[async_trait]
impl Radio for BtleRadio {
    async fn run(
        self: Box<Self>,
        mut commands: mpsc::UnboundedReceiver<RadioCommand>,
        events: mpsc::Sender<RadioEvent>,
    ) {
        let mut actor = Actor {
            adapter: self.adapter,
            events,
            peripheral: None,
            c1: None,
            c2: None,
            scan_task: None,
            notify_task: None,
            watch_task: None,
        };

        while let Some(command) = commands.recv().await {
            actor.handle(command).await;
        }
        actor.shutdown().await;
        debug!("radio command channel closed, actor exiting");
    }
}

struct Actor {
    adapter: Adapter,
    events: mpsc::Sender<RadioEvent>,
    peripheral: Option<Peripheral>,
    c1: Option<Characteristic>,
    c2: Option<Characteristic>,
    scan_task: Option<JoinHandle<()>>,
    notify_task: Option<JoinHandle<()>>,
    watch_task: Option<JoinHandle<()>>,
}

impl Actor {
    async fn handle(&mut self, command: RadioCommand) {
        let result = match command {
            RadioCommand::ScanStart(_params) => self.scan_start().await,
            RadioCommand::ScanStop => self.scan_stop().await,
            RadioCommand::Connect(peer) => self.connect(peer).await,
            RadioCommand::Disconnect => self.disconnect().await,
            RadioCommand::DiscoverServices => self.discover_services().await,
            RadioCommand::RequestMtu(mtu) => {
                // btleplug negotiates the MTU internally; answer with the
                // requested value so the link can come up.
                self.emit(RadioEvent::MtuChanged(mtu)).await;
                Ok(())
            }
            RadioCommand::WriteC1(value) => {
                let success = match self.write_c1(&value).await {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(%err, "C1 write failed");
                        false
                    }
                };
                self.emit(RadioEvent::WriteComplete { success }).await;
                Ok(())
            }
            RadioCommand::SubscribeC2(enable) => self.subscribe_c2(enable).await,
        };

        if let Err(err) = result {
            self.emit(RadioEvent::Fault(err.to_string())).await;
        }
    }

    async fn emit(&self, event: RadioEvent) {
        if self.events.send(event).await.is_err() {
            debug!("radio event receiver gone");
        }
    }

    async fn scan_start(&mut self) -> Result<(), btleplug::Error> {
        // Scan interval and window are owned by the platform stack; only the
        // service filter is ours to set.
        let filter = ScanFilter {
            services: vec![UUID_IP6BLE_SERVICE],
        };
        let mut central_events = self.adapter.events().await?;
        self.adapter.start_scan(filter).await?;

        let adapter = self.adapter.clone();
        let events = self.events.clone();
        self.scan_task = Some(tokio::spawn(async move {
            while let Some(event) = central_events.next().await {
                let id = match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                    _ => continue,
                };
                let Ok(peripheral) = adapter.peripheral(&id).await else {
                    continue;
                };
                let Ok(Some(props)) = peripheral.properties().await else {
                    continue;
                };
                if !props.services.contains(&UUID_IP6BLE_SERVICE) {
                    continue;
                }
                let peer = BleAddress::from_display(props.address.into_inner());
                let rssi = props.rssi.unwrap_or(0) as i8;
                if events
                    .send(RadioEvent::Advertisement { peer, rssi })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }));
        Ok(())
    }

    async fn scan_stop(&mut self) -> Result<(), btleplug::Error> {
        if let Some(task) = self.scan_task.take() {
            task.abort();
        }
        self.adapter.stop_scan().await
    }

    async fn connect(&mut self, peer: BleAddress) -> Result<(), btleplug::Error> {
        let peripheral = match self.find_peripheral(peer).await {
            Ok(peripheral) => peripheral,
            Err(btleplug::Error::DeviceNotFound) => self.discover_peer(peer).await?,
            Err(err) => return Err(err),
        };
        peripheral.connect().await?;
        debug!(%peer, "peripheral connected");

        self.watch_task = Some(self.spawn_disconnect_watch(peripheral.id()).await?);
        self.peripheral = Some(peripheral);
        self.emit(RadioEvent::Connected {
            bond: BondState::None,
        })
        .await;
        Ok(())
    }

    async fn find_peripheral(&self, peer: BleAddress) -> Result<Peripheral, btleplug::Error> {
        for peripheral in self.adapter.peripherals().await? {
            if let Some(props) = peripheral.properties().await? {
                if BleAddress::from_display(props.address.into_inner()) == peer {
                    return Ok(peripheral);
                }
            }
        }
        Err(btleplug::Error::DeviceNotFound)
    }

    /// Scans until the peer shows up. Bounded below the driver's connect
    /// watchdog so a missing peer still surfaces as a timeout there.
    async fn discover_peer(&self, peer: BleAddress) -> Result<Peripheral, btleplug::Error> {
        debug!(%peer, "peer not yet discovered, scanning");
        let mut central_events = self.adapter.events().await?;
        self.adapter
            .start_scan(ScanFilter {
                services: vec![UUID_IP6BLE_SERVICE],
            })
            .await?;

        let found = tokio::time::timeout(PEER_DISCOVERY_TIMEOUT, async {
            while let Some(event) = central_events.next().await {
                let (CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id)) = event
                else {
                    continue;
                };
                let Ok(peripheral) = self.adapter.peripheral(&id).await else {
                    continue;
                };
                if let Ok(Some(props)) = peripheral.properties().await {
                    if BleAddress::from_display(props.address.into_inner()) == peer {
                        return Ok(peripheral);
                    }
                }
            }
            Err(btleplug::Error::DeviceNotFound)
        })
        .await;

        let _ = self.adapter.stop_scan().await;
        found.map_err(|_| btleplug::Error::DeviceNotFound)?
    }

    async fn spawn_disconnect_watch(
        &self,
        id: PeripheralId,
    ) -> Result<JoinHandle<()>, btleplug::Error> {
        let mut central_events = self.adapter.events().await?;
        let events = self.events.clone();
        Ok(tokio::spawn(async move {
            while let Some(event) = central_events.next().await {
                if matches!(event, CentralEvent::DeviceDisconnected(ref gone) if *gone == id) {
                    let _ = events.send(RadioEvent::Disconnected).await;
                    break;
                }
            }
        }))
    }

    async fn disconnect(&mut self) -> Result<(), btleplug::Error> {
        let Some(peripheral) = self.peripheral.take() else {
            return Ok(());
        };
        if let Some(task) = self.notify_task.take() {
            task.abort();
        }
        self.c1 = None;
        self.c2 = None;
        if peripheral.is_connected().await? {
            peripheral.disconnect().await?;
        }
        // The disconnect watch turns this into a Disconnected event; when it
        // already fired there is nothing more to report.
        Ok(())
    }

    async fn discover_services(&mut self) -> Result<(), btleplug::Error> {
        let Some(peripheral) = &self.peripheral else {
            return Err(btleplug::Error::NotConnected);
        };
        peripheral.discover_services().await?;

        let characteristics = peripheral.characteristics();
        debug!(
            characteristic_count = characteristics.len(),
            "services discovered"
        );

        self.c1 = characteristics
            .iter()
            .find(|c| c.service_uuid == UUID_IP6BLE_SERVICE && c.uuid == UUID_C1)
            .cloned();
        self.c2 = characteristics
            .iter()
            .find(|c| c.service_uuid == UUID_IP6BLE_SERVICE && c.uuid == UUID_C2)
            .cloned();

        let profile = GattProfile {
            has_c1: self.c1.is_some(),
            has_c2: self.c2.is_some(),
            has_c2_cccd: self
                .c2
                .as_ref()
                .map(|c| c.descriptors.iter().any(|d| d.uuid == UUID_CCCD))
                .unwrap_or(false),
        };
        self.emit(RadioEvent::ServicesDiscovered(profile)).await;
        Ok(())
    }

    async fn write_c1(&self, value: &[u8]) -> Result<(), btleplug::Error> {
        let Some(peripheral) = &self.peripheral else {
            return Err(btleplug::Error::NotConnected);
        };
        let Some(c1) = &self.c1 else {
            return Err(btleplug::Error::NotConnected);
        };
        peripheral.write(c1, value, WriteType::WithResponse).await
    }

    async fn subscribe_c2(&mut self, enable: bool) -> Result<(), btleplug::Error> {
        let Some(peripheral) = &self.peripheral else {
            return Err(btleplug::Error::NotConnected);
        };
        let Some(c2) = &self.c2 else {
            return Err(btleplug::Error::NotConnected);
        };

        if !enable {
            if let Some(task) = self.notify_task.take() {
                task.abort();
            }
            return peripheral.unsubscribe(c2).await;
        }

        peripheral.subscribe(c2).await?;
        let mut notifications = peripheral.notifications().await?;
        let events = self.events.clone();
        self.notify_task = Some(tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                if notification.uuid != UUID_C2 {
                    continue;
                }
                debug!(bytes = notification.value.len(), "C2 notification");
                if events
                    .send(RadioEvent::Notification(notification.value))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            debug!("notification stream ended");
        }));
        Ok(())
    }

    async fn shutdown(&mut self) {
        for task in [
            self.scan_task.take(),
            self.notify_task.take(),
            self.watch_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
        if let Some(peripheral) = self.peripheral.take() {
            let _ = peripheral.disconnect().await;
        }
    }
}
