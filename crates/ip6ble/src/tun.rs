//! Linux TUN backing for the virtual interface.
//!
//! Creating the device needs CAP_NET_ADMIN (typically root) and the tun
//! kernel module.

use std::io;
use std::net::Ipv6Addr;

use async_trait::async_trait;
use tracing::info;
use tun_rs::{AsyncDevice, DeviceBuilder};

use crate::vif::{InterfaceFactory, VirtualInterface};
use ble_link::driver::MAX_PACKET_SIZE;

pub struct TunFactory;

#[async_trait]
impl InterfaceFactory for TunFactory {
    async fn create(
        &self,
        name: &str,
        mtu: u16,
        local: Ipv6Addr,
    ) -> io::Result<Box<dyn VirtualInterface>> {
        let device = DeviceBuilder::new()
            .name(name)
            .mtu(mtu)
            .ipv6(local, 64)
            .build_async()
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("failed to create TUN device (CAP_NET_ADMIN required): {e}"),
                )
            })?;
        let actual_name = device
            .name()
            .map_err(|e| io::Error::other(format!("failed to read device name: {e}")))?;
        info!(name = %actual_name, mtu, %local, "TUN device up");
        Ok(Box::new(TunInterface { device }))
    }
}

pub struct TunInterface {
    device: AsyncDevice,
}

#[async_trait]
impl VirtualInterface for TunInterface {
    async fn recv(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let n = self.device.recv(&mut buf).await?;
        buf.truncate(n);
        Ok(buf)
    }

    async fn send(&mut self, packet: &[u8]) -> io::Result<()> {
        self.device.send(packet).await?;
        Ok(())
    }
}
