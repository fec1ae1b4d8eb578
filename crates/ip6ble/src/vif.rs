//! Host-side virtual interface boundary.
//!
//! The relay reads and writes whole IPv6 packets; how they reach the host
//! stack is behind these traits so tests can run without a TUN device (and
//! without root).

use std::io;
use std::net::Ipv6Addr;

use async_trait::async_trait;

/// One packet-oriented layer-3 interface.
#[async_trait]
pub trait VirtualInterface: Send {
    /// Receives the next outbound packet from the host stack.
    async fn recv(&mut self) -> io::Result<Vec<u8>>;

    /// Injects one inbound packet into the host stack.
    async fn send(&mut self, packet: &[u8]) -> io::Result<()>;
}

/// Creates the interface once the link-layer parameters are known.
#[async_trait]
pub trait InterfaceFactory: Send + Sync {
    async fn create(
        &self,
        name: &str,
        mtu: u16,
        local: Ipv6Addr,
    ) -> io::Result<Box<dyn VirtualInterface>>;
}
