//! IPv6-over-BLE packet relay.
//!
//! Bridges a host TUN interface to a single BLE peer speaking the
//! IP-over-GATT profile: outbound IPv6 packets are written to the peer's C1
//! characteristic, inbound packets arrive as C2 notifications and are
//! injected back into the host stack.
//!
//! [`BridgeService`] owns the whole arrangement; everything that touches
//! connection state runs on its single service task, fed by a bounded task
//! queue.

pub mod error;
pub mod service;
pub mod task;
pub mod testing;
#[cfg(target_os = "linux")]
pub mod tun;
pub mod vif;

pub use error::BridgeError;
pub use service::{BridgeConfig, BridgeEvent, BridgeService};
pub use vif::{InterfaceFactory, VirtualInterface};

pub type BridgeResult<T> = Result<T, BridgeError>;
