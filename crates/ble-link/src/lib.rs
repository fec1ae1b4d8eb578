pub mod addr;
#[cfg(feature = "btleplug")]
pub mod btle;
pub mod driver;
pub mod error;
pub mod queue;
pub mod radio;
pub mod state;

pub use addr::BleAddress;
pub use driver::{BleDriver, Connection, LinkConfig, LinkEvent};
pub use error::LinkError;
pub use radio::{Radio, RadioCommand, RadioEvent, RadioHandle};
pub use state::ConnectionState;

pub type LinkResult<T> = Result<T, LinkError>;
