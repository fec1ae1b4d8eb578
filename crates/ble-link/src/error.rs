use thiserror::Error;

use crate::radio::RadioError;
use crate::state::ConnectionState;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("operation not valid in state {0:?}")]
    InvalidState(ConnectionState),
    #[error("not connected")]
    NotConnected,
    #[error("characteristic write failed")]
    WriteFailed,
    #[error("peer is missing required {0}")]
    CapabilityMissing(&'static str),
    #[error("unexpected radio callback: {0}")]
    UnexpectedCallback(&'static str),
    #[error("connection attempt timed out")]
    ConnectTimeout,
    #[error(transparent)]
    Radio(#[from] RadioError),
}
