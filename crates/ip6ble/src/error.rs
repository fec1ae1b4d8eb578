use thiserror::Error;

use crate::task::TaskError;
use ble_link::LinkError;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error("virtual interface error: {0}")]
    Interface(#[from] std::io::Error),
    #[error("service task ended unexpectedly")]
    ServiceGone,
}
