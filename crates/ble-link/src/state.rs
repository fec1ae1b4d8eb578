use crate::error::LinkError;

/// Connection lifecycle. `Disconnected` is terminal for the connection it
/// describes; a new connection restarts from `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Ready,
    Disconnected,
}

impl ConnectionState {
    /// Application data may only move while the radio link is up.
    pub fn can_transfer(self) -> bool {
        matches!(self, Self::Connected | Self::Ready)
    }
}

/// Guarded lifecycle transitions for the single active connection.
#[derive(Debug)]
pub struct Lifecycle {
    state: ConnectionState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Starts a connection attempt. Valid from `Idle` and from
    /// `Disconnected` (a fresh connection after a previous one ended).
    pub fn connect(&mut self) -> Result<(), LinkError> {
        match self.state {
            ConnectionState::Idle | ConnectionState::Disconnected => {
                self.state = ConnectionState::Connecting;
                Ok(())
            }
            state => Err(LinkError::InvalidState(state)),
        }
    }

    pub fn on_connected(&mut self) -> Result<(), LinkError> {
        match self.state {
            ConnectionState::Connecting => {
                self.state = ConnectionState::Connected;
                Ok(())
            }
            state => Err(LinkError::InvalidState(state)),
        }
    }

    pub fn on_ready(&mut self) -> Result<(), LinkError> {
        match self.state {
            ConnectionState::Connected => {
                self.state = ConnectionState::Ready;
                Ok(())
            }
            state => Err(LinkError::InvalidState(state)),
        }
    }

    /// Forces the terminal state. Returns `true` the first time, `false`
    /// when the connection was already down (so callers can keep the
    /// disconnect notification exactly-once).
    pub fn on_disconnected(&mut self) -> bool {
        if self.state == ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Disconnected;
        true
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_happy_path() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.state(), ConnectionState::Idle);
        lc.connect().unwrap();
        assert_eq!(lc.state(), ConnectionState::Connecting);
        lc.on_connected().unwrap();
        assert_eq!(lc.state(), ConnectionState::Connected);
        lc.on_ready().unwrap();
        assert_eq!(lc.state(), ConnectionState::Ready);
        assert!(lc.on_disconnected());
        assert_eq!(lc.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn disconnected_is_reported_once() {
        let mut lc = Lifecycle::new();
        lc.connect().unwrap();
        assert!(lc.on_disconnected());
        assert!(!lc.on_disconnected());
    }

    #[test]
    fn reconnect_allowed_after_disconnect() {
        let mut lc = Lifecycle::new();
        lc.connect().unwrap();
        lc.on_disconnected();
        lc.connect().unwrap();
        assert_eq!(lc.state(), ConnectionState::Connecting);
    }

    #[test]
    fn out_of_order_transitions_are_rejected() {
        let mut lc = Lifecycle::new();
        assert!(matches!(
            lc.on_ready(),
            Err(LinkError::InvalidState(ConnectionState::Idle))
        ));
        lc.connect().unwrap();
        assert!(matches!(
            lc.connect(),
            Err(LinkError::InvalidState(ConnectionState::Connecting))
        ));
        assert!(matches!(
            lc.on_ready(),
            Err(LinkError::InvalidState(ConnectionState::Connecting))
        ));
    }
}
