//! Connection state and the single outbound message path.

use log::{debug, info, warn};

use crate::config::ConnParams;

use super::ports::{LinkError, LinkPort};

/// Largest GATT attribute value; longer messages are dropped.
pub const MAX_MESSAGE_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected { handle: u16 },
}

#[derive(Debug)]
pub struct LinkSession {
    state: ConnectionState,
    conn_params: ConnParams,
}

impl LinkSession {
    pub fn new(conn_params: ConnParams) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            conn_params,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }

    /// Record the new connection and ask the central for our preferred
    /// connection parameters.
    pub fn on_connect(&mut self, handle: u16, link: &mut impl LinkPort) {
        if let ConnectionState::Connected { handle: old } = self.state {
            warn!("connect on handle {} while {} still open", handle, old);
        }
        self.state = ConnectionState::Connected { handle };
        info!("controller connected (handle {})", handle);
        if let Err(e) = link.update_conn_params(handle, &self.conn_params) {
            warn!("conn param update: {}", e);
        }
    }

    /// Forget the connection and make the device discoverable again.
    pub fn on_disconnect(&mut self, reason: u16, link: &mut impl LinkPort) {
        self.state = ConnectionState::Disconnected;
        info!("controller disconnected (reason 0x{:02X})", reason);
        if let Err(e) = link.start_advertising() {
            warn!("advertising restart: {}", e);
        }
    }

    /// Notify `"{name} {payload}\n"` to the controller.  Does nothing while
    /// disconnected.  Returns whether the message was handed to the link.
    pub fn send(&mut self, name: &str, payload: &str, link: &mut impl LinkPort) -> bool {
        if !self.is_connected() {
            return false;
        }
        let message = format!("{name} {payload}\n");
        let result = if message.len() > MAX_MESSAGE_LEN {
            Err(LinkError::MessageTooLong)
        } else {
            link.notify(message.as_bytes())
        };
        match result {
            Ok(()) => {
                debug!("-> TX: {}", message.trim_end());
                true
            }
            Err(e) => {
                warn!("send {}: {}", name, e);
                false
            }
        }
    }

    /// Ask the link to close the current connection, if any.  The state
    /// only changes once the link reports the disconnect.
    pub fn request_disconnect(&mut self, link: &mut impl LinkPort) {
        if let ConnectionState::Connected { handle } = self.state {
            if let Err(e) = link.disconnect(handle) {
                warn!("disconnect: {}", e);
            }
        }
    }
}
