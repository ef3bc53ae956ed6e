//! Runtime status tables (§3) and their zero-init lifecycle.
//!
//! Status is kept separate from configuration on purpose: configuration
//! is immutable after `init`, status is the only thing `main_function`
//! and the callback contexts ever mutate (§5's shared-resource model).

use crate::addr::SockAddr;
use crate::ids::{PduRouteId, SocketId, SocketRouteId};

/// A connection's lifecycle state (§4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoConState {
    /// Quiescent: no socket, no route, nothing pending.
    Offline,
    /// Resources are being acquired or a peer handshake is pending.
    Reconnect,
    /// PDUs may be exchanged.
    Online,
}

impl Default for SoConState {
    fn default() -> Self {
        SoConState::Offline
    }
}

/// Per-connection runtime status (§3).
#[derive(Clone, Copy, Debug, Default)]
pub struct SoConStatus {
    /// Own transport socket, if this connection holds one privately
    /// (`initiate` groups, or a child promoted out of a listen group).
    /// `None` while the group owns the socket instead, or before open.
    pub socket: Option<SocketId>,
    /// The effective remote address: starts as the configured remote,
    /// refined to a concrete peer on first contact for eligible UDP
    /// connections (§3 last invariant).
    pub remote: SockAddr,
    pub state: SoConState,
    pub request_open: bool,
    pub request_close: bool,
    pub request_abort: bool,
    /// Bound only while ONLINE (§3 invariant).
    pub rx_route: Option<SocketRouteId>,
    /// Non-`None` while a segmented tx session is in flight (§3 invariant:
    /// at most one outstanding session per connection).
    pub tx_route: Option<PduRouteId>,
    pub tx_remain: u32,
    pub tx_available: u32,
}

/// Per-group runtime status (§3): just the one socket a listening TCP or
/// shared UDP group may hold on behalf of its children.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoGrpStatus {
    pub socket: Option<SocketId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_offline() {
        assert_eq!(SoConStatus::default().state, SoConState::Offline);
    }

    #[test]
    fn default_sockets_are_invalid() {
        assert_eq!(SoConStatus::default().socket, None);
        assert_eq!(SoGrpStatus::default().socket, None);
    }
}
