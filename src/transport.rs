//! The transport collaborator (§6 "Transport calls out").
//!
//! The underlying TCP/IP stack is explicitly external to this module: §1
//! scopes out "implementing an IP stack, interrupt/DMA handling, or
//! anything below the socket API" and §9's Design Notes describe it as a
//! collaborator reached only through this interface. A real binding
//! (against `mio`, `std::net`, or a vendor stack) implements `Transport`;
//! this crate never constructs a socket itself.

use crate::addr::SockAddr;
use crate::ids::SocketId;

/// Address family requested when a socket is first obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    Inet,
    Inet6,
}

/// Transport protocol a connection group is configured for (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

/// Asynchronous transport-stack events delivered into `tcp_ip_event`
/// (§6 Downstream API, §4.4 "externally driven transitions").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TcpEvent {
    /// The peer sent FIN; the local half may still have data to flush.
    FinReceived,
    /// The peer reset the connection; no further traffic is possible.
    Reset,
    /// A TCP socket has fully closed and can be reused.
    TcpClosed,
    /// A UDP socket was torn down by the transport.
    UdpClosed,
}

/// The interface this module calls out through. Every method maps
/// directly onto one TCP/IP-stack entry point named in §6:
/// `get_socket`/`bind`/`tcp_listen`/`tcp_connect`/`close`/
/// `udp_transmit`/`tcp_transmit`.
pub trait Transport {
    /// Obtain a fresh socket for the given family/protocol, unbound.
    fn get_socket(&mut self, family: Family, protocol: Protocol) -> std::io::Result<SocketId>;

    /// Bind a socket to a local address (which may carry wildcard
    /// fields, §4.1).
    fn bind(&mut self, socket: SocketId, local: SockAddr) -> std::io::Result<()>;

    /// Put a TCP socket into the listening state.
    fn tcp_listen(&mut self, socket: SocketId, backlog: u16) -> std::io::Result<()>;

    /// Actively open a TCP connection to `remote`.
    fn tcp_connect(&mut self, socket: SocketId, remote: SockAddr) -> std::io::Result<()>;

    /// Close a socket. `abort` requests a non-graceful close (e.g. after
    /// a reset was already observed).
    fn close(&mut self, socket: SocketId, abort: bool) -> std::io::Result<()>;

    /// Send one datagram to `remote` on a UDP socket.
    fn udp_transmit(&mut self, socket: SocketId, data: &[u8], remote: SockAddr) -> std::io::Result<()>;

    /// Send bytes on a connected TCP socket. `force` requests the
    /// one-shot `if_transmit` semantics (§4.6): the whole buffer must go
    /// out now or the call fails, as opposed to the pump's
    /// send-what-fits behavior.
    fn tcp_transmit(&mut self, socket: SocketId, data: &[u8], force: bool) -> std::io::Result<()>;
}
