//! The SoCon state machine (§4.4): entry effects, the per-tick
//! transitions driven by [`crate::SoAd::main_function`], and the
//! externally driven transitions reached from transport callbacks.

use crate::addr::SockAddr;
use crate::det::{Api, DevError, DevErrorReporter};
use crate::error::SoAdError;
use crate::ids::SoConId;
use crate::route;
use crate::status::SoConState;
use crate::table;
use crate::transport::{Family, Protocol, TcpEvent, Transport};
use crate::SoAd;

impl<T: Transport, D: DevErrorReporter> SoAd<T, D> {
    /// Apply the entry effect for `new_state` and record it (§4.4
    /// "States and entry effects").
    pub(crate) fn enter_state(&mut self, id: SoConId, new_state: SoConState) {
        match new_state {
            SoConState::Offline => {
                self.connections[id.0].socket = None;
                if let Some(route_id) = self.connections[id.0].rx_route.take() {
                    let route = &self.config.socket_routes[route_id.0];
                    let sink = route.sink.clone();
                    let pdu_id = route.pdu_id;
                    sink.rx_indication(pdu_id, true);
                }
                self.connections[id.0].state = SoConState::Offline;
            }
            SoConState::Reconnect => {
                self.connections[id.0].state = SoConState::Reconnect;
            }
            SoConState::Online => {
                self.connections[id.0].state = SoConState::Online;
                if let Some(route_id) = route::get_socket_route(&self.config, id) {
                    let route = &self.config.socket_routes[route_id.0];
                    let sink = route.sink.clone();
                    let pdu_id = route.pdu_id;
                    let (status, _advertised) = sink.start_of_reception(pdu_id, 0);
                    if status.is_ok() {
                        self.connections[id.0].rx_route = Some(route_id);
                    }
                }
            }
        }
    }

    /// Advance one connection by one tick (§4.4 "Per-tick transitions").
    pub(crate) fn tick_connection(&mut self, id: SoConId) {
        match self.connections[id.0].state {
            SoConState::Offline => {
                if self.check_open(id) {
                    self.perform_open(id);
                }
            }
            SoConState::Reconnect => {
                self.process_close(id);
            }
            SoConState::Online => {
                self.process_close(id);
                self.pump_transmit(id);
            }
        }
    }

    /// §4.4 "OFFLINE: evaluate `check_open`".
    fn check_open(&self, id: SoConId) -> bool {
        let status = &self.connections[id.0];
        let con_config = &self.config.connections[id.0];
        let group_config = &self.config.groups[con_config.group.0];

        let no_own_socket = status.socket.is_none();
        let allowed = group_config.automatic || status.request_open;
        let remote_known = status.remote.has_family();

        no_own_socket && allowed && remote_known
    }

    /// §4.4 "perform_open". Returns whether the connection transitioned
    /// out of OFFLINE.
    fn perform_open(&mut self, id: SoConId) -> bool {
        self.connections[id.0].request_open = false;

        let group_id = self.config.connections[id.0].group;
        let local = self.config.groups[group_id.0].local;
        let protocol = self.config.groups[group_id.0].protocol;
        let initiate = self.config.groups[group_id.0].initiate;
        let max_channels = self.config.groups[group_id.0].max_channels;
        let effective_remote = self.connections[id.0].remote;

        let family = match local {
            SockAddr::Inet6 { .. } => Family::Inet6,
            _ => Family::Inet,
        };

        let needs_new_socket = if initiate {
            self.connections[id.0].socket.is_none()
        } else {
            self.groups[group_id.0].socket.is_none()
        };

        let socket = if needs_new_socket {
            match self.transport.get_socket(family, protocol) {
                Ok(socket) => socket,
                Err(_) => return false,
            }
        } else if initiate {
            self.connections[id.0]
                .socket
                .expect("needs_new_socket is false for initiate only when a socket is held")
        } else {
            self.groups[group_id.0]
                .socket
                .expect("needs_new_socket is false for non-initiate only when the group holds one")
        };

        if needs_new_socket {
            if self.transport.bind(socket, local).is_err() {
                let _ = self.transport.close(socket, false);
                return false;
            }
            let opened = match (protocol, initiate) {
                (Protocol::Tcp, true) => self.transport.tcp_connect(socket, effective_remote),
                (Protocol::Tcp, false) => self.transport.tcp_listen(socket, max_channels),
                (Protocol::Udp, _) => Ok(()),
            };
            if opened.is_err() {
                let _ = self.transport.close(socket, false);
                return false;
            }
        }

        if initiate {
            self.connections[id.0].socket = Some(socket);
        } else {
            self.groups[group_id.0].socket = Some(socket);
        }

        // §4.4 "special case: UDP with a non-wildcard remote transitions
        // directly to ONLINE (no peer handshake needed)."
        if protocol == Protocol::Udp && !effective_remote.is_wildcard() {
            self.enter_state(id, SoConState::Online);
        } else {
            self.enter_state(id, SoConState::Reconnect);
        }
        true
    }

    /// §4.4 "RECONNECT: honor `request_close`" / "ONLINE: honor
    /// `request_close` as above": if the latch is set and a socket is
    /// held, close it and clear the latch. Neither the socket id nor the
    /// connection's state changes here — OFFLINE is reached only once the
    /// transport delivers the matching `TCP_CLOSED`/`UDP_CLOSED` event
    /// through `tcp_ip_event`.
    pub(crate) fn process_close(&mut self, id: SoConId) {
        if !self.connections[id.0].request_close {
            return;
        }
        if let Some(socket) = self.connections[id.0].socket {
            let abort = self.connections[id.0].request_abort;
            let _ = self.transport.close(socket, abort);
        }
        self.connections[id.0].request_close = false;
        self.connections[id.0].request_abort = false;
    }

    /// §4.4 "`tcp_accepted(listen_socket, new_socket, remote)`".
    pub fn tcp_accepted(
        &mut self,
        listen_socket: crate::ids::SocketId,
        new_socket: crate::ids::SocketId,
        remote: SockAddr,
    ) -> Result<(), SoAdError> {
        let group_id = match table::find_group_by_socket(&self.groups, listen_socket) {
            Some(group_id) => group_id,
            None => {
                self.det.report(Api::TcpAccepted, DevError::InvalidSocketId);
                return Err(SoAdError::InvalidSocketId);
            }
        };
        if self.config.groups[group_id.0].initiate {
            self.det.report(Api::TcpAccepted, DevError::InvalidArgument);
            return Err(SoAdError::InvalidArgument);
        }
        let con_id = match table::free_slot_match(&self.config, &self.connections, group_id, remote) {
            Some(con_id) => con_id,
            None => return Err(SoAdError::NoFreeSlot),
        };
        self.connections[con_id.0].socket = Some(new_socket);
        self.connections[con_id.0].remote = remote;
        self.enter_state(con_id, SoConState::Online);
        Ok(())
    }

    /// §4.4 "`tcp_connected(socket)`".
    pub fn tcp_connected(&mut self, socket: crate::ids::SocketId) {
        let con_id = match table::find_connection_by_socket(&self.connections, socket) {
            Some(con_id) => con_id,
            None => {
                self.det.report(Api::TcpConnected, DevError::InvalidSocketId);
                return;
            }
        };
        let group_id = self.config.connections[con_id.0].group;
        let group = &self.config.groups[group_id.0];
        if group.initiate
            && group.protocol == Protocol::Tcp
            && self.connections[con_id.0].state != SoConState::Online
        {
            self.enter_state(con_id, SoConState::Online);
        }
    }

    /// §4.4 "transport events". `TCP_RESET | TCP_CLOSED | UDP_CLOSED`
    /// cascade to every child of a lost group socket (§4.4, §9 "the
    /// correct behavior", fixing the reference implementation's
    /// uninitialized-index bug rather than reproducing it).
    pub fn tcp_ip_event(&mut self, socket: crate::ids::SocketId, event: TcpEvent) {
        match event {
            TcpEvent::FinReceived => {
                let _ = self.transport.close(socket, false);
            }
            TcpEvent::Reset | TcpEvent::TcpClosed | TcpEvent::UdpClosed => {
                if let Some(group_id) = table::find_group_by_socket(&self.groups, socket) {
                    self.groups[group_id.0].socket = None;
                    let orphaned: Vec<SoConId> = self
                        .config
                        .connections
                        .iter()
                        .enumerate()
                        .filter(|(idx, con)| {
                            con.group == group_id && self.connections[*idx].socket.is_none()
                        })
                        .map(|(idx, _)| SoConId(idx))
                        .collect();
                    for con_id in orphaned {
                        self.enter_state(con_id, SoConState::Offline);
                    }
                } else if let Some(con_id) = table::find_connection_by_socket(&self.connections, socket) {
                    self.enter_state(con_id, SoConState::Offline);
                } else {
                    self.det.report(Api::TcpIpEvent, DevError::InvalidSocketId);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SoConConfig, SoGrpConfig};
    use crate::det::test_support::RecordingDevErrorReporter;
    use crate::ids::{SoConId as ConId, SoGrpId, SocketId};
    use crate::transport::test_support::FakeTransport;
    use crate::SoAd;

    fn listen_group_config() -> SoAdConfigTestFixture {
        let config = crate::config::SoAdConfig::builder()
            .group(SoGrpConfig {
                local: SockAddr::Inet { addr: 0, port: 8000 },
                protocol: Protocol::Tcp,
                automatic: true,
                initiate: false,
                listen_only: false,
                default_socket_route: None,
                max_channels: 2,
            })
            .connection(SoConConfig {
                group: SoGrpId(0),
                remote: SockAddr::any_v4(),
                socket_route: None,
            })
            .connection(SoConConfig {
                group: SoGrpId(0),
                remote: SockAddr::any_v4(),
                socket_route: None,
            })
            .build()
            .unwrap();
        SoAdConfigTestFixture { config }
    }

    struct SoAdConfigTestFixture {
        config: crate::config::SoAdConfig,
    }

    fn make(fixture: SoAdConfigTestFixture) -> SoAd<FakeTransport, RecordingDevErrorReporter> {
        SoAd::with_reporter(
            fixture.config,
            FakeTransport::new(),
            RecordingDevErrorReporter::default(),
        )
    }

    #[test]
    fn tcp_listen_group_opens() {
        let mut soad = make(listen_group_config());
        soad.main_function();

        assert!(soad.group_status(SoGrpId(0)).socket.is_some());
        assert!(soad
            .transport
            .listening
            .contains(soad.group_status(SoGrpId(0)).socket.as_ref().unwrap()));

        for con_id in [ConId(0), ConId(1)] {
            assert_eq!(soad.connection_status(con_id).state, SoConState::Reconnect);
            assert_eq!(soad.connection_status(con_id).socket, None);
        }
    }

    #[test]
    fn tcp_accept_promotes_a_child() {
        let mut soad = make(listen_group_config());
        soad.main_function();
        let listen_socket = soad.group_status(SoGrpId(0)).socket.unwrap();

        let remote1 = SockAddr::Inet {
            addr: 0x0100_0001,
            port: 1,
        };
        soad.tcp_accepted(listen_socket, SocketId(42), remote1).unwrap();
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Online);
        assert_eq!(soad.connection_status(ConId(0)).socket, Some(SocketId(42)));
        assert_eq!(soad.connection_status(ConId(0)).remote, remote1);

        let remote2 = SockAddr::Inet {
            addr: 0x0100_0002,
            port: 1,
        };
        soad.tcp_accepted(listen_socket, SocketId(43), remote2).unwrap();
        assert_eq!(soad.connection_status(ConId(1)).state, SoConState::Online);
        assert_eq!(soad.connection_status(ConId(1)).socket, Some(SocketId(43)));
    }

    #[test]
    fn tcp_active_connect() {
        let config = crate::config::SoAdConfig::builder()
            .group(SoGrpConfig {
                local: SockAddr::any_v4(),
                protocol: Protocol::Tcp,
                automatic: true,
                initiate: true,
                listen_only: false,
                default_socket_route: None,
                max_channels: 1,
            })
            .connection(SoConConfig {
                group: SoGrpId(0),
                remote: SockAddr::Inet {
                    addr: 0x7f000001,
                    port: 8000,
                },
                socket_route: None,
            })
            .build()
            .unwrap();
        let mut soad = make(SoAdConfigTestFixture { config });
        soad.main_function();

        let socket = soad.connection_status(ConId(0)).socket.unwrap();
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Reconnect);
        assert!(soad.transport.connecting.contains_key(&socket));

        soad.tcp_connected(socket);
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Online);
    }

    #[test]
    fn group_loss_cascades_to_socketless_children() {
        let mut soad = make(listen_group_config());
        soad.main_function();
        let listen_socket = soad.group_status(SoGrpId(0)).socket.unwrap();

        // Only connection 0 gets accepted; connection 1 remains armed
        // without its own socket.
        soad.tcp_accepted(
            listen_socket,
            SocketId(42),
            SockAddr::Inet {
                addr: 1,
                port: 1,
            },
        )
        .unwrap();

        soad.tcp_ip_event(listen_socket, TcpEvent::Reset);

        assert_eq!(soad.group_status(SoGrpId(0)).socket, None);
        // Connection 0 privately holds socket 42, so it is unaffected by
        // the cascade.
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Online);
        // Connection 1 never got a private socket and is pushed OFFLINE.
        assert_eq!(soad.connection_status(ConId(1)).state, SoConState::Offline);
    }

    #[test]
    fn unknown_socket_on_accept_reports_dev_error() {
        let mut soad = make(listen_group_config());
        let result = soad.tcp_accepted(SocketId(999), SocketId(1), SockAddr::any_v4());
        assert!(result.is_err());
        assert_eq!(soad.det.reports.len(), 1);
    }

    #[test]
    fn request_close_closes_the_socket_but_defers_offline_to_the_closed_event() {
        let mut soad = make(listen_group_config());
        soad.main_function();
        let listen_socket = soad.group_status(SoGrpId(0)).socket.unwrap();
        soad.tcp_accepted(listen_socket, SocketId(7), SockAddr::any_v4())
            .unwrap();

        soad.request_close(ConId(0), false);
        soad.main_function();

        // The socket is closed and the latch cleared, but the connection
        // stays ONLINE, still holding socket id 7, until the transport
        // reports the matching close event.
        assert!(soad.transport.closed.iter().any(|(s, _)| *s == SocketId(7)));
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Online);
        assert_eq!(soad.connection_status(ConId(0)).socket, Some(SocketId(7)));
        assert!(!soad.connection_status(ConId(0)).request_close);

        soad.tcp_ip_event(SocketId(7), TcpEvent::TcpClosed);
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Offline);
    }

    #[test]
    fn request_open_latch_is_consumed_by_perform_open() {
        let config = crate::config::SoAdConfig::builder()
            .group(SoGrpConfig {
                local: SockAddr::any_v4(),
                protocol: Protocol::Tcp,
                automatic: false,
                initiate: true,
                listen_only: false,
                default_socket_route: None,
                max_channels: 1,
            })
            .connection(SoConConfig {
                group: SoGrpId(0),
                remote: SockAddr::Inet {
                    addr: 0x7f000001,
                    port: 8000,
                },
                socket_route: None,
            })
            .build()
            .unwrap();
        let mut soad = make(SoAdConfigTestFixture { config });

        // Not automatic and never requested: stays OFFLINE.
        soad.main_function();
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Offline);

        soad.request_open(ConId(0));
        soad.main_function();
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Reconnect);
        assert!(!soad.connection_status(ConId(0)).request_open);

        // Tear the connection back down without ever requesting again.
        let socket = soad.connection_status(ConId(0)).socket.unwrap();
        soad.tcp_ip_event(socket, TcpEvent::Reset);
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Offline);

        // The one-shot latch was already consumed, so the connection does
        // not silently reopen on the next tick.
        soad.main_function();
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Offline);
    }
}
