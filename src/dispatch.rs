//! The receive dispatcher (§4.5): resolves an inbound socket event to a
//! connection, performs optional wildcard-remote promotion, and delivers
//! the payload through the probe-then-copy contract (§9).

use crate::addr::SockAddr;
use crate::det::{Api, DevError, DevErrorReporter};
use crate::error::SoAdError;
use crate::ids::{SoConId, SocketId};
use crate::status::SoConState;
use crate::table;
use crate::transport::{Protocol, Transport};
use crate::SoAd;

impl<T: Transport, D: DevErrorReporter> SoAd<T, D> {
    /// `rx_indication(socket_id, remote, buf, len)` (§4.4, §4.5).
    pub fn rx_indication(&mut self, socket: SocketId, remote: SockAddr, buf: &[u8]) -> Result<(), SoAdError> {
        let con_id = match self.resolve_rx_connection(socket, remote) {
            Some(con_id) => con_id,
            None => {
                self.det.report(Api::RxIndication, DevError::InvalidSocketId);
                return Err(SoAdError::InvalidSocketId);
            }
        };

        let promotion = self.try_promote(con_id, remote);

        let result = self.deliver(con_id, buf);

        if result.is_err() {
            if let Some((saved_remote, saved_state)) = promotion {
                self.connections[con_id.0].remote = saved_remote;
                self.enter_state(con_id, saved_state);
            }
        }

        result
    }

    /// §4.5 step 1: resolve `socket` directly to a connection, or to a
    /// group and then to one of its free slots via wildcard match on
    /// `remote`.
    fn resolve_rx_connection(&self, socket: SocketId, remote: SockAddr) -> Option<SoConId> {
        if let Some(con_id) = table::find_connection_by_socket(&self.connections, socket) {
            return Some(con_id);
        }
        let group_id = table::find_group_by_socket(&self.groups, socket)?;
        table::free_slot_match(&self.config, &self.connections, group_id, remote)
    }

    /// §4.5 step 2: promote a wildcard remote to the concrete observed
    /// peer, if the connection is eligible. Returns the saved
    /// `(remote, state)` pair to restore on a later delivery failure.
    fn try_promote(&mut self, con_id: SoConId, remote: SockAddr) -> Option<(SockAddr, SoConState)> {
        let group_id = self.config.connections[con_id.0].group;
        let group = &self.config.groups[group_id.0];

        let eligible = self.connections[con_id.0].state != SoConState::Online
            && group.protocol == Protocol::Udp
            && !group.listen_only
            && self.connections[con_id.0].remote.is_wildcard();

        if !eligible {
            return None;
        }

        let saved_remote = self.connections[con_id.0].remote;
        let saved_state = self.connections[con_id.0].state;
        self.connections[con_id.0].remote = remote;
        self.enter_state(con_id, SoConState::Online);
        Some((saved_remote, saved_state))
    }

    /// §4.5 step 3: the probe-then-copy delivery. A connection with no
    /// rx route bound (not yet ONLINE, or the sink declined
    /// `start_of_reception`) has nothing to deliver to and this counts
    /// as a failure, exactly as an explicit sink rejection would (§4.5
    /// step 4 distinguishes only on whether a promotion needs reverting,
    /// not on why delivery failed).
    fn deliver(&mut self, con_id: SoConId, buf: &[u8]) -> Result<(), SoAdError> {
        let route_id = match self.connections[con_id.0].rx_route {
            Some(route_id) => route_id,
            None => return Err(SoAdError::BufferRejected),
        };
        let route = &self.config.socket_routes[route_id.0];
        let sink = route.sink.clone();
        let pdu_id = route.pdu_id;

        let (probe_status, available) = sink.copy_rx_data(pdu_id, None);
        if !probe_status.is_ok() || available < buf.len() as u32 {
            sink.rx_indication(pdu_id, false);
            return Err(SoAdError::BufferRejected);
        }

        let (copy_status, _) = sink.copy_rx_data(pdu_id, Some(buf));
        let ok = copy_status.is_ok();
        sink.rx_indication(pdu_id, ok);
        if ok {
            Ok(())
        } else {
            Err(SoAdError::BufferRejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PduRoute, SoConConfig, SoGrpConfig, SocketRoute};
    use crate::det::test_support::RecordingDevErrorReporter;
    use crate::ids::{PduId, SoConId as ConId, SoGrpId, SocketRouteId};
    use crate::status::SoConState;
    use crate::transport::test_support::FakeTransport;
    use crate::upper::test_support::{FakeRxSink, FakeTxSource, RefusingRxSink};
    use crate::upper::{RxSink, TxSource};
    use crate::SoAd;
    use std::rc::Rc;

    fn udp_group_with_sink(
        sink: Rc<dyn RxSink>,
    ) -> SoAd<FakeTransport, RecordingDevErrorReporter> {
        let source = FakeTxSource::new(vec![]) as Rc<dyn TxSource>;
        let config = crate::config::SoAdConfig::builder()
            .group(SoGrpConfig {
                local: SockAddr::any_v4(),
                protocol: Protocol::Udp,
                automatic: true,
                initiate: false,
                listen_only: false,
                default_socket_route: Some(SocketRouteId(0)),
                max_channels: 1,
            })
            .connection(SoConConfig {
                group: SoGrpId(0),
                remote: SockAddr::any_v4(),
                socket_route: None,
            })
            .socket_route(SocketRoute {
                header_id: None,
                sink,
                pdu_id: PduId(1),
            })
            .pdu_route(PduRoute {
                pdu_id: PduId(1),
                source,
                connection: ConId(0),
                header_id: None,
            })
            .build()
            .unwrap();
        SoAd::with_reporter(config, FakeTransport::new(), RecordingDevErrorReporter::default())
    }

    #[test]
    fn udp_wildcard_promotion_on_rx() {
        let sink = FakeRxSink::new(1024);
        let mut soad = udp_group_with_sink(sink.clone());
        soad.main_function();

        let group_socket = soad.group_status(SoGrpId(0)).socket.unwrap();
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Reconnect);

        let remote = SockAddr::Inet {
            addr: 0x0100_0002,
            port: 2,
        };
        let payload = vec![0u8; 100];
        soad.rx_indication(group_socket, remote, &payload).unwrap();

        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Online);
        assert_eq!(soad.connection_status(ConId(0)).remote, remote);
        assert_eq!(sink.received.borrow().len(), 100);
    }

    #[test]
    fn udp_rx_reverts_on_sink_failure() {
        let sink = RefusingRxSink::new();
        let mut soad = udp_group_with_sink(sink.clone());
        soad.main_function();
        let group_socket = soad.group_status(SoGrpId(0)).socket.unwrap();

        let original_remote = soad.connection_status(ConId(0)).remote;
        let remote = SockAddr::Inet {
            addr: 0x0100_0002,
            port: 2,
        };
        let payload = vec![0u8; 100];
        let result = soad.rx_indication(group_socket, remote, &payload);

        assert!(result.is_err());
        assert_eq!(soad.connection_status(ConId(0)).state, SoConState::Reconnect);
        assert_eq!(soad.connection_status(ConId(0)).remote, original_remote);
    }

    #[test]
    fn unresolvable_socket_reports_invalid_socket_id() {
        let sink = FakeRxSink::new(64);
        let mut soad = udp_group_with_sink(sink);
        let result = soad.rx_indication(crate::ids::SocketId(999), SockAddr::any_v4(), &[]);
        assert!(result.is_err());
        assert_eq!(soad.det.reports.len(), 1);
    }
}
