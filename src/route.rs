//! Route registry (§4.2).

use crate::config::SoAdConfig;
use crate::error::SoAdError;
use crate::ids::{PduId, PduRouteId, SoConId, SocketRouteId};

/// Binary search the PDU-route table for an exact `pdu_id` hit (§4.2,
/// §9 "binary search over PDU routes").
///
/// The table must already be sorted ascending by `pdu_id` —
/// `SoAdConfigBuilder::build` enforces this once at construction, so the
/// lookup itself never has to re-check it.
pub fn get_pdu_route(config: &SoAdConfig, pdu_id: PduId) -> Result<PduRouteId, SoAdError> {
    config
        .pdu_routes
        .binary_search_by_key(&pdu_id, |route| route.pdu_id)
        .map(PduRouteId)
        .map_err(|_| SoAdError::InvalidPdu(pdu_id))
}

/// Resolve the rx route for a connection (§4.2 `get_socket_route`):
/// prefer the connection's own route id, else the owning group's
/// default, else none.
pub fn get_socket_route(config: &SoAdConfig, connection: SoConId) -> Option<SocketRouteId> {
    let con = &config.connections[connection.0];
    con.socket_route.or_else(|| {
        let group = &config.groups[con.group.0];
        group.default_socket_route
    })
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::addr::SockAddr;
    use crate::config::{PduRoute, SoConConfig, SoGrpConfig, SocketRoute};
    use crate::transport::Protocol;
    use crate::upper::test_support::{FakeRxSink, FakeTxSource};

    fn sample_config() -> SoAdConfig {
        let group = SoGrpConfig {
            local: SockAddr::any_v4(),
            protocol: Protocol::Udp,
            automatic: true,
            initiate: false,
            listen_only: false,
            default_socket_route: Some(SocketRouteId(0)),
            max_channels: 1,
        };
        let sink = FakeRxSink::new(64) as Rc<dyn crate::upper::RxSink>;
        let source = FakeTxSource::new(vec![1, 2, 3]) as Rc<dyn crate::upper::TxSource>;
        SoAdConfig::builder()
            .group(group)
            .connection(SoConConfig {
                group: crate::ids::SoGrpId(0),
                remote: SockAddr::any_v4(),
                socket_route: None,
            })
            .socket_route(SocketRoute {
                header_id: None,
                sink,
                pdu_id: PduId(5),
            })
            .pdu_route(PduRoute {
                pdu_id: PduId(1),
                source: source.clone(),
                connection: SoConId(0),
                header_id: None,
            })
            .pdu_route(PduRoute {
                pdu_id: PduId(5),
                source,
                connection: SoConId(0),
                header_id: None,
            })
            .build()
            .unwrap()
    }

    #[test]
    fn exact_hit_resolves() {
        let config = sample_config();
        let id = get_pdu_route(&config, PduId(5)).unwrap();
        assert_eq!(config.pdu_routes[id.0].pdu_id, PduId(5));
    }

    #[test]
    fn miss_is_an_error() {
        let config = sample_config();
        assert!(get_pdu_route(&config, PduId(2)).is_err());
    }

    #[test]
    fn socket_route_falls_back_to_group_default() {
        let config = sample_config();
        assert_eq!(get_socket_route(&config, SoConId(0)), Some(SocketRouteId(0)));
    }
}
