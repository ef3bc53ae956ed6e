//! Configuration tables (§3).
//!
//! Every cross-reference here is a small integer id into one of these
//! tables rather than a pointer — the "arena + index" design note (§9):
//! connections, groups, and routes are owned by the top-level registry,
//! and a group never owns its connections directly.
//!
//! Construction follows a consuming-builder shape (`Builder<T>` returning
//! the next stage of `Self`): each builder method takes `self` by value
//! and returns `Self`, and `build()` is the single fallible step, checked
//! once rather than validated piecemeal.

use crate::error::SoAdError;
use crate::ids::{PduId, SoConId, SoGrpId, SocketRouteId};
use crate::addr::SockAddr;
use crate::transport::Protocol;
use crate::upper::{RxSinkHandle, TxSourceHandle};

/// A connection group: shared configuration for a set of connections that
/// either listen on (TCP) or share (UDP) one local endpoint (§3).
#[derive(Clone)]
pub struct SoGrpConfig {
    pub local: SockAddr,
    pub protocol: Protocol,
    /// Auto-open on tick, without requiring a `request_open` latch.
    pub automatic: bool,
    /// Active connect (TCP) rather than passive listen/accept.
    pub initiate: bool,
    /// UDP only: do not auto-promote a wildcard remote on rx.
    pub listen_only: bool,
    pub default_socket_route: Option<SocketRouteId>,
    pub max_channels: u16,
}

/// A single logical connection within a group (§3).
#[derive(Clone)]
pub struct SoConConfig {
    pub group: SoGrpId,
    /// May contain wildcard fields; refined on first contact for UDP.
    pub remote: SockAddr,
    pub socket_route: Option<SocketRouteId>,
}

/// An inbound route: connection traffic to an upper-layer sink (§3).
#[derive(Clone)]
pub struct SocketRoute {
    pub header_id: Option<u32>,
    pub sink: RxSinkHandle,
    pub pdu_id: PduId,
}

/// An outbound route: a PDU id to its owning connection and source (§3).
///
/// The owning [`SoAdConfig`] keeps these sorted strictly ascending by
/// `pdu_id` so [`crate::route::get_pdu_route`] can binary-search them.
#[derive(Clone)]
pub struct PduRoute {
    pub pdu_id: PduId,
    pub source: TxSourceHandle,
    pub connection: SoConId,
    pub header_id: Option<u32>,
}

/// The full, immutable configuration for one `SoAd` instance.
///
/// Built once via [`SoAdConfigBuilder`] and never mutated afterward (§3
/// "configuration tables are immutable after init").
pub struct SoAdConfig {
    pub groups: Vec<SoGrpConfig>,
    pub connections: Vec<SoConConfig>,
    pub socket_routes: Vec<SocketRoute>,
    pub pdu_routes: Vec<PduRoute>,
}

impl SoAdConfig {
    pub fn builder() -> SoAdConfigBuilder {
        SoAdConfigBuilder::default()
    }
}

/// Consuming builder for [`SoAdConfig`] (§B.3).
#[derive(Default)]
pub struct SoAdConfigBuilder {
    groups: Vec<SoGrpConfig>,
    connections: Vec<SoConConfig>,
    socket_routes: Vec<SocketRoute>,
    pdu_routes: Vec<PduRoute>,
}

impl SoAdConfigBuilder {
    pub fn group(mut self, group: SoGrpConfig) -> Self {
        self.groups.push(group);
        self
    }

    pub fn connection(mut self, connection: SoConConfig) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn socket_route(mut self, route: SocketRoute) -> Self {
        self.socket_routes.push(route);
        self
    }

    pub fn pdu_route(mut self, route: PduRoute) -> Self {
        self.pdu_routes.push(route);
        self
    }

    /// Validates the PDU route table is sorted (§3 invariant, §9 "static
    /// precondition, not a runtime invariant" — checked once here, at
    /// the boundary where the table stops being mutable).
    pub fn build(self) -> Result<SoAdConfig, SoAdError> {
        let sorted = self
            .pdu_routes
            .windows(2)
            .all(|pair| pair[0].pdu_id < pair[1].pdu_id);
        if !sorted && self.pdu_routes.len() > 1 {
            return Err(SoAdError::UnsortedPduRoutes);
        }
        Ok(SoAdConfig {
            groups: self.groups,
            connections: self.connections,
            socket_routes: self.socket_routes,
            pdu_routes: self.pdu_routes,
        })
    }
}
