//! A Socket Adaptor: the thin, stateful layer between a routed PDU layer
//! and a TCP/UDP transport stack (§1).
//!
//! This crate owns exactly three things: the lifecycle of each logical
//! connection (`SoCon`), the tables that route inbound bytes to an
//! upper-layer sink and outbound PDUs to a connection, and the pump that
//! drives segmented transmissions. The transport stack itself, the PDU
//! router above this module, and configuration loading are all external
//! collaborators reached only through the traits in [`transport`] and
//! [`upper`] — this crate never opens a socket on its own.
//!
//! The module is single-threaded and cooperative (§5): there are no
//! internal threads, and the host is responsible for serializing calls
//! into [`SoAd::main_function`], the upstream transmit entry points, and
//! the downstream transport callbacks.

pub mod addr;
pub mod config;
pub mod det;
pub mod dispatch;
pub mod error;
pub mod ids;
pub mod route;
pub mod statemachine;
pub mod status;
pub mod table;
pub mod transport;
pub mod txpump;
pub mod upper;

use config::SoAdConfig;
use det::{DevErrorReporter, LoggingDevErrorReporter};
use ids::SoConId;
use status::{SoConStatus, SoGrpStatus};
use transport::Transport;

/// The Socket Adaptor instance: configuration, runtime status, and the
/// two external collaborators it is generic over (§2, §5).
///
/// `T` is the transport stack binding; `D` is the development-error
/// reporter, defaulted to a `log`-backed implementation so a caller that
/// does not care about development-error policy does not have to name
/// one.
pub struct SoAd<T: Transport, D: DevErrorReporter = LoggingDevErrorReporter> {
    pub(crate) config: SoAdConfig,
    pub(crate) groups: Vec<SoGrpStatus>,
    pub(crate) connections: Vec<SoConStatus>,
    pub(crate) transport: T,
    pub(crate) det: D,
}

impl<T: Transport> SoAd<T, LoggingDevErrorReporter> {
    /// Build a new instance with the default logging development-error
    /// reporter.
    pub fn new(config: SoAdConfig, transport: T) -> Self {
        Self::with_reporter(config, transport, LoggingDevErrorReporter::default())
    }
}

impl<T: Transport, D: DevErrorReporter> SoAd<T, D> {
    /// Build a new instance with an explicit development-error reporter
    /// (§6 `init`): status is reset and every connection forced OFFLINE
    /// as part of construction.
    pub fn with_reporter(config: SoAdConfig, transport: T, det: D) -> Self {
        let groups = vec![SoGrpStatus::default(); config.groups.len()];
        let connections = config
            .connections
            .iter()
            .map(|con| SoConStatus {
                remote: con.remote,
                ..Default::default()
            })
            .collect();
        let mut soad = SoAd {
            config,
            groups,
            connections,
            transport,
            det,
        };
        soad.init();
        soad
    }

    /// `init` (§6 Upstream API): reinstall zeroed status for every
    /// connection and group, with the effective remote reset to each
    /// connection's configured remote, and force every connection
    /// OFFLINE.
    ///
    /// Re-running `init` on an existing instance discards all in-flight
    /// sessions and sockets without closing them through the transport —
    /// callers that need a clean transport-level teardown first should
    /// request `close` on every connection and let one more
    /// `main_function` tick drain it before calling `init` again.
    pub fn init(&mut self) {
        for status in &mut self.groups {
            *status = SoGrpStatus::default();
        }
        for (idx, status) in self.connections.iter_mut().enumerate() {
            *status = SoConStatus {
                remote: self.config.connections[idx].remote,
                ..Default::default()
            };
        }
    }

    /// A read-only view of one connection's current status, mainly
    /// useful for tests and diagnostics.
    pub fn connection_status(&self, id: SoConId) -> &SoConStatus {
        &self.connections[id.0]
    }

    /// A read-only view of one group's current status.
    pub fn group_status(&self, id: ids::SoGrpId) -> &SoGrpStatus {
        &self.groups[id.0]
    }

    /// Request that a connection be opened on the next tick, for groups
    /// that are not `automatic` (§4.4 "the `request_open` latch is set").
    pub fn request_open(&mut self, id: SoConId) {
        self.connections[id.0].request_open = true;
    }

    /// Request that a connection be closed on the next tick (§5 "latched
    /// requests").
    pub fn request_close(&mut self, id: SoConId, abort: bool) {
        self.connections[id.0].request_close = true;
        self.connections[id.0].request_abort = abort;
    }

    /// Advance every connection by one tick (§6 `main_function`, §4.4
    /// "periodic driver").
    pub fn main_function(&mut self) {
        for idx in 0..self.connections.len() {
            self.tick_connection(SoConId(idx));
        }
    }

    /// The socket this connection currently transmits/receives on: its
    /// own, if it holds one privately, else its group's shared socket
    /// (§3 invariant: "a connection in ONLINE has either its own socket
    /// id or inherits the group's socket id").
    pub(crate) fn effective_socket(&self, id: SoConId) -> Option<ids::SocketId> {
        self.connections[id.0].socket.or_else(|| {
            let group_id = self.config.connections[id.0].group;
            self.groups[group_id.0].socket
        })
    }
}
