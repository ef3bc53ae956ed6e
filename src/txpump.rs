//! The transmit pump (§4.6): the one-shot `if_transmit` path, the
//! segmented `tp_transmit` session, and the per-tick pump that advances
//! an armed session.
//!
//! The distilled spec describes the per-tick pump as both "querying the
//! upper source for available bytes" and "instructing the transport to
//! transmit" in the same breath, which conflates two AUTOSAR TP
//! interaction styles: the transport pulling bytes from this module via
//! the downstream `copy_tx_data(socket, buf, len)` entry point, and this
//! module pushing bytes outward once it knows how many are ready. This
//! implementation resolves the ambiguity by having the pump itself pull
//! from the upper `TxSource` into a scratch buffer and hand that buffer
//! to the transport's `tcp_transmit`/`udp_transmit`; the downstream
//! `copy_tx_data` entry point is kept as a second, equivalent path for a
//! transport that prefers to pull directly, sharing the same internal
//! `pull_tx` helper (see DESIGN.md).

use crate::det::{Api, DevError, DevErrorReporter};
use crate::error::SoAdError;
use crate::ids::{PduId, SoConId, SocketId};
use crate::route;
use crate::status::SoConState;
use crate::table;
use crate::transport::{Protocol, Transport};
use crate::upper::BufReq;
use crate::SoAd;

impl<T: Transport, D: DevErrorReporter> SoAd<T, D> {
    /// `if_transmit(pdu_id, info)` (§4.6): one-shot, unsegmented send.
    pub fn if_transmit(&mut self, pdu_id: PduId, data: &[u8]) -> Result<(), SoAdError> {
        let route_id = self.lookup_pdu_route(Api::IfTransmit, pdu_id)?;
        let con_id = self.config.pdu_routes[route_id.0].connection;

        if self.connections[con_id.0].state != SoConState::Online {
            return Err(SoAdError::NotOnline(con_id));
        }
        let socket = self
            .effective_socket(con_id)
            .ok_or(SoAdError::NotOnline(con_id))?;

        let group_id = self.config.connections[con_id.0].group;
        let protocol = self.config.groups[group_id.0].protocol;
        let remote = self.connections[con_id.0].remote;

        match protocol {
            Protocol::Udp => self.transport.udp_transmit(socket, data, remote)?,
            Protocol::Tcp => self.transport.tcp_transmit(socket, data, true)?,
        }
        Ok(())
    }

    /// `tp_transmit(pdu_id, info)` (§4.6): arm a segmented session of
    /// `total_len` bytes on the PDU's target connection. The pump
    /// advances it on subsequent ticks.
    pub fn tp_transmit(&mut self, pdu_id: PduId, total_len: u32) -> Result<(), SoAdError> {
        let route_id = self.lookup_pdu_route(Api::TpTransmit, pdu_id)?;
        let con_id = self.config.pdu_routes[route_id.0].connection;

        if self.connections[con_id.0].state != SoConState::Online {
            return Err(SoAdError::NotOnline(con_id));
        }
        if self.connections[con_id.0].tx_route.is_some() {
            // §3 invariant: at most one outstanding tx session per connection.
            return Err(SoAdError::BufferRejected);
        }

        self.connections[con_id.0].tx_route = Some(route_id);
        self.connections[con_id.0].tx_remain = total_len;
        self.connections[con_id.0].tx_available = 0;
        Ok(())
    }

    /// Downstream `tx_confirmation(socket_id, len)` (§6, §C.4): a genuine
    /// no-op in the reference implementation for the configurations this
    /// crate targets, kept as a named entry point because the Downstream
    /// API names it explicitly and a `TcpImmediateTpTxConfirmation`
    /// transport is entitled to call it.
    pub fn tx_confirmation(&mut self, _socket: SocketId, _len: u16) {}

    /// Downstream `copy_tx_data(socket_id, buf, len)` (§6): the transport
    /// pulls directly instead of waiting for the pump to push. Shares
    /// `pull_tx` with the per-tick pump so both paths drain the same
    /// upper source consistently.
    pub fn copy_tx_data(&mut self, socket: SocketId, buf: &mut [u8]) -> BufReq {
        let con_id = match self.find_active_tx_connection(socket) {
            Some(con_id) => con_id,
            None => {
                self.det.report(Api::CopyTxData, DevError::InvalidSocketId);
                return BufReq::NotOk;
            }
        };
        if self.connections[con_id.0].tx_route.is_none() {
            return BufReq::NotOk;
        }

        let (status, copied) = self.pull_tx(con_id, Some(buf));
        if status.is_ok() {
            let remain = &mut self.connections[con_id.0].tx_remain;
            *remain = remain.saturating_sub(copied);
            if self.connections[con_id.0].tx_remain == 0 {
                self.end_tx_session(con_id, true);
            }
        }
        status
    }

    /// §4.6 "Per-tick pump while ONLINE".
    pub(crate) fn pump_transmit(&mut self, con_id: SoConId) {
        if self.connections[con_id.0].tx_route.is_none() {
            return;
        }

        if self.connections[con_id.0].tx_available == 0 {
            let (status, available) = self.pull_tx(con_id, None);
            match status {
                BufReq::Ok => self.connections[con_id.0].tx_available = available,
                BufReq::Busy => return,
                BufReq::NotOk | BufReq::Overflow => {
                    self.end_tx_session(con_id, false);
                    return;
                }
            }
        }

        let available = self.connections[con_id.0].tx_available;
        if available == 0 {
            return;
        }

        let mut scratch = vec![0u8; available as usize];
        let (copy_status, copied) = self.pull_tx(con_id, Some(&mut scratch));
        if !copy_status.is_ok() {
            self.end_tx_session(con_id, false);
            return;
        }
        scratch.truncate(copied as usize);

        let group_id = self.config.connections[con_id.0].group;
        let protocol = self.config.groups[group_id.0].protocol;
        let socket = match self.effective_socket(con_id) {
            Some(socket) => socket,
            None => {
                self.end_tx_session(con_id, false);
                return;
            }
        };
        let remote = self.connections[con_id.0].remote;

        let sent = match protocol {
            Protocol::Udp => self.transport.udp_transmit(socket, &scratch, remote),
            Protocol::Tcp => self.transport.tcp_transmit(socket, &scratch, false),
        };

        match sent {
            Ok(()) => {
                self.connections[con_id.0].tx_remain =
                    self.connections[con_id.0].tx_remain.saturating_sub(copied);
                self.connections[con_id.0].tx_available = 0;
            }
            Err(_) => {
                self.end_tx_session(con_id, false);
                return;
            }
        }

        if self.connections[con_id.0].tx_remain == 0 {
            self.end_tx_session(con_id, true);
        }
    }

    fn lookup_pdu_route(&mut self, api: Api, pdu_id: PduId) -> Result<crate::ids::PduRouteId, SoAdError> {
        route::get_pdu_route(&self.config, pdu_id).map_err(|err| {
            self.det.report(api, DevError::InvalidPduId);
            err
        })
    }

    /// Probe (`buf.is_none()`) or perform (`buf.is_some()`) one pull
    /// from the armed session's upper source (§9 "probe-then-copy",
    /// applied symmetrically on the tx side).
    fn pull_tx(&mut self, con_id: SoConId, buf: Option<&mut [u8]>) -> (BufReq, u32) {
        let route_id = self.connections[con_id.0]
            .tx_route
            .expect("pull_tx called without an armed session");
        let route = &self.config.pdu_routes[route_id.0];
        let source = route.source.clone();
        let pdu_id = route.pdu_id;
        source.copy_tx_data(pdu_id, buf)
    }

    /// End the session bound to `con_id`, if any, and deliver exactly
    /// one `tx_confirmation` (§3 invariant, §8 "a session always
    /// terminates with exactly one `tx_confirmation`").
    fn end_tx_session(&mut self, con_id: SoConId, ok: bool) {
        if let Some(route_id) = self.connections[con_id.0].tx_route.take() {
            self.connections[con_id.0].tx_remain = 0;
            self.connections[con_id.0].tx_available = 0;
            let route = &self.config.pdu_routes[route_id.0];
            let source = route.source.clone();
            let pdu_id = route.pdu_id;
            source.tx_confirmation(pdu_id, ok);
        }
    }

    /// Find the connection whose armed session lives on `socket`,
    /// whether `socket` is its own or a shared group socket (UDP
    /// members never hold a private socket at all).
    fn find_active_tx_connection(&self, socket: SocketId) -> Option<SoConId> {
        if let Some(con_id) = table::find_connection_by_socket(&self.connections, socket) {
            return Some(con_id);
        }
        let group_id = table::find_group_by_socket(&self.groups, socket)?;
        (0..self.config.connections.len())
            .find(|&idx| {
                self.config.connections[idx].group == group_id
                    && self.connections[idx].tx_route.is_some()
            })
            .map(SoConId)
    }
}
