//! Upper-layer capability records (§6 "Upper sinks").
//!
//! A route does not store a function pointer pair the way the reference
//! implementation's PduR glue does; it stores a handle to a small trait
//! object. Since this crate runs single-threaded and cooperatively (§5 —
//! no internal threads, the host serializes every call in), the handle is
//! a plain `Rc<dyn Trait>` rather than an `Arc`: nothing here ever needs
//! `Send`/`Sync`.

use std::rc::Rc;

use crate::ids::PduId;

/// The result an upper-layer collaborator hands back from a buffer
/// request, matching the "ok / not-ok / busy / overflow" vocabulary used
/// throughout §4.5/§4.6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufReq {
    /// The request succeeded; the accompanying length is meaningful.
    Ok,
    /// The upper layer rejected the request outright.
    NotOk,
    /// The upper layer cannot accept the data right now but may be able to
    /// later (transient backpressure).
    Busy,
    /// The advertised/available length does not fit the caller's buffer.
    Overflow,
}

impl BufReq {
    /// True for the only status that lets the caller proceed.
    pub fn is_ok(self) -> bool {
        matches!(self, BufReq::Ok)
    }
}

/// The receive-side capability record a socket route points at (§4.5).
///
/// Calls arrive in the "probe, then copy" shape: `copy_rx_data` is called
/// first with `data: None` to ask how much the sink is prepared to accept
/// without actually transferring anything, then again with `data:
/// Some(buf)` to perform the transfer.
pub trait RxSink {
    /// A new reception is starting for `pdu` with `len` bytes available.
    /// Returns the sink's status and how much of `len` it is willing to
    /// accept up front.
    fn start_of_reception(&self, pdu: PduId, len: u32) -> (BufReq, u32);

    /// Probe (`data.is_none()`) or perform (`data.is_some()`) a copy of
    /// the received bytes into the sink. Returns the sink's status and,
    /// on a probe, the capacity it currently has available.
    fn copy_rx_data(&self, pdu: PduId, data: Option<&[u8]>) -> (BufReq, u32);

    /// The reception for `pdu` has ended; `ok` is false if any step of
    /// the transfer failed.
    fn rx_indication(&self, pdu: PduId, ok: bool);
}

/// The transmit-side capability record a PDU route points at (§4.6).
///
/// `copy_tx_data` follows the same probe/perform shape as `copy_rx_data`:
/// called with `buf: None` to ask how many bytes are ready to send, then
/// with `buf: Some(dst)` to have the source fill the transport's buffer.
pub trait TxSource {
    /// Probe (`buf.is_none()`) or perform (`buf.is_some()`) a copy of the
    /// next chunk of transmit data out of the source. Returns the
    /// source's status and, on a probe, the number of bytes ready.
    fn copy_tx_data(&self, pdu: PduId, buf: Option<&mut [u8]>) -> (BufReq, u32);

    /// Confirmation that a previously copied transmission either
    /// completed (`ok`) or failed. A genuine no-op in the reference
    /// implementation for most configurations (§6); kept here because the
    /// Downstream API names it explicitly and `TcpImmediateTpTxConfirmation`
    /// variants are entitled to call it.
    fn tx_confirmation(&self, pdu: PduId, ok: bool);
}

pub type RxSinkHandle = Rc<dyn RxSink>;
pub type TxSourceHandle = Rc<dyn TxSource>;
