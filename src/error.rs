//! Crate error type.
//!
//! A `failure::Fail`-deriving enum with one variant per distinguishable
//! cause, rather than a single opaque string. Operational failures (§7)
//! and development-error failure sentinels share this type;
//! `DevErrorReporter` (see `det.rs`) is the out-of-band channel
//! development errors are *also* reported through.

use std::io;

use failure::Fail;

use crate::ids::{PduId, SoConId};

/// Failures returned by the public operations of [`crate::SoAd`].
#[derive(Debug, Fail)]
pub enum SoAdError {
    /// An API was called before `init` (or after `SoAd` was torn down).
    #[fail(display = "SoAd module is not initialized")]
    NotInit,

    /// An argument failed a development-time sanity check (null buffer,
    /// zero length where one is required, and so on).
    #[fail(display = "invalid argument")]
    InvalidArgument,

    /// A transport socket id did not resolve to any group or connection.
    #[fail(display = "unknown socket id")]
    InvalidSocketId,

    /// A PDU id did not resolve to any configured route.
    #[fail(display = "unknown pdu id {}", _0)]
    InvalidPdu(PduId),

    /// The connection exists but is not currently `ONLINE`.
    #[fail(display = "connection {} is not online", _0)]
    NotOnline(SoConId),

    /// No free `RECONNECT` slot in the connection's group matched the
    /// inbound remote address.
    #[fail(display = "no free connection slot available")]
    NoFreeSlot,

    /// The upper-layer sink or source declined the transfer.
    #[fail(display = "upper layer rejected the buffer")]
    BufferRejected,

    /// The transport collaborator returned an I/O failure.
    #[fail(display = "transport error: {}", _0)]
    Transport(#[cause] io::Error),

    /// `SoAdConfig::build` found the PDU route table was not sorted by id.
    #[fail(display = "pdu route table is not sorted by pdu id")]
    UnsortedPduRoutes,
}

impl From<io::Error> for SoAdError {
    fn from(err: io::Error) -> Self {
        SoAdError::Transport(err)
    }
}
