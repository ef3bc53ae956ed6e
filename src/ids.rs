//! Small newtype identifiers shared across the crate.
//!
//! Every table in this crate is a flat `Vec` indexed by one of these types
//! rather than addressed by pointer or by name, matching the arena+index
//! style used throughout the configuration and status tables.

use core::fmt;

macro_rules! index_id {
    ($(#[$outer:meta])* $name:ident) => {
        $(#[$outer])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl From<usize> for $name {
            fn from(n: usize) -> Self {
                $name(n)
            }
        }

        impl From<$name> for usize {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_id!(
    /// Index into the connection group table (`SoGrpConfig`/`SoGrpStatus`).
    SoGrpId
);

index_id!(
    /// Index into the connection table (`SoConConfig`/`SoConStatus`).
    SoConId
);

index_id!(
    /// Index into the socket (rx) route table.
    SocketRouteId
);

index_id!(
    /// Index into the PDU (tx) route table. The table is sorted by
    /// `PduId`, so this index is stable but not itself meaningful outside
    /// the table it was looked up in.
    PduRouteId
);

/// A transport-stack socket handle, opaque to this crate beyond equality.
///
/// `None` in status fields means "no socket currently held" — the idiomatic
/// replacement for the sentinel invalid-id pattern the reference
/// implementation uses.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SocketId(pub u32);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sock#{}", self.0)
    }
}

/// The upper-layer protocol data unit identifier carried on a route.
///
/// PDU routes are sorted by this value (§4.2); it is also the key used to
/// resolve the upper-layer capability record a connection hands data to.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PduId(pub u32);

impl From<u32> for PduId {
    fn from(n: u32) -> Self {
        PduId(n)
    }
}

impl fmt::Display for PduId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "pdu#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_usize() {
        let id: SoConId = 3usize.into();
        assert_eq!(usize::from(id), 3);
    }

    #[test]
    fn pdu_ids_order_numerically() {
        assert!(PduId(1) < PduId(2));
    }
}
