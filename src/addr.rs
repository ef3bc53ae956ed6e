//! Address utilities (§4.1).
//!
//! `SockAddr` is a tagged union over the address families this crate
//! supports, plus the explicit `Unspecified` family used by groups that
//! have not been bound to any concrete address. Wildcards are not a
//! separate case: an `Inet`/`Inet6` address with a zero address and/or a
//! zero port *is* the wildcard, exactly as `0.0.0.0` and "bind to port 0"
//! already mean in the socket APIs this crate's transport collaborator
//! wraps.

use core::fmt;

/// A family-tagged socket address: the local or remote endpoint of a
/// connection, before or after wildcard resolution.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum SockAddr {
    /// No family has been bound yet (a freshly configured group's remote,
    /// before its first successful open).
    Unspecified,
    /// IPv4 endpoint. `addr == 0` is address-any; `port == 0` is port-any.
    Inet { addr: u32, port: u16 },
    /// IPv6 endpoint. `addr == 0` is address-any; `port == 0` is port-any.
    Inet6 { addr: u128, port: u16 },
}

impl Default for SockAddr {
    fn default() -> Self {
        SockAddr::Unspecified
    }
}

impl fmt::Display for SockAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SockAddr::Unspecified => write!(f, "*"),
            SockAddr::Inet { addr, port } => write!(
                f,
                "{}.{}.{}.{}:{}",
                (addr >> 24) & 0xff,
                (addr >> 16) & 0xff,
                (addr >> 8) & 0xff,
                addr & 0xff,
                port
            ),
            SockAddr::Inet6 { addr, port } => write!(f, "[{:032x}]:{}", addr, port),
        }
    }
}

impl SockAddr {
    /// The well-known "any interface, any port" wildcard for a family.
    pub const fn any_v4() -> Self {
        SockAddr::Inet { addr: 0, port: 0 }
    }

    /// The well-known "any interface, any port" wildcard for a family.
    pub const fn any_v6() -> Self {
        SockAddr::Inet6 { addr: 0, port: 0 }
    }

    /// True if this address carries a known address family.
    ///
    /// `SoAd_SoCon_CheckOpen` in the reference implementation gates solely
    /// on the *remote*'s family being known, not on whether any field of it
    /// is a wildcard — preserved here as `has_family`.
    pub fn has_family(self) -> bool {
        !matches!(self, SockAddr::Unspecified)
    }

    /// True if either the address or the port component is a wildcard
    /// sentinel (§4.1 `is_wildcard`). `Unspecified` is never wildcard: it
    /// carries no family to match against in the first place.
    pub fn is_wildcard(self) -> bool {
        match self {
            SockAddr::Unspecified => false,
            SockAddr::Inet { addr, port } => addr == 0 || port == 0,
            SockAddr::Inet6 { addr, port } => addr == 0 || port == 0,
        }
    }

    /// Overwrite `self` with `src`, field for field (§4.1 `copy`).
    ///
    /// `SockAddr` is `Copy`, so this is a named wrapper around assignment;
    /// it exists because the state machine calls it as a distinct step
    /// (saving the previous value first) rather than relying on an
    /// anonymous move.
    pub fn copy_from(&mut self, src: SockAddr) {
        *self = src;
    }

    /// Match a (possibly wildcard) configured `mask` address against a
    /// concrete `probe` address observed on the wire (§4.1
    /// `wildcard_match`).
    ///
    /// Families must agree. A wildcard field in `mask` matches any value
    /// in the same field of `probe`; a non-wildcard field must match
    /// exactly. `Unspecified` never matches anything, including another
    /// `Unspecified` — there is no family to compare.
    pub fn wildcard_match(mask: SockAddr, probe: SockAddr) -> bool {
        match (mask, probe) {
            (
                SockAddr::Inet {
                    addr: maddr,
                    port: mport,
                },
                SockAddr::Inet {
                    addr: paddr,
                    port: pport,
                },
            ) => (maddr == 0 || maddr == paddr) && (mport == 0 || mport == pport),
            (
                SockAddr::Inet6 {
                    addr: maddr,
                    port: mport,
                },
                SockAddr::Inet6 {
                    addr: paddr,
                    port: pport,
                },
            ) => (maddr == 0 || maddr == paddr) && (mport == 0 || mport == pport),
            _ => false,
        }
    }

    /// The port component, if this address has a known family.
    pub fn port(self) -> Option<u16> {
        match self {
            SockAddr::Unspecified => None,
            SockAddr::Inet { port, .. } | SockAddr::Inet6 { port, .. } => Some(port),
        }
    }
}
