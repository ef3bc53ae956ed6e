//! The development-error reporter (§6, §7).
//!
//! Development errors are distinct from operational failures: they flag a
//! caller misusing the API (calling before `init`, an out-of-range id, a
//! null/zero-length buffer where one is required) rather than a runtime
//! condition like a lost connection. The offending API still returns a
//! failure sentinel and performs no state change, but the *cause* of the
//! failure is additionally reported through this out-of-band channel, the
//! way the reference implementation's `Det_ReportError` works.

use core::fmt;

/// One of the four development-error kinds named in §6/§7.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DevError {
    /// The module has not been initialized.
    NotInit,
    /// An argument failed a sanity check.
    InvalidArgument,
    /// A socket id did not resolve to a known connection or group.
    InvalidSocketId,
    /// A PDU id did not resolve to a known route.
    InvalidPduId,
}

impl fmt::Display for DevError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DevError::NotInit => "module not initialized",
            DevError::InvalidArgument => "invalid argument",
            DevError::InvalidSocketId => "invalid socket id",
            DevError::InvalidPduId => "invalid pdu id",
        };
        f.write_str(s)
    }
}

/// The public operation that raised a development error, for logging and
/// test assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Api {
    Init,
    IfTransmit,
    TpTransmit,
    RxIndication,
    TcpIpEvent,
    TcpAccepted,
    TcpConnected,
    CopyTxData,
    MainFunction,
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Api::Init => "init",
            Api::IfTransmit => "if_transmit",
            Api::TpTransmit => "tp_transmit",
            Api::RxIndication => "rx_indication",
            Api::TcpIpEvent => "tcp_ip_event",
            Api::TcpAccepted => "tcp_accepted",
            Api::TcpConnected => "tcp_connected",
            Api::CopyTxData => "copy_tx_data",
            Api::MainFunction => "main_function",
        };
        f.write_str(s)
    }
}

/// The development-error reporting collaborator (§6).
pub trait DevErrorReporter {
    fn report(&mut self, api: Api, error: DevError);
}

/// Default reporter: logs through the `log` facade at `warn` level.
///
/// Development errors indicate a misbehaving caller, which is worth
/// surfacing in production logs even though it is not itself fatal to
/// the module's own state.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingDevErrorReporter;

impl DevErrorReporter for LoggingDevErrorReporter {
    fn report(&mut self, api: Api, error: DevError) {
        log::warn!("development error in {}: {}", api, error);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Records every report for assertions, mirroring the CUnit suite's
    /// `Det_ReportError` fake.
    #[derive(Default)]
    pub struct RecordingDevErrorReporter {
        pub reports: Vec<(Api, DevError)>,
    }

    impl DevErrorReporter for RecordingDevErrorReporter {
        fn report(&mut self, api: Api, error: DevError) {
            self.reports.push((api, error));
        }
    }
}
