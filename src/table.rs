//! Connection table lookups (§4.3).

use crate::addr::SockAddr;
use crate::config::SoAdConfig;
use crate::ids::{SoConId, SoGrpId, SocketId};
use crate::status::{SoConState, SoConStatus, SoGrpStatus};

/// Linear scan over connections by transport socket id (§4.3).
pub fn find_connection_by_socket(statuses: &[SoConStatus], socket: SocketId) -> Option<SoConId> {
    statuses
        .iter()
        .position(|status| status.socket == Some(socket))
        .map(SoConId)
}

/// Linear scan over groups by transport socket id (§4.3).
pub fn find_group_by_socket(statuses: &[SoGrpStatus], socket: SocketId) -> Option<SoGrpId> {
    statuses
        .iter()
        .position(|status| status.socket == Some(socket))
        .map(SoGrpId)
}

/// Free-slot match (§4.3, §9): within `group`, find a connection whose
/// transport socket id is still invalid, whose state is not `OFFLINE`
/// (i.e. already armed by a prior tick), and whose configured remote
/// matches `probe` under wildcard semantics.
///
/// Iteration is in ascending connection-id order so the lowest index
/// always wins ties — required for testable, deterministic behavior
/// (§9 "implementations must preserve stable iteration order").
pub fn free_slot_match(
    config: &SoAdConfig,
    statuses: &[SoConStatus],
    group: SoGrpId,
    probe: SockAddr,
) -> Option<SoConId> {
    config
        .connections
        .iter()
        .enumerate()
        .find(|(idx, con_config)| {
            con_config.group == group
                && statuses[*idx].socket.is_none()
                && statuses[*idx].state != SoConState::Offline
                && SockAddr::wildcard_match(con_config.remote, probe)
        })
        .map(|(idx, _)| SoConId(idx))
}
