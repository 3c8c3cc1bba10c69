//! Drift detection between cached and provider workspace status.

use crate::provisioning::domain::RemoteWorkspaceState;
use crate::workspace::domain::WorkspaceStatus;

/// Returns the status the local record should move to, if any.
///
/// A missing or terminated remote workspace always maps to `terminated`.
/// Other remote statuses are only adopted when they are a forward move from
/// `local`; backward and unknown statuses are ignored. A terminated local
/// record never drifts.
#[must_use]
pub const fn drift_target(
    local: WorkspaceStatus,
    remote: &RemoteWorkspaceState,
) -> Option<WorkspaceStatus> {
    if local.is_terminal() {
        return None;
    }
    if remote.is_gone() {
        return Some(WorkspaceStatus::Terminated);
    }
    let RemoteWorkspaceState::Present(remote_status) = remote else {
        return None;
    };
    match remote_status.local_equivalent() {
        Some(target) if local.can_transition_to(target) => Some(target),
        _ => None,
    }
}
