//! Reclamation policy for idle and finished workspaces.

use crate::task::domain::{Task, TaskId, TaskStatus};
use crate::workspace::domain::Workspace;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Thresholds that decide when a workspace may be reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    /// Minimum time since last activity before a workspace counts as idle.
    pub idle_threshold: TimeDelta,
    /// Skip any workspace that still has a queued or running task.
    pub require_no_active_tasks: bool,
    /// Minimum age of a workspace that never received a task.
    pub orphan_age: TimeDelta,
    /// Delay after a task completes before its workspace is reclaimed.
    pub completion_grace: TimeDelta,
    /// Delay after a task fails or is cancelled before its workspace is
    /// reclaimed.
    pub failure_grace: TimeDelta,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            idle_threshold: TimeDelta::hours(24),
            require_no_active_tasks: true,
            orphan_age: TimeDelta::hours(1),
            completion_grace: TimeDelta::minutes(5),
            failure_grace: TimeDelta::minutes(10),
        }
    }
}

/// Why a workspace was selected for reclamation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupReason {
    /// No activity for longer than the idle threshold.
    IdleTimeout,
    /// The workspace never received a task.
    Orphaned,
    /// Its task completed and the grace period has passed.
    TaskCompleted,
    /// Its task failed or was cancelled and the grace period has passed.
    TaskFailed,
}

impl CleanupReason {
    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IdleTimeout => "idle_timeout",
            Self::Orphaned => "orphaned",
            Self::TaskCompleted => "task_completed",
            Self::TaskFailed => "task_failed",
        }
    }
}

impl fmt::Display for CleanupReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Why a workspace was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    /// A queued or running task still needs the workspace.
    ActiveTask(TaskId),
    /// No reclamation rule matched.
    InUse,
}

/// Verdict of [`CleanupPolicy::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The workspace must be kept.
    Keep(KeepReason),
    /// The workspace may be terminated.
    Reclaim(CleanupReason),
}

/// Returns the most recent evidence of use for a workspace.
#[must_use]
pub fn last_activity(workspace: &Workspace, latest_log: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let used = workspace.last_used_at();
    latest_log.map_or(used, |logged| logged.max(used))
}

impl CleanupPolicy {
    /// Decides whether `workspace` may be reclaimed at `now`.
    ///
    /// `tasks` are the task records resolved for the workspace and
    /// `latest_log` is the timestamp of its newest execution log entry. The
    /// active-task guard is checked first and overrides every other rule.
    #[must_use]
    pub fn evaluate(
        &self,
        workspace: &Workspace,
        tasks: &[Task],
        latest_log: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Eligibility {
        let guarding_task = tasks
            .iter()
            .find(|task| task.status().is_active())
            .filter(|_| self.require_no_active_tasks);
        if let Some(active) = guarding_task {
            return Eligibility::Keep(KeepReason::ActiveTask(active.id()));
        }

        if now - last_activity(workspace, latest_log) > self.idle_threshold {
            return Eligibility::Reclaim(CleanupReason::IdleTimeout);
        }

        if tasks.is_empty()
            && workspace.assigned_tasks().is_empty()
            && now - workspace.created_at() >= self.orphan_age
        {
            return Eligibility::Reclaim(CleanupReason::Orphaned);
        }

        let finished_for = |is_match: fn(TaskStatus) -> bool, grace: TimeDelta| {
            tasks
                .iter()
                .any(|task| is_match(task.status()) && now - task.updated_at() >= grace)
        };
        if finished_for(
            |status| matches!(status, TaskStatus::Completed),
            self.completion_grace,
        ) {
            return Eligibility::Reclaim(CleanupReason::TaskCompleted);
        }
        if finished_for(
            |status| matches!(status, TaskStatus::Failed | TaskStatus::Cancelled),
            self.failure_grace,
        ) {
            return Eligibility::Reclaim(CleanupReason::TaskFailed);
        }

        Eligibility::Keep(KeepReason::InUse)
    }
}
