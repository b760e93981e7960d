//! The daily regeneration / carry-over pass for recurring tasks.
//!
//! [`ChoreBoard::daily_rollover`] is the batch pass the scheduler fires once
//! per local calendar day (and once eagerly at engine start). It only ever
//! looks at tasks with a non-empty `repeat_days`; everything else is left
//! alone. Re-running the pass for the same date is a no-op per task: each
//! task records the date of the last pass that processed it, so the day
//! bucket is derived from task id + calendar date, not from invocation
//! order.

use crate::board::ChoreBoard;
use crate::model::{now_utc, ScheduleMode, Task, TaskStatus};
use chrono::NaiveDate;
use tracing::debug;

/// Outcome counters for one rollover pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RolloverReport {
    /// Tasks reset to a fresh instance for today.
    pub reset: usize,
    /// Persistent tasks carried over (marked overdue) instead of reset.
    pub carried: usize,
    /// Tasks left pending because a completion still awaits approval.
    pub pending: usize,
    /// Tasks newly flagged overdue because `due` passed.
    pub overdue: usize,
}

/// Pick the next assignee in a rotation pool: the entry after the current
/// assignee in stable pool order, wrapping, or the first entry when the
/// current assignee is not in the pool.
fn next_in_rotation(pool: &[String], current: Option<&str>) -> Option<String> {
    if pool.is_empty() {
        return None;
    }
    let next = match current.and_then(|c| pool.iter().position(|p| p == c)) {
        Some(i) => (i + 1) % pool.len(),
        None => 0,
    };
    Some(pool[next].clone())
}

/// Reset a recurring task to a fresh instance for a new cycle.
fn reset_instance(task: &mut Task) {
    task.completed_ts = None;
    task.approved = false;
    task.bonus_completed_ts = None;
    task.bonus_approved = false;
    task.carried_over = false;

    if task.fastest_wins {
        // The pool competes anew each cycle.
        task.assigned_to = None;
        task.status = TaskStatus::Unassigned;
        return;
    }

    let assignee = match task.schedule_mode {
        ScheduleMode::Rotating => {
            next_in_rotation(&task.repeat_child_ids, task.assigned_to.as_deref())
                .or_else(|| task.repeat_child_id.clone())
        }
        ScheduleMode::Fixed => task
            .repeat_child_id
            .clone()
            .or_else(|| task.assigned_to.clone()),
    };

    match assignee {
        Some(child_id) => {
            task.assigned_to = Some(child_id);
            task.status = TaskStatus::Assigned;
        }
        None => {
            task.assigned_to = None;
            task.status = TaskStatus::Unassigned;
        }
    }
}

impl ChoreBoard {
    /// Run the regeneration pass for `today`.
    ///
    /// Per recurring task, in order: skip if already processed for `today`;
    /// if today matches the repeat markers, either carry the instance over
    /// (persistent and never approved), hold it (still awaiting approval),
    /// or reset it for the new cycle. Independently of the day match, flag
    /// tasks overdue once `due` has passed when `mark_overdue` is set.
    ///
    /// Each task is processed independently; nothing here aborts the pass
    /// for the remaining tasks.
    pub fn daily_rollover(&mut self, today: NaiveDate) -> RolloverReport {
        let now = now_utc();
        let mut report = RolloverReport::default();

        for task in &mut self.tasks {
            if task.repeat_days.is_empty() {
                continue;
            }

            if task.repeats_on(today) && task.last_rollover != Some(today) {
                if task.persist_until_completed && task.status != TaskStatus::Approved {
                    // Carry the open instance instead of duplicating it.
                    task.carried_over = true;
                    report.carried += 1;
                    debug!(task_id = %task.id, "rollover: carried over");
                } else if task.status == TaskStatus::AwaitingApproval {
                    // A completion is still waiting on the caregiver; never
                    // regenerate over it.
                    report.pending += 1;
                    debug!(task_id = %task.id, "rollover: held for approval");
                } else {
                    reset_instance(task);
                    report.reset += 1;
                    debug!(
                        task_id = %task.id,
                        assigned_to = task.assigned_to.as_deref().unwrap_or("-"),
                        "rollover: reset for new cycle"
                    );
                }
                task.last_rollover = Some(today);
            }

            if task.mark_overdue
                && !task.carried_over
                && task.status != TaskStatus::Approved
                && task.due.is_some_and(|due| due < now)
            {
                task.carried_over = true;
                report.overdue += 1;
                debug!(task_id = %task.id, "rollover: marked overdue");
            }
        }

        report
    }
}
