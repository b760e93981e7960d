//! The task lifecycle state machine.
//!
//! Transitions run `unassigned → assigned → awaiting_approval → approved`,
//! with `approved` terminal for the instance. The bonus sub-flow
//! (`bonus_completed_ts` + `bonus_approved`) rides orthogonally on the main
//! status, as does the `carried_over` overdue marker.
//!
//! Payouts happen exactly once per instance: `approve_task` and
//! `approve_bonus` are idempotent, guarded by the `approved`/`bonus_approved`
//! flags rather than the state alone, so a duplicate caregiver tap or a
//! re-delivered notification action never pays twice.

use crate::board::ChoreBoard;
use crate::error::{ChoreError, Result};
use crate::model::{now_utc, Task, TaskStatus};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Whether a completion stamp qualifies for the early-completion bonus:
/// done on or before `due`, within `early_bonus_days` days of it.
fn earned_early_bonus(task: &Task) -> bool {
    if !task.early_bonus_enabled || task.early_bonus_points <= 0 {
        return false;
    }
    let (Some(due), Some(done)) = (task.due, task.completed_ts) else {
        return false;
    };
    if done > due {
        return false;
    }
    due.signed_duration_since(done) <= Duration::days(i64::from(task.early_bonus_days))
}

impl ChoreBoard {
    /// Assign (or reassign) a task to a child.
    ///
    /// An `unassigned` task becomes `assigned`; any other status is kept —
    /// reassignment of an in-flight task is allowed.
    pub fn assign_task(&mut self, task_id: &str, child_id: &str) -> Result<()> {
        self.child(child_id)?;
        let task = self.task_mut(task_id)?;
        task.assigned_to = Some(child_id.to_owned());
        if task.status == TaskStatus::Unassigned {
            task.status = TaskStatus::Assigned;
        }
        Ok(())
    }

    /// Drive a task to `assigned`, `awaiting_approval`, or `approved`.
    ///
    /// `as_child`, when given, atomically assigns the acting child before the
    /// transition — this is how a pool child completes a shared task in one
    /// step. Moving to `awaiting_approval` stamps `completed_ts` (supplied or
    /// now). Moving directly to `approved` requires `skip_approval` and pays
    /// out immediately. Moving back to `assigned` clears the completion
    /// stamp (the caregiver "reassign" action).
    ///
    /// For `fastest_wins` tasks the move to `awaiting_approval` is a
    /// compare-and-set on the status: once one child has completed the
    /// instance, attempts by other children fail with `AlreadyClaimed`.
    pub fn set_task_status(
        &mut self,
        task_id: &str,
        status: TaskStatus,
        completed_ts: Option<DateTime<Utc>>,
        as_child: Option<&str>,
    ) -> Result<()> {
        if let Some(child_id) = as_child {
            self.child(child_id)?;
        }
        self.task(task_id)?;

        match status {
            TaskStatus::Assigned => self.reopen_task(task_id, as_child),
            TaskStatus::AwaitingApproval => self.complete_task(task_id, completed_ts, as_child),
            TaskStatus::Approved => self.quick_approve_task(task_id, completed_ts, as_child),
            TaskStatus::Unassigned => Err(ChoreError::Validation(
                "status must be one of assigned, awaiting_approval, approved".to_owned(),
            )),
        }
    }

    /// Approve a completed task and pay out.
    ///
    /// Valid only from `awaiting_approval`; calling it again on an
    /// already-approved task is a no-op. Credits `points` plus the
    /// early-completion bonus when earned. An assignee that no longer exists
    /// is paid nothing, but the transition still happens.
    pub fn approve_task(&mut self, task_id: &str) -> Result<()> {
        let task = self.task_mut(task_id)?;
        if task.approved {
            return Ok(());
        }
        if task.status != TaskStatus::AwaitingApproval {
            return Err(ChoreError::InvalidTransition(format!(
                "cannot approve task in status {}",
                task.status.as_str()
            )));
        }

        task.status = TaskStatus::Approved;
        task.approved = true;
        let mut payout = task.points;
        if earned_early_bonus(task) {
            payout += task.early_bonus_points;
        }
        let assignee = task.assigned_to.clone();

        self.credit_if_known(assignee.as_deref(), payout);
        debug!(task_id, payout, "task approved");
        Ok(())
    }

    /// Record the bonus sub-task as done. Requires `bonus_enabled`; the main
    /// status is untouched and repeat calls overwrite the stamp.
    pub fn complete_bonus(
        &mut self,
        task_id: &str,
        completed_ts: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let task = self.task_mut(task_id)?;
        if !task.bonus_enabled {
            return Err(ChoreError::Validation(format!(
                "task {task_id} has no bonus"
            )));
        }
        task.bonus_completed_ts = Some(completed_ts.unwrap_or_else(now_utc));
        Ok(())
    }

    /// Approve the bonus sub-task and credit `bonus_points`.
    ///
    /// Valid only once the bonus is marked done; idempotent like
    /// [`Self::approve_task`].
    pub fn approve_bonus(&mut self, task_id: &str) -> Result<()> {
        let task = self.task_mut(task_id)?;
        if task.bonus_approved {
            return Ok(());
        }
        if task.bonus_completed_ts.is_none() {
            return Err(ChoreError::InvalidTransition(format!(
                "bonus for task {task_id} is not completed"
            )));
        }

        task.bonus_approved = true;
        let assignee = task.assigned_to.clone();
        let points = task.bonus_points;
        self.credit_if_known(assignee.as_deref(), points);
        debug!(task_id, points, "bonus approved");
        Ok(())
    }

    /// Approve the task together with its bonus, as one unit.
    ///
    /// Backs the "approve all" notification action: the base task is
    /// approved, then — when a bonus rides on the task — the bonus is
    /// stamped done if it is not and approved if it is not. Each payout
    /// still happens at most once.
    pub fn approve_with_bonus(&mut self, task_id: &str) -> Result<()> {
        self.approve_task(task_id)?;
        let task = self.task(task_id)?;
        if !task.bonus_enabled {
            return Ok(());
        }
        if task.bonus_completed_ts.is_none() {
            self.complete_bonus(task_id, None)?;
        }
        self.approve_bonus(task_id)
    }

    // -- transition arms -----------------------------------------------------

    fn reopen_task(&mut self, task_id: &str, as_child: Option<&str>) -> Result<()> {
        let task = self.task_mut(task_id)?;
        if task.status == TaskStatus::Approved {
            return Err(ChoreError::InvalidTransition(
                "approved is terminal; rollover resets recurring tasks".to_owned(),
            ));
        }
        if let Some(child_id) = as_child {
            task.assigned_to = Some(child_id.to_owned());
        }
        task.status = TaskStatus::Assigned;
        task.completed_ts = None;
        Ok(())
    }

    fn complete_task(
        &mut self,
        task_id: &str,
        completed_ts: Option<DateTime<Utc>>,
        as_child: Option<&str>,
    ) -> Result<()> {
        let task = self.task_mut(task_id)?;

        // Fastest-wins CAS: the transition succeeds only from a
        // not-yet-completed status. Within the mutation gate this check and
        // the assignment below are one atomic unit, so exactly one of two
        // concurrent completions wins.
        let already_done = matches!(
            task.status,
            TaskStatus::AwaitingApproval | TaskStatus::Approved
        );
        if already_done {
            let same_child = match (as_child, task.assigned_to.as_deref()) {
                (Some(acting), Some(winner)) => acting == winner,
                // No acting child supplied: treat as a caregiver restamp.
                (None, _) => true,
                (Some(_), None) => false,
            };
            if task.fastest_wins && !same_child {
                let winner = task
                    .assigned_to
                    .clone()
                    .unwrap_or_else(|| "another child".to_owned());
                return Err(ChoreError::AlreadyClaimed(winner));
            }
            if task.status == TaskStatus::Approved {
                return Err(ChoreError::InvalidTransition(
                    "task is already approved".to_owned(),
                ));
            }
        }

        if let Some(child_id) = as_child {
            task.assigned_to = Some(child_id.to_owned());
        }
        task.status = TaskStatus::AwaitingApproval;
        task.completed_ts = Some(completed_ts.unwrap_or_else(now_utc));
        Ok(())
    }

    fn quick_approve_task(
        &mut self,
        task_id: &str,
        completed_ts: Option<DateTime<Utc>>,
        as_child: Option<&str>,
    ) -> Result<()> {
        let task = self.task_mut(task_id)?;
        if !task.skip_approval {
            return Err(ChoreError::InvalidTransition(
                "task requires approval; complete it to awaiting_approval instead".to_owned(),
            ));
        }
        if task.fastest_wins
            && matches!(
                task.status,
                TaskStatus::AwaitingApproval | TaskStatus::Approved
            )
        {
            let same_child = match (as_child, task.assigned_to.as_deref()) {
                (Some(acting), Some(winner)) => acting == winner,
                (None, _) => true,
                (Some(_), None) => false,
            };
            if !same_child {
                let winner = task
                    .assigned_to
                    .clone()
                    .unwrap_or_else(|| "another child".to_owned());
                return Err(ChoreError::AlreadyClaimed(winner));
            }
        }

        if let Some(child_id) = as_child {
            task.assigned_to = Some(child_id.to_owned());
        }
        if task.completed_ts.is_none() || completed_ts.is_some() {
            task.completed_ts = Some(completed_ts.unwrap_or_else(now_utc));
        }
        task.status = TaskStatus::Approved;

        // Pay at most once, even if the quick path is hit twice.
        if !task.approved {
            task.approved = true;
            let mut payout = task.points;
            if earned_early_bonus(task) {
                payout += task.early_bonus_points;
            }
            let assignee = task.assigned_to.clone();
            self.credit_if_known(assignee.as_deref(), payout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::model::TaskSpec;
    use chrono::TimeZone;

    fn board_with_task(spec: TaskSpec) -> (ChoreBoard, String, String) {
        let mut board = ChoreBoard::default();
        let child = board.add_child("Alma").unwrap().id.clone();
        let spec = TaskSpec {
            assigned_to: Some(child.clone()),
            ..spec
        };
        let task = board.add_task(spec).unwrap().id.clone();
        (board, task, child)
    }

    #[test]
    fn complete_then_approve_pays_once() {
        let (mut board, task, child) = board_with_task(TaskSpec {
            title: "Dishes".into(),
            points: 10,
            ..TaskSpec::default()
        });

        board
            .set_task_status(&task, TaskStatus::AwaitingApproval, None, None)
            .unwrap();
        assert_eq!(board.task(&task).unwrap().status, TaskStatus::AwaitingApproval);
        assert!(board.task(&task).unwrap().completed_ts.is_some());

        board.approve_task(&task).unwrap();
        assert_eq!(board.child(&child).unwrap().points, 10);
        assert_eq!(board.task(&task).unwrap().status, TaskStatus::Approved);

        // Second approval is a no-op, not an error, and never double-pays.
        board.approve_task(&task).unwrap();
        assert_eq!(board.child(&child).unwrap().points, 10);
    }

    #[test]
    fn approve_requires_awaiting_approval() {
        let (mut board, task, _) = board_with_task(TaskSpec {
            title: "Dishes".into(),
            points: 10,
            ..TaskSpec::default()
        });
        let err = board.approve_task(&task).unwrap_err();
        assert!(matches!(err, ChoreError::InvalidTransition(_)));
    }

    #[test]
    fn quick_complete_requires_skip_approval() {
        let (mut board, task, _) = board_with_task(TaskSpec {
            title: "Dishes".into(),
            points: 10,
            ..TaskSpec::default()
        });
        let err = board
            .set_task_status(&task, TaskStatus::Approved, None, None)
            .unwrap_err();
        assert!(matches!(err, ChoreError::InvalidTransition(_)));
    }

    #[test]
    fn quick_complete_pays_immediately_and_once() {
        let (mut board, task, child) = board_with_task(TaskSpec {
            title: "Dishes".into(),
            points: 10,
            skip_approval: true,
            ..TaskSpec::default()
        });

        board
            .set_task_status(&task, TaskStatus::Approved, None, None)
            .unwrap();
        assert_eq!(board.child(&child).unwrap().points, 10);
        assert_eq!(board.task(&task).unwrap().status, TaskStatus::Approved);

        board
            .set_task_status(&task, TaskStatus::Approved, None, None)
            .unwrap();
        assert_eq!(board.child(&child).unwrap().points, 10);
    }

    #[test]
    fn reassign_clears_completion_stamp() {
        let (mut board, task, _) = board_with_task(TaskSpec {
            title: "Dishes".into(),
            ..TaskSpec::default()
        });
        board
            .set_task_status(&task, TaskStatus::AwaitingApproval, None, None)
            .unwrap();
        board
            .set_task_status(&task, TaskStatus::Assigned, None, None)
            .unwrap();
        let t = board.task(&task).unwrap();
        assert_eq!(t.status, TaskStatus::Assigned);
        assert!(t.completed_ts.is_none());
    }

    #[test]
    fn reopening_an_approved_task_is_invalid() {
        let (mut board, task, _) = board_with_task(TaskSpec {
            title: "Dishes".into(),
            ..TaskSpec::default()
        });
        board
            .set_task_status(&task, TaskStatus::AwaitingApproval, None, None)
            .unwrap();
        board.approve_task(&task).unwrap();
        let err = board
            .set_task_status(&task, TaskStatus::Assigned, None, None)
            .unwrap_err();
        assert!(matches!(err, ChoreError::InvalidTransition(_)));
    }

    #[test]
    fn unassigned_is_not_a_settable_status() {
        let (mut board, task, _) = board_with_task(TaskSpec {
            title: "Dishes".into(),
            ..TaskSpec::default()
        });
        let err = board
            .set_task_status(&task, TaskStatus::Unassigned, None, None)
            .unwrap_err();
        assert!(matches!(err, ChoreError::Validation(_)));
    }

    #[test]
    fn fastest_wins_rejects_second_child() {
        let mut board = ChoreBoard::default();
        let a = board.add_child("Alma").unwrap().id.clone();
        let b = board.add_child("Bo").unwrap().id.clone();
        let task = board
            .add_task(TaskSpec {
                title: "Mail".into(),
                points: 5,
                fastest_wins: true,
                repeat_child_ids: vec![a.clone(), b.clone()],
                ..TaskSpec::default()
            })
            .unwrap()
            .id
            .clone();

        board
            .set_task_status(&task, TaskStatus::AwaitingApproval, None, Some(&a))
            .unwrap();
        let err = board
            .set_task_status(&task, TaskStatus::AwaitingApproval, None, Some(&b))
            .unwrap_err();
        assert!(matches!(err, ChoreError::AlreadyClaimed(winner) if winner == a));
        assert_eq!(board.task(&task).unwrap().assigned_to.as_deref(), Some(a.as_str()));
    }

    #[test]
    fn fastest_wins_same_child_restamp_is_allowed() {
        let mut board = ChoreBoard::default();
        let a = board.add_child("Alma").unwrap().id.clone();
        let task = board
            .add_task(TaskSpec {
                title: "Mail".into(),
                fastest_wins: true,
                repeat_child_ids: vec![a.clone()],
                ..TaskSpec::default()
            })
            .unwrap()
            .id
            .clone();

        board
            .set_task_status(&task, TaskStatus::AwaitingApproval, None, Some(&a))
            .unwrap();
        board
            .set_task_status(&task, TaskStatus::AwaitingApproval, None, Some(&a))
            .unwrap();
        assert_eq!(board.task(&task).unwrap().status, TaskStatus::AwaitingApproval);
    }

    #[test]
    fn approving_with_dead_assignee_pays_no_one_but_transitions() {
        let (mut board, task, child) = board_with_task(TaskSpec {
            title: "Dishes".into(),
            points: 10,
            ..TaskSpec::default()
        });
        board
            .set_task_status(&task, TaskStatus::AwaitingApproval, None, None)
            .unwrap();
        board.remove_child(&child).unwrap();

        board.approve_task(&task).unwrap();
        assert_eq!(board.task(&task).unwrap().status, TaskStatus::Approved);
    }

    #[test]
    fn early_bonus_credited_inside_window() {
        let due = Utc.with_ymd_and_hms(2024, 6, 10, 18, 0, 0).unwrap();
        let done = Utc.with_ymd_and_hms(2024, 6, 9, 12, 0, 0).unwrap();
        let (mut board, task, child) = board_with_task(TaskSpec {
            title: "Homework".into(),
            points: 10,
            due: Some(due),
            early_bonus_enabled: true,
            early_bonus_days: 2,
            early_bonus_points: 5,
            ..TaskSpec::default()
        });

        board
            .set_task_status(&task, TaskStatus::AwaitingApproval, Some(done), None)
            .unwrap();
        board.approve_task(&task).unwrap();
        assert_eq!(board.child(&child).unwrap().points, 15);
    }

    #[test]
    fn early_bonus_skipped_when_late() {
        let due = Utc.with_ymd_and_hms(2024, 6, 10, 18, 0, 0).unwrap();
        let done = Utc.with_ymd_and_hms(2024, 6, 11, 12, 0, 0).unwrap();
        let (mut board, task, child) = board_with_task(TaskSpec {
            title: "Homework".into(),
            points: 10,
            due: Some(due),
            early_bonus_enabled: true,
            early_bonus_days: 2,
            early_bonus_points: 5,
            ..TaskSpec::default()
        });

        board
            .set_task_status(&task, TaskStatus::AwaitingApproval, Some(done), None)
            .unwrap();
        board.approve_task(&task).unwrap();
        assert_eq!(board.child(&child).unwrap().points, 10);
    }

    #[test]
    fn bonus_flow_pays_once() {
        let (mut board, task, child) = board_with_task(TaskSpec {
            title: "Dishes".into(),
            points: 10,
            bonus_enabled: true,
            bonus_title: "Wipe counters".into(),
            bonus_points: 3,
            ..TaskSpec::default()
        });

        // Bonus approval before completion is invalid.
        let err = board.approve_bonus(&task).unwrap_err();
        assert!(matches!(err, ChoreError::InvalidTransition(_)));

        board.complete_bonus(&task, None).unwrap();
        board.approve_bonus(&task).unwrap();
        assert_eq!(board.child(&child).unwrap().points, 3);
        assert!(board.task(&task).unwrap().bonus_approved);

        board.approve_bonus(&task).unwrap();
        assert_eq!(board.child(&child).unwrap().points, 3);
    }

    #[test]
    fn complete_bonus_requires_bonus_enabled() {
        let (mut board, task, _) = board_with_task(TaskSpec {
            title: "Dishes".into(),
            ..TaskSpec::default()
        });
        let err = board.complete_bonus(&task, None).unwrap_err();
        assert!(matches!(err, ChoreError::Validation(_)));
    }

    #[test]
    fn approve_with_bonus_covers_both_payouts() {
        let (mut board, task, child) = board_with_task(TaskSpec {
            title: "Dishes".into(),
            points: 10,
            bonus_enabled: true,
            bonus_points: 3,
            ..TaskSpec::default()
        });

        board
            .set_task_status(&task, TaskStatus::AwaitingApproval, None, None)
            .unwrap();
        board.approve_with_bonus(&task).unwrap();
        assert_eq!(board.child(&child).unwrap().points, 13);

        // Repeating the combined action pays nothing further.
        board.approve_with_bonus(&task).unwrap();
        assert_eq!(board.child(&child).unwrap().points, 13);
    }

    #[test]
    fn assign_task_bumps_unassigned_to_assigned() {
        let mut board = ChoreBoard::default();
        let child = board.add_child("Alma").unwrap().id.clone();
        let task = board
            .add_task(TaskSpec {
                title: "Sweep".into(),
                ..TaskSpec::default()
            })
            .unwrap()
            .id
            .clone();

        board.assign_task(&task, &child).unwrap();
        let t = board.task(&task).unwrap();
        assert_eq!(t.status, TaskStatus::Assigned);
        assert_eq!(t.assigned_to.as_deref(), Some(child.as_str()));

        assert!(matches!(
            board.assign_task(&task, "child-ghost"),
            Err(ChoreError::NotFound(_))
        ));
    }
}
