//! Outbound event types for the notification collaborator.
//!
//! The engine emits these on an unbounded channel after a mutation commits.
//! Delivery, formatting, and localization are entirely the receiver's
//! concern; a closed or missing channel never affects the state change
//! (fire-and-forget, best-effort).

use crate::model::{Purchase, Task};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Channel half handed to [`crate::engine::ChoreEngine`] for event dispatch.
pub type EventSender = mpsc::UnboundedSender<ChoreEvent>;

/// An action button the delivery layer should attach to a completion
/// notification. The receiver owns labels and wiring; these are the
/// machine-readable kinds, fed back in via
/// [`crate::engine::ChoreEngine::apply_notify_action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyAction {
    /// Approve the base task.
    Approve,
    /// Approve the base task and its bonus together.
    ApproveAll,
    /// Approve only the base task, leaving the bonus open.
    ApprovePartial,
    /// Send the task back to `assigned`.
    Reassign,
}

/// Bonus line attached to a completion event when the task carries a bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusNote {
    /// The bonus title, possibly empty (receiver falls back to a generic
    /// label).
    pub label: String,
    /// Whether the bonus has been marked done.
    pub done: bool,
}

/// A child finished a task (or its bonus) and a caregiver may want to act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCompletedEvent {
    pub task_id: String,
    pub title: String,
    /// Resolved name of the completing child, when known.
    pub child_name: Option<String>,
    pub points: i64,
    /// Present when the task carries a bonus.
    pub bonus: Option<BonusNote>,
    /// Action buttons to offer. Empty for `skip_approval` tasks.
    pub actions: Vec<NotifyAction>,
}

/// A purchase went through in the shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopPurchaseEvent {
    pub purchase: Purchase,
}

/// Everything the engine reports outward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChoreEvent {
    TaskCompleted(TaskCompletedEvent),
    ShopPurchase(ShopPurchaseEvent),
}

/// Build the completion event for a task.
///
/// Approval-requiring tasks get `approve` + `reassign` buttons, or the
/// all/partial pair when a bonus rides on the task. Quick-complete tasks
/// (`skip_approval`) get none.
pub(crate) fn task_completed_event(task: &Task, child_name: Option<String>) -> TaskCompletedEvent {
    let bonus = task.bonus_enabled.then(|| BonusNote {
        label: task.bonus_title.clone(),
        done: task.bonus_completed_ts.is_some(),
    });

    let actions = if task.skip_approval {
        Vec::new()
    } else if task.bonus_enabled {
        vec![
            NotifyAction::ApproveAll,
            NotifyAction::ApprovePartial,
            NotifyAction::Reassign,
        ]
    } else {
        vec![NotifyAction::Approve, NotifyAction::Reassign]
    };

    TaskCompletedEvent {
        task_id: task.id.clone(),
        title: task.title.clone(),
        child_name,
        points: task.points,
        bonus,
        actions,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::board::ChoreBoard;
    use crate::model::TaskSpec;

    fn task_from(spec: TaskSpec) -> Task {
        let mut board = ChoreBoard::default();
        board.add_task(spec).unwrap()
    }

    #[test]
    fn plain_task_offers_approve_and_reassign() {
        let task = task_from(TaskSpec {
            title: "Dishes".into(),
            points: 10,
            ..TaskSpec::default()
        });
        let event = task_completed_event(&task, Some("Alma".into()));
        assert_eq!(
            event.actions,
            vec![NotifyAction::Approve, NotifyAction::Reassign]
        );
        assert!(event.bonus.is_none());
        assert_eq!(event.child_name.as_deref(), Some("Alma"));
    }

    #[test]
    fn bonus_task_offers_all_partial_reassign() {
        let task = task_from(TaskSpec {
            title: "Dishes".into(),
            bonus_enabled: true,
            bonus_title: "Wipe counters".into(),
            ..TaskSpec::default()
        });
        let event = task_completed_event(&task, None);
        assert_eq!(
            event.actions,
            vec![
                NotifyAction::ApproveAll,
                NotifyAction::ApprovePartial,
                NotifyAction::Reassign,
            ]
        );
        let bonus = event.bonus.unwrap();
        assert_eq!(bonus.label, "Wipe counters");
        assert!(!bonus.done);
    }

    #[test]
    fn skip_approval_task_offers_no_actions() {
        let task = task_from(TaskSpec {
            title: "Dishes".into(),
            skip_approval: true,
            ..TaskSpec::default()
        });
        let event = task_completed_event(&task, None);
        assert!(event.actions.is_empty());
    }

    #[test]
    fn event_serde_is_tagged_snake_case() {
        let task = task_from(TaskSpec {
            title: "Dishes".into(),
            ..TaskSpec::default()
        });
        let event = ChoreEvent::TaskCompleted(task_completed_event(&task, None));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"task_completed\""));
        let restored: ChoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
    }
}
