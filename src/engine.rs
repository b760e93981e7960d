//! The command surface and mutation gate.
//!
//! [`ChoreEngine`] is what the host service layer talks to. Every mutating
//! command:
//!
//! 1. takes the single async mutex over the board (the serialization point
//!    shared by caregiver calls, child calls, automations, and the rollover
//!    timer),
//! 2. applies the operation to a draft copy of the board,
//! 3. asks the persistence collaborator to durably write the draft,
//! 4. commits the draft over the live board only after the write succeeds.
//!
//! A failure anywhere leaves the live board exactly as it was — no partial
//! application, including across compound mutations like a shop purchase
//! (debit + history append). Outbound events are dispatched after the
//! commit and never influence it.

use crate::board::ChoreBoard;
use crate::config::BoardConfig;
use crate::error::Result;
use crate::model::{
    Category, Child, ItemPatch, ItemSpec, Purchase, RepeatDay, ScheduleMode, ShopItem, Task,
    TaskPatch, TaskSpec, TaskStatus,
};
use crate::notify::{
    task_completed_event, ChoreEvent, EventSender, NotifyAction, ShopPurchaseEvent,
};
use crate::persist::Persister;
use crate::rollover::RolloverReport;
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// The chore economy engine: entity store, ledger, lifecycle, rollover, and
/// shop behind one mutation gate. Cheap to clone; clones share the board.
#[derive(Clone)]
pub struct ChoreEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    board: Mutex<ChoreBoard>,
    persister: Arc<dyn Persister>,
    events: Option<EventSender>,
    config: BoardConfig,
}

impl ChoreEngine {
    /// Open an engine: load the persisted board (empty when none exists)
    /// and wire the optional outbound event channel.
    pub fn open(
        config: BoardConfig,
        persister: Arc<dyn Persister>,
        events: Option<EventSender>,
    ) -> Result<Self> {
        let board = persister.load()?.unwrap_or_default();
        info!(
            children = board.children().len(),
            tasks = board.tasks().len(),
            items = board.items().len(),
            "chore board loaded"
        );
        Ok(Self {
            inner: Arc::new(EngineInner {
                board: Mutex::new(board),
                persister,
                events,
                config,
            }),
        })
    }

    /// Run one operation under the gate with draft-and-commit semantics.
    async fn mutate<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut ChoreBoard) -> Result<T>,
    ) -> Result<T> {
        let mut board = self.inner.board.lock().await;
        let mut draft = board.clone();
        let value = f(&mut draft)?;
        self.inner.persister.persist(&draft)?;
        *board = draft;
        debug!(op, "mutation committed");
        Ok(value)
    }

    /// Fire-and-forget event dispatch. Respects the per-kind toggles; a
    /// closed channel is logged and ignored.
    fn emit(&self, event: ChoreEvent) {
        let notify = &self.inner.config.notify;
        let enabled = match &event {
            ChoreEvent::TaskCompleted(_) => notify.task_complete,
            ChoreEvent::ShopPurchase(_) => notify.shop_purchase,
        };
        if !enabled {
            return;
        }
        if let Some(tx) = &self.inner.events {
            if tx.send(event).is_err() {
                debug!("event channel closed, dropping event");
            }
        }
    }

    // -- read access ---------------------------------------------------------

    /// Clone the full board (UI listings, diagnostics).
    pub async fn board(&self) -> ChoreBoard {
        self.inner.board.lock().await.clone()
    }

    pub async fn children(&self) -> Vec<Child> {
        self.inner.board.lock().await.children().to_vec()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.board.lock().await.tasks().to_vec()
    }

    pub async fn task(&self, task_id: &str) -> Result<Task> {
        Ok(self.inner.board.lock().await.task(task_id)?.clone())
    }

    pub async fn items(&self) -> Vec<ShopItem> {
        self.inner.board.lock().await.items().to_vec()
    }

    /// A child's current balance.
    pub async fn balance(&self, child_id: &str) -> Result<i64> {
        Ok(self.inner.board.lock().await.child(child_id)?.points)
    }

    /// Purchase history, optionally filtered to one child. Newest last.
    pub async fn purchases(&self, child_id: Option<&str>) -> Vec<Purchase> {
        let board = self.inner.board.lock().await;
        board
            .purchases()
            .iter()
            .filter(|p| child_id.is_none_or(|id| p.child_id == id))
            .cloned()
            .collect()
    }

    // -- child / category / shop-item CRUD -----------------------------------

    pub async fn add_child(&self, name: &str) -> Result<Child> {
        self.mutate("add_child", |b| b.add_child(name)).await
    }

    pub async fn rename_child(&self, child_id: &str, new_name: &str) -> Result<()> {
        self.mutate("rename_child", |b| b.rename_child(child_id, new_name))
            .await
    }

    pub async fn remove_child(&self, child_id: &str) -> Result<()> {
        self.mutate("remove_child", |b| b.remove_child(child_id))
            .await
    }

    pub async fn add_category(&self, name: &str, color: &str) -> Result<Category> {
        self.mutate("add_category", |b| b.add_category(name, color))
            .await
    }

    pub async fn rename_category(&self, category_id: &str, new_name: &str) -> Result<()> {
        self.mutate("rename_category", |b| {
            b.rename_category(category_id, new_name)
        })
        .await
    }

    pub async fn set_category_color(&self, category_id: &str, color: &str) -> Result<()> {
        self.mutate("set_category_color", |b| {
            b.set_category_color(category_id, color)
        })
        .await
    }

    pub async fn delete_category(&self, category_id: &str) -> Result<()> {
        self.mutate("delete_category", |b| b.delete_category(category_id))
            .await
    }

    pub async fn add_item(&self, spec: ItemSpec) -> Result<ShopItem> {
        self.mutate("add_item", |b| b.add_item(spec)).await
    }

    pub async fn update_item(&self, item_id: &str, patch: ItemPatch) -> Result<()> {
        self.mutate("update_item", |b| b.update_item(item_id, patch))
            .await
    }

    pub async fn delete_item(&self, item_id: &str) -> Result<()> {
        self.mutate("delete_item", |b| b.delete_item(item_id)).await
    }

    // -- task CRUD -----------------------------------------------------------

    pub async fn add_task(&self, spec: TaskSpec) -> Result<Task> {
        self.mutate("add_task", |b| b.add_task(spec)).await
    }

    pub async fn update_task(&self, task_id: &str, patch: TaskPatch) -> Result<()> {
        self.mutate("update_task", |b| b.update_task(task_id, patch))
            .await
    }

    pub async fn set_task_repeat(
        &self,
        task_id: &str,
        repeat_days: Option<Vec<RepeatDay>>,
        repeat_child_id: Option<Option<String>>,
        repeat_child_ids: Option<Vec<String>>,
        schedule_mode: Option<ScheduleMode>,
    ) -> Result<()> {
        self.mutate("set_task_repeat", |b| {
            b.set_task_repeat(
                task_id,
                repeat_days,
                repeat_child_id,
                repeat_child_ids,
                schedule_mode,
            )
        })
        .await
    }

    pub async fn set_task_icon(&self, task_id: &str, icon: &str) -> Result<()> {
        self.mutate("set_task_icon", |b| b.set_task_icon(task_id, icon))
            .await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.mutate("delete_task", |b| b.delete_task(task_id)).await
    }

    // -- lifecycle -----------------------------------------------------------

    pub async fn assign_task(&self, task_id: &str, child_id: &str) -> Result<()> {
        self.mutate("assign_task", |b| b.assign_task(task_id, child_id))
            .await
    }

    /// Drive a task to `assigned`, `awaiting_approval`, or `approved`.
    ///
    /// `as_child` identifies the acting child for shared tasks; for
    /// fastest-wins tasks a losing attempt fails with `AlreadyClaimed`.
    /// Reaching `awaiting_approval` emits the completion event.
    pub async fn set_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        completed_ts: Option<DateTime<Utc>>,
        as_child: Option<&str>,
    ) -> Result<Task> {
        let (task, event) = self
            .mutate("set_task_status", |b| {
                b.set_task_status(task_id, status, completed_ts, as_child)?;
                let task = b.task(task_id)?.clone();
                let event = (status == TaskStatus::AwaitingApproval).then(|| {
                    let child_name = task
                        .assigned_to
                        .as_deref()
                        .and_then(|id| b.child_name(id))
                        .map(str::to_owned);
                    task_completed_event(&task, child_name)
                });
                Ok((task, event))
            })
            .await?;
        if let Some(event) = event {
            self.emit(ChoreEvent::TaskCompleted(event));
        }
        Ok(task)
    }

    pub async fn approve_task(&self, task_id: &str) -> Result<()> {
        self.mutate("approve_task", |b| b.approve_task(task_id))
            .await
    }

    /// Mark a task's bonus as done and emit the completion event (the
    /// caregiver sees the bonus line flip to done).
    pub async fn complete_bonus(
        &self,
        task_id: &str,
        completed_ts: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let event = self
            .mutate("complete_bonus", |b| {
                b.complete_bonus(task_id, completed_ts)?;
                let task = b.task(task_id)?.clone();
                let child_name = task
                    .assigned_to
                    .as_deref()
                    .and_then(|id| b.child_name(id))
                    .map(str::to_owned);
                Ok(task_completed_event(&task, child_name))
            })
            .await?;
        self.emit(ChoreEvent::TaskCompleted(event));
        Ok(())
    }

    pub async fn approve_bonus(&self, task_id: &str) -> Result<()> {
        self.mutate("approve_bonus", |b| b.approve_bonus(task_id))
            .await
    }

    /// Apply a caregiver's notification action to a task.
    pub async fn apply_notify_action(&self, task_id: &str, action: NotifyAction) -> Result<()> {
        match action {
            NotifyAction::Approve | NotifyAction::ApprovePartial => {
                self.approve_task(task_id).await
            }
            NotifyAction::ApproveAll => {
                self.mutate("approve_all", |b| b.approve_with_bonus(task_id))
                    .await
            }
            NotifyAction::Reassign => {
                self.set_task_status(task_id, TaskStatus::Assigned, None, None)
                    .await?;
                Ok(())
            }
        }
    }

    // -- ledger --------------------------------------------------------------

    /// Strict balance adjustment; debits never overdraw.
    pub async fn adjust_points(&self, child_id: &str, delta: i64) -> Result<i64> {
        self.mutate("adjust_points", |b| b.adjust_points(child_id, delta))
            .await
    }

    /// Administrative adjustment; negative deltas saturate at zero.
    pub async fn add_points(&self, child_id: &str, delta: i64) -> Result<i64> {
        self.mutate("add_points", |b| b.add_points(child_id, delta))
            .await
    }

    /// Zero one child's balance, or every balance.
    pub async fn reset_points(&self, child_id: Option<&str>) -> Result<()> {
        self.mutate("reset_points", |b| b.reset_points(child_id))
            .await
    }

    // -- shop ----------------------------------------------------------------

    /// Buy an item: validate, debit, and append history as one unit, then
    /// emit the purchase event.
    pub async fn buy_item(&self, child_id: &str, item_id: &str) -> Result<Purchase> {
        let purchase = self
            .mutate("buy_item", |b| b.buy_item(child_id, item_id))
            .await?;

        let mut event_purchase = purchase.clone();
        if !self.inner.config.notify.purchase_image {
            event_purchase.image.clear();
        }
        self.emit(ChoreEvent::ShopPurchase(ShopPurchaseEvent {
            purchase: event_purchase,
        }));
        Ok(purchase)
    }

    pub async fn clear_history(&self, child_id: Option<&str>) -> Result<()> {
        self.mutate("clear_history", |b| b.clear_history(child_id))
            .await
    }

    // -- rollover ------------------------------------------------------------

    /// Run the regeneration pass for today's local calendar date.
    pub async fn daily_rollover(&self) -> Result<RolloverReport> {
        self.rollover_for(Local::now().date_naive()).await
    }

    /// Run the regeneration pass for an explicit date.
    pub async fn rollover_for(&self, today: NaiveDate) -> Result<RolloverReport> {
        let report = self
            .mutate("daily_rollover", |b| Ok(b.daily_rollover(today)))
            .await?;
        info!(
            %today,
            reset = report.reset,
            carried = report.carried,
            pending = report.pending,
            overdue = report.overdue,
            "daily rollover finished"
        );
        Ok(report)
    }
}
