//! Choreboard: a household chore-economy engine.
//!
//! Children complete assigned tasks, earn points, and spend them in a
//! rewards shop. The crate is the engine behind that economy:
//!
//! - **Entity store**: [`ChoreBoard`] owns children, categories, tasks,
//!   shop items, and the purchase history.
//! - **Lifecycle**: tasks run `unassigned → assigned → awaiting_approval →
//!   approved`, with bonus and early-bonus payouts layered on top and
//!   fastest-wins resolution for shared tasks.
//! - **Rollover**: a daily pass regenerates recurring tasks, carries
//!   persistent unfinished ones over, and flags overdue work;
//!   [`RolloverScheduler`] fires it at local midnight.
//! - **Ledger & shop**: atomic point credits/debits and snapshot-style
//!   purchase history.
//! - **Engine**: [`ChoreEngine`] is the command surface — one async
//!   mutation gate, a durable-write fence through [`Persister`], and
//!   fire-and-forget [`ChoreEvent`] dispatch for the notification layer.

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
mod ledger;
mod lifecycle;
pub mod model;
pub mod notify;
pub mod persist;
mod rollover;
pub mod scheduler;
mod shop;

pub use board::ChoreBoard;
pub use config::{BoardConfig, NotifyConfig, RolloverConfig};
pub use engine::ChoreEngine;
pub use error::{ChoreError, Result};
pub use model::{
    Category, Child, ItemPatch, ItemSpec, Purchase, RepeatDay, ScheduleMode, ShopItem, Task,
    TaskPatch, TaskSpec, TaskStatus,
};
pub use notify::{
    BonusNote, ChoreEvent, EventSender, NotifyAction, ShopPurchaseEvent, TaskCompletedEvent,
};
pub use persist::{JsonFilePersister, NullPersister, Persister};
pub use rollover::RolloverReport;
pub use scheduler::RolloverScheduler;
