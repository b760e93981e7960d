//! Entity types shared across the chore board.
//!
//! Everything here is plain data: the board, ledger, lifecycle, and shop
//! modules operate on these records, and the persister serializes them
//! verbatim into the snapshot file.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ids / time helpers
// ---------------------------------------------------------------------------

pub(crate) fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

pub(crate) fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle state of a task instance.
///
/// `Approved` is terminal for the instance; the rollover pass is the only
/// thing that resets a recurring task back to an open state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Unassigned,
    Assigned,
    AwaitingApproval,
    Approved,
}

impl TaskStatus {
    /// Stable wire name, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Assigned => "assigned",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Approved => "approved",
        }
    }
}

/// How a recurring task picks its assignee on regeneration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    /// Reset for the configured child (or unassigned when none).
    #[default]
    Fixed,
    /// Round-robin through `repeat_child_ids`, stable order, wraps.
    Rotating,
}

/// A recurrence marker: a weekday, or `daily` which matches every date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatDay {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
    Daily,
}

impl RepeatDay {
    /// Whether this marker matches the given calendar date.
    #[must_use]
    pub fn matches(self, date: NaiveDate) -> bool {
        match self.weekday() {
            Some(day) => date.weekday() == day,
            None => true,
        }
    }

    fn weekday(self) -> Option<Weekday> {
        match self {
            Self::Mon => Some(Weekday::Mon),
            Self::Tue => Some(Weekday::Tue),
            Self::Wed => Some(Weekday::Wed),
            Self::Thu => Some(Weekday::Thu),
            Self::Fri => Some(Weekday::Fri),
            Self::Sat => Some(Weekday::Sat),
            Self::Sun => Some(Weekday::Sun),
            Self::Daily => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Core entities
// ---------------------------------------------------------------------------

/// A child participating in the chore economy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
    /// Points balance. Never negative through engine-permitted operations.
    #[serde(default)]
    pub points: i64,
}

/// A task category (lookup table only; tasks reference categories by id and
/// dangling references are treated as "no category").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// A chore task instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Points credited to the assigned child on approval.
    #[serde(default)]
    pub points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    /// Assigned child id. `None` means unassigned / open to anyone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_ts: Option<DateTime<Utc>>,
    /// Payout guard: re-approving an already-approved instance never pays twice.
    #[serde(default)]
    pub approved: bool,
    /// Quick-complete path: a completion may jump straight to `approved`.
    #[serde(default)]
    pub skip_approval: bool,
    /// Carry an unapproved instance across day boundaries instead of
    /// regenerating a duplicate.
    #[serde(default)]
    pub persist_until_completed: bool,
    /// Display hint: the child UI offers a one-tap complete.
    #[serde(default)]
    pub quick_complete: bool,
    /// First completion wins; later attempts by other children are rejected.
    #[serde(default)]
    pub fastest_wins: bool,
    /// Overdue display marker, orthogonal to `status`.
    #[serde(default)]
    pub carried_over: bool,
    /// Whether rollover should flag this task overdue once `due` passes.
    #[serde(default)]
    pub mark_overdue: bool,
    #[serde(default)]
    pub icon: String,
    /// Category ids. Dangling ids are tolerated.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub schedule_mode: ScheduleMode,
    /// Recurrence markers. Empty means rollover never touches this task.
    #[serde(default)]
    pub repeat_days: Vec<RepeatDay>,
    /// Fixed-mode assignee on regeneration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_child_id: Option<String>,
    /// Rotation / fastest-wins pool, in stable rotation order.
    #[serde(default)]
    pub repeat_child_ids: Vec<String>,
    #[serde(default)]
    pub bonus_enabled: bool,
    #[serde(default)]
    pub bonus_title: String,
    #[serde(default)]
    pub bonus_points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_completed_ts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bonus_approved: bool,
    #[serde(default)]
    pub early_bonus_enabled: bool,
    /// Width of the early-completion window before `due`, in days.
    #[serde(default)]
    pub early_bonus_days: u32,
    #[serde(default)]
    pub early_bonus_points: i64,
    /// Calendar date of the last regeneration pass that processed this task.
    /// Re-running rollover on the same date is a no-op for this task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rollover: Option<NaiveDate>,
}

impl Task {
    /// Whether any recurrence marker matches the given date.
    #[must_use]
    pub fn repeats_on(&self, date: NaiveDate) -> bool {
        self.repeat_days.iter().any(|d| d.matches(date))
    }
}

/// A purchasable reward in the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: String,
    pub title: String,
    /// Price in points, always >= 0.
    pub price: i64,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Custom action descriptors, opaque to the engine. The host attaches
    /// these to the purchase notification (e.g. a scene to trigger).
    #[serde(default)]
    pub actions: Vec<serde_json::Value>,
}

/// An immutable purchase record. Snapshots the item at purchase time so
/// later item edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub child_id: String,
    pub child_name: String,
    pub item_id: String,
    pub title: String,
    pub price: i64,
    #[serde(default)]
    pub image: String,
    pub ts: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Creation / patch parameter structs
// ---------------------------------------------------------------------------

/// Parameters for creating a task. Everything beyond `title`/`points` is
/// optional and defaults to off.
#[derive(Debug, Clone, Default)]
pub struct TaskSpec {
    pub title: String,
    pub points: i64,
    pub description: String,
    pub due: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub icon: String,
    pub categories: Vec<String>,
    pub skip_approval: bool,
    pub persist_until_completed: bool,
    pub quick_complete: bool,
    pub fastest_wins: bool,
    pub mark_overdue: bool,
    pub schedule_mode: ScheduleMode,
    pub repeat_days: Vec<RepeatDay>,
    pub repeat_child_id: Option<String>,
    pub repeat_child_ids: Vec<String>,
    pub bonus_enabled: bool,
    pub bonus_title: String,
    pub bonus_points: i64,
    pub early_bonus_enabled: bool,
    pub early_bonus_days: u32,
    pub early_bonus_points: i64,
}

/// Partial task update: `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub points: Option<i64>,
    pub description: Option<String>,
    pub due: Option<Option<DateTime<Utc>>>,
    pub icon: Option<String>,
    pub categories: Option<Vec<String>>,
    pub skip_approval: Option<bool>,
    pub persist_until_completed: Option<bool>,
    pub quick_complete: Option<bool>,
    pub fastest_wins: Option<bool>,
    pub mark_overdue: Option<bool>,
    pub bonus_enabled: Option<bool>,
    pub bonus_title: Option<String>,
    pub bonus_points: Option<i64>,
    pub early_bonus_enabled: Option<bool>,
    pub early_bonus_days: Option<u32>,
    pub early_bonus_points: Option<i64>,
}

/// Parameters for creating a shop item.
#[derive(Debug, Clone, Default)]
pub struct ItemSpec {
    pub title: String,
    pub price: i64,
    pub icon: String,
    pub image: String,
    pub active: bool,
    pub actions: Vec<serde_json::Value>,
}

/// Partial shop-item update: `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub price: Option<i64>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub active: Option<bool>,
    pub actions: Option<Vec<serde_json::Value>>,
}
