//! The in-memory entity store.
//!
//! [`ChoreBoard`] exclusively owns every entity record. All other modules
//! (ledger, lifecycle, rollover, shop) are `impl` blocks over this aggregate,
//! so every mutation funnels through one place and identity invariants are
//! checked once. The board does no I/O — [`crate::engine::ChoreEngine`] wraps
//! it in the mutation gate and the persistence fence.

use crate::error::{ChoreError, Result};
use crate::model::{
    new_id, Category, Child, ItemPatch, ItemSpec, Purchase, RepeatDay, ScheduleMode, ShopItem,
    Task, TaskPatch, TaskSpec, TaskStatus,
};
use serde::{Deserialize, Serialize};

/// The full entity graph: children, categories, tasks, shop items, and the
/// append-only purchase history.
///
/// Entities live in insertion-ordered vectors. The data set is household
/// sized, so linear lookups are fine and stable ordering is what the
/// rotation scheduler and UI listings want.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreBoard {
    pub(crate) children: Vec<Child>,
    pub(crate) categories: Vec<Category>,
    pub(crate) tasks: Vec<Task>,
    pub(crate) items: Vec<ShopItem>,
    pub(crate) purchases: Vec<Purchase>,
}

pub(crate) fn not_found(kind: &str, id: &str) -> ChoreError {
    ChoreError::NotFound(format!("{kind} {id}"))
}

fn require_name(kind: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ChoreError::Validation(format!("{kind} name must not be empty")));
    }
    Ok(trimmed.to_owned())
}

fn require_non_negative(what: &str, value: i64) -> Result<()> {
    if value < 0 {
        return Err(ChoreError::Validation(format!("{what} must not be negative (got {value})")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

impl ChoreBoard {
    pub fn child(&self, id: &str) -> Result<&Child> {
        self.children
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("child", id))
    }

    pub(crate) fn child_mut(&mut self, id: &str) -> Result<&mut Child> {
        self.children
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("child", id))
    }

    pub fn category(&self, id: &str) -> Result<&Category> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("category", id))
    }

    pub fn task(&self, id: &str) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("task", id))
    }

    pub(crate) fn task_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("task", id))
    }

    pub fn item(&self, id: &str) -> Result<&ShopItem> {
        self.items
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found("shop item", id))
    }

    #[must_use]
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn items(&self) -> &[ShopItem] {
        &self.items
    }

    #[must_use]
    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }

    /// Resolve a child name, if the id refers to a live child.
    #[must_use]
    pub fn child_name(&self, id: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Child CRUD
// ---------------------------------------------------------------------------

impl ChoreBoard {
    /// Add a child with a fresh id and zero balance.
    pub fn add_child(&mut self, name: &str) -> Result<Child> {
        let child = Child {
            id: new_id("child"),
            name: require_name("child", name)?,
            points: 0,
        };
        self.children.push(child.clone());
        Ok(child)
    }

    pub fn rename_child(&mut self, id: &str, new_name: &str) -> Result<()> {
        let new_name = require_name("child", new_name)?;
        self.child_mut(id)?.name = new_name;
        Ok(())
    }

    /// Remove a child. Tasks still pointing at the id are left dangling;
    /// approving one later transitions without paying anyone.
    pub fn remove_child(&mut self, id: &str) -> Result<()> {
        let before = self.children.len();
        self.children.retain(|c| c.id != id);
        if self.children.len() == before {
            return Err(not_found("child", id));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Category CRUD
// ---------------------------------------------------------------------------

impl ChoreBoard {
    pub fn add_category(&mut self, name: &str, color: &str) -> Result<Category> {
        let category = Category {
            id: new_id("cat"),
            name: require_name("category", name)?,
            color: color.to_owned(),
        };
        self.categories.push(category.clone());
        Ok(category)
    }

    pub fn rename_category(&mut self, id: &str, new_name: &str) -> Result<()> {
        let new_name = require_name("category", new_name)?;
        let cat = self
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("category", id))?;
        cat.name = new_name;
        Ok(())
    }

    pub fn set_category_color(&mut self, id: &str, color: &str) -> Result<()> {
        let cat = self
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("category", id))?;
        cat.color = color.to_owned();
        Ok(())
    }

    /// Delete a category. Task references to the id become dangling, which
    /// readers treat as "no category".
    pub fn delete_category(&mut self, id: &str) -> Result<()> {
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        if self.categories.len() == before {
            return Err(not_found("category", id));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Task CRUD
// ---------------------------------------------------------------------------

impl ChoreBoard {
    /// Create a task from a spec. The initial status follows the assignment:
    /// `assigned` when a child is given, `unassigned` otherwise.
    pub fn add_task(&mut self, spec: TaskSpec) -> Result<Task> {
        let title = require_name("task", &spec.title)?;
        require_non_negative("task points", spec.points)?;
        require_non_negative("bonus points", spec.bonus_points)?;
        require_non_negative("early bonus points", spec.early_bonus_points)?;
        if let Some(child_id) = &spec.assigned_to {
            self.child(child_id)?;
        }

        let status = if spec.assigned_to.is_some() {
            TaskStatus::Assigned
        } else {
            TaskStatus::Unassigned
        };

        let task = Task {
            id: new_id("task"),
            title,
            description: spec.description,
            points: spec.points,
            due: spec.due,
            assigned_to: spec.assigned_to,
            status,
            completed_ts: None,
            approved: false,
            skip_approval: spec.skip_approval,
            persist_until_completed: spec.persist_until_completed,
            quick_complete: spec.quick_complete,
            fastest_wins: spec.fastest_wins,
            carried_over: false,
            mark_overdue: spec.mark_overdue,
            icon: spec.icon,
            categories: spec.categories,
            schedule_mode: spec.schedule_mode,
            repeat_days: spec.repeat_days,
            repeat_child_id: spec.repeat_child_id,
            repeat_child_ids: spec.repeat_child_ids,
            bonus_enabled: spec.bonus_enabled,
            bonus_title: spec.bonus_title,
            bonus_points: spec.bonus_points,
            bonus_completed_ts: None,
            bonus_approved: false,
            early_bonus_enabled: spec.early_bonus_enabled,
            early_bonus_days: spec.early_bonus_days,
            early_bonus_points: spec.early_bonus_points,
            last_rollover: None,
        };
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Apply a partial update. Only supplied fields change; lifecycle state
    /// (status, stamps, payout guards) is never touched here.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<()> {
        if let Some(points) = patch.points {
            require_non_negative("task points", points)?;
        }
        if let Some(points) = patch.bonus_points {
            require_non_negative("bonus points", points)?;
        }
        if let Some(points) = patch.early_bonus_points {
            require_non_negative("early bonus points", points)?;
        }
        let title = match &patch.title {
            Some(t) => Some(require_name("task", t)?),
            None => None,
        };

        let task = self.task_mut(id)?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(points) = patch.points {
            task.points = points;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(due) = patch.due {
            task.due = due;
        }
        if let Some(icon) = patch.icon {
            task.icon = icon;
        }
        if let Some(categories) = patch.categories {
            task.categories = categories;
        }
        if let Some(v) = patch.skip_approval {
            task.skip_approval = v;
        }
        if let Some(v) = patch.persist_until_completed {
            task.persist_until_completed = v;
        }
        if let Some(v) = patch.quick_complete {
            task.quick_complete = v;
        }
        if let Some(v) = patch.fastest_wins {
            task.fastest_wins = v;
        }
        if let Some(v) = patch.mark_overdue {
            task.mark_overdue = v;
        }
        if let Some(v) = patch.bonus_enabled {
            task.bonus_enabled = v;
        }
        if let Some(v) = patch.bonus_title {
            task.bonus_title = v;
        }
        if let Some(v) = patch.bonus_points {
            task.bonus_points = v;
        }
        if let Some(v) = patch.early_bonus_enabled {
            task.early_bonus_enabled = v;
        }
        if let Some(v) = patch.early_bonus_days {
            task.early_bonus_days = v;
        }
        if let Some(v) = patch.early_bonus_points {
            task.early_bonus_points = v;
        }
        Ok(())
    }

    /// Replace a task's recurrence settings. `None` leaves a field untouched.
    pub fn set_task_repeat(
        &mut self,
        id: &str,
        repeat_days: Option<Vec<RepeatDay>>,
        repeat_child_id: Option<Option<String>>,
        repeat_child_ids: Option<Vec<String>>,
        schedule_mode: Option<ScheduleMode>,
    ) -> Result<()> {
        let task = self.task_mut(id)?;
        if let Some(days) = repeat_days {
            task.repeat_days = days;
        }
        if let Some(child) = repeat_child_id {
            task.repeat_child_id = child;
        }
        if let Some(pool) = repeat_child_ids {
            task.repeat_child_ids = pool;
        }
        if let Some(mode) = schedule_mode {
            task.schedule_mode = mode;
        }
        Ok(())
    }

    pub fn set_task_icon(&mut self, id: &str, icon: &str) -> Result<()> {
        self.task_mut(id)?.icon = icon.to_owned();
        Ok(())
    }

    /// Remove a task unconditionally. Points already paid stay paid.
    pub fn delete_task(&mut self, id: &str) -> Result<()> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Err(not_found("task", id));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shop item CRUD
// ---------------------------------------------------------------------------

impl ChoreBoard {
    pub fn add_item(&mut self, spec: ItemSpec) -> Result<ShopItem> {
        let title = require_name("shop item", &spec.title)?;
        require_non_negative("shop item price", spec.price)?;
        let item = ShopItem {
            id: new_id("item"),
            title,
            price: spec.price,
            icon: spec.icon,
            image: spec.image,
            active: spec.active,
            actions: spec.actions,
        };
        self.items.push(item.clone());
        Ok(item)
    }

    /// Apply a partial update. Purchase history is never rewritten: records
    /// snapshot the item at purchase time.
    pub fn update_item(&mut self, id: &str, patch: ItemPatch) -> Result<()> {
        if let Some(price) = patch.price {
            require_non_negative("shop item price", price)?;
        }
        let title = match &patch.title {
            Some(t) => Some(require_name("shop item", t)?),
            None => None,
        };

        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found("shop item", id))?;
        if let Some(title) = title {
            item.title = title;
        }
        if let Some(price) = patch.price {
            item.price = price;
        }
        if let Some(icon) = patch.icon {
            item.icon = icon;
        }
        if let Some(image) = patch.image {
            item.image = image;
        }
        if let Some(active) = patch.active {
            item.active = active;
        }
        if let Some(actions) = patch.actions {
            item.actions = actions;
        }
        Ok(())
    }

    pub fn delete_item(&mut self, id: &str) -> Result<()> {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        if self.items.len() == before {
            return Err(not_found("shop item", id));
        }
        Ok(())
    }
}
