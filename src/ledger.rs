//! The points ledger: balance adjustments keyed by child.
//!
//! Two flavors of adjustment exist. [`ChoreBoard::adjust_points`] is the
//! strict contract used by payouts and purchases: a debit that would push a
//! balance negative fails and changes nothing. [`ChoreBoard::add_points`] is
//! the administrative override used by caregiver services: negative deltas
//! saturate at zero instead of failing.

use crate::board::ChoreBoard;
use crate::error::{ChoreError, Result};
use tracing::debug;

impl ChoreBoard {
    /// Atomically add `delta` (positive or negative) to a child's balance.
    ///
    /// Fails with `NotFound` for an unknown child and with
    /// `InsufficientPoints` when a debit would produce a negative balance;
    /// callers debiting for purchases are expected to pre-check sufficiency,
    /// this is the backstop. Returns the new balance.
    pub fn adjust_points(&mut self, child_id: &str, delta: i64) -> Result<i64> {
        let child = self.child_mut(child_id)?;
        let next = child.points + delta;
        if next < 0 {
            return Err(ChoreError::InsufficientPoints {
                have: child.points,
                need: -delta,
            });
        }
        child.points = next;
        debug!(child_id, delta, balance = next, "points adjusted");
        Ok(next)
    }

    /// Administrative adjustment: like [`Self::adjust_points`] but a negative
    /// delta larger than the balance forces the balance to zero instead of
    /// failing. Returns the new balance.
    pub fn add_points(&mut self, child_id: &str, delta: i64) -> Result<i64> {
        let child = self.child_mut(child_id)?;
        child.points = (child.points + delta).max(0);
        debug!(child_id, delta, balance = child.points, "points set by admin");
        Ok(child.points)
    }

    /// Zero the balance of one child, or of every child when `child_id` is
    /// `None`.
    pub fn reset_points(&mut self, child_id: Option<&str>) -> Result<()> {
        match child_id {
            Some(id) => {
                self.child_mut(id)?.points = 0;
            }
            None => {
                for child in &mut self.children {
                    child.points = 0;
                }
            }
        }
        Ok(())
    }

    /// Credit points to a child if the id still refers to one.
    ///
    /// Payouts for tasks whose assignee was removed pay no one; the lifecycle
    /// transition still happens (caregiver override).
    pub(crate) fn credit_if_known(&mut self, child_id: Option<&str>, points: i64) {
        let Some(id) = child_id else {
            return;
        };
        if points <= 0 {
            return;
        }
        match self.adjust_points(id, points) {
            Ok(_) => {}
            Err(e) => debug!(child_id = id, points, "payout skipped: {e}"),
        }
    }
}
