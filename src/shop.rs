//! The shop transaction engine: purchase validation, debit, and history.
//!
//! A purchase debits the child and appends an immutable history record in
//! the same `&mut self` scope, so under the engine's draft-and-commit
//! mutation gate the two either both land or neither does.

use crate::board::ChoreBoard;
use crate::error::{ChoreError, Result};
use crate::model::{new_id, now_utc, Purchase};
use tracing::debug;

impl ChoreBoard {
    /// Buy a shop item for a child.
    ///
    /// Fails with `NotFound` for an unknown child or item, `Inactive` for a
    /// deactivated item, and `InsufficientPoints` when the balance does not
    /// cover the price — all without changing anything. On success the price
    /// is debited and a [`Purchase`] snapshot (title/price/image at purchase
    /// time) is appended to the history; later item edits never rewrite it.
    pub fn buy_item(&mut self, child_id: &str, item_id: &str) -> Result<Purchase> {
        let child = self.child(child_id)?;
        let item = self.item(item_id)?;
        if !item.active {
            return Err(ChoreError::Inactive(item.title.clone()));
        }
        if child.points < item.price {
            return Err(ChoreError::InsufficientPoints {
                have: child.points,
                need: item.price,
            });
        }

        let purchase = Purchase {
            id: new_id("pur"),
            child_id: child.id.clone(),
            child_name: child.name.clone(),
            item_id: item.id.clone(),
            title: item.title.clone(),
            price: item.price,
            image: item.image.clone(),
            ts: now_utc(),
        };

        self.adjust_points(child_id, -purchase.price)?;
        self.purchases.push(purchase.clone());
        debug!(
            child_id,
            item_id,
            price = purchase.price,
            "shop purchase recorded"
        );
        Ok(purchase)
    }

    /// Delete purchase history for one child, or for everyone when
    /// `child_id` is `None`. Balances are untouched.
    pub fn clear_history(&mut self, child_id: Option<&str>) -> Result<()> {
        match child_id {
            Some(id) => {
                self.child(id)?;
                self.purchases.retain(|p| p.child_id != id);
            }
            None => self.purchases.clear(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::model::{ItemPatch, ItemSpec};

    fn shop_board() -> (ChoreBoard, String, String) {
        let mut board = ChoreBoard::default();
        let child = board.add_child("Alma").unwrap().id.clone();
        board.add_points(&child, 30).unwrap();
        let item = board
            .add_item(ItemSpec {
                title: "Movie night".into(),
                price: 25,
                image: "movie.png".into(),
                active: true,
                ..ItemSpec::default()
            })
            .unwrap()
            .id
            .clone();
        (board, child, item)
    }

    #[test]
    fn buy_debits_and_records_history() {
        let (mut board, child, item) = shop_board();
        let purchase = board.buy_item(&child, &item).unwrap();

        assert_eq!(board.child(&child).unwrap().points, 5);
        assert_eq!(board.purchases().len(), 1);
        assert_eq!(purchase.title, "Movie night");
        assert_eq!(purchase.price, 25);
        assert_eq!(purchase.child_name, "Alma");
    }

    #[test]
    fn buy_fails_on_insufficient_points_without_side_effects() {
        let (mut board, child, item) = shop_board();
        board.reset_points(Some(&child)).unwrap();
        board.add_points(&child, 10).unwrap();

        let err = board.buy_item(&child, &item).unwrap_err();
        assert!(matches!(
            err,
            ChoreError::InsufficientPoints { have: 10, need: 25 }
        ));
        assert_eq!(board.child(&child).unwrap().points, 10);
        assert!(board.purchases().is_empty());
    }

    #[test]
    fn buy_fails_on_inactive_item() {
        let (mut board, child, item) = shop_board();
        board
            .update_item(
                &item,
                ItemPatch {
                    active: Some(false),
                    ..ItemPatch::default()
                },
            )
            .unwrap();

        let err = board.buy_item(&child, &item).unwrap_err();
        assert!(matches!(err, ChoreError::Inactive(_)));
        assert_eq!(board.child(&child).unwrap().points, 30);
    }

    #[test]
    fn buy_fails_on_unknown_ids() {
        let (mut board, child, item) = shop_board();
        assert!(matches!(
            board.buy_item("child-ghost", &item),
            Err(ChoreError::NotFound(_))
        ));
        assert!(matches!(
            board.buy_item(&child, "item-ghost"),
            Err(ChoreError::NotFound(_))
        ));
    }

    #[test]
    fn purchase_snapshot_survives_item_edits() {
        let (mut board, child, item) = shop_board();
        board.buy_item(&child, &item).unwrap();

        board
            .update_item(
                &item,
                ItemPatch {
                    title: Some("Movie night DELUXE".into()),
                    price: Some(99),
                    image: Some("other.png".into()),
                    ..ItemPatch::default()
                },
            )
            .unwrap();

        let purchase = &board.purchases()[0];
        assert_eq!(purchase.title, "Movie night");
        assert_eq!(purchase.price, 25);
        assert_eq!(purchase.image, "movie.png");
    }

    #[test]
    fn clear_history_for_one_child_or_all() {
        let (mut board, child_a, item) = shop_board();
        let child_b = board.add_child("Bo").unwrap().id.clone();
        board.add_points(&child_b, 100).unwrap();
        board.buy_item(&child_a, &item).unwrap();
        board.buy_item(&child_b, &item).unwrap();
        board.buy_item(&child_b, &item).unwrap();

        board.clear_history(Some(&child_b)).unwrap();
        assert_eq!(board.purchases().len(), 1);
        assert_eq!(board.purchases()[0].child_id, child_a);

        // Balances are history-independent.
        assert_eq!(board.child(&child_b).unwrap().points, 50);

        board.clear_history(None).unwrap();
        assert!(board.purchases().is_empty());
    }
}
