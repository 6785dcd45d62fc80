use std::collections::HashMap;
use std::sync::RwLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::units::{QuantityError, SaleUnit};

/// One product entry in a cart. Name, price, images and unit are
/// snapshotted from the product row when the line is added, so checkout
/// never trusts client-supplied prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub images: Vec<String>,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    pub unit: SaleUnit,
}

/// In-memory cart state for every signed-in user, keyed by user id.
///
/// Deliberately not persisted: carts die with the process. The store is
/// constructed once in `main` and handed around through `AppState` so
/// tests can build their own instance.
#[derive(Debug, Default)]
pub struct CartStore {
    lines: RwLock<HashMap<Uuid, Vec<CartLine>>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line to the user's cart. A line whose `product_id` already
    /// exists merges by summing quantities; otherwise the line is appended,
    /// preserving insertion order. The incoming quantity must sit on the
    /// unit's step grid and at or above its floor.
    pub fn add(&self, user_id: Uuid, line: CartLine) -> Result<(), QuantityError> {
        line.unit.validate_quantity(line.quantity)?;
        let mut carts = self.lines.write().unwrap_or_else(|e| e.into_inner());
        let cart = carts.entry(user_id).or_default();
        match cart.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => cart.push(line),
        }
        Ok(())
    }

    /// Removes the line with the given product id. Absent line is a no-op.
    pub fn remove(&self, user_id: Uuid, product_id: Uuid) {
        let mut carts = self.lines.write().unwrap_or_else(|e| e.into_inner());
        if let Some(cart) = carts.get_mut(&user_id) {
            cart.retain(|l| l.product_id != product_id);
        }
    }

    /// Replaces the quantity of an existing line. The new quantity must
    /// respect the line's unit floor and step; violations are rejected and
    /// the stored quantity is left unchanged. Absent line is a no-op.
    pub fn update_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<(), QuantityError> {
        let mut carts = self.lines.write().unwrap_or_else(|e| e.into_inner());
        let Some(line) = carts
            .get_mut(&user_id)
            .and_then(|cart| cart.iter_mut().find(|l| l.product_id == product_id))
        else {
            return Ok(());
        };
        line.unit.validate_quantity(quantity)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Empties the user's cart unconditionally.
    pub fn clear(&self, user_id: Uuid) {
        let mut carts = self.lines.write().unwrap_or_else(|e| e.into_inner());
        carts.remove(&user_id);
    }

    /// Cloned, insertion-ordered view of the user's cart. Mutations after
    /// the snapshot is taken do not affect it.
    pub fn snapshot(&self, user_id: Uuid) -> Vec<CartLine> {
        let carts = self.lines.read().unwrap_or_else(|e| e.into_inner());
        carts.get(&user_id).cloned().unwrap_or_default()
    }

    pub fn is_empty(&self, user_id: Uuid) -> bool {
        let carts = self.lines.read().unwrap_or_else(|e| e.into_inner());
        carts.get(&user_id).is_none_or(|cart| cart.is_empty())
    }
}

/// Sum of `price * quantity` over a set of lines.
pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines
        .iter()
        .map(|line| line.price * line.quantity)
        .sum::<Decimal>()
        .normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(product_id: Uuid, price: Decimal, quantity: Decimal, unit: SaleUnit) -> CartLine {
        CartLine {
            product_id,
            name: "Bazin Riche".into(),
            price,
            images: vec!["https://img.example/bazin.jpg".into()],
            quantity,
            unit,
        }
    }

    #[test]
    fn repeated_adds_merge_by_product_id() {
        let store = CartStore::new();
        let user = Uuid::new_v4();
        let product = Uuid::new_v4();

        store.add(user, line(product, dec!(1000), dec!(2), SaleUnit::Metre)).unwrap();
        store.add(user, line(product, dec!(1000), dec!(3), SaleUnit::Metre)).unwrap();
        store.add(user, line(product, dec!(1000), dec!(0.5), SaleUnit::Metre)).unwrap();

        let cart = store.snapshot(user);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, dec!(5.5));
    }

    #[test]
    fn distinct_products_keep_insertion_order() {
        let store = CartStore::new();
        let user = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        store.add(user, line(first, dec!(500), dec!(1), SaleUnit::Piece)).unwrap();
        store.add(user, line(second, dec!(750), dec!(2), SaleUnit::Rouleau)).unwrap();
        store.add(user, line(first, dec!(500), dec!(1), SaleUnit::Piece)).unwrap();

        let cart = store.snapshot(user);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart[0].product_id, first);
        assert_eq!(cart[1].product_id, second);
    }

    #[test]
    fn add_rejects_quantity_below_floor() {
        let store = CartStore::new();
        let user = Uuid::new_v4();
        let result = store.add(user, line(Uuid::new_v4(), dec!(100), dec!(0.2), SaleUnit::Metre));
        assert!(result.is_err());
        assert!(store.is_empty(user));
    }

    #[test]
    fn remove_is_idempotent() {
        let store = CartStore::new();
        let user = Uuid::new_v4();
        let product = Uuid::new_v4();
        store.add(user, line(product, dec!(100), dec!(1), SaleUnit::Piece)).unwrap();

        store.remove(user, product);
        let after_first = store.snapshot(user);
        store.remove(user, product);
        let after_second = store.snapshot(user);

        assert!(after_first.is_empty());
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn clear_is_idempotent() {
        let store = CartStore::new();
        let user = Uuid::new_v4();
        store.add(user, line(Uuid::new_v4(), dec!(100), dec!(1), SaleUnit::Piece)).unwrap();

        store.clear(user);
        assert!(store.is_empty(user));
        store.clear(user);
        assert!(store.is_empty(user));
    }

    #[test]
    fn update_quantity_enforces_unit_floor() {
        let store = CartStore::new();
        let user = Uuid::new_v4();
        let fabric = Uuid::new_v4();
        let roll = Uuid::new_v4();
        store.add(user, line(fabric, dec!(100), dec!(2), SaleUnit::Metre)).unwrap();
        store.add(user, line(roll, dec!(100), dec!(2), SaleUnit::Rouleau)).unwrap();

        assert!(store.update_quantity(user, fabric, dec!(0.5)).is_ok());
        assert!(store.update_quantity(user, fabric, dec!(0.1)).is_err());
        assert!(store.update_quantity(user, roll, dec!(0.5)).is_err());

        let cart = store.snapshot(user);
        assert_eq!(cart[0].quantity, dec!(0.5));
        assert_eq!(cart[1].quantity, dec!(2));
    }

    #[test]
    fn update_quantity_on_missing_line_is_a_no_op() {
        let store = CartStore::new();
        let user = Uuid::new_v4();
        assert!(store.update_quantity(user, Uuid::new_v4(), dec!(3)).is_ok());
        assert!(store.is_empty(user));
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutations() {
        let store = CartStore::new();
        let user = Uuid::new_v4();
        let product = Uuid::new_v4();
        store.add(user, line(product, dec!(100), dec!(1), SaleUnit::Piece)).unwrap();

        let snapshot = store.snapshot(user);
        store.clear(user);

        assert_eq!(snapshot.len(), 1);
        assert!(store.is_empty(user));
    }

    #[test]
    fn carts_are_independent_per_user() {
        let store = CartStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        store.add(alice, line(Uuid::new_v4(), dec!(100), dec!(1), SaleUnit::Piece)).unwrap();

        assert_eq!(store.snapshot(alice).len(), 1);
        assert!(store.is_empty(bob));
        store.clear(bob);
        assert_eq!(store.snapshot(alice).len(), 1);
    }

    #[test]
    fn total_sums_price_times_quantity() {
        let lines = vec![
            line(Uuid::new_v4(), dec!(1000), dec!(2.5), SaleUnit::Metre),
            line(Uuid::new_v4(), dec!(300), dec!(3), SaleUnit::Piece),
        ];
        assert_eq!(cart_total(&lines), dec!(3400));
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }
}
