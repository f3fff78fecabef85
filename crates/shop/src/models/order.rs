//! Order models and the placement-time order builder.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sari_core::{CurrencyCode, OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

use crate::cart::ResolvedCart;

/// A persisted order.
///
/// Created once at placement and never mutated by the checkout flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_name: String,
    pub address: String,
    pub delivery_method: PaymentMethod,
    pub payment_method: PaymentMethod,
    pub total: Decimal,
    pub currency: CurrencyCode,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A persisted order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// An order ready to be written, built from the resolved cart.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_name: String,
    pub address: String,
    pub method: PaymentMethod,
    pub total: Decimal,
    pub currency: CurrencyCode,
    pub status: OrderStatus,
    pub items: Vec<NewOrderItem>,
}

/// A line of a [`NewOrder`].
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl NewOrder {
    /// Build an order from the current cart resolution and the wizard's
    /// selections.
    ///
    /// The total comes from the resolution, i.e. it is recomputed from the
    /// catalog at placement time rather than carried from any earlier
    /// screen. The single wizard choice fills both method columns.
    #[must_use]
    pub fn from_resolved(
        user_id: UserId,
        customer_name: String,
        address: String,
        method: PaymentMethod,
        resolved: &ResolvedCart,
    ) -> Self {
        let items = resolved
            .lines
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id,
                name: line.name.clone(),
                description: line.description.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price.amount(),
            })
            .collect();

        Self {
            id: OrderId::generate(),
            user_id,
            customer_name,
            address,
            method,
            total: resolved.total.rounded(),
            currency: resolved.total.currency(),
            status: OrderStatus::Pending,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::cart::{Cart, UNKNOWN_PRODUCT_NAME};
    use crate::models::Product;
    use sari_core::Price;

    fn catalog_with(id: i32, price: &str) -> HashMap<ProductId, Product> {
        let product = Product {
            id: ProductId::new(id),
            name: "Tsinelas".to_owned(),
            description: "Rubber slippers".to_owned(),
            price: Price::parse(price).expect("valid price"),
            image_url: None,
        };
        HashMap::from([(product.id, product)])
    }

    #[test]
    fn builder_copies_catalog_fields_and_recomputes_total() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2);
        let resolved = cart.resolve(&catalog_with(1, "Php6250.00"));

        let order = NewOrder::from_resolved(
            UserId::new(7),
            "Maria Santos".to_owned(),
            "123 Mabini St, Manila".to_owned(),
            PaymentMethod::CashOnDelivery,
            &resolved,
        );

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, "12500.00".parse().expect("decimal"));
        assert_eq!(order.items.len(), 1);
        let item = order.items.first().expect("one item");
        assert_eq!(item.name, "Tsinelas");
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn builder_keeps_fallback_lines_visible() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(42), 1);
        let resolved = cart.resolve(&HashMap::new());

        let order = NewOrder::from_resolved(
            UserId::new(7),
            "Maria Santos".to_owned(),
            "123 Mabini St, Manila".to_owned(),
            PaymentMethod::EWallet,
            &resolved,
        );

        let item = order.items.first().expect("one item");
        assert_eq!(item.name, UNKNOWN_PRODUCT_NAME);
        assert_eq!(order.total, Decimal::ZERO);
    }

    #[test]
    fn each_order_gets_a_fresh_id() {
        let cart = Cart::new();
        let resolved = cart.resolve(&HashMap::new());
        let a = NewOrder::from_resolved(
            UserId::new(1),
            "A".to_owned(),
            "addr".to_owned(),
            PaymentMethod::Points,
            &resolved,
        );
        let b = NewOrder::from_resolved(
            UserId::new(1),
            "A".to_owned(),
            "addr".to_owned(),
            PaymentMethod::Points,
            &resolved,
        );
        assert_ne!(a.id, b.id);
    }
}
