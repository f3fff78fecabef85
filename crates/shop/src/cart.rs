//! Session-held shopping cart.
//!
//! The cart is quantity-per-product-id and lives in the session; prices are
//! never stored in it. Totals are resolved against the catalog at the
//! moment they are needed, so the charged amount always reflects the
//! catalog at placement time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use sari_core::{CurrencyCode, Price, ProductId};

use crate::models::Product;

/// Fallback name for a cart line whose product vanished from the catalog.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// Fallback description for a cart line whose product vanished.
pub const UNKNOWN_PRODUCT_DESCRIPTION: &str = "N/A";

/// One cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The cart: one line per product id, insertion-ordered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The cart lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total unit count across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Add `quantity` units of a product, merging into an existing line.
    ///
    /// A zero quantity is treated as one unit; a line's quantity is always
    /// at least 1.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) {
        let quantity = quantity.max(1);
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = item.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem {
                product_id,
                quantity,
            });
        }
    }

    /// Set the quantity of an existing line; zero removes it.
    ///
    /// Returns `false` if the product has no line in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns `false` if it was not present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    /// Drop all lines.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Resolve the cart against catalog products.
    ///
    /// Lines whose product is missing from the map get the catalog
    /// fallbacks and a zero unit price, so they are visible but contribute
    /// nothing to the total. The total is the sum of line totals rounded
    /// to two decimal places.
    #[must_use]
    pub fn resolve(&self, products: &HashMap<ProductId, Product>) -> ResolvedCart {
        let currency = self
            .items
            .iter()
            .find_map(|i| products.get(&i.product_id))
            .map_or_else(CurrencyCode::default, |p| p.price.currency());

        let lines: Vec<ResolvedLine> = self
            .items
            .iter()
            .map(|item| match products.get(&item.product_id) {
                Some(product) => ResolvedLine {
                    product_id: item.product_id,
                    name: product.name.clone(),
                    description: product.description.clone(),
                    quantity: item.quantity,
                    unit_price: product.price,
                    line_total: product.price.times(item.quantity),
                },
                None => ResolvedLine {
                    product_id: item.product_id,
                    name: UNKNOWN_PRODUCT_NAME.to_owned(),
                    description: UNKNOWN_PRODUCT_DESCRIPTION.to_owned(),
                    quantity: item.quantity,
                    unit_price: Price::zero(currency),
                    line_total: Price::zero(currency),
                },
            })
            .collect();

        let total = lines
            .iter()
            .fold(rust_decimal::Decimal::ZERO, |acc, line| {
                acc + line.line_total.amount()
            })
            .round_dp(2);

        ResolvedCart {
            lines,
            total: Price::new(total, currency),
        }
    }
}

/// A cart line with its catalog data attached.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedLine {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// The cart resolved against the catalog, with its computed total.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedCart {
    pub lines: Vec<ResolvedLine>,
    pub total: Price,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i32, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: format!("Description {id}"),
            price: Price::parse(price).expect("valid price"),
            image_url: None,
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<ProductId, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn add_merges_lines_for_the_same_product() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(1), 3);
        cart.add(ProductId::new(2), 1);

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.total_quantity(), 6);
    }

    #[test]
    fn add_clamps_zero_quantity_to_one() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 0);
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn set_quantity_zero_removes_the_line() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2);
        assert!(cart.set_quantity(ProductId::new(1), 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn set_quantity_on_missing_line_reports_absence() {
        let mut cart = Cart::new();
        assert!(!cart.set_quantity(ProductId::new(9), 3));
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        // cart = [{id:1, qty:2}], price("Php100.00") -> total "200.00"
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2);

        let resolved = cart.resolve(&catalog(vec![product(1, "Php100.00")]));
        assert_eq!(resolved.total.amount_display(), "200.00");
        assert_eq!(resolved.total.currency(), CurrencyCode::PHP);
    }

    #[test]
    fn total_spans_multiple_lines() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(2), 3);

        let resolved = cart.resolve(&catalog(vec![
            product(1, "Php100.00"),
            product(2, "Php49.50"),
        ]));
        assert_eq!(resolved.total.amount_display(), "348.50");
    }

    #[test]
    fn missing_products_fall_back_and_cost_nothing() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(99), 4);

        let resolved = cart.resolve(&catalog(vec![product(1, "Php100.00")]));
        assert_eq!(resolved.total.amount_display(), "200.00");

        let dangling = resolved
            .lines
            .iter()
            .find(|l| l.product_id == ProductId::new(99))
            .expect("dangling line present");
        assert_eq!(dangling.name, UNKNOWN_PRODUCT_NAME);
        assert_eq!(dangling.description, UNKNOWN_PRODUCT_DESCRIPTION);
        assert_eq!(dangling.line_total.amount(), rust_decimal::Decimal::ZERO);
    }

    #[test]
    fn empty_cart_resolves_to_zero_total() {
        let cart = Cart::new();
        let resolved = cart.resolve(&HashMap::new());
        assert!(resolved.lines.is_empty());
        assert_eq!(resolved.total.amount_display(), "0.00");
    }
}
