//! End-to-end checkout workflow logic: wizard transitions, cart
//! resolution, and order building composed the way the place handler
//! composes them.

use std::collections::HashMap;

use sari_core::{
    AddressId, CurrencyCode, PaymentMethod, Price, ProductId, UserId, loyalty,
};
use sari_shop::cart::{Cart, UNKNOWN_PRODUCT_DESCRIPTION, UNKNOWN_PRODUCT_NAME};
use sari_shop::checkout::{CheckoutError, CheckoutState, CheckoutStep};
use sari_shop::models::{NewOrder, Product};

fn product(id: i32, name: &str, price: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        description: format!("{name} description"),
        price: Price::parse(price).expect("valid seed price"),
        image_url: None,
    }
}

fn catalog(products: Vec<Product>) -> HashMap<ProductId, Product> {
    products.into_iter().map(|p| (p.id, p)).collect()
}

// =============================================================================
// Wizard walk
// =============================================================================

#[test]
fn wizard_requires_each_step_to_complete_before_advancing() {
    let mut wizard = CheckoutState::new();

    // Address step gates on a selection.
    assert_eq!(wizard.advance(), Err(CheckoutError::AddressRequired));
    wizard.select_address(AddressId::generate());
    assert_eq!(wizard.advance(), Ok(CheckoutStep::Delivery));

    // Delivery step gates on a method.
    assert_eq!(wizard.advance(), Err(CheckoutError::MethodRequired));
    wizard
        .choose_method(PaymentMethod::CashOnDelivery)
        .expect("at delivery step");
    assert_eq!(wizard.advance(), Ok(CheckoutStep::Review));

    assert!(wizard.ready_to_place());
}

#[test]
fn deleting_the_selected_address_forces_reselection() {
    let mut wizard = CheckoutState::new();
    let selected = AddressId::generate();
    wizard.select_address(selected);
    wizard.advance().expect("to delivery");
    wizard
        .choose_method(PaymentMethod::EWallet)
        .expect("at delivery step");
    wizard.advance().expect("to review");

    // The selected address disappears mid-checkout.
    wizard.address_removed(selected);

    assert_eq!(wizard.selected_address(), None);
    assert_eq!(wizard.step(), CheckoutStep::Address);
    assert!(!wizard.ready_to_place());
    assert_eq!(wizard.advance(), Err(CheckoutError::AddressRequired));
}

#[test]
fn revisiting_the_address_step_keeps_the_chosen_method() {
    let mut wizard = CheckoutState::new();
    wizard.select_address(AddressId::generate());
    wizard.advance().expect("to delivery");
    wizard
        .choose_method(PaymentMethod::Points)
        .expect("at delivery step");

    wizard.back_to_address();
    assert_eq!(wizard.step(), CheckoutStep::Address);
    assert_eq!(wizard.method(), Some(PaymentMethod::Points));

    // And the walk forward is short the second time.
    wizard.advance().expect("to delivery");
    wizard.advance().expect("to review");
    assert!(wizard.ready_to_place());
}

// =============================================================================
// Order building
// =============================================================================

#[test]
fn order_total_is_recomputed_from_the_catalog_at_placement() {
    let mut cart = Cart::new();
    cart.add(ProductId::new(1), 2);

    // Price at cart-add time...
    let before = cart.resolve(&catalog(vec![product(1, "Tsinelas", "Php100.00")]));
    assert_eq!(before.total.amount_display(), "200.00");

    // ...the catalog drifts before placement; the order charges the
    // current price, not the remembered one.
    let after = cart.resolve(&catalog(vec![product(1, "Tsinelas", "Php120.00")]));
    let order = NewOrder::from_resolved(
        UserId::new(1),
        "Maria Santos".to_owned(),
        "123 Mabini St".to_owned(),
        PaymentMethod::CashOnDelivery,
        &after,
    );

    assert_eq!(order.total, "240.00".parse().expect("decimal"));
}

#[test]
fn order_lines_copy_catalog_fields_with_fallbacks_for_dangling_ids() {
    let mut cart = Cart::new();
    cart.add(ProductId::new(1), 1);
    cart.add(ProductId::new(404), 3);

    let resolved = cart.resolve(&catalog(vec![product(1, "Banig Mat", "Php899.00")]));
    let order = NewOrder::from_resolved(
        UserId::new(1),
        "Maria Santos".to_owned(),
        "123 Mabini St".to_owned(),
        PaymentMethod::EWallet,
        &resolved,
    );

    assert_eq!(order.items.len(), 2);

    let known = order
        .items
        .iter()
        .find(|i| i.product_id == ProductId::new(1))
        .expect("known line");
    assert_eq!(known.name, "Banig Mat");

    let dangling = order
        .items
        .iter()
        .find(|i| i.product_id == ProductId::new(404))
        .expect("dangling line");
    assert_eq!(dangling.name, UNKNOWN_PRODUCT_NAME);
    assert_eq!(dangling.description, UNKNOWN_PRODUCT_DESCRIPTION);
    assert_eq!(dangling.quantity, 3);

    // Dangling lines cost nothing.
    assert_eq!(order.total, "899.00".parse().expect("decimal"));
}

#[test]
fn payment_link_amount_matches_the_order_total_in_centavos() {
    let mut cart = Cart::new();
    cart.add(ProductId::new(1), 2);

    let resolved = cart.resolve(&catalog(vec![product(1, "Abaca Bag", "Php1250.00")]));
    let order = NewOrder::from_resolved(
        UserId::new(1),
        "Maria Santos".to_owned(),
        "123 Mabini St".to_owned(),
        PaymentMethod::EWallet,
        &resolved,
    );

    // The single payment link is created from the persisted total.
    let charged = Price::new(order.total, order.currency);
    assert_eq!(charged.in_minor_units(), 250_000);
    assert_eq!(charged.currency(), CurrencyCode::PHP);
}

#[test]
fn points_earned_come_from_the_recomputed_total() {
    let mut cart = Cart::new();
    cart.add(ProductId::new(1), 2);

    let resolved = cart.resolve(&catalog(vec![product(1, "Barong", "Php6250.00")]));
    let order = NewOrder::from_resolved(
        UserId::new(1),
        "Maria Santos".to_owned(),
        "123 Mabini St".to_owned(),
        PaymentMethod::CashOnDelivery,
        &resolved,
    );

    // total = 12500 -> 2 points
    assert_eq!(loyalty::points_earned(order.total), 2);
}

#[test]
fn cheap_orders_earn_no_points() {
    let mut cart = Cart::new();
    cart.add(ProductId::new(1), 1);

    let resolved = cart.resolve(&catalog(vec![product(1, "Tsinelas", "Php149.00")]));
    let order = NewOrder::from_resolved(
        UserId::new(1),
        "Maria Santos".to_owned(),
        "123 Mabini St".to_owned(),
        PaymentMethod::CashOnDelivery,
        &resolved,
    );

    assert_eq!(loyalty::points_earned(order.total), 0);
}
