//! Catalog product model.

use serde::{Deserialize, Serialize};

use sari_core::{Price, ProductId};

/// A catalog product.
///
/// The catalog is static from the shop's point of view: rows are seeded by
/// the CLI and never mutated by the service, which is why cached reads are
/// safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
}
