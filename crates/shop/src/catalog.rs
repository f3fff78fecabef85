//! Cached read access to the product catalog.
//!
//! The catalog is seeded once and treated as read-only by the service, so
//! a short-lived in-memory cache in front of the product table is safe and
//! keeps cart and review rendering off the database.

use std::collections::HashMap;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use sari_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::Product;

/// Maximum number of products held in memory.
const CACHE_CAPACITY: u64 = 1024;

/// How long a cached product lives before being re-read.
const CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Cached product lookups.
#[derive(Clone)]
pub struct Catalog {
    cache: Cache<ProductId, Product>,
}

impl Catalog {
    /// Create an empty catalog cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// Look up one product, hitting the database only on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn get(
        &self,
        pool: &PgPool,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        if let Some(product) = self.cache.get(&id).await {
            return Ok(Some(product));
        }

        let product = ProductRepository::new(pool).get(id).await?;
        if let Some(ref product) = product {
            self.cache.insert(id, product.clone()).await;
        }
        Ok(product)
    }

    /// Look up a batch of products, e.g. every cart line at once.
    ///
    /// Missing ids are simply absent from the map; the caller renders the
    /// catalog fallbacks for them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any database read fails.
    pub async fn get_many(
        &self,
        pool: &PgPool,
        ids: impl IntoIterator<Item = ProductId>,
    ) -> Result<HashMap<ProductId, Product>, RepositoryError> {
        let mut products = HashMap::new();
        for id in ids {
            if let Some(product) = self.get(pool, id).await? {
                products.insert(id, product);
            }
        }
        Ok(products)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
