//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::Catalog;
use crate::config::ShopConfig;
use crate::services::media::{MediaError, MediaStorageClient};
use crate::services::payments::{PaymentError, PaymentLinkClient};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("payment client: {0}")]
    Payments(#[from] PaymentError),
    #[error("media client: {0}")]
    Media(#[from] MediaError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the pool, the external
/// service clients, and the catalog cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ShopConfig,
    pool: PgPool,
    payments: PaymentLinkClient,
    media: MediaStorageClient,
    catalog: Catalog,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if either external client cannot be constructed.
    pub fn new(config: ShopConfig, pool: PgPool) -> Result<Self, StateError> {
        let payments = PaymentLinkClient::new(&config.payments)?;
        let media = MediaStorageClient::new(&config.media)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                payments,
                media,
                catalog: Catalog::new(),
            }),
        })
    }

    /// Get a reference to the shop configuration.
    #[must_use]
    pub fn config(&self) -> &ShopConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the payment-link client.
    #[must_use]
    pub fn payments(&self) -> &PaymentLinkClient {
        &self.inner.payments
    }

    /// Get a reference to the media storage client.
    #[must_use]
    pub fn media(&self) -> &MediaStorageClient {
        &self.inner.media
    }

    /// Get a reference to the catalog cache.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }
}
