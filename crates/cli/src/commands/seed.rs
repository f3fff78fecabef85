//! Catalog seeding command.
//!
//! Inserts the demo product catalog. The shop treats the catalog as
//! read-only, so this is the only writer; re-running is safe because
//! existing rows are left untouched.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use sari_core::Price;

/// A catalog row to seed: name, description, currency-prefixed price.
const DEMO_PRODUCTS: &[(&str, &str, &str)] = &[
    ("Tsinelas", "Rubber slippers, all sizes", "Php149.00"),
    ("Banig Mat", "Handwoven sleeping mat", "Php899.00"),
    ("Kapeng Barako", "Ground coffee, 500g", "Php325.00"),
    ("Dried Mangoes", "Cebu dried mangoes, 200g", "Php185.50"),
    ("Abaca Bag", "Handmade abaca tote", "Php1250.00"),
    ("Barong Tagalog", "Embroidered formal shirt", "Php5500.00"),
];

/// Errors from seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid seed price for {name}: {source}")]
    InvalidPrice {
        name: &'static str,
        source: sari_core::PriceError,
    },
}

/// Seed the demo product catalog.
///
/// # Errors
///
/// Returns an error if the database URL is missing, a seed price fails to
/// parse, or an insert fails.
pub async fn products() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;

    tracing::info!("Connecting to shop database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let mut inserted = 0_u32;
    for &(name, description, price_str) in DEMO_PRODUCTS {
        let price = Price::parse(price_str).map_err(|source| SeedError::InvalidPrice {
            name,
            source,
        })?;

        let result = sqlx::query(
            r"
            INSERT INTO shop.product (name, description, price, currency)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM shop.product WHERE name = $1)
            ",
        )
        .bind(name)
        .bind(description)
        .bind(price.amount())
        .bind(price.currency().code())
        .execute(&pool)
        .await?;

        inserted += u32::try_from(result.rows_affected()).unwrap_or(0);
    }

    tracing::info!(inserted, "Catalog seed complete");
    Ok(())
}

fn database_url() -> Result<SecretString, SeedError> {
    std::env::var("SHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| SeedError::MissingEnvVar("SHOP_DATABASE_URL"))
}
