//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices arrive as currency-prefixed strings ("Php100.00"); all
//! arithmetic happens on [`rust_decimal::Decimal`] so totals never pick up
//! float error.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The numeric part could not be parsed.
    #[error("invalid price amount: {0}")]
    InvalidAmount(String),
    /// The currency code is not one we support.
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),
}

/// ISO 4217 currency codes supported by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    PHP,
    USD,
}

impl CurrencyCode {
    /// The prefix used in display strings ("Php100.00", "$4.99").
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::PHP => "Php",
            Self::USD => "$",
        }
    }

    /// The ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PHP => "PHP",
            Self::USD => "USD",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PHP" => Ok(Self::PHP),
            "USD" => Ok(Self::USD),
            other => Err(PriceError::UnknownCurrency(other.to_owned())),
        }
    }
}

/// A monetary amount with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (pesos, not centavos).
    amount: Decimal,
    /// ISO 4217 currency code.
    currency: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Parse a currency-prefixed price string such as `"Php100.00"`.
    ///
    /// A bare numeric string is accepted and treated as the default
    /// currency, matching how catalog rows without a prefix are stored.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if the input is empty or the numeric part is
    /// not a valid decimal.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }

        for currency in [CurrencyCode::PHP, CurrencyCode::USD] {
            if let Some(rest) = s.strip_prefix(currency.symbol()) {
                let amount = rest
                    .trim()
                    .parse::<Decimal>()
                    .map_err(|_| PriceError::InvalidAmount(s.to_owned()))?;
                return Ok(Self::new(amount, currency));
            }
        }

        let amount = s
            .parse::<Decimal>()
            .map_err(|_| PriceError::InvalidAmount(s.to_owned()))?;
        Ok(Self::new(amount, CurrencyCode::default()))
    }

    /// The amount in the currency's standard unit.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// The currency.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Multiply by a quantity, e.g. a cart line count.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency)
    }

    /// The amount rounded to two decimal places.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount.round_dp(2)
    }

    /// The amount in the currency's minor unit (centavos), for the payment
    /// provider which only accepts integer amounts.
    #[must_use]
    pub fn in_minor_units(&self) -> i64 {
        (self.amount * Decimal::from(100))
            .round()
            .to_i64()
            .unwrap_or(0)
    }

    /// Bare two-decimal amount string without the currency prefix, e.g.
    /// `"200.00"`.
    #[must_use]
    pub fn amount_display(&self) -> String {
        format!("{:.2}", self.rounded())
    }

    /// Currency-prefixed display string, e.g. `"Php200.00"`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{}", self.currency.symbol(), self.amount_display())
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("valid decimal literal")
    }

    #[test]
    fn parses_php_prefixed_price() {
        let price = Price::parse("Php100.00").expect("parses");
        assert_eq!(price.amount(), dec("100.00"));
        assert_eq!(price.currency(), CurrencyCode::PHP);
    }

    #[test]
    fn parses_usd_prefixed_price() {
        let price = Price::parse("$4.99").expect("parses");
        assert_eq!(price.amount(), dec("4.99"));
        assert_eq!(price.currency(), CurrencyCode::USD);
    }

    #[test]
    fn parses_bare_amount_as_default_currency() {
        let price = Price::parse("250").expect("parses");
        assert_eq!(price.currency(), CurrencyCode::PHP);
        assert_eq!(price.amount(), dec("250"));
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(matches!(Price::parse(""), Err(PriceError::Empty)));
        assert!(matches!(
            Price::parse("Phpabc"),
            Err(PriceError::InvalidAmount(_))
        ));
        assert!(matches!(
            Price::parse("free"),
            Err(PriceError::InvalidAmount(_))
        ));
    }

    #[test]
    fn times_scales_the_amount() {
        let price = Price::parse("Php100.00").expect("parses");
        assert_eq!(price.times(2).amount(), dec("200.00"));
    }

    #[test]
    fn amount_display_is_two_decimals() {
        let price = Price::new(dec("200"), CurrencyCode::PHP);
        assert_eq!(price.amount_display(), "200.00");

        let price = Price::new(dec("99.999"), CurrencyCode::PHP);
        assert_eq!(price.amount_display(), "100.00");
    }

    #[test]
    fn display_includes_currency_prefix() {
        let price = Price::new(dec("1250.5"), CurrencyCode::PHP);
        assert_eq!(price.display(), "Php1250.50");
    }

    #[test]
    fn minor_units_are_centavos() {
        let price = Price::parse("Php100.00").expect("parses");
        assert_eq!(price.in_minor_units(), 10_000);

        let price = Price::parse("Php0.50").expect("parses");
        assert_eq!(price.in_minor_units(), 50);
    }
}
