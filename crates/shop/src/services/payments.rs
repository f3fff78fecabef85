//! Payment-link API client.
//!
//! Creates hosted checkout links with the payment provider. The provider
//! authenticates with HTTP basic auth where the secret key is the username
//! and the password is empty; amounts are sent in centavos. Responses
//! carry either an `errors` array or the link attributes.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use sari_core::Price;

use crate::config::PaymentsConfig;

/// Errors that can occur when talking to the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to interpret the provider's response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A created payment link.
#[derive(Debug, Clone)]
pub struct PaymentLink {
    /// Provider-side link id.
    pub id: String,
    /// Hosted checkout page to open in the shopper's browser.
    pub checkout_url: String,
}

/// Payment-link API client.
#[derive(Clone)]
pub struct PaymentLinkClient {
    client: reqwest::Client,
    base_url: String,
    currency: String,
    redirect_success: String,
    redirect_failed: String,
}

impl PaymentLinkClient {
    /// Create a new payment-link client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentsConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        // Basic auth: secret key as username, empty password
        let credential = BASE64.encode(format!("{}:", config.secret_key.expose_secret()));
        let mut auth_value = HeaderValue::from_str(&format!("Basic {credential}"))
            .map_err(|e| PaymentError::Parse(format!("Invalid secret key format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert("Authorization", auth_value);

        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            currency: config.currency.clone(),
            redirect_success: config.redirect_success.clone(),
            redirect_failed: config.redirect_failed.clone(),
        })
    }

    /// Create a payment link for an amount.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the provider reports errors, or
    /// the response carries no checkout URL.
    pub async fn create_link(
        &self,
        amount: &Price,
        description: &str,
    ) -> Result<PaymentLink, PaymentError> {
        let url = format!("{}/links", self.base_url);
        let body = link_request_body(
            amount.in_minor_units(),
            &self.currency,
            description,
            &self.redirect_success,
            &self.redirect_failed,
        );

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        parse_link_response(status.as_u16(), &text)
    }
}

/// Build the link-creation request body.
fn link_request_body(
    amount: i64,
    currency: &str,
    description: &str,
    redirect_success: &str,
    redirect_failed: &str,
) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "attributes": {
                "amount": amount,
                "currency": currency,
                "description": description,
                "redirect": {
                    "success": redirect_success,
                    "failed": redirect_failed,
                }
            }
        }
    })
}

/// Response envelope: a link on success, an errors array otherwise.
#[derive(Debug, Deserialize)]
struct LinkResponse {
    data: Option<LinkResource>,
    errors: Option<Vec<ApiErrorDetail>>,
}

#[derive(Debug, Deserialize)]
struct LinkResource {
    id: String,
    attributes: LinkAttributes,
}

#[derive(Debug, Deserialize)]
struct LinkAttributes {
    checkout_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    detail: String,
}

/// Interpret a provider response body.
fn parse_link_response(status: u16, body: &str) -> Result<PaymentLink, PaymentError> {
    let parsed: LinkResponse =
        serde_json::from_str(body).map_err(|e| PaymentError::Parse(e.to_string()))?;

    if let Some(errors) = parsed.errors
        && !errors.is_empty()
    {
        let message = errors
            .iter()
            .map(|e| {
                if e.code.is_empty() {
                    e.detail.clone()
                } else {
                    format!("{}: {}", e.code, e.detail)
                }
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err(PaymentError::Api { status, message });
    }

    if !(200..300).contains(&status) {
        return Err(PaymentError::Api {
            status,
            message: body.to_owned(),
        });
    }

    let resource = parsed
        .data
        .ok_or_else(|| PaymentError::Parse("response has neither data nor errors".to_owned()))?;

    let checkout_url = resource
        .attributes
        .checkout_url
        .ok_or_else(|| PaymentError::Parse("link has no checkout_url".to_owned()))?;

    Ok(PaymentLink {
        id: resource.id,
        checkout_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_amount_currency_and_redirects() {
        let body = link_request_body(
            20_000,
            "PHP",
            "Order 123",
            "https://shop.example/payments/success",
            "https://shop.example/payments/failed",
        );

        let attributes = &body["data"]["attributes"];
        assert_eq!(attributes["amount"], 20_000);
        assert_eq!(attributes["currency"], "PHP");
        assert_eq!(attributes["description"], "Order 123");
        assert_eq!(
            attributes["redirect"]["success"],
            "https://shop.example/payments/success"
        );
        assert_eq!(
            attributes["redirect"]["failed"],
            "https://shop.example/payments/failed"
        );
    }

    #[test]
    fn successful_response_yields_checkout_url() {
        let body = r#"{
            "data": {
                "id": "link_abc123",
                "attributes": {
                    "checkout_url": "https://pay.example/link_abc123",
                    "status": "unpaid"
                }
            }
        }"#;

        let link = parse_link_response(200, body).expect("parses");
        assert_eq!(link.id, "link_abc123");
        assert_eq!(link.checkout_url, "https://pay.example/link_abc123");
    }

    #[test]
    fn error_list_is_surfaced_as_api_error() {
        let body = r#"{
            "errors": [
                {"code": "parameter_below_minimum", "detail": "amount must be at least 100"}
            ]
        }"#;

        let err = parse_link_response(400, body).expect_err("errors reported");
        match err {
            PaymentError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("parameter_below_minimum"));
                assert!(message.contains("amount must be at least 100"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_checkout_url_is_a_parse_error() {
        let body = r#"{"data": {"id": "link_abc", "attributes": {}}}"#;
        assert!(matches!(
            parse_link_response(200, body),
            Err(PaymentError::Parse(_))
        ));
    }

    #[test]
    fn non_json_body_is_a_parse_error() {
        assert!(matches!(
            parse_link_response(502, "<html>bad gateway</html>"),
            Err(PaymentError::Parse(_))
        ));
    }
}
