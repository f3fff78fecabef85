//! Object storage client for profile photos.
//!
//! Photos are uploaded with a plain HTTP PUT, keyed by user id so a
//! re-upload replaces the previous photo instead of accumulating objects.
//! The returned public URL is what gets written to the profile record.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;

use sari_core::UserId;

use crate::config::MediaConfig;

/// Errors that can occur when talking to object storage.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage returned an error response.
    #[error("storage error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Client configuration was unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Object storage client for profile photos.
#[derive(Clone)]
pub struct MediaStorageClient {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    public_base_url: String,
}

impl MediaStorageClient {
    /// Create a new media storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.access_token.expose_secret());
        let mut auth_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| MediaError::Config(format!("invalid access token: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert("Authorization", auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Upload a profile photo and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns error if the upload request fails or storage rejects it.
    pub async fn upload_profile_photo(
        &self,
        user_id: UserId,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, MediaError> {
        let url = format!(
            "{}/{}/{}",
            self.endpoint,
            self.bucket,
            object_key(user_id)
        );

        let response = self
            .client
            .put(&url)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(self.public_url(user_id))
    }

    /// The public URL a photo will be served from after upload.
    #[must_use]
    pub fn public_url(&self, user_id: UserId) -> String {
        format!("{}/{}", self.public_base_url, object_key(user_id))
    }
}

/// Storage key for a user's profile photo.
fn object_key(user_id: UserId) -> String {
    format!("profile-photos/{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_is_stable_per_user() {
        assert_eq!(object_key(UserId::new(42)), "profile-photos/42");
    }

    #[test]
    fn public_url_joins_base_and_key() {
        let config = MediaConfig {
            endpoint: "https://storage.example.net".to_owned(),
            bucket: "profile-media".to_owned(),
            public_base_url: "https://cdn.example.net/profile-media/".to_owned(),
            access_token: secrecy::SecretString::from("tok"),
        };
        let client = MediaStorageClient::new(&config).expect("builds");

        assert_eq!(
            client.public_url(UserId::new(7)),
            "https://cdn.example.net/profile-media/profile-photos/7"
        );
    }
}
