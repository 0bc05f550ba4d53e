//! Key Vault secret client
//!
//! Fetches `GET {vault_url}/secrets/{name}?api-version=7.4` and reads the
//! `value` field of the returned secret bundle.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{AuthError, SecretProvider};

const API_VERSION: &str = "7.4";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: String,
}

#[derive(Debug, Clone)]
pub struct KeyVaultSecretProvider {
    client: reqwest::Client,
    vault_url: String,
    token: Option<String>,
}

impl KeyVaultSecretProvider {
    pub fn new(vault_url: impl Into<String>, token: Option<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            vault_url: vault_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn secret_url(&self, name: &str) -> String {
        format!(
            "{}/secrets/{}?api-version={}",
            self.vault_url, name, API_VERSION
        )
    }
}

#[async_trait]
impl SecretProvider for KeyVaultSecretProvider {
    #[instrument(skip(self), fields(vault = %self.vault_url))]
    async fn get_secret(&self, name: &str) -> Result<String, AuthError> {
        let mut request = self.client.get(self.secret_url(name));

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {},
            StatusCode::NOT_FOUND => return Err(AuthError::NotFound(name.to_string())),
            status => {
                return Err(AuthError::Rejected {
                    name: name.to_string(),
                    status: status.as_u16(),
                })
            },
        }

        let bundle: SecretBundle = response.json().await.map_err(|e| AuthError::Malformed {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        debug!("Secret retrieved");

        Ok(bundle.value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    #[tokio::test]
    async fn test_get_secret_sends_token_and_api_version() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/secrets/storage-key"))
            .and(query_param("api-version", "7.4"))
            .and(header("authorization", "Bearer vault-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": "account-key",
                "id": "https://vault/secrets/storage-key/1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            KeyVaultSecretProvider::new(format!("{}/", server.uri()), Some("vault-token".into()))
                .unwrap();

        assert_eq!(provider.get_secret("storage-key").await.unwrap(), "account-key");
    }

    #[tokio::test]
    async fn test_unknown_secret_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/secrets/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = KeyVaultSecretProvider::new(server.uri(), None).unwrap();

        assert_eq!(
            provider.get_secret("missing").await.unwrap_err(),
            AuthError::NotFound("missing".to_string())
        );
    }

    #[tokio::test]
    async fn test_forbidden_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let provider = KeyVaultSecretProvider::new(server.uri(), None).unwrap();

        assert_eq!(
            provider.get_secret("storage-key").await.unwrap_err(),
            AuthError::Rejected {
                name: "storage-key".to_string(),
                status: 403
            }
        );
    }

    #[tokio::test]
    async fn test_body_without_value_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "x" })))
            .mount(&server)
            .await;

        let provider = KeyVaultSecretProvider::new(server.uri(), None).unwrap();

        assert!(matches!(
            provider.get_secret("storage-key").await,
            Err(AuthError::Malformed { .. })
        ));
    }
}
