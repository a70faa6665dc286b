//! GCP service account authentication
//!
//! Exchanges a signed RS256 JWT for an OAuth2 access token and caches it
//! until shortly before expiry.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use tokio::sync::RwLock;

use crate::error::{Error, Result};

const SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(serde::Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// GCP authentication manager
pub struct GcpAuth {
    key_path: String,
    key: ServiceAccountKey,
    project_id: String,
    http: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
}

impl GcpAuth {
    /// Load a service account JSON key file
    pub fn from_service_account(key_path: impl AsRef<Path>, project_id: String) -> Result<Self> {
        let key_path = key_path.as_ref().to_string_lossy().to_string();
        let content = std::fs::read_to_string(&key_path).map_err(|e| {
            Error::Config(format!(
                "Failed to read service account key {}: {}",
                key_path, e
            ))
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid service account key format: {}", e)))?;

        Ok(Self {
            key_path,
            key,
            project_id,
            http: reqwest::Client::new(),
            token: RwLock::new(None),
        })
    }

    /// Get project ID
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Path of the key file this manager was loaded from
    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    /// Get a valid access token (refreshing if needed)
    pub async fn get_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if let Some(ref cached) = *token {
                if cached.expires_at > Utc::now() + Duration::seconds(60) {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let fresh = self.refresh_token().await?;
        let access_token = fresh.access_token.clone();
        *self.token.write().await = Some(fresh);
        Ok(access_token)
    }

    fn signed_jwt(&self, now: i64) -> Result<String> {
        let claims = serde_json::json!({
            "iss": self.key.client_email,
            "scope": SCOPE,
            "aud": self.key.token_uri,
            "iat": now,
            "exp": now + 3600,
        });

        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(r#"{"alg":"RS256","typ":"JWT"}"#.as_bytes());
        let payload = engine.encode(claims.to_string().as_bytes());
        let signing_input = format!("{}.{}", header, payload);

        let private_key = self.key.private_key.replace("\\n", "\n");
        let pem = pem::parse(&private_key)
            .map_err(|e| Error::Config(format!("Failed to parse private key PEM: {}", e)))?;
        let key_pair = ring::signature::RsaKeyPair::from_pkcs8(pem.contents())
            .map_err(|e| Error::Config(format!("Failed to parse private key: {:?}", e)))?;

        let mut signature = vec![0u8; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &ring::signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|e| Error::Config(format!("Failed to sign JWT: {:?}", e)))?;

        Ok(format!("{}.{}", signing_input, engine.encode(&signature)))
    }

    async fn refresh_token(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let jwt = self.signed_jwt(now.timestamp())?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::provider(format!("Token exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(format!(
                "Token exchange failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("Failed to parse token response: {}", e)))?;

        tracing::debug!("Refreshed GCP access token for {}", self.key.client_email);

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}
