use std::sync::Arc;

use async_trait::async_trait;
use grelay_provider_core::{AccessToken, RelayError, RelayResult, TokenExchanger};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use time::OffsetDateTime;

use crate::http_client::{ClientKind, HttpClientPool};

const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, serde::Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

#[derive(Debug, serde::Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchanges a GCP service-account key for an OAuth access token using the
/// JWT bearer grant.
#[derive(Debug, Clone)]
pub struct ServiceAccountExchanger {
    pool: Arc<HttpClientPool>,
}

impl ServiceAccountExchanger {
    pub fn new(pool: Arc<HttpClientPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenExchanger for ServiceAccountExchanger {
    async fn exchange(&self, credential: &str, proxy: Option<&str>) -> RelayResult<AccessToken> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let (sa, assertion) = sign_assertion(credential, now)?;
        let token_uri = sa.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
        let body = format!(
            "grant_type=urn:ietf:params:oauth:grant-type:jwt-bearer&assertion={}",
            urlencoding::encode(&assertion)
        );

        let client = self.pool.client(ClientKind::Impatient, proxy)?;
        let resp = client
            .post(token_uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|err| exchange_failed(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(exchange_failed(format!("oauth token failed: {status} {text}")));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| exchange_failed(err.to_string()))?;
        let token: OAuthTokenResponse =
            serde_json::from_slice(&bytes).map_err(|err| exchange_failed(err.to_string()))?;

        let expires_in = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        Ok(AccessToken {
            token: token.access_token,
            expires_at: OffsetDateTime::now_utc() + time::Duration::seconds(expires_in),
        })
    }
}

fn sign_assertion(credential: &str, now: i64) -> RelayResult<(ServiceAccountKey, String)> {
    let sa: ServiceAccountKey = serde_json::from_str(credential)
        .map_err(|err| exchange_failed(format!("invalid service account key: {err}")))?;
    let token_uri = sa.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
    let claims = JwtClaims {
        iss: &sa.client_email,
        scope: DEFAULT_SCOPE,
        aud: token_uri,
        exp: now + ASSERTION_LIFETIME_SECS,
        iat: now,
    };
    let mut header = Header::new(Algorithm::RS256);
    if !sa.private_key_id.trim().is_empty() {
        header.kid = Some(sa.private_key_id.clone());
    }
    let key = EncodingKey::from_rsa_pem(sa.private_key.as_bytes())
        .map_err(|err| exchange_failed(format!("invalid private key: {err}")))?;
    let jwt = jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|err| exchange_failed(err.to_string()))?;
    Ok((sa, jwt))
}

fn exchange_failed(message: impl Into<String>) -> RelayError {
    RelayError::credential("credential_exchange_failed", message)
}
