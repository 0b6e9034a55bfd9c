//! Google OAuth helpers: PKCE, authorization URLs, token exchange, revocation.
//!
//! Tokens are never logged or displayed in full.

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::Config;

/// Local OAuth callback path (port is dynamic).
pub const LOCAL_CALLBACK_PATH: &str = "/oauth2callback";

/// OAuth scopes requested on sign-in. Birthday data needs its own scope
/// beyond the basic identity ones.
pub const SCOPES: &str = "email profile https://www.googleapis.com/auth/user.birthday.read https://www.googleapis.com/auth/userinfo.profile";

/// PKCE code verifier and challenge
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

/// Bearer tokens returned by a code exchange. The credential lives for one
/// fetch and is never refreshed, so only the access and identity tokens are
/// kept.
#[derive(Debug, Clone)]
pub struct BearerTokens {
    /// Short-lived access token.
    pub access: String,
    /// OpenID Connect identity token, when identity scopes were granted.
    pub id_token: Option<String>,
}

/// Generate PKCE code verifier and challenge
pub fn generate_pkce() -> Pkce {
    // Use two UUIDs (16 bytes each) to get 32 random bytes
    let uuid1 = uuid::Uuid::new_v4();
    let uuid2 = uuid::Uuid::new_v4();
    let mut verifier_bytes = [0u8; 32];
    verifier_bytes[..16].copy_from_slice(uuid1.as_bytes());
    verifier_bytes[16..].copy_from_slice(uuid2.as_bytes());
    let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

    Pkce {
        verifier,
        challenge,
    }
}

/// Build the authorization URL for Google OAuth
pub fn build_auth_url(config: &Config, pkce: &Pkce, state: &str, redirect_uri: &str) -> String {
    let params = [
        ("response_type", "code"),
        ("client_id", config.oauth.client_id.as_str()),
        ("redirect_uri", redirect_uri),
        ("scope", SCOPES),
        ("code_challenge", &pkce.challenge),
        ("code_challenge_method", "S256"),
        ("state", state),
        ("access_type", "offline"),
        ("prompt", "consent"),
    ];

    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();

    format!("{}?{query}", config.endpoints.authorize_url)
}

/// Builds the redirect URI for a given localhost port.
pub fn build_redirect_uri(port: u16) -> String {
    format!("http://localhost:{port}{LOCAL_CALLBACK_PATH}")
}

/// Generates a random high localhost port for OAuth callbacks.
pub fn random_local_port() -> u16 {
    let id = uuid::Uuid::new_v4();
    let bytes = id.as_bytes();
    let raw = u16::from_le_bytes([bytes[0], bytes[1]]);
    49152 + (raw % 16384)
}

/// Parses a pasted authorization input into code + optional state.
pub fn parse_authorization_input(input: &str) -> (Option<String>, Option<String>) {
    let value = input.trim();
    if value.is_empty() {
        return (None, None);
    }

    if let Ok(url) = url::Url::parse(value) {
        let code = url.query_pairs().find(|(k, _)| k == "code").map(|(_, v)| v);
        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v);
        return (code.map(|v| v.to_string()), state.map(|v| v.to_string()));
    }

    if value.contains("code=") {
        let params = url::form_urlencoded::parse(value.as_bytes()).collect::<Vec<_>>();
        let code = params.iter().find(|(k, _)| k == "code").map(|(_, v)| v);
        let state = params.iter().find(|(k, _)| k == "state").map(|(_, v)| v);
        return (
            code.map(std::string::ToString::to_string),
            state.map(std::string::ToString::to_string),
        );
    }

    (Some(value.to_string()), None)
}

/// Exchanges an authorization code for bearer tokens.
///
/// `verifier` is the PKCE verifier for codes obtained through the
/// interactive browser flow; server auth codes minted elsewhere are
/// exchanged without one and with an empty redirect URI.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn exchange_code(
    config: &Config,
    auth_code: &str,
    verifier: Option<&str>,
    redirect_uri: &str,
) -> Result<BearerTokens> {
    let client = reqwest::Client::new();
    // The serializer is not Send; finish it before the await so the
    // future stays spawnable.
    let body = {
        let mut body = url::form_urlencoded::Serializer::new(String::new());
        body.append_pair("grant_type", "authorization_code")
            .append_pair("client_id", &config.oauth.client_id)
            .append_pair("client_secret", &config.oauth.client_secret)
            .append_pair("code", auth_code)
            .append_pair("redirect_uri", redirect_uri);
        if let Some(verifier) = verifier {
            body.append_pair("code_verifier", verifier);
        }
        body.finish()
    };

    let response = client
        .post(&config.endpoints.token_url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await
        .context("Failed to send token exchange request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Token exchange failed (HTTP {status}): {body}");
    }

    let token_data: TokenResponse = response
        .json()
        .await
        .context("Failed to parse token response")?;

    Ok(BearerTokens {
        access: token_data.access_token,
        id_token: token_data.id_token,
    })
}

/// Revokes an access or refresh token.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn revoke_token(config: &Config, token: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("token", token)
        .finish();

    let response = client
        .post(&config.endpoints.revoke_url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await
        .context("Failed to send token revocation request")?;

    if !response.status().is_success() {
        let status = response.status();
        anyhow::bail!("Token revocation failed (HTTP {status})");
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    id_token: Option<String>,
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}
