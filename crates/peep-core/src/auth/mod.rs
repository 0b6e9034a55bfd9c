//! Sign-in session management: PKCE sign-in flow, session cache, callback
//! listener, token exchange and revocation.

pub mod callback;
pub mod oauth;
pub mod session;

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tokio_util::sync::CancellationToken;

pub use session::{Account, SessionCache};

use crate::config::Config;

/// Outcome of one sign-in attempt. Produced exactly once per attempt and
/// never persisted.
#[derive(Debug, Clone)]
pub enum SignInResult {
    Success {
        /// The account identity, when already known.
        account: Option<Account>,
        /// One-time authorization code to hand to the profile fetcher.
        /// Absent codes are a logged anomaly, not a user-visible error.
        server_auth_code: Option<String>,
    },
    Failure {
        reason: String,
    },
}

/// An in-flight sign-in attempt: PKCE material plus callback coordinates.
///
/// Built on the UI thread, carried into the effect handler that drives the
/// browser leg of the flow.
#[derive(Debug, Clone)]
pub struct SignInAttempt {
    pub verifier: String,
    pub state: String,
    pub port: u16,
    pub redirect_uri: String,
    pub auth_url: String,
}

/// Prepares a sign-in attempt: PKCE pair, state nonce, callback port, and
/// the authorization URL to open in the browser.
pub fn begin_sign_in(config: &Config) -> SignInAttempt {
    let pkce = oauth::generate_pkce();
    let state = uuid::Uuid::new_v4().to_string();
    let port = oauth::random_local_port();
    let redirect_uri = oauth::build_redirect_uri(port);
    let auth_url = oauth::build_auth_url(config, &pkce, &state, &redirect_uri);

    SignInAttempt {
        verifier: pkce.verifier,
        state,
        port,
        redirect_uri,
        auth_url,
    }
}

/// Waits for the provider redirect and folds every failure into a
/// `SignInResult::Failure`.
///
/// The state nonce from the redirect must match the attempt's; a mismatch
/// means the code is not ours to use.
pub async fn await_callback(attempt: &SignInAttempt, cancel: &CancellationToken) -> SignInResult {
    match callback::wait_for_code(attempt.port, cancel).await {
        Ok(result) => {
            if result.state.as_deref() != Some(attempt.state.as_str()) {
                return SignInResult::Failure {
                    reason: "Sign-in state mismatch".to_string(),
                };
            }
            SignInResult::Success {
                account: None,
                server_auth_code: Some(result.code),
            }
        }
        Err(err) => SignInResult::Failure {
            reason: format!("{err:#}"),
        },
    }
}

/// Best-effort sign-out: revoke the token if we still hold one, then clear
/// the session cache. Revocation failures are logged, not surfaced.
///
/// # Errors
/// Returns an error if the session cache cannot be written.
pub async fn sign_out(config: &Config, access_token: Option<&str>) -> Result<()> {
    if let Some(token) = access_token
        && let Err(err) = oauth::revoke_token(config, token).await
    {
        tracing::warn!(
            token = %oauth::mask_token(token),
            "token revocation failed: {err:#}"
        );
    }

    let mut cache = SessionCache::load()?;
    cache.clear();
    cache.save()
}

/// Decodes the account identity from an OpenID Connect id_token payload.
///
/// No signature verification: the token arrived over TLS from the token
/// endpoint and is only used for display.
pub fn decode_account(id_token: &str) -> Option<Account> {
    let parts: Vec<&str> = id_token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let decoded = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    let json: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    let email = json.get("email")?.as_str()?.to_string();
    let display_name = json
        .get("name")
        .and_then(|v| v.as_str())
        .map(std::string::ToString::to_string);
    Some(Account {
        email,
        display_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.oauth.client_id = "cid".to_string();
        config.oauth.client_secret = "secret".to_string();
        config
    }

    /// Test: attempt preparation wires the redirect into the auth URL.
    #[test]
    fn test_begin_sign_in() {
        let attempt = begin_sign_in(&test_config());
        assert!(attempt.port >= 49152);
        assert!(attempt.redirect_uri.contains(&attempt.port.to_string()));
        assert!(attempt.auth_url.contains("code_challenge="));
        assert!(!attempt.verifier.is_empty());
        // The state nonce must ride along for the callback check.
        assert!(attempt.auth_url.contains(&format!("state={}", attempt.state)));
    }

    /// Test: id_token payload decodes to an account.
    #[test]
    fn test_decode_account() {
        let payload = serde_json::json!({
            "email": "user@example.com",
            "name": "User Example",
        });
        let encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
        let token = format!("header.{encoded}.sig");

        let account = decode_account(&token).unwrap();
        assert_eq!(account.email, "user@example.com");
        assert_eq!(account.display_name.as_deref(), Some("User Example"));

        assert!(decode_account("not-a-jwt").is_none());
    }

    /// Test: a mismatched state nonce fails the attempt.
    #[tokio::test]
    async fn test_await_callback_state_mismatch() {
        use tokio::io::AsyncWriteExt;

        let mut attempt = begin_sign_in(&test_config());
        let port = {
            let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().port()
        };
        attempt.port = port;

        let cancel = CancellationToken::new();
        let wait = tokio::spawn({
            let attempt = attempt.clone();
            let cancel = cancel.clone();
            async move { await_callback(&attempt, &cancel).await }
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .unwrap();
        stream
            .write_all(b"GET /oauth2callback?code=abc&state=wrong HTTP/1.1\r\n\r\n")
            .await
            .unwrap();

        match wait.await.unwrap() {
            SignInResult::Failure {
                reason,
            } => assert!(reason.contains("state mismatch")),
            SignInResult::Success {
                ..
            } => panic!("expected failure"),
        }
    }
}
