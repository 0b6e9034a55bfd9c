//! Login/logout command handlers (headless browser flow).

use anyhow::{Context, Result, bail};
use peep_core::auth::{self, SessionCache, SignInResult, oauth};
use peep_core::config::Config;
use tokio_util::sync::CancellationToken;

/// Runs the browser sign-in flow and caches the account identity.
///
/// No tokens are persisted; the exchange here only proves the sign-in and
/// yields the identity to cache.
pub async fn login(config: &Config) -> Result<()> {
    config.ensure_oauth_configured()?;

    let attempt = auth::begin_sign_in(config);

    println!("Opening browser to sign in...");
    if open::that(&attempt.auth_url).is_err() {
        println!("Could not open a browser. Visit this URL manually:");
        println!("{}", attempt.auth_url);
    }

    let cancel = CancellationToken::new();
    let cancel_on_interrupt = cancel.clone();
    tokio::spawn(async move {
        peep_core::interrupt::wait_for_interrupt().await;
        cancel_on_interrupt.cancel();
    });

    let result = auth::await_callback(&attempt, &cancel).await;
    let code = match result {
        SignInResult::Failure {
            reason,
        } => bail!("Sign-in failed: {reason}"),
        SignInResult::Success {
            server_auth_code: None,
            ..
        } => bail!("Sign-in completed without an authorization code"),
        SignInResult::Success {
            server_auth_code: Some(code),
            ..
        } => code,
    };

    let tokens = oauth::exchange_code(config, &code, Some(&attempt.verifier), &attempt.redirect_uri)
        .await
        .context("exchange authorization code")?;

    let account = tokens
        .id_token
        .as_deref()
        .and_then(auth::decode_account)
        .context("token response carried no usable identity")?;

    let mut cache = SessionCache::load()?;
    cache.set_account(account.clone());
    cache.save()?;

    println!("Logged in as {}", account.email);
    Ok(())
}

/// Clears the cached account. Nothing to revoke: tokens are never persisted.
pub async fn logout(config: &Config) -> Result<()> {
    let cache = SessionCache::load()?;
    if !cache.is_signed_in() {
        println!("Not signed in.");
        return Ok(());
    }

    auth::sign_out(config, None).await?;
    println!("Signed out");
    Ok(())
}
