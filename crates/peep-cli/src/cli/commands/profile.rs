//! One-shot profile fetch command handler.

use anyhow::{Result, bail};
use peep_core::auth::{self, SignInResult};
use peep_core::config::Config;
use peep_core::people;
use tokio_util::sync::CancellationToken;

/// Fetches the profile once and prints the two rendered lines to stdout.
///
/// With `--auth-code` the given server auth code is exchanged directly;
/// otherwise the browser flow runs first to obtain one.
pub async fn run(config: &Config, auth_code: Option<&str>) -> Result<()> {
    config.ensure_oauth_configured()?;

    let fetched = match auth_code {
        Some(code) => people::fetch_profile(config, code).await?,
        None => {
            let attempt = auth::begin_sign_in(config);

            eprintln!("Opening browser to sign in...");
            if open::that(&attempt.auth_url).is_err() {
                eprintln!("Could not open a browser. Visit this URL manually:");
                eprintln!("{}", attempt.auth_url);
            }

            let cancel = CancellationToken::new();
            let cancel_on_interrupt = cancel.clone();
            tokio::spawn(async move {
                peep_core::interrupt::wait_for_interrupt().await;
                cancel_on_interrupt.cancel();
            });

            let code = match auth::await_callback(&attempt, &cancel).await {
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

            people::fetch_profile_interactive(
                config,
                &code,
                &attempt.verifier,
                &attempt.redirect_uri,
            )
            .await?
        }
    };

    print!("{}", fetched.record.render());
    Ok(())
}
