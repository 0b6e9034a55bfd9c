//! Effect handler implementations.
//!
//! Each handler is a pure `async fn -> UiEvent`: it performs its I/O and
//! folds the outcome into the single event the reducer will apply. The
//! runtime spawns these and routes the result through the inbox.

use peep_core::auth::{self, SignInAttempt};
use peep_core::config::Config;
use peep_core::people;
use tokio_util::sync::CancellationToken;

use crate::events::UiEvent;

/// Waits for the browser redirect of a sign-in attempt.
pub async fn sign_in_listener(attempt: SignInAttempt, cancel: CancellationToken) -> UiEvent {
    let result = auth::await_callback(&attempt, &cancel).await;
    UiEvent::SignInCompleted(result)
}

/// Exchanges the authorization code and reads the profile.
pub async fn profile_fetch(
    config: Config,
    generation: u64,
    code: String,
    verifier: Option<String>,
    redirect_uri: String,
) -> UiEvent {
    let result = match verifier {
        Some(verifier) => {
            people::fetch_profile_interactive(&config, &code, &verifier, &redirect_uri).await
        }
        None => people::fetch_profile(&config, &code).await,
    };

    UiEvent::ProfileFetched {
        generation,
        result: result.map_err(|e| format!("{e:#}")),
    }
}

/// Revokes the token (best effort) and clears the session cache.
pub async fn sign_out(config: Config, access_token: Option<String>) -> UiEvent {
    let result = auth::sign_out(&config, access_token.as_deref())
        .await
        .map_err(|e| format!("{e:#}"));
    UiEvent::SignOutCompleted(result)
}
