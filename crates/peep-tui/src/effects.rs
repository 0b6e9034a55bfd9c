//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only; the reducer itself never
//! performs I/O or spawns tasks.

use peep_core::auth::{Account, SignInAttempt};
use tokio_util::sync::CancellationToken;

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Open a URL in the system browser.
    OpenBrowser { url: String },

    /// Start the localhost callback listener for a sign-in attempt.
    StartSignInListener {
        attempt: SignInAttempt,
        cancel: CancellationToken,
    },

    /// Cancel the in-flight sign-in listener.
    CancelSignIn { token: CancellationToken },

    /// Spawn the code-exchange + profile-read task.
    SpawnProfileFetch {
        generation: u64,
        code: String,
        /// PKCE verifier when the code came from the interactive flow.
        verifier: Option<String>,
        /// Redirect URI the code was minted against; empty for server codes.
        redirect_uri: String,
    },

    /// Spawn sign-out: best-effort revocation, then clear the session cache.
    SpawnSignOut { access_token: Option<String> },

    /// Persist the signed-in account to the session cache.
    PersistSession { account: Account },
}
