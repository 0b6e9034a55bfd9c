//! Application state for the profile screen.
//!
//! All fields are written only on the UI thread, inside the reducer.
//! Async handlers never touch state; they send events into the runtime
//! inbox and the reducer applies them.

use std::time::Instant;

use peep_core::auth::{Account, SignInAttempt};
use peep_core::config::Config;
use peep_core::people::ProfileRecord;
use tokio_util::sync::CancellationToken;

/// How long a transient notification stays on screen.
pub const TOAST_DURATION: std::time::Duration = std::time::Duration::from_secs(4);

/// Where the screen is in the sign-in/sign-out cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No account; the action key starts a sign-in.
    SignedOut,
    /// Browser flow in progress; a callback listener is running.
    SigningIn,
    /// Account present; the action key signs out.
    SignedIn,
}

/// A transient status notification.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub shown_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= TOAST_DURATION
    }
}

/// Screen state. One record at most; re-renders replace, never append.
pub struct AppState {
    /// Flag indicating the app should quit.
    pub should_quit: bool,
    /// Configuration (endpoints, OAuth client).
    pub config: Config,
    /// Sign-in/sign-out phase.
    pub phase: Phase,
    /// The signed-in account, once known.
    pub account: Option<Account>,
    /// Last fetched profile record.
    pub profile: Option<ProfileRecord>,
    /// Set once a fetch finishes, success or failure.
    pub fetch_done: bool,
    /// True while a fetch is in flight.
    pub fetch_in_flight: bool,
    /// True while a sign-out is in flight; blocks repeat action presses.
    pub sign_out_in_flight: bool,
    /// Generation counter for fetches. Results tagged with an older
    /// generation are discarded instead of resurrecting cleared state.
    pub fetch_generation: u64,
    /// PKCE material for the in-flight sign-in attempt.
    pub sign_in_attempt: Option<SignInAttempt>,
    /// Cancels the callback listener (Esc).
    pub sign_in_cancel: Option<CancellationToken>,
    /// Most recent access token, memory only, so sign-out can revoke it.
    pub access_token: Option<String>,
    /// Transient status notification.
    pub toast: Option<Toast>,
}

impl AppState {
    /// Creates the screen state. The phase is derived solely from whether
    /// the session cache held an account.
    pub fn new(config: Config, account: Option<Account>) -> Self {
        let phase = if account.is_some() {
            Phase::SignedIn
        } else {
            Phase::SignedOut
        };

        Self {
            should_quit: false,
            config,
            phase,
            account,
            profile: None,
            fetch_done: false,
            fetch_in_flight: false,
            sign_out_in_flight: false,
            fetch_generation: 0,
            sign_in_attempt: None,
            sign_in_cancel: None,
            access_token: None,
            toast: None,
        }
    }

    /// True while any background work is pending (drives fast polling).
    pub fn is_busy(&self) -> bool {
        self.phase == Phase::SigningIn || self.fetch_in_flight || self.sign_out_in_flight
    }
}
