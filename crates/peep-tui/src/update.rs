//! Screen reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use peep_core::auth::{self, SignInResult};
use tokio_util::sync::CancellationToken;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, Phase, Toast};

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            // Expire the transient notification
            if app.toast.as_ref().is_some_and(Toast::is_expired) {
                app.toast = None;
            }
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, &term_event),
        UiEvent::SignInCompleted(result) => handle_sign_in_completed(app, result),
        UiEvent::ProfileFetched {
            generation,
            result,
        } => handle_profile_fetched(app, generation, result),
        UiEvent::SignOutCompleted(result) => handle_sign_out_completed(app, result),
    }
}

fn handle_terminal_event(app: &mut AppState, event: &Event) -> Vec<UiEffect> {
    let Event::Key(key) = event else {
        return vec![];
    };
    if key.kind != KeyEventKind::Press {
        return vec![];
    }

    match key.code {
        KeyCode::Char('q') => vec![UiEffect::Quit],
        KeyCode::Char('c') if is_ctrl(key) => vec![UiEffect::Quit],
        KeyCode::Esc => cancel_sign_in(app),
        KeyCode::Enter | KeyCode::Char('s') => toggle_sign_in(app),
        _ => vec![],
    }
}

fn is_ctrl(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
}

/// The single action key: sign in when signed out, sign out when signed in.
/// Ignored while a sign-in is already in flight.
fn toggle_sign_in(app: &mut AppState) -> Vec<UiEffect> {
    match app.phase {
        Phase::SignedOut => {
            let attempt = auth::begin_sign_in(&app.config);
            let cancel = CancellationToken::new();

            app.phase = Phase::SigningIn;
            app.sign_in_cancel = Some(cancel.clone());
            let url = attempt.auth_url.clone();
            app.sign_in_attempt = Some(attempt.clone());
            app.toast = Some(Toast::new("Opening browser to sign in..."));

            vec![
                UiEffect::OpenBrowser {
                    url,
                },
                UiEffect::StartSignInListener {
                    attempt,
                    cancel,
                },
            ]
        }
        Phase::SignedIn => {
            if app.sign_out_in_flight {
                return vec![];
            }
            // Invalidate any in-flight fetch before clearing the screen;
            // a late result must not repaint signed-out state.
            app.fetch_generation = app.fetch_generation.wrapping_add(1);
            app.fetch_in_flight = false;
            app.sign_out_in_flight = true;
            let access_token = app.access_token.take();
            vec![UiEffect::SpawnSignOut {
                access_token,
            }]
        }
        Phase::SigningIn => vec![],
    }
}

fn cancel_sign_in(app: &mut AppState) -> Vec<UiEffect> {
    if app.phase != Phase::SigningIn {
        return vec![];
    }
    match app.sign_in_cancel.take() {
        Some(token) => vec![UiEffect::CancelSignIn {
            token,
        }],
        None => vec![],
    }
}

fn handle_sign_in_completed(app: &mut AppState, result: SignInResult) -> Vec<UiEffect> {
    // A completion can only resolve the attempt it belongs to.
    if app.phase != Phase::SigningIn {
        return vec![];
    }
    let attempt = app.sign_in_attempt.take();
    app.sign_in_cancel = None;

    match result {
        SignInResult::Failure {
            reason,
        } => {
            app.phase = Phase::SignedOut;
            tracing::warn!("sign-in failed: {reason}");
            app.toast = Some(Toast::new(format!("Sign-in failed: {reason}")));
            vec![]
        }
        SignInResult::Success {
            account,
            server_auth_code,
        } => {
            app.phase = Phase::SignedIn;
            if account.is_some() {
                app.account = account;
            }

            let Some(code) = server_auth_code else {
                // Signed in, but the provider gave us nothing to exchange.
                // Historically a silent gap: log it, show nothing, fetch nothing.
                tracing::error!("sign-in succeeded without a server auth code");
                return vec![];
            };

            app.fetch_generation = app.fetch_generation.wrapping_add(1);
            app.fetch_in_flight = true;
            app.fetch_done = false;

            let (verifier, redirect_uri) = match attempt {
                Some(attempt) => (Some(attempt.verifier), attempt.redirect_uri),
                None => (None, String::new()),
            };

            vec![UiEffect::SpawnProfileFetch {
                generation: app.fetch_generation,
                code,
                verifier,
                redirect_uri,
            }]
        }
    }
}

fn handle_profile_fetched(
    app: &mut AppState,
    generation: u64,
    result: Result<peep_core::people::FetchedProfile, String>,
) -> Vec<UiEffect> {
    if generation != app.fetch_generation {
        // Superseded by a sign-out or a newer sign-in; drop it.
        tracing::debug!(generation, current = app.fetch_generation, "stale fetch discarded");
        return vec![];
    }

    app.fetch_in_flight = false;
    app.fetch_done = true;

    match result {
        Ok(fetched) => {
            app.profile = Some(fetched.record);
            app.access_token = Some(fetched.access_token);
            if let Some(account) = fetched.account {
                app.account = Some(account.clone());
                return vec![UiEffect::PersistSession {
                    account,
                }];
            }
            vec![]
        }
        Err(message) => {
            // The previously rendered profile, if any, stays on screen.
            tracing::warn!("profile fetch failed: {message}");
            app.toast = Some(Toast::new(format!("Fetch failed: {message}")));
            vec![]
        }
    }
}

fn handle_sign_out_completed(app: &mut AppState, result: Result<(), String>) -> Vec<UiEffect> {
    app.phase = Phase::SignedOut;
    app.account = None;
    app.profile = None;
    app.fetch_done = false;
    app.sign_out_in_flight = false;

    match result {
        Ok(()) => app.toast = Some(Toast::new("Signed out")),
        Err(message) => {
            tracing::warn!("sign-out failed: {message}");
            app.toast = Some(Toast::new(format!("Sign-out failed: {message}")));
        }
    }
    vec![]
}

#[cfg(test)]
mod tests {
    use peep_core::auth::Account;
    use peep_core::config::Config;
    use peep_core::people::{Birthday, FetchedProfile, ProfileRecord};

    use super::*;

    fn signed_out_app() -> AppState {
        let mut config = Config::default();
        config.oauth.client_id = "cid".to_string();
        config.oauth.client_secret = "secret".to_string();
        AppState::new(config, None)
    }

    fn fetched(record: ProfileRecord) -> FetchedProfile {
        FetchedProfile {
            record,
            account: None,
            access_token: "tok".to_string(),
        }
    }

    fn press(code: KeyCode) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    /// Action key from signed-out opens the browser and starts the listener.
    #[test]
    fn test_toggle_starts_sign_in() {
        let mut app = signed_out_app();
        let effects = update(&mut app, press(KeyCode::Enter));

        assert_eq!(app.phase, Phase::SigningIn);
        assert!(app.sign_in_attempt.is_some());
        assert!(matches!(effects[0], UiEffect::OpenBrowser { .. }));
        assert!(matches!(effects[1], UiEffect::StartSignInListener { .. }));

        // A second press while signing in does nothing.
        let effects = update(&mut app, press(KeyCode::Enter));
        assert!(effects.is_empty());
    }

    /// Sign-in failure returns to signed-out with a notification, no fetch.
    #[test]
    fn test_sign_in_failure_no_fetch() {
        let mut app = signed_out_app();
        update(&mut app, press(KeyCode::Enter));

        let effects = update(
            &mut app,
            UiEvent::SignInCompleted(SignInResult::Failure {
                reason: "denied".to_string(),
            }),
        );

        assert!(effects.is_empty());
        assert_eq!(app.phase, Phase::SignedOut);
        let toast = app.toast.as_ref().unwrap();
        assert!(toast.message.contains("Sign-in failed"));
    }

    /// Success without a code: signed in, log only, no fetch, no toast.
    #[test]
    fn test_sign_in_success_without_code() {
        let mut app = signed_out_app();
        update(&mut app, press(KeyCode::Enter));
        app.toast = None;

        let effects = update(
            &mut app,
            UiEvent::SignInCompleted(SignInResult::Success {
                account: None,
                server_auth_code: None,
            }),
        );

        assert!(effects.is_empty());
        assert_eq!(app.phase, Phase::SignedIn);
        assert!(!app.fetch_in_flight);
        assert!(app.toast.is_none());
    }

    /// Success with a code spawns a fetch carrying the PKCE verifier.
    #[test]
    fn test_sign_in_success_spawns_fetch() {
        let mut app = signed_out_app();
        update(&mut app, press(KeyCode::Enter));
        let verifier = app.sign_in_attempt.as_ref().unwrap().verifier.clone();

        let effects = update(
            &mut app,
            UiEvent::SignInCompleted(SignInResult::Success {
                account: None,
                server_auth_code: Some("ABC123".to_string()),
            }),
        );

        assert!(app.fetch_in_flight);
        match &effects[0] {
            UiEffect::SpawnProfileFetch {
                generation,
                code,
                verifier: v,
                ..
            } => {
                assert_eq!(*generation, app.fetch_generation);
                assert_eq!(code, "ABC123");
                assert_eq!(v.as_deref(), Some(verifier.as_str()));
            }
            other => panic!("expected SpawnProfileFetch, got {other:?}"),
        }
    }

    /// A fetched record replaces the previous one, never accumulates.
    #[test]
    fn test_fetch_result_replaces_record() {
        let mut app = signed_out_app();
        app.phase = Phase::SignedIn;
        app.fetch_generation = 1;
        app.profile = Some(ProfileRecord {
            birthday: Some(Birthday {
                year: Some(1990),
                month: Some(1),
                day: Some(1),
            }),
            gender: None,
        });

        let record = ProfileRecord {
            birthday: Some(Birthday {
                year: Some(2000),
                month: Some(5),
                day: Some(17),
            }),
            gender: Some("Male".to_string()),
        };
        update(
            &mut app,
            UiEvent::ProfileFetched {
                generation: 1,
                result: Ok(fetched(record)),
            },
        );

        assert!(app.fetch_done);
        let rendered = app.profile.as_ref().unwrap().render();
        assert_eq!(rendered, "Birthday: 2000-5-17\nGender: Male\n");
    }

    /// Fetch failure keeps the previous record and sets the completion flag.
    #[test]
    fn test_fetch_failure_keeps_record() {
        let mut app = signed_out_app();
        app.phase = Phase::SignedIn;
        app.fetch_generation = 1;
        app.fetch_in_flight = true;
        let record = ProfileRecord::default();
        app.profile = Some(record.clone());

        update(
            &mut app,
            UiEvent::ProfileFetched {
                generation: 1,
                result: Err("HTTP 500".to_string()),
            },
        );

        assert!(app.fetch_done);
        assert!(!app.fetch_in_flight);
        assert_eq!(app.profile, Some(record));
        assert!(app.toast.as_ref().unwrap().message.contains("Fetch failed"));
    }

    /// A result from a superseded generation is discarded after sign-out.
    #[test]
    fn test_stale_fetch_discarded() {
        let mut app = signed_out_app();
        app.phase = Phase::SignedIn;
        app.fetch_generation = 1;
        app.fetch_in_flight = true;

        // Sign out bumps the generation and clears the screen.
        let effects = update(&mut app, press(KeyCode::Enter));
        assert!(matches!(effects[0], UiEffect::SpawnSignOut { .. }));
        update(&mut app, UiEvent::SignOutCompleted(Ok(())));
        assert_eq!(app.phase, Phase::SignedOut);
        assert!(app.profile.is_none());

        // The old fetch finally lands; it must not repaint the screen.
        update(
            &mut app,
            UiEvent::ProfileFetched {
                generation: 1,
                result: Ok(fetched(ProfileRecord {
                    birthday: None,
                    gender: Some("Male".to_string()),
                })),
            },
        );

        assert!(app.profile.is_none());
        assert!(!app.fetch_done);
    }

    /// Sign-out hands the in-memory token to the revocation effect.
    #[test]
    fn test_sign_out_revokes_token() {
        let mut app = signed_out_app();
        app.phase = Phase::SignedIn;
        app.access_token = Some("tok".to_string());

        let effects = update(&mut app, press(KeyCode::Char('s')));
        match &effects[0] {
            UiEffect::SpawnSignOut {
                access_token,
            } => assert_eq!(access_token.as_deref(), Some("tok")),
            other => panic!("expected SpawnSignOut, got {other:?}"),
        }
        assert!(app.access_token.is_none());
    }

    /// Repeat action presses while a sign-out is pending spawn nothing.
    #[test]
    fn test_sign_out_not_duplicated() {
        let mut app = signed_out_app();
        app.phase = Phase::SignedIn;
        app.access_token = Some("tok".to_string());

        let effects = update(&mut app, press(KeyCode::Enter));
        assert!(matches!(effects[0], UiEffect::SpawnSignOut { .. }));

        // Still SignedIn until the completion lands; pressing again must
        // not revoke or clear a second time.
        let effects = update(&mut app, press(KeyCode::Enter));
        assert!(effects.is_empty());

        update(&mut app, UiEvent::SignOutCompleted(Ok(())));
        assert_eq!(app.phase, Phase::SignedOut);
        assert!(!app.sign_out_in_flight);
    }

    /// A fetched account identity is persisted to the session cache.
    #[test]
    fn test_fetch_result_persists_account() {
        let mut app = signed_out_app();
        app.phase = Phase::SignedIn;
        app.fetch_generation = 1;

        let mut profile = fetched(ProfileRecord::default());
        profile.account = Some(Account {
            email: "user@example.com".to_string(),
            display_name: None,
        });
        let effects = update(
            &mut app,
            UiEvent::ProfileFetched {
                generation: 1,
                result: Ok(profile),
            },
        );

        match &effects[0] {
            UiEffect::PersistSession {
                account,
            } => assert_eq!(account.email, "user@example.com"),
            other => panic!("expected PersistSession, got {other:?}"),
        }
        assert_eq!(app.account.as_ref().unwrap().email, "user@example.com");
    }

    /// Esc cancels only while a sign-in is in flight.
    #[test]
    fn test_esc_cancels_sign_in() {
        let mut app = signed_out_app();
        assert!(update(&mut app, press(KeyCode::Esc)).is_empty());

        update(&mut app, press(KeyCode::Enter));
        let effects = update(&mut app, press(KeyCode::Esc));
        assert!(matches!(effects[0], UiEffect::CancelSignIn { .. }));
    }
}
