//! UI event types.
//!
//! Events are inputs to the reducer: terminal input, tick, and the results
//! of async work delivered through the runtime inbox. Each async result is
//! delivered exactly once.

use peep_core::auth::SignInResult;
use peep_core::people::FetchedProfile;

/// Events processed by the reducer.
#[derive(Debug)]
pub enum UiEvent {
    /// Periodic tick; drives toast expiry and render cadence.
    Tick,

    /// Raw terminal input.
    Terminal(crossterm::event::Event),

    /// The sign-in browser leg finished, one way or the other.
    SignInCompleted(SignInResult),

    /// A profile fetch finished. Tagged with the generation it was spawned
    /// under; stale generations are discarded by the reducer.
    ProfileFetched {
        generation: u64,
        result: Result<FetchedProfile, String>,
    },

    /// Sign-out completed (revocation already attempted, cache cleared).
    SignOutCompleted(Result<(), String>),
}
