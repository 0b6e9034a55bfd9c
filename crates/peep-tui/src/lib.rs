//! Full-screen TUI for Peep.

pub mod effects;
pub mod events;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stderr};

use anyhow::Result;
use peep_core::auth::SessionCache;
use peep_core::config::Config;
pub use runtime::TuiRuntime;

/// Runs the interactive profile screen.
///
/// # Errors
/// Returns an error if the terminal cannot be set up or the session cache
/// cannot be read.
pub fn run_screen(config: Config) -> Result<()> {
    // The screen requires a terminal to render
    if !stderr().is_terminal() {
        anyhow::bail!(
            "The profile screen requires a terminal.\n\
             Use `peep profile` for non-interactive output."
        );
    }

    let session = SessionCache::load()?;
    let mut runtime = TuiRuntime::new(config, session.account)?;
    runtime.run()
}
