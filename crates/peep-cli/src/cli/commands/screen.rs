//! Interactive screen command handler.

use anyhow::Result;
use peep_core::config::Config;

pub fn run(config: Config) -> Result<()> {
    peep_tui::run_screen(config)
}
