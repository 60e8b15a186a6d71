pub mod cli;
pub mod config;
pub mod discovery;
pub mod executor;
pub mod history;
pub mod inventory;
pub mod prompt;
pub mod session;

use crate::cli::{Cli, Commands};
use crate::history::HistoryStore;
use crate::prompt::Prompter;
use crate::session::Session;
use anyhow::Result;
use log::warn;

pub async fn run(cli: Cli) -> Result<()> {
    let mut settings = config::manager::load_settings(cli.config.as_deref())?;

    match cli.cmd {
        Commands::Run {
            extra_vars,
            history_file,
        } => {
            if history_file.is_some() {
                settings.history_file = history_file;
            }

            let history = match settings.history_path() {
                Some(path) => HistoryStore::load_or_empty(&path),
                None => {
                    warn!("Could not determine home directory, command history is disabled");
                    HistoryStore::detached()
                }
            };

            let mut session = Session::new(settings, Prompter::stdio(), history, extra_vars);
            session.run().await
        }
    }
}
