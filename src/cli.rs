use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "A CLI tool for dynamically running Ansible playbooks",
    long_about = None
)]
pub struct Cli {
    /// configuration file, defaults to <config dir>/playctl/config.yaml
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// enable debug logging
    #[arg(short, long, action, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run Ansible playbooks with optional auto-discovery and dry-run mode
    Run {
        /// extra variables passed to every playbook: -e key=value (repeatable)
        #[arg(short, long = "extra-vars", value_name = "KEY=VALUE")]
        extra_vars: Vec<String>,

        /// command history file, overrides the configured location
        #[arg(long, value_name = "FILE")]
        history_file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_extra_vars() {
        let cli = Cli::parse_from(["playctl", "run", "-e", "a=1", "--extra-vars", "b=2"]);
        match cli.cmd {
            Commands::Run {
                extra_vars,
                history_file,
            } => {
                assert_eq!(extra_vars, vec!["a=1", "b=2"]);
                assert!(history_file.is_none());
            }
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["playctl", "run", "-v", "--config", "cfg.yaml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("cfg.yaml")));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["playctl"]).is_err());
    }
}
