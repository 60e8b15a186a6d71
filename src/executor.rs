use log::{debug, error};
use std::path::Path;
use tokio::process::Command;

/// Launches `ansible-playbook` with the child's output going straight to
/// our own stdout and stderr.
pub struct PlaybookRunner {
    program: String,
}

impl PlaybookRunner {
    pub fn new(program: &str) -> Self {
        PlaybookRunner {
            program: program.to_string(),
        }
    }

    pub fn command_args(
        inventory: &Path,
        playbook: &str,
        extra_vars: &[String],
        dry_run: bool,
    ) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            inventory.display().to_string(),
            playbook.to_string(),
        ];

        for var in extra_vars {
            args.push("--extra-vars".to_string());
            args.push(var.clone());
        }

        if dry_run {
            args.push("--check".to_string());
        }

        args
    }

    pub fn command_line(
        &self,
        inventory: &Path,
        playbook: &str,
        extra_vars: &[String],
        dry_run: bool,
    ) -> String {
        let args = Self::command_args(inventory, playbook, extra_vars, dry_run);
        format!("{} {}", self.program, args.join(" "))
    }

    /// Runs one playbook to completion. Failures are logged and reported as
    /// `false`; they never abort the caller.
    pub async fn run(
        &self,
        inventory: &Path,
        playbook: &str,
        extra_vars: &[String],
        dry_run: bool,
    ) -> bool {
        let args = Self::command_args(inventory, playbook, extra_vars, dry_run);
        debug!("Spawning {} with {:?}", self.program, args);

        match Command::new(&self.program).args(&args).status().await {
            Ok(status) if status.success() => true,
            Ok(status) => {
                error!("Playbook {} failed: {}", playbook, status);
                false
            }
            Err(e) => {
                error!("Error executing {}: {}", self.program, e);
                false
            }
        }
    }
}
