use crate::config::manager::Settings;
use crate::discovery::InstanceDiscovery;
use crate::executor::PlaybookRunner;
use crate::history::{CommandHistoryEntry, HistoryStore};
use crate::inventory::{HostConfig, InventoryBuilder};
use crate::prompt::Prompter;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::io::{BufRead, Write};
use std::path::Path;

/// One interactive `run`: pick or build an inventory, choose playbooks and
/// execute them.
pub struct Session<R, W> {
    settings: Settings,
    prompter: Prompter<R, W>,
    history: HistoryStore,
    runner: PlaybookRunner,
    extra_vars: Vec<String>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(
        settings: Settings,
        prompter: Prompter<R, W>,
        history: HistoryStore,
        extra_vars: Vec<String>,
    ) -> Self {
        let runner = PlaybookRunner::new(&settings.ansible_playbook_bin);
        Session {
            settings,
            prompter,
            history,
            runner,
            extra_vars,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        if let Some(entry) = self.choose_from_history()? {
            self.execute(&entry.inventory_file, &entry.playbooks, entry.dry_run)
                .await?;
            self.history.record(entry);
            return Ok(());
        }

        let inventory = self.ask_for_inventory().await?;
        let playbooks = self
            .prompter
            .ask_list("Enter playbooks to run (space-separated):")?;
        let dry_run = self.ask_for_dry_run()?;

        self.history
            .record(CommandHistoryEntry::new(&inventory, &playbooks, dry_run));
        self.execute(&inventory, &playbooks, dry_run).await?;

        if dry_run
            && self
                .prompter
                .confirm("Would you like to run this again without dry-run?")?
        {
            self.execute(&inventory, &playbooks, false).await?;
            self.history
                .record(CommandHistoryEntry::new(&inventory, &playbooks, false));
        }

        Ok(())
    }

    pub fn into_parts(self) -> (HistoryStore, W) {
        (self.history, self.prompter.into_writer())
    }

    fn choose_from_history(&mut self) -> Result<Option<CommandHistoryEntry>> {
        if self.history.is_empty() {
            return Ok(None);
        }

        self.prompter.say("\nPrevious commands (latest first):")?;
        let entries: Vec<CommandHistoryEntry> = self.history.latest_first().cloned().collect();
        for (i, entry) in entries.iter().enumerate() {
            self.prompter.say(&format!(
                "{}. Inventory: {} | Playbooks: {} | Dry-run: {}",
                i + 1,
                entry.inventory_file,
                entry.playbooks.join(" "),
                entry.dry_run
            ))?;
        }

        let answer = self.prompter.ask(&format!(
            "Choose a previous command (1-{}) or press Enter to start fresh:",
            entries.len()
        ))?;

        let choice = answer
            .parse::<usize>()
            .ok()
            .filter(|&n| n >= 1 && n <= entries.len())
            .map(|n| entries[n - 1].clone());
        if choice.is_none() && !answer.is_empty() {
            debug!("Ignoring history choice {answer:?}");
        }

        Ok(choice)
    }

    async fn ask_for_inventory(&mut self) -> Result<String> {
        if self
            .prompter
            .confirm("Do you already have an inventory file?")?
        {
            let path = self.prompter.ask("Enter the path to your inventory file:")?;
            return Ok(path);
        }

        let instances = if self
            .prompter
            .confirm("Do you want to auto-discover running Multipass/Docker instances?")?
        {
            InstanceDiscovery::from_settings(&self.settings)
                .discover(&mut self.prompter)
                .await?
        } else {
            self.prompter
                .ask_list("Enter server IPs or DNS names (space-separated):")?
        };

        self.create_inventory(&instances)
    }

    fn create_inventory(&mut self, instances: &[String]) -> Result<String> {
        let mut directory = self.prompter.ask(
            "Where should the inventory file be saved? (Press Enter for current directory):",
        )?;
        if directory.is_empty() {
            directory = ".".to_string();
        }

        let mut hosts = Vec::with_capacity(instances.len());
        for instance in instances {
            hosts.push(self.configure_host(instance)?);
        }

        let path = InventoryBuilder::new(Path::new(&directory))
            .build(&hosts)
            .context("error creating inventory file")?;

        self.prompter
            .say(&format!("\nInventory file created at: {}", path.display()))?;
        Ok(path.display().to_string())
    }

    fn configure_host(&mut self, instance: &str) -> Result<HostConfig> {
        self.prompter.say(&format!("\nConfiguring {instance}"))?;

        let user = self.prompter.ask("SSH user (e.g., ubuntu, root):")?;
        let key_file = self.prompter.ask(&format!(
            "SSH private key file (Press Enter for default {}):",
            self.settings.default_ssh_key_file
        ))?;
        let group = self.prompter.ask("Server group (Press Enter to skip grouping):")?;
        let port = self.prompter.ask("SSH port (Press Enter for default 22):")?;
        let use_become = self
            .prompter
            .confirm("Enable sudo (become) for this server?")?;

        let key_file = if key_file.is_empty() {
            self.settings.default_ssh_key_file.clone()
        } else {
            key_file
        };

        Ok(HostConfig::new(instance)
            .with_user(&user)
            .with_key_file(&key_file)
            .with_group(&group)
            .with_port(&port)
            .with_become(use_become))
    }

    fn ask_for_dry_run(&mut self) -> Result<bool> {
        let dry_run = self
            .prompter
            .confirm("Would you like to run this in dry-run mode?")?;
        if dry_run {
            self.prompter.say(
                "Dry-run mode enabled! Playbooks will simulate changes without applying them.",
            )?;
        }
        Ok(dry_run)
    }

    async fn execute(
        &mut self,
        inventory: &str,
        playbooks: &[String],
        dry_run: bool,
    ) -> Result<()> {
        if playbooks.is_empty() {
            self.prompter.say("No playbooks to run.")?;
            return Ok(());
        }

        let mut failed = 0;
        for playbook in playbooks {
            self.prompter.say(&format!(
                "\nRunning playbook: {playbook} using inventory: {inventory}"
            ))?;

            let inventory = Path::new(inventory);
            let command_line = self
                .runner
                .command_line(inventory, playbook, &self.extra_vars, dry_run);
            self.prompter.say(&format!("Executing: {command_line}"))?;

            if !self
                .runner
                .run(inventory, playbook, &self.extra_vars, dry_run)
                .await
            {
                failed += 1;
            }
        }

        if failed > 0 {
            warn!("{} of {} playbook(s) failed", failed, playbooks.len());
            self.prompter
                .say(&format!("\n{failed} of {} playbook(s) failed.", playbooks.len()))?;
        }

        Ok(())
    }
}
