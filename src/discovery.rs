pub mod enumerator;

use crate::config::manager::Settings;
use crate::prompt::Prompter;
use anyhow::Result;
use enumerator::{DockerEnumerator, Enumerator, MultipassEnumerator};
use log::{debug, warn};
use std::io::{BufRead, Write};

/// Merges candidates from a VM enumerator and a container enumerator and
/// lets the user pick from them.
pub struct InstanceDiscovery<A, B> {
    vms: A,
    containers: B,
}

impl InstanceDiscovery<MultipassEnumerator, DockerEnumerator> {
    pub fn from_settings(settings: &Settings) -> Self {
        let timeout = settings.enumerator_timeout();
        InstanceDiscovery::new(
            MultipassEnumerator::new(&settings.multipass_bin, timeout),
            DockerEnumerator::new(&settings.docker_bin, timeout),
        )
    }
}

impl<A: Enumerator, B: Enumerator> InstanceDiscovery<A, B> {
    pub fn new(vms: A, containers: B) -> Self {
        InstanceDiscovery { vms, containers }
    }

    /// VM candidates first, then containers. A failing source contributes
    /// nothing.
    pub async fn candidates(&self) -> Vec<String> {
        let mut candidates = collect(&self.vms).await;
        candidates.extend(collect(&self.containers).await);
        candidates
    }

    pub async fn discover<R: BufRead, W: Write>(
        &self,
        prompter: &mut Prompter<R, W>,
    ) -> Result<Vec<String>> {
        prompter.say(&format!(
            "\nChecking for running {} and {} instances...",
            self.vms.name(),
            self.containers.name()
        ))?;
        let candidates = self.candidates().await;

        if candidates.is_empty() {
            prompter.say("No running instances found.")?;
            return Ok(Vec::new());
        }

        prompter.say("\nFound the following instances:")?;
        for (i, candidate) in candidates.iter().enumerate() {
            prompter.say(&format!("[{}] {}", i + 1, candidate))?;
        }

        let selection = prompter
            .ask("Select instances to add (space-separated numbers, or type 'all' for all):")?;
        Ok(select(&candidates, &selection))
    }
}

async fn collect<E: Enumerator>(source: &E) -> Vec<String> {
    match source.enumerate().await {
        Ok(found) => {
            debug!("{} reported {} instance(s)", source.name(), found.len());
            found
        }
        Err(e) => {
            warn!("skipping {} instances: {}", source.name(), e);
            Vec::new()
        }
    }
}

/// Applies a selection expression to `candidates`: `all`, or 1-based
/// indices in the order typed. Invalid tokens are ignored.
pub fn select(candidates: &[String], selection: &str) -> Vec<String> {
    let selection = selection.trim();
    if selection == "all" {
        return candidates.to_vec();
    }

    selection
        .split_whitespace()
        .filter_map(|token| token.parse::<usize>().ok())
        .filter(|&index| index >= 1 && index <= candidates.len())
        .map(|index| candidates[index - 1].clone())
        .collect()
}
