use log::debug;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum EnumerationError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}")]
    Status { program: String, status: ExitStatus },
    #[error("`{program}` did not finish within {}s", .timeout.as_secs_f32())]
    Timeout { program: String, timeout: Duration },
    #[error("`{program}` produced output that is not valid UTF-8")]
    InvalidOutput { program: String },
}

/// A source of discovery candidates backed by an external command.
pub trait Enumerator {
    fn name(&self) -> &str;

    async fn enumerate(&self) -> Result<Vec<String>, EnumerationError>;
}

/// Lists running Multipass virtual machines by IPv4 address.
pub struct MultipassEnumerator {
    program: String,
    timeout: Duration,
}

impl MultipassEnumerator {
    pub fn new(program: &str, timeout: Duration) -> Self {
        MultipassEnumerator {
            program: program.to_string(),
            timeout,
        }
    }
}

impl Enumerator for MultipassEnumerator {
    fn name(&self) -> &str {
        "multipass"
    }

    async fn enumerate(&self) -> Result<Vec<String>, EnumerationError> {
        let args = ["list", "--format", "csv"];
        let output = run_command(&self.program, &args, self.timeout).await?;
        Ok(parse_multipass_csv(&output))
    }
}

/// Lists running Docker containers by name.
pub struct DockerEnumerator {
    program: String,
    timeout: Duration,
}

impl DockerEnumerator {
    pub fn new(program: &str, timeout: Duration) -> Self {
        DockerEnumerator {
            program: program.to_string(),
            timeout,
        }
    }
}

impl Enumerator for DockerEnumerator {
    fn name(&self) -> &str {
        "docker"
    }

    async fn enumerate(&self) -> Result<Vec<String>, EnumerationError> {
        let args = ["ps", "--format", "{{.Names}}"];
        let output = run_command(&self.program, &args, self.timeout).await?;
        Ok(parse_docker_names(&output))
    }
}

/// Extracts the address column of every `Running` row. The first line is
/// always treated as the header.
pub fn parse_multipass_csv(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() > 2 && fields[1].trim() == "Running" {
                Some(fields[2].trim().to_string())
            } else {
                None
            }
        })
        .collect()
}

pub fn parse_docker_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

pub(crate) async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, EnumerationError> {
    debug!("Running {} {}", program, args.join(" "));

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result.map_err(|source| EnumerationError::Launch {
            program: program.to_string(),
            source,
        })?,
        Err(_) => {
            return Err(EnumerationError::Timeout {
                program: program.to_string(),
                timeout,
            })
        }
    };

    if !output.status.success() {
        debug!(
            "{} stderr: {}",
            program,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Err(EnumerationError::Status {
            program: program.to_string(),
            status: output.status,
        });
    }

    String::from_utf8(output.stdout).map_err(|_| EnumerationError::InvalidOutput {
        program: program.to_string(),
    })
}
