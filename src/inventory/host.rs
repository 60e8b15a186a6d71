pub const DEFAULT_SSH_KEY_FILE: &str = "~/.ssh/id_rsa";

/// Connection settings for a single managed host, as collected from the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostConfig {
    pub host: String,
    /// Empty means the host is ungrouped.
    pub group: String,
    pub ssh_user: String,
    pub ssh_key_file: String,
    pub ssh_port: String,
    pub use_become: bool,
}

impl HostConfig {
    pub fn new(host: &str) -> Self {
        HostConfig {
            host: host.to_string(),
            group: String::new(),
            ssh_user: String::new(),
            ssh_key_file: DEFAULT_SSH_KEY_FILE.to_string(),
            ssh_port: String::new(),
            use_become: false,
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.ssh_user = user.to_string();
        self
    }

    /// An empty key file falls back to the default key.
    pub fn with_key_file(mut self, key_file: &str) -> Self {
        self.ssh_key_file = if key_file.is_empty() {
            DEFAULT_SSH_KEY_FILE.to_string()
        } else {
            key_file.to_string()
        };
        self
    }

    pub fn with_port(mut self, port: &str) -> Self {
        self.ssh_port = port.to_string();
        self
    }

    pub fn with_become(mut self, enabled: bool) -> Self {
        self.use_become = enabled;
        self
    }

    pub fn is_grouped(&self) -> bool {
        !self.group.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_host_uses_default_key() {
        let host = HostConfig::new("10.0.0.5");
        assert_eq!(host.ssh_key_file, DEFAULT_SSH_KEY_FILE);
        assert!(!host.is_grouped());
        assert!(!host.use_become);
    }

    #[test]
    fn test_empty_key_file_keeps_default() {
        let host = HostConfig::new("web1").with_key_file("");
        assert_eq!(host.ssh_key_file, DEFAULT_SSH_KEY_FILE);

        let host = HostConfig::new("web1").with_key_file("~/.ssh/deploy");
        assert_eq!(host.ssh_key_file, "~/.ssh/deploy");
    }

    #[test]
    fn test_group_is_not_normalized() {
        let host = HostConfig::new("web1").with_group(" Web ");
        assert_eq!(host.group, " Web ");
        assert!(host.is_grouped());
    }
}
