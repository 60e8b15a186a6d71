use crate::inventory::host::HostConfig;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Ansible YAML inventory rooted at the implicit `all` group.
#[derive(Debug, Default, Serialize)]
pub struct InventoryDocument {
    all: GroupSection,
}

#[derive(Debug, Default, Serialize)]
struct GroupSection {
    hosts: HostEntries,
    // sorted so that output does not depend on input order of groups
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, ChildGroup>,
}

#[derive(Debug, Default, Serialize)]
struct ChildGroup {
    hosts: HostEntries,
}

/// Host entries in insertion order. Duplicate host names are kept as
/// separate entries, which is why this is not a map.
#[derive(Debug, Default)]
struct HostEntries(Vec<(String, HostVars)>);

impl Serialize for HostEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (host, vars) in &self.0 {
            map.serialize_entry(host, vars)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
struct HostVars {
    ansible_user: Option<String>,
    ansible_ssh_private_key_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ansible_port: Option<PortValue>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    ansible_become: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

impl From<&HostConfig> for HostVars {
    fn from(config: &HostConfig) -> Self {
        let ansible_user = if config.ssh_user.is_empty() {
            None
        } else {
            Some(config.ssh_user.clone())
        };

        let ansible_port = if config.ssh_port.is_empty() {
            None
        } else {
            // keep whatever the user typed if it is not a valid port number
            Some(match config.ssh_port.parse::<u16>() {
                Ok(port) => PortValue::Number(port),
                Err(_) => PortValue::Text(config.ssh_port.clone()),
            })
        };

        HostVars {
            ansible_user,
            ansible_ssh_private_key_file: config.ssh_key_file.clone(),
            ansible_port,
            ansible_become: config.use_become,
        }
    }
}

impl InventoryDocument {
    pub fn from_hosts(hosts: &[HostConfig]) -> Self {
        let mut section = GroupSection::default();

        for host in hosts {
            let entry = (host.host.clone(), HostVars::from(host));
            if host.is_grouped() {
                section
                    .children
                    .entry(host.group.clone())
                    .or_default()
                    .hosts
                    .0
                    .push(entry);
            } else {
                section.hosts.0.push(entry);
            }
        }

        InventoryDocument { all: section }
    }

    #[cfg(test)]
    fn ungrouped_hosts(&self) -> Vec<&str> {
        self.all.hosts.0.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[cfg(test)]
    fn group_names(&self) -> Vec<&str> {
        self.all.children.keys().map(String::as_str).collect()
    }

    #[cfg(test)]
    fn group_hosts(&self, group: &str) -> Vec<&str> {
        self.all
            .children
            .get(group)
            .map(|child| child.hosts.0.iter().map(|(name, _)| name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let body = serde_yaml::to_string(self)?;
        Ok(format!("---\n{body}"))
    }
}
