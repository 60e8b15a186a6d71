use crate::inventory::document::InventoryDocument;
use crate::inventory::host::HostConfig;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const INVENTORY_BASE_NAME: &str = "inv";
const INVENTORY_EXTENSION: &str = "yml";

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("error creating directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error writing inventory file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error serializing inventory: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

pub struct InventoryBuilder {
    directory: PathBuf,
}

impl InventoryBuilder {
    pub fn new(directory: &Path) -> Self {
        InventoryBuilder {
            directory: directory.to_path_buf(),
        }
    }

    /// Writes an inventory for `hosts` into the builder's directory and
    /// returns the path of the new file. Existing inventories are never
    /// overwritten.
    pub fn build(&self, hosts: &[HostConfig]) -> Result<PathBuf, InventoryError> {
        self.ensure_directory()?;

        let path = unique_inventory_path(&self.directory);
        let document = InventoryDocument::from_hosts(hosts);
        let content = document.to_yaml()?;

        write_atomic(&path, content.as_bytes())?;
        info!(
            "Wrote inventory with {} host(s) to {}",
            hosts.len(),
            path.display()
        );

        Ok(path)
    }

    fn ensure_directory(&self) -> Result<(), InventoryError> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }

        builder
            .create(&self.directory)
            .map_err(|source| InventoryError::CreateDir {
                path: self.directory.clone(),
                source,
            })
    }
}

/// Returns `inv.yml` in `directory`, or the first free `invN.yml` (N = 1, 2, ...)
/// if it is taken. The probe is linear and has no upper bound.
pub fn unique_inventory_path(directory: &Path) -> PathBuf {
    let mut path = directory.join(format!("{INVENTORY_BASE_NAME}.{INVENTORY_EXTENSION}"));
    let mut counter: u64 = 1;

    while path.exists() {
        debug!("{} already exists", path.display());
        path = directory.join(format!(
            "{INVENTORY_BASE_NAME}{counter}.{INVENTORY_EXTENSION}"
        ));
        counter += 1;
    }

    path
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<(), InventoryError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let to_error = |source: std::io::Error| InventoryError::Write {
        path: path.to_path_buf(),
        source,
    };

    fs::write(&tmp_path, content).map_err(to_error)?;
    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(to_error(source));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unique_path_starts_with_base_name() {
        let dir = TempDir::new().unwrap();
        let path = unique_inventory_path(dir.path());
        assert_eq!(path, dir.path().join("inv.yml"));
    }

    #[test]
    fn test_unique_path_skips_taken_names() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("inv.yml"), "").unwrap();
        fs::write(dir.path().join("inv1.yml"), "").unwrap();

        let path = unique_inventory_path(dir.path());
        assert_eq!(path, dir.path().join("inv2.yml"));
    }

    #[test]
    fn test_build_creates_nested_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a").join("b");

        let path = InventoryBuilder::new(&target)
            .build(&[HostConfig::new("web1")])
            .unwrap();

        assert_eq!(path, target.join("inv.yml"));
        assert!(path.is_file());
        assert!(!target.join(".inv.yml.tmp").exists());
    }

    #[test]
    fn test_build_twice_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let builder = InventoryBuilder::new(dir.path());

        let first = builder.build(&[HostConfig::new("web1")]).unwrap();
        let second = builder.build(&[HostConfig::new("web2")]).unwrap();

        assert_eq!(first, dir.path().join("inv.yml"));
        assert_eq!(second, dir.path().join("inv1.yml"));
        assert!(fs::read_to_string(&first).unwrap().contains("web1"));
        assert!(fs::read_to_string(&second).unwrap().contains("web2"));
    }

    #[test]
    fn test_build_fails_when_directory_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let result = InventoryBuilder::new(&blocker.join("inventory")).build(&[]);
        assert!(matches!(result, Err(InventoryError::CreateDir { .. })));
    }
}
