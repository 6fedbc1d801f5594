//! Stack manifest loading
//!
//! The manifest is the human-edited description of a deployment: one
//! `[stacks.<name>]` table per entry. This module only reads fields and
//! resolves template/parameter paths on disk; everything relational
//! (references, cycles) is validated by `conductor` when the graph is
//! built.

use anyhow::{Context, Result};
use conductor::Entry;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The parsed `cascade.toml` manifest.
///
/// ```toml
/// [stacks.network]
/// stack_name = "prod-network"
/// template = "templates/network.yml"
/// parameters = "params/network.json"
/// capabilities = ["CAPABILITY_IAM"]
/// depends_on = []
///
/// [stacks.compute]
/// stack_name = "prod-compute"
/// template = "templates/compute.yml"
/// depends_on = ["network"]
/// ssh_keys = ["bastion"]
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub stacks: BTreeMap<String, StackSection>,
}

/// One `[stacks.<name>]` table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackSection {
    /// Resource name at the CloudFormation side
    pub stack_name: String,
    /// Template path, relative to the manifest unless absolute
    pub template: String,
    /// Optional parameter file path
    #[serde(default)]
    pub parameters: Option<String>,
    /// Capability flags forwarded to CloudFormation
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Names of stacks that must exist before this one
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// EC2 key pairs to ensure before this stack deploys
    #[serde(default)]
    pub ssh_keys: Vec<String>,
}

impl Manifest {
    /// Load and parse a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid manifest format in {}", path.display()))
    }

    /// Build validated entries, resolving template and parameter paths
    /// against `base` (the manifest's directory).
    pub fn entries(&self, base: &Path) -> Result<Vec<Entry>> {
        self.stacks
            .iter()
            .map(|(name, section)| {
                let entry = Entry::new(
                    name.clone(),
                    section.stack_name.clone(),
                    resolve(base, &section.template),
                    section
                        .parameters
                        .as_deref()
                        .map(|params| resolve(base, params)),
                    section.capabilities.clone(),
                    section.depends_on.clone(),
                )?;
                Ok(entry)
            })
            .collect()
    }

    /// Every key pair named anywhere in the manifest, sorted and deduplicated
    pub fn ssh_key_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .stacks
            .values()
            .flat_map(|section| section.ssh_keys.iter().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Tilde-expand, then anchor relative paths at the manifest's directory
fn resolve(base: &Path, raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let path = Path::new(expanded.as_ref());
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [stacks.network]
        stack_name = "prod-network"
        template = "templates/network.yml"
        parameters = "params/network.json"
        capabilities = ["CAPABILITY_IAM"]
        depends_on = []

        [stacks.compute]
        stack_name = "prod-compute"
        template = "templates/compute.yml"
        depends_on = ["network"]
        ssh_keys = ["bastion", "worker"]
    "#;

    #[test]
    fn test_parse_full_manifest() {
        let manifest: Manifest = toml::from_str(FULL).unwrap();
        assert_eq!(manifest.stacks.len(), 2);

        let network = &manifest.stacks["network"];
        assert_eq!(network.stack_name, "prod-network");
        assert_eq!(network.capabilities, vec!["CAPABILITY_IAM".to_string()]);

        let compute = &manifest.stacks["compute"];
        assert!(compute.parameters.is_none());
        assert_eq!(compute.depends_on, vec!["network".to_string()]);
    }

    #[test]
    fn test_minimal_section() {
        let manifest: Manifest = toml::from_str(
            r#"
            [stacks.solo]
            stack_name = "solo"
            template = "solo.yml"
            "#,
        )
        .unwrap();
        let solo = &manifest.stacks["solo"];
        assert!(solo.capabilities.is_empty());
        assert!(solo.depends_on.is_empty());
        assert!(solo.ssh_keys.is_empty());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: std::result::Result<Manifest, _> = toml::from_str(
            r#"
            [stacks.solo]
            stack_name = "solo"
            template = "solo.yml"
            templte_path = "typo.yml"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_entries_resolve_relative_paths() {
        let manifest: Manifest = toml::from_str(FULL).unwrap();
        let entries = manifest.entries(Path::new("/srv/deploy")).unwrap();

        let network = entries.iter().find(|e| e.name() == "network").unwrap();
        assert_eq!(
            network.template(),
            Path::new("/srv/deploy/templates/network.yml")
        );
        assert_eq!(
            network.parameters().unwrap(),
            Path::new("/srv/deploy/params/network.json")
        );
    }

    #[test]
    fn test_entries_keep_absolute_paths() {
        let manifest: Manifest = toml::from_str(
            r#"
            [stacks.solo]
            stack_name = "solo"
            template = "/etc/templates/solo.yml"
            "#,
        )
        .unwrap();
        let entries = manifest.entries(Path::new("/srv/deploy")).unwrap();
        assert_eq!(
            entries[0].template(),
            Path::new("/etc/templates/solo.yml")
        );
    }

    #[test]
    fn test_ssh_key_names_deduplicated() {
        let manifest: Manifest = toml::from_str(
            r#"
            [stacks.a]
            stack_name = "a"
            template = "a.yml"
            ssh_keys = ["worker", "bastion"]

            [stacks.b]
            stack_name = "b"
            template = "b.yml"
            ssh_keys = ["bastion"]
            "#,
        )
        .unwrap();
        assert_eq!(
            manifest.ssh_key_names(),
            vec!["bastion".to_string(), "worker".to_string()]
        );
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cascade.toml");
        fs::write(&path, FULL).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.stacks.len(), 2);

        let missing = Manifest::load(&dir.path().join("absent.toml"));
        assert!(missing.is_err());
    }
}
