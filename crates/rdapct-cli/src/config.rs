//! # Configuration
//!
//! Settings read from `rdapct.yaml`:
//!
//! ```yaml
//! schema_dir: schemas
//! datasets: datasets/iana.yaml
//! schema: rdap_domain.json
//! strict: false
//! ```
//!
//! Every field is optional. Relative paths resolve against the directory
//! holding the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rdapct_core::{DatasetService, InMemoryDatasets};
use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up at the repository root.
pub const CONFIG_FILE: &str = "rdapct.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RdapctConfig {
    /// Directory of `*.json` schema documents.
    pub schema_dir: PathBuf,
    /// IANA dataset snapshot. `None` runs with empty catalogs.
    pub datasets: Option<PathBuf>,
    /// Root schema used when `--schema` is not given.
    pub schema: String,
    /// Refuse schemas with metadata gaps instead of warning.
    pub strict: bool,
}

impl Default for RdapctConfig {
    fn default() -> Self {
        Self {
            schema_dir: PathBuf::from("schemas"),
            datasets: Some(PathBuf::from("datasets/iana.yaml")),
            schema: "rdap_domain.json".to_string(),
            strict: false,
        }
    }
}

impl RdapctConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self =
            serde_yaml::from_str(&content).with_context(|| format!("failed to parse config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.relative_to(base))
    }

    /// `<repo_root>/rdapct.yaml` if present, otherwise the defaults
    /// anchored at `repo_root`.
    pub fn discover(repo_root: &Path) -> Result<Self> {
        let path = repo_root.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "using config file");
            Self::load(&path)
        } else {
            Ok(Self::default().relative_to(repo_root))
        }
    }

    /// Anchor relative paths at `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        self.schema_dir = crate::anchor(&self.schema_dir, base);
        self.datasets = self.datasets.map(|p| crate::anchor(&p, base));
        self
    }

    /// The configured datasets, or empty catalogs.
    pub fn load_datasets(&self) -> Result<Arc<dyn DatasetService>> {
        let Some(path) = &self.datasets else {
            tracing::warn!("no datasets configured; dataset-backed formats reject every value");
            return Ok(Arc::new(InMemoryDatasets::new()));
        };
        let datasets = InMemoryDatasets::from_yaml_file(path)
            .with_context(|| format!("failed to load datasets {}", path.display()))?;
        tracing::info!(path = %path.display(), catalogs = datasets.catalog_names().len(), "loaded datasets");
        Ok(Arc::new(datasets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{}").unwrap();
        let config = RdapctConfig::load(&path).unwrap();
        assert_eq!(config.schema_dir, dir.path().join("schemas"));
        assert_eq!(config.datasets, Some(dir.path().join("datasets/iana.yaml")));
        assert_eq!(config.schema, "rdap_domain.json");
        assert!(!config.strict);
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "schema_dir: /opt/rdap/schemas\ndatasets: null\nschema: rdap_nameserver.json\nstrict: true\n",
        )
        .unwrap();
        let config = RdapctConfig::load(&path).unwrap();
        assert_eq!(config.schema_dir, PathBuf::from("/opt/rdap/schemas"));
        assert_eq!(config.datasets, None);
        assert_eq!(config.schema, "rdap_nameserver.json");
        assert!(config.strict);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "schema_directory: schemas\n").unwrap();
        assert!(RdapctConfig::load(&path).is_err());
    }

    #[test]
    fn discover_without_file_anchors_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RdapctConfig::discover(dir.path()).unwrap();
        assert_eq!(config.schema_dir, dir.path().join("schemas"));
    }

    #[test]
    fn missing_datasets_file_is_an_error() {
        let config = RdapctConfig {
            datasets: Some(PathBuf::from("/nonexistent/iana.yaml")),
            ..RdapctConfig::default()
        };
        assert!(config.load_datasets().is_err());
    }

    #[test]
    fn no_datasets_means_empty_catalogs() {
        let config = RdapctConfig {
            datasets: None,
            ..RdapctConfig::default()
        };
        let datasets = config.load_datasets().unwrap();
        assert!(!datasets.is_member("status", "active"));
    }
}
