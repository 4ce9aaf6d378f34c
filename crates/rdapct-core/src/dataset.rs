//! # Datasets
//!
//! Registry-backed lookup tables consulted by format strategies and by the
//! enumerated-value rule: RDAP JSON values (status, role, event action,
//! notice/remark type, variant relation), link relations, media types,
//! RDAP extension identifiers and the IP address space registries.
//!
//! The conformance tool downloads these from IANA. This workspace treats
//! that as an external concern: [`DatasetService`] is the seam, and
//! [`InMemoryDatasets`] is a fixed implementation loadable from YAML:
//!
//! ```yaml
//! catalogs:
//!   status: [active, inactive, locked]
//!   ipv4Allocated: ["1.0.0.0/8", "2.0.0.0/8"]
//! labels:
//!   "rdap_common.json#/definitions/status/items": "status"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// Well-known catalog names.
pub mod catalogs {
    pub const STATUS: &str = "status";
    pub const ROLE: &str = "role";
    pub const EVENT_ACTION: &str = "eventAction";
    pub const NOTICE_AND_REMARK: &str = "noticeAndRemark";
    pub const VARIANT_RELATION: &str = "variantRelation";
    pub const LINK_RELATIONS: &str = "linkRelations";
    pub const MEDIA_TYPES: &str = "mediaTypes";
    pub const RDAP_EXTENSIONS: &str = "rdapExtensions";
    /// CIDR prefixes categorised ALLOCATED or LEGACY.
    pub const IPV4_ALLOCATED: &str = "ipv4Allocated";
    /// CIDR prefixes from the IPv4 special-purpose registry.
    pub const IPV4_SPECIAL: &str = "ipv4Special";
    /// CIDR prefixes categorised Global Unicast.
    pub const IPV6_ALLOCATED: &str = "ipv6Allocated";
    /// CIDR prefixes from the IPv6 special-purpose registry.
    pub const IPV6_SPECIAL: &str = "ipv6Special";
}

/// Lookup of permitted-value catalogs.
pub trait DatasetService: Send + Sync {
    /// Whether `token` is a member of `catalog`. Unknown catalogs have no
    /// members.
    fn is_member(&self, catalog: &str, token: &str) -> bool;

    /// Human-readable catalog name declared for a schema location
    /// (`<document>#<pointer>`).
    fn catalog_label(&self, location: &str) -> Option<String>;

    /// Every value in `catalog`, sorted.
    fn values(&self, catalog: &str) -> Vec<String>;
}

/// Dataset service backed by in-memory tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryDatasets {
    #[serde(default)]
    catalogs: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

impl InMemoryDatasets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load datasets from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Read`] if the file cannot be read and
    /// [`DatasetError::Parse`] if it does not have the expected layout.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            DatasetError::Parse { reason, .. } => DatasetError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse datasets from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, DatasetError> {
        serde_yaml::from_str(content).map_err(|e| DatasetError::Parse {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Add values to a catalog, creating it if needed.
    pub fn with_catalog<I, S>(mut self, catalog: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.catalogs
            .entry(catalog.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Declare the catalog label for a schema location.
    pub fn with_label(mut self, location: &str, label: &str) -> Self {
        self.labels.insert(location.to_string(), label.to_string());
        self
    }

    /// Names of all loaded catalogs.
    pub fn catalog_names(&self) -> Vec<&str> {
        self.catalogs.keys().map(String::as_str).collect()
    }
}

impl DatasetService for InMemoryDatasets {
    fn is_member(&self, catalog: &str, token: &str) -> bool {
        self.catalogs
            .get(catalog)
            .is_some_and(|values| values.contains(token))
    }

    fn catalog_label(&self, location: &str) -> Option<String> {
        self.labels.get(location).cloned()
    }

    fn values(&self, catalog: &str) -> Vec<String> {
        self.catalogs
            .get(catalog)
            .map(|values| values.iter().cloned().collect())
            .unwrap_or_default()
    }
}
