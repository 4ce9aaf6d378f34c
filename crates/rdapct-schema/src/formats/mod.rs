//! # Format Strategies
//!
//! Named string-validation strategies attached to string schema elements
//! through the `format` keyword. The validation bridge installs every
//! registered strategy into the `jsonschema` validator, and classification
//! recognises format failures by the strategy name.
//!
//! A strategy returns `None` for a valid subject and `Some(message)`
//! otherwise. Messages may embed marker tokens (see [`idn`]) or the fixed
//! registry texts in this module that classification matches on.

pub mod idn;
pub mod ip;

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::DateTime;
use rdapct_core::dataset::catalogs;
use rdapct_core::DatasetService;

/// Format names.
pub mod names {
    pub const DATE_TIME: &str = "date-time";
    pub const HOSTNAME: &str = "hostname";
    pub const IDN_HOSTNAME: &str = "idn-hostname";
    pub const HOSTNAME_IN_URI: &str = "hostname-in-uri";
    pub const IPV4_VALIDATION: &str = "ipv4-validation";
    pub const IPV6_VALIDATION: &str = "ipv6-validation";
    pub const RDAP_EXTENSIONS: &str = "rdapExtensions";
}

/// Address outside every ALLOCATED or LEGACY IPv4 prefix.
pub const IPV4_NOT_ALLOCATED_NOR_LEGACY: &str = "The IPv4 address is not included in a prefix categorized as ALLOCATED or LEGACY in the IANA IPv4 Address Space Registry.";
/// Address inside the IPv4 special-purpose registry.
pub const IPV4_PART_OF_SPECIAL_ADDRESSES: &str = "The IPv4 address is included in the IANA IPv4 Special-Purpose Address Registry.";
/// Address outside every Global Unicast IPv6 prefix.
pub const IPV6_NOT_ALLOCATED_NOR_LEGACY: &str = "The IPv6 address is not included in a prefix categorized as Global Unicast in the Internet Protocol Version 6 Address Space.";
/// Address inside the IPv6 special-purpose registry.
pub const IPV6_PART_OF_SPECIAL_ADDRESSES: &str = "The IPv6 address is included in the IANA IPv6 Special-Purpose Address Registry.";

/// A named string-validation rule.
pub trait FormatStrategy: Send + Sync {
    /// Identity used in the schema's `format` keyword.
    fn name(&self) -> &str;

    /// `None` when `subject` is valid, otherwise a description of why not.
    fn validate(&self, subject: &str) -> Option<String>;
}

/// Set of strategies keyed by name.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    strategies: BTreeMap<String, Arc<dyn FormatStrategy>>,
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every strategy the RDAP schemas use, backed by `datasets`.
    pub fn standard(datasets: Arc<dyn DatasetService>) -> Self {
        let ipv4 = Arc::new(Ipv4Format::new(Arc::clone(&datasets)));
        let ipv6 = Arc::new(Ipv6Format::new(Arc::clone(&datasets)));
        let mut registry = Self::new()
            .with(Arc::new(DateTimeFormat))
            .with(Arc::new(HostnameFormat))
            .with(Arc::new(IdnHostnameFormat))
            .with(Arc::new(HostnameInUriFormat::new(Arc::clone(&ipv4), Arc::clone(&ipv6))))
            .with(ipv4)
            .with(ipv6)
            .with(Arc::new(DatasetFormat::new(
                names::RDAP_EXTENSIONS,
                catalogs::RDAP_EXTENSIONS,
                Arc::clone(&datasets),
            )));
        for catalog in [
            catalogs::LINK_RELATIONS,
            catalogs::MEDIA_TYPES,
            catalogs::NOTICE_AND_REMARK,
            catalogs::EVENT_ACTION,
            catalogs::STATUS,
            catalogs::VARIANT_RELATION,
            catalogs::ROLE,
        ] {
            registry.register(Arc::new(DatasetFormat::new(catalog, catalog, Arc::clone(&datasets))));
        }
        registry
    }

    /// Add a strategy, replacing any with the same name.
    pub fn register(&mut self, strategy: Arc<dyn FormatStrategy>) {
        self.strategies.insert(strategy.name().to_string(), strategy);
    }

    pub fn with(mut self, strategy: Arc<dyn FormatStrategy>) -> Self {
        self.register(strategy);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FormatStrategy>> {
        self.strategies.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn FormatStrategy>> {
        self.strategies.values()
    }
}

/// RFC 3339 date-time.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeFormat;

impl FormatStrategy for DateTimeFormat {
    fn name(&self) -> &str {
        names::DATE_TIME
    }

    fn validate(&self, subject: &str) -> Option<String> {
        match DateTime::parse_from_rfc3339(subject) {
            Ok(_) => None,
            Err(e) => Some(format!("[{subject}] is not a valid date-time: {e}")),
        }
    }
}

/// LDH host name.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostnameFormat;

impl FormatStrategy for HostnameFormat {
    fn name(&self) -> &str {
        names::HOSTNAME
    }

    fn validate(&self, subject: &str) -> Option<String> {
        let errors = idn::ldh_errors(subject);
        (!errors.is_empty()).then(|| format!("[{subject}] is not a valid hostname: {}", idn::render_markers(&errors)))
    }
}

/// Internationalised host name. The message is the sorted marker list.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdnHostnameFormat;

impl FormatStrategy for IdnHostnameFormat {
    fn name(&self) -> &str {
        names::IDN_HOSTNAME
    }

    fn validate(&self, subject: &str) -> Option<String> {
        let errors = idn::idn_errors(subject);
        (!errors.is_empty()).then(|| idn::render_markers(&errors))
    }
}

/// Syntax, allocation and special-purpose checks shared by both address
/// families.
struct AddressRegistry {
    datasets: Arc<dyn DatasetService>,
    allocated: &'static str,
    special: &'static str,
    not_allocated: &'static str,
    part_of_special: &'static str,
}

impl AddressRegistry {
    fn check(&self, subject: &str, addr: IpAddr) -> Option<String> {
        let allocated = self.datasets.values(self.allocated);
        if !allocated.is_empty() && !ip::any_contains(&allocated, addr) {
            tracing::debug!(address = subject, "address outside allocated prefixes");
            return Some(self.not_allocated.to_string());
        }
        if ip::any_contains(&self.datasets.values(self.special), addr) {
            tracing::debug!(address = subject, "address in special-purpose registry");
            return Some(self.part_of_special.to_string());
        }
        None
    }
}

/// IPv4 address validated against the address space registries.
pub struct Ipv4Format {
    registry: AddressRegistry,
}

impl Ipv4Format {
    pub fn new(datasets: Arc<dyn DatasetService>) -> Self {
        Self {
            registry: AddressRegistry {
                datasets,
                allocated: catalogs::IPV4_ALLOCATED,
                special: catalogs::IPV4_SPECIAL,
                not_allocated: IPV4_NOT_ALLOCATED_NOR_LEGACY,
                part_of_special: IPV4_PART_OF_SPECIAL_ADDRESSES,
            },
        }
    }
}

impl FormatStrategy for Ipv4Format {
    fn name(&self) -> &str {
        names::IPV4_VALIDATION
    }

    fn validate(&self, subject: &str) -> Option<String> {
        if !ip::is_valid_ipv4_syntax(subject) {
            return Some(format!("[{subject}] is not a valid ipv4 address"));
        }
        let addr = subject.parse().ok()?;
        self.registry.check(subject, IpAddr::V4(addr))
    }
}

/// IPv6 address validated against the address space registries.
pub struct Ipv6Format {
    registry: AddressRegistry,
}

impl Ipv6Format {
    pub fn new(datasets: Arc<dyn DatasetService>) -> Self {
        Self {
            registry: AddressRegistry {
                datasets,
                allocated: catalogs::IPV6_ALLOCATED,
                special: catalogs::IPV6_SPECIAL,
                not_allocated: IPV6_NOT_ALLOCATED_NOR_LEGACY,
                part_of_special: IPV6_PART_OF_SPECIAL_ADDRESSES,
            },
        }
    }
}

impl FormatStrategy for Ipv6Format {
    fn name(&self) -> &str {
        names::IPV6_VALIDATION
    }

    fn validate(&self, subject: &str) -> Option<String> {
        let Ok(addr) = subject.parse() else {
            return Some(format!("[{subject}] is not a valid ipv6 address"));
        };
        self.registry.check(subject, IpAddr::V6(addr))
    }
}

/// The host of a URI must be a valid host name or a valid address.
pub struct HostnameInUriFormat {
    ipv4: Arc<Ipv4Format>,
    ipv6: Arc<Ipv6Format>,
}

impl HostnameInUriFormat {
    pub fn new(ipv4: Arc<Ipv4Format>, ipv6: Arc<Ipv6Format>) -> Self {
        Self { ipv4, ipv6 }
    }
}

impl FormatStrategy for HostnameInUriFormat {
    fn name(&self) -> &str {
        names::HOSTNAME_IN_URI
    }

    fn validate(&self, subject: &str) -> Option<String> {
        let uri = match url::Url::parse(subject) {
            Ok(uri) => uri,
            Err(e) => return Some(format!("[{subject}] is not a valid URI: {e}")),
        };
        match uri.host() {
            None => Some(format!("Can't parse the hostname of the URI {subject}")),
            Some(url::Host::Ipv4(addr)) => self.ipv4.validate(&addr.to_string()),
            Some(url::Host::Ipv6(addr)) => self.ipv6.validate(&addr.to_string()),
            Some(url::Host::Domain(domain)) => IdnHostnameFormat.validate(domain),
        }
    }
}

/// Membership in a dataset catalog.
pub struct DatasetFormat {
    name: String,
    catalog: String,
    datasets: Arc<dyn DatasetService>,
}

impl DatasetFormat {
    pub fn new(name: &str, catalog: &str, datasets: Arc<dyn DatasetService>) -> Self {
        Self {
            name: name.to_string(),
            catalog: catalog.to_string(),
            datasets,
        }
    }
}

impl FormatStrategy for DatasetFormat {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, subject: &str) -> Option<String> {
        (!self.datasets.is_member(&self.catalog, subject))
            .then(|| format!("[{subject}] is not included in {}", self.catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdapct_core::InMemoryDatasets;

    fn datasets() -> Arc<dyn DatasetService> {
        Arc::new(
            InMemoryDatasets::new()
                .with_catalog(catalogs::IPV4_ALLOCATED, ["192.0.0.0/8", "10.0.0.0/8"])
                .with_catalog(catalogs::IPV4_SPECIAL, ["10.0.0.0/8"])
                .with_catalog(catalogs::IPV6_ALLOCATED, ["2000::/3"])
                .with_catalog(catalogs::IPV6_SPECIAL, ["2001:db8::/32"])
                .with_catalog(catalogs::STATUS, ["active"])
                .with_catalog(catalogs::RDAP_EXTENSIONS, ["icann_rdap_response_profile_0"]),
        )
    }

    #[test]
    fn standard_registry_names() {
        let registry = FormatRegistry::standard(datasets());
        for name in [
            names::DATE_TIME,
            names::HOSTNAME,
            names::IDN_HOSTNAME,
            names::HOSTNAME_IN_URI,
            names::IPV4_VALIDATION,
            names::IPV6_VALIDATION,
            names::RDAP_EXTENSIONS,
            catalogs::STATUS,
            catalogs::MEDIA_TYPES,
        ] {
            assert!(registry.get(name).is_some(), "missing strategy {name}");
        }
    }

    #[test]
    fn date_time() {
        assert!(DateTimeFormat.validate("2024-01-01T00:00:00Z").is_none());
        assert!(DateTimeFormat.validate("2024-01-01").is_some());
    }

    #[test]
    fn ipv4_registries() {
        let v4 = Ipv4Format::new(datasets());
        assert!(v4.validate("192.0.2.1").is_none());
        assert_eq!(v4.validate("8.8.8.8").as_deref(), Some(IPV4_NOT_ALLOCATED_NOR_LEGACY));
        assert_eq!(v4.validate("10.1.1.1").as_deref(), Some(IPV4_PART_OF_SPECIAL_ADDRESSES));
        assert!(v4.validate("999.1.1.1").is_some_and(|m| m.contains("not a valid ipv4")));
    }

    #[test]
    fn ipv6_registries() {
        let v6 = Ipv6Format::new(datasets());
        assert!(v6.validate("2600::1").is_none());
        assert_eq!(v6.validate("fe80::1").as_deref(), Some(IPV6_NOT_ALLOCATED_NOR_LEGACY));
        assert_eq!(v6.validate("2001:db8::1").as_deref(), Some(IPV6_PART_OF_SPECIAL_ADDRESSES));
        assert!(v6.validate("2001:::1").is_some());
    }

    #[test]
    fn empty_allocation_registry_skips_the_check() {
        let v4 = Ipv4Format::new(Arc::new(InMemoryDatasets::new()));
        assert!(v4.validate("8.8.8.8").is_none());
    }

    #[test]
    fn hostname_in_uri_dispatches_on_host_kind() {
        let registry = FormatRegistry::standard(datasets());
        let strategy = registry.get(names::HOSTNAME_IN_URI).unwrap();
        assert!(strategy.validate("https://rdap.example.com/domain/x").is_none());
        assert!(strategy.validate("https://192.0.2.1/").is_none());
        assert_eq!(
            strategy.validate("https://8.8.8.8/").as_deref(),
            Some(IPV4_NOT_ALLOCATED_NOR_LEGACY)
        );
        assert!(strategy.validate("https://localhost/").is_some());
        assert!(strategy.validate("not a uri").is_some());
    }

    #[test]
    fn dataset_membership() {
        let registry = FormatRegistry::standard(datasets());
        let status = registry.get(catalogs::STATUS).unwrap();
        assert!(status.validate("active").is_none());
        assert!(status.validate("frozen").is_some());
        let ext = registry.get(names::RDAP_EXTENSIONS).unwrap();
        assert!(ext.validate("icann_rdap_response_profile_0").is_none());
    }
}
