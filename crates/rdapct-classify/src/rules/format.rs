//! Rules keyed on the format strategy attached to a string schema.

use rdapct_core::dataset::catalogs;
use rdapct_core::DiagnosticRecord;
use rdapct_schema::formats::{self, idn, ip, names};

use super::RuleContext;
use crate::error::ClassifyError;

pub const IPV4_SYNTAX_CODE: i32 = -10100;
pub const IPV4_NOT_ALLOCATED_CODE: i32 = -10101;
pub const IPV4_SPECIAL_CODE: i32 = -10102;
pub const IPV6_SYNTAX_CODE: i32 = -10200;
pub const IPV6_NOT_ALLOCATED_CODE: i32 = -10201;
pub const IPV6_SPECIAL_CODE: i32 = -10202;

/// The format strategy a [`super::Rule::Format`] rule targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTarget {
    DateTime,
    Hostname,
    HostnameInUri,
    IdnHostname,
    Ipv4,
    Ipv6,
    MediaTypes,
    LinkRelations,
    NoticeAndRemark,
    EventAction,
    Status,
    Role,
    VariantRelation,
    RdapExtensions,
}

impl FormatTarget {
    pub const ALL: [FormatTarget; 14] = [
        FormatTarget::DateTime,
        FormatTarget::Hostname,
        FormatTarget::HostnameInUri,
        FormatTarget::IdnHostname,
        FormatTarget::Ipv4,
        FormatTarget::Ipv6,
        FormatTarget::MediaTypes,
        FormatTarget::LinkRelations,
        FormatTarget::NoticeAndRemark,
        FormatTarget::EventAction,
        FormatTarget::Status,
        FormatTarget::Role,
        FormatTarget::VariantRelation,
        FormatTarget::RdapExtensions,
    ];

    /// The `format` value schemas use for this strategy.
    pub fn format_name(self) -> &'static str {
        match self {
            FormatTarget::DateTime => names::DATE_TIME,
            FormatTarget::Hostname => names::HOSTNAME,
            FormatTarget::HostnameInUri => names::HOSTNAME_IN_URI,
            FormatTarget::IdnHostname => names::IDN_HOSTNAME,
            FormatTarget::Ipv4 => names::IPV4_VALIDATION,
            FormatTarget::Ipv6 => names::IPV6_VALIDATION,
            FormatTarget::MediaTypes => catalogs::MEDIA_TYPES,
            FormatTarget::LinkRelations => catalogs::LINK_RELATIONS,
            FormatTarget::NoticeAndRemark => catalogs::NOTICE_AND_REMARK,
            FormatTarget::EventAction => catalogs::EVENT_ACTION,
            FormatTarget::Status => catalogs::STATUS,
            FormatTarget::Role => catalogs::ROLE,
            FormatTarget::VariantRelation => catalogs::VARIANT_RELATION,
            FormatTarget::RdapExtensions => names::RDAP_EXTENSIONS,
        }
    }

    /// Label of an RDAP JSON values catalog, for the targets backed by one.
    fn json_values_label(self) -> Option<&'static str> {
        match self {
            FormatTarget::NoticeAndRemark => Some("notice and remark type"),
            FormatTarget::EventAction => Some("event action"),
            FormatTarget::Status => Some("status"),
            FormatTarget::Role => Some("role"),
            FormatTarget::VariantRelation => Some("variant relation"),
            _ => None,
        }
    }

    pub(super) fn matches(self, cx: &RuleContext<'_>) -> bool {
        cx.failure.keyword() == Some("format") && cx.violated().format() == Some(self.format_name())
    }

    pub(super) fn apply(self, cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
        let message = match self {
            FormatTarget::IdnHostname => return idn_hostname(cx),
            FormatTarget::Ipv4 => return ipv4(cx).map(|r| vec![r]),
            FormatTarget::Ipv6 => return ipv6(cx).map(|r| vec![r]),
            FormatTarget::DateTime => {
                "The JSON value shall be a syntactically valid time and date according to RFC3339.".to_string()
            }
            FormatTarget::Hostname => "The JSON value is not a syntactically valid host name.".to_string(),
            FormatTarget::HostnameInUri => {
                "The host in the URI is not a syntactically valid host name or IP address.".to_string()
            }
            FormatTarget::MediaTypes => "The JSON value is not included as a Name in mediaTypes.".to_string(),
            FormatTarget::LinkRelations => {
                "The JSON value is not included as a Relation Name in linkRelations.".to_string()
            }
            FormatTarget::RdapExtensions => {
                "The JSON string is not included as an Extension Identifier in RDAPExtensions.".to_string()
            }
            other => format!(
                "The JSON string is not included as a Value with Type=\"{}\" in the RDAPJSONValues dataset.",
                other.json_values_label().unwrap_or(other.format_name())
            ),
        };
        Ok(vec![cx.record(cx.code("errorCode")?, cx.pointer_value(), cx.message_or(message))])
    }
}

/// One record per marker found in the message, then the generic record.
fn idn_hostname(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    const MARKERS: [(&str, &str, &str); 3] = [
        (
            idn::LABEL_TOO_LONG,
            "labelTooLong",
            "A DNS label with length not between 1 and 63 was found.",
        ),
        (
            idn::DOMAIN_NAME_TOO_LONG,
            "domainTooLong",
            "A domain name of more than 253 characters was found.",
        ),
        (
            idn::LESS_THAN_TWO_LABELS,
            "lessThanTwoLabels",
            "A domain name with less than two labels was found. See RDAP_Technical_Implementation_Guide_2_1 section 1.10.",
        ),
    ];

    let message = cx.failure.message();
    let value = cx.pointer_value();
    let mut records = Vec::new();
    for (marker, key, text) in MARKERS {
        if message.contains(marker) {
            records.push(cx.record(cx.code(key)?, value.clone(), text));
        }
    }
    records.push(cx.record(
        cx.code("errorCode")?,
        value,
        format!(
            "A label not being a valid \"U-label\"/\"A-label\" or \"NR-LDH label\" was found. {}",
            message.replace(cx.failure.pointer(), "Reasons")
        ),
    ));
    Ok(records)
}

fn ipv4(cx: &RuleContext<'_>) -> Result<DiagnosticRecord, ClassifyError> {
    let subject = cx.rendered_value();
    let message = cx.failure.message();
    let value = cx.pointer_value();
    if !ip::is_valid_ipv4_syntax(&subject) {
        return Ok(cx.record(
            IPV4_SYNTAX_CODE,
            value,
            "The IPv4 address is not syntactically valid in dot-decimal notation.",
        ));
    }
    if message.contains(formats::IPV4_NOT_ALLOCATED_NOR_LEGACY) {
        return Ok(cx.record(IPV4_NOT_ALLOCATED_CODE, value, formats::IPV4_NOT_ALLOCATED_NOR_LEGACY));
    }
    if message.contains(formats::IPV4_PART_OF_SPECIAL_ADDRESSES) {
        return Ok(cx.record(IPV4_SPECIAL_CODE, value, formats::IPV4_PART_OF_SPECIAL_ADDRESSES));
    }
    Ok(cx.record(
        cx.code("errorCode")?,
        value,
        cx.message_or("The v4 structure is not syntactically valid.".to_string()),
    ))
}

fn ipv6(cx: &RuleContext<'_>) -> Result<DiagnosticRecord, ClassifyError> {
    let subject = cx.rendered_value();
    let message = cx.failure.message();
    let value = cx.pointer_value();
    if !ip::is_valid_ipv6_syntax(&subject) {
        return Ok(cx.record(IPV6_SYNTAX_CODE, value, "The IPv6 address is not syntactically valid."));
    }
    if message.contains(formats::IPV6_NOT_ALLOCATED_NOR_LEGACY) {
        return Ok(cx.record(IPV6_NOT_ALLOCATED_CODE, value, formats::IPV6_NOT_ALLOCATED_NOR_LEGACY));
    }
    if message.contains(formats::IPV6_PART_OF_SPECIAL_ADDRESSES) {
        return Ok(cx.record(IPV6_SPECIAL_CODE, value, formats::IPV6_PART_OF_SPECIAL_ADDRESSES));
    }
    Ok(cx.record(
        cx.code("errorCode")?,
        value,
        cx.message_or("The v6 structure is not syntactically valid.".to_string()),
    ))
}
