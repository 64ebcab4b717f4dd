//! Nested-block collections and their stable element identities
//!
//! The declared form of a nested collection has no positional stability: the
//! same configuration can arrive with its blocks in any order. Elements are
//! therefore identified by a canonical tuple of their significant fields, and
//! diffs are computed against that identity rather than against positions.
//!
//! A second contract matters as much as identity: a collection that is
//! *omitted* from the configuration leaves the remote value untouched, while
//! a collection that is declared *empty* clears the remote value down to the
//! platform default. [`BlockList`] keeps those two states distinguishable all
//! the way to the wire encoding.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// Priority assigned to ip_restriction blocks that omit one, in declaration
/// order from this base. Matches the platform's own default band.
pub const DEFAULT_RESTRICTION_PRIORITY: u32 = 65000;

/// A nested-block collection field that distinguishes "omitted" from
/// "explicitly empty"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockList<T> {
    /// Field absent from the configuration; the remote collection is left as
    /// it is, implicit platform defaults included
    Unset,
    /// Field present, possibly with zero elements; the remote collection is
    /// replaced by exactly these elements
    Set(Vec<T>),
}

impl<T> BlockList<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Declared elements, or `None` when the field was omitted
    pub fn as_set(&self) -> Option<&[T]> {
        match self {
            Self::Unset => None,
            Self::Set(items) => Some(items),
        }
    }
}

impl<T> Default for BlockList<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> From<Vec<T>> for BlockList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Set(items)
    }
}

// A missing key deserializes to Unset through Default; a present key, even
// `[]`, always becomes Set.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for BlockList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Self::Set(Vec::deserialize(deserializer)?))
    }
}

impl<T: Serialize> Serialize for BlockList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Unset => serializer.serialize_none(),
            Self::Set(items) => items.serialize(serializer),
        }
    }
}

/// An element of an order-insensitive collection
///
/// `identity` is the canonical field tuple elements are matched by;
/// `same_settings` compares the remaining attributes to tell an in-place
/// update from an unchanged element.
pub trait CollectionElement {
    type Key: Eq + Hash + Clone + fmt::Debug;

    const COLLECTION: &'static str;

    fn identity(&self) -> Self::Key;
    fn same_settings(&self, other: &Self) -> bool;
}

/// Identity-keyed difference between a desired and a current collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDelta<T> {
    pub added: Vec<T>,
    pub updated: Vec<T>,
    pub removed: Vec<T>,
    pub unchanged: usize,
}

impl<T> Default for CollectionDelta<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
            unchanged: 0,
        }
    }
}

impl<T> CollectionDelta<T> {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }
}

/// Diff two collections by element identity
///
/// Declaration order contributes nothing: any permutation of `desired`
/// produces the same delta.
pub fn diff_elements<T>(desired: &[T], current: &[T]) -> CollectionDelta<T>
where
    T: CollectionElement + Clone,
{
    let current_by_key: HashMap<T::Key, &T> =
        current.iter().map(|e| (e.identity(), e)).collect();
    let mut delta = CollectionDelta::default();

    for element in desired {
        match current_by_key.get(&element.identity()) {
            None => delta.added.push(element.clone()),
            Some(existing) if element.same_settings(existing) => delta.unchanged += 1,
            Some(_) => delta.updated.push(element.clone()),
        }
    }

    let desired_keys: HashSet<T::Key> = desired.iter().map(|e| e.identity()).collect();
    for element in current {
        if !desired_keys.contains(&element.identity()) {
            delta.removed.push(element.clone());
        }
    }

    delta
}

/// Reject collections that declare the same identity twice
pub fn reject_duplicates<T: CollectionElement>(items: &[T]) -> Result<()> {
    let mut seen: HashSet<T::Key> = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.identity()) {
            return Err(CoreError::DuplicateElement {
                collection: T::COLLECTION,
                key: format!("{:?}", item.identity()),
            });
        }
    }
    Ok(())
}

/// Access rule for an ip_restriction block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RestrictionAction {
    #[default]
    Allow,
    Deny,
}

impl fmt::Display for RestrictionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "Allow"),
            Self::Deny => write!(f, "Deny"),
        }
    }
}

/// A declared ip_restriction block
///
/// Exactly one of `ip_address`, `service_tag` or `virtual_network_subnet_id`
/// must be set. `priority` and `name` are optional attributes; an omitted
/// priority is default-filled during normalization and does not participate
/// in element identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IpRestriction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_subnet_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    #[serde(default)]
    pub action: RestrictionAction,
}

/// What an ip_restriction applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestrictionTarget {
    /// An IP address or CIDR range
    Cidr(String),
    /// A platform service tag such as `AzureFrontDoor.Backend`
    ServiceTag(String),
    /// A virtual-network subnet resource id
    Subnet(String),
}

impl fmt::Display for RestrictionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cidr(v) | Self::ServiceTag(v) | Self::Subnet(v) => write!(f, "{v}"),
        }
    }
}

/// Canonical identity of an ip_restriction element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RestrictionKey {
    pub target: RestrictionTarget,
    pub action: RestrictionAction,
}

/// An ip_restriction after validation and default-fill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRestriction {
    pub target: RestrictionTarget,
    pub action: RestrictionAction,
    pub priority: u32,
    /// True when the priority was default-filled rather than declared;
    /// default-filled priorities never force an in-place update
    pub priority_is_default: bool,
    pub name: Option<String>,
}

impl CollectionElement for NormalizedRestriction {
    type Key = RestrictionKey;

    const COLLECTION: &'static str = "ip_restriction";

    fn identity(&self) -> RestrictionKey {
        RestrictionKey {
            target: self.target.clone(),
            action: self.action,
        }
    }

    fn same_settings(&self, other: &Self) -> bool {
        let priority_matches =
            self.priority_is_default || other.priority_is_default || self.priority == other.priority;
        let name_matches = match (&self.name, &other.name) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        priority_matches && name_matches
    }
}

/// Validate and normalize a declared ip_restriction collection
///
/// Omitted priorities are assigned in declaration order starting at
/// [`DEFAULT_RESTRICTION_PRIORITY`]. The `"Any"` address is the wire encoding
/// of the platform's implicit allow-all rule and is dropped rather than
/// treated as an explicit element. Duplicate identities are rejected.
pub fn normalize_ip_restrictions(declared: &[IpRestriction]) -> Result<Vec<NormalizedRestriction>> {
    let mut normalized = Vec::with_capacity(declared.len());
    let mut next_default = DEFAULT_RESTRICTION_PRIORITY;

    for (index, restriction) in declared.iter().enumerate() {
        if restriction.ip_address.as_deref() == Some("Any") {
            continue;
        }

        let target = restriction_target(restriction, index)?;
        let (priority, priority_is_default) = match restriction.priority {
            Some(priority) => (priority, false),
            None => {
                let assigned = next_default;
                next_default += 1;
                (assigned, true)
            }
        };

        normalized.push(NormalizedRestriction {
            target,
            action: restriction.action,
            priority,
            priority_is_default,
            name: restriction.name.clone(),
        });
    }

    reject_duplicates(&normalized)?;
    Ok(normalized)
}

fn restriction_target(restriction: &IpRestriction, index: usize) -> Result<RestrictionTarget> {
    let address = restriction.ip_address.as_deref().filter(|v| !v.is_empty());
    let tag = restriction.service_tag.as_deref().filter(|v| !v.is_empty());
    let subnet = restriction
        .virtual_network_subnet_id
        .as_deref()
        .filter(|v| !v.is_empty());

    match (address, tag, subnet) {
        (Some(cidr), None, None) => {
            validate_cidr(cidr)?;
            Ok(RestrictionTarget::Cidr(cidr.to_string()))
        }
        (None, Some(tag), None) => Ok(RestrictionTarget::ServiceTag(tag.to_string())),
        (None, None, Some(subnet)) => Ok(RestrictionTarget::Subnet(subnet.to_string())),
        _ => Err(CoreError::RestrictionTargetAmbiguous { index }),
    }
}

/// Validate an IP address or CIDR range, rejecting malformed values locally
pub fn validate_cidr(value: &str) -> Result<()> {
    let (address, prefix) = match value.split_once('/') {
        Some((address, prefix)) => (address, Some(prefix)),
        None => (value, None),
    };

    let parsed: std::net::IpAddr = address.parse().map_err(|_| CoreError::InvalidAddress {
        value: value.to_string(),
        reason: "not a valid IP address".to_string(),
    })?;

    if let Some(prefix) = prefix {
        let max_prefix = if parsed.is_ipv4() { 32 } else { 128 };
        let parsed_prefix: u32 = prefix.parse().map_err(|_| CoreError::InvalidAddress {
            value: value.to_string(),
            reason: "prefix length is not a number".to_string(),
        })?;
        if parsed_prefix > max_prefix {
            return Err(CoreError::InvalidAddress {
                value: value.to_string(),
                reason: format!("prefix length must be at most {max_prefix}"),
            });
        }
    }
    Ok(())
}

/// Connection string kind, mirroring the platform's enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStringType {
    ApiHub,
    Custom,
    DocDb,
    EventHub,
    MySql,
    NotificationHub,
    PostgreSql,
    RedisCache,
    ServiceBus,
    SqlAzure,
    SqlServer,
}

impl fmt::Display for ConnectionStringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ApiHub => "APIHub",
            Self::Custom => "Custom",
            Self::DocDb => "DocDb",
            Self::EventHub => "EventHub",
            Self::MySql => "MySQL",
            Self::NotificationHub => "NotificationHub",
            Self::PostgreSql => "PostgreSQL",
            Self::RedisCache => "RedisCache",
            Self::ServiceBus => "ServiceBus",
            Self::SqlAzure => "SQLAzure",
            Self::SqlServer => "SQLServer",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for ConnectionStringType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = match s {
            "APIHub" => Self::ApiHub,
            "Custom" => Self::Custom,
            "DocDb" => Self::DocDb,
            "EventHub" => Self::EventHub,
            "MySQL" => Self::MySql,
            "NotificationHub" => Self::NotificationHub,
            "PostgreSQL" => Self::PostgreSql,
            "RedisCache" => Self::RedisCache,
            "ServiceBus" => Self::ServiceBus,
            "SQLAzure" => Self::SqlAzure,
            "SQLServer" => Self::SqlServer,
            other => {
                return Err(CoreError::InvalidField {
                    field: "connection_string.type",
                    value: other.to_string(),
                    reason: "unknown connection string type".to_string(),
                });
            }
        };
        Ok(parsed)
    }
}

/// A declared connection_string block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionString {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ConnectionStringType,
    pub value: String,
}

impl CollectionElement for ConnectionString {
    type Key = (String, ConnectionStringType);

    const COLLECTION: &'static str = "connection_string";

    fn identity(&self) -> Self::Key {
        (self.name.clone(), self.kind)
    }

    fn same_settings(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Validate a declared connection_string collection
///
/// The remote collection is keyed by name alone, so a duplicated name is
/// ambiguous even when the types differ.
pub fn validate_connection_strings(declared: &[ConnectionString]) -> Result<()> {
    let mut seen_names: HashSet<&str> = HashSet::with_capacity(declared.len());
    for connection in declared {
        if connection.name.is_empty() {
            return Err(CoreError::InvalidField {
                field: "connection_string.name",
                value: String::new(),
                reason: "name must not be empty".to_string(),
            });
        }
        if !seen_names.insert(connection.name.as_str()) {
            return Err(CoreError::DuplicateElement {
                collection: ConnectionString::COLLECTION,
                key: format!("{:?}", connection.name),
            });
        }
    }
    Ok(())
}

/// Backing store kind for a storage_account mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    AzureBlob,
    AzureFiles,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AzureBlob => write!(f, "AzureBlob"),
            Self::AzureFiles => write!(f, "AzureFiles"),
        }
    }
}

/// A declared storage_account mount block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccountMount {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StorageType,
    pub account_name: String,
    pub share_name: String,
    pub access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,
}

impl CollectionElement for StorageAccountMount {
    type Key = (String, StorageType);

    const COLLECTION: &'static str = "storage_account";

    fn identity(&self) -> Self::Key {
        (self.name.clone(), self.kind)
    }

    fn same_settings(&self, other: &Self) -> bool {
        self.account_name == other.account_name
            && self.share_name == other.share_name
            && self.access_key == other.access_key
            && self.mount_path == other.mount_path
    }
}

/// Validate a declared storage_account collection
pub fn validate_storage_accounts(declared: &[StorageAccountMount]) -> Result<()> {
    for mount in declared {
        for (field, value) in [
            ("storage_account.name", &mount.name),
            ("storage_account.account_name", &mount.account_name),
            ("storage_account.share_name", &mount.share_name),
            ("storage_account.access_key", &mount.access_key),
        ] {
            if value.is_empty() {
                return Err(CoreError::InvalidField {
                    field,
                    value: String::new(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
    }
    reject_duplicates(declared)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cidr(address: &str) -> IpRestriction {
        IpRestriction {
            ip_address: Some(address.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn block_list_distinguishes_unset_from_empty() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(default)]
            items: BlockList<ConnectionString>,
        }

        let omitted: Wrapper = serde_json::from_str("{}").unwrap();
        assert!(omitted.items.is_unset());

        let empty: Wrapper = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(empty.items.as_set(), Some(&[][..]));
    }

    #[test]
    fn priorities_fill_in_declaration_order() {
        let declared = vec![
            cidr("10.10.10.10/32"),
            IpRestriction {
                priority: Some(123),
                ..cidr("20.20.20.0/24")
            },
            cidr("30.30.0.0/16"),
        ];
        let normalized = normalize_ip_restrictions(&declared).unwrap();
        assert_eq!(normalized[0].priority, DEFAULT_RESTRICTION_PRIORITY);
        assert!(normalized[0].priority_is_default);
        assert_eq!(normalized[1].priority, 123);
        assert!(!normalized[1].priority_is_default);
        assert_eq!(normalized[2].priority, DEFAULT_RESTRICTION_PRIORITY + 1);
    }

    #[test]
    fn permuted_collections_diff_identically() {
        let a = vec![
            IpRestriction {
                priority: Some(123),
                ..cidr("10.10.10.10/32")
            },
            cidr("20.20.20.0/24"),
        ];
        let b: Vec<IpRestriction> = a.iter().rev().cloned().collect();

        let current = normalize_ip_restrictions(&[IpRestriction {
            priority: Some(123),
            ..cidr("10.10.10.10/32")
        }])
        .unwrap();

        let delta_a = diff_elements(&normalize_ip_restrictions(&a).unwrap(), &current);
        let delta_b = diff_elements(&normalize_ip_restrictions(&b).unwrap(), &current);

        assert_eq!(delta_a.added.len(), 1);
        assert_eq!(delta_a.added[0].target, RestrictionTarget::Cidr("20.20.20.0/24".into()));
        assert_eq!(delta_a.unchanged, 1);
        assert!(delta_a.removed.is_empty());
        assert_eq!(delta_a.added[0].identity(), delta_b.added[0].identity());
        assert_eq!(delta_b.unchanged, 1);
    }

    #[test]
    fn default_filled_priority_does_not_force_update() {
        let desired = normalize_ip_restrictions(&[cidr("10.0.0.0/8")]).unwrap();
        let mut current = desired.clone();
        current[0].priority = 64999;
        current[0].priority_is_default = false;

        let delta = diff_elements(&desired, &current);
        assert!(delta.is_noop());
        assert_eq!(delta.unchanged, 1);
    }

    #[test]
    fn explicit_priority_change_updates_in_place() {
        let desired = normalize_ip_restrictions(&[IpRestriction {
            priority: Some(100),
            ..cidr("10.0.0.0/8")
        }])
        .unwrap();
        let current = normalize_ip_restrictions(&[IpRestriction {
            priority: Some(200),
            ..cidr("10.0.0.0/8")
        }])
        .unwrap();

        let delta = diff_elements(&desired, &current);
        assert_eq!(delta.updated.len(), 1);
        assert!(delta.added.is_empty());
        assert!(delta.removed.is_empty());
    }

    #[test]
    fn duplicate_restriction_identities_are_rejected() {
        let declared = vec![cidr("10.0.0.0/8"), cidr("10.0.0.0/8")];
        let err = normalize_ip_restrictions(&declared).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateElement { collection: "ip_restriction", .. }));
    }

    #[test]
    fn same_cidr_with_different_action_is_distinct() {
        let declared = vec![
            cidr("10.0.0.0/8"),
            IpRestriction {
                action: RestrictionAction::Deny,
                ..cidr("10.0.0.0/8")
            },
        ];
        assert_eq!(normalize_ip_restrictions(&declared).unwrap().len(), 2);
    }

    #[test]
    fn ambiguous_and_empty_targets_are_rejected() {
        let both = IpRestriction {
            service_tag: Some("AzureFrontDoor.Backend".to_string()),
            ..cidr("10.0.0.0/8")
        };
        assert!(matches!(
            normalize_ip_restrictions(&[both]).unwrap_err(),
            CoreError::RestrictionTargetAmbiguous { index: 0 }
        ));

        let neither = IpRestriction::default();
        assert!(normalize_ip_restrictions(&[neither]).is_err());
    }

    #[test]
    fn malformed_cidr_is_rejected_locally() {
        assert!(validate_cidr("10.10.10.10/32").is_ok());
        assert!(validate_cidr("10.10.10.10").is_ok());
        assert!(validate_cidr("2001:db8::/48").is_ok());
        assert!(validate_cidr("10.10.10/32").is_err());
        assert!(validate_cidr("10.0.0.0/33").is_err());
        assert!(validate_cidr("not-an-ip").is_err());
    }

    #[test]
    fn any_sentinel_is_dropped() {
        let declared = vec![cidr("Any"), cidr("10.0.0.0/8")];
        let normalized = normalize_ip_restrictions(&declared).unwrap();
        assert_eq!(normalized.len(), 1);
    }

    #[test]
    fn duplicate_connection_string_names_are_ambiguous() {
        let declared = vec![
            ConnectionString {
                name: "main".to_string(),
                kind: ConnectionStringType::SqlAzure,
                value: "Server=a".to_string(),
            },
            ConnectionString {
                name: "main".to_string(),
                kind: ConnectionStringType::PostgreSql,
                value: "Server=b".to_string(),
            },
        ];
        assert!(validate_connection_strings(&declared).is_err());
    }

    #[test]
    fn connection_string_value_change_is_an_update() {
        let desired = vec![ConnectionString {
            name: "main".to_string(),
            kind: ConnectionStringType::SqlAzure,
            value: "Server=new".to_string(),
        }];
        let current = vec![ConnectionString {
            name: "main".to_string(),
            kind: ConnectionStringType::SqlAzure,
            value: "Server=old".to_string(),
        }];
        let delta = diff_elements(&desired, &current);
        assert_eq!(delta.updated.len(), 1);
        assert!(delta.added.is_empty() && delta.removed.is_empty());
    }
}
