//! Domain access assignments carried by accounts and content items

use super::common::DomainId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};

/// Attribute holding the multi-valued domain references of an entity
pub const DOMAIN_ACCESS_FIELD: &str = "field_domain_access";
/// Attribute holding the "applies to all domains" flag of an entity
pub const DOMAIN_ACCESS_ALL_FIELD: &str = "field_domain_all_affiliates";

/// Domain set and all-domains flag attached to an account or content item.
///
/// `domain_ids` may reference domains that have since been deleted; those
/// references are filtered out when the assignment is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessAssignment {
    #[serde(default)]
    pub domain_ids: BTreeSet<DomainId>,
    #[serde(default)]
    pub all_domains: bool,
}

impl AccessAssignment {
    pub fn new<I, D>(domain_ids: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DomainId>,
    {
        Self {
            domain_ids: domain_ids.into_iter().map(Into::into).collect(),
            all_domains: false,
        }
    }

    pub fn all_domains(mut self, all_domains: bool) -> Self {
        self.all_domains = all_domains;
        self
    }
}

/// Capability of anything that can be restricted to a set of domains.
pub trait DomainAssignable {
    /// Raw domain references, `None` when the entity carries no assignment data at all.
    fn domain_references(&self) -> Option<Vec<DomainId>>;

    /// The all-domains flag, `None` when absent.
    fn all_domains_flag(&self) -> Option<bool>;
}

impl DomainAssignable for AccessAssignment {
    fn domain_references(&self) -> Option<Vec<DomainId>> {
        Some(self.domain_ids.iter().cloned().collect())
    }

    fn all_domains_flag(&self) -> Option<bool> {
        Some(self.all_domains)
    }
}

impl<T: DomainAssignable> DomainAssignable for Option<T> {
    fn domain_references(&self) -> Option<Vec<DomainId>> {
        self.as_ref().and_then(DomainAssignable::domain_references)
    }

    fn all_domains_flag(&self) -> Option<bool> {
        self.as_ref().and_then(DomainAssignable::all_domains_flag)
    }
}

/// Tag naming the kind of a domain-aware entity (`user`, `node`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKind(pub String);

impl ItemKind {
    pub const ACCOUNT: &'static str = "user";
    pub const CONTENT: &'static str = "node";

    pub fn new(kind: impl Into<String>) -> Self {
        ItemKind(kind.into())
    }

    pub fn account() -> Self {
        ItemKind::new(Self::ACCOUNT)
    }

    pub fn content() -> Self {
        ItemKind::new(Self::CONTENT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A visitor or user account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// `None` for anonymous visitors
    pub id: Option<String>,
    #[serde(default)]
    pub permissions: HashSet<String>,
    #[serde(default)]
    pub assignment: Option<AccessAssignment>,
}

impl Account {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn with_assignment(mut self, assignment: AccessAssignment) -> Self {
        self.assignment = Some(assignment);
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }
}

impl DomainAssignable for Account {
    fn domain_references(&self) -> Option<Vec<DomainId>> {
        self.assignment.domain_references()
    }

    fn all_domains_flag(&self) -> Option<bool> {
        self.assignment.all_domains_flag()
    }
}

/// A piece of domain-aware content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(default = "ItemKind::content")]
    pub kind: ItemKind,
    #[serde(default)]
    pub assignment: Option<AccessAssignment>,
}

impl ContentItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::content(),
            assignment: None,
        }
    }

    pub fn with_assignment(mut self, assignment: AccessAssignment) -> Self {
        self.assignment = Some(assignment);
        self
    }
}

impl DomainAssignable for ContentItem {
    fn domain_references(&self) -> Option<Vec<DomainId>> {
        self.assignment.domain_references()
    }

    fn all_domains_flag(&self) -> Option<bool> {
        self.assignment.all_domains_flag()
    }
}

/// An attribute-bag record from an external data source.
///
/// Domain references are read from [`DOMAIN_ACCESS_FIELD`] either as plain
/// strings or as `{"target_id": "..."}` items; the flag is read from
/// [`DOMAIN_ACCESS_ALL_FIELD`] as a bool or a 0/1 number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldedEntity {
    pub fields: Map<String, Value>,
}

impl FieldedEntity {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.fields.get(attribute)
    }

    /// Write an assignment back into the well-known attributes.
    pub fn set_assignment(&mut self, assignment: &AccessAssignment) {
        let references = assignment
            .domain_ids
            .iter()
            .map(|id| serde_json::json!({ "target_id": id }))
            .collect();
        self.fields
            .insert(DOMAIN_ACCESS_FIELD.to_string(), Value::Array(references));
        self.fields.insert(
            DOMAIN_ACCESS_ALL_FIELD.to_string(),
            Value::Bool(assignment.all_domains),
        );
    }
}

fn reference_of(value: &Value) -> Option<DomainId> {
    match value {
        Value::String(id) if !id.is_empty() => Some(DomainId::new(id.clone())),
        Value::Object(item) => item
            .get("target_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(DomainId::from),
        _ => None,
    }
}

impl DomainAssignable for FieldedEntity {
    fn domain_references(&self) -> Option<Vec<DomainId>> {
        match self.get(DOMAIN_ACCESS_FIELD)? {
            Value::Null => None,
            Value::Array(items) => Some(items.iter().filter_map(reference_of).collect()),
            single => Some(reference_of(single).into_iter().collect()),
        }
    }

    fn all_domains_flag(&self) -> Option<bool> {
        match self.get(DOMAIN_ACCESS_ALL_FIELD)? {
            Value::Bool(flag) => Some(*flag),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            _ => None,
        }
    }
}
