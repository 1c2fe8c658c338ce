//! Domain (site) model

use super::common::DomainId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Domain status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    #[default]
    Active,
    Inactive,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::Active => "active",
            DomainStatus::Inactive => "inactive",
        }
    }
}

impl std::str::FromStr for DomainStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(DomainStatus::Active),
            "inactive" => Ok(DomainStatus::Inactive),
            _ => Err(format!("Unknown domain status: {}", s)),
        }
    }
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for DomainStatus {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for DomainStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

/// URL scheme used to build a domain's canonical path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DomainScheme {
    #[default]
    Http,
    Https,
}

impl DomainScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainScheme::Http => "http",
            DomainScheme::Https => "https",
        }
    }
}

impl std::str::FromStr for DomainScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(DomainScheme::Http),
            "https" => Ok(DomainScheme::Https),
            _ => Err(format!("Unknown scheme: {}", s)),
        }
    }
}

impl std::fmt::Display for DomainScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for DomainScheme {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for DomainScheme {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

/// A logical site served from the shared deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Domain {
    pub id: DomainId,
    pub hostname: String,
    pub name: String,
    pub scheme: DomainScheme,
    pub weight: i32,
    pub status: DomainStatus,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    pub fn is_active(&self) -> bool {
        self.status == DomainStatus::Active
    }

    /// Canonical path of the domain, e.g. `http://one.example.com/`.
    pub fn path(&self) -> String {
        format!("{}://{}/", self.scheme, self.hostname)
    }

    /// Absolute URL for `path` on this domain.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}://{}/{}",
            self.scheme,
            self.hostname,
            path.trim_start_matches('/')
        )
    }

    /// Case-insensitive, exact hostname comparison
    pub fn matches_host(&self, host: &str) -> bool {
        self.hostname.eq_ignore_ascii_case(host.trim())
    }
}

impl Default for Domain {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: DomainId::default(),
            hostname: String::new(),
            name: String::new(),
            scheme: DomainScheme::default(),
            weight: 0,
            status: DomainStatus::default(),
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a new domain
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateDomainInput {
    #[validate(length(min = 1, max = 255), custom(function = "validate_hostname"))]
    pub hostname: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    /// Explicit machine name; derived from the hostname when absent
    #[validate(length(min = 1, max = 128), custom(function = "validate_machine_name"))]
    pub id: Option<String>,
    pub scheme: Option<DomainScheme>,
    pub weight: Option<i32>,
    pub status: Option<DomainStatus>,
}

impl CreateDomainInput {
    pub fn new(hostname: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Trim and lowercase the hostname so lookups stay case-insensitive.
    pub fn normalize(&mut self) {
        self.hostname = normalize_hostname(&self.hostname);
        self.name = self.name.trim().to_string();
        if let Some(id) = self.id.as_mut() {
            *id = id.trim().to_string();
        }
    }

    /// The machine name this input will be stored under.
    pub fn machine_name(&self) -> DomainId {
        match &self.id {
            Some(id) => DomainId::new(id.clone()),
            None => DomainId::from_hostname(&self.hostname),
        }
    }
}

/// Input for updating a domain; identity is immutable
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateDomainInput {
    #[validate(length(min = 1, max = 255), custom(function = "validate_hostname"))]
    pub hostname: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub scheme: Option<DomainScheme>,
    pub weight: Option<i32>,
}

impl UpdateDomainInput {
    pub fn normalize(&mut self) {
        if let Some(hostname) = self.hostname.as_mut() {
            *hostname = normalize_hostname(hostname);
        }
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
        }
    }
}

/// Record handed to the repository once the registry has settled identity
/// and ordering. `is_default` is a request; storage grants it only when no
/// other default exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDomain {
    pub id: DomainId,
    pub hostname: String,
    pub name: String,
    pub scheme: DomainScheme,
    pub weight: i32,
    pub status: DomainStatus,
    pub is_default: bool,
}

/// Longest machine name the `domains.id` column holds
pub const MAX_MACHINE_NAME_LENGTH: usize = 128;

pub fn normalize_hostname(hostname: &str) -> String {
    hostname.trim().to_lowercase()
}

fn validate_hostname(hostname: &str) -> Result<(), validator::ValidationError> {
    if HOSTNAME_REGEX.is_match(hostname) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_hostname"))
    }
}

fn validate_machine_name(id: &str) -> Result<(), validator::ValidationError> {
    if MACHINE_NAME_REGEX.is_match(id) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_machine_name"))
    }
}

lazy_static::lazy_static! {
    pub static ref HOSTNAME_REGEX: regex::Regex = regex::Regex::new(
        r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)*(?::[0-9]{1,5})?$"
    )
    .unwrap();
    pub static ref MACHINE_NAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-z0-9_]+$").unwrap();
}
