//! Common types for domain models

use serde::{Deserialize, Serialize};

/// Machine name of a domain, stored as VARCHAR in MySQL.
///
/// Identity is immutable once the domain has been created.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainId(pub String);

impl DomainId {
    pub fn new(id: impl Into<String>) -> Self {
        DomainId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a machine name from a hostname.
    ///
    /// Lowercases and collapses every run of characters outside `[a-z0-9]`
    /// into a single underscore: `One.Example.com:8080` -> `one_example_com_8080`.
    pub fn from_hostname(hostname: &str) -> Self {
        let lowered = hostname.trim().to_lowercase();
        let name = MACHINE_NAME_REPLACE.replace_all(&lowered, "_");
        DomainId(name.trim_matches('_').to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for DomainId {
    fn from(s: &str) -> Self {
        DomainId(s.to_string())
    }
}

impl From<String> for DomainId {
    fn from(s: String) -> Self {
        DomainId(s)
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl sqlx::Type<sqlx::MySql> for DomainId {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for DomainId {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::MySql>>::decode(value)?;
        Ok(DomainId(s))
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for DomainId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.0, buf)
    }
}

lazy_static::lazy_static! {
    static ref MACHINE_NAME_REPLACE: regex::Regex = regex::Regex::new(r"[^a-z0-9]+").unwrap();
}
