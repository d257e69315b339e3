//! Ledger entry identity
//!
//! Shared identifier type and the capability every ledger record exposes.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a meal or workout, unique within its ledger.
///
/// Fresh ids are random v4 UUIDs rendered as 32 lowercase hex digits. Ids read
/// back from storage are kept verbatim, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EntryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EntryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// Lets ledgers be queried with a plain `&str`.
impl Borrow<str> for EntryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record that contributes to the running calorie total
pub trait LedgerEntry {
    fn id(&self) -> &EntryId;
    fn name(&self) -> &str;
    fn calories(&self) -> i64;
}

/// Case-insensitive name prefix match used by ledger filters
pub fn name_has_prefix(name: &str, prefix: &str) -> bool {
    name.to_lowercase().starts_with(&prefix.to_lowercase())
}
