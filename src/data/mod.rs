//! Core data models for the character mirror
//!
//! Upstream records are schema-less JSON and stay wrapped in `RawRecord`
//! until the projector turns them into the fixed-shape `ProjectedRecord`.

pub mod fetcher;
pub mod projector;

pub use fetcher::{FetchError, FetchOutcome, UpstreamClient};
pub use projector::project;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single record as returned by the upstream API
///
/// No schema is enforced: any field may be absent, null, or of an unexpected
/// type. Access goes through key paths rather than typed fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Value);

impl RawRecord {
    /// Wraps an arbitrary JSON value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Looks up a value by following object keys in order
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.0, |value, key| value.get(key))
    }

    /// Looks up a non-empty string by key path
    ///
    /// Returns `None` for missing keys, nulls, empty strings, and non-strings.
    pub fn str_at(&self, path: &[&str]) -> Option<&str> {
        self.get_path(path)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// A character reduced to the three fields the service exposes
///
/// Serialized with the exact keys of the public endpoint and of the cache blob.
/// Deserialization rejects unknown keys and empty fields, so a decoded record
/// always satisfies the same rule as a projected one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord")]
pub struct ProjectedRecord {
    #[serde(rename = "Character Name")]
    pub character_name: String,
    #[serde(rename = "Location Name")]
    pub location_name: String,
    #[serde(rename = "Avatar URL")]
    pub avatar_url: String,
}

/// Wire shape of a record read back from storage, before validation
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredRecord {
    #[serde(rename = "Character Name")]
    character_name: String,
    #[serde(rename = "Location Name")]
    location_name: String,
    #[serde(rename = "Avatar URL")]
    avatar_url: String,
}

impl TryFrom<StoredRecord> for ProjectedRecord {
    type Error = String;

    fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
        let fields = [
            ("Character Name", &stored.character_name),
            ("Location Name", &stored.location_name),
            ("Avatar URL", &stored.avatar_url),
        ];
        if let Some((key, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(format!("empty \"{}\" field", key));
        }

        Ok(Self {
            character_name: stored.character_name,
            location_name: stored.location_name,
            avatar_url: stored.avatar_url,
        })
    }
}

/// Projected records in upstream pagination order
pub type Dataset = Vec<ProjectedRecord>;
