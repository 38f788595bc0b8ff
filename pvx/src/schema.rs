//! Record definitions exchanged with stores and files.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned revision stamp of a value. Strictly increasing within a store.
pub type Version = DateTime<Utc>;

/// A resolved point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointRef {
    pub uuid: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PointRef {
    pub fn new(uuid: Uuid, name: Option<String>) -> Self {
        Self { uuid, name }
    }

    pub fn named(uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for PointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.uuid),
            None => write!(f, "{}", self.uuid),
        }
    }
}

/// Which points a command addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointSelector {
    /// A point by name.
    Name(String),
    /// A point by UUID.
    Uuid(Uuid),
    /// Every point of the store.
    All,
}

impl PointSelector {
    /// Classify a `POINT` argument: UUIDs select by identifier, anything else by name.
    pub fn parse(point: &str) -> Self {
        match Uuid::parse_str(point) {
            Ok(uuid) => PointSelector::Uuid(uuid),
            Err(_) => PointSelector::Name(point.to_string()),
        }
    }
}

/// A point value: what a point measured at a given time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointValue {
    pub point: PointRef,

    /// Time the value applies to.
    pub stamp: DateTime<Utc>,

    /// Payload; null for a value without content.
    #[serde(default)]
    pub value: serde_json::Value,

    /// Revision stamp assigned by the store that produced the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

impl PointValue {
    pub fn new(point: PointRef, stamp: DateTime<Utc>, value: serde_json::Value) -> Self {
        Self {
            point,
            stamp,
            value,
            version: None,
        }
    }
}
