//! Product records as returned by the catalog search endpoint

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned product identity, stable for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Department identifier
///
/// The backend is not consistent about the JSON type of a department: it is
/// sent as a string for some imports and as a bare number for others. Both
/// are normalized to their textual form so that `"12"` and `12` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DepartmentId(String);

impl DepartmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DepartmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DepartmentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text.trim().to_owned()),
            Raw::Integer(n) => Self(n.to_string()),
            Raw::Float(n) if n.fract() == 0.0 => Self(format!("{n:.0}")),
            Raw::Float(n) => Self(n.to_string()),
        })
    }
}

/// One catalog entry together with the caller's reservation state
///
/// `is_different_department` and `locked_by_department` are derived on the
/// client from the active department context. They are never read from or
/// written to the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub article: String,
    pub name: String,
    pub department: DepartmentId,
    #[serde(default)]
    pub group: Option<String>,
    pub price: f64,
    pub available: f64,
    #[serde(default)]
    pub balance_sum: f64,
    #[serde(default)]
    pub months_without_movement: u32,
    #[serde(default)]
    pub user_reserved: f64,
    #[serde(default)]
    pub user_reserved_sum: f64,

    #[serde(skip)]
    pub is_different_department: bool,
    #[serde(skip)]
    pub locked_by_department: Option<DepartmentId>,
}

impl ProductRecord {
    /// Whether the record should still be shown in the result list
    pub fn is_available(&self) -> bool {
        self.available > 0.0
    }

    /// Largest whole quantity that can be reserved
    pub fn max_quantity(&self) -> u32 {
        // `as` saturates, negative stock maps to zero
        self.available.floor() as u32
    }

    pub fn is_locked(&self) -> bool {
        self.is_different_department
    }

    pub fn has_user_reservation(&self) -> bool {
        self.user_reserved > 0.0
    }
}
