//! Data model for collected instance information.
//!
//! Responses from administrative commands are arbitrarily shaped, so every
//! subset is kept as a BSON [`Document`]. Only the fields the collectors
//! inspect (sizes and identifiers) are normalized into concrete types.

use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the six named categories of instance information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subset {
    /// Server identity and build metadata
    General,
    /// Per-database statistics
    Databases,
    /// Total on-disk size across all databases
    TotalSize,
    /// Server runtime parameters
    Parameters,
    /// User accounts
    Users,
    /// Role definitions
    Roles,
}

impl Subset {
    /// All subsets in canonical output order.
    pub const ALL: [Subset; 6] = [
        Subset::General,
        Subset::Databases,
        Subset::TotalSize,
        Subset::Parameters,
        Subset::Users,
        Subset::Roles,
    ];

    /// Returns the wire name used in filter tokens and output keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Subset::General => "general",
            Subset::Databases => "databases",
            Subset::TotalSize => "total_size",
            Subset::Parameters => "parameters",
            Subset::Users => "users",
            Subset::Roles => "roles",
        }
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name one of the six subsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSubset(pub String);

impl fmt::Display for UnknownSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown subset '{}'", self.0)
    }
}

impl std::error::Error for UnknownSubset {}

impl FromStr for Subset {
    type Err = UnknownSubset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subset::ALL
            .into_iter()
            .find(|subset| subset.as_str() == s)
            .ok_or_else(|| UnknownSubset(s.to_string()))
    }
}

/// Aggregated MongoDB instance information.
///
/// Built fresh by the aggregator for every invocation and never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceInfo {
    /// `buildInfo` response, verbatim
    pub general: Document,
    /// Database name to its `listDatabases` entry (minus `name`)
    pub databases: Document,
    /// Server-reported total size in bytes
    pub total_size: i64,
    /// `getParameter: "*"` response, verbatim
    pub parameters: Document,
    /// User key to user attributes (minus `user`)
    pub users: Document,
    /// Role key to role attributes (minus `role`)
    pub roles: Document,
}

impl InstanceInfo {
    /// Returns the value of a single subset.
    pub fn subset(&self, subset: Subset) -> Bson {
        match subset {
            Subset::General => Bson::Document(self.general.clone()),
            Subset::Databases => Bson::Document(self.databases.clone()),
            Subset::TotalSize => Bson::Int64(self.total_size),
            Subset::Parameters => Bson::Document(self.parameters.clone()),
            Subset::Users => Bson::Document(self.users.clone()),
            Subset::Roles => Bson::Document(self.roles.clone()),
        }
    }

    /// Converts the info into a document keyed by subset name in canonical order.
    pub fn to_document(&self) -> Document {
        Subset::ALL
            .into_iter()
            .map(|subset| (subset.as_str().to_string(), self.subset(subset)))
            .collect()
    }

    /// Number of databases reported by the server.
    pub fn database_count(&self) -> usize {
        self.databases.len()
    }
}
