//! Driver/server version compatibility gate.
//!
//! Commands issued by an unsupported driver may be answered in shapes the
//! driver misreads, so the session refuses to collect anything until the
//! server version reported by `buildInfo` is covered by a
//! [`CompatibilityPolicy`] rule for the driver version in use.
//!
//! Versions compare as tuples of integers (missing trailing components count
//! as zero). A non-numeric suffix such as `-rc1` sorts after the numeric
//! part, so `4.2.0 < 4.2.0-rc1 < 4.2.1`.

use crate::Result;
use crate::error::MongoInfoError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Version of the `mongodb` driver crate this workspace is built against.
pub const DRIVER_VERSION: &str = "3.5.0";

/// A parsed dotted version identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    numbers: Vec<u64>,
    suffix: Option<String>,
    raw: String,
}

impl Version {
    /// Parses `major[.minor[.patch...]][suffix]`.
    ///
    /// # Errors
    /// Returns [`MongoInfoError::InvalidVersion`] when the input has no
    /// leading numeric component or a component overflows `u64`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let mut rest = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
        let mut numbers = Vec::new();

        loop {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits_end == 0 {
                break;
            }
            let (digits, tail) = rest.split_at(digits_end);
            let number = digits.parse::<u64>().map_err(|e| {
                MongoInfoError::invalid_version(input, format!("component '{}': {}", digits, e))
            })?;
            numbers.push(number);
            rest = tail;

            match rest.strip_prefix('.') {
                Some(after) if after.starts_with(|c: char| c.is_ascii_digit()) => rest = after,
                _ => break,
            }
        }

        if numbers.is_empty() {
            return Err(MongoInfoError::invalid_version(
                input,
                "expected a leading numeric component",
            ));
        }

        let suffix = rest.trim_start_matches(['-', '+', '.']);
        Ok(Self {
            numbers,
            suffix: (!suffix.is_empty()).then(|| suffix.to_string()),
            raw: trimmed.to_string(),
        })
    }

    /// Numeric components in order.
    pub fn numbers(&self) -> &[u64] {
        &self.numbers
    }

    /// Non-numeric suffix without its leading separator.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Major version component.
    pub fn major(&self) -> u64 {
        self.component(0)
    }

    /// Minor version component (0 when absent).
    pub fn minor(&self) -> u64 {
        self.component(1)
    }

    fn component(&self, index: usize) -> u64 {
        self.numbers.get(index).copied().unwrap_or(0)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.numbers.len().max(other.numbers.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.suffix.cmp(&other.suffix))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for Version {
    type Err = MongoInfoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = MongoInfoError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.raw
    }
}

/// Half-open version range `[min, max)`; no `max` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    /// Inclusive lower bound
    pub min: Version,
    /// Exclusive upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Version>,
}

impl VersionRange {
    /// Creates a range from bound strings.
    ///
    /// # Errors
    /// Returns error if either bound is not a valid version
    pub fn new(min: &str, max: Option<&str>) -> Result<Self> {
        Ok(Self {
            min: Version::parse(min)?,
            max: max.map(Version::parse).transpose()?,
        })
    }

    /// Checks whether `version` lies within the range.
    pub fn contains(&self, version: &Version) -> bool {
        *version >= self.min && self.max.as_ref().is_none_or(|max| version < max)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.max {
            Some(max) => write!(f, "[{}, {})", self.min, max),
            None => write!(f, "[{}, ...)", self.min),
        }
    }
}

/// Maps a range of driver versions to the server versions they support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRule {
    /// Driver versions this rule applies to
    pub driver: VersionRange,
    /// Server versions those drivers support
    pub server: VersionRange,
}

impl CompatibilityRule {
    /// Checks whether this rule covers the pair.
    pub fn covers(&self, server: &Version, driver: &Version) -> bool {
        self.driver.contains(driver) && self.server.contains(server)
    }
}

/// Table of supported driver/server combinations.
///
/// The default table follows the MongoDB Rust driver compatibility matrix.
/// Alternative tables can be loaded from JSON:
///
/// ```rust
/// use mongoinfo_core::CompatibilityPolicy;
///
/// let policy = CompatibilityPolicy::from_json_str(r#"{
///     "rules": [
///         { "driver": { "min": "3.0" }, "server": { "min": "5.0", "max": "7.0" } }
///     ]
/// }"#).unwrap();
///
/// assert!(policy.check("6.0.12", "3.5.0").is_ok());
/// assert!(policy.check("7.0.2", "3.5.0").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityPolicy {
    /// Rules checked in order; any match passes the gate
    pub rules: Vec<CompatibilityRule>,
}

impl Default for CompatibilityPolicy {
    fn default() -> Self {
        let rule = |driver: (&str, &str), server: (&str, &str)| CompatibilityRule {
            driver: VersionRange {
                min: Version::from_literal(driver.0),
                max: Some(Version::from_literal(driver.1)),
            },
            server: VersionRange {
                min: Version::from_literal(server.0),
                max: Some(Version::from_literal(server.1)),
            },
        };

        Self {
            rules: vec![
                rule(("3.0", "4.0"), ("4.0", "9.0")),
                rule(("2.0", "3.0"), ("3.6", "8.0")),
                rule(("1.0", "2.0"), ("3.6", "5.1")),
            ],
        }
    }
}

impl Version {
    /// Builds a version from a literal known to be well formed.
    fn from_literal(literal: &str) -> Self {
        let numbers = literal
            .split('.')
            .filter_map(|part| part.parse::<u64>().ok())
            .collect();
        Self {
            numbers,
            suffix: None,
            raw: literal.to_string(),
        }
    }
}

impl CompatibilityPolicy {
    /// Parses a policy table from JSON.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed, contains invalid versions,
    /// or has no rules
    pub fn from_json_str(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json).map_err(|e| MongoInfoError::Serialization {
            context: "Failed to parse compatibility policy".to_string(),
            source: e,
        })?;
        policy.validate()?;
        Ok(policy)
    }

    /// Validates the table.
    ///
    /// # Errors
    /// Returns error if there are no rules or a range is empty
    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(MongoInfoError::configuration(
                "compatibility policy must contain at least one rule",
            ));
        }

        for rule in &self.rules {
            for range in [&rule.driver, &rule.server] {
                if range.max.as_ref().is_some_and(|max| *max <= range.min) {
                    return Err(MongoInfoError::configuration(format!(
                        "empty version range {} in compatibility policy",
                        range
                    )));
                }
            }
        }

        Ok(())
    }

    /// Checks a server/driver version pair against the table.
    ///
    /// # Errors
    /// - [`MongoInfoError::InvalidVersion`] if either version fails to parse
    /// - [`MongoInfoError::IncompatibleVersions`] if no rule covers the pair
    pub fn check(&self, server_version: &str, driver_version: &str) -> Result<()> {
        let server = Version::parse(server_version)?;
        let driver = Version::parse(driver_version)?;

        match self.rules.iter().find(|rule| rule.covers(&server, &driver)) {
            Some(rule) => {
                tracing::debug!(
                    "Driver {} supports server {} (driver range {}, server range {})",
                    driver,
                    server,
                    rule.driver,
                    rule.server
                );
                Ok(())
            }
            None => Err(MongoInfoError::IncompatibleVersions {
                server_version: server_version.to_string(),
                driver_version: driver_version.to_string(),
            }),
        }
    }
}

/// Checks a pair against the default policy.
///
/// # Errors
/// See [`CompatibilityPolicy::check`]
pub fn check_compatibility(server_version: &str, driver_version: &str) -> Result<()> {
    CompatibilityPolicy::default().check(server_version, driver_version)
}
