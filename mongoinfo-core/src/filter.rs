//! Inclusion/exclusion filtering of collected subsets.
//!
//! A token is either a bare subset name (include it) or a name prefixed by
//! a single `!` (exclude it). If any inclusion token is present the result
//! is exactly the included subsets and exclusions are ignored; otherwise
//! the result is every subset minus the excluded ones. Unknown tokens are
//! reported as warnings and never abort the call.

use crate::models::{InstanceInfo, Subset};
use mongodb::bson::Document;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A parsed filter token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterToken {
    /// `name`
    Include(Subset),
    /// `!name`
    Exclude(Subset),
}

impl FromStr for FilterToken {
    type Err = FilterWarning;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let unrecognized = || FilterWarning::UnrecognizedFilterToken(token.to_string());
        match token.strip_prefix('!') {
            Some(name) => name
                .parse::<Subset>()
                .map(FilterToken::Exclude)
                .map_err(|_| unrecognized()),
            None => token
                .parse::<Subset>()
                .map(FilterToken::Include)
                .map_err(|_| unrecognized()),
        }
    }
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterToken::Include(subset) => write!(f, "{}", subset),
            FilterToken::Exclude(subset) => write!(f, "!{}", subset),
        }
    }
}

/// Non-fatal diagnostic produced while filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FilterWarning {
    /// The token names no known subset; it was skipped
    UnrecognizedFilterToken(String),
}

impl fmt::Display for FilterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterWarning::UnrecognizedFilterToken(token) => {
                write!(f, "unrecognized filter token '{}' ignored", token)
            }
        }
    }
}

/// Filtered subsets plus any warnings raised on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredInfo {
    /// Subset name to value, in canonical order
    pub subsets: Document,
    /// Diagnostics, in token order
    pub warnings: Vec<FilterWarning>,
}

impl FilteredInfo {
    /// Subsets present in the result, in canonical order.
    pub fn selected(&self) -> Vec<Subset> {
        Subset::ALL
            .into_iter()
            .filter(|subset| self.subsets.contains_key(subset.as_str()))
            .collect()
    }
}

/// Applies filter tokens to an [`InstanceInfo`].
pub struct SubsetFilter;

impl SubsetFilter {
    /// Classifies `tokens` and returns the selected subsets.
    ///
    /// `info` is not modified; calling this repeatedly with the same
    /// arguments gives the same result.
    ///
    /// # Example
    /// ```rust
    /// use mongoinfo_core::{InstanceInfo, SubsetFilter, Subset};
    ///
    /// let info = InstanceInfo::default();
    /// let filtered = SubsetFilter::apply(&info, &["users", "!roles", "bogus"]);
    ///
    /// assert_eq!(filtered.selected(), vec![Subset::Users]);
    /// assert_eq!(filtered.warnings.len(), 1);
    /// ```
    pub fn apply<S: AsRef<str>>(info: &InstanceInfo, tokens: &[S]) -> FilteredInfo {
        let (selection, warnings) = Self::classify(tokens);

        let subsets = selection
            .into_iter()
            .map(|subset| (subset.as_str().to_string(), info.subset(subset)))
            .collect();

        FilteredInfo { subsets, warnings }
    }

    /// Resolves `tokens` to the selected subsets (in canonical order) and
    /// the warnings for unrecognized tokens.
    pub fn classify<S: AsRef<str>>(tokens: &[S]) -> (Vec<Subset>, Vec<FilterWarning>) {
        let mut included = BTreeSet::new();
        let mut excluded = BTreeSet::new();
        let mut warnings = Vec::new();

        for token in tokens {
            match token.as_ref().parse::<FilterToken>() {
                Ok(FilterToken::Include(subset)) => {
                    included.insert(subset);
                }
                Ok(FilterToken::Exclude(subset)) => {
                    excluded.insert(subset);
                }
                Err(warning) => {
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        let selection = if included.is_empty() {
            Subset::ALL
                .into_iter()
                .filter(|subset| !excluded.contains(subset))
                .collect()
        } else {
            if !excluded.is_empty() {
                tracing::debug!(
                    "Ignoring {} exclusion token(s) because inclusion tokens are present",
                    excluded.len()
                );
            }
            included.into_iter().collect()
        };

        (selection, warnings)
    }
}
