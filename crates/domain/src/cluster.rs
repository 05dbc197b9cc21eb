//! Cluster identity types and the identifier format check.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::collections::btree_set;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use cleaner_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of a hyphenated cluster identifier (8-4-4-4-12 plus four hyphens).
const CLUSTER_NAME_LENGTH: usize = 36;

const HYPHEN_OFFSETS: [usize; 4] = [8, 13, 18, 23];

/// Returns true when the candidate is a canonical hyphenated cluster identifier.
///
/// Hexadecimal digits are accepted in either case. Braced, URN and simple
/// (unhyphenated) UUID spellings are rejected.
#[must_use]
pub fn is_valid_cluster_name(candidate: &str) -> bool {
    if candidate.len() != CLUSTER_NAME_LENGTH {
        return false;
    }

    let bytes = candidate.as_bytes();
    if HYPHEN_OFFSETS.iter().any(|offset| bytes[*offset] != b'-') {
        return false;
    }

    Uuid::try_parse(candidate).is_ok()
}

/// Identity of one monitored cluster, kept exactly as it was supplied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClusterName(String);

impl ClusterName {
    /// Creates a validated cluster name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if !is_valid_cluster_name(value.as_str()) {
            return Err(AppError::Validation(format!(
                "'{value}' is not a valid cluster identifier"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for ClusterName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for ClusterName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClusterName> for String {
    fn from(value: ClusterName) -> Self {
        value.0
    }
}

impl Borrow<str> for ClusterName {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ClusterName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Set of unique cluster names.
///
/// An empty set carries meaning on its own: no cluster restriction applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterNameSet(BTreeSet<ClusterName>);

impl ClusterNameSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a cluster name, returning false when it was already present.
    pub fn insert(&mut self, name: ClusterName) -> bool {
        self.0.insert(name)
    }

    /// Returns true when the set holds the given identifier.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Returns the number of cluster names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no cluster name is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the identifiers as owned strings, suitable for query binding.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|name| name.as_str().to_owned()).collect()
    }
}

impl FromIterator<ClusterName> for ClusterNameSet {
    fn from_iter<T: IntoIterator<Item = ClusterName>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<ClusterName> for ClusterNameSet {
    fn extend<T: IntoIterator<Item = ClusterName>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ClusterNameSet {
    type Item = ClusterName;
    type IntoIter = btree_set::IntoIter<ClusterName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Outcome of classifying the candidates of one cluster list source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterListResolution {
    clusters: ClusterNameSet,
    malformed_count: usize,
}

impl ClusterListResolution {
    /// Creates an empty resolution with no malformed entries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies one candidate, returning true when it was well-formed.
    ///
    /// Valid duplicates collapse into the existing entry and are not counted
    /// as malformed.
    pub fn accept(&mut self, candidate: &str) -> bool {
        match ClusterName::new(candidate) {
            Ok(name) => {
                self.clusters.insert(name);
                true
            }
            Err(_) => {
                self.malformed_count = self.malformed_count.saturating_add(1);
                false
            }
        }
    }

    /// Folds another resolution into this one.
    pub fn merge(&mut self, other: Self) {
        self.clusters.extend(other.clusters);
        self.malformed_count = self.malformed_count.saturating_add(other.malformed_count);
    }

    /// Returns the well-formed, de-duplicated cluster names.
    #[must_use]
    pub fn clusters(&self) -> &ClusterNameSet {
        &self.clusters
    }

    /// Returns how many candidates failed validation.
    #[must_use]
    pub fn malformed_count(&self) -> usize {
        self.malformed_count
    }

    /// Returns true when at least one candidate failed validation.
    #[must_use]
    pub fn has_malformed(&self) -> bool {
        self.malformed_count > 0
    }

    /// Splits the resolution into the set and the malformed count.
    #[must_use]
    pub fn into_parts(self) -> (ClusterNameSet, usize) {
        (self.clusters, self.malformed_count)
    }
}
