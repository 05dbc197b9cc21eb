//! Retention scope: maximum record age and the deletion predicate built from it.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use cleaner_core::{AppError, AppResult};

use crate::cluster::ClusterNameSet;

/// Maximum permitted record age, parsed from a human-readable expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxAge {
    expression: String,
    duration: Duration,
}

impl MaxAge {
    /// Parses expressions such as `3 days`, `72h` or `2 weeks`.
    pub fn parse(expression: &str) -> AppResult<Self> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(AppError::Configuration(
                "max age expression must not be empty".to_owned(),
            ));
        }

        let parsed = humantime::parse_duration(expression).map_err(|error| {
            AppError::Configuration(format!("invalid max age '{expression}': {error}"))
        })?;

        if parsed.is_zero() {
            return Err(AppError::Configuration(format!(
                "max age '{expression}' must be greater than zero"
            )));
        }

        let duration = Duration::from_std(parsed).map_err(|error| {
            AppError::Configuration(format!("max age '{expression}' is out of range: {error}"))
        })?;

        Ok(Self {
            expression: expression.to_owned(),
            duration,
        })
    }

    /// Returns the expression as it was configured.
    #[must_use]
    pub fn expression(&self) -> &str {
        self.expression.as_str()
    }

    /// Returns the parsed duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl FromStr for MaxAge {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Display for MaxAge {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.expression.as_str())
    }
}

/// Logical deletion scope handed to the storage executor.
///
/// A record is eligible when its timestamp is strictly older than the cutoff
/// and, if an allow-list is present, its cluster is a member of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPredicate {
    cutoff: DateTime<Utc>,
    clusters: Option<ClusterNameSet>,
}

impl RetentionPredicate {
    /// Builds the predicate for `now - max_age` and the resolved clusters.
    ///
    /// An empty cluster set yields a global predicate. A cutoff that would fall
    /// before the earliest representable instant saturates to it, so nothing
    /// becomes eligible.
    #[must_use]
    pub fn build(now: DateTime<Utc>, max_age: &MaxAge, clusters: ClusterNameSet) -> Self {
        let cutoff = now
            .checked_sub_signed(max_age.duration())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let clusters = if clusters.is_empty() {
            None
        } else {
            Some(clusters)
        };

        Self { cutoff, clusters }
    }

    /// Returns the instant records must be older than to be eligible.
    #[must_use]
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Returns the cluster allow-list, if one restricts the scope.
    #[must_use]
    pub fn clusters(&self) -> Option<&ClusterNameSet> {
        self.clusters.as_ref()
    }

    /// Returns true when age alone governs eligibility.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.clusters.is_none()
    }

    /// Returns true when the timestamp is strictly older than the cutoff.
    #[must_use]
    pub fn is_expired(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp < self.cutoff
    }

    /// Returns true when the cluster falls inside the scope.
    #[must_use]
    pub fn covers_cluster(&self, cluster: &str) -> bool {
        self.clusters
            .as_ref()
            .is_none_or(|clusters| clusters.contains(cluster))
    }

    /// Returns true when a record of the given cluster and timestamp may be deleted.
    #[must_use]
    pub fn is_eligible(&self, cluster: &str, timestamp: DateTime<Utc>) -> bool {
        self.is_expired(timestamp) && self.covers_cluster(cluster)
    }
}
