//! Table dependency graphs of the supported storage schemas.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use cleaner_core::AppError;
use serde::{Deserialize, Serialize};

/// Storage schema holding the analysis records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageSchema {
    /// OCP recommendation reports and their per-cluster satellites.
    #[default]
    OcpRecommendations,
    /// DVO workload recommendation reports.
    DvoRecommendations,
}

/// Table whose timestamps decide which clusters' records have aged out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootTable {
    /// Qualified table name.
    pub name: &'static str,
    /// Column holding the cluster identifier.
    pub cluster_column: &'static str,
    /// Column holding the time the report was produced.
    pub reported_at_column: &'static str,
    /// Column holding the time the report was last confirmed.
    pub last_checked_at_column: &'static str,
}

/// Table whose rows follow the root table by cluster identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependentTable {
    /// Qualified table name.
    pub name: &'static str,
    /// Column holding the cluster identifier.
    pub cluster_column: &'static str,
}

const fn dependent(name: &'static str) -> DependentTable {
    DependentTable {
        name,
        cluster_column: "cluster_id",
    }
}

const OCP_ROOT: RootTable = RootTable {
    name: "report",
    cluster_column: "cluster",
    reported_at_column: "reported_at",
    last_checked_at_column: "last_checked_at",
};

// Referencing tables first; `report` itself is deleted after all of them.
const OCP_DEPENDENTS: &[DependentTable] = &[
    dependent("cluster_rule_toggle"),
    dependent("cluster_rule_user_feedback"),
    dependent("cluster_user_rule_disable_feedback"),
    dependent("rule_hit"),
    dependent("recommendation"),
    dependent("report_info"),
];

const DVO_ROOT: RootTable = RootTable {
    name: "dvo.dvo_report",
    cluster_column: "cluster_id",
    reported_at_column: "reported_at",
    last_checked_at_column: "last_checked_at",
};

const DVO_DEPENDENTS: &[DependentTable] = &[];

impl StorageSchema {
    /// Returns the configuration value for this schema.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OcpRecommendations => "ocp_recommendations",
            Self::DvoRecommendations => "dvo_recommendations",
        }
    }

    /// Returns the table that drives record age.
    #[must_use]
    pub fn root_table(&self) -> RootTable {
        match self {
            Self::OcpRecommendations => OCP_ROOT,
            Self::DvoRecommendations => DVO_ROOT,
        }
    }

    /// Returns the tables keyed by cluster that must be emptied before the root.
    #[must_use]
    pub fn dependent_tables(&self) -> &'static [DependentTable] {
        match self {
            Self::OcpRecommendations => OCP_DEPENDENTS,
            Self::DvoRecommendations => DVO_DEPENDENTS,
        }
    }

    /// Returns every participating table name in deletion order.
    #[must_use]
    pub fn deletion_order(&self) -> Vec<&'static str> {
        self.dependent_tables()
            .iter()
            .map(|table| table.name)
            .chain(std::iter::once(self.root_table().name))
            .collect()
    }
}

impl Display for StorageSchema {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for StorageSchema {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "ocp_recommendations" => Ok(Self::OcpRecommendations),
            "dvo_recommendations" => Ok(Self::DvoRecommendations),
            other => Err(AppError::Configuration(format!(
                "unknown storage schema '{other}', expected 'ocp_recommendations' or 'dvo_recommendations'"
            ))),
        }
    }
}
