//! Cluster list resolution.
//!
//! A cluster list comes either from a plain-text file (one identifier per
//! line) or from command-line tokens. Both adapters feed the same
//! classification routine and produce a [`ClusterListResolution`].

use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use cleaner_core::{AppError, AppResult};
use cleaner_domain::{ClusterListResolution, ClusterNameSet};


/// Classifies every candidate into the well-formed set or the malformed count.
pub fn classify_candidates<'a, I>(candidates: I) -> ClusterListResolution
where
    I: IntoIterator<Item = &'a str>,
{
    let mut resolution = ClusterListResolution::new();
    for candidate in candidates {
        resolution.accept(candidate);
    }

    resolution
}

/// Reads cluster identifiers from a file, one per line.
///
/// Surrounding whitespace is trimmed and blank lines are skipped without being
/// counted. A line that is not valid UTF-8 counts as malformed. An empty file
/// (or the null device) resolves to an empty set. Only a file that cannot be
/// opened or read fails the whole call.
pub fn resolve_from_file(path: impl AsRef<Path>) -> AppResult<ClusterListResolution> {
    let path = path.as_ref();
    let content = fs::read(path).map_err(|error| {
        AppError::SourceAccess(format!(
            "failed to read cluster list file '{}': {error}",
            path.display()
        ))
    })?;

    let lines: Vec<Cow<'_, str>> = content
        .split(|byte| *byte == b'\n')
        .map(String::from_utf8_lossy)
        .collect();
    let resolution = classify_candidates(
        lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty()),
    );

    debug!(
        path = %path.display(),
        clusters = resolution.clusters().len(),
        malformed = resolution.malformed_count(),
        "resolved cluster list file"
    );

    Ok(resolution)
}

/// Treats one command-line token as exactly one candidate.
///
/// Unlike an empty file, an empty token is a user error and counts as one
/// malformed entry.
pub fn resolve_from_argument(raw: &str) -> AppResult<ClusterListResolution> {
    Ok(classify_candidates(std::iter::once(raw.trim())))
}

/// Resolves several already-split command-line tokens and merges the results.
pub fn resolve_from_arguments<I, S>(tokens: I) -> AppResult<ClusterListResolution>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut resolution = ClusterListResolution::new();
    for token in tokens {
        resolution.merge(resolve_from_argument(token.as_ref())?);
    }

    Ok(resolution)
}

/// Returns the resolved set only when no candidate was malformed.
pub fn require_well_formed(resolution: ClusterListResolution) -> AppResult<ClusterNameSet> {
    if resolution.has_malformed() {
        return Err(AppError::Validation(format!(
            "cluster list contains {} malformed entr{}",
            resolution.malformed_count(),
            if resolution.malformed_count() == 1 {
                "y"
            } else {
                "ies"
            }
        )));
    }

    let (clusters, _) = resolution.into_parts();
    Ok(clusters)
}

/// Where the cluster allow-list of one run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterListSource {
    /// No allow-list: every cluster is in scope.
    Unrestricted,
    /// Plain-text file with one identifier per line.
    File(PathBuf),
    /// Tokens supplied on the command line.
    Arguments(Vec<String>),
}

impl ClusterListSource {
    /// Resolves the source into a cluster set and malformed count.
    pub fn resolve(&self) -> AppResult<ClusterListResolution> {
        match self {
            Self::Unrestricted => Ok(ClusterListResolution::new()),
            Self::File(path) => resolve_from_file(path),
            Self::Arguments(tokens) => resolve_from_arguments(tokens),
        }
    }
}

impl Display for ClusterListSource {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unrestricted => formatter.write_str("all clusters"),
            Self::File(path) => write!(formatter, "file '{}'", path.display()),
            Self::Arguments(tokens) => write!(formatter, "{} command-line token(s)", tokens.len()),
        }
    }
}
