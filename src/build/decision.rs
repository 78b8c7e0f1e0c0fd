use crate::deps::DependencySet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    MissingOutput,
    /// A dependency was modified after the output was written.
    NewerDependency(PathBuf),
    /// The recorded compiler command differs from the current one.
    CommandChanged,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::MissingOutput => write!(f, "output binary does not exist"),
            StaleReason::NewerDependency(path) => write!(f, "\"{}\" changed", path.display()),
            StaleReason::CommandChanged => write!(f, "compiler command changed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildDecision {
    Fresh,
    Stale(StaleReason),
}

impl BuildDecision {
    pub fn is_stale(&self) -> bool {
        matches!(self, BuildDecision::Stale(_))
    }
}

/// Stale when `output` is missing, older than the newest dependency, or was
/// built by a different command than `current`. Equal timestamps are fresh.
pub fn decide(
    deps: &DependencySet,
    output: &Path,
    recorded: Option<&[String]>,
    current: &[String],
) -> BuildDecision {
    let Ok(built_at) = fs::metadata(output).and_then(|m| m.modified()) else {
        return BuildDecision::Stale(StaleReason::MissingOutput);
    };

    if let Some(newest) = deps.newest()
        && newest.modified > built_at
    {
        return BuildDecision::Stale(StaleReason::NewerDependency(newest.path.clone()));
    }

    if recorded.is_some_and(|args| args != current) {
        return BuildDecision::Stale(StaleReason::CommandChanged);
    }

    BuildDecision::Fresh
}
