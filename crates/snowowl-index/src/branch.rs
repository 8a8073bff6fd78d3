//! Branch metadata and path helpers.

use crate::{IndexError, Result};
use serde::Serialize;

/// Path of the root branch every repository starts with.
pub const MAIN: &str = "MAIN";

/// Separator between segments of a branch path.
pub const SEPARATOR: char = '/';

/// Public view of one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionBranch {
    /// Full path, e.g. `MAIN/2024-01-31`.
    pub path: String,
    /// Parent path, `None` for `MAIN`.
    pub parent: Option<String>,
    /// Parent head timestamp at the time the branch was created.
    pub base_timestamp: i64,
    /// Timestamp of the latest commit on this branch.
    pub head_timestamp: i64,
}

impl RevisionBranch {
    /// Last segment of the path.
    pub fn name(&self) -> &str {
        self.path
            .rsplit_once(SEPARATOR)
            .map_or(self.path.as_str(), |(_, name)| name)
    }
}

/// Joins a parent path and a child name after validating the name.
pub fn child_path(parent: &str, name: &str) -> Result<String> {
    if name.is_empty() || name.contains(SEPARATOR) {
        return Err(IndexError::InvalidArgument(format!(
            "invalid branch name '{}'",
            name
        )));
    }
    Ok(format!("{}{}{}", parent, SEPARATOR, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_path() {
        assert_eq!(child_path(MAIN, "2024-01-31").unwrap(), "MAIN/2024-01-31");
        assert!(child_path(MAIN, "").is_err());
        assert!(child_path(MAIN, "a/b").is_err());
    }

    #[test]
    fn test_branch_name() {
        let branch = RevisionBranch {
            path: "MAIN/a/b".to_string(),
            parent: Some("MAIN/a".to_string()),
            base_timestamp: 1,
            head_timestamp: 1,
        };
        assert_eq!(branch.name(), "b");
    }
}
