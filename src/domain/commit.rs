use regex::Regex;

use crate::error::{Result, TaggerError};

/// Rules for recognising merge commits and pulling a changelog line out of them
#[derive(Debug, Clone)]
pub struct MergeRules {
    merge_marker: String,
    id_pattern: Regex,
}

impl MergeRules {
    /// Build rules from the message prefix (e.g. "Merge pull request") and the
    /// marker that precedes the numeric request id (e.g. "#").
    pub fn new(merge_marker: &str, id_marker: &str) -> Result<Self> {
        let merge_marker = merge_marker.trim();
        if merge_marker.is_empty() {
            return Err(TaggerError::configuration("merge marker must not be empty"));
        }

        let pattern = format!(
            r"^{}\s+({}\d+)",
            regex::escape(merge_marker),
            regex::escape(id_marker)
        );
        let id_pattern = Regex::new(&pattern)
            .map_err(|e| TaggerError::configuration(format!("Invalid merge marker: {}", e)))?;

        Ok(MergeRules {
            merge_marker: merge_marker.to_string(),
            id_pattern,
        })
    }

    /// A commit counts as a merge when its message starts with the marker.
    ///
    /// This is a message convention, not a parent-count check: squash merges
    /// carry the marker too, and native merge commits without it are ignored.
    pub fn is_merge_commit(&self, message: &str) -> bool {
        message.trim().starts_with(&self.merge_marker)
    }

    /// Parse a merge commit message into a changelog entry.
    ///
    /// Returns `None` when the message is not a merge commit, has no request
    /// id, or has fewer than three lines.
    pub fn parse(&self, message: &str) -> Option<MergeCommit> {
        if !self.is_merge_commit(message) {
            return None;
        }

        let message = message.trim();
        let id = self.id_pattern.captures(message)?.get(1)?.as_str();
        let summary = message.lines().nth(2)?;

        Some(MergeCommit {
            id: id.to_string(),
            summary: summary.trim_end().to_string(),
        })
    }
}

/// A merge commit reduced to what the changelog needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCommit {
    /// Request identifier including its marker, e.g. `#42`
    pub id: String,
    /// Third line of the commit message
    pub summary: String,
}

impl std::fmt::Display for MergeCommit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.id, self.summary)
    }
}
