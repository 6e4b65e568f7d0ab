use std::fmt;

/// Non-fatal conditions reported to the operator during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No merge commits between the last release tag and the tip
    EmptyChangelog { since_tag: String },
    /// The version in the file has no matching tag locally
    TagNotFound { tag: String, remote: String },
    /// A release commit exists but its tag was never created
    PendingTag {
        version: String,
        commit_hash: String,
    },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::EmptyChangelog { since_tag } => {
                write!(f, "No merge commits since tag '{}'", since_tag)
            }
            BoundaryWarning::TagNotFound { tag, remote } => {
                write!(
                    f,
                    "Tag '{}' cannot be found. Did you run `git fetch {}`?",
                    tag, remote
                )
            }
            BoundaryWarning::PendingTag {
                version,
                commit_hash,
            } => {
                let short_hash = if commit_hash.len() > 7 {
                    &commit_hash[..7]
                } else {
                    commit_hash.as_str()
                };
                write!(
                    f,
                    "Release commit {} for {} is not tagged yet; run `tagger tag` to finish the release",
                    short_hash, version
                )
            }
        }
    }
}
