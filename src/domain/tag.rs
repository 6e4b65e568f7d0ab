use git2::Oid;

/// How a tag reference is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `refs/tags/<name>` points straight at a commit
    Lightweight,
    /// `refs/tags/<name>` points at a tag object carrying a message
    Annotated,
}

/// A resolved git tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    /// The commit the tag ultimately points at
    pub target: Oid,
    pub kind: TagKind,
}

impl Tag {
    /// Create a new tag
    pub fn new(name: impl Into<String>, target: Oid, kind: TagKind) -> Self {
        Tag {
            name: name.into(),
            target,
            kind,
        }
    }

    pub fn is_annotated(&self) -> bool {
        self.kind == TagKind::Annotated
    }
}

/// Commit message used for the version bump commit
pub fn release_commit_message(version: &str) -> String {
    format!("{}{}", RELEASE_COMMIT_PREFIX, version)
}

/// Extract the version from a release commit message, if it is one
pub fn released_version_from_message(message: &str) -> Option<&str> {
    message
        .trim()
        .strip_prefix(RELEASE_COMMIT_PREFIX)
        .map(str::trim)
        .filter(|version| !version.is_empty())
}

const RELEASE_COMMIT_PREFIX: &str = "Preparing to tag ";
