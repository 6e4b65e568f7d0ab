//! Changelog extraction from merge commits since a release tag.

use git2::Oid;
use tracing::{debug, warn};

use crate::domain::MergeRules;
use crate::error::{Result, TaggerError};
use crate::git::Repository;

/// Collect changelog lines for every merge commit between `tip` and the
/// commit tagged `tag_name`, newest first.
///
/// The tagged commit itself is excluded. The tag must exist, must be
/// annotated, and its commit must be reachable from `tip`; otherwise this
/// fails instead of returning a partial changelog.
///
/// # Arguments
/// * `repo` - Repository to walk
/// * `tip` - Commit to start from, usually the current branch tip
/// * `tag_name` - Tag marking the previous release
/// * `rules` - How merge commits are recognised and formatted
pub fn extract<R: Repository + ?Sized>(
    repo: &R,
    tip: Oid,
    tag_name: &str,
    rules: &MergeRules,
) -> Result<Vec<String>> {
    let tag = repo.resolve_tag(tag_name)?.ok_or_else(|| {
        TaggerError::traversal(format!("Tag '{}' does not exist", tag_name))
    })?;

    if !tag.is_annotated() {
        return Err(TaggerError::traversal(format!(
            "Tag '{}' is a lightweight tag; changelogs need an annotated tag",
            tag_name
        )));
    }

    let mut entries = Vec::new();
    for commit in repo.walk_history(tip)? {
        let commit = commit?;

        if commit.id == tag.target {
            debug!(tag = tag_name, entries = entries.len(), "reached tagged commit");
            return Ok(entries);
        }

        if !rules.is_merge_commit(&commit.message) {
            continue;
        }

        match rules.parse(&commit.message) {
            Some(merge) => entries.push(merge.to_string()),
            None => warn!(commit = %commit.id, "skipping merge commit without request id or description"),
        }
    }

    Err(TaggerError::traversal(format!(
        "Tag '{}' not found in history of the current branch",
        tag_name
    )))
}
