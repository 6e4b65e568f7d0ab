//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the repository and
//! remote operations a release needs, with a real implementation backed by
//! `git2` and an in-memory mock for tests.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: on-disk repository via the `git2` crate
//! - [mock::MockRepository]: in-memory repository for tests
//! - [transport]: accept/reject decisions for remote URLs, credentials and
//!   host certificates
//!
//! # Usage
//!
//! Release logic depends on the [Repository] trait, never on `git2` directly:
//!
//! ```rust
//! # use tagger::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> tagger::Result<()> {
//! let head = repo.current_branch()?;
//! if let Some(tag) = repo.resolve_tag("1.0.0")? {
//!     println!("{} is at {} (tip {})", tag.name, tag.target, head.tip);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;
pub mod transport;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use std::path::{Path, PathBuf};

use crate::domain::Tag;
use crate::error::Result;
use git2::Oid;

/// Commit information used by the changelog and resume logic
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    pub id: Oid,
    /// Full commit message
    pub message: String,
    pub parents: Vec<Oid>,
}

/// The checked-out branch and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHead {
    pub name: String,
    pub tip: Oid,
}

/// Commits yielded newest first by committer time
pub type CommitWalk<'a> = Box<dyn Iterator<Item = Result<CommitInfo>> + 'a>;

/// Repository and remote operations needed for a release
///
/// A value implementing this trait is owned by a single release run; nothing
/// here is safe to share between concurrent runs on the same working tree.
///
/// ## Error Handling
///
/// Implementations map failures onto [crate::error::TaggerError]: missing
/// remotes and rejected transports are `Configuration` errors, everything else
/// raised by the repository is a `Repository` or `Git` error.
pub trait Repository {
    /// Root of the working tree; version file paths are relative to it
    fn workdir(&self) -> Result<PathBuf>;

    /// Current branch name and tip
    ///
    /// # Returns
    /// * `Ok(BranchHead)` - Branch name and the commit it points at
    /// * `Err` - If HEAD is unborn or detached
    fn current_branch(&self) -> Result<BranchHead>;

    /// Ask `remote` for the commit its `HEAD` points at.
    ///
    /// Only the reference advertisement is read: nothing is merged and no
    /// local reference is updated.
    ///
    /// # Arguments
    /// * `remote` - Name of a configured remote (e.g., "upstream")
    ///
    /// # Returns
    /// * `Ok(Oid)` - The remote HEAD commit
    /// * `Err` - If the remote is missing, unreachable, not SSH, or authentication fails
    fn fetch_remote_head(&self, remote: &str) -> Result<Oid>;

    /// Look up a tag by name
    ///
    /// # Returns
    /// * `Ok(Some(Tag))` - The commit the tag points at and whether it is annotated
    /// * `Ok(None)` - If no such tag exists
    /// * `Err` - If there's a Git error
    fn resolve_tag(&self, tag_name: &str) -> Result<Option<Tag>>;

    /// Look up a single commit
    fn find_commit(&self, oid: Oid) -> Result<CommitInfo>;

    /// Walk history from `start` backwards in committer-time order, `start` included
    fn walk_history(&self, start: Oid) -> Result<CommitWalk<'_>>;

    /// Contents of `path` as recorded in `commit`
    fn read_file_at(&self, commit: Oid, path: &Path) -> Result<Vec<u8>>;

    /// Stage the on-disk contents of `paths` and commit them on the current branch
    ///
    /// # Returns
    /// * `Ok(Oid)` - The new commit
    /// * `Err` - If a path is missing or no author identity is configured
    fn commit_files(&self, paths: &[&Path], message: &str) -> Result<Oid>;

    /// Create an annotated tag pointing at `target`
    ///
    /// # Returns
    /// * `Ok(Oid)` - The new tag object
    /// * `Err` - If the tag already exists or the target is unknown
    fn create_annotated_tag(&self, name: &str, target: Oid, message: &str) -> Result<Oid>;
}
