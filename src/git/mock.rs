use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use git2::Oid;

use crate::domain::{Tag, TagKind};
use crate::error::{Result, TaggerError};
use crate::git::{BranchHead, CommitInfo, CommitWalk, Repository};

/// Mock repository for testing without actual git operations
///
/// History is linear: commits are kept newest first and every new commit is
/// parented on the current tip. Mutating operations are recorded so tests can
/// assert that a run stopped before touching the repository.
pub struct MockRepository {
    workdir: PathBuf,
    branch: String,
    commits: RefCell<Vec<CommitInfo>>,
    tags: RefCell<HashMap<String, Tag>>,
    files: RefCell<HashMap<(Oid, PathBuf), Vec<u8>>>,
    upstream_head: Option<Oid>,
    next_id: Cell<u8>,
    fetch_count: Cell<usize>,
    fail_next_tag: Cell<bool>,
}

impl MockRepository {
    /// Create an empty mock repository on `branch`, with files under `workdir`
    pub fn new(workdir: impl Into<PathBuf>, branch: impl Into<String>) -> Self {
        MockRepository {
            workdir: workdir.into(),
            branch: branch.into(),
            commits: RefCell::new(Vec::new()),
            tags: RefCell::new(HashMap::new()),
            files: RefCell::new(HashMap::new()),
            upstream_head: None,
            next_id: Cell::new(1),
            fetch_count: Cell::new(0),
            fail_next_tag: Cell::new(false),
        }
    }

    /// Append a commit on top of the current tip and return its id
    pub fn add_commit(&mut self, message: &str) -> Oid {
        self.push_commit(message)
    }

    /// Add a tag pointing at `target`
    pub fn add_tag(&mut self, name: &str, target: Oid, kind: TagKind) {
        self.tags
            .borrow_mut()
            .insert(name.to_string(), Tag::new(name, target, kind));
    }

    /// Record `content` as the committed contents of `path` in `commit`
    pub fn add_file(&mut self, commit: Oid, path: impl Into<PathBuf>, content: &[u8]) {
        self.files
            .borrow_mut()
            .insert((commit, path.into()), content.to_vec());
    }

    /// Set what the upstream remote reports as its HEAD
    pub fn set_upstream_head(&mut self, oid: Oid) {
        self.upstream_head = Some(oid);
    }

    /// Make the next `create_annotated_tag` fail, simulating an interrupted run
    pub fn fail_next_tag(&self) {
        self.fail_next_tag.set(true);
    }

    pub fn tip(&self) -> Option<Oid> {
        self.commits.borrow().first().map(|c| c.id)
    }

    pub fn commit_count(&self) -> usize {
        self.commits.borrow().len()
    }

    pub fn tag(&self, name: &str) -> Option<Tag> {
        self.tags.borrow().get(name).cloned()
    }

    pub fn tag_count(&self) -> usize {
        self.tags.borrow().len()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.get()
    }

    /// Message of the most recent commit
    pub fn head_message(&self) -> Option<String> {
        self.commits.borrow().first().map(|c| c.message.clone())
    }

    fn push_commit(&self, message: &str) -> Oid {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        let oid = Oid::from_bytes(&[id; 20]).unwrap_or_else(|_| Oid::zero());

        let mut commits = self.commits.borrow_mut();
        let parents = commits.first().map(|c| vec![c.id]).unwrap_or_default();
        commits.insert(
            0,
            CommitInfo {
                id: oid,
                message: message.to_string(),
                parents,
            },
        );
        oid
    }
}

impl Repository for MockRepository {
    fn workdir(&self) -> Result<PathBuf> {
        Ok(self.workdir.clone())
    }

    fn current_branch(&self) -> Result<BranchHead> {
        let tip = self
            .tip()
            .ok_or_else(|| TaggerError::repository("Current branch has no commits yet"))?;
        Ok(BranchHead {
            name: self.branch.clone(),
            tip,
        })
    }

    fn fetch_remote_head(&self, remote: &str) -> Result<Oid> {
        self.fetch_count.set(self.fetch_count.get() + 1);
        self.upstream_head.ok_or_else(|| {
            TaggerError::configuration(format!("Remote '{}' is not configured", remote))
        })
    }

    fn resolve_tag(&self, tag_name: &str) -> Result<Option<Tag>> {
        Ok(self.tags.borrow().get(tag_name).cloned())
    }

    fn find_commit(&self, oid: Oid) -> Result<CommitInfo> {
        self.commits
            .borrow()
            .iter()
            .find(|c| c.id == oid)
            .cloned()
            .ok_or_else(|| TaggerError::repository(format!("Commit {} not found", oid)))
    }

    fn walk_history(&self, start: Oid) -> Result<CommitWalk<'_>> {
        let commits = self.commits.borrow();
        let position = commits
            .iter()
            .position(|c| c.id == start)
            .ok_or_else(|| TaggerError::repository(format!("Commit {} not found", start)))?;

        let walk: Vec<Result<CommitInfo>> = commits[position..].iter().cloned().map(Ok).collect();
        Ok(Box::new(walk.into_iter()))
    }

    fn read_file_at(&self, commit: Oid, path: &Path) -> Result<Vec<u8>> {
        self.files
            .borrow()
            .get(&(commit, path.to_path_buf()))
            .cloned()
            .ok_or_else(|| {
                TaggerError::repository(format!(
                    "'{}' does not exist in commit {}",
                    path.display(),
                    commit
                ))
            })
    }

    fn commit_files(&self, paths: &[&Path], message: &str) -> Result<Oid> {
        let mut snapshot = Vec::with_capacity(paths.len());
        for path in paths {
            let full_path = self.workdir.join(path);
            if !full_path.is_file() {
                return Err(TaggerError::repository(format!(
                    "Cannot commit '{}': file does not exist",
                    path.display()
                )));
            }
            snapshot.push((path.to_path_buf(), std::fs::read(&full_path)?));
        }

        let oid = self.push_commit(message);
        let mut files = self.files.borrow_mut();
        for (path, content) in snapshot {
            files.insert((oid, path), content);
        }
        Ok(oid)
    }

    fn create_annotated_tag(&self, name: &str, target: Oid, _message: &str) -> Result<Oid> {
        if self.fail_next_tag.replace(false) {
            return Err(TaggerError::repository("Interrupted before tagging"));
        }
        if self.tags.borrow().contains_key(name) {
            return Err(TaggerError::repository(format!(
                "Tag '{}' already exists",
                name
            )));
        }

        self.tags.borrow_mut().insert(
            name.to_string(),
            Tag::new(name, target, TagKind::Annotated),
        );
        Ok(target)
    }
}
