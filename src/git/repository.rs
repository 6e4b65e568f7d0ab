use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use git2::{
    CertificateCheckStatus, Cred, Direction, ErrorCode, ObjectType, Oid, RemoteCallbacks,
    Repository as Git2Repo, Sort,
};
use tracing::{debug, info};

use crate::domain::{Tag, TagKind};
use crate::error::{Result, TaggerError};
use crate::git::transport::{self, CertificateDecision, CertificateKind, CredentialDecision};
use crate::git::{BranchHead, CommitInfo, CommitWalk, Repository};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open the repository rooted at `path`.
    ///
    /// Unlike discovery, this does not walk up into parent directories: the
    /// configured path must be the repository itself.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Git2Repo::open(path).map_err(|e| {
            TaggerError::repository(format!(
                "'{}' is not a git repository: {}",
                path.display(),
                e.message()
            ))
        })?;

        Ok(Git2Repository { repo })
    }

    fn commit_info(&self, commit: &git2::Commit<'_>) -> CommitInfo {
        CommitInfo {
            id: commit.id(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            parents: commit.parent_ids().collect(),
        }
    }
}

/// Paths from configuration may be written as `./version.php`
fn repo_relative(path: &Path) -> &Path {
    path.strip_prefix(".").unwrap_or(path)
}

impl Repository for Git2Repository {
    fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| TaggerError::repository("Repository is bare; a working tree is required"))
    }

    fn current_branch(&self) -> Result<BranchHead> {
        let head = self.repo.head().map_err(|e| match e.code() {
            ErrorCode::UnbornBranch => {
                TaggerError::repository("Current branch has no commits yet")
            }
            _ => TaggerError::repository(format!("Cannot read HEAD: {}", e.message())),
        })?;

        if !head.is_branch() {
            return Err(TaggerError::repository(
                "HEAD is detached; check out a branch first",
            ));
        }

        let name = head
            .shorthand()
            .ok_or_else(|| TaggerError::repository("Current branch name is not valid UTF-8"))?
            .to_string();
        let tip = head
            .target()
            .ok_or_else(|| TaggerError::repository(format!("Branch '{}' has no target", name)))?;

        Ok(BranchHead { name, tip })
    }

    fn fetch_remote_head(&self, remote_name: &str) -> Result<Oid> {
        let mut remote = self.repo.find_remote(remote_name).map_err(|_| {
            TaggerError::configuration(format!("Remote '{}' is not configured", remote_name))
        })?;

        let url = remote
            .url()
            .ok_or_else(|| {
                TaggerError::configuration(format!("Remote '{}' has no valid URL", remote_name))
            })?
            .to_string();
        transport::check_remote_url(&url)?;

        let rejection: RefCell<Option<String>> = RefCell::new(None);

        let agent_attempts = Cell::new(0u32);

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            match transport::select_credential(
                username_from_url,
                allowed_types,
                agent_attempts.get(),
            ) {
                CredentialDecision::SshAgent(username) => {
                    agent_attempts.set(agent_attempts.get() + 1);
                    Cred::ssh_key_from_agent(&username)
                }
                CredentialDecision::Username(username) => Cred::username(&username),
                CredentialDecision::Reject(reason) => Err(git2::Error::from_str(&reason)),
            }
        });
        callbacks.certificate_check(|cert, host| {
            match transport::check_certificate(CertificateKind::of(cert), host) {
                CertificateDecision::Accept => Ok(CertificateCheckStatus::CertificateOk),
                CertificateDecision::Reject(reason) => {
                    let error = git2::Error::from_str(&reason);
                    *rejection.borrow_mut() = Some(reason);
                    Err(error)
                }
            }
        });

        debug!(remote = remote_name, %url, "connecting to remote");
        let connection = match remote.connect_auth(Direction::Fetch, Some(callbacks), None) {
            Ok(connection) => connection,
            Err(e) => {
                if let Some(reason) = rejection.borrow().clone() {
                    return Err(TaggerError::configuration(reason));
                }
                return Err(TaggerError::repository(format!(
                    "Cannot fetch from remote '{}': {}",
                    remote_name,
                    e.message()
                )));
            }
        };

        let heads = connection.list().map_err(|e| {
            TaggerError::repository(format!(
                "Cannot list references of remote '{}': {}",
                remote_name,
                e.message()
            ))
        })?;

        let head = heads
            .iter()
            .find(|head| head.name() == "HEAD")
            .map(|head| head.oid())
            .ok_or_else(|| {
                TaggerError::repository(format!("Remote '{}' has no HEAD", remote_name))
            })?;

        info!(remote = remote_name, %head, "resolved remote HEAD");
        Ok(head)
    }

    fn resolve_tag(&self, tag_name: &str) -> Result<Option<Tag>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        let reference = match self.repo.find_reference(&reference_name) {
            Ok(reference) => reference,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => {
                return Err(TaggerError::repository(format!(
                    "Cannot find tag '{}': {}",
                    tag_name,
                    e.message()
                )))
            }
        };

        let direct = reference.target().ok_or_else(|| {
            TaggerError::repository(format!("Tag '{}' is a symbolic reference", tag_name))
        })?;

        let kind = match self.repo.find_object(direct, None)?.kind() {
            Some(ObjectType::Tag) => TagKind::Annotated,
            _ => TagKind::Lightweight,
        };

        let target = reference
            .peel_to_commit()
            .map_err(|e| {
                TaggerError::repository(format!(
                    "Tag '{}' does not point at a commit: {}",
                    tag_name,
                    e.message()
                ))
            })?
            .id();

        debug!(tag = tag_name, %target, ?kind, "resolved tag");
        Ok(Some(Tag::new(tag_name, target, kind)))
    }

    fn find_commit(&self, oid: Oid) -> Result<CommitInfo> {
        let commit = self.repo.find_commit(oid)?;
        Ok(self.commit_info(&commit))
    }

    fn walk_history(&self, start: Oid) -> Result<CommitWalk<'_>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push(start)?;

        Ok(Box::new(revwalk.map(
            move |oid: std::result::Result<Oid, git2::Error>| -> Result<CommitInfo> {
                let commit = self.repo.find_commit(oid?)?;
                Ok(self.commit_info(&commit))
            },
        )))
    }

    fn read_file_at(&self, commit: Oid, path: &Path) -> Result<Vec<u8>> {
        let tree = self.repo.find_commit(commit)?.tree()?;
        let entry = tree.get_path(repo_relative(path)).map_err(|_| {
            TaggerError::repository(format!(
                "'{}' does not exist in commit {}",
                path.display(),
                commit
            ))
        })?;

        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;
        Ok(blob.content().to_vec())
    }

    fn commit_files(&self, paths: &[&Path], message: &str) -> Result<Oid> {
        let workdir = self.workdir()?;

        let mut index = self.repo.index()?;
        for path in paths {
            let relative = repo_relative(path);
            if !workdir.join(relative).is_file() {
                return Err(TaggerError::repository(format!(
                    "Cannot commit '{}': file does not exist",
                    path.display()
                )));
            }
            index.add_path(relative)?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let signature = self.repo.signature().map_err(|_| {
            TaggerError::repository(
                "No author identity configured; set user.name and user.email",
            )
        })?;
        let parent = self.repo.head()?.peel_to_commit()?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        info!(commit = %oid, "created release commit");
        Ok(oid)
    }

    fn create_annotated_tag(&self, name: &str, target: Oid, message: &str) -> Result<Oid> {
        if self.resolve_tag(name)?.is_some() {
            return Err(TaggerError::repository(format!(
                "Tag '{}' already exists",
                name
            )));
        }

        let object = self.repo.find_object(target, None).map_err(|e| {
            TaggerError::repository(format!("Cannot find commit {}: {}", target, e.message()))
        })?;
        let signature = self.repo.signature().map_err(|_| {
            TaggerError::repository(
                "No tagger identity configured; set user.name and user.email",
            )
        })?;

        let oid = self
            .repo
            .tag(name, &object, &signature, message, false)
            .map_err(|e| {
                TaggerError::repository(format!("Cannot create tag '{}': {}", name, e.message()))
            })?;

        info!(tag = name, %target, "created annotated tag");
        Ok(oid)
    }
}
