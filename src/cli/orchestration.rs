//! Release workflow orchestration
//!
//! Sequences one release run: sync check, version read, changelog, bump
//! selection, write and commit, tag. Every step gates the next and any
//! failure stops the run, reported as a [StepError] naming the step.
//!
//! Steps up to bump selection leave no trace. The commit step is durable on
//! its own, so a run interrupted before tagging leaves a release commit
//! without its tag; [Release::resume_tag] finishes such a run.

use std::fmt;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use git2::Oid;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::boundary::BoundaryWarning;
use crate::changelog;
use crate::codec::VersionCodec;
use crate::config::Config;
use crate::domain::tag::{release_commit_message, released_version_from_message};
use crate::domain::{MergeRules, Tag, Version};
use crate::error::{Result, TaggerError};
use crate::git::{BranchHead, Repository};
use crate::ui;

/// The steps of a release run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStep {
    Configuration,
    SyncCheck,
    VersionRead,
    Changelog,
    BumpSelection,
    Commit,
    Tag,
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseStep::Configuration => "Configuration",
            ReleaseStep::SyncCheck => "Sync check",
            ReleaseStep::VersionRead => "Version read",
            ReleaseStep::Changelog => "Changelog",
            ReleaseStep::BumpSelection => "Bump selection",
            ReleaseStep::Commit => "Write and commit",
            ReleaseStep::Tag => "Tag",
        };
        f.write_str(name)
    }
}

/// A failed release step and its cause
#[derive(Debug, Error)]
#[error("{step} failed: {source}")]
pub struct StepError {
    pub step: ReleaseStep,
    #[source]
    pub source: TaggerError,
}

trait AtStep<T> {
    fn at(self, step: ReleaseStep) -> std::result::Result<T, StepError>;
}

impl<T> AtStep<T> for Result<T> {
    fn at(self, step: ReleaseStep) -> std::result::Result<T, StepError> {
        self.map_err(|source| StepError { step, source })
    }
}

/// Result of a successful release (or resumed release)
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub old_version: Version,
    pub new_version: Version,
    /// The release commit that was tagged
    pub commit: Oid,
    /// Changelog lines used as the tag message, newest first
    pub changelog: Vec<String>,
}

/// What `status` found
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub branch: String,
    pub version: Version,
    pub tag: Option<Tag>,
    /// `None` when the changelog could not be computed
    pub changelog: Option<Vec<String>>,
    /// HEAD is a release commit for `version` that was never tagged
    pub pending_tag: bool,
}

/// One release run against a repository
pub struct Release<'a, R: Repository + ?Sized> {
    repo: &'a R,
    config: &'a Config,
    codec: VersionCodec,
    rules: MergeRules,
}

impl<'a, R: Repository + ?Sized> Release<'a, R> {
    /// Prepare a run; fails if the configuration is unusable
    pub fn new(repo: &'a R, config: &'a Config) -> std::result::Result<Self, StepError> {
        let step = ReleaseStep::Configuration;
        config.validate().at(step)?;

        Ok(Release {
            repo,
            config,
            codec: config.codec().at(step)?,
            rules: config.merge_rules().at(step)?,
        })
    }

    /// Run the full release workflow.
    ///
    /// `input` supplies the operator's answer to the bump prompt.
    pub fn run<I: BufRead>(&self, input: &mut I) -> std::result::Result<ReleaseOutcome, StepError> {
        // 1. Sync check
        let head = self.check_branch().at(ReleaseStep::SyncCheck)?;
        ui::display_status(&format!(
            "Fetching HEAD of remote '{}'...",
            self.config.remote
        ));
        self.check_upstream(&head).at(ReleaseStep::SyncCheck)?;
        ui::display_success(&format!(
            "Branch '{}' is in sync with '{}'",
            head.name, self.config.remote
        ));

        // 2. Version read
        let path = self.version_path().at(ReleaseStep::VersionRead)?;
        let content = fs::read(&path)
            .map_err(TaggerError::from)
            .at(ReleaseStep::VersionRead)?;
        let old_version = self.codec.read(&content).at(ReleaseStep::VersionRead)?;
        let old_tag = old_version.to_string();
        ui::display_current_version(&old_tag);

        // 3. Changelog
        let entries = changelog::extract(self.repo, head.tip, &old_tag, &self.rules)
            .at(ReleaseStep::Changelog)?;
        ui::display_changelog(&entries, &old_tag);
        if entries.is_empty() {
            ui::display_boundary_warning(&BoundaryWarning::EmptyChangelog {
                since_tag: old_tag.clone(),
            });
        }

        // 4. Bump selection
        let request = ui::prompt_bump(&old_version, input).at(ReleaseStep::BumpSelection)?;
        let new_version = request
            .apply(&old_version)
            .at(ReleaseStep::BumpSelection)?;
        self.check_new_version(&old_version, &new_version)
            .at(ReleaseStep::BumpSelection)?;
        ui::display_proposed_version(&old_tag, &new_version.to_string());

        // 5. Write and commit
        let commit = self
            .write_and_commit(&path, &content, &old_tag, &new_version)
            .at(ReleaseStep::Commit)?;
        ui::display_success(&format!("Committed version {} as {}", new_version, commit));

        // 6. Tag
        self.tag_release(commit, &new_version, &entries)
            .at(ReleaseStep::Tag)?;

        Ok(ReleaseOutcome {
            old_version,
            new_version,
            commit,
            changelog: entries,
        })
    }

    /// Report the released version, its tag and the changelog since it.
    ///
    /// Never fetches and never modifies the repository.
    pub fn status(&self) -> std::result::Result<StatusReport, StepError> {
        let head = self.repo.current_branch().at(ReleaseStep::SyncCheck)?;
        if head.name != self.config.branch {
            ui::display_status(&format!(
                "On branch '{}'; releases are made from '{}'",
                head.name, self.config.branch
            ));
        }

        let path = self.version_path().at(ReleaseStep::VersionRead)?;
        let content = fs::read(&path)
            .map_err(TaggerError::from)
            .at(ReleaseStep::VersionRead)?;
        let version = self.codec.read(&content).at(ReleaseStep::VersionRead)?;
        let tag_name = version.to_string();
        ui::display_current_version(&tag_name);

        let tag = self.repo.resolve_tag(&tag_name).at(ReleaseStep::Changelog)?;
        let mut pending_tag = false;
        let changelog = match &tag {
            Some(_) => match changelog::extract(self.repo, head.tip, &tag_name, &self.rules) {
                Ok(entries) => {
                    ui::display_changelog(&entries, &tag_name);
                    Some(entries)
                }
                Err(e) => {
                    ui::display_error(&format!("Cannot compute changelog: {}", e));
                    None
                }
            },
            None => {
                let head_commit = self.repo.find_commit(head.tip).at(ReleaseStep::Changelog)?;
                pending_tag =
                    released_version_from_message(&head_commit.message) == Some(tag_name.as_str());

                let warning = if pending_tag {
                    BoundaryWarning::PendingTag {
                        version: tag_name.clone(),
                        commit_hash: head.tip.to_string(),
                    }
                } else {
                    BoundaryWarning::TagNotFound {
                        tag: tag_name.clone(),
                        remote: self.config.remote.clone(),
                    }
                };
                ui::display_boundary_warning(&warning);
                None
            }
        };

        Ok(StatusReport {
            branch: head.name,
            version,
            tag,
            changelog,
            pending_tag,
        })
    }

    /// Finish a release whose commit was made but whose tag was not.
    ///
    /// HEAD must be a `Preparing to tag x.y.z` commit whose version file holds
    /// `x.y.z`, and that tag must not exist yet. The changelog is computed
    /// from the version recorded in HEAD's parent.
    pub fn resume_tag(&self) -> std::result::Result<ReleaseOutcome, StepError> {
        let head = self.check_branch().at(ReleaseStep::SyncCheck)?;

        let (old_version, new_version, parent) =
            self.pending_release(&head).at(ReleaseStep::VersionRead)?;
        ui::display_status(&format!(
            "Resuming release {} from commit {}",
            new_version, head.tip
        ));

        let entries =
            changelog::extract(self.repo, parent, &old_version.to_string(), &self.rules)
                .at(ReleaseStep::Changelog)?;
        ui::display_changelog(&entries, &old_version.to_string());

        self.tag_release(head.tip, &new_version, &entries)
            .at(ReleaseStep::Tag)?;

        Ok(ReleaseOutcome {
            old_version,
            new_version,
            commit: head.tip,
            changelog: entries,
        })
    }

    fn check_branch(&self) -> Result<BranchHead> {
        let head = self.repo.current_branch()?;
        if head.name != self.config.branch {
            return Err(TaggerError::repository(format!(
                "You are not on branch '{}' (currently on '{}')",
                self.config.branch, head.name
            )));
        }
        debug!(branch = %head.name, tip = %head.tip, "on release branch");
        Ok(head)
    }

    fn check_upstream(&self, head: &BranchHead) -> Result<()> {
        let upstream = self.repo.fetch_remote_head(&self.config.remote)?;
        if upstream != head.tip {
            return Err(TaggerError::repository(format!(
                "Local branch '{}' ({}) is out of sync with '{}' ({})",
                head.name, head.tip, self.config.remote, upstream
            )));
        }
        Ok(())
    }

    fn version_path(&self) -> Result<PathBuf> {
        Ok(self.repo.workdir()?.join(&self.config.file))
    }

    fn check_new_version(&self, old: &Version, new: &Version) -> Result<()> {
        if new == old {
            return Err(TaggerError::input(format!(
                "{} is already the current version",
                new
            )));
        }
        if self.repo.resolve_tag(&new.to_string())?.is_some() {
            return Err(TaggerError::input(format!("Tag '{}' already exists", new)));
        }
        Ok(())
    }

    fn write_and_commit(
        &self,
        path: &Path,
        original: &[u8],
        old_version: &str,
        new_version: &Version,
    ) -> Result<Oid> {
        let updated = self.codec.write(original, old_version, new_version)?;
        fs::write(path, &updated)?;

        let message = release_commit_message(&new_version.to_string());
        match self.repo.commit_files(&[self.config.file.as_path()], &message) {
            Ok(commit) => Ok(commit),
            Err(e) => {
                // Nothing was committed; put the file back the way it was.
                if let Err(restore) = fs::write(path, original) {
                    warn!(path = %path.display(), error = %restore, "cannot restore version file");
                }
                Err(e)
            }
        }
    }

    /// Tag `commit` after checking it really records `version`.
    fn tag_release(&self, commit: Oid, version: &Version, entries: &[String]) -> Result<()> {
        let committed = self.repo.read_file_at(commit, &self.config.file)?;
        let committed_version = self.codec.read(&committed)?;
        if committed_version != *version {
            return Err(TaggerError::parse(format!(
                "Commit {} records version {} but the tag would be {}",
                commit, committed_version, version
            )));
        }

        let tag_name = version.to_string();
        self.repo
            .create_annotated_tag(&tag_name, commit, &entries.join("\n"))?;
        info!(tag = %tag_name, %commit, entries = entries.len(), "release tagged");
        ui::display_success(&format!("Created annotated tag {}", tag_name));
        Ok(())
    }

    fn pending_release(&self, head: &BranchHead) -> Result<(Version, Version, Oid)> {
        let commit = self.repo.find_commit(head.tip)?;
        let version_text = released_version_from_message(&commit.message).ok_or_else(|| {
            TaggerError::repository(format!(
                "HEAD ({}) is not a release commit; nothing to resume",
                head.tip
            ))
        })?;
        let new_version = Version::parse(version_text)?;

        let committed = self.repo.read_file_at(head.tip, &self.config.file)?;
        if self.codec.read(&committed)? != new_version {
            return Err(TaggerError::parse(format!(
                "Release commit {} does not record version {} in '{}'",
                head.tip,
                new_version,
                self.config.file.display()
            )));
        }

        if self.repo.resolve_tag(version_text)?.is_some() {
            return Err(TaggerError::repository(format!(
                "Tag '{}' already exists; nothing to resume",
                version_text
            )));
        }

        let parent = *commit.parents.first().ok_or_else(|| {
            TaggerError::repository(format!("Release commit {} has no parent", head.tip))
        })?;
        let previous = self.repo.read_file_at(parent, &self.config.file)?;
        let old_version = self.codec.read(&previous)?;

        Ok((old_version, new_version, parent))
    }
}
