// tests/integration_test.rs
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{Oid, Repository as Git2Repo, Signature, Time};
use tempfile::TempDir;

use tagger::changelog;
use tagger::cli::{Release, ReleaseStep};
use tagger::config::Config;
use tagger::domain::{MergeRules, Tag, TagKind, Version};
use tagger::git::{BranchHead, CommitInfo, CommitWalk, Git2Repository, Repository};
use tagger::TaggerError;

#[test]
fn test_tagger_help() {
    let output = Command::new("cargo")
        .args(["run", "--bin", "tagger", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("tagger"));
    assert!(stdout.contains("status"));
}

/// Builds a throwaway repository with strictly increasing commit times so
/// time-sorted walks are deterministic.
struct TestRepo {
    dir: TempDir,
    repo: Git2Repo,
    clock: i64,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("Could not create temp dir");
        let repo = Git2Repo::init(dir.path()).expect("Could not init git repo");
        {
            let mut config = repo.config().expect("Could not get config");
            config
                .set_str("user.name", "Test User")
                .expect("Could not set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Could not set user.email");
        }
        repo.set_head("refs/heads/master")
            .expect("Could not point HEAD at master");

        TestRepo {
            dir,
            repo,
            clock: 1_600_000_000,
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(&mut self) -> Signature<'static> {
        self.clock += 60;
        Signature::new("Test User", "test@example.com", &Time::new(self.clock, 0))
            .expect("Could not build signature")
    }

    /// Write `file` and commit it on top of HEAD (if any)
    fn commit_file(&mut self, file: &str, content: &str, message: &str) -> Oid {
        let signature = self.signature();
        fs::write(self.path().join(file), content).expect("Could not write file");

        let mut index = self.repo.index().expect("Could not get index");
        index
            .add_path(Path::new(file))
            .expect("Could not add file to index");
        index.write().expect("Could not write index");
        let tree_id = index.write_tree().expect("Could not write tree");
        let tree = self.repo.find_tree(tree_id).expect("Could not find tree");

        let parents: Vec<git2::Commit> = match self.repo.head() {
            Ok(head) => vec![head.peel_to_commit().expect("Could not peel HEAD")],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        self.repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &parent_refs,
            )
            .expect("Could not create commit")
    }

    fn annotated_tag(&mut self, name: &str, target: Oid) {
        let signature = self.signature();
        let object = self.repo.find_object(target, None).unwrap();
        self.repo
            .tag(name, &object, &signature, "release", false)
            .expect("Could not create tag");
    }

    fn lightweight_tag(&self, name: &str, target: Oid) {
        let object = self.repo.find_object(target, None).unwrap();
        self.repo
            .tag_lightweight(name, &object, false)
            .expect("Could not create tag");
    }

    fn tag_message(&self, name: &str) -> Option<String> {
        let reference = self.repo.find_reference(&format!("refs/tags/{}", name)).ok()?;
        let tag = reference.peel_to_tag().ok()?;
        tag.message().map(str::to_string)
    }

    fn gateway(&self) -> Git2Repository {
        Git2Repository::open(self.path()).expect("Could not open repository")
    }
}

fn php(version: &str) -> String {
    format!("<?php\ndefine('VERSION', '{}');\n", version)
}

/// 1.0.0 released, followed by two merged pull requests and a direct commit
fn released_repo() -> (TestRepo, Oid) {
    let mut test = TestRepo::new();
    let released = test.commit_file("version.php", &php("1.0.0"), "Preparing to tag 1.0.0");
    test.annotated_tag("1.0.0", released);

    test.commit_file(
        "FIRST.md",
        "first",
        "Merge pull request #1 from dev/first\n\nAdded FIRST.md",
    );
    test.commit_file("NOTES.md", "notes", "Fix typo");
    test.commit_file(
        "SECOND.md",
        "second",
        "Merge pull request #2 from dev/second\n\nAdded SECOND.md\n\nLonger body",
    );
    (test, released)
}

fn rules() -> MergeRules {
    MergeRules::new("Merge pull request", "#").unwrap()
}

/// Real repository whose upstream is always in sync, so no network is needed
struct InSync(Git2Repository);

impl Repository for InSync {
    fn workdir(&self) -> tagger::Result<PathBuf> {
        self.0.workdir()
    }

    fn current_branch(&self) -> tagger::Result<BranchHead> {
        self.0.current_branch()
    }

    fn fetch_remote_head(&self, _remote: &str) -> tagger::Result<Oid> {
        Ok(self.0.current_branch()?.tip)
    }

    fn resolve_tag(&self, tag_name: &str) -> tagger::Result<Option<Tag>> {
        self.0.resolve_tag(tag_name)
    }

    fn find_commit(&self, oid: Oid) -> tagger::Result<CommitInfo> {
        self.0.find_commit(oid)
    }

    fn walk_history(&self, start: Oid) -> tagger::Result<CommitWalk<'_>> {
        self.0.walk_history(start)
    }

    fn read_file_at(&self, commit: Oid, path: &Path) -> tagger::Result<Vec<u8>> {
        self.0.read_file_at(commit, path)
    }

    fn commit_files(&self, paths: &[&Path], message: &str) -> tagger::Result<Oid> {
        self.0.commit_files(paths, message)
    }

    fn create_annotated_tag(&self, name: &str, target: Oid, message: &str) -> tagger::Result<Oid> {
        self.0.create_annotated_tag(name, target, message)
    }
}

#[test]
fn test_changelog_since_annotated_tag() {
    let (test, _) = released_repo();
    let repo = test.gateway();
    let tip = repo.current_branch().unwrap().tip;

    let entries = changelog::extract(&repo, tip, "1.0.0", &rules()).unwrap();
    assert_eq!(
        entries,
        vec!["#2 Added SECOND.md".to_string(), "#1 Added FIRST.md".to_string()]
    );
}

#[test]
fn test_changelog_rejects_lightweight_tag() {
    let (test, released) = released_repo();
    test.lightweight_tag("0.9.0", released);
    let repo = test.gateway();
    let tip = repo.current_branch().unwrap().tip;

    let err = changelog::extract(&repo, tip, "0.9.0", &rules()).unwrap_err();
    assert!(matches!(err, TaggerError::Traversal(_)));
    assert!(err.to_string().contains("lightweight"));
}

#[test]
fn test_changelog_tag_outside_history() {
    let (mut test, released) = released_repo();

    // Tag a commit on a side branch that master never reaches
    let master_tip = test.repo.head().unwrap().target().unwrap();
    {
        let base = test.repo.find_commit(released).unwrap();
        test.repo.branch("side", &base, false).unwrap();
    }
    test.repo.set_head("refs/heads/side").unwrap();
    let side = test.commit_file("SIDE.md", "side", "Side work");
    test.annotated_tag("0.5.0", side);
    test.repo.set_head("refs/heads/master").unwrap();

    let repo = test.gateway();
    let err = changelog::extract(&repo, master_tip, "0.5.0", &rules()).unwrap_err();
    assert!(err.to_string().contains("not found in history"));
}

#[test]
fn test_gateway_reads_branch_tags_and_files() {
    let (test, released) = released_repo();
    test.lightweight_tag("light", released);
    let repo = test.gateway();

    let head = repo.current_branch().unwrap();
    assert_eq!(head.name, "master");

    let annotated = repo.resolve_tag("1.0.0").unwrap().unwrap();
    assert_eq!(annotated.kind, TagKind::Annotated);
    assert_eq!(annotated.target, released);
    assert_eq!(
        repo.resolve_tag("light").unwrap().unwrap().kind,
        TagKind::Lightweight
    );
    assert_eq!(repo.resolve_tag("9.9.9").unwrap(), None);

    let content = repo.read_file_at(head.tip, Path::new("version.php")).unwrap();
    assert_eq!(content, php("1.0.0").into_bytes());
    assert!(repo.read_file_at(head.tip, Path::new("missing.php")).is_err());
}

#[test]
fn test_gateway_commit_requires_existing_file() {
    let (test, _) = released_repo();
    let repo = test.gateway();

    let err = repo
        .commit_files(&[Path::new("nope.php")], "Preparing to tag 1.0.1")
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_gateway_refuses_duplicate_tag() {
    let (test, released) = released_repo();
    let repo = test.gateway();

    let err = repo
        .create_annotated_tag("1.0.0", released, "again")
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn test_fetch_rejects_missing_and_non_ssh_remotes() {
    let (test, _) = released_repo();
    test.repo
        .remote("origin", "https://example.com/project.git")
        .unwrap();
    let repo = test.gateway();

    let err = repo.fetch_remote_head("upstream").unwrap_err();
    assert!(matches!(err, TaggerError::Configuration(_)));

    let err = repo.fetch_remote_head("origin").unwrap_err();
    assert!(matches!(err, TaggerError::Configuration(_)));
}

#[test]
fn test_full_release_on_real_repository() {
    let (test, _) = released_repo();
    let repo = InSync(test.gateway());
    let config = Config::default();

    let outcome = Release::new(&repo, &config)
        .unwrap()
        .run(&mut Cursor::new("patch\n"))
        .unwrap();
    assert_eq!(outcome.new_version, Version::new(1, 0, 1));

    assert_eq!(
        fs::read_to_string(test.path().join("version.php")).unwrap(),
        php("1.0.1")
    );

    let head = test.repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.message(), Some("Preparing to tag 1.0.1"));
    assert_eq!(head.id(), outcome.commit);

    let tag = repo.resolve_tag("1.0.1").unwrap().unwrap();
    assert_eq!(tag.kind, TagKind::Annotated);
    assert_eq!(tag.target, head.id());
    assert_eq!(
        test.tag_message("1.0.1").unwrap().trim_end(),
        "#2 Added SECOND.md\n#1 Added FIRST.md"
    );
}

#[test]
fn test_release_refuses_wrong_branch() {
    let (test, _) = released_repo();
    let repo = InSync(test.gateway());
    let config = Config {
        branch: "main".to_string(),
        ..Config::default()
    };

    let err = Release::new(&repo, &config)
        .unwrap()
        .run(&mut Cursor::new("patch\n"))
        .unwrap_err();
    assert_eq!(err.step, ReleaseStep::SyncCheck);
    assert_eq!(
        fs::read_to_string(test.path().join("version.php")).unwrap(),
        php("1.0.0")
    );
}

#[test]
fn test_resume_tags_untagged_release_commit() {
    let (mut test, _) = released_repo();
    let release_commit =
        test.commit_file("version.php", &php("1.1.0"), "Preparing to tag 1.1.0");

    let repo = test.gateway();
    let config = Config::default();
    let release = Release::new(&repo, &config).unwrap();

    let status = release.status().unwrap();
    assert!(status.pending_tag);
    assert_eq!(status.tag, None);

    let outcome = release.resume_tag().unwrap();
    assert_eq!(outcome.old_version, Version::new(1, 0, 0));
    assert_eq!(outcome.new_version, Version::new(1, 1, 0));
    assert_eq!(outcome.commit, release_commit);
    assert_eq!(outcome.changelog.len(), 2);

    let tag = repo.resolve_tag("1.1.0").unwrap().unwrap();
    assert_eq!(tag.target, release_commit);
}
