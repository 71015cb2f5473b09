//! Repository operations.
//!
//! [`Repository`] owns the mutable state of one repository (the reference
//! table and the staging area) and orchestrates every command. Each
//! mutating operation runs all of its precondition checks first and saves
//! the state at the end, so a failed command leaves the repository as it
//! was found.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::StagingArea;
use crate::infra::{safe_join, write_file_atomic, REPO_DIR_NAME};
use crate::journal::Journal;
use crate::log::{LogEntry, LogIterator, LogOptions};
use crate::merge::{self, MergeOutcome, Resolution};
use crate::objects::{Blob, Commit, LooseObjectStore, Oid};
use crate::refs::{Branch, Head, RefTable};
use crate::status::{compute_status, Status};
use crate::worktree::WorkTree;

const OBJECTS_DIR: &str = "objects";
const REFS_FILE: &str = "refs";
const INDEX_FILE: &str = "index";
const JOURNAL_FILE: &str = "journal";
const CONFIG_FILE: &str = "config";

/// A minivcs repository.
///
/// This is the main entry point. It is loaded by [`Repository::open`] (or
/// [`Repository::discover`]), mutated through its command methods, and
/// persists itself after each successful mutation.
#[derive(Debug)]
pub struct Repository {
    /// The root directory of the working tree.
    work_dir: PathBuf,
    /// The `.minivcs` directory.
    repo_dir: PathBuf,
    config: Config,
    store: LooseObjectStore,
    worktree: WorkTree,
    journal: Journal,
    refs: RefTable,
    staging: StagingArea,
}

/// A file write or removal the merge will perform, with content read up
/// front.
enum MergeAction {
    Stage { oid: Oid, content: Vec<u8> },
    Remove,
    Conflict { blob: Blob },
}

impl Repository {
    /// Creates a new repository in `path`.
    ///
    /// Writes the directory skeleton, a default config, and the root commit,
    /// and points a `master` branch at it.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyARepository` if `path` already holds one.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use minivcs::Repository;
    ///
    /// let repo = Repository::init("path/to/project").unwrap();
    /// assert_eq!(repo.head().branch_name(), "master");
    /// ```
    pub fn init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let work_dir = path.canonicalize()?;
        let repo_dir = work_dir.join(REPO_DIR_NAME);

        if repo_dir.exists() {
            return Err(Error::AlreadyARepository(work_dir));
        }

        let config = Config::initial();
        fs::create_dir_all(&repo_dir)?;
        write_file_atomic(repo_dir.join(CONFIG_FILE), config.to_string().as_bytes())?;

        let store = LooseObjectStore::new(repo_dir.join(OBJECTS_DIR), config.compression_level()?);
        store.init()?;

        let root = Commit::root()?;
        let root_id = store.put_commit(&root)?;
        let journal = Journal::new(repo_dir.join(JOURNAL_FILE));
        journal.append(&root_id)?;

        let repo = Repository {
            worktree: WorkTree::new(&work_dir),
            work_dir,
            repo_dir,
            config,
            store,
            journal,
            refs: RefTable::new(root_id),
            staging: StagingArea::new(),
        };
        repo.save()?;

        info!(path = %repo.work_dir.display(), root = %root_id.short(), "initialized repository");
        Ok(repo)
    }

    /// Returns `true` if `repo_dir` looks like a repository directory.
    fn is_repo_dir(repo_dir: &Path) -> bool {
        repo_dir.is_dir()
            && repo_dir.join(OBJECTS_DIR).is_dir()
            && repo_dir.join(REFS_FILE).is_file()
    }

    /// Opens the repository whose working tree root is `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotARepository` if `path` does not contain a
    /// `.minivcs` directory, or a storage error if its state cannot be
    /// loaded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let work_dir = path
            .canonicalize()
            .map_err(|_| Error::NotARepository(path.to_path_buf()))?;
        let repo_dir = work_dir.join(REPO_DIR_NAME);

        if !Self::is_repo_dir(&repo_dir) {
            return Err(Error::NotARepository(path.to_path_buf()));
        }

        Self::load(work_dir, repo_dir)
    }

    /// Finds a repository by searching `path` and then each of its parents.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut current = path
            .canonicalize()
            .map_err(|_| Error::NotARepository(path.to_path_buf()))?;

        loop {
            let repo_dir = current.join(REPO_DIR_NAME);
            if Self::is_repo_dir(&repo_dir) {
                return Self::load(current, repo_dir);
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(Error::NotARepository(path.to_path_buf())),
            }
        }
    }

    fn load(work_dir: PathBuf, repo_dir: PathBuf) -> Result<Self> {
        let config = Config::load_or_default(repo_dir.join(CONFIG_FILE))?;
        let store = LooseObjectStore::new(repo_dir.join(OBJECTS_DIR), config.compression_level()?);
        let refs = RefTable::load(repo_dir.join(REFS_FILE))?;
        let staging = StagingArea::load(repo_dir.join(INDEX_FILE))?;

        debug!(
            path = %work_dir.display(),
            branch = refs.current_branch(),
            head = %refs.head_oid().short(),
            "opened repository"
        );

        Ok(Repository {
            worktree: WorkTree::new(&work_dir),
            journal: Journal::new(repo_dir.join(JOURNAL_FILE)),
            work_dir,
            repo_dir,
            config,
            store,
            refs,
            staging,
        })
    }

    /// Persists the reference table and the staging area.
    pub fn save(&self) -> Result<()> {
        self.refs.save(self.repo_dir.join(REFS_FILE))?;
        self.staging.save(self.repo_dir.join(INDEX_FILE))?;
        Ok(())
    }

    /// Returns the root of the working tree.
    pub fn path(&self) -> &Path {
        &self.work_dir
    }

    /// Returns the `.minivcs` directory.
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the current branch and HEAD commit.
    pub fn head(&self) -> Head {
        self.refs.head()
    }

    /// Reads the HEAD commit.
    pub fn head_commit(&self) -> Result<Commit> {
        self.store.commit(&self.refs.head_oid())
    }

    /// Returns the staging area.
    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Returns all branches sorted by name, the current one marked.
    pub fn branches(&self) -> Vec<Branch> {
        self.refs.branches()
    }

    /// Reads a commit by full or abbreviated id.
    ///
    /// # Errors
    ///
    /// `Error::CommitNotFound` if nothing matches, `Error::AmbiguousId` if
    /// several commits do.
    pub fn commit_by_id(&self, id: &str) -> Result<Commit> {
        let oid = self.store.resolve_commit(id)?;
        self.store.commit(&oid)
    }

    /// Reads the content of a stored blob.
    pub fn blob_content(&self, oid: &Oid) -> Result<Vec<u8>> {
        self.store.blob_content(oid)
    }

    /// Stages the working copy of `name`.
    ///
    /// If the working copy matches the version tracked by HEAD, any staged
    /// change for `name` is dropped instead.
    ///
    /// # Errors
    ///
    /// `Error::FileNotFound` if the file is not in the working tree.
    pub fn add(&mut self, name: &str) -> Result<()> {
        let content = self.worktree.read(name)?;
        let blob = Blob::new(name, content);
        let head = self.head_commit()?;

        if head.file(name) == Some(blob.oid()) {
            if self.staging.unstage(name) {
                debug!(file = name, "unchanged from HEAD; unstaged");
            }
        } else {
            let oid = self.store.put_blob(&blob)?;
            self.staging.stage_add(name, oid);
            debug!(file = name, blob = %oid.short(), "staged for addition");
        }

        self.save()
    }

    /// Commits the staged changes on top of HEAD and returns the new id.
    ///
    /// # Errors
    ///
    /// `Error::NothingToCommit` if nothing is staged (checked first), then
    /// `Error::EmptyMessage` if `message` is blank.
    pub fn commit(&mut self, message: &str) -> Result<Oid> {
        if self.staging.is_empty() {
            return Err(Error::NothingToCommit);
        }
        if message.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }

        self.record_commit(message, None)
    }

    /// Writes a commit of HEAD plus the staged changes, advances the current
    /// branch, clears the staging area and saves.
    fn record_commit(&mut self, message: &str, second_parent: Option<Oid>) -> Result<Oid> {
        let head = self.head_commit()?;
        let files = self.staging.apply_to(head.files());
        let commit = Commit::new(message, Some(head.id()), second_parent, files)?;

        self.store_commit(&commit)
    }

    /// Stores `commit` and makes it the tip of the current branch.
    ///
    /// Timestamps have one-second resolution, so recommitting the same
    /// message and snapshot on the same parent within a second yields an id
    /// that already exists. Such a commit is reused and not journaled twice.
    fn store_commit(&mut self, commit: &Commit) -> Result<Oid> {
        let oid = commit.id();
        if self.store.has_commit(&oid) {
            debug!(commit = %oid.short(), "commit already stored; reusing it");
        } else {
            self.store.put_commit(commit)?;
            self.journal.append(&oid)?;
        }

        self.refs.advance(oid);
        self.staging.clear();
        self.save()?;

        info!(
            commit = %oid.short(),
            branch = self.refs.current_branch(),
            files = commit.files().len(),
            "created commit"
        );
        Ok(oid)
    }

    /// Unstages `name`, or stages its removal if HEAD tracks it.
    ///
    /// Removing a tracked file also deletes it from the working tree.
    ///
    /// # Errors
    ///
    /// `Error::NothingToRemove` if the file is neither staged nor tracked.
    pub fn rm(&mut self, name: &str) -> Result<()> {
        safe_join(&self.work_dir, name)?;

        if self.staging.is_staged_for_addition(name) {
            self.staging.unstage(name);
            debug!(file = name, "unstaged");
        } else if self.head_commit()?.tracks(name) {
            self.staging.stage_remove(name);
            self.worktree.delete(name)?;
            debug!(file = name, "staged for removal");
        } else {
            return Err(Error::NothingToRemove(name.to_string()));
        }

        self.save()
    }

    /// Returns the first-parent history of HEAD, most recent first.
    pub fn log(&self) -> Result<Vec<LogEntry>> {
        self.log_with_options(LogOptions::new().abbrev(self.config.log_abbrev()?))
    }

    /// Returns the first-parent history of HEAD with explicit options.
    pub fn log_with_options(&self, options: LogOptions) -> Result<Vec<LogEntry>> {
        LogIterator::new(&self.store, self.refs.head_oid(), options).collect()
    }

    /// Returns every commit ever made in this repository, in creation order.
    pub fn global_log(&self) -> Result<Vec<LogEntry>> {
        let abbrev = self.config.log_abbrev()?;
        let mut entries = Vec::new();
        for oid in self.journal.entries()? {
            entries.push(LogEntry::from_commit(&self.store.commit(&oid)?, abbrev));
        }
        Ok(entries)
    }

    /// Returns the ids of every commit whose message is exactly `message`,
    /// in creation order.
    ///
    /// # Errors
    ///
    /// `Error::NoMatch` if there are none.
    pub fn find(&self, message: &str) -> Result<Vec<Oid>> {
        let mut found = Vec::new();
        for oid in self.journal.entries()? {
            if self.store.commit(&oid)?.message() == message {
                found.push(oid);
            }
        }

        if found.is_empty() {
            return Err(Error::NoMatch(message.to_string()));
        }
        Ok(found)
    }

    /// Computes the working tree status.
    pub fn status(&self) -> Result<Status> {
        let head = self.head_commit()?;
        compute_status(&self.work_dir, head.files(), &self.staging, self.refs.branches())
    }

    /// Restores `name` as HEAD has it. Staging and HEAD are not touched.
    pub fn checkout_file(&self, name: &str) -> Result<()> {
        let head = self.head_commit()?;
        self.restore_file(&head, name)
    }

    /// Restores `name` as the commit `id` (possibly abbreviated) has it.
    ///
    /// # Errors
    ///
    /// `Error::CommitNotFound` or `Error::AmbiguousId` if `id` does not
    /// resolve, `Error::FileNotInCommit` if the commit lacks `name`.
    pub fn checkout_file_at(&self, id: &str, name: &str) -> Result<()> {
        let commit = self.commit_by_id(id)?;
        self.restore_file(&commit, name)
    }

    fn restore_file(&self, commit: &Commit, name: &str) -> Result<()> {
        let oid = commit
            .file(name)
            .ok_or_else(|| Error::FileNotInCommit(name.to_string()))?;
        let content = self.store.blob_content(&oid)?;
        self.worktree.write(name, &content)?;

        debug!(file = name, commit = %commit.id().short(), "restored file");
        Ok(())
    }

    /// Switches to branch `name`, replacing the working tree with its
    /// snapshot and clearing the staging area.
    ///
    /// # Errors
    ///
    /// - `Error::NoSuchBranch` if the branch does not exist.
    /// - `Error::AlreadyOnBranch` if it is the current branch.
    /// - `Error::UntrackedObstruction` if an untracked file would be
    ///   overwritten.
    pub fn checkout_branch(&mut self, name: &str) -> Result<()> {
        let target_oid = self
            .refs
            .get(name)
            .ok_or_else(|| Error::NoSuchBranch(name.to_string()))?;
        if name == self.refs.current_branch() {
            return Err(Error::AlreadyOnBranch(name.to_string()));
        }

        self.switch_to(name, target_oid)
    }

    fn switch_to(&mut self, name: &str, target_oid: Oid) -> Result<()> {
        let head = self.head_commit()?;
        let target = self.store.commit(&target_oid)?;
        self.worktree
            .check_untracked(head.files(), &self.staging, target.files())?;

        self.worktree.sync(&self.store, head.files(), target.files())?;
        self.staging.clear();
        self.refs.switch(name)?;
        self.save()?;

        info!(branch = name, head = %target_oid.short(), "switched branch");
        Ok(())
    }

    /// Creates branch `name` at HEAD. HEAD does not move.
    pub fn branch(&mut self, name: &str) -> Result<()> {
        let head = self.refs.head_oid();
        self.refs.create(name, head)?;
        self.save()?;

        info!(branch = name, head = %head.short(), "created branch");
        Ok(())
    }

    /// Deletes the branch pointer `name`. Its commits are kept.
    pub fn rm_branch(&mut self, name: &str) -> Result<()> {
        self.refs.delete(name)?;
        self.save()?;

        info!(branch = name, "removed branch");
        Ok(())
    }

    /// Moves the current branch to commit `id` (possibly abbreviated),
    /// replacing the working tree with its snapshot and clearing the staging
    /// area.
    pub fn reset(&mut self, id: &str) -> Result<()> {
        let target_oid = self.store.resolve_commit(id)?;
        let target = self.store.commit(&target_oid)?;
        let head = self.head_commit()?;
        self.worktree
            .check_untracked(head.files(), &self.staging, target.files())?;

        self.worktree.sync(&self.store, head.files(), target.files())?;
        self.refs.advance(target_oid);
        self.staging.clear();
        self.save()?;

        info!(
            branch = self.refs.current_branch(),
            head = %target_oid.short(),
            "reset branch"
        );
        Ok(())
    }

    /// Merges branch `name` into the current branch.
    ///
    /// Conflicts are not errors: conflicted files are written with markers,
    /// staged, and listed in the returned [`MergeOutcome::Merged`].
    ///
    /// # Errors
    ///
    /// In order: `Error::DirtyStagingArea`, `Error::NoSuchBranch`,
    /// `Error::SelfMerge`, `Error::UntrackedObstruction`.
    pub fn merge(&mut self, name: &str) -> Result<MergeOutcome> {
        if !self.staging.is_empty() {
            return Err(Error::DirtyStagingArea);
        }
        let target_oid = self
            .refs
            .get(name)
            .ok_or_else(|| Error::NoSuchBranch(name.to_string()))?;
        if name == self.refs.current_branch() {
            return Err(Error::SelfMerge(name.to_string()));
        }

        let head = self.head_commit()?;
        let target = self.store.commit(&target_oid)?;
        self.worktree
            .check_untracked(head.files(), &self.staging, target.files())?;

        let split_oid = merge::find_split_point(&self.store, head.id(), target_oid)?;
        if split_oid == head.id() {
            self.switch_to(name, target_oid)?;
            info!(branch = name, "merge fast-forwarded");
            return Ok(MergeOutcome::FastForwarded);
        }
        if split_oid == target_oid {
            info!(branch = name, "given branch is an ancestor of the current branch");
            return Ok(MergeOutcome::AlreadyUpToDate);
        }

        let split = self.store.commit(&split_oid)?;
        let plan = merge::plan(split.files(), head.files(), target.files());
        debug!(split = %split_oid.short(), files = plan.len(), "planned merge");

        let actions = self.prepare_merge(plan)?;
        let mut conflicts = Vec::new();

        for (file, action) in actions {
            match action {
                MergeAction::Stage { oid, content } => {
                    self.worktree.write(&file, &content)?;
                    self.staging.stage_add(file, oid);
                }
                MergeAction::Remove => {
                    self.worktree.delete(&file)?;
                    self.staging.stage_remove(file);
                }
                MergeAction::Conflict { blob } => {
                    let oid = self.store.put_blob(&blob)?;
                    self.worktree.write(&file, blob.content())?;
                    self.staging.stage_add(file.clone(), oid);
                    conflicts.push(file);
                }
            }
        }

        let message = merge::merge_message(name, self.refs.current_branch());
        let commit = self.record_commit(&message, Some(target_oid))?;

        if !conflicts.is_empty() {
            warn!(count = conflicts.len(), "encountered a merge conflict");
        }
        Ok(MergeOutcome::Merged { commit, conflicts })
    }

    /// Reads every blob the merge needs before anything is written.
    fn prepare_merge(
        &self,
        plan: BTreeMap<String, Resolution>,
    ) -> Result<Vec<(String, MergeAction)>> {
        let mut actions = Vec::with_capacity(plan.len());

        for (file, resolution) in plan {
            let action = match resolution {
                Resolution::TakeTarget(oid) => MergeAction::Stage {
                    oid,
                    content: self.store.blob_content(&oid)?,
                },
                Resolution::Remove => MergeAction::Remove,
                Resolution::Conflict { current, target } => {
                    let ours = self.optional_blob(current)?;
                    let theirs = self.optional_blob(target)?;
                    let content = merge::conflict_content(&ours, &theirs);
                    MergeAction::Conflict {
                        blob: Blob::new(file.clone(), content),
                    }
                }
            };
            actions.push((file, action));
        }

        Ok(actions)
    }

    fn optional_blob(&self, oid: Option<Oid>) -> Result<Vec<u8>> {
        match oid {
            Some(oid) => self.store.blob_content(&oid),
            None => Ok(Vec::new()),
        }
    }
}
