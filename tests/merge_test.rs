//! Integration tests for merge.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use minivcs::error::Error;
use minivcs::{MergeOutcome, Repository};

fn init() -> (TempDir, Repository) {
    let temp = TempDir::new().unwrap();
    let repo = Repository::init(temp.path()).unwrap();
    (temp, repo)
}

fn write(temp: &TempDir, name: &str, content: &str) {
    let path = temp.path().join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(temp: &TempDir, name: &str) -> String {
    fs::read_to_string(temp.path().join(name)).unwrap()
}

fn commit_file(temp: &TempDir, repo: &mut Repository, name: &str, content: &str, message: &str) {
    write(temp, name, content);
    repo.add(name).unwrap();
    repo.commit(message).unwrap();
}

/// Every working file and its bytes, skipping the repository directory.
fn snapshot(temp: &TempDir) -> BTreeMap<String, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.file_name().unwrap() == ".minivcs" {
                continue;
            }
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let name = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                out.insert(name, fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(temp.path(), temp.path(), &mut out);
    out
}

/// master and feature both start from a commit tracking `x` = "1\n".
fn diverged_on_x() -> (TempDir, Repository) {
    let (temp, mut repo) = init();
    commit_file(&temp, &mut repo, "x.txt", "1\n", "split");
    repo.branch("feature").unwrap();

    repo.checkout_branch("feature").unwrap();
    commit_file(&temp, &mut repo, "x.txt", "3\n", "feature edits x");

    repo.checkout_branch("master").unwrap();
    commit_file(&temp, &mut repo, "x.txt", "2\n", "master edits x");

    (temp, repo)
}

// M-001: merging a descendant fast-forwards without a merge commit
#[test]
fn test_m001_fast_forward() {
    let (temp, mut repo) = init();
    commit_file(&temp, &mut repo, "a.txt", "hello", "first");
    repo.branch("feature").unwrap();
    repo.checkout_branch("feature").unwrap();
    commit_file(&temp, &mut repo, "a.txt", "world", "second");
    let feature_tip = repo.head().oid();
    repo.checkout_branch("master").unwrap();
    let commits_before = repo.global_log().unwrap().len();

    let outcome = repo.merge("feature").unwrap();

    assert_eq!(outcome, MergeOutcome::FastForwarded);
    assert_eq!(repo.head().oid(), feature_tip);
    assert_eq!(read(&temp, "a.txt"), "world");
    assert_eq!(repo.global_log().unwrap().len(), commits_before);
    assert!(!repo.head_commit().unwrap().is_merge());
}

// M-002: merging an ancestor changes nothing
#[test]
fn test_m002_already_up_to_date() {
    let (temp, mut repo) = init();
    repo.branch("old").unwrap();
    commit_file(&temp, &mut repo, "a.txt", "hello", "first");
    let head = repo.head();

    let outcome = repo.merge("old").unwrap();

    assert_eq!(outcome, MergeOutcome::AlreadyUpToDate);
    assert_eq!(repo.head(), head);
    assert_eq!(read(&temp, "a.txt"), "hello");
}

// M-003: both sides changing one file differently conflicts
#[test]
fn test_m003_conflict() {
    let (temp, mut repo) = diverged_on_x();
    let master_tip = repo.head().oid();
    let feature_tip = repo.branches().iter().find(|b| b.name() == "feature").unwrap().oid();

    let outcome = repo.merge("feature").unwrap();

    let MergeOutcome::Merged { commit, conflicts } = outcome else {
        panic!("expected a merge commit");
    };
    assert_eq!(conflicts, vec!["x.txt".to_string()]);

    let expected = "<<<<<<< HEAD\n2\n=======\n3\n>>>>>>>\n";
    assert_eq!(read(&temp, "x.txt"), expected);

    let merge = repo.head_commit().unwrap();
    assert_eq!(merge.id(), commit);
    assert_eq!(merge.parent(), Some(master_tip));
    assert_eq!(merge.second_parent(), Some(feature_tip));
    assert_eq!(merge.message(), "Merged feature into master.");
    assert!(repo.staging().is_empty());

    // The conflicted content is part of the merge snapshot.
    write(&temp, "x.txt", "scratch");
    repo.checkout_file("x.txt").unwrap();
    assert_eq!(read(&temp, "x.txt"), expected);
}

// M-004: the scenario from the walkthrough, with master diverging
#[test]
fn test_m004_walkthrough_with_divergence() {
    let (temp, mut repo) = init();
    commit_file(&temp, &mut repo, "a.txt", "hello", "first");
    repo.branch("feature").unwrap();
    repo.checkout_branch("feature").unwrap();
    commit_file(&temp, &mut repo, "a.txt", "world", "second");
    repo.checkout_branch("master").unwrap();
    commit_file(&temp, &mut repo, "a.txt", "there", "third");

    let outcome = repo.merge("feature").unwrap();

    assert!(outcome.has_conflicts());
    assert_eq!(
        read(&temp, "a.txt"),
        "<<<<<<< HEAD\nthere=======\nworld>>>>>>>\n"
    );
    let merge = repo.head_commit().unwrap();
    assert!(merge.is_merge());
    assert_eq!(repo.head().branch_name(), "master");
}

// M-005: non-conflicting changes from both sides are combined
#[test]
fn test_m005_clean_merge() {
    let (temp, mut repo) = init();
    write(&temp, "keep.txt", "base");
    write(&temp, "edit.txt", "base");
    write(&temp, "drop.txt", "base");
    repo.add("keep.txt").unwrap();
    repo.add("edit.txt").unwrap();
    repo.add("drop.txt").unwrap();
    repo.commit("split").unwrap();
    repo.branch("feature").unwrap();

    repo.checkout_branch("feature").unwrap();
    commit_file(&temp, &mut repo, "edit.txt", "feature edit", "edit on feature");
    repo.rm("drop.txt").unwrap();
    repo.commit("drop on feature").unwrap();
    commit_file(&temp, &mut repo, "new.txt", "from feature", "add on feature");

    repo.checkout_branch("master").unwrap();
    commit_file(&temp, &mut repo, "keep.txt", "master edit", "edit on master");

    let outcome = repo.merge("feature").unwrap();

    assert!(matches!(outcome, MergeOutcome::Merged { ref conflicts, .. } if conflicts.is_empty()));
    assert_eq!(read(&temp, "keep.txt"), "master edit");
    assert_eq!(read(&temp, "edit.txt"), "feature edit");
    assert_eq!(read(&temp, "new.txt"), "from feature");
    assert!(!temp.path().join("drop.txt").exists());

    let merge = repo.head_commit().unwrap();
    assert_eq!(
        merge.files().keys().collect::<Vec<_>>(),
        vec!["edit.txt", "keep.txt", "new.txt"]
    );
}

// M-006: deletion on one side against an edit on the other conflicts
#[test]
fn test_m006_delete_edit_conflict() {
    let (temp, mut repo) = init();
    commit_file(&temp, &mut repo, "x.txt", "base\n", "split");
    repo.branch("feature").unwrap();

    repo.checkout_branch("feature").unwrap();
    repo.rm("x.txt").unwrap();
    repo.commit("delete on feature").unwrap();

    repo.checkout_branch("master").unwrap();
    commit_file(&temp, &mut repo, "x.txt", "edited\n", "edit on master");
    commit_file(&temp, &mut repo, "other.txt", "o", "unrelated");

    let outcome = repo.merge("feature").unwrap();

    assert!(outcome.has_conflicts());
    assert_eq!(read(&temp, "x.txt"), "<<<<<<< HEAD\nedited\n=======\n>>>>>>>\n");
}

// M-007: preconditions are checked in order before anything changes
#[test]
fn test_m007_preconditions() {
    let (temp, mut repo) = diverged_on_x();

    write(&temp, "staged.txt", "s");
    repo.add("staged.txt").unwrap();
    assert!(matches!(repo.merge("nope"), Err(Error::DirtyStagingArea)));
    repo.rm("staged.txt").unwrap();

    assert!(matches!(repo.merge("nope"), Err(Error::NoSuchBranch(_))));
    assert!(matches!(repo.merge("master"), Err(Error::SelfMerge(_))));
}

// M-008: an untracked file the target would write blocks the merge
#[test]
fn test_m008_untracked_obstruction() {
    let (temp, mut repo) = diverged_on_x();
    repo.checkout_branch("feature").unwrap();
    commit_file(&temp, &mut repo, "new.txt", "from feature", "add new");
    repo.checkout_branch("master").unwrap();
    let head = repo.head();

    write(&temp, "new.txt", "mine");

    assert!(matches!(
        repo.merge("feature"),
        Err(Error::UntrackedObstruction(ref f)) if f == "new.txt"
    ));
    assert_eq!(repo.head(), head);
    assert_eq!(read(&temp, "new.txt"), "mine");
    assert_eq!(read(&temp, "x.txt"), "2\n");
}

// M-009: after a merge, the merged branch's history is an ancestor
#[test]
fn test_m009_merge_then_merge_again() {
    let (_temp, mut repo) = diverged_on_x();
    repo.merge("feature").unwrap();

    assert_eq!(repo.merge("feature").unwrap(), MergeOutcome::AlreadyUpToDate);
}

// M-010: an untracked dot file the target tracks blocks the merge
#[test]
fn test_m010_dot_file_obstruction() {
    let (temp, mut repo) = diverged_on_x();
    repo.checkout_branch("feature").unwrap();
    commit_file(&temp, &mut repo, ".env", "theirs", "add env");
    repo.checkout_branch("master").unwrap();
    let head = repo.head();

    write(&temp, ".env", "MY SECRET");
    let before = snapshot(&temp);

    assert!(matches!(
        repo.merge("feature"),
        Err(Error::UntrackedObstruction(ref f)) if f == ".env"
    ));
    assert_eq!(snapshot(&temp), before);
    assert_eq!(repo.head(), head);
    assert!(repo.staging().is_empty());
}

// M-011: an untracked file where the target needs a directory blocks the
// merge before any file is written or removed
#[test]
fn test_m011_file_in_place_of_directory() {
    let (temp, mut repo) = diverged_on_x();
    repo.checkout_branch("feature").unwrap();
    commit_file(&temp, &mut repo, "d/a.txt", "nested", "add nested");
    repo.checkout_branch("master").unwrap();
    let head = repo.head();

    write(&temp, "d", "mine");
    let before = snapshot(&temp);

    assert!(matches!(
        repo.merge("feature"),
        Err(Error::UntrackedObstruction(ref f)) if f == "d"
    ));
    assert_eq!(snapshot(&temp), before);
    assert_eq!(repo.head(), head);
    assert!(repo.staging().is_empty());

    fs::remove_file(temp.path().join("d")).unwrap();
    assert!(repo.merge("feature").unwrap().has_conflicts());
    assert_eq!(read(&temp, "d/a.txt"), "nested");
}
