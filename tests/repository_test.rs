//! Integration tests for repository lifecycle and commit lookup.

use std::fs;
use tempfile::TempDir;

use minivcs::error::{Error, ErrorKind};
use minivcs::{Commit, Repository};

fn init() -> (TempDir, Repository) {
    let temp = TempDir::new().unwrap();
    let repo = Repository::init(temp.path()).unwrap();
    (temp, repo)
}

fn commit_file(temp: &TempDir, repo: &mut Repository, name: &str, content: &str, message: &str) {
    fs::write(temp.path().join(name), content).unwrap();
    repo.add(name).unwrap();
    repo.commit(message).unwrap();
}

// RP-001: init creates master at the root commit
#[test]
fn test_rp001_init_creates_master_at_root() {
    let (_temp, repo) = init();

    let head = repo.head();
    assert_eq!(head.branch_name(), "master");

    let root = repo.head_commit().unwrap();
    assert!(root.is_root());
    assert_eq!(root.message(), "initial commit");
    assert_eq!(root.timestamp(), "Thu Jan 1 00:00:00 1970 +0000");
    assert!(root.files().is_empty());
    assert!(repo.staging().is_empty());
}

// RP-002: the root commit is identical across repositories
#[test]
fn test_rp002_root_commit_shared_across_repositories() {
    let (_a, repo_a) = init();
    let (_b, repo_b) = init();

    assert_eq!(repo_a.head().oid(), repo_b.head().oid());
    assert_eq!(repo_a.head().oid(), Commit::root().unwrap().id());
}

// RP-003: init refuses an existing repository
#[test]
fn test_rp003_init_twice() {
    let (temp, _repo) = init();
    let result = Repository::init(temp.path());

    assert!(matches!(result, Err(Error::AlreadyARepository(_))));
}

// RP-004: open and discover outside a repository
#[test]
fn test_rp004_not_a_repository() {
    let temp = TempDir::new().unwrap();

    assert!(matches!(
        Repository::open(temp.path()),
        Err(Error::NotARepository(_))
    ));
    assert!(matches!(
        Repository::open("/nonexistent/path"),
        Err(Error::NotARepository(_))
    ));
}

// RP-005: discover walks up from a subdirectory
#[test]
fn test_rp005_discover_from_subdirectory() {
    let (temp, _repo) = init();
    let sub = temp.path().join("src/nested");
    fs::create_dir_all(&sub).unwrap();

    let repo = Repository::discover(&sub).unwrap();

    assert_eq!(repo.path(), temp.path().canonicalize().unwrap());
}

// RP-006: a reopened repository sees the same state
#[test]
fn test_rp006_reopen_preserves_state() {
    let (temp, mut repo) = init();
    commit_file(&temp, &mut repo, "a.txt", "hello", "first");
    let head = repo.head();

    let reopened = Repository::open(temp.path()).unwrap();

    assert_eq!(reopened.head(), head);
    assert_eq!(reopened.head_commit().unwrap().message(), "first");
}

// RP-007: commits resolve by full and abbreviated id
#[test]
fn test_rp007_commit_by_id() {
    let (temp, mut repo) = init();
    commit_file(&temp, &mut repo, "a.txt", "hello", "first");
    let id = repo.head().oid().to_hex();

    assert_eq!(repo.commit_by_id(&id).unwrap().message(), "first");
    assert_eq!(repo.commit_by_id(&id[..8]).unwrap().message(), "first");
}

// RP-008: an abbreviation matching nothing is NotFound
#[test]
fn test_rp008_unknown_abbreviation() {
    let (_temp, repo) = init();
    let root = repo.head().oid().to_hex();
    let other = if root.starts_with('f') { "0" } else { "f" };

    let err = repo.commit_by_id(other).unwrap_err();
    assert!(matches!(err, Error::CommitNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// RP-009: an abbreviation matching several commits is Ambiguous
#[test]
fn test_rp009_ambiguous_abbreviation() {
    let (temp, mut repo) = init();

    // With 16 possible first digits, 17 commits guarantee a shared one.
    for i in 0..16 {
        commit_file(&temp, &mut repo, "a.txt", &format!("v{}", i), &format!("c{}", i));
    }

    let ids: Vec<String> = repo
        .global_log()
        .unwrap()
        .iter()
        .map(|e| e.id().to_hex())
        .collect();
    let shared = ids
        .iter()
        .find(|id| ids.iter().filter(|other| other[..1] == id[..1]).count() > 1)
        .map(|id| id[..1].to_string())
        .unwrap();

    let err = repo.commit_by_id(&shared).unwrap_err();
    assert!(matches!(err, Error::AmbiguousId { .. }));
    assert_eq!(err.kind(), ErrorKind::Ambiguous);

    // reset refuses the ambiguous id before touching anything
    let head = repo.head();
    assert!(matches!(repo.reset(&shared), Err(Error::AmbiguousId { .. })));
    assert_eq!(repo.head(), head);
}

// RP-010: objects are stored compressed under fan-out directories
#[test]
fn test_rp010_object_layout() {
    let (temp, repo) = init();
    let hex = repo.head().oid().to_hex();

    let path = temp
        .path()
        .join(".minivcs/objects/commits")
        .join(&hex[..2])
        .join(&hex[2..]);
    let raw = fs::read(path).unwrap();

    // zlib header, not plain JSON
    assert_eq!(raw[0], 0x78);
}
