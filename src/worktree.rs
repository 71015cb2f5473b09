//! Working tree file access and snapshot synchronisation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::index::StagingArea;
use crate::infra::{list_working_tree, read_file, remove_file_pruning, safe_join, write_file_atomic};
use crate::objects::{LooseObjectStore, Oid};

/// The user's files, rooted at the repository's top directory.
#[derive(Debug, Clone)]
pub struct WorkTree {
    root: PathBuf,
}

impl WorkTree {
    /// Creates a view of the working tree at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        WorkTree {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `true` if `name` exists as a regular file.
    pub fn exists(&self, name: &str) -> bool {
        safe_join(&self.root, name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Reads the content of `name`.
    ///
    /// A missing file is reported as `Error::FileNotFound(name)`.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = safe_join(&self.root, name)?;
        read_file(&path).map_err(|e| match e {
            Error::FileNotFound(_) => Error::FileNotFound(name.to_string()),
            other => other,
        })
    }

    /// Writes `content` to `name`, creating parent directories.
    pub fn write(&self, name: &str, content: &[u8]) -> Result<()> {
        let path = safe_join(&self.root, name)?;
        write_file_atomic(path, content)
    }

    /// Deletes `name` if present, pruning directories left empty.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = safe_join(&self.root, name)?;
        remove_file_pruning(&self.root, path)
    }

    /// Lists every file, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        list_working_tree(&self.root)
    }

    /// Fails with `Error::UntrackedObstruction` if replacing `head_files`
    /// with `incoming` would clobber a file HEAD does not track.
    ///
    /// Two cases are caught. A working file that HEAD does not track, and
    /// that is not staged for addition, has a counterpart in `incoming`. Or
    /// a path `incoming` needs is taken by something `sync` would not clear
    /// first: a file where a directory must go, or a directory where a file
    /// must go that `sync` would not empty.
    pub fn check_untracked(
        &self,
        head_files: &BTreeMap<String, Oid>,
        staging: &StagingArea,
        incoming: &BTreeMap<String, Oid>,
    ) -> Result<()> {
        let working = self.list()?;

        for name in &working {
            if !head_files.contains_key(name)
                && !staging.is_staged_for_addition(name)
                && incoming.contains_key(name)
            {
                return Err(Error::UntrackedObstruction(name.clone()));
            }
        }

        // Deleted by `sync` before anything is written.
        let cleared = |name: &str| head_files.contains_key(name) && !incoming.contains_key(name);

        for name in incoming.keys() {
            for dir in parent_dirs(name) {
                let path = safe_join(&self.root, dir)?;
                if path.exists() && !path.is_dir() && !cleared(dir) {
                    return Err(Error::UntrackedObstruction(dir.to_string()));
                }
            }

            let path = safe_join(&self.root, name)?;
            if path.is_dir() {
                let prefix = format!("{}/", name);
                let mut inside = working.iter().filter(|w| w.starts_with(&prefix)).peekable();
                if inside.peek().is_none() {
                    return Err(Error::UntrackedObstruction(name.clone()));
                }
                if let Some(blocking) = inside.find(|w| !cleared(w.as_str())) {
                    return Err(Error::UntrackedObstruction(blocking.clone()));
                }
            }
        }

        Ok(())
    }

    /// Replaces the tracked files `from` with the snapshot `to`: files only
    /// in `from` are deleted, every file of `to` is written.
    pub fn sync(
        &self,
        store: &LooseObjectStore,
        from: &BTreeMap<String, Oid>,
        to: &BTreeMap<String, Oid>,
    ) -> Result<()> {
        // Read everything first so a missing blob leaves the tree untouched.
        let mut contents = Vec::with_capacity(to.len());
        for (name, oid) in to {
            contents.push((name, store.blob_content(oid)?));
        }

        let mut removed = 0;
        for name in from.keys().filter(|name| !to.contains_key(*name)) {
            self.delete(name)?;
            removed += 1;
        }

        for (name, content) in &contents {
            self.write(name, content)?;
        }

        debug!(written = contents.len(), removed, "synced working tree");
        Ok(())
    }
}

/// Yields the directory prefixes of a `/`-separated name, outermost first:
/// `a/b/c.txt` gives `a` then `a/b`.
fn parent_dirs(name: &str) -> impl Iterator<Item = &str> {
    name.match_indices('/').map(move |(i, _)| &name[..i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Blob;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, WorkTree, LooseObjectStore) {
        let temp = TempDir::new().unwrap();
        let store = LooseObjectStore::new(temp.path().join(".minivcs/objects"), 6);
        store.init().unwrap();
        let tree = WorkTree::new(temp.path());
        (temp, tree, store)
    }

    fn stored(store: &LooseObjectStore, name: &str, content: &str) -> (String, Oid) {
        let oid = store.put_blob(&Blob::new(name, content)).unwrap();
        (name.to_string(), oid)
    }

    #[test]
    fn test_read_write_delete() {
        let (_temp, tree, _store) = setup();

        tree.write("dir/a.txt", b"hello").unwrap();
        assert!(tree.exists("dir/a.txt"));
        assert_eq!(tree.read("dir/a.txt").unwrap(), b"hello");
        assert_eq!(tree.list().unwrap(), vec!["dir/a.txt"]);

        tree.delete("dir/a.txt").unwrap();
        assert!(!tree.exists("dir/a.txt"));
        assert!(!tree.root().join("dir").exists());
    }

    #[test]
    fn test_read_missing_reports_name() {
        let (_temp, tree, _store) = setup();
        assert!(matches!(tree.read("nope.txt"), Err(Error::FileNotFound(n)) if n == "nope.txt"));
    }

    #[test]
    fn test_sync_writes_and_deletes() {
        let (temp, tree, store) = setup();
        fs::write(temp.path().join("old.txt"), "old").unwrap();
        fs::write(temp.path().join("keep.txt"), "edited").unwrap();
        fs::write(temp.path().join("untracked.txt"), "mine").unwrap();

        let from: BTreeMap<String, Oid> = [
            stored(&store, "old.txt", "old"),
            stored(&store, "keep.txt", "v1"),
        ]
        .into();
        let to: BTreeMap<String, Oid> = [
            stored(&store, "keep.txt", "v1"),
            stored(&store, "new.txt", "new"),
        ]
        .into();

        tree.sync(&store, &from, &to).unwrap();

        assert!(!tree.exists("old.txt"));
        assert_eq!(tree.read("keep.txt").unwrap(), b"v1");
        assert_eq!(tree.read("new.txt").unwrap(), b"new");
        assert_eq!(tree.read("untracked.txt").unwrap(), b"mine");
    }

    #[test]
    fn test_check_untracked() {
        let (temp, tree, store) = setup();
        fs::write(temp.path().join("a.txt"), "mine").unwrap();

        let incoming: BTreeMap<String, Oid> = [stored(&store, "a.txt", "theirs")].into();
        let empty = BTreeMap::new();

        assert!(matches!(
            tree.check_untracked(&empty, &StagingArea::new(), &incoming),
            Err(Error::UntrackedObstruction(n)) if n == "a.txt"
        ));

        // Tracked by HEAD: no obstruction.
        tree.check_untracked(&incoming, &StagingArea::new(), &incoming)
            .unwrap();

        // Staged for addition: no obstruction.
        let mut staging = StagingArea::new();
        staging.stage_add("a.txt", Oid::from_bytes([1; 20]));
        tree.check_untracked(&empty, &staging, &incoming).unwrap();

        // Not touched by the incoming snapshot: no obstruction.
        tree.check_untracked(&empty, &StagingArea::new(), &empty)
            .unwrap();
    }

    #[test]
    fn test_check_untracked_file_in_place_of_directory() {
        let (temp, tree, store) = setup();
        fs::write(temp.path().join("d"), "mine").unwrap();

        let incoming: BTreeMap<String, Oid> = [stored(&store, "d/a.txt", "theirs")].into();
        let empty = BTreeMap::new();

        assert!(matches!(
            tree.check_untracked(&empty, &StagingArea::new(), &incoming),
            Err(Error::UntrackedObstruction(n)) if n == "d"
        ));

        // Staging does not help: `sync` never deletes a staged file.
        let mut staging = StagingArea::new();
        staging.stage_add("d", Oid::from_bytes([1; 20]));
        assert!(tree.check_untracked(&empty, &staging, &incoming).is_err());

        // A tracked `d` that the incoming snapshot drops is deleted first.
        let head: BTreeMap<String, Oid> = [stored(&store, "d", "mine")].into();
        tree.check_untracked(&head, &StagingArea::new(), &incoming)
            .unwrap();
    }

    #[test]
    fn test_check_untracked_directory_in_place_of_file() {
        let (temp, tree, store) = setup();
        fs::create_dir_all(temp.path().join("d")).unwrap();

        let incoming: BTreeMap<String, Oid> = [stored(&store, "d", "theirs")].into();
        let empty = BTreeMap::new();

        // Empty directory.
        assert!(matches!(
            tree.check_untracked(&empty, &StagingArea::new(), &incoming),
            Err(Error::UntrackedObstruction(n)) if n == "d"
        ));

        fs::write(temp.path().join("d/x.txt"), "x").unwrap();
        assert!(matches!(
            tree.check_untracked(&empty, &StagingArea::new(), &incoming),
            Err(Error::UntrackedObstruction(n)) if n == "d/x.txt"
        ));

        // Every file under `d` is tracked and cleared by the switch.
        let head: BTreeMap<String, Oid> = [stored(&store, "d/x.txt", "x")].into();
        tree.check_untracked(&head, &StagingArea::new(), &incoming)
            .unwrap();
    }

    #[test]
    fn test_parent_dirs() {
        assert_eq!(parent_dirs("a/b/c.txt").collect::<Vec<_>>(), vec!["a", "a/b"]);
        assert_eq!(parent_dirs("top.txt").count(), 0);
    }
}
