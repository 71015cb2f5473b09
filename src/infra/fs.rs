//! Filesystem utilities for file reading, writing, and directory traversal.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the repository metadata directory inside the working tree.
pub const REPO_DIR_NAME: &str = ".minivcs";

/// Reads the entire contents of a file as bytes.
///
/// A missing file is reported as `Error::FileNotFound`.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    fs::read(path.as_ref()).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.as_ref().display().to_string())
        } else {
            Error::Io(e)
        }
    })
}

/// Writes data to a file atomically.
///
/// The data goes to a temporary sibling first and is then renamed over the
/// target, so readers observe either the old file or the new one.
pub fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = {
        let mut temp = path.to_path_buf();
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "temp".to_string());
        temp.set_file_name(format!(".{}.tmp", file_name));
        temp
    };

    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Appends one line to a file, creating it if needed.
pub fn append_line<P: AsRef<Path>>(path: P, line: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    Ok(())
}

/// Removes a file if it exists, then prunes parent directories (up to, but
/// not including, `root`) that became empty.
pub fn remove_file_pruning<P: AsRef<Path>, Q: AsRef<Path>>(root: P, path: Q) -> Result<()> {
    let root = root.as_ref();
    let path = path.as_ref();

    if path.is_file() {
        fs::remove_file(path)?;
    }

    let mut parent = path.parent();
    while let Some(dir) = parent {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        if dir.exists() && dir.read_dir()?.next().is_none() {
            fs::remove_dir(dir)?;
        } else {
            break;
        }
        parent = dir.parent();
    }

    Ok(())
}

/// Lists all files in the working tree, excluding the repository directory.
/// Dot files are listed like any other file.
///
/// Returns `/`-separated names relative to `root`, sorted.
pub fn list_working_tree<P: AsRef<Path>>(root: P) -> Result<Vec<String>> {
    let root = root.as_ref();
    let mut files = Vec::new();

    list_working_tree_recursive(root, root, &mut files)?;

    files.sort();

    Ok(files)
}

fn list_working_tree_recursive(root: &Path, current: &Path, files: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let file_name = entry.file_name();

        if file_name == REPO_DIR_NAME {
            continue;
        }

        let file_type = entry.file_type()?;

        if file_type.is_file() {
            let relative = path
                .strip_prefix(root)
                .map_err(|_| Error::FileNotFound(path.display().to_string()))?;
            files.push(to_name(relative));
        } else if file_type.is_dir() {
            list_working_tree_recursive(root, &path, files)?;
        }
    }

    Ok(())
}

/// Converts a relative path into a tracked file name.
fn to_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Joins a tracked file name onto `root`, rejecting names that could
/// escape it or reach into the repository directory.
pub fn safe_join<P: AsRef<Path>>(root: P, name: &str) -> Result<PathBuf> {
    let path = Path::new(name);

    if name.is_empty() || name.contains('\0') {
        return Err(Error::FileNotFound(name.to_string()));
    }

    for component in path.components() {
        match component {
            Component::Normal(s) => {
                if s == REPO_DIR_NAME {
                    return Err(Error::FileNotFound(name.to_string()));
                }
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::FileNotFound(name.to_string()));
            }
        }
    }

    Ok(root.as_ref().join(path))
}
