//! Byte sources for bundles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Synchronous file reader injected into bundles.
pub trait FileSystem {
    fn read_file(&self, filename: &str) -> io::Result<Vec<u8>>;

    fn file_exists(&self, filename: &str) -> bool {
        self.read_file(filename).is_ok()
    }
}

/// Reads files relative to a root directory on disk.
#[derive(Debug, Clone)]
pub struct DiskFileSystem {
    root: PathBuf,
}

impl DiskFileSystem {
    /// A file path roots at its parent directory.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSystem for DiskFileSystem {
    fn read_file(&self, filename: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(filename))
    }

    fn file_exists(&self, filename: &str) -> bool {
        self.root.join(filename).is_file()
    }
}

/// In-memory file table, for tests and embedded assets.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, filename: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(filename.into(), data.into());
    }

    pub fn with_file(self, filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(filename, data);
        self
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_file(&self, filename: &str) -> io::Result<Vec<u8>> {
        self.files
            .borrow()
            .get(filename)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, filename.to_string()))
    }

    fn file_exists(&self, filename: &str) -> bool {
        self.files.borrow().contains_key(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_fs_reads_inserted_files() {
        let fs = MemoryFileSystem::new().with_file("a.txt", "hello");
        assert_eq!(fs.read_file("a.txt").unwrap(), b"hello");
        assert!(fs.file_exists("a.txt"));
        let err = fs.read_file("b.txt").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn disk_fs_reports_missing_files() {
        let fs = DiskFileSystem::new(std::env::temp_dir());
        assert!(!fs.file_exists("zap-scene-definitely-missing.bin"));
        assert!(fs.read_file("zap-scene-definitely-missing.bin").is_err());
    }
}
