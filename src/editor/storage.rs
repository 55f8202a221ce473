//! Backing storage for bound documents.

use std::io;
use std::path::{Path, PathBuf};

/// Reads and writes the plain-text files a document is bound to.
pub trait Storage {
    /// Read the whole file as text.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the file cannot be read.
    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Replace the file's contents with `text`.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the file cannot be written.
    fn write_file(&self, path: &Path, text: &str) -> io::Result<()>;

    /// Make sure `dir` and its parents exist.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the directory cannot be created.
    fn create_dir_all(&self, _dir: &Path) -> io::Result<()> {
        Ok(())
    }

    /// Absolute, resolved form of `path` for reporting.
    fn canonical_path(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// [`Storage`] on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn write_file(&self, path: &Path, text: &str) -> io::Result<()> {
        std::fs::write(path, text)
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)
    }

    fn canonical_path(&self, path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
    }
}
