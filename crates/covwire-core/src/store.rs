//! Persistence collaborators
//!
//! Every merge is read-modify-write over a whole document. The traits here
//! are the only way the core touches storage; [`FileDocumentStore`] and
//! [`FileExternalConfigStore`] are the on-disk implementations.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::descriptor::ProjectDescriptor;
use crate::error::{MergeError, MergeResult};

/// Load/save of the project descriptor
pub trait DocumentStore {
    /// Read and parse the descriptor
    ///
    /// # Errors
    /// - `MergeError::MalformedDocument` if the stored markup does not parse
    /// - `MergeError::Io` if the document cannot be read
    fn load(&self) -> MergeResult<ProjectDescriptor>;

    /// Write the descriptor back wholesale
    ///
    /// # Errors
    /// Returns `MergeError::Io` if the document cannot be written
    fn save(&mut self, descriptor: &ProjectDescriptor) -> MergeResult<()>;
}

/// Lookup and read/write of secondary documents by logical name
pub trait ExternalConfigStore {
    /// Opaque reference to a located document
    type Handle;

    /// Locate a document; `Ok(None)` when it does not exist
    ///
    /// # Errors
    /// Returns `MergeError::Io` if the lookup itself fails
    fn locate(&self, name: &str) -> MergeResult<Option<Self::Handle>>;

    /// Read the full text of a located document
    ///
    /// # Errors
    /// Returns `MergeError::Io` on read failure
    fn read(&self, handle: &Self::Handle) -> MergeResult<String>;

    /// Replace the full text of a located document
    ///
    /// # Errors
    /// Returns `MergeError::Io` on write failure
    fn write(&mut self, handle: &Self::Handle, text: &str) -> MergeResult<()>;
}

/// Descriptor stored as a single file
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    path: PathBuf,
}

impl FileDocumentStore {
    /// Store backed by `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileDocumentStore {
    fn load(&self) -> MergeResult<ProjectDescriptor> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| MergeError::io_error(&self.path, e))?;
        Ok(ProjectDescriptor::parse(&text)?)
    }

    fn save(&mut self, descriptor: &ProjectDescriptor) -> MergeResult<()> {
        std::fs::write(&self.path, descriptor.to_markup())
            .map_err(|e| MergeError::io_error(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), "descriptor saved");
        Ok(())
    }
}

/// Secondary documents looked up by file name inside one directory
#[derive(Debug, Clone)]
pub struct FileExternalConfigStore {
    dir: PathBuf,
}

impl FileExternalConfigStore {
    /// Store rooted at `dir`
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory searched by [`ExternalConfigStore::locate`]
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExternalConfigStore for FileExternalConfigStore {
    type Handle = PathBuf;

    fn locate(&self, name: &str) -> MergeResult<Option<PathBuf>> {
        let path = self.dir.join(name);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(path)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MergeError::io_error(path, e)),
        }
    }

    fn read(&self, handle: &PathBuf) -> MergeResult<String> {
        std::fs::read_to_string(handle).map_err(|e| MergeError::io_error(handle, e))
    }

    fn write(&mut self, handle: &PathBuf, text: &str) -> MergeResult<()> {
        std::fs::write(handle, text).map_err(|e| MergeError::io_error(handle, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const POM: &str = "<project><modelVersion>4.0.0</modelVersion></project>";

    #[test]
    fn file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pom.xml");
        std::fs::write(&path, POM).unwrap();

        let mut store = FileDocumentStore::new(&path);
        let descriptor = store.load().unwrap();
        store.save(&descriptor).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, descriptor);
    }

    #[test]
    fn file_store_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = FileDocumentStore::new(dir.path().join("pom.xml"));
        assert!(matches!(store.load(), Err(MergeError::Io { .. })));
    }

    #[test]
    fn file_store_malformed_markup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pom.xml");
        std::fs::write(&path, "<project><build></project>").unwrap();

        let store = FileDocumentStore::new(&path);
        assert!(matches!(store.load(), Err(MergeError::MalformedDocument(_))));
    }

    #[test]
    fn locate_distinguishes_missing_from_present() {
        let dir = TempDir::new().unwrap();
        let store = FileExternalConfigStore::new(dir.path());
        assert_eq!(store.locate("arquillian.xml").unwrap(), None);

        std::fs::write(dir.path().join("arquillian.xml"), "<arquillian/>").unwrap();
        let handle = store.locate("arquillian.xml").unwrap();
        assert_eq!(handle, Some(dir.path().join("arquillian.xml")));
    }

    #[test]
    fn locate_ignores_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("arquillian.xml")).unwrap();
        let store = FileExternalConfigStore::new(dir.path());
        assert_eq!(store.locate("arquillian.xml").unwrap(), None);
    }

    #[test]
    fn external_read_write() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("arquillian.xml"), "<arquillian/>").unwrap();
        let mut store = FileExternalConfigStore::new(dir.path());

        let handle = store.locate("arquillian.xml").unwrap().unwrap();
        assert_eq!(store.read(&handle).unwrap(), "<arquillian/>");
        store.write(&handle, "<arquillian></arquillian>").unwrap();
        assert_eq!(store.read(&handle).unwrap(), "<arquillian></arquillian>");
    }
}
