//! Search-path file resolution.
//!
//! A [`FileResolver`] holds an ordered list of directories. Resolving a
//! relative path joins it with each directory in turn and returns the first
//! combination that exists on disk.

use std::ops::{Index, IndexMut};

use camino::{Utf8Path, Utf8PathBuf};
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Ordered list of search directories.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileResolver {
    /// Directories, searched front to back.
    paths: SmallVec<[Utf8PathBuf; 4]>,
}

impl FileResolver {
    /// Create a resolver that searches the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current working directory cannot be read or
    /// is not valid UTF-8.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(CoreError::NonUtf8Path)?;
        let mut resolver = Self::empty();
        resolver.append(cwd);
        Ok(resolver)
    }

    /// Create a resolver with no search directories.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of search directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether there are no search directories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate over the search directories in search order.
    pub fn iter(&self) -> std::slice::Iter<'_, Utf8PathBuf> {
        self.paths.iter()
    }

    /// The search directory at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Utf8Path> {
        self.paths.get(index).map(Utf8PathBuf::as_path)
    }

    /// Whether `path` is one of the search directories.
    pub fn contains(&self, path: impl AsRef<Utf8Path>) -> bool {
        let path = path.as_ref();
        self.paths.iter().any(|p| p == path)
    }

    /// Add a directory to be searched first.
    pub fn prepend(&mut self, path: impl Into<Utf8PathBuf>) {
        self.paths.insert(0, path.into());
    }

    /// Add a directory to be searched last.
    pub fn append(&mut self, path: impl Into<Utf8PathBuf>) {
        self.paths.push(path.into());
    }

    /// Remove every entry equal to `path`, returning how many were removed.
    pub fn erase(&mut self, path: impl AsRef<Utf8Path>) -> usize {
        let path = path.as_ref();
        let before = self.paths.len();
        self.paths.retain(|p| p.as_path() != path);
        before - self.paths.len()
    }

    /// Remove the entry at `index`.
    pub fn erase_at(&mut self, index: usize) -> Option<Utf8PathBuf> {
        (index < self.paths.len()).then(|| self.paths.remove(index))
    }

    /// Remove every search directory.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Find `path` in the search directories.
    ///
    /// Absolute paths are returned unchanged. A relative path is joined with
    /// each directory in order and the first combination that exists is
    /// returned. If none exists, `path` itself is returned.
    #[must_use]
    pub fn resolve(&self, path: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        let path = path.as_ref();
        if path.is_relative() {
            for base in &self.paths {
                let combined = base.join(path);
                if combined.exists() {
                    debug!(path = %path, resolved = %combined, "resolved path");
                    return combined;
                }
            }
        }
        path.to_path_buf()
    }
}

impl Index<usize> for FileResolver {
    type Output = Utf8PathBuf;

    fn index(&self, index: usize) -> &Utf8PathBuf {
        &self.paths[index]
    }
}

impl IndexMut<usize> for FileResolver {
    fn index_mut(&mut self, index: usize) -> &mut Utf8PathBuf {
        &mut self.paths[index]
    }
}

impl<'a> IntoIterator for &'a FileResolver {
    type Item = &'a Utf8PathBuf;
    type IntoIter = std::slice::Iter<'a, Utf8PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<P: Into<Utf8PathBuf>> Extend<P> for FileResolver {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.paths.extend(iter.into_iter().map(Into::into));
    }
}

impl<P: Into<Utf8PathBuf>> FromIterator<P> for FileResolver {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut resolver = Self::empty();
        resolver.extend(iter);
        resolver
    }
}
