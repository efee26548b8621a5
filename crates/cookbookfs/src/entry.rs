// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::ignore::IgnoreRules;
use crate::naming;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A node in the virtual tree, addressed by its parent's path and its name.
pub trait Entry {
    fn name(&self) -> &str;

    /// Path of the containing node; `None` at the root.
    fn parent_path(&self) -> Option<&Path>;

    fn is_dir(&self) -> bool;

    fn exists(&self) -> bool {
        true
    }

    fn path(&self) -> PathBuf {
        match self.parent_path() {
            Some(parent) => parent.join(self.name()),
            None => PathBuf::from("/"),
        }
    }

    /// May a child called `name` be created here?
    fn can_have_child(&self, _name: &str, _is_dir: bool) -> bool {
        default_can_have_child(self.is_dir())
    }
}

/// Base containment policy: directories accept any child, leaves none.
#[must_use]
pub fn default_can_have_child(parent_is_dir: bool) -> bool {
    parent_is_dir
}

/// One `<cookbook>-<version>` on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookbookVersionEntry {
    name: String,
    exists: bool,
    collection: PathBuf,
}

impl CookbookVersionEntry {
    pub fn new(cookbook: &str, version: &str, collection: &Path) -> Self {
        Self {
            name: naming::versioned_name(cookbook, version),
            exists: true,
            collection: collection.to_path_buf(),
        }
    }

    /// An entry for a name the server does not (yet) have.
    pub fn placeholder(name: &str, collection: &Path) -> Self {
        Self {
            name: name.to_string(),
            exists: false,
            collection: collection.to_path_buf(),
        }
    }

    #[must_use]
    pub fn cookbook_name(&self) -> Option<&str> {
        naming::canonical_name(&self.name)
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        naming::split_versioned(&self.name).map(|(_, version)| version)
    }
}

impl Entry for CookbookVersionEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent_path(&self) -> Option<&Path> {
        Some(&self.collection)
    }

    fn is_dir(&self) -> bool {
        false
    }

    fn exists(&self) -> bool {
        self.exists
    }
}

/// A cookbook directory on the local host, named `<cookbook>-<version>`.
#[derive(Debug, Clone)]
pub struct LocalCookbook {
    name: String,
    file_path: PathBuf,
    ignore: Rc<IgnoreRules>,
}

impl LocalCookbook {
    pub fn new<P: AsRef<Path>>(file_path: P, ignore: Rc<IgnoreRules>) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            file_path,
            ignore,
        }
    }

    /// Open `file_path` with the `chefignore` rules of its parent directory.
    pub fn open<P: AsRef<Path>>(file_path: P) -> std::io::Result<Self> {
        let file_path = file_path.as_ref();
        let ignore = match file_path.parent() {
            Some(parent) => IgnoreRules::load(parent)?,
            None => IgnoreRules::empty(),
        };
        Ok(Self::new(file_path, Rc::new(ignore)))
    }

    /// Host directory holding the cookbook contents.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Ignore rules inherited from the containing repository directory.
    #[must_use]
    pub fn ignore_rules(&self) -> &IgnoreRules {
        &self.ignore
    }
}

impl Entry for LocalCookbook {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent_path(&self) -> Option<&Path> {
        self.file_path.parent()
    }

    fn is_dir(&self) -> bool {
        true
    }

    fn exists(&self) -> bool {
        self.file_path.is_dir()
    }

    fn path(&self) -> PathBuf {
        self.file_path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_entry_paths() {
        let entry = CookbookVersionEntry::new("apache2", "1.0.0", Path::new("/cookbooks"));
        assert_eq!(entry.name(), "apache2-1.0.0");
        assert_eq!(entry.path(), PathBuf::from("/cookbooks/apache2-1.0.0"));
        assert_eq!(entry.cookbook_name(), Some("apache2"));
        assert_eq!(entry.version(), Some("1.0.0"));
        assert!(entry.exists());
        assert!(!entry.can_have_child("recipes", true));
    }

    #[test]
    fn test_placeholder_does_not_exist() {
        let entry = CookbookVersionEntry::placeholder("nginx-3.1.4", Path::new("/cookbooks"));
        assert!(!entry.exists());
        assert_eq!(entry.cookbook_name(), Some("nginx"));
    }

    #[test]
    fn test_local_cookbook_inherits_parent_chefignore() {
        let repo = tempfile::TempDir::new().unwrap();
        std::fs::write(repo.path().join(crate::ignore::CHEFIGNORE), "*.swp\n").unwrap();
        let dir = repo.path().join("apache2-1.0.0");
        std::fs::create_dir(&dir).unwrap();

        let local = LocalCookbook::open(&dir).unwrap();
        assert_eq!(local.name(), "apache2-1.0.0");
        assert_eq!(local.parent_path(), Some(repo.path()));
        assert!(local.exists());
        assert!(local.ignore_rules().is_ignored("default.rb.swp"));
    }
}
