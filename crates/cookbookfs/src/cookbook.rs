// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Cookbook loading and uploading collaborators.

use crate::ignore::IgnoreRules;
use crate::transport::{Transport, TransportError};
use std::path::{Path, PathBuf};

/// Caller-supplied switches for one upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Overwrite even if the server copy is frozen.
    pub force: bool,
    /// Freeze the uploaded version server-side.
    pub freeze: bool,
}

/// A cookbook version as produced by a `CookbookLoader`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookbookVersion {
    pub name: String,
    pub version: String,
    /// Directory the cookbook was loaded from.
    pub root: PathBuf,
    frozen: bool,
}

impl CookbookVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            root: root.into(),
            frozen: false,
        }
    }

    pub fn freeze_version(&mut self) {
        self.frozen = true;
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

#[derive(Debug, thiserror::Error)]
#[error("cannot load cookbook from {path}: {message}")]
pub struct LoadError {
    pub path: PathBuf,
    pub message: String,
}

/// Reads cookbook metadata from a directory named after the cookbook.
pub trait CookbookLoader {
    fn load(&self, path: &Path, ignore: &IgnoreRules) -> Result<CookbookVersion, LoadError>;
}

/// Everything an uploader receives besides the cookbook itself.
pub struct UploadRequest<'a> {
    pub force: bool,
    /// Root directory containing the cookbook under its canonical name.
    pub cookbook_root: &'a Path,
    pub transport: &'a dyn Transport,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The server copy of this version is immutable.
    #[error("cookbook {cookbook} version {version} is frozen")]
    Frozen { cookbook: String, version: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("upload failed: {0}")]
    Other(String),
}

pub trait Uploader {
    fn upload(&self, cookbook: &CookbookVersion, request: &UploadRequest<'_>) -> Result<(), UploadError>;
}
