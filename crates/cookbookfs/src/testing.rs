// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Recording fakes for the transport, loader and uploader collaborators.

use crate::config::{ChefConfig, SharedConfig};
use crate::context::ChefContext;
use crate::cookbook::{CookbookLoader, CookbookVersion, LoadError, UploadError, UploadRequest, Uploader};
use crate::ignore::IgnoreRules;
use crate::transport::{Result, Transport, TransportError};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Serves a fixed cookbook listing and records every request path.
#[derive(Debug, Default)]
pub struct FakeTransport {
    listing: RefCell<Value>,
    fail_status: Cell<Option<u16>>,
    requests: RefCell<Vec<String>>,
}

impl FakeTransport {
    pub fn new(listing: Value) -> Rc<Self> {
        Rc::new(Self {
            listing: RefCell::new(listing),
            ..Self::default()
        })
    }

    pub fn set_listing(&self, listing: Value) {
        *self.listing.borrow_mut() = listing;
    }

    /// Answer every following request with `status`.
    pub fn fail_with_status(&self, status: u16) {
        self.fail_status.set(Some(status));
    }

    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn check(&self, path: &str) -> Result<()> {
        self.requests.borrow_mut().push(path.to_string());
        match self.fail_status.get() {
            Some(status) => Err(TransportError::Status {
                url: path.to_string(),
                status,
                body: String::new(),
            }),
            None => Ok(()),
        }
    }
}

impl Transport for FakeTransport {
    fn get_json(&self, path: &str) -> Result<Value> {
        self.check(path)?;
        Ok(self.listing.borrow().clone())
    }

    fn put_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.check(path)?;
        Ok(body.clone())
    }
}

/// Loads a cookbook named after the directory it is given.
///
/// Fails unless `metadata.rb` is readable through that path.
#[derive(Debug)]
pub struct FakeLoader {
    version: String,
    loads: RefCell<Vec<(PathBuf, Vec<String>)>>,
}

impl FakeLoader {
    pub fn new(version: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            version: version.into(),
            loads: RefCell::new(Vec::new()),
        })
    }

    /// Paths loaded, with the ignore patterns that came with each.
    #[must_use]
    pub fn loads(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.loads.borrow().clone()
    }
}

impl CookbookLoader for FakeLoader {
    fn load(&self, path: &Path, ignore: &IgnoreRules) -> std::result::Result<CookbookVersion, LoadError> {
        let patterns = ignore.patterns().into_iter().map(String::from).collect();
        self.loads.borrow_mut().push((path.to_path_buf(), patterns));

        if !path.join("metadata.rb").is_file() {
            return Err(LoadError {
                path: path.to_path_buf(),
                message: "metadata.rb not found".to_string(),
            });
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(CookbookVersion::new(name, self.version.clone(), path))
    }
}

/// What the uploader saw during one call.
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub cookbook: CookbookVersion,
    pub force: bool,
    pub cookbook_root: PathBuf,
    /// `cookbook_path` in the shared config while the upload ran.
    pub configured_root: Option<PathBuf>,
    /// Whether `<cookbook_root>/<name>` was a link during the upload.
    pub saw_alias: bool,
}

/// Records uploads and optionally fails the next one.
pub struct FakeUploader {
    config: SharedConfig,
    next_error: RefCell<Option<UploadError>>,
    calls: RefCell<Vec<UploadCall>>,
}

impl FakeUploader {
    /// `config` is only read for `UploadCall::configured_root`.
    pub fn new(config: SharedConfig) -> Rc<Self> {
        Rc::new(Self {
            config,
            next_error: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
        })
    }

    pub fn fail_next(&self, err: UploadError) {
        *self.next_error.borrow_mut() = Some(err);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.borrow().clone()
    }
}

impl Uploader for FakeUploader {
    fn upload(
        &self,
        cookbook: &CookbookVersion,
        request: &UploadRequest<'_>,
    ) -> std::result::Result<(), UploadError> {
        let alias = request.cookbook_root.join(&cookbook.name);
        let saw_alias = std::fs::symlink_metadata(&alias)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

        self.calls.borrow_mut().push(UploadCall {
            cookbook: cookbook.clone(),
            force: request.force,
            cookbook_root: request.cookbook_root.to_path_buf(),
            configured_root: self.config.cookbook_path(),
            saw_alias,
        });

        match self.next_error.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Fakes wired into one context.
pub struct Harness {
    pub transport: Rc<FakeTransport>,
    pub loader: Rc<FakeLoader>,
    pub uploader: Rc<FakeUploader>,
    pub config: SharedConfig,
    pub context: ChefContext,
}

impl Harness {
    #[must_use]
    pub fn new(listing: Value) -> Self {
        let config = SharedConfig::new(ChefConfig::new("https://chef.example.com"));
        let transport = FakeTransport::new(listing);
        let loader = FakeLoader::new("1.0.0");
        let uploader = FakeUploader::new(config.clone());
        let context = ChefContext::new(
            transport.clone(),
            loader.clone(),
            uploader.clone(),
            config.clone(),
        );
        Self {
            transport,
            loader,
            uploader,
            config,
            context,
        }
    }
}
