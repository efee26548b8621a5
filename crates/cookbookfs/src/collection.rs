// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The `cookbooks` directory: every version of every cookbook on the server.

use crate::context::ChefContext;
use crate::cookbook::UploadOptions;
use crate::entry::{self, CookbookVersionEntry, Entry, LocalCookbook};
use crate::error::{Result, translate_upload_failure};
use crate::naming;
use crate::proxy;
use crate::transport::TransportError;
use diagnostics::*;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Shared, sorted children of a `CookbooksDir`.
pub type Children = Rc<Vec<CookbookVersionEntry>>;

#[derive(Debug, Deserialize)]
struct VersionRef {
    version: String,
}

#[derive(Debug, Deserialize)]
struct CookbookListing {
    #[serde(default)]
    versions: Vec<VersionRef>,
}

/// Directory node listing each server cookbook version as `<name>-<version>`.
///
/// Children are fetched on first use and cached until the next upload
/// through this node.
pub struct CookbooksDir {
    name: String,
    parent: Option<PathBuf>,
    api_path: String,
    context: ChefContext,
    children: RefCell<Option<Children>>,
}

impl CookbooksDir {
    pub fn new(name: impl Into<String>, parent: Option<PathBuf>, context: ChefContext) -> Self {
        let name = name.into();
        Self {
            api_path: name.clone(),
            name,
            parent,
            context,
            children: RefCell::new(None),
        }
    }

    /// Server path listed by `children()`.
    #[must_use]
    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    #[must_use]
    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into();
        self
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.children.borrow().is_some()
    }

    /// All cookbook versions, sorted by entry name.
    pub fn children(&self) -> Result<Children> {
        if let Some(children) = self.children.borrow().as_ref() {
            return Ok(Rc::clone(children));
        }

        let children = Rc::new(self.fetch_children()?);
        *self.children.borrow_mut() = Some(Rc::clone(&children));
        Ok(children)
    }

    fn fetch_children(&self) -> Result<Vec<CookbookVersionEntry>> {
        let request = format!("{}/?num_versions=all", self.api_path);
        debug!("Listing cookbooks via {request}", request: request.as_str());

        let value = self.context.transport.get_json(&request)?;
        let listing: BTreeMap<String, CookbookListing> =
            serde_json::from_value(value).map_err(|e| TransportError::Decode {
                url: request.clone(),
                message: e.to_string(),
            })?;

        let path = self.path();
        let mut entries: Vec<_> = listing
            .iter()
            .flat_map(|(cookbook, listing)| {
                listing
                    .versions
                    .iter()
                    .map(|v| CookbookVersionEntry::new(cookbook, &v.version, &path))
            })
            .collect();
        entries.sort_by(|a, b| a.name().cmp(b.name()));

        info!("Listed {count} cookbook versions", count: entries.len());
        Ok(entries)
    }

    /// The cached child called `name`, or a non-existent placeholder for it.
    ///
    /// Never lists the server; an uncached directory always yields a
    /// placeholder.
    #[must_use]
    pub fn child(&self, name: &str) -> CookbookVersionEntry {
        self.children
            .borrow()
            .as_ref()
            .and_then(|children| children.iter().find(|entry| entry.name() == name).cloned())
            .unwrap_or_else(|| CookbookVersionEntry::placeholder(name, &self.path()))
    }

    /// Drop cached children so the next listing goes to the server.
    pub fn invalidate(&self) {
        if self.children.borrow_mut().take().is_some() {
            debug!("Invalidated cookbook listing for {path}", path: self.path().display().to_string());
        }
    }

    /// Upload the local cookbook `source` into this collection.
    pub fn create_child_from(&self, source: &LocalCookbook, options: UploadOptions) -> Result<()> {
        self.invalidate();

        proxy::upload_via_proxy(&self.context, source, options).map_err(|cause| {
            let err = translate_upload_failure(cause, &self.path(), source.name());
            let message = err.to_string();
            error!("Upload of {cookbook} failed: {message}", cookbook: source.name(), message: message.as_str());
            err
        })
    }
}

impl Entry for CookbooksDir {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent_path(&self) -> Option<&Path> {
        self.parent.as_deref()
    }

    fn is_dir(&self) -> bool {
        true
    }

    /// Versioned cookbooks are leaves here, never nested directories.
    fn can_have_child(&self, name: &str, is_dir: bool) -> bool {
        if is_dir && naming::is_versioned(name) {
            return false;
        }
        entry::default_can_have_child(self.is_dir())
    }
}

impl std::fmt::Debug for CookbooksDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookbooksDir")
            .field("path", &self.path())
            .field("api_path", &self.api_path)
            .field("cached", &self.is_cached())
            .finish()
    }
}

