// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Cookbook collection node for a configuration-management server.
//!
//! `CookbooksDir` presents every cookbook version on the server as a child
//! named `<cookbook>-<version>`, and uploads a local versioned cookbook
//! directory through a scratch alias carrying the canonical cookbook name.

pub mod collection;
pub mod config;
pub mod context;
pub mod cookbook;
pub mod entry;
pub mod error;
pub mod ignore;
pub mod naming;
pub mod proxy;
pub mod testing;
pub mod transport;

pub use collection::{Children, CookbooksDir};
pub use config::{ChefConfig, ConfigError, CookbookRootScope, SharedConfig};
pub use context::ChefContext;
pub use cookbook::{
    CookbookLoader, CookbookVersion, LoadError, UploadError, UploadOptions, UploadRequest, Uploader,
};
pub use entry::{CookbookVersionEntry, Entry, LocalCookbook};
pub use error::{Error, Operation, Result, UploadFailure, translate_upload_failure};
pub use ignore::IgnoreRules;
pub use transport::{HttpTransport, Transport, TransportError};
