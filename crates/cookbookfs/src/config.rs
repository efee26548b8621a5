// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration and the scoped "active cookbook root".
//!
//! Uploaders that resolve cookbooks through `cookbook_path` read it from a
//! `SharedConfig` context passed to them, never from process-wide state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChefConfig {
    /// Base URL of the server, including any organization prefix.
    pub chef_server_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory the uploader treats as the root of local cookbooks.
    #[serde(default)]
    pub cookbook_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ChefConfig {
    pub fn new(chef_server_url: impl Into<String>) -> Self {
        Self {
            chef_server_url: chef_server_url.into(),
            request_timeout_secs: default_request_timeout_secs(),
            cookbook_path: None,
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }
}

struct Shared {
    config: Mutex<ChefConfig>,
    // Held for the whole of a cookbook root scope.
    upload: Mutex<()>,
}

/// A configuration context shared by the nodes of one command invocation.
#[derive(Clone)]
pub struct SharedConfig(Arc<Shared>);

impl std::fmt::Debug for SharedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedConfig").field(&self.get()).finish()
    }
}

impl SharedConfig {
    pub fn new(config: ChefConfig) -> Self {
        Self(Arc::new(Shared {
            config: Mutex::new(config),
            upload: Mutex::new(()),
        }))
    }

    fn lock(&self) -> MutexGuard<'_, ChefConfig> {
        self.0.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current configuration.
    #[must_use]
    pub fn get(&self) -> ChefConfig {
        self.lock().clone()
    }

    #[must_use]
    pub fn cookbook_path(&self) -> Option<PathBuf> {
        self.lock().cookbook_path.clone()
    }

    pub fn set_cookbook_path(&self, path: Option<PathBuf>) {
        self.lock().cookbook_path = path;
    }

    /// Point `cookbook_path` at `root` unless it is already set.
    ///
    /// Scopes on the same context are mutually exclusive: a second call
    /// blocks until the first scope is dropped. Dropping the scope restores
    /// the previous value. The configuration itself stays readable while a
    /// scope is open.
    pub fn cookbook_root_scope(&self, root: &Path) -> CookbookRootScope<'_> {
        let exclusive = self.0.upload.lock().unwrap_or_else(PoisonError::into_inner);
        let mut config = self.lock();
        let prior = config.cookbook_path.clone();
        let effective = prior.clone().unwrap_or_else(|| root.to_path_buf());
        config.cookbook_path = Some(effective.clone());
        drop(config);

        CookbookRootScope {
            shared: self,
            root: effective,
            prior,
            _exclusive: exclusive,
        }
    }
}

/// RAII scope over the active cookbook root. See `SharedConfig::cookbook_root_scope`.
pub struct CookbookRootScope<'a> {
    shared: &'a SharedConfig,
    root: PathBuf,
    prior: Option<PathBuf>,
    _exclusive: MutexGuard<'a, ()>,
}

impl CookbookRootScope<'_> {
    /// The cookbook root in effect for this scope.
    #[must_use]
    pub fn cookbook_root(&self) -> &Path {
        &self.root
    }
}

impl Drop for CookbookRootScope<'_> {
    fn drop(&mut self) {
        self.shared.lock().cookbook_path = self.prior.take();
    }
}
