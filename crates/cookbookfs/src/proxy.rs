// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Upload a versioned cookbook directory through a canonical-name alias.
//!
//! Loaders and uploaders expect a cookbook to live in a directory named
//! exactly like the cookbook. A source tree named `apache2-1.0.0` is
//! presented to them as `<scratch>/apache2`, a symlink to the real
//! directory, so no file contents are copied.

use crate::context::ChefContext;
use crate::cookbook::{UploadOptions, UploadRequest};
use crate::entry::{Entry, LocalCookbook};
use crate::error::UploadFailure;
use crate::naming;
use diagnostics::*;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCRATCH_PREFIX: &str = "cookbookfs-";

/// Create `alias` as a link to the directory `target`.
pub fn create_alias(target: &Path, alias: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, alias)
    }
    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_dir(target, alias)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, alias);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "directory links are not supported on this platform",
        ))
    }
}

/// Remove the link `alias` itself, never what it points to.
pub fn remove_alias(alias: &Path) -> io::Result<()> {
    // Directory symlinks are directories to the Windows API.
    #[cfg(windows)]
    {
        std::fs::remove_dir(alias)
    }
    #[cfg(not(windows))]
    {
        std::fs::remove_file(alias)
    }
}

/// A temporary directory owned by one upload call.
///
/// On drop, any alias created inside is unlinked first and then the
/// directory itself is removed, so removal never reaches the alias target.
pub struct ScratchWorkspace {
    alias: Option<PathBuf>,
    dir: TempDir,
}

impl ScratchWorkspace {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir()?;
        debug!("Created scratch workspace {path}", path: dir.path().display().to_string());
        Ok(Self { alias: None, dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Link `<workspace>/<name>` to `target` and return the link path.
    pub fn alias(&mut self, name: &str, target: &Path) -> io::Result<PathBuf> {
        let target = target.canonicalize()?;
        let alias = self.dir.path().join(name);
        create_alias(&target, &alias)?;
        debug!("Aliased {alias} -> {target}", alias: alias.display().to_string(), target: target.display().to_string());
        self.alias = Some(alias.clone());
        Ok(alias)
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if let Some(alias) = self.alias.take() {
            if let Err(e) = remove_alias(&alias) {
                let reason = e.to_string();
                warn!("Failed to remove alias {alias}: {reason}", alias: alias.display().to_string(), reason: reason.as_str());
            }
        }
        // `dir` is removed when the TempDir field drops.
    }
}

/// Load `source` through a scratch alias and hand it to the uploader.
///
/// The scratch workspace and the scoped cookbook root are released on every
/// return path.
pub fn upload_via_proxy(
    ctx: &ChefContext,
    source: &LocalCookbook,
    options: UploadOptions,
) -> Result<(), UploadFailure> {
    let cookbook_name =
        naming::canonical_name(source.name()).ok_or_else(|| UploadFailure::InvalidName {
            name: source.name().to_string(),
        })?;

    let mut workspace = ScratchWorkspace::new()
        .map_err(|e| UploadFailure::io("cannot create scratch workspace", e))?;
    let proxy_path = workspace.alias(cookbook_name, source.file_path()).map_err(|e| {
        UploadFailure::io(
            format!("cannot alias {} as {}", source.file_path().display(), cookbook_name),
            e,
        )
    })?;

    let mut cookbook = ctx.loader.load(&proxy_path, source.ignore_rules())?;
    if options.freeze {
        cookbook.freeze_version();
    }

    let scope = ctx.config.cookbook_root_scope(workspace.path());
    let request = UploadRequest {
        force: options.force,
        cookbook_root: scope.cookbook_root(),
        transport: ctx.transport.as_ref(),
    };
    ctx.uploader.upload(&cookbook, &request)?;

    info!(
        "Uploaded {cookbook} {version}",
        cookbook: cookbook.name.as_str(),
        version: cookbook.version.as_str()
    );
    Ok(())
}
