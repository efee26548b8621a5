// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! `chefignore` rules for a cookbook repository directory.

use diagnostics::*;
use std::path::{Path, PathBuf};
use wax::{Glob, Pattern};

pub const CHEFIGNORE: &str = "chefignore";

/// Compiled ignore patterns, relative to a cookbook root.
#[derive(Default)]
pub struct IgnoreRules {
    source: Option<PathBuf>,
    patterns: Vec<(String, Glob<'static>)>,
}

impl std::fmt::Debug for IgnoreRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgnoreRules")
            .field("source", &self.source)
            .field("patterns", &self.patterns())
            .finish()
    }
}

impl IgnoreRules {
    /// Rules that ignore nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse `chefignore` text. Invalid globs are skipped with a warning.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut patterns = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match Glob::new(line) {
                Ok(glob) => patterns.push((line.to_string(), glob.into_owned())),
                Err(e) => {
                    let reason = e.to_string();
                    warn!("Skipping chefignore pattern {pattern}: {reason}", pattern: line, reason: reason.as_str());
                }
            }
        }
        Self {
            source: None,
            patterns,
        }
    }

    /// Load `<dir>/chefignore`; a missing file yields empty rules.
    pub fn load<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let path = dir.as_ref().join(CHEFIGNORE);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let mut rules = Self::parse(&text);
                rules.source = Some(path);
                Ok(rules)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::empty()),
            Err(e) => Err(e),
        }
    }

    /// The `chefignore` file these rules came from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(|(text, _)| text.as_str()).collect()
    }

    /// Is `relative` (a path inside a cookbook) ignored?
    #[must_use]
    pub fn is_ignored<P: AsRef<Path>>(&self, relative: P) -> bool {
        let relative = relative.as_ref();
        self.patterns
            .iter()
            .any(|(_, glob)| glob.is_match(relative))
    }
}
