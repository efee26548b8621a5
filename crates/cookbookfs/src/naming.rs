// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Versioned cookbook names: `<cookbook>-<major>.<minor>.<patch>`.

use regex::Regex;
use std::sync::LazyLock;

static VERSIONED_COOKBOOK_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([.a-zA-Z0-9_-]+)-(\d+\.\d+\.\d+)$").expect("versioned cookbook pattern is valid")
});

/// Build the synthetic entry name for one cookbook version.
#[must_use]
pub fn versioned_name(cookbook: &str, version: &str) -> String {
    format!("{cookbook}-{version}")
}

/// Does `name` look like `<cookbook>-<semver>`?
#[must_use]
pub fn is_versioned(name: &str) -> bool {
    VERSIONED_COOKBOOK_NAME.is_match(name)
}

/// Split a versioned name into `(cookbook, version)`.
///
/// The cookbook part may itself contain dashes; only the trailing
/// `-<semver>` suffix is taken as the version.
#[must_use]
pub fn split_versioned(name: &str) -> Option<(&str, &str)> {
    let caps = VERSIONED_COOKBOOK_NAME.captures(name)?;
    let cookbook = caps.get(1)?.as_str();
    let version = caps.get(2)?.as_str();
    Some((cookbook, version))
}

/// The canonical (unversioned) name a cookbook loader expects.
#[must_use]
pub fn canonical_name(name: &str) -> Option<&str> {
    split_versioned(name).map(|(cookbook, _)| cookbook)
}
