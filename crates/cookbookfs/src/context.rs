// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Collaborators shared by the nodes of one command invocation.

use crate::config::SharedConfig;
use crate::cookbook::{CookbookLoader, Uploader};
use crate::transport::Transport;
use std::rc::Rc;

/// Transport, loader, uploader and configuration for a virtual tree.
///
/// Cloning is cheap; every clone refers to the same collaborators.
#[derive(Clone)]
pub struct ChefContext {
    pub transport: Rc<dyn Transport>,
    pub loader: Rc<dyn CookbookLoader>,
    pub uploader: Rc<dyn Uploader>,
    pub config: SharedConfig,
}

impl ChefContext {
    pub fn new(
        transport: Rc<dyn Transport>,
        loader: Rc<dyn CookbookLoader>,
        uploader: Rc<dyn Uploader>,
        config: SharedConfig,
    ) -> Self {
        Self {
            transport,
            loader,
            uploader,
            config,
        }
    }
}
