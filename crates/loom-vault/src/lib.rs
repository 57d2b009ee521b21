// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loom secrets vault.
//!
//! Ties the versioned store to the authorization gate. Every data operation
//! on [`Vault`] is checked against policy first; [`Vault::authorize`] answers
//! policy questions without touching storage.

pub mod bootstrap;
pub mod error;
pub mod service;

pub use bootstrap::open_vault;
pub use error::{BootstrapError, ErrorKind, Result, VaultServiceError};
pub use service::Vault;
