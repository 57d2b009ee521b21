// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Versioned secret storage for the Loom vault.
//!
//! Every key keeps its current value plus an append-only history numbered
//! from 1. Writes commit both records in one SQLite transaction; reads see a
//! consistent `(value, version)` pair.

pub mod error;
pub mod legacy;
pub mod pool;
pub mod secret;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::{Result, VaultError};
pub use legacy::{ImportSummary, LegacyDump};
pub use pool::{create_pool, run_migrations};
pub use secret::{SecretValue, REDACTED};
pub use store::{SqliteVaultStore, VaultStore};
pub use types::{SecretRead, Version, VersionInfo};
