// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tempfile::TempDir;

use crate::store::SqliteVaultStore;

/// A store in a fresh temporary directory. Keep the `TempDir` alive for as
/// long as the store is used.
pub async fn create_test_store() -> (TempDir, SqliteVaultStore) {
	let dir = tempfile::tempdir().unwrap();
	let store = SqliteVaultStore::open_at(dir.path()).await.unwrap();
	(dir, store)
}
