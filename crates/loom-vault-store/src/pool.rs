// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use loom_vault_config::StorageConfig;
use sqlx::sqlite::{
	SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use crate::error::VaultError;

/// Create a SqlitePool for the vault database, creating the data directory
/// and database file if they do not exist.
///
/// WAL journaling with `synchronous = FULL` so a committed write survives
/// power loss, not only process crashes.
///
/// # Errors
/// Returns `VaultError::StorageDirectory` if the directory cannot be created
/// and `VaultError::Storage` if the database cannot be opened.
#[tracing::instrument(skip(config), fields(path = %config.database_path().display()))]
pub async fn create_pool(config: &StorageConfig) -> Result<SqlitePool, VaultError> {
	tokio::fs::create_dir_all(&config.data_dir)
		.await
		.map_err(|e| VaultError::StorageDirectory {
			path: config.data_dir.clone(),
			source: e,
		})?;

	let options = SqliteConnectOptions::new()
		.filename(config.database_path())
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Full)
		.busy_timeout(config.busy_timeout)
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(config.max_connections)
		.connect_with(options)
		.await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Create the vault tables if they are missing.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), VaultError> {
	let m1 = include_str!("../migrations/001_create_secrets.sql");
	for stmt in m1.split(';').filter(|s| !s.trim().is_empty()) {
		sqlx::query(stmt).execute(pool).await?;
	}

	tracing::debug!("vault migrations applied");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn creates_missing_directory_and_tables() {
		let dir = tempfile::tempdir().unwrap();
		let config = StorageConfig::in_dir(dir.path().join("nested").join("vault"));

		let pool = create_pool(&config).await.unwrap();
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let tables: Vec<String> = sqlx::query_scalar(
			"SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
		)
		.fetch_all(&pool)
		.await
		.unwrap();
		assert_eq!(tables, vec!["secret_history".to_string(), "secrets".to_string()]);
		assert!(config.database_path().exists());
	}

	#[tokio::test]
	async fn unwritable_directory_is_reported() {
		let file = tempfile::NamedTempFile::new().unwrap();
		// A regular file where a directory is expected.
		let config = StorageConfig::in_dir(file.path().join("sub"));

		let err = create_pool(&config).await.unwrap_err();
		assert!(matches!(err, VaultError::StorageDirectory { .. }));
	}
}
