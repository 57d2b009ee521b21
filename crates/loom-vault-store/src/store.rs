// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Versioned secret repository.
//!
//! Two tables back the store: `secrets` holds the current value per key and
//! `secret_history` holds one row per `(key, version)`. Every write updates
//! both inside a single transaction, so `version == len(history)` and the
//! current value always equals the newest history row.
//!
//! A coarse `RwLock` orders callers: writers are exclusive, which makes
//! version assignment linearizable per key, and readers share.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loom_vault_config::StorageConfig;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, VaultError};
use crate::legacy::{ImportSummary, LegacyDump};
use crate::pool::{create_pool, run_migrations};
use crate::secret::SecretValue;
use crate::types::{SecretRead, Version, VersionInfo};

#[async_trait]
pub trait VaultStore: Send + Sync {
	async fn write(&self, key: &str, value: &SecretValue) -> Result<Version>;
	async fn read(&self, key: &str) -> Result<SecretRead>;
	async fn read_version(&self, key: &str, version: Version) -> Result<SecretRead>;
	async fn list_versions(&self, key: &str) -> Result<Vec<Version>>;
	async fn list_version_info(&self, key: &str) -> Result<Vec<VersionInfo>>;
	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;
	async fn import_dump(&self, dump: &LegacyDump) -> Result<ImportSummary>;
	async fn close(&self) -> Result<()>;
}

#[async_trait]
impl VaultStore for SqliteVaultStore {
	async fn write(&self, key: &str, value: &SecretValue) -> Result<Version> {
		self.write(key, value).await
	}

	async fn read(&self, key: &str) -> Result<SecretRead> {
		self.read(key).await
	}

	async fn read_version(&self, key: &str, version: Version) -> Result<SecretRead> {
		self.read_version(key, version).await
	}

	async fn list_versions(&self, key: &str) -> Result<Vec<Version>> {
		self.list_versions(key).await
	}

	async fn list_version_info(&self, key: &str) -> Result<Vec<VersionInfo>> {
		self.list_version_info(key).await
	}

	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
		self.list_keys(prefix).await
	}

	async fn import_dump(&self, dump: &LegacyDump) -> Result<ImportSummary> {
		self.import_dump(dump).await
	}

	async fn close(&self) -> Result<()> {
		self.close().await
	}
}

/// SQLite-backed secret store.
pub struct SqliteVaultStore {
	pool: SqlitePool,
	lock: RwLock<()>,
	closed: AtomicBool,
}

impl SqliteVaultStore {
	/// Wrap an existing pool. The vault tables must already exist.
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool,
			lock: RwLock::new(()),
			closed: AtomicBool::new(false),
		}
	}

	/// Open (or create) the store described by `config`.
	///
	/// # Errors
	/// Any failure here is a storage fault; the store cannot start without
	/// its backing database.
	#[tracing::instrument(skip(config), fields(path = %config.database_path().display()))]
	pub async fn open(config: &StorageConfig) -> Result<Self> {
		let pool = create_pool(config).await?;
		run_migrations(&pool).await?;
		info!("vault store opened");
		Ok(Self::new(pool))
	}

	/// Open the store in `data_dir` with default storage settings.
	pub async fn open_at(data_dir: impl AsRef<Path>) -> Result<Self> {
		Self::open(&StorageConfig::in_dir(data_dir.as_ref())).await
	}

	pub(crate) fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	pub(crate) fn ensure_open(&self) -> Result<()> {
		if self.closed.load(Ordering::SeqCst) {
			return Err(VaultError::Closed);
		}
		Ok(())
	}

	pub(crate) async fn write_guard(&self) -> tokio::sync::RwLockWriteGuard<'_, ()> {
		self.lock.write().await
	}

	/// Store `value` as the new current value for `key` and append it to the
	/// key's history. Returns the version assigned, starting at 1.
	#[tracing::instrument(skip(self, value), fields(key = %key))]
	pub async fn write(&self, key: &str, value: &SecretValue) -> Result<Version> {
		let _guard = self.lock.write().await;
		self.ensure_open()?;

		let now = Utc::now().to_rfc3339();
		let mut tx = self.pool.begin().await?;
		let version = append_version(&mut *tx, key, value.expose(), &now).await?;
		tx.commit().await?;

		debug!(version, "secret written");
		Ok(version)
	}

	/// Current value and its version, taken from one statement so the pair
	/// can never mix two writes.
	#[tracing::instrument(skip(self), fields(key = %key))]
	pub async fn read(&self, key: &str) -> Result<SecretRead> {
		let _guard = self.lock.read().await;
		self.ensure_open()?;

		let row: Option<(String, i64)> = sqlx::query_as(
			r#"
			SELECT s.value,
				(SELECT COUNT(*) FROM secret_history h WHERE h.key = s.key)
			FROM secrets s
			WHERE s.key = ?1
			"#,
		)
		.bind(key)
		.fetch_optional(&self.pool)
		.await?;

		let Some((value, count)) = row else {
			debug!("secret not found");
			return Err(VaultError::SecretNotFound {
				key: key.to_string(),
			});
		};

		let version = to_version(count)?;
		if version == 0 {
			return Err(VaultError::Corrupt {
				key: key.to_string(),
				expected: 1,
				found: 0,
			});
		}

		Ok(SecretRead {
			value: SecretValue::new(value),
			version,
		})
	}

	/// Historical value at a 1-indexed version.
	#[tracing::instrument(skip(self), fields(key = %key))]
	pub async fn read_version(&self, key: &str, version: Version) -> Result<SecretRead> {
		let _guard = self.lock.read().await;
		self.ensure_open()?;

		let mut tx = self.pool.begin().await?;

		let value: Option<String> = sqlx::query_scalar(
			"SELECT value FROM secret_history WHERE key = ?1 AND version = ?2",
		)
		.bind(key)
		.bind(i64::from(version))
		.fetch_optional(&mut *tx)
		.await?;

		if let Some(value) = value {
			tx.commit().await?;
			return Ok(SecretRead {
				value: SecretValue::new(value),
				version,
			});
		}

		let count = history_len(&mut *tx, key).await?;
		tx.commit().await?;

		if count == 0 {
			debug!("secret not found");
			Err(VaultError::SecretNotFound {
				key: key.to_string(),
			})
		} else {
			debug!(available = count, "version not found");
			Err(VaultError::VersionNotFound {
				key: key.to_string(),
				version,
			})
		}
	}

	/// Every version number for `key`, ascending: `1..=len(history)`.
	#[tracing::instrument(skip(self), fields(key = %key))]
	pub async fn list_versions(&self, key: &str) -> Result<Vec<Version>> {
		Ok(self
			.list_version_info(key)
			.await?
			.into_iter()
			.map(|info| info.version)
			.collect())
	}

	/// Version numbers with their write timestamps, ascending.
	#[tracing::instrument(skip(self), fields(key = %key))]
	pub async fn list_version_info(&self, key: &str) -> Result<Vec<VersionInfo>> {
		let _guard = self.lock.read().await;
		self.ensure_open()?;

		let rows: Vec<(i64, String)> = sqlx::query_as(
			"SELECT version, created_at FROM secret_history WHERE key = ?1 ORDER BY version",
		)
		.bind(key)
		.fetch_all(&self.pool)
		.await?;

		if rows.is_empty() {
			debug!("secret not found");
			return Err(VaultError::SecretNotFound {
				key: key.to_string(),
			});
		}

		let mut infos = Vec::with_capacity(rows.len());
		for (position, (version, created_at)) in rows.into_iter().enumerate() {
			let version = to_version(version)?;
			let expected = to_version(position as i64 + 1)?;
			if version != expected {
				return Err(VaultError::Corrupt {
					key: key.to_string(),
					expected,
					found: version,
				});
			}
			infos.push(VersionInfo {
				version,
				created_at: parse_timestamp(&created_at)?,
			});
		}

		Ok(infos)
	}

	/// Keys starting with `prefix`, in byte order. An empty prefix matches
	/// every key; no matches is an empty list.
	///
	/// The comparison runs on BLOBs: text `length()` stops at the first NUL.
	#[tracing::instrument(skip(self), fields(prefix = %prefix))]
	pub async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
		let _guard = self.lock.read().await;
		self.ensure_open()?;

		let keys: Vec<String> = sqlx::query_scalar(
			r#"
			SELECT key FROM secrets
			WHERE substr(CAST(key AS BLOB), 1, length(CAST(?1 AS BLOB))) = CAST(?1 AS BLOB)
			ORDER BY key
			"#,
		)
		.bind(prefix)
		.fetch_all(&self.pool)
		.await?;

		debug!(count = keys.len(), "listed keys");
		Ok(keys)
	}

	/// Release the database handle. Waits for in-flight operations; every
	/// later call, including a second `close`, fails.
	#[tracing::instrument(skip(self))]
	pub async fn close(&self) -> Result<()> {
		if self.closed.swap(true, Ordering::SeqCst) {
			return Err(VaultError::AlreadyClosed);
		}

		let _guard = self.lock.write().await;
		self.pool.close().await;
		info!("vault store closed");
		Ok(())
	}
}

/// Append `value` to the history of `key` and make it the current value.
/// Must run inside the caller's transaction.
pub(crate) async fn append_version(
	conn: &mut SqliteConnection,
	key: &str,
	value: &str,
	now: &str,
) -> Result<Version> {
	let next = history_len(conn, key).await? + 1;

	sqlx::query(
		r#"
		INSERT INTO secret_history (key, version, value, created_at)
		VALUES (?1, ?2, ?3, ?4)
		"#,
	)
	.bind(key)
	.bind(next)
	.bind(value)
	.bind(now)
	.execute(&mut *conn)
	.await?;

	sqlx::query(
		r#"
		INSERT INTO secrets (key, value, updated_at)
		VALUES (?1, ?2, ?3)
		ON CONFLICT(key) DO UPDATE SET
			value = excluded.value,
			updated_at = excluded.updated_at
		"#,
	)
	.bind(key)
	.bind(value)
	.bind(now)
	.execute(&mut *conn)
	.await?;

	to_version(next)
}

async fn history_len(conn: &mut SqliteConnection, key: &str) -> Result<i64> {
	let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM secret_history WHERE key = ?1")
		.bind(key)
		.fetch_one(&mut *conn)
		.await?;
	Ok(count)
}

fn to_version(raw: i64) -> Result<Version> {
	Version::try_from(raw).map_err(|_| VaultError::Internal(format!("version out of range: {raw}")))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| VaultError::Internal(format!("Invalid created_at: {e}")))
}
