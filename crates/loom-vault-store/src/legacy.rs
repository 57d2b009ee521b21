// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Import of the flat-file dump written by earlier vault deployments.
//!
//! The dump is a single JSON object:
//!
//! ```json
//! {"secrets": {"k": "current"}, "history": {"k": ["v1", "current"]}}
//! ```
//!
//! Each key's history is replayed through the normal append path inside one
//! transaction, so a failed import leaves the store empty.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Result, VaultError};
use crate::secret::SecretValue;
use crate::store::{append_version, SqliteVaultStore};

#[derive(Debug, Default, Deserialize)]
pub struct LegacyDump {
	#[serde(default)]
	pub secrets: BTreeMap<String, SecretValue>,
	#[serde(default)]
	pub history: BTreeMap<String, Vec<SecretValue>>,
}

impl LegacyDump {
	pub fn parse(raw: &str) -> Result<Self> {
		Ok(serde_json::from_str(raw)?)
	}

	/// Read and parse a dump file.
	pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let raw = tokio::fs::read_to_string(path)
			.await
			.map_err(|e| VaultError::LegacyRead {
				path: path.to_path_buf(),
				source: e,
			})?;
		Self::parse(&raw)
	}

	/// Ordered values to replay for each key.
	///
	/// A key with no history imports its current value as version 1. When the
	/// recorded current value differs from the last history entry, it is
	/// appended as one more version so the current value stays the newest.
	pub fn replay_plan(&self) -> Vec<(&str, Vec<&SecretValue>)> {
		let keys: BTreeSet<&str> = self
			.secrets
			.keys()
			.chain(self.history.keys())
			.map(String::as_str)
			.collect();

		keys.into_iter()
			.filter_map(|key| {
				let mut values: Vec<&SecretValue> = self
					.history
					.get(key)
					.map(|h| h.iter().collect())
					.unwrap_or_default();

				if let Some(current) = self.secrets.get(key) {
					if values.last() != Some(&current) {
						if !values.is_empty() {
							warn!(key, "legacy current value diverges from history, appending");
						}
						values.push(current);
					}
				}

				(!values.is_empty()).then_some((key, values))
			})
			.collect()
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
	pub keys: usize,
	pub versions: usize,
}

impl SqliteVaultStore {
	/// Import a legacy dump file into an empty store.
	///
	/// # Errors
	/// `ImportConflict` if the store already holds secrets. Read, parse and
	/// storage failures are returned as-is; nothing is committed on error.
	#[tracing::instrument(skip(self, path), fields(path = %path.as_ref().display()))]
	pub async fn import_legacy(&self, path: impl AsRef<Path>) -> Result<ImportSummary> {
		let dump = LegacyDump::load(path).await?;
		self.import_dump(&dump).await
	}

	/// Replay an already parsed dump into an empty store.
	#[tracing::instrument(skip(self, dump))]
	pub async fn import_dump(&self, dump: &LegacyDump) -> Result<ImportSummary> {
		let _guard = self.write_guard().await;
		self.ensure_open()?;

		let mut tx = self.pool().begin().await?;

		let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM secrets")
			.fetch_one(&mut *tx)
			.await?;
		if existing > 0 {
			return Err(VaultError::ImportConflict { existing });
		}

		let now = Utc::now().to_rfc3339();
		let mut summary = ImportSummary::default();
		for (key, values) in dump.replay_plan() {
			for value in values {
				append_version(&mut *tx, key, value.expose(), &now).await?;
				summary.versions += 1;
			}
			summary.keys += 1;
		}

		tx.commit().await?;
		info!(keys = summary.keys, versions = summary.versions, "legacy dump imported");
		Ok(summary)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_store;

	const DUMP: &str = r#"{
		"secrets": {"db/password": "p2", "api/token": "t1", "orphan": "o1"},
		"history": {"db/password": ["p1", "p2"], "api/token": ["t1"], "only-history": ["h1", "h2"]}
	}"#;

	#[test]
	fn replay_plan_merges_secrets_and_history() {
		let dump = LegacyDump::parse(DUMP).unwrap();
		let plan: Vec<(String, Vec<String>)> = dump
			.replay_plan()
			.into_iter()
			.map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.expose().to_string()).collect()))
			.collect();

		assert_eq!(
			plan,
			vec![
				("api/token".to_string(), vec!["t1".to_string()]),
				("db/password".to_string(), vec!["p1".to_string(), "p2".to_string()]),
				("only-history".to_string(), vec!["h1".to_string(), "h2".to_string()]),
				("orphan".to_string(), vec!["o1".to_string()]),
			]
		);
	}

	#[test]
	fn diverged_current_value_becomes_newest_version() {
		let dump =
			LegacyDump::parse(r#"{"secrets": {"k": "c"}, "history": {"k": ["a", "b"]}}"#).unwrap();
		let plan = dump.replay_plan();
		let values: Vec<&str> = plan[0].1.iter().map(|v| v.expose()).collect();
		assert_eq!(values, vec!["a", "b", "c"]);
	}

	#[test]
	fn empty_object_is_a_valid_dump() {
		let dump = LegacyDump::parse("{}").unwrap();
		assert!(dump.replay_plan().is_empty());
	}

	#[tokio::test]
	async fn import_replays_versions() {
		let (dir, store) = create_test_store().await;
		let path = dir.path().join("secrets.json");
		std::fs::write(&path, DUMP).unwrap();

		let summary = store.import_legacy(&path).await.unwrap();
		assert_eq!(summary, ImportSummary { keys: 4, versions: 6 });

		let current = store.read("db/password").await.unwrap();
		assert_eq!(current.value.expose(), "p2");
		assert_eq!(current.version, 2);
		assert_eq!(
			store.read_version("db/password", 1).await.unwrap().value.expose(),
			"p1"
		);
		assert_eq!(store.read("only-history").await.unwrap().version, 2);
	}

	#[tokio::test]
	async fn import_into_non_empty_store_is_refused() {
		let (_dir, store) = create_test_store().await;
		store.write("existing", &"v".into()).await.unwrap();

		let dump = LegacyDump::parse(DUMP).unwrap();
		let err = store.import_dump(&dump).await.unwrap_err();
		assert!(matches!(err, VaultError::ImportConflict { existing: 1 }));
		assert_eq!(store.list_keys("").await.unwrap(), vec!["existing".to_string()]);
	}

	#[tokio::test]
	async fn missing_dump_file_is_reported() {
		let (dir, store) = create_test_store().await;
		let err = store
			.import_legacy(dir.path().join("absent.json"))
			.await
			.unwrap_err();
		assert!(matches!(err, VaultError::LegacyRead { .. }));
	}
}
