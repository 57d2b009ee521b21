// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The vault service: every data operation is authorized before it touches
//! the store.
//!
//! | Operation | Action | Resource |
//! |---|---|---|
//! | `write` | write | key |
//! | `read`, `read_version`, `list_versions`, `list_version_info` | read | key |
//! | `list_keys` | list | prefix |
//! | `import_legacy` | write | `*` |
//!
//! [`Vault::authorize`] exposes the gate directly and always returns a
//! decision.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use loom_vault_policy::{Action, AuthorizationGate, PolicyDecision};
use loom_vault_store::{
	ImportSummary, LegacyDump, SecretRead, SecretValue, Version, VersionInfo, VaultStore,
};
use tracing::{debug, info};

use crate::error::{Result, VaultServiceError};

pub struct Vault {
	store: Arc<dyn VaultStore>,
	gate: AuthorizationGate,
}

impl fmt::Debug for Vault {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Vault").field("gate", &self.gate).finish_non_exhaustive()
	}
}

impl Vault {
	pub fn new(store: Arc<dyn VaultStore>, gate: AuthorizationGate) -> Self {
		Self { store, gate }
	}

	pub fn gate(&self) -> &AuthorizationGate {
		&self.gate
	}

	fn enforce(&self, subject: &str, action: Action, resource: &str) -> Result<()> {
		let decision = self.gate.check(subject, action, resource);
		if decision.allowed {
			debug!(%action, reason = %decision.reason, "authorized");
			return Ok(());
		}

		info!(%action, reason = %decision.reason, "request denied");
		Err(VaultServiceError::Denied {
			subject: subject.to_string(),
			action,
			resource: resource.to_string(),
			reason: decision.reason,
		})
	}

	#[tracing::instrument(skip(self, value), fields(subject = %subject, key = %key))]
	pub async fn write(&self, subject: &str, key: &str, value: &SecretValue) -> Result<Version> {
		self.enforce(subject, Action::Write, key)?;
		Ok(self.store.write(key, value).await?)
	}

	#[tracing::instrument(skip(self), fields(subject = %subject, key = %key))]
	pub async fn read(&self, subject: &str, key: &str) -> Result<SecretRead> {
		self.enforce(subject, Action::Read, key)?;
		Ok(self.store.read(key).await?)
	}

	#[tracing::instrument(skip(self), fields(subject = %subject, key = %key))]
	pub async fn read_version(
		&self,
		subject: &str,
		key: &str,
		version: Version,
	) -> Result<SecretRead> {
		self.enforce(subject, Action::Read, key)?;
		Ok(self.store.read_version(key, version).await?)
	}

	#[tracing::instrument(skip(self), fields(subject = %subject, key = %key))]
	pub async fn list_versions(&self, subject: &str, key: &str) -> Result<Vec<Version>> {
		self.enforce(subject, Action::Read, key)?;
		Ok(self.store.list_versions(key).await?)
	}

	#[tracing::instrument(skip(self), fields(subject = %subject, key = %key))]
	pub async fn list_version_info(&self, subject: &str, key: &str) -> Result<Vec<VersionInfo>> {
		self.enforce(subject, Action::Read, key)?;
		Ok(self.store.list_version_info(key).await?)
	}

	#[tracing::instrument(skip(self), fields(subject = %subject, prefix = %prefix))]
	pub async fn list_keys(&self, subject: &str, prefix: &str) -> Result<Vec<String>> {
		self.enforce(subject, Action::List, prefix)?;
		Ok(self.store.list_keys(prefix).await?)
	}

	/// Import a legacy flat-file dump into an empty store.
	#[tracing::instrument(skip(self, path), fields(subject = %subject))]
	pub async fn import_legacy(
		&self,
		subject: &str,
		path: impl AsRef<Path>,
	) -> Result<ImportSummary> {
		self.enforce(subject, Action::Write, "*")?;
		let dump = LegacyDump::load(path).await?;
		Ok(self.store.import_dump(&dump).await?)
	}

	/// Policy check for an arbitrary request. Never fails.
	#[tracing::instrument(skip(self))]
	pub fn authorize(&self, identity: &str, action: &str, resource: &str) -> PolicyDecision {
		let decision = self.gate.authorize(identity, action, resource);
		info!(allowed = decision.allowed, reason = %decision.reason, "authorization tested");
		decision
	}

	pub async fn close(&self) -> Result<()> {
		Ok(self.store.close().await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;
	use loom_vault_policy::PolicyDocument;
	use loom_vault_store::SqliteVaultStore;
	use std::path::PathBuf;

	const POLICY: &str = r#"
[[rule]]
id = "writer"
effect = "allow"
subjects = ["writer"]
actions = ["*"]
resources = ["*"]

[[rule]]
id = "reader"
effect = "allow"
subjects = ["reader"]
actions = ["read", "list"]
resources = ["app/*"]
"#;

	async fn vault_with_policy() -> (tempfile::TempDir, Vault) {
		let dir = tempfile::tempdir().unwrap();
		let store = SqliteVaultStore::open_at(dir.path()).await.unwrap();
		let document = PolicyDocument::parse(POLICY).unwrap();
		let gate = AuthorizationGate::loaded("vault", Arc::new(document), "inline");
		(dir, Vault::new(Arc::new(store), gate))
	}

	#[tokio::test]
	async fn allowed_subject_round_trips() {
		let (_dir, vault) = vault_with_policy().await;
		assert_eq!(vault.write("writer", "app/db", &"v1".into()).await.unwrap(), 1);

		let read = vault.read("reader", "app/db").await.unwrap();
		assert_eq!(read.value.expose(), "v1");
		assert_eq!(vault.list_keys("reader", "app/").await.unwrap(), vec!["app/db"]);
	}

	#[tokio::test]
	async fn denied_write_leaves_store_untouched() {
		let (_dir, vault) = vault_with_policy().await;

		let err = vault.write("reader", "app/db", &"v1".into()).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::PermissionDenied);

		let err = vault.read("writer", "app/db").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::NotFound);
	}

	#[tokio::test]
	async fn reader_cannot_leave_granted_prefix() {
		let (_dir, vault) = vault_with_policy().await;
		vault.write("writer", "other/x", &"v".into()).await.unwrap();

		for err in [
			vault.read("reader", "other/x").await.unwrap_err(),
			vault.read_version("reader", "other/x", 1).await.unwrap_err(),
			vault.list_versions("reader", "other/x").await.unwrap_err(),
			vault.list_keys("reader", "other/").await.unwrap_err(),
		] {
			assert_eq!(err.kind(), ErrorKind::PermissionDenied);
		}
	}

	#[tokio::test]
	async fn unavailable_policy_denies_data_path_but_authorize_answers() {
		let dir = tempfile::tempdir().unwrap();
		let store = SqliteVaultStore::open_at(dir.path()).await.unwrap();
		let gate = AuthorizationGate::unavailable("vault", &[PathBuf::from("./missing.toml")]);
		let vault = Vault::new(Arc::new(store), gate);

		let err = vault.write("anyone", "k", &"v".into()).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::PermissionDenied);

		let decision = vault.authorize("anyone", "read", "k");
		assert!(!decision.allowed);
		assert!(decision.reason.contains("deny-all fallback"));
	}

	#[tokio::test]
	async fn import_requires_write_on_everything() {
		let (dir, vault) = vault_with_policy().await;
		let path = dir.path().join("secrets.json");
		std::fs::write(&path, r#"{"secrets": {"app/a": "1"}, "history": {"app/a": ["1"]}}"#)
			.unwrap();

		let err = vault.import_legacy("reader", &path).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::PermissionDenied);

		let summary = vault.import_legacy("writer", &path).await.unwrap();
		assert_eq!(summary.keys, 1);
		assert_eq!(vault.read("reader", "app/a").await.unwrap().version, 1);
	}

	#[tokio::test]
	async fn close_is_reported_once() {
		let (_dir, vault) = vault_with_policy().await;
		vault.close().await.unwrap();

		let err = vault.close().await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::StorageFault);
		let err = vault.read("writer", "k").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::StorageFault);
	}
}
