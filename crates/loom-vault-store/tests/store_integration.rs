// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeSet;
use std::sync::Arc;

use loom_vault_store::{SecretValue, SqliteVaultStore, VaultError, VaultStore};

#[tokio::test]
async fn reopen_reproduces_values_and_history() {
	let dir = tempfile::tempdir().unwrap();

	{
		let store = SqliteVaultStore::open_at(dir.path()).await.unwrap();
		store.write("k1", &"v1".into()).await.unwrap();
		store.write("k1", &"v2".into()).await.unwrap();
		store.write("app/db", &"secret".into()).await.unwrap();
		store.close().await.unwrap();
	}

	let store = SqliteVaultStore::open_at(dir.path()).await.unwrap();
	let current = store.read("k1").await.unwrap();
	assert_eq!(current.value.expose(), "v2");
	assert_eq!(current.version, 2);
	assert_eq!(store.read_version("k1", 1).await.unwrap().value.expose(), "v1");
	assert_eq!(store.list_versions("k1").await.unwrap(), vec![1, 2]);
	assert_eq!(
		store.list_keys("").await.unwrap(),
		vec!["app/db".to_string(), "k1".to_string()]
	);

	// Numbering continues from the persisted history.
	assert_eq!(store.write("k1", &"v3".into()).await.unwrap(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_get_distinct_gapless_versions() {
	let dir = tempfile::tempdir().unwrap();
	let store: Arc<dyn VaultStore> = Arc::new(SqliteVaultStore::open_at(dir.path()).await.unwrap());

	let writers = 24;
	let handles: Vec<_> = (0..writers)
		.map(|i| {
			let store = Arc::clone(&store);
			tokio::spawn(async move {
				let value = SecretValue::new(format!("value-{i}"));
				store.write("shared", &value).await.unwrap()
			})
		})
		.collect();

	let versions: BTreeSet<u32> = futures::future::join_all(handles)
		.await
		.into_iter()
		.map(|r| r.unwrap())
		.collect();

	assert_eq!(versions, (1..=writers).collect::<BTreeSet<u32>>());

	let current = store.read("shared").await.unwrap();
	assert_eq!(current.version, writers);
	let newest = store.read_version("shared", writers).await.unwrap();
	assert_eq!(newest.value, current.value);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_never_observe_a_torn_pair() {
	let dir = tempfile::tempdir().unwrap();
	let store = Arc::new(SqliteVaultStore::open_at(dir.path()).await.unwrap());
	store.write("k", &"1".into()).await.unwrap();

	let writer = {
		let store = Arc::clone(&store);
		tokio::spawn(async move {
			for n in 2..=40u32 {
				store.write("k", &n.to_string().as_str().into()).await.unwrap();
			}
		})
	};

	// Each value is its own version number, so any mismatch is a torn read.
	for _ in 0..200 {
		let read = store.read("k").await.unwrap();
		assert_eq!(read.value.expose(), read.version.to_string());
	}

	writer.await.unwrap();
}

#[tokio::test]
async fn prefix_scenario() {
	let dir = tempfile::tempdir().unwrap();
	let store = SqliteVaultStore::open_at(dir.path()).await.unwrap();
	for key in ["app/db", "app/api", "other/x"] {
		store.write(key, &"v".into()).await.unwrap();
	}

	let listed: BTreeSet<String> = store.list_keys("app/").await.unwrap().into_iter().collect();
	let expected: BTreeSet<String> = ["app/db", "app/api"].iter().map(|s| s.to_string()).collect();
	assert_eq!(listed, expected);
}

#[tokio::test]
async fn missing_scenario() {
	let dir = tempfile::tempdir().unwrap();
	let store = SqliteVaultStore::open_at(dir.path()).await.unwrap();

	assert!(matches!(
		store.read_version("missing", 1).await,
		Err(VaultError::SecretNotFound { .. })
	));
	assert!(matches!(
		store.read("missing").await,
		Err(VaultError::SecretNotFound { .. })
	));
}

#[tokio::test]
async fn open_fails_when_data_dir_is_a_file() {
	let file = tempfile::NamedTempFile::new().unwrap();
	let result = SqliteVaultStore::open_at(file.path()).await;
	assert!(result.is_err());
}
