// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage configuration for the embedded secret database.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_FILE_NAME: &str = "vault.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

fn default_data_dir() -> PathBuf {
	dirs::data_dir()
		.map(|d| d.join("loom-vault"))
		.unwrap_or_else(|| PathBuf::from("./vault-data"))
}

/// Storage configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
	/// Directory holding the database file. Created on open if missing.
	pub data_dir: PathBuf,
	pub file_name: String,
	pub max_connections: u32,
	/// How long a connection waits on a locked database before failing.
	pub busy_timeout: Duration,
}

impl StorageConfig {
	/// Build a config rooted at `data_dir` with every other field defaulted.
	pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
		Self {
			data_dir: data_dir.into(),
			..Self::default()
		}
	}

	/// Full path of the database file.
	pub fn database_path(&self) -> PathBuf {
		self.data_dir.join(&self.file_name)
	}
}

impl Default for StorageConfig {
	fn default() -> Self {
		StorageConfigLayer::default().finalize()
	}
}

/// Storage configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfigLayer {
	#[serde(default)]
	pub data_dir: Option<String>,
	#[serde(default)]
	pub file_name: Option<String>,
	#[serde(default)]
	pub max_connections: Option<u32>,
	#[serde(default)]
	pub busy_timeout_ms: Option<u64>,
}

impl StorageConfigLayer {
	pub fn merge(&mut self, other: StorageConfigLayer) {
		if other.data_dir.is_some() {
			self.data_dir = other.data_dir;
		}
		if other.file_name.is_some() {
			self.file_name = other.file_name;
		}
		if other.max_connections.is_some() {
			self.max_connections = other.max_connections;
		}
		if other.busy_timeout_ms.is_some() {
			self.busy_timeout_ms = other.busy_timeout_ms;
		}
	}

	pub fn finalize(self) -> StorageConfig {
		StorageConfig {
			data_dir: self
				.data_dir
				.map(PathBuf::from)
				.unwrap_or_else(default_data_dir),
			file_name: self
				.file_name
				.unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
			max_connections: self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
			busy_timeout: Duration::from_millis(
				self.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = StorageConfigLayer::default().finalize();
		assert_eq!(config.file_name, "vault.db");
		assert_eq!(config.max_connections, 4);
		assert_eq!(config.busy_timeout, Duration::from_millis(5000));
		assert!(config.data_dir.ends_with("loom-vault") || config.data_dir.ends_with("vault-data"));
	}

	#[test]
	fn test_database_path_joins_dir_and_file() {
		let layer = StorageConfigLayer {
			data_dir: Some("/srv/vault".to_string()),
			file_name: Some("secrets.db".to_string()),
			..Default::default()
		};
		let config = layer.finalize();
		assert_eq!(config.database_path(), PathBuf::from("/srv/vault/secrets.db"));
	}

	#[test]
	fn test_in_dir_keeps_other_defaults() {
		let config = StorageConfig::in_dir("/tmp/v");
		assert_eq!(config.data_dir, PathBuf::from("/tmp/v"));
		assert_eq!(config.file_name, "vault.db");
	}

	#[test]
	fn test_deserialize_partial() {
		let layer: StorageConfigLayer = toml::from_str("busy_timeout_ms = 250").unwrap();
		assert_eq!(layer.busy_timeout_ms, Some(250));
		assert!(layer.data_dir.is_none());
	}
}
