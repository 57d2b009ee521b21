// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use crate::types::Version;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
	#[error("secret not found: {key}")]
	SecretNotFound { key: String },

	#[error("version {version} not found for {key}")]
	VersionNotFound { key: String, version: Version },

	#[error("Database error: {0}")]
	Storage(#[from] sqlx::Error),

	#[error("Failed to prepare storage directory {path}: {source}")]
	StorageDirectory {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("store is closed")]
	Closed,

	#[error("store was already closed")]
	AlreadyClosed,

	#[error("Corrupt history for {key}: expected {expected} versions, found {found}")]
	Corrupt {
		key: String,
		expected: Version,
		found: Version,
	},

	#[error("Failed to read legacy dump {path}: {source}")]
	LegacyRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Import refused: store already holds {existing} secrets")]
	ImportConflict { existing: i64 },

	#[error("Internal: {0}")]
	Internal(String),
}

impl VaultError {
	/// Expected, user-facing absence of a key or version. Not a storage fault.
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			VaultError::SecretNotFound { .. } | VaultError::VersionNotFound { .. }
		)
	}
}

pub type Result<T> = std::result::Result<T, VaultError>;
