// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use loom_vault_config::ConfigError;
use loom_vault_policy::Action;
use loom_vault_store::VaultError;
use serde::Serialize;

/// Machine-checkable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	NotFound,
	StorageFault,
	PermissionDenied,
	ConfigurationFault,
}

impl ErrorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::NotFound => "not_found",
			ErrorKind::StorageFault => "storage_fault",
			ErrorKind::PermissionDenied => "permission_denied",
			ErrorKind::ConfigurationFault => "configuration_fault",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
pub enum VaultServiceError {
	#[error("permission denied: {subject} may not {action} '{resource}': {reason}")]
	Denied {
		subject: String,
		action: Action,
		resource: String,
		reason: String,
	},

	#[error(transparent)]
	Store(#[from] VaultError),
}

impl VaultServiceError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			VaultServiceError::Denied { .. } => ErrorKind::PermissionDenied,
			VaultServiceError::Store(e) if e.is_not_found() => ErrorKind::NotFound,
			VaultServiceError::Store(_) => ErrorKind::StorageFault,
		}
	}
}

/// Failures that stop the vault from starting.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("failed to open vault storage: {0}")]
	Store(#[from] VaultError),
}

impl BootstrapError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			BootstrapError::Config(_) => ErrorKind::ConfigurationFault,
			BootstrapError::Store(_) => ErrorKind::StorageFault,
		}
	}
}

pub type Result<T> = std::result::Result<T, VaultServiceError>;
