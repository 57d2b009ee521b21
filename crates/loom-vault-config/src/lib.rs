// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the Loom secrets vault.
//!
//! Sources are merged in precedence order: built-in defaults, then the TOML
//! file (`/etc/loom/vault.toml` unless overridden), then `LOOM_VAULT_*`
//! environment variables.
//!
//! # Usage
//!
//! ```ignore
//! use loom_vault_config::load_config;
//!
//! let config = load_config()?;
//! println!("vault database at {}", config.storage.database_path().display());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::VaultConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::debug;

/// Fully resolved vault configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultConfig {
	pub storage: StorageConfig,
	pub policy: PolicyConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LOOM_VAULT_*`)
/// 2. Config file (`/etc/loom/vault.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<VaultConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<VaultConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<VaultConfig, ConfigError> {
	let mut merged = VaultConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<VaultConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = VaultConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: VaultConfigLayer) -> Result<VaultConfig, ConfigError> {
	let storage = layer.storage.unwrap_or_default().finalize();
	let policy = layer.policy.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&storage, &policy)?;

	debug!(
		data_dir = %storage.data_dir.display(),
		file_name = %storage.file_name,
		max_connections = storage.max_connections,
		policy_namespace = %policy.namespace,
		policy_candidates = policy.paths.len(),
		log_level = %logging.level,
		"vault configuration resolved"
	);

	Ok(VaultConfig {
		storage,
		policy,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(storage: &StorageConfig, policy: &PolicyConfig) -> Result<(), ConfigError> {
	if storage.max_connections == 0 {
		return Err(ConfigError::Validation(
			"storage.max_connections must be at least 1".to_string(),
		));
	}

	if storage.file_name.trim().is_empty() {
		return Err(ConfigError::Validation(
			"storage.file_name must not be empty".to_string(),
		));
	}

	if policy.namespace.trim().is_empty() {
		return Err(ConfigError::Validation(
			"policy.namespace must not be empty".to_string(),
		));
	}

	Ok(())
}
