// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process startup: open storage, discover the policy, build the service.

use std::sync::Arc;

use loom_vault_config::VaultConfig;
use loom_vault_policy::{discover, GateState};
use loom_vault_store::SqliteVaultStore;
use tracing::{info, warn};

use crate::error::{BootstrapError, ErrorKind};
use crate::service::Vault;

/// Open the vault described by `config`.
///
/// A storage failure aborts startup. A missing policy does not: the gate
/// degrades to its fallback and the condition is reported as a
/// configuration fault in the logs.
#[tracing::instrument(skip(config))]
pub async fn open_vault(config: &VaultConfig) -> Result<Vault, BootstrapError> {
	let store = SqliteVaultStore::open(&config.storage).await?;

	let gate = discover(&config.policy.paths).into_gate(config.policy.namespace.clone());
	match gate.state() {
		GateState::PolicyLoaded => info!(
			namespace = %gate.namespace(),
			source = gate.source().unwrap_or_default(),
			"authorization gate ready"
		),
		GateState::PolicyUnavailable => warn!(
			kind = %ErrorKind::ConfigurationFault,
			namespace = %gate.namespace(),
			"authorization gate running in fallback mode"
		),
	}

	Ok(Vault::new(Arc::new(store), gate))
}
