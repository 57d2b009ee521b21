// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy discovery configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Namespace every authorization request is evaluated under.
pub const DEFAULT_POLICY_NAMESPACE: &str = "vault";

fn default_paths() -> Vec<PathBuf> {
	vec![
		PathBuf::from("/etc/loom/vault-policy.toml"),
		PathBuf::from("./vault-policy.toml"),
	]
}

/// Policy configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
	pub namespace: String,
	/// Candidate policy documents, probed in order. The first that loads wins.
	pub paths: Vec<PathBuf>,
}

impl Default for PolicyConfig {
	fn default() -> Self {
		PolicyConfigLayer::default().finalize()
	}
}

/// Policy configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfigLayer {
	#[serde(default)]
	pub namespace: Option<String>,
	#[serde(default)]
	pub paths: Option<Vec<String>>,
}

impl PolicyConfigLayer {
	pub fn merge(&mut self, other: PolicyConfigLayer) {
		if other.namespace.is_some() {
			self.namespace = other.namespace;
		}
		if other.paths.is_some() {
			self.paths = other.paths;
		}
	}

	pub fn finalize(self) -> PolicyConfig {
		PolicyConfig {
			namespace: self
				.namespace
				.unwrap_or_else(|| DEFAULT_POLICY_NAMESPACE.to_string()),
			paths: self
				.paths
				.map(|p| p.into_iter().map(PathBuf::from).collect())
				.unwrap_or_else(default_paths),
		}
	}
}
