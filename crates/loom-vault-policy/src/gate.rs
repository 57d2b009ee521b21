// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authorization gate in front of every vault operation.
//!
//! A gate is built once at startup in one of two states and never changes:
//!
//! - [`GateState::PolicyLoaded`]: requests go to the loaded evaluator under
//!   the gate's fixed namespace.
//! - [`GateState::PolicyUnavailable`]: no policy document could be loaded;
//!   every request gets the [`UNAVAILABLE_POLICY_MODE`] decision.
//!
//! # Input normalization
//!
//! Before evaluation the action is trimmed and lowercased, and an empty
//! resource is widened to `"*"`. An empty resource therefore needs a rule
//! that matches everything. Callers that need exact matching should pass a
//! non-empty resource.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::instrument;

use crate::evaluator::PolicyEvaluator;
use crate::types::{Action, PolicyDecision};

/// Decision mode used when no policy document is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackMode {
	DenyAll,
	AllowAll,
}

/// The one fallback the vault runs with when no policy loads.
pub const UNAVAILABLE_POLICY_MODE: FallbackMode = FallbackMode::DenyAll;

impl FallbackMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			FallbackMode::DenyAll => "deny-all",
			FallbackMode::AllowAll => "allow-all",
		}
	}

	/// The decision this mode returns for every request.
	pub fn decision(&self, attempted: &[PathBuf]) -> PolicyDecision {
		let tried = if attempted.is_empty() {
			"no candidate paths configured".to_string()
		} else {
			let paths: Vec<String> = attempted.iter().map(|p| p.display().to_string()).collect();
			format!("tried: {}", paths.join(", "))
		};
		let reason = format!(
			"policy unavailable, {} fallback in effect ({tried})",
			self.as_str()
		);

		match self {
			FallbackMode::DenyAll => PolicyDecision::deny(reason),
			FallbackMode::AllowAll => PolicyDecision::allow(reason),
		}
	}
}

impl fmt::Display for FallbackMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
	PolicyLoaded,
	PolicyUnavailable,
}

enum Backend {
	Loaded {
		evaluator: Arc<dyn PolicyEvaluator>,
		source: String,
	},
	Unavailable {
		decision: PolicyDecision,
	},
}

pub struct AuthorizationGate {
	namespace: String,
	backend: Backend,
}

impl AuthorizationGate {
	/// Gate backed by a loaded evaluator. `source` names where the policy
	/// came from and is only used for logging.
	pub fn loaded(
		namespace: impl Into<String>,
		evaluator: Arc<dyn PolicyEvaluator>,
		source: impl Into<String>,
	) -> Self {
		Self {
			namespace: namespace.into(),
			backend: Backend::Loaded {
				evaluator,
				source: source.into(),
			},
		}
	}

	/// Gate that answers every request with the [`UNAVAILABLE_POLICY_MODE`]
	/// decision.
	pub fn unavailable(namespace: impl Into<String>, attempted: &[PathBuf]) -> Self {
		Self {
			namespace: namespace.into(),
			backend: Backend::Unavailable {
				decision: UNAVAILABLE_POLICY_MODE.decision(attempted),
			},
		}
	}

	pub fn state(&self) -> GateState {
		match self.backend {
			Backend::Loaded { .. } => GateState::PolicyLoaded,
			Backend::Unavailable { .. } => GateState::PolicyUnavailable,
		}
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Where the active policy was loaded from, if any.
	pub fn source(&self) -> Option<&str> {
		match &self.backend {
			Backend::Loaded { source, .. } => Some(source),
			Backend::Unavailable { .. } => None,
		}
	}

	/// Decide a request. Always returns a decision; see the module docs for
	/// how `action` and `resource` are normalized.
	#[instrument(level = "debug", skip(self), fields(namespace = %self.namespace))]
	pub fn authorize(&self, subject: &str, action: &str, resource: &str) -> PolicyDecision {
		let action = action.trim().to_lowercase();
		let resource = if resource.is_empty() { "*" } else { resource };

		match &self.backend {
			Backend::Loaded { evaluator, .. } => {
				evaluator.authorize(&self.namespace, subject, &action, resource)
			}
			Backend::Unavailable { decision } => decision.clone(),
		}
	}

	/// Typed form of [`authorize`](Self::authorize) for vault data operations.
	pub fn check(&self, subject: &str, action: Action, resource: &str) -> PolicyDecision {
		self.authorize(subject, action.as_str(), resource)
	}
}

impl fmt::Debug for AuthorizationGate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AuthorizationGate")
			.field("namespace", &self.namespace)
			.field("state", &self.state())
			.field("source", &self.source())
			.finish()
	}
}
