// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Startup discovery of the policy document.
//!
//! Candidate paths are probed in order and the first document that loads
//! wins. A candidate that is missing or fails to parse is skipped.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::document::PolicyDocument;
use crate::gate::{AuthorizationGate, UNAVAILABLE_POLICY_MODE};

/// A candidate that failed to load, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAttempt {
	pub path: PathBuf,
	pub error: String,
}

#[derive(Debug)]
pub enum PolicyDiscovery {
	Loaded {
		path: PathBuf,
		document: PolicyDocument,
		/// Candidates tried before `path`.
		skipped: Vec<LoadAttempt>,
	},
	Unavailable {
		attempts: Vec<LoadAttempt>,
	},
}

impl PolicyDiscovery {
	pub fn is_loaded(&self) -> bool {
		matches!(self, PolicyDiscovery::Loaded { .. })
	}

	/// Build the gate for this outcome under `namespace`.
	pub fn into_gate(self, namespace: impl Into<String>) -> AuthorizationGate {
		match self {
			PolicyDiscovery::Loaded { path, document, .. } => AuthorizationGate::loaded(
				namespace,
				Arc::new(document),
				path.display().to_string(),
			),
			PolicyDiscovery::Unavailable { attempts } => {
				let tried: Vec<PathBuf> = attempts.into_iter().map(|a| a.path).collect();
				AuthorizationGate::unavailable(namespace, &tried)
			}
		}
	}
}

/// Probe `candidates` in order.
#[tracing::instrument(skip(candidates), fields(candidates = candidates.len()))]
pub fn discover(candidates: &[PathBuf]) -> PolicyDiscovery {
	let mut attempts = Vec::new();

	for path in candidates {
		match PolicyDocument::load(path) {
			Ok(document) => {
				info!(
					path = %path.display(),
					rules = document.rules.len(),
					namespace = %document.namespace,
					"loaded vault policy"
				);
				return PolicyDiscovery::Loaded {
					path: path.clone(),
					document,
					skipped: attempts,
				};
			}
			Err(e) => {
				debug!(path = %path.display(), error = %e, "policy candidate skipped");
				attempts.push(LoadAttempt {
					path: path.clone(),
					error: e.to_string(),
				});
			}
		}
	}

	warn!(
		tried = attempts.len(),
		fallback = %UNAVAILABLE_POLICY_MODE,
		"no policy document could be loaded, authorization degraded to fallback"
	);
	PolicyDiscovery::Unavailable { attempts }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gate::GateState;

	const ALLOW_ALL: &str = r#"
[[rule]]
id = "everyone"
effect = "allow"
subjects = ["*"]
actions = ["*"]
resources = ["*"]
"#;

	#[test]
	fn first_loadable_candidate_wins() {
		let dir = tempfile::tempdir().unwrap();
		let broken = dir.path().join("broken.toml");
		let good = dir.path().join("good.toml");
		let later = dir.path().join("later.toml");
		std::fs::write(&broken, "[[rule]\nnot toml").unwrap();
		std::fs::write(&good, ALLOW_ALL).unwrap();
		std::fs::write(&later, ALLOW_ALL).unwrap();

		let candidates = vec![dir.path().join("missing.toml"), broken, good.clone(), later];
		match discover(&candidates) {
			PolicyDiscovery::Loaded { path, skipped, .. } => {
				assert_eq!(path, good);
				assert_eq!(skipped.len(), 2);
			}
			other => panic!("expected Loaded, got {other:?}"),
		}
	}

	#[test]
	fn nothing_loadable_is_unavailable() {
		let dir = tempfile::tempdir().unwrap();
		let candidates = vec![dir.path().join("a.toml"), dir.path().join("b.toml")];

		let discovery = discover(&candidates);
		assert!(!discovery.is_loaded());

		let gate = discovery.into_gate("vault");
		assert_eq!(gate.state(), GateState::PolicyUnavailable);
		let decision = gate.authorize("anyone", "read", "k");
		assert!(!decision.allowed);
		assert!(decision.reason.contains("a.toml"));
		assert!(decision.reason.contains("b.toml"));
	}

	#[test]
	fn loaded_discovery_builds_working_gate() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("policy.toml");
		std::fs::write(&path, ALLOW_ALL).unwrap();

		let gate = discover(&[path.clone()]).into_gate("vault");
		assert_eq!(gate.state(), GateState::PolicyLoaded);
		assert_eq!(gate.source(), Some(path.display().to_string().as_str()));
		assert!(gate.authorize("anyone", "write", "k").allowed);
	}

	#[test]
	fn no_candidates_is_unavailable() {
		assert!(matches!(
			discover(&[]),
			PolicyDiscovery::Unavailable { attempts } if attempts.is_empty()
		));
	}
}
