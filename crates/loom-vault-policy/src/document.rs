// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! TOML policy documents.
//!
//! ```toml
//! namespace = "vault"
//!
//! [[rule]]
//! id = "ops-read"
//! effect = "allow"
//! subjects = ["ops-*"]
//! actions = ["read", "list"]
//! resources = ["app/*"]
//! ```
//!
//! Evaluation is deny-overrides: a namespace mismatch denies, any matching
//! deny rule denies, then the first matching allow rule allows. Anything
//! else is denied by default.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::instrument;

use crate::error::{PolicyError, Result};
use crate::evaluator::PolicyEvaluator;
use crate::types::PolicyDecision;

fn default_namespace() -> String {
	"vault".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
	Allow,
	Deny,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rule {
	pub id: String,
	pub effect: Effect,
	pub subjects: Vec<String>,
	pub actions: Vec<String>,
	pub resources: Vec<String>,
}

impl Rule {
	fn matches(&self, subject: &str, action: &str, resource: &str) -> bool {
		any_match(&self.subjects, subject)
			&& any_match(&self.actions, action)
			&& any_match(&self.resources, resource)
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyDocument {
	#[serde(default = "default_namespace")]
	pub namespace: String,
	#[serde(default, rename = "rule")]
	pub rules: Vec<Rule>,
}

impl PolicyDocument {
	/// Read and validate a policy file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| PolicyError::Read {
			path: path.to_path_buf(),
			source: e,
		})?;
		Self::parse(&content)
	}

	pub fn parse(content: &str) -> Result<Self> {
		let mut document: PolicyDocument = toml::from_str(content)?;
		for rule in &mut document.rules {
			rule.actions = rule.actions.iter().map(|a| a.trim().to_lowercase()).collect();
		}
		document.validate()?;
		Ok(document)
	}

	fn validate(&self) -> Result<()> {
		if self.namespace.trim().is_empty() {
			return Err(PolicyError::Invalid("namespace must not be empty".to_string()));
		}

		let mut seen = HashSet::new();
		for rule in &self.rules {
			if rule.id.trim().is_empty() {
				return Err(PolicyError::Invalid("rule id must not be empty".to_string()));
			}
			if !seen.insert(rule.id.as_str()) {
				return Err(PolicyError::Invalid(format!("duplicate rule id '{}'", rule.id)));
			}
			for (field, values) in [
				("subjects", &rule.subjects),
				("actions", &rule.actions),
				("resources", &rule.resources),
			] {
				if values.is_empty() {
					return Err(PolicyError::Invalid(format!(
						"rule '{}' has no {field}",
						rule.id
					)));
				}
			}
		}

		Ok(())
	}
}

impl PolicyEvaluator for PolicyDocument {
	#[instrument(level = "debug", skip(self))]
	fn authorize(
		&self,
		namespace: &str,
		subject: &str,
		action: &str,
		resource: &str,
	) -> PolicyDecision {
		if namespace != self.namespace {
			return PolicyDecision::deny(format!(
				"namespace '{namespace}' does not match policy namespace '{}'",
				self.namespace
			));
		}

		let matching = |effect: Effect| {
			self.rules
				.iter()
				.find(|r| r.effect == effect && r.matches(subject, action, resource))
		};

		let decision = if let Some(rule) = matching(Effect::Deny) {
			PolicyDecision::deny(format!("denied by rule '{}'", rule.id))
		} else if let Some(rule) = matching(Effect::Allow) {
			PolicyDecision::allow(format!("allowed by rule '{}'", rule.id))
		} else {
			PolicyDecision::deny("no rule matched; denied by default")
		};

		tracing::debug!(allowed = decision.allowed, reason = %decision.reason, "policy evaluated");
		decision
	}
}

fn any_match(patterns: &[String], input: &str) -> bool {
	patterns.iter().any(|p| glob_match(p, input))
}

/// `*` matches any run of characters, including none. Everything else is literal.
pub fn glob_match(pattern: &str, input: &str) -> bool {
	let mut parts = pattern.split('*');
	let Some(first) = parts.next() else {
		return input.is_empty();
	};

	let Some(mut rest) = input.strip_prefix(first) else {
		return false;
	};

	let tail: Vec<&str> = parts.collect();
	let Some((last, middle)) = tail.split_last() else {
		// No wildcard at all.
		return rest.is_empty();
	};

	for part in middle {
		match rest.find(part) {
			Some(pos) => rest = &rest[pos + part.len()..],
			None => return false,
		}
	}

	rest.ends_with(last)
}
