// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core authorization types.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::PolicyError;

/// Operations the vault gates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
	Read,
	Write,
	List,
}

impl Action {
	pub fn as_str(&self) -> &'static str {
		match self {
			Action::Read => "read",
			Action::Write => "write",
			Action::List => "list",
		}
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Action {
	type Err = PolicyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"read" => Ok(Action::Read),
			"write" => Ok(Action::Write),
			"list" => Ok(Action::List),
			other => Err(PolicyError::UnknownAction(other.to_string())),
		}
	}
}

/// Outcome of one authorization check. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDecision {
	pub allowed: bool,
	pub reason: String,
}

impl PolicyDecision {
	pub fn allow(reason: impl Into<String>) -> Self {
		Self {
			allowed: true,
			reason: reason.into(),
		}
	}

	pub fn deny(reason: impl Into<String>) -> Self {
		Self {
			allowed: false,
			reason: reason.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn action_parse_is_case_insensitive() {
		assert_eq!(" READ ".parse::<Action>().unwrap(), Action::Read);
		assert_eq!("Write".parse::<Action>().unwrap(), Action::Write);
		assert!(matches!(
			"delete".parse::<Action>(),
			Err(PolicyError::UnknownAction(a)) if a == "delete"
		));
	}

	#[test]
	fn action_display_round_trips() {
		for action in [Action::Read, Action::Write, Action::List] {
			assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
		}
	}
}
