// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::types::PolicyDecision;

/// Anything that can decide whether `subject` may perform `action` on
/// `resource` within `namespace`.
///
/// Implementations must be pure: the same inputs always yield the same
/// decision, and evaluation never blocks on I/O.
pub trait PolicyEvaluator: Send + Sync {
	fn authorize(
		&self,
		namespace: &str,
		subject: &str,
		action: &str,
		resource: &str,
	) -> PolicyDecision;
}
