// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::secret::SecretValue;

/// 1-indexed position in a key's history.
pub type Version = u32;

/// A value read from the store together with the version it was written as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretRead {
	pub value: SecretValue,
	pub version: Version,
}

/// Metadata for one historical version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
	pub version: Version,
	pub created_at: DateTime<Utc>,
}
