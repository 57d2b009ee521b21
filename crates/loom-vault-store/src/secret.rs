// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for secret values held in memory.
//!
//! [`SecretValue`] is how values leave the store. It never prints or
//! serializes its contents, and the buffer is zeroized on drop. Callers opt in
//! to the plaintext with [`SecretValue::expose`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// The redaction placeholder used in all output.
pub const REDACTED: &str = "[REDACTED]";

#[derive(Zeroize, Clone, PartialEq, Eq)]
#[zeroize(drop)]
pub struct SecretValue {
	inner: String,
}

impl SecretValue {
	pub fn new(inner: impl Into<String>) -> Self {
		Self {
			inner: inner.into(),
		}
	}

	/// Explicitly access the plaintext.
	pub fn expose(&self) -> &str {
		&self.inner
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl From<String> for SecretValue {
	fn from(inner: String) -> Self {
		Self::new(inner)
	}
}

impl From<&str> for SecretValue {
	fn from(inner: &str) -> Self {
		Self::new(inner)
	}
}

impl fmt::Debug for SecretValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SecretValue").field(&REDACTED).finish()
	}
}

impl fmt::Display for SecretValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl Serialize for SecretValue {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

// Plaintext in, redacted out: legacy dumps carry real values.
impl<'de> Deserialize<'de> for SecretValue {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(SecretValue::new)
	}
}
