// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
	#[error("Failed to read policy file {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse policy document: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("Invalid policy document: {0}")]
	Invalid(String),

	#[error("Unknown action: {0}")]
	UnknownAction(String),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
