// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization for the Loom vault.
//!
//! A [`PolicyDocument`] is discovered once at startup and wrapped in an
//! [`AuthorizationGate`]. The gate answers `(subject, action, resource)`
//! requests with a [`PolicyDecision`] and falls back to a fixed decision when
//! no document could be loaded.

pub mod discovery;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod gate;
pub mod types;

pub use discovery::{discover, LoadAttempt, PolicyDiscovery};
pub use document::{glob_match, Effect, PolicyDocument, Rule};
pub use error::{PolicyError, Result};
pub use evaluator::PolicyEvaluator;
pub use gate::{AuthorizationGate, FallbackMode, GateState, UNAVAILABLE_POLICY_MODE};
pub use types::{Action, PolicyDecision};
