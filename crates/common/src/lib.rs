// Copyright (C) 2026 the bubble-rs contributors
// SPDX-License-Identifier: AGPL-3.0
//! Shared building blocks for the bubble client crates.
//!
//! Holds the JSON-RPC envelope types, block identifiers, filter parameters,
//! the ABI parameter normalizer, and environment-variable configuration that
//! both the blocking and the async halves of the client depend on.

/// ABI parameter normalization between human-friendly and wire-level values.
pub mod abi;
/// Environment variable names and resolved configuration values.
pub mod env;
/// JSON-RPC envelope and chain identifier types.
pub mod types;

pub use types::*;
