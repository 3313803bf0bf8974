// Copyright (C) 2026 the bubble-rs contributors
// SPDX-License-Identifier: AGPL-3.0
//! Typed JSON-RPC client for bubble nodes.
//!
//! Exposes the node's `bub_*` surface as typed calls routed through an
//! ordered, mutable middleware onion (retry, local filter emulation,
//! response reshaping) over a pluggable transport provider, plus the RLP
//! codec for the fixed-address inner contracts (staking, delegation,
//! governance, slashing, restricting plans).

/// Blocking `bub` namespace bindings.
pub mod api;
/// Suspending `bub` namespace bindings.
pub mod api_async;
/// Client entry points for both operating modes.
pub mod client;
/// The typed error taxonomy.
pub mod error;
/// Raw-to-typed result conversions.
pub mod formatters;
/// Inner-contract codec, formatter tables and call building.
pub mod inner;
/// Request managers: descriptor execution and response formatting.
pub mod manager;
/// Method descriptors and argument mungers.
pub mod method;
/// The middleware onion and its built-in layers.
pub mod middleware;
/// Transport providers (HTTP, mock).
pub mod provider;
/// Endpoint name constants.
pub mod rpc;

pub use client::{AsyncClient, Client};
pub use error::ClientError;
