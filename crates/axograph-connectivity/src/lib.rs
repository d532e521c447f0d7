// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Axograph Connectivity Core
//!
//! Synaptic connectivity for the simulator: per-partition sparse connection
//! stores, heterogeneous per-source connectors, the synapse model registry
//! and the connection manager that ties them together.
//!
//! Layout:
//! - [`sparse_store`]: partition-local id-indexed connector storage
//! - [`connector`]: per-source synapse groups, growth and delivery
//! - [`registry`]: synapse model prototypes and synapse construction
//! - [`manager`]: connect/query/status/send orchestration and live counters
//! - [`spatial`]: distance and position evaluators for spatial rules
//! - [`traits`]: interfaces to the node registry and the event queues

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod connector;
pub mod manager;
pub mod registry;
pub mod sparse_store;
pub mod spatial;
pub mod traits;

// Re-export the common surface
pub use connector::{ConnectionDescriptor, Connector};
pub use manager::{ConnectRequest, ConnectionGroup, ConnectionManager};
pub use registry::{ModulationParams, SynapseKind, SynapsePrototype, SynapseRegistry};
pub use spatial::{NodePosition, SpatialDistance};
pub use sparse_store::SparseStore;
pub use traits::{EventSink, NodeRegistry};
