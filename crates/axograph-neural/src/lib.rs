// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Axograph Neural Foundation Types
//!
//! Shared value types for the connectivity core:
//! - **Ids**: `NeuronId`, `SynapseTypeId`, `ModulatorId`
//! - **Time**: `Delay` (resolution-stepped), `SimTime`
//! - **Events**: `SpikeEvent`, `SpikeDelivery`, `ModulatorEvent`
//! - **Synapse**: the `Synapse` record and its `PlasticityState` variants
//! - **Errors**: the `ConnectivityError` taxonomy

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod synapse;
pub mod types;

// Re-export the common surface
pub use synapse::{PlasticityState, Synapse};
pub use types::{
    ConnectivityError, Delay, ModulatorEvent, ModulatorId, NeuronId, Result, SimTime,
    SpatialMetadata, SpikeDelivery, SpikeEvent, SynapseTypeId, RESOLUTION_MS,
};
