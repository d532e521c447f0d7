// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core type definitions for the connectivity core

pub mod delay;
pub mod error;
pub mod event;
pub mod ids;
pub mod spatial;

pub use delay::{Delay, SimTime, RESOLUTION_MS};
pub use error::{ConnectivityError, Result};
pub use event::{ModulatorEvent, SpikeDelivery, SpikeEvent};
pub use ids::{ModulatorId, NeuronId, SynapseTypeId};
pub use spatial::SpatialMetadata;
