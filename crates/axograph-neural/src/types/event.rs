// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Event types routed through the connectivity core
//!
//! A `SpikeEvent` enters the core when a source fires; the connector fans it
//! out into one `SpikeDelivery` per stored synapse, stamped with that
//! synapse's weight and delay. `ModulatorEvent`s carry neuromodulatory
//! activity into the plasticity weight-update trigger.

use serde::{Deserialize, Serialize};

use super::delay::{Delay, SimTime};
use super::ids::NeuronId;

/// A spike emitted by one source node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeEvent {
    /// Firing node
    pub source: NeuronId,

    /// Number of coincident spikes represented by this event
    pub multiplicity: u32,

    /// Emission time in milliseconds
    pub stamp: SimTime,
}

impl SpikeEvent {
    pub fn new(source: NeuronId, stamp: SimTime) -> Self {
        Self {
            source,
            multiplicity: 1,
            stamp,
        }
    }
}

/// One per-synapse delivery produced from a `SpikeEvent`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeDelivery {
    pub source: NeuronId,
    pub target: NeuronId,

    /// Weight of the traversed synapse
    pub weight: f64,

    /// Transmission delay of the traversed synapse
    pub delay: Delay,

    pub multiplicity: u32,

    /// Emission time of the originating spike
    pub stamp: SimTime,
}

/// One neuromodulatory spike (time plus multiplicity)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModulatorEvent {
    /// Spike time in milliseconds
    pub spike_time: SimTime,

    /// Spike multiplicity (fractional to allow pre-accumulated rates)
    pub multiplicity: f64,
}
