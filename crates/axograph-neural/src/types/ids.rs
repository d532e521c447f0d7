// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Identity types for nodes, synapse models and modulatory sources

use core::fmt;
use serde::{Deserialize, Serialize};

/// Node (neuron) identifier, dense and 1-based across the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NeuronId(pub u32);

impl NeuronId {
    /// Slot index in a partition-local sparse store
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Neuron({})", self.0)
    }
}

/// Synapse model identifier (index into the prototype registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SynapseTypeId(pub usize);

impl SynapseTypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SynapseTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SynapseType({})", self.0)
    }
}

/// Identifier of a volume-transmitter (neuromodulatory) source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModulatorId(pub u32);

impl fmt::Display for ModulatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modulator({})", self.0)
    }
}
