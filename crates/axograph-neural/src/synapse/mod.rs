// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Synapse records
//!
//! A synapse is one directed, parameterized edge. Per-kind behavior is a
//! closed tagged variant resolved once at registry lookup; there is no
//! runtime downcasting anywhere in the core.

use serde::{Deserialize, Serialize};

use crate::types::{Delay, ModulatorId, NeuronId, SimTime};

/// Kind-specific plasticity state carried by a synapse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlasticityState {
    /// Fixed-weight synapse, no state
    Static,

    /// Spike-timing-dependent synapse; `trace` is the presynaptic
    /// eligibility trace maintained by the (external) neuron dynamics
    Stdp { trace: f64 },

    /// Neuromodulated synapse driven by one volume-transmitter source
    Modulated {
        modulator: ModulatorId,
        /// Eligibility accumulated from pre/post coincidence
        eligibility: f64,
        /// Time of the last weight-update trigger applied to this synapse
        last_update: SimTime,
    },
}

/// One stored synapse: target plus tunable parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synapse {
    pub target: NeuronId,
    pub weight: f64,
    pub delay: Delay,
    pub state: PlasticityState,
}

impl Synapse {
    pub fn new(target: NeuronId, weight: f64, delay: Delay, state: PlasticityState) -> Self {
        Self {
            target,
            weight,
            delay,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synapse_construction() {
        let syn = Synapse::new(
            NeuronId(9),
            2.0,
            Delay::from_ms(1.5),
            PlasticityState::Static,
        );
        assert_eq!(syn.target, NeuronId(9));
        assert_eq!(syn.delay.as_ms(), 1.5);
        assert_eq!(syn.state, PlasticityState::Static);
    }
}
