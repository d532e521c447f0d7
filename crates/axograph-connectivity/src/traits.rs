// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Narrow interfaces to the collaborators this core consumes
//!
//! The node registry and the scheduler's input queues live outside the
//! connectivity core; they are reached only through these traits.

use axograph_neural::types::{NeuronId, Result, SpatialMetadata, SpikeDelivery};

/// Node lookup surface of the (external) node registry
pub trait NodeRegistry {
    /// Worker partition responsible for a node.
    ///
    /// Errors with `UnknownNode` when the id cannot be resolved.
    fn owning_partition(&self, node: NeuronId) -> Result<usize>;

    /// Spatial layer metadata of a node, if the node belongs to a layer
    fn spatial_metadata(&self, node: NeuronId) -> Option<&SpatialMetadata>;
}

/// Receiver for per-synapse spike deliveries.
///
/// In the simulator this is the target node's input queue; tests and tools
/// can collect into a plain `Vec`.
pub trait EventSink {
    fn deliver(&mut self, delivery: SpikeDelivery);
}

impl EventSink for Vec<SpikeDelivery> {
    fn deliver(&mut self, delivery: SpikeDelivery) {
        self.push(delivery);
    }
}
