// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for connectivity operations
//!
//! Every variant is a local-operation failure: it aborts only the connect,
//! query or status call that raised it, never a whole simulation phase.

use super::ids::NeuronId;

/// Errors raised by the connectivity core
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectivityError {
    /// A synapse type id outside the registry's range
    #[error("Invalid synapse type id: {0}")]
    UnknownSynapseType(usize),

    /// A synapse model name that is not registered
    #[error("Unknown synapse model name: '{0}'")]
    UnknownModelName(String),

    /// Positional synapse access out of range
    #[error("Synapse port {port} out of range ({available} synapses stored)")]
    InvalidSynapseIndex { port: usize, available: usize },

    /// Status access with a synapse type inconsistent with what is stored
    #[error("Synapse type mismatch: no synapse of type {requested} stored at this source")]
    TypeMismatch { requested: usize },

    /// A property-set operation rejected by validation
    #[error("Bad property: {0}")]
    BadProperty(String),

    /// A node without position/layer information in a spatial evaluation
    #[error("Missing spatial metadata for {0}")]
    MissingSpatialMetadata(NeuronId),

    /// An axis selector beyond the metadata's dimensionality
    #[error("Spatial dimension {requested} exceeds the {available} defined dimensions")]
    InvalidDimension { requested: usize, available: usize },

    /// A node id the node registry cannot resolve
    #[error("Unknown node: {0}")]
    UnknownNode(NeuronId),
}

/// Result type for connectivity operations
pub type Result<T> = core::result::Result<T, ConnectivityError>;
