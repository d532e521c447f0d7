// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spatial parameter evaluators
//!
//! Distance-dependent connection rules sample these during connectivity
//! generation. Both evaluators are pure given their inputs; node-pair entry
//! points resolve positions through the [`NodeRegistry`] trait.

use serde::{Deserialize, Serialize};

use axograph_neural::types::{ConnectivityError, NeuronId, Result};

use crate::traits::NodeRegistry;

/// Distance between the two endpoints of a prospective connection.
///
/// `dimension` selects what is measured: 0 is the Euclidean magnitude of the
/// displacement, 1..=3 the signed displacement component along the x, y or z
/// axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialDistance {
    dimension: usize,
}

impl SpatialDistance {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Evaluate over a precomputed displacement vector (target minus source)
    pub fn evaluate_displacement(&self, displacement: &[f64]) -> Result<f64> {
        match self.dimension {
            0 => Ok(displacement.iter().map(|d| d * d).sum::<f64>().sqrt()),
            axis if axis <= displacement.len() => Ok(displacement[axis - 1]),
            axis => Err(ConnectivityError::InvalidDimension {
                requested: axis,
                available: displacement.len(),
            }),
        }
    }

    /// Evaluate over a node pair, resolving positions through the registry.
    ///
    /// A node without spatial metadata yields `MissingSpatialMetadata`; the
    /// displacement spans the dimensions both positions define.
    pub fn evaluate(
        &self,
        source: NeuronId,
        target: NeuronId,
        nodes: &dyn NodeRegistry,
    ) -> Result<f64> {
        let displacement = displacement_between(source, target, nodes)?;
        self.evaluate_displacement(&displacement)
    }
}

/// Axis position of a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePosition {
    /// Zero-based coordinate index
    dimension: usize,
}

impl NodePosition {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn evaluate(&self, node: NeuronId, nodes: &dyn NodeRegistry) -> Result<f64> {
        let metadata = nodes
            .spatial_metadata(node)
            .ok_or(ConnectivityError::MissingSpatialMetadata(node))?;
        metadata.position().get(self.dimension).copied().ok_or(
            ConnectivityError::InvalidDimension {
                requested: self.dimension,
                available: metadata.dimensions(),
            },
        )
    }
}

/// Displacement vector from `source` to `target` over the dimensions both
/// positions define
fn displacement_between(
    source: NeuronId,
    target: NeuronId,
    nodes: &dyn NodeRegistry,
) -> Result<Vec<f64>> {
    let source_pos = nodes
        .spatial_metadata(source)
        .ok_or(ConnectivityError::MissingSpatialMetadata(source))?
        .position();
    let target_pos = nodes
        .spatial_metadata(target)
        .ok_or(ConnectivityError::MissingSpatialMetadata(target))?
        .position();
    Ok(target_pos
        .iter()
        .zip(source_pos.iter())
        .map(|(t, s)| t - s)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;
    use axograph_neural::types::SpatialMetadata;

    struct GridNodes {
        positions: AHashMap<NeuronId, SpatialMetadata>,
    }

    impl GridNodes {
        fn new(entries: &[(u32, &[f64])]) -> Self {
            let positions = entries
                .iter()
                .map(|(id, pos)| (NeuronId(*id), SpatialMetadata::new(pos.to_vec())))
                .collect();
            Self { positions }
        }
    }

    impl NodeRegistry for GridNodes {
        fn owning_partition(&self, node: NeuronId) -> Result<usize> {
            if self.positions.contains_key(&node) {
                Ok(0)
            } else {
                Err(ConnectivityError::UnknownNode(node))
            }
        }

        fn spatial_metadata(&self, node: NeuronId) -> Option<&SpatialMetadata> {
            self.positions.get(&node)
        }
    }

    #[test]
    fn test_euclidean_and_axis_components() {
        let nodes = GridNodes::new(&[(1, &[0.0, 0.0]), (2, &[3.0, -4.0])]);
        let euclidean = SpatialDistance::new(0);
        assert_eq!(
            euclidean.evaluate(NeuronId(1), NeuronId(2), &nodes).unwrap(),
            5.0
        );
        // Axis components keep their sign
        assert_eq!(
            SpatialDistance::new(1)
                .evaluate(NeuronId(1), NeuronId(2), &nodes)
                .unwrap(),
            3.0
        );
        assert_eq!(
            SpatialDistance::new(2)
                .evaluate(NeuronId(1), NeuronId(2), &nodes)
                .unwrap(),
            -4.0
        );
        // Direction matters
        assert_eq!(
            SpatialDistance::new(2)
                .evaluate(NeuronId(2), NeuronId(1), &nodes)
                .unwrap(),
            4.0
        );
    }

    #[test]
    fn test_dimension_out_of_range() {
        let nodes = GridNodes::new(&[(1, &[0.0, 0.0]), (2, &[1.0, 1.0])]);
        let err = SpatialDistance::new(3)
            .evaluate(NeuronId(1), NeuronId(2), &nodes)
            .unwrap_err();
        assert_eq!(
            err,
            ConnectivityError::InvalidDimension {
                requested: 3,
                available: 2
            }
        );
    }

    #[test]
    fn test_missing_metadata() {
        let nodes = GridNodes::new(&[(1, &[0.0, 0.0])]);
        let err = SpatialDistance::new(0)
            .evaluate(NeuronId(1), NeuronId(7), &nodes)
            .unwrap_err();
        assert_eq!(err, ConnectivityError::MissingSpatialMetadata(NeuronId(7)));
    }

    #[test]
    fn test_node_position_component() {
        let nodes = GridNodes::new(&[(1, &[2.5, -1.0, 0.5])]);
        assert_eq!(
            NodePosition::new(1).evaluate(NeuronId(1), &nodes).unwrap(),
            -1.0
        );
        let err = NodePosition::new(3).evaluate(NeuronId(1), &nodes).unwrap_err();
        assert_eq!(
            err,
            ConnectivityError::InvalidDimension {
                requested: 3,
                available: 3
            }
        );
    }
}
