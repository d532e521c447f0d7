// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spatial metadata attached to nodes by the layer geometry subsystem

use serde::{Deserialize, Serialize};

/// Position of a node within its spatial layer.
///
/// The dimensionality is the layer's (typically 2 or 3); the connectivity
/// core never assumes a fixed dimension count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialMetadata {
    position: Vec<f64>,
}

impl SpatialMetadata {
    pub fn new(position: Vec<f64>) -> Self {
        Self { position }
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }

    pub fn dimensions(&self) -> usize {
        self.position.len()
    }
}
