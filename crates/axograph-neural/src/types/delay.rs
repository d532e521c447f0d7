// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transmission delay representation
//!
//! Delays are stored in integer steps of the simulation resolution so that
//! they stay exactly comparable and addable across the whole connectivity
//! core; millisecond values only appear at the API boundary.

use core::fmt;
use core::ops::Add;
use serde::{Deserialize, Serialize};

/// Simulation resolution in milliseconds (one delay step)
pub const RESOLUTION_MS: f64 = 0.1;

/// Simulation time in milliseconds (event stamps, trigger times)
pub type SimTime = f64;

/// Synaptic transmission delay in resolution steps
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Delay {
    steps: u32,
}

impl Delay {
    /// Delay of exactly one resolution step
    pub fn resolution() -> Self {
        Self { steps: 1 }
    }

    /// Build from a step count
    pub fn from_steps(steps: u32) -> Self {
        Self { steps }
    }

    /// Build from milliseconds, rounding to the nearest step.
    /// Negative inputs saturate to zero.
    pub fn from_ms(ms: f64) -> Self {
        let steps = (ms / RESOLUTION_MS).round();
        Self {
            steps: if steps > 0.0 { steps as u32 } else { 0 },
        }
    }

    pub fn steps(self) -> u32 {
        self.steps
    }

    pub fn as_ms(self) -> f64 {
        self.steps as f64 * RESOLUTION_MS
    }
}

impl Add for Delay {
    type Output = Delay;

    fn add(self, rhs: Delay) -> Delay {
        Delay {
            steps: self.steps + rhs.steps,
        }
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.as_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_round_trip() {
        let d = Delay::from_ms(1.5);
        assert_eq!(d.steps(), 15);
        assert_eq!(d.as_ms(), 1.5);
    }

    #[test]
    fn test_rounding_to_nearest_step() {
        assert_eq!(Delay::from_ms(0.26).steps(), 3);
        assert_eq!(Delay::from_ms(0.24).steps(), 2);
    }

    #[test]
    fn test_negative_saturates_to_zero() {
        assert_eq!(Delay::from_ms(-1.0).steps(), 0);
    }

    #[test]
    fn test_ordering_and_addition() {
        let a = Delay::from_ms(1.0);
        let b = Delay::from_ms(2.0);
        assert!(a < b);
        assert_eq!((a + b).as_ms(), 3.0);
    }
}
