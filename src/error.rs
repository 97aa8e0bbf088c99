use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::tank::TankId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigValidationErrorField {
    GradientFactors,
    MaxPpO2,
    MaxDecoPpO2,
    Altitude,
    StopDepths,
    Speeds,
    Durations,
    MaxEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigValidationErrorReason {
    OutOfRange,
    /// gfLow can't be higher than gfHigh
    GfOrder,
    /// decompression ppO2 limit lower than the bottom one
    PpO2Order,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("{field:?}: {reason:?}")]
pub struct ConfigValidationErr {
    pub field: ConfigValidationErrorField,
    pub reason: ConfigValidationErrorReason,
}

impl ConfigValidationErr {
    pub fn new(field: ConfigValidationErrorField, reason: ConfigValidationErrorReason) -> Self {
        Self { field, reason }
    }
}

/// Reasons a profile can't be trusted. Collected, never thrown.
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlanningError {
    #[error("no tanks provided")]
    NoTanks,

    #[error("no segments provided")]
    NoSegments,

    #[error("tank {tank} has invalid gas fractions")]
    InvalidGas { tank: TankId },

    #[error("tank id {tank} is used more than once")]
    DuplicateTank { tank: TankId },

    #[error("tank id {tank} is outside 1 to the number of tanks")]
    NonContiguousTanks { tank: TankId },

    #[error("segment {segment} uses unknown tank {tank}")]
    UnknownTank { segment: usize, tank: TankId },

    #[error("segment {segment} has an invalid depth or duration")]
    InvalidSegment { segment: usize },

    #[error("segment {segment} does not start where the previous one ended")]
    NonContiguousSegments { segment: usize },

    #[error("profile has to start at the surface")]
    NotStartingAtSurface,

    #[error("expected 16 compartments, got {count}")]
    InvalidTissues { count: usize },

    #[error("invalid options: {0}")]
    InvalidOptions(ConfigValidationErr),

    #[error("ascent did not converge within {steps} steps")]
    NonConvergence { steps: usize },
}
