// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the feedback sequencer.

use crate::unit::UnitId;
use thiserror::Error;

/// Errors raised by the player at its public call sites
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// A finite wait was requested on a sequence that never ends
    #[error("Sequence duration is unbounded")]
    Unbounded,

    /// The operation requires the player to be idle
    #[error("Player is busy with an active pass")]
    Busy,

    /// No unit with this ID in the sequence
    #[error("Unit not found: {0:?}")]
    UnitNotFound(UnitId),

    /// A bounded run did not finish within the tick budget
    #[error("Sequence did not complete within {0} ticks")]
    TickBudgetExceeded(u64),
}

/// Errors reported by a unit; never fatal to the player
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// The external target this unit drives is missing
    #[error("Missing target: {0}")]
    MissingTarget(String),

    /// A unit parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The effect failed while starting
    #[error("{0}")]
    Failed(String),
}

/// Errors loading or saving player settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Settings were written by a newer format
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Highest supported version
        supported: u32,
    },
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, FeedbackError>;
