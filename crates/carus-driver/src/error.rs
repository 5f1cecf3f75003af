//! Error types for NM-Carus offload operations

use carus_chip::kernels::KernelId;
use thiserror::Error;

use crate::offload::SlotState;

/// Result type alias for NM-Carus operations
pub type Result<T> = std::result::Result<T, CarusError>;

/// Errors that can occur during NM-Carus operations
#[derive(Debug, Error)]
pub enum CarusError {
    /// Invalid configuration rejected before launch
    #[error("Configuration error: {reason}")]
    Configuration {
        /// Reason the configuration was rejected
        reason: String,
    },

    /// Kernel image has not been loaded into instruction memory
    #[error("Kernel image not resident: {kernel}")]
    KernelNotResident {
        /// Kernel that was requested
        kernel: KernelId,
    },

    /// Operation issued out of state-machine order
    #[error("Protocol violation on slot {slot}: expected {expected}, slot is {actual}")]
    ProtocolViolation {
        /// Execution slot the call targeted
        slot: usize,
        /// State(s) in which the call would have been legal
        expected: &'static str,
        /// State the slot was actually in
        actual: SlotState,
    },

    /// `wait_done` exceeded its caller-specified bound
    #[error("Offload timeout after {duration_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds
        duration_ms: u64,
    },

    /// Algorithm-level precondition violated (caller defect)
    #[error("Precondition violated: {reason}")]
    Precondition {
        /// Which precondition failed
        reason: String,
    },

    /// Data-channel transfer failed
    #[error("Transfer failed: {reason}")]
    Transfer {
        /// Reason for failure
        reason: String,
    },
}

impl CarusError {
    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a protocol violation error
    pub const fn protocol(slot: usize, expected: &'static str, actual: SlotState) -> Self {
        Self::ProtocolViolation {
            slot,
            expected,
            actual,
        }
    }

    /// Create a precondition error
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::Precondition {
            reason: reason.into(),
        }
    }

    /// Create a transfer failed error
    pub fn transfer(reason: impl Into<String>) -> Self {
        Self::Transfer {
            reason: reason.into(),
        }
    }
}
