//! Instance capability representation
//!
//! Capabilities describe what one NM-Carus deployment can do: how many
//! execution instances it exposes, how large its vector register bank is,
//! and the widest vector length it accepts. The host never assumes a
//! vector length — it requests one and the hardware echoes back the
//! clamped, effective value.

use carus_chip::bank;
use carus_chip::regs;
use carus_chip::vtype::ElemType;

/// NM-Carus deployment capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Number of independently configurable execution instances
    pub instance_count: usize,

    /// Vector registers per instance bank
    pub vreg_count: usize,

    /// Physical register width in bytes
    pub max_vl_bytes: usize,

    /// Instruction memory size in 32-bit words
    pub imem_words: usize,
}

impl Capabilities {
    /// Capabilities of the modeled silicon.
    #[must_use]
    pub const fn of_model() -> Self {
        Self {
            instance_count: regs::NUM_INSTANCES,
            vreg_count: bank::VREG_COUNT,
            max_vl_bytes: bank::MAX_VL_BYTES,
            imem_words: regs::IMEM_WORDS,
        }
    }

    /// Maximum vector length in elements for a given element type.
    #[must_use]
    pub const fn max_vl_elems(&self, elem: ElemType) -> usize {
        self.max_vl_bytes / elem.width_bytes()
    }

    /// Clamp a host-requested vector length the way the hardware does.
    ///
    /// The requested value is never an error — the hardware accepts the
    /// write and echoes back the reduced, effective length.
    #[must_use]
    pub const fn clamp_vl(&self, requested: usize, elem: ElemType) -> usize {
        let max = self.max_vl_elems(elem);
        if requested > max {
            max
        } else {
            requested
        }
    }
}
