//! Configuration register file for an NM-Carus instance.
//!
//! Each execution instance exposes one block of memory-mapped configuration
//! registers, written by the host before launch and read once by the kernel
//! at entry. The block repeats per instance at [`INSTANCE_STRIDE`].
//!
//! Exact addresses are hardware-defined; the driver treats the file as an
//! opaque register set keyed by symbolic name and only uses these offsets
//! when talking to a memory-mapped instance.

/// Number of independently configurable execution instances.
pub const NUM_INSTANCES: usize = 2;

/// Byte stride between per-instance register blocks.
pub const INSTANCE_STRIDE: usize = 0x100;

// ── Per-instance configuration registers ─────────────────────────────────────

/// Requested/effective vector length in elements. The hardware clamps the
/// host-requested value to its maximum and echoes the effective value back.
pub const VL: usize = 0x00;

/// Element type selector — see [`crate::vtype`] for encodings.
pub const VTYPE: usize = 0x04;

/// Generic kernel argument slots (fixed arity of four).
pub const ARG0: usize = 0x08;
/// Second argument slot.
pub const ARG1: usize = 0x0C;
/// Third argument slot.
pub const ARG2: usize = 0x10;
/// Fourth argument slot.
pub const ARG3: usize = 0x14;

/// Scratch register — kernel-private word, also used as the kernel entry
/// offset into instruction memory.
pub const SCRATCH: usize = 0x18;

// ── Status and control ───────────────────────────────────────────────────────

/// Instance status register.
pub const STATUS: usize = 0x20;

/// Instance control register — write [`control::START`] to begin execution.
pub const CONTROL: usize = 0x24;

// ── Kernel instruction memory ────────────────────────────────────────────────

/// Base offset of the instance-shared kernel instruction memory.
pub const IMEM_BASE: usize = 0x1000;

/// Instruction memory size in 32-bit words.
pub const IMEM_WORDS: usize = 1024;

/// Status register bit definitions.
pub mod status {
    /// Instance idle, ready for configuration.
    pub const IDLE: u32 = 1 << 0;
    /// Kernel currently executing.
    pub const RUNNING: u32 = 1 << 1;
    /// Last kernel completed; results readable.
    pub const DONE: u32 = 1 << 2;
    /// Error raised during last operation.
    pub const ERROR: u32 = 1 << 3;
}

/// Control register bit definitions.
pub mod control {
    /// Trigger kernel execution.
    pub const START: u32 = 1 << 0;
    /// Soft reset of the instance.
    pub const RESET: u32 = 1 << 1;
    /// Enable completion interrupt delivery.
    pub const IRQ_EN: u32 = 1 << 2;
}

/// Byte offset of a register within the block of instance `n`.
#[must_use]
pub const fn instance_offset(instance: usize, reg: usize) -> usize {
    instance * INSTANCE_STRIDE + reg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_offsets_non_overlapping() {
        assert_ne!(VL, VTYPE);
        assert_ne!(SCRATCH, STATUS);
        assert_ne!(STATUS, CONTROL);
        assert_ne!(ARG0, ARG3);
    }

    #[test]
    fn arg_slots_are_contiguous_words() {
        assert_eq!(ARG1, ARG0 + 4);
        assert_eq!(ARG2, ARG1 + 4);
        assert_eq!(ARG3, ARG2 + 4);
    }

    #[test]
    fn instance_blocks_do_not_alias() {
        assert!(instance_offset(0, CONTROL) < instance_offset(1, VL));
        assert!(instance_offset(NUM_INSTANCES - 1, CONTROL) < IMEM_BASE);
    }
}
