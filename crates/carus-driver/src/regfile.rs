//! Configuration register file, keyed by symbolic name.
//!
//! The hardware exposes the per-instance configuration block at fixed byte
//! offsets (`carus_chip::regs`); the driver addresses it symbolically so
//! the same protocol code drives a memory-mapped instance or the software
//! model. Status and control are not part of this set — they are reached
//! through the backend's launch/poll operations, never written directly by
//! the host.

use carus_chip::regs;

/// Host-writable configuration registers of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfgReg {
    /// Vector length in elements (clamped by hardware, echoed back).
    Vl,
    /// Element type selector.
    Vtype,
    /// Generic argument slot 0.
    Arg0,
    /// Generic argument slot 1.
    Arg1,
    /// Generic argument slot 2.
    Arg2,
    /// Generic argument slot 3.
    Arg3,
    /// Scratch register.
    Scratch,
}

impl CfgReg {
    /// Number of host-writable registers.
    pub const COUNT: usize = 7;

    /// Argument slot `n` (`0..=3`).
    #[must_use]
    pub const fn arg(n: usize) -> Option<Self> {
        match n {
            0 => Some(Self::Arg0),
            1 => Some(Self::Arg1),
            2 => Some(Self::Arg2),
            3 => Some(Self::Arg3),
            _ => None,
        }
    }

    /// Hardware byte offset within the instance register block.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::Vl => regs::VL,
            Self::Vtype => regs::VTYPE,
            Self::Arg0 => regs::ARG0,
            Self::Arg1 => regs::ARG1,
            Self::Arg2 => regs::ARG2,
            Self::Arg3 => regs::ARG3,
            Self::Scratch => regs::SCRATCH,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Vl => 0,
            Self::Vtype => 1,
            Self::Arg0 => 2,
            Self::Arg1 => 3,
            Self::Arg2 => 4,
            Self::Arg3 => 5,
            Self::Scratch => 6,
        }
    }
}

/// One instance's configuration register file.
///
/// Written by the host before launch, read once by the kernel at entry,
/// immutable for the duration of one invocation.
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    words: [u32; CfgReg::COUNT],
}

impl RegisterFile {
    /// All-zero register file (reset state).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: [0; CfgReg::COUNT],
        }
    }

    /// Read a register.
    #[must_use]
    pub const fn read(&self, reg: CfgReg) -> u32 {
        self.words[reg.index()]
    }

    /// Write a register.
    pub fn write(&mut self, reg: CfgReg, value: u32) {
        self.words[reg.index()] = value;
    }

    /// The four argument slots as an array.
    #[must_use]
    pub const fn args(&self) -> [u32; 4] {
        [
            self.read(CfgReg::Arg0),
            self.read(CfgReg::Arg1),
            self.read(CfgReg::Arg2),
            self.read(CfgReg::Arg3),
        ]
    }
}
