//! Element-type (`VTYPE`) encodings.
//!
//! The `VTYPE` register selects the element width the vector unit operates
//! on. Encodings follow the RISC-V vector SEW field: `e8 = 0`, `e16 = 1`,
//! `e32 = 2`. Sign interpretation is a property of the data-channel move
//! (sign- vs zero-extension), not of the register itself.

/// Element type held in a vector register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElemType {
    /// 8-bit elements (`e8`).
    Int8,
    /// 16-bit elements (`e16`).
    Int16,
    /// 32-bit elements (`e32`).
    Int32,
}

impl ElemType {
    /// `VTYPE` register encoding for this element type.
    #[must_use]
    pub const fn encoding(self) -> u32 {
        match self {
            Self::Int8 => 0,
            Self::Int16 => 1,
            Self::Int32 => 2,
        }
    }

    /// Decode a `VTYPE` register value. Returns `None` for reserved encodings.
    #[must_use]
    pub const fn from_encoding(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(Self::Int8),
            1 => Some(Self::Int16),
            2 => Some(Self::Int32),
            _ => None,
        }
    }

    /// Element width in bytes.
    #[must_use]
    pub const fn width_bytes(self) -> usize {
        match self {
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int32 => 4,
        }
    }
}

impl std::fmt::Display for ElemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int8 => write!(f, "e8"),
            Self::Int16 => write!(f, "e16"),
            Self::Int32 => write!(f, "e32"),
        }
    }
}
