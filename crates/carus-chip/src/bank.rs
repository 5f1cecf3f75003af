//! Vector register bank geometry.
//!
//! Each NM-Carus instance owns one bank of [`VREG_COUNT`] fixed-width vector
//! registers. The physical register width is [`MAX_VL_BYTES`]; the effective
//! vector length is configured at runtime through the `VL` register and
//! never exceeds `MAX_VL_BYTES / element width`.
//!
//! Matrix kernels place their input rows in the first contiguous block of
//! the bank and their output rows in a second block starting at
//! [`OUTPUT_BLOCK_BASE`], disjoint from the input block.

use crate::vtype::ElemType;

/// Number of vector registers per instance bank.
pub const VREG_COUNT: usize = 32;

/// Physical width of one vector register in bytes.
pub const MAX_VL_BYTES: usize = 1024;

/// First register of the output block used by matrix kernels.
pub const OUTPUT_BLOCK_BASE: usize = 16;

/// Maximum vector length in elements for a given element type.
#[must_use]
pub const fn max_vl_elems(elem: ElemType) -> usize {
    MAX_VL_BYTES / elem.width_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_block_inside_bank() {
        assert!(OUTPUT_BLOCK_BASE < VREG_COUNT);
        // Input and output blocks split the bank in half.
        assert_eq!(OUTPUT_BLOCK_BASE * 2, VREG_COUNT);
    }

    #[test]
    fn max_vl_scales_with_width() {
        assert_eq!(max_vl_elems(ElemType::Int8), MAX_VL_BYTES);
        assert_eq!(max_vl_elems(ElemType::Int32), MAX_VL_BYTES / 4);
    }
}
