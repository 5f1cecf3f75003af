//! Simulated vector register bank.
//!
//! One bank per execution instance: an addressable ordered sequence of
//! fixed-count vector registers, each `vl` elements long. Lanes are stored
//! widened to `i32`; the declared element width and sign are applied at the
//! data-channel boundary (see [`crate::channel`]), so in-register
//! comparisons behave exactly as the configured type demands.
//!
//! Register indices outside `[0, vreg_count)` are rejected — never
//! silently wrapped or truncated.

use crate::error::{CarusError, Result};

/// Vector register bank of one NM-Carus instance.
#[derive(Debug, Clone)]
pub struct VectorRegisterBank {
    vl: usize,
    regs: Vec<Vec<i32>>,
}

impl VectorRegisterBank {
    /// Create a zeroed bank of `vreg_count` registers, `vl` elements each.
    #[must_use]
    pub fn new(vreg_count: usize, vl: usize) -> Self {
        Self {
            vl,
            regs: vec![vec![0; vl]; vreg_count],
        }
    }

    /// Effective vector length in elements.
    #[must_use]
    pub const fn vl(&self) -> usize {
        self.vl
    }

    /// Number of registers in the bank.
    #[must_use]
    pub fn vreg_count(&self) -> usize {
        self.regs.len()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.regs.len() {
            return Err(CarusError::precondition(format!(
                "vector register v{index} out of range (bank has {})",
                self.regs.len()
            )));
        }
        Ok(())
    }

    /// Borrow register `index`.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` if `index` is outside the bank.
    pub fn reg(&self, index: usize) -> Result<&[i32]> {
        self.check_index(index)?;
        Ok(&self.regs[index])
    }

    /// Overwrite register `index` with `lanes` (padded with zeros to `vl`).
    ///
    /// # Errors
    ///
    /// Returns `Precondition` if `index` is outside the bank or `lanes`
    /// is longer than `vl`.
    pub fn write_reg(&mut self, index: usize, lanes: &[i32]) -> Result<()> {
        self.check_index(index)?;
        if lanes.len() > self.vl {
            return Err(CarusError::precondition(format!(
                "register write of {} lanes exceeds vl={}",
                lanes.len(),
                self.vl
            )));
        }
        self.regs[index][..lanes.len()].copy_from_slice(lanes);
        self.regs[index][lanes.len()..].fill(0);
        Ok(())
    }

    /// Read `count` lanes starting at flat element `offset`.
    ///
    /// Flat addressing treats the bank as `vreg_count * vl` consecutive
    /// lanes: register `offset / vl`, lane `offset % vl`.
    ///
    /// # Errors
    ///
    /// Returns `Transfer` if the range runs past the end of the bank.
    pub fn read_lanes(&self, offset: usize, count: usize) -> Result<Vec<i32>> {
        self.check_range(offset, count)?;
        let mut out = Vec::with_capacity(count);
        for i in offset..offset + count {
            out.push(self.regs[i / self.vl][i % self.vl]);
        }
        Ok(out)
    }

    /// Write `lanes` starting at flat element `offset`.
    ///
    /// # Errors
    ///
    /// Returns `Transfer` if the range runs past the end of the bank.
    pub fn write_lanes(&mut self, offset: usize, lanes: &[i32]) -> Result<()> {
        self.check_range(offset, lanes.len())?;
        for (i, &lane) in lanes.iter().enumerate() {
            let at = offset + i;
            self.regs[at / self.vl][at % self.vl] = lane;
        }
        Ok(())
    }

    fn check_range(&self, offset: usize, count: usize) -> Result<()> {
        let capacity = self.regs.len() * self.vl;
        if self.vl == 0 || offset + count > capacity {
            return Err(CarusError::transfer(format!(
                "lane range {offset}..{} exceeds bank capacity {capacity}",
                offset + count
            )));
        }
        Ok(())
    }
}
