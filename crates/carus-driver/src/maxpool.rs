//! Max-pooling reduction over a register-resident matrix.
//!
//! The input matrix A lives in registers `v0..rows(A)`, one row per
//! register, row length `vl = cols(A)`. The pooled output R is produced in
//! registers `v16..16+rows(R)`. Per output row `i`, three phases:
//!
//! 1. **Column-wise max** — elementwise max of the `pool` consecutive input
//!    rows starting at `i * stride`, into a working vector.
//! 2. **Sliding row max** — elementwise max of the working vector with
//!    itself shifted left by `1..pool-1` lanes, so lane `k * stride` holds
//!    the max of the window starting at column `k * stride`.
//! 3. **Gather/compaction** — copy lane `k * stride` to lane `k`, packing
//!    the strided results contiguously. The hardware has no indirect vector
//!    addressing, so this is an explicit element loop; it runs
//!    unconditionally, for `stride == 1` included.
//!
//! The phases are pure reductions and shuffles — branch-free per element;
//! control flow only loops over `rows(R)`, `pool`, and `cols(R)`. All
//! preconditions are validated in [`PoolParams`] before launch; the phases
//! themselves have no recoverable error paths beyond register bounds.

use carus_chip::bank::OUTPUT_BLOCK_BASE;

use crate::bank::VectorRegisterBank;
use crate::error::{CarusError, Result};

/// Validated pooling parameters.
///
/// Same window size and stride on both axes. `pool >= 2` and exact output
/// dimensions are enforced at construction — the undefined firmware
/// behavior for degenerate windows and non-integral dimensions is rejected
/// here instead of mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolParams {
    /// Pooling window edge length.
    pub pool: usize,
    /// Window stride on both axes.
    pub stride: usize,
    /// Output rows, `(rows(A) - pool) / stride + 1`.
    pub rows_r: usize,
    /// Output columns, `(cols(A) - pool) / stride + 1`.
    pub cols_r: usize,
}

impl PoolParams {
    /// Derive and validate parameters for an input matrix.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` if `pool < 2`, `stride < 1`, the matrix is
    /// smaller than the window, or either output dimension is non-integral.
    pub fn for_input(rows_a: usize, cols_a: usize, pool: usize, stride: usize) -> Result<Self> {
        if pool < 2 {
            return Err(CarusError::precondition(format!(
                "pool size {pool} < 2"
            )));
        }
        if stride < 1 {
            return Err(CarusError::precondition("stride must be >= 1"));
        }
        if rows_a < pool || cols_a < pool {
            return Err(CarusError::precondition(format!(
                "{rows_a}x{cols_a} input smaller than {pool}x{pool} window"
            )));
        }
        if (rows_a - pool) % stride != 0 || (cols_a - pool) % stride != 0 {
            return Err(CarusError::precondition(format!(
                "output dimensions not integral for {rows_a}x{cols_a}, pool={pool}, stride={stride}"
            )));
        }
        Ok(Self {
            pool,
            stride,
            rows_r: (rows_a - pool) / stride + 1,
            cols_r: (cols_a - pool) / stride + 1,
        })
    }

    /// Reconstruct parameters from the four kernel argument slots.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` under the same rules as [`Self::for_input`],
    /// with `cols(A)` taken from the configured vector length.
    pub fn from_args(args: [u32; 4], vl: usize) -> Result<Self> {
        let [pool, stride, rows_r, cols_r] = args.map(|a| a as usize);
        if rows_r == 0 || cols_r == 0 {
            return Err(CarusError::precondition("output dimensions must be non-zero"));
        }
        let rows_a = (rows_r - 1)
            .checked_mul(stride)
            .and_then(|v| v.checked_add(pool))
            .ok_or_else(|| CarusError::precondition("input row count overflows"))?;
        let derived = Self::for_input(rows_a, vl, pool, stride)?;
        if derived.cols_r != cols_r {
            return Err(CarusError::precondition(format!(
                "declared cols(R)={cols_r} does not match vl={vl} (expected {})",
                derived.cols_r
            )));
        }
        Ok(derived)
    }

    /// Input rows implied by the parameters.
    #[must_use]
    pub const fn input_rows(&self) -> usize {
        (self.rows_r - 1) * self.stride + self.pool
    }

    /// Check that input and output blocks fit the bank and stay disjoint.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` if the input block would overlap the output
    /// block or the output block would run past the bank.
    pub fn check_register_occupancy(&self, vreg_count: usize) -> Result<()> {
        if self.input_rows() > OUTPUT_BLOCK_BASE {
            return Err(CarusError::precondition(format!(
                "{} input rows overlap the output block at v{OUTPUT_BLOCK_BASE}",
                self.input_rows()
            )));
        }
        if OUTPUT_BLOCK_BASE + self.rows_r > vreg_count {
            return Err(CarusError::precondition(format!(
                "{} output rows exceed the register bank",
                self.rows_r
            )));
        }
        Ok(())
    }
}

/// Phase 1: elementwise max of `pool` consecutive rows starting at
/// `first_row`.
pub fn column_max(
    bank: &VectorRegisterBank,
    first_row: usize,
    pool: usize,
) -> Result<Vec<i32>> {
    let mut acc = bank.reg(first_row)?.to_vec();
    for di in 1..pool {
        for (lane, &v) in acc.iter_mut().zip(bank.reg(first_row + di)?) {
            *lane = (*lane).max(v);
        }
    }
    Ok(acc)
}

/// Phase 2: sliding max of a row with itself shifted left by `1..pool-1`.
///
/// Each shift compares against the original vector, so lane `k` ends up
/// holding `max(row[k..k+pool])` wherever the full window fits.
pub fn sliding_row_max(row: &[i32], pool: usize) -> Vec<i32> {
    let mut acc = row.to_vec();
    for shift in 1..pool {
        for k in 0..row.len().saturating_sub(shift) {
            acc[k] = acc[k].max(row[k + shift]);
        }
    }
    acc
}

/// Phase 3: pack lanes `0, stride, 2*stride, ..` contiguously.
///
/// Lane 0 is already in place; lanes `1..cols_r` gather from `k * stride`.
pub fn compact_strided(row: &[i32], stride: usize, cols_r: usize) -> Vec<i32> {
    (0..cols_r).map(|k| row[k * stride]).collect()
}

/// Run the full reduction, writing `rows(R)` packed rows into the output
/// block at `v16`.
///
/// # Errors
///
/// Returns `Precondition` if the parameters do not fit the bank; the
/// caller is expected to have validated them before launch.
pub fn run(bank: &mut VectorRegisterBank, p: &PoolParams) -> Result<()> {
    p.check_register_occupancy(bank.vreg_count())?;
    for i in 0..p.rows_r {
        let working = column_max(bank, i * p.stride, p.pool)?;
        let slid = sliding_row_max(&working, p.pool);
        let packed = compact_strided(&slid, p.stride, p.cols_r);
        bank.write_reg(OUTPUT_BLOCK_BASE + i, &packed)?;
    }
    Ok(())
}
