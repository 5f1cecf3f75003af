//! High-level max-pooling offload.
//!
//! Wraps one full configure → stage → launch → wait → retrieve cycle for a
//! row-major host matrix, with transfer and execution metrics. Shapes and
//! timeouts are derived from the pooling parameters — nothing is assumed
//! about the deployment beyond its reported capabilities.

use bytes::{Bytes, BytesMut};
use carus_chip::bank::OUTPUT_BLOCK_BASE;
use carus_chip::kernels::KernelId;
use carus_chip::vtype::ElemType;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{CarusError, Result};
use crate::maxpool::PoolParams;
use crate::offload::CarusDevice;

/// Configuration for one max-pooling offload.
#[derive(Debug, Clone, Copy)]
pub struct MaxPoolConfig {
    /// Validated pooling parameters.
    pub params: PoolParams,
    /// Input columns — becomes the vector length.
    pub cols_a: usize,
    /// Element type of the host matrix.
    pub elem: ElemType,
    /// Treat sub-word elements as signed when staging.
    pub sign_extend: bool,
    /// Bound for `wait_done`.
    pub timeout: Duration,
}

impl MaxPoolConfig {
    /// Derive a configuration from the input shape and window.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` for a degenerate window or non-integral
    /// output dimensions.
    pub fn new(
        rows_a: usize,
        cols_a: usize,
        pool: usize,
        stride: usize,
        elem: ElemType,
    ) -> Result<Self> {
        let params = PoolParams::for_input(rows_a, cols_a, pool, stride)?;
        let timeout = estimate_timeout(rows_a * cols_a * elem.width_bytes());
        debug!(
            "maxpool config: {rows_a}x{cols_a} pool={pool} stride={stride} -> {}x{}, timeout {timeout:?}",
            params.rows_r, params.cols_r
        );
        Ok(Self {
            params,
            cols_a,
            elem,
            sign_extend: true,
            timeout,
        })
    }

    /// Input size in bytes.
    #[must_use]
    pub const fn input_size_bytes(&self) -> usize {
        self.params.input_rows() * self.cols_a * self.elem.width_bytes()
    }

    /// Output size in bytes.
    #[must_use]
    pub const fn output_size_bytes(&self) -> usize {
        self.params.rows_r * self.params.cols_r * self.elem.width_bytes()
    }
}

/// Max-pooling offload executor.
#[derive(Debug)]
pub struct MaxPoolExecutor {
    config: MaxPoolConfig,
}

impl MaxPoolExecutor {
    /// Create an executor for one configuration.
    #[must_use]
    pub const fn new(config: MaxPoolConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &MaxPoolConfig {
        &self.config
    }

    /// Run one offload cycle on `slot` of `device`.
    ///
    /// `input` is the row-major matrix A, packed at the configured element
    /// width.
    ///
    /// # Errors
    ///
    /// Returns error if the input size disagrees with the configuration,
    /// the effective vector length is shorter than a matrix row, or any
    /// protocol step fails.
    pub fn run(&self, device: &mut CarusDevice, slot: usize, input: &[u8]) -> Result<MaxPoolResult> {
        let cfg = &self.config;
        if input.len() != cfg.input_size_bytes() {
            return Err(CarusError::transfer(format!(
                "input size mismatch: got {} bytes, expected {}",
                input.len(),
                cfg.input_size_bytes()
            )));
        }

        let start = Instant::now();
        let p = cfg.params;

        let effective_vl =
            device.configure(slot, KernelId::MaxPool, cfg.cols_a, cfg.elem, 0)?;
        if effective_vl < cfg.cols_a {
            return Err(CarusError::configuration(format!(
                "effective vl {effective_vl} shorter than matrix row ({})",
                cfg.cols_a
            )));
        }
        device.set_args(
            slot,
            [
                p.pool as u32,
                p.stride as u32,
                p.rows_r as u32,
                p.cols_r as u32,
            ],
        )?;

        // Rows are register-contiguous when vl == cols(A): one move covers
        // the whole input block.
        let stage_start = Instant::now();
        let elem_count = p.input_rows() * cfg.cols_a;
        device.stage_operand(slot, input, elem_count, 0, cfg.sign_extend)?;
        let stage_duration = stage_start.elapsed();

        device.launch(slot)?;
        let execute_duration = device.wait_done(slot, cfg.timeout)?;

        let retrieve_start = Instant::now();
        let mut output = BytesMut::with_capacity(cfg.output_size_bytes());
        for i in 0..p.rows_r {
            let row =
                device.retrieve_result(slot, p.cols_r, (OUTPUT_BLOCK_BASE + i) * effective_vl)?;
            output.extend_from_slice(&row);
        }
        let retrieve_duration = retrieve_start.elapsed();

        let total_duration = start.elapsed();
        info!(
            "maxpool complete: {}x{} -> {}x{} in {total_duration:?}",
            p.input_rows(),
            cfg.cols_a,
            p.rows_r,
            p.cols_r
        );

        Ok(MaxPoolResult {
            output: output.freeze(),
            rows: p.rows_r,
            cols: p.cols_r,
            stage_duration,
            execute_duration,
            retrieve_duration,
            total_duration,
        })
    }
}

/// Result of one max-pooling offload.
#[derive(Debug, Clone)]
pub struct MaxPoolResult {
    /// Row-major pooled matrix R, packed at the configured element width.
    pub output: Bytes,
    /// Output rows.
    pub rows: usize,
    /// Output columns.
    pub cols: usize,
    /// Operand staging duration.
    pub stage_duration: Duration,
    /// Launch-to-completion duration.
    pub execute_duration: Duration,
    /// Result retrieval duration.
    pub retrieve_duration: Duration,
    /// Whole-cycle duration.
    pub total_duration: Duration,
}

impl MaxPoolResult {
    /// Whole-cycle latency in microseconds.
    #[must_use]
    pub fn latency_us(&self) -> f64 {
        self.total_duration.as_secs_f64() * 1_000_000.0
    }
}

/// Estimate a wait bound from the input size: 100ms base plus 1ms per KiB.
const fn estimate_timeout(input_size_bytes: usize) -> Duration {
    Duration::from_millis(100 + (input_size_bytes / 1024) as u64)
}
