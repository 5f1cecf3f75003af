//! Backend abstraction for NM-Carus transports.
//!
//! The offload protocol in [`crate::offload`] is transport-agnostic: it
//! drives any type that can load kernel images, write the configuration
//! register file, move operands, and report instance completion. The
//! software model implements this trait in-tree; a memory-mapped instance
//! would implement the same seam.

use bytes::Bytes;
use carus_chip::kernels::KernelId;
use std::fmt::Debug;

use crate::capabilities::Capabilities;
use crate::error::{CarusError, Result};
use crate::regfile::CfgReg;

/// Device-level operations one NM-Carus transport provides.
pub trait CarusBackend: Debug + Send {
    /// Deployment capabilities.
    fn capabilities(&self) -> &Capabilities;

    /// Load a kernel image into instruction memory. Idempotent; the image
    /// stays resident across invocations.
    ///
    /// # Errors
    ///
    /// Returns error if the image does not fit instruction memory.
    fn load_kernel(&mut self, kernel: KernelId) -> Result<()>;

    /// Whether a kernel image is resident.
    fn is_resident(&self, kernel: KernelId) -> bool;

    /// Write one configuration register of an instance. Writes to `Vl`
    /// are clamped by the hardware; read the register back for the
    /// effective value.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown instance or a reserved `Vtype` value.
    fn write_cfg(&mut self, instance: usize, reg: CfgReg, value: u32) -> Result<()>;

    /// Read one configuration register of an instance.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown instance.
    fn read_cfg(&self, instance: usize, reg: CfgReg) -> Result<u32>;

    /// Move a host buffer into instance lanes (data channel,
    /// host→device). Complete on return.
    ///
    /// # Errors
    ///
    /// Returns error if the element range does not fit the bank or the
    /// buffer length disagrees with `elem_count`.
    fn stage(
        &mut self,
        instance: usize,
        data: &[u8],
        elem_count: usize,
        dest_offset: usize,
        sign_extend: bool,
    ) -> Result<()>;

    /// Move instance lanes back into a host buffer (data channel,
    /// device→host). Reads do not disturb the bank.
    ///
    /// # Errors
    ///
    /// Returns error if the element range does not fit the bank.
    fn retrieve(&self, instance: usize, elem_count: usize, src_offset: usize) -> Result<Bytes>;

    /// Trigger execution of a resident kernel on an instance.
    ///
    /// # Errors
    ///
    /// Returns error if the kernel is not resident or its arguments
    /// violate a precondition.
    fn start(&mut self, instance: usize, kernel: KernelId) -> Result<()>;

    /// Non-destructive completion poll.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown instance.
    fn poll_done(&self, instance: usize) -> Result<bool>;

    /// Acknowledge completion: read-and-clear the completion flag.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown instance.
    fn ack_done(&mut self, instance: usize) -> Result<()>;

    /// Backend type for debugging.
    fn backend_type(&self) -> BackendType;
}

/// Backend type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Software model — pure CPU simulation, no hardware required.
    Software,

    /// Memory-mapped hardware instance.
    Mmio,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Software => write!(f, "Software (simulated)"),
            Self::Mmio => write!(f, "MMIO"),
        }
    }
}

/// Backend selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSelection {
    /// Automatically select best available.
    Auto,

    /// Force the software model.
    Software,

    /// Force a memory-mapped hardware instance.
    Mmio,
}

/// Select a backend based on availability.
///
/// # Errors
///
/// Returns a configuration error if the requested backend is unavailable.
pub fn select_backend(selection: BackendSelection) -> Result<Box<dyn CarusBackend>> {
    use crate::backends::software::SoftwareBackend;

    match selection {
        BackendSelection::Auto | BackendSelection::Software => {
            tracing::info!("Using software backend");
            Ok(Box::new(SoftwareBackend::new()))
        }

        BackendSelection::Mmio => Err(CarusError::configuration(
            "no memory-mapped NM-Carus instance available in this build",
        )),
    }
}
