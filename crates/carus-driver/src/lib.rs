//! Host-side offload driver for the NM-Carus near-memory-compute vector
//! unit.
//!
//! NM-Carus executes small data-parallel kernels (max-pooling, add, relu,
//! xor) against a bank of vector registers, configured and launched by the
//! host over a memory-mapped register file and a DMA-like data channel.
//! This crate implements the host side of that contract and a lane-exact
//! software model of the unit.
//!
//! # Offload cycle
//!
//! ```text
//! load_kernel      — kernel image into instruction memory, once
//! configure        — slot: vl (clamped + echoed), vtype, scratch
//! set_args         — pool/stride/shape arguments
//! stage_operand    — host buffer into the vector register bank
//! launch           — slot owns its bank until completion
//! wait_done        — bounded spin on the completion flag
//! retrieve_result  — pooled matrix back to the host
//! ```
//!
//! Per slot, the protocol walks `Idle → Configured → Running → Done →
//! Idle`; any out-of-order call is a [`CarusError::ProtocolViolation`]
//! with no side effects.
//!
//! # Quick start
//!
//! ```
//! use carus_driver::prelude::*;
//!
//! # fn main() -> carus_driver::Result<()> {
//! let mut device = CarusDevice::open(BackendSelection::Software)?;
//! device.load_kernel(KernelId::MaxPool)?;
//!
//! let config = MaxPoolConfig::new(4, 4, 2, 2, ElemType::Int32)?;
//! let input: Vec<u8> = (1..=16i32).flat_map(|v| v.to_le_bytes()).collect();
//! let result = MaxPoolExecutor::new(config).run(&mut device, 0, &input)?;
//! assert_eq!(result.output.len(), 2 * 2 * 4);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

mod backend;
pub mod backends;
mod bank;
mod capabilities;
pub mod channel;
mod completion;
mod error;
pub mod maxpool;
mod offload;
mod regfile;

mod executor;

pub use backend::{select_backend, BackendSelection, BackendType, CarusBackend};
pub use backends::software::SoftwareBackend;
pub use bank::VectorRegisterBank;
pub use capabilities::Capabilities;
pub use completion::CompletionFlag;
pub use error::{CarusError, Result};
pub use executor::{MaxPoolConfig, MaxPoolExecutor, MaxPoolResult};
pub use maxpool::PoolParams;
pub use offload::{CarusDevice, KernelConfig, SlotState};
pub use regfile::{CfgReg, RegisterFile};

/// Silicon model re-exports.
pub mod chip {
    pub use carus_chip::bank::{MAX_VL_BYTES, OUTPUT_BLOCK_BASE, VREG_COUNT};
    pub use carus_chip::kernels::{image, KernelId, KernelImage};
    pub use carus_chip::regs;
    pub use carus_chip::vtype::ElemType;
}

/// Commonly used types.
pub mod prelude {
    pub use crate::chip::{ElemType, KernelId};
    pub use crate::{
        BackendSelection, Capabilities, CarusDevice, CarusError, MaxPoolConfig, MaxPoolExecutor,
        MaxPoolResult, PoolParams, Result, SlotState, SoftwareBackend,
    };
}
