// SPDX-License-Identifier: AGPL-3.0-only

//! Software (simulated NM-Carus) backend.
//!
//! Implements [`CarusBackend`] as a pure CPU model of the vector unit:
//! per-instance configuration register files, vector register banks, a
//! resident kernel set, and synchronous kernel execution. Results are
//! lane-exact against the hardware's integer max/add/xor semantics, which
//! makes this backend the ground truth for protocol and kernel tests and
//! lets everything run without silicon.
//!
//! Execution happens inside [`CarusBackend::start`]; completion is still
//! delivered through the per-instance completion flag, so callers observe
//! the same launch → poll → acknowledge sequence a hardware instance
//! produces.

use bytes::Bytes;
use carus_chip::bank::{OUTPUT_BLOCK_BASE, VREG_COUNT};
use carus_chip::kernels::{image, KernelId};
use carus_chip::vtype::ElemType;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::backend::{BackendType, CarusBackend};
use crate::bank::VectorRegisterBank;
use crate::capabilities::Capabilities;
use crate::channel;
use crate::completion::CompletionFlag;
use crate::error::{CarusError, Result};
use crate::maxpool::{self, PoolParams};
use crate::regfile::{CfgReg, RegisterFile};

#[derive(Debug)]
struct InstanceState {
    regfile: RegisterFile,
    bank: VectorRegisterBank,
    done: CompletionFlag,
    /// Fault injection: a stalled instance accepts a launch but never
    /// completes. Used to exercise the timeout path.
    stalled: bool,
}

impl InstanceState {
    fn new() -> Self {
        Self {
            regfile: RegisterFile::new(),
            bank: VectorRegisterBank::new(VREG_COUNT, 0),
            done: CompletionFlag::new(),
            stalled: false,
        }
    }

    fn elem_type(&self) -> Result<ElemType> {
        ElemType::from_encoding(self.regfile.read(CfgReg::Vtype)).ok_or_else(|| {
            CarusError::configuration(format!(
                "reserved vtype encoding {:#x}",
                self.regfile.read(CfgReg::Vtype)
            ))
        })
    }
}

/// Simulated NM-Carus deployment.
#[derive(Debug)]
pub struct SoftwareBackend {
    caps: Capabilities,
    resident: HashSet<KernelId>,
    instances: Vec<InstanceState>,
}

impl SoftwareBackend {
    /// Create a simulated deployment with the modeled silicon capabilities.
    #[must_use]
    pub fn new() -> Self {
        let caps = Capabilities::of_model();
        let instances = (0..caps.instance_count).map(|_| InstanceState::new()).collect();
        Self {
            caps,
            resident: HashSet::new(),
            instances,
        }
    }

    /// Fault injection: stall or un-stall an instance. A stalled instance
    /// accepts launches but never signals completion.
    pub fn stall_instance(&mut self, instance: usize, stalled: bool) {
        if let Some(state) = self.instances.get_mut(instance) {
            state.stalled = stalled;
        }
    }

    /// Inspect one vector register of an instance (test observability).
    ///
    /// # Errors
    ///
    /// Returns error for an unknown instance or register index.
    pub fn peek_vreg(&self, instance: usize, index: usize) -> Result<Vec<i32>> {
        Ok(self.instance(instance)?.bank.reg(index)?.to_vec())
    }

    fn instance(&self, instance: usize) -> Result<&InstanceState> {
        self.instances.get(instance).ok_or_else(|| {
            CarusError::configuration(format!(
                "instance {instance} out of range (have {})",
                self.instances.len()
            ))
        })
    }

    fn instance_mut(&mut self, instance: usize) -> Result<&mut InstanceState> {
        let count = self.instances.len();
        self.instances.get_mut(instance).ok_or_else(|| {
            CarusError::configuration(format!(
                "instance {instance} out of range (have {count})"
            ))
        })
    }

    fn execute(state: &mut InstanceState, kernel: KernelId) -> Result<()> {
        let vl = state.bank.vl();
        let args = state.regfile.args();

        match kernel {
            KernelId::MaxPool => {
                let params = PoolParams::from_args(args, vl)?;
                maxpool::run(&mut state.bank, &params)?;
            }
            KernelId::Add | KernelId::Xor => {
                let n = elementwise_count(args[0], vl)?;
                let a = state.bank.reg(0)?.to_vec();
                let b = state.bank.reg(1)?.to_vec();
                let out: Vec<i32> = a
                    .iter()
                    .zip(&b)
                    .take(n)
                    .map(|(&x, &y)| match kernel {
                        KernelId::Add => x.wrapping_add(y),
                        _ => x ^ y,
                    })
                    .collect();
                state.bank.write_reg(OUTPUT_BLOCK_BASE, &out)?;
            }
            KernelId::Relu => {
                let n = elementwise_count(args[0], vl)?;
                let out: Vec<i32> = state.bank.reg(0)?[..n].iter().map(|&x| x.max(0)).collect();
                state.bank.write_reg(OUTPUT_BLOCK_BASE, &out)?;
            }
        }
        Ok(())
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn elementwise_count(arg: u32, vl: usize) -> Result<usize> {
    let n = arg as usize;
    if n == 0 || n > vl {
        return Err(CarusError::precondition(format!(
            "element count {n} outside 1..={vl}"
        )));
    }
    Ok(n)
}

impl CarusBackend for SoftwareBackend {
    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn load_kernel(&mut self, kernel: KernelId) -> Result<()> {
        let img = image(kernel);
        if img.size_words() > self.caps.imem_words {
            return Err(CarusError::configuration(format!(
                "kernel {kernel} ({} words) exceeds instruction memory",
                img.size_words()
            )));
        }
        if self.resident.insert(kernel) {
            info!("Loaded kernel {kernel}: {} words", img.size_words());
        }
        Ok(())
    }

    fn is_resident(&self, kernel: KernelId) -> bool {
        self.resident.contains(&kernel)
    }

    fn write_cfg(&mut self, instance: usize, reg: CfgReg, value: u32) -> Result<()> {
        let caps = self.caps;
        let state = self.instance_mut(instance)?;

        match reg {
            CfgReg::Vl => {
                // The hardware clamps and reallocates the bank; a later
                // read of VL returns the effective length.
                let elem = state.elem_type()?;
                let effective = caps.clamp_vl(value as usize, elem);
                state.regfile.write(CfgReg::Vl, effective as u32);
                state.bank = VectorRegisterBank::new(caps.vreg_count, effective);
                debug!("instance {instance}: vl {value} -> effective {effective} ({elem})");
            }
            CfgReg::Vtype => {
                if ElemType::from_encoding(value).is_none() {
                    return Err(CarusError::configuration(format!(
                        "reserved vtype encoding {value:#x}"
                    )));
                }
                state.regfile.write(CfgReg::Vtype, value);
            }
            _ => state.regfile.write(reg, value),
        }
        Ok(())
    }

    fn read_cfg(&self, instance: usize, reg: CfgReg) -> Result<u32> {
        Ok(self.instance(instance)?.regfile.read(reg))
    }

    fn stage(
        &mut self,
        instance: usize,
        data: &[u8],
        elem_count: usize,
        dest_offset: usize,
        sign_extend: bool,
    ) -> Result<()> {
        let state = self.instance_mut(instance)?;
        let elem = state.elem_type()?;
        let lanes = channel::widen_to_lanes(data, elem, elem_count, sign_extend)?;
        state.bank.write_lanes(dest_offset, &lanes)?;
        debug!("instance {instance}: staged {elem_count} x {elem} at lane {dest_offset}");
        Ok(())
    }

    fn retrieve(&self, instance: usize, elem_count: usize, src_offset: usize) -> Result<Bytes> {
        let state = self.instance(instance)?;
        let elem = state.elem_type()?;
        let lanes = state.bank.read_lanes(src_offset, elem_count)?;
        Ok(channel::narrow_from_lanes(&lanes, elem))
    }

    fn start(&mut self, instance: usize, kernel: KernelId) -> Result<()> {
        if !self.resident.contains(&kernel) {
            return Err(CarusError::KernelNotResident { kernel });
        }
        let state = self.instance_mut(instance)?;
        if state.stalled {
            debug!("instance {instance}: stalled, {kernel} will never complete");
            return Ok(());
        }
        Self::execute(state, kernel)?;
        state.done.signal();
        debug!("instance {instance}: {kernel} complete");
        Ok(())
    }

    fn poll_done(&self, instance: usize) -> Result<bool> {
        Ok(self.instance(instance)?.done.is_set())
    }

    fn ack_done(&mut self, instance: usize) -> Result<()> {
        self.instance(instance)?.done.take();
        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Software
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(vl: u32, elem: ElemType) -> SoftwareBackend {
        let mut be = SoftwareBackend::new();
        be.write_cfg(0, CfgReg::Vtype, elem.encoding()).unwrap();
        be.write_cfg(0, CfgReg::Vl, vl).unwrap();
        be
    }

    #[test]
    fn vl_write_echoes_clamped_value() {
        let mut be = configured(8, ElemType::Int32);
        let max = be.capabilities().max_vl_elems(ElemType::Int32);
        be.write_cfg(0, CfgReg::Vl, (max + 1000) as u32).unwrap();
        assert_eq!(be.read_cfg(0, CfgReg::Vl).unwrap(), max as u32);
    }

    #[test]
    fn reserved_vtype_rejected() {
        let mut be = SoftwareBackend::new();
        assert!(be.write_cfg(0, CfgReg::Vtype, 9).is_err());
    }

    #[test]
    fn unknown_instance_rejected() {
        let mut be = SoftwareBackend::new();
        let n = be.capabilities().instance_count;
        assert!(be.write_cfg(n, CfgReg::Scratch, 0).is_err());
        assert!(be.poll_done(n).is_err());
    }

    #[test]
    fn launch_requires_resident_kernel() {
        let mut be = configured(4, ElemType::Int32);
        let err = be.start(0, KernelId::Add).unwrap_err();
        assert!(matches!(err, CarusError::KernelNotResident { .. }));
    }

    #[test]
    fn add_kernel_sums_lanes() {
        let mut be = configured(4, ElemType::Int32);
        be.load_kernel(KernelId::Add).unwrap();
        let a: Vec<u8> = [1i32, 2, 3, 4].iter().flat_map(|v| v.to_le_bytes()).collect();
        let b: Vec<u8> = [10i32, 20, 30, -4].iter().flat_map(|v| v.to_le_bytes()).collect();
        be.stage(0, &a, 4, 0, true).unwrap();
        be.stage(0, &b, 4, 4, true).unwrap();
        be.write_cfg(0, CfgReg::Arg0, 4).unwrap();
        be.start(0, KernelId::Add).unwrap();
        assert_eq!(
            be.peek_vreg(0, OUTPUT_BLOCK_BASE).unwrap(),
            vec![11, 22, 33, 0]
        );
    }

    #[test]
    fn relu_clamps_negative_lanes() {
        let mut be = configured(3, ElemType::Int8);
        be.load_kernel(KernelId::Relu).unwrap();
        be.stage(0, &[0x80, 0x05, 0xFF], 3, 0, true).unwrap();
        be.write_cfg(0, CfgReg::Arg0, 3).unwrap();
        be.start(0, KernelId::Relu).unwrap();
        assert_eq!(be.peek_vreg(0, OUTPUT_BLOCK_BASE).unwrap(), vec![0, 5, 0]);
    }

    #[test]
    fn stalled_instance_never_signals() {
        let mut be = configured(4, ElemType::Int32);
        be.load_kernel(KernelId::Relu).unwrap();
        be.write_cfg(0, CfgReg::Arg0, 4).unwrap();
        be.stall_instance(0, true);
        be.start(0, KernelId::Relu).unwrap();
        assert!(!be.poll_done(0).unwrap());
    }

    #[test]
    fn completion_flag_cleared_by_ack() {
        let mut be = configured(2, ElemType::Int32);
        be.load_kernel(KernelId::Relu).unwrap();
        be.write_cfg(0, CfgReg::Arg0, 2).unwrap();
        be.start(0, KernelId::Relu).unwrap();
        assert!(be.poll_done(0).unwrap());
        be.ack_done(0).unwrap();
        assert!(!be.poll_done(0).unwrap());
    }
}
