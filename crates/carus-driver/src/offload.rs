//! Offload protocol: configure → stage → launch → wait → retrieve.
//!
//! Each execution slot walks the state machine
//! `Idle → Configured → Running → Done → Idle`. Staging is only legal in
//! `Configured`, launching only from `Configured`, result retrieval only in
//! `Done`; an out-of-order call is rejected with a `ProtocolViolation` and
//! leaves registers and memory untouched. The register bank and
//! configuration registers of a slot are exclusively owned by the running
//! kernel between `launch` and the matching `wait_done`.
//!
//! `wait_done` is the sole blocking operation — a bounded spin on the
//! completion flag. A timed-out offload is fatal to that request; the slot
//! re-arms with a fresh `configure`, and other slots are unaffected.

use bytes::Bytes;
use carus_chip::kernels::KernelId;
use carus_chip::vtype::ElemType;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::backend::{select_backend, BackendSelection, BackendType, CarusBackend};
use crate::capabilities::Capabilities;
use crate::error::{CarusError, Result};
use crate::regfile::CfgReg;

/// Execution slot state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Unconfigured, ready for `configure`.
    Idle,
    /// Configured; operands may be staged, `launch` is legal.
    Configured,
    /// Kernel executing; only `wait_done` is legal.
    Running,
    /// Completed; results readable, `configure` recycles the slot.
    Done,
}

impl std::fmt::Display for SlotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Configured => write!(f, "Configured"),
            Self::Running => write!(f, "Running"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// Configuration of one kernel invocation, immutable once written.
#[derive(Debug, Clone, Copy)]
pub struct KernelConfig {
    /// Kernel to execute.
    pub kernel: KernelId,
    /// Effective vector length in elements (clamped echo from hardware).
    pub vl: usize,
    /// Element type.
    pub elem: ElemType,
    /// Scratch register value.
    pub scratch: u32,
}

#[derive(Debug)]
struct Slot {
    state: SlotState,
    config: Option<KernelConfig>,
}

/// Handle to an NM-Carus deployment, tracking per-slot protocol state.
#[derive(Debug)]
pub struct CarusDevice {
    backend: Box<dyn CarusBackend>,
    slots: Vec<Slot>,
}

impl CarusDevice {
    /// Wrap a backend.
    #[must_use]
    pub fn new(backend: Box<dyn CarusBackend>) -> Self {
        let count = backend.capabilities().instance_count;
        info!(
            "Opened NM-Carus device: {} backend, {count} slots",
            backend.backend_type()
        );
        let slots = (0..count)
            .map(|_| Slot {
                state: SlotState::Idle,
                config: None,
            })
            .collect();
        Self { backend, slots }
    }

    /// Open a device through backend selection.
    ///
    /// # Errors
    ///
    /// Returns error if no backend matching the selection is available.
    pub fn open(selection: BackendSelection) -> Result<Self> {
        Ok(Self::new(select_backend(selection)?))
    }

    /// Deployment capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        self.backend.capabilities()
    }

    /// Backend type in use.
    #[must_use]
    pub fn backend_type(&self) -> BackendType {
        self.backend.backend_type()
    }

    /// Number of execution slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Current state of a slot.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown slot.
    pub fn slot_state(&self, slot: usize) -> Result<SlotState> {
        Ok(self.slot(slot)?.state)
    }

    /// Configuration of a slot, if configured.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown slot.
    pub fn slot_config(&self, slot: usize) -> Result<Option<KernelConfig>> {
        Ok(self.slot(slot)?.config)
    }

    /// Ensure a kernel image is resident in instruction memory.
    ///
    /// # Errors
    ///
    /// Returns error if the image does not fit instruction memory.
    pub fn load_kernel(&mut self, kernel: KernelId) -> Result<()> {
        self.backend.load_kernel(kernel)
    }

    /// Configure a slot for one kernel invocation.
    ///
    /// Legal from `Idle` or `Done` (recycling the slot). The requested
    /// vector length is clamped by the hardware; the effective value is
    /// returned and recorded.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the slot is configured or running;
    /// `KernelNotResident` if the image was never loaded; configuration
    /// error for a zero vector length.
    pub fn configure(
        &mut self,
        slot: usize,
        kernel: KernelId,
        vl: usize,
        elem: ElemType,
        scratch: u32,
    ) -> Result<usize> {
        self.expect_state(slot, &[SlotState::Idle, SlotState::Done], "Idle or Done")?;
        if !self.backend.is_resident(kernel) {
            return Err(CarusError::KernelNotResident { kernel });
        }
        if vl == 0 {
            return Err(CarusError::configuration("vector length must be non-zero"));
        }

        self.backend.write_cfg(slot, CfgReg::Vtype, elem.encoding())?;
        self.backend.write_cfg(slot, CfgReg::Vl, vl as u32)?;
        self.backend.write_cfg(slot, CfgReg::Scratch, scratch)?;
        for n in 0..4 {
            self.backend
                .write_cfg(slot, CfgReg::arg(n).expect("arg slot"), 0)?;
        }

        let effective = self.backend.read_cfg(slot, CfgReg::Vl)? as usize;
        let config = KernelConfig {
            kernel,
            vl: effective,
            elem,
            scratch,
        };
        let entry = self.slot_mut(slot)?;
        entry.state = SlotState::Configured;
        entry.config = Some(config);
        debug!("slot {slot}: configured {kernel}, vl={vl} -> {effective}, {elem}");
        Ok(effective)
    }

    /// Write the four kernel argument slots. Legal only in `Configured`.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` outside `Configured`.
    pub fn set_args(&mut self, slot: usize, args: [u32; 4]) -> Result<()> {
        self.expect_state(slot, &[SlotState::Configured], "Configured")?;
        for (n, value) in args.into_iter().enumerate() {
            self.backend
                .write_cfg(slot, CfgReg::arg(n).expect("arg slot"), value)?;
        }
        Ok(())
    }

    /// Stage a host operand buffer into the slot's lanes.
    ///
    /// Legal only in `Configured`. The move is complete on return; the
    /// buffer is immediately reusable.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` outside `Configured`; transfer error if the
    /// element range does not fit the bank.
    pub fn stage_operand(
        &mut self,
        slot: usize,
        data: &[u8],
        elem_count: usize,
        dest_offset: usize,
        sign_extend: bool,
    ) -> Result<()> {
        self.expect_state(slot, &[SlotState::Configured], "Configured")?;
        self.backend
            .stage(slot, data, elem_count, dest_offset, sign_extend)
    }

    /// Trigger execution. Legal only from `Configured`; the slot's register
    /// bank belongs to the kernel until `wait_done` observes completion.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` outside `Configured`; precondition error if the
    /// kernel rejects its arguments.
    pub fn launch(&mut self, slot: usize) -> Result<()> {
        self.expect_state(slot, &[SlotState::Configured], "Configured")?;
        let kernel = self
            .slot(slot)?
            .config
            .as_ref()
            .expect("configured slot has a config")
            .kernel;
        self.backend.start(slot, kernel)?;
        self.slot_mut(slot)?.state = SlotState::Running;
        debug!("slot {slot}: launched {kernel}");
        Ok(())
    }

    /// Block until the slot reports completion, bounded by `timeout`.
    ///
    /// Returns the elapsed wait. Already-`Done` slots return immediately.
    /// On timeout the slot stays `Running` and the request is fatal; other
    /// slots are unaffected.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` outside `Running`/`Done`; `Timeout` if the
    /// bound is exceeded.
    pub fn wait_done(&mut self, slot: usize, timeout: Duration) -> Result<Duration> {
        if self.slot(slot)?.state == SlotState::Done {
            return Ok(Duration::ZERO);
        }
        self.expect_state(slot, &[SlotState::Running], "Running or Done")?;

        let start = Instant::now();
        loop {
            if self.backend.poll_done(slot)? {
                self.backend.ack_done(slot)?;
                self.slot_mut(slot)?.state = SlotState::Done;
                let elapsed = start.elapsed();
                debug!("slot {slot}: done after {elapsed:?}");
                return Ok(elapsed);
            }
            if start.elapsed() >= timeout {
                return Err(CarusError::Timeout {
                    duration_ms: timeout.as_millis() as u64,
                });
            }
            std::hint::spin_loop();
        }
    }

    /// Retrieve results from the slot's lanes. Legal only in `Done`;
    /// repeated retrieval without an intervening launch yields identical
    /// data.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` outside `Done`; transfer error if the element
    /// range does not fit the bank.
    pub fn retrieve_result(
        &mut self,
        slot: usize,
        elem_count: usize,
        src_offset: usize,
    ) -> Result<Bytes> {
        self.expect_state(slot, &[SlotState::Done], "Done")?;
        self.backend.retrieve(slot, elem_count, src_offset)
    }

    /// Return a `Done` slot to `Idle` without reconfiguring.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` outside `Done`.
    pub fn release(&mut self, slot: usize) -> Result<()> {
        self.expect_state(slot, &[SlotState::Done], "Done")?;
        let entry = self.slot_mut(slot)?;
        entry.state = SlotState::Idle;
        entry.config = None;
        Ok(())
    }

    fn slot(&self, slot: usize) -> Result<&Slot> {
        self.slots.get(slot).ok_or_else(|| {
            CarusError::configuration(format!(
                "slot {slot} out of range (have {})",
                self.slots.len()
            ))
        })
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut Slot> {
        let count = self.slots.len();
        self.slots.get_mut(slot).ok_or_else(|| {
            CarusError::configuration(format!("slot {slot} out of range (have {count})"))
        })
    }

    fn expect_state(
        &self,
        slot: usize,
        legal: &[SlotState],
        expected: &'static str,
    ) -> Result<()> {
        let actual = self.slot(slot)?.state;
        if legal.contains(&actual) {
            Ok(())
        } else {
            Err(CarusError::protocol(slot, expected, actual))
        }
    }
}
