//! Offload protocol conformance tests
//!
//! Exercise the per-slot state machine against the software backend:
//! out-of-order calls are rejected without side effects, read-back is
//! idempotent, slots do not alias, and a timed-out slot leaves the rest
//! of the device usable.

use std::time::Duration;

use carus_driver::chip::{ElemType, KernelId};
use carus_driver::{
    BackendSelection, CarusDevice, CarusError, MaxPoolConfig, MaxPoolExecutor, SlotState,
    SoftwareBackend,
};

fn device() -> CarusDevice {
    CarusDevice::open(BackendSelection::Software).expect("software backend")
}

fn pack_i32(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn assert_protocol_violation(err: &CarusError) {
    assert!(
        matches!(err, CarusError::ProtocolViolation { .. }),
        "expected ProtocolViolation, got {err}"
    );
}

#[test]
fn stage_before_configure_rejected() {
    let mut dev = device();
    let err = dev.stage_operand(0, &[0; 4], 1, 0, true).unwrap_err();
    assert_protocol_violation(&err);
    assert_eq!(dev.slot_state(0).unwrap(), SlotState::Idle);
}

#[test]
fn launch_from_idle_rejected() {
    let mut dev = device();
    assert_protocol_violation(&dev.launch(0).unwrap_err());
}

#[test]
fn retrieve_before_wait_rejected() {
    let mut dev = device();
    dev.load_kernel(KernelId::Relu).unwrap();
    dev.configure(0, KernelId::Relu, 4, ElemType::Int32, 0).unwrap();
    dev.set_args(0, [4, 0, 0, 0]).unwrap();
    dev.stage_operand(0, &pack_i32(&[-1, 2, -3, 4]), 4, 0, true)
        .unwrap();
    dev.launch(0).unwrap();

    // Running: staging and retrieval are both illegal until wait_done.
    assert_protocol_violation(&dev.retrieve_result(0, 4, 0).unwrap_err());
    assert_protocol_violation(&dev.stage_operand(0, &[0; 4], 1, 0, true).unwrap_err());
    assert_eq!(dev.slot_state(0).unwrap(), SlotState::Running);

    dev.wait_done(0, Duration::from_secs(1)).unwrap();
    assert_eq!(dev.slot_state(0).unwrap(), SlotState::Done);
}

#[test]
fn configure_while_running_rejected() {
    let mut dev = device();
    dev.load_kernel(KernelId::Relu).unwrap();
    dev.configure(0, KernelId::Relu, 2, ElemType::Int32, 0).unwrap();
    dev.set_args(0, [2, 0, 0, 0]).unwrap();
    dev.launch(0).unwrap();

    let err = dev
        .configure(0, KernelId::Relu, 2, ElemType::Int32, 0)
        .unwrap_err();
    assert_protocol_violation(&err);
}

#[test]
fn rejected_call_leaves_results_intact() {
    let mut dev = device();
    dev.load_kernel(KernelId::Relu).unwrap();
    dev.configure(0, KernelId::Relu, 3, ElemType::Int32, 0).unwrap();
    dev.set_args(0, [3, 0, 0, 0]).unwrap();
    dev.stage_operand(0, &pack_i32(&[-5, 7, -9]), 3, 0, true)
        .unwrap();
    dev.launch(0).unwrap();
    dev.wait_done(0, Duration::from_secs(1)).unwrap();

    let out_offset = 16 * 3; // output block, vl = 3
    let before = dev.retrieve_result(0, 3, out_offset).unwrap();

    // Done: staging is illegal and must not mutate the bank.
    assert_protocol_violation(
        &dev.stage_operand(0, &pack_i32(&[99, 99, 99]), 3, 0, true)
            .unwrap_err(),
    );

    let after = dev.retrieve_result(0, 3, out_offset).unwrap();
    assert_eq!(before, after);
}

#[test]
fn readback_is_idempotent() {
    let mut dev = device();
    dev.load_kernel(KernelId::MaxPool).unwrap();
    let config = MaxPoolConfig::new(4, 4, 2, 1, ElemType::Int32).unwrap();
    let input = pack_i32(&(0..16).map(|v| v * 3 % 11).collect::<Vec<_>>());

    let first = MaxPoolExecutor::new(config).run(&mut dev, 0, &input).unwrap();
    // Second retrieval of the same Done slot, no intervening launch.
    let again = dev.retrieve_result(0, 3, 16 * 4).unwrap();
    assert_eq!(&first.output[..3 * 4], again.as_ref());
}

#[test]
fn release_recycles_slot() {
    let mut dev = device();
    dev.load_kernel(KernelId::Relu).unwrap();
    dev.configure(0, KernelId::Relu, 2, ElemType::Int32, 0).unwrap();
    dev.set_args(0, [2, 0, 0, 0]).unwrap();
    dev.launch(0).unwrap();
    dev.wait_done(0, Duration::from_secs(1)).unwrap();

    dev.release(0).unwrap();
    assert_eq!(dev.slot_state(0).unwrap(), SlotState::Idle);
    assert!(dev.slot_config(0).unwrap().is_none());
    // Release is only legal once.
    assert_protocol_violation(&dev.release(0).unwrap_err());
}

#[test]
fn slots_do_not_alias() {
    let mut dev = device();
    assert!(dev.slot_count() >= 2, "model exposes two instances");
    dev.load_kernel(KernelId::MaxPool).unwrap();

    let config = MaxPoolConfig::new(4, 4, 2, 2, ElemType::Int32).unwrap();
    let exec = MaxPoolExecutor::new(config);

    let a = pack_i32(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 2, 1, 0, 3, 4, 5, 6]);
    let b = pack_i32(&(0..16).map(|v| 100 - v).collect::<Vec<_>>());

    // Interleave the two slots' cycles by hand to catch cross-slot state.
    dev.configure(0, KernelId::MaxPool, 4, ElemType::Int32, 0).unwrap();
    dev.configure(1, KernelId::MaxPool, 4, ElemType::Int32, 0).unwrap();
    dev.set_args(0, [2, 2, 2, 2]).unwrap();
    dev.set_args(1, [2, 2, 2, 2]).unwrap();
    dev.stage_operand(0, &a, 16, 0, true).unwrap();
    dev.stage_operand(1, &b, 16, 0, true).unwrap();
    dev.launch(0).unwrap();
    dev.launch(1).unwrap();
    dev.wait_done(1, Duration::from_secs(1)).unwrap();
    dev.wait_done(0, Duration::from_secs(1)).unwrap();

    let out0 = dev.retrieve_result(0, 2, 16 * 4).unwrap();
    let out1 = dev.retrieve_result(1, 2, 16 * 4).unwrap();
    assert_eq!(out0.as_ref(), pack_i32(&[6, 8]).as_slice());
    assert_eq!(out1.as_ref(), pack_i32(&[100, 98]).as_slice());

    // Fresh executor runs agree with the interleaved results.
    let r0 = exec.run(&mut dev, 0, &a).unwrap();
    assert_eq!(&r0.output[..8], pack_i32(&[6, 8]).as_slice());
}

#[test]
fn timeout_leaves_other_slots_usable() {
    let mut backend = SoftwareBackend::new();
    backend.stall_instance(0, true);
    let mut dev = CarusDevice::new(Box::new(backend));
    dev.load_kernel(KernelId::Relu).unwrap();

    dev.configure(0, KernelId::Relu, 2, ElemType::Int32, 0).unwrap();
    dev.set_args(0, [2, 0, 0, 0]).unwrap();
    dev.launch(0).unwrap();
    let err = dev.wait_done(0, Duration::from_millis(10)).unwrap_err();
    assert!(matches!(err, CarusError::Timeout { .. }), "got {err}");
    // The timed-out slot is stuck Running; the request is fatal.
    assert_eq!(dev.slot_state(0).unwrap(), SlotState::Running);

    // Slot 1 still works end to end.
    dev.configure(1, KernelId::Relu, 3, ElemType::Int32, 0).unwrap();
    dev.set_args(1, [3, 0, 0, 0]).unwrap();
    dev.stage_operand(1, &pack_i32(&[-1, 5, -2]), 3, 0, true)
        .unwrap();
    dev.launch(1).unwrap();
    dev.wait_done(1, Duration::from_secs(1)).unwrap();
    let out = dev.retrieve_result(1, 3, 16 * 3).unwrap();
    assert_eq!(out.as_ref(), pack_i32(&[0, 5, 0]).as_slice());
}
