//! End-to-end max-pooling tests against the software backend.
//!
//! The offloaded result is checked against a direct scalar reference over
//! a grid of shapes, windows, and strides, plus the documented concrete
//! scenarios and element-width/sign cases.

use carus_driver::chip::{ElemType, KernelId};
use carus_driver::{BackendSelection, CarusDevice, MaxPoolConfig, MaxPoolExecutor};

/// Scalar reference: max over each pool x pool window.
fn reference_maxpool(a: &[i32], rows: usize, cols: usize, pool: usize, stride: usize) -> Vec<i32> {
    let rows_r = (rows - pool) / stride + 1;
    let cols_r = (cols - pool) / stride + 1;
    let mut out = Vec::with_capacity(rows_r * cols_r);
    for i in 0..rows_r {
        for j in 0..cols_r {
            let mut m = i32::MIN;
            for di in 0..pool {
                for dj in 0..pool {
                    m = m.max(a[(i * stride + di) * cols + (j * stride + dj)]);
                }
            }
            out.push(m);
        }
    }
    out
}

fn offload_i32(a: &[i32], rows: usize, cols: usize, pool: usize, stride: usize) -> Vec<i32> {
    let mut dev = CarusDevice::open(BackendSelection::Software).unwrap();
    dev.load_kernel(KernelId::MaxPool).unwrap();
    let config = MaxPoolConfig::new(rows, cols, pool, stride, ElemType::Int32).unwrap();
    let input: Vec<u8> = a.iter().flat_map(|v| v.to_le_bytes()).collect();
    let result = MaxPoolExecutor::new(config).run(&mut dev, 0, &input).unwrap();
    result
        .output
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

#[test]
fn concrete_scenario_pool2_stride2() {
    let a = [1, 2, 3, 4, 5, 6, 7, 8, 9, 2, 1, 0, 3, 4, 5, 6];
    assert_eq!(offload_i32(&a, 4, 4, 2, 2), vec![6, 8, 9, 6]);
}

#[test]
fn boundary_pool2_stride1_on_4x4() {
    let a = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
    assert_eq!(
        offload_i32(&a, 4, 4, 2, 1),
        vec![6, 7, 8, 10, 11, 12, 14, 15, 16]
    );
}

#[test]
fn matches_reference_across_shapes() {
    // (rows, cols, pool, stride) — overlapping, tiled, and wide strides.
    let cases = [
        (4, 4, 2, 1),
        (4, 4, 2, 2),
        (4, 4, 3, 1),
        (6, 6, 2, 2),
        (6, 8, 3, 1),
        (8, 8, 2, 3),
        (10, 10, 4, 2),
        (5, 9, 3, 2),
    ];
    for (rows, cols, pool, stride) in cases {
        // Deterministic but non-monotonic values.
        let a: Vec<i32> = (0..rows * cols)
            .map(|v| ((v as i32 * 37) % 101) - 50)
            .collect();
        assert_eq!(
            offload_i32(&a, rows, cols, pool, stride),
            reference_maxpool(&a, rows, cols, pool, stride),
            "mismatch for {rows}x{cols} pool={pool} stride={stride}"
        );
    }
}

#[test]
fn signed_e8_input() {
    let mut dev = CarusDevice::open(BackendSelection::Software).unwrap();
    dev.load_kernel(KernelId::MaxPool).unwrap();
    let config = MaxPoolConfig::new(2, 2, 2, 1, ElemType::Int8).unwrap();
    // All negative: signed max must pick -3, not a zero-extended value.
    let input: Vec<u8> = [-9i8, -3, -7, -5].iter().map(|v| *v as u8).collect();
    let result = MaxPoolExecutor::new(config).run(&mut dev, 0, &input).unwrap();
    assert_eq!(result.output.as_ref(), &[(-3i8) as u8]);
    assert_eq!((result.rows, result.cols), (1, 1));
}

#[test]
fn unsigned_e8_input_zero_extends() {
    let mut dev = CarusDevice::open(BackendSelection::Software).unwrap();
    dev.load_kernel(KernelId::MaxPool).unwrap();
    let mut config = MaxPoolConfig::new(2, 2, 2, 1, ElemType::Int8).unwrap();
    config.sign_extend = false;
    // 0x90 zero-extended (144) beats 0x70 (112); sign-extended it would lose.
    let input = [0x90u8, 0x10, 0x70, 0x20];
    let result = MaxPoolExecutor::new(config).run(&mut dev, 0, &input).unwrap();
    assert_eq!(result.output.as_ref(), &[0x90]);
}

#[test]
fn e16_matches_reference() {
    let mut dev = CarusDevice::open(BackendSelection::Software).unwrap();
    dev.load_kernel(KernelId::MaxPool).unwrap();
    let config = MaxPoolConfig::new(4, 4, 2, 2, ElemType::Int16).unwrap();
    let a: Vec<i16> = (0..16).map(|v| (v * v - 40) as i16).collect();
    let input: Vec<u8> = a.iter().flat_map(|v| v.to_le_bytes()).collect();
    let result = MaxPoolExecutor::new(config).run(&mut dev, 0, &input).unwrap();
    let out: Vec<i16> = result
        .output
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes(c.try_into().unwrap()))
        .collect();
    let wide: Vec<i32> = a.iter().map(|&v| i32::from(v)).collect();
    let expected: Vec<i16> = reference_maxpool(&wide, 4, 4, 2, 2)
        .into_iter()
        .map(|v| v as i16)
        .collect();
    assert_eq!(out, expected);
}

#[test]
fn reuse_slot_across_invocations() {
    let mut dev = CarusDevice::open(BackendSelection::Software).unwrap();
    dev.load_kernel(KernelId::MaxPool).unwrap();
    let config = MaxPoolConfig::new(4, 4, 2, 2, ElemType::Int32).unwrap();
    let exec = MaxPoolExecutor::new(config);

    for round in 0..3 {
        let a: Vec<i32> = (0..16).map(|v| v + round * 100).collect();
        let input: Vec<u8> = a.iter().flat_map(|v| v.to_le_bytes()).collect();
        let result = exec.run(&mut dev, 0, &input).unwrap();
        let out: Vec<i32> = result
            .output
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(out, reference_maxpool(&a, 4, 4, 2, 2));
    }
}
