//! Offload data channel: element moves between host buffers and lanes.
//!
//! The channel moves elements of the configured width between host byte
//! buffers (little-endian, element-width packed) and the bank's widened
//! `i32` lanes. On the host→device direction the `sign_extend` flag selects
//! sign- or zero-extension of sub-word elements; on the device→host
//! direction lanes are narrowed back to the element width (wrapping, as the
//! hardware does).
//!
//! Moves are synchronous: when a call returns, the transfer is complete and
//! both buffers are reusable — the explicit barrier the firmware issues
//! after each DMA is implied.

use bytes::{Bytes, BytesMut};
use carus_chip::vtype::ElemType;

use crate::error::{CarusError, Result};

/// Widen a packed host buffer into `i32` lanes (host→device move).
///
/// # Errors
///
/// Returns `Transfer` if `bytes` does not hold exactly `elem_count`
/// elements of the given width.
pub fn widen_to_lanes(
    bytes: &[u8],
    elem: ElemType,
    elem_count: usize,
    sign_extend: bool,
) -> Result<Vec<i32>> {
    let width = elem.width_bytes();
    if bytes.len() != elem_count * width {
        return Err(CarusError::transfer(format!(
            "host buffer holds {} bytes, expected {elem_count} x {width}",
            bytes.len()
        )));
    }

    let lanes = bytes
        .chunks_exact(width)
        .map(|chunk| match elem {
            ElemType::Int8 => {
                if sign_extend {
                    i32::from(chunk[0] as i8)
                } else {
                    i32::from(chunk[0])
                }
            }
            ElemType::Int16 => {
                let raw = u16::from_le_bytes([chunk[0], chunk[1]]);
                if sign_extend {
                    i32::from(raw as i16)
                } else {
                    i32::from(raw)
                }
            }
            ElemType::Int32 => i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
        })
        .collect();
    Ok(lanes)
}

/// Narrow `i32` lanes back to a packed host buffer.
#[must_use]
pub fn narrow_from_lanes(lanes: &[i32], elem: ElemType) -> Bytes {
    let mut out = BytesMut::with_capacity(lanes.len() * elem.width_bytes());
    for &lane in lanes {
        match elem {
            ElemType::Int8 => out.extend_from_slice(&(lane as u8).to_le_bytes()),
            ElemType::Int16 => out.extend_from_slice(&(lane as u16).to_le_bytes()),
            ElemType::Int32 => out.extend_from_slice(&lane.to_le_bytes()),
        }
    }
    out.freeze()
}
