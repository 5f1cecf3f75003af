//! Silicon model for the NM-Carus near-memory-compute vector unit.
//!
//! This crate has **no dependencies** and **no hardware access** — it is a
//! pure model of the silicon: the per-instance configuration register file,
//! element-type encodings, vector register bank geometry, and the kernel
//! image table (pre-assembled instruction words for each offloaded
//! operation).
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | Configuration register file — offsets and bit definitions |
//! | [`vtype`] | Element-type (`VTYPE`) encodings and width/sign semantics |
//! | [`bank`] | Vector register bank geometry (register count, VL limits) |
//! | [`kernels`] | Kernel image table — instruction words per kernel |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bank;
pub mod kernels;
pub mod regs;
pub mod vtype;
