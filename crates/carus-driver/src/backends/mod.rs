//! Backend implementations.

pub mod software;
