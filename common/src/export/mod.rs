//! Export core modules shared across front ends.

#[cfg(feature = "excel")]
pub mod excel_core;
