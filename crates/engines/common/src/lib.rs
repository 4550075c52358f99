//! Automation engines shared across front-ends.

pub mod simulated;

pub use simulated::*;
