//! Process instrumentation for wrsolve.
//!
//! The solve engine records resident memory around each cycle so that leaks
//! across repeated model rebuilds show up in the logs.

pub mod memory;

pub use memory::{MemoryError, MemoryProbe, MemorySnapshot};
