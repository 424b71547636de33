//! Intcode library.
//!
//! Provides an arbitrary-precision intcode virtual machine with cooperative
//! input suspension, plus program parsing and disassembly.

pub mod utils;
pub mod virtual_machine;


pub use virtual_machine::errors::VMError;
pub use virtual_machine::program::Program;
pub use virtual_machine::vm::{ExecState, SinkControl, VM};
