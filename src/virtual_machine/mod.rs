//! Intcode virtual machine.
//!
//! The VM executes intcode programs: flat lists of arbitrary-precision integers
//! that are at once the code and the initial memory image.
//!
//! # Architecture
//!
//! - **Memory**: logically infinite, zero-initialized big-integer cells, grown
//!   on demand (dense near the image, sparse far beyond it)
//! - **Registers**: the instruction pointer and the relative base
//! - **Instruction format**: an opcode cell (`...CBAoo`) holding the operation
//!   and per-parameter addressing modes, followed by one cell per parameter
//! - **Addressing modes**: position, immediate and relative
//! - **Execution model**: runs until halt, an execution fault, or an input
//!   instruction with nothing queued, which suspends the machine until the
//!   host sends more input and calls `run` again
//!
//! # Modules
//!
//! - [`disasm`]: Linear-sweep disassembler
//! - [`errors`]: Load and execution error types
//! - [`isa`]: Instruction set definition and opcode cell decoding
//! - [`operand`]: Parameter modes and operand resolution
//! - [`program`]: Program images and their textual form
//! - [`vm`]: Core virtual machine implementation and execution profile

pub mod disasm;
pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod operand;
pub mod program;
pub mod vm;
