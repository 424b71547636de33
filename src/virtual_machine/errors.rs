use intcode_derive::Error;
use num_bigint::BigInt;

/// Errors that can occur while loading or executing an intcode program.
///
/// Execution faults (everything except [`VMError::ParseError`] and
/// [`VMError::Io`]) put the machine in the faulted state; only a reset
/// recovers it.
#[derive(Debug, Error)]
pub enum VMError {
    /// The low two digits of the opcode cell name no operation.
    #[error("unrecognized operation {opcode} at ip {ip}")]
    UnknownOpcode { opcode: BigInt, ip: usize },
    /// A parameter mode digit is not 0, 1 or 2.
    #[error("invalid parameter mode {mode} for parameter {param} of {instruction} at ip {ip}")]
    InvalidParamMode {
        instruction: &'static str,
        param: usize,
        mode: u8,
        ip: usize,
    },
    /// The handler bound to an instruction expects a different parameter count.
    #[error("{instruction} expects {expected} parameters but {actual} were decoded")]
    ArityMismatch {
        instruction: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A destination parameter was given in immediate mode.
    #[error("{instruction} at ip {ip} writes through an immediate parameter")]
    ImmediateWrite { instruction: &'static str, ip: usize },
    /// An effective address or jump target is negative.
    #[error("negative address {address} at ip {ip}")]
    NegativeAddress { address: BigInt, ip: usize },
    /// An effective address or jump target does not fit a machine word.
    #[error("address {address} at ip {ip} exceeds the addressable range")]
    AddressOverflow { address: BigInt, ip: usize },
    /// `run` was called on a machine that previously faulted.
    #[error("machine faulted at ip {ip}; reset it before running again")]
    Faulted { ip: usize },
    /// A program image token is not an integer.
    #[error("invalid program cell {index}: '{token}'")]
    ParseError { index: usize, token: String },
    /// Reading a program image from disk failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// An opcode number outside the instruction set.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no instruction has opcode {0}")]
pub struct UnknownInstruction(pub u64);

/// A parameter mode digit other than 0, 1 or 2.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no parameter mode {0}")]
pub struct UnknownParamMode(pub u8);

impl VMError {
    /// Returns true for errors raised by a running program, as opposed to loading one.
    pub fn is_fault(&self) -> bool {
        !matches!(self, VMError::ParseError { .. } | VMError::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_unknown_opcode() {
        let err = VMError::UnknownOpcode {
            opcode: BigInt::from(42),
            ip: 7,
        };
        assert_eq!(err.to_string(), "unrecognized operation 42 at ip 7");
    }

    #[test]
    fn display_immediate_write() {
        let err = VMError::ImmediateWrite {
            instruction: "ADD",
            ip: 0,
        };
        assert_eq!(
            err.to_string(),
            "ADD at ip 0 writes through an immediate parameter"
        );
    }

    #[test]
    fn io_error_exposes_source() {
        let err = VMError::Io {
            path: "missing.txt".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("failed to read missing.txt"));
        assert!(!err.is_fault());
    }

    #[test]
    fn faults_are_classified() {
        assert!(VMError::Faulted { ip: 3 }.is_fault());
        assert!(
            !VMError::ParseError {
                index: 0,
                token: "x".to_string()
            }
            .is_fault()
        );
    }
}
