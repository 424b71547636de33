//! Instruction Set Architecture (ISA) definitions.
//!
//! Defines the VM's instruction set. The [`for_each_instruction!`](crate::for_each_instruction) macro holds
//! the canonical instruction definitions and invokes a callback macro for code
//! generation, so the engine, the disassembler and the ISA fingerprint test all
//! read one table.
//!
//! This module generates:
//! - The [`Instruction`] enum with opcode mappings
//! - `TryFrom<u64>` for decoding opcodes
//! - Per-instruction mnemonic, parameter access kinds and profile category
//!
//! # Opcode cell format
//!
//! An opcode cell is a non-negative decimal number `...CBAoo`:
//! - `oo`: the two low digits select the instruction
//! - `A`, `B`, `C`: parameter modes of the first, second and third parameter
//!   (see [`ParamMode`]); missing digits mean position mode
//!
//! Parameters follow the opcode cell, one cell each.

use crate::virtual_machine::errors::{UnknownInstruction, VMError};
use crate::virtual_machine::operand::ParamMode;
use crate::virtual_machine::vm::InstrCategory;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

/// Largest parameter count of any instruction.
pub const MAX_PARAMS: usize = 3;

/// An opcode cell modulo this holds the opcode number.
pub const OPCODE_MODULUS: u64 = 100;

/// An opcode cell modulo this holds the opcode and every mode digit that can matter.
pub const OPCODE_CELL_MODULUS: u64 = OPCODE_MODULUS * 10u64.pow(MAX_PARAMS as u32);

/// How an instruction uses one of its parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Access {
    /// The parameter is read as a value.
    Read,
    /// The parameter names a memory cell the instruction stores into.
    Write,
}

/// Invokes a callback macro with the complete instruction definition list.
///
/// This macro enables code generation for instructions in multiple modules
/// without duplicating the instruction definitions.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            // =========================
            // Arithmetic
            // =========================
            /// ADD a, b, dst ; dst = a + b
            Add = 1, "ADD" => [a: Read, b: Read, dst: Write], Arithmetic,
            /// MUL a, b, dst ; dst = a * b
            Mul = 2, "MUL" => [a: Read, b: Read, dst: Write], Arithmetic,
            // =========================
            // I/O
            // =========================
            /// IN dst ; dst = next queued input, suspends when the queue is empty
            In = 3, "IN" => [dst: Write], Io,
            /// OUT a ; deliver a to the output sink
            Out = 4, "OUT" => [a: Read], Io,
            // =========================
            // Control flow
            // =========================
            /// JNZ cond, target ; if cond != 0 then ip = target
            JumpIfTrue = 5, "JNZ" => [cond: Read, target: Read], ControlFlow,
            /// JZ cond, target ; if cond == 0 then ip = target
            JumpIfFalse = 6, "JZ" => [cond: Read, target: Read], ControlFlow,
            // =========================
            // Comparison
            // =========================
            /// LT a, b, dst ; dst = (a < b) as 1 or 0
            Lt = 7, "LT" => [a: Read, b: Read, dst: Write], Comparison,
            /// EQ a, b, dst ; dst = (a == b) as 1 or 0
            Eq = 8, "EQ" => [a: Read, b: Read, dst: Write], Comparison,
            // =========================
            // Relative base and halt
            // =========================
            /// ARB a ; relative_base += a
            AdjustBase = 9, "ARB" => [a: Read], Base,
            /// HALT ; stop execution
            Halt = 99, "HALT" => [], Halt,
        }
    };
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:expr, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ], $category:ident
        ),* $(,)?
    ) => {
        // =========================
        // VM instruction enum
        // =========================
        #[repr(u8)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Instruction {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<u64> for Instruction {
            type Error = UnknownInstruction;

            fn try_from(value: u64) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Instruction::$name), )*
                    _ => Err(UnknownInstruction(value)),
                }
            }
        }

        impl Instruction {
            /// Every instruction in opcode order.
            pub const ALL: &'static [Instruction] = &[ $( Instruction::$name, )* ];

            /// Returns the assembly mnemonic for this instruction.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Instruction::$name => $mnemonic, )*
                }
            }

            /// Returns how each parameter is used, in parameter order.
            pub const fn params(&self) -> &'static [Access] {
                match self {
                    $( Instruction::$name => &[ $( Access::$kind ),* ], )*
                }
            }

            /// Returns the profile category this instruction is counted under.
            pub const fn category(&self) -> InstrCategory {
                match self {
                    $( Instruction::$name => InstrCategory::$category, )*
                }
            }
        }
    };
}

for_each_instruction!(define_instructions);

impl Instruction {
    /// Returns the opcode number (low two digits of an opcode cell).
    pub const fn opcode(&self) -> u8 {
        *self as u8
    }

    /// Returns the number of parameter cells following the opcode cell.
    pub const fn arity(&self) -> usize {
        self.params().len()
    }

    /// Returns the size in cells of the whole instruction.
    pub const fn width(&self) -> usize {
        1 + self.arity()
    }
}

/// A decoded opcode cell: the instruction plus the mode of each parameter.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OpcodeCell {
    pub instruction: Instruction,
    modes: [ParamMode; MAX_PARAMS],
}

impl OpcodeCell {
    /// Splits an opcode cell into instruction and parameter modes.
    ///
    /// Only the mode digits of parameters the instruction actually takes are
    /// checked; higher digits are ignored, however wide the cell. Negative
    /// cells are unknown opcodes. `ip` is used for error reporting.
    pub fn decode(cell: &BigInt, ip: usize) -> Result<Self, VMError> {
        let unknown = || VMError::UnknownOpcode {
            opcode: cell.clone(),
            ip,
        };
        if cell.is_negative() {
            return Err(unknown());
        }
        let raw = (cell % OPCODE_CELL_MODULUS).to_u64().ok_or_else(unknown)?;
        let instruction = Instruction::try_from(raw % OPCODE_MODULUS).map_err(|_| unknown())?;

        let mut modes = [ParamMode::Position; MAX_PARAMS];
        let mut digits = raw / OPCODE_MODULUS;
        for (param, slot) in modes.iter_mut().take(instruction.arity()).enumerate() {
            let mode = (digits % 10) as u8;
            *slot = ParamMode::try_from(mode).map_err(|_| VMError::InvalidParamMode {
                instruction: instruction.mnemonic(),
                param,
                mode,
                ip,
            })?;
            digits /= 10;
        }

        Ok(Self { instruction, modes })
    }

    /// Returns the modes of the instruction's parameters, in parameter order.
    pub fn modes(&self) -> &[ParamMode] {
        &self.modes[..self.instruction.arity()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(cell: i64) -> Result<OpcodeCell, VMError> {
        OpcodeCell::decode(&BigInt::from(cell), 0)
    }

    #[test]
    fn instruction_try_from_invalid() {
        for opcode in [0u64, 10, 42, 98, 100] {
            assert_eq!(Instruction::try_from(opcode), Err(UnknownInstruction(opcode)));
        }
    }

    #[test]
    fn opcode_round_trip() {
        for instr in Instruction::ALL {
            assert_eq!(
                Instruction::try_from(instr.opcode() as u64).unwrap(),
                *instr
            );
        }
    }

    #[test]
    fn arities() {
        assert_eq!(Instruction::Add.arity(), 3);
        assert_eq!(Instruction::Mul.arity(), 3);
        assert_eq!(Instruction::In.arity(), 1);
        assert_eq!(Instruction::Out.arity(), 1);
        assert_eq!(Instruction::JumpIfTrue.arity(), 2);
        assert_eq!(Instruction::JumpIfFalse.arity(), 2);
        assert_eq!(Instruction::Lt.arity(), 3);
        assert_eq!(Instruction::Eq.arity(), 3);
        assert_eq!(Instruction::AdjustBase.arity(), 1);
        assert_eq!(Instruction::Halt.arity(), 0);
        assert!(Instruction::ALL.iter().all(|i| i.arity() <= MAX_PARAMS));
    }

    #[test]
    fn destinations_are_last() {
        for instr in Instruction::ALL {
            let params = instr.params();
            let writes = params.iter().filter(|a| **a == Access::Write).count();
            assert!(writes <= 1, "{} has {} destinations", instr.mnemonic(), writes);
            if writes == 1 {
                assert_eq!(params.last(), Some(&Access::Write));
            }
        }
    }

    #[test]
    fn decode_default_modes() {
        let cell = decode(2).unwrap();
        assert_eq!(cell.instruction, Instruction::Mul);
        assert_eq!(cell.modes(), &[ParamMode::Position; 3]);
    }

    #[test]
    fn decode_mixed_modes() {
        let cell = decode(1002).unwrap();
        assert_eq!(cell.instruction, Instruction::Mul);
        assert_eq!(
            cell.modes(),
            &[ParamMode::Position, ParamMode::Immediate, ParamMode::Position]
        );

        let cell = decode(21107).unwrap();
        assert_eq!(cell.instruction, Instruction::Lt);
        assert_eq!(
            cell.modes(),
            &[ParamMode::Immediate, ParamMode::Immediate, ParamMode::Relative]
        );
    }

    #[test]
    fn decode_halt_ignores_high_digits() {
        let cell = decode(22299).unwrap();
        assert_eq!(cell.instruction, Instruction::Halt);
        assert!(cell.modes().is_empty());
    }

    #[test]
    fn decode_ignores_digits_beyond_arity() {
        let cell = decode(90004).unwrap();
        assert_eq!(cell.instruction, Instruction::Out);
        assert_eq!(cell.modes(), &[ParamMode::Position]);
    }

    #[test]
    fn decode_wide_cells_by_low_digits() {
        let wide = |s: &str| OpcodeCell::decode(&s.parse::<BigInt>().unwrap(), 0);

        let cell = wide("100000000000000000000001").unwrap();
        assert_eq!(cell.instruction, Instruction::Add);
        assert_eq!(cell.modes(), &[ParamMode::Position; 3]);

        let cell = wide("98765432109876543210121004").unwrap();
        assert_eq!(cell.instruction, Instruction::Out);
        assert_eq!(cell.modes(), &[ParamMode::Position]);

        let cell = wide("1844674407370955161621101").unwrap();
        assert_eq!(cell.instruction, Instruction::Add);
        assert_eq!(
            cell.modes(),
            &[ParamMode::Immediate, ParamMode::Immediate, ParamMode::Relative]
        );

        assert!(matches!(
            wide("100000000000000000000098"),
            Err(VMError::UnknownOpcode { .. })
        ));
        assert!(matches!(
            wide("-100000000000000000000001"),
            Err(VMError::UnknownOpcode { .. })
        ));
    }

    #[test]
    fn decode_rejects_bad_mode() {
        assert!(matches!(
            decode(301),
            Err(VMError::InvalidParamMode {
                instruction: "ADD",
                param: 0,
                mode: 3,
                ..
            })
        ));
    }

    #[test]
    fn decode_rejects_negative_and_unknown() {
        assert!(matches!(decode(-1), Err(VMError::UnknownOpcode { .. })));
        assert!(matches!(decode(0), Err(VMError::UnknownOpcode { .. })));
        assert!(matches!(decode(1234), Err(VMError::UnknownOpcode { .. })));
    }

    #[test]
    fn decode_reports_ip() {
        let err = OpcodeCell::decode(&BigInt::from(77), 12).unwrap_err();
        assert!(matches!(err, VMError::UnknownOpcode { ip: 12, .. }));
    }
}
