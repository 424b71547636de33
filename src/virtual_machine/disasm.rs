//! Disassembler for intcode program images.
//!
//! Intcode does not separate code from data, so this is a linear sweep from
//! address 0: a cell that decodes as an instruction with all its parameter
//! cells present (and no immediate-mode destination) becomes an instruction
//! line and the sweep skips its parameters; anything else becomes a `DATA`
//! line. Self-modifying programs disassemble as they are stored, not as they
//! will run.

use crate::virtual_machine::isa::{Access, Instruction, OpcodeCell};
use crate::virtual_machine::operand::{Operand, ParamMode};
use crate::virtual_machine::program::Program;
use num_bigint::BigInt;
use std::fmt;

/// One disassembled entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub address: usize,
    pub kind: LineKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineKind {
    Instr {
        instruction: Instruction,
        operands: Vec<Operand>,
    },
    Data(BigInt),
}

/// Disassembled program, rendered by [`fmt::Display`] one line per entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Disassembly {
    lines: Vec<Line>,
    address_width: usize,
}

impl Disassembly {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Iterates the instruction lines only.
    pub fn instructions(&self) -> impl Iterator<Item = (usize, Instruction)> + '_ {
        self.lines.iter().filter_map(|line| match &line.kind {
            LineKind::Instr { instruction, .. } => Some((line.address, *instruction)),
            LineKind::Data(_) => None,
        })
    }
}

/// Disassembles `program` into a structured view.
#[must_use]
pub fn disassemble(program: &Program) -> Disassembly {
    let cells = program.cells();
    let mut lines = Vec::new();
    let mut address = 0;

    while address < cells.len() {
        match decode_at(cells, address) {
            Some((instruction, operands)) => {
                lines.push(Line {
                    address,
                    kind: LineKind::Instr {
                        instruction,
                        operands,
                    },
                });
                address += instruction.width();
            }
            None => {
                lines.push(Line {
                    address,
                    kind: LineKind::Data(cells[address].clone()),
                });
                address += 1;
            }
        }
    }

    Disassembly {
        lines,
        address_width: cells.len().saturating_sub(1).to_string().len().max(4),
    }
}

/// Decodes the instruction starting at `address`, if it is a plausible one.
fn decode_at(cells: &[BigInt], address: usize) -> Option<(Instruction, Vec<Operand>)> {
    let cell = OpcodeCell::decode(&cells[address], address).ok()?;
    let instruction = cell.instruction;
    let params = cells.get(address + 1..address + instruction.width())?;

    let writes_immediate = cell
        .modes()
        .iter()
        .zip(instruction.params())
        .any(|(mode, access)| *access == Access::Write && *mode == ParamMode::Immediate);
    if writes_immediate {
        return None;
    }

    let operands = cell
        .modes()
        .iter()
        .zip(params)
        .map(|(mode, raw)| Operand::new(*mode, raw.clone()))
        .collect();
    Some((instruction, operands))
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = f.width().unwrap_or(4);
        write!(f, "{:0width$}: ", self.address, width = width)?;
        match &self.kind {
            LineKind::Instr {
                instruction,
                operands,
            } => {
                write!(f, "{}", instruction.mnemonic())?;
                for (i, operand) in operands.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{sep}{operand}")?;
                }
                Ok(())
            }
            LineKind::Data(value) => write!(f, "DATA {value}"),
        }
    }
}

impl fmt::Display for Disassembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{:width$}", line, width = self.address_width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(source: &str) -> Vec<String> {
        let program: Program = source.parse().unwrap();
        disassemble(&program)
            .to_string()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn empty_program() {
        assert!(disassemble(&Program::default()).lines().is_empty());
    }

    #[test]
    fn position_mode_program_with_data() {
        assert_eq!(
            listing("1,9,10,3,2,3,11,0,99,30,40,50"),
            vec![
                "0000: ADD [9], [10], [3]",
                "0004: MUL [3], [11], [0]",
                "0008: HALT",
                "0009: DATA 30",
                "0010: DATA 40",
                "0011: DATA 50",
            ]
        );
    }

    #[test]
    fn immediate_and_relative_operands() {
        assert_eq!(
            listing("109,19,204,-34,1101,100,-1,4,99"),
            vec![
                "0000: ARB 19",
                "0002: OUT [rb-34]",
                "0004: ADD 100, -1, [4]",
                "0008: HALT",
            ]
        );
    }

    #[test]
    fn immediate_destination_is_data() {
        assert_eq!(
            listing("11101,1,1,5,99"),
            vec!["0000: DATA 11101", "0001: ADD [1], [5], [99]"]
        );
    }

    #[test]
    fn truncated_instruction_is_data() {
        assert_eq!(listing("1,0"), vec!["0000: DATA 1", "0001: DATA 0"]);
    }

    #[test]
    fn instructions_iterator_skips_data() {
        let program: Program = "3,0,4,0,99,7".parse().unwrap();
        let found: Vec<_> = disassemble(&program).instructions().collect();
        assert_eq!(
            found,
            vec![(0, Instruction::In), (2, Instruction::Out), (4, Instruction::Halt)]
        );
    }

    #[test]
    fn wide_programs_widen_addresses() {
        let program: Program = vec![99i64; 10_001].into();
        let text = disassemble(&program).to_string();
        assert_eq!(text.lines().next(), Some("00000: HALT"));
        assert_eq!(text.lines().last(), Some("10000: HALT"));
    }
}
