//! Core virtual machine implementation.
//!
//! The VM executes an intcode program held in big-integer memory. Each step
//! fetches the opcode cell at the instruction pointer, decodes the instruction
//! and its parameter modes, resolves the parameters and dispatches to a
//! handler, which returns the next [`Step`].
//!
//! Input is cooperative: `IN` on an empty queue leaves the instruction pointer
//! where it is and makes [`VM::run`] return with the machine paused. Queue more
//! input with [`VM::send_input`] and call [`VM::run`] again to resume.

mod io;
mod memory;
mod profile;
mod registers;

pub use io::{OutputFn, SinkControl};
pub use profile::{ExecProfile, InstrCategory};

use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::{Instruction, OpcodeCell};
use crate::virtual_machine::operand::Operand;
use crate::virtual_machine::program::Program;
use crate::{debug, error};
use io::Output;
use memory::Memory;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use registers::Registers;
use std::collections::VecDeque;

/// Lifecycle state of a machine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecState {
    /// Constructed or reset, not yet run.
    Ready,
    /// Inside [`VM::run`].
    Running,
    /// Suspended on `IN` with an empty input queue.
    Paused,
    /// Executed `HALT`. Terminal until reset.
    Halted,
    /// Stopped by an execution fault. Terminal until reset.
    Faulted,
}

/// Outcome of executing one instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Step {
    /// Continue at the given instruction pointer.
    Continue(usize),
    /// No input available; retry the same instruction later.
    Suspend,
    /// Stop for good.
    Halt,
}

macro_rules! exec_vm {
    // Entry point
    (
        vm = $vm:ident,
        cell = $cell:ident,
        { $( $variant:ident => $handler:ident ( $( $field:ident : $kind:ident ),* $(,)? ) ),* $(,)? }
    ) => {{
        match $cell.instruction {
            $(
                Instruction::$variant => {
                    let instr_name = $cell.instruction.mnemonic();
                    let operands = $vm.operands(&$cell);
                    let [ $( $field ),* ] = operands.as_slice() else {
                        return Err(VMError::ArityMismatch {
                            instruction: instr_name,
                            expected: exec_vm!(@count $( $field )*),
                            actual: operands.len(),
                        });
                    };
                    $( let $field = exec_vm!(@resolve $vm, instr_name, $field, $kind)?; )*
                    $vm.$handler($( $field ),*)
                }
            ),*
        }
    }};

    (@count) => { 0usize };
    (@count $head:ident $( $tail:ident )*) => { 1usize + exec_vm!(@count $( $tail )*) };

    // Value of a source parameter
    (@resolve $vm:ident, $instr_name:expr, $operand:ident, Read) => {{
        $vm.load($operand)
    }};

    // Address of a destination parameter
    (@resolve $vm:ident, $instr_name:expr, $operand:ident, Write) => {{
        $vm.store_address($instr_name, $operand)
    }};
}

/// Snapshot of a machine's complete execution state.
///
/// Taken with [`VM::snapshot`] and reapplied with [`VM::restore`]. The output
/// sink is not part of a snapshot.
#[derive(Clone, Debug)]
pub struct Snapshot {
    memory: Memory,
    registers: Registers,
    input: VecDeque<BigInt>,
    output: Vec<BigInt>,
    profile: ExecProfile,
    state: ExecState,
}

impl Snapshot {
    /// Returns the machine state captured in this snapshot.
    pub fn state(&self) -> ExecState {
        self.state
    }
}

/// Intcode virtual machine.
///
/// Owns its memory, registers, input queue and output sink exclusively.
/// Execution is single-threaded and only ever suspends on input.
pub struct VM {
    /// Initial memory image, kept for [`VM::reset`].
    program: Program,
    /// Big-integer memory seeded from `program`.
    memory: Memory,
    /// Instruction pointer and relative base.
    registers: Registers,
    /// Pending input values, consumed front first.
    input: VecDeque<BigInt>,
    /// Output sink or buffer.
    output: Output,
    /// Executed-instruction counters.
    profile: ExecProfile,
    state: ExecState,
}

impl VM {
    /// Creates a ready machine with `program` loaded at address 0.
    pub fn new(program: impl Into<Program>) -> Self {
        let program = program.into();
        Self {
            memory: Memory::new(program.cells().to_vec()),
            program,
            registers: Registers::new(),
            input: VecDeque::new(),
            output: Output::default(),
            profile: ExecProfile::new(),
            state: ExecState::Ready,
        }
    }

    /// Parses a comma-separated program and creates a ready machine for it.
    pub fn from_source(source: &str) -> Result<Self, VMError> {
        Ok(Self::new(source.parse::<Program>()?))
    }

    /// Executes until the program halts, needs input, or faults.
    ///
    /// Returns `Ok(())` both on halt and on suspension; check [`VM::state`] to
    /// tell them apart. Running a halted machine does nothing. Running a
    /// faulted machine returns [`VMError::Faulted`].
    pub fn run(&mut self) -> Result<(), VMError> {
        match self.state {
            ExecState::Halted => return Ok(()),
            ExecState::Faulted => {
                return Err(VMError::Faulted {
                    ip: self.registers.ip,
                });
            }
            _ => {}
        }

        self.state = ExecState::Running;
        loop {
            match self.step() {
                Ok(Step::Continue(next)) => self.registers.ip = next,
                Ok(Step::Suspend) => {
                    self.state = ExecState::Paused;
                    self.profile.record_suspension();
                    debug!("paused for input at ip {}", self.registers.ip);
                    return Ok(());
                }
                Ok(Step::Halt) => {
                    self.state = ExecState::Halted;
                    debug!(
                        "halted at ip {} after {} instructions",
                        self.registers.ip,
                        self.profile.total()
                    );
                    return Ok(());
                }
                Err(err) => {
                    self.state = ExecState::Faulted;
                    error!("{err}");
                    return Err(err);
                }
            }
        }
    }

    /// Fetches, decodes and executes the instruction at the instruction pointer.
    fn step(&mut self) -> Result<Step, VMError> {
        let ip = self.registers.ip;
        let cell = OpcodeCell::decode(self.memory.get(ip), ip)?;
        let step = self.exec(cell)?;
        if step != Step::Suspend {
            self.profile.record(cell.instruction.category());
        }
        Ok(step)
    }

    /// Executes a single decoded instruction.
    fn exec(&mut self, cell: OpcodeCell) -> Result<Step, VMError> {
        exec_vm! {
            vm = self,
            cell = cell,
            {
                // Arithmetic
                Add => op_add(a: Read, b: Read, dst: Write),
                Mul => op_mul(a: Read, b: Read, dst: Write),
                // I/O
                In => op_in(dst: Write),
                Out => op_out(a: Read),
                // Control flow
                JumpIfTrue => op_jump_if_true(cond: Read, target: Read),
                JumpIfFalse => op_jump_if_false(cond: Read, target: Read),
                // Comparison
                Lt => op_lt(a: Read, b: Read, dst: Write),
                Eq => op_eq(a: Read, b: Read, dst: Write),
                // Relative base and halt
                AdjustBase => op_adjust_base(a: Read),
                Halt => op_halt(),
            }
        }
    }

    /// Reads the raw parameter cells following the opcode cell, paired with their modes.
    fn operands(&self, cell: &OpcodeCell) -> Vec<Operand> {
        let ip = self.registers.ip;
        cell.modes()
            .iter()
            .enumerate()
            .map(|(i, mode)| Operand::new(*mode, self.memory.get(ip.saturating_add(1 + i)).clone()))
            .collect()
    }

    /// Resolves a source parameter to its value.
    fn load(&self, operand: &Operand) -> Result<BigInt, VMError> {
        match operand.effective_address(&self.registers.relative_base) {
            None => Ok(operand.raw.clone()),
            Some(address) => Ok(self.memory.get(self.address(&address)?).clone()),
        }
    }

    /// Resolves a destination parameter to the address it names.
    fn store_address(&self, instruction: &'static str, operand: &Operand) -> Result<usize, VMError> {
        let address = operand
            .effective_address(&self.registers.relative_base)
            .ok_or(VMError::ImmediateWrite {
                instruction,
                ip: self.registers.ip,
            })?;
        self.address(&address)
    }

    /// Converts a computed address or jump target into a memory index.
    fn address(&self, value: &BigInt) -> Result<usize, VMError> {
        if value.is_negative() {
            return Err(VMError::NegativeAddress {
                address: value.clone(),
                ip: self.registers.ip,
            });
        }
        value.to_usize().ok_or_else(|| VMError::AddressOverflow {
            address: value.clone(),
            ip: self.registers.ip,
        })
    }

    /// Returns the step that falls through to the next instruction.
    fn next(&self, instruction: Instruction) -> Result<Step, VMError> {
        let ip = self.registers.ip;
        ip.checked_add(instruction.width())
            .map(Step::Continue)
            .ok_or_else(|| VMError::AddressOverflow {
                address: BigInt::from(ip) + instruction.width(),
                ip,
            })
    }

    fn op_add(&mut self, a: BigInt, b: BigInt, dst: usize) -> Result<Step, VMError> {
        self.memory.set(dst, a + b);
        self.next(Instruction::Add)
    }

    fn op_mul(&mut self, a: BigInt, b: BigInt, dst: usize) -> Result<Step, VMError> {
        self.memory.set(dst, a * b);
        self.next(Instruction::Mul)
    }

    fn op_in(&mut self, dst: usize) -> Result<Step, VMError> {
        match self.input.pop_front() {
            Some(value) => {
                self.memory.set(dst, value);
                self.next(Instruction::In)
            }
            None => Ok(Step::Suspend),
        }
    }

    fn op_out(&mut self, a: BigInt) -> Result<Step, VMError> {
        self.output.emit(a);
        self.next(Instruction::Out)
    }

    fn op_jump_if_true(&mut self, cond: BigInt, target: BigInt) -> Result<Step, VMError> {
        if cond.is_zero() {
            return self.next(Instruction::JumpIfTrue);
        }
        Ok(Step::Continue(self.address(&target)?))
    }

    fn op_jump_if_false(&mut self, cond: BigInt, target: BigInt) -> Result<Step, VMError> {
        if !cond.is_zero() {
            return self.next(Instruction::JumpIfFalse);
        }
        Ok(Step::Continue(self.address(&target)?))
    }

    fn op_lt(&mut self, a: BigInt, b: BigInt, dst: usize) -> Result<Step, VMError> {
        self.memory.set(dst, BigInt::from(u8::from(a < b)));
        self.next(Instruction::Lt)
    }

    fn op_eq(&mut self, a: BigInt, b: BigInt, dst: usize) -> Result<Step, VMError> {
        self.memory.set(dst, BigInt::from(u8::from(a == b)));
        self.next(Instruction::Eq)
    }

    fn op_adjust_base(&mut self, a: BigInt) -> Result<Step, VMError> {
        self.registers.adjust_base(&a);
        self.next(Instruction::AdjustBase)
    }

    fn op_halt(&mut self) -> Result<Step, VMError> {
        Ok(Step::Halt)
    }

    // ==================== Input ====================

    /// Queues one input value. Does not resume a paused machine by itself.
    pub fn send_input(&mut self, value: impl Into<BigInt>) {
        self.input.push_back(value.into());
    }

    /// Queues several input values in order.
    pub fn send_inputs<I, T>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<BigInt>,
    {
        self.input.extend(values.into_iter().map(Into::into));
    }

    /// Returns how many queued input values have not been consumed yet.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    // ==================== Output ====================

    /// Registers `sink` to receive every output value, replacing any previous sink.
    ///
    /// The sink's return value decides whether it stays registered, detaches
    /// itself, or hands over to another sink. Reset detaches the sink.
    pub fn set_output_sink<F>(&mut self, sink: F)
    where
        F: FnMut(&BigInt) -> SinkControl + 'static,
    {
        self.output.attach(Box::new(sink));
    }

    /// Registers a sink that stays attached until cleared or reset.
    pub fn set_output_fn<F>(&mut self, mut sink: F)
    where
        F: FnMut(&BigInt) + 'static,
    {
        self.set_output_sink(move |value| {
            sink(value);
            SinkControl::Keep
        });
    }

    /// Detaches and returns the current sink. Later output is buffered.
    pub fn clear_output_sink(&mut self) -> Option<OutputFn> {
        self.output.detach()
    }

    pub fn has_output_sink(&self) -> bool {
        self.output.has_sink()
    }

    /// Returns values emitted while no sink was registered.
    pub fn output(&self) -> &[BigInt] {
        self.output.buffered()
    }

    /// Drains values emitted while no sink was registered.
    pub fn take_output(&mut self) -> Vec<BigInt> {
        self.output.take_buffered()
    }

    // ==================== Memory and registers ====================

    /// Returns the value at `address`; never-written cells read as zero.
    pub fn read(&self, address: usize) -> &BigInt {
        self.memory.get(address)
    }

    /// Stores `value` at `address`, growing memory as needed.
    pub fn write(&mut self, address: usize, value: impl Into<BigInt>) {
        self.memory.set(address, value.into());
    }

    /// Returns one past the highest address with backing storage.
    pub fn memory_extent(&self) -> usize {
        self.memory.extent()
    }

    /// Returns the contiguous memory cells starting at address 0.
    pub fn memory(&self) -> &[BigInt] {
        self.memory.dense()
    }

    pub fn ip(&self) -> usize {
        self.registers.ip
    }

    pub fn relative_base(&self) -> &BigInt {
        &self.registers.relative_base
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn profile(&self) -> &ExecProfile {
        &self.profile
    }

    // ==================== Lifecycle ====================

    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ExecState::Ready
    }

    pub fn is_paused(&self) -> bool {
        self.state == ExecState::Paused
    }

    pub fn is_halted(&self) -> bool {
        self.state == ExecState::Halted
    }

    pub fn is_faulted(&self) -> bool {
        self.state == ExecState::Faulted
    }

    /// Restores the post-construction state.
    ///
    /// Memory returns to the program image, both registers to zero, and the
    /// input queue, output buffer and profile are cleared. The output sink is
    /// detached; register it again after resetting.
    pub fn reset(&mut self) {
        self.memory.load(self.program.cells());
        self.registers = Registers::new();
        self.input.clear();
        self.output = Output::default();
        self.profile = ExecProfile::new();
        self.state = ExecState::Ready;
        debug!("reset to {} cell image", self.program.len());
    }

    /// Captures memory, registers, queued input, buffered output, profile and state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            memory: self.memory.clone(),
            registers: self.registers.clone(),
            input: self.input.clone(),
            output: self.output.buffered().to_vec(),
            profile: self.profile.clone(),
            state: self.state,
        }
    }

    /// Rewinds to `snapshot`. The currently registered sink stays attached.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.memory = snapshot.memory.clone();
        self.registers = snapshot.registers.clone();
        self.input = snapshot.input.clone();
        self.output.set_buffered(snapshot.output.clone());
        self.profile = snapshot.profile.clone();
        self.state = snapshot.state;
    }
}

impl std::fmt::Debug for VM {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VM")
            .field("state", &self.state)
            .field("ip", &self.registers.ip)
            .field("relative_base", &self.registers.relative_base)
            .field("pending_input", &self.input.len())
            .field("memory_extent", &self.memory.extent())
            .finish()
    }
}
