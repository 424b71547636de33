use crate::virtual_machine::errors::UnknownParamMode;
use num_bigint::BigInt;
use num_traits::Signed;
use std::fmt;

/// How a raw parameter cell is interpreted.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ParamMode {
    /// The raw value is an address.
    Position = 0,
    /// The raw value is the value itself. Never writable.
    Immediate = 1,
    /// The raw value is an offset from the relative base.
    Relative = 2,
}

impl TryFrom<u8> for ParamMode {
    type Error = UnknownParamMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Position),
            1 => Ok(Self::Immediate),
            2 => Ok(Self::Relative),
            _ => Err(UnknownParamMode(value)),
        }
    }
}

/// A parameter cell together with the mode it was decoded with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operand {
    pub mode: ParamMode,
    pub raw: BigInt,
}

impl Operand {
    pub fn new(mode: ParamMode, raw: impl Into<BigInt>) -> Self {
        Self {
            mode,
            raw: raw.into(),
        }
    }

    /// Returns the memory address this operand refers to, before range checks.
    ///
    /// `None` for immediate operands, which name no cell.
    pub fn effective_address(&self, relative_base: &BigInt) -> Option<BigInt> {
        match self.mode {
            ParamMode::Position => Some(self.raw.clone()),
            ParamMode::Immediate => None,
            ParamMode::Relative => Some(relative_base + &self.raw),
        }
    }
}

/// Renders in disassembly syntax: `[12]`, `12`, `[rb+12]`, `[rb-3]`.
impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ParamMode::Position => write!(f, "[{}]", self.raw),
            ParamMode::Immediate => write!(f, "{}", self.raw),
            ParamMode::Relative if self.raw.is_negative() => {
                write!(f, "[rb-{}]", self.raw.abs())
            }
            ParamMode::Relative => write!(f, "[rb+{}]", self.raw),
        }
    }
}
