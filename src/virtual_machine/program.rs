//! Program images.
//!
//! A [`Program`] is the initial memory image of a machine: an ordered list of
//! big integers loaded at addresses `0..len`. The textual form is the usual
//! comma-separated list, e.g. `1,9,10,3,2,3,11,0,99,30,40,50`.

use crate::virtual_machine::errors::VMError;
use num_bigint::BigInt;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const SEPARATOR: char = ',';

/// Immutable initial memory image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    cells: Vec<BigInt>,
}

impl Program {
    pub fn new(cells: Vec<BigInt>) -> Self {
        Self { cells }
    }

    /// Reads and parses a program file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VMError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| VMError::Io {
            path: path.display().to_string(),
            source,
        })?;
        source.parse()
    }

    pub fn cells(&self) -> &[BigInt] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn into_cells(self) -> Vec<BigInt> {
        self.cells
    }
}

/// Parses a comma-separated list of integers.
///
/// Whitespace around cells (including newlines) is ignored and one trailing
/// comma is accepted. Any other empty cell is an error, as is blank input.
impl FromStr for Program {
    type Err = VMError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let trimmed = source.trim();
        let body = trimmed.strip_suffix(SEPARATOR).unwrap_or(trimmed);

        body.split(SEPARATOR)
            .enumerate()
            .map(|(index, token)| {
                let token = token.trim();
                token.parse::<BigInt>().map_err(|_| VMError::ParseError {
                    index,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{cell}")?;
        }
        Ok(())
    }
}

impl From<Vec<BigInt>> for Program {
    fn from(cells: Vec<BigInt>) -> Self {
        Self::new(cells)
    }
}

impl From<Vec<i64>> for Program {
    fn from(cells: Vec<i64>) -> Self {
        cells.into_iter().collect()
    }
}

impl From<&[i64]> for Program {
    fn from(cells: &[i64]) -> Self {
        cells.iter().copied().collect()
    }
}

impl<T: Into<BigInt>> FromIterator<T> for Program {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
