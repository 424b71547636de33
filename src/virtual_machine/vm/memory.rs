use num_bigint::BigInt;
use std::collections::BTreeMap;

/// Largest distance past the dense end that a write may extend the dense region by.
///
/// Writes further out land in the sparse map instead, so a single store to a
/// huge address does not allocate every cell before it.
const MAX_DENSE_GAP: usize = 1 << 16;

static ZERO: BigInt = BigInt::ZERO;

/// Logically infinite, zero-initialized memory of big integers.
///
/// Memory layout: `[dense region][sparse cells]`
/// - **Dense region**: a contiguous vector starting at address 0, seeded from the
///   program image and grown with zero-fill.
/// - **Sparse cells**: isolated writes far beyond the dense end.
///
/// Every sparse address is `>= dense.len()`; growing the dense region folds in
/// any sparse cells it now covers. Addresses never written read as zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Memory {
    dense: Vec<BigInt>,
    sparse: BTreeMap<usize, BigInt>,
}

impl Memory {
    /// Creates memory holding `image` at addresses `0..image.len()`.
    pub(super) fn new(image: Vec<BigInt>) -> Self {
        Self {
            dense: image,
            sparse: BTreeMap::new(),
        }
    }

    /// Returns the value at `address`, zero if it was never written.
    pub(super) fn get(&self, address: usize) -> &BigInt {
        match self.dense.get(address) {
            Some(value) => value,
            None => self.sparse.get(&address).unwrap_or(&ZERO),
        }
    }

    /// Stores `value` at `address`, growing storage as needed.
    pub(super) fn set(&mut self, address: usize, value: BigInt) {
        if let Some(slot) = self.dense.get_mut(address) {
            *slot = value;
            return;
        }

        if address - self.dense.len() < MAX_DENSE_GAP {
            self.grow_dense(address + 1);
            self.dense[address] = value;
        } else {
            self.sparse.insert(address, value);
        }
    }

    /// Extends the dense region to `new_len` cells, zero-filled, absorbing sparse cells below it.
    fn grow_dense(&mut self, new_len: usize) {
        let start = self.dense.len();
        self.dense.resize(new_len, BigInt::ZERO);

        if self.sparse.is_empty() {
            return;
        }
        let above = self.sparse.split_off(&new_len);
        let covered = std::mem::replace(&mut self.sparse, above);
        for (address, value) in covered {
            debug_assert!(address >= start);
            self.dense[address] = value;
        }
    }

    /// Replaces the whole contents with `image`, dropping every other cell.
    pub(super) fn load(&mut self, image: &[BigInt]) {
        self.dense.clear();
        self.dense.extend_from_slice(image);
        self.sparse.clear();
    }

    /// Returns one past the highest address that has backing storage.
    ///
    /// Saturates at `usize::MAX` when the last address itself is written.
    pub(super) fn extent(&self) -> usize {
        self.sparse
            .last_key_value()
            .map_or(self.dense.len(), |(address, _)| address.saturating_add(1))
    }

    /// Returns the dense region, the contiguous cells starting at address 0.
    pub(super) fn dense(&self) -> &[BigInt] {
        &self.dense
    }
}
