use num_bigint::BigInt;

/// The machine's two registers.
///
/// `ip` addresses the next opcode cell. `relative_base` is added to
/// relative-mode parameters and only changes through `ARB`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(super) struct Registers {
    pub(super) ip: usize,
    pub(super) relative_base: BigInt,
}

impl Registers {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` to the relative base.
    pub(super) fn adjust_base(&mut self, delta: &BigInt) {
        self.relative_base += delta;
    }
}
