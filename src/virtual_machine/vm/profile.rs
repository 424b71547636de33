/// Number of instruction categories tracked by [`ExecProfile`].
const CATEGORY_COUNT: usize = 6;

/// Categories of executed instructions for profiling.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum InstrCategory {
    /// `ADD`, `MUL`.
    Arithmetic = 0,
    /// `LT`, `EQ`.
    Comparison = 1,
    /// `JNZ`, `JZ`.
    ControlFlow = 2,
    /// `IN`, `OUT`. Suspended `IN` attempts are not counted.
    Io = 3,
    /// `ARB`.
    Base = 4,
    /// `HALT`.
    Halt = 5,
}

impl InstrCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InstrCategory::Arithmetic => "Arithmetic",
            InstrCategory::Comparison => "Comparison",
            InstrCategory::ControlFlow => "Control Flow",
            InstrCategory::Io => "I/O",
            InstrCategory::Base => "Relative Base",
            InstrCategory::Halt => "Halt",
        }
    }

    /// All categories in discriminant order.
    const ALL: [InstrCategory; CATEGORY_COUNT] = [
        InstrCategory::Arithmetic,
        InstrCategory::Comparison,
        InstrCategory::ControlFlow,
        InstrCategory::Io,
        InstrCategory::Base,
        InstrCategory::Halt,
    ];
}

/// Execution profile of a machine since construction or the last reset.
///
/// Counts executed instructions per [`InstrCategory`] plus the number of times
/// the machine suspended waiting for input. Backed by a flat array indexed by
/// category discriminant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecProfile {
    counts: [u64; CATEGORY_COUNT],
    suspensions: u64,
}

impl ExecProfile {
    /// Creates a new empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one executed instruction of the given category.
    #[inline(always)]
    pub(super) fn record(&mut self, category: InstrCategory) {
        let slot = &mut self.counts[category as usize];
        *slot = slot.saturating_add(1);
    }

    /// Records one suspension on an empty input queue.
    pub(super) fn record_suspension(&mut self) {
        self.suspensions = self.suspensions.saturating_add(1);
    }

    /// Returns the number of executed instructions in `category`.
    pub fn count(&self, category: InstrCategory) -> u64 {
        self.counts[category as usize]
    }

    /// Returns the total number of executed instructions.
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |acc, &v| acc.saturating_add(v))
    }

    /// Returns how many times the machine paused on input.
    pub fn suspensions(&self) -> u64 {
        self.suspensions
    }

    /// Returns an iterator over all categories and their counts.
    pub fn iter(&self) -> impl Iterator<Item = (InstrCategory, u64)> {
        InstrCategory::ALL.into_iter().zip(self.counts)
    }
}
