//! The Luby sequence of restart intervals.

/// Iterator state for the Luby sequence 1, 1, 2, 1, 1, 2, 4, 1, ...
#[derive(Default, Clone)]
pub struct LubySequence {
    index: u64,
}

impl LubySequence {
    /// Returns the next term.
    pub fn advance(&mut self) -> u64 {
        self.index += 1;
        luby(self.index)
    }
}

/// The `i`-th term, 1-based.
fn luby(mut i: u64) -> u64 {
    loop {
        // Smallest k with i <= 2^k - 1
        let mut k = 1;
        while (1u64 << k) - 1 < i {
            k += 1;
        }
        if i == (1u64 << k) - 1 {
            return 1u64 << (k - 1);
        }
        i -= (1u64 << (k - 1)) - 1;
    }
}
