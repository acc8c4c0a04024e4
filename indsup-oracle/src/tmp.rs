//! Temporary data.
use indsup_formula::Lit;

/// Scratch buffers shared by several parts of the oracle.
///
/// Every user has to leave `flags` all-false.
#[derive(Default, Clone)]
pub struct TmpData {
    pub lits: Vec<Lit>,
    /// A boolean for each literal code.
    pub flags: Vec<bool>,
}

impl TmpData {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.flags.resize(count * 2, false);
    }
}
