//! Variables and literals.
//!
//! Both are thin wrappers around a 32 bit index. Internally variables are numbered from 0, for
//! DIMACS input and output they are numbered from 1 so that negative numbers can denote negated
//! variables.
use std::{fmt, ops};

/// Integer type backing [`Var`] and [`Lit`].
pub type LitIdx = u32;

/// A boolean variable without polarity.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var {
    index: LitIdx,
}

impl Var {
    /// The variable with the 0-based index `index`.
    #[inline]
    pub fn from_index(index: usize) -> Var {
        debug_assert!(index <= Var::max_var().index());
        Var {
            index: index as LitIdx,
        }
    }

    /// The variable with the 1-based DIMACS number `number`, which has to be positive.
    #[inline]
    pub fn from_dimacs(number: isize) -> Var {
        debug_assert!(number > 0);
        Var::from_index((number - 1) as usize)
    }

    /// 0-based index of this variable.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// 1-based DIMACS number of this variable.
    #[inline]
    pub fn to_dimacs(self) -> isize {
        self.index as isize + 1
    }

    /// Largest supported variable.
    ///
    /// Four bits are reserved so that literal codes and sentinels fit into a [`LitIdx`].
    pub const fn max_var() -> Var {
        Var {
            index: LitIdx::max_value() >> 4,
        }
    }

    /// Largest supported number of variables.
    pub const fn max_count() -> usize {
        Self::max_var().index() + 1
    }

    /// The variable `offset` places after this one.
    ///
    /// Used to map a variable of a formula to its copy in a duplicated formula.
    #[inline]
    pub fn shifted(self, offset: usize) -> Var {
        Var::from_index(self.index() + offset)
    }

    /// Literal of this variable, positive if `polarity` is true.
    #[inline]
    pub fn lit(self, polarity: bool) -> Lit {
        Lit::from_var(self, polarity)
    }

    /// Positive literal of this variable.
    #[inline]
    pub fn positive(self) -> Lit {
        Lit::positive(self)
    }

    /// Negative literal of this variable.
    #[inline]
    pub fn negative(self) -> Lit {
        Lit::negative(self)
    }
}

/// Uses the 1-based DIMACS numbering.
impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// Uses the 1-based DIMACS numbering.
impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A variable together with a polarity.
///
/// The `code` of a literal is twice the variable index, plus one for negative literals. Negation
/// toggles the lowest bit. Codes are used to index per-literal tables such as watchlists and
/// occurrence counts.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Lit {
    code: LitIdx,
}

impl Lit {
    /// Literal of `var`, positive if `polarity` is true.
    #[inline]
    pub fn from_var(var: Var, polarity: bool) -> Lit {
        Lit {
            code: (var.index << 1) | (!polarity as LitIdx),
        }
    }

    /// Positive literal of `var`.
    #[inline]
    pub fn positive(var: Var) -> Lit {
        Lit::from_var(var, true)
    }

    /// Negative literal of `var`.
    #[inline]
    pub fn negative(var: Var) -> Lit {
        Lit::from_var(var, false)
    }

    /// Literal of the variable with 0-based index `index`.
    #[inline]
    pub fn from_index(index: usize, polarity: bool) -> Lit {
        Lit::from_var(Var::from_index(index), polarity)
    }

    /// Literal with the given code.
    #[inline]
    pub fn from_code(code: usize) -> Lit {
        debug_assert!(code <= Var::max_var().index() * 2 + 1);
        Lit {
            code: code as LitIdx,
        }
    }

    /// Literal from a signed DIMACS number.
    #[inline]
    pub fn from_dimacs(number: isize) -> Lit {
        Lit::from_var(Var::from_dimacs(number.abs()), number > 0)
    }

    /// Signed DIMACS number of this literal.
    #[inline]
    pub fn to_dimacs(self) -> isize {
        let number = self.var().to_dimacs();
        if self.is_negative() {
            -number
        } else {
            number
        }
    }

    /// The variable of this literal.
    #[inline]
    pub fn var(self) -> Var {
        Var {
            index: self.code >> 1,
        }
    }

    /// 0-based index of this literal's variable.
    #[inline]
    pub fn index(self) -> usize {
        (self.code >> 1) as usize
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.code & 1 != 0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        !self.is_negative()
    }

    /// Code used to index per-literal tables.
    #[inline]
    pub fn code(self) -> usize {
        self.code as usize
    }

    /// The same polarity on the variable `offset` places after this literal's variable.
    #[inline]
    pub fn shifted(self, offset: usize) -> Lit {
        self.map_var(|var| var.shifted(offset))
    }

    /// Replace the variable while keeping the polarity.
    #[inline]
    pub fn map_var(self, f: impl FnOnce(Var) -> Var) -> Lit {
        f(self.var()).lit(self.is_positive())
    }
}

impl ops::Not for Lit {
    type Output = Lit;

    #[inline]
    fn not(self) -> Lit {
        Lit {
            code: self.code ^ 1,
        }
    }
}

/// Conditional negation.
impl ops::BitXor<bool> for Lit {
    type Output = Lit;

    #[inline]
    fn bitxor(self, rhs: bool) -> Lit {
        Lit {
            code: self.code ^ (rhs as LitIdx),
        }
    }
}

impl From<Var> for Lit {
    #[inline]
    fn from(var: Var) -> Lit {
        Lit::positive(var)
    }
}

/// Uses the signed DIMACS numbering.
impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// Uses the signed DIMACS numbering.
impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;
    use proptest::{prelude::*, *};

    pub fn var(index: impl Strategy<Value = usize>) -> impl Strategy<Value = Var> {
        index.prop_map(Var::from_index)
    }

    pub fn lit(index: impl Strategy<Value = usize>) -> impl Strategy<Value = Lit> {
        (var(index), bool::ANY).prop_map(|(var, polarity)| var.lit(polarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimacs_numbering() {
        assert_eq!(Var::from_dimacs(1).index(), 0);
        assert_eq!(Lit::from_dimacs(-3).var(), Var::from_index(2));
        assert!(Lit::from_dimacs(-3).is_negative());
        assert_eq!(Lit::from_dimacs(-3).to_dimacs(), -3);
        assert_eq!(!Lit::from_dimacs(5), Lit::from_dimacs(-5));
    }

    #[test]
    fn shifting_keeps_polarity() {
        let lit = Lit::from_dimacs(-2);
        let shifted = lit.shifted(10);
        assert_eq!(shifted.to_dimacs(), -12);
        assert_eq!(Var::from_dimacs(2).shifted(10), shifted.var());
        assert_eq!(lit ^ true, !lit);
        assert_eq!(lit ^ false, lit);
    }
}
