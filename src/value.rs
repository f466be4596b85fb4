//! Fixed-width value kinds that can live in a slot.

use core::fmt;

mod sealed {
    pub trait Sealed {}

    impl Sealed for u64 {}
    impl Sealed for f64 {}
}

/// A value that occupies exactly one 64-bit word of a slot.
///
/// Sealed: the slot layout is shared with other readers, so the value kinds
/// are fixed to `u64` and `f64`. Every word round-trips:
/// `from_word(v.to_word()) == v` for every value that compares equal to
/// itself. The word is stored in native byte order, so an `f64` slot holds
/// the same bytes as a C `double`.
///
/// Other types cannot implement it:
///
/// ```compile_fail
/// use int_hashmap::Storable;
///
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// struct Tag(u64);
///
/// impl Storable for Tag {
///     const KIND: &'static str = "tag";
///
///     fn to_word(self) -> u64 {
///         self.0
///     }
///
///     fn from_word(word: u64) -> Self {
///         Tag(word)
///     }
/// }
/// ```
pub trait Storable: sealed::Sealed + Copy + PartialEq + fmt::Debug + 'static {
    /// Short name of the value kind, used in diagnostics.
    const KIND: &'static str;

    fn to_word(self) -> u64;

    fn from_word(word: u64) -> Self;
}

impl Storable for u64 {
    const KIND: &'static str = "int";

    #[inline]
    fn to_word(self) -> u64 {
        self
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        word
    }
}

impl Storable for f64 {
    const KIND: &'static str = "float";

    #[inline]
    fn to_word(self) -> u64 {
        self.to_bits()
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        f64::from_bits(word)
    }
}

#[cfg(test)]
mod tests {
    use super::Storable;

    #[test]
    fn float_word_is_ieee_bits() {
        let v = -2.5f64;
        assert_eq!(v.to_word(), v.to_bits());
        assert_eq!(f64::from_word(v.to_word()), v);
    }

    #[test]
    fn int_word_is_identity() {
        assert_eq!(u64::MAX.to_word(), u64::MAX);
        assert_eq!(u64::from_word(7), 7);
    }
}
