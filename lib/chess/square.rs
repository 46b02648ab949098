use derive_more::Display;
use shakmaty as sm;

/// A square of the chess board.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[display(fmt = "{}", _0)]
pub struct Square(sm::Square);

impl Square {
    /// Constructs [`Square`] from its index, `a1` being 0 and `h8` being 63.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not in the range (0..64).
    pub fn from_index(i: u8) -> Self {
        assert!(i < 64, "square index {i} out of range");
        Square(sm::Square::new(i.into()))
    }

    /// This square's index in the range (0..64).
    pub fn index(&self) -> u8 {
        self.0 as u8
    }

    /// The file of this square, `a` being 0.
    pub fn file(&self) -> u8 {
        self.index() % 8
    }

    /// The rank of this square, the first rank being 0.
    pub fn rank(&self) -> u8 {
        self.index() / 8
    }
}

#[doc(hidden)]
impl From<sm::Square> for Square {
    fn from(s: sm::Square) -> Self {
        Square(s)
    }
}

#[doc(hidden)]
impl From<Square> for sm::Square {
    fn from(s: Square) -> Self {
        s.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn square_index_is_an_identity(#[strategy(0u8..64)] i: u8) {
        assert_eq!(Square::from_index(i).index(), i);
    }

    #[proptest]
    fn file_and_rank_are_within_the_board(#[strategy(0u8..64)] i: u8) {
        let s = Square::from_index(i);
        assert!(s.file() < 8);
        assert!(s.rank() < 8);
        assert_eq!(s.rank() * 8 + s.file(), i);
    }

    #[proptest]
    fn file_and_rank_match_shakmaty(#[strategy(0u8..64)] i: u8) {
        let s = Square::from_index(i);
        assert_eq!(u32::from(s.file()), u32::from(sm::Square::from(s).file()));
        assert_eq!(u32::from(s.rank()), u32::from(sm::Square::from(s).rank()));
    }

    #[test]
    fn square_prints_in_algebraic_notation() {
        assert_eq!(Square::from_index(28).to_string(), "e4");
    }

    #[proptest]
    #[should_panic]
    fn from_index_panics_if_out_of_range(#[strategy(64u8..)] i: u8) {
        Square::from_index(i);
    }
}
