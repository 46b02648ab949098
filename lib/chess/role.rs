use derive_more::Display;
use shakmaty as sm;

/// The type of a chess [`Piece`][`super::Piece`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Role {
    #[display(fmt = "pawn")]
    Pawn,
    #[display(fmt = "knight")]
    Knight,
    #[display(fmt = "bishop")]
    Bishop,
    #[display(fmt = "rook")]
    Rook,
    #[display(fmt = "queen")]
    Queen,
    #[display(fmt = "king")]
    King,
}

impl Role {
    /// All roles, from least to most valuable.
    pub const ALL: [Role; 6] = [
        Role::Pawn,
        Role::Knight,
        Role::Bishop,
        Role::Rook,
        Role::Queen,
        Role::King,
    ];

    /// The lowercase letter of this role in [FEN] notation.
    ///
    /// [FEN]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
    pub fn char(&self) -> char {
        match self {
            Role::Pawn => 'p',
            Role::Knight => 'n',
            Role::Bishop => 'b',
            Role::Rook => 'r',
            Role::Queen => 'q',
            Role::King => 'k',
        }
    }

    /// The [`Role`] denoted by a letter in either case.
    pub fn from_char(c: char) -> Option<Self> {
        Role::ALL
            .into_iter()
            .find(|r| r.char() == c.to_ascii_lowercase())
    }

    /// The largest magnitude, in centipawns, a measured value of this role is trusted up to.
    ///
    /// Five times the nominal value of the role; kings carry no material value.
    pub fn cap(&self) -> i32 {
        match self {
            Role::Pawn => 500,
            Role::Knight => 1500,
            Role::Bishop => 1500,
            Role::Rook => 2500,
            Role::Queen => 5000,
            Role::King => 0,
        }
    }
}

#[doc(hidden)]
impl From<sm::Role> for Role {
    fn from(r: sm::Role) -> Self {
        match r {
            sm::Role::Pawn => Role::Pawn,
            sm::Role::Knight => Role::Knight,
            sm::Role::Bishop => Role::Bishop,
            sm::Role::Rook => Role::Rook,
            sm::Role::Queen => Role::Queen,
            sm::Role::King => Role::King,
        }
    }
}

#[doc(hidden)]
impl From<Role> for sm::Role {
    fn from(r: Role) -> Self {
        match r {
            Role::Pawn => sm::Role::Pawn,
            Role::Knight => sm::Role::Knight,
            Role::Bishop => sm::Role::Bishop,
            Role::Rook => sm::Role::Rook,
            Role::Queen => sm::Role::Queen,
            Role::King => sm::Role::King,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn role_has_an_equivalent_shakmaty_representation(r: Role) {
        assert_eq!(Role::from(sm::Role::from(r)), r);
    }

    #[proptest]
    fn role_char_matches_shakmaty(r: Role) {
        assert_eq!(r.char(), sm::Role::from(r).char());
    }

    #[proptest]
    fn parsing_role_char_is_an_identity_in_either_case(r: Role) {
        assert_eq!(Role::from_char(r.char()), Some(r));
        assert_eq!(Role::from_char(r.char().to_ascii_uppercase()), Some(r));
    }

    #[proptest]
    fn parsing_role_fails_if_not_one_of_pnbrqk(
        #[filter(!"pnbrqkPNBRQK".contains(#c))] c: char,
    ) {
        assert_eq!(Role::from_char(c), None);
    }

    #[test]
    fn roles_are_ordered_by_value() {
        assert!(Role::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn every_role_has_exactly_one_cap() {
        let caps: Vec<_> = Role::ALL.iter().map(Role::cap).collect();
        assert_eq!(caps, [500, 1500, 1500, 2500, 5000, 0]);
    }
}
