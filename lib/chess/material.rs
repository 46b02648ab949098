use super::Role;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Formatter, Write};

/// The pieces one side has on the board, counted by [`Role`].
///
/// Printed from least to most valuable role, pawns as `p` and every other role in uppercase,
/// so the starting material reads `ppppppppNNBBRRQK`.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(into = "String", try_from = "String")]
pub struct Material(#[cfg_attr(test, strategy(proptest::array::uniform6(0u8..10)))] [u8; 6]);

impl Material {
    /// How many pieces of a [`Role`].
    pub fn count(&self, r: Role) -> u8 {
        self.0[r as usize]
    }

    /// Adds a piece of a [`Role`].
    pub fn add(&mut self, r: Role) {
        self.0[r as usize] += 1;
    }

    /// The total number of pieces.
    pub fn len(&self) -> usize {
        self.0.iter().map(|&n| n as usize).sum()
    }

    fn symbol(r: Role) -> char {
        match r {
            Role::Pawn => 'p',
            r => r.char().to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for r in Role::ALL {
            for _ in 0..self.count(r) {
                f.write_char(Material::symbol(r))?;
            }
        }

        Ok(())
    }
}

/// The reason why parsing [`Material`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum ParseMaterialError {
    #[display(fmt = "`{_0}` is not one of `pNBRQK`")]
    InvalidSymbol(#[error(not(source))] char),

    #[display(fmt = "too many pieces of role {_0}")]
    TooMany(#[error(not(source))] Role),
}

impl TryFrom<String> for Material {
    type Error = ParseMaterialError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let mut material = Material::default();

        for c in s.chars() {
            match Role::from_char(c) {
                Some(r) if Material::symbol(r) == c => {
                    let n = &mut material.0[r as usize];
                    *n = n.checked_add(1).ok_or(ParseMaterialError::TooMany(r))?;
                }

                _ => return Err(ParseMaterialError::InvalidSymbol(c)),
            }
        }

        Ok(material)
    }
}

#[doc(hidden)]
impl From<Material> for String {
    fn from(m: Material) -> Self {
        m.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn parsing_printed_material_is_an_identity(m: Material) {
        assert_eq!(Material::try_from(m.to_string()), Ok(m));
    }

    #[proptest]
    fn printed_material_has_one_symbol_per_piece(m: Material) {
        assert_eq!(m.to_string().chars().count(), m.len());
    }

    #[proptest]
    fn adding_a_piece_increments_its_count(mut m: Material, r: Role) {
        let n = m.count(r);
        m.add(r);
        assert_eq!(m.count(r), n + 1);
    }

    #[test]
    fn material_is_printed_from_least_to_most_valuable() {
        let mut m = Material::default();
        for r in [Role::King, Role::Queen, Role::Pawn, Role::Knight, Role::Pawn] {
            m.add(r);
        }

        assert_eq!(m.to_string(), "ppNQK");
    }

    #[proptest]
    fn parsing_material_fails_on_unexpected_symbols(
        #[filter(!"pNBRQK".contains(#c))] c: char,
    ) {
        assert_eq!(
            Material::try_from(c.to_string()),
            Err(ParseMaterialError::InvalidSymbol(c))
        );
    }

    #[proptest]
    fn parsing_material_fails_on_too_many_pieces(r: Role, #[strategy(256usize..512)] n: usize) {
        let s = Material::symbol(r).to_string().repeat(n);
        assert_eq!(Material::try_from(s), Err(ParseMaterialError::TooMany(r)));
    }
}
