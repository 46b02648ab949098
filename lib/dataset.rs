use crate::chess::{Color, Material, Piece};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::{io, str::FromStr};

#[cfg(test)]
use proptest::prelude::*;

mod file;
mod split;
mod summary;

pub use file::*;
pub use split::*;
pub use summary::*;

/// Identifies a game by the worker that replayed it and its position in that worker's slice.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "w{worker}_g{game}")]
#[serde(into = "String", try_from = "String")]
pub struct GameId {
    pub worker: usize,
    pub game: usize,
}

/// The reason why parsing [`GameId`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "`{_0}` is not of the form `w<worker>_g<game>`")]
pub struct ParseGameIdError(#[error(not(source))] pub String);

impl FromStr for GameId {
    type Err = ParseGameIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseGameIdError(s.into());
        let (worker, game) = s
            .strip_prefix('w')
            .and_then(|s| s.split_once("_g"))
            .ok_or_else(invalid)?;

        Ok(GameId {
            worker: worker.parse().map_err(|_| invalid())?,
            game: game.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for GameId {
    type Error = ParseGameIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[doc(hidden)]
impl From<GameId> for String {
    fn from(id: GameId) -> Self {
        id.to_string()
    }
}

/// The value of one piece in one position.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct PieceValueRow {
    pub game_id: GameId,
    /// The position in [FEN] notation.
    ///
    /// [FEN]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
    pub fen: String,
    /// How many moves into the game, counted in plies.
    pub move_number: usize,
    pub side_to_move: Color,
    pub eco_code: String,
    pub opening: String,
    pub white_material: Material,
    pub black_material: Material,
    pub piece_type: Piece,
    #[cfg_attr(test, strategy(0u8..8))]
    pub rank: u8,
    #[cfg_attr(test, strategy(0u8..8))]
    pub file: u8,
    #[cfg_attr(test, strategy(-100_000i32..100_000))]
    pub original_eval: i32,
    #[cfg_attr(test, strategy(-100_000i32..100_000))]
    pub eval_without_piece: i32,
    #[cfg_attr(test, strategy(Just(#original_eval - #eval_without_piece)))]
    pub piece_value: i32,
}

/// Trait for types that collect [`PieceValueRow`]s.
pub trait Sink {
    /// Appends a row.
    fn append(&mut self, row: PieceValueRow) -> io::Result<()>;
}

impl Sink for Vec<PieceValueRow> {
    fn append(&mut self, row: PieceValueRow) -> io::Result<()> {
        self.push(row);
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn append(&mut self, row: PieceValueRow) -> io::Result<()> {
        (**self).append(row)
    }
}
