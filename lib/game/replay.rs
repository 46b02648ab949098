use super::GameRecord;
use crate::chess::{IllegalMove, Move, ParsePositionError, Position};
use derive_more::{Display, Error, From};
use pgn_reader::{BufferedReader, RawHeader, SanPlus, Skip, Visitor};
use std::{io, mem::take, vec};

/// The reason why a [`GameRecord`] could not be replayed.
#[derive(Debug, Display, Error, From)]
pub enum ReplayError {
    #[display(fmt = "failed to read the movetext")]
    Unreadable(io::Error),
    #[display(fmt = "the movetext holds no game")]
    #[from(ignore)]
    Empty,
    #[display(fmt = "invalid starting position")]
    InvalidFen(ParsePositionError),
    #[display(fmt = "illegal move at ply {_0}")]
    #[from(ignore)]
    IllegalMove(#[error(not(source))] usize, #[error(source)] IllegalMove),
}

#[derive(Default)]
struct Moves {
    fen: Option<String>,
    moves: Vec<SanPlus>,
}

impl Visitor for Moves {
    type Result = (Option<String>, Vec<SanPlus>);

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        if key == b"FEN" {
            self.fen = value.decode_utf8().ok().map(|v| v.trim().to_string());
        }
    }

    fn san(&mut self, sp: SanPlus) {
        self.moves.push(sp);
    }

    fn begin_variation(&mut self) -> Skip {
        Skip(true)
    }

    fn end_game(&mut self) -> Self::Result {
        (self.fen.take(), take(&mut self.moves))
    }
}

/// One position reached while replaying a game.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Snapshot {
    /// How many moves were played to reach this position, starting at 1.
    pub ply: usize,
    /// The position after the move.
    pub position: Position,
}

/// The sequence of positions reached in a [`GameRecord`], in order.
///
/// The starting position itself is not part of the sequence.
#[derive(Debug)]
pub struct Replay {
    position: Position,
    moves: vec::IntoIter<Move>,
    ply: usize,
}

impl Replay {
    /// Resolves every move of a [`GameRecord`].
    ///
    /// A game that holds any illegal move is rejected as a whole.
    pub fn new(game: &GameRecord) -> Result<Self, ReplayError> {
        let mut reader = BufferedReader::new_cursor(game.movetext.as_bytes());
        let (fen, sans) = reader
            .read_game(&mut Moves::default())?
            .ok_or(ReplayError::Empty)?;

        let start = match fen {
            Some(fen) => fen.parse()?,
            None => Position::default(),
        };

        let mut pos = start.clone();
        let mut moves = Vec::with_capacity(sans.len());
        for (i, sp) in sans.iter().enumerate() {
            let m = pos
                .resolve(&sp.to_string())
                .map_err(|e| ReplayError::IllegalMove(i + 1, e))?;
            pos.play(&m)
                .map_err(|e| ReplayError::IllegalMove(i + 1, e))?;
            moves.push(m);
        }

        Ok(Replay {
            position: start,
            moves: moves.into_iter(),
            ply: 0,
        })
    }
}

impl Iterator for Replay {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Self::Item> {
        let m = self.moves.next()?;
        self.position.play(&m).ok()?;
        self.ply += 1;

        Some(Snapshot {
            ply: self.ply,
            position: self.position.clone(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.moves.size_hint()
    }
}

impl ExactSizeIterator for Replay {}
