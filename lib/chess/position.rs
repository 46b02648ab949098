use super::{Color, Material, Piece, Role, Square};
use derive_more::{DebugCustom, Display, Error, From};
use shakmaty as sm;
use std::str::FromStr;

#[cfg(test)]
use proptest::{prelude::*, sample::Selector};

/// A legal chess move in some [`Position`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Move(sm::Move);

/// Represents an illegal move in a given [`Position`].
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "move `{_0}` is illegal in this position")]
pub struct IllegalMove(#[error(not(source))] pub String);

/// The reason why a piece could not be removed from a [`Position`].
#[derive(Debug, Display, Clone, Eq, PartialEq, Error, From)]
pub enum IllegalRemoval {
    #[display(fmt = "square `{_0}` is vacant")]
    Vacant(#[error(not(source))] Square),
    #[display(fmt = "removing the piece leads to an illegal position")]
    Illegal(IllegalPosition),
    #[display(fmt = "removing the piece leaves no legal moves")]
    Terminal,
}

/// The current position on the chess board.
///
/// This type guarantees that it only holds valid positions.
#[derive(DebugCustom, Display, Default, Clone, Eq, PartialEq)]
#[debug(fmt = "Position({self})")]
#[display(
    fmt = "{}",
    "sm::fen::Fen::from_position(self.0.clone(), sm::EnPassantMode::Legal)"
)]
pub struct Position(sm::Chess);

#[cfg(test)]
impl Arbitrary for Position {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (0..128usize, any::<Selector>())
            .prop_map(|(moves, selector)| {
                let mut chess = sm::Chess::default();

                for _ in 0..moves {
                    match selector.try_select(sm::Position::legal_moves(&chess)) {
                        None => break,
                        Some(m) => sm::Position::play_unchecked(&mut chess, &m),
                    }
                }

                Position(chess)
            })
            .boxed()
    }
}

impl Position {
    /// The side to move.
    pub fn turn(&self) -> Color {
        sm::Position::turn(&self.0).into()
    }

    /// An iterator over all pieces on the board, in ascending [`Square`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        (0..64)
            .map(Square::from_index)
            .filter_map(|s| Some((s, self.piece_on(s)?)))
    }

    /// The [`Piece`] on the given [`Square`], if any.
    pub fn piece_on(&self, s: Square) -> Option<Piece> {
        sm::Position::board(&self.0)
            .piece_at(s.into())
            .map(Piece::from)
    }

    /// The [`Material`] of the given [`Color`].
    pub fn material(&self, side: Color) -> Material {
        let mut material = Material::default();

        for (_, p) in self.iter().filter(|(_, p)| p.color() == side) {
            material.add(p.role());
        }

        material
    }

    /// Whether the side to move has no legal moves.
    pub fn is_terminal(&self) -> bool {
        sm::Position::legal_moves(&self.0).is_empty()
    }

    /// Resolves a move in [SAN] notation.
    ///
    /// [SAN]: https://www.chessprogramming.org/Algebraic_Chess_Notation#Standard_Algebraic_Notation_.28SAN.29
    pub fn resolve(&self, san: &str) -> Result<Move, IllegalMove> {
        let illegal = || IllegalMove(san.into());
        let san: sm::san::SanPlus = san.parse().map_err(|_| illegal())?;
        let m = san.san.to_move(&self.0).map_err(|_| illegal())?;
        Ok(Move(m))
    }

    /// Play a [`Move`] if legal in this position.
    pub fn play(&mut self, m: &Move) -> Result<(), IllegalMove> {
        if sm::Position::is_legal(&self.0, &m.0) {
            sm::Position::play_unchecked(&mut self.0, &m.0);
            Ok(())
        } else {
            Err(IllegalMove(m.0.to_string()))
        }
    }

    /// The position that results from vacating a [`Square`].
    ///
    /// Castling rights and en passant squares that no longer hold are dropped, any other
    /// inconsistency makes the removal illegal, as does leaving the side to move without moves.
    pub fn without(&self, s: Square) -> Result<Position, IllegalRemoval> {
        let mut setup = sm::Position::into_setup(self.0.clone(), sm::EnPassantMode::Legal);
        setup
            .board
            .remove_piece_at(s.into())
            .ok_or(IllegalRemoval::Vacant(s))?;

        let chess: sm::Chess = setup
            .position(sm::CastlingMode::Standard)
            .or_else(sm::PositionError::ignore_invalid_castling_rights)
            .or_else(sm::PositionError::ignore_invalid_ep_square)
            .map_err(IllegalPosition::from)?;

        let pos = Position(chess);

        if pos.is_terminal() {
            Err(IllegalRemoval::Terminal)
        } else {
            Ok(pos)
        }
    }
}

/// The reason why parsing the FEN string failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error, From)]
pub enum ParsePositionError {
    InvalidFen(InvalidFen),
    IllegalPosition(IllegalPosition),
}

/// The reason why the string is not valid FEN.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum InvalidFen {
    #[display(fmt = "syntax error at the piece placement field")]
    InvalidPlacement,
    #[display(fmt = "syntax error at the side to move field")]
    InvalidTurn,
    #[display(fmt = "syntax error at the castling rights field")]
    InvalidCastlingRights,
    #[display(fmt = "syntax error at the en passant square field")]
    InvalidEnPassantSquare,
    #[display(fmt = "syntax error at the halfmove clock field")]
    InvalidHalfmoveClock,
    #[display(fmt = "syntax error at the fullmove counter field")]
    InvalidFullmoves,
    #[display(fmt = "unspecified syntax error")]
    InvalidSyntax,
}

#[doc(hidden)]
impl From<sm::fen::ParseFenError> for InvalidFen {
    fn from(e: sm::fen::ParseFenError) -> Self {
        use InvalidFen::*;
        match e {
            sm::fen::ParseFenError::InvalidBoard => InvalidPlacement,
            sm::fen::ParseFenError::InvalidTurn => InvalidTurn,
            sm::fen::ParseFenError::InvalidCastling => InvalidCastlingRights,
            sm::fen::ParseFenError::InvalidEpSquare => InvalidEnPassantSquare,
            sm::fen::ParseFenError::InvalidHalfmoveClock => InvalidHalfmoveClock,
            sm::fen::ParseFenError::InvalidFullmoves => InvalidFullmoves,
            _ => InvalidSyntax,
        }
    }
}

/// The reason why a position is illegal.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum IllegalPosition {
    #[display(fmt = "at least one side has no king")]
    MissingKing,
    #[display(fmt = "at least one side has multiple kings")]
    TooManyKings,
    #[display(fmt = "there are pawns on the back-rank")]
    PawnsOnBackRank,
    #[display(fmt = "the player in check is not to move")]
    OppositeCheck,
    #[display(fmt = "the side to move is in a check no sequence of moves can lead to")]
    ImpossibleCheck,
    #[display(fmt = "invalid en passant square; wrong rank, occupied, or missing pushed pawn")]
    InvalidEnPassantSquare,
    #[display(fmt = "invalid castling rights")]
    InvalidCastlingRights,
    #[display(fmt = "no sequence of legal moves can reach this position")]
    Other,
}

#[doc(hidden)]
impl From<sm::PositionError<sm::Chess>> for IllegalPosition {
    fn from(e: sm::PositionError<sm::Chess>) -> Self {
        let kinds = e.kinds();

        if kinds.contains(sm::PositionErrorKinds::MISSING_KING) {
            IllegalPosition::MissingKing
        } else if kinds.contains(sm::PositionErrorKinds::TOO_MANY_KINGS) {
            IllegalPosition::TooManyKings
        } else if kinds.contains(sm::PositionErrorKinds::PAWNS_ON_BACKRANK) {
            IllegalPosition::PawnsOnBackRank
        } else if kinds.contains(sm::PositionErrorKinds::OPPOSITE_CHECK) {
            IllegalPosition::OppositeCheck
        } else if kinds.contains(sm::PositionErrorKinds::IMPOSSIBLE_CHECK) {
            IllegalPosition::ImpossibleCheck
        } else if kinds.contains(sm::PositionErrorKinds::INVALID_EP_SQUARE) {
            IllegalPosition::InvalidEnPassantSquare
        } else if kinds.contains(sm::PositionErrorKinds::INVALID_CASTLING_RIGHTS) {
            IllegalPosition::InvalidCastlingRights
        } else {
            IllegalPosition::Other
        }
    }
}

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fen: sm::fen::Fen = s.parse().map_err(InvalidFen::from)?;
        let chess: sm::Chess = sm::Setup::from(fen)
            .position(sm::CastlingMode::Standard)
            .map_err(IllegalPosition::from)?;

        Ok(Position(chess))
    }
}
