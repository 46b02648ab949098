use serde::{Deserialize, Serialize};

/// A recorded chess game.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct GameRecord {
    /// The position of this game in its source, starting at 0.
    pub index: usize,

    /// The moves of this game in [SAN], optionally preceded by a `[FEN "..."]` tag.
    ///
    /// [SAN]: https://www.chessprogramming.org/Algebraic_Chess_Notation#Standard_Algebraic_Notation_.28SAN.29
    pub movetext: String,

    /// The [ECO] code of the opening, if known.
    ///
    /// [ECO]: https://www.chessprogramming.org/ECO
    pub opening_code: Option<String>,
}
