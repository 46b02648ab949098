use super::{GameId, PieceValueRow};
use std::collections::{BTreeMap, HashSet};
use std::fmt::{self, Display, Formatter};

/// Aggregate statistics of a dataset.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Summary {
    /// The number of distinct games.
    pub games: usize,
    /// The number of distinct positions.
    pub positions: usize,
    /// The number of rows.
    pub rows: usize,
    /// The number of rows per piece symbol.
    pub pieces: BTreeMap<char, usize>,
    /// The smallest, largest and mean piece value, if there are any rows.
    pub values: Option<(i32, i32, f64)>,
}

impl Summary {
    /// Summarizes `rows`.
    pub fn new<'a, I: IntoIterator<Item = &'a PieceValueRow>>(rows: I) -> Self {
        let mut games = HashSet::<GameId>::new();
        let mut positions = HashSet::<&str>::new();
        let mut summary = Summary::default();
        let mut sum = 0i64;

        for row in rows {
            games.insert(row.game_id);
            positions.insert(&row.fen);
            summary.rows += 1;
            *summary.pieces.entry(row.piece_type.char()).or_default() += 1;
            sum += i64::from(row.piece_value);

            summary.values = Some(match summary.values {
                None => (row.piece_value, row.piece_value, 0.),
                Some((min, max, _)) => (min.min(row.piece_value), max.max(row.piece_value), 0.),
            });
        }

        if let Some((_, _, mean)) = &mut summary.values {
            *mean = sum as f64 / summary.rows as f64;
        }

        summary.games = games.len();
        summary.positions = positions.len();
        summary
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows from {} positions in {} games",
            self.rows, self.positions, self.games
        )?;

        if let Some((min, max, mean)) = self.values {
            write!(f, ", piece value in [{min}, {max}] with mean {mean:.1}")?;
        }

        let pieces: Vec<_> = self.pieces.iter().map(|(p, n)| format!("{p}:{n}")).collect();
        if !pieces.is_empty() {
            write!(f, ", per piece {{{}}}", pieces.join(", "))?;
        }

        Ok(())
    }
}
