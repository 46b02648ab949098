use super::{GameId, PieceValueRow};
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashSet;

/// Clamps the piece value of a row to the [cap][`crate::chess::Role::cap`] of its role.
///
/// Returns whether the value changed.
pub fn cap(row: &mut PieceValueRow) -> bool {
    let cap = row.piece_type.role().cap();
    let capped = row.piece_value.clamp(-cap, cap);
    let changed = capped != row.piece_value;
    row.piece_value = capped;
    changed
}

/// A dataset split in two disjoint sets of games.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Split {
    pub train: Vec<PieceValueRow>,
    pub validation: Vec<PieceValueRow>,
}

/// Assigns whole games either to training or to validation.
///
/// Distinct games are shuffled in order of first appearance with a seeded generator and the
/// first `floor(fraction * games)` go to training. Rows keep their relative order.
pub fn split(rows: Vec<PieceValueRow>, fraction: f64, seed: u64) -> Split {
    let mut seen = HashSet::new();
    let mut games: Vec<GameId> = rows
        .iter()
        .map(|r| r.game_id)
        .filter(|id| seen.insert(*id))
        .collect();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    games.shuffle(&mut rng);

    let n = (fraction.clamp(0., 1.) * games.len() as f64).floor() as usize;
    let chosen: HashSet<_> = games[..n].iter().copied().collect();

    let (train, validation) = rows
        .into_iter()
        .partition(|r| chosen.contains(&r.game_id));

    Split { train, validation }
}
