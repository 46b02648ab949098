use crate::ablation::ablate;
use crate::chess::Color;
use crate::dataset::{GameId, PieceValueRow, Sink};
use crate::eval::{Evaluation, Oracle};
use crate::game::{GameRecord, Replay};
use crate::opening::opening_name;
use derive_more::{Add, AddAssign, Display};
use serde::{Deserialize, Serialize};
use std::{io, iter::Sum};
use tracing::{debug, info, instrument, warn};

/// Counters accumulated by a [`Worker`].
#[derive(
    Debug, Display, Default, Copy, Clone, Eq, PartialEq, Hash, Add, AddAssign, Deserialize, Serialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(
    fmt = "{games_processed} games ({games_failed} failed), {positions_scored} positions scored \
           ({positions_terminal} terminal), {rows_produced} rows, {timeouts_or_errors} timeouts or errors"
)]
#[serde(default)]
pub struct WorkerStats {
    /// Games replayed to the end.
    #[cfg_attr(test, strategy(0u64..1 << 32))]
    pub games_processed: u64,
    /// Games rejected because their movetext could not be replayed.
    #[cfg_attr(test, strategy(0u64..1 << 32))]
    pub games_failed: u64,
    /// Positions with a numeric baseline score.
    #[cfg_attr(test, strategy(0u64..1 << 32))]
    pub positions_scored: u64,
    /// Checkmate or stalemate positions, which are never scored.
    #[cfg_attr(test, strategy(0u64..1 << 32))]
    pub positions_terminal: u64,
    /// Rows appended to the sink.
    #[cfg_attr(test, strategy(0u64..1 << 32))]
    pub rows_produced: u64,
    /// Evaluations that timed out, failed or found a forced mate.
    #[cfg_attr(test, strategy(0u64..1 << 32))]
    pub timeouts_or_errors: u64,
}

impl WorkerStats {
    /// The share of attempted evaluations that produced no row.
    pub fn failure_rate(&self) -> f64 {
        let attempts = self.rows_produced + self.timeouts_or_errors;
        if attempts == 0 {
            0.
        } else {
            self.timeouts_or_errors as f64 / attempts as f64
        }
    }
}

impl Sum for WorkerStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(WorkerStats::default(), |a, b| a + b)
    }
}

/// Replays a slice of games and measures the value of every piece along the way.
#[derive(Debug)]
pub struct Worker<O: Oracle> {
    id: usize,
    oracle: O,
}

impl<O: Oracle> Worker<O> {
    /// Constructs a [`Worker`] with its own [`Oracle`].
    pub fn new(id: usize, oracle: O) -> Self {
        Worker { id, oracle }
    }

    /// Processes `games` in order, appending rows to `sink`.
    ///
    /// Only failing to append to the sink is an error, everything else is counted.
    #[instrument(level = "info", skip(self, games, sink), fields(worker = self.id), err)]
    pub async fn run<I, S>(&mut self, games: I, sink: &mut S) -> io::Result<WorkerStats>
    where
        I: IntoIterator<Item = GameRecord>,
        S: Sink + ?Sized,
    {
        let mut stats = WorkerStats::default();

        for (n, record) in games.into_iter().enumerate() {
            let id = GameId {
                worker: self.id,
                game: n,
            };

            let before = stats;
            self.game(id, &record, sink, &mut stats).await?;
            info!(
                game = %id,
                index = record.index,
                rows = stats.rows_produced - before.rows_produced,
                "finished game"
            );
        }

        info!(%stats, "worker done");
        Ok(stats)
    }

    #[instrument(level = "debug", skip(self, record, sink, stats), fields(%id, index = record.index))]
    async fn game<S: Sink + ?Sized>(
        &mut self,
        id: GameId,
        record: &GameRecord,
        sink: &mut S,
        stats: &mut WorkerStats,
    ) -> io::Result<()> {
        let replay = match Replay::new(record) {
            Ok(replay) => replay,
            Err(e) => {
                warn!(game = %id, index = record.index, "skipping game: {e}");
                stats.games_failed += 1;
                return Ok(());
            }
        };

        let eco_code = record.opening_code.clone().unwrap_or_default();
        let opening = opening_name(&eco_code);

        for snapshot in replay {
            let pos = &snapshot.position;

            if pos.is_terminal() {
                debug!(ply = snapshot.ply, "skipping terminal position");
                stats.positions_terminal += 1;
                continue;
            }

            let baseline = match self.oracle.evaluate(pos).await {
                Evaluation::Score(s) => s,
                e => {
                    debug!(ply = snapshot.ply, evaluation = %e, "position was not scored");
                    stats.timeouts_or_errors += 1;
                    continue;
                }
            };

            stats.positions_scored += 1;

            let ablations = ablate(&mut self.oracle, pos, baseline).await;
            stats.timeouts_or_errors += ablations.failures;

            let fen = pos.to_string();
            let white_material = pos.material(Color::White);
            let black_material = pos.material(Color::Black);

            for a in ablations.values {
                sink.append(PieceValueRow {
                    game_id: id,
                    fen: fen.clone(),
                    move_number: snapshot.ply,
                    side_to_move: pos.turn(),
                    eco_code: eco_code.clone(),
                    opening: opening.into(),
                    white_material,
                    black_material,
                    piece_type: a.piece,
                    rank: a.square.rank(),
                    file: a.square.file(),
                    original_eval: a.baseline,
                    eval_without_piece: a.without,
                    piece_value: a.value(),
                })?;

                stats.rows_produced += 1;
            }
        }

        stats.games_processed += 1;
        Ok(())
    }
}
