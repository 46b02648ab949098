use crate::chess::{Piece, Position, Role, Square};
use crate::eval::{Evaluation, Oracle};
use tracing::{debug, instrument};

/// The measured contribution of one piece to its [`Position`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ablation {
    /// The piece removed.
    pub piece: Piece,
    /// Where the piece stood.
    pub square: Square,
    /// The score of the full position.
    pub baseline: i32,
    /// The score of the position without the piece.
    pub without: i32,
}

impl Ablation {
    /// How much the position is worth with the piece compared to without it, from white's
    /// point of view.
    pub fn value(&self) -> i32 {
        self.baseline - self.without
    }
}

/// Every [`Ablation`] measured for one [`Position`].
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Ablations {
    /// In ascending [`Square`] order.
    pub values: Vec<Ablation>,
    /// How many ablated positions failed to produce a score.
    pub failures: u64,
}

/// Measures the value of every piece in `pos`, except for kings.
///
/// Each piece is removed in turn and the resulting position scored by the [`Oracle`].
/// Removals that lead to illegal or terminal positions are skipped, while ablated positions
/// the oracle fails to score are counted in [`Ablations::failures`].
#[instrument(level = "debug", skip(oracle, pos), fields(%pos))]
pub async fn ablate<O: Oracle + ?Sized>(oracle: &mut O, pos: &Position, baseline: i32) -> Ablations {
    let mut ablations = Ablations::default();

    for (square, piece) in pos.iter() {
        if piece.role() == Role::King {
            continue;
        }

        let ablated = match pos.without(square) {
            Ok(ablated) => ablated,
            Err(e) => {
                debug!(%square, %piece, "skipping ablation: {e}");
                continue;
            }
        };

        match oracle.evaluate(&ablated).await {
            Evaluation::Score(without) => ablations.values.push(Ablation {
                piece,
                square,
                baseline,
                without,
            }),

            e => {
                debug!(%square, %piece, evaluation = %e, "ablated position was not scored");
                ablations.failures += 1;
            }
        }
    }

    ablations
}
