/// The ablation engine.
pub mod ablation;
/// Chess domain types.
pub mod chess;
/// Labeled datasets of piece values.
pub mod dataset;
/// Position scoring.
pub mod eval;
/// Game records and their replay.
pub mod game;
/// Opening names.
pub mod opening;
/// Splitting work across workers.
pub mod partition;
/// The per-slice driving loop.
pub mod worker;
