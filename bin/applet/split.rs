use anyhow::{Context, Error as Anyhow};
use clap::Parser;
use lib::dataset::{self, cap, Summary};
use std::{collections::HashSet, path::PathBuf};
use tokio::task::block_in_place;
use tracing::{info, instrument};

/// Splits a dataset into a training and a validation set without sharing games.
#[derive(Debug, Parser)]
#[clap(disable_version_flag = true)]
pub struct Split {
    /// The dataset to split.
    input: PathBuf,

    /// Where to write the training set.
    train: PathBuf,

    /// Where to write the validation set.
    validation: PathBuf,

    /// The share of games that go to the training set.
    #[clap(short, long, default_value_t = 0.8, value_parser = parse_fraction)]
    fraction: f64,

    /// The seed used to shuffle games.
    #[clap(short, long, default_value_t = 14)]
    seed: u64,
}

fn parse_fraction(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(f) if (0. ..=1.).contains(&f) => Ok(f),
        Ok(f) => Err(format!("{f} is not within [0, 1]")),
        Err(e) => Err(e.to_string()),
    }
}

impl Split {
    #[instrument(level = "trace", skip(self), err)]
    pub async fn execute(self) -> Result<(), Anyhow> {
        block_in_place(|| self.split())
    }

    fn split(&self) -> Result<(), Anyhow> {
        let mut rows = dataset::read(&self.input)
            .with_context(|| format!("failed to read {}", self.input.display()))?;

        let capped = rows.iter_mut().map(cap).filter(|&c| c).count();
        info!(capped, rows = rows.len(), "capped piece values");

        let dataset::Split { train, validation } = dataset::split(rows, self.fraction, self.seed);

        let fens: HashSet<_> = train.iter().map(|r| r.fen.as_str()).collect();
        let shared: HashSet<_> = validation
            .iter()
            .map(|r| r.fen.as_str())
            .filter(|fen| fens.contains(fen))
            .collect();

        info!(summary = %Summary::new(&train), "training set");
        info!(summary = %Summary::new(&validation), "validation set");
        info!(shared = shared.len(), "positions shared by both sets");

        dataset::write(&self.train, train)
            .with_context(|| format!("failed to write {}", self.train.display()))?;

        dataset::write(&self.validation, validation)
            .with_context(|| format!("failed to write {}", self.validation.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib::chess::{Color, Material, Piece, Role};
    use lib::dataset::{GameId, PieceValueRow};
    use std::ffi::OsStr;
    use tempfile::tempdir;
    use test_strategy::proptest;

    fn row(game: usize, piece: Piece, value: i32) -> PieceValueRow {
        PieceValueRow {
            game_id: GameId { worker: 0, game },
            fen: format!("4k3/8/8/8/8/8/{}7/4K3 w - - 0 1", piece.char()),
            move_number: game,
            side_to_move: Color::White,
            eco_code: String::new(),
            opening: "Unknown".into(),
            white_material: Material::default(),
            black_material: Material::default(),
            piece_type: piece,
            rank: 1,
            file: 0,
            original_eval: value,
            eval_without_piece: 0,
            piece_value: value,
        }
    }

    #[proptest]
    fn fraction_must_be_within_unit_interval(#[strategy(0f64..=1.)] f: f64) {
        assert_eq!(parse_fraction(&f.to_string()), Ok(f));
        assert!(parse_fraction(&(f + 1.5).to_string()).is_err());
        assert!(parse_fraction(&(-f - 0.5).to_string()).is_err());
    }

    #[test]
    fn split_writes_disjoint_capped_datasets() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("all.jsonl");
        let train = dir.path().join("train.jsonl.gz");
        let validation = dir.path().join("validation.jsonl.zst");

        let rows: Vec<_> = (0..10)
            .map(|g| row(g, Piece(Color::White, Role::Knight), 300 * g as i32))
            .collect();

        dataset::write(&input, rows.clone()).unwrap();

        let applet = Split::try_parse_from([
            OsStr::new("split"),
            input.as_os_str(),
            train.as_os_str(),
            validation.as_os_str(),
        ])
        .unwrap();

        assert_eq!(applet.fraction, 0.8);
        assert_eq!(applet.seed, 14);

        applet.split().unwrap();

        let train = dataset::read(train).unwrap();
        let validation = dataset::read(validation).unwrap();

        assert_eq!(train.len(), 8);
        assert_eq!(validation.len(), 2);

        let games: HashSet<_> = train.iter().map(|r| r.game_id).collect();
        assert!(validation.iter().all(|r| !games.contains(&r.game_id)));

        let cap = Role::Knight.cap();
        assert!(train.iter().chain(&validation).all(|r| r.piece_value <= cap));
        assert_eq!(
            train.iter().chain(&validation).filter(|r| r.piece_value == cap).count(),
            rows.iter().filter(|r| r.piece_value >= cap).count()
        );
    }
}
