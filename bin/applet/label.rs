use crate::coordinator::{Config, Coordinator};
use crate::engine::{EngineConfig, UciOptions};
use anyhow::Error as Anyhow;
use clap::Parser;
use lib::eval::Budget;
use std::{num::NonZeroUsize, path::PathBuf, time::Duration};
use tracing::instrument;

/// Labels every piece in every position of a collection of games with its value.
#[derive(Debug, Parser)]
#[clap(disable_version_flag = true)]
pub struct Label {
    /// The PGN file to read games from, optionally compressed.
    #[clap(short, long, env = "PGN_FILE_NAME")]
    games: PathBuf,

    /// Where to write the dataset, compressed according to its extension.
    #[clap(short, long, env = "PVP_FILE_NAME")]
    output: PathBuf,

    /// The UCI engine that scores positions.
    #[clap(short, long, env = "SF_PATH")]
    engine: String,

    /// How many worker processes to run.
    #[clap(short, long, env = "NUM_WORKERS", default_value = "1")]
    workers: NonZeroUsize,

    /// The search depth in plies.
    #[clap(short, long, default_value_t = 20)]
    depth: u8,

    /// The wall-clock limit of a single evaluation.
    #[clap(short, long, default_value = "300s", value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// Where workers write their partial datasets.
    #[clap(long, default_value = "temp_piecevals")]
    scratch: PathBuf,

    /// How often to report progress, 0s disables it.
    #[clap(long, default_value = "60s", value_parser = humantime::parse_duration)]
    heartbeat: Duration,

    /// Spawn a new engine for every evaluation.
    #[clap(long)]
    fresh: bool,

    /// An extra UCI option, either as NAME=VALUE or as NAME for buttons.
    #[clap(long = "option", value_name = "NAME[=VALUE]", value_parser = parse_option)]
    options: Vec<(String, Option<String>)>,
}

fn parse_option(s: &str) -> Result<(String, Option<String>), String> {
    let (name, value) = match s.split_once('=') {
        None => (s.trim(), None),
        Some((name, value)) => (name.trim(), Some(value.trim().to_string())),
    };

    if name.is_empty() {
        Err(format!("option '{s}' has no name"))
    } else {
        Ok((name.to_string(), value))
    }
}

impl Label {
    fn config(self) -> Config {
        Config {
            games: self.games,
            output: self.output,
            scratch: self.scratch,
            workers: self.workers.get(),
            engine: EngineConfig {
                path: self.engine,
                budget: Budget {
                    depth: self.depth,
                    timeout: self.timeout,
                },
                fresh: self.fresh,
                options: self.options.into_iter().collect::<UciOptions>(),
            },
            heartbeat: self.heartbeat,
        }
    }

    #[instrument(level = "trace", skip(self), err)]
    pub async fn execute(self) -> Result<(), Anyhow> {
        Coordinator::new(self.config())?.run().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    fn parse<'a, I: IntoIterator<Item = &'a str>>(args: I) -> Result<Label, clap::Error> {
        Label::try_parse_from(["label"].into_iter().chain(args))
    }

    #[test]
    fn label_has_sensible_defaults() {
        let config = parse(["-g", "games.pgn", "-o", "out.jsonl", "-e", "stockfish"])
            .unwrap()
            .config();

        assert_eq!(config.workers, 1);
        assert_eq!(config.engine.budget.depth, 20);
        assert_eq!(config.engine.budget.timeout, Duration::from_secs(300));
        assert_eq!(config.scratch, PathBuf::from("temp_piecevals"));
        assert_eq!(config.heartbeat, Duration::from_secs(60));
        assert!(!config.engine.fresh);
        assert!(config.engine.options.is_empty());
    }

    #[test]
    fn label_forwards_engine_settings() {
        let config = parse([
            "--games=g.pgn",
            "--output=o.jsonl.zst",
            "--engine=/usr/bin/stockfish",
            "--workers=4",
            "--depth=12",
            "--timeout=1m 30s",
            "--fresh",
            "--option=Hash=64",
            "--option=Clear Hash",
        ])
        .unwrap()
        .config();

        assert_eq!(config.workers, 4);
        assert_eq!(config.engine.path, "/usr/bin/stockfish");
        assert_eq!(config.engine.budget.depth, 12);
        assert_eq!(config.engine.budget.timeout, Duration::from_secs(90));
        assert!(config.engine.fresh);
        assert_eq!(config.engine.options.get("Hash"), Some(&Some("64".into())));
        assert_eq!(config.engine.options.get("Clear Hash"), Some(&None));
    }

    #[test]
    fn label_rejects_zero_workers() {
        assert!(parse(["-g", "g.pgn", "-o", "o.jsonl", "-e", "sf", "-w", "0"]).is_err());
    }

    #[test]
    fn label_requires_games_output_and_engine() {
        assert!(parse(["-o", "o.jsonl", "-e", "sf"]).is_err());
        assert!(parse(["-g", "g.pgn", "-e", "sf"]).is_err());
        assert!(parse(["-g", "g.pgn", "-o", "o.jsonl"]).is_err());
    }

    #[proptest]
    fn options_are_split_at_the_first_equal_sign(
        #[strategy("[A-Za-z][A-Za-z ]*[A-Za-z]")] name: String,
        #[strategy("[^=\\s]*")] value: String,
    ) {
        assert_eq!(
            parse_option(&format!("{name}={value}")),
            Ok((name.clone(), Some(value)))
        );

        assert_eq!(parse_option(&name), Ok((name, None)));
    }

    #[proptest]
    fn options_must_have_a_name(#[strategy("\\s*")] name: String, value: String) {
        assert!(parse_option(&format!("{name}={value}")).is_err());
    }
}
