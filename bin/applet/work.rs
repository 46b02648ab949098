use crate::{engine::EngineConfig, uci::Uci};
use anyhow::{Context, Error as Anyhow};
use clap::Parser;
use lib::{dataset::Writer, game::GameRecord, worker::Worker};
use std::{fs, path::PathBuf};
use tokio::io::{stdin, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::block_in_place;
use tracing::{info, instrument, warn};

/// Processes the games handed over on the standard input as one worker.
#[derive(Debug, Parser)]
#[clap(disable_version_flag = true)]
pub struct Work {
    /// The id of this worker.
    #[clap(long)]
    id: usize,

    /// The engine configuration.
    #[clap(long)]
    engine: EngineConfig,

    /// Where to write the partial dataset.
    #[clap(long)]
    output: PathBuf,

    /// Where to write the worker statistics.
    #[clap(long)]
    stats: PathBuf,
}

/// Reads one [`GameRecord`] per line, skipping lines that cannot be decoded.
async fn read_games<R: AsyncBufRead + Unpin>(reader: R) -> Result<Vec<GameRecord>, Anyhow> {
    let mut games = Vec::new();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str(&line) {
            Ok(game) => games.push(game),
            Err(e) => warn!("skipping undecodable game record: {e}"),
        }
    }

    Ok(games)
}

impl Work {
    #[instrument(level = "trace", skip(self), fields(worker = self.id), err)]
    pub async fn execute(self) -> Result<(), Anyhow> {
        let games = read_games(BufReader::new(stdin())).await?;
        info!(games = games.len(), "received games");

        let uci = Uci::new(
            self.engine.clone(),
            self.engine.budget,
            self.engine.options.clone(),
            self.engine.fresh,
        );

        let mut sink = block_in_place(|| Writer::create(&self.output))
            .with_context(|| format!("failed to create {}", self.output.display()))?;

        let mut worker = Worker::new(self.id, uci);
        let stats = worker.run(games, &mut sink).await?;
        drop(worker);

        block_in_place(|| -> Result<(), Anyhow> {
            sink.finish()
                .with_context(|| format!("failed to write {}", self.output.display()))?;

            fs::write(&self.stats, serde_json::to_vec(&stats)?)
                .with_context(|| format!("failed to write {}", self.stats.display()))?;

            Ok(())
        })
    }
}
