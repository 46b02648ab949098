use crate::engine::EngineConfig;
use anyhow::{bail, Context, Error as Anyhow};
use futures_util::future::join_all;
use lib::dataset::{self, PieceValueRow, Summary};
use lib::game::{GameRecord, GameSource};
use lib::{partition::partition, worker::WorkerStats};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::{fs, time::Duration};
use tokio::io::AsyncWriteExt;
use tokio::{process::Command, task::block_in_place, task::JoinHandle, time};
use tracing::{error, info, instrument, level_filters::LevelFilter, warn, Level};

/// Everything needed to label a collection of games.
#[derive(Debug, Clone)]
pub struct Config {
    /// The PGN file to read games from.
    pub games: PathBuf,

    /// Where to write the merged dataset.
    pub output: PathBuf,

    /// Where workers write their partial datasets.
    pub scratch: PathBuf,

    /// How many worker processes to run.
    pub workers: usize,

    /// The engine every worker scores positions with.
    pub engine: EngineConfig,

    /// How often to report progress.
    pub heartbeat: Duration,
}

/// The outcome of a labeling run.
#[derive(Debug, Clone)]
pub struct Report {
    pub stats: WorkerStats,
    pub summary: Summary,
    pub elapsed: Duration,
}

/// Periodically logs the elapsed time until dropped.
struct Heartbeat(Option<JoinHandle<()>>);

impl Heartbeat {
    fn start(period: Duration) -> Self {
        if period.is_zero() {
            return Heartbeat(None);
        }

        let start = time::Instant::now();
        Heartbeat(Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(start + period, period);
            loop {
                ticker.tick().await;
                let elapsed = Duration::from_secs(start.elapsed().as_secs());
                info!(elapsed = %humantime::format_duration(elapsed), "still labeling");
            }
        })))
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        if let Some(handle) = &self.0 {
            handle.abort();
        }
    }
}

/// Splits games among worker processes and merges what they produce.
#[derive(Debug)]
pub struct Coordinator {
    config: Config,
    executable: PathBuf,
}

impl Coordinator {
    /// Constructs a [`Coordinator`] that runs workers as copies of the current executable.
    pub fn new(config: Config) -> io::Result<Self> {
        Ok(Self::with_executable(config, std::env::current_exe()?))
    }

    /// Constructs a [`Coordinator`] that runs workers through `executable`.
    pub fn with_executable(config: Config, executable: PathBuf) -> Self {
        Coordinator { config, executable }
    }

    fn partial(&self, id: usize) -> PathBuf {
        self.config.scratch.join(format!("worker_{id}.jsonl.zst"))
    }

    fn stats(&self, id: usize) -> PathBuf {
        self.config.scratch.join(format!("worker_{id}.stats.json"))
    }

    /// Runs the whole pipeline and writes the merged dataset.
    #[instrument(level = "info", skip(self), err)]
    pub async fn run(&self) -> Result<Report, Anyhow> {
        let start = time::Instant::now();
        let _heartbeat = Heartbeat::start(self.config.heartbeat);

        let games = block_in_place(|| read_games(&self.config.games))
            .with_context(|| format!("failed to read {}", self.config.games.display()))?;

        if games.is_empty() {
            bail!("no games found in {}", self.config.games.display());
        }

        let slices = partition(&games, self.config.workers)?;
        info!(games = games.len(), workers = slices.len(), "labeling games");

        block_in_place(|| self.prepare(slices.len()))
            .with_context(|| format!("failed to prepare {}", self.config.scratch.display()))?;

        let spawned = slices.iter().enumerate().map(|(id, s)| self.spawn(id, s));
        for (id, status) in join_all(spawned).await.into_iter().enumerate() {
            match status {
                Ok(s) if s.success() => info!(worker = id, "worker finished"),
                Ok(s) => warn!(worker = id, status = %s, "worker exited abnormally"),
                Err(e) => error!(worker = id, "{:?}", e),
            }
        }

        let (stats, rows) = block_in_place(|| self.collect(slices.len()))?;

        let summary = Summary::new(&rows);
        block_in_place(|| dataset::write(&self.config.output, rows))
            .with_context(|| format!("failed to write {}", self.config.output.display()))?;

        let report = Report {
            stats,
            summary,
            elapsed: start.elapsed(),
        };

        info!(
            stats = %report.stats,
            failure_rate = format_args!("{:.2}%", 100. * report.stats.failure_rate()),
            summary = %report.summary,
            elapsed = %humantime::format_duration(Duration::from_secs(report.elapsed.as_secs())),
            output = %self.config.output.display(),
            "labeling done"
        );

        Ok(report)
    }

    /// Creates the scratch directory and removes leftovers of previous runs.
    fn prepare(&self, workers: usize) -> io::Result<()> {
        fs::create_dir_all(&self.config.scratch)?;

        for id in 0..workers {
            for path in [self.partial(id), self.stats(id)] {
                match fs::remove_file(&path) {
                    Err(e) if e.kind() != ErrorKind::NotFound => return Err(e),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    #[instrument(level = "debug", skip(self, games), fields(games = games.len()), err)]
    async fn spawn(&self, id: usize, games: &[GameRecord]) -> Result<ExitStatus, Anyhow> {
        let verbosity = LevelFilter::current().into_level().unwrap_or(Level::ERROR);

        let mut child = Command::new(&self.executable)
            .arg("--verbosity")
            .arg(verbosity.to_string())
            .arg("work")
            .arg("--id")
            .arg(id.to_string())
            .arg("--engine")
            .arg(self.config.engine.to_string())
            .arg("--output")
            .arg(self.partial(id))
            .arg("--stats")
            .arg(self.stats(id))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn worker {id}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            let mut buffer = Vec::new();
            for game in games {
                serde_json::to_writer(&mut buffer, game)?;
                buffer.push(b'\n');
            }

            if let Err(e) = stdin.write_all(&buffer).await {
                warn!(worker = id, "failed to hand games over: {e}");
            }
        }

        Ok(child.wait().await?)
    }

    /// Sums the stats and concatenates the partial datasets of every worker, in worker order.
    fn collect(&self, workers: usize) -> Result<(WorkerStats, Vec<PieceValueRow>), Anyhow> {
        let mut stats = WorkerStats::default();
        for id in 0..workers {
            match read_stats(&self.stats(id)) {
                Ok(s) => {
                    info!(
                        worker = id,
                        stats = %s,
                        failure_rate = format_args!("{:.2}%", 100. * s.failure_rate()),
                        "worker stats"
                    );

                    stats += s
                }
                Err(e) => warn!(worker = id, "skipping worker stats: {e}"),
            }
        }

        let parts: Vec<_> = (0..workers).map(|id| self.partial(id)).collect();
        let mut rows = Vec::new();
        dataset::merge(&parts, &mut rows).context("failed to merge partial datasets")?;

        if rows.is_empty() {
            bail!("no worker produced any rows");
        }

        Ok((stats, rows))
    }
}

fn read_games(path: &Path) -> io::Result<Vec<GameRecord>> {
    GameSource::new(dataset::open(path)?).collect()
}

fn read_stats(path: &Path) -> io::Result<WorkerStats> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}
