use crate::{build::Build, engine::UciOptions, io::Io};
use anyhow::{Context, Error as Anyhow};
use async_trait::async_trait;
use derive_more::{Display, Error, From};
use lib::chess::{Color, Position};
use lib::eval::{Budget, Evaluation, Oracle};
use std::{fmt::Debug, io};
use tokio::{runtime, task::block_in_place, time::timeout};
use tracing::{debug, error, instrument, warn};
use vampirc_uci::{self as uci, UciFen, UciInfoAttribute, UciMessage, UciSearchControl};

/// The reason why the UCI engine could not score a position.
#[derive(Debug, Display, Error, From)]
#[display(fmt = "the UCI engine encountered an error")]
pub struct UciError(#[from(forward)] io::Error);

/// The last score reported by the engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Score {
    Centipawns(i32),
    Mate,
}

/// An [`Oracle`] backed by a chess engine that speaks the Universal Chess Interface.
///
/// The engine process is spawned on first use and reused across evaluations, unless it times
/// out or fails, in which case it is killed and a fresh one is spawned on the next evaluation.
pub struct Uci<B: Build>
where
    B::Output: Io,
{
    builder: B,
    budget: Budget,
    options: UciOptions,
    fresh: bool,
    io: Option<B::Output>,
}

impl<B: Build> Debug for Uci<B>
where
    B::Output: Io,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uci")
            .field("budget", &self.budget)
            .field("options", &self.options)
            .field("fresh", &self.fresh)
            .field("spawned", &self.io.is_some())
            .finish()
    }
}

impl<B> Uci<B>
where
    B: Build<Error = io::Error> + Send,
    B::Output: Io,
{
    /// Constructs [`Uci`], the engine is only spawned on the first evaluation.
    ///
    /// Engines are always told to search with a single thread.
    pub fn new(builder: B, budget: Budget, options: UciOptions, fresh: bool) -> Self {
        Uci {
            builder,
            budget,
            options,
            fresh,
            io: None,
        }
    }

    async fn handshake(io: &mut B::Output, options: &UciOptions) -> Result<(), UciError> {
        io.send(&UciMessage::Uci.to_string()).await?;
        io.flush().await?;

        while !matches!(uci::parse_one(io.recv().await?.trim()), UciMessage::UciOk) {}

        let threads = UciMessage::SetOption {
            name: "Threads".into(),
            value: Some("1".into()),
        };

        io.send(&threads.to_string()).await?;

        for (name, value) in options {
            if name.eq_ignore_ascii_case("threads") {
                warn!(%name, "ignoring option, engines always search with a single thread");
                continue;
            }

            let set_option = UciMessage::SetOption {
                name: name.clone(),
                value: value.clone(),
            };

            io.send(&set_option.to_string()).await?;
        }

        io.send(&UciMessage::IsReady.to_string()).await?;
        io.flush().await?;

        while !matches!(uci::parse_one(io.recv().await?.trim()), UciMessage::ReadyOk) {}

        Ok(())
    }

    async fn engine(&mut self) -> Result<&mut B::Output, UciError> {
        let io = match self.io.take() {
            Some(io) => io,
            None => {
                debug!(fresh = self.fresh, "spawning engine");
                let mut io = self.builder.build()?;
                Self::handshake(&mut io, &self.options).await?;
                io
            }
        };

        Ok(self.io.insert(io))
    }

    async fn search(&mut self, pos: &Position) -> Result<Option<Score>, UciError> {
        let depth = self.budget.depth;
        let io = self.engine().await?;

        io.send(&UciMessage::UciNewGame.to_string()).await?;
        io.send(&UciMessage::IsReady.to_string()).await?;
        io.flush().await?;

        while !matches!(uci::parse_one(io.recv().await?.trim()), UciMessage::ReadyOk) {}

        let position = UciMessage::Position {
            startpos: false,
            fen: Some(UciFen(pos.to_string())),
            moves: Vec::new(),
        };

        let go = UciMessage::Go {
            search_control: Some(UciSearchControl::depth(depth)),
            time_control: None,
        };

        io.send(&position.to_string()).await?;
        io.send(&go.to_string()).await?;
        io.flush().await?;

        let mut score = None;

        loop {
            let msg = io.recv().await?;

            if msg.split_whitespace().next() == Some("bestmove") {
                break Ok(score);
            }

            if let UciMessage::Info(info) = uci::parse_one(msg.trim()) {
                for i in info {
                    match i {
                        UciInfoAttribute::Score { mate: Some(_), .. } => score = Some(Score::Mate),
                        UciInfoAttribute::Score { cp: Some(cp), .. } => {
                            score = Some(Score::Centipawns(cp))
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    async fn discard(&mut self) {
        if let Some(mut io) = self.io.take() {
            if let Err(e) = io.kill().await {
                warn!("failed to kill the engine: {e}");
            }
        }
    }
}

impl<B: Build> Drop for Uci<B>
where
    B::Output: Io,
{
    #[instrument(level = "trace", skip(self))]
    fn drop(&mut self) {
        let io = match &mut self.io {
            None => return,
            Some(io) => io,
        };

        let result: Result<(), Anyhow> = block_in_place(|| {
            runtime::Handle::try_current()?.block_on(async {
                io.send(&UciMessage::Quit.to_string()).await?;
                io.flush().await?;
                Ok(())
            })
        });

        if let Err(e) = result.context("failed to gracefully shutdown the uci engine") {
            error!("{:?}", e);
        }
    }
}

#[async_trait]
impl<B> Oracle for Uci<B>
where
    B: Build<Error = io::Error> + Send,
    B::Output: Io,
{
    /// Scores a [`Position`] from white's point of view.
    #[instrument(level = "debug", skip(self, pos), ret(Display), fields(%pos))]
    async fn evaluate(&mut self, pos: &Position) -> Evaluation {
        let evaluation = match timeout(self.budget.timeout, self.search(pos)).await {
            Ok(Ok(Some(Score::Centipawns(cp)))) => match pos.turn() {
                Color::White => Evaluation::Score(cp),
                Color::Black => Evaluation::Score(-cp),
            },

            Ok(Ok(Some(Score::Mate))) => Evaluation::ForcedMate,
            Ok(Ok(None)) => Evaluation::Error("the engine reported no score".into()),
            Ok(Err(UciError(e))) => Evaluation::Error(e.to_string()),
            Err(_) => Evaluation::Timeout,
        };

        if self.fresh || matches!(evaluation, Evaluation::Timeout | Evaluation::Error(_)) {
            self.discard().await;
        }

        evaluation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::MockBuild;
    use crate::io::MockIo;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::{future::ready, time::Duration};
    use test_strategy::proptest;
    use tokio::time::sleep;

    const WHITE_TO_MOVE: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const BLACK_TO_MOVE: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    const KILL: &str = "<kill>";

    type Log = Arc<Mutex<Vec<String>>>;

    fn budget(depth: u8) -> Budget {
        Budget {
            depth,
            timeout: Duration::from_secs(60),
        }
    }

    fn handshake() -> Vec<String> {
        vec![UciMessage::UciOk.to_string(), UciMessage::ReadyOk.to_string()]
    }

    fn search<I: IntoIterator<Item = String>>(lines: I) -> Vec<String> {
        let mut replies = vec![UciMessage::ReadyOk.to_string()];
        replies.extend(lines);
        replies
    }

    fn info(attr: UciInfoAttribute) -> String {
        UciMessage::Info(vec![UciInfoAttribute::Depth(1), attr]).to_string()
    }

    fn scored(cp: i32) -> Vec<String> {
        search([
            info(UciInfoAttribute::from_centipawns(cp)),
            "bestmove a2a3".to_string(),
        ])
    }

    /// An engine that logs what it is sent and replies with the given lines, then hangs up.
    fn engine(log: &Log, replies: Vec<String>) -> MockIo {
        let mut io = MockIo::new();

        let sent = log.clone();
        io.expect_send().returning(move |msg| {
            sent.lock().unwrap().push(msg.to_string());
            Box::pin(ready(Ok(())))
        });

        let killed = log.clone();
        io.expect_kill().returning(move || {
            killed.lock().unwrap().push(KILL.to_string());
            Box::pin(ready(Ok(())))
        });

        io.expect_flush().returning(|| Box::pin(ready(Ok(()))));

        let mut replies = VecDeque::from(replies);
        io.expect_recv().returning(move || {
            Box::pin(ready(
                replies
                    .pop_front()
                    .ok_or_else(|| io::ErrorKind::UnexpectedEof.into()),
            ))
        });

        io
    }

    fn builder(engines: Vec<MockIo>) -> MockBuild {
        let mut engines = VecDeque::from(engines);
        let mut b = MockBuild::new();
        b.expect_build().returning(move || {
            engines
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such engine"))
        });
        b
    }

    #[proptest]
    fn engine_is_spawned_lazily(d: u8) {
        let mut b = MockBuild::new();
        b.expect_build().never();
        drop(Uci::new(b, budget(d), UciOptions::default(), false));
    }

    #[proptest]
    fn engine_is_configured_once_and_searches_to_depth(
        d: u8,
        #[filter(#o.keys().all(|k| !k.eq_ignore_ascii_case("threads")))] o: UciOptions,
        #[strategy(-5000i32..5000)] cp: i32,
    ) {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let log = Log::default();
        let mut replies = handshake();
        replies.extend(scored(cp));
        replies.extend(scored(cp));

        let mut uci = Uci::new(builder(vec![engine(&log, replies)]), budget(d), o.clone(), false);

        let pos: Position = WHITE_TO_MOVE.parse()?;
        assert_eq!(rt.block_on(uci.evaluate(&pos)), Evaluation::Score(cp));
        assert_eq!(rt.block_on(uci.evaluate(&pos)), Evaluation::Score(cp));

        let mut expected = vec![
            UciMessage::Uci.to_string(),
            UciMessage::SetOption {
                name: "Threads".into(),
                value: Some("1".into()),
            }
            .to_string(),
        ];

        for (name, value) in o {
            expected.push(UciMessage::SetOption { name, value }.to_string());
        }

        expected.push(UciMessage::IsReady.to_string());

        for _ in 0..2 {
            expected.push(UciMessage::UciNewGame.to_string());
            expected.push(UciMessage::IsReady.to_string());

            expected.push(
                UciMessage::Position {
                    startpos: false,
                    fen: Some(UciFen(WHITE_TO_MOVE.into())),
                    moves: Vec::new(),
                }
                .to_string(),
            );

            expected.push(
                UciMessage::Go {
                    search_control: Some(UciSearchControl::depth(d)),
                    time_control: None,
                }
                .to_string(),
            );
        }

        assert_eq!(*log.lock().unwrap(), expected);
    }

    #[proptest]
    fn threads_cannot_be_overridden(
        d: u8,
        #[strategy("(?i)threads")] name: String,
        value: Option<String>,
    ) {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let log = Log::default();
        let mut replies = handshake();
        replies.extend(scored(0));

        let mut o = UciOptions::default();
        o.insert(name.clone(), value.clone());

        let mut uci = Uci::new(builder(vec![engine(&log, replies)]), budget(d), o, false);

        let pos: Position = WHITE_TO_MOVE.parse()?;
        assert_eq!(rt.block_on(uci.evaluate(&pos)), Evaluation::Score(0));

        let overridden = UciMessage::SetOption { name, value }.to_string();
        assert!(!log.lock().unwrap().contains(&overridden));
    }

    #[proptest]
    fn centipawns_are_reported_from_white_point_of_view(
        d: u8,
        #[strategy(-5000i32..5000)] cp: i32,
    ) {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let log = Log::default();
        let mut replies = handshake();
        replies.extend(search([
            info(UciInfoAttribute::from_centipawns(cp / 2)),
            info(UciInfoAttribute::from_centipawns(cp)),
            "bestmove a2a3".to_string(),
        ]));
        replies.extend(scored(cp));

        let mut uci = Uci::new(builder(vec![engine(&log, replies)]), budget(d), UciOptions::default(), false);

        let white: Position = WHITE_TO_MOVE.parse()?;
        let black: Position = BLACK_TO_MOVE.parse()?;

        assert_eq!(rt.block_on(uci.evaluate(&white)), Evaluation::Score(cp));
        assert_eq!(rt.block_on(uci.evaluate(&black)), Evaluation::Score(-cp));
        assert!(!log.lock().unwrap().contains(&KILL.to_string()));
    }

    #[proptest]
    fn mate_scores_are_forced_mates(d: u8, #[filter(#m != 0)] m: i8) {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let log = Log::default();
        let mut replies = handshake();
        replies.extend(search([
            info(UciInfoAttribute::from_centipawns(300)),
            info(UciInfoAttribute::from_mate(m)),
            "bestmove a2a3".to_string(),
        ]));

        let mut uci = Uci::new(builder(vec![engine(&log, replies)]), budget(d), UciOptions::default(), false);

        let pos: Position = WHITE_TO_MOVE.parse()?;
        assert_eq!(rt.block_on(uci.evaluate(&pos)), Evaluation::ForcedMate);
        assert!(uci.io.is_some());
    }

    #[proptest]
    fn search_without_score_is_an_error(d: u8) {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let log = Log::default();
        let mut replies = handshake();
        replies.extend(search(["bestmove (none)".to_string()]));

        let mut uci = Uci::new(builder(vec![engine(&log, replies)]), budget(d), UciOptions::default(), false);

        let pos: Position = WHITE_TO_MOVE.parse()?;
        assert!(matches!(rt.block_on(uci.evaluate(&pos)), Evaluation::Error(_)));
        assert!(uci.io.is_none());
        assert!(log.lock().unwrap().contains(&KILL.to_string()));
    }

    #[proptest]
    fn engine_that_hangs_up_is_an_error_and_is_replaced(
        d: u8,
        #[strategy(-5000i32..5000)] cp: i32,
    ) {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let log = Log::default();
        let mut crashing = handshake();
        crashing.extend(search([info(UciInfoAttribute::from_centipawns(cp))]));

        let mut healthy = handshake();
        healthy.extend(scored(cp));

        let engines = vec![engine(&log, crashing), engine(&log, healthy)];
        let mut uci = Uci::new(builder(engines), budget(d), UciOptions::default(), false);

        let pos: Position = WHITE_TO_MOVE.parse()?;
        assert!(matches!(rt.block_on(uci.evaluate(&pos)), Evaluation::Error(_)));
        assert_eq!(rt.block_on(uci.evaluate(&pos)), Evaluation::Score(cp));
    }

    #[proptest]
    fn engine_that_hangs_times_out_and_is_killed(d: u8) {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let mut io = MockIo::new();
        io.expect_send().returning(|_| Box::pin(ready(Ok(()))));
        io.expect_flush().returning(|| Box::pin(ready(Ok(()))));
        io.expect_kill().once().returning(|| Box::pin(ready(Ok(()))));

        let mut replies = VecDeque::from(handshake());
        io.expect_recv().returning(move || {
            let reply = replies.pop_front();
            Box::pin(async move {
                match reply {
                    Some(r) => Ok(r),
                    None => {
                        sleep(Duration::from_secs(60)).await;
                        Err(io::ErrorKind::TimedOut.into())
                    }
                }
            })
        });

        let budget = Budget {
            depth: d,
            timeout: Duration::from_millis(10),
        };

        let mut uci = Uci::new(builder(vec![io]), budget, UciOptions::default(), false);

        let pos: Position = WHITE_TO_MOVE.parse()?;
        assert_eq!(rt.block_on(uci.evaluate(&pos)), Evaluation::Timeout);
        assert!(uci.io.is_none());
    }

    #[proptest]
    fn fresh_engines_are_discarded_after_every_evaluation(
        d: u8,
        #[strategy(-5000i32..5000)] cp: i32,
    ) {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let log = Log::default();
        let mut first = handshake();
        first.extend(scored(cp));

        let mut second = handshake();
        second.extend(scored(-cp));

        let engines = vec![engine(&log, first), engine(&log, second)];
        let mut uci = Uci::new(builder(engines), budget(d), UciOptions::default(), true);

        let pos: Position = WHITE_TO_MOVE.parse()?;
        assert_eq!(rt.block_on(uci.evaluate(&pos)), Evaluation::Score(cp));
        assert!(uci.io.is_none());
        assert_eq!(rt.block_on(uci.evaluate(&pos)), Evaluation::Score(-cp));
        assert!(uci.io.is_none());

        let kills = log.lock().unwrap().iter().filter(|m| *m == KILL).count();
        assert_eq!(kills, 2);
    }

    #[proptest]
    fn failing_to_spawn_the_engine_is_an_error(d: u8) {
        let rt = runtime::Builder::new_multi_thread().enable_time().build()?;

        let mut uci = Uci::new(builder(vec![]), budget(d), UciOptions::default(), false);
        let pos: Position = WHITE_TO_MOVE.parse()?;
        assert!(matches!(rt.block_on(uci.evaluate(&pos)), Evaluation::Error(_)));
    }

    #[proptest]
    fn drop_gracefully_quits_spawned_engine(d: u8) {
        let rt = runtime::Builder::new_multi_thread().build()?;

        let log = Log::default();
        let mut uci = Uci::new(MockBuild::new(), budget(d), UciOptions::default(), false);
        uci.io = Some(engine(&log, vec![]));

        rt.block_on(async move {
            drop(uci);
        });

        assert_eq!(*log.lock().unwrap(), [UciMessage::Quit.to_string()]);
    }

    #[proptest]
    fn drop_recovers_from_errors(d: u8, e: io::Error) {
        let rt = runtime::Builder::new_multi_thread().build()?;

        let mut io = MockIo::new();
        io.expect_send()
            .once()
            .return_once(move |_| Box::pin(ready(Err(e))));

        let mut uci = Uci::new(MockBuild::new(), budget(d), UciOptions::default(), false);
        uci.io = Some(io);

        rt.block_on(async move {
            drop(uci);
        })
    }

    #[proptest]
    fn drop_recovers_from_missing_runtime(d: u8) {
        let mut uci = Uci::new(MockBuild::new(), budget(d), UciOptions::default(), false);
        uci.io = Some(MockIo::new());
        drop(uci);
    }
}
