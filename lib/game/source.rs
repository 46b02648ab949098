use super::GameRecord;
use pgn_reader::{BufferedReader, RawHeader, SanPlus, Skip, Visitor};
use std::{io, io::Read, mem::take};
use tracing::warn;

#[derive(Default)]
struct Recorder {
    fen: Option<String>,
    eco: Option<String>,
    moves: Vec<SanPlus>,
}

impl Visitor for Recorder {
    type Result = (String, Option<String>);

    fn begin_game(&mut self) {
        *self = Recorder::default();
    }

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        let value = match value.decode_utf8() {
            Ok(v) => v.trim().to_string(),
            Err(e) => {
                warn!("ignoring header that is not valid utf-8: {e}");
                return;
            }
        };

        match key {
            b"FEN" => self.fen = Some(value),
            b"ECO" if !value.is_empty() && value != "?" => self.eco = Some(value),
            _ => {}
        }
    }

    fn san(&mut self, sp: SanPlus) {
        self.moves.push(sp);
    }

    fn begin_variation(&mut self) -> Skip {
        Skip(true)
    }

    fn end_game(&mut self) -> Self::Result {
        let mut tokens = Vec::with_capacity(self.moves.len() * 3 / 2 + 1);

        if let Some(fen) = self.fen.take() {
            tokens.push(format!("[FEN {fen:?}]"));
        }

        for (i, sp) in take(&mut self.moves).iter().enumerate() {
            if i % 2 == 0 {
                tokens.push(format!("{}.", i / 2 + 1));
            }

            tokens.push(sp.to_string());
        }

        (tokens.join(" "), self.eco.take())
    }
}

/// Reads [`GameRecord`]s from a [PGN] database.
///
/// Only the main line is kept, variations, comments and annotations are dropped.
///
/// [PGN]: https://www.chessprogramming.org/Portable_Game_Notation
pub struct GameSource<R: Read> {
    reader: BufferedReader<R>,
    recorder: Recorder,
    index: usize,
}

impl<R: Read> GameSource<R> {
    /// Constructs [`GameSource`] from any readable PGN stream.
    pub fn new(reader: R) -> Self {
        GameSource {
            reader: BufferedReader::new(reader),
            recorder: Recorder::default(),
            index: 0,
        }
    }
}

impl<R: Read> Iterator for GameSource<R> {
    type Item = io::Result<GameRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_game(&mut self.recorder) {
            Err(e) => Some(Err(e)),
            Ok(None) => None,
            Ok(Some((movetext, opening_code))) => {
                let index = self.index;
                self.index += 1;
                Some(Ok(GameRecord {
                    index,
                    movetext,
                    opening_code,
                }))
            }
        }
    }
}
