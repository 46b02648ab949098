use super::{PieceValueRow, Sink};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use tracing::{instrument, warn};

const BUF_CAP: usize = 128 * 1024;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(e) if e.eq_ignore_ascii_case("gz") => Compression::Gzip,
            Some(e) if e.eq_ignore_ascii_case("zst") => Compression::Zstd,
            _ => Compression::None,
        }
    }
}

/// Writes [`PieceValueRow`]s as JSON lines, compressed according to the file extension.
///
/// Files ending in `.zst` are compressed with zstd, files ending in `.gz` with gzip.
#[must_use = "call .finish() to flush the compressed stream"]
pub enum Writer {
    Plain(BufWriter<File>),
    Gzip(flate2::write::GzEncoder<BufWriter<File>>),
    Zstd(zstd::Encoder<'static, BufWriter<File>>),
}

impl Writer {
    /// Creates or truncates the file at `path`.
    #[instrument(level = "trace", skip(path), fields(path = %path.as_ref().display()), err)]
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let file = BufWriter::with_capacity(BUF_CAP, File::create(path)?);

        Ok(match Compression::of(path) {
            Compression::None => Writer::Plain(file),
            Compression::Gzip => Writer::Gzip(flate2::write::GzEncoder::new(
                file,
                flate2::Compression::default(),
            )),
            Compression::Zstd => Writer::Zstd(zstd::Encoder::new(file, 0)?),
        })
    }

    /// Finalizes the stream and flushes the underlying file.
    pub fn finish(self) -> io::Result<()> {
        let mut file = match self {
            Writer::Plain(f) => f,
            Writer::Gzip(e) => e.finish()?,
            Writer::Zstd(e) => e.finish()?,
        };

        file.flush()?;
        file.into_inner().map_err(|e| e.into_error())?.sync_all()
    }
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Writer::Plain(f) => f.write(buf),
            Writer::Gzip(e) => e.write(buf),
            Writer::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Writer::Plain(f) => f.flush(),
            Writer::Gzip(e) => e.flush(),
            Writer::Zstd(e) => e.flush(),
        }
    }
}

impl Sink for Writer {
    fn append(&mut self, row: PieceValueRow) -> io::Result<()> {
        serde_json::to_writer(&mut *self, &row)?;
        self.write_all(b"\n")
    }
}

/// Opens the file at `path` for reading, decompressing according to the file extension.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    Ok(match Compression::of(path) {
        Compression::None => Box::new(BufReader::with_capacity(BUF_CAP, file)),
        Compression::Gzip => Box::new(BufReader::with_capacity(
            BUF_CAP,
            flate2::read::MultiGzDecoder::new(file),
        )),
        Compression::Zstd => Box::new(BufReader::with_capacity(
            BUF_CAP,
            zstd::Decoder::new(file)?,
        )),
    })
}

/// Reads every [`PieceValueRow`] in the file at `path`, in order.
#[instrument(level = "trace", skip(path), fields(path = %path.as_ref().display()), err)]
pub fn read<P: AsRef<Path>>(path: P) -> io::Result<Vec<PieceValueRow>> {
    let mut rows = Vec::new();

    for line in open(path)?.lines() {
        if let Some(row) = parse(&line?)? {
            rows.push(row);
        }
    }

    Ok(rows)
}

fn parse(line: &str) -> io::Result<Option<PieceValueRow>> {
    if line.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::from_str(line)?))
    }
}

/// Writes `rows` to the file at `path`, replacing its contents.
pub fn write<P, I>(path: P, rows: I) -> io::Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = PieceValueRow>,
{
    let mut writer = Writer::create(path)?;
    for row in rows {
        writer.append(row)?;
    }

    writer.finish()
}

/// Concatenates the datasets at `parts` into `sink`, in order, without deduplication.
///
/// Missing or unreadable parts are skipped.
/// A truncated part contributes the rows decoded before the point of truncation.
///
/// Only failing to append to `sink` is an error, returns how many rows were appended.
#[instrument(level = "debug", skip(parts, sink), err)]
pub fn merge<P: AsRef<Path>>(parts: &[P], sink: &mut impl Sink) -> io::Result<usize> {
    let mut total = 0;

    for part in parts {
        let path = part.as_ref();
        let lines = match open(path) {
            Ok(reader) => reader.lines(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "skipping missing partial dataset");
                continue;
            }
            Err(e) => {
                warn!(path = %path.display(), "skipping unreadable partial dataset: {e}");
                continue;
            }
        };

        let mut rows = 0;
        for line in lines {
            match line.and_then(|l| parse(&l)) {
                Ok(None) => {}
                Ok(Some(row)) => {
                    sink.append(row)?;
                    rows += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), rows, "partial dataset is truncated: {e}");
                    break;
                }
            }
        }

        total += rows;
    }

    Ok(total)
}
