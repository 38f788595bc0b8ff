//! Streaming export and import between a store session and a file.
//!
//! Export: connect, resolve the point, open the destination, run one range
//! query and append every value, then close the encoder, the stream and the
//! session, in that order. Import: connect, open the source, decode and
//! submit every value, then log out before the stream is released.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Stdout, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::codec::{TransferSummary, ValuesReader, ValuesWriter};
use crate::config::has_extension;
use crate::grammar::Command;
use crate::store::{SessionProvider, StoreSession, ValuesQuery};
use crate::Result;

/// Extension given to file names that have none.
pub const DEFAULT_EXTENSION: &str = ".jsonl";

/// Suffix (any case) selecting gzip compression.
pub const GZ_FILE_EXT: &str = ".gz";

/// Apply the default extension to a file name without a '.'.
pub fn destination_path(path: &Path) -> PathBuf {
    if has_extension(&path.to_string_lossy()) {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(DEFAULT_EXTENSION);
        PathBuf::from(name)
    }
}

/// Whether a path names a gzip file.
pub fn is_gzip(path: &Path) -> bool {
    path.to_string_lossy()
        .to_lowercase()
        .ends_with(GZ_FILE_EXT)
}

/// Where exported values go.
pub enum OutputStream {
    Stdout(BufWriter<Stdout>),
    File(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl OutputStream {
    /// Open a destination; None is stdout.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(OutputStream::Stdout(BufWriter::new(io::stdout())));
        };
        let path = destination_path(path);
        let file = BufWriter::new(File::create(&path)?);
        tracing::debug!("Writing to {}", path.display());
        Ok(if is_gzip(&path) {
            OutputStream::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            OutputStream::File(file)
        })
    }

    /// Finish any compression and flush everything to the underlying stream.
    pub fn close(self) -> Result<()> {
        match self {
            OutputStream::Stdout(mut out) => out.flush()?,
            OutputStream::File(mut out) => out.flush()?,
            OutputStream::Gzip(encoder) => encoder.finish()?.flush()?,
        }
        Ok(())
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputStream::Stdout(out) => out.write(buf),
            OutputStream::File(out) => out.write(buf),
            OutputStream::Gzip(out) => out.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputStream::Stdout(out) => out.flush(),
            OutputStream::File(out) => out.flush(),
            OutputStream::Gzip(out) => out.flush(),
        }
    }
}

/// Where imported values come from.
pub enum InputStream {
    File(File),
    Gzip(MultiGzDecoder<File>),
}

impl InputStream {
    pub fn open(path: &Path) -> Result<Self> {
        let path = destination_path(path);
        let file = File::open(&path)?;
        tracing::debug!("Reading from {}", path.display());
        Ok(if is_gzip(&path) {
            InputStream::Gzip(MultiGzDecoder::new(file))
        } else {
            InputStream::File(file)
        })
    }
}

impl Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputStream::File(input) => input.read(buf),
            InputStream::Gzip(input) => input.read(buf),
        }
    }
}

/// Dump the values a command selects from the `target` store.
pub fn export<P: SessionProvider>(
    provider: &P,
    target: &str,
    command: &Command,
) -> Result<TransferSummary> {
    let session = provider.connect(target, &command.credentials)?;

    let setup = session.resolve(&command.point).and_then(|point| {
        let output = OutputStream::open(command.path.as_deref())?;
        Ok((point, output))
    });
    let (point, output) = match setup {
        Ok(setup) => setup,
        Err(e) => {
            release(session);
            return Err(e);
        }
    };

    match &point {
        Some(point) => tracing::debug!("Point: {}", point),
        None => tracing::debug!("Point: all"),
    }
    let query = ValuesQuery {
        point,
        interval: command.effective_interval(),
        pull: command.pull,
        synced: command.synced,
    };
    tracing::debug!(pull = query.pull, synced = query.synced, "Interval: {}", query.interval);
    if query.interval.is_empty() {
        tracing::warn!("Interval {} selects no values", query.interval);
    }

    let mut writer = ValuesWriter::new(output);
    let streamed = stream_values(&session, &query, &mut writer);
    let closed = writer
        .finish()
        .and_then(|(output, summary)| output.close().map(|_| summary));
    let logged_out = session.logout();

    streamed?;
    let summary = closed?;
    logged_out?;
    Ok(summary)
}

fn stream_values<S: StoreSession, W: Write>(
    session: &S,
    query: &ValuesQuery,
    writer: &mut ValuesWriter<W>,
) -> Result<()> {
    for value in session.query(query)? {
        writer.append(&value?)?;
    }
    Ok(())
}

/// Load the values of the command's file into the `target` store.
pub fn import<P: SessionProvider>(
    provider: &P,
    target: &str,
    command: &Command,
) -> Result<TransferSummary> {
    let mut session = provider.connect(target, &command.credentials)?;

    let opened = match command.path.as_deref() {
        Some(path) => InputStream::open(path),
        None => Err(io::Error::new(io::ErrorKind::InvalidInput, "no source file").into()),
    };
    let input = match opened {
        Ok(input) => input,
        Err(e) => {
            release(session);
            return Err(e);
        }
    };

    let mut reader = ValuesReader::new(BufReader::new(input));
    let mut summary = TransferSummary::default();
    let loaded = submit_values(&mut session, &mut reader, &mut summary);
    let logged_out = session.logout();
    drop(reader);

    loaded?;
    logged_out?;
    Ok(summary)
}

fn submit_values<S: StoreSession, R: io::BufRead>(
    session: &mut S,
    reader: &mut ValuesReader<R>,
    summary: &mut TransferSummary,
) -> Result<()> {
    for value in reader {
        let version = session.submit(&value?)?;
        summary.observe(Some(version));
    }
    Ok(())
}

/// Log out after a failed setup; the setup error is the one reported.
fn release<S: StoreSession>(session: S) {
    if let Err(e) = session.logout() {
        tracing::warn!("Logout failed: {}", e);
    }
}
