//! Build-log decoding.
//!
//! `.xcactivitylog` files are gzip-compressed SLF streams: mostly binary
//! tokens with the compiler output embedded as length-prefixed strings. The
//! reader inflates when the gzip magic is present and then splits the payload
//! into printable runs, much like `strings(1)`, so the pattern engine sees
//! ordinary text lines. Plain-text logs pass through unchanged.

use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::debug;
use xcdiag_core::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Runs cut short by a binary byte are dropped below this length.
const MIN_BINARY_RUN: usize = 4;

/// Decoded build log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogText {
    pub lines: Vec<String>,
    pub compressed: bool,
}

impl LogText {
    /// Decode raw log bytes, inflating gzip content when detected.
    ///
    /// `path` is only used for error reporting.
    ///
    /// # Errors
    /// Returns [`Error::Decompress`] if a gzip stream is corrupt.
    pub fn from_bytes(raw: Vec<u8>, path: &Path) -> Result<Self> {
        let compressed = raw.starts_with(&GZIP_MAGIC);
        let bytes = if compressed {
            let mut inflated = Vec::with_capacity(raw.len() * 4);
            MultiGzDecoder::new(raw.as_slice())
                .read_to_end(&mut inflated)
                .map_err(|source| Error::Decompress {
                    path: path.to_path_buf(),
                    source,
                })?;
            inflated
        } else {
            raw
        };

        let lines = printable_lines(&bytes);
        debug!(
            "Decoded {} ({} bytes, {} lines, compressed={compressed})",
            path.display(),
            bytes.len(),
            lines.len()
        );
        Ok(Self { lines, compressed })
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Read and decode a build log.
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::Decompress`] if its gzip stream is corrupt.
pub fn read_log(path: &Path) -> Result<LogText> {
    let mut raw = Vec::new();
    std::fs::File::open(path)
        .and_then(|mut file| file.read_to_end(&mut raw))
        .map_err(|e| Error::io(path, e))?;
    LogText::from_bytes(raw, path)
}

/// Split bytes into text lines.
///
/// Newlines always end a line, so plain text keeps its blank lines and short
/// lines. Other control bytes end a run as well, and such runs are kept only
/// when they are at least [`MIN_BINARY_RUN`] bytes long. Non-ASCII bytes are
/// kept and decoded lossily as UTF-8.
#[must_use]
pub fn printable_lines(bytes: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut run: Vec<u8> = Vec::new();
    let mut prev_cr = false;
    let mut after_binary = false;

    for &b in bytes {
        match b {
            b'\n' if prev_cr => {}
            b'\n' | b'\r' => {
                lines.push(flush(&mut run));
                after_binary = false;
            }
            b'\t' => run.push(b),
            0x00..=0x1f | 0x7f => {
                if run.len() >= MIN_BINARY_RUN {
                    lines.push(flush(&mut run));
                } else {
                    run.clear();
                }
                after_binary = true;
            }
            _ => run.push(b),
        }
        prev_cr = b == b'\r';
    }
    if run.len() >= MIN_BINARY_RUN || (!run.is_empty() && !after_binary) {
        lines.push(flush(&mut run));
    }
    lines
}

fn flush(run: &mut Vec<u8>) -> String {
    let line = String::from_utf8_lossy(run.as_slice()).into_owned();
    run.clear();
    line
}
