//! Loading raw reads from sequence files.
//!
//! FASTQ input goes through `bio`; everything else is read line by line, skipping
//! `>` header lines and blank lines so that every remaining line is one read.
//! Gzip-compressed files are decoded transparently.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use bio::io::fastq;
use flate2::read::MultiGzDecoder;

/// Errors returned while loading reads.
#[derive(thiserror::Error, Debug)]
pub enum ReadSourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed FASTQ record in {}: {message}", .path.display())]
    Fastq { path: PathBuf, message: String },
    #[error("Non UTF-8 sequence data in {}", .0.display())]
    NonUtf8(PathBuf),
}

/// Marker that opens a header line in the line-oriented format.
pub const HEADER_MARKER: char = '>';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    Fastq,
    /// Header lines are skipped, every other non-empty line is one read.
    Lines,
}

pub fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
        .unwrap_or(false)
}

/// Guess the format from the extension, looking through a `.gz`/`.bgz` suffix.
pub fn infer_format(path: &Path) -> SequenceFormat {
    let mut ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    if is_gzip(path) {
        ext = path
            .file_stem()
            .and_then(|stem| Path::new(stem).extension())
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
    }

    match ext.as_str() {
        "fastq" | "fq" => SequenceFormat::Fastq,
        _ => SequenceFormat::Lines,
    }
}

pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>, ReadSourceError> {
    let file = File::open(path).map_err(|source| ReadSourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Collect reads from the header/sequence line format.
///
/// Lines are trimmed; empty lines and lines starting with [`HEADER_MARKER`] are skipped.
/// Case and alphabet are left as found.
pub fn parse_lines<R: BufRead>(mut reader: R) -> Result<Vec<String>, ReadSourceError> {
    let mut reads = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(HEADER_MARKER) {
            continue;
        }
        reads.push(trimmed.to_owned());
    }
    Ok(reads)
}

fn parse_fastq<R: BufRead>(reader: R, path: &Path) -> Result<Vec<String>, ReadSourceError> {
    let fastq_reader = fastq::Reader::new(reader);
    let mut reads = Vec::new();
    for record in fastq_reader.records() {
        let record = record.map_err(|err| ReadSourceError::Fastq {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let seq = String::from_utf8(record.seq().to_vec())
            .map_err(|_| ReadSourceError::NonUtf8(path.to_path_buf()))?;
        if !seq.is_empty() {
            reads.push(seq);
        }
    }
    Ok(reads)
}

/// Load every read from `path`, in file order.
pub fn read_sequences(path: &Path) -> Result<Vec<String>, ReadSourceError> {
    let reader = open_reader(path)?;
    let reads = match infer_format(path) {
        SequenceFormat::Fastq => parse_fastq(reader, path)?,
        SequenceFormat::Lines => parse_lines(reader)?,
    };
    log::info!("Read {} sequences from {}", reads.len(), path.display());
    Ok(reads)
}
