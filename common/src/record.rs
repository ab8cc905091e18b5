use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use csv::{ByteRecord, Reader, ReaderBuilder};
use itertools::Itertools;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::series::Series;

const FILESYSTEM_COLUMN: usize = 0;
const PATH_COLUMN: usize = 1;
const DURATION_COLUMN: usize = 3;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Could not open {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed CSV")]
    Csv(#[from] csv::Error),
    #[error("Line {line}: missing column {column}")]
    MissingColumn { line: u64, column: usize },
    #[error("Line {line}: invalid duration {value:?}")]
    InvalidDuration { line: u64, value: String },
    #[error("No rows for file {file} on filesystem {filesystem}")]
    NoMatchingRows { filesystem: String, file: String },
}

/// One row of a filesystem test result CSV.
///
/// The file has no header, columns are positional:
/// `filesystem, file path, operation index, duration (s), ...`
#[derive(Debug, Clone, PartialEq)]
pub struct BenchRecord {
    pub filesystem: String,
    pub file_path: String,
    pub duration_secs: f64,
}

impl BenchRecord {
    /// Fields are kept byte-exact, only the duration tolerates surrounding whitespace
    pub fn from_row(row: &ByteRecord) -> Result<Self, RecordError> {
        let line = line_of(row);
        let column = move |idx: usize| {
            row.get(idx)
                .ok_or(RecordError::MissingColumn { line, column: idx })
        };

        let filesystem = String::from_utf8_lossy(column(FILESYSTEM_COLUMN)?).into_owned();
        let file_path = String::from_utf8_lossy(column(PATH_COLUMN)?).into_owned();
        let raw = column(DURATION_COLUMN)?;
        let duration_secs = std::str::from_utf8(raw)
            .ok()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite())
            .ok_or_else(|| RecordError::InvalidDuration {
                line,
                value: String::from_utf8_lossy(raw).into_owned(),
            })?;

        Ok(Self {
            filesystem,
            file_path,
            duration_secs,
        })
    }

    pub fn basename(&self) -> &str {
        basename(&self.file_path)
    }
}

/// Last `/` separated segment of `path`
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn basename_bytes(path: &[u8]) -> &[u8] {
    path.rsplit(|b| *b == b'/').next().unwrap_or(path)
}

fn line_of(row: &ByteRecord) -> u64 {
    row.position().map(|p| p.line()).unwrap_or_default()
}

fn csv_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

fn open(path: &Path) -> Result<File, RecordError> {
    File::open(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_target(row: &ByteRecord, filesystem: &str, file: &str) -> bool {
    match (row.get(FILESYSTEM_COLUMN), row.get(PATH_COLUMN)) {
        (Some(fs), Some(path)) => {
            fs == filesystem.as_bytes() && basename_bytes(path) == file.as_bytes()
        }
        _ => false,
    }
}

/// Collects the durations of every row written for `file` on `filesystem`.
///
/// Filesystem and file are compared byte for byte. Only matching rows have
/// their duration parsed, so unrelated rows may carry any shape or encoding. Fails with [`RecordError::NoMatchingRows`] when nothing
/// matches.
pub fn filter_series(
    csv_path: &Path,
    filesystem: &str,
    file: &str,
) -> Result<Series, RecordError> {
    debug!("Reading {csv_path:?} for {file} on {filesystem}");
    filter_reader(open(csv_path)?, filesystem, file)
}

pub fn filter_reader<R: Read>(
    reader: R,
    filesystem: &str,
    file: &str,
) -> Result<Series, RecordError> {
    let mut values = Vec::new();
    for row in csv_reader(reader).byte_records() {
        let row = row?;
        if !is_target(&row, filesystem, file) {
            continue;
        }
        let record = BenchRecord::from_row(&row)?;
        trace!(
            "Line {}: {} took {}s",
            line_of(&row),
            record.basename(),
            record.duration_secs
        );
        values.push(record.duration_secs);
    }

    if values.is_empty() {
        return Err(RecordError::NoMatchingRows {
            filesystem: filesystem.to_owned(),
            file: file.to_owned(),
        });
    }
    debug!("Matched {} rows", values.len());
    Ok(Series::new(values))
}

/// A plottable (filesystem, file) pair found in a result CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSummary {
    pub filesystem: String,
    pub file: String,
    pub rows: usize,
}

pub fn summarize(
    csv_path: &Path,
    filter: Option<&Regex>,
) -> Result<Vec<TargetSummary>, RecordError> {
    summarize_reader(open(csv_path)?, filter)
}

/// Lists every (filesystem, basename) pair in first-seen order, invalid UTF-8 is shown lossily
pub fn summarize_reader<R: Read>(
    reader: R,
    filter: Option<&Regex>,
) -> Result<Vec<TargetSummary>, RecordError> {
    let mut keys = Vec::new();
    for row in csv_reader(reader).byte_records() {
        let row = row?;
        let (Some(fs), Some(path)) = (row.get(FILESYSTEM_COLUMN), row.get(PATH_COLUMN)) else {
            continue;
        };
        let fs = String::from_utf8_lossy(fs);
        if filter.is_some_and(|r| !r.is_match(&fs)) {
            continue;
        }
        keys.push((
            fs.into_owned(),
            String::from_utf8_lossy(basename_bytes(path)).into_owned(),
        ));
    }

    let counts = keys.iter().counts();
    Ok(keys
        .iter()
        .unique()
        .map(|key| TargetSummary {
            filesystem: key.0.clone(),
            file: key.1.clone(),
            rows: counts[&key],
        })
        .collect())
}
