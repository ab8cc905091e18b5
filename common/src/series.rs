use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

/// How bars are mapped onto benchmark operations
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LabelScheme {
    /// The first matching row is the write, every following row is a read
    #[default]
    WriteThenReads,
    /// Every matching row is a read, numbered from 1
    ReadsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Write,
    Read(usize),
}

impl OperationKind {
    pub fn for_index(index: usize, scheme: LabelScheme) -> Self {
        match scheme {
            LabelScheme::WriteThenReads if index == 0 => Self::Write,
            LabelScheme::WriteThenReads => Self::Read(index),
            LabelScheme::ReadsOnly => Self::Read(index + 1),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => write!(f, "w"),
            Self::Read(n) => write!(f, "r{n}"),
        }
    }
}

/// Tick labels for `count` bars
pub fn labels(count: usize, scheme: LabelScheme) -> Vec<String> {
    (0..count)
        .map(|i| OperationKind::for_index(i, scheme).to_string())
        .collect()
}

/// Durations in seconds, in the row order of the source CSV
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Series {
    values: Vec<f64>,
}

impl Series {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest duration, never below 0
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Smallest duration, never above 0
    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::min)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    pub fn labels(&self, scheme: LabelScheme) -> Vec<String> {
        labels(self.len(), scheme)
    }
}
