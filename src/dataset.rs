//! Training-data capture: appends labelled feature rows to a CSV file.

use anyhow::{Context, Result, anyhow};
use log::info;
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
    str::FromStr,
};

use crate::pipeline::HandObservation;

/// Highest label id accepted for capture.
pub const MAX_LABEL: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// Normalized landmark vectors (one row per observed hand).
    Pose,
    /// Normalized trajectory vectors (only once the history is full).
    Motion,
}

impl FromStr for DatasetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pose" | "keypoint" => Ok(Self::Pose),
            "motion" | "point_history" => Ok(Self::Motion),
            other => Err(anyhow!("unknown dataset kind '{other}' (pose|motion)")),
        }
    }
}

pub struct DatasetWriter<W: Write> {
    out: W,
    kind: DatasetKind,
    label: u8,
    rows: usize,
}

impl DatasetWriter<BufWriter<File>> {
    /// Opens `path` for appending, creating it if needed.
    pub fn append(path: &Path, kind: DatasetKind, label: u8) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        info!("recording {kind:?} rows with label {label} to {}", path.display());
        Self::new(BufWriter::new(file), kind, label)
    }
}

impl<W: Write> DatasetWriter<W> {
    pub fn new(out: W, kind: DatasetKind, label: u8) -> Result<Self> {
        if label > MAX_LABEL {
            return Err(anyhow!("label must be 0..={MAX_LABEL}, got {label}"));
        }
        Ok(Self {
            out,
            kind,
            label,
            rows: 0,
        })
    }

    /// Writes a row for `obs` if it carries features of this writer's kind.
    pub fn record(&mut self, obs: &HandObservation) -> Result<bool> {
        let features = match self.kind {
            DatasetKind::Pose => Some(&obs.landmark_features),
            DatasetKind::Motion => obs.trajectory_features.as_ref(),
        };
        let Some(features) = features else {
            return Ok(false);
        };

        let mut line = self.label.to_string();
        for f in features {
            line.push(',');
            line.push_str(&f.to_string());
        }
        writeln!(self.out, "{line}")?;
        self.rows += 1;
        Ok(true)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
