//! Streaming session: detector frames in, per-hand results out.

use anyhow::Result;
use log::{debug, info, warn};
use serde::Serialize;
use std::{
    io::{BufRead, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::dataset::DatasetWriter;
use crate::input::read_frames;
use crate::pipeline::{GesturePipeline, HandResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One JSON [`FrameReport`] per line.
    Json,
    /// One summary line per hand, or "No hand detected".
    Text,
}

#[derive(Debug, Serialize)]
pub struct FrameReport<'a> {
    pub frame: u64,
    pub hands: &'a [HandResult],
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub skipped_lines: u64,
    pub hands: u64,
    pub recorded_rows: usize,
}

/// Runs until input ends or `stop` is raised. `stop` is only checked
/// between frames, so a frame is always processed completely.
pub fn run_session<R, W, D>(
    pipeline: &mut GesturePipeline,
    input: R,
    mut out: W,
    mode: OutputMode,
    mut recorder: Option<&mut DatasetWriter<D>>,
    stop: &Arc<AtomicBool>,
) -> Result<SessionStats>
where
    R: BufRead,
    W: Write,
    D: Write,
{
    let mut stats = SessionStats::default();

    for parsed in read_frames(input) {
        if stop.load(Ordering::Relaxed) {
            info!("session stopped after {} frames", stats.frames);
            break;
        }
        let frame = match parsed {
            Ok(f) => f,
            Err(e) => {
                warn!("{e}");
                stats.skipped_lines += 1;
                continue;
            }
        };

        let observations = pipeline.observe(&frame)?;
        let frame_no = stats.frames;
        stats.frames += 1;
        stats.hands += observations.len() as u64;
        debug!("frame {frame_no}: {} hands", observations.len());

        if let Some(rec) = recorder.as_deref_mut() {
            for obs in &observations {
                rec.record(obs)?;
            }
        }

        let results: Vec<HandResult> = observations.into_iter().map(|o| o.result).collect();
        match mode {
            OutputMode::Json => {
                let report = FrameReport {
                    frame: frame_no,
                    hands: &results,
                };
                writeln!(out, "{}", serde_json::to_string(&report)?)?;
            }
            OutputMode::Text => {
                if results.is_empty() {
                    writeln!(out, "No hand detected")?;
                }
                for r in &results {
                    writeln!(out, "{}", r.summary())?;
                }
            }
        }
        out.flush()?;
    }

    if let Some(rec) = recorder {
        rec.flush()?;
        stats.recorded_rows = rec.rows();
    }
    Ok(stats)
}
