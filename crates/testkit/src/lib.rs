#![warn(missing_docs)]
//! Deterministic testing surfaces: metrics reports, mesh hash dumps and dig event logs.

mod metrics;

use anyhow::Result;
use deepvein_core::MaterialTally;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use metrics::*;

/// One dig recorded by a scripted run.
#[derive(Debug, Serialize)]
pub struct DigEventRecord<'a> {
    /// Zero-based step in the script.
    pub step: usize,
    /// World-space target.
    pub position: [f32; 3],
    /// Outcome label (`dug`, `blocked`, ...).
    pub outcome: &'a str,
    /// Samples flipped to air, per material.
    pub removed: &'a MaterialTally,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self { file })
    }

    /// Append one record as a single line.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}

/// Mesh snapshot for one extraction.
#[derive(Debug, Serialize)]
pub struct MeshMetric {
    /// Free-form label, e.g. `"seed 42 after 3 digs"`.
    pub label: String,
    /// Triangle count.
    pub triangles: usize,
    /// Vertex count.
    pub vertices: usize,
    /// Mesh hash (hex string) for deterministic comparisons.
    pub hash: String,
}

/// Writes mesh metrics to JSON for CI artifacts.
pub struct MeshMetricSink {
    file: File,
}

impl MeshMetricSink {
    /// Create a sink pointed at the supplied path, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            file: File::create(path)?,
        })
    }

    /// Persist the provided metrics as pretty JSON.
    pub fn write(&mut self, metrics: &[MeshMetric]) -> Result<()> {
        let json = serde_json::to_string_pretty(metrics)?;
        self.file.write_all(json.as_bytes())?;
        Ok(())
    }
}
