//! Metrics reports for worldtests and the demo binary.
//!
//! Reports are exported as pretty JSON (usually under `target/metrics/`) so CI can diff
//! generation, meshing and digging behavior between commits.

use anyhow::{Context, Result};
use deepvein_core::MaterialTally;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Top-level metrics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Test or run identifier
    pub test_name: String,

    /// Timestamp when metrics were collected (RFC 3339)
    pub timestamp: String,

    /// Overall result
    pub result: TestResult,

    /// Terrain generation metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terrain: Option<TerrainMetrics>,

    /// Surface extraction metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meshing: Option<MeshMetrics>,

    /// Digging metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digging: Option<DigMetrics>,

    /// Ore connectivity metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clusters: Option<ClusterMetrics>,

    /// Execution metrics
    pub test_execution: TestExecutionMetrics,
}

/// Overall result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    /// All validations passed
    Pass,
    /// A validation failed
    Fail,
    /// Skipped
    Skip,
}

/// Terrain generation metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerrainMetrics {
    /// Chunks generated
    pub chunks_generated: usize,

    /// Grid samples written
    pub samples_generated: usize,

    /// Samples with positive density
    pub solid_samples: usize,

    /// Solid samples tagged with an ore
    pub ore_samples: usize,

    /// Lowest surface height seen
    pub min_surface: f32,

    /// Highest surface height seen
    pub max_surface: f32,

    /// Total generation time (milliseconds)
    pub total_gen_time_ms: f64,
}

/// Surface extraction metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshMetrics {
    /// Meshes extracted
    pub meshes_built: usize,

    /// Triangles in the last mesh
    pub triangles: usize,

    /// Vertices in the last mesh
    pub vertices: usize,

    /// Cubes that emitted at least one triangle in the last mesh
    pub active_cubes: usize,

    /// Average extraction time (microseconds)
    pub avg_mesh_time_us: f64,

    /// Hash of the last mesh (hex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh_hash: Option<String>,
}

/// Digging metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigMetrics {
    /// Dig operations attempted
    pub digs: usize,

    /// Strikes rejected by tool tier
    pub blocked: usize,

    /// Samples flipped to air, per material
    pub removed: MaterialTally,
}

impl DigMetrics {
    /// Total samples flipped to air.
    pub fn removed_total(&self) -> u32 {
        deepvein_core::tally_total(&self.removed)
    }
}

/// Ore connectivity metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterMetrics {
    /// Clusters with no path to the bottom row
    pub floating_clusters: usize,

    /// Clusters resting on the bottom row
    pub grounded_clusters: usize,

    /// Ore samples across floating clusters
    pub floating_ore_samples: usize,

    /// Markers detached after the last remesh
    pub detached_markers: usize,
}

/// Execution metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestExecutionMetrics {
    /// Total duration (seconds)
    pub duration_seconds: f64,

    /// Number of assertions checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertions_checked: Option<usize>,
}

/// Builder for [`MetricsReport`]
pub struct MetricsReportBuilder {
    report: MetricsReport,
}

impl MetricsReportBuilder {
    /// Start a report stamped with the current time
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            report: MetricsReport {
                test_name: test_name.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                result: TestResult::Pass,
                terrain: None,
                meshing: None,
                digging: None,
                clusters: None,
                test_execution: TestExecutionMetrics::default(),
            },
        }
    }

    /// Set result
    pub fn result(mut self, result: TestResult) -> Self {
        self.report.result = result;
        self
    }

    /// Set terrain metrics
    pub fn terrain(mut self, metrics: TerrainMetrics) -> Self {
        self.report.terrain = Some(metrics);
        self
    }

    /// Set meshing metrics
    pub fn meshing(mut self, metrics: MeshMetrics) -> Self {
        self.report.meshing = Some(metrics);
        self
    }

    /// Set digging metrics
    pub fn digging(mut self, metrics: DigMetrics) -> Self {
        self.report.digging = Some(metrics);
        self
    }

    /// Set cluster metrics
    pub fn clusters(mut self, metrics: ClusterMetrics) -> Self {
        self.report.clusters = Some(metrics);
        self
    }

    /// Set execution metrics
    pub fn execution(mut self, metrics: TestExecutionMetrics) -> Self {
        self.report.test_execution = metrics;
        self
    }

    /// Finish the report
    pub fn build(self) -> MetricsReport {
        self.report
    }
}

/// Writes metrics reports as pretty JSON.
pub struct MetricsSink {
    path: PathBuf,
}

impl MetricsSink {
    /// Create a sink at `path`, creating parent directories.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        Ok(Self { path })
    }

    /// Sink for `target/metrics/<name>.json` under the workspace root.
    pub fn for_worldtest(name: &str) -> Result<Self> {
        Self::create(metrics_dir().join(format!("{name}.json")))
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `report`, replacing any previous file.
    pub fn write(&self, report: &MetricsReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)
            .with_context(|| format!("failed to create {}", self.path.display()))?;
        file.write_all(json.as_bytes())?;
        tracing::debug!(path = %self.path.display(), test = %report.test_name, "metrics written");
        Ok(())
    }
}

/// `target/metrics` relative to the workspace, honoring `CARGO_TARGET_DIR`.
pub fn metrics_dir() -> PathBuf {
    let target = std::env::var_os("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("../../target"));
    target.join("metrics")
}
