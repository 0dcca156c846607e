// ============================================================
// Layer 6 - Experiment Tracking Store
// ============================================================
// A file-backed, run-scoped metric sink. Every run gets its own
// directory, so values from one run can never show up in another:
//
//   mlruns/
//     <experiment>/
//       <run_id>/
//         meta.json      id, name, status, start/end time (ms)
//         params.json    string key -> string value
//         metrics.csv    name,value,step,timestamp (appended)
//         artifacts/     named text files (e.g. train_config.json)
//
// Example metrics.csv:
//   name,value,step,timestamp
//   Precision,0.8421052631578947,0,1760790000123
//   Recall,0.7804878048780488,0,1760790000124
//
// RunGuard wraps a started run. `finish()` marks it FINISHED;
// dropping the guard without finishing marks it FAILED, so the
// run is closed on every exit path, including `?` and panics.
//
// Reference: Rust Book §15.3 (Running Code on Cleanup with Drop)
//            csv and serde_json crate documentation

use std::{
    collections::{BTreeMap, HashMap},
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::{Result, RunError};
use crate::domain::traits::{MetricSink, RunHandle, RunStatus};

const META_FILE: &str = "meta.json";
const PARAMS_FILE: &str = "params.json";
const METRICS_FILE: &str = "metrics.csv";
const ARTIFACT_DIR: &str = "artifacts";

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Contents of meta.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: String,
    pub run_name: Option<String>,
    pub experiment: String,
    pub status: RunStatus,
    pub start_time_ms: u64,
    pub end_time_ms: Option<u64>,
}

/// One row of metrics.csv
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub name: String,
    pub value: f64,
    pub step: u64,
    pub timestamp: u64,
}

/// Per-run state held while the run is active
struct ActiveRun {
    meta: RunMeta,
    params: BTreeMap<String, String>,
}

/// Writes runs under `<tracking_dir>/<experiment>/`.
pub struct FileTracker {
    experiment: String,
    experiment_dir: PathBuf,
    active: HashMap<String, ActiveRun>,
}

impl FileTracker {
    /// Open (creating if needed) the experiment directory
    pub fn new(tracking_dir: impl AsRef<Path>, experiment: impl Into<String>) -> Result<Self> {
        let experiment = experiment.into();
        let experiment_dir = tracking_dir.as_ref().join(&experiment);
        fs::create_dir_all(&experiment_dir).map_err(|e| {
            RunError::SinkFailure(format!(
                "cannot create tracking directory '{}': {e}",
                experiment_dir.display()
            ))
        })?;

        tracing::debug!("Tracking runs in '{}'", experiment_dir.display());
        Ok(Self {
            experiment,
            experiment_dir,
            active: HashMap::new(),
        })
    }

    /// Directory holding everything recorded for `run`
    pub fn run_dir(&self, run: &RunHandle) -> PathBuf {
        self.experiment_dir.join(run.id())
    }

    /// Read meta.json back from disk
    pub fn read_meta(&self, run: &RunHandle) -> Result<RunMeta> {
        let json = fs::read_to_string(self.run_dir(run).join(META_FILE))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Read params.json back from disk
    pub fn read_params(&self, run: &RunHandle) -> Result<BTreeMap<String, String>> {
        let path = self.run_dir(run).join(PARAMS_FILE);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Read every row of metrics.csv back from disk
    pub fn read_metrics(&self, run: &RunHandle) -> Result<Vec<MetricRow>> {
        let path = self.run_dir(run).join(METRICS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(path).map_err(sink_csv)?;
        reader
            .deserialize::<MetricRow>()
            .map(|row| row.map_err(sink_csv))
            .collect()
    }

    fn active_run(&mut self, run: &RunHandle) -> Result<&mut ActiveRun> {
        self.active
            .get_mut(run.id())
            .ok_or_else(|| RunError::SinkFailure(format!("run {run} is not active")))
    }

    fn write_meta(&self, meta: &RunMeta) -> Result<()> {
        let path = self.experiment_dir.join(&meta.run_id).join(META_FILE);
        fs::write(path, serde_json::to_string_pretty(meta)?)?;
        Ok(())
    }
}

fn sink_csv(e: csv::Error) -> RunError {
    RunError::SinkFailure(e.to_string())
}

impl MetricSink for FileTracker {
    fn start_run(&mut self, run_name: Option<&str>) -> Result<RunHandle> {
        let run = RunHandle(Uuid::new_v4().simple().to_string());
        fs::create_dir_all(self.run_dir(&run))?;

        let meta = RunMeta {
            run_id: run.id().to_string(),
            run_name: run_name.map(String::from),
            experiment: self.experiment.clone(),
            status: RunStatus::Running,
            start_time_ms: now_ms(),
            end_time_ms: None,
        };
        self.write_meta(&meta)?;

        // Header row first, so every later write can simply append
        let mut writer = csv::Writer::from_path(self.run_dir(&run).join(METRICS_FILE))
            .map_err(sink_csv)?;
        writer
            .write_record(["name", "value", "step", "timestamp"])
            .map_err(sink_csv)?;
        writer.flush()?;

        self.active.insert(
            run.id().to_string(),
            ActiveRun {
                meta,
                params: BTreeMap::new(),
            },
        );
        tracing::info!("Started run {} in experiment '{}'", run, self.experiment);
        Ok(run)
    }

    fn log_param(&mut self, run: &RunHandle, key: &str, value: &str) -> Result<()> {
        let path = self.run_dir(run).join(PARAMS_FILE);
        let active = self.active_run(run)?;
        active.params.insert(key.to_string(), value.to_string());
        fs::write(path, serde_json::to_string_pretty(&active.params)?)?;
        Ok(())
    }

    fn log_metric(&mut self, run: &RunHandle, name: &str, value: f64, step: u64) -> Result<()> {
        self.active_run(run)?;

        let file = OpenOptions::new()
            .append(true)
            .open(self.run_dir(run).join(METRICS_FILE))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .serialize(MetricRow {
                name: name.to_string(),
                value,
                step,
                timestamp: now_ms(),
            })
            .map_err(sink_csv)?;
        writer.flush()?;
        Ok(())
    }

    fn log_artifact(&mut self, run: &RunHandle, name: &str, contents: &str) -> Result<()> {
        self.active_run(run)?;
        let dir = self.run_dir(run).join(ARTIFACT_DIR);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(name), contents)?;
        tracing::debug!("Stored artifact '{}' for run {}", name, run);
        Ok(())
    }

    fn end_run(&mut self, run: &RunHandle, status: RunStatus) -> Result<()> {
        let mut meta = self.active_run(run)?.meta.clone();
        meta.status = status;
        meta.end_time_ms = Some(now_ms());
        // The run stays active until its final status is on disk
        self.write_meta(&meta)?;
        self.active.remove(run.id());
        tracing::info!("Run {} ended with status {:?}", run, status);
        Ok(())
    }
}

// ─── RunGuard ─────────────────────────────────────────────────────────────────
/// Scoped ownership of one started run.
pub struct RunGuard<'a, S: MetricSink + ?Sized> {
    sink: &'a mut S,
    run: RunHandle,
    finished: bool,
}

impl<'a, S: MetricSink + ?Sized> RunGuard<'a, S> {
    /// Start a run on `sink` and take charge of closing it
    pub fn start(sink: &'a mut S, run_name: Option<&str>) -> Result<Self> {
        let run = sink.start_run(run_name)?;
        Ok(Self {
            sink,
            run,
            finished: false,
        })
    }

    pub fn handle(&self) -> &RunHandle {
        &self.run
    }

    /// The sink and the run handle, borrowed together
    pub fn parts(&mut self) -> (&mut S, &RunHandle) {
        (&mut *self.sink, &self.run)
    }

    pub fn log_param(&mut self, key: &str, value: impl ToString) -> Result<()> {
        self.sink.log_param(&self.run, key, &value.to_string())
    }

    pub fn log_artifact(&mut self, name: &str, contents: &str) -> Result<()> {
        self.sink.log_artifact(&self.run, name, contents)
    }

    /// Mark the run FINISHED and release it. If the sink rejects
    /// that, the guard still ends the run FAILED when dropped.
    pub fn finish(mut self) -> Result<RunHandle> {
        self.sink.end_run(&self.run, RunStatus::Finished)?;
        self.finished = true;
        Ok(self.run.clone())
    }
}

impl<S: MetricSink + ?Sized> Drop for RunGuard<'_, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.sink.end_run(&self.run, RunStatus::Failed) {
            tracing::warn!("Could not mark run {} as failed: {}", self.run, e);
        }
    }
}
