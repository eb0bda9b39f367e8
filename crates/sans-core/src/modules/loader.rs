//! Loading, summing and concatenating the runs of a reduction.
//!
//! `Runs` is a comma separated list of samples; `+` inside an entry sums runs and
//! `000000` stands for a missing sample that is replaced by a blank after loading.

use super::context::CorrectionContext;
use super::serialization::{WORKSPACE_EXTENSION, read_workspace};
use crate::common::config::ReductionOptions;
use crate::common::constants::EMPTY_TOKEN;
use crate::domain::{SansError, SansResult};
use crate::workspace::{NORMALISED_BY_FLUX_LOG, Workspace, WorkspaceStore};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolves a single run token to a workspace.
pub trait RunSource {
    fn load_run(&self, run: &str) -> SansResult<Workspace>;
}

/// Runs stored as workspace JSON files under a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonRunSource {
    data_dir: PathBuf,
}

impl JsonRunSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, run: &str) -> PathBuf {
        let candidate = self.data_dir.join(run);
        if candidate.extension().is_some_and(|ext| ext == WORKSPACE_EXTENSION) {
            candidate
        } else {
            self.data_dir.join(format!("{}.{}", run, WORKSPACE_EXTENSION))
        }
    }
}

impl RunSource for JsonRunSource {
    fn load_run(&self, run: &str) -> SansResult<Workspace> {
        read_workspace(&self.path_for(run))
    }
}

impl RunSource for WorkspaceStore {
    fn load_run(&self, run: &str) -> SansResult<Workspace> {
        self.require(run).cloned()
    }
}

/// Loads the runs of `options`, derives the correction context from the first one and
/// returns the primary workspace tagged with its process type.
pub fn load_runs<S: RunSource + ?Sized>(
    source: &S,
    options: &ReductionOptions,
) -> SansResult<(Workspace, CorrectionContext)> {
    let entries: Vec<&str> = options.runs.split(',').map(str::trim).collect();
    if entries.iter().all(|entry| entry.is_empty() || *entry == EMPTY_TOKEN) {
        return Err(SansError::validation(
            "VALIDATION.NO_RUNS",
            format!("no run to load in '{}'", options.runs),
        ));
    }
    if let Some(index) = entries.iter().position(|entry| entry.is_empty()) {
        return Err(SansError::validation(
            "VALIDATION.RUN_LIST",
            format!("entry #{} of '{}' is empty", index + 1, options.runs),
        ));
    }

    let mut loaded = Vec::new();
    for entry in entries.iter().filter(|entry| **entry != EMPTY_TOKEN) {
        loaded.push(load_entry(source, entry)?);
    }
    let process = options.process_as;
    let output = options.output_workspace.as_str();

    let (mut workspace, context) = if entries.len() > 1 {
        let context = CorrectionContext::setup(process, entries.len(), &loaded[0])?;
        if context.is_tof() {
            return Err(SansError::validation(
                "VALIDATION.TOF_RUN_LIST",
                "listing of runs is not allowed for TOF mode as concatenation of multiple runs is not possible",
            ));
        }
        if !process.allows_run_listing() {
            return Err(SansError::validation(
                "VALIDATION.RUN_LIST",
                format!(
                    "listing of runs in {} mode is allowed only for sample and transmission measurements, not {}",
                    context.mode(),
                    process
                ),
            ));
        }
        for run in &mut loaded {
            run.convert_to_point_data();
        }
        let runs = inject_blank_samples(loaded, &entries);
        (Workspace::conjoin(&runs, output)?, context)
    } else {
        let mut run = loaded.remove(0);
        let context = CorrectionContext::setup(process, 1, &run)?;
        run.convert_to_point_data();
        run.name = output.to_string();
        (run, context)
    };
    workspace.set_processed_as(process);
    // raw runs are not normalised by flux unless they say so
    if !workspace.logs.has(NORMALISED_BY_FLUX_LOG) {
        workspace.logs.add_flag(NORMALISED_BY_FLUX_LOG, false);
    }
    info!(
        workspace = %workspace.name,
        spectra = workspace.number_histograms(),
        bins = workspace.blocksize(),
        "loaded runs"
    );
    Ok((workspace, context))
}

/// Loads one entry of the run list, summing `+` separated runs.
fn load_entry<S: RunSource + ?Sized>(source: &S, entry: &str) -> SansResult<Workspace> {
    let mut runs = entry
        .split('+')
        .map(str::trim)
        .map(|run| {
            debug!(run, "loading run");
            source.load_run(run)
        })
        .collect::<SansResult<Vec<_>>>()?;
    if runs.len() == 1 {
        return Ok(runs.remove(0));
    }
    Workspace::sum(&runs, entry)
}

/// Inserts a zero workspace wherever the run list holds the blank token.
fn inject_blank_samples(loaded: Vec<Workspace>, entries: &[&str]) -> Vec<Workspace> {
    let mut loaded = loaded.into_iter();
    let mut reference: Option<Workspace> = None;
    let mut runs = Vec::with_capacity(entries.len());
    let mut blanks = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        if *entry == EMPTY_TOKEN {
            blanks.push((index, runs.len()));
            runs.push(None);
        } else if let Some(run) = loaded.next() {
            if reference.is_none() {
                reference = Some(run.clone());
            }
            runs.push(Some(run));
        }
    }
    let Some(reference) = reference else {
        return Vec::new();
    };
    for (index, position) in blanks {
        runs[position] = Some(reference.blank_like(format!("__blank_{}", index)));
    }
    runs.into_iter().flatten().collect()
}
