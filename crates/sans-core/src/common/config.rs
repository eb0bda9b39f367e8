//! Reduction options and multi-step reduction plans.
//!
//! Keys follow the property names of the ILL SANS reduction (`ProcessAs`,
//! `SampleThickness`, ...), so plans read like the algorithm calls they replace.

use crate::domain::{NormaliseBy, ProcessType, SansError, SansResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_BEAM_RADIUS: f64 = 0.2;
pub const DEFAULT_SAMPLE_THICKNESS: f64 = 0.1;
pub const DEFAULT_WATER_CROSS_SECTION: f64 = 1.0;

/// Thickness value asking for the thickness recorded in the run logs.
pub const THICKNESS_FROM_LOGS: f64 = -1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReductionOptions {
    /// Comma separated runs; `+` sums runs, `000000` marks a missing sample.
    #[serde(default)]
    pub runs: String,
    #[serde(default)]
    pub process_as: ProcessType,
    #[serde(default)]
    pub output_workspace: String,
    #[serde(default)]
    pub normalise_by: NormaliseBy,
    /// Beam radius [m] for beam centre, transmission and flux.
    #[serde(default = "default_beam_radius")]
    pub beam_radius: f64,
    /// Sample thickness [cm]; one value, or one per sample.
    #[serde(default = "default_sample_thickness")]
    pub sample_thickness: Vec<f64>,
    /// Water cross-section [cm-1] applied with the flat field.
    #[serde(default = "default_water_cross_section")]
    pub water_cross_section: f64,
    #[serde(default = "default_true")]
    pub transmission_theta_dependent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_flux_workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_sensitivity_workspace: Option<String>,
}

fn default_beam_radius() -> f64 {
    DEFAULT_BEAM_RADIUS
}

fn default_sample_thickness() -> Vec<f64> {
    vec![DEFAULT_SAMPLE_THICKNESS]
}

fn default_water_cross_section() -> f64 {
    DEFAULT_WATER_CROSS_SECTION
}

fn default_true() -> bool {
    true
}

impl Default for ReductionOptions {
    fn default() -> Self {
        Self {
            runs: String::new(),
            process_as: ProcessType::default(),
            output_workspace: String::new(),
            normalise_by: NormaliseBy::default(),
            beam_radius: DEFAULT_BEAM_RADIUS,
            sample_thickness: default_sample_thickness(),
            water_cross_section: DEFAULT_WATER_CROSS_SECTION,
            transmission_theta_dependent: true,
            output_flux_workspace: None,
            output_sensitivity_workspace: None,
        }
    }
}

impl ReductionOptions {
    pub fn new(process: ProcessType, runs: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            runs: runs.into(),
            process_as: process,
            output_workspace: output.into(),
            ..Self::default()
        }
    }

    /// Number of samples in the batch, blanks included.
    pub fn sample_count(&self) -> usize {
        self.runs.matches(',').count() + 1
    }

    pub fn requested_flux_output(&self) -> Option<&str> {
        non_empty(self.output_flux_workspace.as_deref())
    }

    pub fn requested_sensitivity_output(&self) -> Option<&str> {
        non_empty(self.output_sensitivity_workspace.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|name| !name.trim().is_empty())
}

/// Names of the auxiliary workspaces a reduction consumes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputWorkspaceNames {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_current_workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_beam_workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission_workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_container_workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_field_workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solvent_workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mask_workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_workspace: Option<String>,
}

impl InputWorkspaceNames {
    /// `(property, workspace name)` of every named input.
    pub fn named(&self) -> Vec<(&'static str, &str)> {
        [
            ("DarkCurrentWorkspace", &self.dark_current_workspace),
            ("EmptyBeamWorkspace", &self.empty_beam_workspace),
            ("TransmissionWorkspace", &self.transmission_workspace),
            ("EmptyContainerWorkspace", &self.empty_container_workspace),
            ("FlatFieldWorkspace", &self.flat_field_workspace),
            ("SolventWorkspace", &self.solvent_workspace),
            ("DefaultMaskWorkspace", &self.default_mask_workspace),
            ("MaskWorkspace", &self.mask_workspace),
        ]
        .into_iter()
        .filter_map(|(property, name)| {
            non_empty(name.as_deref()).map(|name| (property, name))
        })
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    #[serde(flatten)]
    pub options: ReductionOptions,
    #[serde(flatten)]
    pub inputs: InputWorkspaceNames,
}

/// Ordered reductions; later entries consume earlier outputs by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReductionPlan {
    pub reductions: Vec<PlanEntry>,
}

impl ReductionPlan {
    pub fn from_path(path: &Path) -> SansResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            SansError::io(
                "IO.PLAN_READ",
                format!("failed to read reduction plan '{}': {}", path.display(), source),
            )
        })?;
        let plan: Self = serde_json::from_str(&content).map_err(|source| {
            SansError::validation(
                "VALIDATION.PLAN_PARSE",
                format!("failed to parse reduction plan '{}': {}", path.display(), source),
            )
        })?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn from_json(content: &str) -> SansResult<Self> {
        let plan: Self = serde_json::from_str(content).map_err(|source| {
            SansError::validation(
                "VALIDATION.PLAN_PARSE",
                format!("failed to parse reduction plan: {}", source),
            )
        })?;
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> SansResult<()> {
        if self.reductions.is_empty() {
            return Err(SansError::validation(
                "VALIDATION.PLAN_EMPTY",
                "reduction plan does not contain any reduction",
            ));
        }
        for (index, entry) in self.reductions.iter().enumerate() {
            if entry.options.output_workspace.trim().is_empty() {
                return Err(SansError::validation(
                    "VALIDATION.PLAN_OUTPUT",
                    format!("reduction #{} has no OutputWorkspace", index + 1),
                ));
            }
        }
        Ok(())
    }
}
