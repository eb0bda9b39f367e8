//! One SANS unit reduction: load, validate, run the correction chain.

use super::context::CorrectionContext;
use super::corrections::{
    BEAM_CENTER_X_LOG, BEAM_CENTER_Y_LOG, BEAM_WIDTH_X_LOG, apply_container, apply_dark_current,
    apply_direct_beam, apply_flat_field, apply_masks, apply_normalisation, apply_parallax,
    apply_solid_angle, apply_solvent, apply_thickness, apply_transmission,
};
use super::loader::{RunSource, load_runs};
use super::processing::{
    BEAM_AXIS, calculate_efficiency, calculate_transmission, find_beam_centre, fit_beam_width,
    incident_flux, tile_over_spectra,
};
use super::sequencer::{CorrectionStep, run_sequence};
use super::traits::StepExecutor;
use crate::common::config::{InputWorkspaceNames, ReductionOptions};
use crate::domain::{ProcessType, SansError, SansResult};
use crate::workspace::{MAIN_DETECTOR, Workspace, WorkspaceStore};
use tracing::info;

/// Auxiliary artifacts of a reduction, borrowed for its duration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReductionInputs<'a> {
    pub dark_current: Option<&'a Workspace>,
    pub empty_beam: Option<&'a Workspace>,
    pub transmission: Option<&'a Workspace>,
    pub empty_container: Option<&'a Workspace>,
    pub flat_field: Option<&'a Workspace>,
    pub solvent: Option<&'a Workspace>,
    pub default_mask: Option<&'a Workspace>,
    pub mask: Option<&'a Workspace>,
}

impl<'a> ReductionInputs<'a> {
    /// Resolves every named input in `store`; unknown names are validation errors.
    pub fn from_store(store: &'a WorkspaceStore, names: &InputWorkspaceNames) -> SansResult<Self> {
        let lookup = |name: &Option<String>| -> SansResult<Option<&'a Workspace>> {
            match name.as_deref().map(str::trim).filter(|name| !name.is_empty()) {
                Some(name) => store.require(name).map(Some),
                None => Ok(None),
            }
        };
        Ok(Self {
            dark_current: lookup(&names.dark_current_workspace)?,
            empty_beam: lookup(&names.empty_beam_workspace)?,
            transmission: lookup(&names.transmission_workspace)?,
            empty_container: lookup(&names.empty_container_workspace)?,
            flat_field: lookup(&names.flat_field_workspace)?,
            solvent: lookup(&names.solvent_workspace)?,
            default_mask: lookup(&names.default_mask_workspace)?,
            mask: lookup(&names.mask_workspace)?,
        })
    }
}

/// Primary workspace plus the optional side outputs requested by name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionOutput {
    pub workspace: Workspace,
    pub flux: Option<Workspace>,
    pub sensitivity: Option<Workspace>,
}

impl ReductionOutput {
    /// Every produced workspace, primary first.
    pub fn into_workspaces(self) -> Vec<Workspace> {
        std::iter::once(self.workspace)
            .chain(self.flux)
            .chain(self.sensitivity)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SansReduction {
    options: ReductionOptions,
}

impl SansReduction {
    pub fn new(options: ReductionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReductionOptions {
        &self.options
    }

    /// Checks run before anything is loaded.
    pub fn validate_inputs(&self, inputs: &ReductionInputs<'_>) -> SansResult<()> {
        let options = &self.options;
        if options.output_workspace.trim().is_empty() {
            return Err(SansError::validation(
                "VALIDATION.OUTPUT_WORKSPACE",
                "OutputWorkspace must be given",
            ));
        }
        if options.process_as == ProcessType::Transmission && inputs.empty_beam.is_none() {
            return Err(SansError::validation(
                "VALIDATION.EMPTY_BEAM_REQUIRED",
                "empty beam input workspace is mandatory for transmission calculation",
            ));
        }
        let thicknesses = options.sample_thickness.len();
        let samples = options.sample_count();
        if thicknesses != 1 && thicknesses != samples {
            return Err(SansError::validation(
                "VALIDATION.THICKNESS_COUNT",
                format!(
                    "sample thickness must have either a single value or as many as there are samples ({} given for {} samples)",
                    thicknesses, samples
                ),
            ));
        }
        if !(options.beam_radius > 0.0) {
            return Err(SansError::validation(
                "VALIDATION.BEAM_RADIUS",
                format!("beam radius must be positive, got {}", options.beam_radius),
            ));
        }
        Ok(())
    }

    /// Validates, loads the runs from `source` and reduces them.
    pub fn execute<S: RunSource + ?Sized>(
        &self,
        source: &S,
        inputs: &ReductionInputs<'_>,
    ) -> SansResult<ReductionOutput> {
        self.validate_inputs(inputs)?;
        let (workspace, context) = load_runs(source, &self.options)?;
        self.reduce(workspace, &context, inputs)
    }

    /// Runs the correction chain on an already loaded workspace.
    pub fn reduce(
        &self,
        mut workspace: Workspace,
        context: &CorrectionContext,
        inputs: &ReductionInputs<'_>,
    ) -> SansResult<ReductionOutput> {
        let mut executor = CorrectionExecutor::new(&self.options, inputs);
        let steps = run_sequence(&mut executor, &mut workspace, context)?;
        workspace.set_processed_as(context.process());
        info!(
            process = %context.process(),
            workspace = %workspace.name,
            steps = steps.len(),
            "reduction finished"
        );
        Ok(ReductionOutput {
            workspace,
            flux: executor.flux,
            sensitivity: executor.sensitivity,
        })
    }
}

/// Applies each correction step with the reduction options and auxiliary inputs.
pub struct CorrectionExecutor<'o, 'i> {
    options: &'o ReductionOptions,
    inputs: &'o ReductionInputs<'i>,
    beam_centre: [f64; 2],
    flux: Option<Workspace>,
    sensitivity: Option<Workspace>,
}

impl<'o, 'i> CorrectionExecutor<'o, 'i> {
    pub fn new(options: &'o ReductionOptions, inputs: &'o ReductionInputs<'i>) -> Self {
        Self {
            options,
            inputs,
            beam_centre: BEAM_AXIS,
            flux: None,
            sensitivity: None,
        }
    }

    fn locate_beam(
        &mut self,
        workspace: &mut Workspace,
        context: &CorrectionContext,
    ) -> SansResult<()> {
        let [beam_x, beam_y] = find_beam_centre(workspace, self.options.beam_radius)?;
        info!(beam_x, beam_y, "found beam centre");
        workspace.logs.add_number(BEAM_CENTER_X_LOG, beam_x, Some("m"));
        workspace.logs.add_number(BEAM_CENTER_Y_LOG, beam_y, Some("m"));
        if context.is_tof() {
            self.beam_centre = [beam_x, beam_y];
        } else {
            // the beam width fit needs a centred beam
            workspace.move_component(MAIN_DETECTOR, -beam_x, -beam_y)?;
            self.beam_centre = BEAM_AXIS;
        }
        Ok(())
    }

    fn record_flux(&mut self, workspace: &Workspace, context: &CorrectionContext) -> SansResult<()> {
        let Some(name) = self.options.requested_flux_output() else {
            return Ok(());
        };
        let flux = incident_flux(
            workspace,
            context.instrument(),
            self.beam_centre,
            self.options.beam_radius,
            name,
        )?;
        self.flux = Some(if context.is_tof() {
            tile_over_spectra(&flux, workspace)
        } else {
            flux
        });
        Ok(())
    }
}

impl StepExecutor for CorrectionExecutor<'_, '_> {
    fn execute_step(
        &mut self,
        step: CorrectionStep,
        workspace: &mut Workspace,
        context: &CorrectionContext,
    ) -> SansResult<()> {
        let options = self.options;
        let inputs = self.inputs;
        match step {
            CorrectionStep::Normalise => {
                apply_normalisation(workspace, options.normalise_by, context)
            }
            CorrectionStep::DarkCurrent => {
                apply_dark_current(workspace, inputs.dark_current, context)
            }
            CorrectionStep::BeamCentre => self.locate_beam(workspace, context),
            CorrectionStep::BeamWidth => {
                if context.is_tof() {
                    return Ok(());
                }
                if let Some(width) = fit_beam_width(workspace)? {
                    workspace.logs.add_number(BEAM_WIDTH_X_LOG, width, Some("rad"));
                }
                Ok(())
            }
            CorrectionStep::IncidentFlux => self.record_flux(workspace, context),
            CorrectionStep::DirectBeam => apply_direct_beam(workspace, inputs.empty_beam, context),
            CorrectionStep::CalculateTransmission => {
                let empty_beam = inputs.empty_beam.ok_or_else(|| {
                    SansError::validation(
                        "VALIDATION.EMPTY_BEAM_REQUIRED",
                        "empty beam input workspace is mandatory for transmission calculation",
                    )
                })?;
                self.record_flux(workspace, context)?;
                *workspace =
                    calculate_transmission(workspace, empty_beam, options.beam_radius, context)?;
                Ok(())
            }
            CorrectionStep::Transmission => apply_transmission(
                workspace,
                inputs.transmission,
                options.transmission_theta_dependent,
                context,
            ),
            CorrectionStep::SolidAngle => apply_solid_angle(workspace, context),
            CorrectionStep::Container => {
                apply_container(workspace, inputs.empty_container, context)
            }
            CorrectionStep::Masks => apply_masks(workspace, inputs.default_mask, inputs.mask),
            CorrectionStep::Parallax => apply_parallax(workspace, context),
            CorrectionStep::Thickness => {
                apply_thickness(workspace, &options.sample_thickness, context)
            }
            CorrectionStep::Sensitivity => {
                if let Some(name) = options.requested_sensitivity_output() {
                    self.sensitivity = Some(calculate_efficiency(workspace, name)?);
                }
                Ok(())
            }
            CorrectionStep::FlatField => apply_flat_field(
                workspace,
                inputs.flat_field,
                options.water_cross_section,
                context,
            ),
            CorrectionStep::Solvent => apply_solvent(workspace, inputs.solvent, context),
        }
    }
}
