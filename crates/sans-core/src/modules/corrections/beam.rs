use crate::domain::{ProcessType, SansError, SansResult};
use crate::modules::CorrectionContext;
use crate::modules::checks::{check_distances_match, check_processed_flag};
use crate::workspace::{MAIN_DETECTOR, Workspace};

pub const BEAM_CENTER_X_LOG: &str = "BeamCenterX";
pub const BEAM_CENTER_Y_LOG: &str = "BeamCenterY";
pub const BEAM_WIDTH_X_LOG: &str = "BeamWidthX";

/// Beam-centre correction from a processed empty beam; geometry is left untouched in TOF.
pub fn apply_direct_beam(
    workspace: &mut Workspace,
    empty_beam: Option<&Workspace>,
    context: &CorrectionContext,
) -> SansResult<()> {
    let Some(beam) = empty_beam else {
        return Ok(());
    };
    check_processed_flag(beam, ProcessType::EmptyBeam)?;
    check_distances_match(workspace, beam)?;
    if context.is_tof() {
        return Ok(());
    }
    let beam_x = beam.logs.require_number(BEAM_CENTER_X_LOG, &beam.name)?;
    let beam_y = beam.logs.require_number(BEAM_CENTER_Y_LOG, &beam.name)?;
    workspace.logs.add_number(BEAM_CENTER_X_LOG, beam_x, Some("m"));
    workspace.logs.add_number(BEAM_CENTER_Y_LOG, beam_y, Some("m"));
    move_to_beam_centre(workspace, beam_x, beam_y)?;
    if let Some(width) = beam.logs.number(BEAM_WIDTH_X_LOG) {
        workspace.logs.add_number(BEAM_WIDTH_X_LOG, width, Some("rad"));
    }
    Ok(())
}

/// Shifts the detector so that the beam hits the origin. Panels of multi-panel
/// instruments move by the centre projected to their own distance.
pub fn move_to_beam_centre(workspace: &mut Workspace, beam_x: f64, beam_y: f64) -> SansResult<()> {
    let Some(panels) = workspace.instrument.detector_panels() else {
        return workspace.move_component(MAIN_DETECTOR, -beam_x, -beam_y);
    };
    let l2_main = workspace.l2()?;
    if l2_main == 0.0 {
        return Err(SansError::consistency(
            "CONSISTENCY.ZERO_DISTANCE",
            format!("workspace '{}' has a zero sample-detector distance", workspace.name),
        ));
    }
    for panel in panels {
        let l2_panel = workspace
            .instrument
            .component(&panel)
            .map(|component| component.position[2])
            .ok_or_else(|| {
                SansError::validation(
                    "VALIDATION.MISSING_COMPONENT",
                    format!(
                        "detector panel '{}' is not part of instrument {}",
                        panel, workspace.instrument.name
                    ),
                )
            })?;
        let ratio = l2_panel / l2_main;
        workspace.move_component(&panel, -beam_x * ratio, -beam_y * ratio)?;
    }
    Ok(())
}
