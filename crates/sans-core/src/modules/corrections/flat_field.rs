use crate::domain::{ProcessType, SansResult};
use crate::modules::CorrectionContext;
use crate::modules::checks::{check_processed_flag, check_wavelengths_match, flux_rescale_factor};
use crate::workspace::Workspace;
use tracing::info;

/// Flat-field (water) normalisation for detector efficiency and absolute scale.
///
/// Distances are not compared, since a flat field is typically not measured at the
/// longest distances; the flux factor compensates instead.
pub fn apply_flat_field(
    workspace: &mut Workspace,
    flat_field: Option<&Workspace>,
    water_cross_section: f64,
    context: &CorrectionContext,
) -> SansResult<()> {
    let Some(flat) = flat_field else {
        return Ok(());
    };
    check_processed_flag(flat, ProcessType::Water)?;
    if !context.is_tof() {
        check_wavelengths_match(flat, workspace)?;
    }
    workspace.divide(flat)?;
    workspace.scale(water_cross_section);
    workspace.copy_mask_from(flat);
    rescale_flux(workspace, flat)
}

/// Puts the sample on the flux scale of the flat field when they sit at different distances.
pub fn rescale_flux(workspace: &mut Workspace, reference: &Workspace) -> SansResult<()> {
    let factor = flux_rescale_factor(workspace, reference)?;
    if factor != 1.0 {
        info!(flux_factor = factor, "rescaling to the flat field flux");
        workspace.scale(factor);
    }
    Ok(())
}
