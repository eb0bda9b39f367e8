//! Consistency checks run before two artifacts are combined.

use crate::common::constants::{DISTANCE_TOLERANCE, WAVELENGTH_TOLERANCE};
use crate::domain::{ProcessType, SansError, SansResult};
use crate::workspace::{NORMALISED_BY_FLUX_LOG, Workspace};

/// Rejects an auxiliary input that was not produced by the expected reduction.
pub fn check_processed_flag(workspace: &Workspace, expected: ProcessType) -> SansResult<()> {
    match workspace.processed_as() {
        Some(actual) if actual == expected => Ok(()),
        actual => Err(SansError::consistency(
            "CONSISTENCY.PROCESSED_AS",
            format!(
                "workspace '{}' was processed as {}, expected {}",
                workspace.name,
                actual.map_or("nothing", ProcessType::as_str),
                expected
            ),
        )),
    }
}

pub fn check_distances_match(lhs: &Workspace, rhs: &Workspace) -> SansResult<()> {
    let lhs_l2 = lhs.l2()?;
    let rhs_l2 = rhs.l2()?;
    if (lhs_l2 - rhs_l2).abs() > DISTANCE_TOLERANCE {
        return Err(SansError::consistency(
            "CONSISTENCY.DISTANCE",
            format!(
                "sample-detector distances of '{}' ({} m) and '{}' ({} m) differ by more than {} m",
                lhs.name, lhs_l2, rhs.name, rhs_l2, DISTANCE_TOLERANCE
            ),
        ));
    }
    Ok(())
}

/// Skipped when either side has no wavelength log.
pub fn check_wavelengths_match(lhs: &Workspace, rhs: &Workspace) -> SansResult<()> {
    let (Some(lhs_wavelength), Some(rhs_wavelength)) = (lhs.wavelength(), rhs.wavelength())
    else {
        return Ok(());
    };
    if (lhs_wavelength - rhs_wavelength).abs() > WAVELENGTH_TOLERANCE {
        return Err(SansError::consistency(
            "CONSISTENCY.WAVELENGTH",
            format!(
                "wavelengths of '{}' ({} A) and '{}' ({} A) differ by more than {} A",
                lhs.name, lhs_wavelength, rhs.name, rhs_wavelength, WAVELENGTH_TOLERANCE
            ),
        ));
    }
    Ok(())
}

/// `NormalisedByFlux` log. Loaded runs always carry it, so a missing log is an error.
pub fn normalised_by_flux(workspace: &Workspace) -> SansResult<bool> {
    workspace.logs.flag(NORMALISED_BY_FLUX_LOG).ok_or_else(|| {
        SansError::consistency(
            "CONSISTENCY.FLUX_NORMALISATION",
            format!(
                "workspace '{}' does not record whether it is normalised by flux",
                workspace.name
            ),
        )
    })
}

/// Factor applied to a sample before dividing by a reference (flat field) so that
/// both are on the same flux scale.
///
/// Both workspaces must carry the `NormalisedByFlux` log. Two flux-normalised
/// workspaces give 1, two raw ones give `(L2_sample / L2_reference)^2`, and a mixed
/// pair or a missing log is `CONSISTENCY.FLUX_NORMALISATION`.
pub fn flux_rescale_factor(sample: &Workspace, reference: &Workspace) -> SansResult<f64> {
    match (normalised_by_flux(sample)?, normalised_by_flux(reference)?) {
        (true, true) => Ok(1.0),
        (false, false) => {
            let sample_l2 = sample.l2()?;
            let reference_l2 = reference.l2()?;
            if reference_l2 == 0.0 {
                return Err(SansError::consistency(
                    "CONSISTENCY.REFERENCE_DISTANCE",
                    format!("reference '{}' has a zero sample-detector distance", reference.name),
                ));
            }
            Ok((sample_l2 * sample_l2) / (reference_l2 * reference_l2))
        }
        (sample_flag, reference_flag) => Err(SansError::consistency(
            "CONSISTENCY.FLUX_NORMALISATION",
            format!(
                "sample '{}' (NormalisedByFlux={}) and reference '{}' (NormalisedByFlux={}) must both or neither be normalised by flux",
                sample.name, sample_flag, reference.name, reference_flag
            ),
        )),
    }
}
