use crate::domain::{SansError, SansResult};
use crate::workspace::{Spectrum, Workspace};
use tracing::{debug, info};

pub const ATTENUATION_COEFFICIENT_LOG: &str = "attenuator.attenuation_coefficient";
pub const ATTENUATION_VALUE_LOG: &str = "attenuator.attenuation_value";
pub const SECOND_ATTENUATION_VALUE_LOG: &str = "attenuator2.attenuation_value";

/// D33 records attenuator indices below this value instead of attenuation factors.
const D33_ATTENUATOR_INDEX_LIMIT: f64 = 10.0;

/// Attenuation factor of the beam line during a run; 1 without attenuator logs.
pub fn attenuation_coefficient(workspace: &Workspace, instrument: &str) -> SansResult<f64> {
    let logs = &workspace.logs;
    let mut coefficient = if let Some(coefficient) = logs.number(ATTENUATION_COEFFICIENT_LOG) {
        coefficient
    } else if let Some(value) = logs.number(ATTENUATION_VALUE_LOG) {
        if value < D33_ATTENUATOR_INDEX_LIMIT && instrument == "D33" {
            let parameter = format!("att{}", value as i64);
            workspace
                .instrument
                .number_parameter(&parameter)
                .ok_or_else(|| {
                    SansError::validation(
                        "VALIDATION.ATTENUATOR",
                        format!(
                            "unable to find the attenuation coefficient for D33 attenuator #{}",
                            value as i64
                        ),
                    )
                })?
        } else {
            value
        }
    } else {
        1.0
    };
    debug!(coefficient, "attenuator 1 coefficient/value");
    // only one of the two attenuators is in at a time, the other one reads 1
    if let Some(second) = logs.number(SECOND_ATTENUATION_VALUE_LOG) {
        debug!(second, "attenuator 2 coefficient/value");
        coefficient *= second;
    }
    info!(coefficient, "attenuation coefficient used");
    Ok(coefficient)
}

/// Counts per bin summed over the unmasked pixels within `radius` of `centre`,
/// as a single-spectrum workspace.
pub fn integrate_beam(
    workspace: &Workspace,
    centre: [f64; 2],
    radius: f64,
    name: impl Into<String>,
) -> SansResult<Workspace> {
    let bins = workspace.blocksize();
    let mut y = vec![0.0; bins];
    let mut e2 = vec![0.0; bins];
    let mut pixels = 0usize;
    for spectrum in workspace.detectors().filter(|spectrum| !spectrum.masked) {
        let distance = (spectrum.position[0] - centre[0]).hypot(spectrum.position[1] - centre[1]);
        if distance > radius {
            continue;
        }
        pixels += 1;
        for bin in 0..bins {
            y[bin] += spectrum.y[bin];
            e2[bin] += spectrum.e[bin] * spectrum.e[bin];
        }
    }
    if pixels == 0 {
        return Err(SansError::measurement(
            "MEASUREMENT.BEAM_AREA",
            format!(
                "no unmasked pixel of '{}' lies within {} m of the beam centre",
                workspace.name, radius
            ),
        ));
    }
    let l2 = workspace.l2().unwrap_or(0.0);
    let mut integrated = workspace.empty_like(name);
    integrated.spectra.push(Spectrum::new(
        0,
        [0.0, 0.0, l2],
        y,
        e2.into_iter().map(f64::sqrt).collect(),
    ));
    Ok(integrated)
}

/// Incident flux: beam counts within `radius`, scaled by the attenuation.
pub fn incident_flux(
    workspace: &Workspace,
    instrument: &str,
    centre: [f64; 2],
    radius: f64,
    name: impl Into<String>,
) -> SansResult<Workspace> {
    let coefficient = attenuation_coefficient(workspace, instrument)?;
    let mut flux = integrate_beam(workspace, centre, radius, name)?;
    flux.scale(coefficient);
    Ok(flux)
}

/// Repeats a single-spectrum flux for every spectrum of `reference`, so that a
/// wavelength dependent flux can be rebinned spectrum-wise against ragged samples.
pub fn tile_over_spectra(flux: &Workspace, reference: &Workspace) -> Workspace {
    let mut tiled = flux.empty_like(flux.name.clone());
    if let Some(template) = flux.spectra.first() {
        tiled.spectra = reference
            .spectra
            .iter()
            .map(|spectrum| Spectrum {
                detector_id: spectrum.detector_id,
                component: spectrum.component.clone(),
                position: spectrum.position,
                monitor: spectrum.monitor,
                ..template.clone()
            })
            .collect();
    }
    tiled
}

/// Flux integration window centre in the current geometry of a moved detector.
pub const BEAM_AXIS: [f64; 2] = [0.0, 0.0];

#[cfg(test)]
mod tests {
    use super::{
        ATTENUATION_COEFFICIENT_LOG, ATTENUATION_VALUE_LOG, BEAM_AXIS,
        SECOND_ATTENUATION_VALUE_LOG, attenuation_coefficient, incident_flux, tile_over_spectra,
    };
    use crate::workspace::DetectorGrid;

    #[test]
    fn attenuation_from_coefficient_or_value() {
        let mut ws = DetectorGrid::new("D11", 2, 2).build("beam");
        assert_eq!(attenuation_coefficient(&ws, "D11").expect("none"), 1.0);
        ws.logs.add_number(ATTENUATION_VALUE_LOG, 112.8, None);
        assert_eq!(attenuation_coefficient(&ws, "D11").expect("value"), 112.8);
        ws.logs.add_number(ATTENUATION_COEFFICIENT_LOG, 30.0, None);
        ws.logs.add_number(SECOND_ATTENUATION_VALUE_LOG, 2.0, None);
        assert_eq!(attenuation_coefficient(&ws, "D11").expect("both"), 60.0);
    }

    #[test]
    fn d33_attenuator_index_is_looked_up() {
        let mut ws = DetectorGrid::new("D33", 2, 2).build("beam");
        ws.logs.add_number(ATTENUATION_VALUE_LOG, 2.0, None);
        let error = attenuation_coefficient(&ws, "D33").expect_err("missing att2");
        assert_eq!(error.placeholder(), "VALIDATION.ATTENUATOR");
        ws.instrument = ws.instrument.clone().with_number_parameter("att2", 47.0);
        assert_eq!(attenuation_coefficient(&ws, "D33").expect("indexed"), 47.0);
    }

    #[test]
    fn flux_sums_pixels_inside_the_radius() {
        let ws = DetectorGrid::new("D11", 4, 4).uniform_counts(2.0).build("beam");
        // inner 2x2 pixels sit within 0.006 m of the axis
        let flux = incident_flux(&ws, "D11", BEAM_AXIS, 0.006, "flux").expect("flux");
        assert_eq!(flux.number_histograms(), 1);
        assert_eq!(flux.spectra[0].y, vec![8.0]);
        assert!(incident_flux(&ws, "D11", [1.0, 1.0], 0.006, "flux").is_err());
    }

    #[test]
    fn tiled_flux_follows_reference_spectra() {
        let ws = DetectorGrid::new("D33", 2, 2)
            .wavelength_bins(vec![1.0, 2.0, 3.0])
            .uniform_counts(1.0)
            .build("beam");
        let flux = incident_flux(&ws, "D33", BEAM_AXIS, 1.0, "flux").expect("flux");
        let tiled = tile_over_spectra(&flux, &ws);
        assert_eq!(tiled.number_histograms(), ws.number_histograms());
        assert!(tiled.spectra.iter().all(|s| s.y == vec![4.0, 4.0]));
    }
}
