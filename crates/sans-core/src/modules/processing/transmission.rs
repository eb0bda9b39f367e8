use super::flux::{BEAM_AXIS, incident_flux};
use crate::domain::{ProcessType, SansResult};
use crate::modules::CorrectionContext;
use crate::modules::checks::{check_distances_match, check_processed_flag, check_wavelengths_match};
use crate::workspace::Workspace;

/// Transmission of a run: its attenuation corrected beam flux over that of the
/// empty beam, both integrated within `radius` of the beam axis.
pub fn calculate_transmission(
    workspace: &Workspace,
    empty_beam: &Workspace,
    radius: f64,
    context: &CorrectionContext,
) -> SansResult<Workspace> {
    check_processed_flag(empty_beam, ProcessType::EmptyBeam)?;
    check_distances_match(workspace, empty_beam)?;
    let instrument = context.instrument();
    let mut run_flux = incident_flux(workspace, instrument, BEAM_AXIS, radius, &workspace.name)?;
    let beam_flux = incident_flux(
        empty_beam,
        instrument,
        BEAM_AXIS,
        radius,
        format!("{}_flux", empty_beam.name),
    )?;
    if context.is_tof() {
        run_flux = run_flux.rebin_to(&beam_flux);
        run_flux.name = workspace.name.clone();
    } else {
        check_wavelengths_match(workspace, empty_beam)?;
    }
    run_flux.divide(&beam_flux)?;
    Ok(run_flux)
}

#[cfg(test)]
mod tests {
    use super::calculate_transmission;
    use crate::domain::{AcquisitionMode, ProcessType};
    use crate::modules::CorrectionContext;
    use crate::workspace::{DetectorGrid, Workspace};

    fn context(mode: AcquisitionMode) -> CorrectionContext {
        CorrectionContext::new(ProcessType::Transmission, "D11", mode, 1, 1, true)
            .expect("context")
    }

    fn beam(counts: f64) -> Workspace {
        let mut beam = DetectorGrid::new("D11", 4, 4).uniform_counts(counts).build("beam");
        beam.set_processed_as(ProcessType::EmptyBeam);
        beam
    }

    #[test]
    fn transmission_is_the_flux_ratio() {
        let run = DetectorGrid::new("D11", 4, 4).uniform_counts(3.0).build("tr");
        let transmission =
            calculate_transmission(&run, &beam(4.0), 0.2, &context(AcquisitionMode::Mono))
                .expect("transmission");
        assert_eq!(transmission.name, "tr");
        assert_eq!(transmission.number_histograms(), 1);
        assert!((transmission.spectra[0].y[0] - 0.75).abs() < 1e-12);
        assert!(transmission.spectra[0].e[0] > 0.0);
    }

    #[test]
    fn empty_beam_must_be_processed() {
        let run = DetectorGrid::new("D11", 4, 4).build("tr");
        let untagged = DetectorGrid::new("D11", 4, 4).build("beam");
        let error = calculate_transmission(&run, &untagged, 0.2, &context(AcquisitionMode::Mono))
            .expect_err("untagged beam");
        assert_eq!(error.placeholder(), "CONSISTENCY.PROCESSED_AS");
    }

    #[test]
    fn tof_transmission_is_rebinned_to_the_beam() {
        let run = DetectorGrid::new("D11", 2, 2)
            .wavelength_bins(vec![1.0, 2.0, 3.0, 4.0])
            .uniform_counts(1.0)
            .build("tr");
        let mut beam = DetectorGrid::new("D11", 2, 2)
            .wavelength_bins(vec![1.0, 2.0, 3.0])
            .uniform_counts(2.0)
            .build("beam");
        beam.set_processed_as(ProcessType::EmptyBeam);
        let transmission =
            calculate_transmission(&run, &beam, 1.0, &context(AcquisitionMode::Tof))
                .expect("transmission");
        assert_eq!(transmission.spectra[0].y, vec![0.5, 0.5]);
        assert_eq!(transmission.x, beam.x);
    }
}
