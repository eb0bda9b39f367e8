use crate::domain::{ProcessType, SansError, SansResult};
use crate::modules::CorrectionContext;
use crate::modules::checks::{check_processed_flag, check_wavelengths_match};
use crate::numerics::two_theta;
use crate::workspace::Workspace;
use tracing::info;

/// Log holding the D16 detector arm angle [deg].
pub const GAMMA_LOG: &str = "Gamma.value";

/// Divides by the transmission; the theta dependent form uses `T^((1 + 1/cos 2θ) / 2)`.
pub fn apply_transmission(
    workspace: &mut Workspace,
    transmission: Option<&Workspace>,
    theta_dependent: bool,
    context: &CorrectionContext,
) -> SansResult<()> {
    let Some(transmission) = transmission else {
        return Ok(());
    };
    check_processed_flag(transmission, ProcessType::Transmission)?;
    if context.is_tof() {
        // wavelength dependent transmission
        let rebinned = transmission.rebin_to(workspace);
        return divide_by_transmission(workspace, &rebinned, theta_dependent);
    }

    check_wavelengths_match(transmission, workspace)?;
    if context.is_kinetic() {
        let broadcast = transmission.broadcast_bins(context.n_frames());
        divide_by_transmission(workspace, &broadcast, theta_dependent)?;
    } else {
        divide_by_transmission(workspace, transmission, theta_dependent)?;
    }
    if theta_dependent && context.instrument() == "D16" {
        mask_around_ninety_degrees(workspace);
    }
    Ok(())
}

fn divide_by_transmission(
    workspace: &mut Workspace,
    transmission: &Workspace,
    theta_dependent: bool,
) -> SansResult<()> {
    let Some(values) = transmission.spectra.first() else {
        return Err(SansError::validation(
            "VALIDATION.EMPTY_TRANSMISSION",
            format!("transmission workspace '{}' has no spectrum", transmission.name),
        ));
    };
    let bins = workspace.blocksize();
    if values.y.len() != bins && values.y.len() != 1 {
        return Err(SansError::consistency(
            "CONSISTENCY.TRANSMISSION_BINS",
            format!(
                "transmission '{}' has {} values, workspace '{}' has {} bins",
                transmission.name,
                values.y.len(),
                workspace.name,
                bins
            ),
        ));
    }
    for spectrum in workspace.detectors_mut().filter(|spectrum| !spectrum.masked) {
        let exponent = if theta_dependent {
            0.5 * (1.0 + 1.0 / two_theta(spectrum.position).cos())
        } else {
            1.0
        };
        for bin in 0..bins {
            let index = if values.y.len() == 1 { 0 } else { bin };
            let (t, t_error) = (values.y[index], values.e[index]);
            let factor = t.powf(exponent);
            if factor == 0.0 || !factor.is_finite() {
                spectrum.y[bin] = 0.0;
                spectrum.e[bin] = 0.0;
                continue;
            }
            let factor_error = exponent * t.powf(exponent - 1.0) * t_error;
            let value = spectrum.y[bin] / factor;
            let error = (spectrum.e[bin] / factor).hypot(value * factor_error / factor);
            spectrum.y[bin] = value;
            spectrum.e[bin] = error;
        }
    }
    Ok(())
}

/// The theta dependent correction diverges at 2θ = 90°, which D16 can reach when
/// its detector arm sits near 90°.
fn mask_around_ninety_degrees(workspace: &mut Workspace) {
    let Some(gamma) = workspace.logs.number(GAMMA_LOG) else {
        return;
    };
    if gamma <= 75.0 || gamma >= 105.0 {
        return;
    }
    let (low, high) = (89.0_f64.to_radians(), 91.0_f64.to_radians());
    let masked = workspace.mask_where(|spectrum| {
        let angle = two_theta(spectrum.position);
        !spectrum.monitor && angle >= low && angle <= high
    });
    info!(masked, gamma, "masked pixels around 90 degrees scattering angle");
}

#[cfg(test)]
mod tests {
    use super::{GAMMA_LOG, apply_transmission};
    use crate::domain::{AcquisitionMode, ProcessType};
    use crate::modules::CorrectionContext;
    use crate::workspace::{DetectorGrid, Spectrum, Workspace};

    fn context(instrument: &str, mode: AcquisitionMode, frames: usize) -> CorrectionContext {
        CorrectionContext::new(ProcessType::Sample, instrument, mode, frames, 1, true)
            .expect("context")
    }

    fn transmission(values: Vec<f64>) -> Workspace {
        let mut ws = DetectorGrid::new("D11", 1, 1).build("tr");
        let x = (0..values.len()).map(|i| i as f64).collect();
        ws.x = x;
        let e = vec![0.0; values.len()];
        ws.spectra = vec![Spectrum::new(0, [0.0, 0.0, 4.0], values, e)];
        ws.set_processed_as(ProcessType::Transmission);
        ws
    }

    #[test]
    fn flat_transmission_divides_every_pixel() {
        let mut ws = DetectorGrid::new("D11", 2, 2).uniform_counts(1.0).build("sample");
        apply_transmission(
            &mut ws,
            Some(&transmission(vec![0.5])),
            false,
            &context("D11", AcquisitionMode::Mono, 1),
        )
        .expect("applied");
        assert!(ws.detectors().all(|s| (s.y[0] - 2.0).abs() < 1e-12));
    }

    #[test]
    fn theta_dependence_grows_with_scattering_angle() {
        let mut ws = DetectorGrid::new("D11", 4, 1)
            .l2(0.05)
            .uniform_counts(1.0)
            .build("sample");
        apply_transmission(
            &mut ws,
            Some(&transmission(vec![0.5])),
            true,
            &context("D11", AcquisitionMode::Mono, 1),
        )
        .expect("applied");
        let inner = ws.detectors().nth(1).map(|s| s.y[0]).expect("inner");
        let outer = ws.detectors().next().map(|s| s.y[0]).expect("outer");
        assert!(inner > 2.0);
        assert!(outer > inner);
    }

    #[test]
    fn kinetic_transmission_is_broadcast_per_sample() {
        let mut ws = DetectorGrid::new("D11", 1, 1)
            .frames(4)
            .uniform_counts(1.0)
            .build("sample");
        apply_transmission(
            &mut ws,
            Some(&transmission(vec![0.5, 0.25])),
            false,
            &context("D11", AcquisitionMode::Kinetic, 2),
        )
        .expect("applied");
        let pixel = ws.detectors().next().expect("pixel");
        assert_eq!(pixel.y, vec![2.0, 2.0, 4.0, 4.0]);
    }

    #[test]
    fn d16_masks_pixels_near_ninety_degrees() {
        let mut ws = DetectorGrid::new("D16", 1, 1).uniform_counts(1.0).build("sample");
        ws.spectra[0].position = [1.0, 0.0, 0.0];
        ws.logs.add_number(GAMMA_LOG, 90.0, Some("deg"));
        apply_transmission(
            &mut ws,
            Some(&transmission(vec![0.9])),
            true,
            &context("D16", AcquisitionMode::Mono, 1),
        )
        .expect("applied");
        assert!(ws.spectra[0].masked);
    }
}
