use crate::domain::{SansError, SansResult};
use crate::numerics::finite_mean;
use crate::workspace::{Spectrum, Workspace, bin_centres};
use tracing::info;

pub const MIN_EFFICIENCY: f64 = 0.0;
pub const MAX_EFFICIENCY: f64 = 2.0;

/// Relative inter-pixel efficiency of a flat (water) measurement: the counts of each
/// pixel over the mean of all unmasked pixels. Pixels outside
/// `[MIN_EFFICIENCY, MAX_EFFICIENCY]` are masked and the mean is taken again.
pub fn calculate_efficiency(workspace: &Workspace, name: impl Into<String>) -> SansResult<Workspace> {
    let totals: Vec<(f64, f64)> = workspace
        .detectors()
        .map(|spectrum| {
            let error = spectrum.e.iter().map(|e| e * e).sum::<f64>().sqrt();
            (spectrum.total_counts(), error)
        })
        .collect();
    let mut masked: Vec<bool> = workspace.detectors().map(|spectrum| spectrum.masked).collect();

    let mut mean = unmasked_mean(&totals, &masked, &workspace.name)?;
    let mut rejected = 0usize;
    for (index, (counts, _)) in totals.iter().enumerate() {
        let efficiency = counts / mean;
        if !masked[index] && !(MIN_EFFICIENCY..=MAX_EFFICIENCY).contains(&efficiency) {
            masked[index] = true;
            rejected += 1;
        }
    }
    if rejected > 0 {
        mean = unmasked_mean(&totals, &masked, &workspace.name)?;
    }
    info!(mean, rejected, "computed relative pixel efficiency");

    let centres = bin_centres(&workspace.x, workspace.histogram);
    let axis = finite_mean(&centres).unwrap_or(0.0);
    let mut sensitivity = workspace.empty_like(name);
    sensitivity.x = vec![axis];
    sensitivity.histogram = false;
    for ((spectrum, (counts, error)), is_masked) in
        workspace.detectors().zip(totals).zip(masked)
    {
        let mut pixel = Spectrum {
            y: vec![counts / mean],
            e: vec![error / mean],
            ..spectrum.clone()
        };
        if is_masked {
            pixel.mask();
        }
        sensitivity.spectra.push(pixel);
    }
    Ok(sensitivity)
}

fn unmasked_mean(totals: &[(f64, f64)], masked: &[bool], name: &str) -> SansResult<f64> {
    let mean = finite_mean(
        totals
            .iter()
            .zip(masked)
            .filter(|(_, is_masked)| !**is_masked)
            .map(|((counts, _), _)| counts),
    );
    match mean {
        Some(mean) if mean > 0.0 => Ok(mean),
        _ => Err(SansError::measurement(
            "MEASUREMENT.FLAT_FIELD",
            format!("flat measurement '{}' has no positive unmasked counts", name),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::calculate_efficiency;
    use crate::workspace::DetectorGrid;

    #[test]
    fn uniform_detector_has_unit_efficiency() {
        let ws = DetectorGrid::new("D11", 3, 3).uniform_counts(7.0).build("water");
        let sensitivity = calculate_efficiency(&ws, "sens").expect("efficiency");
        assert_eq!(sensitivity.name, "sens");
        assert_eq!(sensitivity.number_histograms(), 9);
        assert!(sensitivity.spectra.iter().all(|s| (s.y[0] - 1.0).abs() < 1e-12));
    }

    #[test]
    fn hot_pixels_are_masked_and_excluded_from_the_mean() {
        let mut ws = DetectorGrid::new("D11", 2, 2).uniform_counts(1.0).build("water");
        ws.spectra[0].y = vec![10.0];
        let sensitivity = calculate_efficiency(&ws, "sens").expect("efficiency");
        assert!(sensitivity.spectra[0].masked);
        assert!(sensitivity.spectra[1..].iter().all(|s| (s.y[0] - 1.0).abs() < 1e-12));
    }

    #[test]
    fn dead_detector_is_a_measurement_error() {
        let ws = DetectorGrid::new("D11", 2, 2).uniform_counts(0.0).build("water");
        assert!(calculate_efficiency(&ws, "sens").is_err());
    }
}
