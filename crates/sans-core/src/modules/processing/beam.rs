use crate::domain::{SansError, SansResult};
use crate::numerics::{FitOptions, GaussianPeak, fit_gaussian, signed_in_plane_two_theta};
use crate::workspace::{MAIN_DETECTOR, Workspace};
use tracing::{debug, info, warn};

const CENTRE_TOLERANCE: f64 = 1.25e-4;
const MAX_CENTRE_ITERATIONS: usize = 50;
const MIN_BEAM_WIDTH_COLUMNS: usize = 4;
const FLAT_BACKGROUND_START: f64 = 1.0e-4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("no positive counts within {radius} m of ({x}, {y})")]
    NoCounts { radius: f64, x: f64, y: f64 },
    #[error("centre of mass did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },
}

/// Direct beam centre from the centre of mass of the main detector, iterated over
/// the pixels within `radius` of the current estimate.
pub fn find_beam_centre(workspace: &Workspace, radius: f64) -> SansResult<[f64; 2]> {
    centre_of_mass(workspace, radius).map_err(|source| {
        SansError::measurement(
            "MEASUREMENT.BEAM_CENTRE",
            format!("beam centre of '{}': {}", workspace.name, source),
        )
    })
}

fn centre_of_mass(workspace: &Workspace, radius: f64) -> Result<[f64; 2], SolveError> {
    let pixels: Vec<([f64; 2], f64)> = workspace
        .detectors()
        .filter(|spectrum| spectrum.component == MAIN_DETECTOR && !spectrum.masked)
        .map(|spectrum| {
            (
                [spectrum.position[0], spectrum.position[1]],
                spectrum.total_counts().max(0.0),
            )
        })
        .collect();

    let mut centre = weighted_centre(&pixels, None).ok_or(SolveError::NoCounts {
        radius: f64::INFINITY,
        x: 0.0,
        y: 0.0,
    })?;
    for iteration in 1..=MAX_CENTRE_ITERATIONS {
        let next = weighted_centre(&pixels, Some((centre, radius))).ok_or(SolveError::NoCounts {
            radius,
            x: centre[0],
            y: centre[1],
        })?;
        let shift = (next[0] - centre[0]).hypot(next[1] - centre[1]);
        centre = next;
        if shift < CENTRE_TOLERANCE {
            debug!(iteration, x = centre[0], y = centre[1], "beam centre converged");
            return Ok(centre);
        }
    }
    Err(SolveError::NotConverged {
        iterations: MAX_CENTRE_ITERATIONS,
    })
}

fn weighted_centre(pixels: &[([f64; 2], f64)], window: Option<([f64; 2], f64)>) -> Option<[f64; 2]> {
    let (mut sum_x, mut sum_y, mut total) = (0.0, 0.0, 0.0);
    for (position, counts) in pixels {
        if let Some((centre, radius)) = window {
            if (position[0] - centre[0]).hypot(position[1] - centre[1]) > radius {
                continue;
            }
        }
        sum_x += position[0] * counts;
        sum_y += position[1] * counts;
        total += counts;
    }
    (total > 0.0).then(|| [sum_x / total, sum_y / total])
}

/// Horizontal beam width [rad]: the main detector is grouped column-wise and a
/// Gaussian on a flat background is fitted against the signed in-plane 2θ in degrees.
/// Returns `None` when the detector has too few columns to resolve a profile.
pub fn fit_beam_width(workspace: &Workspace) -> SansResult<Option<f64>> {
    let Some((angles, counts)) = vertical_profile(workspace) else {
        warn!(workspace = %workspace.name, "unsupported detector geometry, skipping beam width fit");
        return Ok(None);
    };
    let distribution_width = angles.iter().fold(f64::NEG_INFINITY, |max, angle| max.max(*angle));
    let height = counts.iter().fold(f64::NEG_INFINITY, |max, count| max.max(*count));
    let initial = GaussianPeak {
        background: FLAT_BACKGROUND_START,
        height,
        centre: 0.0,
        sigma: 0.1 * distribution_width,
    };
    let options = FitOptions {
        centre_bounds: Some((-0.1 * distribution_width, 0.1 * distribution_width)),
        ..FitOptions::default()
    };
    let outcome = fit_gaussian(&angles, &counts, initial, &options).map_err(|source| {
        SansError::measurement(
            "MEASUREMENT.BEAM_WIDTH_FIT",
            format!("beam width fit of '{}' failed: {}", workspace.name, source),
        )
    })?;
    let width = outcome.peak.sigma.to_radians();
    info!(beam_width = width, iterations = outcome.iterations, "fitted horizontal beam width");
    Ok(Some(width))
}

/// Column sums of the main detector ordered by in-plane angle [deg].
fn vertical_profile(workspace: &Workspace) -> Option<(Vec<f64>, Vec<f64>)> {
    let mut columns: Vec<(f64, f64, f64)> = Vec::new();
    for spectrum in workspace
        .detectors()
        .filter(|spectrum| spectrum.component == MAIN_DETECTOR)
    {
        let x = spectrum.position[0];
        let counts = spectrum.total_counts();
        match columns
            .iter_mut()
            .find(|(column_x, _, _)| (column_x - x).abs() < 1.0e-9)
        {
            Some(column) => column.2 += counts,
            None => columns.push((
                x,
                signed_in_plane_two_theta(spectrum.position).to_degrees(),
                counts,
            )),
        }
    }
    if columns.len() < MIN_BEAM_WIDTH_COLUMNS {
        return None;
    }
    columns.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (angles, counts): (Vec<f64>, Vec<f64>) = columns
        .into_iter()
        .map(|(_, angle, counts)| (angle, counts))
        .unzip();
    if angles.iter().fold(f64::NEG_INFINITY, |max, angle| max.max(*angle)) <= 0.0 {
        return None;
    }
    Some((angles, counts))
}

#[cfg(test)]
mod tests {
    use super::{find_beam_centre, fit_beam_width};
    use crate::domain::SansErrorCategory;
    use crate::workspace::DetectorGrid;

    #[test]
    fn centre_of_mass_finds_an_offset_beam() {
        let ws = DetectorGrid::new("D11", 32, 32)
            .gaussian_beam([0.02, -0.012], 0.01, 1000.0)
            .build("beam");
        let centre = find_beam_centre(&ws, 0.05).expect("centre");
        assert!((centre[0] - 0.02).abs() < 1e-3, "{centre:?}");
        assert!((centre[1] + 0.012).abs() < 1e-3, "{centre:?}");
    }

    #[test]
    fn empty_detector_has_no_centre() {
        let ws = DetectorGrid::new("D11", 4, 4).uniform_counts(0.0).build("beam");
        let error = find_beam_centre(&ws, 0.05).expect_err("no counts");
        assert_eq!(error.category(), SansErrorCategory::Measurement);
        assert_eq!(error.placeholder(), "MEASUREMENT.BEAM_CENTRE");
    }

    #[test]
    fn beam_width_matches_the_simulated_profile() {
        let l2 = 4.0;
        let sigma = 0.02;
        let ws = DetectorGrid::new("D11", 64, 8)
            .l2(l2)
            .gaussian_beam([0.0, 0.0], sigma, 500.0)
            .background(1.0)
            .build("beam");
        let width = fit_beam_width(&ws).expect("fit").expect("supported geometry");
        let expected = (sigma / l2).atan();
        assert!((width - expected).abs() / expected < 0.05, "{width} vs {expected}");
    }

    #[test]
    fn narrow_detectors_skip_the_fit() {
        let ws = DetectorGrid::new("D11", 2, 8).build("beam");
        assert_eq!(fit_beam_width(&ws).expect("skipped"), None);
    }
}
