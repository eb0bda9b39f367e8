use crate::common::constants::GENERIC_SHAPE_SOLID_ANGLE;
use crate::domain::{SansError, SansResult};
use crate::modules::CorrectionContext;
use crate::numerics::{exact_pixel_solid_angle, in_plane_angle, rectangle_solid_angle};
use crate::workspace::{MAIN_DETECTOR, Workspace};
use tracing::warn;

/// Rotation of the second D22B detector panel [deg].
pub const D22B_PANEL_OFFSET_LOG: &str = "Detector 2.dan1_actual";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolidAngleMethod {
    Rectangle,
    GenericShape,
}

impl SolidAngleMethod {
    pub fn for_instrument(instrument: &str) -> Self {
        if GENERIC_SHAPE_SOLID_ANGLE.contains(&instrument) {
            Self::GenericShape
        } else {
            Self::Rectangle
        }
    }
}

/// Divides every detector pixel by the solid angle it subtends.
pub fn apply_solid_angle(workspace: &mut Workspace, context: &CorrectionContext) -> SansResult<()> {
    let method = SolidAngleMethod::for_instrument(context.instrument());
    let (width, height) = (workspace.instrument.pixel_width, workspace.instrument.pixel_height);
    let divisors: Vec<f64> = workspace
        .detectors()
        .map(|spectrum| match method {
            SolidAngleMethod::Rectangle => rectangle_solid_angle(spectrum.position, width, height),
            SolidAngleMethod::GenericShape => {
                exact_pixel_solid_angle(spectrum.position, width, height)
            }
        })
        .collect();
    for (spectrum, solid_angle) in workspace.detectors_mut().zip(divisors) {
        for (value, error) in spectrum.y.iter_mut().zip(spectrum.e.iter_mut()) {
            if solid_angle == 0.0 {
                *value = 0.0;
                *error = 0.0;
            } else {
                *value /= solid_angle;
                *error /= solid_angle;
            }
        }
    }
    Ok(())
}

/// Parallax correction of tube detectors: each panel is divided by the polynomial of
/// the `parallax` parameter evaluated at the in-plane angle to the panel normal.
pub fn apply_parallax(workspace: &mut Workspace, context: &CorrectionContext) -> SansResult<()> {
    let Some(formula) = workspace.instrument.string_parameter("parallax") else {
        warn!(
            instrument = context.instrument(),
            "no parallax formula in the instrument parameters, skipping parallax correction"
        );
        return Ok(());
    };
    let coefficients = parse_polynomial(formula)?;

    let components = workspace
        .instrument
        .detector_panels()
        .unwrap_or_else(|| vec![MAIN_DETECTOR.to_string()]);
    let mut offsets = vec![0.0];
    if context.instrument() == "D22B" {
        let offset = workspace
            .logs
            .require_number(D22B_PANEL_OFFSET_LOG, &workspace.name)?;
        offsets.push(offset.to_radians());
    }

    for (index, component) in components.iter().enumerate() {
        let offset = offsets.get(index).copied().unwrap_or(0.0);
        for spectrum in workspace
            .detectors_mut()
            .filter(|spectrum| &spectrum.component == component)
        {
            let angle = in_plane_angle(spectrum.position, offset);
            let factor = evaluate_polynomial(&coefficients, angle);
            for (value, error) in spectrum.y.iter_mut().zip(spectrum.e.iter_mut()) {
                if factor == 0.0 {
                    *value = 0.0;
                    *error = 0.0;
                } else {
                    *value /= factor;
                    *error /= factor.abs();
                }
            }
        }
    }
    Ok(())
}

/// Coefficients `c0,c1,c2,...` of `c0 + c1 t + c2 t^2 + ...`.
pub fn parse_polynomial(formula: &str) -> SansResult<Vec<f64>> {
    let coefficients = formula
        .split(',')
        .map(|token| token.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| {
            SansError::validation(
                "VALIDATION.PARALLAX_FORMULA",
                format!("invalid parallax polynomial '{}': {}", formula, source),
            )
        })?;
    if coefficients.is_empty() {
        return Err(SansError::validation(
            "VALIDATION.PARALLAX_FORMULA",
            "parallax polynomial has no coefficients",
        ));
    }
    Ok(coefficients)
}

fn evaluate_polynomial(coefficients: &[f64], t: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |accumulator, coefficient| accumulator * t + coefficient)
}
