use crate::common::config::THICKNESS_FROM_LOGS;
use crate::domain::{SansError, SansResult};
use crate::modules::CorrectionContext;
use crate::workspace::Workspace;

/// Sample log with the thickness recorded at acquisition [cm].
pub const SAMPLE_THICKNESS_LOG: &str = "sample.thickness";

/// Normalises by sample thickness: one value scales uniformly, several values
/// divide each sample (all frames of it in kinetic mode) by its own thickness.
pub fn apply_thickness(
    workspace: &mut Workspace,
    thicknesses: &[f64],
    context: &CorrectionContext,
) -> SansResult<()> {
    let thicknesses = resolve_thicknesses(workspace, thicknesses)?;
    match thicknesses.as_slice() {
        [] => Ok(()),
        [single] => {
            workspace.scale(1.0 / single);
            Ok(())
        }
        many => {
            let repeats = if context.is_kinetic() {
                context.n_frames().max(1)
            } else {
                1
            };
            let divisors: Vec<f64> = many
                .iter()
                .flat_map(|value| std::iter::repeat_n(*value, repeats))
                .collect();
            workspace.divide_bins(&divisors)
        }
    }
}

fn resolve_thicknesses(workspace: &Workspace, thicknesses: &[f64]) -> SansResult<Vec<f64>> {
    thicknesses
        .iter()
        .map(|value| {
            let resolved = if *value == THICKNESS_FROM_LOGS {
                workspace
                    .logs
                    .require_number(SAMPLE_THICKNESS_LOG, &workspace.name)?
            } else {
                *value
            };
            if resolved <= 0.0 || !resolved.is_finite() {
                return Err(SansError::validation(
                    "VALIDATION.THICKNESS_VALUE",
                    format!(
                        "sample thickness must be positive, got {} for '{}'",
                        resolved, workspace.name
                    ),
                ));
            }
            Ok(resolved)
        })
        .collect()
}
