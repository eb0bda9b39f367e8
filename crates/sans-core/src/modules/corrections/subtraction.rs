use crate::domain::{ProcessType, SansResult};
use crate::modules::CorrectionContext;
use crate::modules::checks::{check_distances_match, check_processed_flag, check_wavelengths_match};
use crate::workspace::Workspace;

/// Which checks guard a background subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SubtractionRule {
    expected: ProcessType,
    check_distance: bool,
    check_wavelength: bool,
}

const DARK_CURRENT: SubtractionRule = SubtractionRule {
    expected: ProcessType::DarkCurrent,
    check_distance: false,
    check_wavelength: false,
};

const CONTAINER: SubtractionRule = SubtractionRule {
    expected: ProcessType::EmptyContainer,
    check_distance: true,
    check_wavelength: true,
};

const SOLVENT: SubtractionRule = SubtractionRule {
    expected: ProcessType::Solvent,
    check_distance: true,
    check_wavelength: true,
};

/// Cadmium / B4C subtraction.
pub fn apply_dark_current(
    workspace: &mut Workspace,
    dark_current: Option<&Workspace>,
    context: &CorrectionContext,
) -> SansResult<()> {
    subtract(workspace, dark_current, DARK_CURRENT, context)
}

pub fn apply_container(
    workspace: &mut Workspace,
    container: Option<&Workspace>,
    context: &CorrectionContext,
) -> SansResult<()> {
    subtract(workspace, container, CONTAINER, context)
}

/// Pixel-by-pixel solvent (buffer) subtraction.
pub fn apply_solvent(
    workspace: &mut Workspace,
    solvent: Option<&Workspace>,
    context: &CorrectionContext,
) -> SansResult<()> {
    subtract(workspace, solvent, SOLVENT, context)
}

fn subtract(
    workspace: &mut Workspace,
    background: Option<&Workspace>,
    rule: SubtractionRule,
    context: &CorrectionContext,
) -> SansResult<()> {
    let Some(background) = background else {
        return Ok(());
    };
    check_processed_flag(background, rule.expected)?;
    if rule.check_distance {
        check_distances_match(background, workspace)?;
    }
    if context.is_tof() {
        // wavelength dependent subtraction
        let rebinned = background.rebin_to(workspace);
        workspace.minus(&rebinned)
    } else {
        if rule.check_wavelength {
            check_wavelengths_match(background, workspace)?;
        }
        workspace.minus(background)
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_container, apply_dark_current, apply_solvent};
    use crate::domain::{AcquisitionMode, ProcessType, SansErrorCategory};
    use crate::modules::CorrectionContext;
    use crate::workspace::{DetectorGrid, Workspace};

    fn context(mode: AcquisitionMode, frames: usize) -> CorrectionContext {
        CorrectionContext::new(ProcessType::Sample, "D11", mode, frames, 1, true)
            .expect("context")
    }

    fn tagged(grid: DetectorGrid, process: ProcessType) -> Workspace {
        let mut ws = grid.build(process.as_str());
        ws.set_processed_as(process);
        ws
    }

    #[test]
    fn absent_background_is_a_no_op() {
        let mut ws = DetectorGrid::new("D11", 2, 2).uniform_counts(5.0).build("sample");
        let before = ws.clone();
        apply_container(&mut ws, None, &context(AcquisitionMode::Mono, 1)).expect("no-op");
        assert_eq!(ws, before);
    }

    #[test]
    fn dark_current_skips_geometry_checks() {
        let mut ws = DetectorGrid::new("D11", 2, 2).l2(8.0).uniform_counts(5.0).build("sample");
        let dark = tagged(
            DetectorGrid::new("D11", 2, 2).l2(2.0).wavelength(10.0).uniform_counts(1.0),
            ProcessType::DarkCurrent,
        );
        apply_dark_current(&mut ws, Some(&dark), &context(AcquisitionMode::Mono, 1))
            .expect("subtracted");
        assert_eq!(ws.detectors().next().map(|s| s.y[0]), Some(4.0));
    }

    #[test]
    fn container_requires_matching_distance_and_flag() {
        let mut ws = DetectorGrid::new("D11", 2, 2).l2(8.0).build("sample");
        let far = tagged(DetectorGrid::new("D11", 2, 2).l2(4.0), ProcessType::EmptyContainer);
        let error = apply_container(&mut ws, Some(&far), &context(AcquisitionMode::Mono, 1))
            .expect_err("distance mismatch");
        assert_eq!(error.placeholder(), "CONSISTENCY.DISTANCE");

        let wrong_flag = tagged(DetectorGrid::new("D11", 2, 2).l2(8.0), ProcessType::Water);
        let error = apply_solvent(&mut ws, Some(&wrong_flag), &context(AcquisitionMode::Mono, 1))
            .expect_err("flag mismatch");
        assert_eq!(error.category(), SansErrorCategory::Consistency);
    }

    #[test]
    fn single_frame_container_is_broadcast_over_kinetic_frames() {
        let mut ws = DetectorGrid::new("D11", 2, 2)
            .frames(3)
            .uniform_counts(5.0)
            .build("sample");
        let can = tagged(
            DetectorGrid::new("D11", 2, 2).uniform_counts(2.0),
            ProcessType::EmptyContainer,
        );
        apply_container(&mut ws, Some(&can), &context(AcquisitionMode::Kinetic, 3))
            .expect("subtracted");
        assert_eq!(ws.detectors().next().map(|s| s.y.clone()), Some(vec![3.0; 3]));
    }

    #[test]
    fn tof_background_is_rebinned_to_the_sample() {
        let mut ws = DetectorGrid::new("D33", 2, 2)
            .wavelength_bins(vec![1.0, 2.0, 3.0])
            .uniform_counts(5.0)
            .build("sample");
        let solvent = tagged(
            DetectorGrid::new("D33", 2, 2)
                .wavelength_bins(vec![1.0, 2.0, 3.0, 4.0])
                .uniform_counts(1.0),
            ProcessType::Solvent,
        );
        apply_solvent(&mut ws, Some(&solvent), &context(AcquisitionMode::Tof, 2))
            .expect("subtracted");
        assert_eq!(ws.detectors().next().map(|s| s.y.clone()), Some(vec![4.0, 4.0]));
    }
}
