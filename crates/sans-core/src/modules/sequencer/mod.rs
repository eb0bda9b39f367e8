//! Fixed correction chain of the ILL SANS reduction, cut short by process type.

mod plan;

pub use plan::plan_for;

use super::context::CorrectionContext;
use super::progress::Progress;
use super::traits::StepExecutor;
use crate::domain::SansResult;
use crate::workspace::Workspace;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CorrectionStep {
    Normalise,
    DarkCurrent,
    BeamCentre,
    BeamWidth,
    IncidentFlux,
    DirectBeam,
    CalculateTransmission,
    Transmission,
    SolidAngle,
    Container,
    Masks,
    Parallax,
    Thickness,
    Sensitivity,
    FlatField,
    Solvent,
}

impl CorrectionStep {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normalise => "Normalise",
            Self::DarkCurrent => "DarkCurrent",
            Self::BeamCentre => "BeamCentre",
            Self::BeamWidth => "BeamWidth",
            Self::IncidentFlux => "IncidentFlux",
            Self::DirectBeam => "DirectBeam",
            Self::CalculateTransmission => "CalculateTransmission",
            Self::Transmission => "Transmission",
            Self::SolidAngle => "SolidAngle",
            Self::Container => "Container",
            Self::Masks => "Masks",
            Self::Parallax => "Parallax",
            Self::Thickness => "Thickness",
            Self::Sensitivity => "Sensitivity",
            Self::FlatField => "FlatField",
            Self::Solvent => "Solvent",
        }
    }
}

impl Display for CorrectionStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Runs the chain of `context.process()` against `workspace`; returns the executed steps.
///
/// The first failing step aborts the sequence.
pub fn run_sequence<E: StepExecutor>(
    executor: &mut E,
    workspace: &mut Workspace,
    context: &CorrectionContext,
) -> SansResult<Vec<CorrectionStep>> {
    let mut progress = Progress::new(context.process());
    let mut current_level = None;
    let mut executed = Vec::new();
    for entry in plan::chain_for(context.process()) {
        if current_level != Some(entry.level) {
            current_level = Some(entry.level);
            progress.report(entry.step.as_str());
        }
        debug!(step = %entry.step, workspace = %workspace.name, "applying correction step");
        executor.execute_step(entry.step, workspace, context)?;
        executed.push(entry.step);
    }
    Ok(executed)
}

#[cfg(test)]
mod tests {
    use super::{CorrectionStep, plan_for, run_sequence};
    use crate::domain::{AcquisitionMode, ProcessType, SansError, SansResult};
    use crate::modules::{CorrectionContext, StepExecutor};
    use crate::workspace::{DetectorGrid, Workspace};

    struct FailAt(CorrectionStep, Vec<CorrectionStep>);

    impl StepExecutor for FailAt {
        fn execute_step(
            &mut self,
            step: CorrectionStep,
            _workspace: &mut Workspace,
            _context: &CorrectionContext,
        ) -> SansResult<()> {
            self.1.push(step);
            if step == self.0 {
                return Err(SansError::measurement("MEASUREMENT.TEST", "step failed"));
            }
            Ok(())
        }
    }

    #[test]
    fn failing_step_aborts_the_rest_of_the_chain() {
        let context =
            CorrectionContext::new(ProcessType::Sample, "D11", AcquisitionMode::Mono, 1, 1, true)
                .expect("context");
        let mut workspace = DetectorGrid::new("D11", 2, 2).build("sample");
        let mut executor = FailAt(CorrectionStep::Container, Vec::new());
        let error = run_sequence(&mut executor, &mut workspace, &context).expect_err("fails");
        assert_eq!(error.placeholder(), "MEASUREMENT.TEST");
        assert_eq!(executor.1.last(), Some(&CorrectionStep::Container));
        assert_eq!(executor.1.len(), 5);
    }

    #[test]
    fn dark_current_only_normalises() {
        assert_eq!(plan_for(ProcessType::DarkCurrent), vec![CorrectionStep::Normalise]);
    }
}
