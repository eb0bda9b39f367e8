use super::context::CorrectionContext;
use super::sequencer::CorrectionStep;
use crate::domain::SansResult;
use crate::workspace::Workspace;

/// Applies one correction step to the primary workspace of a reduction.
pub trait StepExecutor {
    fn execute_step(
        &mut self,
        step: CorrectionStep,
        workspace: &mut Workspace,
        context: &CorrectionContext,
    ) -> SansResult<()>;
}

#[cfg(test)]
mod tests {
    use super::StepExecutor;
    use crate::domain::{AcquisitionMode, ProcessType, SansError, SansErrorCategory, SansResult};
    use crate::modules::context::CorrectionContext;
    use crate::modules::sequencer::CorrectionStep;
    use crate::workspace::{DetectorGrid, Workspace};

    struct FailingExecutor;

    impl StepExecutor for FailingExecutor {
        fn execute_step(
            &mut self,
            step: CorrectionStep,
            _workspace: &mut Workspace,
            _context: &CorrectionContext,
        ) -> SansResult<()> {
            Err(SansError::measurement(
                "MEASUREMENT.ZERO_MONITOR",
                format!("{} failed", step),
            ))
        }
    }

    #[test]
    fn step_executor_uses_shared_error_types() {
        let mut workspace = DetectorGrid::new("D11", 2, 2).build("sample");
        let context =
            CorrectionContext::new(ProcessType::Sample, "D11", AcquisitionMode::Mono, 1, 1, true)
                .expect("mono sample");
        let error = FailingExecutor
            .execute_step(CorrectionStep::Normalise, &mut workspace, &context)
            .expect_err("executor should fail");
        assert_eq!(error.category(), SansErrorCategory::Measurement);
        assert_eq!(error.exit_code(), 4);
        assert_eq!(error.placeholder(), "MEASUREMENT.ZERO_MONITOR");
    }
}
