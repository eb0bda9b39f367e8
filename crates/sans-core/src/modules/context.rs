use crate::domain::{AcquisitionMode, ProcessType, SansError, SansResult};
use crate::workspace::{AxisUnit, Workspace};
use tracing::info;

/// Per-invocation facts derived once the first run is loaded; read by every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionContext {
    process: ProcessType,
    instrument: String,
    mode: AcquisitionMode,
    n_frames: usize,
    n_samples: usize,
    is_point: bool,
}

impl CorrectionContext {
    pub fn new(
        process: ProcessType,
        instrument: impl Into<String>,
        mode: AcquisitionMode,
        n_frames: usize,
        n_samples: usize,
        is_point: bool,
    ) -> SansResult<Self> {
        if mode == AcquisitionMode::Kinetic && process != ProcessType::Sample {
            return Err(SansError::validation(
                "VALIDATION.KINETIC_PROCESS",
                format!(
                    "only the sample can be a kinetic measurement, the auxiliary calibration measurements cannot (got {})",
                    process
                ),
            ));
        }
        Ok(Self {
            process,
            instrument: instrument.into(),
            mode,
            n_frames,
            n_samples,
            is_point,
        })
    }

    /// Derives instrument, acquisition mode, frame count and point flag from a loaded run.
    pub fn setup(process: ProcessType, n_samples: usize, run: &Workspace) -> SansResult<Self> {
        let instrument = run.instrument.name().to_string();
        info!(instrument = %instrument, "set the instrument name");
        let n_frames = run.blocksize();
        info!(n_frames, "set the number of frames");
        let mode = acquisition_mode(n_frames, run.unit);
        info!(mode = %mode, "set the acquisition mode");
        let is_point = !run.is_histogram_data();
        info!(is_point, "set the point data flag");
        Self::new(process, instrument, mode, n_frames, n_samples, is_point)
    }

    pub fn process(&self) -> ProcessType {
        self.process
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    pub fn is_tof(&self) -> bool {
        self.mode == AcquisitionMode::Tof
    }

    pub fn is_kinetic(&self) -> bool {
        self.mode == AcquisitionMode::Kinetic
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn is_point(&self) -> bool {
        self.is_point
    }
}

pub fn acquisition_mode(n_frames: usize, unit: AxisUnit) -> AcquisitionMode {
    if n_frames > 1 {
        if unit == AxisUnit::Wavelength {
            AcquisitionMode::Tof
        } else {
            AcquisitionMode::Kinetic
        }
    } else {
        AcquisitionMode::Mono
    }
}

#[cfg(test)]
mod tests {
    use super::{CorrectionContext, acquisition_mode};
    use crate::domain::{AcquisitionMode, ProcessType, SansErrorCategory};
    use crate::workspace::{AxisUnit, DetectorGrid};

    #[test]
    fn mode_follows_frames_and_unit() {
        assert_eq!(acquisition_mode(1, AxisUnit::Wavelength), AcquisitionMode::Mono);
        assert_eq!(acquisition_mode(5, AxisUnit::Wavelength), AcquisitionMode::Tof);
        assert_eq!(acquisition_mode(5, AxisUnit::Empty), AcquisitionMode::Kinetic);
    }

    #[test]
    fn setup_reads_the_loaded_run() {
        let run = DetectorGrid::new("D22", 2, 2)
            .wavelength_bins(vec![1.0, 2.0, 3.0])
            .build("tof");
        let context = CorrectionContext::setup(ProcessType::Water, 1, &run).expect("setup");
        assert_eq!(context.instrument(), "D22");
        assert_eq!(context.mode(), AcquisitionMode::Tof);
        assert_eq!(context.n_frames(), 2);
        assert!(!context.is_point());
    }

    #[test]
    fn kinetic_is_only_legal_for_samples() {
        let run = DetectorGrid::new("D11", 2, 2).frames(10).build("kinetic");
        assert!(CorrectionContext::setup(ProcessType::Sample, 1, &run).is_ok());
        for process in ProcessType::ALL
            .into_iter()
            .filter(|process| *process != ProcessType::Sample)
        {
            let error = CorrectionContext::setup(process, 1, &run).expect_err("not a sample");
            assert_eq!(error.category(), SansErrorCategory::Validation);
            assert_eq!(error.placeholder(), "VALIDATION.KINETIC_PROCESS");
        }
    }
}
