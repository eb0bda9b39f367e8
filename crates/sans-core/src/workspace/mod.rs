mod builder;
mod instrument;
mod logs;
mod ops;
mod store;

pub use builder::DetectorGrid;
pub(crate) use ops::bin_centres;
pub use instrument::{Component, Instrument, MAIN_DETECTOR, ParameterValue};
pub use logs::{LogEntry, LogValue, SampleLogs};
pub use store::WorkspaceStore;

use crate::domain::{ProcessType, SansError, SansResult};
use serde::{Deserialize, Serialize};

pub const PROCESSED_AS_LOG: &str = "ProcessedAs";
pub const L2_LOG: &str = "L2";
pub const WAVELENGTH_LOG: &str = "wavelength";
pub const NORMALISED_BY_FLUX_LOG: &str = "NormalisedByFlux";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisUnit {
    #[default]
    Wavelength,
    TimeOfFlight,
    Empty,
    Label,
}

/// One detector pixel (or monitor) with its counts per bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub detector_id: i64,
    #[serde(default = "default_component")]
    pub component: String,
    pub position: [f64; 3],
    pub y: Vec<f64>,
    pub e: Vec<f64>,
    #[serde(default)]
    pub masked: bool,
    #[serde(default)]
    pub monitor: bool,
}

fn default_component() -> String {
    MAIN_DETECTOR.to_string()
}

impl Spectrum {
    pub fn new(detector_id: i64, position: [f64; 3], y: Vec<f64>, e: Vec<f64>) -> Self {
        Self {
            detector_id,
            component: default_component(),
            position,
            y,
            e,
            masked: false,
            monitor: false,
        }
    }

    pub fn monitor(detector_id: i64, y: Vec<f64>) -> Self {
        let e = y.iter().map(|value| value.abs().sqrt()).collect();
        Self {
            detector_id,
            component: "monitors".to_string(),
            position: [0.0, 0.0, 0.0],
            y,
            e,
            masked: false,
            monitor: true,
        }
    }

    pub fn mask(&mut self) {
        self.masked = true;
        self.y.iter_mut().for_each(|value| *value = 0.0);
        self.e.iter_mut().for_each(|value| *value = 0.0);
    }

    pub fn total_counts(&self) -> f64 {
        self.y.iter().sum()
    }
}

/// In-memory matrix workspace: a shared X axis and one spectrum per detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub name: String,
    pub instrument: Instrument,
    #[serde(default)]
    pub unit: AxisUnit,
    pub x: Vec<f64>,
    #[serde(default)]
    pub histogram: bool,
    pub spectra: Vec<Spectrum>,
    #[serde(default)]
    pub logs: SampleLogs,
}

impl Workspace {
    pub fn new(name: impl Into<String>, instrument: Instrument, x: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            instrument,
            unit: AxisUnit::default(),
            x,
            histogram: false,
            spectra: Vec::new(),
            logs: SampleLogs::new(),
        }
    }

    /// Number of Y values per spectrum.
    pub fn blocksize(&self) -> usize {
        self.spectra.first().map_or(0, |spectrum| spectrum.y.len())
    }

    pub fn number_histograms(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_histogram_data(&self) -> bool {
        self.histogram
    }

    pub fn detectors(&self) -> impl Iterator<Item = &Spectrum> {
        self.spectra.iter().filter(|spectrum| !spectrum.monitor)
    }

    pub fn detectors_mut(&mut self) -> impl Iterator<Item = &mut Spectrum> {
        self.spectra.iter_mut().filter(|spectrum| !spectrum.monitor)
    }

    pub fn spectrum_by_detector_id(&self, detector_id: i64) -> Option<&Spectrum> {
        self.spectra
            .iter()
            .find(|spectrum| spectrum.detector_id == detector_id)
    }

    /// Checks that every spectrum agrees with the X axis length.
    pub fn validate_shape(&self) -> SansResult<()> {
        let expected_bins = if self.histogram {
            self.x.len().saturating_sub(1)
        } else {
            self.x.len()
        };
        for spectrum in &self.spectra {
            if spectrum.y.len() != expected_bins || spectrum.e.len() != expected_bins {
                return Err(SansError::validation(
                    "VALIDATION.WORKSPACE_SHAPE",
                    format!(
                        "workspace '{}' detector {} has {} counts and {} errors, expected {} from the X axis",
                        self.name,
                        spectrum.detector_id,
                        spectrum.y.len(),
                        spectrum.e.len(),
                        expected_bins
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn extract_spectrum(&self, detector_id: i64) -> SansResult<Workspace> {
        let spectrum = self.spectrum_by_detector_id(detector_id).ok_or_else(|| {
            SansError::validation(
                "VALIDATION.MISSING_DETECTOR",
                format!(
                    "workspace '{}' has no spectrum for detector id {}",
                    self.name, detector_id
                ),
            )
        })?;
        let mut extracted = self.empty_like(format!("{}_{}", self.name, detector_id));
        extracted.spectra.push(spectrum.clone());
        Ok(extracted)
    }

    /// Same metadata and axis, no spectra.
    pub fn empty_like(&self, name: impl Into<String>) -> Workspace {
        Workspace {
            name: name.into(),
            instrument: self.instrument.clone(),
            unit: self.unit,
            x: self.x.clone(),
            histogram: self.histogram,
            spectra: Vec::new(),
            logs: self.logs.clone(),
        }
    }

    /// Zero counts with the shape of `self`.
    pub fn blank_like(&self, name: impl Into<String>) -> Workspace {
        let mut blank = self.clone();
        blank.name = name.into();
        blank.unit = AxisUnit::Empty;
        for spectrum in &mut blank.spectra {
            spectrum.y.iter_mut().for_each(|value| *value = 0.0);
            spectrum.e.iter_mut().for_each(|value| *value = 0.0);
        }
        blank
    }

    pub fn l2(&self) -> SansResult<f64> {
        self.logs.require_number(L2_LOG, &self.name)
    }

    pub fn wavelength(&self) -> Option<f64> {
        self.logs.number(WAVELENGTH_LOG)
    }

    pub fn processed_as(&self) -> Option<ProcessType> {
        self.logs
            .text(PROCESSED_AS_LOG)
            .and_then(|value| value.parse().ok())
    }

    pub fn set_processed_as(&mut self, process: ProcessType) {
        self.logs.add_text(PROCESSED_AS_LOG, process.as_str());
    }

    /// Relative move of a component and all pixels attached to it.
    pub fn move_component(&mut self, component: &str, dx: f64, dy: f64) -> SansResult<()> {
        let Some(target) = self.instrument.component_mut(component) else {
            return Err(SansError::validation(
                "VALIDATION.MISSING_COMPONENT",
                format!(
                    "instrument {} of workspace '{}' has no component '{}'",
                    self.instrument.name, self.name, component
                ),
            ));
        };
        target.position[0] += dx;
        target.position[1] += dy;
        for spectrum in self
            .spectra
            .iter_mut()
            .filter(|spectrum| spectrum.component == component)
        {
            spectrum.position[0] += dx;
            spectrum.position[1] += dy;
        }
        Ok(())
    }

    pub fn mask_detector_ids(&mut self, detector_ids: &[i64]) {
        for spectrum in &mut self.spectra {
            if detector_ids.contains(&spectrum.detector_id) {
                spectrum.mask();
            }
        }
    }

    pub fn mask_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&Spectrum) -> bool,
    {
        let mut masked = 0;
        for spectrum in &mut self.spectra {
            if !spectrum.masked && predicate(spectrum) {
                spectrum.mask();
                masked += 1;
            }
        }
        masked
    }

    /// Masks every detector that is masked in `other`, matched by detector id.
    pub fn copy_mask_from(&mut self, other: &Workspace) -> usize {
        let masked_ids: Vec<i64> = other
            .spectra
            .iter()
            .filter(|spectrum| spectrum.masked)
            .map(|spectrum| spectrum.detector_id)
            .collect();
        self.mask_where(|spectrum| masked_ids.contains(&spectrum.detector_id))
    }

    pub fn masked_count(&self) -> usize {
        self.spectra.iter().filter(|spectrum| spectrum.masked).count()
    }
}
