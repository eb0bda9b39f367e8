use super::{AxisUnit, Instrument, L2_LOG, MAIN_DETECTOR, Spectrum, WAVELENGTH_LOG, Workspace};
use crate::common::constants::monitor_ids;

#[derive(Debug, Clone, Copy, PartialEq)]
enum CountProfile {
    Uniform(f64),
    Gaussian {
        centre: [f64; 2],
        sigma: f64,
        height: f64,
        background: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct ExtraPanel {
    name: String,
    distance: f64,
    x_offset: f64,
}

/// Builds rectangular-detector workspaces with monitors, as produced by the ILL loaders.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorGrid {
    instrument: String,
    columns: usize,
    rows: usize,
    pixel_width: f64,
    pixel_height: f64,
    l2: f64,
    wavelength: f64,
    x: Vec<f64>,
    unit: AxisUnit,
    histogram: bool,
    profile: CountProfile,
    monitor_counts: f64,
    duration: f64,
    panels: Vec<ExtraPanel>,
}

impl DetectorGrid {
    pub fn new(instrument: impl Into<String>, columns: usize, rows: usize) -> Self {
        Self {
            instrument: instrument.into(),
            columns,
            rows,
            pixel_width: 0.008,
            pixel_height: 0.008,
            l2: 4.0,
            wavelength: 6.0,
            x: vec![6.0],
            unit: AxisUnit::Wavelength,
            histogram: false,
            profile: CountProfile::Uniform(1.0),
            monitor_counts: 1.0,
            duration: 1.0,
            panels: Vec::new(),
        }
    }

    pub fn pixel_size(mut self, width: f64, height: f64) -> Self {
        self.pixel_width = width;
        self.pixel_height = height;
        self
    }

    pub fn l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    /// Monochromatic wavelength; resets the axis to a single point.
    pub fn wavelength(mut self, wavelength: f64) -> Self {
        self.wavelength = wavelength;
        self.x = vec![wavelength];
        self.unit = AxisUnit::Wavelength;
        self.histogram = false;
        self
    }

    /// Several frames of a kinetic measurement on an `Empty` axis.
    pub fn frames(mut self, frames: usize) -> Self {
        self.x = (0..frames).map(|frame| frame as f64).collect();
        self.unit = AxisUnit::Empty;
        self.histogram = false;
        self
    }

    /// Wavelength bin edges of a time-of-flight measurement.
    pub fn wavelength_bins(mut self, edges: Vec<f64>) -> Self {
        self.x = edges;
        self.unit = AxisUnit::Wavelength;
        self.histogram = true;
        self
    }

    pub fn uniform_counts(mut self, counts: f64) -> Self {
        self.profile = CountProfile::Uniform(counts);
        self
    }

    pub fn gaussian_beam(mut self, centre: [f64; 2], sigma: f64, height: f64) -> Self {
        self.profile = CountProfile::Gaussian {
            centre,
            sigma,
            height,
            background: 0.0,
        };
        self
    }

    pub fn background(mut self, level: f64) -> Self {
        if let CountProfile::Gaussian { background, .. } = &mut self.profile {
            *background = level;
        }
        self
    }

    pub fn monitor_counts(mut self, counts: f64) -> Self {
        self.monitor_counts = counts;
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    /// Adds a second panel with the same pixel layout at another distance.
    pub fn panel(mut self, name: impl Into<String>, distance: f64, x_offset: f64) -> Self {
        self.panels.push(ExtraPanel {
            name: name.into(),
            distance,
            x_offset,
        });
        self
    }

    pub fn build(&self, name: impl Into<String>) -> Workspace {
        let mut instrument = Instrument::new(self.instrument.clone())
            .with_pixel_size(self.pixel_width, self.pixel_height)
            .with_component(MAIN_DETECTOR, [0.0, 0.0, self.l2]);
        if !self.panels.is_empty() {
            let mut names = vec![MAIN_DETECTOR.to_string()];
            for panel in &self.panels {
                instrument = instrument
                    .with_component(panel.name.clone(), [panel.x_offset, 0.0, panel.distance]);
                names.push(panel.name.clone());
            }
            instrument = instrument.with_string_parameter("detector_panels", names.join(","));
        }

        let mut workspace = Workspace::new(name, instrument, self.x.clone());
        workspace.unit = self.unit;
        workspace.histogram = self.histogram;
        let bins = if self.histogram {
            self.x.len().saturating_sub(1)
        } else {
            self.x.len()
        };

        self.push_panel(&mut workspace, MAIN_DETECTOR, 0, 0.0, self.l2, bins);
        for (index, panel) in self.panels.iter().enumerate() {
            let first_id = ((index + 1) * self.columns * self.rows) as i64;
            self.push_panel(
                &mut workspace,
                &panel.name,
                first_id,
                panel.x_offset,
                panel.distance,
                bins,
            );
        }

        let [monitor, duration] = monitor_ids(&self.instrument);
        workspace
            .spectra
            .push(Spectrum::monitor(monitor, vec![self.monitor_counts; bins]));
        workspace
            .spectra
            .push(Spectrum::monitor(duration, vec![self.duration; bins]));

        workspace.logs.add_number(L2_LOG, self.l2, Some("m"));
        workspace
            .logs
            .add_number(WAVELENGTH_LOG, self.wavelength, Some("Angstrom"));
        workspace
    }

    fn push_panel(
        &self,
        workspace: &mut Workspace,
        component: &str,
        first_id: i64,
        x_offset: f64,
        distance: f64,
        bins: usize,
    ) {
        let half_columns = (self.columns as f64 - 1.0) / 2.0;
        let half_rows = (self.rows as f64 - 1.0) / 2.0;
        for column in 0..self.columns {
            for row in 0..self.rows {
                let x = (column as f64 - half_columns) * self.pixel_width + x_offset;
                let y = (row as f64 - half_rows) * self.pixel_height;
                let counts = self.counts_at(x, y);
                let mut spectrum = Spectrum::new(
                    first_id + (column * self.rows + row) as i64,
                    [x, y, distance],
                    vec![counts; bins],
                    vec![counts.abs().sqrt(); bins],
                );
                spectrum.component = component.to_string();
                workspace.spectra.push(spectrum);
            }
        }
    }

    fn counts_at(&self, x: f64, y: f64) -> f64 {
        match self.profile {
            CountProfile::Uniform(counts) => counts,
            CountProfile::Gaussian {
                centre,
                sigma,
                height,
                background,
            } => {
                let r2 = (x - centre[0]).powi(2) + (y - centre[1]).powi(2);
                background + height * (-r2 / (2.0 * sigma * sigma)).exp()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DetectorGrid;
    use crate::workspace::AxisUnit;

    #[test]
    fn grid_contains_pixels_and_two_monitors() {
        let ws = DetectorGrid::new("D11", 3, 2).build("run");
        assert_eq!(ws.number_histograms(), 8);
        assert_eq!(ws.detectors().count(), 6);
        assert!(ws.spectrum_by_detector_id(100000).is_some_and(|s| s.monitor));
        assert_eq!(ws.l2().expect("L2 log"), 4.0);
        ws.validate_shape().expect("consistent shape");
    }

    #[test]
    fn tof_grid_is_histogram_data() {
        let ws = DetectorGrid::new("D33", 2, 2)
            .wavelength_bins(vec![2.0, 3.0, 4.0, 5.0])
            .build("tof");
        assert!(ws.is_histogram_data());
        assert_eq!(ws.blocksize(), 3);
        assert_eq!(ws.unit, AxisUnit::Wavelength);
        assert!(ws.spectrum_by_detector_id(500001).is_some());
    }

    #[test]
    fn extra_panels_are_registered() {
        let ws = DetectorGrid::new("D33", 2, 2)
            .panel("front_detector", 2.0, 0.3)
            .build("multi");
        assert_eq!(ws.detectors().count(), 8);
        let panels = ws.instrument.detector_panels().expect("panels");
        assert_eq!(panels, vec!["detector", "front_detector"]);
        assert_eq!(
            ws.instrument
                .component("front_detector")
                .map(|c| c.position[2]),
            Some(2.0)
        );
    }
}
