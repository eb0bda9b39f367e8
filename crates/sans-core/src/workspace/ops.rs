use super::{AxisUnit, Spectrum, Workspace};
use crate::domain::{SansError, SansResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOperation {
    Minus,
    Divide,
}

impl BinaryOperation {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Minus => "Minus",
            Self::Divide => "Divide",
        }
    }

    fn apply(self, lhs: f64, lhs_error: f64, rhs: f64, rhs_error: f64) -> (f64, f64) {
        match self {
            Self::Minus => (lhs - rhs, lhs_error.hypot(rhs_error)),
            Self::Divide => {
                if rhs == 0.0 {
                    return (0.0, 0.0);
                }
                let value = lhs / rhs;
                let error = (lhs_error / rhs).hypot(lhs * rhs_error / (rhs * rhs));
                (value, error)
            }
        }
    }
}

impl Workspace {
    /// Bin-wise subtraction; a single-spectrum or single-bin right-hand side is broadcast.
    pub fn minus(&mut self, rhs: &Workspace) -> SansResult<()> {
        self.binary(rhs, BinaryOperation::Minus)
    }

    /// Bin-wise division; division by zero yields zero.
    pub fn divide(&mut self, rhs: &Workspace) -> SansResult<()> {
        self.binary(rhs, BinaryOperation::Divide)
    }

    pub fn scale(&mut self, factor: f64) {
        for spectrum in &mut self.spectra {
            spectrum.y.iter_mut().for_each(|value| *value *= factor);
            spectrum.e.iter_mut().for_each(|value| *value *= factor.abs());
        }
    }

    /// Divides bin `j` of every detector spectrum by `divisors[j]`.
    pub fn divide_bins(&mut self, divisors: &[f64]) -> SansResult<()> {
        if divisors.len() != self.blocksize() {
            return Err(SansError::consistency(
                "CONSISTENCY.BIN_COUNT",
                format!(
                    "cannot divide workspace '{}' with {} bins by {} values",
                    self.name,
                    self.blocksize(),
                    divisors.len()
                ),
            ));
        }
        for spectrum in self.detectors_mut() {
            for (bin, divisor) in divisors.iter().enumerate() {
                let (value, error) = BinaryOperation::Divide.apply(
                    spectrum.y[bin],
                    spectrum.e[bin],
                    *divisor,
                    0.0,
                );
                spectrum.y[bin] = value;
                spectrum.e[bin] = error;
            }
        }
        Ok(())
    }

    fn binary(&mut self, rhs: &Workspace, operation: BinaryOperation) -> SansResult<()> {
        let spectrum_broadcast = rhs.number_histograms() == 1 && self.number_histograms() != 1;
        if !spectrum_broadcast && rhs.number_histograms() != self.number_histograms() {
            return Err(shape_error(self, rhs, operation, "spectra"));
        }
        let lhs_bins = self.blocksize();
        let rhs_bins = rhs.blocksize();
        if rhs_bins != lhs_bins && rhs_bins != 1 {
            return Err(shape_error(self, rhs, operation, "bins"));
        }

        for (index, spectrum) in self.spectra.iter_mut().enumerate() {
            let other = if spectrum_broadcast {
                &rhs.spectra[0]
            } else {
                &rhs.spectra[index]
            };
            if other.masked && !spectrum_broadcast {
                spectrum.mask();
                continue;
            }
            for bin in 0..lhs_bins {
                let rhs_bin = if rhs_bins == 1 { 0 } else { bin };
                let (value, error) = operation.apply(
                    spectrum.y[bin],
                    spectrum.e[bin],
                    other.y[rhs_bin],
                    other.e[rhs_bin],
                );
                spectrum.y[bin] = value;
                spectrum.e[bin] = error;
            }
        }
        Ok(())
    }

    /// Linear interpolation of every spectrum onto the axis of `target`; outside the
    /// source range the counts are zero.
    pub fn rebin_to(&self, target: &Workspace) -> Workspace {
        let source_points = bin_centres(&self.x, self.histogram);
        let target_points = bin_centres(&target.x, target.histogram);
        let mut rebinned = self.empty_like(format!("{}_rebinned", self.name));
        rebinned.x = target.x.clone();
        rebinned.histogram = target.histogram;
        rebinned.unit = target.unit;
        rebinned.spectra = self
            .spectra
            .iter()
            .map(|spectrum| {
                let (y, e) = target_points
                    .iter()
                    .map(|point| interpolate(&source_points, &spectrum.y, &spectrum.e, *point))
                    .unzip();
                Spectrum {
                    y,
                    e,
                    ..spectrum.clone()
                }
            })
            .collect();
        rebinned
    }

    pub fn convert_to_point_data(&mut self) {
        if self.histogram {
            self.x = bin_centres(&self.x, true);
            self.histogram = false;
        }
    }

    /// Repeats every bin `repeats` times, e.g. to match the frames of a kinetic sample.
    pub fn broadcast_bins(&self, repeats: usize) -> Workspace {
        let mut broadcast = self.empty_like(format!("{}_broadcast", self.name));
        broadcast.histogram = false;
        broadcast.x = repeat_each(&bin_centres(&self.x, self.histogram), repeats);
        broadcast.spectra = self
            .spectra
            .iter()
            .map(|spectrum| Spectrum {
                y: repeat_each(&spectrum.y, repeats),
                e: repeat_each(&spectrum.e, repeats),
                ..spectrum.clone()
            })
            .collect();
        broadcast
    }

    /// Sums runs bin by bin, errors in quadrature; metadata is taken from the first run.
    pub fn sum(runs: &[Workspace], name: impl Into<String>) -> SansResult<Workspace> {
        let (first, rest) = runs.split_first().ok_or_else(|| {
            SansError::validation("VALIDATION.EMPTY_MERGE", "no runs given to merge")
        })?;
        let mut merged = first.clone();
        merged.name = name.into();
        for run in rest {
            if run.number_histograms() != merged.number_histograms()
                || run.blocksize() != merged.blocksize()
            {
                return Err(SansError::consistency(
                    "CONSISTENCY.MERGE_SHAPE",
                    format!(
                        "cannot sum run '{}' ({}x{}) into '{}' ({}x{})",
                        run.name,
                        run.number_histograms(),
                        run.blocksize(),
                        merged.name,
                        merged.number_histograms(),
                        merged.blocksize()
                    ),
                ));
            }
            for (target, source) in merged.spectra.iter_mut().zip(&run.spectra) {
                for bin in 0..target.y.len() {
                    target.y[bin] += source.y[bin];
                    target.e[bin] = target.e[bin].hypot(source.e[bin]);
                }
                target.masked |= source.masked;
            }
        }
        Ok(merged)
    }

    /// Concatenates the bins of point-data runs spectrum by spectrum on a linear axis.
    pub fn conjoin(runs: &[Workspace], name: impl Into<String>) -> SansResult<Workspace> {
        let (first, rest) = runs.split_first().ok_or_else(|| {
            SansError::validation("VALIDATION.EMPTY_CONJOIN", "no runs given to conjoin")
        })?;
        let mut joined = first.clone();
        joined.name = name.into();
        joined.unit = AxisUnit::Empty;
        for run in rest {
            if run.number_histograms() != joined.number_histograms() {
                return Err(SansError::consistency(
                    "CONSISTENCY.CONJOIN_SHAPE",
                    format!(
                        "cannot conjoin run '{}' with {} spectra to '{}' with {} spectra",
                        run.name,
                        run.number_histograms(),
                        joined.name,
                        joined.number_histograms()
                    ),
                ));
            }
            for (target, source) in joined.spectra.iter_mut().zip(&run.spectra) {
                target.y.extend_from_slice(&source.y);
                target.e.extend_from_slice(&source.e);
                target.masked |= source.masked;
            }
        }
        joined.histogram = false;
        joined.x = (0..joined.blocksize()).map(|bin| bin as f64).collect();
        Ok(joined)
    }
}

fn shape_error(
    lhs: &Workspace,
    rhs: &Workspace,
    operation: BinaryOperation,
    dimension: &str,
) -> SansError {
    SansError::consistency(
        "CONSISTENCY.WORKSPACE_SHAPE",
        format!(
            "{} of '{}' ({}x{}) and '{}' ({}x{}) failed: incompatible {}",
            operation.as_str(),
            lhs.name,
            lhs.number_histograms(),
            lhs.blocksize(),
            rhs.name,
            rhs.number_histograms(),
            rhs.blocksize(),
            dimension
        ),
    )
}

pub(crate) fn bin_centres(x: &[f64], histogram: bool) -> Vec<f64> {
    if histogram {
        x.windows(2).map(|edges| 0.5 * (edges[0] + edges[1])).collect()
    } else {
        x.to_vec()
    }
}

fn repeat_each(values: &[f64], repeats: usize) -> Vec<f64> {
    values
        .iter()
        .flat_map(|value| std::iter::repeat_n(*value, repeats))
        .collect()
}

fn interpolate(points: &[f64], y: &[f64], e: &[f64], at: f64) -> (f64, f64) {
    match points {
        [] => (0.0, 0.0),
        [single] => {
            if (at - single).abs() <= f64::EPSILON * single.abs().max(1.0) {
                (y[0], e[0])
            } else {
                (0.0, 0.0)
            }
        }
        _ => {
            let last = points.len() - 1;
            if at < points[0] || at > points[last] {
                return (0.0, 0.0);
            }
            let upper = points.partition_point(|point| *point < at).clamp(1, last);
            let lower = upper - 1;
            let span = points[upper] - points[lower];
            let weight = if span == 0.0 {
                0.0
            } else {
                (at - points[lower]) / span
            };
            let value = y[lower] * (1.0 - weight) + y[upper] * weight;
            let error = (e[lower] * (1.0 - weight)).hypot(e[upper] * weight);
            (value, error)
        }
    }
}
