use faer::Mat;

const PARAMETER_COUNT: usize = 4;
const SINGULAR_PIVOT_EPSILON: f64 = 1.0e-300;
const MAX_DAMPING: f64 = 1.0e12;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("fit requires at least {required} finite points, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },
    #[error("fit input length mismatch: x={x}, y={y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("initial parameter '{field}' must be finite, got {value}")]
    NonFiniteParameter { field: &'static str, value: f64 },
    #[error("initial sigma must be non-zero")]
    ZeroWidth,
    #[error("normal equations are singular at pivot index {pivot_index}")]
    SingularSystem { pivot_index: usize },
}

/// Flat background plus Gaussian: `background + height * exp(-(x - centre)^2 / (2 sigma^2))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianPeak {
    pub background: f64,
    pub height: f64,
    pub centre: f64,
    pub sigma: f64,
}

impl GaussianPeak {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.background + self.height * self.profile(x)
    }

    fn profile(&self, x: f64) -> f64 {
        let delta = x - self.centre;
        (-(delta * delta) / (2.0 * self.sigma * self.sigma)).exp()
    }

    fn gradient(&self, x: f64) -> [f64; PARAMETER_COUNT] {
        let profile = self.profile(x);
        let delta = x - self.centre;
        let sigma2 = self.sigma * self.sigma;
        [
            1.0,
            profile,
            self.height * profile * delta / sigma2,
            self.height * profile * delta * delta / (sigma2 * self.sigma),
        ]
    }

    fn parameters(&self) -> [f64; PARAMETER_COUNT] {
        [self.background, self.height, self.centre, self.sigma]
    }

    fn from_parameters(parameters: [f64; PARAMETER_COUNT]) -> Self {
        Self {
            background: parameters[0],
            height: parameters[1],
            centre: parameters[2],
            sigma: parameters[3].abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub max_iterations: usize,
    pub relative_tolerance: f64,
    /// Inclusive bounds on the peak centre.
    pub centre_bounds: Option<(f64, f64)>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            relative_tolerance: 1.0e-10,
            centre_bounds: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOutcome {
    pub peak: GaussianPeak,
    pub chi_squared: f64,
    pub iterations: usize,
}

/// Levenberg-Marquardt least squares fit of a [`GaussianPeak`]; non-finite points are ignored.
pub fn fit_gaussian(
    x: &[f64],
    y: &[f64],
    initial: GaussianPeak,
    options: &FitOptions,
) -> Result<FitOutcome, FitError> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    for (field, value) in [
        ("background", initial.background),
        ("height", initial.height),
        ("centre", initial.centre),
        ("sigma", initial.sigma),
    ] {
        if !value.is_finite() {
            return Err(FitError::NonFiniteParameter { field, value });
        }
    }
    if initial.sigma == 0.0 {
        return Err(FitError::ZeroWidth);
    }

    let points: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .map(|(xi, yi)| (*xi, *yi))
        .collect();
    if points.len() < PARAMETER_COUNT {
        return Err(FitError::InsufficientPoints {
            required: PARAMETER_COUNT,
            actual: points.len(),
        });
    }

    let mut peak = constrain(initial, options);
    let mut chi_squared = chi_squared_of(&peak, &points);
    let mut damping = 1.0e-3;
    let mut iterations = 0;

    while iterations < options.max_iterations {
        iterations += 1;
        let (normal, gradient) = normal_equations(&peak, &points);

        let mut improved = false;
        while damping <= MAX_DAMPING {
            let mut damped = normal.clone();
            for index in 0..PARAMETER_COUNT {
                let diagonal = damped[(index, index)];
                damped[(index, index)] = diagonal + damping * diagonal.max(1.0e-12);
            }
            let step = solve(damped, gradient)?;
            let mut parameters = peak.parameters();
            for (parameter, delta) in parameters.iter_mut().zip(step) {
                *parameter += delta;
            }
            let candidate = constrain(GaussianPeak::from_parameters(parameters), options);
            let candidate_chi = chi_squared_of(&candidate, &points);
            if candidate_chi.is_finite() && candidate_chi < chi_squared && candidate.sigma > 0.0 {
                let change = chi_squared - candidate_chi;
                peak = candidate;
                chi_squared = candidate_chi;
                damping = (damping / 10.0).max(1.0e-12);
                improved = true;
                if change <= options.relative_tolerance * chi_squared.max(f64::MIN_POSITIVE) {
                    return Ok(FitOutcome {
                        peak,
                        chi_squared,
                        iterations,
                    });
                }
                break;
            }
            damping *= 10.0;
        }
        if !improved {
            break;
        }
    }

    Ok(FitOutcome {
        peak,
        chi_squared,
        iterations,
    })
}

fn constrain(mut peak: GaussianPeak, options: &FitOptions) -> GaussianPeak {
    if let Some((lower, upper)) = options.centre_bounds {
        peak.centre = peak.centre.clamp(lower, upper);
    }
    peak
}

fn chi_squared_of(peak: &GaussianPeak, points: &[(f64, f64)]) -> f64 {
    points
        .iter()
        .map(|(x, y)| {
            let residual = y - peak.evaluate(*x);
            residual * residual
        })
        .sum()
}

fn normal_equations(peak: &GaussianPeak, points: &[(f64, f64)]) -> (Mat<f64>, [f64; PARAMETER_COUNT]) {
    let mut normal = Mat::<f64>::zeros(PARAMETER_COUNT, PARAMETER_COUNT);
    let mut gradient = [0.0; PARAMETER_COUNT];
    for (x, y) in points {
        let jacobian = peak.gradient(*x);
        let residual = y - peak.evaluate(*x);
        for row in 0..PARAMETER_COUNT {
            gradient[row] += jacobian[row] * residual;
            for col in 0..PARAMETER_COUNT {
                let updated = normal[(row, col)] + jacobian[row] * jacobian[col];
                normal[(row, col)] = updated;
            }
        }
    }
    (normal, gradient)
}

fn solve(
    mut matrix: Mat<f64>,
    mut rhs: [f64; PARAMETER_COUNT],
) -> Result<[f64; PARAMETER_COUNT], FitError> {
    for pivot_col in 0..PARAMETER_COUNT {
        let pivot_row = (pivot_col..PARAMETER_COUNT)
            .max_by(|a, b| {
                matrix[(*a, pivot_col)]
                    .abs()
                    .total_cmp(&matrix[(*b, pivot_col)].abs())
            })
            .unwrap_or(pivot_col);
        if matrix[(pivot_row, pivot_col)].abs() <= SINGULAR_PIVOT_EPSILON {
            return Err(FitError::SingularSystem {
                pivot_index: pivot_col,
            });
        }
        if pivot_row != pivot_col {
            for col in 0..PARAMETER_COUNT {
                let swapped = matrix[(pivot_col, col)];
                matrix[(pivot_col, col)] = matrix[(pivot_row, col)];
                matrix[(pivot_row, col)] = swapped;
            }
            rhs.swap(pivot_col, pivot_row);
        }
        let pivot = matrix[(pivot_col, pivot_col)];
        for row in (pivot_col + 1)..PARAMETER_COUNT {
            let factor = matrix[(row, pivot_col)] / pivot;
            for col in pivot_col..PARAMETER_COUNT {
                let updated = matrix[(row, col)] - factor * matrix[(pivot_col, col)];
                matrix[(row, col)] = updated;
            }
            rhs[row] -= factor * rhs[pivot_col];
        }
    }

    let mut solution = [0.0; PARAMETER_COUNT];
    for row in (0..PARAMETER_COUNT).rev() {
        let mut value = rhs[row];
        for col in (row + 1)..PARAMETER_COUNT {
            value -= matrix[(row, col)] * solution[col];
        }
        solution[row] = value / matrix[(row, row)];
    }
    Ok(solution)
}
