pub mod fitting;
pub mod geometry;

pub use fitting::{FitError, FitOptions, FitOutcome, GaussianPeak, fit_gaussian};
pub use geometry::{
    exact_pixel_solid_angle, in_plane_angle, rectangle_solid_angle, signed_in_plane_two_theta,
    two_theta,
};

/// Arithmetic mean of finite values; `None` when nothing is finite.
pub fn finite_mean<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}
