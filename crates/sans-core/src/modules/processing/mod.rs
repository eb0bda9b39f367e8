//! Quantities derived from calibration measurements: beam centre and width,
//! incident flux, transmission and detector sensitivity.

pub mod beam;
pub mod flux;
pub mod sensitivity;
pub mod transmission;

pub use beam::{SolveError, find_beam_centre, fit_beam_width};
pub use flux::{BEAM_AXIS, attenuation_coefficient, incident_flux, integrate_beam, tile_over_spectra};
pub use sensitivity::calculate_efficiency;
pub use transmission::calculate_transmission;
