//! Corrections applied in place to the primary workspace of a reduction.

pub mod beam;
pub mod flat_field;
pub mod geometry;
pub mod masks;
pub mod normalisation;
pub mod subtraction;
pub mod thickness;
pub mod transmission;

pub use beam::{
    BEAM_CENTER_X_LOG, BEAM_CENTER_Y_LOG, BEAM_WIDTH_X_LOG, apply_direct_beam,
    move_to_beam_centre,
};
pub use flat_field::{apply_flat_field, rescale_flux};
pub use geometry::{SolidAngleMethod, apply_parallax, apply_solid_angle};
pub use masks::apply_masks;
pub use normalisation::{apply_dead_time, apply_normalisation};
pub use subtraction::{apply_container, apply_dark_current, apply_solvent};
pub use thickness::apply_thickness;
pub use transmission::apply_transmission;
