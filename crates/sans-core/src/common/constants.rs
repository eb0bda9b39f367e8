//! Instrument tables and tolerances shared by the ILL SANS reductions.

/// Run number standing in for a sample measurement that is missing from a batch.
pub const EMPTY_TOKEN: &str = "000000";

/// Largest accepted sample-detector distance difference between combined runs [m].
pub const DISTANCE_TOLERANCE: f64 = 0.01;

/// Largest accepted wavelength difference between combined runs [Angstrom].
pub const WAVELENGTH_TOLERANCE: f64 = 0.01;

/// Instruments whose dead time is corrected panel-wise.
pub const PANEL_GROUPED_DEAD_TIME: [&str; 2] = ["D33", "D11B"];

/// Instruments whose solid angle is computed from the exact pixel shape.
pub const GENERIC_SHAPE_SOLID_ANGLE: [&str; 1] = ["D22B"];

/// Detector ids of the normalisation monitor and the duration monitor.
pub fn monitor_ids(instrument: &str) -> [i64; 2] {
    match instrument {
        "D33" | "D16" => [500000, 500001],
        _ => [100000, 100001],
    }
}
