//! Scattering geometry with the sample at the origin and the beam along +z.

/// Scattering angle 2θ of a pixel [rad].
pub fn two_theta(position: [f64; 3]) -> f64 {
    position[0].hypot(position[1]).atan2(position[2])
}

/// Signed 2θ projected on the horizontal plane [rad].
pub fn signed_in_plane_two_theta(position: [f64; 3]) -> f64 {
    position[0].atan2(position[2])
}

/// Horizontal angle between the pixel and the normal of a panel rotated by `offset` [rad].
pub fn in_plane_angle(position: [f64; 3], offset: f64) -> f64 {
    (signed_in_plane_two_theta(position) - offset).abs()
}

/// Small-pixel solid angle of a flat pixel facing the sample along z [sr].
pub fn rectangle_solid_angle(position: [f64; 3], width: f64, height: f64) -> f64 {
    let r2 = position[0] * position[0] + position[1] * position[1] + position[2] * position[2];
    if r2 == 0.0 {
        return 0.0;
    }
    width * height * position[2].abs() / (r2 * r2.sqrt())
}

/// Exact solid angle of a rectangular pixel in a plane perpendicular to the beam [sr].
pub fn exact_pixel_solid_angle(position: [f64; 3], width: f64, height: f64) -> f64 {
    let z = position[2].abs();
    if z == 0.0 {
        return 0.0;
    }
    let x1 = position[0] - 0.5 * width;
    let x2 = position[0] + 0.5 * width;
    let y1 = position[1] - 0.5 * height;
    let y2 = position[1] + 0.5 * height;
    let corner = |x: f64, y: f64| (x * y / (z * (x * x + y * y + z * z).sqrt())).atan();
    corner(x2, y2) - corner(x1, y2) - corner(x2, y1) + corner(x1, y1)
}
