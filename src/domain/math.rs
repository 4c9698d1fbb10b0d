// Plane geometry helpers shared by the movement, projectile and collision systems.

pub fn degree_to_radian(angle: f32) -> f32 {
    angle * (std::f32::consts::PI / 180.0)
}

pub fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
}

/// Inclusive containment test for an axis-aligned rectangle anchored at its top-left corner.
pub fn is_point_in_rect(x: f32, y: f32, left: f32, top: f32, width: f32, height: f32) -> bool {
    x >= left && x <= left + width && y >= top && y <= top + height
}

/// Unit vector for a heading in degrees (0 = +X, angles grow towards +Y).
pub fn heading(direction: f32) -> (f32, f32) {
    let rad = degree_to_radian(direction);
    (rad.cos(), rad.sin())
}
