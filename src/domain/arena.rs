use super::math::is_point_in_rect;

/// Fixed rectangular play area shared read-only by every system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    /// Width in world units.
    pub width: f32,

    /// Height in world units.
    pub height: f32,

    /// Inset from each edge that approximates the robot body radius.
    pub wall_margin: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            wall_margin: 2.0,
        }
    }
}

impl Arena {
    /// True if the point lies inside `[margin, width - margin] x [margin, height - margin]`.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let m = self.wall_margin;
        is_point_in_rect(x, y, m, m, self.width - 2.0 * m, self.height - 2.0 * m)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}
