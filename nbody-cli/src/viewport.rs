use eframe::egui::{pos2, Pos2};
use glam::DVec3;

/// Maps simulation coordinates onto the screen.
///
/// The x-y plane is drawn top-down with y pointing up; z is ignored.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    /// Pixels per simulation length unit
    pub scale: f32,
    /// Screen position of the simulation origin
    pub origin: Pos2,
}

impl Viewport {
    pub fn new(scale: f32, origin: Pos2) -> Self {
        Self { scale, origin }
    }

    pub fn to_screen(&self, p: DVec3) -> Pos2 {
        pos2(
            self.origin.x + p.x as f32 * self.scale,
            self.origin.y - p.y as f32 * self.scale,
        )
    }

    /// Multiply the scale, clamped to a usable range
    pub fn zoom(&mut self, factor: f32) {
        self.scale = (self.scale * factor).clamp(1.0, 10_000.0);
    }
}

/// Circle radius in pixels for a body of the given mass
pub fn body_radius(mass: f64) -> f32 {
    // Log scale so planets stay visible next to a star
    (11.0 + mass.log10() as f32 * 1.2).clamp(2.0, 14.0)
}
