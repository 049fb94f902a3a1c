use serde::{Deserialize, Serialize};

use crate::layout::units::mm_to_dots;

/// The physical surface a template is compiled against: label size in
/// millimetres, print resolution, and an optional origin offset applied to
/// every emitted field position.
///
/// A target is required for every compile call; the same template compiles
/// against any number of targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderTarget {
    /// Label width in millimetres.
    pub width_mm: f64,
    /// Label height in millimetres.
    pub height_mm: f64,
    /// Print resolution in dots per inch (typically 203, 300, or 600).
    pub dpi: u32,
    /// Horizontal origin offset in millimetres, added to every field origin.
    #[serde(default)]
    pub origin_x_mm: f64,
    /// Vertical origin offset in millimetres, added to every field origin.
    #[serde(default)]
    pub origin_y_mm: f64,
}

impl RenderTarget {
    /// Create a target with a zero origin offset.
    pub fn new(width_mm: f64, height_mm: f64, dpi: u32) -> Self {
        Self {
            width_mm,
            height_mm,
            dpi,
            origin_x_mm: 0.0,
            origin_y_mm: 0.0,
        }
    }

    /// Set the origin offset (builder pattern).
    #[must_use]
    pub fn with_origin(mut self, origin_x_mm: f64, origin_y_mm: f64) -> Self {
        self.origin_x_mm = origin_x_mm;
        self.origin_y_mm = origin_y_mm;
        self
    }

    /// Label width in dots.
    pub fn width_dots(&self) -> i32 {
        mm_to_dots(self.width_mm, self.dpi)
    }

    /// Label height in dots.
    pub fn height_dots(&self) -> i32 {
        mm_to_dots(self.height_mm, self.dpi)
    }

    /// Origin offset in dots, as `(x, y)`.
    pub fn origin_dots(&self) -> (i32, i32) {
        (
            mm_to_dots(self.origin_x_mm, self.dpi),
            mm_to_dots(self.origin_y_mm, self.dpi),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_dots_at_203dpi() {
        let t = RenderTarget::new(74.0, 26.0, 203);
        // 74mm * 203 / 25.4 = 591.4 → 591; 26mm * 203 / 25.4 = 207.8 → 208
        assert_eq!(t.width_dots(), 591);
        assert_eq!(t.height_dots(), 208);
        assert_eq!(t.origin_dots(), (0, 0));
    }

    #[test]
    fn target_origin_offset() {
        let t = RenderTarget::new(50.0, 30.0, 203).with_origin(2.0, 1.0);
        // 2mm → 16 dots, 1mm → 8 dots
        assert_eq!(t.origin_dots(), (16, 8));
    }
}
