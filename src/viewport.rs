//! Logical viewport geometry.
//!
//! The simulation runs entirely in logical (device-independent) units. The
//! surface is responsible for scaling to physical pixels.

use glam::Vec2;

/// Width and height of the drawable area in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Build a logical viewport from a physical size and a scale factor.
    ///
    /// A non-positive scale factor is treated as 1.0.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self {
            width: (width as f64 / scale) as f32,
            height: (height as f64 / scale) as f32,
        }
    }

    /// Area in square logical units. Negative extents count as empty.
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.area() <= 0.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_physical_divides_by_scale() {
        let v = Viewport::from_physical(1600, 1200, 2.0);
        assert_eq!(v, Viewport::new(800.0, 600.0));

        let v = Viewport::from_physical(640, 480, 0.0);
        assert_eq!(v, Viewport::new(640.0, 480.0));
    }

    #[test]
    fn test_empty_viewport() {
        assert!(Viewport::new(0.0, 600.0).is_empty());
        assert!(Viewport::new(-5.0, 10.0).is_empty());
        assert!(!Viewport::new(1.0, 1.0).is_empty());
        assert_eq!(Viewport::new(800.0, 600.0).center(), Vec2::new(400.0, 300.0));
    }
}
