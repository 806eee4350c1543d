//! Placement rectangles
//!
//! Coordinates are in points relative to the top-left corner of the page box,
//! with `y` growing downward. Backends convert to and from PDF user space.

use serde::Serialize;

/// An axis-aligned rectangle given by two corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "[f64; 4]")]
pub struct Rect {
    /// Left edge
    pub x0: f64,
    /// Top edge
    pub y0: f64,
    /// Right edge
    pub x1: f64,
    /// Bottom edge
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Create a rectangle from its top-left corner and size
    pub fn from_position_and_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Largest rectangle with the aspect ratio `width:height` that fits
    /// inside `self`, centred.
    pub fn fit(&self, width: f64, height: f64) -> Rect {
        if width <= 0.0 || height <= 0.0 || self.is_empty() {
            return *self;
        }
        let scale = (self.width() / width).min(self.height() / height);
        let w = width * scale;
        let h = height * scale;
        let x = self.x0 + (self.width() - w) / 2.0;
        let y = self.y0 + (self.height() - h) / 2.0;
        Rect::from_position_and_size(x, y, w, h)
    }
}

impl From<Rect> for [f64; 4] {
    fn from(rect: Rect) -> Self {
        [rect.x0, rect.y0, rect.x1, rect.y1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_normalizes_corners() {
        let rect = Rect::new(110.0, 120.0, 10.0, 20.0);
        assert_eq!(rect.x0, 10.0);
        assert_eq!(rect.y0, 20.0);
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 100.0);
    }

    #[test]
    fn test_rect_from_position_and_size() {
        let rect = Rect::from_position_and_size(50.0, 50.0, 100.0, 100.0);
        assert_eq!(rect, Rect::new(50.0, 50.0, 150.0, 150.0));
        assert!(!rect.is_empty());
        assert!(Rect::from_position_and_size(0.0, 0.0, 0.0, 10.0).is_empty());
    }

    #[test]
    fn test_fit_wide_image_into_square() {
        let rect = Rect::from_position_and_size(0.0, 0.0, 100.0, 100.0);
        let fitted = rect.fit(200.0, 100.0);
        assert_eq!(fitted.width(), 100.0);
        assert_eq!(fitted.height(), 50.0);
        assert_eq!(fitted.y0, 25.0);
    }

    #[test]
    fn test_fit_tall_image_into_wide_rect() {
        let rect = Rect::from_position_and_size(10.0, 10.0, 200.0, 100.0);
        let fitted = rect.fit(1.0, 2.0);
        assert_eq!(fitted.height(), 100.0);
        assert_eq!(fitted.width(), 50.0);
        assert_eq!(fitted.x0, 85.0);
        assert_eq!(fitted.y0, 10.0);
    }

    #[test]
    fn test_serializes_as_array() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_value(rect).unwrap();
        assert_eq!(json, serde_json::json!([1.0, 2.0, 3.0, 4.0]));
    }
}
