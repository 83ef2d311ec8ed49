//! Geometry
//!
//! Rectangles and points shared by the scene graph and the DOM projection.

/// 2D point
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `other` to `self`
    pub fn offset_from(&self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Axis-aligned rectangle
///
/// Width and height may be negative when a transform flipped the
/// rectangle; [`Rect::normalized`] folds that back into a positive extent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create with dimensions
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanning two corners, in the order given
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::from_xywh(a.x, a.y, b.x - a.x, b.y - a.y)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Same area with non-negative width and height
    pub fn normalized(&self) -> Rect {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Rect::from_xywh(x, y, width, height)
    }

    /// Move by the given offset
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::from_xywh(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Scale every component independently per axis
    pub fn scale(&self, sx: f64, sy: f64) -> Rect {
        Rect::from_xywh(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    /// Check if point is inside
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Check if `other` lies entirely inside
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
        assert_eq!(rect.right(), 110.0);
        assert_eq!(rect.bottom(), 70.0);
        assert!(rect.contains_point(50.0, 50.0));
        assert!(!rect.contains_point(150.0, 50.0));
    }

    #[test]
    fn test_normalize_flipped() {
        let flipped = Rect::from_xywh(110.0, 70.0, -100.0, -50.0);
        let rect = flipped.normalized();
        assert_eq!(rect, Rect::from_xywh(10.0, 20.0, 100.0, 50.0));

        let half = Rect::from_xywh(0.0, 10.0, 5.0, -10.0).normalized();
        assert_eq!(half, Rect::from_xywh(0.0, 0.0, 5.0, 10.0));
    }

    #[test]
    fn test_contains_rect() {
        let outer = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(&Rect::from_xywh(10.0, 10.0, 20.0, 20.0)));
        assert!(!outer.contains_rect(&Rect::from_xywh(90.0, 90.0, 20.0, 20.0)));
    }
}
