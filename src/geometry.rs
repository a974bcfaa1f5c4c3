// SPDX-License-Identifier: GPL-3.0-only

//! Plain geometry types shared by the scroller, the coordinator and the host.
//!
//! All values are logical points in `f64`. Rectangles use a top-left origin
//! with `y` growing downwards, which is the convention of every host the
//! handler targets.

use serde::{Deserialize, Serialize};

/// A location or offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The origin `(0, 0)`.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width and height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }

    #[must_use]
    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    #[must_use]
    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    #[must_use]
    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    #[must_use]
    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.size.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.size.height
    }

    /// Returns `true` if `other` lies entirely inside `self` (edges included).
    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min_x() >= self.min_x()
            && other.min_y() >= self.min_y()
            && other.max_x() <= self.max_x()
            && other.max_y() <= self.max_y()
    }

    /// Returns `true` if `point` lies inside `self`.
    ///
    /// The far edges are exclusive so adjacent rectangles never both claim a point.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }

    /// Returns the overlapping area of two rectangles, or `None` if they do not overlap.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let min_x = self.min_x().max(other.min_x());
        let min_y = self.min_y().max(other.min_y());
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());

        if max_x <= min_x || max_y <= min_y {
            return None;
        }

        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Returns the rectangle with both axes swapped.
    ///
    /// Used to turn a frame reported in a fixed portrait reference frame into
    /// the current landscape interface frame.
    #[must_use]
    pub fn transposed(&self) -> Rect {
        Rect::new(self.origin.y, self.origin.x, self.size.height, self.size.width)
    }

    /// Returns the rectangle moved by `dx`, `dy`.
    #[must_use]
    pub fn offset_by(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.origin.x + dx, self.origin.y + dy, self.size.width, self.size.height)
    }

    /// Returns the rectangle shrunk by `insets` on each edge.
    #[must_use]
    pub fn inset_by(&self, insets: &EdgeInsets) -> Rect {
        Rect::new(
            self.origin.x + insets.left,
            self.origin.y + insets.top,
            self.size.width - insets.left - insets.right,
            self.size.height - insets.top - insets.bottom,
        )
    }
}

/// Per-edge insets of a scrollable viewport's content area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgeInsets {
    /// No insets.
    pub const ZERO: EdgeInsets = EdgeInsets {
        top: 0.0,
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
    };

    #[must_use]
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_rect_includes_edges() {
        let outer = Rect::new(0.0, 0.0, 300.0, 500.0);

        assert!(outer.contains_rect(&Rect::new(0.0, 0.0, 300.0, 500.0)));
        assert!(outer.contains_rect(&Rect::new(10.0, 420.0, 100.0, 80.0)));
        assert!(!outer.contains_rect(&Rect::new(0.0, 450.0, 100.0, 80.0)));
        assert!(!outer.contains_rect(&Rect::new(-1.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_intersection_of_overlapping_and_disjoint_rects() {
        let viewport = Rect::new(0.0, 64.0, 320.0, 504.0);
        let keyboard = Rect::new(0.0, 352.0, 320.0, 216.0);

        let overlap = viewport.intersection(&keyboard).unwrap();
        assert_eq!(overlap, Rect::new(0.0, 352.0, 320.0, 216.0));

        let above = Rect::new(0.0, 0.0, 320.0, 64.0);
        assert_eq!(above.intersection(&keyboard), None);

        // Touching edges do not overlap
        let touching = Rect::new(0.0, 136.0, 320.0, 216.0);
        assert_eq!(touching.intersection(&keyboard), None);
    }

    #[test]
    fn test_transposed_swaps_axes() {
        let frame = Rect::new(0.0, 1024.0, 352.0, 768.0);
        assert_eq!(frame.transposed(), Rect::new(1024.0, 0.0, 768.0, 352.0));
        assert_eq!(frame.transposed().transposed(), frame);
    }

    #[test]
    fn test_inset_by() {
        let bounds = Rect::new(0.0, 0.0, 300.0, 500.0);
        let insets = EdgeInsets::new(10.0, 5.0, 200.0, 5.0);

        assert_eq!(bounds.inset_by(&insets), Rect::new(5.0, 10.0, 290.0, 290.0));
    }

    #[test]
    fn test_contains_point_far_edge_exclusive() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains_point(Point::new(0.0, 0.0)));
        assert!(rect.contains_point(Point::new(9.9, 9.9)));
        assert!(!rect.contains_point(Point::new(10.0, 5.0)));
    }
}
