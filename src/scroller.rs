// SPDX-License-Identifier: GPL-3.0-only

//! Scroll-into-view geometry for a scrollable viewport.
//!
//! This module computes the smallest content offset change that brings a
//! rectangle fully into the visible part of a viewport, and detects when the
//! host's native "scroll rect to visible" primitive cannot be trusted.
//!
//! # Visible Window
//!
//! The visible window is the viewport bounds shrunk by the content insets and
//! positioned at the current content offset, in content coordinates:
//!
//! ```text
//! +---------------------------+  <- content offset
//! |        inset.top          |
//! |   +-------------------+   |
//! |   |  visible window   |   |
//! |   +-------------------+   |
//! |       inset.bottom        |  <- keyboard occludes this band
//! +---------------------------+
//! ```
//!
//! # Native Primitive Fallback
//!
//! Native scroll-to-rect primitives misbehave while the content is smaller
//! than the viewport bounds. In that regime callers assign the offset
//! computed by [`compute_offset_to_reveal`] directly.

use serde::{Deserialize, Serialize};

use crate::geometry::{EdgeInsets, Point, Rect, Size};
use crate::host::{Host, ViewId};

/// Scroll state of a viewport, read from the host at call time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportGeometry {
    /// Size of the viewport's bounds.
    pub bounds: Size,
    pub content_inset: EdgeInsets,
    pub content_size: Size,
    pub content_offset: Point,
}

impl ViewportGeometry {
    /// Returns the visible window in content coordinates.
    #[must_use]
    pub fn visible_window(&self) -> Rect {
        Rect::new(
            self.content_offset.x,
            self.content_offset.y,
            self.bounds.width,
            self.bounds.height,
        )
        .inset_by(&self.content_inset)
    }
}

/// What [`scroll_to_reveal`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollOutcome {
    /// The viewport is gone or the rectangle was already visible.
    Unchanged,
    /// The offset was assigned directly.
    Manual(Point),
    /// The request was delegated to the host's native primitive.
    Native,
}

/// Per-axis result of [`unreliable_axes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnreliableAxes {
    pub horizontal: bool,
    pub vertical: bool,
}

/// Reports, per axis, whether the content is smaller than the bounds.
#[must_use]
pub fn unreliable_axes(viewport: &ViewportGeometry) -> UnreliableAxes {
    UnreliableAxes {
        horizontal: viewport.content_size.width < viewport.bounds.width,
        vertical: viewport.content_size.height < viewport.bounds.height,
    }
}

/// Returns `true` if the native scroll-to-rect primitive is unreliable for
/// this viewport, i.e. the content is smaller than the bounds on either axis.
#[must_use]
pub fn is_native_scroll_unreliable(viewport: &ViewportGeometry) -> bool {
    let axes = unreliable_axes(viewport);
    axes.horizontal || axes.vertical
}

/// Computes the content offset that brings `rect` fully into view.
///
/// Returns the current offset unchanged if `rect` is already inside the
/// visible window. Otherwise each axis is resolved independently:
///
/// 1. `rect` larger than the window: center it.
/// 2. far edge past the window: shift forward by the overflow.
/// 3. near edge before the window: shift backward by the deficit.
/// 4. otherwise: leave the axis alone.
///
/// The result is clamped to the scrollable range of each axis.
#[must_use]
pub fn compute_offset_to_reveal(viewport: &ViewportGeometry, rect: Rect) -> Point {
    let window = viewport.visible_window();

    if window.contains_rect(&rect) {
        return viewport.content_offset;
    }

    let x = reveal_on_axis(
        viewport.content_offset.x,
        window.min_x(),
        window.width(),
        rect.min_x(),
        rect.width(),
    );
    let y = reveal_on_axis(
        viewport.content_offset.y,
        window.min_y(),
        window.height(),
        rect.min_y(),
        rect.height(),
    );

    Point::new(
        clamp_to_content(x, viewport.content_size.width, window.width()),
        clamp_to_content(y, viewport.content_size.height, window.height()),
    )
}

fn reveal_on_axis(
    offset: f64,
    window_min: f64,
    window_extent: f64,
    rect_min: f64,
    rect_extent: f64,
) -> f64 {
    let window_max = window_min + window_extent;
    let rect_max = rect_min + rect_extent;

    if rect_extent > window_extent {
        offset - (window_min - rect_min - (rect_extent - window_extent) / 2.0)
    } else if rect_max > window_max {
        offset + (rect_max - window_max)
    } else if rect_min < window_min {
        offset - (window_min - rect_min)
    } else {
        offset
    }
}

// Content that exactly fills the window has no scroll range of its own; only
// the lower bound applies there so a control hanging past the content end can
// still be brought into view. Revealing past the content end is limited to
// that exact fit: any larger content clamps to `content - window`, so the
// result is not continuous at the exact-fit extent.
fn clamp_to_content(offset: f64, content_extent: f64, window_extent: f64) -> f64 {
    if content_extent < window_extent {
        return 0.0;
    }

    let max = content_extent - window_extent;
    if max > 0.0 {
        offset.clamp(0.0, max)
    } else {
        offset.max(0.0)
    }
}

/// Scrolls `viewport` so that `rect` (in content coordinates) is visible.
///
/// When `force_manual` is set or the native primitive is unreliable for the
/// current geometry, the offset from [`compute_offset_to_reveal`] is assigned
/// directly. Otherwise the request goes to the host's native primitive.
pub fn scroll_to_reveal(
    host: &mut dyn Host,
    viewport: ViewId,
    rect: Rect,
    animated: bool,
    force_manual: bool,
) -> ScrollOutcome {
    let Some(geometry) = host.viewport_geometry(viewport) else {
        tracing::debug!("Viewport {:?} is gone; nothing to scroll", viewport);
        return ScrollOutcome::Unchanged;
    };

    if force_manual || is_native_scroll_unreliable(&geometry) {
        let offset = compute_offset_to_reveal(&geometry, rect);
        if offset == geometry.content_offset {
            return ScrollOutcome::Unchanged;
        }
        tracing::trace!("Assigning offset {:?} to reveal {:?}", offset, rect);
        host.set_content_offset(viewport, offset, animated);
        ScrollOutcome::Manual(offset)
    } else {
        host.scroll_rect_to_visible(viewport, rect, animated);
        ScrollOutcome::Native
    }
}

// ============================================================================
// Tests
// ============================================================================
