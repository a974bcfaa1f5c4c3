// SPDX-License-Identifier: GPL-3.0-only

//! The host UI toolkit as seen by the handler.
//!
//! The handler never holds views or screens directly. It keeps [`ViewId`] and
//! [`ScreenId`] handles and resolves them through a [`Host`] on every call, so
//! a view that has gone away simply answers `None` and the operation degrades
//! to a no-op.
//!
//! # Animations
//!
//! Animated changes are bracketed by [`Host::begin_animation`] and
//! [`Host::commit_animation`]. Every mutation issued in between is animated
//! with the given curve and duration. The token returned by `commit_animation`
//! must later be reported back through
//! [`animation_completed`](crate::KeyboardScrollHandler::animation_completed)
//! once the animation has finished; that is where the handler runs its
//! continuation.

use serde::{Deserialize, Serialize};

use crate::events::Animation;
use crate::geometry::{EdgeInsets, Point, Rect};
use crate::scroller::ViewportGeometry;

/// Non-owning handle to a view in the host hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub u64);

/// Non-owning handle to a screen (a view controller in most toolkits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScreenId(pub u64);

/// Identifies one committed animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationToken(pub u64);

/// The input control kinds the router understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Single-line text field.
    TextField,
    /// Multi-line text view.
    TextView,
    /// Search field.
    SearchField,
}

impl ControlKind {
    /// Returns a human-readable name for the control kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::TextField => "TextField",
            ControlKind::TextView => "TextView",
            ControlKind::SearchField => "SearchField",
        }
    }
}

/// The deepest view found under a tap location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitTarget {
    pub view: ViewId,
    /// The view is a button or another button-like control.
    pub is_button: bool,
    /// The view could become the focused input control.
    pub can_become_focused: bool,
}

/// Where a screen currently sits in the host's presentation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenPresentation {
    /// The screen is hosted by a navigation container.
    pub in_navigation_container: bool,
    /// The screen is the top of its navigation container.
    pub is_top_of_navigation: bool,
    /// The screen is the modal currently presented over its container.
    pub is_presented_modal: bool,
    /// The screen's view is attached to an active window.
    pub attached_to_window: bool,
}

/// Interface orientation of the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl Orientation {
    #[must_use]
    pub fn is_landscape(&self) -> bool {
        matches!(self, Orientation::LandscapeLeft | Orientation::LandscapeRight)
    }
}

/// View-hierarchy, scrolling, editing and animation primitives of the host.
pub trait Host {
    // ------------------------------------------------------------------------
    // View hierarchy
    // ------------------------------------------------------------------------

    /// Direct children of `view`, in z-order (back to front).
    fn subviews(&self, view: ViewId) -> Vec<ViewId>;

    /// The input control kind of `view`, if it is one.
    fn control_kind(&self, view: ViewId) -> Option<ControlKind>;

    /// Routes the lifecycle callbacks of the control `view` to the handler.
    fn attach_field_delegate(&mut self, view: ViewId, kind: ControlKind);

    /// Returns `true` if `view` is `ancestor` or lies below it.
    fn is_descendant(&self, view: ViewId, ancestor: ViewId) -> bool;

    /// Frame of `view` converted into the coordinate space of `container`.
    ///
    /// For a scrollable container this is its content coordinate space.
    fn frame_in(&self, view: ViewId, container: ViewId) -> Option<Rect>;

    /// Frame of `view` in absolute window coordinates.
    fn frame_on_screen(&self, view: ViewId) -> Option<Rect>;

    /// Deepest interactive view of `view`'s subtree under `location`, given in
    /// `view`'s coordinate space.
    fn hit_test(&self, view: ViewId, location: Point) -> Option<HitTarget>;

    // ------------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------------

    fn viewport_geometry(&self, viewport: ViewId) -> Option<ViewportGeometry>;

    fn set_content_inset(&mut self, viewport: ViewId, inset: EdgeInsets);

    fn set_content_offset(&mut self, viewport: ViewId, offset: Point, animated: bool);

    /// The host's native "scroll rect to visible" primitive.
    fn scroll_rect_to_visible(&mut self, viewport: ViewId, rect: Rect, animated: bool);

    // ------------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------------

    /// Ends editing of any focused control inside `view`. Returns `true` on success.
    fn end_editing(&mut self, view: ViewId) -> bool;

    /// Asks the control `view` to give up focus. Returns `true` on success.
    fn resign_focus(&mut self, view: ViewId) -> bool;

    // ------------------------------------------------------------------------
    // Screens
    // ------------------------------------------------------------------------

    /// Root view of `screen`.
    fn screen_view(&self, screen: ScreenId) -> Option<ViewId>;

    /// The scroll view a screen exposes as its main content, if any.
    fn primary_scroll_view(&self, screen: ScreenId) -> Option<ViewId>;

    fn screen_presentation(&self, screen: ScreenId) -> Option<ScreenPresentation>;

    fn interface_orientation(&self) -> Orientation;

    // ------------------------------------------------------------------------
    // Animation
    // ------------------------------------------------------------------------

    fn begin_animation(&mut self, animation: Animation);

    fn commit_animation(&mut self) -> AnimationToken;
}
