// SPDX-License-Identifier: GPL-3.0-only

//! An in-memory [`Host`] for tests and the scenario player.
//!
//! [`SimulatedHost`] keeps a small view tree with frames, scroll state,
//! controls and screens. Animations never run on their own: committed
//! animations queue up until [`SimulatedHost::settle`] (or
//! [`SimulatedHost::finish_next_animation`]) reports them complete to a
//! handler, which lets tests observe the state between an inset change and
//! the scroll that follows it.
//!
//! Every mutation the handler issues is recorded so tests can assert on call
//! order and counts.

use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::coordinator::KeyboardScrollHandler;
use crate::events::Animation;
use crate::geometry::{EdgeInsets, Point, Rect, Size};
use crate::host::{
    AnimationToken, ControlKind, HitTarget, Host, Orientation, ScreenId, ScreenPresentation, ViewId,
};
use crate::scroller::{self, ViewportGeometry};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrollState {
    content_size: Size,
    content_inset: EdgeInsets,
    content_offset: Point,
}

#[derive(Debug, Clone)]
struct SimView {
    parent: Option<ViewId>,
    children: Vec<ViewId>,
    /// Frame in the parent's coordinate space (content space for scroll views).
    frame: Rect,
    control: Option<ControlKind>,
    is_button: bool,
    scroll: Option<ScrollState>,
}

impl SimView {
    fn content_offset(&self) -> Point {
        self.scroll.map_or(Point::ZERO, |scroll| scroll.content_offset)
    }

    /// The view's own coordinate space.
    fn bounds(&self) -> Rect {
        let offset = self.content_offset();
        Rect::new(offset.x, offset.y, self.frame.width(), self.frame.height())
    }
}

#[derive(Debug, Clone, Copy)]
struct SimScreen {
    view: ViewId,
    presentation: ScreenPresentation,
    primary_scroll_view: Option<ViewId>,
}

/// One recorded content inset change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsetChange {
    pub viewport: ViewId,
    pub inset: EdgeInsets,
    /// The animation block the change was issued in, if any.
    pub animation: Option<Animation>,
}

/// One recorded content offset change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetChange {
    pub viewport: ViewId,
    pub offset: Point,
    pub animated: bool,
    /// `true` if the change came from the native scroll-to-rect primitive.
    pub native: bool,
}

/// In-memory host toolkit.
#[derive(Debug, Default)]
pub struct SimulatedHost {
    views: BTreeMap<ViewId, SimView>,
    screens: BTreeMap<ScreenId, SimScreen>,
    next_view: u64,
    next_screen: u64,
    orientation: Orientation,

    first_responder: Option<ViewId>,
    refuses_resign: HashSet<ViewId>,

    open_animations: Vec<Animation>,
    next_token: u64,
    running: VecDeque<AnimationToken>,

    inset_changes: Vec<InsetChange>,
    offset_changes: Vec<OffsetChange>,
    attached: Vec<(ViewId, ControlKind)>,
    end_editing_calls: Vec<ViewId>,
    resign_calls: Vec<ViewId>,
}

impl SimulatedHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Building the tree
    // ------------------------------------------------------------------------

    fn insert(&mut self, parent: Option<ViewId>, view: SimView) -> ViewId {
        self.next_view += 1;
        let id = ViewId(self.next_view);
        if let Some(parent) = parent.and_then(|parent| self.views.get_mut(&parent)) {
            parent.children.push(id);
        }
        self.views.insert(id, view);
        id
    }

    fn plain(parent: Option<ViewId>, frame: Rect) -> SimView {
        SimView {
            parent,
            children: Vec::new(),
            frame,
            control: None,
            is_button: false,
            scroll: None,
        }
    }

    /// Adds a window-level root view. Its frame is in window coordinates.
    pub fn add_root(&mut self, frame: Rect) -> ViewId {
        self.insert(None, Self::plain(None, frame))
    }

    /// Adds a plain container view.
    pub fn add_view(&mut self, parent: ViewId, frame: Rect) -> ViewId {
        self.insert(Some(parent), Self::plain(Some(parent), frame))
    }

    /// Adds a scrollable viewport with no insets and a zero offset.
    pub fn add_scroll_view(&mut self, parent: ViewId, frame: Rect, content_size: Size) -> ViewId {
        let mut view = Self::plain(Some(parent), frame);
        view.scroll = Some(ScrollState {
            content_size,
            content_inset: EdgeInsets::ZERO,
            content_offset: Point::ZERO,
        });
        self.insert(Some(parent), view)
    }

    /// Adds an input control.
    pub fn add_control(&mut self, parent: ViewId, frame: Rect, kind: ControlKind) -> ViewId {
        let mut view = Self::plain(Some(parent), frame);
        view.control = Some(kind);
        self.insert(Some(parent), view)
    }

    /// Adds a button.
    pub fn add_button(&mut self, parent: ViewId, frame: Rect) -> ViewId {
        let mut view = Self::plain(Some(parent), frame);
        view.is_button = true;
        self.insert(Some(parent), view)
    }

    /// Adds a screen whose root view is `view`.
    pub fn add_screen(&mut self, view: ViewId, presentation: ScreenPresentation) -> ScreenId {
        self.next_screen += 1;
        let id = ScreenId(self.next_screen);
        self.screens.insert(
            id,
            SimScreen {
                view,
                presentation,
                primary_scroll_view: None,
            },
        );
        id
    }

    pub fn set_presentation(&mut self, screen: ScreenId, presentation: ScreenPresentation) {
        if let Some(screen) = self.screens.get_mut(&screen) {
            screen.presentation = presentation;
        }
    }

    pub fn set_primary_scroll_view(&mut self, screen: ScreenId, viewport: ViewId) {
        if let Some(screen) = self.screens.get_mut(&screen) {
            screen.primary_scroll_view = Some(viewport);
        }
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Removes `view` and its subtree.
    pub fn remove_view(&mut self, view: ViewId) {
        let Some(removed) = self.views.remove(&view) else {
            return;
        };
        if let Some(parent) = removed.parent.and_then(|parent| self.views.get_mut(&parent)) {
            parent.children.retain(|child| *child != view);
        }
        if self.first_responder == Some(view) {
            self.first_responder = None;
        }
        for child in removed.children {
            self.remove_view(child);
        }
    }

    // ------------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------------

    /// Makes `view` the first responder.
    pub fn focus(&mut self, view: ViewId) {
        self.first_responder = Some(view);
    }

    pub fn first_responder(&self) -> Option<ViewId> {
        self.first_responder
    }

    /// Makes `view` refuse (or stop refusing) to give up focus.
    pub fn set_refuses_resign(&mut self, view: ViewId, refuses: bool) {
        if refuses {
            self.refuses_resign.insert(view);
        } else {
            self.refuses_resign.remove(&view);
        }
    }

    // ------------------------------------------------------------------------
    // Scroll state
    // ------------------------------------------------------------------------

    pub fn content_inset(&self, viewport: ViewId) -> EdgeInsets {
        self.scroll_state(viewport)
            .map_or(EdgeInsets::ZERO, |scroll| scroll.content_inset)
    }

    pub fn content_offset(&self, viewport: ViewId) -> Point {
        self.scroll_state(viewport)
            .map_or(Point::ZERO, |scroll| scroll.content_offset)
    }

    /// Sets the offset without recording a change.
    pub fn set_content_offset_now(&mut self, viewport: ViewId, offset: Point) {
        if let Some(scroll) = self.scroll_state_mut(viewport) {
            scroll.content_offset = offset;
        }
    }

    fn scroll_state(&self, viewport: ViewId) -> Option<&ScrollState> {
        self.views.get(&viewport)?.scroll.as_ref()
    }

    fn scroll_state_mut(&mut self, viewport: ViewId) -> Option<&mut ScrollState> {
        self.views.get_mut(&viewport)?.scroll.as_mut()
    }

    // ------------------------------------------------------------------------
    // Recorded calls
    // ------------------------------------------------------------------------

    pub fn inset_changes(&self) -> &[InsetChange] {
        &self.inset_changes
    }

    pub fn inset_change_count(&self, viewport: ViewId) -> usize {
        self.inset_changes
            .iter()
            .filter(|change| change.viewport == viewport)
            .count()
    }

    /// Animation of the most recent inset change on `viewport`.
    pub fn last_inset_animation(&self, viewport: ViewId) -> Option<Animation> {
        self.inset_changes
            .iter()
            .rev()
            .find(|change| change.viewport == viewport)
            .and_then(|change| change.animation)
    }

    pub fn offset_changes(&self) -> &[OffsetChange] {
        &self.offset_changes
    }

    pub fn native_scroll_count(&self, viewport: ViewId) -> usize {
        self.offset_changes
            .iter()
            .filter(|change| change.viewport == viewport && change.native)
            .count()
    }

    /// Controls the handler attached itself to, in attachment order.
    pub fn attached_delegates(&self) -> Vec<(ViewId, ControlKind)> {
        self.attached.clone()
    }

    pub fn end_editing_calls(&self) -> Vec<ViewId> {
        self.end_editing_calls.clone()
    }

    pub fn resign_calls(&self) -> Vec<ViewId> {
        self.resign_calls.clone()
    }

    // ------------------------------------------------------------------------
    // Animations
    // ------------------------------------------------------------------------

    /// Number of committed animations that have not been reported complete.
    pub fn running_animation_count(&self) -> usize {
        self.running.len()
    }

    /// Completes the oldest running animation. Returns `false` if none was running.
    pub fn finish_next_animation(&mut self, handler: &mut KeyboardScrollHandler) -> bool {
        let Some(token) = self.running.pop_front() else {
            return false;
        };
        handler.animation_completed(self, token);
        true
    }

    /// Completes every running animation, including ones started by the
    /// continuations themselves. Returns the number completed.
    pub fn settle(&mut self, handler: &mut KeyboardScrollHandler) -> usize {
        let mut completed = 0;
        while self.finish_next_animation(handler) {
            completed += 1;
        }
        completed
    }

    fn record_offset(&mut self, viewport: ViewId, offset: Point, animated: bool, native: bool) {
        if let Some(scroll) = self.scroll_state_mut(viewport) {
            scroll.content_offset = offset;
            self.offset_changes.push(OffsetChange {
                viewport,
                offset,
                animated,
                native,
            });
        }
    }

    fn hit_test_in(&self, view: ViewId, location: Point) -> Option<HitTarget> {
        let node = self.views.get(&view)?;
        if !node.bounds().contains_point(location) {
            return None;
        }

        // Front-most child first
        for child in node.children.iter().rev() {
            let Some(child_node) = self.views.get(child) else {
                continue;
            };
            let offset = child_node.content_offset();
            let local = Point::new(
                location.x - child_node.frame.min_x() + offset.x,
                location.y - child_node.frame.min_y() + offset.y,
            );
            if let Some(hit) = self.hit_test_in(*child, local) {
                return Some(hit);
            }
        }

        Some(HitTarget {
            view,
            is_button: node.is_button,
            can_become_focused: node.control.is_some(),
        })
    }
}

impl Host for SimulatedHost {
    fn subviews(&self, view: ViewId) -> Vec<ViewId> {
        self.views
            .get(&view)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn control_kind(&self, view: ViewId) -> Option<ControlKind> {
        self.views.get(&view)?.control
    }

    fn attach_field_delegate(&mut self, view: ViewId, kind: ControlKind) {
        self.attached.push((view, kind));
    }

    fn is_descendant(&self, view: ViewId, ancestor: ViewId) -> bool {
        let mut current = Some(view);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.views.get(&id).and_then(|node| node.parent);
        }
        false
    }

    fn frame_in(&self, view: ViewId, container: ViewId) -> Option<Rect> {
        let node = self.views.get(&view)?;
        if view == container {
            return Some(node.bounds());
        }

        let mut rect = node.frame;
        let mut parent = node.parent;
        loop {
            let id = parent?;
            if id == container {
                return Some(rect);
            }
            let parent_node = self.views.get(&id)?;
            let offset = parent_node.content_offset();
            rect = rect.offset_by(
                parent_node.frame.min_x() - offset.x,
                parent_node.frame.min_y() - offset.y,
            );
            parent = parent_node.parent;
        }
    }

    fn frame_on_screen(&self, view: ViewId) -> Option<Rect> {
        let node = self.views.get(&view)?;
        let mut rect = node.frame;
        let mut parent = node.parent;
        while let Some(id) = parent {
            let parent_node = self.views.get(&id)?;
            let offset = parent_node.content_offset();
            rect = rect.offset_by(
                parent_node.frame.min_x() - offset.x,
                parent_node.frame.min_y() - offset.y,
            );
            parent = parent_node.parent;
        }
        Some(rect)
    }

    fn hit_test(&self, view: ViewId, location: Point) -> Option<HitTarget> {
        self.hit_test_in(view, location)
    }

    fn viewport_geometry(&self, viewport: ViewId) -> Option<ViewportGeometry> {
        let node = self.views.get(&viewport)?;
        let scroll = node.scroll?;
        Some(ViewportGeometry {
            bounds: node.frame.size,
            content_inset: scroll.content_inset,
            content_size: scroll.content_size,
            content_offset: scroll.content_offset,
        })
    }

    fn set_content_inset(&mut self, viewport: ViewId, inset: EdgeInsets) {
        let animation = self.open_animations.last().copied();
        if let Some(scroll) = self.scroll_state_mut(viewport) {
            scroll.content_inset = inset;
            self.inset_changes.push(InsetChange {
                viewport,
                inset,
                animation,
            });
        }
    }

    fn set_content_offset(&mut self, viewport: ViewId, offset: Point, animated: bool) {
        self.record_offset(viewport, offset, animated, false);
    }

    fn scroll_rect_to_visible(&mut self, viewport: ViewId, rect: Rect, animated: bool) {
        let Some(geometry) = self.viewport_geometry(viewport) else {
            return;
        };
        let offset = scroller::compute_offset_to_reveal(&geometry, rect);
        self.record_offset(viewport, offset, animated, true);
    }

    fn end_editing(&mut self, view: ViewId) -> bool {
        self.end_editing_calls.push(view);
        match self.first_responder {
            Some(responder) if self.is_descendant(responder, view) => {
                if self.refuses_resign.contains(&responder) {
                    false
                } else {
                    self.first_responder = None;
                    true
                }
            }
            _ => false,
        }
    }

    fn resign_focus(&mut self, view: ViewId) -> bool {
        self.resign_calls.push(view);
        if self.refuses_resign.contains(&view) {
            return false;
        }
        if self.first_responder == Some(view) {
            self.first_responder = None;
        }
        true
    }

    fn screen_view(&self, screen: ScreenId) -> Option<ViewId> {
        let view = self.screens.get(&screen)?.view;
        self.views.contains_key(&view).then_some(view)
    }

    fn primary_scroll_view(&self, screen: ScreenId) -> Option<ViewId> {
        self.screens.get(&screen)?.primary_scroll_view
    }

    fn screen_presentation(&self, screen: ScreenId) -> Option<ScreenPresentation> {
        Some(self.screens.get(&screen)?.presentation)
    }

    fn interface_orientation(&self) -> Orientation {
        self.orientation
    }

    fn begin_animation(&mut self, animation: Animation) {
        self.open_animations.push(animation);
    }

    fn commit_animation(&mut self) -> AnimationToken {
        self.open_animations.pop();
        self.next_token += 1;
        let token = AnimationToken(self.next_token);
        self.running.push_back(token);
        token
    }
}

// ============================================================================
// Tests
// ============================================================================
