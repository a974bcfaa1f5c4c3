// SPDX-License-Identifier: GPL-3.0-only

//! The keyboard show/hide state machine.
//!
//! A [`KeyboardScrollHandler`] belongs to one screen and manages one viewport.
//! It listens for keyboard events while its screen is on display, pads the
//! viewport's bottom content inset by the part of the keyboard that covers it,
//! and scrolls the focused control into view once that inset change has
//! finished animating. When the keyboard hides it removes the inset again and
//! optionally returns to the offset it had before the keyboard appeared.
//!
//! # States
//!
//! ```text
//!            will show (ours)
//!   Hidden ------------------> Showing
//!      ^                          |
//!      +--------------------------+
//!            will hide (ours)
//! ```
//!
//! Duplicate or out-of-order events are absorbed by the inset parity: the
//! inset is only added at parity 0 and only removed at parity 1.
//!
//! # Continuations
//!
//! Inset changes are animated with the keyboard's own curve and duration.
//! Scrolling must not start until that animation is over, so the handler
//! stores a continuation against the [`AnimationToken`] the host hands back
//! and runs it from [`KeyboardScrollHandler::animation_completed`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use futures::StreamExt;
use futures::channel::mpsc;

use crate::app_settings;
use crate::config::{HandlerConfig, OffsetResolver};
use crate::events::{
    Animation, AnimationCurve, KeyboardEvent, KeyboardEventKind, KeyboardEventSource,
    SubscriptionId,
};
use crate::focus::FocusTracker;
use crate::geometry::{Point, Rect};
use crate::host::{AnimationToken, Host, ScreenId, ViewId};
use crate::observer::TapObserver;
use crate::router::FieldObservers;
use crate::scroller::{self, ViewportGeometry};

// ============================================================================
// State Types
// ============================================================================

/// Keyboard visibility as seen by one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyboardState {
    #[default]
    Hidden,
    Showing,
}

/// Mutable per-screen state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoordinatorState {
    pub keyboard_visible: bool,
    /// 1 while the keyboard inset is applied to the viewport, 0 otherwise.
    pub inset_applied_parity: u8,
    /// Bottom inset added for the keyboard at the last 0 -> 1 transition.
    pub applied_bottom_inset: f64,
    /// Content offset recorded before the keyboard appeared.
    pub offset_before_show: Point,
}

/// Work deferred until an animation completes.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Continuation {
    /// Scroll to the resolved target once the show inset has settled.
    ResolveShowScroll { keyboard_frame: Rect },
    /// Return to the pre-show offset once the hide inset has settled.
    RestoreOffset,
}

/// Returns the height of the part of `keyboard` that covers `viewport`.
///
/// Both rectangles must be in absolute window coordinates.
#[must_use]
pub fn occluded_height(viewport_on_screen: &Rect, keyboard: &Rect) -> f64 {
    viewport_on_screen
        .intersection(keyboard)
        .map_or(0.0, |overlap| overlap.height())
}

/// Returns the keyboard height minus the gap between the viewport's bottom
/// edge and the bottom of a window of height `window_height`.
///
/// Equal to [`occluded_height`] only while the keyboard rises from the window
/// bottom and the viewport's top edge stays above the keyboard.
#[must_use]
pub fn window_relative_inset(
    viewport_on_screen: &Rect,
    keyboard: &Rect,
    window_height: f64,
) -> f64 {
    (keyboard.height() - (window_height - viewport_on_screen.max_y())).max(0.0)
}

// ============================================================================
// Keyboard Scroll Handler
// ============================================================================

/// Keeps the focused control of one screen visible above the keyboard.
pub struct KeyboardScrollHandler {
    config: HandlerConfig,
    offset_resolver: Option<OffsetResolver>,

    /// Owning screen; `None` means every event is ours.
    screen: Option<ScreenId>,
    /// Managed viewport; discovered from the screen when unset.
    viewport: Option<ViewId>,

    pub(crate) state: CoordinatorState,
    pub(crate) focus: FocusTracker,
    pub(crate) observers: FieldObservers,
    pub(crate) tap_observer: Option<Weak<RefCell<dyn TapObserver>>>,

    source: Box<dyn KeyboardEventSource>,
    events_tx: mpsc::UnboundedSender<KeyboardEvent>,
    events_rx: mpsc::UnboundedReceiver<KeyboardEvent>,
    show_subscription: Option<SubscriptionId>,
    hide_subscription: Option<SubscriptionId>,

    pending: Vec<(AnimationToken, Continuation)>,
}

impl fmt::Debug for KeyboardScrollHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyboardScrollHandler")
            .field("config", &self.config)
            .field("has_offset_resolver", &self.offset_resolver.is_some())
            .field("screen", &self.screen)
            .field("viewport", &self.viewport)
            .field("state", &self.state)
            .field("focus", &self.focus.current())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl KeyboardScrollHandler {
    /// Creates a handler with no owning screen and no viewport.
    pub fn new(source: impl KeyboardEventSource + 'static) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded();
        Self {
            config: HandlerConfig::default(),
            offset_resolver: None,
            screen: None,
            viewport: None,
            state: CoordinatorState::default(),
            focus: FocusTracker::new(),
            observers: FieldObservers::default(),
            tap_observer: None,
            source: Box::new(source),
            events_tx,
            events_rx,
            show_subscription: None,
            hide_subscription: None,
            pending: Vec::new(),
        }
    }

    /// Creates a handler owned by `screen`.
    pub fn for_screen(source: impl KeyboardEventSource + 'static, screen: ScreenId) -> Self {
        let mut handler = Self::new(source);
        handler.screen = Some(screen);
        handler
    }

    /// Sets the managed viewport.
    #[must_use]
    pub fn with_viewport(mut self, viewport: ViewId) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: HandlerConfig) -> Self {
        self.config = config;
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut HandlerConfig {
        &mut self.config
    }

    /// Installs a closure that decides where to scroll when the keyboard shows.
    ///
    /// Takes priority over both the static offset and revealing the focused control.
    pub fn set_offset_resolver(
        &mut self,
        resolver: impl Fn(&ViewportGeometry, Rect) -> Point + 'static,
    ) {
        self.offset_resolver = Some(Box::new(resolver));
    }

    pub fn clear_offset_resolver(&mut self) {
        self.offset_resolver = None;
    }

    pub fn screen(&self) -> Option<ScreenId> {
        self.screen
    }

    pub fn set_screen(&mut self, screen: Option<ScreenId>) {
        self.screen = screen;
    }

    pub fn viewport(&self) -> Option<ViewId> {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Option<ViewId>) {
        self.viewport = viewport;
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    pub fn keyboard_state(&self) -> KeyboardState {
        if self.state.keyboard_visible {
            KeyboardState::Showing
        } else {
            KeyboardState::Hidden
        }
    }

    pub fn is_keyboard_visible(&self) -> bool {
        self.state.keyboard_visible
    }

    /// The control currently believed to hold focus.
    pub fn current_first_responder(&self) -> Option<ViewId> {
        self.focus.current().map(|handle| handle.view)
    }

    /// Number of continuations waiting for their animation to finish.
    pub fn pending_animation_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns the managed viewport, asking the owning screen for its primary
    /// scroll view when none was set.
    pub(crate) fn resolve_viewport(&mut self, host: &dyn Host) -> Option<ViewId> {
        if self.viewport.is_none() {
            let discovered = self.screen.and_then(|screen| host.primary_scroll_view(screen));
            if let Some(viewport) = discovered {
                tracing::debug!("Discovered viewport {:?} from owning screen", viewport);
                self.viewport = Some(viewport);
            }
        }
        self.viewport
    }

    // ------------------------------------------------------------------------
    // Screen Lifecycle
    // ------------------------------------------------------------------------

    /// Subscribes to keyboard show and hide events.
    ///
    /// Call after the owning screen has appeared.
    pub fn on_screen_appeared(&mut self) {
        if self.show_subscription.is_none() {
            self.show_subscription = Some(
                self.source
                    .subscribe(KeyboardEventKind::WillShow, self.events_tx.clone()),
            );
        }
        if self.hide_subscription.is_none() {
            self.hide_subscription = Some(
                self.source
                    .subscribe(KeyboardEventKind::WillHide, self.events_tx.clone()),
            );
        }
        tracing::info!("Subscribed to keyboard events for screen {:?}", self.screen);
    }

    /// Stops listening for show events and dismisses the keyboard.
    ///
    /// Hide events stay subscribed so the dismissal triggered here can still
    /// remove the inset.
    pub fn on_screen_will_disappear(&mut self, host: &mut dyn Host) {
        if let Some(id) = self.show_subscription.take() {
            self.source.unsubscribe(id);
        }
        self.dismiss_keyboard_if_possible(host);
    }

    /// Stops listening for hide events.
    pub fn on_screen_disappeared(&mut self) {
        if let Some(id) = self.hide_subscription.take() {
            self.source.unsubscribe(id);
        }
        tracing::info!("Unsubscribed from keyboard events for screen {:?}", self.screen);
    }

    pub fn is_subscribed(&self, kind: KeyboardEventKind) -> bool {
        match kind {
            KeyboardEventKind::WillShow => self.show_subscription.is_some(),
            KeyboardEventKind::WillHide => self.hide_subscription.is_some(),
        }
    }

    // ------------------------------------------------------------------------
    // Event Delivery
    // ------------------------------------------------------------------------

    /// Handles every keyboard event received so far without blocking.
    ///
    /// Events of a kind that is no longer subscribed are dropped. Returns the
    /// number of events handled.
    pub fn process_keyboard_events(&mut self, host: &mut dyn Host) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if !self.is_subscribed(event.kind) {
                tracing::trace!(
                    "Dropping {} event received after unsubscribe",
                    event.kind.as_str()
                );
                continue;
            }
            self.handle_keyboard_event(host, event);
            handled += 1;
        }
        handled
    }

    /// Waits for the next keyboard event delivered by the source.
    ///
    /// Events of a kind that is no longer subscribed are skipped, as in
    /// [`process_keyboard_events`](Self::process_keyboard_events).
    pub async fn next_keyboard_event(&mut self) -> Option<KeyboardEvent> {
        while let Some(event) = self.events_rx.next().await {
            if self.is_subscribed(event.kind) {
                return Some(event);
            }
            tracing::trace!("Dropping {} event received after unsubscribe", event.kind.as_str());
        }
        None
    }

    /// Dispatches one keyboard event to the show or hide handler.
    pub fn handle_keyboard_event(&mut self, host: &mut dyn Host, event: KeyboardEvent) {
        match event.kind {
            KeyboardEventKind::WillShow => self.keyboard_will_show(host, event),
            KeyboardEventKind::WillHide => self.keyboard_will_hide(host, event),
        }
    }

    // ------------------------------------------------------------------------
    // Ownership Arbitration
    // ------------------------------------------------------------------------

    /// Decides whether a keyboard event concerns this handler's screen.
    ///
    /// A handler on a covered or detached screen must leave the keyboard to
    /// whichever screen is on top.
    pub fn belongs_to_us(&self, host: &dyn Host) -> bool {
        if self.config.suppress_events {
            return false;
        }

        let Some(screen) = self.screen else {
            return true;
        };
        let Some(presentation) = host.screen_presentation(screen) else {
            return true;
        };

        let frontmost = presentation.is_top_of_navigation
            || presentation.is_presented_modal
            || !presentation.in_navigation_container;

        frontmost && presentation.attached_to_window
    }

    // ------------------------------------------------------------------------
    // Show / Hide
    // ------------------------------------------------------------------------

    /// Handles a "keyboard will show" event.
    pub fn keyboard_will_show(&mut self, host: &mut dyn Host, event: KeyboardEvent) {
        if !self.belongs_to_us(host) {
            tracing::debug!("Ignoring keyboard show for screen {:?}", self.screen);
            return;
        }

        let was_showing = self.state.keyboard_visible;
        self.state.keyboard_visible = true;

        let Some(viewport) = self.resolve_viewport(host) else {
            tracing::debug!("Keyboard shown but no viewport is managed");
            return;
        };
        let Some(geometry) = host.viewport_geometry(viewport) else {
            tracing::warn!("Viewport {:?} reports no scroll geometry", viewport);
            return;
        };

        let keyboard_frame = if host.interface_orientation().is_landscape() {
            event.frame.transposed()
        } else {
            event.frame
        };
        let inset = host
            .frame_on_screen(viewport)
            .map_or(0.0, |frame| occluded_height(&frame, &keyboard_frame));

        host.begin_animation(event.animation());

        if self.state.inset_applied_parity == 0 {
            let mut content_inset = geometry.content_inset;
            content_inset.bottom += inset;
            host.set_content_inset(viewport, content_inset);

            self.state.applied_bottom_inset = inset;
            self.state.inset_applied_parity = 1;
            tracing::debug!("Applied keyboard inset {} to {:?}", inset, viewport);
        } else {
            tracing::debug!("Keyboard inset already applied; skipping duplicate show");
        }

        if !was_showing {
            self.state.offset_before_show = geometry.content_offset;
        }

        let token = host.commit_animation();
        self.pending
            .push((token, Continuation::ResolveShowScroll { keyboard_frame }));
    }

    /// Handles a "keyboard will hide" event.
    pub fn keyboard_will_hide(&mut self, host: &mut dyn Host, event: KeyboardEvent) {
        if !self.belongs_to_us(host) {
            tracing::debug!("Ignoring keyboard hide for screen {:?}", self.screen);
            return;
        }

        self.state.keyboard_visible = false;

        let Some(viewport) = self.resolve_viewport(host) else {
            return;
        };

        host.begin_animation(event.animation());

        if self.state.inset_applied_parity == 1 {
            if let Some(geometry) = host.viewport_geometry(viewport) {
                let mut content_inset = geometry.content_inset;
                content_inset.bottom -= self.state.applied_bottom_inset;
                host.set_content_inset(viewport, content_inset);

                tracing::debug!(
                    "Removed keyboard inset {} from {:?}",
                    self.state.applied_bottom_inset,
                    viewport
                );
                self.state.applied_bottom_inset = 0.0;
                self.state.inset_applied_parity = 0;
            }
        } else {
            tracing::debug!("Keyboard inset not applied; skipping duplicate hide");
        }

        let token = host.commit_animation();
        self.pending.push((token, Continuation::RestoreOffset));
    }

    /// Runs the continuation registered for `token`, if any.
    ///
    /// The host calls this once the animation committed under `token` has
    /// finished. Unknown tokens are ignored.
    pub fn animation_completed(&mut self, host: &mut dyn Host, token: AnimationToken) {
        let Some(index) = self.pending.iter().position(|(pending, _)| *pending == token) else {
            tracing::trace!("No continuation for {:?}", token);
            return;
        };

        let (_, continuation) = self.pending.remove(index);
        match continuation {
            Continuation::ResolveShowScroll { keyboard_frame } => {
                self.resolve_show_scroll(host, keyboard_frame);
            }
            Continuation::RestoreOffset => self.restore_offset(host),
        }
    }

    fn resolve_show_scroll(&mut self, host: &mut dyn Host, keyboard_frame: Rect) {
        let Some(viewport) = self.viewport else {
            return;
        };
        let Some(geometry) = host.viewport_geometry(viewport) else {
            return;
        };

        if let Some(resolver) = &self.offset_resolver {
            let offset = resolver(&geometry, keyboard_frame);
            tracing::debug!("Scrolling to resolver offset {:?}", offset);
            animate_offset(host, viewport, offset);
        } else if self.config.static_offset_y != 0.0 {
            let offset = Point::new(geometry.content_offset.x, self.config.static_offset_y);
            tracing::debug!("Scrolling to static offset {:?}", offset);
            animate_offset(host, viewport, offset);
        } else if let Some(focused) = self.focus.current() {
            let Some(frame) = host.frame_in(focused.view, viewport) else {
                tracing::debug!("Focused control {:?} is not in the viewport", focused.view);
                return;
            };
            let force_manual = scroller::is_native_scroll_unreliable(&geometry);
            scroller::scroll_to_reveal(host, viewport, frame, true, force_manual);
        }
    }

    fn restore_offset(&mut self, host: &mut dyn Host) {
        if !self.config.restore_offset_on_hide {
            return;
        }
        let Some(viewport) = self.viewport else {
            return;
        };

        tracing::debug!("Restoring pre-keyboard offset {:?}", self.state.offset_before_show);
        host.set_content_offset(viewport, self.state.offset_before_show, true);
    }
}

/// Moves the viewport to `offset` over the fixed handler scroll duration.
fn animate_offset(host: &mut dyn Host, viewport: ViewId, offset: Point) {
    host.begin_animation(Animation::new(
        AnimationCurve::EaseInOut,
        app_settings::SCROLL_ANIMATION_DURATION,
    ));
    host.set_content_offset(viewport, offset, false);
    host.commit_animation();
}

impl Drop for KeyboardScrollHandler {
    fn drop(&mut self) {
        if let Some(id) = self.show_subscription.take() {
            self.source.unsubscribe(id);
        }
        if let Some(id) = self.hide_subscription.take() {
            self.source.unsubscribe(id);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::KeyboardNotifier;
    use crate::geometry::{EdgeInsets, Size};
    use crate::host::{ControlKind, Orientation, ScreenPresentation};
    use crate::sim::SimulatedHost;
    use std::time::Duration;

    const KEYBOARD: Rect = Rect::new(0.0, 352.0, 320.0, 216.0);

    fn show() -> KeyboardEvent {
        KeyboardEvent::will_show(KEYBOARD, AnimationCurve::EaseInOut, Duration::from_millis(250))
    }

    fn hide() -> KeyboardEvent {
        KeyboardEvent::will_hide(KEYBOARD, AnimationCurve::EaseInOut, Duration::from_millis(250))
    }

    struct Fixture {
        host: SimulatedHost,
        notifier: KeyboardNotifier,
        screen: ScreenId,
        viewport: ViewId,
        field: ViewId,
    }

    /// A 320x568 window with a full-screen viewport holding one text field.
    fn fixture() -> Fixture {
        let mut host = SimulatedHost::new();
        let root = host.add_root(Rect::new(0.0, 0.0, 320.0, 568.0));
        let viewport =
            host.add_scroll_view(root, Rect::new(0.0, 0.0, 320.0, 568.0), Size::new(320.0, 1000.0));
        let field =
            host.add_control(viewport, Rect::new(10.0, 500.0, 300.0, 40.0), ControlKind::TextField);
        let screen = host.add_screen(root, ScreenPresentation {
            in_navigation_container: true,
            is_top_of_navigation: true,
            is_presented_modal: false,
            attached_to_window: true,
        });

        Fixture {
            host,
            notifier: KeyboardNotifier::new(),
            screen,
            viewport,
            field,
        }
    }

    fn handler(fx: &Fixture) -> KeyboardScrollHandler {
        KeyboardScrollHandler::for_screen(fx.notifier.clone(), fx.screen).with_viewport(fx.viewport)
    }

    // ========================================================================
    // Inset parity
    // ========================================================================

    /// Test 1: Show then hide restores the inset and parity
    #[test]
    fn test_show_hide_round_trip() {
        let mut fx = fixture();
        let mut handler = handler(&fx);

        handler.keyboard_will_show(&mut fx.host, show());
        fx.host.settle(&mut handler);
        assert_eq!(handler.state().inset_applied_parity, 1);
        assert_eq!(handler.keyboard_state(), KeyboardState::Showing);
        assert_eq!(fx.host.content_inset(fx.viewport).bottom, 216.0);

        handler.keyboard_will_hide(&mut fx.host, hide());
        fx.host.settle(&mut handler);
        assert_eq!(handler.state().inset_applied_parity, 0);
        assert_eq!(handler.state().applied_bottom_inset, 0.0);
        assert_eq!(handler.keyboard_state(), KeyboardState::Hidden);
        assert_eq!(fx.host.content_inset(fx.viewport), EdgeInsets::ZERO);
    }

    /// Test 2: Duplicate show events apply the inset once
    #[test]
    fn test_duplicate_show_applies_inset_once() {
        let mut fx = fixture();
        let mut handler = handler(&fx);

        handler.keyboard_will_show(&mut fx.host, show());
        handler.keyboard_will_show(&mut fx.host, show());
        fx.host.settle(&mut handler);

        assert_eq!(fx.host.content_inset(fx.viewport).bottom, 216.0);
        assert_eq!(fx.host.inset_change_count(fx.viewport), 1);
    }

    /// Test 3: Hide without a prior show leaves the inset alone
    #[test]
    fn test_hide_at_parity_zero_is_noop() {
        let mut fx = fixture();
        let mut handler = handler(&fx);

        handler.keyboard_will_hide(&mut fx.host, hide());
        fx.host.settle(&mut handler);

        assert_eq!(fx.host.inset_change_count(fx.viewport), 0);
        assert_eq!(handler.state().inset_applied_parity, 0);
    }

    /// Test 4: The inset change uses the keyboard's curve and duration
    #[test]
    fn test_inset_animates_with_keyboard_timing() {
        let mut fx = fixture();
        let mut handler = handler(&fx);

        handler.keyboard_will_show(&mut fx.host, show());

        let animation = fx.host.last_inset_animation(fx.viewport).unwrap();
        assert_eq!(
            animation,
            Animation::new(AnimationCurve::EaseInOut, Duration::from_millis(250))
        );
        assert_eq!(handler.pending_animation_count(), 1);
    }

    // ========================================================================
    // Scroll resolution
    // ========================================================================

    /// Test 5: Scrolling waits for the inset animation to finish
    #[test]
    fn test_scroll_runs_after_inset_animation() {
        let mut fx = fixture();
        let mut handler = handler(&fx);
        handler.focus.set(fx.field, Some(ControlKind::TextField));

        handler.keyboard_will_show(&mut fx.host, show());
        assert_eq!(
            fx.host.content_offset(fx.viewport),
            Point::ZERO,
            "No scrolling may happen before the inset animation completes"
        );

        fx.host.settle(&mut handler);
        // Window is 0..352 after the inset; field bottom is 540 => 188
        assert_eq!(fx.host.content_offset(fx.viewport), Point::new(0.0, 188.0));
    }

    /// Test 6: A custom resolver wins regardless of focus
    #[test]
    fn test_custom_resolver_offset() {
        let mut fx = fixture();
        let mut handler = handler(&fx).with_config(HandlerConfig::new().with_static_offset_y(99.0));
        handler.focus.set(fx.field, Some(ControlKind::TextField));
        handler.set_offset_resolver(|_, _| Point::new(10.0, 20.0));

        handler.keyboard_will_show(&mut fx.host, show());
        fx.host.settle(&mut handler);

        assert_eq!(fx.host.content_offset(fx.viewport), Point::new(10.0, 20.0));
    }

    /// Test 7: The resolver sees the unclipped keyboard frame
    #[test]
    fn test_resolver_receives_keyboard_frame() {
        let mut fx = fixture();
        let mut handler = handler(&fx);
        let seen = std::rc::Rc::new(std::cell::Cell::new(None));
        let sink = seen.clone();
        handler.set_offset_resolver(move |_, frame| {
            sink.set(Some(frame));
            Point::ZERO
        });

        handler.keyboard_will_show(&mut fx.host, show());
        fx.host.settle(&mut handler);

        assert_eq!(seen.get(), Some(KEYBOARD));
    }

    /// Test 8: Static y offset keeps x
    #[test]
    fn test_static_offset() {
        let mut fx = fixture();
        fx.host.set_content_offset_now(fx.viewport, Point::new(5.0, 0.0));
        let mut handler =
            handler(&fx).with_config(HandlerConfig::new().with_static_offset_y(120.0));
        handler.focus.set(fx.field, Some(ControlKind::TextField));

        handler.keyboard_will_show(&mut fx.host, show());
        fx.host.settle(&mut handler);

        assert_eq!(fx.host.content_offset(fx.viewport), Point::new(5.0, 120.0));
    }

    /// Test 9: Restore on hide returns to the pre-show offset
    #[test]
    fn test_restore_offset_on_hide() {
        let mut fx = fixture();
        fx.host.set_content_offset_now(fx.viewport, Point::new(0.0, 40.0));
        let mut handler =
            handler(&fx).with_config(HandlerConfig::new().with_restore_offset_on_hide(true));
        handler.focus.set(fx.field, Some(ControlKind::TextField));

        handler.keyboard_will_show(&mut fx.host, show());
        fx.host.settle(&mut handler);
        assert_ne!(fx.host.content_offset(fx.viewport), Point::new(0.0, 40.0));

        handler.keyboard_will_hide(&mut fx.host, hide());
        fx.host.settle(&mut handler);
        assert_eq!(fx.host.content_offset(fx.viewport), Point::new(0.0, 40.0));
    }

    /// Test 10: Without restore the offset stays where the keyboard left it
    #[test]
    fn test_no_restore_by_default() {
        let mut fx = fixture();
        let mut handler = handler(&fx);
        handler.focus.set(fx.field, Some(ControlKind::TextField));

        handler.keyboard_will_show(&mut fx.host, show());
        fx.host.settle(&mut handler);
        let scrolled = fx.host.content_offset(fx.viewport);

        handler.keyboard_will_hide(&mut fx.host, hide());
        fx.host.settle(&mut handler);
        assert_eq!(fx.host.content_offset(fx.viewport), scrolled);
    }

    /// Test 11: A hide arriving mid-show still lets the show continuation run
    #[test]
    fn test_hide_during_show_animation() {
        let mut fx = fixture();
        let mut handler = handler(&fx);

        handler.keyboard_will_show(&mut fx.host, show());
        handler.keyboard_will_hide(&mut fx.host, hide());
        assert_eq!(handler.pending_animation_count(), 2);

        fx.host.settle(&mut handler);
        assert_eq!(handler.pending_animation_count(), 0);
        assert_eq!(handler.state().inset_applied_parity, 0);
        assert_eq!(fx.host.content_inset(fx.viewport), EdgeInsets::ZERO);
    }

    // ========================================================================
    // Geometry of the keyboard inset
    // ========================================================================

    /// Test 12: Landscape frames are transposed before intersecting
    #[test]
    fn test_landscape_frame_is_transposed() {
        let mut host = SimulatedHost::new();
        let root = host.add_root(Rect::new(0.0, 0.0, 568.0, 320.0));
        let viewport =
            host.add_scroll_view(root, Rect::new(0.0, 0.0, 568.0, 320.0), Size::new(568.0, 900.0));
        host.set_orientation(Orientation::LandscapeRight);
        let mut handler =
            KeyboardScrollHandler::new(KeyboardNotifier::new()).with_viewport(viewport);

        // Portrait-fixed frame: keyboard along the x axis, 162 wide
        let event = KeyboardEvent::will_show(
            Rect::new(158.0, 0.0, 162.0, 568.0),
            AnimationCurve::EaseOut,
            Duration::ZERO,
        );
        handler.keyboard_will_show(&mut host, event);

        assert_eq!(host.content_inset(viewport).bottom, 162.0);
    }

    /// Test 13: Only the part of the keyboard over the viewport counts
    #[test]
    fn test_inset_is_overlap_height() {
        let mut host = SimulatedHost::new();
        let root = host.add_root(Rect::new(0.0, 0.0, 320.0, 568.0));
        // Viewport ends 100pt above the window bottom
        let viewport =
            host.add_scroll_view(root, Rect::new(0.0, 64.0, 320.0, 404.0), Size::new(320.0, 900.0));
        let mut handler =
            KeyboardScrollHandler::new(KeyboardNotifier::new()).with_viewport(viewport);

        handler.keyboard_will_show(&mut host, show());
        assert_eq!(host.content_inset(viewport).bottom, 116.0);
    }

    /// Test 14: Intersection and window-relative formulas agree for a
    /// bottom-anchored viewport
    #[test]
    fn test_inset_formulas_agree_when_anchored_to_bottom() {
        let window_height = 568.0;
        for viewport in [
            Rect::new(0.0, 0.0, 320.0, 568.0),
            Rect::new(0.0, 64.0, 320.0, 504.0),
            Rect::new(0.0, 300.0, 320.0, 268.0),
        ] {
            assert_eq!(
                occluded_height(&viewport, &KEYBOARD),
                window_relative_inset(&viewport, &KEYBOARD, window_height),
                "Formulas disagree for {:?}",
                viewport
            );
        }
    }

    // ========================================================================
    // Ownership arbitration
    // ========================================================================

    /// Test 15: A covered screen ignores keyboard events entirely
    #[test]
    fn test_covered_screen_ignores_events() {
        let mut fx = fixture();
        fx.host.set_presentation(fx.screen, ScreenPresentation {
            in_navigation_container: true,
            is_top_of_navigation: false,
            is_presented_modal: false,
            attached_to_window: true,
        });
        let mut handler = handler(&fx);

        handler.keyboard_will_show(&mut fx.host, show());
        fx.host.settle(&mut handler);

        assert_eq!(handler.keyboard_state(), KeyboardState::Hidden);
        assert_eq!(handler.state().inset_applied_parity, 0);
        assert_eq!(fx.host.inset_change_count(fx.viewport), 0);
    }

    /// Test 16: Arbitration truth table
    #[test]
    fn test_belongs_to_us_rules() {
        let mut fx = fixture();
        let handler = handler(&fx);

        let cases = [
            // (container, top, modal, attached) -> expected
            ((true, true, false, true), true),
            ((true, false, true, true), true),
            ((false, false, false, true), true),
            ((true, false, false, true), false),
            ((true, true, false, false), false),
            ((false, false, false, false), false),
        ];
        for ((container, top, modal, attached), expected) in cases {
            fx.host.set_presentation(fx.screen, ScreenPresentation {
                in_navigation_container: container,
                is_top_of_navigation: top,
                is_presented_modal: modal,
                attached_to_window: attached,
            });
            assert_eq!(
                handler.belongs_to_us(&fx.host),
                expected,
                "container={} top={} modal={} attached={}",
                container,
                top,
                modal,
                attached
            );
        }
    }

    /// Test 17: No owning screen accepts everything unless suppressed
    #[test]
    fn test_screenless_handler_and_suppression() {
        let fx = fixture();
        let mut handler = KeyboardScrollHandler::new(fx.notifier.clone());
        assert!(handler.belongs_to_us(&fx.host));

        handler.config_mut().suppress_events = true;
        assert!(!handler.belongs_to_us(&fx.host));
    }

    // ========================================================================
    // Degraded references
    // ========================================================================

    /// Test 18: Missing viewport degrades to a no-op
    #[test]
    fn test_missing_viewport_is_noop() {
        let mut fx = fixture();
        let mut handler = KeyboardScrollHandler::new(fx.notifier.clone());

        handler.keyboard_will_show(&mut fx.host, show());
        handler.keyboard_will_hide(&mut fx.host, hide());
        fx.host.settle(&mut handler);

        assert_eq!(handler.pending_animation_count(), 0);
        assert_eq!(fx.host.inset_change_count(fx.viewport), 0);
    }

    /// Test 19: The viewport is discovered from the owning screen
    #[test]
    fn test_viewport_discovered_from_screen() {
        let mut fx = fixture();
        fx.host.set_primary_scroll_view(fx.screen, fx.viewport);
        let mut handler = KeyboardScrollHandler::for_screen(fx.notifier.clone(), fx.screen);

        handler.keyboard_will_show(&mut fx.host, show());

        assert_eq!(handler.viewport(), Some(fx.viewport));
        assert_eq!(fx.host.content_inset(fx.viewport).bottom, 216.0);
    }

    /// Test 20: Unknown animation tokens are ignored
    #[test]
    fn test_unknown_token_ignored() {
        let mut fx = fixture();
        let mut handler = handler(&fx);

        handler.animation_completed(&mut fx.host, AnimationToken(999));
        assert_eq!(handler.pending_animation_count(), 0);
    }

    // ========================================================================
    // Subscription lifecycle
    // ========================================================================

    /// Test 21: Lifecycle hooks subscribe and unsubscribe exactly once
    #[test]
    fn test_subscription_lifecycle() {
        let mut fx = fixture();
        let mut handler = handler(&fx);

        handler.on_screen_appeared();
        handler.on_screen_appeared();
        assert_eq!(fx.notifier.subscriber_count(KeyboardEventKind::WillShow), 1);
        assert_eq!(fx.notifier.subscriber_count(KeyboardEventKind::WillHide), 1);

        handler.on_screen_will_disappear(&mut fx.host);
        assert_eq!(fx.notifier.subscriber_count(KeyboardEventKind::WillShow), 0);
        assert_eq!(fx.notifier.subscriber_count(KeyboardEventKind::WillHide), 1);

        handler.on_screen_disappeared();
        assert_eq!(fx.notifier.subscriber_count(KeyboardEventKind::WillHide), 0);
    }

    /// Test 22: Posted events are pumped into the state machine
    #[test]
    fn test_process_keyboard_events() {
        let mut fx = fixture();
        let mut handler = handler(&fx);
        handler.on_screen_appeared();

        fx.notifier.post(show());
        assert_eq!(handler.process_keyboard_events(&mut fx.host), 1);
        assert!(handler.is_keyboard_visible());

        fx.notifier.post(hide());
        assert_eq!(handler.process_keyboard_events(&mut fx.host), 1);
        assert!(!handler.is_keyboard_visible());
    }

    /// Test 23: Events queued before unsubscribing are dropped
    #[test]
    fn test_queued_events_dropped_after_unsubscribe() {
        let mut fx = fixture();
        let mut handler = handler(&fx);
        handler.on_screen_appeared();

        fx.notifier.post(show());
        handler.on_screen_will_disappear(&mut fx.host);

        assert_eq!(handler.process_keyboard_events(&mut fx.host), 0);
        assert!(!handler.is_keyboard_visible());
    }

    /// Test 24: Events can be awaited
    #[tokio::test]
    async fn test_next_keyboard_event() {
        let fx = fixture();
        let mut handler = handler(&fx);
        handler.on_screen_appeared();

        fx.notifier.post(show());
        assert_eq!(handler.next_keyboard_event().await, Some(show()));
    }

    /// Test 25: Awaiting skips events queued for an unsubscribed kind
    #[tokio::test]
    async fn test_next_keyboard_event_skips_unsubscribed_kind() {
        let mut fx = fixture();
        let mut handler = handler(&fx);
        handler.on_screen_appeared();

        fx.notifier.post(show());
        handler.on_screen_will_disappear(&mut fx.host);
        fx.notifier.post(hide());

        assert_eq!(handler.next_keyboard_event().await, Some(hide()));
        assert!(!handler.is_keyboard_visible());
    }

    /// Test 26: Dropping the handler releases its subscriptions
    #[test]
    fn test_drop_unsubscribes() {
        let fx = fixture();
        {
            let mut handler = handler(&fx);
            handler.on_screen_appeared();
            assert_eq!(fx.notifier.subscriber_count(KeyboardEventKind::WillShow), 1);
        }
        assert_eq!(fx.notifier.subscriber_count(KeyboardEventKind::WillShow), 0);
        assert_eq!(fx.notifier.subscriber_count(KeyboardEventKind::WillHide), 0);
    }
}
