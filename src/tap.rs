// SPDX-License-Identifier: GPL-3.0-only

//! Dismissing the keyboard on taps outside the focused control.
//!
//! A tap on the viewport, or a touch that reaches the screen's background,
//! dismisses the keyboard unless it lands on something the user meant to
//! interact with. [`TapDismissPolicy`] decides which hits are spared.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::HandlerConfig;
use crate::coordinator::KeyboardScrollHandler;
use crate::geometry::Point;
use crate::host::{HitTarget, Host};
use crate::observer::TapObserver;

/// What a tap did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDecision {
    /// The keyboard was not visible.
    KeyboardHidden,
    /// The tap hit a button and buttons are spared.
    SkipButton,
    /// The tap hit a focusable control and those are spared.
    SkipFocusable,
    /// The keyboard was dismissed (or a dismissal was attempted).
    Dismiss,
}

/// Which tap targets leave the keyboard up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TapDismissPolicy {
    pub skip_on_button_hit: bool,
    pub skip_on_focusable_hit: bool,
}

impl TapDismissPolicy {
    #[must_use]
    pub fn from_config(config: &HandlerConfig) -> Self {
        Self {
            skip_on_button_hit: config.skip_dismiss_on_button_hit,
            skip_on_focusable_hit: config.skip_dismiss_on_focusable_hit,
        }
    }

    /// Decides what a tap landing on `hit` should do.
    ///
    /// `hit` is `None` when nothing interactive is under the tap.
    #[must_use]
    pub fn evaluate(&self, keyboard_visible: bool, hit: Option<&HitTarget>) -> TapDecision {
        if !keyboard_visible {
            return TapDecision::KeyboardHidden;
        }

        match hit {
            Some(target) if self.skip_on_button_hit && target.is_button => TapDecision::SkipButton,
            Some(target) if self.skip_on_focusable_hit && target.can_become_focused => {
                TapDecision::SkipFocusable
            }
            _ => TapDecision::Dismiss,
        }
    }
}

impl KeyboardScrollHandler {
    pub fn set_tap_observer<O: TapObserver + 'static>(&mut self, observer: &Rc<RefCell<O>>) {
        let weak = Rc::downgrade(observer);
        let weak: Weak<RefCell<dyn TapObserver>> = weak;
        self.tap_observer = Some(weak);
    }

    pub fn clear_tap_observer(&mut self) {
        self.tap_observer = None;
    }

    /// Handles a tap recognized on the viewport at `location` (viewport
    /// coordinates).
    ///
    /// The tap observer is notified before any dismissal. Returns `None` when
    /// no viewport is managed.
    pub fn handle_tap(&mut self, host: &mut dyn Host, location: Point) -> Option<TapDecision> {
        let viewport = self.resolve_viewport(host)?;
        let keyboard_visible = self.state.keyboard_visible;

        if let Some(observer) = self.tap_observer.as_ref().and_then(Weak::upgrade) {
            if let Ok(mut observer) = observer.try_borrow_mut() {
                observer.did_tap(location, viewport, keyboard_visible);
            }
        }

        let hit = host.hit_test(viewport, location);
        Some(self.apply_tap_policy(host, hit))
    }

    /// Handles a touch that reached the owning screen's root view at
    /// `location` (root view coordinates).
    ///
    /// Returns `None` when the handler has no screen.
    pub fn touches_began(&mut self, host: &mut dyn Host, location: Point) -> Option<TapDecision> {
        let screen_view = self.screen().and_then(|screen| host.screen_view(screen))?;
        let hit = host.hit_test(screen_view, location);
        Some(self.apply_tap_policy(host, hit))
    }

    fn apply_tap_policy(&mut self, host: &mut dyn Host, hit: Option<HitTarget>) -> TapDecision {
        let policy = TapDismissPolicy::from_config(self.config());
        let decision = policy.evaluate(self.state.keyboard_visible, hit.as_ref());

        tracing::debug!("Tap on {:?}: {:?}", hit.map(|target| target.view), decision);
        if decision == TapDecision::Dismiss {
            self.dismiss_keyboard_if_possible(host);
        }
        decision
    }

    /// Ends editing so the keyboard goes away.
    ///
    /// With `force_end_editing_on_dismiss` set, editing is ended on the
    /// screen's root view first and on the viewport second. If that is off or
    /// neither succeeds, the tracked control is asked to resign focus.
    /// Returns `true` if focus was given up.
    pub fn dismiss_keyboard_if_possible(&mut self, host: &mut dyn Host) -> bool {
        let mut dismissed = false;

        if self.config().force_end_editing_on_dismiss {
            if let Some(screen_view) = self.screen().and_then(|screen| host.screen_view(screen)) {
                dismissed = host.end_editing(screen_view);
            }
            if !dismissed {
                if let Some(viewport) = self.resolve_viewport(host) {
                    dismissed = host.end_editing(viewport);
                }
            }
        }

        if !dismissed {
            if let Some(focused) = self.focus.current() {
                dismissed = host.resign_focus(focused.view);
            }
        }

        if dismissed {
            tracing::debug!("Keyboard dismissed");
            self.focus.clear();
        } else {
            tracing::debug!("Nothing to dismiss");
        }
        dismissed
    }
}

// ============================================================================
// Tests
// ============================================================================
