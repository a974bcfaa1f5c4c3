// SPDX-License-Identifier: GPL-3.0-only

//! Keyscroll - keeps focused input controls visible above an on-screen keyboard
//!
//! A [`KeyboardScrollHandler`] is attached to one screen and one scrollable
//! viewport. While the screen is on display it listens for keyboard show and
//! hide events, pads the viewport's bottom content inset by the part the
//! keyboard covers, scrolls the focused control into view, and dismisses the
//! keyboard when the user taps outside any control.
//!
//! # Architecture
//!
//! The handler never talks to a UI toolkit directly. Everything it needs from
//! the host (view hierarchy, scrolling, editing, animations) goes through the
//! [`Host`] trait, and keyboard events arrive through a
//! [`KeyboardEventSource`]. [`sim::SimulatedHost`] and
//! [`KeyboardNotifier`] implement both in memory.
//!
//! # Modules
//!
//! - `app_settings`: Crate-wide constants
//! - `config`: Handler configuration with JSON loading
//! - `coordinator`: Keyboard show/hide state machine ([`KeyboardScrollHandler`])
//! - `events`: Keyboard event payloads and the event source
//! - `focus`: Tracking of the focused control
//! - `geometry`: Points, sizes, rectangles and insets
//! - `host`: The host toolkit abstraction
//! - `observer`: Observer traits control callbacks are forwarded to
//! - `router`: Text field, text view and search field callback routing
//! - `scroller`: Scroll-into-view computation
//! - `sim`: In-memory host for tests and the scenario player
//! - `tap`: Tap-to-dismiss policy

pub mod app_settings;
pub mod config;
pub mod coordinator;
pub mod events;
pub mod focus;
pub mod geometry;
pub mod host;
pub mod observer;
pub mod router;
pub mod scroller;
pub mod sim;
pub mod tap;

pub use crate::config::{ConfigError, HandlerConfig, OffsetResolver};
pub use crate::coordinator::{CoordinatorState, KeyboardScrollHandler, KeyboardState};
pub use crate::events::{
    AnimationCurve, KeyboardEvent, KeyboardEventKind, KeyboardEventSource, KeyboardNotifier,
};
pub use crate::geometry::{EdgeInsets, Point, Rect, Size};
pub use crate::host::{ControlKind, Host, ScreenId, ViewId};
pub use crate::observer::{SearchFieldObserver, TapObserver, TextFieldObserver, TextViewObserver};
pub use crate::tap::{TapDecision, TapDismissPolicy};

// ============================================================================
// Integration Tests
// ============================================================================
