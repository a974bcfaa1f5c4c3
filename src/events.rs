// SPDX-License-Identifier: GPL-3.0-only

//! Keyboard visibility events and the source they are delivered from.
//!
//! The platform reports "keyboard will show" and "keyboard will hide" together
//! with the keyboard frame and the animation the keyboard itself uses. A
//! [`KeyboardEventSource`] is injected into each handler; the handler
//! subscribes and unsubscribes explicitly from its screen lifecycle hooks and
//! receives events over a `futures` channel.
//!
//! [`KeyboardNotifier`] is an in-process broadcast source: the host posts each
//! platform notification once and every subscriber of that kind receives a copy.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::mpsc;
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Which keyboard transition an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardEventKind {
    /// The keyboard is about to appear.
    WillShow,
    /// The keyboard is about to disappear.
    WillHide,
}

impl KeyboardEventKind {
    /// Returns a human-readable name for the event kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyboardEventKind::WillShow => "WillShow",
            KeyboardEventKind::WillHide => "WillHide",
        }
    }
}

/// Timing curve of a keyboard (or handler) animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationCurve {
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
    Linear,
    /// The platform reported a curve value the handler does not know.
    Unspecified,
}

/// A curve plus duration, handed to the host when an animated change starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Animation {
    pub curve: AnimationCurve,
    pub duration: Duration,
}

impl Animation {
    #[must_use]
    pub const fn new(curve: AnimationCurve, duration: Duration) -> Self {
        Self { curve, duration }
    }
}

/// A keyboard show or hide notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyboardEvent {
    pub kind: KeyboardEventKind,
    /// Keyboard end frame in the screen-fixed (portrait) reference frame.
    pub frame: Rect,
    #[serde(default)]
    pub curve: AnimationCurve,
    /// Animation duration; zero means "apply immediately".
    #[serde(default, with = "duration_secs")]
    pub duration: Duration,
}

impl KeyboardEvent {
    /// Creates a will-show event.
    #[must_use]
    pub fn will_show(frame: Rect, curve: AnimationCurve, duration: Duration) -> Self {
        Self {
            kind: KeyboardEventKind::WillShow,
            frame,
            curve,
            duration,
        }
    }

    /// Creates a will-hide event.
    #[must_use]
    pub fn will_hide(frame: Rect, curve: AnimationCurve, duration: Duration) -> Self {
        Self {
            kind: KeyboardEventKind::WillHide,
            frame,
            curve,
            duration,
        }
    }

    /// The animation the keyboard reported for this transition.
    #[must_use]
    pub fn animation(&self) -> Animation {
        Animation::new(self.curve, self.duration)
    }
}

/// Serializes durations as fractional seconds, the unit the platform reports.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO))
    }
}

/// Identifies one subscription made on a [`KeyboardEventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A source of keyboard visibility events.
///
/// Implementations deliver every event of the subscribed kind to `sink` until
/// [`unsubscribe`](KeyboardEventSource::unsubscribe) is called with the
/// returned id.
pub trait KeyboardEventSource {
    fn subscribe(
        &self,
        kind: KeyboardEventKind,
        sink: mpsc::UnboundedSender<KeyboardEvent>,
    ) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

#[derive(Debug, Default)]
struct NotifierInner {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, KeyboardEventKind, mpsc::UnboundedSender<KeyboardEvent>)>,
}

/// In-process broadcast [`KeyboardEventSource`].
///
/// Cloning yields another handle to the same subscriber list, so one notifier
/// can be shared by every handler on the display.
#[derive(Debug, Clone, Default)]
pub struct KeyboardNotifier {
    inner: Rc<RefCell<NotifierInner>>,
}

impl KeyboardNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every subscriber of its kind.
    ///
    /// Subscribers whose receiving end was dropped are pruned. Returns the
    /// number of subscribers the event was delivered to.
    pub fn post(&self, event: KeyboardEvent) -> usize {
        let mut inner = self.inner.borrow_mut();
        let mut delivered = 0;

        inner.subscribers.retain(|(id, kind, sink)| {
            if *kind != event.kind {
                return true;
            }
            match sink.unbounded_send(event) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    tracing::debug!("Pruning closed keyboard subscription {:?}", id);
                    false
                }
            }
        });

        tracing::trace!(
            "Posted {} keyboard event to {} subscriber(s)",
            event.kind.as_str(),
            delivered
        );
        delivered
    }

    /// Returns the number of live subscriptions for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: KeyboardEventKind) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}

impl KeyboardEventSource for KeyboardNotifier {
    fn subscribe(
        &self,
        kind: KeyboardEventKind,
        sink: mpsc::UnboundedSender<KeyboardEvent>,
    ) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.subscribers.push((id, kind, sink));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|(existing, _, _)| *existing != id);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn show_event() -> KeyboardEvent {
        KeyboardEvent::will_show(
            Rect::new(0.0, 352.0, 320.0, 216.0),
            AnimationCurve::EaseInOut,
            Duration::from_millis(250),
        )
    }

    /// Test 1: Events reach subscribers of the matching kind only
    #[tokio::test]
    async fn test_post_delivers_by_kind() {
        let notifier = KeyboardNotifier::new();
        let (show_tx, mut show_rx) = mpsc::unbounded();
        let (hide_tx, mut hide_rx) = mpsc::unbounded();

        notifier.subscribe(KeyboardEventKind::WillShow, show_tx);
        notifier.subscribe(KeyboardEventKind::WillHide, hide_tx);

        assert_eq!(notifier.post(show_event()), 1);
        assert_eq!(show_rx.next().await, Some(show_event()));
        assert!(
            hide_rx.try_recv().is_err(),
            "Hide subscriber must not receive show events"
        );
    }

    /// Test 2: Unsubscribed sinks stop receiving events
    #[test]
    fn test_unsubscribe_stops_delivery() {
        let notifier = KeyboardNotifier::new();
        let (tx, _rx) = mpsc::unbounded();

        let id = notifier.subscribe(KeyboardEventKind::WillShow, tx);
        assert_eq!(notifier.subscriber_count(KeyboardEventKind::WillShow), 1);

        notifier.unsubscribe(id);
        assert_eq!(notifier.subscriber_count(KeyboardEventKind::WillShow), 0);
        assert_eq!(notifier.post(show_event()), 0);
    }

    /// Test 3: Closed receivers are pruned on the next post
    #[test]
    fn test_closed_receivers_are_pruned() {
        let notifier = KeyboardNotifier::new();
        let (tx, rx) = mpsc::unbounded();
        notifier.subscribe(KeyboardEventKind::WillShow, tx);
        drop(rx);

        assert_eq!(notifier.post(show_event()), 0);
        assert_eq!(notifier.subscriber_count(KeyboardEventKind::WillShow), 0);
    }

    /// Test 4: Clones share one subscriber list
    #[test]
    fn test_clones_share_subscribers() {
        let notifier = KeyboardNotifier::new();
        let shared = notifier.clone();
        let (tx, _rx) = mpsc::unbounded();

        shared.subscribe(KeyboardEventKind::WillHide, tx);
        assert_eq!(notifier.subscriber_count(KeyboardEventKind::WillHide), 1);
    }

    /// Test 5: Durations are read as fractional seconds
    #[test]
    fn test_event_json_duration_in_seconds() {
        let json = r#"{
            "kind": "will_show",
            "frame": {"origin": {"x": 0.0, "y": 352.0}, "size": {"width": 320.0, "height": 216.0}},
            "curve": "ease_out",
            "duration": 0.25
        }"#;

        let event: KeyboardEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, KeyboardEventKind::WillShow);
        assert_eq!(event.curve, AnimationCurve::EaseOut);
        assert_eq!(event.duration, Duration::from_millis(250));
    }
}
