// SPDX-License-Identifier: GPL-3.0-only

//! Tracking of the control currently believed to hold input focus.
//!
//! The tracker only stores a [`ViewId`] handle. It never keeps the control
//! alive and never asks the host whether the control still exists; callers
//! resolve the handle through the host when they need the control.

use crate::host::{ControlKind, ViewId};

/// Handle to the focused control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusHandle {
    pub view: ViewId,
    /// `None` for controls reported through the generic
    /// "became first responder" notification.
    pub kind: Option<ControlKind>,
}

/// Holds the current [`FocusHandle`], if any.
#[derive(Debug, Clone, Default)]
pub struct FocusTracker {
    current: Option<FocusHandle>,
}

impl FocusTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tracked control.
    #[must_use]
    pub fn current(&self) -> Option<FocusHandle> {
        self.current
    }

    /// Returns `true` if `view` is the tracked control.
    #[must_use]
    pub fn is_focused(&self, view: ViewId) -> bool {
        self.current.is_some_and(|handle| handle.view == view)
    }

    /// Tracks `view` as the focused control.
    pub fn set(&mut self, view: ViewId, kind: Option<ControlKind>) {
        tracing::trace!("Focus -> {:?} ({:?})", view, kind);
        self.current = Some(FocusHandle { view, kind });
    }

    /// Forgets the tracked control.
    pub fn clear(&mut self) {
        if self.current.take().is_some() {
            tracing::trace!("Focus cleared");
        }
    }

    /// Forgets the tracked control only if it is `view`.
    ///
    /// Returns `true` if the tracker was cleared.
    pub fn clear_if(&mut self, view: ViewId) -> bool {
        if self.is_focused(view) {
            self.clear();
            true
        } else {
            false
        }
    }
}
