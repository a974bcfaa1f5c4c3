// SPDX-License-Identifier: GPL-3.0-only

//! Optional observers the handler forwards control callbacks to.
//!
//! Every method has a default body. For queries the default returns `None`,
//! meaning "not implemented": the router then answers with its own default
//! (`true` for every should-* query) instead of asking the observer.
//! Notifications default to doing nothing.
//!
//! Observers are attached as [`std::rc::Weak`] references; the handler never
//! keeps them alive.
//!
//! # Example
//!
//! ```rust,ignore
//! struct DigitsOnly;
//!
//! impl TextFieldObserver for DigitsOnly {
//!     fn should_change_characters(
//!         &mut self,
//!         _field: ViewId,
//!         _range: Range<usize>,
//!         replacement: &str,
//!     ) -> Option<bool> {
//!         Some(replacement.chars().all(|c| c.is_ascii_digit()))
//!     }
//! }
//! ```

use std::ops::Range;

use crate::geometry::Point;
use crate::host::ViewId;

/// Observer for single-line text field callbacks.
pub trait TextFieldObserver {
    fn should_begin_editing(&mut self, _field: ViewId) -> Option<bool> {
        None
    }

    fn did_begin_editing(&mut self, _field: ViewId) {}

    fn should_end_editing(&mut self, _field: ViewId) -> Option<bool> {
        None
    }

    fn did_end_editing(&mut self, _field: ViewId) {}

    fn should_change_characters(
        &mut self,
        _field: ViewId,
        _range: Range<usize>,
        _replacement: &str,
    ) -> Option<bool> {
        None
    }

    fn should_clear(&mut self, _field: ViewId) -> Option<bool> {
        None
    }

    fn should_return(&mut self, _field: ViewId) -> Option<bool> {
        None
    }
}

/// Observer for multi-line text view callbacks.
pub trait TextViewObserver {
    fn should_begin_editing(&mut self, _view: ViewId) -> Option<bool> {
        None
    }

    fn did_begin_editing(&mut self, _view: ViewId) {}

    fn should_end_editing(&mut self, _view: ViewId) -> Option<bool> {
        None
    }

    fn did_end_editing(&mut self, _view: ViewId) {}

    fn should_change_text(
        &mut self,
        _view: ViewId,
        _range: Range<usize>,
        _replacement: &str,
    ) -> Option<bool> {
        None
    }

    fn did_change(&mut self, _view: ViewId) {}

    fn did_change_selection(&mut self, _view: ViewId) {}

    fn should_interact_with_url(
        &mut self,
        _view: ViewId,
        _url: &str,
        _range: Range<usize>,
    ) -> Option<bool> {
        None
    }
}

/// Observer for search field callbacks.
pub trait SearchFieldObserver {
    fn should_begin_editing(&mut self, _search: ViewId) -> Option<bool> {
        None
    }

    fn did_begin_editing(&mut self, _search: ViewId) {}

    fn should_end_editing(&mut self, _search: ViewId) -> Option<bool> {
        None
    }

    fn did_end_editing(&mut self, _search: ViewId) {}

    fn text_did_change(&mut self, _search: ViewId, _text: &str) {}

    fn should_change_text(
        &mut self,
        _search: ViewId,
        _range: Range<usize>,
        _replacement: &str,
    ) -> Option<bool> {
        None
    }

    fn search_button_clicked(&mut self, _search: ViewId) {}

    fn bookmark_button_clicked(&mut self, _search: ViewId) {}

    fn cancel_button_clicked(&mut self, _search: ViewId) {}

    fn results_list_button_clicked(&mut self, _search: ViewId) {}

    fn selected_scope_did_change(&mut self, _search: ViewId, _scope: usize) {}
}

/// Observer notified of every tap recognized on the viewport.
pub trait TapObserver {
    fn did_tap(&mut self, location: Point, viewport: ViewId, keyboard_visible: bool);
}
