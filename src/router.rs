// SPDX-License-Identifier: GPL-3.0-only

//! Lifecycle callback routing for text fields, text views and search fields.
//!
//! The host attaches the handler to every input control of the viewport (see
//! [`KeyboardScrollHandler::attach_all_field_delegates`]) and calls the entry
//! points below from the controls' callbacks. Each entry point updates the
//! focus tracker and, where relevant, the scroll position, then forwards to
//! the observer attached for that control kind.
//!
//! # Forwarding
//!
//! Observers are held weakly. A missing or dropped observer, or one that does
//! not implement a query (returns `None`), makes the router answer `true`.
//!
//! # Focus Tracking
//!
//! | Callback      | Text field / text view          | Search field                   |
//! |---------------|---------------------------------|--------------------------------|
//! | should begin  | set focus if inside viewport    | clear focus if inside viewport |
//! | did begin     | set focus, reveal or snapshot   | set focus, reveal or snapshot  |
//! | did end       | clear focus if it matches       | clear focus if it matches      |

use std::cell::RefCell;
use std::ops::Range;
use std::rc::{Rc, Weak};

use crate::coordinator::KeyboardScrollHandler;
use crate::host::{ControlKind, Host, ViewId};
use crate::observer::{SearchFieldObserver, TextFieldObserver, TextViewObserver};
use crate::scroller;

/// Weakly held observers, one per control kind.
#[derive(Default)]
pub(crate) struct FieldObservers {
    text_field: Option<Weak<RefCell<dyn TextFieldObserver>>>,
    text_view: Option<Weak<RefCell<dyn TextViewObserver>>>,
    search_field: Option<Weak<RefCell<dyn SearchFieldObserver>>>,
}

/// Calls `f` on the observer in `slot` if it is still alive.
///
/// An observer that is already borrowed (a callback re-entering the handler)
/// counts as absent.
fn with_observer<O: ?Sized, R>(
    slot: &Option<Weak<RefCell<O>>>,
    f: impl FnOnce(&mut O) -> R,
) -> Option<R> {
    let observer = slot.as_ref()?.upgrade()?;
    let mut guard = observer.try_borrow_mut().ok()?;
    let result = f(&mut guard);
    Some(result)
}

impl KeyboardScrollHandler {
    // ========================================================================
    // Observer Attachment
    // ========================================================================

    pub fn set_text_field_observer<O: TextFieldObserver + 'static>(
        &mut self,
        observer: &Rc<RefCell<O>>,
    ) {
        let weak = Rc::downgrade(observer);
        let weak: Weak<RefCell<dyn TextFieldObserver>> = weak;
        self.observers.text_field = Some(weak);
    }

    pub fn set_text_view_observer<O: TextViewObserver + 'static>(
        &mut self,
        observer: &Rc<RefCell<O>>,
    ) {
        let weak = Rc::downgrade(observer);
        let weak: Weak<RefCell<dyn TextViewObserver>> = weak;
        self.observers.text_view = Some(weak);
    }

    pub fn set_search_field_observer<O: SearchFieldObserver + 'static>(
        &mut self,
        observer: &Rc<RefCell<O>>,
    ) {
        let weak = Rc::downgrade(observer);
        let weak: Weak<RefCell<dyn SearchFieldObserver>> = weak;
        self.observers.search_field = Some(weak);
    }

    pub fn clear_field_observers(&mut self) {
        self.observers = FieldObservers::default();
    }

    // ========================================================================
    // Delegate Attachment
    // ========================================================================

    /// Walks the viewport depth-first, parents before children, and asks the
    /// host to route every input control's callbacks to this handler.
    ///
    /// The subtree of a control is not entered. Returns the number of controls
    /// attached.
    pub fn attach_all_field_delegates(&mut self, host: &mut dyn Host) -> usize {
        let Some(viewport) = self.resolve_viewport(host) else {
            return 0;
        };

        let mut attached = 0;
        let mut stack = vec![viewport];
        while let Some(view) = stack.pop() {
            if let Some(kind) = host.control_kind(view) {
                host.attach_field_delegate(view, kind);
                attached += 1;
                continue;
            }
            stack.extend(host.subviews(view).into_iter().rev());
        }

        tracing::debug!("Attached field delegates to {} control(s)", attached);
        attached
    }

    // ========================================================================
    // Shared Lifecycle
    // ========================================================================

    fn control_should_begin_editing(&mut self, host: &dyn Host, view: ViewId, kind: ControlKind) {
        let Some(viewport) = self.resolve_viewport(host) else {
            return;
        };
        if !host.is_descendant(view, viewport) {
            return;
        }

        match kind {
            ControlKind::SearchField => self.focus.clear(),
            ControlKind::TextField | ControlKind::TextView => self.focus.set(view, Some(kind)),
        }
    }

    fn control_did_begin_editing(
        &mut self,
        host: &mut dyn Host,
        view: ViewId,
        kind: Option<ControlKind>,
    ) {
        self.focus.set(view, kind);

        let Some(viewport) = self.resolve_viewport(host) else {
            return;
        };
        let Some(geometry) = host.viewport_geometry(viewport) else {
            return;
        };

        if self.state.keyboard_visible {
            if let Some(frame) = host.frame_in(view, viewport) {
                let force_manual = scroller::is_native_scroll_unreliable(&geometry);
                scroller::scroll_to_reveal(host, viewport, frame, true, force_manual);
            }
        } else {
            self.state.offset_before_show = geometry.content_offset;
        }
    }

    fn control_did_end_editing(&mut self, view: ViewId) {
        self.focus.clear_if(view);
    }

    /// Records that `view` became the focused control.
    ///
    /// For controls whose callbacks are not routed through this handler.
    pub fn view_became_first_responder(&mut self, host: &mut dyn Host, view: ViewId) {
        tracing::trace!("{:?} became first responder", view);
        self.control_did_begin_editing(host, view, None);
    }

    // ========================================================================
    // Text Fields
    // ========================================================================

    pub fn text_field_should_begin_editing(&mut self, host: &dyn Host, field: ViewId) -> bool {
        tracing::trace!("text field {:?}: should begin editing", field);
        self.control_should_begin_editing(host, field, ControlKind::TextField);
        with_observer(&self.observers.text_field, |o| o.should_begin_editing(field))
            .flatten()
            .unwrap_or(true)
    }

    pub fn text_field_did_begin_editing(&mut self, host: &mut dyn Host, field: ViewId) {
        tracing::trace!("text field {:?}: did begin editing", field);
        self.control_did_begin_editing(host, field, Some(ControlKind::TextField));
        with_observer(&self.observers.text_field, |o| o.did_begin_editing(field));
    }

    pub fn text_field_should_end_editing(&mut self, field: ViewId) -> bool {
        with_observer(&self.observers.text_field, |o| o.should_end_editing(field))
            .flatten()
            .unwrap_or(true)
    }

    pub fn text_field_did_end_editing(&mut self, field: ViewId) {
        tracing::trace!("text field {:?}: did end editing", field);
        self.control_did_end_editing(field);
        with_observer(&self.observers.text_field, |o| o.did_end_editing(field));
    }

    pub fn text_field_should_change_characters(
        &mut self,
        field: ViewId,
        range: Range<usize>,
        replacement: &str,
    ) -> bool {
        with_observer(&self.observers.text_field, |o| {
            o.should_change_characters(field, range, replacement)
        })
        .flatten()
        .unwrap_or(true)
    }

    pub fn text_field_should_clear(&mut self, field: ViewId) -> bool {
        with_observer(&self.observers.text_field, |o| o.should_clear(field))
            .flatten()
            .unwrap_or(true)
    }

    pub fn text_field_should_return(&mut self, field: ViewId) -> bool {
        with_observer(&self.observers.text_field, |o| o.should_return(field))
            .flatten()
            .unwrap_or(true)
    }

    // ========================================================================
    // Text Views
    // ========================================================================

    pub fn text_view_should_begin_editing(&mut self, host: &dyn Host, view: ViewId) -> bool {
        tracing::trace!("text view {:?}: should begin editing", view);
        self.control_should_begin_editing(host, view, ControlKind::TextView);
        with_observer(&self.observers.text_view, |o| o.should_begin_editing(view))
            .flatten()
            .unwrap_or(true)
    }

    pub fn text_view_did_begin_editing(&mut self, host: &mut dyn Host, view: ViewId) {
        tracing::trace!("text view {:?}: did begin editing", view);
        self.control_did_begin_editing(host, view, Some(ControlKind::TextView));
        with_observer(&self.observers.text_view, |o| o.did_begin_editing(view));
    }

    pub fn text_view_should_end_editing(&mut self, view: ViewId) -> bool {
        with_observer(&self.observers.text_view, |o| o.should_end_editing(view))
            .flatten()
            .unwrap_or(true)
    }

    pub fn text_view_did_end_editing(&mut self, view: ViewId) {
        tracing::trace!("text view {:?}: did end editing", view);
        self.control_did_end_editing(view);
        with_observer(&self.observers.text_view, |o| o.did_end_editing(view));
    }

    pub fn text_view_should_change_text(
        &mut self,
        view: ViewId,
        range: Range<usize>,
        replacement: &str,
    ) -> bool {
        with_observer(&self.observers.text_view, |o| {
            o.should_change_text(view, range, replacement)
        })
        .flatten()
        .unwrap_or(true)
    }

    pub fn text_view_did_change(&mut self, view: ViewId) {
        with_observer(&self.observers.text_view, |o| o.did_change(view));
    }

    pub fn text_view_did_change_selection(&mut self, view: ViewId) {
        with_observer(&self.observers.text_view, |o| o.did_change_selection(view));
    }

    pub fn text_view_should_interact_with_url(
        &mut self,
        view: ViewId,
        url: &str,
        range: Range<usize>,
    ) -> bool {
        with_observer(&self.observers.text_view, |o| {
            o.should_interact_with_url(view, url, range)
        })
        .flatten()
        .unwrap_or(true)
    }

    // ========================================================================
    // Search Fields
    // ========================================================================

    /// Clears focus (rather than setting it) when the search field is inside
    /// the viewport; focus is set once editing actually begins.
    pub fn search_field_should_begin_editing(&mut self, host: &dyn Host, search: ViewId) -> bool {
        tracing::trace!("search field {:?}: should begin editing", search);
        self.control_should_begin_editing(host, search, ControlKind::SearchField);
        with_observer(&self.observers.search_field, |o| o.should_begin_editing(search))
            .flatten()
            .unwrap_or(true)
    }

    pub fn search_field_did_begin_editing(&mut self, host: &mut dyn Host, search: ViewId) {
        tracing::trace!("search field {:?}: did begin editing", search);
        self.control_did_begin_editing(host, search, Some(ControlKind::SearchField));
        with_observer(&self.observers.search_field, |o| o.did_begin_editing(search));
    }

    pub fn search_field_should_end_editing(&mut self, search: ViewId) -> bool {
        with_observer(&self.observers.search_field, |o| o.should_end_editing(search))
            .flatten()
            .unwrap_or(true)
    }

    pub fn search_field_did_end_editing(&mut self, search: ViewId) {
        tracing::trace!("search field {:?}: did end editing", search);
        self.control_did_end_editing(search);
        with_observer(&self.observers.search_field, |o| o.did_end_editing(search));
    }

    pub fn search_field_text_did_change(&mut self, search: ViewId, text: &str) {
        with_observer(&self.observers.search_field, |o| o.text_did_change(search, text));
    }

    pub fn search_field_should_change_text(
        &mut self,
        search: ViewId,
        range: Range<usize>,
        replacement: &str,
    ) -> bool {
        with_observer(&self.observers.search_field, |o| {
            o.should_change_text(search, range, replacement)
        })
        .flatten()
        .unwrap_or(true)
    }

    pub fn search_field_search_button_clicked(&mut self, search: ViewId) {
        with_observer(&self.observers.search_field, |o| o.search_button_clicked(search));
    }

    pub fn search_field_bookmark_button_clicked(&mut self, search: ViewId) {
        with_observer(&self.observers.search_field, |o| o.bookmark_button_clicked(search));
    }

    pub fn search_field_cancel_button_clicked(&mut self, search: ViewId) {
        with_observer(&self.observers.search_field, |o| o.cancel_button_clicked(search));
    }

    pub fn search_field_results_list_button_clicked(&mut self, search: ViewId) {
        with_observer(&self.observers.search_field, |o| o.results_list_button_clicked(search));
    }

    pub fn search_field_selected_scope_did_change(&mut self, search: ViewId, scope: usize) {
        with_observer(&self.observers.search_field, |o| o.selected_scope_did_change(search, scope));
    }
}

// ============================================================================
// Tests
// ============================================================================
