// SPDX-License-Identifier: GPL-3.0-only

//! Handler configuration.
//!
//! [`HandlerConfig`] holds the caller-set switches that shape how the handler
//! reacts to keyboard and tap events. It can be built in code or loaded from
//! JSON; every field is optional in JSON and falls back to its default.
//!
//! ```json
//! {
//!     "restore_offset_on_hide": true,
//!     "static_offset_y": 0.0,
//!     "skip_dismiss_on_button_hit": true
//! }
//! ```
//!
//! The custom offset resolver is a closure and therefore lives on the handler
//! itself, see
//! [`set_offset_resolver`](crate::KeyboardScrollHandler::set_offset_resolver).

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::scroller::ViewportGeometry;

/// Computes the offset to scroll to when the keyboard appears.
///
/// Receives the viewport geometry and the keyboard frame (rotated into the
/// interface orientation, not intersected with the viewport).
pub type OffsetResolver = Box<dyn Fn(&ViewportGeometry, Rect) -> Point>;

/// Caller-set configuration of a keyboard scroll handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Return to the offset recorded before the keyboard appeared once it hides.
    pub restore_offset_on_hide: bool,
    /// When non-zero, scroll to this literal y offset on show instead of
    /// revealing the focused control.
    pub static_offset_y: f64,
    /// Ignore keyboard events while set.
    pub suppress_events: bool,
    /// Dismiss by ending editing on the whole screen before falling back to
    /// resigning the tracked control.
    pub force_end_editing_on_dismiss: bool,
    /// Do not dismiss when a tap lands on a button.
    pub skip_dismiss_on_button_hit: bool,
    /// Do not dismiss when a tap lands on a control that can take focus.
    pub skip_dismiss_on_focusable_hit: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            restore_offset_on_hide: false,
            static_offset_y: 0.0,
            suppress_events: false,
            force_end_editing_on_dismiss: true,
            skip_dismiss_on_button_hit: false,
            skip_dismiss_on_focusable_hit: true,
        }
    }
}

impl HandlerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::from)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::from(e).with_file_path(display.clone()))?;

        let config = Self::from_json_str(&contents).map_err(|e| e.with_file_path(display))?;
        tracing::debug!("Loaded handler configuration from {}", path.display());
        Ok(config)
    }

    #[must_use]
    pub fn with_restore_offset_on_hide(mut self, restore: bool) -> Self {
        self.restore_offset_on_hide = restore;
        self
    }

    #[must_use]
    pub fn with_static_offset_y(mut self, offset: f64) -> Self {
        self.static_offset_y = offset;
        self
    }

    #[must_use]
    pub fn with_suppress_events(mut self, suppress: bool) -> Self {
        self.suppress_events = suppress;
        self
    }

    #[must_use]
    pub fn with_force_end_editing_on_dismiss(mut self, force: bool) -> Self {
        self.force_end_editing_on_dismiss = force;
        self
    }

    #[must_use]
    pub fn with_skip_dismiss_on_button_hit(mut self, skip: bool) -> Self {
        self.skip_dismiss_on_button_hit = skip;
        self
    }

    #[must_use]
    pub fn with_skip_dismiss_on_focusable_hit(mut self, skip: bool) -> Self {
        self.skip_dismiss_on_focusable_hit = skip;
        self
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while loading a [`HandlerConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    IoError {
        source: std::io::Error,
        file_path: Option<String>,
    },
    /// The configuration is not valid JSON or has mistyped fields.
    JsonError {
        source: serde_json::Error,
        file_path: Option<String>,
        line_number: Option<usize>,
    },
}

impl ConfigError {
    /// Attaches the path of the file being loaded.
    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        match &mut self {
            ConfigError::IoError { file_path, .. } | ConfigError::JsonError { file_path, .. } => {
                *file_path = Some(path.into());
            }
        }
        self
    }

    /// Returns the file path the error relates to, if known.
    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        match self {
            ConfigError::IoError { file_path, .. } | ConfigError::JsonError { file_path, .. } => {
                file_path.as_deref()
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError { source, file_path } => {
                write!(f, "I/O error")?;
                if let Some(path) = file_path {
                    write!(f, " reading config '{}'", path)?;
                }
                write!(f, ": {}", source)
            }
            ConfigError::JsonError {
                source,
                file_path,
                line_number,
            } => {
                write!(f, "Invalid configuration")?;
                if let Some(path) = file_path {
                    write!(f, " in '{}'", path)?;
                }
                if let Some(line) = line_number {
                    write!(f, " at line {}", line)?;
                }
                write!(f, ": {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::JsonError { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            source: err,
            file_path: None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        let line = err.line();
        Self::JsonError {
            source: err,
            file_path: None,
            line_number: (line > 0).then_some(line),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
