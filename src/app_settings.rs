// SPDX-License-Identifier: GPL-3.0-only

//! Centralized crate settings and constants.

use std::time::Duration;

/// Crate identifier used as the default tracing target filter.
pub const LOG_TARGET: &str = "keyscroll";

/// Default configuration file name looked up by the demo binary.
pub const CONFIG_FILE_NAME: &str = "keyscroll.json";

/// Duration of the scroll animations the handler starts on its own
/// (custom resolver offsets and the static offset), in milliseconds.
pub const SCROLL_ANIMATION_DURATION_MS: u64 = 300;

/// [`SCROLL_ANIMATION_DURATION_MS`] as a [`Duration`].
pub const SCROLL_ANIMATION_DURATION: Duration = Duration::from_millis(SCROLL_ANIMATION_DURATION_MS);
