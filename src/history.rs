//! Session history updates after a page has been applied.

use crate::{Error, Result};
use core::{fmt, str::FromStr};
use tracing::{instrument, trace};
use wasm_bindgen::JsValue;
use web_sys::{Event, Window};

/// How a navigation affects the session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
	/// A new entry is added (regular link navigation).
	Push,
	/// The current entry is replaced.
	Replace,
	/// The browser already moved through the history (back/forward), so nothing is recorded.
	Pop,
}

impl HistoryMode {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			HistoryMode::Push => "push",
			HistoryMode::Replace => "replace",
			HistoryMode::Pop => "pop",
		}
	}

	/// The [`Event`] type dispatched on the window after the history was changed, if any.
	#[must_use]
	pub fn event_type(self) -> Option<&'static str> {
		match self {
			HistoryMode::Push => Some("pushstate"),
			HistoryMode::Replace => Some("replacestate"),
			HistoryMode::Pop => None,
		}
	}
}

impl Default for HistoryMode {
	fn default() -> Self {
		HistoryMode::Push
	}
}

impl fmt::Display for HistoryMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for HistoryMode {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"push" => Ok(HistoryMode::Push),
			"replace" => Ok(HistoryMode::Replace),
			"pop" => Ok(HistoryMode::Pop),
			other => Err(Error::InvalidHistoryMode(other.to_string())),
		}
	}
}

/// Records a navigation to `url` in `window`'s history according to `mode`,
/// then announces it with a [`HistoryMode::event_type`] event on `window`.
///
/// # Errors
///
/// Iff the history can't be accessed or updated (for example for cross-origin `url`s), or the event can't be dispatched.
#[instrument(skip(window))]
pub fn update_history(window: &Window, mode: HistoryMode, url: &str) -> Result<()> {
	let history = window.history().map_err(|error| Error::dom(&error))?;
	match mode {
		HistoryMode::Push => history.push_state_with_url(&JsValue::NULL, "", Some(url)),
		HistoryMode::Replace => history.replace_state_with_url(&JsValue::NULL, "", Some(url)),
		HistoryMode::Pop => {
			trace!("History already moved.");
			return Ok(());
		}
	}
	.map_err(|error| Error::dom(&error))?;

	if let Some(event_type) = mode.event_type() {
		let event = Event::new(event_type).map_err(|error| Error::dom(&error))?;
		window.dispatch_event(&event).map_err(|error| Error::dom(&error))?;
	}
	Ok(())
}
