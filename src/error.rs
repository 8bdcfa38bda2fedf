use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Caller-level failures.
///
/// Anything that goes wrong *during* reconciliation is absorbed (and logged) instead,
/// so that the live document always ends up in a consistent state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
	#[error("the markup to apply is empty")]
	EmptyMarkup,
	#[error("no window or document is available")]
	NoDocument,
	#[error("the live document has no {0} to reconcile against")]
	MissingLiveRoot(&'static str),
	#[error("failed to parse markup: {0}")]
	Parse(String),
	#[error("DOM operation failed: {0}")]
	Dom(String),
	#[error("invalid history mode {0:?}, expected \"push\", \"replace\" or \"pop\"")]
	InvalidHistoryMode(String),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

impl Error {
	pub(crate) fn dom(value: &JsValue) -> Self {
		Self::Dom(describe(value))
	}

	pub(crate) fn parse(value: &JsValue) -> Self {
		Self::Parse(describe(value))
	}
}

/// Prefers the `message` of thrown `Error` objects over their debug representation.
pub(crate) fn describe(value: &JsValue) -> String {
	match value.dyn_ref::<js_sys::Error>() {
		Some(error) => error.message().into(),
		None => format!("{:?}", value),
	}
}
