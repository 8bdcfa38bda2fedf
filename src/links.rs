//! Which anchor clicks are turned into in-place page transitions.

use crate::{Error, Result};
use js_sys::WeakSet;
use tracing::{instrument, trace};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Url};

/// Anchors with this class are always left to the browser.
pub const SKIP_CLASS: &str = "skip-instajax";

/// Decides whether following `href` should be intercepted, given the current page's `origin`.
///
/// A missing or empty `href` counts as `"#"`.
/// Links are only intercepted if their last `#` (if any) comes before their last `/`,
/// which excludes pure fragment navigation like `#top` and `/page#top`,
/// and if they're relative or their origin is `origin`.
///
/// Absolute URLs are resolved with the host's URL parser, so default ports and userinfo don't affect the comparison.
/// Unparseable absolute URLs are left to the browser.
#[must_use]
pub fn should_intercept(href: Option<&str>, origin: &str) -> bool {
	let url = href.filter(|href| !href.is_empty()).unwrap_or("#");
	if url.rfind('#') >= url.rfind('/') {
		return false;
	}
	!url.starts_with("http") || Url::new(url).map_or(false, |url| url.origin().eq_ignore_ascii_case(origin))
}

/// Tracks which anchors already had a click handler attached, by element identity.
///
/// Entries don't keep their anchors alive, and (unlike a marker attribute) survive reconciliation,
/// which removes attributes that aren't part of the incoming markup.
#[derive(Debug, Clone)]
pub struct AnchorRegistry {
	bound: WeakSet,
}

impl Default for AnchorRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl AnchorRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self { bound: WeakSet::new() }
	}

	/// Returns `true` exactly once per anchor: the first time it's claimed.
	pub fn claim(&self, anchor: &Element) -> bool {
		if self.bound.has(anchor.as_ref()) {
			return false;
		}
		self.bound.add(anchor.as_ref());
		true
	}

	#[must_use]
	pub fn is_claimed(&self, anchor: &Element) -> bool {
		self.bound.has(anchor.as_ref())
	}

	/// Anchors in `document` without [`SKIP_CLASS`] that weren't [claimed](`AnchorRegistry::claim`) yet, in document order.
	///
	/// # Errors
	///
	/// Iff the selector query fails.
	#[instrument(skip(self, document))]
	pub fn unclaimed(&self, document: &Document) -> Result<Vec<Element>> {
		let anchors = document.query_selector_all(&format!("a:not(.{})", SKIP_CLASS)).map_err(|error| Error::dom(&error))?;
		let unclaimed: Vec<Element> = (0..anchors.length())
			.filter_map(|i| anchors.get(i))
			.filter_map(|node| node.dyn_into::<Element>().ok())
			.filter(|anchor| !self.is_claimed(anchor))
			.collect();
		trace!(total = anchors.length(), unclaimed = unclaimed.len());
		Ok(unclaimed)
	}
}
