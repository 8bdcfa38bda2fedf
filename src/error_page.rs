//! Error pages shown in place of markup that couldn't be fetched.

use crate::{markup::loggable, Morpher, Result};
use std::borrow::Cow;
use tracing::instrument;

/// Replaced with the (HTML-escaped) error message by [`ErrorTemplate::render`].
pub const PLACEHOLDER: &str = "%error%";

/// A `<body>` with an error icon, the message and a reload button.
pub const DEFAULT_TEMPLATE: &str = r#"<body>
	<style>
	.instajax-error-icon {
		width: 64px;
		height: 64px;
		margin-bottom: 1rem;
		border-radius: 50%;
		background-color: #ff4d4d;
		display: inline-flex;
		justify-content: center;
		align-items: center;
	}
	.instajax-error-icon::after {
		content: "!";
		color: white;
		font-size: 48px;
		font-weight: bold;
	}
	.instajax-error-description {
		font-size: 16px;
	}
	.instajax-reload {
		padding: 0.5rem 1rem;
		border-radius: 4px;
		background: none;
		color: inherit;
		outline-color: currentColor;
		cursor: pointer;
	}
	</style>
	<center>
		<div class="instajax-error-icon"></div>
		<p class="instajax-error-description">%error%</p>
		<button class="instajax-reload" onclick="window.location.reload()">Reload</button>
	</center>
</body>"#;

/// Markup that stands in for a page that failed to load.
///
/// Every occurrence of [`PLACEHOLDER`] is replaced with the error message.
/// Since the result goes through [`Morpher::apply`] like any other page, the template decides which part of the document it replaces:
/// The [default](`DEFAULT_TEMPLATE`) is a `<body>` and so replaces the whole body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorTemplate(Cow<'static, str>);

impl Default for ErrorTemplate {
	fn default() -> Self {
		Self(Cow::Borrowed(DEFAULT_TEMPLATE))
	}
}

impl ErrorTemplate {
	#[must_use]
	pub fn new(template: impl Into<Cow<'static, str>>) -> Self {
		Self(template.into())
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Fills in `message`, escaped for use in text content and attribute values.
	#[must_use]
	pub fn render(&self, message: &str) -> String {
		self.0.replace(PLACEHOLDER, &escape(message))
	}

	/// Renders `message` and applies the result to `morpher`'s document.
	///
	/// # Errors
	///
	/// See [`Morpher::apply`].
	#[instrument(skip(self, morpher, message), fields(message = loggable(message)))]
	pub fn show(&self, morpher: &mut Morpher, message: &str) -> Result<()> {
		morpher.apply(&self.render(message))
	}
}

fn escape(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c),
		}
	}
	escaped
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_placeholder_is_replaced() {
		let template = ErrorTemplate::new("<p title=\"%error%\">%error%</p>");
		assert_eq!(template.render("offline"), "<p title=\"offline\">offline</p>");
	}

	#[test]
	fn message_is_escaped() {
		let template = ErrorTemplate::new("<p>%error%</p>");
		assert_eq!(template.render("<b>\"x\" & 'y'</b>"), "<p>&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;</p>");
	}

	#[test]
	fn default_template_targets_the_body() {
		let rendered = ErrorTemplate::default().render("NetworkError");
		assert!(rendered.starts_with("<body>"));
		assert!(rendered.contains(">NetworkError</p>"));
		assert!(!rendered.contains(PLACEHOLDER));
	}
}
