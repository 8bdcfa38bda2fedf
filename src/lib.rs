#![doc(html_root_url = "https://docs.rs/instajax/0.0.1")]
#![warn(clippy::pedantic)]
//! Page transitions without full reloads.
//!
//! The core of this crate is [`Morpher`], which reconciles the live [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document)
//! with freshly fetched markup in place, so that focus, scroll position, form input and third-party widget state
//! of untouched elements survive the update.
//!
//! Fetching is up to the caller. The [`error_page`], [`history`] and [`links`] modules contain the small synchronous pieces
//! that usually surround a call to [`Morpher::apply`].

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod error_page;
pub mod history;
pub mod links;
pub mod root;

mod error;
mod markup;
mod morph;

pub use error::{Error, Result};
pub use morph::Morpher;

/// Morphs the current window's document into `markup`.
///
/// This is a shorthand for [`Morpher::for_window`] followed by [`Morpher::apply`].
///
/// # Errors
///
/// See [`Morpher::for_window`] and [`Morpher::apply`].
pub fn morph(markup: &str) -> Result<()> {
	Morpher::for_window()?.apply(markup)
}
