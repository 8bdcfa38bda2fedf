//! Decides which part of the live document incoming markup is reconciled against.

use crate::{markup, Error, Result};
use tracing::{instrument, trace};
use wasm_bindgen::JsCast;
use web_sys::{Document, DocumentFragment, DomParser, Element, HtmlTemplateElement, Node, SupportedType};

/// How a [`Selection`] is reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
	/// [`Selection::live`] is patched into [`Selection::target`], including its own attributes.
	WholeNode,
	/// [`Selection::live`]'s child nodes are replaced by clones of [`Selection::target`]'s child nodes.
	///
	/// No node identity is preserved in this mode.
	ChildrenOnly,
}

/// A live root, the parsed root it should come to match and the way to get there.
#[derive(Debug, Clone)]
pub struct Selection {
	pub live: Node,
	pub target: Node,
	pub mode: Mode,
}

/// Parses `markup` and selects the roots to reconcile.
///
/// `stripped` is `markup` without its doctype declaration (if any). Root markers are looked for in it.
///
/// In order:
///
/// 1. An `<html>` tag (or both `<head>` and `<body>`) selects the document elements.
/// 2. A `<head>` tag selects the heads.
/// 3. A `<body>` tag selects the bodies.
/// 4. A fragment consisting of a single element selects it and a live counterpart,
///    looked up by `id`, then by tag name and classes, then by tag name alone.
/// 5. Anything else replaces the live body's children.
///
/// Cases 1 to 3 are parsed as a whole document by [***DOMParser***](https://developer.mozilla.org/en-US/docs/Web/API/DOMParser).
/// Fragments are parsed as the content of a detached `<template>` instead,
/// so that elements like `<tr>`, `<title>` or `<style>` stay where they are written and scripts stay inert.
///
/// Root markers are plain text matches: A `<body` inside a comment, attribute value or script text counts, too.
/// `<pre><!-- <body> --></pre>` therefore reconciles the whole body.
///
/// # Errors
///
/// Iff the markup can't be parsed, the live document lacks the selected root,
/// or the parsed document is missing the structure [***DOMParser***](https://developer.mozilla.org/en-US/docs/Web/API/DOMParser) always creates.
#[instrument(skip(live, parser, markup, stripped))]
pub fn select(live: &Document, parser: &DomParser, markup: &str, stripped: &str) -> Result<Selection> {
	let has_head = markup::has_tag(stripped, "head");
	let has_body = markup::has_tag(stripped, "body");

	if markup::has_tag(stripped, "html") || has_head || has_body {
		let parsed = parser.parse_from_string(markup, SupportedType::TextHtml).map_err(|error| Error::parse(&error))?;

		if markup::has_tag(stripped, "html") || (has_head && has_body) {
			trace!("Selected document elements.");
			return Ok(Selection {
				live: live.document_element().ok_or(Error::MissingLiveRoot("document element"))?.into(),
				target: parsed.document_element().ok_or_else(|| missing_parsed("document element"))?.into(),
				mode: Mode::WholeNode,
			});
		}

		if has_head {
			trace!("Selected heads.");
			return Ok(Selection {
				live: live.head().ok_or(Error::MissingLiveRoot("head"))?.into(),
				target: parsed.head().ok_or_else(|| missing_parsed("head"))?.into(),
				mode: Mode::WholeNode,
			});
		}

		trace!("Selected bodies.");
		return Ok(Selection {
			live: live.body().ok_or(Error::MissingLiveRoot("body"))?.into(),
			target: parsed.body().ok_or_else(|| missing_parsed("body"))?.into(),
			mode: Mode::WholeNode,
		});
	}

	let live_body = live.body().ok_or(Error::MissingLiveRoot("body"))?;
	let fragment = parse_fragment(live, stripped)?;

	let children = fragment.child_nodes();
	if children.length() == 1 {
		if let Some(element) = children.get(0).and_then(|node| node.dyn_into::<Element>().ok()) {
			if let Some(counterpart) = find_counterpart(live, &element) {
				trace!(tag = %element.tag_name(), "Selected single element fragment.");
				return Ok(Selection {
					live: counterpart.into(),
					target: element.into(),
					mode: Mode::WholeNode,
				});
			}
		}
	}

	trace!(fragment_len = children.length(), "No counterpart found. Falling back to replacing the body's children.");
	Ok(Selection {
		live: live_body.into(),
		target: fragment.into(),
		mode: Mode::ChildrenOnly,
	})
}

/// Parses `markup` into the inert content of a `<template>` that's never attached anywhere.
fn parse_fragment(live: &Document, markup: &str) -> Result<DocumentFragment> {
	let template: HtmlTemplateElement = live
		.create_element("template")
		.map_err(|error| Error::parse(&error))?
		.dyn_into()
		.map_err(|element: Element| Error::Parse(format!("`<template>` created as {}", element.node_name())))?;
	template.set_inner_html(markup);
	Ok(template.content())
}

fn missing_parsed(what: &str) -> Error {
	Error::Parse(format!("parsed document has no {}", what))
}

/// Finds the live element a detached single-element fragment most likely stands for.
fn find_counterpart(live: &Document, element: &Element) -> Option<Element> {
	let id = element.id();
	if !id.is_empty() {
		if let Some(by_id) = live.get_element_by_id(&id) {
			return Some(by_id);
		}
		trace!("No live element with matching id.");
	}

	let same_name = live.get_elements_by_tag_name(&element.tag_name());

	let class_list = element.class_list();
	let classes: Vec<String> = (0..class_list.length()).filter_map(|i| class_list.item(i)).collect();
	if !classes.is_empty() {
		let by_classes = (0..same_name.length()).filter_map(|i| same_name.item(i)).find(|candidate| {
			let candidate_classes = candidate.class_list();
			classes.iter().all(|class| candidate_classes.contains(class))
		});
		if by_classes.is_some() {
			return by_classes;
		}
		trace!("No live element with matching tag name and classes.");
	}

	same_name.item(0)
}
