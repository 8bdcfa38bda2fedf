use crate::{
	error::describe,
	markup::{self, loggable},
	root::{self, Mode},
	Error, Result,
};
use hashbrown::{hash_map::Entry, HashMap, HashSet};
use tracing::{error, info, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};
use wasm_bindgen::JsCast;
use web_sys::{Document, DomParser, Element, Node, NodeList};

/// Reconciles a live [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document) with incoming markup.
///
/// Each [`apply`](`Morpher::apply`) parses the markup from scratch and compares it against whatever the document contains at that moment.
/// Nothing about the previous call is remembered, so the document may be changed freely between calls.
///
/// # Node Identity
///
/// Live nodes are reused wherever possible: Elements are matched first by `id` and then by position and tag name,
/// moved where necessary and only then patched. Event listeners, focus and other state attached to matched nodes therefore survive.
///
/// Mismatched nodes are replaced by clones of their counterpart instead.
///
/// # Scripts
///
/// `<script>` elements are never edited in place. A script that differs from its counterpart is replaced by a freshly created one,
/// as are scripts in inserted content, so that the browser executes them.
///
/// # Concurrency
///
/// Reconciliation is synchronous. Changes made to the document by anyone else *during* a call aren't supported.
#[derive(Debug)]
pub struct Morpher {
	document: Document,
	parser: DomParser,
}

/// A single [`Morpher::apply`] call's view of the live document.
struct Reconciliation<'a> {
	document: &'a Document,
	stats: MorphStats,
}

/// Per-call mutation counters, for logging only.
#[derive(Debug, Default, Clone, Copy)]
struct MorphStats {
	patched: usize,
	moved: usize,
	inserted: usize,
	replaced: usize,
	removed: usize,
	text_updates: usize,
	attribute_updates: usize,
	scripts_rebuilt: usize,
}

impl Morpher {
	/// Creates a new [`Morpher`] that reconciles `document`.
	///
	/// # Errors
	///
	/// Iff no [***DOMParser***](https://developer.mozilla.org/en-US/docs/Web/API/DOMParser) can be constructed.
	#[instrument]
	pub fn new(document: Document) -> Result<Self> {
		Ok(Self {
			document,
			parser: DomParser::new().map_err(|error| Error::dom(&error))?,
		})
	}

	/// Creates a new [`Morpher`] for the current window's document.
	///
	/// # Errors
	///
	/// Iff there is no window or document, or see [`Morpher::new`].
	pub fn for_window() -> Result<Self> {
		let document = web_sys::window().and_then(|window| window.document()).ok_or(Error::NoDocument)?;
		Self::new(document)
	}

	/// Mutates the live document in place to match `markup`.
	///
	/// `markup` may be a whole document, a `<head>` or `<body>`, a single element (which is matched up with its live counterpart)
	/// or any other fragment (which replaces the body's content). See [`root::select`] for the details.
	///
	/// Malformed markup is parsed leniently, like the browser would.
	///
	/// # Errors
	///
	/// Iff `markup` is empty, the markup can't be parsed at all or the live document lacks the part to reconcile against.
	/// The document isn't modified in these cases.
	///
	/// Failed individual DOM operations during reconciliation are logged instead, and the remaining document is still processed.
	#[instrument(skip(self, markup), fields(markup = loggable(markup)))]
	pub fn apply(&mut self, markup: &str) -> Result<()> {
		let markup = markup.trim();
		let stripped = markup::strip_doctype(markup);
		if stripped.is_empty() {
			return Err(Error::EmptyMarkup);
		}

		let selection = root::select(&self.document, &self.parser, markup, stripped)?;

		let mut reconciliation = Reconciliation {
			document: &self.document,
			stats: MorphStats::default(),
		};
		match selection.mode {
			Mode::WholeNode => reconciliation.patch_node(&selection.live, Some(&selection.target)),
			Mode::ChildrenOnly => reconciliation.replace_children(&selection.live, &selection.target),
		}
		info!(mode = ?selection.mode, stats = ?reconciliation.stats, "Reconciliation complete.");
		Ok(())
	}
}

impl Reconciliation<'_> {

	/// Makes `live` equivalent to `target`, or removes it if there is no `target`.
	#[instrument(skip(self, live, target), fields(name = %live.node_name()))]
	fn patch_node(&mut self, live: &Node, target: Option<&Node>) {
		let target = match target {
			Some(target) => target,
			None => return self.remove(live),
		};

		let kind = live.node_type();
		if !same_kind_and_name(live, target) {
			trace!(target_kind = target.node_type(), target_name = %target.node_name(), "Mismatch. Replacing the node.");
			return self.replace(live, target);
		}

		self.stats.patched += 1;
		match kind {
			Node::TEXT_NODE | Node::COMMENT_NODE | Node::CDATA_SECTION_NODE => {
				let value = target.node_value();
				if live.node_value() != value {
					trace!(value = loggable(value.as_deref().unwrap_or_default()), "Updating character data.");
					live.set_node_value(value.as_deref());
					self.stats.text_updates += 1;
				}
			}
			Node::ELEMENT_NODE => match (live.dyn_ref::<Element>(), target.dyn_ref::<Element>()) {
				(Some(live), Some(target)) if is_script(live) => self.patch_script(live, target),
				(Some(live), Some(target)) => {
					self.patch_attributes(live, target);
					self.patch_children(live, target);
				}
				_ => error!("Element node is not an `Element`; Skipping."),
			},
			_ => trace!(kind, "Leaving node untouched."),
		}
	}

	/// Removes attributes missing from `target` and sets those that differ.
	fn patch_attributes(&mut self, live: &Element, target: &Element) {
		let live_attributes = live.attributes();
		let stale: Vec<String> = (0..live_attributes.length())
			.rev()
			.filter_map(|i| live_attributes.item(i))
			.map(|attribute| attribute.name())
			.filter(|name| !target.has_attribute(name))
			.collect();
		for name in stale {
			match live.remove_attribute(&name) {
				Ok(()) => self.stats.attribute_updates += 1,
				Err(error) => warn!("Could not remove attribute {:?}: {}", name, describe(&error)),
			}
		}

		let target_attributes = target.attributes();
		for attribute in (0..target_attributes.length()).filter_map(|i| target_attributes.item(i)) {
			let (name, value) = (attribute.name(), attribute.value());
			if live.get_attribute(&name).as_deref() == Some(value.as_str()) {
				continue;
			}
			match live.set_attribute(&name, &value) {
				Ok(()) => self.stats.attribute_updates += 1,
				Err(error) => error!("Could not set attribute {:?}={:?}: {}", name, loggable(&value), describe(&error)),
			}
		}
	}

	/// Reorders, inserts, removes and patches `live_parent`'s child nodes to match `target_parent`'s.
	///
	/// Live children are consumed at most once each. The cursor is always the first unconsumed one,
	/// which means everything in front of it is already final.
	#[instrument(skip(self, live_parent, target_parent), fields(parent = %live_parent.node_name()))]
	fn patch_children(&mut self, live_parent: &Node, target_parent: &Node) {
		let targets = collect(&target_parent.child_nodes());
		let mut slots: Vec<Option<Node>> = collect(&live_parent.child_nodes()).into_iter().map(Some).collect();

		// Ids that the keyed pass should get to see. Positional matching leaves these alone.
		let claimed: HashSet<String> = targets.iter().filter_map(element_id).collect();

		let mut by_id = HashMap::<String, usize>::new();
		for (i, id) in slots.iter().enumerate().filter_map(|(i, slot)| Some((i, slot.as_ref().and_then(element_id)?))) {
			match by_id.entry(id) {
				Entry::Vacant(vacant) => {
					vacant.insert(i);
				}
				Entry::Occupied(occupied) => {
					if STATIC_MAX_LEVEL >= Level::WARN {
						warn!("Duplicate live id {:?}; Only the first occurrence is matched by id.", occupied.key())
					}
				}
			}
		}

		let mut cursor = 0;
		for target in &targets {
			while matches!(slots.get(cursor), Some(None)) {
				cursor += 1;
			}

			let by_identity = element_id(target).and_then(|id| by_id.remove(&id)).filter(|&i| slots[i].is_some());
			let matched = by_identity.or_else(|| {
				(cursor..slots.len()).find(|&i| {
					slots[i]
						.as_ref()
						.map_or(false, |live| same_kind_and_name(live, target) && element_id(live).map_or(true, |id| !claimed.contains(&id)))
				})
			});

			match matched.and_then(|i| slots[i].take().map(|live| (i, live))) {
				Some((i, live)) => {
					if i != cursor {
						let span = trace_span!("Moving matched node", from = i, to = cursor, by_identity = by_identity.is_some());
						let _enter = span.enter();
						match live_parent.insert_before(&live, slots[cursor].as_ref()) {
							Ok(_) => self.stats.moved += 1,
							Err(error) => error!("Failed to move node: {}", describe(&error)),
						}
					}
					self.patch_node(&live, Some(target));
				}
				None => {
					let span = trace_span!("Inserting clone", at = cursor, name = %target.node_name());
					let _enter = span.enter();
					if let Some(clone) = self.import(target) {
						match live_parent.insert_before(&clone, slots.get(cursor).and_then(Option::as_ref)) {
							Ok(_) => self.stats.inserted += 1,
							Err(error) => error!("Failed to insert node: {}", describe(&error)),
						}
					}
				}
			}
		}

		for leftover in slots.into_iter().flatten() {
			self.remove(&leftover);
		}
	}

	/// Replaces `live`'s child nodes with clones of `target`'s child nodes, without trying to match anything.
	#[instrument(skip(self, live, target))]
	fn replace_children(&mut self, live: &Node, target: &Node) {
		while let Some(child) = live.first_child() {
			match live.remove_child(&child) {
				Ok(_) => self.stats.removed += 1,
				Err(error) => return error!("Failed to clear child nodes: {}", describe(&error)),
			}
		}

		for target_child in collect(&target.child_nodes()) {
			if let Some(clone) = self.import(&target_child) {
				match live.append_child(&clone) {
					Ok(_) => self.stats.inserted += 1,
					Err(error) => error!("Failed to append node: {}", describe(&error)),
				}
			}
		}
	}

	/// Leaves identical scripts alone and replaces all others, since browsers run each script element at most once.
	fn patch_script(&mut self, live: &Element, target: &Element) {
		if scripts_equal(live, target) {
			return trace!("Script unchanged.");
		}

		if let Some(fresh) = self.rebuild_script(target) {
			self.replace_with(live, &fresh);
		}
	}

	/// Creates a new `<script>` in the live document with `source`'s attributes and text.
	fn rebuild_script(&mut self, source: &Element) -> Option<Element> {
		let fresh = match self.document.create_element("script") {
			Ok(fresh) => fresh,
			Err(error) => {
				error!("Failed to create script element: {}", describe(&error));
				return None;
			}
		};

		let attributes = source.attributes();
		for attribute in (0..attributes.length()).filter_map(|i| attributes.item(i)) {
			if let Err(error) = fresh.set_attribute(&attribute.name(), &attribute.value()) {
				error!("Could not copy script attribute {:?}: {}", attribute.name(), describe(&error));
			}
		}
		fresh.set_text_content(source.text_content().as_deref());

		self.stats.scripts_rebuilt += 1;
		Some(fresh)
	}

	/// Imports a deep clone of `target` into the live document, with executable scripts.
	fn import(&mut self, target: &Node) -> Option<Node> {
		let imported = match self.document.import_node_with_deep(target, true) {
			Ok(imported) => imported,
			Err(error) => {
				error!("Failed to import node: {}", describe(&error));
				return None;
			}
		};

		let element = match imported.dyn_ref::<Element>() {
			Some(element) => element,
			None => return Some(imported),
		};

		if is_script(element) {
			return self.rebuild_script(element).map(Into::into);
		}

		match element.query_selector_all("script") {
			Ok(scripts) => {
				let scripts = collect(&scripts);
				for script in scripts.iter().filter_map(|node| node.dyn_ref::<Element>()).filter(|script| is_script(script)) {
					if let Some(fresh) = self.rebuild_script(script) {
						self.replace_with(script, &fresh);
					}
				}
			}
			Err(error) => warn!("Could not look for scripts in inserted content: {}", describe(&error)),
		}
		Some(imported)
	}

	fn replace(&mut self, live: &Node, target: &Node) {
		if let Some(replacement) = self.import(target) {
			self.replace_with(live, &replacement);
		}
	}

	fn replace_with(&mut self, old: &Node, new: &Node) {
		let parent = match old.parent_node() {
			Some(parent) => parent,
			None => return error!("Can't replace a node without parent."),
		};
		match parent.replace_child(new, old) {
			Ok(_) => self.stats.replaced += 1,
			Err(error) => error!("Failed to replace node: {}", describe(&error)),
		}
	}

	fn remove(&mut self, live: &Node) {
		let parent = match live.parent_node() {
			Some(parent) => parent,
			None => return warn!("Node to remove is already detached."),
		};
		match parent.remove_child(live) {
			Ok(_) => self.stats.removed += 1,
			Err(error) => error!("Failed to remove node: {}", describe(&error)),
		}
	}
}

fn collect(node_list: &NodeList) -> Vec<Node> {
	(0..node_list.length()).filter_map(|i| node_list.get(i)).collect()
}

fn same_kind_and_name(a: &Node, b: &Node) -> bool {
	a.node_type() == b.node_type() && a.node_name() == b.node_name()
}

/// The non-empty `id` of an element node.
fn element_id(node: &Node) -> Option<String> {
	node.dyn_ref::<Element>().map(Element::id).filter(|id| !id.is_empty())
}

/// HTML scripts only. (The `nodeName` of SVG's `<script>` is lowercase.)
fn is_script(element: &Element) -> bool {
	element.node_name() == "SCRIPT"
}

fn scripts_equal(live: &Element, target: &Element) -> bool {
	let target_attributes = target.attributes();
	live.attributes().length() == target_attributes.length()
		&& (0..target_attributes.length())
			.filter_map(|i| target_attributes.item(i))
			.all(|attribute| live.get_attribute(&attribute.name()).as_deref() == Some(attribute.value().as_str()))
		&& live.text_content() == target.text_content()
}
