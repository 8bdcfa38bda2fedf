use instajax::{
	history::{update_history, HistoryMode},
	links::{should_intercept, AnchorRegistry},
	Morpher,
};
use std::{cell::Cell, rc::Rc};
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::window;

wasm_bindgen_test_configure!(run_in_browser);

use web_support_::{body_document, init_log, query, same};

const ORIGIN: &str = "http://localhost:3000";

#[wasm_bindgen_test]
fn same_origin_absolute_urls_are_intercepted() {
	assert!(should_intercept(Some("http://localhost:3000/counter"), ORIGIN));
	assert!(should_intercept(Some("http://localhost:3000/"), ORIGIN));
	assert!(should_intercept(Some("http://LOCALHOST:3000/counter"), ORIGIN));
	assert!(should_intercept(Some("http://user@localhost:3000/page"), ORIGIN));
	assert!(should_intercept(Some("http://localhost:80/page"), "http://localhost"));
	assert!(should_intercept(Some("https://localhost:443/page"), "https://localhost"));
}

#[wasm_bindgen_test]
fn foreign_origins_are_not_intercepted() {
	assert!(!should_intercept(Some("https://localhost:3000/counter"), ORIGIN));
	assert!(!should_intercept(Some("http://localhost:3001/counter"), ORIGIN));
	assert!(!should_intercept(Some("http://example.com/"), ORIGIN));
	assert!(!should_intercept(Some("http://localhost:8080/page"), "http://localhost"));
	assert!(!should_intercept(Some("http:// broken/"), ORIGIN));
}

#[wasm_bindgen_test]
fn anchors_are_claimed_once() {
	let document = body_document(r#"<a href="/a">a</a><a class="skip-instajax" href="/b">b</a><a href="/c">c</a>"#);
	let registry = AnchorRegistry::new();

	let unclaimed = registry.unclaimed(&document).unwrap();
	assert_eq!(unclaimed.len(), 2);
	assert!(registry.claim(&unclaimed[0]));
	assert!(!registry.claim(&unclaimed[0]));

	let unclaimed = registry.unclaimed(&document).unwrap();
	assert_eq!(unclaimed.len(), 1);
	assert_eq!(unclaimed[0].get_attribute("href").as_deref(), Some("/c"));
}

#[wasm_bindgen_test]
fn claims_survive_reconciliation() {
	let document = body_document(r#"<nav><a href="/a">a</a></nav>"#);
	let registry = AnchorRegistry::new();
	let anchor = query(&document, "a");
	assert!(registry.claim(&anchor));

	let mut morpher = Morpher::new(document.clone()).unwrap();
	morpher.apply(r#"<nav><a href="/a" class="active">a</a><a href="/b">b</a></nav>"#).unwrap();

	assert!(same(&query(&document, "a"), &anchor));
	assert!(registry.is_claimed(&anchor));
	let unclaimed = registry.unclaimed(&document).unwrap();
	assert_eq!(unclaimed.len(), 1);
	assert_eq!(unclaimed[0].get_attribute("href").as_deref(), Some("/b"));
}

#[wasm_bindgen_test]
fn replace_announces_itself_and_pop_does_nothing() {
	init_log();
	let window = window().unwrap();
	let href = window.location().href().unwrap();

	let count = Rc::new(Cell::new(0));
	let listener = {
		let count = Rc::clone(&count);
		Closure::wrap(Box::new(move || count.set(count.get() + 1)) as Box<dyn FnMut()>)
	};
	window.add_event_listener_with_callback("replacestate", listener.as_ref().unchecked_ref()).unwrap();

	update_history(&window, HistoryMode::Pop, &href).unwrap();
	assert_eq!(count.get(), 0);

	update_history(&window, HistoryMode::Replace, &href).unwrap();
	assert_eq!(count.get(), 1);
	assert_eq!(window.location().href().unwrap(), href);

	window.remove_event_listener_with_callback("replacestate", listener.as_ref().unchecked_ref()).unwrap();
}
