//! Cheap textual inspection of incoming markup, done before (and independently of) parsing.

/// Removes a leading `<!DOCTYPE …>` declaration, matched ASCII-case-insensitively, along with surrounding whitespace.
pub fn strip_doctype(markup: &str) -> &str {
	const DOCTYPE: &str = "<!doctype";
	let markup = markup.trim();
	match markup.get(..DOCTYPE.len()) {
		Some(prefix) if prefix.eq_ignore_ascii_case(DOCTYPE) => match markup.find('>') {
			Some(end) => markup[end + 1..].trim_start(),
			None => "",
		},
		_ => markup,
	}
}

/// Checks whether `markup` contains an opening `<tag` (ASCII-case-insensitively) that isn't just a prefix of a longer tag name.
///
/// `<head>` and `<head class="x">` count for `"head"`, `<header>` doesn't.
///
/// This is a text search, not a parse: Tags inside comments, attribute values or script text are found as well.
pub fn has_tag(markup: &str, tag: &str) -> bool {
	let bytes = markup.as_bytes();
	let tag = tag.as_bytes();
	bytes.iter().enumerate().filter(|&(_, &b)| b == b'<').any(|(i, _)| {
		let name_start = i + 1;
		let name_end = name_start + tag.len();
		bytes.get(name_start..name_end).map_or(false, |name| name.eq_ignore_ascii_case(tag))
			&& bytes.get(name_end).map_or(true, |&next| next == b'>' || next == b'/' || next.is_ascii_whitespace())
	})
}

/// Text content only shows up in logs with the `dangerous-logging` feature.
pub fn loggable(content: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		content
	} else {
		"[redacted]"
	}
}
