//! Forgiving scanner for tag contents in sitemap-like XML.
//!
//! Sitemaps here are produced by our own build, but they are not always
//! complete documents. Rather than validating the whole tree, the scanner
//! yields the text of every well-formed `<tag>...</tag>` pair it can find
//! and silently skips the rest.

use regex::Regex;

pub struct TagScanner {
    pattern: Regex,
}

impl TagScanner {
    /// Scanner for a single element name, e.g. `loc`.
    ///
    /// Namespace prefixes (`<sm:loc>`) and attributes on the opening tag
    /// are accepted.
    pub fn new(tag: &str) -> Self {
        let tag = regex::escape(tag);
        let pattern = Regex::new(&format!(
            r"(?is)<(?:[a-z0-9_-]+:)?{tag}(?:\s[^>]*)?>(.*?)</(?:[a-z0-9_-]+:)?{tag}\s*>"
        ))
        .expect("escaped tag name always forms a valid pattern");
        Self { pattern }
    }

    /// Decoded, trimmed contents of every matching element, in document order
    pub fn scan<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| decode_text(m.as_str().trim()))
            .filter(|s| !s.is_empty())
    }
}

/// Unwrap CDATA and decode the predefined XML entities
fn decode_text(raw: &str) -> String {
    if let Some(inner) = raw
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
    {
        return inner.trim().to_string();
    }

    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
