//! Markup whitespace collapsing.
//!
//! The document is parsed with `tl` and written back node by node. Runs of
//! whitespace in text become a single space. Whitespace next to block-level
//! and document-level tags is dropped entirely. Comments and the content of
//! `pre`, `textarea`, `script` and `style` are copied verbatim.

use std::collections::BTreeMap;

use crate::utils::html::{
    is_block_element, is_document_element, is_void_element, preserves_whitespace,
};

/// Collapse insignificant whitespace in an HTML document.
pub fn collapse_whitespace(html: &str) -> String {
    let (doctype, body) = split_doctype(html);

    let Ok(dom) = tl::parse(body, tl::ParserOptions::default()) else {
        crate::debug!("html"; "markup could not be parsed, left as is");
        return html.to_string();
    };

    let parser = dom.parser();
    let mut writer = Collapser::new(body.len());
    writer.out.push_str(doctype);
    for handle in dom.children() {
        writer.node(*handle, parser);
    }
    writer.out
}

/// Split a leading `<!DOCTYPE ...>` off the document, copied through ahead of the tree.
fn split_doctype(html: &str) -> (&str, &str) {
    let trimmed = html.trim_start();
    let is_doctype = trimmed
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"));
    match trimmed.find('>') {
        Some(end) if is_doctype => trimmed.split_at(end + 1),
        _ => ("", html),
    }
}

struct Collapser {
    out: String,
    pending_space: bool,
    /// Whether whitespace right here would be dropped (start, or next to a block tag).
    at_boundary: bool,
}

impl Collapser {
    fn new(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            pending_space: false,
            at_boundary: true,
        }
    }

    fn node(&mut self, handle: tl::NodeHandle, parser: &tl::Parser) {
        let Some(node) = handle.get(parser) else {
            return;
        };
        match node {
            tl::Node::Tag(tag) => self.tag(tag, parser),
            tl::Node::Raw(bytes) => self.text(&bytes.as_utf8_str()),
            tl::Node::Comment(bytes) => {
                self.flush_space(false);
                self.out.push_str(&bytes.as_utf8_str());
            }
        }
    }

    fn tag(&mut self, tag: &tl::HTMLTag, parser: &tl::Parser) {
        let name = tag.name().as_utf8_str().to_ascii_lowercase();
        let swallows = is_block_element(&name) || is_document_element(&name);

        self.flush_space(swallows);
        self.open_tag(&name, tag);
        self.at_boundary = swallows;
        if is_void_element(&name) {
            return;
        }

        if preserves_whitespace(&name) {
            self.out.push_str(&tag.inner_html(parser));
        } else {
            for child in tag.children().top().iter() {
                self.node(*child, parser);
            }
            self.flush_space(swallows);
        }

        self.out.push_str("</");
        self.out.push_str(&name);
        self.out.push('>');
        self.at_boundary = swallows;
    }

    /// Attributes are written in name order so repeated builds match.
    fn open_tag(&mut self, name: &str, tag: &tl::HTMLTag) {
        let attrs: BTreeMap<String, Option<String>> = tag
            .attributes()
            .iter()
            .map(|(key, value)| (key.to_string(), value.map(|v| v.to_string())))
            .collect();

        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(&key);
            if let Some(value) = value {
                let quote = if value.contains('"') { '\'' } else { '"' };
                self.out.push('=');
                self.out.push(quote);
                self.out.push_str(&value);
                self.out.push(quote);
            }
        }
        self.out.push('>');
    }

    fn text(&mut self, text: &str) {
        for (i, word) in text.split(|c: char| c.is_ascii_whitespace()).enumerate() {
            if i > 0 {
                self.pending_space = true;
            }
            if word.is_empty() {
                continue;
            }
            self.flush_space(false);
            self.out.push_str(word);
            self.at_boundary = false;
        }
    }

    /// Emit a pending space unless either side of it swallows whitespace.
    fn flush_space(&mut self, next_swallows: bool) {
        if self.pending_space && !self.at_boundary && !next_swallows {
            self.out.push(' ');
        }
        self.pending_space = false;
    }
}
