// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! XML stream adapter: a single-pass, depth-limited walk over a large
//! XML document that hands the caller one fully-materialized subtree per
//! node closed at `depth`, then discards it.
//!
//! Repeated same-tag children (e.g. the many `<revision>` elements under
//! one `<page>` in a full edit-history dump) collapse into
//! [`XmlValue::List`], matching the list-for-repeated-elements convention
//! the original Python implementation got from `xmltodict`.

use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlWalkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("xml parse error: {0}")]
    Parse(#[from] quick_xml::Error),
}

/// A materialized XML subtree: a leaf string, a list of same-tag siblings,
/// or a tag->value mapping (attributes are stored under `@name` keys, text
/// content under `#text` when the element also carries attributes or
/// children).
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    Leaf(String),
    List(Vec<XmlValue>),
    Map(IndexMap<String, XmlValue>),
}

impl XmlValue {
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            XmlValue::Leaf(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, XmlValue>> {
        match self {
            XmlValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Iterate a field that may be a single item or a list of items,
    /// mirroring how repeated XML children collapse into a list.
    pub fn iter_field<'a>(&'a self, key: &str) -> Box<dyn Iterator<Item = &'a XmlValue> + 'a> {
        match self.get(key) {
            Some(XmlValue::List(items)) => Box::new(items.iter()),
            Some(other) => Box::new(std::iter::once(other)),
            None => Box::new(std::iter::empty()),
        }
    }
}

struct Frame {
    tag: String,
    children: IndexMap<String, XmlValue>,
    text: String,
}

impl Frame {
    fn new(tag: String, attrs: IndexMap<String, XmlValue>) -> Self {
        Self {
            tag,
            children: attrs,
            text: String::new(),
        }
    }

    fn finish(self) -> XmlValue {
        let mut children = self.children;
        let text = self.text.trim();
        if children.is_empty() {
            XmlValue::Leaf(text.to_string())
        } else {
            if !text.is_empty() {
                children.insert("#text".to_string(), XmlValue::Leaf(text.to_string()));
            }
            XmlValue::Map(children)
        }
    }
}

fn insert_child(children: &mut IndexMap<String, XmlValue>, key: String, value: XmlValue) {
    match children.shift_remove(&key) {
        None => {
            children.insert(key, value);
        }
        Some(XmlValue::List(mut items)) => {
            items.push(value);
            children.insert(key, XmlValue::List(items));
        }
        Some(existing) => {
            children.insert(key, XmlValue::List(vec![existing, value]));
        }
    }
}

fn read_attrs(e: &quick_xml::events::BytesStart) -> Result<IndexMap<String, XmlValue>, XmlWalkError> {
    let mut attrs = IndexMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, XmlValue::Leaf(value));
    }
    Ok(attrs)
}

/// Walk `src_path`, invoking `on_item(path_stack, value)` for every node
/// closed at exactly `depth` (1-indexed: the root's immediate children are
/// depth 1). `path_stack` is the ancestor tag names from the document root
/// down to and including the closing node. Returning `false` aborts the
/// walk early. The adapter never buffers more than the subtree currently
/// being materialized; each closed node's buffer is discarded right after
/// its callback returns.
// Allow expect here: a frame is always pushed when `path` enters the
// target depth, so popping it back off on the matching close is an
// invariant of this function's own loop, not fallible input.
#[allow(clippy::expect_used)]
pub fn walk<F>(src_path: &Path, depth: usize, mut on_item: F) -> Result<(), XmlWalkError>
where
    F: FnMut(&[String], XmlValue) -> bool,
{
    let file = File::open(src_path)?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut frames: Vec<Frame> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                path.push(name.clone());
                if path.len() >= depth {
                    let attrs = read_attrs(&e)?;
                    frames.push(Frame::new(name, attrs));
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                path.push(name.clone());
                if path.len() >= depth {
                    let attrs = read_attrs(&e)?;
                    let value = Frame::new(name, attrs).finish();
                    if !emit_or_attach(&mut frames, &path, depth, &mut on_item, value) {
                        path.pop();
                        break;
                    }
                }
                path.pop();
            }
            Ok(Event::Text(e)) => {
                if let Some(frame) = frames.last_mut() {
                    frame.text.push_str(&e.unescape()?);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(frame) = frames.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::End(_)) => {
                if path.len() >= depth {
                    let frame = frames.pop().expect("frame pushed when entering depth");
                    let value = frame.finish();
                    if !emit_or_attach(&mut frames, &path, depth, &mut on_item, value) {
                        path.pop();
                        break;
                    }
                }
                path.pop();
            }
            Ok(_) => {}
            Err(err) => return Err(XmlWalkError::Parse(err)),
        }
        buf.clear();
    }
    Ok(())
}

/// Attaches `value` to its parent frame if it's a descendant still inside
/// the target subtree, or invokes the callback if `path` is exactly
/// `depth` deep (the node itself closed). Returns `false` if the callback
/// asked to stop.
// Allow expect here: both are invariants of the caller's own loop
// structure (a frame is always pushed before depth is reached; `path` is
// non-empty whenever we're still below `depth`), not fallible input.
#[allow(clippy::expect_used)]
fn emit_or_attach<F>(
    frames: &mut [Frame],
    path: &[String],
    depth: usize,
    on_item: &mut F,
    value: XmlValue,
) -> bool
where
    F: FnMut(&[String], XmlValue) -> bool,
{
    if path.len() == depth {
        on_item(path, value)
    } else if let Some(parent) = frames.last_mut() {
        let key = path.last().expect("path non-empty below depth").clone();
        insert_child(&mut parent.children, key, value);
        true
    } else {
        true
    }
}

#[cfg(test)]
#[path = "xml_tests.rs"]
mod tests;
