//! A direct-to-writer builder with typed attribute values.
//!
//! [`FastElement`] is independent of [`Node`](crate::Node) trees: it has no properties, no
//! context and no chunks. It writes its markup straight to a sink, which makes it a good fit
//! for small fragments produced in hot loops.
//!
//! An element with no attributes and no children is written with a single formatted write.
//! Anything else is built in an arena checked out from one of three size tiers, chosen from an
//! estimate of the output size, and copied to the sink in one write.
//!
//! # Example
//!
//! ```
//! use chunkhtml::builder::FastElement;
//!
//! let button = FastElement::new("button")
//!     .class("btn primary")
//!     .flag("disabled", true)
//!     .style("color", "red")
//!     .text("Save");
//! assert_eq!(
//!     button.to_html(),
//!     r#"<button class="btn primary" disabled style="color: red">Save</button>"#
//! );
//! ```

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};

use bumpalo::collections::String as BumpString;
use indexmap::{IndexMap, IndexSet};

use crate::pool::SizeTier;
use crate::render_element::display_name;
use crate::is_void;

/// The value of a [`FastElement`] attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// A plain string. An empty string renders the bare key.
    Str(String),
    /// A boolean attribute: `true` renders the bare key. `false` is never stored; setting it
    /// removes the attribute.
    Bool(bool),
    /// A deduplicated, insertion-ordered set of tokens, joined with spaces.
    Set(IndexSet<String>),
    /// An ordered map rendered as `key: value` pairs joined with `; `.
    Map(IndexMap<String, String>),
}

impl AttrValue {
    fn estimate(&self) -> usize {
        match self {
            AttrValue::Str(s) => s.len(),
            AttrValue::Bool(_) => 0,
            AttrValue::Set(set) => set.iter().map(|s| s.len() + 1).sum(),
            AttrValue::Map(map) => map.iter().map(|(k, v)| k.len() + v.len() + 4).sum(),
        }
    }

    fn write_value<W: fmt::Write>(&self, w: &mut W) -> fmt::Result {
        match self {
            AttrValue::Str(s) => w.write_str(&html_escape::encode_double_quoted_attribute(s)),
            AttrValue::Bool(_) => Ok(()),
            AttrValue::Set(set) => {
                for (i, token) in set.iter().enumerate() {
                    if i > 0 {
                        w.write_char(' ')?;
                    }
                    w.write_str(&html_escape::encode_double_quoted_attribute(token))?;
                }
                Ok(())
            }
            AttrValue::Map(map) => {
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        w.write_str("; ")?;
                    }
                    w.write_str(&html_escape::encode_double_quoted_attribute(key))?;
                    w.write_str(": ")?;
                    w.write_str(&html_escape::encode_double_quoted_attribute(value))?;
                }
                Ok(())
            }
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            AttrValue::Str(s) => s.is_empty(),
            AttrValue::Bool(_) => true,
            AttrValue::Set(set) => set.is_empty(),
            AttrValue::Map(map) => map.is_empty(),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// A child of a [`FastElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastNode {
    /// A nested element.
    Element(FastElement),
    /// Text, escaped when written.
    Text(Cow<'static, str>),
    /// Markup written as-is.
    Raw(Cow<'static, str>),
}

impl FastNode {
    fn estimate(&self) -> usize {
        match self {
            FastNode::Element(element) => element.estimate(),
            // leave room for a few escaped characters
            FastNode::Text(text) => text.len() + text.len() / 8,
            FastNode::Raw(html) => html.len(),
        }
    }
}

impl From<FastElement> for FastNode {
    fn from(element: FastElement) -> Self {
        FastNode::Element(element)
    }
}

/// An element with typed attributes, written directly to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastElement {
    tag: Cow<'static, str>,
    attributes: IndexMap<Cow<'static, str>, AttrValue>,
    children: Vec<FastNode>,
}

impl FastElement {
    /// Create an element with no attributes or children.
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        FastElement {
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing any previous value under the same key.
    ///
    /// `AttrValue::Bool(false)` removes the attribute instead.
    pub fn attr(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<AttrValue>) -> Self {
        let key = key.into();
        match value.into() {
            AttrValue::Bool(false) => {
                self.attributes.shift_remove(&key);
            }
            value => {
                self.attributes.insert(key, value);
            }
        }
        self
    }

    /// Set a boolean attribute. Setting it to `false` removes the attribute.
    pub fn flag(mut self, key: impl Into<Cow<'static, str>>, on: bool) -> Self {
        let key = key.into();
        if on {
            self.attributes.insert(key, AttrValue::Bool(true));
        } else {
            self.attributes.shift_remove(&key);
        }
        self
    }

    /// Add whitespace-separated class names. Duplicates are ignored.
    pub fn class(mut self, classes: &str) -> Self {
        let entry = self
            .attributes
            .entry(Cow::Borrowed("class"))
            .or_insert_with(|| AttrValue::Set(IndexSet::new()));
        if !matches!(entry, AttrValue::Set(_)) {
            let existing = match &*entry {
                AttrValue::Str(s) => s.split_whitespace().map(str::to_string).collect(),
                _ => IndexSet::new(),
            };
            *entry = AttrValue::Set(existing);
        }
        if let AttrValue::Set(set) = entry {
            set.extend(classes.split_whitespace().map(str::to_string));
        }
        self
    }

    /// Set one inline style declaration.
    ///
    /// A `style` previously set as a string is parsed into declarations first, so it is kept.
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        let entry = self
            .attributes
            .entry(Cow::Borrowed("style"))
            .or_insert_with(|| AttrValue::Map(IndexMap::new()));
        if !matches!(entry, AttrValue::Map(_)) {
            let existing = match &*entry {
                AttrValue::Str(s) => s
                    .split(';')
                    .filter_map(|declaration| declaration.split_once(':'))
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                    .filter(|(k, _)| !k.is_empty())
                    .collect(),
                _ => IndexMap::new(),
            };
            *entry = AttrValue::Map(existing);
        }
        if let AttrValue::Map(map) = entry {
            map.insert(property.into(), value.into());
        }
        self
    }

    /// Append a child.
    pub fn child(mut self, child: impl Into<FastNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a text child.
    pub fn text(self, text: impl Into<Cow<'static, str>>) -> Self {
        self.child(FastNode::Text(text.into()))
    }

    /// Append a raw markup child.
    pub fn raw(self, html: impl Into<Cow<'static, str>>) -> Self {
        self.child(FastNode::Raw(html.into()))
    }

    /// Get an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// The estimated size of the rendered markup, in bytes.
    pub fn estimate(&self) -> usize {
        let tag = self.tag.len() * 2 + 5;
        let attributes: usize = self
            .attributes
            .iter()
            .map(|(key, value)| key.len() + value.estimate() + 4)
            .sum();
        let children: usize = self.children.iter().map(FastNode::estimate).sum();
        tag + attributes + children
    }

    /// Write the markup to `sink`.
    pub fn write_to(&self, sink: &mut dyn Write) -> io::Result<()> {
        let tag = display_name(&self.tag);
        if self.attributes.is_empty() && self.children.is_empty() && !is_void(&self.tag) {
            return write!(sink, "<{tag}></{tag}>");
        }

        let estimate = self.estimate();
        let tier = SizeTier::for_estimate(estimate);
        tracing::trace!(tag = %tag, estimate, ?tier, "fast builder buffer");

        let arena = tier.arena();
        let mut buf = BumpString::with_capacity_in(estimate, &arena);
        self.write_markup(&mut buf)
            .map_err(|_| io::Error::other("failed to format markup"))?;
        sink.write_all(buf.as_bytes())
    }

    /// Render the markup to a string.
    pub fn to_html(&self) -> String {
        self.to_string()
    }

    fn write_markup<W: fmt::Write>(&self, w: &mut W) -> fmt::Result {
        let tag = display_name(&self.tag);
        write!(w, "<{tag}")?;
        for (key, value) in &self.attributes {
            write!(w, " {key}")?;
            if !value.is_empty() {
                w.write_str("=\"")?;
                value.write_value(w)?;
                w.write_char('"')?;
            }
        }
        w.write_char('>')?;

        if is_void(&self.tag) {
            return Ok(());
        }
        for child in &self.children {
            match child {
                FastNode::Element(element) => element.write_markup(w)?,
                FastNode::Text(text) => w.write_str(&html_escape::encode_text(text))?,
                FastNode::Raw(html) => w.write_str(html)?,
            }
        }
        write!(w, "</{tag}>")
    }
}

impl fmt::Display for FastElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_markup(f)
    }
}
