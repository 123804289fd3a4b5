use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::node::{IntoItems, Item};
use crate::pool::{Pool, Recycle};
use crate::{Attribute, Deferred, Node, Prop, Render};

static ELEMENTS: Pool<Element> = Pool::new("element", Element::empty);
static SCRATCH_PROPS: Pool<Vec<Prop>> = Pool::new("props.scratch", Vec::new);

/// A tag element.
///
/// Elements are checked out of a pool when created and can be handed back with
/// [`Element::release`] once they will not be rendered again.
///
/// # Cloning
///
/// [`Clone`] is shallow: the clone shares its children and deferred properties with the
/// original, but owns its own copy of the plain attributes. Shared storage is read-only;
/// appending children or deferred properties to either element after cloning first copies
/// that storage, detaching the two. Use [`Element::deep_clone`] to copy the whole subtree up
/// front.
#[derive(Debug)]
pub struct Element {
    name: Cow<'static, str>,
    attributes: Vec<Attribute>,
    deferred: Arc<Vec<Deferred>>,
    children: Arc<Vec<Node>>,
    meta: HashMap<String, String>,
}

impl Element {
    fn empty() -> Element {
        Element {
            name: Cow::Borrowed(""),
            attributes: Vec::new(),
            deferred: Arc::new(Vec::new()),
            children: Arc::new(Vec::new()),
            meta: HashMap::new(),
        }
    }

    /// Check an empty element named `name` out of the pool.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Element {
        let mut element = ELEMENTS.get();
        element.name = name.into();
        element
    }

    /// Create an element from a set of items.
    ///
    /// Nodes become children, in order. Immediate properties (including plain attributes) are
    /// applied first in the order given, then static properties in the order given. Deferred
    /// properties are recorded to run at render time.
    pub fn create(name: impl Into<Cow<'static, str>>, items: impl IntoItems) -> Element {
        let mut element = Element::new(name);
        let mut immediate = SCRATCH_PROPS.get();
        let mut statics = SCRATCH_PROPS.get();
        {
            let children = Arc::make_mut(&mut element.children);
            let deferred = Arc::make_mut(&mut element.deferred);
            items.into_items(&mut |item| match item {
                Item::Node(node) => children.push(node),
                Item::Prop(prop @ (Prop::Attribute(_) | Prop::Immediate { .. })) => {
                    immediate.push(prop)
                }
                Item::Prop(prop @ Prop::Static { .. }) => statics.push(prop),
                Item::Prop(Prop::Deferred(property)) => deferred.push(property),
            });
        }
        for prop in immediate.drain(..).chain(statics.drain(..)) {
            element.apply(prop);
        }
        SCRATCH_PROPS.put(immediate);
        SCRATCH_PROPS.put(statics);
        element
    }

    /// Apply a property now. Deferred properties are appended to the render-time list.
    pub fn apply(&mut self, prop: Prop) {
        match prop {
            Prop::Attribute(attribute) => self.set_attribute(attribute),
            Prop::Immediate { apply, .. } | Prop::Static { apply, .. } => apply.apply(self),
            Prop::Deferred(property) => Arc::make_mut(&mut self.deferred).push(property),
        }
    }

    /// Set an attribute.
    ///
    /// An existing key is updated in place without changing its position, except `class`,
    /// whose new value is appended to the existing one with a space. Empty class values are
    /// not joined, so no stray spaces appear: an empty new value leaves the class unchanged
    /// and an empty existing value is replaced.
    pub fn set_attribute(&mut self, attribute: Attribute) {
        let Some(existing) = self.attributes.iter_mut().find(|a| a.key == attribute.key) else {
            self.attributes.push(attribute);
            return;
        };
        if !attribute.is_class() || existing.value.is_empty() {
            existing.value = attribute.value;
        } else if !attribute.value.is_empty() {
            let value = existing.value.to_mut();
            value.push(' ');
            value.push_str(&attribute.value);
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attribute(&mut self, key: &str) -> Option<Cow<'static, str>> {
        let index = self.attributes.iter().position(|a| a.key == key)?;
        Some(self.attributes.remove(index).value)
    }

    /// Get the value of an attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_ref())
    }

    /// Append a child node.
    pub fn push_child(&mut self, child: impl Into<Node>) {
        Arc::make_mut(&mut self.children).push(child.into());
    }

    /// Set a metadata entry. Metadata is never rendered; properties use it to coordinate.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Get a metadata entry.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// The tag name, as given.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plain attributes, in order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// The deferred properties, in declaration order.
    pub fn deferred(&self) -> &[Deferred] {
        &self.deferred
    }

    /// The children, in order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Whether `self` and `other` share child storage (one is a shallow clone of the other).
    pub fn shares_children_with(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.children, &other.children)
    }

    /// Clone the element and its whole subtree without sharing any storage.
    pub fn deep_clone(&self) -> Element {
        let mut element = Element::new(self.name.clone());
        element.attributes.extend(self.attributes.iter().cloned());
        Arc::make_mut(&mut element.deferred).extend(self.deferred.iter().cloned());
        Arc::make_mut(&mut element.children).extend(self.children.iter().map(Node::deep_clone));
        element.meta.clone_from(&self.meta);
        element
    }

    /// Hand the element back to the pool.
    ///
    /// Children that are not shared with a clone are released too. The element is not
    /// cleared here; the pool resets it on its next checkout.
    pub fn release(mut self) {
        if let Some(children) = Arc::get_mut(&mut self.children) {
            for child in children.drain(..) {
                child.release();
            }
        }
        ELEMENTS.put(self);
    }
}

impl Clone for Element {
    fn clone(&self) -> Self {
        Element {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            deferred: Arc::clone(&self.deferred),
            children: Arc::clone(&self.children),
            meta: self.meta.clone(),
        }
    }
}

impl Recycle for Element {
    fn reset(&mut self) {
        self.name = Cow::Borrowed("");
        self.attributes.clear();
        self.meta.clear();
        match Arc::get_mut(&mut self.children) {
            Some(children) => children.clear(),
            None => self.children = Arc::new(Vec::new()),
        }
        match Arc::get_mut(&mut self.deferred) {
            Some(deferred) => deferred.clear(),
            None => self.deferred = Arc::new(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{attr, class, deferred_attr, id, immediate_prop, static_prop, text};

    #[test]
    fn duplicate_keys_update_in_place() {
        let element = Element::create("a", (attr("href", "/a"), id("x"), attr("href", "/b")));
        let keys: Vec<_> = element.attributes().iter().map(|a| a.key.as_ref()).collect();
        assert_eq!(keys, ["href", "id"]);
        assert_eq!(element.attribute("href"), Some("/b"));
    }

    #[test]
    fn class_accumulates_without_dedup() {
        let element = Element::create("div", (class("a"), class("b"), class("a")));
        assert_eq!(element.attribute("class"), Some("a b a"));
    }

    #[test]
    fn empty_classes_do_not_leave_stray_spaces() {
        let element = Element::create("div", (class(""), class("a"), class(""), class("b")));
        assert_eq!(element.attribute("class"), Some("a b"));
    }

    #[test]
    fn static_props_run_after_immediate_ones() {
        let element = Element::create(
            "div",
            (
                static_prop(|el: &mut Element| {
                    let seen = el.attribute("id").unwrap_or("none").to_string();
                    el.set_meta("id-at-static", seen);
                }),
                immediate_prop(|el: &mut Element| el.set_meta("order", "immediate")),
                id("late"),
            ),
        );
        assert_eq!(element.meta("id-at-static"), Some("late"));
        assert_eq!(element.meta("order"), Some("immediate"));
    }

    #[test]
    fn items_are_routed() {
        let element = Element::create(
            "p",
            (text("a"), deferred_attr("title", |_| "t"), id("x"), "b"),
        );
        assert_eq!(element.children().len(), 2);
        assert_eq!(element.deferred().len(), 1);
        assert_eq!(element.attributes().len(), 1);
    }

    #[test]
    fn clone_shares_children_but_not_attributes() {
        let original = Element::create("ul", (id("list"), text("item")));
        let mut clone = original.clone();
        assert!(clone.shares_children_with(&original));

        clone.set_attribute(id("copy"));
        assert_eq!(original.attribute("id"), Some("list"));
        assert_eq!(clone.attribute("id"), Some("copy"));

        clone.push_child(text("more"));
        assert!(!clone.shares_children_with(&original));
        assert_eq!(original.children().len(), 1);
        assert_eq!(clone.children().len(), 2);
    }

    #[test]
    fn deep_clone_shares_nothing() {
        let original = Element::create("div", Element::create("span", "x"));
        let copy = original.deep_clone();
        assert!(!copy.shares_children_with(&original));
        let inner_original = original.children()[0].as_element().unwrap();
        let inner_copy = copy.children()[0].as_element().unwrap();
        assert!(!inner_copy.shares_children_with(inner_original));
    }

    #[test]
    fn released_elements_come_back_empty() {
        let element = Element::create("div", (id("stale"), text("stale")));
        element.release();
        for _ in 0..4 {
            let fresh = Element::new("p");
            assert_eq!(fresh.name(), "p");
            assert!(fresh.attributes().is_empty());
            assert!(fresh.children().is_empty());
            assert!(fresh.deferred().is_empty());
            assert!(fresh.meta("order").is_none());
        }
    }
}
