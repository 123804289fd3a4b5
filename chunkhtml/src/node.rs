use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::chunk::{ChunkBuffer, ChunkWriter, Tee};
use crate::{Attribute, Context, Deferred, Element, Prop, RenderResult};

/// The capability shared by every renderable value.
pub trait Render {
    /// Append the chunks that render `self` to `out`.
    fn render<'r>(&'r self, out: &mut dyn ChunkWriter<'r>) -> RenderResult<()>;

    /// Return any pooled storage held by `self`.
    fn release(self)
    where
        Self: Sized,
    {
    }
}

/// A renderable node in an HTML tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// Text, escaped when rendered.
    Text(Text),
    /// Markup emitted without escaping.
    Raw(Raw),
    /// A tag element.
    Element(Element),
    /// A sequence of nodes rendered in order.
    Fragment(Fragment),
    /// A node computed from the [`Context`] when the output stream reaches it.
    Component(Component),
    /// A value serialized as JSON.
    Json(JsonNode),
}

impl Node {
    /// Create a text node.
    pub fn text(text: impl Into<Cow<'static, str>>) -> Node {
        Node::Text(Text(text.into()))
    }

    /// Create a raw markup node. The markup is emitted as-is and must be safe.
    pub fn raw(html: impl Into<Cow<'static, str>>) -> Node {
        Node::Raw(Raw(html.into()))
    }

    /// Create a fragment from an iterator of nodes.
    pub fn fragment(children: impl IntoIterator<Item = Node>) -> Node {
        Node::Fragment(Fragment(children.into_iter().collect()))
    }

    /// Clone the node and everything under it without sharing any element storage.
    pub fn deep_clone(&self) -> Node {
        match self {
            Node::Element(element) => Node::Element(element.deep_clone()),
            Node::Fragment(Fragment(children)) => {
                Node::Fragment(Fragment(children.iter().map(Node::deep_clone).collect()))
            }
            other => other.clone(),
        }
    }

    /// The name of the node's variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Text(_) => "Text",
            Node::Raw(_) => "Raw",
            Node::Element(_) => "Element",
            Node::Fragment(_) => "Fragment",
            Node::Component(_) => "Component",
            Node::Json(_) => "Json",
        }
    }

    /// Get the element if this is an [`Element`](Node::Element).
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl Render for Node {
    fn render<'r>(&'r self, out: &mut dyn ChunkWriter<'r>) -> RenderResult<()> {
        match self {
            Node::Text(text) => text.render(out),
            Node::Raw(raw) => raw.render(out),
            Node::Element(element) => element.render(out),
            Node::Fragment(fragment) => fragment.render(out),
            Node::Component(component) => component.render(out),
            Node::Json(json) => json.render(out),
        }
    }

    fn release(self) {
        match self {
            Node::Element(element) => element.release(),
            Node::Fragment(fragment) => fragment.release(),
            Node::Text(_) | Node::Raw(_) | Node::Component(_) | Node::Json(_) => {}
        }
    }
}

/// Text content, HTML-escaped on render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text(pub Cow<'static, str>);

impl Render for Text {
    fn render<'r>(&'r self, out: &mut dyn ChunkWriter<'r>) -> RenderResult<()> {
        match html_escape::encode_text(self.0.as_ref()) {
            Cow::Borrowed(text) => out.write_str(text),
            Cow::Owned(escaped) => {
                let escaped = out.arena().alloc_str(&escaped);
                out.write_str(escaped)
            }
        }
    }
}

/// Markup emitted byte-for-byte. The caller vouches for its safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw(pub Cow<'static, str>);

impl Render for Raw {
    fn render<'r>(&'r self, out: &mut dyn ChunkWriter<'r>) -> RenderResult<()> {
        out.write_str(self.0.as_ref())
    }
}

/// An ordered sequence of nodes.
#[derive(Debug, Clone, Default)]
pub struct Fragment(pub Vec<Node>);

impl Render for Fragment {
    fn render<'r>(&'r self, out: &mut dyn ChunkWriter<'r>) -> RenderResult<()> {
        for child in &self.0 {
            child.render(out)?;
        }
        Ok(())
    }

    fn release(self) {
        for child in self.0 {
            child.release();
        }
    }
}

type ComponentFn = dyn Fn(&Context) -> RenderResult<Node> + Send + Sync;

/// A node produced from the [`Context`] at the moment the output stream reaches it.
///
/// The function is not called while the tree is built, and is called exactly once per render
/// pass. Its node is streamed straight into the surrounding output.
#[derive(Clone)]
pub struct Component(Arc<ComponentFn>);

impl Component {
    /// Create a component from a fallible function.
    pub fn new(f: impl Fn(&Context) -> RenderResult<Node> + Send + Sync + 'static) -> Self {
        Component(Arc::new(f))
    }

    /// Evaluate the component against `ctx`.
    pub fn evaluate(&self, ctx: &Context) -> RenderResult<Node> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Component(..)")
    }
}

impl Render for Component {
    fn render<'r>(&'r self, out: &mut dyn ChunkWriter<'r>) -> RenderResult<()> {
        let arena = out.arena();
        out.write_dynamic(move |ctx, sink| {
            let node = self.evaluate(ctx)?;
            let mut scratch = ChunkBuffer::new_in(arena);
            let result = {
                let mut tee = Tee::new(&mut scratch, |chunk| chunk.execute(Some(ctx), sink));
                node.render(&mut tee)
            };
            drop(scratch);
            node.release();
            result
        })
    }
}

/// A value emitted as JSON, unescaped, in a single chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonNode {
    value: serde_json::Value,
    indent: Option<Cow<'static, str>>,
}

impl JsonNode {
    /// Create a compact JSON node.
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        JsonNode {
            value: value.into(),
            indent: None,
        }
    }

    /// Create a JSON node from any serializable value. Struct fields and map entries keep
    /// their serialization order.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Pretty-print the JSON, indenting each level with `indent`.
    pub fn with_indent(mut self, indent: impl Into<Cow<'static, str>>) -> Self {
        self.indent = Some(indent.into());
        self
    }

    /// The value being serialized.
    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }
}

impl Render for JsonNode {
    fn render<'r>(&'r self, out: &mut dyn ChunkWriter<'r>) -> RenderResult<()> {
        let mut bytes = Vec::new();
        match &self.indent {
            Some(indent) => {
                let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
                let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
                self.value.serialize(&mut serializer)?;
            }
            None => serde_json::to_writer(&mut bytes, &self.value)?,
        }
        let bytes = out.arena().alloc_slice_copy(&bytes);
        out.write_static(bytes)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<Raw> for Node {
    fn from(raw: Raw) -> Self {
        Node::Raw(raw)
    }
}

impl From<Fragment> for Node {
    fn from(fragment: Fragment) -> Self {
        Node::Fragment(fragment)
    }
}

impl From<Component> for Node {
    fn from(component: Component) -> Self {
        Node::Component(component)
    }
}

impl From<JsonNode> for Node {
    fn from(json: JsonNode) -> Self {
        Node::Json(json)
    }
}

impl From<&'static str> for Node {
    fn from(text: &'static str) -> Self {
        Node::text(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::text(text)
    }
}

impl From<Vec<Node>> for Node {
    fn from(children: Vec<Node>) -> Self {
        Node::Fragment(Fragment(children))
    }
}

/// Anything that can be passed to an element constructor: a node or a property.
#[derive(Debug, Clone)]
pub enum Item {
    /// A child node.
    Node(Node),
    /// A property of the element.
    Prop(Prop),
}

impl Item {
    /// The name of the item's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Item::Node(node) => node.kind(),
            Item::Prop(prop) => prop.type_name(),
        }
    }
}

macro_rules! item_from_node {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Item {
                fn from(node: $ty) -> Self {
                    Item::Node(node.into())
                }
            }
        )*
    };
}
item_from_node!(
    Node, Element, Text, Raw, Fragment, Component, JsonNode, &'static str, String
);

impl From<Prop> for Item {
    fn from(prop: Prop) -> Self {
        Item::Prop(prop)
    }
}

impl From<Attribute> for Item {
    fn from(attribute: Attribute) -> Self {
        Item::Prop(Prop::Attribute(attribute))
    }
}

impl From<Deferred> for Item {
    fn from(deferred: Deferred) -> Self {
        Item::Prop(Prop::Deferred(deferred))
    }
}

/// Values that expand into a sequence of [`Item`]s.
///
/// Element constructors accept any `IntoItems`, which covers single items, tuples of up to
/// twelve `IntoItems` values, vectors, arrays and options:
///
/// ```
/// use chunkhtml::{id, tags::{div, p, span}};
///
/// let element = div((id("main"), p("Hello"), vec![span("a"), span("b")], None::<&'static str>));
/// ```
pub trait IntoItems {
    /// Feed every item to `sink`, in order.
    fn into_items(self, sink: &mut dyn FnMut(Item));
}

impl IntoItems for () {
    fn into_items(self, _sink: &mut dyn FnMut(Item)) {}
}

macro_rules! into_items_for_single {
    ($($ty:ty),*) => {
        $(
            impl IntoItems for $ty {
                fn into_items(self, sink: &mut dyn FnMut(Item)) {
                    sink(self.into())
                }
            }
        )*
    };
}
into_items_for_single!(
    Item, Node, Prop, Attribute, Deferred, Element, Text, Raw, Fragment, Component, JsonNode,
    &'static str, String
);

impl<T: Into<Item>> IntoItems for Vec<T> {
    fn into_items(self, sink: &mut dyn FnMut(Item)) {
        for item in self {
            sink(item.into());
        }
    }
}

impl<T: Into<Item>, const N: usize> IntoItems for [T; N] {
    fn into_items(self, sink: &mut dyn FnMut(Item)) {
        for item in self {
            sink(item.into());
        }
    }
}

impl<T: IntoItems> IntoItems for Option<T> {
    fn into_items(self, sink: &mut dyn FnMut(Item)) {
        if let Some(items) = self {
            items.into_items(sink);
        }
    }
}

macro_rules! into_items_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: IntoItems),+> IntoItems for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_items(self, sink: &mut dyn FnMut(Item)) {
                let ($($name,)+) = self;
                $($name.into_items(sink);)+
            }
        }
    };
}
into_items_for_tuple!(A);
into_items_for_tuple!(A, B);
into_items_for_tuple!(A, B, C);
into_items_for_tuple!(A, B, C, D);
into_items_for_tuple!(A, B, C, D, E);
into_items_for_tuple!(A, B, C, D, E, F);
into_items_for_tuple!(A, B, C, D, E, F, G);
into_items_for_tuple!(A, B, C, D, E, F, G, H);
into_items_for_tuple!(A, B, C, D, E, F, G, H, I);
into_items_for_tuple!(A, B, C, D, E, F, G, H, I, J);
into_items_for_tuple!(A, B, C, D, E, F, G, H, I, J, K);
into_items_for_tuple!(A, B, C, D, E, F, G, H, I, J, K, L);

/// Create a text node.
pub fn text(text: impl Into<Cow<'static, str>>) -> Node {
    Node::text(text)
}

/// Create a raw markup node.
pub fn raw(html: impl Into<Cow<'static, str>>) -> Node {
    Node::raw(html)
}

/// Create a fragment.
pub fn fragment(children: impl IntoIterator<Item = Node>) -> Node {
    Node::fragment(children)
}

/// Create a component node from a function of the render [`Context`].
pub fn component<N: Into<Node>>(
    f: impl Fn(&Context) -> RenderResult<N> + Send + Sync + 'static,
) -> Node {
    Node::Component(Component::new(move |ctx| f(ctx).map(Into::into)))
}

/// Create a compact JSON node.
pub fn json(value: impl Into<serde_json::Value>) -> Node {
    Node::Json(JsonNode::new(value))
}
