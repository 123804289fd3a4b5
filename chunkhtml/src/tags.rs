//! Tag constructors and the registry of known tags.
//!
//! Every HTML tag the crate knows about has a constructor function here, e.g. [`div`] or
//! [`input`], accepting anything that implements [`IntoItems`]. Tags without a constructor can be
//! built with [`create`].
//!
//! The registry records what is known about each tag: whether it is void, whether it accepts
//! children and which attributes it documents. It only feeds diagnostics; construction never
//! rejects an element, and rendering decides void-ness with [`is_void`](crate::is_void).

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::{boolean, Element, IntoItems};

/// What the registry knows about a tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagSpec {
    /// The tag never has children or a closing tag.
    pub void: bool,
    /// The tag accepts child nodes.
    pub children_allowed: bool,
    /// Attribute names documented for the tag, beyond the global ones.
    pub attributes: Vec<Cow<'static, str>>,
}

impl TagSpec {
    /// A tag with children and a closing tag.
    pub fn normal() -> Self {
        TagSpec {
            void: false,
            children_allowed: true,
            attributes: Vec::new(),
        }
    }

    /// A void tag.
    pub fn void() -> Self {
        TagSpec {
            void: true,
            children_allowed: false,
            attributes: Vec::new(),
        }
    }

    /// Document attribute names for the tag.
    pub fn with_attributes(
        mut self,
        attributes: impl IntoIterator<Item = impl Into<Cow<'static, str>>>,
    ) -> Self {
        self.attributes.extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Whether `name` is documented for this tag.
    pub fn knows_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }
}

type Registry = RwLock<HashMap<Cow<'static, str>, TagSpec>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut tags = HashMap::new();
        for name in NON_VOID_TAGS {
            tags.insert(Cow::Borrowed(*name), TagSpec::normal());
        }
        for name in VOID_TAGS {
            tags.insert(Cow::Borrowed(*name), TagSpec::void());
        }
        tags.insert(Cow::Borrowed("!doctype"), TagSpec::void());
        for (name, attributes) in KNOWN_ATTRIBUTES {
            if let Some(spec) = tags.get_mut(*name) {
                spec.attributes.extend(attributes.iter().map(|a| Cow::Borrowed(*a)));
            }
        }
        RwLock::new(tags)
    })
}

const KNOWN_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "target", "rel", "download"]),
    ("form", &["action", "method", "enctype"]),
    ("img", &["src", "alt", "width", "height", "loading"]),
    ("input", &["type", "name", "value", "placeholder", "required", "disabled", "checked"]),
    ("button", &["type", "name", "value", "disabled"]),
    ("label", &["for"]),
    ("link", &["rel", "href", "type"]),
    ("meta", &["name", "content", "charset"]),
    ("script", &["src", "type", "defer", "async"]),
    ("select", &["name", "multiple", "disabled"]),
    ("option", &["value", "selected"]),
    ("textarea", &["name", "rows", "cols", "placeholder"]),
];

fn normalize(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

/// Register or replace the description of a tag. Names are case-insensitive.
pub fn register_tag(name: impl Into<Cow<'static, str>>, spec: TagSpec) {
    let mut name = name.into();
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        name = Cow::Owned(name.to_ascii_lowercase());
    }
    let mut tags = registry().write().unwrap_or_else(PoisonError::into_inner);
    if let Some(previous) = tags.insert(name.clone(), spec) {
        tracing::debug!(tag = %name, ?previous, "replaced registered tag");
    }
}

/// Look up the description of a tag. Names are case-insensitive.
pub fn tag_spec(name: &str) -> Option<TagSpec> {
    let tags = registry().read().unwrap_or_else(PoisonError::into_inner);
    tags.get(normalize(name).as_ref()).cloned()
}

/// Create an element with any tag name.
///
/// Unknown tags are accepted as-is. Children given to a tag that does not take any are kept on
/// the element; void tags drop them when rendering.
pub fn create(name: impl Into<Cow<'static, str>>, items: impl IntoItems) -> Element {
    let element = Element::create(name, items);
    match tag_spec(element.name()) {
        None => tracing::trace!(tag = element.name(), "creating unregistered tag"),
        Some(spec) if !spec.children_allowed && !element.children().is_empty() => {
            tracing::debug!(
                tag = element.name(),
                children = element.children().len(),
                "tag does not take children; they will not render"
            )
        }
        Some(_) => {}
    }
    element
}

/// Create the `<!DOCTYPE html>` declaration.
pub fn doctype() -> Element {
    Element::create("!DOCTYPE", boolean("html"))
}

macro_rules! non_void_tags {
    ($($tag_ident:ident),*) => {
        $(
            #[doc = concat!("Create a `<", stringify!($tag_ident), ">` element.")]
            pub fn $tag_ident(items: impl IntoItems) -> Element {
                Element::create(stringify!($tag_ident), items)
            }
        )*
        /// A list of all non-void tags with a constructor.
        pub const NON_VOID_TAGS: &[&str] = &[$(stringify!($tag_ident)),*];
    };
}
non_void_tags! {
    html, head, body, main, title, style, script, noscript, template,
    header, footer, nav, section, article, aside, address,
    h1, h2, h3, h4, h5, h6, p, div, span, pre, code, blockquote,
    ol, ul, li, dl, dt, dd, figure, figcaption,
    a, em, strong, small, s, cite, q, abbr, time, mark, sub, sup, i, b, u, kbd, samp, var,
    table, caption, colgroup, thead, tbody, tfoot, tr, td, th,
    form, fieldset, legend, label, button, select, option, optgroup, textarea, output,
    progress, meter, details, summary, dialog,
    iframe, object, video, audio, picture, canvas, svg
}

macro_rules! void_tags {
    ($($tag_ident:ident),*) => {
        $(
            #[doc = concat!("Create a void `<", stringify!($tag_ident), ">` element. Children are not rendered.")]
            pub fn $tag_ident(items: impl IntoItems) -> Element {
                Element::create(stringify!($tag_ident), items)
            }
        )*
        /// A list of all void tags with a constructor.
        pub const VOID_TAGS: &[&str] = &[$(stringify!($tag_ident)),*];
    };
}
void_tags! {
    area, base, br, col, embed, hr, img, input, link, meta, source, track, wbr
}
