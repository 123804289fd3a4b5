#![deny(missing_docs)]
//! A crate for streaming HTML from a tree of composable nodes.
//!
//! Trees are built from tag constructors in [tags], which accept any mix of child nodes and
//! properties. Rendering walks the tree into a sequence of [chunk::Chunk]s: static markup
//! interleaved with callbacks that run against the request's [Context] when the stream reaches
//! them. Deferred attributes and [component]s use those callbacks to produce output from
//! request-scoped data without rebuilding the tree.
//!
//! Render passes allocate their chunks in pooled [bumpalo::Bump] arenas, and elements are
//! checked out of a pool, so rendering under load stays allocation-light. A built tree is
//! immutable for rendering purposes and can be rendered from many threads at once.
//!
//! # Example
//!
//! ```
//! use chunkhtml::tags::{body, div, h1};
//! use chunkhtml::{class, deferred_attr, id, render_to_string, Context};
//!
//! struct Theme(&'static str);
//!
//! let page = body((
//!     id("app"),
//!     deferred_attr("data-theme", |ctx| ctx.value::<Theme>().map_or("light", |t| t.0)),
//!     div((class("container"), h1("Hello, World!"))),
//! ));
//!
//! let ctx = Context::new().with_value(Theme("dark"));
//! let html = render_to_string(&ctx, &page.into()).unwrap();
//! assert_eq!(
//!     html,
//!     r#"<body data-theme="dark" id="app"><div class="container"><h1>Hello, World!</h1></div></body>"#
//! );
//! ```

pub mod builder;
pub mod chunk;
pub mod pool;
pub mod tags;

// Re-export bumpalo for convenience
pub use bumpalo;

mod error;
pub use error::{RenderError, RenderResult};

mod context;
pub use context::Context;

mod attribute;
pub use attribute::{
    attr, boolean, class, deferred_attr, id, immediate_prop, static_prop, try_deferred_attr,
    ApplyProperty, Attribute, Deferred, DeferredAttr, DeferredProperty, Lifecycle, Prop, Proper,
};

mod node;
pub use node::{
    component, fragment, json, raw, text, Component, Fragment, IntoItems, Item, JsonNode, Node,
    Raw, Render, Text,
};

mod element;
pub use element::Element;

mod render_element;
pub use render_element::is_void;

mod document;
pub use document::{must_render, render, render_items, render_to_string, render_to_vec, Document};
