use std::io::Write;

use crate::chunk::{execute_all, ChunkBuffer};
use crate::node::Item;
use crate::pool::render_arena;
use crate::tags::doctype;
use crate::{Context, Node, Render, RenderError, RenderResult};

/// Render `node` to `sink`.
///
/// The tree is walked into chunks in a pooled arena, then every chunk is executed in order.
/// Execution stops at the first error; bytes written before it stay written.
pub fn render(ctx: &Context, sink: &mut dyn Write, node: &Node) -> RenderResult<()> {
    let _span = tracing::debug_span!("render", node = node.kind()).entered();
    let arena = render_arena();
    let mut buffer = ChunkBuffer::new_in(&arena);
    let result = node
        .render(&mut buffer)
        .and_then(|()| execute_all(buffer.drain(), Some(ctx), sink));
    if let Err(err) = &result {
        tracing::debug!(error = %err, "render pass aborted");
    }
    result
}

/// Render a sequence of items to `sink`, in order.
///
/// Every item must be a node. The first item that is not stops the pass with
/// [`RenderError::InvalidItem`], after the output of the items before it has been written.
pub fn render_items(ctx: &Context, sink: &mut dyn Write, items: &[Item]) -> RenderResult<()> {
    let _span = tracing::debug_span!("render", items = items.len()).entered();
    let arena = render_arena();
    let mut buffer = ChunkBuffer::new_in(&arena);
    let mut walk = || -> RenderResult<()> {
        for item in items {
            match item {
                Item::Node(node) => node.render(&mut buffer)?,
                Item::Prop(prop) => {
                    let type_name = prop.type_name();
                    tracing::debug!(item = type_name, "rejecting non-node item");
                    execute_all(buffer.drain(), Some(ctx), sink)?;
                    return Err(RenderError::InvalidItem { type_name });
                }
            }
        }
        execute_all(buffer.drain(), Some(ctx), sink)
    };
    let result = walk();
    if let Err(err) = &result {
        tracing::debug!(error = %err, "render pass aborted");
    }
    result
}

/// Render `node` into a byte vector.
pub fn render_to_vec(ctx: &Context, node: &Node) -> RenderResult<Vec<u8>> {
    let mut out = Vec::new();
    render(ctx, &mut out, node)?;
    Ok(out)
}

/// Render `node` into a string.
pub fn render_to_string(ctx: &Context, node: &Node) -> RenderResult<String> {
    Ok(String::from_utf8(render_to_vec(ctx, node)?)?)
}

/// Render `node` to `sink`, panicking if rendering fails.
///
/// Meant for trees whose rendering cannot fail, such as static pages built at startup.
pub fn must_render(ctx: &Context, sink: &mut dyn Write, node: &Node) {
    if let Err(err) = render(ctx, sink, node) {
        panic!("failed to render {} node: {err}", node.kind());
    }
}

#[derive(Debug, Clone, Default)]
/// A whole HTML document: top-level nodes rendered one after another.
pub struct Document {
    /// The top-level nodes of the document.
    pub children: Vec<Node>,
}

impl Document {
    /// Create a new document from its top-level nodes.
    pub fn new(children: impl IntoIterator<Item = impl Into<Node>>) -> Self {
        Document {
            children: children.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a new document with a doctype declaration followed by the given node.
    pub fn new_with_doctype(node: impl Into<Node>) -> Self {
        Document {
            children: vec![doctype().into(), node.into()],
        }
    }

    /// Write the document to a writer.
    pub fn write(&self, ctx: &Context, sink: &mut dyn Write) -> RenderResult<()> {
        for child in &self.children {
            render(ctx, sink, child)?;
        }
        Ok(())
    }

    /// Write the document to a string.
    pub fn write_to_string(&self, ctx: &Context) -> RenderResult<String> {
        let mut output = vec![];
        self.write(ctx, &mut output)?;
        Ok(String::from_utf8(output)?)
    }

    /// Hand every pooled element in the document back to its pool.
    pub fn release(self) {
        for child in self.children {
            child.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{body, br, code, div, html, p, ul};
    use crate::{attr, class, component, text};

    #[test]
    fn test_inline_code() {
        let doc = Document::new([p((
            "This is an example of ",
            code("inline code"),
            " in a paragraph.",
        ))]);
        let output = doc.write_to_string(Context::background()).unwrap();
        assert_eq!(
            output,
            "<p>This is an example of <code>inline code</code> in a paragraph.</p>"
        );
    }

    #[test]
    fn test_empty_ul_with_tags_class() {
        let doc = Document::new([ul(class("tags"))]);
        let output = doc.write_to_string(Context::background()).unwrap();
        assert_eq!(output, "<ul class=\"tags\"></ul>");
    }

    #[test]
    fn test_void_element() {
        let doc = Document::new([br(())]);
        assert_eq!(doc.write_to_string(Context::background()).unwrap(), "<br>");
    }

    #[test]
    fn test_new_with_doctype() {
        let doc = Document::new_with_doctype(html(body("Hello")));
        let output = doc.write_to_string(Context::background()).unwrap();
        assert_eq!(output, "<!DOCTYPE html><html><body>Hello</body></html>");
        doc.release();
    }

    #[test]
    fn render_items_flushes_valid_items_before_rejecting() {
        let items: Vec<Item> = vec![
            div("a").into(),
            text("b").into(),
            attr("href", "/").into(),
            div("never").into(),
        ];
        let mut out = vec![];
        let err = render_items(Context::background(), &mut out, &items).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidItem { type_name } if type_name.ends_with("Attribute")
        ));
        assert_eq!(out, b"<div>a</div>b");
    }

    #[test]
    fn render_items_of_nodes_only() {
        let items: Vec<Item> = vec![p("x").into(), "<y>".into()];
        let mut out = vec![];
        render_items(Context::background(), &mut out, &items).unwrap();
        assert_eq!(out, b"<p>x</p>&lt;y&gt;");
    }

    #[test]
    fn context_reaches_components() {
        struct User(&'static str);
        let ctx = Context::new().with_value(User("ada"));
        let node = div(component(|ctx| {
            let user = ctx.value::<User>().map_or("anonymous", |u| u.0);
            Ok(text(user))
        }))
        .into();
        assert_eq!(render_to_string(&ctx, &node).unwrap(), "<div>ada</div>");
        assert_eq!(
            render_to_string(Context::background(), &node).unwrap(),
            "<div>anonymous</div>"
        );
    }

    #[test]
    fn cancelled_context_is_visible_to_components() {
        let ctx = Context::new();
        ctx.cancel();
        let node = component(|ctx| {
            ctx.check()?;
            Ok(text("unreachable"))
        });
        let err = render_to_vec(&ctx, &node).unwrap_err();
        assert!(matches!(err, RenderError::Cancelled));
    }

    #[test]
    #[should_panic(expected = "failed to render Element node")]
    fn must_render_panics_on_error() {
        let node = div(component(|_| Err::<Node, _>(RenderError::msg("boom")))).into();
        must_render(Context::background(), &mut Vec::new(), &node);
    }
}
