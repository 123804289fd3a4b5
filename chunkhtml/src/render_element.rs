use std::borrow::Cow;

use bumpalo::collections::String as BumpString;
use bumpalo::Bump;

use crate::chunk::ChunkWriter;
use crate::{Deferred, Element, Render, RenderError, RenderResult};

const VOID_TAGS: &[&str] = &[
    "doctype", "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "source", "track", "wbr",
];

/// Whether `name` is a void tag: one that never renders children or a closing tag.
///
/// Names are matched case-insensitively and a leading `!` is ignored, so `!DOCTYPE` is void.
pub fn is_void(name: &str) -> bool {
    let name = name.strip_prefix('!').unwrap_or(name);
    VOID_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(name))
}

/// The name written to the output: verbatim when it starts with `!`, lower-cased otherwise.
pub(crate) fn display_name(name: &str) -> Cow<'_, str> {
    if name.starts_with('!') || !name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.to_ascii_lowercase())
    }
}

fn arena_str<'r>(arena: &'r Bump, name: Cow<'r, str>) -> &'r str {
    match name {
        Cow::Borrowed(name) => name,
        Cow::Owned(name) => arena.alloc_str(&name),
    }
}

fn write_deferred<'r>(out: &mut dyn ChunkWriter<'r>, deferred: &'r Deferred) -> RenderResult<()> {
    match deferred.property() {
        Some(property) => out.write_dynamic(move |ctx, sink| property.write_deferred(ctx, sink)),
        None => {
            let type_name = deferred.type_name();
            out.write_dynamic(move |_, _| Err(RenderError::MissingDeferred { type_name }))
        }
    }
}

impl Render for Element {
    fn render<'r>(&'r self, out: &mut dyn ChunkWriter<'r>) -> RenderResult<()> {
        let arena = out.arena();
        let name = arena_str(arena, display_name(self.name()));

        let mut open = BumpString::with_capacity_in(name.len() + 2, arena);
        open.push('<');
        open.push_str(name);

        // deferred output sits between the tag name and the plain attributes
        if !self.deferred().is_empty() {
            out.write_str(open.into_bump_str())?;
            for deferred in self.deferred() {
                write_deferred(out, deferred)?;
            }
            open = BumpString::new_in(arena);
        }

        for attribute in self.attributes() {
            open.push(' ');
            open.push_str(&attribute.key);
            if !attribute.value.is_empty() {
                open.push_str("=\"");
                open.push_str(&html_escape::encode_double_quoted_attribute(
                    attribute.value.as_ref(),
                ));
                open.push('"');
            }
        }
        open.push('>');
        out.write_str(open.into_bump_str())?;

        if is_void(self.name()) {
            return Ok(());
        }

        for child in self.children() {
            child.render(out)?;
        }

        let mut close = BumpString::with_capacity_in(name.len() + 3, arena);
        close.push_str("</");
        close.push_str(name);
        close.push('>');
        out.write_str(close.into_bump_str())
    }

    fn release(self) {
        Element::release(self)
    }
}
