use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;

use chunkhtml::chunk::{execute_all, ChunkBuffer};
use chunkhtml::pool::render_arena;
use chunkhtml::tags::{body, div, input, li, p, ul};
use chunkhtml::{
    class, component, deferred_attr, fragment, id, json, raw, render, render_items,
    render_to_string, text, Context, Document, Element, Item, Node, Render, RenderError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

struct RequestId(usize);

fn page() -> Node {
    body((
        id("app"),
        deferred_attr("data-request", |ctx| {
            ctx.value::<RequestId>()
                .map(|r| r.0.to_string())
                .unwrap_or_default()
        }),
        ul((0..20).map(|i| li(format!("item {i}"))).collect::<Vec<_>>()),
        component(|ctx| {
            let request = ctx.value::<RequestId>().map_or(0, |r| r.0);
            Ok(p(format!("served request {request}")))
        }),
    ))
    .into()
}

fn expected(request: usize) -> String {
    let items: String = (0..20).map(|i| format!("<li>item {i}</li>")).collect();
    format!(
        r#"<body data-request="{request}" id="app"><ul>{items}</ul><p>served request {request}</p></body>"#
    )
}

#[test]
fn concurrent_renders_of_a_shared_tree_do_not_interfere() {
    init_tracing();
    let tree = Arc::new(page());
    let handles: Vec<_> = (1..=8)
        .map(|request| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                let ctx = Context::new().with_value(RequestId(request));
                for _ in 0..50 {
                    assert_eq!(render_to_string(&ctx, &tree).unwrap(), expected(request));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn rendering_is_deterministic() {
    let tree = page();
    let ctx = Context::new().with_value(RequestId(7));
    let first = render_to_string(&ctx, &tree).unwrap();
    let second = render_to_string(&ctx, &tree).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, expected(7));
}

#[test]
fn mixed_items_flush_before_the_type_error() {
    init_tracing();
    let items: Vec<Item> = vec![
        p("kept").into(),
        raw("<hr>").into(),
        class("stray").into(),
        p("dropped").into(),
    ];
    let mut out = vec![];
    let err = render_items(Context::background(), &mut out, &items).unwrap_err();
    assert!(matches!(err, RenderError::InvalidItem { .. }));
    assert_eq!(String::from_utf8(out).unwrap(), "<p>kept</p><hr>");
}

#[test]
fn clones_share_children_but_not_attributes() {
    let original = div((id("a"), p("shared")));
    let mut copy = original.clone();
    copy.set_attribute(id("b"));
    copy.set_attribute(class("extra"));

    let ctx = Context::background();
    assert_eq!(
        render_to_string(ctx, &original.clone().into()).unwrap(),
        r#"<div id="a"><p>shared</p></div>"#
    );
    assert_eq!(
        render_to_string(ctx, &copy.clone().into()).unwrap(),
        r#"<div id="b" class="extra"><p>shared</p></div>"#
    );
    assert!(copy.shares_children_with(&original));

    let mut independent = original.deep_clone();
    independent.push_child(p("mine"));
    assert_eq!(original.children().len(), 1);
    assert_eq!(independent.children().len(), 2);
}

#[test]
fn deferred_attribute_runs_once_per_pass() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let tree: Node = div(deferred_attr("data-n", move |_| {
        counter.fetch_add(1, Ordering::SeqCst).to_string()
    }))
    .into();

    let ctx = Context::background();
    assert_eq!(render_to_string(ctx, &tree).unwrap(), r#"<div data-n="0"></div>"#);
    assert_eq!(render_to_string(ctx, &tree).unwrap(), r#"<div data-n="1"></div>"#);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn void_tag_with_children_renders_alone() {
    let tree: Node = div((input((id("q"), text("ignored"))), "after")).into();
    assert_eq!(
        render_to_string(Context::background(), &tree).unwrap(),
        r#"<div><input id="q">after</div>"#
    );
}

#[test]
fn json_node_inside_script() {
    let tree: Node = Element::create(
        "script",
        (
            chunkhtml::attr("type", "application/json"),
            json(serde_json::json!({"user": "ada", "ids": [1, 2]})),
        ),
    )
    .into();
    assert_eq!(
        render_to_string(Context::background(), &tree).unwrap(),
        r#"<script type="application/json">{"user":"ada","ids":[1,2]}</script>"#
    );
}

#[test]
fn chunks_can_be_inspected_before_execution() {
    let tree: Node = div((
        "static",
        deferred_attr("title", |_| "late"),
        component(|_| Ok(text("lazy"))),
    ))
    .into();
    let arena = render_arena();
    let mut buffer = ChunkBuffer::new_in(&arena);
    tree.render(&mut buffer).unwrap();

    let kinds: Vec<_> = buffer.chunks().iter().map(|c| c.is_dynamic()).collect();
    // "<div", title, ">", "static", component, "</div>"
    assert_eq!(kinds, [false, true, false, false, true, false]);

    let chunks = buffer.drain();
    assert!(buffer.drain().is_empty());
    let mut out = vec![];
    execute_all(chunks, None, &mut out).unwrap();
    assert_eq!(out, br#"<div title="late">staticlazy</div>"#);
}

#[test]
fn document_release_returns_elements() {
    let doc = Document::new_with_doctype(body(fragment(vec![
        p("a").into(),
        fragment(Vec::new()),
    ])));
    let mut out = vec![];
    doc.write(Context::background(), &mut out).unwrap();
    assert_eq!(out, b"<!DOCTYPE html><body><p>a</p></body>");
    doc.release();

    let mut writer_out = vec![];
    render(Context::background(), &mut writer_out, &div(()).into()).unwrap();
    assert_eq!(writer_out, b"<div></div>");
}
