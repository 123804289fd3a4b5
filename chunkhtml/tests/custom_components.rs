use pretty_assertions::assert_eq;

use chunkhtml::tags::{div, li, p, span, ul};
use chunkhtml::{
    class, component, deferred_attr, id, render_to_string, static_prop, text, Context, Element,
    IntoItems, Node, RenderError,
};

#[derive(Default)]
struct CardProps {
    title: String,
    highlighted: bool,
    // Extra field to demonstrate ..Default::default() usefulness
    #[allow(dead_code)]
    footer: Option<String>,
}

#[allow(non_snake_case)]
fn Card(props: CardProps, children: impl IntoItems) -> Element {
    div((
        class("card"),
        props.highlighted.then(|| class("highlighted")),
        p(props.title),
        div((class("card-body"), children)),
    ))
}

struct CurrentUser {
    name: String,
    admin: bool,
}

#[allow(non_snake_case)]
fn Greeting() -> Node {
    component(|ctx| {
        let Some(user) = ctx.value::<CurrentUser>() else {
            return Ok(text("Hello, stranger"));
        };
        Ok(span((
            user.admin.then(|| class("admin")),
            format!("Hello, {}", user.name),
        ))
        .into())
    })
}

fn render(ctx: &Context, element: Element) -> String {
    render_to_string(ctx, &element.into()).unwrap()
}

#[test]
fn test_component_with_attributes_and_children() {
    let card = Card(
        CardProps {
            title: "Stats".into(),
            highlighted: true,
            ..Default::default()
        },
        ul((li("one"), li("two"))),
    );
    assert_eq!(
        render(Context::background(), card),
        r#"<div class="card highlighted"><p>Stats</p><div class="card-body"><ul><li>one</li><li>two</li></ul></div></div>"#
    );
}

#[test]
fn test_component_defaults() {
    let card = Card(CardProps::default(), ());
    assert_eq!(
        render(Context::background(), card),
        r#"<div class="card"><p></p><div class="card-body"></div></div>"#
    );
}

#[test]
fn test_context_component_inside_static_tree() {
    let page = div((id("page"), Greeting(), p("static")));
    let ctx = Context::new().with_value(CurrentUser {
        name: "Ada <admin>".into(),
        admin: true,
    });
    assert_eq!(
        render(&ctx, page.clone()),
        r#"<div id="page"><span class="admin">Hello, Ada &lt;admin&gt;</span><p>static</p></div>"#
    );
    assert_eq!(
        render(Context::background(), page),
        r#"<div id="page">Hello, stranger<p>static</p></div>"#
    );
}

#[test]
fn test_component_error_surfaces_from_render() {
    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded")]
    struct Quota;

    let page: Node = div(component(|_| Err::<Node, _>(RenderError::component(Quota)))).into();
    let err = render_to_string(Context::background(), &page).unwrap_err();
    assert_eq!(err.to_string(), "component failed: quota exceeded");
}

#[test]
fn test_static_prop_sees_final_attributes() {
    // a static property can derive attributes from the ones set during construction
    let mirror_id = static_prop(|el: &mut Element| {
        if let Some(id) = el.attribute("id").map(str::to_string) {
            el.set_attribute(chunkhtml::attr("data-ref", format!("#{id}")));
        }
    });
    let element = div((mirror_id, id("target"), deferred_attr("data-late", |_| "yes")));
    assert_eq!(
        render(Context::background(), element),
        r##"<div data-late="yes" id="target" data-ref="#target"></div>"##
    );
}
