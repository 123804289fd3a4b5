use std::any::type_name;
use std::borrow::Cow;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::{Context, Element, RenderResult};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A key-value pair for an HTML attribute.
///
/// An empty value renders as a bare key (`<input disabled>`).
pub struct Attribute {
    /// The key of the attribute.
    pub key: Cow<'static, str>,
    /// The value of the attribute.
    pub value: Cow<'static, str>,
}

impl Attribute {
    /// Create a new attribute with a key and value.
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
        Attribute {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a boolean attribute (no value).
    pub fn boolean(key: impl Into<Cow<'static, str>>) -> Self {
        Attribute {
            key: key.into(),
            value: Cow::Borrowed(""),
        }
    }

    /// Whether this is the `class` attribute, whose values accumulate instead of being replaced.
    pub fn is_class(&self) -> bool {
        self.key == "class"
    }
}

/// When a property takes effect on its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Applied during construction, before every other property.
    Immediate,
    /// Applied during construction, after every immediate property.
    Static,
    /// Evaluated at render time against the active [`Context`].
    Deferred,
}

/// A property that modifies its element during construction.
pub trait ApplyProperty: Send + Sync {
    /// Apply the property to `element`.
    fn apply(&self, element: &mut Element);
}

impl<F> ApplyProperty for F
where
    F: Fn(&mut Element) + Send + Sync,
{
    fn apply(&self, element: &mut Element) {
        self(element)
    }
}

impl ApplyProperty for Attribute {
    fn apply(&self, element: &mut Element) {
        element.set_attribute(self.clone());
    }
}

/// A property that renders part of its element's opening tag at render time.
pub trait DeferredProperty: Send + Sync {
    /// Write the property's attribute text, including its leading space, to `sink`.
    fn write_deferred(&self, ctx: &Context, sink: &mut dyn Write) -> RenderResult<()>;
}

/// An open extension point for property types that declare their lifecycle at runtime.
///
/// Implementors report a [`Lifecycle`] and expose the capability that lifecycle needs.
/// [`Prop::from_proper`] turns them into a [`Prop`].
pub trait Proper: Send + Sync + 'static {
    /// When the property takes effect.
    fn lifecycle(&self) -> Lifecycle;

    /// The construction-time behaviour, required for [`Lifecycle::Immediate`] and
    /// [`Lifecycle::Static`].
    fn into_apply(self: Arc<Self>) -> Option<Arc<dyn ApplyProperty>> {
        None
    }

    /// The render-time behaviour, required for [`Lifecycle::Deferred`].
    fn into_deferred(self: Arc<Self>) -> Option<Arc<dyn DeferredProperty>> {
        None
    }
}

/// A property recorded on an element to be evaluated at render time.
#[derive(Clone)]
pub struct Deferred {
    type_name: &'static str,
    property: Option<Arc<dyn DeferredProperty>>,
}

impl Deferred {
    /// Wrap a deferred property.
    pub fn new<P: DeferredProperty + 'static>(property: P) -> Self {
        Deferred {
            type_name: type_name::<P>(),
            property: Some(Arc::new(property)),
        }
    }

    /// The property, or `None` if it was declared deferred without being able to render.
    pub fn property(&self) -> Option<&dyn DeferredProperty> {
        self.property.as_deref()
    }

    /// The name of the property's type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("type_name", &self.type_name)
            .field("renderable", &self.property.is_some())
            .finish()
    }
}

/// An attribute-like modifier passed to an element constructor.
#[derive(Clone)]
pub enum Prop {
    /// A plain attribute. Plain attributes are immediate.
    Attribute(Attribute),
    /// A property applied first, in construction order.
    Immediate {
        /// The name of the property's type.
        type_name: &'static str,
        /// The construction-time behaviour.
        apply: Arc<dyn ApplyProperty>,
    },
    /// A property applied after all immediate ones, in construction order.
    Static {
        /// The name of the property's type.
        type_name: &'static str,
        /// The construction-time behaviour.
        apply: Arc<dyn ApplyProperty>,
    },
    /// A property evaluated at render time.
    Deferred(Deferred),
}

impl Prop {
    /// Create an immediate property.
    pub fn immediate<P: ApplyProperty + 'static>(property: P) -> Self {
        Prop::Immediate {
            type_name: type_name::<P>(),
            apply: Arc::new(property),
        }
    }

    /// Create a static property.
    pub fn statik<P: ApplyProperty + 'static>(property: P) -> Self {
        Prop::Static {
            type_name: type_name::<P>(),
            apply: Arc::new(property),
        }
    }

    /// Create a deferred property.
    pub fn deferred<P: DeferredProperty + 'static>(property: P) -> Self {
        Prop::Deferred(Deferred::new(property))
    }

    /// Convert a dynamically-described property.
    ///
    /// A deferred property that cannot render is kept; it renders as an error at its position
    /// in the output.
    ///
    /// # Panics
    ///
    /// Panics if an immediate or static property has no construction-time behaviour. That is a
    /// programming error in the property's type, not a runtime condition.
    pub fn from_proper<P: Proper>(proper: P) -> Self {
        let type_name = type_name::<P>();
        let proper = Arc::new(proper);
        match proper.lifecycle() {
            Lifecycle::Immediate => Prop::Immediate {
                type_name,
                apply: proper.into_apply().unwrap_or_else(|| {
                    panic!("immediate property `{type_name}` does not implement ApplyProperty")
                }),
            },
            Lifecycle::Static => Prop::Static {
                type_name,
                apply: proper.into_apply().unwrap_or_else(|| {
                    panic!("static property `{type_name}` does not implement ApplyProperty")
                }),
            },
            Lifecycle::Deferred => {
                let property = proper.into_deferred();
                if property.is_none() {
                    tracing::warn!(
                        property = type_name,
                        "deferred property cannot render; it will emit an error"
                    );
                }
                Prop::Deferred(Deferred {
                    type_name,
                    property,
                })
            }
        }
    }

    /// When the property takes effect.
    pub fn lifecycle(&self) -> Lifecycle {
        match self {
            Prop::Attribute(_) | Prop::Immediate { .. } => Lifecycle::Immediate,
            Prop::Static { .. } => Lifecycle::Static,
            Prop::Deferred(_) => Lifecycle::Deferred,
        }
    }

    /// The name of the property's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Prop::Attribute(_) => type_name::<Attribute>(),
            Prop::Immediate { type_name, .. } | Prop::Static { type_name, .. } => *type_name,
            Prop::Deferred(deferred) => deferred.type_name,
        }
    }
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Attribute(attribute) => f.debug_tuple("Attribute").field(attribute).finish(),
            Prop::Immediate { type_name, .. } => f.debug_tuple("Immediate").field(type_name).finish(),
            Prop::Static { type_name, .. } => f.debug_tuple("Static").field(type_name).finish(),
            Prop::Deferred(deferred) => f.debug_tuple("Deferred").field(deferred).finish(),
        }
    }
}

impl From<Attribute> for Prop {
    fn from(attribute: Attribute) -> Self {
        Prop::Attribute(attribute)
    }
}

impl From<Deferred> for Prop {
    fn from(deferred: Deferred) -> Self {
        Prop::Deferred(deferred)
    }
}

type ComputeFn = dyn Fn(&Context) -> RenderResult<Cow<'static, str>> + Send + Sync;

/// An attribute whose value is computed from the [`Context`] at render time.
#[derive(Clone)]
pub struct DeferredAttr {
    key: Cow<'static, str>,
    compute: Arc<ComputeFn>,
}

impl DeferredAttr {
    /// Create a deferred attribute from a fallible computation.
    pub fn new<F, V>(key: impl Into<Cow<'static, str>>, compute: F) -> Self
    where
        F: Fn(&Context) -> RenderResult<V> + Send + Sync + 'static,
        V: Into<Cow<'static, str>>,
    {
        DeferredAttr {
            key: key.into(),
            compute: Arc::new(move |ctx: &Context| -> RenderResult<Cow<'static, str>> {
                compute(ctx).map(Into::into)
            }),
        }
    }
}

impl DeferredProperty for DeferredAttr {
    fn write_deferred(&self, ctx: &Context, sink: &mut dyn Write) -> RenderResult<()> {
        let value = (self.compute)(ctx)?;
        if value.is_empty() {
            write!(sink, " {}", self.key)?;
        } else {
            write!(
                sink,
                " {}=\"{}\"",
                self.key,
                html_escape::encode_double_quoted_attribute(value.as_ref())
            )?;
        }
        Ok(())
    }
}

/// Create an attribute.
pub fn attr(key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Attribute {
    Attribute::new(key, value)
}

/// Create an `id` attribute.
pub fn id(value: impl Into<Cow<'static, str>>) -> Attribute {
    Attribute::new("id", value)
}

/// Create a `class` attribute. Repeated class attributes on one element accumulate.
pub fn class(value: impl Into<Cow<'static, str>>) -> Attribute {
    Attribute::new("class", value)
}

/// Create a boolean attribute (no value).
pub fn boolean(key: impl Into<Cow<'static, str>>) -> Attribute {
    Attribute::boolean(key)
}

/// Create a deferred attribute whose value is computed at render time.
///
/// An empty computed value renders the bare key.
pub fn deferred_attr<F, V>(key: impl Into<Cow<'static, str>>, compute: F) -> Prop
where
    F: Fn(&Context) -> V + Send + Sync + 'static,
    V: Into<Cow<'static, str>>,
{
    Prop::deferred(DeferredAttr::new(key, move |ctx| Ok(compute(ctx))))
}

/// Create a deferred attribute whose computation may fail.
pub fn try_deferred_attr<F, V>(key: impl Into<Cow<'static, str>>, compute: F) -> Prop
where
    F: Fn(&Context) -> RenderResult<V> + Send + Sync + 'static,
    V: Into<Cow<'static, str>>,
{
    Prop::deferred(DeferredAttr::new(key, compute))
}

/// Create an immediate property from a closure.
pub fn immediate_prop(apply: impl Fn(&mut Element) + Send + Sync + 'static) -> Prop {
    Prop::immediate(apply)
}

/// Create a static property from a closure. Static properties see every immediate property
/// already applied.
pub fn static_prop(apply: impl Fn(&mut Element) + Send + Sync + 'static) -> Prop {
    Prop::statik(apply)
}
