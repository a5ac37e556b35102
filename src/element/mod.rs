//! Element Model - Immutable descriptions of desired UI.
//!
//! An [`Element`] is a type tag plus a [`Props`] bag. Elements are built once
//! by [`create_element`] and never mutated afterwards; cloning one is cheap
//! because both halves are reference counted.
//!
//! # Props
//!
//! The prop bag keeps three things apart that a loosely typed map would mix:
//!
//! - **attributes** - plain settable values ([`PropValue`])
//! - **listeners** - event handlers keyed by lowercase event type
//! - **children** - the reserved `children` entry, an ordered list of elements
//!
//! Listener registration still follows the `onEvent` naming convention
//! (`on("onClick", ..)` registers a `click` listener), but the convention is
//! resolved when the prop is built, not when props are diffed.
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::element::{create_element, Props};
//! use spark_fiber::children;
//!
//! let element = create_element(
//!     "div",
//!     Props::new().set("id", "foo"),
//!     children![
//!         create_element("h1", Props::new(), children!["Hello"]),
//!         create_element("h2", Props::new(), children!["from spark-fiber"]),
//!     ],
//! );
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Element type used for text content.
pub const TEXT_ELEMENT: &str = "TEXT_ELEMENT";

/// Attribute carrying the content of a text element.
pub const NODE_VALUE: &str = "nodeValue";

/// Reserved prop key for child elements. Never stored as an attribute.
pub const CHILDREN: &str = "children";

// =============================================================================
// Prop Values
// =============================================================================

/// A plain (non-listener) prop value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl PropValue {
    /// Value assigned to a property that disappeared from the next props.
    pub const EMPTY: Self = Self::Str(String::new());

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// True for [`PropValue::EMPTY`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Str(s) if s.is_empty())
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

// =============================================================================
// Events and Listeners
// =============================================================================

/// An event delivered by the host to a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Lowercase event type, e.g. `click`.
    pub event_type: String,
    /// Optional payload (the key name for `keydown`).
    pub detail: Option<PropValue>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<PropValue>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A shared event handler.
///
/// Two listeners are equal only if they are the same allocation. A handler
/// rebuilt from an identical closure is a different listener.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    /// Invoke the handler.
    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    /// Reference identity.
    pub fn same(&self, other: &Listener) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// Resolve a listener prop name to its event type.
///
/// A leading `on` is dropped and the rest lowercased, so `onClick` and
/// `onclick` both become `click`. A name without the prefix is taken as the
/// event type itself and lowercased.
pub fn event_type_from_prop_name(name: &str) -> String {
    name.strip_prefix("on").unwrap_or(name).to_lowercase()
}

// =============================================================================
// Props
// =============================================================================

/// Structured prop bag of an element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    attributes: BTreeMap<String, PropValue>,
    listeners: BTreeMap<String, Listener>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute. The reserved `children` key is ignored.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        let name = name.into();
        if name == CHILDREN {
            tracing::debug!("ignoring attribute named `children`");
            return self;
        }
        self.attributes.insert(name, value.into());
        self
    }

    /// Register a new handler. Accepts `onClick` or `click`.
    pub fn on(self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        self.listener(event, Listener::new(handler))
    }

    /// Register an existing listener, keeping its identity.
    pub fn listener(mut self, event: &str, listener: Listener) -> Self {
        self.listeners
            .insert(event_type_from_prop_name(event), listener);
        self
    }

    pub(crate) fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&PropValue> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn listener_for(&self, event_type: &str) -> Option<&Listener> {
        self.listeners.get(event_type)
    }

    pub fn listeners(&self) -> impl Iterator<Item = (&str, &Listener)> {
        self.listeners.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }
}

// =============================================================================
// Element
// =============================================================================

/// Immutable description of one UI node and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    element_type: Rc<str>,
    props: Rc<Props>,
}

impl Element {
    pub fn new(element_type: &str, props: Props) -> Self {
        Self {
            element_type: Rc::from(element_type),
            props: Rc::new(props),
        }
    }

    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    /// The shared type tag, for fibers that keep it.
    pub fn type_tag(&self) -> &Rc<str> {
        &self.element_type
    }

    pub fn props(&self) -> &Rc<Props> {
        &self.props
    }

    pub fn children(&self) -> &[Element] {
        self.props.children()
    }

    pub fn is_text(&self) -> bool {
        &*self.element_type == TEXT_ELEMENT
    }
}

/// A child passed to [`create_element`]: either a structured element or a
/// plain value that becomes a text element.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Element(Element),
    Text(PropValue),
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Self::Text(text.into())
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Self::Text(value.into())
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Self::Text(value.into())
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Self::Text(value.into())
    }
}

/// Build an element. Plain children are wrapped with [`text`].
///
/// No validation happens here; an element type the host cannot create is a
/// host failure during the render cycle.
pub fn create_element(
    element_type: &str,
    props: Props,
    children: impl IntoIterator<Item = Child>,
) -> Element {
    let children = children
        .into_iter()
        .map(|child| match child {
            Child::Element(element) => element,
            Child::Text(value) => text(value),
        })
        .collect();
    Element::new(element_type, props.with_children(children))
}

/// Build a text element carrying `value` as its `nodeValue`.
pub fn text(value: impl Into<PropValue>) -> Element {
    Element::new(TEXT_ELEMENT, Props::new().set(NODE_VALUE, value))
}

/// Build a child list for [`create_element`] from mixed elements and values.
#[macro_export]
macro_rules! children {
    ($($child:expr),* $(,)?) => {
        [$($crate::element::Child::from($child)),*]
    };
}

// =============================================================================
// Tests
// =============================================================================
