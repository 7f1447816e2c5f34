//! Immutable tree descriptions.
//!
//! A [`VNode`] captures one node of the desired UI: a primitive element, a
//! component reference, or a text leaf. Building one is pure, with no
//! mutation and no scheduling, and every render produces a fresh tree.

use std::fmt;
use std::rc::Rc;

/// A named event delivered to a bound listener.
#[derive(Debug, Clone)]
pub struct Event {
    name: String,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Shared, clonable event callback.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn invoke(&self, event: &Event) {
        (self.0)(event)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHandler")
    }
}

/// A component is any function from a property bag to a tree description.
#[derive(Clone)]
pub struct ComponentFn(Rc<dyn Fn(&Props) -> VNode>);

impl ComponentFn {
    pub fn new(f: impl Fn(&Props) -> VNode + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, props: &Props) -> VNode {
        (self.0)(props)
    }
}

impl fmt::Debug for ComponentFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComponentFn")
    }
}

pub type StyleBag = Vec<(String, String)>;

#[derive(Debug, Clone)]
pub enum PropValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Handler(EventHandler),
    Style(StyleBag),
}

impl PropValue {
    /// Attribute rendering for non-handler, non-style values.
    pub fn to_attr_string(&self) -> Option<String> {
        match self {
            PropValue::Text(value) => Some(value.clone()),
            PropValue::Number(value) => Some(value.to_string()),
            PropValue::Bool(value) => Some(value.to_string()),
            PropValue::Handler(_) | PropValue::Style(_) => None,
        }
    }
}

/// Insertion-ordered property bag. Last applied on every render, replaced
/// whole; never merged with the previous bag.
#[derive(Debug, Clone, Default)]
pub struct Props {
    entries: Vec<(String, PropValue)>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set(&mut self, name: impl Into<String>, value: PropValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, PropValue::Text(value.into()));
        self
    }

    pub fn number(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, PropValue::Number(value));
        self
    }

    pub fn flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.set(name, PropValue::Bool(value));
        self
    }

    /// Sets the element's class list; applied as the `class` attribute.
    pub fn class_name(mut self, value: impl Into<String>) -> Self {
        self.set(CLASS_NAME_PROP, PropValue::Text(value.into()));
        self
    }

    /// Binds a listener for `event`; the property key gets the `on_` prefix.
    pub fn on(mut self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        self.set(
            format!("{HANDLER_PREFIX}{event}"),
            PropValue::Handler(EventHandler::new(handler)),
        );
        self
    }

    pub fn style<K: Into<String>, V: Into<String>>(
        mut self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        let bag: StyleBag = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.set(STYLE_PROP, PropValue::Style(bag));
        self
    }
}

pub const CLASS_NAME_PROP: &str = "class_name";
pub const STYLE_PROP: &str = "style";
pub const HANDLER_PREFIX: &str = "on_";

/// The discriminated tag of a tree node.
#[derive(Debug, Clone)]
pub enum VKind {
    /// A primitive element, e.g. `div`.
    Element(String),
    /// A component reference; mounting instantiates it.
    Component(ComponentFn),
    /// A text leaf.
    Text,
}

/// Immutable description of a UI node. A new tree is built on every render.
#[derive(Debug, Clone)]
pub struct VNode {
    kind: VKind,
    props: Props,
    children: Vec<VNode>,
    text: Option<String>,
}

impl VNode {
    pub fn kind(&self) -> &VKind {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// A text leaf holding the literal `text`.
    pub fn text_leaf(text: impl Into<String>) -> Self {
        Self {
            kind: VKind::Text,
            props: Props::new(),
            children: Vec::new(),
            text: Some(text.into()),
        }
    }
}

/// One entry in a child list before normalization. Nested lists flatten to
/// arbitrary depth, `Empty` entries are dropped (the conditional-child
/// idiom), and bare values become text leaves.
#[derive(Debug, Clone)]
pub enum Child {
    Node(VNode),
    Text(String),
    Many(Vec<Child>),
    Empty,
}

impl From<VNode> for Child {
    fn from(node: VNode) -> Self {
        Child::Node(node)
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_owned())
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        // `false` disappears, so `cond.then(..)`-style children work the
        // same way whether they carry a node or a literal.
        if value {
            Child::Text("true".to_owned())
        } else {
            Child::Empty
        }
    }
}

impl<C: Into<Child>> From<Option<C>> for Child {
    fn from(value: Option<C>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Child::Empty,
        }
    }
}

impl<C: Into<Child>> From<Vec<C>> for Child {
    fn from(children: Vec<C>) -> Self {
        Child::Many(children.into_iter().map(Into::into).collect())
    }
}

macro_rules! child_from_display {
    ($($ty:ty),+ $(,)?) => {
        $(impl From<$ty> for Child {
            fn from(value: $ty) -> Self {
                Child::Text(value.to_string())
            }
        })+
    };
}

child_from_display!(i32, i64, u32, u64, usize, f32, f64);

/// Builds a heterogeneous child list, converting each entry via
/// [`Child::from`].
#[macro_export]
macro_rules! children {
    ($($child:expr),* $(,)?) => {
        vec![$($crate::vnode::Child::from($child)),*]
    };
}

fn flatten_into(child: Child, out: &mut Vec<VNode>) {
    match child {
        Child::Node(node) => out.push(node),
        Child::Text(text) => out.push(VNode::text_leaf(text)),
        Child::Many(children) => {
            for child in children {
                flatten_into(child, out);
            }
        }
        Child::Empty => {}
    }
}

/// Pure tree construction: a primitive element with a property bag and a
/// normalized child list.
pub fn build_element(
    tag: impl Into<String>,
    props: Props,
    children: impl IntoIterator<Item = Child>,
) -> VNode {
    let mut normalized = Vec::new();
    for child in children {
        flatten_into(child, &mut normalized);
    }
    VNode {
        kind: VKind::Element(tag.into()),
        props,
        children: normalized,
        text: None,
    }
}

/// A component reference with its property bag. The component runs when the
/// node is mounted, never during construction.
pub fn component(f: impl Fn(&Props) -> VNode + 'static, props: Props) -> VNode {
    VNode {
        kind: VKind::Component(ComponentFn::new(f)),
        props,
        children: Vec::new(),
        text: None,
    }
}

/// Grouping without a styled wrapper: a pass-through element whose box does
/// not participate in layout.
pub fn fragment(children: impl IntoIterator<Item = Child>) -> VNode {
    build_element(
        "div",
        Props::new().style([("display", "contents")]),
        children,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_flatten_and_drop_empty_entries() {
        let node = build_element(
            "div",
            Props::new(),
            children![1, Child::Empty, children![2, false, 3]],
        );
        let texts: Vec<&str> = node
            .children()
            .iter()
            .map(|child| child.text().expect("text leaf"))
            .collect();
        assert_eq!(texts, ["1", "2", "3"]);
        assert!(node
            .children()
            .iter()
            .all(|child| matches!(child.kind(), VKind::Text)));
    }

    #[test]
    fn none_and_false_children_disappear() {
        let maybe: Option<&str> = None;
        let node = build_element("span", Props::new(), children![maybe, false, "kept"]);
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].text(), Some("kept"));
    }

    #[test]
    fn props_replace_on_same_key_and_keep_insertion_order() {
        let props = Props::new()
            .attr("id", "a")
            .attr("title", "first")
            .attr("title", "second");
        let names: Vec<&str> = props.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["id", "title"]);
        match props.get("title") {
            Some(PropValue::Text(value)) => assert_eq!(value, "second"),
            other => panic!("unexpected prop {other:?}"),
        }
    }

    #[test]
    fn fragment_is_display_contents() {
        let node = fragment(children!["x"]);
        match node.props().get(STYLE_PROP) {
            Some(PropValue::Style(bag)) => {
                assert_eq!(bag[0], ("display".to_owned(), "contents".to_owned()))
            }
            other => panic!("unexpected style prop {other:?}"),
        }
    }
}
