//! Core component model - the foundation of the enhancer system
//!
//! A [`Component`] is an immutable descriptor: static metadata, a props
//! contract, and the ability to create instances. Everything stateful happens
//! in an [`Instance`], whose lifecycle hooks an external scheduler drives.
//!
//! # Lifecycle
//!
//! ```text
//! ComponentDef::create(props, ctx) → mount → update* → unmount
//!                                      ↘ render (any time while mounted)
//! ```
//!
//! Components compare by identity only. Two components built from identical
//! closures are still two different components.

use crate::props::{Props, PropsContract};
use crate::statics::{StaticValue, Statics};
use crate::util::lock;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Display name used when a component does not declare one
pub const ANONYMOUS: &str = "Component";

// ============================================================================
// Render Output
// ============================================================================

/// Inert description of rendered output
///
/// Nothing in this crate draws a `Node`; callers inspect it.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Empty,
    Text(String),
    Element {
        tag: String,
        props: Props,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn element(tag: impl Into<String>, props: Props, children: Vec<Node>) -> Self {
        Self::Element {
            tag: tag.into(),
            props,
            children,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

// ============================================================================
// Reference Handles
// ============================================================================

/// What a reference handle points at once the innermost instance mounts
#[derive(Debug, Clone)]
pub struct RefTarget {
    component: String,
    props: Arc<Mutex<Props>>,
}

/// Caller-created slot that reaches the innermost instance
///
/// Containers never attach to it; they pass it down unchanged. The leaf
/// instance attaches on mount and detaches on unmount.
#[derive(Debug, Clone, Default)]
pub struct RefHandle {
    slot: Arc<Mutex<Option<RefTarget>>>,
}

impl RefHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Display name of the attached instance's component
    pub fn component_name(&self) -> Option<String> {
        lock(&self.slot).as_ref().map(|t| t.component.clone())
    }

    /// Props the attached instance currently holds
    pub fn current_props(&self) -> Option<Props> {
        lock(&self.slot).as_ref().map(|t| lock(&t.props).clone())
    }

    pub(crate) fn attach(&self, target: RefTarget) {
        *lock(&self.slot) = Some(target);
    }

    pub(crate) fn detach(&self) {
        lock(&self.slot).take();
    }
}

/// Per-instance context threaded unchanged through every container layer
#[derive(Debug, Clone, Default)]
pub struct InstanceContext {
    pub ref_handle: Option<RefHandle>,
}

impl InstanceContext {
    pub fn with_ref(handle: RefHandle) -> Self {
        Self {
            ref_handle: Some(handle),
        }
    }
}

// ============================================================================
// Component & Instance Traits
// ============================================================================

/// Result of delivering new props to an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update reached the innermost component
    Applied,
    /// A layer stopped the update; depth 0 is the outermost layer
    Suppressed { depth: usize },
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Re-express an outcome reported by a wrapped instance from one layer up
    pub fn nested(self) -> Self {
        match self {
            Self::Applied => Self::Applied,
            Self::Suppressed { depth } => Self::Suppressed { depth: depth + 1 },
        }
    }
}

/// A live instance of a component
///
/// Hooks are invoked synchronously by the scheduler and never concurrently
/// for the same instance. `unmount` must be safe to call more than once.
pub trait Instance: Send {
    fn mount(&mut self) -> anyhow::Result<()>;

    fn update(&mut self, props: Props) -> anyhow::Result<UpdateOutcome>;

    fn render(&self) -> anyhow::Result<Node>;

    fn unmount(&mut self);
}

/// Behaviour behind a [`Component`] handle
///
/// Implemented by leaf components ([`FnComponent`]) and by containers built
/// with [`wrap`](crate::container::wrap).
pub trait ComponentDef: Send + Sync {
    fn statics(&self) -> &Statics;

    fn contract(&self) -> &PropsContract;

    /// Create an unmounted instance; no side effects allowed here
    fn create(&self, props: Props, ctx: InstanceContext) -> Box<dyn Instance>;
}

/// Shared, identity-compared handle to a component definition
#[derive(Clone)]
pub struct Component(Arc<dyn ComponentDef>);

impl Component {
    pub fn new(def: impl ComponentDef + 'static) -> Self {
        Self(Arc::new(def))
    }

    /// Start building a leaf component
    pub fn builder(display_name: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder::new(display_name)
    }

    /// Identity comparison
    pub fn ptr_eq(a: &Component, b: &Component) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn display_name(&self) -> &str {
        self.0.statics().display_name().unwrap_or(ANONYMOUS)
    }

    pub fn statics(&self) -> &Statics {
        self.0.statics()
    }

    pub fn contract(&self) -> &PropsContract {
        self.0.contract()
    }

    pub fn create(&self, props: Props, ctx: InstanceContext) -> Box<dyn Instance> {
        self.0.create(props, ctx)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.display_name()).finish()
    }
}

// ============================================================================
// Leaf Components
// ============================================================================

/// Render function of a leaf component
pub type RenderFn = Arc<dyn Fn(&Props) -> anyhow::Result<Node> + Send + Sync>;

/// Builder for [`FnComponent`]
pub struct ComponentBuilder {
    statics: Statics,
    contract: PropsContract,
}

impl ComponentBuilder {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            statics: Statics::named(display_name),
            contract: PropsContract::default(),
        }
    }

    pub fn contract(mut self, contract: PropsContract) -> Self {
        self.contract = contract;
        self
    }

    pub fn with_static(mut self, name: impl Into<String>, value: impl Into<StaticValue>) -> Self {
        self.statics.insert(name, value);
        self
    }

    /// Finish with the render function
    pub fn render<F>(self, render: F) -> Component
    where
        F: Fn(&Props) -> anyhow::Result<Node> + Send + Sync + 'static,
    {
        Component::new(FnComponent {
            statics: self.statics,
            contract: self.contract,
            render: Arc::new(render),
        })
    }
}

/// A component defined by a render function
pub struct FnComponent {
    statics: Statics,
    contract: PropsContract,
    render: RenderFn,
}

impl ComponentDef for FnComponent {
    fn statics(&self) -> &Statics {
        &self.statics
    }

    fn contract(&self) -> &PropsContract {
        &self.contract
    }

    fn create(&self, props: Props, ctx: InstanceContext) -> Box<dyn Instance> {
        Box::new(FnInstance {
            display_name: self.statics.display_name().unwrap_or(ANONYMOUS).to_string(),
            props: Arc::new(Mutex::new(props)),
            render: self.render.clone(),
            ref_handle: ctx.ref_handle,
        })
    }
}

struct FnInstance {
    display_name: String,
    props: Arc<Mutex<Props>>,
    render: RenderFn,
    ref_handle: Option<RefHandle>,
}

impl Instance for FnInstance {
    fn mount(&mut self) -> anyhow::Result<()> {
        if let Some(handle) = &self.ref_handle {
            handle.attach(RefTarget {
                component: self.display_name.clone(),
                props: self.props.clone(),
            });
        }
        Ok(())
    }

    fn update(&mut self, props: Props) -> anyhow::Result<UpdateOutcome> {
        *lock(&self.props) = props;
        Ok(UpdateOutcome::Applied)
    }

    fn render(&self) -> anyhow::Result<Node> {
        let props = lock(&self.props).clone();
        (self.render)(&props)
    }

    fn unmount(&mut self) {
        if let Some(handle) = &self.ref_handle {
            handle.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;

    fn label() -> Component {
        Component::builder("Label").render(|props| {
            Ok(Node::text(
                props.get("text").and_then(|v| v.as_str()).unwrap_or(""),
            ))
        })
    }

    #[test]
    fn test_identity_not_structure() {
        let a = label();
        let b = label();
        assert!(Component::ptr_eq(&a, &a.clone()));
        assert!(!Component::ptr_eq(&a, &b));
    }

    #[test]
    fn test_leaf_lifecycle() {
        let handle = RefHandle::new();
        let mut instance = label().create(
            props! { "text" => "hi" },
            InstanceContext::with_ref(handle.clone()),
        );

        assert!(!handle.is_attached());
        instance.mount().unwrap();
        assert_eq!(handle.component_name().as_deref(), Some("Label"));
        assert_eq!(instance.render().unwrap(), Node::text("hi"));

        let outcome = instance.update(props! { "text" => "bye" }).unwrap();
        assert!(outcome.is_applied());
        assert_eq!(instance.render().unwrap(), Node::text("bye"));
        assert_eq!(handle.current_props(), Some(props! { "text" => "bye" }));

        instance.unmount();
        instance.unmount();
        assert!(!handle.is_attached());
    }

    #[test]
    fn test_anonymous_display_name() {
        struct Bare(Statics, PropsContract);
        impl ComponentDef for Bare {
            fn statics(&self) -> &Statics {
                &self.0
            }
            fn contract(&self) -> &PropsContract {
                &self.1
            }
            fn create(&self, _props: Props, _ctx: InstanceContext) -> Box<dyn Instance> {
                unreachable!("not instantiated in this test")
            }
        }

        let bare = Component::new(Bare(Statics::new(), PropsContract::new()));
        assert_eq!(bare.display_name(), ANONYMOUS);
    }

    #[test]
    fn test_outcome_nesting() {
        assert_eq!(UpdateOutcome::Applied.nested(), UpdateOutcome::Applied);
        assert_eq!(
            UpdateOutcome::Suppressed { depth: 0 }.nested(),
            UpdateOutcome::Suppressed { depth: 1 }
        );
    }
}
