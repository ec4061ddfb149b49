//! Container components - the wrapping half of every enhancer
//!
//! [`wrap`] turns a wrapped component plus a [`Container`] description into a
//! new component. All built-in enhancers go through it, so the wrapping
//! contract is enforced in one place:
//!
//! - the result is a new component; the wrapped one is only read
//! - wrapped props = received props minus consumed keys, overlaid with the
//!   layer's injected props (injected wins on collision)
//! - the layer owns its state and subscriptions; the wrapped component never
//!   sees them
//! - the [`InstanceContext`] (and its reference handle) is passed down as is
//! - statics are hoisted from the wrapped component
//! - errors from the wrapped instance are returned untouched
//!
//! # Architecture
//!
//! ```text
//! Wrapped ──create──▶ WrappedInstance ── Arc<LayerShared> ──▶ LayerCore
//!                                              ▲                 ├─ layer: Box<dyn Layer>
//!                          Refresh (Weak) ─────┘                 └─ inner: Box<dyn Instance>
//! ```
//!
//! A [`Refresh`] lets a layer re-run its update path when something outside
//! the scheduler (a data source) tells it to.

use crate::component::{
    Component, ComponentDef, Instance, InstanceContext, Node, UpdateOutcome,
};
use crate::props::{Props, PropsContract};
use crate::statics::{hoist_statics, Statics};
use crate::util::{lock, wrap_display_name};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, TryLockError, Weak};

// ============================================================================
// Container & Layer Traits
// ============================================================================

/// Description of a container, fixed at composition time
pub trait Container: Send + Sync + 'static {
    /// Short name used to build the display name, e.g. `withData`
    fn name(&self) -> &str;

    /// Keys this container uses for its own concern and never forwards
    fn consumed_keys(&self) -> &[String] {
        &[]
    }

    /// Keys this container supplies to the wrapped component
    fn injected_keys(&self) -> Vec<String> {
        Vec::new()
    }

    /// Last word on the new component's statics, after hoisting
    fn decorate_statics(&self, _statics: &mut Statics) {}

    /// Fresh per-instance state
    fn instantiate(&self) -> Box<dyn Layer>;
}

/// Per-instance state of a container
///
/// Every hook has a no-op default. `unmount` may run more than once and may
/// run after a failed `mount`.
pub trait Layer: Send {
    /// Acquire resources; `refresh` re-runs this layer's update path later
    fn mount(&mut self, _refresh: Refresh) -> anyhow::Result<()> {
        Ok(())
    }

    /// Props this layer adds for the wrapped component
    fn inject(&self, _received: &Props) -> Props {
        Props::new()
    }

    /// Whether an update from `prev` to `next` reaches the wrapped component
    fn should_update(&self, _prev: &Props, _next: &Props) -> bool {
        true
    }

    /// Release resources acquired in `mount`
    fn unmount(&mut self) {}
}

/// Layer with no state and no injected props
pub struct Passthrough;

impl Layer for Passthrough {}

// ============================================================================
// Wrapping
// ============================================================================

/// Build a container component around `inner`
pub fn wrap(inner: Component, container: impl Container) -> Component {
    let mut statics = Statics::named(wrap_display_name(container.name(), inner.display_name()));
    let report = hoist_statics(&mut statics, inner.statics());
    container.decorate_statics(&mut statics);

    let injected = container.injected_keys();
    let contract = inner
        .contract()
        .for_container(&injected, container.consumed_keys());

    tracing::debug!(
        container = container.name(),
        inner = inner.display_name(),
        hoisted = report.copied.len(),
        "Wrapped component"
    );

    Component::new(Wrapped {
        inner,
        container: Arc::new(container),
        statics,
        contract,
    })
}

struct Wrapped {
    inner: Component,
    container: Arc<dyn Container>,
    statics: Statics,
    contract: PropsContract,
}

impl ComponentDef for Wrapped {
    fn statics(&self) -> &Statics {
        &self.statics
    }

    fn contract(&self) -> &PropsContract {
        &self.contract
    }

    fn create(&self, props: Props, ctx: InstanceContext) -> Box<dyn Instance> {
        let layer = self.container.instantiate();
        let consumed = self.container.consumed_keys().to_vec();
        let inner_props = derive_props(layer.as_ref(), &props, &consumed);
        let inner = self.inner.create(inner_props, ctx);

        Box::new(WrappedInstance {
            shared: Arc::new(LayerShared {
                core: Mutex::new(LayerCore {
                    name: self.statics.display_name().unwrap_or_default().to_string(),
                    layer,
                    inner,
                    received: props,
                    consumed,
                    active: false,
                    deferred: None,
                }),
                pending: AtomicBool::new(false),
            }),
        })
    }
}

/// Pass-through of `received` minus consumed keys, overlaid with injected props
fn derive_props(layer: &dyn Layer, received: &Props, consumed: &[String]) -> Props {
    received.without(consumed).merged_with(&layer.inject(received))
}

// ============================================================================
// Instances
// ============================================================================

struct LayerShared {
    core: Mutex<LayerCore>,
    /// Refresh requested while a hook held the core
    pending: AtomicBool,
}

struct LayerCore {
    name: String,
    layer: Box<dyn Layer>,
    inner: Box<dyn Instance>,
    received: Props,
    consumed: Vec<String>,
    active: bool,
    /// Error from a refresh nobody was waiting on; surfaced by the next render
    deferred: Option<anyhow::Error>,
}

impl LayerCore {
    fn refresh(&mut self) {
        if !self.active {
            return;
        }
        let next = derive_props(self.layer.as_ref(), &self.received, &self.consumed);
        match self.inner.update(next) {
            Ok(outcome) => {
                tracing::trace!(layer = %self.name, ?outcome, "Layer refreshed");
            }
            Err(e) => {
                tracing::debug!(layer = %self.name, error = %e, "Refresh failed, deferring error");
                self.deferred = Some(e);
            }
        }
    }
}

/// Handle a layer uses to re-run its own update path
///
/// Holds only a weak reference: once the instance is gone, or after unmount,
/// requests do nothing.
#[derive(Clone)]
pub struct Refresh {
    shared: Weak<LayerShared>,
}

impl Refresh {
    pub fn request(&self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        match shared.core.try_lock() {
            Ok(mut core) => core.refresh(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().refresh(),
            // A hook of this instance is running; it drains the request when done
            Err(TryLockError::WouldBlock) => shared.pending.store(true, Ordering::SeqCst),
        };
    }
}

struct WrappedInstance {
    shared: Arc<LayerShared>,
}

impl WrappedInstance {
    fn drain_pending(&self) {
        while self.shared.pending.swap(false, Ordering::SeqCst) {
            lock(&self.shared.core).refresh();
        }
    }
}

impl Instance for WrappedInstance {
    fn mount(&mut self) -> anyhow::Result<()> {
        let refresh = Refresh {
            shared: Arc::downgrade(&self.shared),
        };
        let result = {
            let mut core = lock(&self.shared.core);
            tracing::debug!(layer = %core.name, "Mounting layer");
            core.active = true;
            core.layer
                .mount(refresh)
                .and_then(|()| core.inner.mount())
        };
        self.drain_pending();
        result
    }

    fn update(&mut self, props: Props) -> anyhow::Result<UpdateOutcome> {
        let result = {
            let mut core = lock(&self.shared.core);
            let prev = std::mem::replace(&mut core.received, props);
            if core.layer.should_update(&prev, &core.received) {
                let next = derive_props(core.layer.as_ref(), &core.received, &core.consumed);
                core.inner.update(next).map(UpdateOutcome::nested)
            } else {
                tracing::trace!(layer = %core.name, "Update suppressed");
                Ok(UpdateOutcome::Suppressed { depth: 0 })
            }
        };
        self.drain_pending();
        result
    }

    fn render(&self) -> anyhow::Result<Node> {
        let mut core = lock(&self.shared.core);
        if let Some(error) = core.deferred.take() {
            return Err(error);
        }
        core.inner.render()
    }

    fn unmount(&mut self) {
        let mut core = lock(&self.shared.core);
        if core.active {
            tracing::debug!(layer = %core.name, "Unmounting layer");
        }
        core.active = false;
        core.layer.unmount();
        core.inner.unmount();
        self.shared.pending.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::RefHandle;
    use crate::props::{PropKind, PropValue};
    use crate::props;
    use crate::statics::StaticValue;

    /// Container injecting a fixed `tag` and consuming `secret`
    struct Tagging;

    struct TaggingLayer;

    impl Layer for TaggingLayer {
        fn inject(&self, _received: &Props) -> Props {
            props! { "tag" => "injected" }
        }
    }

    impl Container for Tagging {
        fn name(&self) -> &str {
            "tagging"
        }

        fn consumed_keys(&self) -> &[String] {
            static CONSUMED: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
            CONSUMED.get_or_init(|| vec!["secret".to_string()])
        }

        fn injected_keys(&self) -> Vec<String> {
            vec!["tag".to_string()]
        }

        fn instantiate(&self) -> Box<dyn Layer> {
            Box::new(TaggingLayer)
        }
    }

    fn echo() -> Component {
        Component::builder("Echo")
            .contract(
                PropsContract::new()
                    .required("tag", PropKind::Str)
                    .optional("id", PropKind::Int),
            )
            .with_static("route", "/echo")
            .render(|props| Ok(Node::element("echo", props.clone(), Vec::new())))
    }

    fn rendered_props(node: Node) -> Props {
        match node {
            Node::Element { props, .. } => props,
            other => panic!("Expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_wrap_builds_new_component_with_hoisted_statics() {
        let base = echo();
        let before = base.statics().clone();
        let wrapped = wrap(base.clone(), Tagging);

        assert!(!Component::ptr_eq(&base, &wrapped));
        assert_eq!(wrapped.display_name(), "tagging(Echo)");
        assert_eq!(
            wrapped.statics().get("route"),
            Some(&StaticValue::from("/echo"))
        );
        assert_eq!(base.statics(), &before);
        assert_eq!(base.display_name(), "Echo");
    }

    #[test]
    fn test_contract_drops_injected_and_adds_consumed() {
        let wrapped = wrap(echo(), Tagging);
        assert!(wrapped.contract().get("tag").is_none());
        assert!(wrapped.contract().get("secret").is_some());
        assert!(wrapped.contract().get("id").is_some());
    }

    #[test]
    fn test_props_are_filtered_and_injected() {
        let wrapped = wrap(echo(), Tagging);
        let mut instance = wrapped.create(
            props! { "id" => 3, "secret" => "x", "tag" => "caller" },
            InstanceContext::default(),
        );
        instance.mount().unwrap();

        let seen = rendered_props(instance.render().unwrap());
        assert_eq!(seen.get("id"), Some(&PropValue::from(3)));
        assert!(!seen.contains_key("secret"));
        // Injected value wins over the caller's
        assert_eq!(seen.get("tag"), Some(&PropValue::from("injected")));
    }

    #[test]
    fn test_ref_handle_reaches_leaf_through_layers() {
        let composite = wrap(wrap(wrap(echo(), Tagging), Tagging), Tagging);
        let handle = RefHandle::new();
        let mut instance =
            composite.create(props! { "id" => 1 }, InstanceContext::with_ref(handle.clone()));

        instance.mount().unwrap();
        assert_eq!(handle.component_name().as_deref(), Some("Echo"));

        instance.unmount();
        assert!(!handle.is_attached());
    }

    #[test]
    fn test_errors_pass_through_unchanged() {
        #[derive(Debug, thiserror::Error)]
        #[error("leaf exploded")]
        struct LeafError;

        let failing = Component::builder("Failing").render(|_| Err(LeafError.into()));
        let composite = wrap(wrap(failing, Tagging), Tagging);
        let mut instance = composite.create(Props::new(), InstanceContext::default());
        instance.mount().unwrap();

        let err = instance.render().unwrap_err();
        assert!(err.downcast_ref::<LeafError>().is_some());
        assert_eq!(err.to_string(), "leaf exploded");
    }

    #[test]
    fn test_update_outcome_applied_through_passthrough_layers() {
        let composite = wrap(wrap(echo(), Tagging), Tagging);
        let mut instance = composite.create(props! { "id" => 1 }, InstanceContext::default());
        instance.mount().unwrap();

        let outcome = instance.update(props! { "id" => 2 }).unwrap();
        assert_eq!(outcome, UpdateOutcome::Applied);
        let seen = rendered_props(instance.render().unwrap());
        assert_eq!(seen.get("id"), Some(&PropValue::from(2)));
    }
}
