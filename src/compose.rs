//! Enhancers and their composition
//!
//! An [`Enhancer`] maps one component to a new one. [`compose`] folds an
//! ordered sequence of enhancers into a single enhancer that applies them
//! right-to-left, so the first enhancer listed ends up as the outermost layer:
//!
//! ```text
//! compose([e1, e2, e3]).enhance(C) == e1(e2(e3(C)))
//! ```
//!
//! # Guarantees
//!
//! - Empty sequence: the [`Identity`] enhancer
//! - One element: that enhancer, no extra layer
//! - Nested compositions are flattened, so grouping never changes the result
//! - Every step inside a composition is checked: an enhancer that hands back
//!   the component it was given fails with `MutationViolation`
//!
//! Unary-ness is enforced by the type system for enhancers built in code.
//! Enhancers built from configuration go through
//! [`build_stack`](crate::stack::build_stack), which reports
//! `TypeConstraint` errors instead.

use crate::component::Component;
use crate::error::ComposeError;
use std::sync::Arc;

/// Shared enhancer handle
pub type SharedEnhancer = Arc<dyn Enhancer>;

/// A unary component transformation
///
/// Configuration is captured when the enhancer value is built; `enhance`
/// then only sees the component. Implementations must return a new component
/// and must not write through the one they receive.
pub trait Enhancer: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    fn enhance(&self, component: Component) -> Result<Component, ComposeError>;

    /// The flattened sequence of a composed enhancer
    fn chain(&self) -> Option<&[SharedEnhancer]> {
        None
    }

    /// Only the identity enhancer may return its input
    fn is_identity(&self) -> bool {
        false
    }
}

impl Enhancer for SharedEnhancer {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn enhance(&self, component: Component) -> Result<Component, ComposeError> {
        self.as_ref().enhance(component)
    }

    fn chain(&self) -> Option<&[SharedEnhancer]> {
        self.as_ref().chain()
    }

    fn is_identity(&self) -> bool {
        self.as_ref().is_identity()
    }
}

/// Apply `enhancer`, rejecting a result identical to the input
pub fn apply_checked(
    enhancer: &dyn Enhancer,
    component: Component,
) -> Result<Component, ComposeError> {
    let input = component.clone();
    let output = enhancer.enhance(component)?;
    if !enhancer.is_identity() && Component::ptr_eq(&input, &output) {
        return Err(ComposeError::mutation(enhancer.name()));
    }
    Ok(output)
}

/// Convenience methods for concrete enhancers
pub trait EnhancerExt: Enhancer + Sized + 'static {
    fn shared(self) -> SharedEnhancer {
        Arc::new(self)
    }

    /// Apply with the same check compositions perform
    fn apply_to(&self, component: Component) -> Result<Component, ComposeError> {
        apply_checked(self, component)
    }
}

impl<E: Enhancer + 'static> EnhancerExt for E {}

// ============================================================================
// Built-in Combinators
// ============================================================================

/// Enhancer that returns its input
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Enhancer for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn enhance(&self, component: Component) -> Result<Component, ComposeError> {
        Ok(component)
    }

    fn is_identity(&self) -> bool {
        true
    }
}

/// Enhancer backed by a closure
pub struct FnEnhancer<F> {
    name: String,
    f: F,
}

/// Build an enhancer from a closure
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnEnhancer<F>
where
    F: Fn(Component) -> Result<Component, ComposeError> + Send + Sync,
{
    FnEnhancer {
        name: name.into(),
        f,
    }
}

impl<F> Enhancer for FnEnhancer<F>
where
    F: Fn(Component) -> Result<Component, ComposeError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn enhance(&self, component: Component) -> Result<Component, ComposeError> {
        (self.f)(component)
    }
}

/// A flattened sequence of two or more enhancers
pub struct Composed {
    name: String,
    chain: Vec<SharedEnhancer>,
}

impl Enhancer for Composed {
    fn name(&self) -> &str {
        &self.name
    }

    fn enhance(&self, component: Component) -> Result<Component, ComposeError> {
        self.chain
            .iter()
            .rev()
            .try_fold(component, |current, enhancer| {
                apply_checked(enhancer.as_ref(), current)
            })
    }

    fn chain(&self) -> Option<&[SharedEnhancer]> {
        Some(&self.chain)
    }
}

/// Fold enhancers into one, applied right-to-left
pub fn compose<I>(enhancers: I) -> SharedEnhancer
where
    I: IntoIterator<Item = SharedEnhancer>,
{
    let mut input: Vec<SharedEnhancer> = enhancers.into_iter().collect();
    if input.len() == 1 {
        return input.remove(0);
    }

    let mut chain = Vec::with_capacity(input.len());
    for enhancer in input {
        if enhancer.is_identity() {
            continue;
        }
        match enhancer.chain() {
            Some(nested) => chain.extend(nested.iter().cloned()),
            None => chain.push(enhancer),
        }
    }

    match chain.len() {
        0 => Arc::new(Identity),
        1 => chain.remove(0),
        _ => {
            let names: Vec<&str> = chain.iter().map(|e| e.name()).collect();
            let name = format!("compose({})", names.join(", "));
            tracing::debug!(enhancers = chain.len(), name = %name, "Composed enhancers");
            Arc::new(Composed { name, chain })
        }
    }
}

/// Compose concrete enhancers without wrapping each in an `Arc` by hand
///
/// ```ignore
/// let enhance = compose![with_data(source, selector), only_update_for_keys(["id"])];
/// ```
#[macro_export]
macro_rules! compose {
    () => {
        $crate::compose::compose(::std::vec::Vec::<$crate::compose::SharedEnhancer>::new())
    };
    ($($enhancer:expr),+ $(,)?) => {
        $crate::compose::compose([$($crate::compose::EnhancerExt::shared($enhancer)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{InstanceContext, Node};
    use crate::container::{wrap, Container, Layer};
    use crate::props::Props;

    /// Appends its label to the `trail` prop, making layer order visible
    struct Trail(String);

    struct TrailLayer(String);

    impl Layer for TrailLayer {
        fn inject(&self, received: &Props) -> Props {
            let before = received
                .get("trail")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            Props::new().with("trail", format!("{}{}", before, self.0))
        }
    }

    impl Container for Trail {
        fn name(&self) -> &str {
            &self.0
        }

        fn instantiate(&self) -> Box<dyn Layer> {
            Box::new(TrailLayer(self.0.clone()))
        }
    }

    fn trail(label: &str) -> SharedEnhancer {
        let label = label.to_string();
        from_fn(label.clone(), move |c| Ok(wrap(c, Trail(label.clone())))).shared()
    }

    fn base() -> Component {
        Component::builder("Base").render(|props| {
            Ok(Node::text(
                props.get("trail").and_then(|v| v.as_str()).unwrap_or(""),
            ))
        })
    }

    fn render(component: &Component) -> Node {
        let mut instance = component.create(Props::new(), InstanceContext::default());
        instance.mount().unwrap();
        let node = instance.render().unwrap();
        instance.unmount();
        node
    }

    #[test]
    fn test_compose_applies_right_to_left() {
        let enhance = compose([trail("a"), trail("b"), trail("c")]);
        let composite = enhance.enhance(base()).unwrap();

        assert_eq!(composite.display_name(), "a(b(c(Base)))");
        // Outermost layer injects first
        assert_eq!(render(&composite), Node::text("abc"));
    }

    #[test]
    fn test_compose_matches_manual_nesting_for_all_lengths() {
        let labels = ["a", "b", "c", "d", "e"];
        for n in 0..=labels.len() {
            let enhancers: Vec<SharedEnhancer> = labels[..n].iter().map(|l| trail(l)).collect();

            let composed = compose(enhancers.clone()).enhance(base()).unwrap();
            let manual = enhancers
                .iter()
                .rev()
                .try_fold(base(), |c, e| e.enhance(c))
                .unwrap();

            assert_eq!(composed.display_name(), manual.display_name(), "n = {}", n);
            assert_eq!(render(&composed), render(&manual), "n = {}", n);
        }
    }

    #[test]
    fn test_empty_compose_is_identity() {
        let enhance = compose(Vec::new());
        assert!(enhance.is_identity());

        let c = base();
        let out = enhance.enhance(c.clone()).unwrap();
        assert!(Component::ptr_eq(&c, &out));
    }

    #[test]
    fn test_single_compose_returns_same_enhancer() {
        let e = trail("only");
        let composed = compose([e.clone()]);
        assert!(Arc::ptr_eq(&e, &composed));
    }

    #[test]
    fn test_compose_is_associative() {
        let (a, b, c) = (trail("a"), trail("b"), trail("c"));
        let left = compose([compose([a.clone(), b.clone()]), c.clone()]);
        let right = compose([a.clone(), compose([b.clone(), c.clone()])]);
        let flat = compose([a, b, c]);

        let outputs: Vec<Component> = [left, right, flat]
            .iter()
            .map(|e| e.enhance(base()).unwrap())
            .collect();

        for out in &outputs {
            assert_eq!(out.display_name(), "a(b(c(Base)))");
            assert_eq!(render(out), Node::text("abc"));
        }
    }

    #[test]
    fn test_identities_vanish_from_chains() {
        let composed = compose([Identity.shared(), trail("a"), compose(Vec::new())]);
        assert!(composed.chain().is_none());
        assert_eq!(composed.enhance(base()).unwrap().display_name(), "a(Base)");
    }

    #[test]
    fn test_mutation_violation_detected() {
        let lazy = from_fn("lazy", Ok);
        let err = lazy.apply_to(base()).unwrap_err();
        assert_eq!(err, ComposeError::mutation("lazy"));

        let chain = compose([trail("a"), from_fn("lazy", Ok).shared()]);
        assert!(matches!(
            chain.enhance(base()),
            Err(ComposeError::MutationViolation { .. })
        ));
    }

    #[test]
    fn test_enhancing_leaves_input_untouched() {
        let c = base();
        let before = c.statics().clone();
        let out = compose([trail("a"), trail("b")]).enhance(c.clone()).unwrap();

        assert!(!Component::ptr_eq(&c, &out));
        assert_eq!(c.statics(), &before);
        assert_eq!(c.display_name(), "Base");
    }

    #[test]
    fn test_compose_macro() {
        let enhance = crate::compose![Identity, from_fn("x", |c| Ok(wrap(c, Trail("x".into()))))];
        assert_eq!(enhance.enhance(base()).unwrap().display_name(), "x(Base)");
        assert!(crate::compose![].is_identity());
    }
}
