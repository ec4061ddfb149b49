//! withProps / omitProps - the two halves of the pass-through convention

use crate::component::Component;
use crate::compose::Enhancer;
use crate::container::{wrap, Container, Layer, Passthrough};
use crate::error::ComposeError;
use crate::props::Props;

// ============================================================================
// withProps
// ============================================================================

/// Inject a fixed set of props
#[derive(Debug, Clone)]
pub struct WithProps {
    props: Props,
}

/// Inject `props`; they win over caller-supplied values with the same key
pub fn with_props(props: Props) -> WithProps {
    WithProps { props }
}

impl Enhancer for WithProps {
    fn name(&self) -> &str {
        "withProps"
    }

    fn enhance(&self, component: Component) -> Result<Component, ComposeError> {
        Ok(wrap(component, self.clone()))
    }
}

impl Container for WithProps {
    fn name(&self) -> &str {
        "withProps"
    }

    fn injected_keys(&self) -> Vec<String> {
        self.props.keys().map(str::to_string).collect()
    }

    fn instantiate(&self) -> Box<dyn Layer> {
        Box::new(FixedProps(self.props.clone()))
    }
}

struct FixedProps(Props);

impl Layer for FixedProps {
    fn inject(&self, _received: &Props) -> Props {
        self.0.clone()
    }
}

// ============================================================================
// omitProps
// ============================================================================

/// Consume keys so they never reach the wrapped component
#[derive(Debug, Clone)]
pub struct OmitProps {
    keys: Vec<String>,
}

pub fn omit_props<I, K>(keys: I) -> OmitProps
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    OmitProps {
        keys: keys.into_iter().map(Into::into).collect(),
    }
}

impl Enhancer for OmitProps {
    fn name(&self) -> &str {
        "omitProps"
    }

    fn enhance(&self, component: Component) -> Result<Component, ComposeError> {
        Ok(wrap(component, self.clone()))
    }
}

impl Container for OmitProps {
    fn name(&self) -> &str {
        "omitProps"
    }

    fn consumed_keys(&self) -> &[String] {
        &self.keys
    }

    fn instantiate(&self) -> Box<dyn Layer> {
        Box::new(Passthrough)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{InstanceContext, Node};
    use crate::compose::{compose, EnhancerExt};
    use crate::props;
    use crate::host::Root;
    use crate::props::{PropKind, PropValue, PropsContract};

    fn echo() -> Component {
        Component::builder("Echo").render(|props| Ok(Node::element("echo", props.clone(), vec![])))
    }

    fn received(component: &Component, props: Props) -> Props {
        let mut instance = component.create(props, InstanceContext::default());
        instance.mount().unwrap();
        let node = instance.render().unwrap();
        instance.unmount();
        match node {
            Node::Element { props, .. } => props,
            other => panic!("Expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_injected_props_win_on_collision() {
        let composite = with_props(props! { "role" => "admin" })
            .enhance(echo())
            .unwrap();

        let seen = received(&composite, props! { "role" => "guest", "id" => 4 });
        assert_eq!(seen.get("role"), Some(&PropValue::from("admin")));
        assert_eq!(seen.get("id"), Some(&PropValue::from(4)));
    }

    #[test]
    fn test_pass_through_values_are_unmodified() {
        let shared = PropValue::opaque(vec![1u8, 2, 3]);
        let composite = compose([
            with_props(props! { "x" => 1 }).shared(),
            omit_props(["secret"]).shared(),
        ])
        .enhance(echo())
        .unwrap();

        let input = props! { "blob" => shared.clone(), "secret" => "s", "n" => 7 };
        let seen = received(&composite, input.clone());

        for (key, value) in input.iter().filter(|(k, _)| *k != "secret") {
            assert!(seen.get(key).unwrap().same(value), "key {} changed", key);
        }
        assert!(seen.get("blob").unwrap().same(&shared));
        assert!(!seen.contains_key("secret"));
        assert_eq!(seen.get("x"), Some(&PropValue::from(1)));
    }

    #[test]
    fn test_omit_props_contract() {
        let composite = omit_props(["secret"]).enhance(echo()).unwrap();
        assert!(composite.contract().get("secret").is_some());
        assert_eq!(composite.display_name(), "omitProps(Echo)");
    }

    #[test]
    fn test_omitted_key_not_required_from_caller() {
        let guarded = Component::builder("Guarded")
            .contract(
                PropsContract::new()
                    .required("id", PropKind::Int)
                    .required("secret", PropKind::Str),
            )
            .render(|props| Ok(Node::element("guarded", props.clone(), vec![])));
        let composite = omit_props(["secret"]).enhance(guarded).unwrap();

        assert_eq!(composite.contract().get("secret").map(|s| s.required), Some(false));
        let root = Root::mount(composite, props! { "id" => 1 }).unwrap();
        match root.render().unwrap() {
            Node::Element { props, .. } => assert!(!props.contains_key("secret")),
            other => panic!("Expected element, got {:?}", other),
        }
    }
}
