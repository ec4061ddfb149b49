//! onlyUpdateForKeys - gate updates on a set of tracked props
//!
//! For each tracked key the previous and next values are compared with
//! identity equality ([`PropValue::same`](crate::props::PropValue::same)).
//! A key only counts as changed when it is present on both sides; a key that
//! appears or disappears is not compared. With no changed key the update
//! stops at this layer.

use crate::component::Component;
use crate::compose::Enhancer;
use crate::container::{wrap, Container, Layer};
use crate::error::ComposeError;
use crate::props::Props;
use std::sync::Arc;

/// Configuration of the onlyUpdateForKeys enhancer
#[derive(Debug, Clone)]
pub struct OnlyUpdateForKeys {
    keys: Arc<[String]>,
}

/// Forward updates only when one of `keys` changed
pub fn only_update_for_keys<I, K>(keys: I) -> OnlyUpdateForKeys
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    OnlyUpdateForKeys {
        keys: keys.into_iter().map(Into::into).collect(),
    }
}

impl OnlyUpdateForKeys {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

/// Whether any tracked key holds a different value in `next` than in `prev`
pub fn tracked_keys_changed(keys: &[String], prev: &Props, next: &Props) -> bool {
    keys.iter().any(|key| match (prev.get(key), next.get(key)) {
        (Some(before), Some(after)) => !before.same(after),
        _ => false,
    })
}

impl Enhancer for OnlyUpdateForKeys {
    fn name(&self) -> &str {
        "onlyUpdateForKeys"
    }

    fn enhance(&self, component: Component) -> Result<Component, ComposeError> {
        Ok(wrap(component, self.clone()))
    }
}

impl Container for OnlyUpdateForKeys {
    fn name(&self) -> &str {
        "onlyUpdateForKeys"
    }

    fn instantiate(&self) -> Box<dyn Layer> {
        Box::new(GateLayer {
            keys: self.keys.clone(),
        })
    }
}

struct GateLayer {
    keys: Arc<[String]>,
}

impl Layer for GateLayer {
    fn should_update(&self, prev: &Props, next: &Props) -> bool {
        tracked_keys_changed(&self.keys, prev, next)
    }
}
