//! Enhancer stacks built from configuration
//!
//! A stack is an ordered list of [`EnhancerSpec`] entries, usually read from
//! the `[[stack]]` array of the config file:
//!
//! ```toml
//! [[stack]]
//! kind = "only-update-for-keys"
//! keys = ["id"]
//!
//! [[stack]]
//! kind = "with-data"
//! selector = "user"
//! prop = "user"
//! ```
//!
//! Entries are listed outermost first, the same order [`compose`] takes.
//! Selector functions cannot live in a config file, so `with-data` entries
//! name one registered in [`Selectors`] by the application.

use crate::compose::{compose, EnhancerExt, SharedEnhancer};
use crate::enhancers::{
    omit_props, only_update_for_keys, set_display_name, set_static, with_props, Selector,
    WithData,
};
use crate::error::ComposeError;
use crate::props::{PropValue, Props};
use crate::source::{DataSource, SharedSource};
use crate::statics::is_reserved;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One configured enhancer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EnhancerSpec {
    WithProps {
        props: Props,
    },
    OmitProps {
        keys: Vec<String>,
    },
    OnlyUpdateForKeys {
        keys: Vec<String>,
    },
    SetDisplayName {
        name: String,
    },
    SetStatic {
        name: String,
        value: PropValue,
    },
    WithData {
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prop: Option<String>,
    },
}

impl EnhancerSpec {
    /// The `kind` tag as written in config
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WithProps { .. } => "with-props",
            Self::OmitProps { .. } => "omit-props",
            Self::OnlyUpdateForKeys { .. } => "only-update-for-keys",
            Self::SetDisplayName { .. } => "set-display-name",
            Self::SetStatic { .. } => "set-static",
            Self::WithData { .. } => "with-data",
        }
    }

    /// Build the enhancer this entry describes
    pub fn build(&self, selectors: &Selectors) -> Result<SharedEnhancer, ComposeError> {
        let reject = |reason: String| Err(ComposeError::type_constraint(self.kind(), reason));

        let enhancer = match self {
            Self::WithProps { props } => with_props(props.clone()).shared(),
            Self::OmitProps { keys } => {
                if keys.is_empty() {
                    return reject("no keys to omit".to_string());
                }
                omit_props(keys.iter().cloned()).shared()
            }
            Self::OnlyUpdateForKeys { keys } => only_update_for_keys(keys.iter().cloned()).shared(),
            Self::SetDisplayName { name } => {
                if name.trim().is_empty() {
                    return reject("display name is empty".to_string());
                }
                set_display_name(name.clone()).shared()
            }
            Self::SetStatic { name, value } => {
                if is_reserved(name) {
                    return reject(format!("'{}' is a reserved static", name));
                }
                set_static(name.clone(), value.clone()).shared()
            }
            Self::WithData { selector, prop } => {
                let Some(f) = selectors.get(selector) else {
                    return reject(format!("unknown selector '{}'", selector));
                };
                let enhancer = WithData::new(selectors.source().clone(), f.clone());
                match prop {
                    Some(prop) => enhancer.prop(prop.clone()).shared(),
                    None => enhancer.shared(),
                }
            }
        };
        Ok(enhancer)
    }
}

impl fmt::Display for EnhancerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WithProps { props } => {
                let keys: Vec<&str> = props.keys().collect();
                write!(f, "with-props [{}]", keys.join(", "))
            }
            Self::OmitProps { keys } => write!(f, "omit-props [{}]", keys.join(", ")),
            Self::OnlyUpdateForKeys { keys } => {
                write!(f, "only-update-for-keys [{}]", keys.join(", "))
            }
            Self::SetDisplayName { name } => write!(f, "set-display-name {}", name),
            Self::SetStatic { name, .. } => write!(f, "set-static {}", name),
            Self::WithData { selector, prop } => write!(
                f,
                "with-data {} -> {}",
                selector,
                prop.as_deref().unwrap_or(crate::enhancers::DEFAULT_DATA_PROP)
            ),
        }
    }
}

// ============================================================================
// Selector Registry
// ============================================================================

/// Named selectors and the data source they read from
#[derive(Clone)]
pub struct Selectors {
    source: SharedSource,
    entries: BTreeMap<String, Selector>,
}

impl Selectors {
    pub fn new(source: SharedSource) -> Self {
        Self {
            source,
            entries: BTreeMap::new(),
        }
    }

    /// Register a selector under `name`, replacing any previous one
    pub fn register<F>(mut self, name: impl Into<String>, selector: F) -> Self
    where
        F: Fn(&dyn DataSource, &Props) -> PropValue + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(selector));
        self
    }

    /// Register a selector reading the source key held in prop `key_prop`
    pub fn lookup(self, name: impl Into<String>, key_prop: impl Into<String>) -> Self {
        let key_prop = key_prop.into();
        self.register(name, move |source, props| {
            let key = match props.get(&key_prop) {
                Some(PropValue::Str(s)) => s.to_string(),
                Some(PropValue::Int(i)) => i.to_string(),
                _ => return PropValue::Null,
            };
            source.get(&key).unwrap_or(PropValue::Null)
        })
    }

    pub fn get(&self, name: &str) -> Option<&Selector> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn source(&self) -> &SharedSource {
        &self.source
    }
}

impl fmt::Debug for Selectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selectors")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Build every entry and compose them, outermost first
pub fn build_stack(
    specs: &[EnhancerSpec],
    selectors: &Selectors,
) -> Result<SharedEnhancer, ComposeError> {
    let enhancers = specs
        .iter()
        .map(|spec| spec.build(selectors))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(entries = enhancers.len(), "Built enhancer stack");
    Ok(compose(enhancers))
}
