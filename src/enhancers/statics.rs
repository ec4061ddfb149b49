//! setDisplayName / setStatic - enhancers that only touch component metadata
//!
//! Both still produce a new component with a pass-through layer, so the
//! enhanced component never aliases its input.

use crate::component::Component;
use crate::compose::Enhancer;
use crate::container::{wrap, Container, Layer, Passthrough};
use crate::error::ComposeError;
use crate::statics::{StaticValue, Statics};

/// Replace the display name of the enhanced component
#[derive(Debug, Clone)]
pub struct SetDisplayName {
    name: String,
}

pub fn set_display_name(name: impl Into<String>) -> SetDisplayName {
    SetDisplayName { name: name.into() }
}

impl Enhancer for SetDisplayName {
    fn name(&self) -> &str {
        "setDisplayName"
    }

    fn enhance(&self, component: Component) -> Result<Component, ComposeError> {
        Ok(wrap(component, self.clone()))
    }
}

impl Container for SetDisplayName {
    fn name(&self) -> &str {
        "setDisplayName"
    }

    fn decorate_statics(&self, statics: &mut Statics) {
        statics.set_display_name(self.name.clone());
    }

    fn instantiate(&self) -> Box<dyn Layer> {
        Box::new(Passthrough)
    }
}

/// Add or override one static attribute
#[derive(Debug, Clone)]
pub struct SetStatic {
    name: String,
    value: StaticValue,
}

pub fn set_static(name: impl Into<String>, value: impl Into<StaticValue>) -> SetStatic {
    SetStatic {
        name: name.into(),
        value: value.into(),
    }
}

impl Enhancer for SetStatic {
    fn name(&self) -> &str {
        "setStatic"
    }

    fn enhance(&self, component: Component) -> Result<Component, ComposeError> {
        Ok(wrap(component, self.clone()))
    }
}

impl Container for SetStatic {
    fn name(&self) -> &str {
        "setStatic"
    }

    fn decorate_statics(&self, statics: &mut Statics) {
        statics.insert(self.name.clone(), self.value.clone());
    }

    fn instantiate(&self) -> Box<dyn Layer> {
        Box::new(Passthrough)
    }
}
