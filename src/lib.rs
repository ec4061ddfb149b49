//! Higher-order component enhancers
//!
//! An enhancer takes a component and returns a new component with added
//! behaviour: injected data, update gating, fixed or filtered props, extra
//! static metadata. Enhancers compose right-to-left into a single enhancer.
//!
//! ```ignore
//! use enhancer::prelude::*;
//!
//! let enhance = compose([
//!     only_update_for_keys(["id"]).shared(),
//!     with_data(source.clone(), |src, props| lookup(src, props)).prop("user").shared(),
//! ]);
//! let card = enhance.enhance(user_card)?;
//! let mut root = Root::mount(card, props! { "id" => 1 })?;
//! ```
//!
//! # Modules
//!
//! - [`component`]: component descriptors, instances and reference handles
//! - [`compose`]: the [`Enhancer`](compose::Enhancer) trait and composition
//! - [`container`]: the wrapping machinery every built-in enhancer uses
//! - [`enhancers`]: built-in enhancers
//! - [`source`]: external data sources and subscription guards
//! - [`stack`]: enhancer stacks built from configuration
//! - [`host`]: a synchronous root driver

pub mod component;
pub mod compose;
pub mod config;
pub mod container;
pub mod enhancers;
pub mod error;
pub mod host;
pub mod logging;
pub mod props;
pub mod source;
pub mod stack;
pub mod statics;
pub mod util;

/// Commonly used types and functions
pub mod prelude {
    pub use crate::component::{
        Component, InstanceContext, Node, RefHandle, UpdateOutcome,
    };
    pub use crate::compose::{compose, Enhancer, EnhancerExt, SharedEnhancer};
    pub use crate::enhancers::{
        omit_props, only_update_for_keys, set_display_name, set_static, with_data, with_props,
    };
    pub use crate::error::{ComposeError, ContractError};
    pub use crate::host::Root;
    pub use crate::props;
    pub use crate::props::{PropKind, PropValue, Props, PropsContract};
    pub use crate::source::{DataSource, MemorySource};
}
