//! Built-in enhancers
//!
//! Each enhancer is a small configuration struct implementing
//! [`Enhancer`](crate::compose::Enhancer) by calling
//! [`wrap`](crate::container::wrap) with its own container. Constructor
//! functions mirror the usual naming (`with_data`, `only_update_for_keys`, ...).
//!
//! | enhancer | layer behaviour |
//! |----------|-----------------|
//! | [`with_data`] | injects selected data, subscribes for changes |
//! | [`only_update_for_keys`] | forwards updates only when tracked keys change |
//! | [`with_props`] | injects fixed props |
//! | [`omit_props`] | consumes keys so they never reach the wrapped component |
//! | [`set_display_name`] | renames the new component |
//! | [`set_static`] | adds or overrides one static |

mod only_update;
mod props;
mod statics;
mod with_data;

pub use only_update::{only_update_for_keys, OnlyUpdateForKeys};
pub use props::{omit_props, with_props, OmitProps, WithProps};
pub use statics::{set_display_name, set_static, SetDisplayName, SetStatic};
pub use with_data::{with_data, Selector, WithData, DEFAULT_DATA_PROP};
