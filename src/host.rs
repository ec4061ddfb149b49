//! Root driver - mounts one component tree and drives its lifecycle
//!
//! [`Root`] is a small synchronous scheduler: it validates props against the
//! root component's contract, then calls the instance hooks in order. It is
//! not a reconciler; each call maps to exactly one hook invocation on the
//! outermost instance.

use crate::component::{Component, Instance, InstanceContext, Node, UpdateOutcome};
use crate::props::Props;

/// A mounted component tree
pub struct Root {
    component: Component,
    instance: Option<Box<dyn Instance>>,
}

impl Root {
    /// Create and mount `component` with `props`
    pub fn mount(component: Component, props: Props) -> anyhow::Result<Self> {
        Self::mount_with(component, props, InstanceContext::default())
    }

    /// Mount with an explicit context, e.g. carrying a reference handle
    ///
    /// When the mount hook fails the instance is unmounted before the error
    /// is returned, so resources acquired by outer layers are released.
    pub fn mount_with(
        component: Component,
        props: Props,
        ctx: InstanceContext,
    ) -> anyhow::Result<Self> {
        component.contract().check(component.display_name(), &props)?;

        let mut instance = component.create(props, ctx);
        if let Err(e) = instance.mount() {
            tracing::debug!(component = component.display_name(), error = %e, "Mount failed");
            instance.unmount();
            return Err(e);
        }

        tracing::debug!(component = component.display_name(), "Mounted root");
        Ok(Self {
            component,
            instance: Some(instance),
        })
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn is_mounted(&self) -> bool {
        self.instance.is_some()
    }

    /// Deliver new props to the tree
    pub fn update(&mut self, props: Props) -> anyhow::Result<UpdateOutcome> {
        self.component
            .contract()
            .check(self.component.display_name(), &props)?;
        let instance = self.mounted_mut()?;
        instance.update(props)
    }

    pub fn render(&self) -> anyhow::Result<Node> {
        match &self.instance {
            Some(instance) => instance.render(),
            None => anyhow::bail!("{} is not mounted", self.component.display_name()),
        }
    }

    /// Unmount the tree; later calls do nothing
    pub fn unmount(&mut self) {
        if let Some(mut instance) = self.instance.take() {
            instance.unmount();
            tracing::debug!(component = self.component.display_name(), "Unmounted root");
        }
    }

    fn mounted_mut(&mut self) -> anyhow::Result<&mut Box<dyn Instance>> {
        match self.instance.as_mut() {
            Some(instance) => Ok(instance),
            None => anyhow::bail!("{} is not mounted", self.component.display_name()),
        }
    }
}

impl Drop for Root {
    fn drop(&mut self) {
        self.unmount();
    }
}
