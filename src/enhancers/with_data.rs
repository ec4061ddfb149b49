//! withData - inject data selected from an external source
//!
//! The layer computes `selector(source, props)` whenever the wrapped
//! component's props are derived, and injects the result under a prop name
//! (`data` unless configured). On mount it subscribes to the source; a change
//! notification re-runs the layer's update path, so the wrapped component
//! sees fresh data without a remount. Unmount releases exactly the handle the
//! mount acquired.

use crate::component::Component;
use crate::compose::Enhancer;
use crate::container::{wrap, Container, Layer, Refresh};
use crate::error::ComposeError;
use crate::props::{PropValue, Props};
use crate::source::{DataSource, SharedSource, Subscription};
use std::sync::Arc;

/// Prop name used when none is configured
pub const DEFAULT_DATA_PROP: &str = "data";

/// Selection function: reads from the source, given the received props
pub type Selector = Arc<dyn Fn(&dyn DataSource, &Props) -> PropValue + Send + Sync>;

/// Configuration of the withData enhancer
#[derive(Clone)]
pub struct WithData {
    source: SharedSource,
    selector: Selector,
    prop: String,
}

/// Inject `selector(source, props)` as the `data` prop
pub fn with_data<F>(source: SharedSource, selector: F) -> WithData
where
    F: Fn(&dyn DataSource, &Props) -> PropValue + Send + Sync + 'static,
{
    WithData::new(source, Arc::new(selector))
}

impl WithData {
    pub fn new(source: SharedSource, selector: Selector) -> Self {
        Self {
            source,
            selector,
            prop: DEFAULT_DATA_PROP.to_string(),
        }
    }

    /// Inject under `name` instead of `data`
    pub fn prop(mut self, name: impl Into<String>) -> Self {
        self.prop = name.into();
        self
    }
}

impl Enhancer for WithData {
    fn name(&self) -> &str {
        "withData"
    }

    fn enhance(&self, component: Component) -> Result<Component, ComposeError> {
        Ok(wrap(component, self.clone()))
    }
}

impl Container for WithData {
    fn name(&self) -> &str {
        "withData"
    }

    fn injected_keys(&self) -> Vec<String> {
        vec![self.prop.clone()]
    }

    fn instantiate(&self) -> Box<dyn Layer> {
        Box::new(DataLayer {
            source: self.source.clone(),
            selector: self.selector.clone(),
            prop: self.prop.clone(),
            subscription: None,
        })
    }
}

struct DataLayer {
    source: SharedSource,
    selector: Selector,
    prop: String,
    subscription: Option<Subscription>,
}

impl Layer for DataLayer {
    fn mount(&mut self, refresh: Refresh) -> anyhow::Result<()> {
        // A remount must never keep the previous handle alive
        self.unmount();
        let notify = refresh.clone();
        let listener = Arc::new(move || notify.request());
        self.subscription = Some(Subscription::open(
            self.source.clone(),
            listener,
            format!("withData[{}]", self.prop),
        ));
        // Changes between create and subscribe were never notified
        refresh.request();
        Ok(())
    }

    fn inject(&self, received: &Props) -> Props {
        let data = (self.selector)(self.source.as_ref(), received);
        Props::new().with(self.prop.clone(), data)
    }

    fn unmount(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{InstanceContext, Node};
    use crate::props;
    use crate::source::{Listener, MemorySource, SubscriptionId};
    use crate::util::lock;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Source that logs every handle it hands out and every handle it gets back
    #[derive(Default)]
    struct RecordingSource {
        listeners: Mutex<BTreeMap<SubscriptionId, Listener>>,
        subscribed: Mutex<Vec<SubscriptionId>>,
        unsubscribed: Mutex<Vec<SubscriptionId>>,
    }

    impl DataSource for RecordingSource {
        fn subscribe(&self, listener: Listener) -> SubscriptionId {
            let mut subscribed = lock(&self.subscribed);
            let id = SubscriptionId::new(subscribed.len() as u64 + 100);
            subscribed.push(id);
            lock(&self.listeners).insert(id, listener);
            id
        }

        fn unsubscribe(&self, id: SubscriptionId) -> bool {
            lock(&self.unsubscribed).push(id);
            lock(&self.listeners).remove(&id).is_some()
        }

        fn get(&self, _key: &str) -> Option<PropValue> {
            Some(PropValue::from("recorded"))
        }
    }

    impl RecordingSource {
        fn notify(&self) {
            let listeners: Vec<Listener> = lock(&self.listeners).values().cloned().collect();
            for listener in listeners {
                listener();
            }
        }

        fn last_subscribed(&self) -> SubscriptionId {
            *lock(&self.subscribed).last().unwrap()
        }

        fn last_unsubscribed(&self) -> SubscriptionId {
            *lock(&self.unsubscribed).last().unwrap()
        }
    }

    fn base() -> Component {
        Component::builder("Base").render(|props| {
            Ok(Node::text(
                props.get("data").and_then(|v| v.as_str()).unwrap_or("<none>"),
            ))
        })
    }

    fn by_id(source: &dyn DataSource, props: &Props) -> PropValue {
        props
            .get("id")
            .and_then(PropValue::as_int)
            .and_then(|id| source.get(&id.to_string()))
            .unwrap_or(PropValue::Null)
    }

    #[test]
    fn test_data_follows_source_without_remount() {
        let source = Arc::new(MemorySource::with_values([("1", "A")]));
        let composite = with_data(source.clone(), by_id).enhance(base()).unwrap();

        let mut instance = composite.create(props! { "id" => 1 }, InstanceContext::default());
        instance.mount().unwrap();
        assert_eq!(instance.render().unwrap(), Node::text("A"));

        source.set("1", "B");
        assert_eq!(instance.render().unwrap(), Node::text("B"));

        instance.unmount();
        assert_eq!(source.active_subscriptions(), 0);
    }

    #[test]
    fn test_change_between_create_and_mount_is_picked_up() {
        let source = Arc::new(MemorySource::with_values([("1", "A")]));
        let composite = with_data(source.clone(), by_id).enhance(base()).unwrap();

        let mut instance = composite.create(props! { "id" => 1 }, InstanceContext::default());
        source.set("1", "B");
        instance.mount().unwrap();

        assert_eq!(instance.render().unwrap(), Node::text("B"));
        instance.unmount();
    }

    #[test]
    fn test_data_reselected_on_prop_update() {
        let source = Arc::new(MemorySource::with_values([("1", "A"), ("2", "Z")]));
        let composite = with_data(source.clone(), by_id).enhance(base()).unwrap();

        let mut instance = composite.create(props! { "id" => 1 }, InstanceContext::default());
        instance.mount().unwrap();
        instance.update(props! { "id" => 2 }).unwrap();

        assert_eq!(instance.render().unwrap(), Node::text("Z"));
        instance.unmount();
    }

    #[test]
    fn test_custom_prop_name() {
        let source = Arc::new(MemorySource::with_values([("1", "A")]));
        let composite = with_data(source, by_id)
            .prop("user")
            .enhance(base())
            .unwrap();

        let mut instance = composite.create(props! { "id" => 1 }, InstanceContext::default());
        instance.mount().unwrap();
        assert_eq!(instance.render().unwrap(), Node::text("<none>"));
        instance.unmount();
    }

    #[test]
    fn test_subscribe_unsubscribe_pairing() {
        let source = Arc::new(MemorySource::with_values([("1", "A")]));
        let composite = with_data(source.clone(), by_id).enhance(base()).unwrap();

        for updates in 0..4 {
            let mut instance = composite.create(props! { "id" => 1 }, InstanceContext::default());
            instance.mount().unwrap();
            for n in 0..updates {
                instance.update(props! { "id" => 1, "n" => n }).unwrap();
                source.notify();
            }
            instance.unmount();
            instance.unmount();
        }

        assert_eq!(source.subscribe_count(), 4);
        assert_eq!(source.unsubscribe_count(), source.subscribe_count());
        assert_eq!(source.active_subscriptions(), 0);
    }

    #[test]
    fn test_each_instance_releases_its_own_handle() {
        let source = Arc::new(RecordingSource::default());
        let composite = with_data(source.clone(), |src, _props| {
            src.get("any").unwrap_or(PropValue::Null)
        })
        .enhance(base())
        .unwrap();

        for updates in 0..3 {
            let mut first = composite.create(props! { "id" => 1 }, InstanceContext::default());
            let mut second = composite.create(props! { "id" => 2 }, InstanceContext::default());

            first.mount().unwrap();
            let first_id = source.last_subscribed();
            second.mount().unwrap();
            let second_id = source.last_subscribed();
            assert_ne!(first_id, second_id);

            for n in 0..updates {
                first.update(props! { "id" => 1, "n" => n }).unwrap();
                second.update(props! { "id" => 2, "n" => n }).unwrap();
                source.notify();
            }

            second.unmount();
            assert_eq!(source.last_unsubscribed(), second_id);
            first.unmount();
            assert_eq!(source.last_unsubscribed(), first_id);

            // Unmount is idempotent: no further unsubscribe calls
            first.unmount();
            second.unmount();
            assert_eq!(lock(&source.unsubscribed).len(), 2 * (updates as usize + 1));
        }

        let mut released = lock(&source.unsubscribed).clone();
        released.sort();
        assert_eq!(released, *lock(&source.subscribed));
        assert!(lock(&source.listeners).is_empty());
    }

    #[test]
    fn test_notification_after_unmount_is_ignored() {
        let source = Arc::new(MemorySource::with_values([("1", "A")]));
        let composite = with_data(source.clone(), by_id).enhance(base()).unwrap();

        let mut first = composite.create(props! { "id" => 1 }, InstanceContext::default());
        let mut second = composite.create(props! { "id" => 1 }, InstanceContext::default());
        first.mount().unwrap();
        second.mount().unwrap();
        assert_eq!(source.active_subscriptions(), 2);

        first.unmount();
        source.set("1", "B");

        assert_eq!(second.render().unwrap(), Node::text("B"));
        assert_eq!(source.active_subscriptions(), 1);
        second.unmount();
    }
}
