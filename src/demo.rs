// Demo module - the withData scenario against an in-memory source
//
// Builds a small badge component, wraps it with
// compose(onlyUpdateForKeys([id]), withData(user)) and walks it through a
// mount, a source notification, gated updates and an unmount. Each step
// prints what the badge renders so the layer behaviour is visible.

use enhancer::component::{Component, Node};
use enhancer::compose::{compose, Enhancer, EnhancerExt};
use enhancer::enhancers::{only_update_for_keys, with_data};
use enhancer::host::Root;
use enhancer::props;
use enhancer::props::{PropKind, PropValue, Props, PropsContract};
use enhancer::source::{DataSource, MemorySource};
use enhancer::stack::Selectors;
use std::sync::Arc;

/// In-memory user table used by `demo` and `inspect`
pub fn sample_source() -> Arc<MemorySource> {
    Arc::new(MemorySource::with_values([
        ("1", "Ada"),
        ("2", "Grace"),
        ("3", "Barbara"),
    ]))
}

/// Selectors a config file may name in `with-data` entries
pub fn sample_selectors(source: Arc<MemorySource>) -> Selectors {
    Selectors::new(source).lookup("user", "id")
}

/// A badge rendering `#<id> <user>`
pub fn sample_component() -> Component {
    Component::builder("UserBadge")
        .contract(
            PropsContract::new()
                .required("id", PropKind::Int)
                .optional("user", PropKind::Any),
        )
        .with_static("route", "/users")
        .render(|props| {
            let id = props.get("id").and_then(PropValue::as_int).unwrap_or(0);
            let user = props.get("user").and_then(PropValue::as_str).unwrap_or("?");
            Ok(Node::text(format!("#{} {}", id, user)))
        })
}

fn user_by_id(source: &dyn DataSource, props: &Props) -> PropValue {
    props
        .get("id")
        .and_then(PropValue::as_int)
        .and_then(|id| source.get(&id.to_string()))
        .unwrap_or(PropValue::Null)
}

pub fn show(node: &Node) -> String {
    match node {
        Node::Text(text) => text.clone(),
        other => format!("{:?}", other),
    }
}

/// What the scenario observed
#[derive(Debug, Default)]
pub struct DemoReport {
    pub renders: Vec<String>,
    pub subscribed: usize,
    pub unsubscribed: usize,
    pub active: usize,
}

/// Run the scenario, printing each step
pub fn run(ticks: usize) -> anyhow::Result<DemoReport> {
    let source = sample_source();
    let enhance = compose([
        only_update_for_keys(["id"]).shared(),
        with_data(source.clone(), user_by_id).prop("user").shared(),
    ]);
    let badge = enhance.enhance(sample_component())?;
    println!("component: {}", badge.display_name());

    let mut report = DemoReport::default();
    let mut record = |step: &str, root: &Root| -> anyhow::Result<()> {
        let rendered = show(&root.render()?);
        println!("{:<24} -> {}", step, rendered);
        report.renders.push(rendered);
        Ok(())
    };

    let mut root = Root::mount(badge, props! { "id" => 1 })?;
    record("mount id=1", &root)?;

    source.set("1", "Ada Lovelace");
    record("source changed", &root)?;

    for tick in 0..ticks {
        let outcome = root.update(props! { "id" => 1, "tick" => tick as i64 })?;
        println!("update tick={:<13} -> {:?}", tick, outcome);
    }

    let outcome = root.update(props! { "id" => 2 })?;
    println!("update id=2{:<13} -> {:?}", "", outcome);
    record("after id=2", &root)?;

    root.unmount();

    report.subscribed = source.subscribe_count();
    report.unsubscribed = source.unsubscribe_count();
    report.active = source.active_subscriptions();
    println!(
        "subscriptions: {} opened, {} released, {} active",
        report.subscribed, report.unsubscribed, report.active
    );

    Ok(report)
}
