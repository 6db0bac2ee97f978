//! Human-readable introspection output

use std::fmt::Write;

use panelbus_core::{ComponentKey, ComponentSpec, PubSubStatus};

fn join_keys(keys: &[ComponentKey]) -> String {
    if keys.is_empty() {
        return "-".to_string();
    }
    keys.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

pub fn components_text(components: &[ComponentSpec]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Components ({}):", components.len());
    for component in components {
        let _ = writeln!(out, "  {}#{}  {}", component.name, component.code, component.description);
        for key in component.subscription_spec.keys() {
            let _ = writeln!(out, "      <- {key}");
        }
        for key in component.publication_spec.keys() {
            let _ = writeln!(out, "      -> {key}");
        }
    }
    out
}

pub fn status_text(status: &PubSubStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Pub/Sub status ({} published):", status.total_published);
    for row in &status.rows {
        let _ = writeln!(
            out,
            "  {}/{}  published={} delivered={} unhandled={} failed={}",
            row.channel,
            row.event,
            row.publish_count,
            row.delivered_count,
            row.unhandled_count,
            row.failed_count,
        );
        let _ = writeln!(out, "      subscribers: {}", join_keys(&row.subscribers));
        let _ = writeln!(out, "      publishers:  {}", join_keys(&row.publishers));
    }

    let idle = status.never_published();
    if !idle.is_empty() {
        let idle: Vec<String> = idle.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "Never published: {}", idle.join(" "));
    }
    out
}
