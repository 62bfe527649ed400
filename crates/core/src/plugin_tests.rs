// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn builder_accumulates_watched_and_produced_sets() {
    let descriptor = PluginDescriptor::new("dns_resolver", "dns")
        .watching([EventType::new("DOMAIN_NAME")])
        .producing([EventType::new("IP_ADDRESS")])
        .requiring([EventType::new("DOMAIN_NAME")])
        .with_flag("slow");

    assert!(descriptor.watched_events.contains(&EventType::new("DOMAIN_NAME")));
    assert!(descriptor.produced_events.contains(&EventType::new("IP_ADDRESS")));
    assert!(descriptor.required_inputs.contains(&EventType::new("DOMAIN_NAME")));
    assert!(descriptor.flags.contains(&PluginFlag::new("slow")));
}

#[test]
fn wildcard_watcher_matches_any_type() {
    let descriptor = PluginDescriptor::new("logger", "observability")
        .watching([EventType::new("*")]);
    assert!(descriptor.watches(&EventType::new("NETBLOCK")));
}

#[test]
fn non_wildcard_watcher_matches_only_declared_types() {
    let descriptor = PluginDescriptor::new("dns_resolver", "dns")
        .watching([EventType::new("DOMAIN_NAME")]);
    assert!(descriptor.watches(&EventType::new("DOMAIN_NAME")));
    assert!(!descriptor.watches(&EventType::new("IP_ADDRESS")));
}
