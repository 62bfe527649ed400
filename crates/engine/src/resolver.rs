// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Given requested output event types, compute the minimal plug-in set by
//! backward-walking consumer→producer edges, then topologically order it
//! for initialization (§4.3).

use scanforge_core::{EventType, PluginDescriptor};
use std::collections::{HashMap, HashSet, VecDeque};

/// A warning surfaced by the resolver without failing scan creation (§4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverWarning {
    /// `output` is not producible from `seed` by any registered plug-in.
    UnsatisfiedOutput { output: EventType },
    /// A cycle was found among the resolved plug-ins; `broken_edge` names
    /// the `(from, to)` pair removed to make the subgraph orderable.
    CycleBroken {
        broken_edge: (String, String),
        cycle_members: Vec<String>,
    },
}

/// Result of resolving a seed type and a requested output set against a
/// plug-in registry.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Plug-in names in a valid initialization order.
    pub module_set: Vec<String>,
    pub warnings: Vec<ResolverWarning>,
}

/// Computes minimal plug-in sets from declared watched/produced event types.
pub struct ModuleResolver<'a> {
    descriptors: &'a [PluginDescriptor],
}

impl<'a> ModuleResolver<'a> {
    pub fn new(descriptors: &'a [PluginDescriptor]) -> Self {
        Self { descriptors }
    }

    fn produces(&self, name: &str, event_type: &EventType) -> bool {
        self.descriptors
            .iter()
            .any(|d| d.name == name && d.produced_events.contains(event_type))
    }

    /// Plug-ins that produce at least one type in `requested_outputs`.
    fn sinks(&self, requested_outputs: &HashSet<EventType>) -> Vec<&PluginDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| d.produced_events.iter().any(|t| requested_outputs.contains(t)))
            .collect()
    }

    /// Backward-walk from sinks accumulating predecessors, stopping at
    /// plug-ins whose required inputs intersect only `seed` (or are empty).
    fn backward_walk(&self, seed: &EventType, requested_outputs: &HashSet<EventType>) -> HashSet<String> {
        let mut included: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<&PluginDescriptor> = self.sinks(requested_outputs).into();

        while let Some(plugin) = frontier.pop_front() {
            if !included.insert(plugin.name.clone()) {
                continue;
            }
            let stops_here = plugin.required_inputs.is_empty()
                || (plugin.required_inputs.len() == 1 && plugin.required_inputs.contains(seed));
            if stops_here {
                continue;
            }
            for watched in &plugin.watched_events {
                if watched == seed {
                    continue;
                }
                for producer in self.descriptors {
                    if producer.name != plugin.name && producer.produced_events.contains(watched) {
                        frontier.push_back(producer);
                    }
                }
            }
        }
        included
    }

    /// Resolve `seed` → `requested_outputs` into a plug-in set in
    /// initialization order, per §4.3.
    pub fn resolve(&self, seed: &EventType, requested_outputs: &HashSet<EventType>) -> Resolution {
        let mut warnings = Vec::new();
        for output in requested_outputs {
            if !self.descriptors.iter().any(|d| d.produced_events.contains(output)) {
                warnings.push(ResolverWarning::UnsatisfiedOutput { output: output.clone() });
            }
        }

        let included = self.backward_walk(seed, requested_outputs);
        let subgraph: Vec<&PluginDescriptor> = self
            .descriptors
            .iter()
            .filter(|d| included.contains(&d.name))
            .collect();

        let (order, cycle_warning) = topo_sort(&subgraph, seed);
        if let Some(w) = cycle_warning {
            warnings.push(w);
        }

        Resolution { module_set: order, warnings }
    }
}

/// Kahn's algorithm over the edge relation `A -> B` (A produces something B
/// watches). On a cycle, break at the edge whose target has the fewest
/// *required* dependencies and continue.
fn topo_sort(subgraph: &[&PluginDescriptor], seed: &EventType) -> (Vec<String>, Option<ResolverWarning>) {
    let names: Vec<String> = subgraph.iter().map(|d| d.name.clone()).collect();
    let mut in_degree: HashMap<String, u32> = names.iter().map(|n| (n.clone(), 0)).collect();
    let mut edges: Vec<(String, String)> = Vec::new();

    for consumer in subgraph {
        for watched in &consumer.watched_events {
            if watched == seed {
                continue;
            }
            for producer in subgraph {
                if producer.name != consumer.name && producer.produced_events.contains(watched) {
                    edges.push((producer.name.clone(), consumer.name.clone()));
                }
            }
        }
    }
    for (_, to) in &edges {
        *in_degree.get_mut(to).expect("edge target is in subgraph") += 1;
    }

    let mut queue: VecDeque<String> = names.iter().filter(|n| in_degree[*n] == 0).cloned().collect();
    let mut order = Vec::with_capacity(names.len());
    let mut remaining_edges = edges.clone();
    let mut warning = None;

    loop {
        while let Some(n) = queue.pop_front() {
            order.push(n.clone());
            remaining_edges.retain(|(from, to)| {
                if from == &n {
                    if let Some(d) = in_degree.get_mut(to) {
                        *d -= 1;
                        if *d == 0 {
                            queue.push_back(to.clone());
                        }
                    }
                    false
                } else {
                    true
                }
            });
        }
        if order.len() == names.len() {
            break;
        }
        if remaining_edges.is_empty() {
            // Disconnected zero-in-degree components already drained; the
            // rest is unreachable from the seed (shouldn't happen given
            // backward_walk's construction, but fail safe rather than loop).
            for n in &names {
                if !order.contains(n) {
                    order.push(n.clone());
                }
            }
            break;
        }
        // Cycle: break the edge whose target has the fewest required
        // dependencies among the remaining edges.
        let (broken_idx, _) = remaining_edges
            .iter()
            .enumerate()
            .min_by_key(|(_, (_, to))| {
                subgraph
                    .iter()
                    .find(|d| &d.name == to)
                    .map(|d| d.required_inputs.len())
                    .unwrap_or(usize::MAX)
            })
            .expect("remaining_edges is non-empty");
        let (from, to) = remaining_edges.remove(broken_idx);
        if let Some(d) = in_degree.get_mut(&to) {
            *d -= 1;
            if *d == 0 {
                queue.push_back(to.clone());
            }
        }
        let cycle_members: Vec<String> = names
            .iter()
            .filter(|n| !order.contains(n))
            .cloned()
            .collect();
        warning = Some(ResolverWarning::CycleBroken {
            broken_edge: (from, to),
            cycle_members,
        });
    }

    (order, warning)
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
