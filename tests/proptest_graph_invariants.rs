//! Property-based invariant tests for graph recomputation.
//!
//! For any compose model:
//!
//! 1. One node per service, in key order.
//! 2. An edge exists iff the target is a declared dependency and a known key.
//! 3. Recompute is deterministic.
//! 4. Services share a group iff they share the prefix before the first '-'.
//! 5. Node colors follow the prefix table.
//! 6. Every node box sits inside its group frame.
//! 7. Group frames never overlap.

use std::collections::HashSet;

use compose_graph::classify::{FALLBACK, RULES, group_key};
use compose_graph::{ConfigModel, GridSpacing, LayoutParams, ServiceDescriptor, recompute};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn name_strategy() -> impl Strategy<Value = String> {
    "(api|API|db|cache|queue|web|auth|util|worker|x)(-[a-z0-9]{1,3}){0,2}"
}

/// Unique service names, each with dependencies drawn from the same pool
/// plus a few that do not exist.
fn config_strategy() -> impl Strategy<Value = ConfigModel> {
    prop::collection::vec(name_strategy(), 0..24)
        .prop_flat_map(|names| {
            let mut seen = HashSet::new();
            let names: Vec<String> = names.into_iter().filter(|n| seen.insert(n.clone())).collect();
            let count = names.len();
            let deps = prop::collection::vec(
                prop::collection::vec(
                    prop_oneof![
                        4 => (0..count.max(1)).prop_map(Some),
                        1 => Just(None),
                    ],
                    0..4,
                ),
                count,
            );
            (Just(names), deps)
        })
        .prop_map(|(names, deps)| {
            names
                .iter()
                .zip(deps)
                .map(|(name, picks)| {
                    let targets = picks.into_iter().map(|pick| match pick {
                        Some(i) => names[i % names.len()].clone(),
                        None => "ghost-service".to_string(),
                    });
                    (
                        name.clone(),
                        ServiceDescriptor::new(name.as_str()).with_depends_on(targets),
                    )
                })
                .collect()
        })
}

fn params_strategy() -> impl Strategy<Value = LayoutParams> {
    (
        1usize..5,
        prop_oneof![Just(GridSpacing::Running), Just(GridSpacing::Uniform)],
        20.0f32..300.0,
        10.0f32..100.0,
        0.0f32..30.0,
        1.0f32..40.0,
    )
        .prop_map(|(groups_per_row, spacing, nw, nh, p, gp)| LayoutParams {
            node_width: nw,
            node_height: nh,
            node_padding: p,
            group_padding: gp,
            groups_per_row,
            spacing,
        })
}

const EPS: f32 = 0.01;

// ═════════════════════════════════════════════════════════════════════════
// 1. One node per service
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn one_node_per_service(config in config_strategy(), params in params_strategy()) {
        let graph = recompute(&config, &params);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        let keys: Vec<&str> = config.keys().map(String::as_str).collect();
        prop_assert_eq!(ids, keys);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Edges mirror known dependencies
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn edges_follow_known_dependencies(config in config_strategy()) {
        let graph = recompute(&config, &LayoutParams::default());

        let expected: Vec<(String, String)> = config
            .iter()
            .flat_map(|(name, service)| {
                service
                    .dependencies()
                    .iter()
                    .filter(|dep| config.contains_key(dep.as_str()))
                    .map(move |dep| (name.clone(), dep.clone()))
            })
            .collect();
        let actual: Vec<(String, String)> = graph
            .edges
            .iter()
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect();

        prop_assert_eq!(actual, expected);
        prop_assert!(graph.edges.iter().all(|e| e.target != "ghost-service"));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn recompute_is_deterministic(config in config_strategy(), params in params_strategy()) {
        let a = recompute(&config, &params);
        let b = recompute(&config, &params);
        prop_assert_eq!(a.nodes, b.nodes);
        prop_assert_eq!(a.edges, b.edges);
        prop_assert_eq!(a.groups, b.groups);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Grouping law
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn groups_partition_by_prefix(config in config_strategy()) {
        let graph = recompute(&config, &LayoutParams::default());

        let member_count: usize = graph.groups.iter().map(|g| g.members.len()).sum();
        prop_assert_eq!(member_count, config.len());

        for frame in &graph.groups {
            for member in &frame.members {
                prop_assert_eq!(group_key(member), frame.key.as_str());
            }
        }
        let keys: HashSet<&str> = graph.groups.iter().map(|g| g.key.as_str()).collect();
        prop_assert_eq!(keys.len(), graph.groups.len(), "group keys must be unique");
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Classification law
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn colors_follow_prefix_table(config in config_strategy()) {
        let graph = recompute(&config, &LayoutParams::default());
        for node in &graph.nodes {
            let lower = node.id.to_ascii_lowercase();
            let expected = RULES
                .iter()
                .find(|rule| lower.starts_with(rule.prefix))
                .map_or(FALLBACK.color, |rule| rule.color);
            prop_assert_eq!(node.color.as_str(), expected, "color of {}", node.id);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Nodes inside their group frame
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn nodes_sit_inside_their_frame(config in config_strategy(), params in params_strategy()) {
        let graph = recompute(&config, &params);
        let (hw, hh) = (params.node_width / 2.0, params.node_height / 2.0);

        for frame in &graph.groups {
            for member in &frame.members {
                let node = graph.node(member).expect("every member has a node");
                let p = node.position;
                prop_assert!(p.x - hw >= frame.x + params.group_padding - EPS);
                prop_assert!(p.y - hh >= frame.y + params.group_padding - EPS);
                prop_assert!(p.x + hw <= frame.x + frame.width - params.group_padding + EPS);
                prop_assert!(p.y + hh <= frame.y + frame.height - params.group_padding + EPS);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Frames do not overlap
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn frames_never_overlap(config in config_strategy(), params in params_strategy()) {
        let graph = recompute(&config, &params);

        for (i, a) in graph.groups.iter().enumerate() {
            for b in &graph.groups[i + 1..] {
                let apart_x = a.x + a.width <= b.x + EPS || b.x + b.width <= a.x + EPS;
                let apart_y = a.y + a.height <= b.y + EPS || b.y + b.height <= a.y + EPS;
                prop_assert!(apart_x || apart_y, "{} overlaps {}", a.key, b.key);
            }
        }
    }
}
