//! Node and edge records for a rendering surface.

use serde::Serialize;
use tracing::debug;

use crate::classify::classify;
use crate::compose::ConfigModel;
use crate::layout::{BBox, GroupFrame, Layout, LayoutEngine, LayoutParams, Point};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub position: Point,
    pub color: String,
}

/// `source` depends on `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

/// Result of one layout pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub groups: Vec<GroupFrame>,
    #[serde(skip)]
    pub bbox: BBox,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Rebuild the whole graph from `config`.
///
/// Deterministic for a given key order; nothing is carried over between
/// calls.
pub fn recompute(config: &ConfigModel, params: &LayoutParams) -> Graph {
    let layout = LayoutEngine::new(params.clone()).layout(config);
    let nodes = build_nodes(config, &layout);
    let edges = build_edges(config);
    debug!(
        services = config.len(),
        groups = layout.groups.len(),
        edges = edges.len(),
        "recomputed graph"
    );

    Graph {
        nodes,
        edges,
        groups: layout.groups,
        bbox: layout.bbox,
    }
}

pub fn build_nodes(config: &ConfigModel, layout: &Layout) -> Vec<Node> {
    config
        .keys()
        .filter_map(|name| {
            let position = *layout.positions.get(name)?;
            Some(Node {
                id: name.clone(),
                label: name.clone(),
                position,
                color: classify(name).to_string(),
            })
        })
        .collect()
}

/// One edge per `depends_on` entry naming a known service, in config order.
/// Repeated entries produce repeated edges.
pub fn build_edges(config: &ConfigModel) -> Vec<Edge> {
    let mut edges = Vec::new();
    for (name, service) in config {
        for dep in service.dependencies() {
            if config.contains_key(dep) {
                edges.push(Edge {
                    source: name.clone(),
                    target: dep.clone(),
                });
            } else {
                debug!(service = %name, dependency = %dep, "skipping unknown dependency");
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ServiceDescriptor;
    use pretty_assertions::assert_eq;

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    fn model(services: Vec<ServiceDescriptor>) -> ConfigModel {
        services.into_iter().map(|s| (s.name.clone(), s)).collect()
    }

    #[test]
    fn builds_one_edge_per_known_dependency() {
        let config = model(vec![
            ServiceDescriptor::new("api-a").with_depends_on(["db-a"]),
            ServiceDescriptor::new("db-a"),
            ServiceDescriptor::new("cache-a"),
        ]);
        let graph = recompute(&config, &LayoutParams::default());

        assert_eq!(graph.groups.len(), 3);
        assert_eq!(
            graph.nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            vec!["api-a", "db-a", "cache-a"]
        );
        assert_eq!(graph.edges, vec![edge("api-a", "db-a")]);
    }

    #[test]
    fn dangling_dependency_is_dropped() {
        let config = model(vec![
            ServiceDescriptor::new("web-1").with_depends_on(["ghost"]),
        ]);
        let graph = recompute(&config, &LayoutParams::default());

        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn duplicates_and_self_edges_are_kept() {
        let config = model(vec![
            ServiceDescriptor::new("worker").with_depends_on(["db", "db", "worker"]),
            ServiceDescriptor::new("db"),
        ]);
        assert_eq!(
            build_edges(&config),
            vec![edge("worker", "db"), edge("worker", "db"), edge("worker", "worker")]
        );
    }

    #[test]
    fn edges_follow_config_then_dependency_order() {
        let config = model(vec![
            ServiceDescriptor::new("b").with_depends_on(["c", "a"]),
            ServiceDescriptor::new("a").with_depends_on(["c"]),
            ServiceDescriptor::new("c"),
        ]);
        assert_eq!(
            build_edges(&config),
            vec![edge("b", "c"), edge("b", "a"), edge("a", "c")]
        );
    }

    #[test]
    fn nodes_carry_position_label_and_color() {
        let config = model(vec![ServiceDescriptor::new("api-gateway")]);
        let graph = recompute(&config, &LayoutParams::default());
        let node = graph.node("api-gateway").unwrap();

        assert_eq!(node.label, "api-gateway");
        assert_eq!(node.color, "#FF6B6B");
        assert_eq!(node.position, Point::new(120.0, 45.0));
    }

    #[test]
    fn empty_config_is_empty_graph() {
        let graph = recompute(&ConfigModel::new(), &LayoutParams::default());
        assert!(graph.is_empty());
        assert!(graph.edges.is_empty());
        assert!(graph.groups.is_empty());
    }

    #[test]
    fn serializes_nodes_edges_and_groups() {
        let config = model(vec![
            ServiceDescriptor::new("api").with_depends_on(["db"]),
            ServiceDescriptor::new("db"),
        ]);
        let graph = recompute(&config, &LayoutParams::default());
        let json = serde_json::to_value(&graph).unwrap();

        assert_eq!(json["nodes"][0]["id"], "api");
        assert_eq!(json["nodes"][0]["position"]["x"], 120.0);
        assert_eq!(json["edges"][0]["source"], "api");
        assert_eq!(json["edges"][0]["target"], "db");
        assert_eq!(json["groups"][1]["key"], "db");
        assert!(json.get("bbox").is_none());
    }
}
