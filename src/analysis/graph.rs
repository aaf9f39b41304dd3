// Relationship graph over a resolved snapshot

use crate::analysis::CodebaseAnalysis;
use crate::parser::{HandlerLink, HttpMethod, RouteLink};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A record in the snapshot, by index into its list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeId {
    Component(usize),
    Route(usize),
    Function(usize),
    Query(usize),
}

/// Kind of edge in the relationship graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Component calls a route over HTTP
    Calls,
    /// Route is handled by a function
    HandledBy,
    /// Route reaches a database query through its handler
    Queries,
}

/// A file-level edge for diagrams: (from file, to file, label)
pub type FileEdge = (String, String, String);

/// Directed graph of resolved links between snapshot records
#[derive(Debug, Default)]
pub struct RelationGraph {
    graph: DiGraph<NodeId, EdgeKind>,
    index: HashMap<NodeId, NodeIndex>,
}

impl RelationGraph {
    /// Build the graph from a resolved snapshot
    pub fn build(analysis: &CodebaseAnalysis) -> Self {
        let mut graph = Self::default();

        let route_index: HashMap<(&str, &str, HttpMethod), usize> = analysis
            .routes
            .iter()
            .enumerate()
            .map(|(i, r)| ((r.file.as_str(), r.path.as_str(), r.method), i))
            .collect();

        for (c, component) in analysis.components.iter().enumerate() {
            for call in &component.api_calls {
                if let RouteLink::Linked { file, method, path } = &call.route {
                    if let Some(&r) = route_index.get(&(file.as_str(), path.as_str(), *method)) {
                        graph.add_edge(NodeId::Component(c), NodeId::Route(r), EdgeKind::Calls);
                    }
                }
            }
        }

        for (r, route) in analysis.routes.iter().enumerate() {
            if let HandlerLink::Linked { file, function } = &route.handler_link {
                if let Some(f) = analysis
                    .functions
                    .iter()
                    .position(|f| &f.file == file && &f.name == function)
                {
                    graph.add_edge(NodeId::Route(r), NodeId::Function(f), EdgeKind::HandledBy);
                }
            }
            for &q in &route.query_ids {
                if q < analysis.queries.len() {
                    graph.add_edge(NodeId::Route(r), NodeId::Query(q), EdgeKind::Queries);
                }
            }
        }

        graph
    }

    fn node(&mut self, id: NodeId) -> NodeIndex {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id);
        self.index.insert(id, idx);
        idx
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) {
        let a = self.node(from);
        let b = self.node(to);
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, kind);
        }
    }

    /// Targets of outgoing edges of one kind, sorted
    pub fn targets(&self, from: NodeId, kind: EdgeKind) -> Vec<NodeId> {
        let Some(&idx) = self.index.get(&from) else {
            return Vec::new();
        };
        let mut out: Vec<NodeId> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| *e.weight() == kind)
            .map(|e| self.graph[e.target()])
            .collect();
        out.sort();
        out
    }

    /// Routes a component calls, by route index
    pub fn routes_called_by(&self, component: usize) -> Vec<usize> {
        self.targets(NodeId::Component(component), EdgeKind::Calls)
            .into_iter()
            .filter_map(|n| match n {
                NodeId::Route(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Handler function of a route, by function index
    pub fn handler_of(&self, route: usize) -> Option<usize> {
        self.targets(NodeId::Route(route), EdgeKind::HandledBy)
            .into_iter()
            .find_map(|n| match n {
                NodeId::Function(f) => Some(f),
                _ => None,
            })
    }

    /// Queries reached from a route, by query index
    pub fn queries_of(&self, route: usize) -> Vec<usize> {
        self.targets(NodeId::Route(route), EdgeKind::Queries)
            .into_iter()
            .filter_map(|n| match n {
                NodeId::Query(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    /// Components calling a route, by component index
    pub fn callers_of(&self, route: usize) -> Vec<usize> {
        let Some(&idx) = self.index.get(&NodeId::Route(route)) else {
            return Vec::new();
        };
        let mut out: Vec<usize> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|e| match self.graph[e.source()] {
                NodeId::Component(c) => Some(c),
                _ => None,
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Distinct file-to-file edges: component file to route file, and route
    /// file to handler file
    pub fn file_edges(&self, analysis: &CodebaseAnalysis) -> BTreeSet<FileEdge> {
        let mut edges = BTreeSet::new();
        for edge in self.graph.edge_references() {
            let from = self.graph[edge.source()];
            let to = self.graph[edge.target()];
            match (from, to, edge.weight()) {
                (NodeId::Component(c), NodeId::Route(r), EdgeKind::Calls) => {
                    let (Some(component), Some(route)) =
                        (analysis.components.get(c), analysis.routes.get(r))
                    else {
                        continue;
                    };
                    edges.insert((component.file.clone(), route.file.clone(), route.label()));
                }
                (NodeId::Route(r), NodeId::Function(f), EdgeKind::HandledBy) => {
                    let (Some(route), Some(function)) =
                        (analysis.routes.get(r), analysis.functions.get(f))
                    else {
                        continue;
                    };
                    if route.file != function.file {
                        edges.insert((route.file.clone(), function.file.clone(), function.name.clone()));
                    }
                }
                _ => {}
            }
        }
        edges
    }

    pub fn stats(&self) -> GraphStats {
        let count = |kind: EdgeKind| {
            self.graph
                .edge_references()
                .filter(|e| *e.weight() == kind)
                .count()
        };
        GraphStats {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            component_calls: count(EdgeKind::Calls),
            handled_routes: count(EdgeKind::HandledBy),
            query_links: count(EdgeKind::Queries),
        }
    }
}

/// Statistics about the relationship graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub component_calls: usize,
    pub handled_routes: usize,
    pub query_links: usize,
}
