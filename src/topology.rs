// pathopt: path-indexed traffic-engineering optimization
// Copyright (C) 2024 The pathopt developers
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! The network topology: a directed graph of nodes and links, each carrying
//! named resource capacities and service labels.
//!
//! The topology is constructed once per problem instance and is read-only
//! during formulation. Node identifiers are stable for the lifetime of a
//! formulation run (backed by a [`StableDiGraph`]), so they can be used as
//! components of variable names.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::dijkstra;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

/// Identifier of a node in the topology.
pub type NodeId = NodeIndex<u32>;

/// A directed link, identified by its endpoints.
pub type Link = (NodeId, NodeId);

/// Attributes stored on every node of the topology.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeData {
    /// Display name of the node.
    pub name: String,
    /// Named resource capacities of this node (e.g., `"cpu"`, `"tcam"`).
    pub resources: BTreeMap<String, f64>,
    /// Service labels attached to this node (e.g., `"switch"`, `"firewall"`).
    pub services: BTreeSet<String>,
    /// Whether this node hosts a middlebox (i.e., can be chosen as a
    /// service waypoint during path generation).
    pub middlebox: bool,
}

/// Attributes stored on every link of the topology.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkData {
    /// Named resource capacities of this link (e.g., `"bandwidth"`).
    pub resources: BTreeMap<String, f64>,
}

/// A directed network topology with resource and service annotations.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// The underlying graph.
    graph: StableDiGraph<NodeData, LinkData, u32>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the given display name and no resources or services.
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        self.graph.add_node(NodeData {
            name: name.into(),
            ..Default::default()
        })
    }

    /// Add a directed link between two existing nodes. Adding the same link
    /// twice keeps the first instance.
    pub fn add_link(&mut self, src: NodeId, dst: NodeId) {
        if self.graph.find_edge(src, dst).is_none() {
            self.graph.add_edge(src, dst, LinkData::default());
        }
    }

    /// Add a pair of directed links between two existing nodes.
    pub fn add_bidi_link(&mut self, a: NodeId, b: NodeId) {
        self.add_link(a, b);
        self.add_link(b, a);
    }

    /// Iterate over all node identifiers, in index order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    /// Iterate over all directed links, in insertion order.
    pub fn links(&self) -> impl Iterator<Item = Link> + '_ {
        self.graph.edge_references().map(|e| (e.source(), e.target()))
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of directed links.
    pub fn num_links(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether a directed link exists.
    pub fn has_link(&self, src: NodeId, dst: NodeId) -> bool {
        self.graph.find_edge(src, dst).is_some()
    }

    /// Display name of a node (empty string for unknown nodes).
    pub fn node_name(&self, node: NodeId) -> &str {
        self.graph
            .node_weight(node)
            .map(|d| d.name.as_str())
            .unwrap_or("")
    }

    /// Set the capacity of a named resource on a node.
    pub fn set_node_resource(&mut self, node: NodeId, resource: impl Into<String>, cap: f64) {
        if let Some(data) = self.graph.node_weight_mut(node) {
            data.resources.insert(resource.into(), cap);
        }
    }

    /// Capacity of a named resource on a node, if declared.
    pub fn node_resource(&self, node: NodeId, resource: &str) -> Option<f64> {
        self.graph
            .node_weight(node)
            .and_then(|d| d.resources.get(resource).copied())
    }

    /// Set the capacity of a named resource on a link.
    pub fn set_link_resource(&mut self, link: Link, resource: impl Into<String>, cap: f64) {
        if let Some(e) = self.graph.find_edge(link.0, link.1) {
            if let Some(data) = self.graph.edge_weight_mut(e) {
                data.resources.insert(resource.into(), cap);
            }
        }
    }

    /// Capacity of a named resource on a link, if declared.
    pub fn link_resource(&self, link: Link, resource: &str) -> Option<f64> {
        self.graph
            .find_edge(link.0, link.1)
            .and_then(|e| self.graph.edge_weight(e))
            .and_then(|d| d.resources.get(resource).copied())
    }

    /// Attach a service label to a node.
    pub fn add_service(&mut self, node: NodeId, service: impl Into<String>) {
        if let Some(data) = self.graph.node_weight_mut(node) {
            data.services.insert(service.into());
        }
    }

    /// Whether a node carries the given service label.
    pub fn has_service(&self, node: NodeId, service: &str) -> bool {
        self.graph
            .node_weight(node)
            .map(|d| d.services.contains(service))
            .unwrap_or(false)
    }

    /// Mark or unmark a node as hosting a middlebox.
    pub fn set_middlebox(&mut self, node: NodeId, middlebox: bool) {
        if let Some(data) = self.graph.node_weight_mut(node) {
            data.middlebox = middlebox;
        }
    }

    /// Whether a node hosts a middlebox.
    pub fn is_middlebox(&self, node: NodeId) -> bool {
        self.graph
            .node_weight(node)
            .map(|d| d.middlebox)
            .unwrap_or(false)
    }

    /// All nodes flagged as hosting a middlebox, in index order.
    pub fn middleboxes(&self) -> Vec<NodeId> {
        self.nodes().filter(|n| self.is_middlebox(*n)).collect()
    }

    /// Hop count of a shortest path between two nodes, if one exists.
    pub fn shortest_path_len(&self, src: NodeId, dst: NodeId) -> Option<usize> {
        dijkstra(&self.graph, src, Some(dst), |_| 1usize)
            .get(&dst)
            .copied()
    }

    /// Diameter of the topology in hops: the largest finite shortest-path
    /// length between any ordered node pair. Zero for empty or fully
    /// disconnected topologies.
    pub fn diameter(&self) -> usize {
        self.nodes()
            .flat_map(|src| {
                dijkstra(&self.graph, src, None, |_| 1usize)
                    .into_values()
                    .collect::<Vec<_>>()
            })
            .max()
            .unwrap_or(0)
    }

    /// Default path-length cutoff: 1.5x the topology diameter, rounded up,
    /// and at least one hop.
    pub fn default_cutoff(&self) -> usize {
        (((self.diameter() * 3) + 1) / 2).max(1)
    }

    /// Access the underlying graph, e.g. for path enumeration.
    pub(crate) fn graph(&self) -> &StableDiGraph<NodeData, LinkData, u32> {
        &self.graph
    }

    /// Build a complete topology on `n` nodes (every ordered pair of
    /// distinct nodes is connected by a directed link).
    pub fn complete(n: usize) -> Self {
        let mut topo = Self::new();
        let nodes: Vec<_> = (0..n).map(|i| topo.add_node(format!("n{i}"))).collect();
        for &u in &nodes {
            for &v in &nodes {
                if u != v {
                    topo.add_link(u, v);
                }
            }
        }
        topo
    }

    /// Build a chain topology `0 - 1 - ... - (n-1)` with bidirectional links.
    pub fn chain(n: usize) -> Self {
        let mut topo = Self::new();
        let nodes: Vec<_> = (0..n).map(|i| topo.add_node(format!("n{i}"))).collect();
        for w in nodes.windows(2) {
            topo.add_bidi_link(w[0], w[1]);
        }
        topo
    }

    /// Build a star topology: node 0 in the center, nodes `1..n` as leaves,
    /// all links bidirectional.
    pub fn star(n: usize) -> Self {
        let mut topo = Self::new();
        let nodes: Vec<_> = (0..n).map(|i| topo.add_node(format!("n{i}"))).collect();
        for &leaf in &nodes[1..] {
            topo.add_bidi_link(nodes[0], leaf);
        }
        topo
    }
}
