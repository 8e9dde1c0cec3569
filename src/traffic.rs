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

//! Traffic classes (commodities) and the traffic matrix.
//!
//! A [`TrafficClass`] is one unit of demand between a source and a
//! destination. Its `id` is the join key for all variable naming, so two
//! classes with the same id are considered the same class: equality,
//! ordering and hashing are defined over the id alone. A class must be
//! treated as immutable once paths have been generated for it; mutating
//! cost fields after formulation starts leaves stale constraints behind.

use std::collections::BTreeMap;

use ipnet::Ipv4Net;

use crate::topology::{NodeId, Topology};

/// One unit of traffic demand between an ingress and an egress node.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrafficClass {
    /// Unique identifier within a formulation run.
    pub id: u32,
    /// Symbolic name (e.g. `"web"`).
    pub name: String,
    /// Ingress node.
    pub src: NodeId,
    /// Egress node.
    pub dst: NodeId,
    /// Demand volume in flows.
    pub volume_flows: f64,
    /// Demand volume in bytes.
    pub volume_bytes: f64,
    /// Priority weight of this class.
    pub priority: f64,
    /// Optional source IP prefix carried by this class.
    pub src_prefix: Option<Ipv4Net>,
    /// Optional destination IP prefix carried by this class.
    pub dst_prefix: Option<Ipv4Net>,
    /// Extra named costs, e.g. per-resource processing cost per flow.
    pub costs: BTreeMap<String, f64>,
}

impl TrafficClass {
    /// Create a new traffic class with unit volumes and priority 1.
    pub fn new(id: u32, name: impl Into<String>, src: NodeId, dst: NodeId) -> Self {
        Self {
            id,
            name: name.into(),
            src,
            dst,
            volume_flows: 1.0,
            volume_bytes: 1.0,
            priority: 1.0,
            src_prefix: None,
            dst_prefix: None,
            costs: BTreeMap::new(),
        }
    }

    /// Set the flow and byte volumes.
    pub fn with_volume(mut self, flows: f64, bytes: f64) -> Self {
        self.volume_flows = flows;
        self.volume_bytes = bytes;
        self
    }

    /// Set the priority weight.
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Set the source and destination prefixes.
    pub fn with_prefixes(mut self, src: Ipv4Net, dst: Ipv4Net) -> Self {
        self.src_prefix = Some(src);
        self.dst_prefix = Some(dst);
        self
    }

    /// Add a named cost (e.g. per-flow cpu cost).
    pub fn with_cost(mut self, resource: impl Into<String>, cost: f64) -> Self {
        self.costs.insert(resource.into(), cost);
        self
    }

    /// Look up a named cost; absent costs are zero.
    pub fn cost(&self, resource: &str) -> f64 {
        self.costs.get(resource).copied().unwrap_or(0.0)
    }
}

impl PartialEq for TrafficClass {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TrafficClass {}

impl PartialOrd for TrafficClass {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TrafficClass {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for TrafficClass {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}: {} -> {})",
            self.name,
            self.id,
            self.src.index(),
            self.dst.index()
        )
    }
}

/// An ordered collection of traffic classes, kept sorted by class id.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrafficMatrix {
    /// The classes, ascending by id.
    classes: Vec<TrafficClass>,
}

impl TrafficMatrix {
    /// Create an empty traffic matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a class, keeping the matrix sorted by id. A class with an
    /// already-present id replaces the previous one.
    pub fn push(&mut self, tc: TrafficClass) {
        match self.classes.binary_search_by_key(&tc.id, |c| c.id) {
            Ok(i) => self.classes[i] = tc,
            Err(i) => self.classes.insert(i, tc),
        }
    }

    /// Iterate over the classes, ascending by id.
    pub fn classes(&self) -> impl Iterator<Item = &TrafficClass> {
        self.classes.iter()
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the matrix holds no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<TrafficClass> for TrafficMatrix {
    fn from_iter<T: IntoIterator<Item = TrafficClass>>(iter: T) -> Self {
        let mut tm = Self::new();
        for tc in iter {
            tm.push(tc);
        }
        tm
    }
}

/// All ordered ingress/egress pairs of the topology, excluding self-pairs,
/// ascending by (source index, destination index).
pub fn all_ie_pairs(topo: &Topology) -> Vec<(NodeId, NodeId)> {
    let mut nodes: Vec<_> = topo.nodes().collect();
    nodes.sort();
    let mut pairs = Vec::with_capacity(nodes.len() * nodes.len().saturating_sub(1));
    for &src in &nodes {
        for &dst in &nodes {
            if src != dst {
                pairs.push((src, dst));
            }
        }
    }
    pairs
}
