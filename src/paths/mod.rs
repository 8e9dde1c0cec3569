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

//! Paths, the paths-per-traffic-class mapping, path generation and path
//! selection.
//!
//! A [`Path`] is immutable topology data: an ordered node sequence plus an
//! order-independent set of nodes designated as middlebox waypoints. Solved
//! flow fractions are *not* stored on the path; they live in the engine's
//! solution and are materialized as [`SolvedPath`] values on extraction, so
//! the same path lists can be reused across several solves without
//! aliasing surprises.

mod generator;
mod select;

pub use generator::{
    generate_paths, generate_paths_per_class, generate_paths_tolerant, has_middlebox_predicate,
    mbox_modifier, null_predicate,
};
pub use select::{select, select_k_shortest, select_random, SelectStrategy};

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

use crate::topology::{Link, NodeId};
use crate::traffic::TrafficClass;

/// An ordered, node-non-repeating sequence of topology nodes, optionally
/// annotated with the subset of its nodes used as middlebox waypoints.
///
/// Two paths are equal iff both the node sequence and the middlebox set
/// match. The middlebox set is auxiliary metadata: it does not affect
/// traversal order and need not be contiguous within the node sequence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    /// The node sequence, source first.
    nodes: Vec<NodeId>,
    /// Nodes of the sequence selected as middlebox waypoints.
    middleboxes: BTreeSet<NodeId>,
}

impl Path {
    /// Create a plain path (no middlebox annotations) from a node sequence.
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self {
            nodes,
            middleboxes: BTreeSet::new(),
        }
    }

    /// Annotate this path with a middlebox waypoint set. Nodes not on the
    /// path are ignored.
    pub fn with_middleboxes(mut self, mboxes: impl IntoIterator<Item = NodeId>) -> Self {
        self.middleboxes = mboxes
            .into_iter()
            .filter(|n| self.nodes.contains(n))
            .collect();
        self
    }

    /// The node sequence.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Source node.
    pub fn source(&self) -> NodeId {
        self.nodes[0]
    }

    /// Sink node.
    pub fn sink(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// Number of hops (links) on the path.
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Whether a node lies on the path.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Whether the path traverses the directed link, i.e., the endpoints
    /// appear as a consecutive pair of the node sequence.
    pub fn traverses(&self, link: Link) -> bool {
        self.nodes.windows(2).any(|w| w[0] == link.0 && w[1] == link.1)
    }

    /// Iterate over the directed links of the path, in traversal order.
    pub fn links(&self) -> impl Iterator<Item = Link> + '_ {
        self.nodes.windows(2).map(|w| (w[0], w[1]))
    }

    /// Whether this path carries any middlebox annotations.
    pub fn has_middleboxes(&self) -> bool {
        !self.middleboxes.is_empty()
    }

    /// Whether the node is designated as a middlebox waypoint on this path.
    pub fn uses_middlebox(&self, node: NodeId) -> bool {
        self.middleboxes.contains(&node)
    }

    /// The middlebox waypoint set.
    pub fn middleboxes(&self) -> &BTreeSet<NodeId> {
        &self.middleboxes
    }

    /// Whether the path "uses" a node for node-resource accounting: the
    /// node is in the middlebox set when annotations are present, and any
    /// node of the sequence otherwise. A node only passed through as a
    /// waypoint of an annotated path does not accrue node-resource cost.
    pub fn uses_node(&self, node: NodeId) -> bool {
        if self.has_middleboxes() {
            self.uses_middlebox(node)
        } else {
            self.contains(node)
        }
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for n in &self.nodes {
            if !first {
                write!(f, " -> ")?;
            }
            first = false;
            if self.middleboxes.contains(n) {
                write!(f, "[{}]", n.index())?;
            } else {
                write!(f, "{}", n.index())?;
            }
        }
        Ok(())
    }
}

/// A path together with the flow fraction assigned to it by a solve.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolvedPath {
    /// The (immutable) path.
    pub path: Path,
    /// Fraction of the class's volume carried on this path, in `[0, 1]`.
    pub fraction: f64,
}

/// Solved routing: for each class, its flow-carrying paths with fractions.
pub type SolvedRouting = BTreeMap<TrafficClass, Vec<SolvedPath>>;

/// The paths-per-traffic-class mapping (pptc).
///
/// Iteration order is deterministic (ascending class id). The order of
/// paths *within* a class defines the positional index used in variable
/// names, so it must not change between variable creation and solution
/// extraction.
#[derive(Debug, Clone, Default)]
pub struct Pptc {
    /// Candidate paths per class, keyed by the class itself (ordered by id).
    inner: BTreeMap<TrafficClass, Vec<Path>>,
}

impl Pptc {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the candidate path list of a class.
    pub fn insert(&mut self, tc: TrafficClass, paths: Vec<Path>) {
        self.inner.insert(tc, paths);
    }

    /// Candidate paths of a class.
    pub fn get(&self, tc: &TrafficClass) -> Option<&[Path]> {
        self.inner.get(tc).map(|p| p.as_slice())
    }

    /// Iterate over (class, paths) entries, ascending by class id.
    pub fn iter(&self) -> btree_map::Iter<'_, TrafficClass, Vec<Path>> {
        self.inner.iter()
    }

    /// Iterate over the classes, ascending by id.
    pub fn classes(&self) -> impl Iterator<Item = &TrafficClass> {
        self.inner.keys()
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the mapping holds no classes.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Total number of candidate paths across all classes.
    pub fn total_paths(&self) -> usize {
        self.inner.values().map(Vec::len).sum()
    }
}

impl<'a> IntoIterator for &'a Pptc {
    type Item = (&'a TrafficClass, &'a Vec<Path>);
    type IntoIter = btree_map::Iter<'a, TrafficClass, Vec<Path>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl FromIterator<(TrafficClass, Vec<Path>)> for Pptc {
    fn from_iter<T: IntoIterator<Item = (TrafficClass, Vec<Path>)>>(iter: T) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
