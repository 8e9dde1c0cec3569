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

//! Capacity specifications for node and link resources.
//!
//! A [`Caps`] value is resolved exactly once at the start of constraint
//! building into a normalized per-entity map. Entities absent from the
//! resolved map are uncapped and produce no constraint. An explicit
//! capacity of `0.0` is honored: it produces a load variable constrained
//! to zero, it does not disable the constraint.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::topology::{Link, NodeId};

/// Resolved capacity of one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapEntry {
    /// A fixed capacity bound.
    Fixed(f64),
    /// The capacity is itself a decision variable, gated by the entity's
    /// enabled binary (only supported for nodes).
    Elastic,
}

/// A capacity specification for a family of entities (nodes or links).
pub enum Caps<K> {
    /// Explicit per-entity capacities; entities not in the map are uncapped.
    FixedMap(BTreeMap<K, CapEntry>),
    /// The same fixed capacity for every entity.
    Uniform(f64),
    /// Capacity computed per entity; `None` leaves the entity uncapped.
    Computed(Box<dyn Fn(K) -> Option<f64>>),
    /// Every entity gets an elastic capacity variable.
    Elastic,
}

impl<K: Ord + Copy> Caps<K> {
    /// Build a fixed-map specification from plain capacity values.
    pub fn fixed(map: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self::FixedMap(
            map.into_iter()
                .map(|(k, v)| (k, CapEntry::Fixed(v)))
                .collect(),
        )
    }

    /// Resolve the specification over the given entities into a normalized
    /// per-entity map.
    pub fn resolve(&self, entities: impl IntoIterator<Item = K>) -> BTreeMap<K, CapEntry> {
        match self {
            Caps::FixedMap(map) => entities
                .into_iter()
                .filter_map(|k| map.get(&k).map(|e| (k, *e)))
                .collect(),
            Caps::Uniform(cap) => entities
                .into_iter()
                .map(|k| (k, CapEntry::Fixed(*cap)))
                .collect(),
            Caps::Computed(f) => entities
                .into_iter()
                .filter_map(|k| f(k).map(|cap| (k, CapEntry::Fixed(cap))))
                .collect(),
            Caps::Elastic => entities.into_iter().map(|k| (k, CapEntry::Elastic)).collect(),
        }
    }
}

impl<K> std::fmt::Debug for Caps<K>
where
    K: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Caps::FixedMap(map) => f.debug_tuple("FixedMap").field(map).finish(),
            Caps::Uniform(cap) => f.debug_tuple("Uniform").field(cap).finish(),
            Caps::Computed(_) => f.write_str("Computed(..)"),
            Caps::Elastic => f.write_str("Elastic"),
        }
    }
}

/// Short human-readable description of a capacity entity, used in errors.
pub trait EntityName {
    /// Describe the entity, e.g. `node 3` or `link 0 -> 1`.
    fn describe(&self) -> String;
}

impl EntityName for NodeId {
    fn describe(&self) -> String {
        format!("node {}", self.index())
    }
}

impl EntityName for Link {
    fn describe(&self) -> String {
        format!("link {} -> {}", self.0.index(), self.1.index())
    }
}

/// Merge two resolved capacity maps (multi-app composition). Entities
/// present in both must agree exactly; a disagreement on fixed values or
/// elasticity fails with [`Error::ConflictingCapacity`].
pub fn merge_caps<K: Ord + Copy + EntityName>(
    resource: &str,
    a: &BTreeMap<K, CapEntry>,
    b: &BTreeMap<K, CapEntry>,
) -> Result<BTreeMap<K, CapEntry>, Error> {
    let mut merged = a.clone();
    for (k, entry) in b {
        match merged.insert(*k, *entry) {
            None => {}
            Some(prev) if prev == *entry => {}
            Some(prev) => {
                let (va, vb) = match (prev, entry) {
                    (CapEntry::Fixed(x), CapEntry::Fixed(y)) => (x, *y),
                    // elastic vs fixed disagreement: report NaN-free markers
                    (CapEntry::Elastic, CapEntry::Fixed(y)) => (f64::INFINITY, *y),
                    (CapEntry::Fixed(x), CapEntry::Elastic) => (x, f64::INFINITY),
                    (CapEntry::Elastic, CapEntry::Elastic) => unreachable!(),
                };
                return Err(Error::ConflictingCapacity {
                    resource: resource.to_string(),
                    entity: k.describe(),
                    a: va,
                    b: vb,
                });
            }
        }
    }
    Ok(merged)
}
