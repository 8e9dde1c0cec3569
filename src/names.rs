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

//! Deterministic naming of decision variables and constraint rows.
//!
//! Every variable and constraint name used anywhere in the crate is
//! produced by one of these functions, parameterized only by traffic-class
//! id, path index, node index, edge endpoints, or resource name. Each
//! family carries a distinct prefix, so names never collide across
//! families, and identical parameters always produce identical names. Keep
//! all name formatting here: reconstructing these strings ad hoc is how
//! declaration and reference drift apart.

use crate::topology::{Link, NodeId};
use crate::traffic::TrafficClass;

/// Flow-fraction variable `x` for a (class, path index) pair.
pub fn xp(tc: &TrafficClass, path_index: usize) -> String {
    format!("x_{}_{}", tc.id, path_index)
}

/// Allocation variable `a` for a class: the admitted fraction of its demand.
pub fn al(tc: &TrafficClass) -> String {
    format!("a_{}", tc.id)
}

/// Node-enabled binary for a node.
pub fn bn(node: NodeId) -> String {
    format!("bn_{}", node.index())
}

/// Edge-enabled binary for a directed link.
pub fn be(link: Link) -> String {
    format!("be_{}_{}", link.0.index(), link.1.index())
}

/// Path-enabled binary for a (class, path index) pair.
pub fn bp(tc: &TrafficClass, path_index: usize) -> String {
    format!("bp_{}_{}", tc.id, path_index)
}

/// Load variable for a resource at a node.
pub fn node_load(resource: &str, node: NodeId) -> String {
    format!("Load_{}_n_{}", resource, node.index())
}

/// Load variable for a resource on a link.
pub fn link_load(resource: &str, link: Link) -> String {
    format!("Load_{}_e_{}_{}", resource, link.0.index(), link.1.index())
}

/// Elastic capacity variable for a resource at a node.
pub fn node_cap(resource: &str, node: NodeId) -> String {
    format!("Cap_{}_{}", resource, node.index())
}

/// Auxiliary routing-cost variable.
pub fn routing_cost() -> String {
    "RoutingCost".to_string()
}

/// Auxiliary minimum-allocation variable of the max-min surrogate.
pub fn min_flow() -> String {
    "MinFlow".to_string()
}

/// Auxiliary maximum-load variable for a resource.
pub fn max_load(resource: &str) -> String {
    format!("MaxLoad_{resource}")
}

/// Constraint-row names. Grouped in a submodule so call sites read
/// `rows::route_all(tc)`.
pub mod rows {
    use super::*;

    /// Route-all row of a class: its flow fractions sum to one.
    pub fn route_all(tc: &TrafficClass) -> String {
        format!("RouteAll_{}", tc.id)
    }

    /// Allocation-definition row of a class.
    pub fn alloc(tc: &TrafficClass) -> String {
        format!("Alloc_{}", tc.id)
    }

    /// Load-definition equality for a resource at a node.
    pub fn node_load_def(resource: &str, node: NodeId) -> String {
        format!("LoadDef_{}_n_{}", resource, node.index())
    }

    /// Load-definition equality for a resource on a link.
    pub fn link_load_def(resource: &str, link: Link) -> String {
        format!("LoadDef_{}_e_{}_{}", resource, link.0.index(), link.1.index())
    }

    /// Capacity bound for a resource at a node.
    pub fn node_cap(resource: &str, node: NodeId) -> String {
        format!("Cap_{}_n_{}", resource, node.index())
    }

    /// Capacity bound for a resource on a link.
    pub fn link_cap(resource: &str, link: Link) -> String {
        format!("Cap_{}_e_{}_{}", resource, link.0.index(), link.1.index())
    }

    /// Indicator row gating an elastic capacity by the node binary.
    pub fn elastic_gate(resource: &str, node: NodeId) -> String {
        format!("ElasticGate_{}_{}", resource, node.index())
    }

    /// Path-disable row: flow fraction bounded by the path binary.
    pub fn path_disable(tc: &TrafficClass, path_index: usize) -> String {
        format!("PathDisable_{}_{}", tc.id, path_index)
    }

    /// Require-node row: path binary bounded by a node binary.
    pub fn require_node(tc: &TrafficClass, path_index: usize, node: NodeId) -> String {
        format!("ReqNode_{}_{}_{}", tc.id, path_index, node.index())
    }

    /// Require-edge row: path binary bounded by an edge binary.
    pub fn require_edge(tc: &TrafficClass, path_index: usize, link: Link) -> String {
        format!(
            "ReqEdge_{}_{}_{}_{}",
            tc.id,
            path_index,
            link.0.index(),
            link.1.index()
        )
    }

    /// Require-some-nodes row of a (class, path index) pair.
    pub fn require_some(tc: &TrafficClass, path_index: usize) -> String {
        format!("ReqSome_{}_{}", tc.id, path_index)
    }

    /// The single node-budget row.
    pub fn budget() -> String {
        "Budget".to_string()
    }

    /// Routing-cost definition row.
    pub fn routing_cost_def() -> String {
        "RoutingCostDef".to_string()
    }

    /// Demand row of a class: allocation at least the current minimum. The
    /// iterative max-min algorithm reads dual values from this row.
    pub fn demand(tc: &TrafficClass) -> String {
        demand_id(tc.id)
    }

    /// Demand row by raw class id (the allocation registry keys by id).
    pub fn demand_id(id: u32) -> String {
        format!("Demand_{id}")
    }

    /// Bound of the max-load variable against one load variable.
    pub fn max_load_bound(resource: &str, load_name: &str) -> String {
        format!("MaxLoadBound_{resource}_{load_name}")
    }

    /// Definition row of an auxiliary variable.
    pub fn aux_def(name: &str) -> String {
        format!("Aux_{name}")
    }

    /// Row pinning a variable to a fixed value.
    pub fn fix(var_name: &str) -> String {
        format!("Fix_{var_name}")
    }
}
