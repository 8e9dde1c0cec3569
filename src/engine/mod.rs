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

//! The optimization engine: a stateful builder translating high-level
//! constraint and objective specifications into a linear model over a
//! solver backend, and extracting path fractions back out.
//!
//! An [`Engine`] owns exactly one in-progress model. Constraint builders
//! must be called from a single thread; independent engines can be built
//! concurrently (the final backend invocation is serialized internally).
//! Variables must be declared before any constraint references them:
//! referencing an undeclared name fails fast with
//! [`Error::UndeclaredVariable`] instead of creating a phantom variable.

mod caps;
pub mod maxmin;

pub use caps::{merge_caps, CapEntry, Caps, EntityName};

use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info};

use crate::error::Error;
use crate::names::{self, rows};
use crate::paths::{Path, Pptc, SolvedPath, SolvedRouting};
use crate::solver::{
    run_solver, BackendKind, Direction, Model, RawSolution, RelOp, SolveStatus, VarKind,
};
use crate::topology::{Link, NodeId, Topology};
use crate::traffic::TrafficClass;

/// Fractions below this threshold count as zero when extracting
/// flow-carrying paths (interior-point solutions carry numerical noise).
const FLOW_EPS: f64 = 1e-6;

/// Binary-variable families that can be declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinKind {
    /// One binary per topology node (`node enabled`).
    Node,
    /// One binary per directed link (`edge enabled`).
    Edge,
    /// One binary per (class, path index) pair (`path enabled`).
    Path,
}

/// The closed set of predefined objectives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Objective {
    /// Maximize the sum of all registered allocation variables.
    MaxTotalFlow,
    /// Single-shot max-min surrogate: maximize a fresh variable bounded by
    /// every registered allocation. This only maximizes the *smallest*
    /// allocation and says nothing about how the rest is shared; the
    /// iterative algorithm in [`maxmin`] computes the lexicographic
    /// max-min-fair allocation instead.
    MaxMinFlow,
    /// Minimize the routing-cost variable defined by
    /// [`Engine::add_routing_cost`].
    MinRoutingCost,
    /// Minimize the maximum registered node-load variable of a resource.
    MinMaxNodeLoad(String),
    /// Minimize the maximum registered link-load variable of a resource.
    MinMaxLinkLoad(String),
}

/// A path-indexed optimization formulation over one solver backend.
#[derive(Debug)]
pub struct Engine {
    /// Which backend `solve` will use.
    backend: BackendKind,
    /// The model under construction.
    model: Model,
    /// Registered node-load variable names: resource -> node -> name.
    node_loads: BTreeMap<String, BTreeMap<NodeId, String>>,
    /// Registered link-load variable names: resource -> link -> name.
    link_loads: BTreeMap<String, BTreeMap<Link, String>>,
    /// Registered allocation variable names, by class id.
    allocations: BTreeMap<u32, String>,
    /// The last solve result, cleared by any model mutation.
    solution: Option<RawSolution>,
}

impl Engine {
    /// Create an engine from a backend selector string (`"microlp"` or
    /// `"clarabel"`). Unknown selectors fail with
    /// [`Error::UnknownBackend`].
    pub fn new(backend: &str) -> Result<Self, Error> {
        Ok(Self::with_backend(BackendKind::from_str(backend)?))
    }

    /// Create an engine for the given backend.
    pub fn with_backend(backend: BackendKind) -> Self {
        Self {
            backend,
            model: Model::new(),
            node_loads: BTreeMap::new(),
            link_loads: BTreeMap::new(),
            allocations: BTreeMap::new(),
            solution: None,
        }
    }

    /// The backend this engine solves with.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Read-only access to the model under construction.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Log the number of rows a builder added, like every builder does.
    fn log_rows(&self, before: usize, what: &str) {
        debug!("{} rows for `{}`", self.model.num_rows() - before, what);
    }

    /// Forget any previous solution; called by every model mutation.
    fn touch(&mut self) {
        self.solution = None;
    }

    /// Declare one flow-fraction variable `x` in `[0, 1]` per (class, path)
    /// pair. Must be called before any constraint referencing flows. A
    /// class without candidate paths fails with [`Error::NoPaths`].
    pub fn add_decision_variables(&mut self, pptc: &Pptc) -> Result<(), Error> {
        self.touch();
        for (tc, paths) in pptc {
            if paths.is_empty() {
                return Err(Error::NoPaths {
                    src: tc.src,
                    dst: tc.dst,
                });
            }
            for pi in 0..paths.len() {
                self.model
                    .add_var(names::xp(tc, pi), VarKind::Continuous, 0.0, 1.0)?;
            }
        }
        debug!(
            "declared {} flow-fraction variables for {} classes",
            pptc.total_paths(),
            pptc.len()
        );
        Ok(())
    }

    /// Declare the requested binary-variable families.
    pub fn add_binary_variables(
        &mut self,
        pptc: &Pptc,
        topo: &Topology,
        kinds: &[BinKind],
    ) -> Result<(), Error> {
        self.touch();
        for kind in kinds {
            match kind {
                BinKind::Node => {
                    for n in topo.nodes() {
                        self.model
                            .add_var(names::bn(n), VarKind::Binary, 0.0, 1.0)?;
                    }
                }
                BinKind::Edge => {
                    for l in topo.links() {
                        self.model
                            .add_var(names::be(l), VarKind::Binary, 0.0, 1.0)?;
                    }
                }
                BinKind::Path => {
                    for (tc, paths) in pptc {
                        for pi in 0..paths.len() {
                            self.model
                                .add_var(names::bp(tc, pi), VarKind::Binary, 0.0, 1.0)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// For each class, its flow fractions sum to one: the entire demand is
    /// routed, split arbitrarily across its candidate paths.
    pub fn add_route_all_constraint(&mut self, pptc: &Pptc) -> Result<(), Error> {
        self.touch();
        let before = self.model.num_rows();
        for (tc, paths) in pptc {
            if paths.is_empty() {
                return Err(Error::NoPaths {
                    src: tc.src,
                    dst: tc.dst,
                });
            }
            let terms: Vec<_> = (0..paths.len())
                .map(|pi| Ok((self.model.var(&names::xp(tc, pi))?, 1.0)))
                .collect::<Result<_, Error>>()?;
            self.model.add_row(rows::route_all(tc), terms, RelOp::Eq, 1.0)?;
        }
        self.log_rows(before, "add_route_all_constraint");
        Ok(())
    }

    /// For each class, define its allocation variable `a` in `[0, 1]` as
    /// the sum of its flow fractions, and register it for allocation-based
    /// objectives.
    pub fn add_allocate_flow_constraint(&mut self, pptc: &Pptc) -> Result<(), Error> {
        self.touch();
        let before = self.model.num_rows();
        for (tc, paths) in pptc {
            if paths.is_empty() {
                return Err(Error::NoPaths {
                    src: tc.src,
                    dst: tc.dst,
                });
            }
            let name = names::al(tc);
            let a = self.model.add_var(name.clone(), VarKind::Continuous, 0.0, 1.0)?;
            let mut terms = vec![(a, 1.0)];
            for pi in 0..paths.len() {
                terms.push((self.model.var(&names::xp(tc, pi))?, -1.0));
            }
            self.model.add_row(rows::alloc(tc), terms, RelOp::Eq, 0.0)?;
            self.allocations.insert(tc.id, name);
        }
        self.log_rows(before, "add_allocate_flow_constraint");
        Ok(())
    }

    /// For every link with a declared capacity, define a load variable as
    /// the weighted sum of the flow fractions of all paths traversing it,
    /// and bound it by the capacity. `cost_fn(tc, path, link, resource)`
    /// supplies the non-negative multiplier (e.g., byte volume normalized
    /// by the raw link capacity). The load variable is registered under
    /// (resource, link) for later max-load objectives; declaring the same
    /// pair twice fails with [`Error::DuplicateLoad`].
    pub fn add_link_capacity_constraint(
        &mut self,
        pptc: &Pptc,
        topo: &Topology,
        resource: &str,
        caps: &Caps<Link>,
        cost_fn: impl Fn(&TrafficClass, &Path, Link, &str) -> f64,
    ) -> Result<(), Error> {
        self.touch();
        let before = self.model.num_rows();
        let resolved = caps.resolve(topo.links());
        for (link, entry) in resolved {
            let cap = match entry {
                CapEntry::Fixed(cap) => cap,
                CapEntry::Elastic => {
                    return Err(Error::InvalidCapacity(format!(
                        "elastic capacities are only supported on nodes, not {}",
                        link.describe()
                    )))
                }
            };
            let name = names::link_load(resource, link);
            if self
                .link_loads
                .get(resource)
                .is_some_and(|m| m.contains_key(&link))
            {
                return Err(Error::DuplicateLoad {
                    resource: resource.to_string(),
                    entity: link.describe(),
                });
            }
            let load = self
                .model
                .add_var(name.clone(), VarKind::Continuous, 0.0, f64::INFINITY)?;
            let mut terms = vec![(load, 1.0)];
            for (tc, paths) in pptc {
                for (pi, path) in paths.iter().enumerate() {
                    if path.traverses(link) {
                        let coeff = cost_fn(tc, path, link, resource);
                        if coeff != 0.0 {
                            terms.push((self.model.var(&names::xp(tc, pi))?, -coeff));
                        }
                    }
                }
            }
            self.model
                .add_row(rows::link_load_def(resource, link), terms, RelOp::Eq, 0.0)?;
            self.model.add_row(
                rows::link_cap(resource, link),
                [(load, 1.0)],
                RelOp::Le,
                cap,
            )?;
            self.link_loads
                .entry(resource.to_string())
                .or_default()
                .insert(link, name);
        }
        self.log_rows(before, "add_link_capacity_constraint");
        Ok(())
    }

    /// Node analogue of [`Engine::add_link_capacity_constraint`]. A path
    /// consumes a node's resource only when it *uses* the node: for
    /// middlebox-annotated paths that means the node is in the designated
    /// waypoint set; for plain paths, any node of the sequence (see
    /// [`Path::uses_node`]). [`CapEntry::Elastic`] entries create a
    /// capacity *variable* instead of a fixed bound, gated by the node's
    /// enabled binary: a disabled node's capacity collapses to zero.
    /// Elastic entries therefore require node binaries to be declared.
    pub fn add_node_capacity_constraint(
        &mut self,
        pptc: &Pptc,
        topo: &Topology,
        resource: &str,
        caps: &Caps<NodeId>,
        cost_fn: impl Fn(&TrafficClass, &Path, NodeId, &str) -> f64,
    ) -> Result<(), Error> {
        self.touch();
        let before = self.model.num_rows();
        let resolved = caps.resolve(topo.nodes());
        for (node, entry) in resolved {
            let name = names::node_load(resource, node);
            if self
                .node_loads
                .get(resource)
                .is_some_and(|m| m.contains_key(&node))
            {
                return Err(Error::DuplicateLoad {
                    resource: resource.to_string(),
                    entity: node.describe(),
                });
            }
            let load = self
                .model
                .add_var(name.clone(), VarKind::Continuous, 0.0, f64::INFINITY)?;
            let mut terms = vec![(load, 1.0)];
            let mut total = 0.0;
            for (tc, paths) in pptc {
                for (pi, path) in paths.iter().enumerate() {
                    if path.uses_node(node) {
                        let coeff = cost_fn(tc, path, node, resource);
                        if coeff != 0.0 {
                            terms.push((self.model.var(&names::xp(tc, pi))?, -coeff));
                            total += coeff;
                        }
                    }
                }
            }
            self.model
                .add_row(rows::node_load_def(resource, node), terms, RelOp::Eq, 0.0)?;
            match entry {
                CapEntry::Fixed(cap) => {
                    self.model.add_row(
                        rows::node_cap(resource, node),
                        [(load, 1.0)],
                        RelOp::Le,
                        cap,
                    )?;
                }
                CapEntry::Elastic => {
                    let enabled = self.model.var(&names::bn(node))?;
                    let cap_var = self.model.add_var(
                        names::node_cap(resource, node),
                        VarKind::Continuous,
                        0.0,
                        f64::INFINITY,
                    )?;
                    // Cap <= M * enabled, with M the largest possible load.
                    self.model.add_row(
                        rows::elastic_gate(resource, node),
                        [(cap_var, 1.0), (enabled, -total)],
                        RelOp::Le,
                        0.0,
                    )?;
                    self.model.add_row(
                        rows::node_cap(resource, node),
                        [(load, 1.0), (cap_var, -1.0)],
                        RelOp::Le,
                        0.0,
                    )?;
                }
            }
            self.node_loads
                .entry(resource.to_string())
                .or_default()
                .insert(node, name);
        }
        self.log_rows(before, "add_node_capacity_constraint");
        Ok(())
    }

    /// Discrete variant of the node capacity constraint: the multiplier is
    /// attached to the *path-enabled binary* instead of the flow fraction,
    /// modeling per-path fixed costs (e.g., one TCAM rule per path crossing
    /// a switch, independent of carried volume). Requires path binaries.
    pub fn add_node_capacity_per_path_constraint(
        &mut self,
        pptc: &Pptc,
        topo: &Topology,
        resource: &str,
        caps: &Caps<NodeId>,
        cost_fn: impl Fn(&TrafficClass, &Path, NodeId, &str) -> f64,
    ) -> Result<(), Error> {
        self.touch();
        let before = self.model.num_rows();
        let resolved = caps.resolve(topo.nodes());
        for (node, entry) in resolved {
            let cap = match entry {
                CapEntry::Fixed(cap) => cap,
                CapEntry::Elastic => {
                    return Err(Error::InvalidCapacity(format!(
                        "per-path capacities must be fixed, got elastic for {}",
                        node.describe()
                    )))
                }
            };
            let name = names::node_load(resource, node);
            if self
                .node_loads
                .get(resource)
                .is_some_and(|m| m.contains_key(&node))
            {
                return Err(Error::DuplicateLoad {
                    resource: resource.to_string(),
                    entity: node.describe(),
                });
            }
            let load = self
                .model
                .add_var(name.clone(), VarKind::Continuous, 0.0, f64::INFINITY)?;
            let mut terms = vec![(load, 1.0)];
            for (tc, paths) in pptc {
                for (pi, path) in paths.iter().enumerate() {
                    if path.uses_node(node) {
                        let coeff = cost_fn(tc, path, node, resource);
                        if coeff != 0.0 {
                            terms.push((self.model.var(&names::bp(tc, pi))?, -coeff));
                        }
                    }
                }
            }
            self.model
                .add_row(rows::node_load_def(resource, node), terms, RelOp::Eq, 0.0)?;
            self.model.add_row(
                rows::node_cap(resource, node),
                [(load, 1.0)],
                RelOp::Le,
                cap,
            )?;
            self.node_loads
                .entry(resource.to_string())
                .or_default()
                .insert(node, name);
        }
        self.log_rows(before, "add_node_capacity_per_path_constraint");
        Ok(())
    }

    /// For every path of the targeted classes (all classes if `None`),
    /// bound the flow fraction by the path-enabled binary: a disabled path
    /// carries no flow, an enabled path is unrestricted.
    pub fn add_path_disable_constraint(
        &mut self,
        pptc: &Pptc,
        classes: Option<&[u32]>,
    ) -> Result<(), Error> {
        self.touch();
        let before = self.model.num_rows();
        for (tc, paths) in pptc.iter().filter(|&(tc, _)| selected(classes, tc)) {
            for pi in 0..paths.len() {
                let x = self.model.var(&names::xp(tc, pi))?;
                let b = self.model.var(&names::bp(tc, pi))?;
                self.model.add_row(
                    rows::path_disable(tc, pi),
                    [(x, 1.0), (b, -1.0)],
                    RelOp::Le,
                    0.0,
                )?;
            }
        }
        self.log_rows(before, "add_path_disable_constraint");
        Ok(())
    }

    /// A path may only be enabled if every node it crosses is enabled:
    /// `bp <= bn` for every node on the path.
    pub fn add_require_all_nodes_constraint(
        &mut self,
        pptc: &Pptc,
        classes: Option<&[u32]>,
    ) -> Result<(), Error> {
        self.touch();
        let before = self.model.num_rows();
        for (tc, paths) in pptc.iter().filter(|&(tc, _)| selected(classes, tc)) {
            for (pi, path) in paths.iter().enumerate() {
                let b = self.model.var(&names::bp(tc, pi))?;
                for &node in path.nodes() {
                    let bn = self.model.var(&names::bn(node))?;
                    self.model.add_row(
                        rows::require_node(tc, pi, node),
                        [(b, 1.0), (bn, -1.0)],
                        RelOp::Le,
                        0.0,
                    )?;
                }
            }
        }
        self.log_rows(before, "add_require_all_nodes_constraint");
        Ok(())
    }

    /// A path may only be enabled if every link it traverses is enabled:
    /// `bp <= be` for every link on the path.
    pub fn add_require_all_edges_constraint(
        &mut self,
        pptc: &Pptc,
        classes: Option<&[u32]>,
    ) -> Result<(), Error> {
        self.touch();
        let before = self.model.num_rows();
        for (tc, paths) in pptc.iter().filter(|&(tc, _)| selected(classes, tc)) {
            for (pi, path) in paths.iter().enumerate() {
                let b = self.model.var(&names::bp(tc, pi))?;
                for link in path.links() {
                    let be = self.model.var(&names::be(link))?;
                    self.model.add_row(
                        rows::require_edge(tc, pi, link),
                        [(b, 1.0), (be, -1.0)],
                        RelOp::Le,
                        0.0,
                    )?;
                }
            }
        }
        self.log_rows(before, "add_require_all_edges_constraint");
        Ok(())
    }

    /// A path may only be enabled if at least `some` of its nodes are
    /// enabled: `bp <= sum(bn) - (some - 1)`.
    pub fn add_require_some_nodes_constraint(
        &mut self,
        pptc: &Pptc,
        classes: Option<&[u32]>,
        some: usize,
    ) -> Result<(), Error> {
        self.touch();
        let before = self.model.num_rows();
        for (tc, paths) in pptc.iter().filter(|&(tc, _)| selected(classes, tc)) {
            for (pi, path) in paths.iter().enumerate() {
                let b = self.model.var(&names::bp(tc, pi))?;
                let mut terms = vec![(b, 1.0)];
                for &node in path.nodes() {
                    terms.push((self.model.var(&names::bn(node))?, -1.0));
                }
                self.model.add_row(
                    rows::require_some(tc, pi),
                    terms,
                    RelOp::Le,
                    1.0 - some as f64,
                )?;
            }
        }
        self.log_rows(before, "add_require_some_nodes_constraint");
        Ok(())
    }

    /// Cap the total weight of enabled nodes:
    /// `sum(weight(n) * bn) <= bound`.
    pub fn add_budget_constraint(
        &mut self,
        topo: &Topology,
        weight_fn: impl Fn(NodeId) -> f64,
        bound: f64,
    ) -> Result<(), Error> {
        self.touch();
        let terms: Vec<_> = topo
            .nodes()
            .map(|n| Ok((self.model.var(&names::bn(n))?, weight_fn(n))))
            .collect::<Result<_, Error>>()?;
        self.model.add_row(rows::budget(), terms, RelOp::Le, bound)?;
        Ok(())
    }

    /// Define the routing-cost variable as the weighted sum of flow
    /// fractions, with the path hop count as the cost of each path.
    pub fn add_routing_cost(&mut self, pptc: &Pptc) -> Result<(), Error> {
        self.add_routing_cost_with(pptc, |_, path| path.hops() as f64)
    }

    /// Define the routing-cost variable with a caller-supplied per-path
    /// cost function.
    pub fn add_routing_cost_with(
        &mut self,
        pptc: &Pptc,
        cost_fn: impl Fn(&TrafficClass, &Path) -> f64,
    ) -> Result<(), Error> {
        self.touch();
        let cost = self.model.add_var(
            names::routing_cost(),
            VarKind::Continuous,
            0.0,
            f64::INFINITY,
        )?;
        let mut terms = vec![(cost, 1.0)];
        for (tc, paths) in pptc {
            for (pi, path) in paths.iter().enumerate() {
                let coeff = cost_fn(tc, path);
                if coeff != 0.0 {
                    terms.push((self.model.var(&names::xp(tc, pi))?, -coeff));
                }
            }
        }
        self.model
            .add_row(rows::routing_cost_def(), terms, RelOp::Eq, 0.0)?;
        Ok(())
    }

    /// Set a raw linear objective over already-declared variables.
    pub fn set_objective_coefficients(
        &mut self,
        coeffs: &[(String, f64)],
        direction: Direction,
    ) -> Result<(), Error> {
        self.touch();
        let terms: Vec<_> = coeffs
            .iter()
            .map(|(name, coeff)| Ok((self.model.var(name)?, *coeff)))
            .collect::<Result<_, Error>>()?;
        self.model.set_objective(terms, direction);
        Ok(())
    }

    /// Set one of the predefined objectives, declaring its auxiliary
    /// variable and bounding rows as needed.
    pub fn set_predefined_objective(&mut self, objective: &Objective) -> Result<(), Error> {
        self.touch();
        match objective {
            Objective::MaxTotalFlow => {
                if self.allocations.is_empty() {
                    return Err(Error::NoAllocations);
                }
                let terms: Vec<_> = self
                    .allocations
                    .values()
                    .map(|name| Ok((self.model.var(name)?, 1.0)))
                    .collect::<Result<_, Error>>()?;
                self.model.set_objective(terms, Direction::Maximize);
            }
            Objective::MaxMinFlow => {
                if self.allocations.is_empty() {
                    return Err(Error::NoAllocations);
                }
                let min_flow = self.model.add_var(
                    names::min_flow(),
                    VarKind::Continuous,
                    0.0,
                    f64::INFINITY,
                )?;
                for (id, name) in self.allocations.clone() {
                    let a = self.model.var(&name)?;
                    self.model.add_row(
                        rows::demand_id(id),
                        [(a, 1.0), (min_flow, -1.0)],
                        RelOp::Ge,
                        0.0,
                    )?;
                }
                self.model
                    .set_objective([(min_flow, 1.0)], Direction::Maximize);
            }
            Objective::MinRoutingCost => {
                let cost = self.model.var(&names::routing_cost())?;
                self.model.set_objective([(cost, 1.0)], Direction::Minimize);
            }
            Objective::MinMaxNodeLoad(resource) => {
                let loads: Vec<String> = self
                    .node_loads
                    .get(resource)
                    .filter(|m| !m.is_empty())
                    .ok_or_else(|| Error::MissingLoadVariables(resource.clone()))?
                    .values()
                    .cloned()
                    .collect();
                self.minimize_max_of(resource, &loads)?;
            }
            Objective::MinMaxLinkLoad(resource) => {
                let loads: Vec<String> = self
                    .link_loads
                    .get(resource)
                    .filter(|m| !m.is_empty())
                    .ok_or_else(|| Error::MissingLoadVariables(resource.clone()))?
                    .values()
                    .cloned()
                    .collect();
                self.minimize_max_of(resource, &loads)?;
            }
        }
        Ok(())
    }

    /// Maximize the smallest allocation among the given classes only:
    /// declare the min-flow variable, bound it by each class's allocation,
    /// and maximize it. The iterative max-min loop calls this with the set
    /// of still-unsaturated classes.
    pub(crate) fn add_min_flow_for(&mut self, classes: &[&TrafficClass]) -> Result<(), Error> {
        self.touch();
        if classes.is_empty() {
            return Err(Error::NoAllocations);
        }
        let min_flow = self.model.add_var(
            names::min_flow(),
            VarKind::Continuous,
            0.0,
            f64::INFINITY,
        )?;
        for &tc in classes {
            let a = self.model.var(&names::al(tc))?;
            self.model.add_row(
                rows::demand(tc),
                [(a, 1.0), (min_flow, -1.0)],
                RelOp::Ge,
                0.0,
            )?;
        }
        self.model
            .set_objective([(min_flow, 1.0)], Direction::Maximize);
        Ok(())
    }

    /// Introduce a fresh max-load variable, bound it from below by every
    /// given load variable, and minimize it.
    fn minimize_max_of(&mut self, resource: &str, loads: &[String]) -> Result<(), Error> {
        let max_load = self.model.add_var(
            names::max_load(resource),
            VarKind::Continuous,
            0.0,
            f64::INFINITY,
        )?;
        for name in loads {
            let load = self.model.var(name)?;
            self.model.add_row(
                rows::max_load_bound(resource, name),
                [(max_load, 1.0), (load, -1.0)],
                RelOp::Ge,
                0.0,
            )?;
        }
        self.model
            .set_objective([(max_load, 1.0)], Direction::Minimize);
        Ok(())
    }

    /// Declare a new variable equal to a linear combination of existing
    /// variables plus a constant: the generic escape hatch for objective
    /// terms not covered by the predefined set.
    pub fn define_aux_variable(
        &mut self,
        name: &str,
        coeffs: &[(String, f64)],
        constant: f64,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<(), Error> {
        self.touch();
        let aux = self.model.add_var(
            name,
            VarKind::Continuous,
            lower.unwrap_or(f64::NEG_INFINITY),
            upper.unwrap_or(f64::INFINITY),
        )?;
        let mut terms = vec![(aux, 1.0)];
        for (var_name, coeff) in coeffs {
            terms.push((self.model.var(var_name)?, -coeff));
        }
        self.model
            .add_row(rows::aux_def(name), terms, RelOp::Eq, constant)?;
        Ok(())
    }

    /// Pin an existing variable to a fixed value with an equality row.
    pub fn fix_variable(&mut self, name: &str, value: f64) -> Result<(), Error> {
        self.touch();
        let var = self.model.var(name)?;
        self.model
            .add_row(rows::fix(name), [(var, 1.0)], RelOp::Eq, value)?;
        Ok(())
    }

    /// Solve the model on the configured backend. Infeasibility and
    /// unboundedness are reported through the returned status, not as
    /// errors; check [`Engine::is_solved`] before reading results.
    pub fn solve(&mut self, time_limit: Option<Duration>) -> Result<SolveStatus, Error> {
        info!(
            "solving model ({} vars, {} rows) with backend {:?}",
            self.model.num_vars(),
            self.model.num_rows(),
            self.backend
        );
        let solution = run_solver(self.backend, &self.model, time_limit)?;
        let status = solution.status;
        info!("solver finished with status {status:?}");
        self.solution = Some(solution);
        Ok(status)
    }

    /// Whether the last solve produced an (optimal) solution.
    pub fn is_solved(&self) -> bool {
        matches!(
            self.solution,
            Some(RawSolution {
                status: SolveStatus::Optimal,
                ..
            })
        )
    }

    /// The solved solution, or [`Error::NotSolved`].
    fn solved(&self) -> Result<&RawSolution, Error> {
        self.solution
            .as_ref()
            .filter(|s| s.status == SolveStatus::Optimal)
            .ok_or(Error::NotSolved)
    }

    /// Objective value of the last successful solve.
    pub fn get_solved_objective(&self) -> Result<f64, Error> {
        Ok(self.solved()?.objective)
    }

    /// Solved value of a variable by name.
    pub fn value(&self, name: &str) -> Result<f64, Error> {
        let id = self.model.var(name)?;
        Ok(self.solved()?.values[id])
    }

    /// All solved variable values, keyed by variable name.
    pub fn get_all_variable_values(&self) -> Result<BTreeMap<String, f64>, Error> {
        let solution = self.solved()?;
        Ok(self
            .model
            .vars()
            .iter()
            .enumerate()
            .map(|(id, def)| (def.name.clone(), solution.values[id]))
            .collect())
    }

    /// Dual value of a constraint row by name, if the backend reports
    /// duals.
    pub fn dual_value(&self, row_name: &str) -> Result<Option<f64>, Error> {
        let idx = self.model.row(row_name)?;
        let solution = self.solved()?;
        Ok(solution.duals.as_ref().map(|d| d[idx]))
    }

    /// Read the solved flow fraction of every (class, path) pair into a
    /// fresh [`SolvedRouting`]; the input paths are not touched. With
    /// `flow_carrying_only`, paths with numerically zero fraction are
    /// omitted.
    pub fn get_path_fractions(
        &self,
        pptc: &Pptc,
        flow_carrying_only: bool,
    ) -> Result<SolvedRouting, Error> {
        let mut routing = SolvedRouting::new();
        for (tc, paths) in pptc {
            let mut solved = Vec::with_capacity(paths.len());
            for (pi, path) in paths.iter().enumerate() {
                let fraction = self.value(&names::xp(tc, pi))?;
                if flow_carrying_only && fraction < FLOW_EPS {
                    continue;
                }
                solved.push(SolvedPath {
                    path: path.clone(),
                    fraction,
                });
            }
            routing.insert(tc.clone(), solved);
        }
        Ok(routing)
    }

    /// Write the current model in the plain-text LP format.
    pub fn write_lp(&self, w: &mut impl Write) -> std::io::Result<()> {
        self.model.write_lp(w)
    }

    /// Write the current model to an LP file on disk.
    pub fn write_lp_file(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        self.write_lp(&mut file)
    }
}

/// Whether a class is targeted by an optional class-id filter.
fn selected(classes: Option<&[u32]>, tc: &TrafficClass) -> bool {
    classes.map(|ids| ids.contains(&tc.id)).unwrap_or(true)
}
