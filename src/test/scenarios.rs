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

use assert_approx_eq::assert_approx_eq;
use maplit::btreemap;
use test_log::test;

use super::diamond;
use crate::engine::maxmin::max_min_fairness;
use crate::engine::{BinKind, CapEntry, Caps, Engine, Objective};
use crate::error::Error;
use crate::names;
use crate::paths::{
    generate_paths_per_class, has_middlebox_predicate, mbox_modifier, null_predicate,
    select_k_shortest,
};
use crate::solver::{BackendKind, SolveStatus};
use crate::topology::Topology;
use crate::traffic::{TrafficClass, TrafficMatrix};

/// Balancing cpu load across the two middle nodes of a diamond: with one
/// class of 100 flows and 200 flows/s of processing capacity per node, an
/// even split loads each node to a quarter of its capacity.
#[test]
fn min_max_node_load_on_a_diamond() {
    let (topo, a, b, c, d) = diamond();
    let tm: TrafficMatrix = [TrafficClass::new(0, "t", a, d)
        .with_volume(100.0, 100_000.0)
        .with_cost("cpu", 1.0)]
    .into_iter()
    .collect();
    let pptc = generate_paths_per_class(&topo, &tm, null_predicate, 4, None, None).unwrap();

    let mut engine = Engine::with_backend(BackendKind::Clarabel);
    engine.add_decision_variables(&pptc).unwrap();
    engine.add_route_all_constraint(&pptc).unwrap();
    let caps = Caps::fixed([(b, 1.0), (c, 1.0)]);
    engine
        .add_node_capacity_constraint(&pptc, &topo, "cpu", &caps, |tc, _, _, resource| {
            tc.volume_flows * tc.cost(resource) / 200.0
        })
        .unwrap();
    engine
        .set_predefined_objective(&Objective::MinMaxNodeLoad("cpu".to_string()))
        .unwrap();

    assert_eq!(engine.solve(None).unwrap(), SolveStatus::Optimal);
    assert_approx_eq!(engine.get_solved_objective().unwrap(), 0.25, 1e-3);
    assert_approx_eq!(engine.value(&names::node_load("cpu", b)).unwrap(), 0.25, 1e-3);
    assert_approx_eq!(engine.value(&names::node_load("cpu", c)).unwrap(), 0.25, 1e-3);

    let routing = engine.get_path_fractions(&pptc, true).unwrap();
    let fractions = routing.values().next().unwrap();
    assert_eq!(fractions.len(), 2);
    for sp in fractions {
        assert_approx_eq!(sp.fraction, 0.5, 1e-3);
    }
}

/// Balancing across middlebox *assignments* instead of physical paths: a
/// four-node chain has a single physical route, expanded into one variant
/// per candidate middlebox. Only the designated waypoint of each variant
/// accrues cpu load, so an even split across the two variants loads each
/// middlebox to a quarter of its capacity.
#[test]
fn min_max_middlebox_load_on_a_chain() {
    let mut topo = Topology::chain(4);
    let nodes: Vec<_> = topo.nodes().collect();
    topo.set_middlebox(nodes[1], true);
    topo.set_middlebox(nodes[2], true);
    let tm: TrafficMatrix = [TrafficClass::new(0, "t", nodes[0], nodes[3])
        .with_volume(100.0, 100_000.0)
        .with_cost("cpu", 1.0)]
    .into_iter()
    .collect();
    let modifier = mbox_modifier(1);
    let pptc = generate_paths_per_class(
        &topo,
        &tm,
        has_middlebox_predicate,
        3,
        None,
        Some(&modifier),
    )
    .unwrap();
    // one physical path, two annotated variants
    assert_eq!(pptc.total_paths(), 2);

    let mut engine = Engine::with_backend(BackendKind::Clarabel);
    engine.add_decision_variables(&pptc).unwrap();
    engine.add_route_all_constraint(&pptc).unwrap();
    let caps = Caps::fixed([(nodes[1], 1.0), (nodes[2], 1.0)]);
    engine
        .add_node_capacity_constraint(&pptc, &topo, "cpu", &caps, |tc, _, _, resource| {
            tc.volume_flows * tc.cost(resource) / 200.0
        })
        .unwrap();
    engine
        .set_predefined_objective(&Objective::MinMaxNodeLoad("cpu".to_string()))
        .unwrap();

    assert_eq!(engine.solve(None).unwrap(), SolveStatus::Optimal);
    assert_approx_eq!(engine.get_solved_objective().unwrap(), 0.25, 1e-3);
    // both variants cross both middleboxes, but each charges only its own
    assert_approx_eq!(
        engine.value(&names::node_load("cpu", nodes[1])).unwrap(),
        0.25,
        1e-3
    );
    assert_approx_eq!(
        engine.value(&names::node_load("cpu", nodes[2])).unwrap(),
        0.25,
        1e-3
    );
    let routing = engine.get_path_fractions(&pptc, true).unwrap();
    for sp in routing.values().flatten() {
        assert_approx_eq!(sp.fraction, 0.5, 1e-3);
    }
}

/// Admission control on a complete topology: the demand saturates its
/// direct link, and with links capped to half their raw bandwidth only
/// half of the demand can be admitted.
#[test]
fn max_total_flow_under_halved_link_caps() {
    let topo = Topology::complete(5);
    let nodes: Vec<_> = topo.nodes().collect();
    let tm: TrafficMatrix = [
        TrafficClass::new(0, "bulk", nodes[0], nodes[3]).with_volume(1_000_000.0, 2e9)
    ]
    .into_iter()
    .collect();
    let pptc = generate_paths_per_class(&topo, &tm, null_predicate, 4, None, None).unwrap();
    // restrict every class to its direct path
    let pptc = select_k_shortest(&pptc, 1);
    assert_eq!(pptc.total_paths(), 1);

    let mut engine = Engine::with_backend(BackendKind::Microlp);
    engine.add_decision_variables(&pptc).unwrap();
    engine.add_allocate_flow_constraint(&pptc).unwrap();
    engine
        .add_link_capacity_constraint(&pptc, &topo, "bw", &Caps::Uniform(0.5), |tc, _, _, _| {
            tc.volume_bytes / 2e9
        })
        .unwrap();
    engine
        .set_predefined_objective(&Objective::MaxTotalFlow)
        .unwrap();

    assert_eq!(engine.solve(None).unwrap(), SolveStatus::Optimal);
    assert_approx_eq!(engine.get_solved_objective().unwrap(), 0.5);
}

/// Disabling the only transit node of a chain makes routing infeasible.
#[test]
fn node_disabling_cuts_the_only_path() {
    let topo = Topology::chain(3);
    let nodes: Vec<_> = topo.nodes().collect();
    let tm: TrafficMatrix = [TrafficClass::new(0, "t", nodes[0], nodes[2])]
        .into_iter()
        .collect();
    let pptc = generate_paths_per_class(&topo, &tm, null_predicate, 2, None, None).unwrap();
    assert_eq!(pptc.total_paths(), 1);

    let mut engine = Engine::with_backend(BackendKind::Microlp);
    engine.add_decision_variables(&pptc).unwrap();
    engine
        .add_binary_variables(&pptc, &topo, &[BinKind::Node, BinKind::Path])
        .unwrap();
    engine.add_route_all_constraint(&pptc).unwrap();
    engine.add_path_disable_constraint(&pptc, None).unwrap();
    engine.add_require_all_nodes_constraint(&pptc, None).unwrap();
    engine.fix_variable(&names::bn(nodes[1]), 0.0).unwrap();

    assert_eq!(engine.solve(None).unwrap(), SolveStatus::Infeasible);
    assert!(!engine.is_solved());
}

/// A node budget of three admits the chain's only path; a budget of two
/// cannot enable all three nodes the path needs.
#[test]
fn node_budget_gates_feasibility() {
    let topo = Topology::chain(3);
    let nodes: Vec<_> = topo.nodes().collect();
    let tm: TrafficMatrix = [TrafficClass::new(0, "t", nodes[0], nodes[2])]
        .into_iter()
        .collect();
    let pptc = generate_paths_per_class(&topo, &tm, null_predicate, 2, None, None).unwrap();

    for (bound, expected) in [(3.0, SolveStatus::Optimal), (2.0, SolveStatus::Infeasible)] {
        let mut engine = Engine::with_backend(BackendKind::Microlp);
        engine.add_decision_variables(&pptc).unwrap();
        engine
            .add_binary_variables(&pptc, &topo, &[BinKind::Node, BinKind::Path])
            .unwrap();
        engine.add_route_all_constraint(&pptc).unwrap();
        engine.add_path_disable_constraint(&pptc, None).unwrap();
        engine.add_require_all_nodes_constraint(&pptc, None).unwrap();
        engine.add_budget_constraint(&topo, |_| 1.0, bound).unwrap();
        assert_eq!(engine.solve(None).unwrap(), expected, "budget {bound}");
    }
}

/// Per-path rule budgets: a zero rule capacity on one transit node keeps
/// every path crossing it disabled, so the whole class routes over the
/// other branch. Elastic entries are rejected for the discrete variant.
#[test]
fn per_path_capacity_excludes_a_node() {
    let (topo, a, b, c, d) = diamond();
    let tm: TrafficMatrix = [TrafficClass::new(0, "t", a, d)].into_iter().collect();
    let pptc = generate_paths_per_class(&topo, &tm, null_predicate, 4, None, None).unwrap();
    assert_eq!(pptc.total_paths(), 2);

    let mut engine = Engine::with_backend(BackendKind::Microlp);
    engine.add_decision_variables(&pptc).unwrap();
    engine
        .add_binary_variables(&pptc, &topo, &[BinKind::Path])
        .unwrap();
    engine.add_route_all_constraint(&pptc).unwrap();
    engine.add_path_disable_constraint(&pptc, None).unwrap();
    engine
        .add_node_capacity_per_path_constraint(
            &pptc,
            &topo,
            "tcam",
            &Caps::fixed([(b, 0.0)]),
            |_, _, _, _| 1.0,
        )
        .unwrap();

    assert_eq!(engine.solve(None).unwrap(), SolveStatus::Optimal);
    assert_approx_eq!(engine.value(&names::node_load("tcam", b)).unwrap(), 0.0, 1e-6);
    let routing = engine.get_path_fractions(&pptc, true).unwrap();
    let carrying = routing.values().next().unwrap();
    assert_eq!(carrying.len(), 1);
    assert!(carrying[0].path.uses_node(c));
    assert_approx_eq!(carrying[0].fraction, 1.0, 1e-6);

    let mut engine = Engine::with_backend(BackendKind::Microlp);
    engine.add_decision_variables(&pptc).unwrap();
    engine
        .add_binary_variables(&pptc, &topo, &[BinKind::Path])
        .unwrap();
    assert!(matches!(
        engine.add_node_capacity_per_path_constraint(
            &pptc,
            &topo,
            "tcam",
            &Caps::FixedMap(btreemap! { b => CapEntry::Elastic }),
            |_, _, _, _| 1.0,
        ),
        Err(Error::InvalidCapacity(_))
    ));
}

/// Paths depend on their links: with edge binaries wired in, disabling
/// the first link of a chain leaves the only path unusable.
#[test]
fn link_disabling_cuts_the_only_path() {
    let topo = Topology::chain(3);
    let nodes: Vec<_> = topo.nodes().collect();
    let tm: TrafficMatrix = [TrafficClass::new(0, "t", nodes[0], nodes[2])]
        .into_iter()
        .collect();
    let pptc = generate_paths_per_class(&topo, &tm, null_predicate, 2, None, None).unwrap();
    assert_eq!(pptc.total_paths(), 1);

    for (enabled, expected) in [(1.0, SolveStatus::Optimal), (0.0, SolveStatus::Infeasible)] {
        let mut engine = Engine::with_backend(BackendKind::Microlp);
        engine.add_decision_variables(&pptc).unwrap();
        engine
            .add_binary_variables(&pptc, &topo, &[BinKind::Edge, BinKind::Path])
            .unwrap();
        engine.add_route_all_constraint(&pptc).unwrap();
        engine.add_path_disable_constraint(&pptc, None).unwrap();
        engine.add_require_all_edges_constraint(&pptc, None).unwrap();
        engine
            .fix_variable(&names::be((nodes[0], nodes[1])), enabled)
            .unwrap();
        assert_eq!(engine.solve(None).unwrap(), expected, "first link {enabled}");
    }
}

/// Requiring at least `some` enabled nodes per path: with only the two
/// endpoints of a diamond enabled, a three-node path clears a threshold
/// of two but not three.
#[test]
fn require_some_nodes_thresholds() {
    let (topo, a, b, c, d) = diamond();
    let tm: TrafficMatrix = [TrafficClass::new(0, "t", a, d)].into_iter().collect();
    let pptc = generate_paths_per_class(&topo, &tm, null_predicate, 4, None, None).unwrap();

    for (some, expected) in [(2, SolveStatus::Optimal), (3, SolveStatus::Infeasible)] {
        let mut engine = Engine::with_backend(BackendKind::Microlp);
        engine.add_decision_variables(&pptc).unwrap();
        engine
            .add_binary_variables(&pptc, &topo, &[BinKind::Node, BinKind::Path])
            .unwrap();
        engine.add_route_all_constraint(&pptc).unwrap();
        engine.add_path_disable_constraint(&pptc, None).unwrap();
        engine
            .add_require_some_nodes_constraint(&pptc, None, some)
            .unwrap();
        for (node, value) in [(a, 1.0), (d, 1.0), (b, 0.0), (c, 0.0)] {
            engine.fix_variable(&names::bn(node), value).unwrap();
        }
        assert_eq!(engine.solve(None).unwrap(), expected, "threshold {some}");
    }
}

/// Two classes share the first link of a chain; the second link caps the
/// long class at a quarter. Max-min fairness gives the long class its
/// bottleneck share and the short class the remainder, instead of leaving
/// capacity idle at the common bottleneck level.
#[test]
fn max_min_fairness_on_a_shared_chain() {
    let mut topo = Topology::new();
    let s = topo.add_node("s");
    let m = topo.add_node("m");
    let t = topo.add_node("t");
    topo.add_link(s, m);
    topo.add_link(m, t);
    let long = TrafficClass::new(0, "long", s, t);
    let short = TrafficClass::new(1, "short", s, m);
    let tm: TrafficMatrix = [long.clone(), short.clone()].into_iter().collect();
    let pptc = generate_paths_per_class(&topo, &tm, null_predicate, 2, None, None).unwrap();

    let caps = Caps::fixed([((s, m), 1.0), ((m, t), 0.25)]);
    let allocation = max_min_fairness(&pptc, BackendKind::Clarabel, |engine, pptc| {
        engine.add_link_capacity_constraint(pptc, &topo, "bw", &caps, |_, _, _, _| 1.0)
    })
    .unwrap();

    assert_eq!(allocation.len(), 2);
    assert_approx_eq!(allocation[&long], 0.25, 1e-3);
    assert_approx_eq!(allocation[&short], 0.75, 1e-3);
}

/// The single-shot surrogate only lifts the smallest allocation: on the
/// same chain it reports the bottleneck share without distributing the
/// rest.
#[test]
fn max_min_surrogate_objective() {
    let mut topo = Topology::new();
    let s = topo.add_node("s");
    let m = topo.add_node("m");
    let t = topo.add_node("t");
    topo.add_link(s, m);
    topo.add_link(m, t);
    let tm: TrafficMatrix = [
        TrafficClass::new(0, "long", s, t),
        TrafficClass::new(1, "short", s, m),
    ]
    .into_iter()
    .collect();
    let pptc = generate_paths_per_class(&topo, &tm, null_predicate, 2, None, None).unwrap();

    let mut engine = Engine::with_backend(BackendKind::Clarabel);
    engine.add_decision_variables(&pptc).unwrap();
    engine.add_allocate_flow_constraint(&pptc).unwrap();
    let caps = Caps::fixed([((s, m), 1.0), ((m, t), 0.25)]);
    engine
        .add_link_capacity_constraint(&pptc, &topo, "bw", &caps, |_, _, _, _| 1.0)
        .unwrap();
    engine
        .set_predefined_objective(&Objective::MaxMinFlow)
        .unwrap();

    assert_eq!(engine.solve(None).unwrap(), SolveStatus::Optimal);
    assert_approx_eq!(engine.get_solved_objective().unwrap(), 0.25, 1e-3);
}

/// Elastic node capacities: a disabled middlebox contributes no capacity,
/// forcing all traffic through the enabled one.
#[test]
fn elastic_capacity_follows_the_node_binary() {
    let (mut topo, a, b, c, d) = diamond();
    topo.set_middlebox(b, true);
    topo.set_middlebox(c, true);
    let tm: TrafficMatrix = [TrafficClass::new(0, "t", a, d).with_cost("cpu", 1.0)]
        .into_iter()
        .collect();
    let pptc = generate_paths_per_class(&topo, &tm, null_predicate, 4, None, None).unwrap();

    let mut engine = Engine::with_backend(BackendKind::Microlp);
    engine.add_decision_variables(&pptc).unwrap();
    engine
        .add_binary_variables(&pptc, &topo, &[BinKind::Node])
        .unwrap();
    engine.add_route_all_constraint(&pptc).unwrap();
    let caps = Caps::FixedMap(btreemap! {
        b => CapEntry::Elastic,
        c => CapEntry::Elastic,
    });
    engine
        .add_node_capacity_constraint(&pptc, &topo, "cpu", &caps, |tc, _, _, resource| {
            tc.cost(resource)
        })
        .unwrap();
    engine.fix_variable(&names::bn(c), 0.0).unwrap();

    assert_eq!(engine.solve(None).unwrap(), SolveStatus::Optimal);
    // node c carries nothing, so the path through b takes everything
    assert_approx_eq!(engine.value(&names::node_load("cpu", c)).unwrap(), 0.0, 1e-6);
    assert_approx_eq!(engine.value(&names::node_load("cpu", b)).unwrap(), 1.0, 1e-6);
}
