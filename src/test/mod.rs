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

//! Shared fixtures for the test modules.

#![allow(clippy::missing_docs_in_private_items)]

mod paths;
mod scenarios;

use crate::topology::{NodeId, Topology};

/// A diamond: `a -> {b, c} -> d`.
fn diamond() -> (Topology, NodeId, NodeId, NodeId, NodeId) {
    let mut topo = Topology::new();
    let a = topo.add_node("a");
    let b = topo.add_node("b");
    let c = topo.add_node("c");
    let d = topo.add_node("d");
    for (u, v) in [(a, b), (a, c), (b, d), (c, d)] {
        topo.add_link(u, v);
    }
    (topo, a, b, c, d)
}
